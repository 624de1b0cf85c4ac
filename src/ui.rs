//! Terminal rendering of a layer stack.
//!
//! The terminal stands in for the document: the main area shows the page,
//! layers are drawn right-anchored on top of it in stack order, and the
//! backdrop dims whatever lies below the topmost layer.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};

use crate::stack::{Body, Chrome, Layer, LayerStack, LayerState};

const LOG_PANE_HEIGHT: u16 = 8;

/// Everything the renderer needs besides the stack.
pub struct View<'a> {
    pub document: &'a [String],
    pub log: &'a [String],
    pub help: &'a str,
}

/// Split the terminal into page, log pane and footer.
pub fn split(area: Rect) -> (Rect, Rect, Rect) {
    let log_height = LOG_PANE_HEIGHT.min(area.height.saturating_sub(2) / 2);
    let [page, log, footer] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(log_height),
        Constraint::Length(1),
    ])
    .areas(area);
    (page, log, footer)
}

/// Where a layer of `width` columns lands when pushed `offset` columns past
/// the right edge of `page`.
pub fn layer_rect(page: Rect, width: u32, offset: u32) -> Rect {
    let width = u16::try_from(width).unwrap_or(u16::MAX).min(page.width);
    let offset = u16::try_from(offset).unwrap_or(u16::MAX).min(width);
    let visible = width - offset;
    Rect {
        x: page.right().saturating_sub(width) + offset,
        y: page.y,
        width: visible,
        height: page.height,
    }
}

fn chrome_title(chrome: &Chrome, name: &str) -> Line<'static> {
    let title = chrome.title.clone().unwrap_or_else(|| name.to_string());
    let icons: Vec<&str> = chrome.controls.iter().map(|c| c.icon.as_str()).collect();
    if icons.is_empty() {
        Line::from(format!(" {title} "))
    } else {
        Line::from(format!(" {title}  [{}] ", icons.join(" ")))
    }
}

fn body_text(layer: &Layer) -> Text<'static> {
    match layer.body() {
        Body::Loading => Text::styled("Loading...", Style::default().fg(Color::Yellow)),
        Body::Loaded(content) => Text::from(content.clone()),
        Body::Failed(reason) => Text::styled(
            format!("Failed to load: {reason}"),
            Style::default().fg(Color::Red),
        ),
    }
}

fn draw_layer(frame: &mut Frame<'_>, stack: &LayerStack, layer: &Layer, page: Rect) {
    let offset = layer.slide_offset(stack.now());
    let rect = layer_rect(page, layer.width(), offset);
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let chrome = layer.chrome(stack.config(), stack.full_width_mode());
    let border = if layer.covered() {
        Style::default().fg(Color::DarkGray)
    } else if layer.state() == LayerState::Open {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Blue)
    };
    let block = Block::bordered()
        .border_style(border)
        .title(chrome_title(&chrome, layer.name()))
        .title_bottom(Line::from(format!(" {} z={} ", layer.name(), layer.z_index())));
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(body_text(layer))
            .block(block)
            .wrap(Wrap { trim: false }),
        rect,
    );
}

/// Draw the whole screen.
pub fn draw(frame: &mut Frame<'_>, stack: &LayerStack, view: &View<'_>) {
    let (page, log, footer) = split(frame.area());

    let dimmed = stack.backdrop().is_some_and(|b| b.visible());
    let page_style = if dimmed {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    } else {
        Style::default()
    };
    let document: Vec<Line> = view.document.iter().map(|l| Line::from(l.clone())).collect();
    frame.render_widget(
        Paragraph::new(document)
            .style(page_style)
            .block(Block::bordered().title(" document ")),
        page,
    );

    for layer in stack.layers() {
        draw_layer(frame, stack, layer, page);
    }

    if log.height > 0 {
        let skip = view.log.len().saturating_sub(usize::from(log.height.saturating_sub(2)));
        let lines: Vec<Line> = view.log[skip..]
            .iter()
            .map(|l| Line::from(l.clone()))
            .collect();
        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(" log ")),
            log,
        );
    }

    let status = format!(
        " {}  | layers={} animating={} scroll-lock={}",
        view.help,
        stack.len(),
        stack.is_animating(),
        stack.scroll_locked(),
    );
    frame.render_widget(
        Paragraph::new(status).style(Style::default().add_modifier(Modifier::REVERSED)),
        footer,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Rect {
        Rect::new(0, 0, 100, 30)
    }

    #[test]
    fn settled_layer_is_right_anchored() {
        assert_eq!(layer_rect(page(), 60, 0), Rect::new(40, 0, 60, 30));
    }

    #[test]
    fn sliding_layer_is_clipped_at_the_edge() {
        assert_eq!(layer_rect(page(), 60, 20), Rect::new(60, 0, 40, 30));
        assert_eq!(layer_rect(page(), 60, 60).width, 0);
    }

    #[test]
    fn oversized_layer_fills_page() {
        assert_eq!(layer_rect(page(), 500, 0), Rect::new(0, 0, 100, 30));
    }

    #[test]
    fn split_reserves_footer_and_log() {
        let (page, log, footer) = split(Rect::new(0, 0, 80, 40));
        assert_eq!(footer.height, 1);
        assert_eq!(log.height, LOG_PANE_HEIGHT);
        assert_eq!(page.height, 40 - 1 - LOG_PANE_HEIGHT);
    }
}
