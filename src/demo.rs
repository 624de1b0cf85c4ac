//! The interactive demonstrator: a set of triggers wired to a coordinator.

use indoc::formatdoc;

use crate::actions::Action;
use crate::config::{ConfigPatch, GlobalConfig, IconsPatch};
use crate::content::{ContentSource, StaticLoader};
use crate::error::ContentError;
use crate::events::{EventKind, ListenerScope};
use crate::layout::Viewport;
use crate::settings::{BackdropMode, LayerOptions, TriggerId};
use crate::stack::{LayerInput, LayerStack};

/// Demo knobs not covered by [`GlobalConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoOptions {
    pub triggers: usize,
    /// Every k-th trigger gets a static backdrop; 0 disables.
    pub static_every: usize,
    /// Every k-th trigger gets a transparent backdrop; 0 disables.
    pub no_backdrop_every: usize,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            triggers: 5,
            static_every: 3,
            no_backdrop_every: 4,
        }
    }
}

/// Icons drawn in layer headers; CSS class names mean nothing in a terminal.
pub fn terminal_icons() -> ConfigPatch {
    ConfigPatch {
        icons: IconsPatch {
            close: Some("x".to_string()),
            refresh: Some("r".to_string()),
            maximize: Some("+".to_string()),
            minimize: Some("-".to_string()),
        },
        ..ConfigPatch::default()
    }
}

fn every(n: usize, k: usize) -> bool {
    k != 0 && n % k == 0
}

pub struct DemoApp {
    stack: LayerStack,
    triggers: Vec<TriggerId>,
    document: Vec<String>,
}

impl DemoApp {
    pub fn new(mut config: GlobalConfig, viewport: Viewport, options: DemoOptions) -> Self {
        config.merge(&terminal_icons());
        let mut loader = StaticLoader::new();
        for n in 1..=options.triggers {
            // Every fifth page is missing so the failure path is visible.
            if n % 5 != 0 {
                loader = loader.with_page(
                    format!("/pages/{n}"),
                    formatdoc! {"
                        Content of page {n}.

                        r reloads this layer, e toggles full width,
                        b clicks the backdrop, Esc closes the top layer.
                    "},
                );
            }
        }
        let mut stack = LayerStack::new(config, viewport).with_loader(loader);
        stack.on(ListenerScope::AnyTrigger, "all", |e| {
            if let Some(name) = e.args.first().and_then(|v| v.as_str()) {
                tracing::info!(trigger = %e.trigger, event = name, "lifecycle");
            }
        });

        let mut triggers = Vec::with_capacity(options.triggers);
        let mut document = vec!["Triggers:".to_string()];
        for n in 1..=options.triggers {
            let backdrop = if every(n, options.static_every) {
                BackdropMode::Static
            } else if every(n, options.no_backdrop_every) {
                BackdropMode::Transparent
            } else {
                BackdropMode::Visible
            };
            let mut attributes = LayerOptions::new()
                .title(format!("Panel {n}"))
                .url(format!("/pages/{n}"))
                .backdrop(backdrop)
                .refreshable(true);
            if n % 2 == 0 {
                attributes = attributes.name(format!("details-{n}"));
            }
            let options = LayerOptions::new().on(EventKind::Custom, |e| {
                if let Some((event, params)) = e.custom_parts() {
                    tracing::info!(event, params = params.len(), "custom event");
                }
            });
            let trigger = stack.init_trigger(&attributes, &options);
            document.push(format!("  [{n}] {trigger} backdrop={backdrop:?}"));
            triggers.push(trigger);
        }
        // A function source, to show both content paths.
        let clock = stack.init_trigger(
            &LayerOptions::new()
                .title("Clock")
                .name("clock")
                .source(ContentSource::function(|query| {
                    query
                        .get("tz")
                        .map(|tz| format!("It is always now in {tz}."))
                        .ok_or_else(|| ContentError::Rejected("no tz".to_string()))
                }))
                .query_params(|mut q| {
                    q.insert("tz".to_string(), "UTC".to_string());
                    q
                }),
            &LayerOptions::new(),
        );
        document.push(format!("  [clock] {clock}"));
        triggers.push(clock);

        Self {
            stack,
            triggers,
            document,
        }
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut LayerStack {
        &mut self.stack
    }

    pub fn document(&self) -> &[String] {
        &self.document
    }

    fn next_closed_trigger(&self) -> Option<TriggerId> {
        self.triggers
            .iter()
            .copied()
            .find(|t| self.stack.layer_for(*t).is_none())
    }

    /// Apply one demo command. Returns false once the demo should exit.
    pub fn apply(&mut self, action: Action) -> bool {
        let top = self.stack.state().active_top().map(|l| l.id());
        match action {
            Action::Quit => return false,
            Action::OpenNext => match self.next_closed_trigger() {
                Some(trigger) => {
                    self.stack.handle_input(LayerInput::Activate(trigger));
                }
                None => tracing::debug!("every trigger already has a layer"),
            },
            Action::CloseTop => {
                if let Some(id) = top {
                    self.stack.handle_input(LayerInput::CloseControl(id));
                }
            }
            Action::Escape => {
                self.stack.handle_input(LayerInput::Escape);
            }
            Action::BackdropClick => {
                self.stack.handle_input(LayerInput::BackdropClick);
            }
            Action::ToggleExpand => {
                if let Some(id) = top {
                    self.stack.handle_input(LayerInput::ExpandControl(id));
                }
            }
            Action::Refresh => {
                if let Some(id) = top {
                    self.stack.handle_input(LayerInput::RefreshControl(id));
                }
            }
            Action::CloseAll => {
                self.stack.close_all();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Body;

    fn app() -> DemoApp {
        let config = GlobalConfig {
            full_width_breakpoint: 40,
            distance_between_layers: 8,
            ..GlobalConfig::default()
        };
        DemoApp::new(config, Viewport::new(120, 40), DemoOptions::default())
    }

    #[test]
    fn open_next_walks_triggers_in_order() {
        let mut app = app();
        assert!(app.apply(Action::OpenNext));
        app.stack_mut().run_until_idle();
        assert!(app.apply(Action::OpenNext));
        app.stack_mut().run_until_idle();
        let names: Vec<&str> = app.stack().layers().map(|l| l.name()).collect();
        assert_eq!(names, vec!["layer1", "details2"]);
        let widths: Vec<u32> = app.stack().layers().map(|l| l.width()).collect();
        assert_eq!(widths, vec![96, 88]);
        assert!(matches!(
            app.stack().top().map(|l| l.body()),
            Some(Body::Loaded(_))
        ));
    }

    #[test]
    fn close_all_then_quit() {
        let mut app = app();
        for _ in 0..3 {
            app.apply(Action::OpenNext);
            app.stack_mut().run_until_idle();
        }
        assert_eq!(app.stack().len(), 3);
        app.apply(Action::CloseAll);
        app.stack_mut().run_until_idle();
        assert!(app.stack().is_empty());
        assert!(!app.apply(Action::Quit));
    }

    #[test]
    fn terminal_icons_replace_css_classes() {
        let app = app();
        assert_eq!(app.stack().config().icons.close, "x");
    }
}
