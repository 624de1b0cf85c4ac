//! Runtime layers and the controller that orchestrates them.

mod layer_stack;

pub use layer_stack::LayerStack;

use std::fmt;
use std::time::Duration;

use crate::config::GlobalConfig;
use crate::content::{Content, ContentTicket};
use crate::layout::{Viewport, ease_in_out};
use crate::settings::{LayerSettings, TriggerId};

/// Identity of an open layer. Derived from the trigger that owns it, so a
/// trigger can never have two layers at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub(crate) u64);

impl From<TriggerId> for LayerId {
    fn from(trigger: TriggerId) -> Self {
        LayerId(trigger.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer_{}", self.0)
    }
}

/// Observable lifecycle states. `Closed` and `Removed` mean the layer does
/// not exist, so they have no representation here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    Opening,
    Open,
    Closing,
}

impl LayerState {
    /// Whether content arriving now should still be shown.
    pub fn accepts_content(self) -> bool {
        matches!(self, LayerState::Opening | LayerState::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Loading,
    Loaded(Content),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    In,
    Out,
}

/// A running slide animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub direction: SlideDirection,
    pub started: Duration,
    pub duration: Duration,
}

impl Transition {
    /// Linear progress in `0..=1` at `now`.
    pub fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCause {
    /// Direct call through the trigger or the coordinator.
    Api,
    CloseControl,
    Escape,
    BackdropClick,
    CloseAll,
}

/// User and host input the coordinator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerInput {
    Activate(TriggerId),
    CloseControl(LayerId),
    RefreshControl(LayerId),
    ExpandControl(LayerId),
    BackdropClick,
    Escape,
    Resize(Viewport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Refresh,
    Expand,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeControl {
    pub kind: ControlKind,
    pub icon: String,
}

/// Header of a layer: title plus the controls it offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chrome {
    pub title: Option<String>,
    pub controls: Vec<ChromeControl>,
}

impl Chrome {
    pub fn has(&self, kind: ControlKind) -> bool {
        self.controls.iter().any(|c| c.kind == kind)
    }
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub(crate) trigger: TriggerId,
    pub(crate) name: String,
    pub(crate) settings: LayerSettings,
    pub(crate) title: Option<String>,
    pub(crate) width: u32,
    pub(crate) z_index: i32,
    pub(crate) expanded: bool,
    pub(crate) covered: bool,
    pub(crate) state: LayerState,
    pub(crate) body: Body,
    pub(crate) ticket: Option<ContentTicket>,
    /// Set while a refresh is in flight so its completion also fires
    /// `refresh`.
    pub(crate) refreshing: bool,
    pub(crate) transition: Option<Transition>,
}

impl Layer {
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn trigger(&self) -> TriggerId {
        self.trigger
    }

    /// Resolved stack-unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &LayerSettings {
        &self.settings
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }

    /// Another layer sits above this one.
    pub fn covered(&self) -> bool {
        self.covered
    }

    pub fn state(&self) -> LayerState {
        self.state
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn transition(&self) -> Option<Transition> {
        self.transition
    }

    /// How far the layer is pushed off its edge at `now`, in `0..=width`.
    pub fn slide_offset(&self, now: Duration) -> u32 {
        let Some(t) = self.transition else {
            return 0;
        };
        let eased = ease_in_out(t.progress(now));
        let hidden = match t.direction {
            SlideDirection::In => 1.0 - eased,
            SlideDirection::Out => eased,
        };
        (f64::from(self.width) * hidden).round() as u32
    }

    /// Header controls, in display order. The expand toggle is hidden when
    /// every layer is forced to full width anyway.
    pub fn chrome(&self, config: &GlobalConfig, full_width: bool) -> Chrome {
        let icons = &config.icons;
        let mut controls = Vec::new();
        if self.settings.refreshable {
            controls.push(ChromeControl {
                kind: ControlKind::Refresh,
                icon: icons.refresh.clone(),
            });
        }
        if self.settings.expandable && !full_width {
            let icon = if self.expanded {
                &icons.minimize
            } else {
                &icons.maximize
            };
            controls.push(ChromeControl {
                kind: ControlKind::Expand,
                icon: icon.clone(),
            });
        }
        if self.settings.closeable {
            controls.push(ChromeControl {
                kind: ControlKind::Close,
                icon: icons.close.clone(),
            });
        }
        Chrome {
            title: self.title.clone(),
            controls,
        }
    }
}
