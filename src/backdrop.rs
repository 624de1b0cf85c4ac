//! The single dimming surface shared by all layers.
//!
//! The backdrop exists iff at least one layer is on the stack. It always
//! sits one z-index below the topmost layer and takes its appearance from
//! that layer's backdrop mode. The document scroll lock is tied to the same
//! lifetime: applied when the first layer arrives, released with the last.

use crate::settings::BackdropMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backdrop {
    pub z_index: i32,
    pub mode: BackdropMode,
}

impl Backdrop {
    /// Whether the dimming is drawn. A transparent backdrop still exists.
    pub fn visible(&self) -> bool {
        !matches!(self.mode, BackdropMode::Transparent)
    }

    /// Backdrops always intercept pointer input, even when invisible.
    pub fn blocks_input(&self) -> bool {
        true
    }

    /// Whether clicking it (or pressing Escape) may close the top layer.
    pub fn dismissible(&self) -> bool {
        !matches!(self.mode, BackdropMode::Static)
    }
}

/// Topmost layer as seen by the backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackdropTarget {
    pub z_index: i32,
    pub mode: BackdropMode,
}

#[derive(Debug, Default)]
pub struct BackdropManager {
    backdrop: Option<Backdrop>,
    scroll_locked: bool,
}

impl BackdropManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backdrop(&self) -> Option<Backdrop> {
        self.backdrop
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Bring the backdrop in line with the current top of the stack.
    pub fn reconcile(&mut self, top: Option<BackdropTarget>) {
        let Some(top) = top else {
            if self.backdrop.take().is_some() {
                tracing::debug!("last layer gone, backdrop removed");
            }
            self.scroll_locked = false;
            return;
        };
        if !self.scroll_locked {
            self.scroll_locked = true;
            tracing::debug!("document scroll locked");
        }
        let next = Backdrop {
            z_index: top.z_index.saturating_sub(1),
            mode: top.mode,
        };
        if self.backdrop != Some(next) {
            tracing::debug!(z_index = next.z_index, mode = ?next.mode, "backdrop restacked");
        }
        self.backdrop = Some(next);
    }
}
