//! Coordinator for a stack of slide-in overlay layers.
//!
//! [`stack::LayerStack`] owns the ordered stack, the single-flight
//! transition lock, width and z-index allocation, the shared backdrop and
//! lifecycle event dispatch. Time is virtual: hosts drive it with
//! [`stack::LayerStack::advance`].

pub mod actions;
pub mod animation;
pub mod backdrop;
pub mod config;
pub mod constants;
pub mod content;
pub mod demo;
pub mod drivers;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod keybindings;
pub mod layout;
pub mod log_buffer;
pub mod naming;
pub mod settings;
pub mod stack;
pub mod state;
pub mod tracing_sub;
pub mod ui;

pub use config::{ConfigPatch, GlobalConfig};
pub use content::{ContentLoader, ContentSource, StaticLoader};
pub use error::{ContentError, LayerError, LayerResult};
pub use events::{Emitted, EventKind, ListenerScope};
pub use layout::Viewport;
pub use settings::{BackdropMode, LayerOptions, TriggerId};
pub use stack::{LayerId, LayerInput, LayerStack, LayerState};
