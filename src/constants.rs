//! Shared crate-wide constants.

use std::time::Duration;

/// Suffix appended to every event name emitted on a trigger.
pub const EVENT_NAMESPACE: &str = ".layer";

/// Reserved catch-all event name. Firing it never re-mirrors to itself.
pub const CATCH_ALL_EVENT: &str = "all";

/// Reserved event name used by the named-layer custom event entry point.
pub const CUSTOM_EVENT: &str = "custom-event";

/// Quiescence window for resize handling.
///
/// Resize notifications arriving within this window of each other collapse
/// into a single relayout that runs once the window elapses after the last
/// one.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(120);

/// Fraction of the viewport used as the "previous layer" width when the
/// layer below cannot report a rendered width.
pub const FALLBACK_PREVIOUS_FRACTION: f64 = 0.8;

/// Prefix of the placeholder name given to layers without a configured name.
pub const PLACEHOLDER_NAME_PREFIX: &str = "layer";
