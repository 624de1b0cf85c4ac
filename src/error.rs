//! Error kinds reported by the layer coordinator.
//!
//! None of these are fatal: an operation that fails is aborted, any
//! animation lock it acquired is released, and the stack stays usable.

use thiserror::Error;

/// Failure while resolving a layer's body content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// The content function or loader refused to produce content.
    #[error("content rejected: {0}")]
    Rejected(String),
    /// The transport failed before a response arrived.
    #[error("content transport failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// Missing or unusable configuration, e.g. no content source.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A layer with the same resolved name is already on the stack.
    #[error("a layer named \"{0}\" is already open")]
    DuplicateName(String),
    /// The trigger, layer or named layer does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Content(#[from] ContentError),
    /// The operation is not allowed in the current state.
    #[error("invalid state: {0}")]
    State(String),
}

pub type LayerResult<T> = Result<T, LayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_errors_convert_and_display() {
        let err: LayerError = ContentError::Transport("timeout".into()).into();
        assert_eq!(err.to_string(), "content transport failed: timeout");
        assert!(matches!(err, LayerError::Content(_)));
    }

    #[test]
    fn duplicate_name_message_names_layer() {
        let err = LayerError::DuplicateName("checkout".into());
        assert_eq!(err.to_string(), "a layer named \"checkout\" is already open");
    }
}
