use thiserror::Error;

use crate::device::DeviceId;

/// Common error type for netmon components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A node id that is not part of the current graph.
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// An edge id that is not part of the current graph.
    #[error("Unknown edge: {0}")]
    UnknownEdge(String),

    /// The unordered pair is already connected.
    #[error("Nodes {source_id} and {target_id} are already connected")]
    DuplicateEdge {
        source_id: String,
        target_id: String,
    },

    #[error("A node cannot be connected to itself: {0}")]
    SelfLoop(String),

    #[error("Device {0} is not in the device catalog")]
    UnknownDevice(DeviceId),

    #[error("Please select a topology first")]
    NoActiveTopology,

    /// The document loaded, but some of its contents were rejected.
    #[error("Corrupt topology document: {}", .issues.join("; "))]
    CorruptDocument { issues: Vec<String> },

    /// Any failed call to the device catalog or topology storage service.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Validation failed: {0}")]
    ValidationFailure(String),
}

impl Error {
    /// Whether the failure should be shown to the operator.
    ///
    /// Duplicate-edge and self-loop rejections during connection mode are
    /// recovered locally by resetting the pending selection.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Error::DuplicateEdge { .. } | Error::SelfLoop(_))
    }

    /// Whether the failure is a warning that does not block the editor.
    pub fn is_warning(&self) -> bool {
        matches!(self, Error::CorruptDocument { .. })
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailure(msg.into())
    }

    /// Create a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkFailure(msg.into())
    }

    /// The text to carry across a task boundary and rewrap with
    /// [`Error::network`]. A network failure yields its bare detail so the
    /// prefix is not repeated.
    pub fn into_network_message(self) -> String {
        match self {
            Error::NetworkFailure(message) => message,
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::NetworkFailure(e.to_string())
    }
}

/// Result type alias using netmon's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_visibility() {
        assert!(Error::NoActiveTopology.is_user_visible());
        assert!(Error::validation("name is required").is_user_visible());
        assert!(Error::network("timeout").is_user_visible());
        assert!(!Error::SelfLoop("a".into()).is_user_visible());
        assert!(
            !Error::DuplicateEdge {
                source_id: "a".into(),
                target_id: "b".into()
            }
            .is_user_visible()
        );
    }

    #[test]
    fn test_network_message_is_not_prefixed_twice() {
        let message = Error::network("connection refused").into_network_message();
        assert_eq!(message, "connection refused");
        assert_eq!(
            Error::network(message).to_string(),
            "Network failure: connection refused"
        );
        assert_eq!(
            Error::validation("bad").into_network_message(),
            "Validation failed: bad"
        );
    }

    #[test]
    fn test_corrupt_document_message() {
        let err = Error::CorruptDocument {
            issues: vec!["edge e1 references missing node n9".into(), "x".into()],
        };
        assert!(err.is_warning());
        assert_eq!(
            err.to_string(),
            "Corrupt topology document: edge e1 references missing node n9; x"
        );
    }
}
