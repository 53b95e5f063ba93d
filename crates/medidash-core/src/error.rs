use thiserror::Error;

/// Errors raised while fetching a dashboard resource.
///
/// `Clone` so a single in-flight fetch can hand the same outcome to every
/// subscriber attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: status {status}")]
    Status { status: u16, body: String },

    #[error("Malformed response body: {0}")]
    Decode(String),

    #[error("Cached payload for {key} has a different type")]
    TypeMismatch { key: String },
}

impl FetchError {
    /// Create a new Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a new Status error
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Create a new Decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Transport failures vs. anything the server actually answered.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) => ErrorCategory::Network,
            Self::Status { .. } | Self::Decode(_) | Self::TypeMismatch { .. } => {
                ErrorCategory::Response
            }
        }
    }

    /// HTTP status code, when the server answered.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a manual refetch has a reasonable chance of succeeding.
    ///
    /// Informational only; nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) | Self::TypeMismatch { .. } => false,
        }
    }
}

/// Error categories a view can render differently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Response,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Response => write!(f, "response"),
        }
    }
}

/// Invalid table interaction (bad page size, unknown status tab).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("Invalid page size {0}: allowed sizes are 10, 25, 100")]
    InvalidPageSize(usize),

    #[error("Unknown status filter: {0}")]
    UnknownStatusFilter(String),
}

/// Convenience result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error() {
        let err = FetchError::network("connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
        assert_eq!(err.http_status(), None);
    }

    #[test]
    fn test_status_error() {
        let err = FetchError::status(500, "boom");
        assert_eq!(err.to_string(), "HTTP error: status 500");
        assert_eq!(err.category(), ErrorCategory::Response);
        assert_eq!(err.http_status(), Some(500));
        assert!(err.is_retryable());

        let not_found = FetchError::status(404, "");
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_decode_is_response_category() {
        let err = FetchError::decode("expected value at line 1 column 1");
        assert_eq!(err.category(), ErrorCategory::Response);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Network.to_string(), "network");
        assert_eq!(ErrorCategory::Response.to_string(), "response");
    }

    #[test]
    fn test_view_error_messages() {
        assert_eq!(
            ViewError::InvalidPageSize(7).to_string(),
            "Invalid page size 7: allowed sizes are 10, 25, 100"
        );
        assert_eq!(
            ViewError::UnknownStatusFilter("Pending".into()).to_string(),
            "Unknown status filter: Pending"
        );
    }
}
