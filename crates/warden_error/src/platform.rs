//! Chat platform error types.

/// Chat platform error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PlatformErrorKind {
    /// Transport-level failure (connect, timeout, TLS)
    #[display("HTTP error: {}", _0)]
    Http(String),

    /// Platform rejected the request
    #[display("API error {}: {}", code, description)]
    Api {
        /// Error code returned by the platform
        code: i64,
        /// Human-readable description from the platform
        description: String,
    },

    /// Bot lacks the rights required for the operation
    #[display("Permission denied: {}", _0)]
    PermissionDenied(String),

    /// Response body did not match the expected shape
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),

    /// Bot token rejected by the platform
    #[display("Invalid or revoked bot token")]
    InvalidToken,
}

/// Chat platform error with source location tracking.
///
/// # Examples
///
/// ```
/// use warden_error::{PlatformError, PlatformErrorKind};
///
/// let err = PlatformError::new(PlatformErrorKind::PermissionDenied("not enough rights".into()));
/// assert!(err.is_permission_denied());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Platform Error: {} at line {} in {}", kind, line, file)]
pub struct PlatformError {
    /// The kind of error that occurred
    pub kind: PlatformErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PlatformError {
    /// Create a new PlatformError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PlatformErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether the platform refused the call for lack of rights.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.kind, PlatformErrorKind::PermissionDenied(_))
    }
}
