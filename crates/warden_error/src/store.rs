//! Membership store error types.

/// Membership store error conditions.
///
/// A missing record is not an error; store lookups return `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// Backing store could not be reached
    #[display("Store unavailable: {}", _0)]
    Unavailable(String),
    /// Write rejected because of a conflicting record
    #[display("Store conflict: {}", _0)]
    Conflict(String),
    /// Record could not be encoded or decoded
    #[display("Serialization error: {}", _0)]
    Serialization(String),
}

/// Store error with source location tracking.
///
/// # Examples
///
/// ```
/// use warden_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::Unavailable("connection reset".to_string()));
/// assert!(format!("{}", err).contains("unavailable"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new StoreError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
