//! Top-level error wrapper types.

use crate::{CodecError, ConfigError, PlatformError, StoreError};

/// Every failure domain in the workspace.
///
/// # Examples
///
/// ```
/// use warden_error::{WardenError, ConfigError};
///
/// let err: WardenError = ConfigError::new("bad ttl").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum WardenErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Membership store error
    #[from(StoreError)]
    Store(StoreError),
    /// Chat platform error
    #[from(PlatformError)]
    Platform(PlatformError),
    /// Entity codec error
    #[from(CodecError)]
    Codec(CodecError),
}

/// Warden error with kind discrimination.
///
/// # Examples
///
/// ```
/// use warden_error::{WardenResult, StoreError, StoreErrorKind};
///
/// fn might_fail() -> WardenResult<()> {
///     Err(StoreError::new(StoreErrorKind::Unavailable("down".into())))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Warden Error: {}", _0)]
pub struct WardenError(Box<WardenErrorKind>);

impl WardenError {
    /// Create a new error from a kind.
    pub fn new(kind: WardenErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &WardenErrorKind {
        &self.0
    }
}

impl<T> From<T> for WardenError
where
    T: Into<WardenErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for warden operations.
pub type WardenResult<T> = std::result::Result<T, WardenError>;
