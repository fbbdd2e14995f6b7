//! Error types for the warden moderation bot.
//!
//! This crate provides the foundation error types used throughout the warden workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use warden_error::{WardenResult, ConfigError};
//!
//! fn load_token() -> WardenResult<String> {
//!     Err(ConfigError::new("telegram.token is required"))?
//! }
//!
//! assert!(load_token().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod config;
mod error;
mod platform;
mod store;

pub use codec::{CodecError, CodecErrorKind};
pub use config::ConfigError;
pub use error::{WardenError, WardenErrorKind, WardenResult};
pub use platform::{PlatformError, PlatformErrorKind};
pub use store::{StoreError, StoreErrorKind};
