//! Rich-text entity codec error types.

/// Entity codec error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CodecErrorKind {
    /// A span reaches past the end of its text
    #[display("Span {}+{} exceeds text length {}", offset, length, text_len)]
    SpanOutOfBounds {
        /// Span start, in UTF-16 code units
        offset: u32,
        /// Span length, in UTF-16 code units
        length: u32,
        /// Text length, in UTF-16 code units
        text_len: usize,
    },
}

/// Codec error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Codec Error: {} at line {} in {}", kind, line, file)]
pub struct CodecError {
    /// The kind of error that occurred
    pub kind: CodecErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CodecError {
    /// Create a new CodecError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CodecErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
