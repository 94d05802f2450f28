//! Typed error taxonomy and exit-code mapping. `HashdotError` carries the
//! sub-kinds named in the error handling design; `main` downcasts the
//! `anyhow::Error` it gets back from the launch driver to one of these and
//! maps it to a process exit code, the same way the teacher's `main`
//! downcasts to its own `ExitCodeError`.

use thiserror::Error;

/// A parse failure, with the offending line and column for diagnostics.
#[derive(Debug, Error)]
#[error("{kind} at line {line:?}, column {column}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: String,
    pub column: usize,
}

#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum ParseErrorKind {
    #[error("name with no operator")]
    IncompleteExpression,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unterminated quoted string")]
    UnterminatedString,
    #[error("unterminated interpolation")]
    UnterminatedInterpolation,
    #[error("interpolation of unknown property")]
    UnknownProperty,
    #[error("multi-value interpolation used outside a quoted string")]
    NonScalarInterpolationInToken,
    #[error("value exceeds the maximum line length")]
    BufferOverflow,
}

/// Top-level error taxonomy for the launcher. Each variant maps to a
/// distinct exit-code class (see [HashdotError::exit_code]).
#[derive(Debug, Error)]
pub enum HashdotError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("profile include cycle: {0}")]
    ProfileCycle(String),

    #[error("classpath pattern matched no files: {0}")]
    GlobMiss(String),

    #[error("failed to load VM library: {0}")]
    VmLoad(String),

    #[error("VM failed to initialize: {0}")]
    VmInit(String),

    #[error("entry point not found: {0}")]
    EntryNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl HashdotError {
    /// Exit code class, per the external interface design: parse errors use
    /// codes above 10, mirroring the original source's numbering; other
    /// classes get their own fixed codes so scripts invoking `hashdot` can
    /// distinguish failure categories.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Parse(error) => 10 + error.kind.code(),
            Self::Config(_) => 1,
            Self::ProfileNotFound(_) => 2,
            Self::ProfileCycle(_) => 3,
            Self::GlobMiss(_) => 4,
            Self::VmLoad(_) => 5,
            Self::VmInit(_) => 6,
            Self::EntryNotFound(_) => 7,
            Self::Io { .. } => 8,
        }
    }
}

impl ParseErrorKind {
    fn code(self) -> u8 {
        match self {
            Self::IncompleteExpression => 1,
            Self::InvalidEscape => 2,
            Self::UnterminatedString => 3,
            Self::UnterminatedInterpolation => 4,
            Self::UnknownProperty => 5,
            Self::NonScalarInterpolationInToken => 6,
            Self::BufferOverflow => 7,
        }
    }
}
