use thiserror::Error;

use crate::stack::StackTrace;

/// Classification of a [`SyntaxError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Input the grammar cannot parse (unterminated tag, incomplete builtin).
    Malformed,
    /// `[\x...` where `x` is neither an escape code nor a builtin.
    NoSuchBuiltin,
    /// `[\item]` outside of a loop body.
    LoopItemOutsideLoop,
}

/// Malformed markup, reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at {line},{column}: {message}\n  | {excerpt}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    /// Source line containing the offending markup.
    pub excerpt: String,
    pub line: usize,
    pub column: usize,
}

/// Errors that can occur while rendering markup.
#[derive(Debug, Error)]
pub enum TagupError {
    #[error("tag not found: {name}")]
    TagNotFound { name: String, trace: StackTrace },

    #[error("{error}")]
    Syntax {
        #[source]
        error: SyntaxError,
        trace: StackTrace,
    },

    #[error("named argument not found: {name}")]
    NamedArgumentNotFound { name: String, trace: StackTrace },

    #[error("positional argument not found: {index}")]
    PositionalArgumentNotFound { index: usize, trace: StackTrace },

    /// The message is the stack including the rejected entry.
    #[error("tag stack overflow: {message}")]
    StackOverflow { message: String, trace: StackTrace },

    #[error("tag stack underflow: {message}")]
    StackUnderflow { message: String, trace: StackTrace },

    /// The tag store does not provide a required capability.
    #[error("not implemented: {capability}")]
    NotImplemented {
        capability: &'static str,
        trace: StackTrace,
    },

    #[error("tag store failed to fetch {name}: {source}")]
    Store {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
        trace: StackTrace,
    },
}

/// Discriminant of [`TagupError`], convenient for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TagNotFound,
    Syntax,
    NamedArgumentNotFound,
    PositionalArgumentNotFound,
    StackOverflow,
    StackUnderflow,
    NotImplemented,
    Store,
}

impl TagupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TagupError::TagNotFound { .. } => ErrorKind::TagNotFound,
            TagupError::Syntax { .. } => ErrorKind::Syntax,
            TagupError::NamedArgumentNotFound { .. } => ErrorKind::NamedArgumentNotFound,
            TagupError::PositionalArgumentNotFound { .. } => {
                ErrorKind::PositionalArgumentNotFound
            }
            TagupError::StackOverflow { .. } => ErrorKind::StackOverflow,
            TagupError::StackUnderflow { .. } => ErrorKind::StackUnderflow,
            TagupError::NotImplemented { .. } => ErrorKind::NotImplemented,
            TagupError::Store { .. } => ErrorKind::Store,
        }
    }

    /// Tag stack snapshot taken when the error was raised.
    pub fn trace(&self) -> &StackTrace {
        match self {
            TagupError::TagNotFound { trace, .. }
            | TagupError::Syntax { trace, .. }
            | TagupError::NamedArgumentNotFound { trace, .. }
            | TagupError::PositionalArgumentNotFound { trace, .. }
            | TagupError::StackOverflow { trace, .. }
            | TagupError::StackUnderflow { trace, .. }
            | TagupError::NotImplemented { trace, .. }
            | TagupError::Store { trace, .. } => trace,
        }
    }

    pub(crate) fn syntax(error: SyntaxError, trace: StackTrace) -> Self {
        TagupError::Syntax { error, trace }
    }
}

/// Result type for rendering operations.
pub type TagupResult<T> = Result<T, TagupError>;
