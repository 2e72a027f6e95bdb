use thiserror::Error;

/// Failure while splitting the source string into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// A character outside of the language, or a lone `=`, `&` or `|`
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },
    /// Something that starts like a number but does not parse as one
    #[error("malformed number '{literal}' at offset {offset}")]
    MalformedNumber { literal: String, offset: usize },
}

impl LexError {
    /// Byte offset of the offending input
    pub fn offset(&self) -> usize {
        match *self {
            Self::UnexpectedCharacter { offset, .. } | Self::MalformedNumber { offset, .. } => {
                offset
            }
        }
    }
}

/// Failure while building a compiled expression from a source string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unmatched parenthesis at offset {offset}")]
    UnmatchedParenthesis { offset: usize },
    #[error("unknown function '{name}' at offset {offset}")]
    UnknownFunction { name: String, offset: usize },
    #[error("function '{name}' takes {expected} argument(s), found {found} at offset {offset}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        offset: usize,
    },
    #[error("function '{name}' used without arguments at offset {offset}")]
    MissingCall { name: String, offset: usize },
    #[error("expression nesting exceeds the maximum depth of {max} at offset {offset}")]
    DepthExceeded { max: usize, offset: usize },
    #[error("expression has more than {max} nodes")]
    TooManyNodes { max: usize },
    #[error("expression uses more than {max} distinct variables")]
    TooManyVariables { max: usize },
}

/// Failure to attach a compiled expression to a fixed calling convention.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("expected {expected} variable(s), expression requires {found}")]
    Arity { expected: usize, found: usize },
    #[error("variable '{name}' is not bound")]
    UnboundVariable { name: String },
    #[error("variable '{name}' is bound twice")]
    DuplicateName { name: String },
}

/// Evaluation did not produce a value.
///
/// Numeric trouble such as `1/0` or `sqrt(-1)` is never a fault, the IEEE-754
/// result is returned instead. The stack variants can only be reached by a
/// program that slipped past the construction-time bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalFault {
    #[error("internal error: evaluation stack exceeded its capacity of {capacity}")]
    StackOverflow { capacity: usize },
    #[error("internal error: evaluation stack underflow")]
    StackUnderflow,
    #[error("internal error: {remaining} value(s) left on the evaluation stack")]
    UnbalancedStack { remaining: usize },
    #[error("expected {expected} value(s), found {found}")]
    WrongValueCount { expected: usize, found: usize },
}

/// Any error produced by this crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("ParseError: {0}")]
    Parse(#[from] ParseError),
    #[error("BindingError: {0}")]
    Binding(#[from] BindingError),
    #[error("EvalFault: {0}")]
    Eval(#[from] EvalFault),
}

impl From<LexError> for Error {
    fn from(err: LexError) -> Self {
        Self::Parse(err.into())
    }
}
