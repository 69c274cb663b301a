use thiserror::Error;

use crate::lexer::Bracket;

/// Why a token stream failed bracket validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketFault {
    /// A closer arrived while nothing was open.
    TooManyClosers(Bracket),
    /// A closer did not match the innermost open bracket.
    Mismatched { open: Bracket, close: Bracket },
    /// An application definition was opened inside another bracket.
    NestedDefinition,
    /// The input ended with this bracket kind still open.
    Unterminated(Bracket),
}

impl core::fmt::Display for BracketFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BracketFault::TooManyClosers(kind) => {
                write!(f, "too many closing brackets of type '{}'", kind.close_char())
            }
            BracketFault::Mismatched { open, close } => write!(
                f,
                "mismatched kinds: '{}' closed by '{}'",
                open.open_char(),
                close.close_char()
            ),
            BracketFault::NestedDefinition => f.write_str(
                "nested function definition: application definitions must appear at the top level",
            ),
            BracketFault::Unterminated(kind) => {
                write!(f, "unterminated '{}'", kind.open_char())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid function table: {0}")]
    Interchange(#[from] serde_json::Error),
    #[error("unbalanced brackets: {0}")]
    UnbalancedBrackets(BracketFault),
    #[error("malformed literal '{0}'")]
    MalformedLiteral(String),
    #[error("invalid application name '{0}': names may only contain letters and underscores")]
    InvalidName(String),
    #[error("application name '{0}' is reserved")]
    ReservedName(String),
    #[error("application '{0}' is defined more than once")]
    DuplicateName(String),
    #[error("the parameter '$' may only be used inside an application definition")]
    ParameterOutsideApplication,
    #[error("address {0} is out of range")]
    AddressOutOfRange(i64),
    #[error("'{0}' cannot be used as an accessor")]
    InvalidAccessor(String),
    #[error("unknown token '{0}'")]
    UnknownToken(String),
    #[error("structural error: {0}")]
    Structure(String),
    #[error("call depth exceeded the limit of {0}")]
    CallDepthExceeded(usize),
}
