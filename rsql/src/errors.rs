use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for RSQL compilation.
///
/// Fatal compilation failures carry the structured data a caller needs to build a
/// precise user-facing message: the offending character and offset for lexical
/// errors, the expected token kinds and position for syntax errors, the symbol for
/// unknown operators and the entity/attribute pair for semantic failures.
///
/// # Examples
///
/// ```rust
/// use rsql::errors::{ErrorKind, RsqlError, RsqlResult};
///
/// fn example() -> RsqlResult<()> {
///     Err(RsqlError::new(
///         "Unknown operator: =zz=",
///         ErrorKind::UnknownOperator("=zz=".to_string()),
///     ))
/// }
/// assert!(example().is_err());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Syntax Errors
    /// An input character does not start any token
    LexicalError {
        /// The offending character
        character: char,
        /// Zero-based character offset in the input
        offset: usize,
    },
    /// The token stream does not match the grammar
    SyntaxError {
        /// Token kinds that would have been accepted
        expected: Vec<String>,
        /// The token actually found
        found: String,
        /// The last token consumed successfully, if any
        last_token: Option<String>,
        /// One-based line of the offending token
        line: usize,
        /// One-based column of the offending token
        column: usize,
    },
    /// The comparison symbol is not registered
    UnknownOperator(String),

    // Semantic Errors
    /// The selector does not name an attribute of the entity
    UnknownSelector {
        /// The entity being resolved
        entity: String,
        /// The attribute that could not be found
        attribute: String,
    },
    /// The selector is rejected by a whitelist or blacklist
    AccessDenied {
        /// The entity being resolved
        entity: String,
        /// The rejected attribute
        attribute: String,
    },
    /// An argument could not be converted to the attribute type
    ConversionError {
        /// The raw argument
        value: String,
        /// The target type name
        value_type: String,
    },

    // Construction Errors
    /// An argument violates a construction invariant
    InvalidArgument,
    /// The operation is not valid in the current context
    InvalidOperation,

    // Collaborator Errors
    /// The predicate builder failed to produce a condition
    PredicateError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::LexicalError { character, offset } => {
                write!(f, "Lexical error at offset {}: '{}'", offset, character)
            }
            ErrorKind::SyntaxError { line, column, .. } => {
                write!(f, "Syntax error at line {}, column {}", line, column)
            }
            ErrorKind::UnknownOperator(symbol) => write!(f, "Unknown operator {}", symbol),
            ErrorKind::UnknownSelector { entity, attribute } => {
                write!(f, "Unknown selector {}.{}", entity, attribute)
            }
            ErrorKind::AccessDenied { entity, attribute } => {
                write!(f, "Access denied to {}.{}", entity, attribute)
            }
            ErrorKind::ConversionError { value, value_type } => {
                write!(f, "Conversion error: '{}' as {}", value, value_type)
            }
            ErrorKind::InvalidArgument => write!(f, "Invalid argument"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::PredicateError => write!(f, "Predicate error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom RSQL error type.
///
/// `RsqlError` encapsulates the error message, kind, and optional cause.
/// It supports error chaining and backtraces for debugging.
///
/// # Examples
///
/// ```rust
/// use rsql::errors::{ErrorKind, RsqlError};
///
/// let cause = RsqlError::new("bad digit", ErrorKind::InvalidArgument);
/// let err = RsqlError::new_with_cause("Cannot resolve age", ErrorKind::PredicateError, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct RsqlError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<RsqlError>>,
    backtrace: Arc<Backtrace>,
}

impl RsqlError {
    /// Creates a new `RsqlError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        RsqlError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `RsqlError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_type: ErrorKind, cause: RsqlError) -> Self {
        RsqlError {
            message: message.to_string(),
            error_kind: error_type,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&RsqlError> {
        self.cause.as_deref()
    }
}

impl Display for RsqlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for RsqlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for RsqlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for RSQL operations.
pub type RsqlResult<T> = Result<T, RsqlError>;

// Converter and predicate closures report failures through anyhow.
impl From<anyhow::Error> for RsqlError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<RsqlError>() {
            Ok(rsql_error) => rsql_error,
            Err(err) => RsqlError::new(&format!("{:#}", err), ErrorKind::PredicateError),
        }
    }
}
