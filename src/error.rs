//! Error types for the itrex evaluator

use thiserror::Error;

use crate::interop::InteropError;

/// itrex parse and evaluation errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    // Parse errors
    /// A structural token was invalid
    ///
    /// **Triggered by:** A closing bracket with no opener, a literal that cannot be represented
    /// **Example:** `[list 1 2]]`
    #[error("Malformed expression at position {position}: {message}")]
    MalformedExpression {
        /// Character offset where the problem was found
        position: usize,
        /// Error description
        message: String,
    },

    /// Input ended while groups (or a quoted string) were still open
    ///
    /// This is not a user-visible failure: an interactive caller should read
    /// more input and parse again.
    #[error("Unclosed group: {open} still open")]
    UnclosedGroup {
        /// Number of brackets still open (a pending quoted string counts as one)
        open: usize,
    },

    // Runtime errors
    /// Head of a sequence is not a registered function
    ///
    /// **Triggered by:** `[frobnicate 1 2]` when nothing registered `frobnicate`
    /// **Prevention:** `register` or `import` the function first
    #[error("No function {name}")]
    UnknownFunction {
        /// Name looked up in the registry chain
        name: String,
    },

    /// A function received too few arguments or an argument of the wrong shape
    #[error("{function}: {reason}")]
    ArityOrTypeError {
        /// Function reporting the problem
        function: String,
        /// What was wrong
        reason: String,
    },

    /// Type mismatch while converting a value
    ///
    /// **Triggered by:** `[toInt [list 1]]`
    #[error("Type error: expected {expected}, got {got}")]
    TypeError {
        /// Expected type
        expected: String,
        /// Actual type
        got: String,
    },

    /// `get` of a name bound nowhere in the context chain
    #[error("Undefined variable: {name}")]
    UndefinedVariable {
        /// Variable name
        name: String,
    },

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Iterator exhausted
    ///
    /// Expected terminal condition of the concurrent iterators, not a failure.
    #[error("No more elements")]
    NoMoreElements,

    /// A thread-scheduled evaluation or prefetch task failed or panicked
    #[error("Background task failed: {reason}")]
    BackgroundTask {
        /// Failure description
        reason: String,
    },

    /// Host object construction or invocation failed
    #[error("Interop error: {0}")]
    Interop(#[from] InteropError),

    /// Worker pool could not be built
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Reading or writing the shell streams failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// More input is needed before parsing can succeed
    Incomplete,
    /// Normal end of an iterator
    Exhausted,
    /// The current parse or evaluation failed
    Failure,
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }

    /// Create an arity/type error reported by `function`
    pub fn arity(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ArityOrTypeError {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Create a type error from the expected type name and the offending type name
    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Error::TypeError {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create a background task failure
    pub fn background(reason: impl Into<String>) -> Self {
        Error::BackgroundTask {
            reason: reason.into(),
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::UnclosedGroup { .. } => ErrorSeverity::Incomplete,
            Error::NoMoreElements => ErrorSeverity::Exhausted,
            _ => ErrorSeverity::Failure,
        }
    }

    /// True when the error only means "keep reading input"
    pub fn is_incomplete(&self) -> bool {
        self.classify() == ErrorSeverity::Incomplete
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Result type for itrex operations
pub type Result<T> = std::result::Result<T, Error>;
