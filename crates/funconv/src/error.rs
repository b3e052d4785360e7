//! Error types for signature adaptation
//!
//! Two classes of failure exist:
//!
//! - **Construction-time** failures ([`SignatureAdapterError::Structural`], or an
//!   [`Argument`](SignatureAdapterError::Argument) / [`Return`](SignatureAdapterError::Return)
//!   position with no conversion strategy) are reported by the build step and
//!   never yield an adapter.
//! - **Invocation-time** failures are conversions that fail on a concrete
//!   value. They are routed through the adapted function's error slot.
//!
//! All user-facing positions are 1-based.
//!
//! # Example
//! ```rust,ignore
//! use funconv::SignatureAdapterError;
//!
//! let err = SignatureAdapterError::argument(1, "i64 cannot be converted to String");
//! assert_eq!(err.to_string(), "argument 2, i64 cannot be converted to String");
//! ```

use crate::types::Type;
use thiserror::Error;

/// Error produced while building or invoking an adapted function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureAdapterError {
    /// Converting argument `position` (0-based) failed
    #[error("argument {}, {}", .position + 1, .cause)]
    Argument {
        /// Zero-based argument position
        position: usize,
        /// Why the conversion failed
        cause: String,
    },

    /// Converting return variable `position` (0-based) failed
    #[error("return variable {}, {}", .position + 1, .cause)]
    Return {
        /// Zero-based result position
        position: usize,
        /// Why the conversion failed
        cause: String,
    },

    /// The two signatures cannot be adapted at all
    #[error("{cause}")]
    Structural {
        /// Description of the mismatch
        cause: String,
    },
}

impl SignatureAdapterError {
    /// Create an argument error for the zero-based `position`.
    pub fn argument(position: usize, cause: impl Into<String>) -> Self {
        Self::Argument {
            position,
            cause: cause.into(),
        }
    }

    /// Create a return variable error for the zero-based `position`.
    pub fn returned(position: usize, cause: impl Into<String>) -> Self {
        Self::Return {
            position,
            cause: cause.into(),
        }
    }

    /// Create a structural error.
    pub fn structural(cause: impl Into<String>) -> Self {
        Self::Structural {
            cause: cause.into(),
        }
    }

    /// Zero-based position of the failing slot, if the error has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Argument { position, .. } | Self::Return { position, .. } => Some(*position),
            Self::Structural { .. } => None,
        }
    }

    /// The underlying cause without the position prefix.
    pub fn cause(&self) -> &str {
        match self {
            Self::Argument { cause, .. }
            | Self::Return { cause, .. }
            | Self::Structural { cause } => cause,
        }
    }

    /// Returns true for construction-time structural mismatches.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }
}

/// A positional conversion failure reported by a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at {position}, {cause}")]
pub struct ConversionFailure {
    /// Zero-based position that failed
    pub position: usize,
    /// Why it failed
    pub cause: String,
}

impl ConversionFailure {
    /// Create a new failure.
    pub fn new(position: usize, cause: impl Into<String>) -> Self {
        Self {
            position,
            cause: cause.into(),
        }
    }
}

/// No conversion strategy exists between two types at a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at {position}, {from} cannot be converted to {to}")]
pub struct Incompatible {
    /// Zero-based position
    pub position: usize,
    /// Type values arrive in
    pub from: Type,
    /// Type values must be converted into
    pub to: Type,
}

/// Error raised when a [`Function`](crate::Function) is called with values
/// that do not match its signature, or when its body breaks the signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Wrong number of arguments
    #[error("argument count mismatch, expected {expected}, got {found}")]
    Arity {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        found: usize,
    },

    /// An argument is not of the declared parameter type
    #[error("argument {}, {} used as {}", .position + 1, .found, .expected)]
    ArgumentType {
        /// Zero-based argument position
        position: usize,
        /// Declared type name
        expected: String,
        /// Supplied type name
        found: String,
    },

    /// The body produced the wrong number of results
    #[error("result count mismatch, expected {expected}, got {found}")]
    ResultArity {
        /// Declared result count
        expected: usize,
        /// Produced result count
        found: usize,
    },

    /// A result is not of the declared result type
    #[error("return variable {}, {} used as {}", .position + 1, .found, .expected)]
    ResultType {
        /// Zero-based result position
        position: usize,
        /// Declared type name
        expected: String,
        /// Produced type name
        found: String,
    },

    /// A nested adapted function failed without an error slot
    #[error(transparent)]
    Adapter(#[from] SignatureAdapterError),
}

impl From<CallError> for SignatureAdapterError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::ArgumentType { position, .. } => {
                Self::argument(position, strip_position(&err))
            }
            CallError::ResultType { position, .. } => {
                Self::returned(position, strip_position(&err))
            }
            CallError::Arity { .. } | CallError::ResultArity { .. } => {
                Self::structural(err.to_string())
            }
            CallError::Adapter(inner) => inner,
        }
    }
}

fn strip_position(err: &CallError) -> String {
    match err {
        CallError::ArgumentType {
            expected, found, ..
        }
        | CallError::ResultType {
            expected, found, ..
        } => format!("{found} used as {expected}"),
        other => other.to_string(),
    }
}

/// Result type alias for adapter operations.
pub type AdapterResult<T> = Result<T, SignatureAdapterError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDescriptor;

    #[test]
    fn test_conversion_failure_display() {
        let err = ConversionFailure::new(123, "some error");
        assert_eq!(err.to_string(), "at 123, some error");
    }

    #[test]
    fn test_incompatible_display() {
        let err = Incompatible {
            position: 123,
            from: TypeDescriptor::concrete::<String>("String").shared(),
            to: TypeDescriptor::concrete::<i64>("i64").shared(),
        };
        assert_eq!(err.to_string(), "at 123, String cannot be converted to i64");
    }

    #[test]
    fn test_positions_are_one_based() {
        let err = SignatureAdapterError::argument(0, "boom");
        assert_eq!(err.to_string(), "argument 1, boom");
        assert_eq!(err.position(), Some(0));

        let err = SignatureAdapterError::returned(2, "boom");
        assert_eq!(err.to_string(), "return variable 3, boom");
        assert_eq!(err.cause(), "boom");
    }

    #[test]
    fn test_structural_has_no_position() {
        let err = SignatureAdapterError::structural("srcFunc cannot be nil");
        assert!(err.is_structural());
        assert_eq!(err.position(), None);
        assert_eq!(err.to_string(), "srcFunc cannot be nil");
    }

    #[test]
    fn test_call_error_maps_to_positional_adapter_error() {
        let err: SignatureAdapterError = CallError::ArgumentType {
            position: 1,
            expected: "String".into(),
            found: "i64".into(),
        }
        .into();
        assert_eq!(err, SignatureAdapterError::argument(1, "i64 used as String"));

        let err: SignatureAdapterError = CallError::Arity {
            expected: 2,
            found: 1,
        }
        .into();
        assert!(err.is_structural());
    }
}
