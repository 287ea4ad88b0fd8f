use error_stack::Report;
use thiserror::Error;

// Error message prefixes
const MSG_FAILED_TO_PREFIX: &str = "Failed to";
const MSG_CANNOT_PREFIX: &str = "Cannot";

/// Result type for the `structbind` library
pub type Result<T> = std::result::Result<T, Report<Error>>;

/// Errors surfaced by a bind.
///
/// Every variant aborts the bind it occurs in. Once `bind` returns an error the
/// destination's state is indeterminate: fields visited before the failure may or
/// may not have been written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A field's directive is not of the form `name` or `name=hint`
    #[error("Invalid binding directive `{0}`: expected `name` or `name=hint`")]
    InvalidDirective(String),

    /// A directive names a strategy that was never registered
    #[error("No registered strategy for: {0}")]
    UnregisteredStrategy(String),

    /// An extraction strategy failed
    #[error("Extraction strategy failed: {0}")]
    Strategy(String),

    /// An extracted value could not be converted into its field's type
    #[error("Coercion failed for field `{field}`: {message}")]
    Coercion {
        /// Dotted path of the field, e.g. `embedded.sub_param1`
        field:   String,
        /// What went wrong while converting
        message: String,
    },
}

impl Error {
    /// Create a strategy error with a free-form message.
    pub fn strategy_failed(details: impl std::fmt::Display) -> Self {
        Self::Strategy(details.to_string())
    }

    /// Create a "Failed to X" strategy error
    pub fn failed_to(action: &str, details: impl std::fmt::Display) -> Self {
        Self::Strategy(format!("{MSG_FAILED_TO_PREFIX} {action}: {details}"))
    }

    /// Create a coercion error for the given field path
    pub fn coercion_failed(field: impl Into<String>, details: impl std::fmt::Display) -> Self {
        Self::Coercion {
            field:   field.into(),
            message: details.to_string(),
        }
    }

    /// Create a "Cannot X" coercion error for the given field path
    pub fn cannot_coerce(
        field: impl Into<String>,
        action: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Coercion {
            field:   field.into(),
            message: format!("{MSG_CANNOT_PREFIX} {action}: {reason}"),
        }
    }

    /// Return a copy of a coercion error with `parent` prepended to its field path.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn within(self, parent: &str) -> Self {
        match self {
            Self::Coercion { field, message } => Self::Coercion {
                field: format!("{parent}.{field}"),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::InvalidDirective("a=b=c".to_string()).to_string(),
            "Invalid binding directive `a=b=c`: expected `name` or `name=hint`"
        );
        assert_eq!(
            Error::UnregisteredStrategy("cookie".to_string()).to_string(),
            "No registered strategy for: cookie"
        );
        assert_eq!(
            Error::failed_to("decode body", "EOF").to_string(),
            "Extraction strategy failed: Failed to decode body: EOF"
        );
        assert_eq!(
            Error::cannot_coerce("port", "parse integer", "`abc`").to_string(),
            "Coercion failed for field `port`: Cannot parse integer: `abc`"
        );
    }

    #[test]
    fn test_within_prefixes_coercion_paths_only() {
        let nested = Error::coercion_failed("sub_param1", "bad").within("embedded");
        assert_eq!(
            nested,
            Error::Coercion {
                field:   "embedded.sub_param1".to_string(),
                message: "bad".to_string(),
            }
        );

        let untouched = Error::UnregisteredStrategy("query".to_string()).within("embedded");
        assert_eq!(untouched, Error::UnregisteredStrategy("query".to_string()));
    }
}
