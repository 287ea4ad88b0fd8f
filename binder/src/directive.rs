//! Binding directive parsing.
//!
//! A directive is the string attached to a field through `#[bind("...")]`. It selects
//! a registered strategy and optionally passes it a hint, e.g. `query=page` or `body`.

use std::fmt;
use std::str::FromStr;

use error_stack::Report;

use crate::error::{Error, Result};

/// Separator between strategy name and hint
pub const HINT_SEPARATOR: char = '=';

/// A parsed binding directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    strategy: String,
    hint:     String,
}

impl Directive {
    /// Parse `name` or `name=hint`.
    ///
    /// The raw string is split on every separator, so more than one `=` is rejected
    /// with [`Error::InvalidDirective`]. A missing hint becomes the empty string.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split(HINT_SEPARATOR);
        let strategy = parts.next().unwrap_or_default();
        let hint = parts.next().unwrap_or_default();

        if parts.next().is_some() {
            return Err(Report::new(Error::InvalidDirective(raw.to_string()))
                .attach(format!("Found {} separators", raw.matches(HINT_SEPARATOR).count()))
                .attach("Expected: at most one `=`"));
        }

        Ok(Self {
            strategy: strategy.to_string(),
            hint:     hint.to_string(),
        })
    }

    /// Name of the strategy this directive dispatches to
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Hint handed to the strategy, empty when omitted
    pub fn hint(&self) -> &str {
        &self.hint
    }
}

impl FromStr for Directive {
    type Err = Report<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hint.is_empty() {
            f.write_str(&self.strategy)
        } else {
            write!(f, "{}{HINT_SEPARATOR}{}", self.strategy, self.hint)
        }
    }
}
