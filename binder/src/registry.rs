//! Named extraction strategies.

use std::collections::HashMap;
use std::fmt;

use crate::descriptor::FieldType;
use crate::error::Result;
use crate::value::Value;

/// Produces the value for one field from a source of type `S`.
///
/// Receives the directive's hint (empty when omitted) and the field's declared type.
/// Returning `Ok(None)` leaves the field untouched, which is how defaults survive a
/// bind when the source has nothing for them.
///
/// Any `Fn(&str, &FieldType, &S) -> Result<Option<Value>> + Send + Sync` is a strategy.
pub trait Strategy<S>: Send + Sync {
    /// Extract a value for a field
    fn extract(&self, hint: &str, field_type: &FieldType, source: &S) -> Result<Option<Value>>;
}

impl<S, F> Strategy<S> for F
where
    F: Fn(&str, &FieldType, &S) -> Result<Option<Value>> + Send + Sync,
{
    fn extract(&self, hint: &str, field_type: &FieldType, source: &S) -> Result<Option<Value>> {
        self(hint, field_type, source)
    }
}

/// Strategies keyed by the name used in binding directives
pub struct Registry<S> {
    strategies: HashMap<String, Box<dyn Strategy<S>>>,
}

impl<S> Registry<S> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Register a closure under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, strategy: F) -> &mut Self
    where
        F: Fn(&str, &FieldType, &S) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.register_strategy(name, strategy)
    }

    /// Register any [`Strategy`] implementation under `name`, replacing any previous
    /// registration.
    pub fn register_strategy(
        &mut self,
        name: impl Into<String>,
        strategy: impl Strategy<S> + 'static,
    ) -> &mut Self {
        let name = name.into();
        if self.strategies.insert(name.clone(), Box::new(strategy)).is_some() {
            tracing::debug!("Replaced extraction strategy '{name}'");
        } else {
            tracing::trace!("Registered extraction strategy '{name}'");
        }
        self
    }

    /// Whether a strategy is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered strategy names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    /// Number of registered strategies
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether no strategy is registered
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&dyn Strategy<S>> {
        self.strategies.get(name).map(AsRef::as_ref)
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("strategies", &names).finish()
    }
}
