use serde::{Deserialize, Serialize};

use crate::coerce::CoercionMode;

/// Settings for a [`Binder`](crate::Binder).
///
/// Deserializable so a host application can carry it in its own configuration file;
/// missing keys fall back to their defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct BinderConfig {
    /// Leniency of the coercion step
    pub coercion: CoercionMode,
}

impl BinderConfig {
    /// Replace the coercion mode
    #[must_use]
    pub const fn with_coercion(mut self, coercion: CoercionMode) -> Self {
        self.coercion = coercion;
        self
    }
}
