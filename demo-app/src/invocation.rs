//! The process invocation as a binding source

use std::collections::HashMap;

use structbind::{Binder, FieldType, Value};

/// Command line arguments and environment of one run
#[derive(Debug, Default)]
pub struct Invocation {
    args: Vec<(String, String)>,
    env:  HashMap<String, String>,
}

impl Invocation {
    /// Split `key=value` arguments; a bare `key` is recorded as `key=true`
    pub fn new(
        args: impl IntoIterator<Item = String>,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let args = args
            .into_iter()
            .map(|arg| match arg.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (arg, "true".to_string()),
            })
            .collect();

        Self {
            args,
            env: env.into_iter().collect(),
        }
    }

    /// Capture the current process's arguments and environment
    pub fn capture() -> Self {
        Self::new(std::env::args().skip(1), std::env::vars())
    }

    fn arg_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.args
            .iter()
            .filter(move |(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Register the `arg` and `env` strategies.
///
/// `arg` binds every occurrence of a repeated argument to a sequence field and the last
/// occurrence to anything else. `env` reads a variable by exact name.
pub fn register_strategies(binder: &mut Binder<Invocation>) {
    binder
        .register("arg", |key: &str, field_type: &FieldType, invocation: &Invocation| {
            if field_type.shape().is_sequence() {
                let values: Vec<&str> = invocation.arg_values(key).collect();
                return Ok((!values.is_empty()).then(|| Value::from(values)));
            }
            Ok(invocation.arg_values(key).last().map(Value::from))
        })
        .register("env", |name: &str, _: &FieldType, invocation: &Invocation| {
            Ok(invocation.env.get(name).map(|value| Value::from(value.as_str())))
        });
}
