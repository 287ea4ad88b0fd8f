//! The traversal and dispatch engine.

use std::fmt;

use error_stack::Report;

use crate::coerce::Coercer;
use crate::config::BinderConfig;
use crate::descriptor::{Bindable, FieldBinding, FieldDescriptor, FieldType};
use crate::directive::Directive;
use crate::error::{Error, Result};
use crate::registry::{Registry, Strategy};
use crate::value::{Mapping, Value};

/// Binds sources of type `S` into [`Bindable`] destinations.
///
/// Register strategies first, then call [`Binder::bind`] as often as needed. Binding only
/// reads the registry, so a fully registered binder can be shared between threads.
pub struct Binder<S> {
    registry: Registry<S>,
    config:   BinderConfig,
}

impl<S> Binder<S> {
    /// Create a binder with no strategies and the default configuration
    pub fn new() -> Self {
        Self::from_registry(Registry::new())
    }

    /// Create a binder with no strategies and the given configuration
    pub fn with_config(config: BinderConfig) -> Self {
        Self {
            registry: Registry::new(),
            config,
        }
    }

    /// Wrap an already populated registry
    pub fn from_registry(registry: Registry<S>) -> Self {
        Self {
            registry,
            config: BinderConfig::default(),
        }
    }

    /// Register a closure strategy under `name`, replacing any previous registration
    pub fn register<F>(&mut self, name: impl Into<String>, strategy: F) -> &mut Self
    where
        F: Fn(&str, &FieldType, &S) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.registry.register(name, strategy);
        self
    }

    /// Register a [`Strategy`] implementation under `name`, replacing any previous
    /// registration
    pub fn register_strategy(
        &mut self,
        name: impl Into<String>,
        strategy: impl Strategy<S> + 'static,
    ) -> &mut Self {
        self.registry.register_strategy(name, strategy);
        self
    }

    /// Strategies known to this binder
    pub const fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// Configuration in effect
    pub const fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Populate `destination` from `source`.
    ///
    /// Walks the destination's fields in declaration order. A field with a directive is
    /// filled by the strategy it names; an undirected nested structure is walked with
    /// the same source; anything else is left alone. The collected values are then
    /// coerced into the destination in place. Fields whose strategy found nothing keep
    /// their current value.
    ///
    /// Fails fast on the first error. After an error the destination may be partially
    /// populated.
    pub fn bind<T: Bindable>(&self, source: &S, destination: &mut T) -> Result<()> {
        let destination_type = std::any::type_name::<T>();
        tracing::debug!(
            "Binding {destination_type} using {} registered strategies",
            self.registry.len()
        );

        let mapping = self
            .build_mapping(source, &T::field_descriptors(), None)
            .inspect_err(|report| {
                tracing::debug!("Extraction for {destination_type} failed: {report:?}");
            })?;

        let coercer = Coercer::new(self.config.coercion);
        destination
            .apply_mapping(mapping, &coercer)
            .inspect_err(|report| {
                tracing::debug!("Coercion into {destination_type} failed: {report:?}");
            })
    }

    fn build_mapping(
        &self,
        source: &S,
        fields: &[FieldDescriptor],
        parent: Option<&str>,
    ) -> Result<Mapping> {
        let mut mapping = Mapping::new();

        for field in fields {
            let path = parent.map_or_else(
                || field.name.to_string(),
                |parent| format!("{parent}.{}", field.name),
            );

            match field.binding {
                FieldBinding::Directive(raw) => {
                    if let Some(value) = self.extract(source, field, raw, &path)? {
                        mapping.insert(field.name, value);
                    }
                }
                FieldBinding::Nested(descriptors) => {
                    tracing::trace!("Descending into nested field '{path}'");
                    let nested = self.build_mapping(source, &descriptors(), Some(&path))?;
                    mapping.insert(field.name, Value::Map(nested));
                }
                FieldBinding::Unbound => {
                    tracing::trace!("Skipping field '{path}' without directive");
                }
            }
        }

        Ok(mapping)
    }

    fn extract(
        &self,
        source: &S,
        field: &FieldDescriptor,
        raw: &str,
        path: &str,
    ) -> Result<Option<Value>> {
        let directive =
            Directive::parse(raw).map_err(|report| report.attach(format!("Field: {path}")))?;

        let strategy = self.registry.get(directive.strategy()).ok_or_else(|| {
            Report::new(Error::UnregisteredStrategy(directive.strategy().to_string()))
                .attach(format!("Field: {path}"))
        })?;

        tracing::trace!(
            "Extracting '{path}' with strategy '{}' (hint '{}', type {})",
            directive.strategy(),
            directive.hint(),
            field.field_type.type_name()
        );

        let value = strategy
            .extract(directive.hint(), &field.field_type, source)
            .map_err(|report| {
                report.attach(format!(
                    "Strategy '{}' on field {path}",
                    directive.strategy()
                ))
            })?;

        match value {
            None | Some(Value::Null) => {
                tracing::debug!(
                    "Strategy '{}' found nothing for '{path}', keeping its current value",
                    directive.strategy()
                );
                Ok(None)
            }
            some => Ok(some),
        }
    }
}

impl<S> Default for Binder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Binder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::unreachable, reason = "tests")]

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::coerce::CoercionMode;

    type Args = HashMap<&'static str, &'static str>;

    #[derive(crate::Bindable, Debug, Default)]
    struct Inner {
        #[bind("arg=depth")]
        depth: u8,
        label: String,
    }

    #[derive(crate::Bindable, Debug, Default)]
    struct Outer {
        #[bind("arg=name")]
        name:  String,
        inner: Inner,
        #[bind("arg=verbose")]
        verbose: bool,
    }

    #[derive(crate::Bindable, Debug, Default)]
    struct Broken {
        #[bind("arg=a=b")]
        value: String,
    }

    #[derive(crate::Bindable, Debug, Default)]
    struct UsesCookie {
        #[bind("cookie=session")]
        session: String,
    }

    fn binder() -> Binder<Args> {
        let mut binder = Binder::new();
        binder.register("arg", |hint: &str, _: &FieldType, args: &Args| {
            Ok(args.get(hint).map(|value| Value::from(*value)))
        });
        binder
    }

    fn args(pairs: &[(&'static str, &'static str)]) -> Args {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_bind_nested_with_same_source() {
        let mut outer = Outer {
            inner: Inner {
                label: "kept".to_string(),
                ..Inner::default()
            },
            ..Outer::default()
        };

        binder()
            .bind(
                &args(&[("name", "ada"), ("depth", "3"), ("verbose", "t")]),
                &mut outer,
            )
            .unwrap();

        assert_eq!(outer.name, "ada");
        assert_eq!(outer.inner.depth, 3);
        assert_eq!(outer.inner.label, "kept");
        assert!(outer.verbose);
    }

    #[test]
    fn test_missing_values_keep_defaults() {
        let mut outer = Outer {
            name: "default".to_string(),
            ..Outer::default()
        };
        binder().bind(&args(&[]), &mut outer).unwrap();
        assert_eq!(outer.name, "default");
        assert_eq!(outer.inner.depth, 0);
    }

    #[test]
    fn test_invalid_directive() {
        let mut broken = Broken {
            value: "untouched".to_string(),
        };
        let report = binder().bind(&args(&[("a", "x")]), &mut broken).unwrap_err();
        assert_eq!(
            report.current_context(),
            &Error::InvalidDirective("arg=a=b".to_string())
        );
        assert_eq!(broken.value, "untouched");
    }

    #[test]
    fn test_unregistered_strategy() {
        let report = binder()
            .bind(&args(&[]), &mut UsesCookie::default())
            .unwrap_err();
        assert_eq!(
            report.current_context(),
            &Error::UnregisteredStrategy("cookie".to_string())
        );
    }

    #[test]
    fn test_strategy_error_aborts_before_later_fields() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut binder = Binder::<Args>::new();
        binder.register("arg", move |hint: &str, _: &FieldType, _: &Args| {
            counter.fetch_add(1, Ordering::SeqCst);
            if hint == "name" {
                Err(Report::new(Error::strategy_failed("source unavailable")))
            } else {
                Ok(Some(Value::from("1")))
            }
        });

        let mut outer = Outer::default();
        let report = binder.bind(&args(&[]), &mut outer).unwrap_err();

        assert_eq!(
            report.current_context(),
            &Error::Strategy("source unavailable".to_string())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!outer.verbose);
    }

    #[test]
    fn test_null_is_treated_as_absent() {
        let mut binder = Binder::<Args>::new();
        binder.register("arg", |_: &str, _: &FieldType, _: &Args| Ok(Some(Value::Null)));

        let mut outer = Outer {
            name: "default".to_string(),
            ..Outer::default()
        };
        binder.bind(&args(&[]), &mut outer).unwrap();
        assert_eq!(outer.name, "default");
    }

    #[test]
    fn test_nested_coercion_error_reports_path() {
        let report = binder()
            .bind(&args(&[("depth", "deep")]), &mut Outer::default())
            .unwrap_err();
        let Error::Coercion { field, .. } = report.current_context() else {
            unreachable!("expected a coercion error, got {report:?}");
        };
        assert_eq!(field, "inner.depth");
    }

    #[test]
    fn test_strict_config_refuses_string_numbers() {
        let mut binder =
            Binder::<Args>::with_config(BinderConfig::default().with_coercion(CoercionMode::Strict));
        binder.register("arg", |hint: &str, _: &FieldType, args: &Args| {
            Ok(args.get(hint).map(|value| Value::from(*value)))
        });

        let report = binder
            .bind(&args(&[("depth", "3")]), &mut Outer::default())
            .unwrap_err();
        assert!(matches!(report.current_context(), Error::Coercion { .. }));
    }

    #[test]
    fn test_binder_is_shareable_across_threads() {
        let binder = binder();
        let source = args(&[("name", "shared"), ("depth", "1")]);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let mut outer = Outer::default();
                    binder.bind(&source, &mut outer).unwrap();
                    assert_eq!(outer.name, "shared");
                });
            }
        });
    }

    #[test]
    fn test_field_descriptors_follow_declaration_order() {
        let names: Vec<&str> = Outer::field_descriptors()
            .iter()
            .map(|field| field.name)
            .collect();
        assert_eq!(names, ["name", "inner", "verbose"]);
        assert!(matches!(
            Inner::field_descriptors()[1].binding,
            FieldBinding::Unbound
        ));
    }
}
