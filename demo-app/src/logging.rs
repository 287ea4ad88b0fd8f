use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Environment variable holding either a level or a full filter directive
pub const LOG_ENV: &str = "STRUCTBIND_LOG";

/// Levels accepted in `STRUCTBIND_LOG`
#[derive(strum::EnumString, strum::Display, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TracingLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl TracingLevel {
    /// Filter enabling this level for the library and the demo
    fn filter(self) -> EnvFilter {
        EnvFilter::new(format!("structbind={self},structbind_demo={self}"))
    }
}

/// Build the filter from a `STRUCTBIND_LOG` value.
///
/// A bare level applies to both crates; anything else is read as an `EnvFilter`
/// directive. Unusable values fall back to `warn`.
pub fn filter_from(setting: Option<&str>) -> EnvFilter {
    let Some(setting) = setting.map(str::trim).filter(|setting| !setting.is_empty()) else {
        return TracingLevel::default().filter();
    };

    if let Ok(level) = setting.parse::<TracingLevel>() {
        return level.filter();
    }

    EnvFilter::try_new(setting).unwrap_or_else(|_| TracingLevel::default().filter())
}

/// Install a stderr subscriber filtered by `STRUCTBIND_LOG`
pub fn init_tracing() {
    let setting = std::env::var(LOG_ENV).ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    Registry::default()
        .with(filter_from(setting.as_deref()))
        .with(stderr_layer)
        .init();

    if let Some(setting) = setting {
        tracing::debug!("Tracing initialised from {LOG_ENV}={setting}");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, reason = "tests")]

    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_tracing_level_from_str() {
        assert_eq!(TracingLevel::from_str("error").unwrap(), TracingLevel::Error);
        assert_eq!(TracingLevel::from_str("TRACE").unwrap(), TracingLevel::Trace);
        assert!(TracingLevel::from_str("verbose").is_err());
        assert_eq!(TracingLevel::Debug.to_string(), "debug");
    }

    #[test]
    fn test_filter_from_setting() {
        let level = filter_from(Some("debug")).to_string();
        assert!(level.contains("structbind=debug"), "{level}");
        assert!(level.contains("structbind_demo=debug"), "{level}");

        let fallback = filter_from(Some("  ")).to_string();
        assert!(fallback.contains("structbind=warn"), "{fallback}");

        assert_eq!(filter_from(Some("structbind=trace")).to_string(), "structbind=trace");
    }
}
