//! # structbind demo
//!
//! Binds `key=value` command line arguments and environment variables into a typed
//! options structure, then prints it.
//!
//! ```text
//! STRUCTBIND_LOG=debug structbind_demo host=0.0.0.0 port=8080 tag=a tag=b verbose
//! ```
//!
//! `STRUCTBIND_COERCION=strict` switches off cross-kind conversions.

mod invocation;
mod logging;

use error_stack::Report;
use serde::Deserialize;
use structbind::{Bindable, Binder, BinderConfig, CoercionMode};

use crate::invocation::Invocation;

/// Environment variable selecting the coercion mode
const COERCION_ENV: &str = "STRUCTBIND_COERCION";

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

#[derive(Bindable, Debug)]
struct Limits {
    #[bind("arg=max-connections")]
    max_connections: u32,
    #[bind("env=STRUCTBIND_DEMO_TIMEOUT")]
    timeout_secs:    u64,
}

#[derive(Bindable, Debug)]
struct ServeOptions {
    #[bind("arg=host")]
    host:    String,
    #[bind("arg=port")]
    port:    u16,
    #[bind("arg=tag")]
    tags:    Vec<String>,
    #[bind("arg=verbose")]
    verbose: bool,
    #[bind("arg=format")]
    format:  OutputFormat,
    #[bind("env=HOME")]
    home:    Option<String>,
    limits:  Limits,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            host:    "127.0.0.1".to_string(),
            port:    3000,
            tags:    Vec::new(),
            verbose: false,
            format:  OutputFormat::default(),
            home:    None,
            limits:  Limits {
                max_connections: 64,
                timeout_secs:    30,
            },
        }
    }
}

impl ServeOptions {
    fn summary(&self) -> String {
        format!(
            "{}:{} tags={:?} verbose={} home={} max_connections={} timeout={}s",
            self.host,
            self.port,
            self.tags,
            self.verbose,
            self.home.as_deref().unwrap_or("-"),
            self.limits.max_connections,
            self.limits.timeout_secs
        )
    }
}

fn binder_config() -> BinderConfig {
    let Ok(setting) = std::env::var(COERCION_ENV) else {
        return BinderConfig::default();
    };

    match setting.parse::<CoercionMode>() {
        Ok(mode) => BinderConfig::default().with_coercion(mode),
        Err(_) => {
            tracing::warn!(
                "Ignoring {COERCION_ENV}={setting}: expected `weak` or `strict`"
            );
            BinderConfig::default()
        }
    }
}

fn main() -> Result<(), Report<structbind::Error>> {
    logging::init_tracing();

    let mut binder = Binder::with_config(binder_config());
    invocation::register_strategies(&mut binder);

    let invocation = Invocation::capture();
    let mut options = ServeOptions::default();
    binder.bind(&invocation, &mut options)?;

    tracing::info!("Bound options with {} coercion", binder.config().coercion);
    match options.format {
        OutputFormat::Pretty => println!("{options:#?}"),
        OutputFormat::Compact => println!("{}", options.summary()),
    }

    Ok(())
}
