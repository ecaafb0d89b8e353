//! Tracing Setup
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a fmt
//! layer. Only the binary calls this; library users bring their own
//! subscriber.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: extra filter directives (default: `microcap_client=info`)

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter directive for this crate.
pub const DEFAULT_DIRECTIVE: &str = "microcap_client=info";

/// Build the filter from `RUST_LOG` plus the crate default.
#[must_use]
#[allow(clippy::expect_used)]
pub fn env_filter() -> EnvFilter {
    EnvFilter::from_default_env()
        .add_directive(
            DEFAULT_DIRECTIVE
                .parse()
                .expect("static directive 'microcap_client=info' is valid"),
        )
        .add_directive(
            "hyper=warn"
                .parse()
                .expect("static directive 'hyper=warn' is valid"),
        )
        .add_directive(
            "tungstenite=warn"
                .parse()
                .expect("static directive 'tungstenite=warn' is valid"),
        )
}

/// Install the global subscriber.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
    {
        eprintln!("Tracing subscriber already installed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directive_parses() {
        assert!(DEFAULT_DIRECTIVE.parse::<tracing_subscriber::filter::Directive>().is_ok());
    }

    #[test]
    fn init_twice_does_not_panic() {
        init();
        init();
    }
}
