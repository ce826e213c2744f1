//! Tracing subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directive used for a given `-v` count.
///
/// Without `-v` the `RUST_LOG` environment variable decides, falling back to
/// warnings only.
fn directive(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("sgl_rs_sim=debug,sgl_rs_contracts=debug,sgl=debug,info"),
        _ => Some("trace"),
    }
}

/// Installs the global subscriber, logging to stderr.
pub fn init(verbose: u8) {
    let filter = match directive(verbose) {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose > 0);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_per_verbosity() {
        assert_eq!(directive(0), None);
        assert!(directive(1).unwrap().contains("sgl_rs_sim=debug"));
        assert_eq!(directive(5), Some("trace"));
    }
}
