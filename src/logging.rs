// Logging setup for hosts embedding the library

use tracing_subscriber::EnvFilter;

/// Install a `tracing` fmt subscriber writing to stderr.
///
/// `filter` takes `RUST_LOG` syntax; when `None`, `RUST_LOG` is read and
/// falls back to `info`. Returns false if a global subscriber was already
/// installed (by the host or an earlier call).
pub fn init_logging(filter: Option<&str>) -> bool {
    let env_filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        // Whichever test installs first wins; a repeat call must not panic
        let _ = init_logging(Some("debug"));
        assert!(!init_logging(None));
    }
}
