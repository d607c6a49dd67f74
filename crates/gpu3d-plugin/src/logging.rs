//! Logging setup for a loaded plugin.

use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_FILTER;

/// Install a stderr `fmt` subscriber with the given filter directive.
///
/// Returns `false` when a global subscriber is already installed (by the
/// host or by a sibling plugin in the same process); that subscriber is left
/// in place. An unparsable directive falls back to `warn`.
pub fn init_logging(filter: &str) -> bool {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("gpu3d: invalid log filter '{filter}': {err}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .is_ok()
}

/// Run `f` with a thread-local subscriber and return what it logged.
#[cfg(test)]
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let buffer = Buffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&buffer.0.lock()).into_owned();
    (value, text)
}
