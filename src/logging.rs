use crate::config::LOG_FILTER_VAR;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Directives come from `ALSH_LOG` (default `warn`). Output goes to stderr so
/// it never ends up in a pipe or a redirected file.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}
