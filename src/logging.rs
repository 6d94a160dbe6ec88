// File logging; the terminal belongs to the TUI

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "enigma=info,reqwest=warn,hyper_util=warn";

/// Install the global subscriber writing to `<log_dir>/enigma.log.<date>`.
///
/// Keep the returned guard alive for the whole session or buffered lines are lost.
pub fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_appender = tracing_appender::rolling::daily(log_dir, "enigma.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    // try_init: a subscriber may already be set (tests)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();

    guard
}
