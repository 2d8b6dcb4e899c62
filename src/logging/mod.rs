//! Logging setup.
//!
//! Events always land in an in-memory [`LogBuffer`] so the shell can show
//! them with `logs`. One-shot commands also print them to stderr.
pub mod buffer;
pub mod collector;

pub use buffer::{LogBuffer, LogEntry};
pub use collector::LogCollector;

use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "warn,vip_parser=info";
pub const VERBOSE_FILTER: &str = "info,vip_parser=debug";

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool, buffer: Arc<LogBuffer>, console: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let console_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(LogCollector::new(buffer))
        .try_init();
}
