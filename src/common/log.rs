use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_tree::HierarchicalLayer;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "SPLITDESK_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber. Output goes to stderr so it never mixes
/// with command output on stdout. Calling this twice is harmless.
pub fn init_logging() {
    let tree = HierarchicalLayer::new(2)
        .with_writer(std::io::stderr)
        .with_targets(true)
        .with_indent_lines(true);
    let _ = tracing_subscriber::registry().with(filter()).with(tree).try_init();
}
