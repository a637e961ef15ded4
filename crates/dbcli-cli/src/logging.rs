//! Diagnostic logging to stderr.

use tracing::Level;

/// The level to log at: `DEBUG` with `-v`, else the configured level, else
/// `WARN`.
pub fn level(verbose: bool, configured: Option<&str>) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    configured
        .and_then(|name| name.trim().parse().ok())
        .unwrap_or(Level::WARN)
}

/// Install the global subscriber. Standard output stays reserved for data.
pub fn init(verbose: bool, configured: Option<&str>) {
    let level = level(verbose, configured);
    // A subscriber installed earlier in the process wins.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
