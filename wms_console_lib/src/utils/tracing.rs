//! Tracing initialization shared by the console binaries.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for a console process.
///
/// Respects `RUST_LOG` (defaults to "info") and keeps the output compact.
/// The returned guard must stay in scope for the lifetime of the process.
///
/// # Example
/// ```no_run
/// use wms_console_lib::init_tracing;
///
/// fn main() {
///     let _guard = init_tracing();
///     // client code here
/// }
/// ```
pub fn init_tracing() -> DefaultGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_default(subscriber)
}
