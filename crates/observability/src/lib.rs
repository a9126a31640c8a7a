//! Process-wide logging setup shared by binaries and tests.

/// Tracing subscriber configuration.
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize logging with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::Json);
}

/// Initialize logging with the given output format.
pub fn init_with(format: LogFormat) {
    tracing::init(format);
}
