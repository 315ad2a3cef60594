//! Process-wide logging setup shared by the navgate binaries.

/// Initialize tracing for the process.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filter, output format).
pub mod tracing;
