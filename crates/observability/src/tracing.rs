//! Tracing/logging initialization.
//!
//! Structured JSON lines on stdout, filtered via `RUST_LOG`. Operational
//! queries ("which approvals conflicted today") grep these lines, so the
//! span fields written by the store and engine layers are part of the
//! output contract.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging with the `RUST_LOG` filter (default `info`).
///
/// Safe to call multiple times (subsequent calls are no-ops), which keeps
/// test binaries that share a process from panicking on double init.
pub fn init() {
    init_with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
}

/// Initialize with an explicit filter; used by tests that want debug spans
/// from one crate without flipping the whole environment.
pub fn init_with_filter(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
