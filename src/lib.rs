//! Simplix client core
//!
//! Re-exports the client-side stores, the storage layer, and the remote
//! data boundary, plus a tracing bootstrap for binaries and examples.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use app_state;
pub use remote_data;
pub use storage;

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber
///
/// Reads `RUST_LOG` when set, defaulting to `info`. Safe to call more than
/// once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
