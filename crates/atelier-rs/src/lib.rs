//! Public SDK surface for Atelier.
//!
//! This crate re-exports the store, generation, config and studio crates and
//! provides a small initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use atelier_rs_config as config;
/// Re-export for convenience.
pub use atelier_rs_core as core;
/// Re-export for convenience.
pub use atelier_rs_generation as generation;
/// Re-export for convenience.
pub use atelier_rs_store as store;

pub use atelier_rs_config::AtelierConfig;
pub use atelier_rs_core::{CoreError, ImageRequest, Studio};

/// Initialize logging with env_logger, honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
#[inline]
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}
