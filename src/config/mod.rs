//! Engine Configuration Module
//!
//! Every analytics threshold is loaded from TOML so operators can tune
//! species- or site-specific behaviour without a rebuild.
//!
//! ## Loading Order
//!
//! 1. `AQUAMETRICS_CONFIG` environment variable (path to TOML file)
//! 2. `aquametrics.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Engine components take an explicit `&EngineConfig` (or an `Arc` of one).
//! Binaries call `config::init()` once and read the global with `config::get()`:
//!
//! ```ignore
//! config::init(EngineConfig::load());
//! let ttl = config::get().analysis.cache_ttl_secs;
//! ```

mod engine_config;
pub mod defaults;
pub mod validation;

pub use engine_config::*;

use std::sync::OnceLock;

static ENGINE_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Initialize the global engine configuration. Later calls are ignored.
pub fn init(config: EngineConfig) {
    if ENGINE_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// The global configuration, or built-in defaults if `init()` was never called.
pub fn get() -> &'static EngineConfig {
    ENGINE_CONFIG.get_or_init(|| {
        tracing::debug!("config::get() before init, using built-in defaults");
        EngineConfig::default()
    })
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    ENGINE_CONFIG.get().is_some()
}
