//! Configuration loading for the calculator engine.
//!
//! This module loads the engine configuration (server, logging and extra unit
//! conversions) from YAML, applies environment overrides, and parses the
//! YAML spec sidecars of the built-in calculators.
//!
//! # Example
//!
//! ```no_run
//! use clinical_calculators::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/engine.yaml").unwrap().apply_env().unwrap();
//! println!("Listening on {}", loader.config().server.address());
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, ENV_HOST, ENV_LOG_LEVEL, ENV_PORT};
pub use types::{
    DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_PORT, EngineConfig, LoggingConfig, ServerConfig,
    UnitConversionConfig,
};
