use anyhow::Result;
use log::debug;
use pipeline::Sources;
use polars::frame::DataFrame;

use crate::config::Config;

// Re-exports
pub use column_names as COL;

// Modules
pub mod column_names;
pub mod config;
pub mod error;
#[cfg(feature = "formatters")]
pub mod formatters;
pub mod geo;
pub mod merge;
pub mod metric;
pub mod normalize;
pub mod pipeline;
pub mod sources;

/// Type for the econmap pipeline
pub struct Econmap {
    pub config: Config,
}

impl Econmap {
    /// Setup the Econmap object with default configuration
    pub fn new() -> Self {
        Self::new_with_config(Config::default())
    }

    /// Setup the Econmap object with custom configuration
    pub fn new_with_config(config: Config) -> Self {
        debug!("config: {config:?}");
        Self { config }
    }

    /// Reads the four sources named in the configuration
    pub fn load_sources(&self) -> Result<Sources> {
        Sources::load(&self.config)
    }

    /// Reads the sources and returns the merged table
    pub fn merged(&self) -> Result<DataFrame> {
        let sources = self.load_sources()?;
        pipeline::run(&sources, &self.config)
    }
}

impl Default for Econmap {
    fn default() -> Self {
        Self::new()
    }
}
