//! The full load, normalise and merge pipeline.

use anyhow::{Context, Result};
use log::info;
use polars::frame::DataFrame;

use crate::{
    config::Config,
    geo::read_geo_reference,
    merge::merge_all,
    normalize::{normalize_eci, normalize_exposure, normalize_trade},
    sources::read_csv_path,
};

/// The four raw tables the pipeline reads.
#[derive(Debug, Clone)]
pub struct Sources {
    pub eci: DataFrame,
    pub trade: DataFrame,
    pub exposure: DataFrame,
    pub geo: DataFrame,
}

impl Sources {
    /// Read every source from the paths in `config`
    pub fn load(config: &Config) -> Result<Self> {
        let paths = &config.sources;
        Ok(Self {
            eci: read_csv_path(&paths.eci)?,
            trade: read_csv_path(&paths.trade)?,
            exposure: read_csv_path(&paths.exposure)?,
            geo: read_geo_reference(&paths.geo)?,
        })
    }
}

/// Normalise the three metric sources and merge them onto the geo reference
pub fn run(sources: &Sources, config: &Config) -> Result<DataFrame> {
    let eci = normalize_eci(&sources.eci, &config.eci).context("Failed to normalise ECI data")?;
    info!("ECI values for {} countries", eci.height());
    let trade = normalize_trade(&sources.trade, &config.trade)
        .context("Failed to normalise trade data")?;
    info!("trade values for {} countries", trade.height());
    let exposure =
        normalize_exposure(&sources.exposure).context("Failed to normalise exposure data")?;
    info!("self exposure values for {} countries", exposure.height());

    Ok(merge_all(&sources.geo, &eci, &trade, &exposure)?)
}
