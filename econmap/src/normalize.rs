//! Normalisation of each metric source into a `(country_code, metric)` table.
//!
//! Every normaliser returns a two-column `DataFrame`: `country_code` (String) and the metric
//! column (Float64). Missing values are nulls; `NaN` from parsing never leaves this module.

use log::{debug, warn};
use polars::prelude::*;

use crate::{
    config::{EciConfig, TradeConfig},
    error::{EconmapError, EconmapResult},
    sources::require_columns,
    COL,
};

pub const ECI_SOURCE: &str = "eci";
pub const TRADE_SOURCE: &str = "trade";
pub const EXPOSURE_SOURCE: &str = "exposure";

/// Coerce a column to Float64. Unparsable values and `NaN` become null.
fn numeric(column: &str) -> Expr {
    col(column).cast(DataType::Float64).fill_nan(lit(NULL))
}

/// Keep the rows tagged with `config.variable` and project them to
/// `(country_code, eci_trade)` using `config.year_column`. Rows without a value are dropped.
pub fn normalize_eci(raw: &DataFrame, config: &EciConfig) -> EconmapResult<DataFrame> {
    require_columns(
        raw,
        ECI_SOURCE,
        &[
            COL::ECI_COUNTRY,
            COL::ECI_VARIABLE,
            config.year_column.as_str(),
        ],
    )?;

    let tagged = raw
        .clone()
        .lazy()
        .filter(col(COL::ECI_VARIABLE).eq(lit(config.variable.as_str())))
        .select([
            col(COL::ECI_COUNTRY)
                .cast(DataType::String)
                .alias(COL::COUNTRY_CODE),
            numeric(&config.year_column).alias(COL::ECI_TRADE),
        ])
        .collect()?;

    if tagged.height() == 0 {
        return Err(EconmapError::EmptyResult {
            source_name: ECI_SOURCE.into(),
            label: config.variable.clone(),
        });
    }

    let eci = tagged
        .lazy()
        .filter(
            col(COL::COUNTRY_CODE)
                .is_not_null()
                .and(col(COL::ECI_TRADE).is_not_null()),
        )
        .collect()?;
    debug!("normalised ECI shape: {:?}", eci.shape());
    Ok(eci)
}

/// Filter the trade table on indicator, partner and attribute, average the quarter columns of
/// each row over the quarters that parse, then average those row means per economy.
pub fn normalize_trade(raw: &DataFrame, config: &TradeConfig) -> EconmapResult<DataFrame> {
    let mut required = vec![
        COL::TRADE_ECONOMY_ISO3,
        COL::TRADE_INDICATOR,
        COL::TRADE_PARTNER,
        COL::TRADE_ATTRIBUTE,
    ];
    required.extend(config.quarter_columns.iter().map(String::as_str));
    require_columns(raw, TRADE_SOURCE, &required)?;

    let quarters: Vec<Expr> = config
        .quarter_columns
        .iter()
        .map(|quarter| numeric(quarter))
        .collect();
    let available = quarters
        .iter()
        .map(|quarter| quarter.clone().is_not_null().cast(DataType::Float64))
        .reduce(|acc, count| acc + count)
        .ok_or_else(|| EconmapError::InvalidConfig("no trade quarter columns".into()))?;
    let total = quarters
        .iter()
        .map(|quarter| quarter.clone().fill_null(lit(0.0)))
        .reduce(|acc, value| acc + value)
        .ok_or_else(|| EconmapError::InvalidConfig("no trade quarter columns".into()))?;
    let row_mean = when(available.clone().gt(lit(0.0)))
        .then(total / available)
        .otherwise(lit(NULL).cast(DataType::Float64))
        .fill_nan(lit(NULL))
        .alias(COL::TRADE_ROW_MEAN);

    let filtered = raw
        .clone()
        .lazy()
        .filter(
            col(COL::TRADE_INDICATOR)
                .eq(lit(config.indicator.as_str()))
                .and(col(COL::TRADE_PARTNER).eq(lit(config.partner.as_str())))
                .and(col(COL::TRADE_ATTRIBUTE).eq(lit(config.attribute.as_str())))
                .and(col(COL::TRADE_ECONOMY_ISO3).is_not_null()),
        )
        .with_columns([row_mean])
        .collect()?;
    if filtered.height() == 0 {
        warn!(
            "no trade rows for indicator `{}` (partner `{}`, attribute `{}`)",
            config.indicator, config.partner, config.attribute
        );
    }

    // Two stage mean: the row means above, then their mean per economy
    let trade = filtered
        .lazy()
        .group_by_stable([col(COL::TRADE_ECONOMY_ISO3)])
        .agg([col(COL::TRADE_ROW_MEAN)
            .mean()
            .fill_nan(lit(NULL))
            .alias(COL::QUANTITY_MARKET_SHARE)])
        .select([
            col(COL::TRADE_ECONOMY_ISO3)
                .cast(DataType::String)
                .alias(COL::COUNTRY_CODE),
            col(COL::QUANTITY_MARKET_SHARE).cast(DataType::Float64),
        ])
        .collect()?;
    debug!("normalised trade shape: {:?}", trade.shape());
    Ok(trade)
}

/// Extract the diagonal of a country-by-country matrix whose first column holds the row labels.
/// Rows whose label has no matching column, or whose diagonal cell is not a number, are skipped.
pub fn normalize_exposure(raw: &DataFrame) -> EconmapResult<DataFrame> {
    let columns = raw.get_columns();
    let (labels, values) = match columns.split_first() {
        Some((labels, values)) if !values.is_empty() => (labels, values),
        _ => {
            return Err(EconmapError::schema(
                EXPOSURE_SOURCE,
                "country columns of the exposure matrix",
            ))
        }
    };
    let labels = labels.cast(&DataType::String)?;
    let values = values
        .iter()
        .map(|column| column.cast(&DataType::Float64))
        .collect::<PolarsResult<Vec<Series>>>()?;

    let mut countries: Vec<String> = vec![];
    let mut exposures: Vec<f64> = vec![];
    for (idx, label) in labels.str()?.into_iter().enumerate() {
        let Some(label) = label else { continue };
        let Some(column) = values.iter().find(|column| column.name() == label) else {
            debug!("exposure row `{label}` has no matching column");
            continue;
        };
        if let Some(value) = column.f64()?.get(idx).filter(|value| !value.is_nan()) {
            countries.push(label.to_string());
            exposures.push(value);
        }
    }

    let exposure = DataFrame::new(vec![
        Series::new(COL::COUNTRY_CODE, countries),
        Series::new(COL::SELF_EXPOSURE, exposures),
    ])?;
    debug!("normalised exposure shape: {:?}", exposure.shape());
    Ok(exposure)
}
