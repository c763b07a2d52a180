//! The metrics carried by the merged table.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::COL;

/// A metric column of the merged table. Parses from and displays as its column name.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Metric {
    EciTrade,
    QuantityMarketShare,
    SelfExposure,
}

impl Metric {
    pub fn column(&self) -> &'static str {
        match self {
            Metric::EciTrade => COL::ECI_TRADE,
            Metric::QuantityMarketShare => COL::QUANTITY_MARKET_SHARE,
            Metric::SelfExposure => COL::SELF_EXPOSURE,
        }
    }

    /// Human readable label, as offered to map viewers
    pub fn label(&self) -> &'static str {
        match self {
            Metric::EciTrade => "Economic Complexity Index (ECI)",
            Metric::QuantityMarketShare => "Trade Market Share",
            Metric::SelfExposure => "Self Exposure",
        }
    }
}

/// Coverage and range of one metric column of a merged table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub metric: Metric,
    pub present: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl MetricSummary {
    /// Summarise `metric` in `merged`. Infinite values count as present but are left out of the
    /// range and mean.
    pub fn from_merged(merged: &DataFrame, metric: Metric) -> PolarsResult<Self> {
        let values = merged.column(metric.column())?.cast(&DataType::Float64)?;
        let values = values.f64()?;
        let missing = values.null_count();
        let finite: Vec<f64> = values.into_iter().flatten().filter(|v| v.is_finite()).collect();
        let min = finite.iter().copied().reduce(f64::min);
        let max = finite.iter().copied().reduce(f64::max);
        let mean = (!finite.is_empty()).then(|| finite.iter().sum::<f64>() / finite.len() as f64);
        Ok(Self {
            metric,
            present: values.len() - missing,
            missing,
            min,
            max,
            mean,
        })
    }

    pub fn all(merged: &DataFrame) -> PolarsResult<Vec<Self>> {
        use strum::IntoEnumIterator;
        Metric::iter()
            .map(|metric| Self::from_merged(merged, metric))
            .collect()
    }
}
