use serde::{Deserialize, Serialize};

/// Paths to the four raw sources.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SourcePaths {
    pub eci: String,
    pub trade: String,
    pub exposure: String,
    pub geo: String,
}

impl Default for SourcePaths {
    fn default() -> Self {
        SourcePaths {
            eci: "dataset/multidimensional_eci_data.csv".into(),
            trade: "dataset/Export COMPET_.csv".into(),
            exposure: "dataset/Fig2a-avg_exposure.csv".into(),
            // Natural Earth admin 0 countries, converted from the shapefile release
            geo: "map/ne_110m_admin_0_countries.geojson".into(),
        }
    }
}

/// Selection applied to the ECI table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EciConfig {
    pub variable: String,
    pub year_column: String,
}

impl Default for EciConfig {
    fn default() -> Self {
        EciConfig {
            variable: "eci_trade".into(),
            year_column: "x2019".into(),
        }
    }
}

/// Selection and averaging applied to the trade competitiveness table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TradeConfig {
    pub indicator: String,
    pub partner: String,
    pub attribute: String,
    pub quarter_columns: Vec<String>,
}

impl Default for TradeConfig {
    fn default() -> Self {
        TradeConfig {
            indicator: "Adjusted export market share - Quantity (delta log)".into(),
            partner: "World".into(),
            attribute: "All".into(),
            quarter_columns: ["2018q1", "2018q2", "2018q3", "2018q4"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub sources: SourcePaths,
    pub eci: EciConfig,
    pub trade: TradeConfig,
}
