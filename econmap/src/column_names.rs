//! This module stores the column names used across the pipeline: the names expected in the raw
//! source files and the names of the normalised and merged tables. Note that the raw names must be
//! kept in sync with the upstream files!

/// Join key of every normalised and merged table.
pub const COUNTRY_CODE: &str = "country_code";
pub const GEOMETRY: &str = "geometry";

// Merged metric columns
pub const ECI_TRADE: &str = "eci_trade";
pub const QUANTITY_MARKET_SHARE: &str = "quantity_market_share";
pub const SELF_EXPOSURE: &str = "self_exposure";

// ECI source
pub const ECI_COUNTRY: &str = "country";
pub const ECI_VARIABLE: &str = "variable";

// Trade competitiveness source
pub const TRADE_ECONOMY_ISO3: &str = "Economy ISO3";
pub const TRADE_INDICATOR: &str = "Indicator";
pub const TRADE_PARTNER: &str = "Partner";
pub const TRADE_ATTRIBUTE: &str = "Attribute 1";
pub const TRADE_ROW_MEAN: &str = "row_mean";

// Geo reference source
pub const GEO_ADM0_A3: &str = "ADM0_A3";

/// Suffix of the column added by `merge::clean_for_display`.
pub const CLEAN_SUFFIX: &str = "_clean";
