//! Joining the normalised metrics onto the geo reference.

use std::collections::HashSet;

use log::{debug, info, warn};
use polars::prelude::*;

use crate::{error::EconmapResult, sources::require_columns, COL};

pub const GEO_SOURCE: &str = "geo";

fn country_codes(df: &DataFrame) -> PolarsResult<Vec<String>> {
    Ok(df
        .column(COL::COUNTRY_CODE)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

/// Log codes that exist only in the metric table. These rows cannot appear in the merged table.
fn log_unmatched(
    geo_codes: &HashSet<String>,
    metric: &DataFrame,
    column: &str,
) -> PolarsResult<()> {
    let codes = country_codes(metric)?;
    let unique: HashSet<&String> = codes.iter().collect();
    if unique.len() != codes.len() {
        warn!(
            "{column} has {} duplicated country codes, matching geo rows will be repeated",
            codes.len() - unique.len()
        );
    }
    let unmatched: Vec<&String> = codes
        .iter()
        .filter(|code| !geo_codes.contains(*code))
        .collect();
    if !unmatched.is_empty() {
        info!(
            "{} {column} codes not in the geo reference: {:?}",
            unmatched.len(),
            unmatched
        );
    }
    Ok(())
}

/// Left join `geo_ref` with the ECI, trade and exposure tables in turn, keyed by `country_code`.
///
/// The result has one row per `geo_ref` row, in `geo_ref` order, with the columns
/// `country_code, eci_trade, quantity_market_share, self_exposure` followed by the remaining
/// `geo_ref` columns (e.g. `geometry`). Countries missing from a metric table get a null.
pub fn merge_all(
    geo_ref: &DataFrame,
    eci: &DataFrame,
    trade: &DataFrame,
    exposure: &DataFrame,
) -> EconmapResult<DataFrame> {
    require_columns(geo_ref, GEO_SOURCE, &[COL::COUNTRY_CODE])?;
    let geo_codes: HashSet<String> = country_codes(geo_ref)?.into_iter().collect();

    let mut merged = geo_ref.clone().lazy();
    for (metric, source_name, column) in [
        (eci, crate::normalize::ECI_SOURCE, COL::ECI_TRADE),
        (trade, crate::normalize::TRADE_SOURCE, COL::QUANTITY_MARKET_SHARE),
        (exposure, crate::normalize::EXPOSURE_SOURCE, COL::SELF_EXPOSURE),
    ] {
        require_columns(metric, source_name, &[COL::COUNTRY_CODE, column])?;
        log_unmatched(&geo_codes, metric, column)?;
        let right = metric.clone().lazy().select([
            col(COL::COUNTRY_CODE).cast(DataType::String),
            col(column).cast(DataType::Float64).fill_nan(lit(NULL)),
        ]);
        merged = merged.join(
            right,
            [col(COL::COUNTRY_CODE)],
            [col(COL::COUNTRY_CODE)],
            JoinArgs::new(JoinType::Left),
        );
    }

    let metric_columns = [
        COL::COUNTRY_CODE,
        COL::ECI_TRADE,
        COL::QUANTITY_MARKET_SHARE,
        COL::SELF_EXPOSURE,
    ];
    let merged = merged
        .select(&[
            col(COL::COUNTRY_CODE),
            col(COL::ECI_TRADE),
            col(COL::QUANTITY_MARKET_SHARE),
            col(COL::SELF_EXPOSURE),
            col("*").exclude(metric_columns),
        ])
        .collect()?;

    for column in &metric_columns[1..] {
        info!(
            "{column}: {} of {} countries without a value",
            merged.column(column)?.null_count(),
            merged.height()
        );
    }
    debug!("merged shape: {:?}", merged.shape());
    Ok(merged)
}

/// Add `<column>_clean` to `table`: infinities and missing values become zero and negative values
/// are clamped to zero. The original column is left as is.
pub fn clean_for_display(table: &DataFrame, column: &str) -> EconmapResult<DataFrame> {
    require_columns(table, "merged", &[column])?;
    let values = table.column(column)?.cast(&DataType::Float64)?;
    let cleaned: Vec<f64> = values
        .f64()?
        .into_iter()
        .map(|value| {
            value
                .filter(|value| value.is_finite())
                .map(|value| value.max(0.0))
                .unwrap_or(0.0)
        })
        .collect();

    let mut table = table.clone();
    table.with_column(Series::new(
        &format!("{column}{}", COL::CLEAN_SUFFIX),
        cleaned,
    ))?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EconmapError;

    fn geo_ref() -> DataFrame {
        df!(
            COL::COUNTRY_CODE => &["AUS", "NZL", "JPN", "ATA"],
            COL::GEOMETRY => &[
                "POINT (133 -25)",
                "POINT (174 -41)",
                "POINT (138 36)",
                "POINT (0 -90)"
            ]
        )
        .unwrap()
    }

    fn eci() -> DataFrame {
        df!(
            COL::COUNTRY_CODE => &["JPN", "AUS", "XKX"],
            COL::ECI_TRADE => &[2.2, 1.1, 0.1]
        )
        .unwrap()
    }

    fn trade() -> DataFrame {
        df!(
            COL::COUNTRY_CODE => &["AUS", "NZL"],
            COL::QUANTITY_MARKET_SHARE => &[Some(23.5), None]
        )
        .unwrap()
    }

    fn exposure() -> DataFrame {
        df!(
            COL::COUNTRY_CODE => &["NZL"],
            COL::SELF_EXPOSURE => &[0.7]
        )
        .unwrap()
    }

    fn values(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
        df.column(column).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn merge_should_keep_one_row_per_geo_row() {
        let merged = merge_all(&geo_ref(), &eci(), &trade(), &exposure()).unwrap();
        assert_eq!(merged.height(), geo_ref().height());
        assert_eq!(
            merged.get_column_names(),
            vec![
                COL::COUNTRY_CODE,
                COL::ECI_TRADE,
                COL::QUANTITY_MARKET_SHARE,
                COL::SELF_EXPOSURE,
                COL::GEOMETRY
            ]
        );
        let codes: Vec<Option<&str>> = merged
            .column(COL::COUNTRY_CODE)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            codes,
            vec![Some("AUS"), Some("NZL"), Some("JPN"), Some("ATA")],
            "Geo reference order should be kept and XKX dropped"
        );
    }

    #[test]
    fn merge_should_leave_unmatched_metrics_missing() {
        let merged = merge_all(&geo_ref(), &eci(), &trade(), &exposure()).unwrap();
        assert_eq!(
            values(&merged, COL::ECI_TRADE),
            vec![Some(1.1), None, Some(2.2), None]
        );
        assert_eq!(
            values(&merged, COL::QUANTITY_MARKET_SHARE),
            vec![Some(23.5), None, None, None]
        );
        assert_eq!(
            values(&merged, COL::SELF_EXPOSURE),
            vec![None, Some(0.7), None, None]
        );
    }

    #[test]
    fn merge_with_empty_metric_should_give_null_column() {
        let empty = DataFrame::new(vec![
            Series::new(COL::COUNTRY_CODE, Vec::<String>::new()),
            Series::new(COL::SELF_EXPOSURE, Vec::<f64>::new()),
        ])
        .unwrap();
        let merged = merge_all(&geo_ref(), &eci(), &trade(), &empty).unwrap();
        assert_eq!(merged.height(), 4);
        assert_eq!(merged.column(COL::SELF_EXPOSURE).unwrap().null_count(), 4);
        assert_eq!(
            merged.column(COL::SELF_EXPOSURE).unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn merge_should_turn_nan_metrics_into_missing_values() {
        let exposure = df!(
            COL::COUNTRY_CODE => &["AUS", "NZL"],
            COL::SELF_EXPOSURE => &[f64::NAN, 0.7]
        )
        .unwrap();
        let merged = merge_all(&geo_ref(), &eci(), &trade(), &exposure).unwrap();
        assert_eq!(
            values(&merged, COL::SELF_EXPOSURE),
            vec![None, Some(0.7), None, None]
        );
    }

    #[test]
    fn merge_without_country_code_should_be_a_schema_error() {
        let geo = df!(COL::GEO_ADM0_A3 => &["AUS"]).unwrap();
        assert!(matches!(
            merge_all(&geo, &eci(), &trade(), &exposure()),
            Err(EconmapError::Schema { .. })
        ));
    }

    #[test]
    fn clean_for_display_should_zero_unusable_values() {
        let table = df!(
            COL::QUANTITY_MARKET_SHARE => &[Some(-5.0), Some(f64::NAN), Some(f64::INFINITY), Some(3.0), None]
        )
        .unwrap();
        let cleaned = clean_for_display(&table, COL::QUANTITY_MARKET_SHARE).unwrap();
        assert_eq!(
            values(&cleaned, "quantity_market_share_clean"),
            vec![Some(0.0), Some(0.0), Some(0.0), Some(3.0), Some(0.0)]
        );
        assert_eq!(
            cleaned
                .column(COL::QUANTITY_MARKET_SHARE)
                .unwrap()
                .null_count(),
            1,
            "The raw column should be untouched"
        );
    }
}
