//! Writers for the merged table. These are the hand-off to whatever renders the map.

use anyhow::{anyhow, Result};
use enum_dispatch::enum_dispatch;
use geo::geometry::Geometry;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{Cursor, Write};
use wkt::TryFromWkt;

use crate::{metric::Metric, COL};

/// Utility function to convert from polars `AnyValue` to `serde_json::Value`
/// Doesn't cover all types but those the merged table can hold.
fn any_value_to_json(value: &AnyValue) -> Result<Value> {
    match value {
        AnyValue::Null => Ok(Value::Null),
        AnyValue::Boolean(b) => Ok(Value::Bool(*b)),
        AnyValue::String(s) => Ok(Value::String((*s).to_string())),
        AnyValue::StringOwned(s) => Ok(Value::String(s.to_string())),
        AnyValue::Int32(n) => Ok(json!(*n)),
        AnyValue::Int64(n) => Ok(json!(*n)),
        AnyValue::UInt32(n) => Ok(json!(*n)),
        AnyValue::UInt64(n) => Ok(json!(*n)),
        // Non-finite floats serialise as null
        AnyValue::Float32(n) => Ok(json!(*n)),
        AnyValue::Float64(n) => Ok(json!(*n)),
        _ => Err(anyhow!("Failed to convert type")),
    }
}

/// Build one GeoJSON feature per row that has a geometry. All other columns become properties.
fn features(df: &DataFrame) -> Result<Vec<geojson::Feature>> {
    let geometry_col = df.column(COL::GEOMETRY)?;
    let other_cols = df.drop(COL::GEOMETRY)?;
    let mut features: Vec<geojson::Feature> = vec![];

    for (idx, geom) in geometry_col.str()?.into_iter().enumerate() {
        if let Some(wkt_str) = geom {
            let geom: Geometry<f64> = Geometry::try_from_wkt_str(wkt_str)
                .map_err(|_| anyhow!("Failed to parse geometry"))?;
            let mut properties = serde_json::Map::new();
            for col in other_cols.get_columns() {
                let val = any_value_to_json(&col.get(idx)?)?;
                properties.insert(col.name().to_string(), val);
            }
            features.push(geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::from(&geom)),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }
    Ok(features)
}

/// Trait to define different output generators. Defines two
/// functions, format which generates a serialized string of the
/// `DataFrame` and save which writes it to a writer
#[enum_dispatch]
pub trait OutputGenerator {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()>;
    fn format(&self, df: &mut DataFrame) -> Result<String> {
        let mut data: Vec<u8> = vec![];
        let mut buff = Cursor::new(&mut data);
        self.save(&mut buff, df)?;

        Ok(String::from_utf8(data)?)
    }
}

/// Enum of OutputFormatters one for each potential
/// output type
#[enum_dispatch(OutputGenerator)]
#[derive(Serialize, Deserialize, Debug)]
pub enum OutputFormatter {
    GeoJSON(GeoJSONFormatter),
    GeoJSONSeq(GeoJSONSeqFormatter),
    Csv(CSVFormatter),
}

/// Format the results as geojson sequence format
/// This is one line per feature serialized as a
/// geojson feature
#[derive(Serialize, Deserialize, Debug)]
pub struct GeoJSONSeqFormatter;

impl OutputGenerator for GeoJSONSeqFormatter {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        for feature in features(df)? {
            writeln!(writer, "{feature}")?;
        }
        Ok(())
    }
}

/// Format the results as a CSV file with the geometry as WKT
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CSVFormatter;

impl OutputGenerator for CSVFormatter {
    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        CsvWriter::new(writer).finish(df)?;
        Ok(())
    }
}

/// Format the results as a geojson `FeatureCollection`. When `metric` is set the collection
/// carries `metric` and `metric_label` members naming the column to shade by.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GeoJSONFormatter {
    pub metric: Option<Metric>,
}

impl OutputGenerator for GeoJSONFormatter {
    fn format(&self, df: &mut DataFrame) -> Result<String> {
        let foreign_members = self.metric.map(|metric| {
            let mut members = serde_json::Map::new();
            members.insert("metric".into(), json!(metric.column()));
            members.insert("metric_label".into(), json!(metric.label()));
            members
        });
        let feature_collection = geojson::FeatureCollection {
            bbox: None,
            features: features(df)?,
            foreign_members,
        };
        Ok(feature_collection.to_string())
    }

    fn save(&self, writer: &mut impl Write, df: &mut DataFrame) -> Result<()> {
        let result = self.format(df)?;
        writer.write_all(result.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_df() -> DataFrame {
        df!(
             "country_code" => &["AUS", "NZL", "JPN"],
             "eci_trade" => &[Some(1.5), None, Some(2.25)],
             "geometry" => &["POINT (0 0)", "POINT (20 20)", "POINT (30 44)"]
        )
        .unwrap()
    }

    fn expected_features() -> Vec<Value> {
        vec![
            json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}, "properties": {"country_code": "AUS", "eci_trade": 1.5}}),
            json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [20.0, 20.0]}, "properties": {"country_code": "NZL", "eci_trade": null}}),
            json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [30.0, 44.0]}, "properties": {"country_code": "JPN", "eci_trade": 2.25}}),
        ]
    }

    #[test]
    fn geojson_formatter_should_work() {
        let formatter = GeoJSONFormatter::default();
        let mut df = test_df();
        let output = formatter.format(&mut df);
        assert!(output.is_ok(), "Output should not error");
        // Key order depends on the geojson version, so compare parsed values
        let value: Value = serde_json::from_str(&output.unwrap()).unwrap();
        let expected = json!({"type": "FeatureCollection", "features": expected_features()});
        assert_eq!(value, expected, "Output should be correct");
    }

    #[test]
    fn geojson_formatter_should_name_the_metric() {
        let formatter = GeoJSONFormatter {
            metric: Some(Metric::SelfExposure),
        };
        let output = formatter.format(&mut test_df()).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["metric"], json!("self_exposure"));
        assert_eq!(value["metric_label"], json!("Self Exposure"));
        assert_eq!(value["features"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn geojson_formatter_should_skip_rows_without_geometry() {
        let mut df = df!(
            "country_code" => &["AUS", "NZL"],
            "geometry" => &[Some("POINT (0 0)"), None]
        )
        .unwrap();
        let output = GeoJSONFormatter::default().format(&mut df).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["features"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn geojsonseq_formatter_should_work() {
        let formatter = GeoJSONSeqFormatter;
        let mut df = test_df();
        let output = formatter.format(&mut df);
        assert!(output.is_ok(), "Output should not error");
        let output = output.unwrap();
        assert!(output.ends_with('\n'), "Every feature should end its line");

        let features: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(features, expected_features(), "Output should be correct");
    }

    #[test]
    fn csv_formatter_should_work() {
        let formatter = CSVFormatter;
        let mut df = test_df();
        let output = formatter.format(&mut df);
        let correct_str = [
            "country_code,eci_trade,geometry",
            "AUS,1.5,POINT (0 0)",
            "NZL,,POINT (20 20)",
            "JPN,2.25,POINT (30 44)",
            "",
        ]
        .join("\n");

        assert!(output.is_ok(), "Output should not error");
        assert_eq!(output.unwrap(), correct_str, "Output should be correct");
    }
}
