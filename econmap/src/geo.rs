use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};

use crate::{error::EconmapError, COL};
use anyhow::{Context, Result};
use flatgeobuf::{FallibleStreamingIterator, FeatureProperties, FgbReader};
use geojson::{FeatureCollection, GeoJson};
use geozero::ToWkt;
use log::{debug, info};
use polars::{frame::DataFrame, prelude::NamedFrom, series::Series};

const GEO_SOURCE: &str = "geo";

/// Read the geo reference from a GeoJSON (`.geojson`/`.json`) or FlatGeobuf (`.fgb`) file.
///
/// Returns: a `DataFrame` with one row per feature and the columns `country_code` (taken from the
/// `ADM0_A3` property) and `geometry` (WKT).
pub fn read_geo_reference<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let df = match extension.as_str() {
        "geojson" | "json" => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            geo_reference_from_geojson(&contents)?
        }
        "fgb" => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            geo_reference_from_fgb(&mut BufReader::new(file))?
        }
        _ => return Err(EconmapError::UnsupportedFormat(path.display().to_string()).into()),
    };
    info!("loaded {} features from {}", df.height(), path.display());
    Ok(df)
}

/// Build the geo reference from a GeoJSON `FeatureCollection`
pub fn geo_reference_from_geojson(contents: &str) -> Result<DataFrame> {
    let geojson: GeoJson = contents.parse()?;
    let collection = FeatureCollection::try_from(geojson)?;

    let mut geoms: Vec<String> = vec![];
    let mut ids: Vec<String> = vec![];

    for feature in collection.features {
        let id = feature
            .property(COL::GEO_ADM0_A3)
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| EconmapError::schema(GEO_SOURCE, COL::GEO_ADM0_A3))?;
        let geometry = feature
            .geometry
            .with_context(|| format!("feature {id} has no geometry"))?;
        let geometry: ::geo::Geometry<f64> = geometry.try_into()?;
        geoms.push(wkt::ToWkt::wkt_string(&geometry));
        ids.push(id);
    }
    debug!("read {} GeoJSON features", ids.len());

    to_dataframe(ids, geoms)
}

/// Build the geo reference from a FlatGeobuf stream
pub fn geo_reference_from_fgb<R: Read + Seek>(reader: &mut R) -> Result<DataFrame> {
    let mut fgb = FgbReader::open(reader)?.select_all()?;

    let mut geoms: Vec<String> = vec![];
    let mut ids: Vec<String> = vec![];

    while let Some(feature) = fgb.next()? {
        let props = feature.properties()?;
        let id = props
            .get(COL::GEO_ADM0_A3)
            .ok_or_else(|| EconmapError::schema(GEO_SOURCE, COL::GEO_ADM0_A3))?;
        geoms.push(feature.to_wkt()?);
        ids.push(id.clone());
    }
    debug!("read {} FlatGeobuf features", ids.len());

    to_dataframe(ids, geoms)
}

fn to_dataframe(ids: Vec<String>, geoms: Vec<String>) -> Result<DataFrame> {
    let ids = Series::new(COL::COUNTRY_CODE, ids);
    let geoms = Series::new(COL::GEOMETRY, geoms);
    let result = DataFrame::new(vec![ids, geoms])?;
    Ok(result)
}
