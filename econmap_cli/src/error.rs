use econmap::error::EconmapError;
use polars::error::PolarsError;

#[derive(thiserror::Error, Debug)]
pub enum EconmapCliError {
    #[error("Anyhow error: {0:#}")]
    Anyhow(#[from] anyhow::Error),
    #[error("serde JSON error")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("econmap error: {0}")]
    EconmapError(#[from] EconmapError),
    #[error("std IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type EconmapCliResult<T> = Result<T, EconmapCliError>;
