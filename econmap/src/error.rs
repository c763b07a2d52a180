//! Error types.

#[derive(thiserror::Error, Debug)]
pub enum EconmapError {
    #[error("Wrapped anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
    #[error("Column `{column}` not found in {source_name} source")]
    Schema {
        source_name: String,
        column: String,
    },
    #[error("No rows labelled `{label}` in {source_name} source")]
    EmptyResult { source_name: String, label: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unsupported geometry format: {0}")]
    UnsupportedFormat(String),
    #[error("Wrapped polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
    #[error("Wrapped IO error: {0}")]
    IOError(#[from] std::io::Error),
}

impl EconmapError {
    pub fn schema(source_name: &str, column: &str) -> Self {
        Self::Schema {
            source_name: source_name.into(),
            column: column.into(),
        }
    }
}

pub type EconmapResult<T> = Result<T, EconmapError>;
