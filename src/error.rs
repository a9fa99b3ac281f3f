use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Plotting failed: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, ChurnError>;

impl From<tempfile::PersistError> for ChurnError {
    fn from(e: tempfile::PersistError) -> Self {
        ChurnError::Io(e.error)
    }
}
