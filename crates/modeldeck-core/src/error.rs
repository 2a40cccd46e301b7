/// Core error types for modeldeck.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Failed to parse payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
