use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogueError>;

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Unknown page: {0}")]
    UnknownPage(String),

    #[error("Page has been removed: {0}")]
    PageRemoved(String),
}
