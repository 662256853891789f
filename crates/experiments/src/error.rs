use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExperimentError>;

#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("Invalid test configuration: {0}")]
    Configuration(String),

    #[error("Unknown test: {0}")]
    UnknownTest(String),

    #[error("Unknown variant {variant} in test {test}")]
    UnknownVariant { test: String, variant: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Scheduler is not running: {0}")]
    SchedulerStopped(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] siteiq_catalogue::CatalogueError),
}
