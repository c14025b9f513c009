// Error types shared by the services and the HTTP client
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("malformed response from {endpoint}: {reason}")]
    MalformedBody { endpoint: String, reason: String },

    #[error("unsupported vehicle manufacturer '{0}'")]
    UnsupportedManufacturer(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type DashboardResult<T> = Result<T, DashboardError>;
