use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    #[error("Detection failed: {0}")]
    Detection(String),
    #[error("Detector timeout")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(String),
    #[error("Search rejected: status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("Invalid search response: {0}")]
    InvalidResponse(String),
}
