//! Content client errors

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Status code: {0}")]
    StatusCode(u16),

    #[error("Invalid endpoint url: {0}")]
    InvalidUrl(String),

    #[error("No master ref advertised by {0}")]
    NoMasterRef(String),

    #[error("Document not found: {doc_type} with uid {uid}")]
    NotFound { doc_type: String, uid: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
