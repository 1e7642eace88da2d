//! Content module - post models, reading time and listing pagination

mod pagination;
mod post;
mod reading;

pub use pagination::{ListingState, LoadTicket, PostsPagination};
pub use post::{ContentBlock, PostDetail, PostSummary};
pub use reading::{minutes_for, ReadingTime, DEFAULT_WORDS_PER_MINUTE};

/// Errors turning CMS documents into posts
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Cms(#[from] crate::cms::Error),

    #[error("Document {0} has no uid")]
    MissingUid(String),

    #[error("Document {id} has unexpected data: {source}")]
    InvalidData {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response for load #{0} was superseded")]
    StaleResponse(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
