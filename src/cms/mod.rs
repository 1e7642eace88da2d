//! Headless CMS access
//!
//! Pages never talk HTTP themselves; they go through [`ContentSource`], which
//! is implemented by the Prismic REST client and by an in-memory source.

mod client;
mod document;
mod error;
pub mod memory;
mod predicate;

use async_trait::async_trait;

pub use client::PrismicClient;
pub use document::{ApiRef, ApiRoot, Document, QueryResponse};
pub use error::{Error, Result};
pub use memory::MemorySource;
pub use predicate::{render_query, Predicate, QueryOptions};

/// Query interface of the content backend
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Move to the latest published version of the content.
    ///
    /// Reads between two refreshes see one consistent version.
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    /// Run a search and return its first page
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions)
        -> Result<QueryResponse>;

    /// Follow a `next_page` cursor returned by an earlier response
    async fn fetch_next_page(&self, cursor: &str) -> Result<QueryResponse>;

    /// Fetch the single document of `doc_type` identified by `uid`
    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Document> {
        let response = self
            .query(&[Predicate::uid(doc_type, uid)], &QueryOptions::new().page_size(1))
            .await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }
}
