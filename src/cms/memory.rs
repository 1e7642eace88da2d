//! In-memory content source - serves a fixed set of documents.
//!
//! Used for previews without a backend and as the test double for pages,
//! the generator and the server. Cursors are `memory://` urls that stay valid
//! for the lifetime of the source. Published documents become visible on the
//! next refresh, the way a new master ref does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    document::{Document, QueryResponse},
    error::{Error, Result},
    predicate::{Predicate, QueryOptions},
    ContentSource,
};

/// Page size used when a query does not ask for one
const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone)]
struct PendingPage {
    predicates: Vec<Predicate>,
    options: QueryOptions,
    page: usize,
}

pub struct MemorySource {
    documents: RwLock<Vec<Document>>,
    unreleased: RwLock<Vec<Document>>,
    cursors: RwLock<HashMap<String, PendingPage>>,
    next_cursor: AtomicUsize,
    requests: AtomicUsize,
}

impl MemorySource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
            unreleased: RwLock::new(Vec::new()),
            cursors: RwLock::new(HashMap::new()),
            next_cursor: AtomicUsize::new(1),
            requests: AtomicUsize::new(0),
        }
    }

    /// Add a document to the next version of the content
    pub async fn publish(&self, document: Document) {
        self.unreleased.write().await.push(document);
    }

    /// Number of requests served so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn matches(document: &Document, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::At { path, value } => {
                if path == "document.type" {
                    return &document.doc_type == value;
                }
                if path == "document.id" {
                    return &document.id == value;
                }
                match path.strip_prefix("my.").and_then(|p| p.split_once('.')) {
                    Some((doc_type, "uid")) => {
                        document.doc_type == doc_type && document.uid.as_deref() == Some(value)
                    }
                    Some((doc_type, field)) => {
                        document.doc_type == doc_type
                            && document.data.get(field).and_then(|v| v.as_str())
                                == Some(value.as_str())
                    }
                    None => false,
                }
            }
        }
    }

    /// Keep only the fetched `type.field` entries of the document data
    fn project(mut document: Document, fetch: &[String]) -> Document {
        if fetch.is_empty() {
            return document;
        }
        if let serde_json::Value::Object(data) = &mut document.data {
            let doc_type = document.doc_type.clone();
            data.retain(|field, _| fetch.iter().any(|f| *f == format!("{}.{}", doc_type, field)));
        }
        document
    }

    async fn serve(&self, pending: PendingPage) -> QueryResponse {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let matching: Vec<Document> = self
            .documents
            .read()
            .await
            .iter()
            .filter(|d| pending.predicates.iter().all(|p| Self::matches(d, p)))
            .cloned()
            .collect();

        let per_page = pending.options.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let total = matching.len();
        let total_pages = total.div_ceil(per_page);
        let results = matching
            .into_iter()
            .skip((pending.page - 1) * per_page)
            .take(per_page)
            .map(|d| Self::project(d, &pending.options.fetch))
            .collect();

        let next_page = if pending.page < total_pages {
            let id = self.next_cursor.fetch_add(1, Ordering::SeqCst);
            let cursor = format!("memory://search/{}?page={}", id, pending.page + 1);
            self.cursors.write().await.insert(
                cursor.clone(),
                PendingPage {
                    page: pending.page + 1,
                    ..pending.clone()
                },
            );
            Some(cursor)
        } else {
            None
        };

        QueryResponse {
            page: pending.page,
            results_per_page: per_page,
            total_results_size: total,
            total_pages,
            next_page,
            prev_page: None,
            results,
        }
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn refresh(&self) -> Result<()> {
        let released: Vec<Document> = self.unreleased.write().await.drain(..).collect();
        if !released.is_empty() {
            tracing::debug!("Released {} documents", released.len());
            self.documents.write().await.extend(released);
        }
        Ok(())
    }

    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse> {
        Ok(self
            .serve(PendingPage {
                predicates: predicates.to_vec(),
                options: options.clone(),
                page: 1,
            })
            .await)
    }

    async fn fetch_next_page(&self, cursor: &str) -> Result<QueryResponse> {
        let pending = self
            .cursors
            .read()
            .await
            .get(cursor)
            .cloned()
            .ok_or_else(|| Error::InvalidUrl(cursor.to_string()))?;
        Ok(self.serve(pending).await)
    }
}
