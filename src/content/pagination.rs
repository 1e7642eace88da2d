//! Cursor pagination of the post listing

use serde::{Deserialize, Serialize};

use super::{Error, PostSummary, Result};
use crate::cms::{ContentSource, QueryResponse};

/// A page of summaries plus the cursor to the next one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostsPagination {
    pub next_page: Option<String>,
    pub results: Vec<PostSummary>,
}

impl PostsPagination {
    /// Map every result of a response into a summary, keeping response order
    pub fn from_response(response: &QueryResponse) -> Result<Self> {
        let results = response
            .results
            .iter()
            .map(PostSummary::from_document)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            next_page: response.next_page.clone(),
            results,
        })
    }
}

/// Handle for one "load more" request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    cursor: String,
}

impl LoadTicket {
    pub fn cursor(&self) -> &str {
        &self.cursor
    }
}

/// The listing's client state: posts shown so far and the cursor to the rest.
///
/// Pages are only added through [`ListingState::apply`], which appends the
/// results and replaces the cursor in one step. Every load gets a ticket and
/// only the newest outstanding ticket may apply, so a superseded or late
/// response can never append twice or out of order.
#[derive(Debug, Clone)]
pub struct ListingState {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    issued: u64,
    in_flight: Option<u64>,
}

impl ListingState {
    pub fn new(initial: PostsPagination) -> Self {
        Self {
            posts: initial.results,
            next_page: initial.next_page,
            issued: 0,
            in_flight: None,
        }
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Whether the "load more" control is shown
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start loading the next page. Returns `None` once exhausted.
    ///
    /// Starting a load while another is outstanding supersedes the older one.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        let cursor = self.next_page.clone()?;
        self.issued += 1;
        if self.in_flight.is_some() {
            tracing::debug!("Superseding outstanding load with #{}", self.issued);
        }
        self.in_flight = Some(self.issued);
        Some(LoadTicket {
            seq: self.issued,
            cursor,
        })
    }

    /// Append a fetched page and replace the cursor
    pub fn apply(&mut self, ticket: &LoadTicket, page: PostsPagination) -> Result<usize> {
        let same_cursor = self.next_page.as_deref() == Some(ticket.cursor.as_str());
        if self.in_flight != Some(ticket.seq) || !same_cursor {
            tracing::debug!("Dropping stale page for load #{}", ticket.seq);
            return Err(Error::StaleResponse(ticket.seq));
        }
        let added = page.results.len();
        self.posts.extend(page.results);
        self.next_page = page.next_page;
        self.in_flight = None;
        Ok(added)
    }

    /// Give up on a load, e.g. after the request failed
    pub fn abandon(&mut self, ticket: &LoadTicket) {
        if self.in_flight == Some(ticket.seq) {
            self.in_flight = None;
        }
    }

    /// Fetch the next page from `source` and apply it.
    ///
    /// Returns how many posts were added; 0 when there was nothing left.
    pub async fn load_more<S: ContentSource + ?Sized>(&mut self, source: &S) -> Result<usize> {
        let Some(ticket) = self.begin_load() else {
            return Ok(0);
        };

        let page = match source.fetch_next_page(ticket.cursor()).await {
            Ok(response) => PostsPagination::from_response(&response),
            Err(e) => Err(e.into()),
        };
        match page {
            Ok(page) => self.apply(&ticket, page),
            Err(e) => {
                self.abandon(&ticket);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{Document, MemorySource, Predicate, QueryOptions};
    use serde_json::json;

    fn summary(uid: &str) -> PostSummary {
        PostSummary {
            uid: uid.to_string(),
            first_publication_date: None,
            title: uid.to_uppercase(),
            subtitle: String::new(),
            author: "Ana".to_string(),
        }
    }

    fn document(uid: &str) -> Document {
        Document {
            id: uid.to_string(),
            uid: Some(uid.to_string()),
            doc_type: "p1".to_string(),
            tags: Vec::new(),
            lang: None,
            first_publication_date: None,
            last_publication_date: None,
            data: json!({"title": uid.to_uppercase(), "subtitle": "", "author": "Ana"}),
        }
    }

    fn page(uids: &[&str], next: Option<&str>) -> PostsPagination {
        PostsPagination {
            next_page: next.map(str::to_string),
            results: uids.iter().map(|u| summary(u)).collect(),
        }
    }

    #[test]
    fn test_apply_appends_and_replaces_cursor() {
        let mut state = ListingState::new(page(&["a", "b"], Some("c1")));
        let ticket = state.begin_load().unwrap();
        assert_eq!(ticket.cursor(), "c1");
        assert!(state.is_loading());

        let added = state.apply(&ticket, page(&["c", "d"], Some("c2"))).unwrap();
        assert_eq!(added, 2);
        let uids: Vec<_> = state.posts().iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["a", "b", "c", "d"]);
        assert_eq!(state.next_page(), Some("c2"));
        assert!(!state.is_loading());
    }

    #[test]
    fn test_no_cursor_no_control() {
        let mut state = ListingState::new(page(&["a"], None));
        assert!(!state.has_more());
        assert!(state.begin_load().is_none());
    }

    #[test]
    fn test_superseded_response_is_dropped() {
        let mut state = ListingState::new(page(&["a"], Some("c1")));
        let first = state.begin_load().unwrap();
        let second = state.begin_load().unwrap();

        // the newer request answers first
        state.apply(&second, page(&["b"], Some("c2"))).unwrap();
        // the older one arrives late and must not append again
        assert!(matches!(
            state.apply(&first, page(&["b"], Some("c2"))),
            Err(Error::StaleResponse(_))
        ));
        assert_eq!(state.posts().len(), 2);
        assert_eq!(state.next_page(), Some("c2"));
    }

    #[test]
    fn test_abandon_releases_load() {
        let mut state = ListingState::new(page(&[], Some("c1")));
        let ticket = state.begin_load().unwrap();
        state.abandon(&ticket);
        assert!(!state.is_loading());
        assert_eq!(state.next_page(), Some("c1"));
    }

    #[tokio::test]
    async fn test_load_more_from_source() {
        let source = MemorySource::new(vec![document("a"), document("b"), document("c")]);
        let options = QueryOptions::new().page_size(2);
        let first = source
            .query(&[Predicate::document_type("p1")], &options)
            .await
            .unwrap();
        let mut state = ListingState::new(PostsPagination::from_response(&first).unwrap());
        assert_eq!(state.posts().len(), 2);
        assert!(state.has_more());

        assert_eq!(state.load_more(&source).await.unwrap(), 1);
        let uids: Vec<_> = state.posts().iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["a", "b", "c"]);
        assert!(!state.has_more());

        assert_eq!(state.load_more(&source).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_state() {
        let source = MemorySource::default();
        let mut state = ListingState::new(page(&["a"], Some("memory://search/404")));
        assert!(state.load_more(&source).await.is_err());
        assert!(!state.is_loading());
        assert_eq!(state.posts().len(), 1);
        assert!(state.has_more());
    }
}
