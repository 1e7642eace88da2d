//! Prismic REST API client

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, error};

use super::{
    document::{ApiRoot, QueryResponse},
    error::{Error, Result},
    predicate::{render_query, Predicate, QueryOptions},
    ContentSource,
};
use crate::config::CmsConfig;

/// Client for the Prismic v2 content API.
///
/// Every search must be pinned to a content ref. The master ref is looked up
/// from the entry point on first use and kept until the next
/// [`ContentSource::refresh`], so one build sees one consistent version of
/// the content.
#[derive(Debug)]
pub struct PrismicClient {
    endpoint: String,
    access_token: Option<String>,
    http: reqwest::Client,
    master_ref: RwLock<Option<String>>,
}

impl PrismicClient {
    pub fn new(cfg: &CmsConfig) -> Result<Self> {
        reqwest::Url::parse(&cfg.endpoint).map_err(|_| Error::InvalidUrl(cfg.endpoint.clone()))?;
        Ok(Self {
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            access_token: cfg.access_token.clone(),
            http: reqwest::Client::new(),
            master_ref: RwLock::new(None),
        })
    }

    /// The master ref in use, looked up if there is none yet
    pub async fn master_ref(&self) -> Result<String> {
        if let Some(reference) = self.master_ref.read().await.as_ref() {
            return Ok(reference.clone());
        }
        self.resolve_master_ref().await
    }

    async fn resolve_master_ref(&self) -> Result<String> {
        let mut pairs = Vec::new();
        self.push_token(&mut pairs);
        let root: ApiRoot = self.get_json(&self.endpoint, &pairs).await?;
        let reference = root
            .master_ref()
            .ok_or_else(|| Error::NoMasterRef(self.endpoint.clone()))?
            .to_string();

        let mut current = self.master_ref.write().await;
        if current.as_deref() != Some(reference.as_str()) {
            debug!("Resolved master ref {}", reference);
        }
        *current = Some(reference.clone());
        Ok(reference)
    }

    fn push_token(&self, pairs: &mut Vec<(&'static str, String)>) {
        if let Some(token) = &self.access_token {
            pairs.push(("access_token", token.clone()));
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        pairs: &[(&'static str, String)],
    ) -> Result<T> {
        debug!("Sending request to {}", url);
        let resp = self.http.get(url).query(pairs).send().await?;
        match resp.status() {
            reqwest::StatusCode::OK => {
                let body = resp.text().await?;
                Ok(serde_json::from_str(&body)?)
            }
            status => {
                error!("request {} status: {}", url, status);
                Err(Error::StatusCode(status.as_u16()))
            }
        }
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn refresh(&self) -> Result<()> {
        self.resolve_master_ref().await.map(|_| ())
    }

    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse> {
        let reference = self.master_ref().await?;
        let mut pairs = vec![("ref", reference), ("q", render_query(predicates))];
        pairs.extend(options.to_pairs());
        self.push_token(&mut pairs);

        let url = format!("{}/documents/search", self.endpoint);
        self.get_json(&url, &pairs).await
    }

    async fn fetch_next_page(&self, cursor: &str) -> Result<QueryResponse> {
        // The cursor already carries ref, query and token.
        reqwest::Url::parse(cursor).map_err(|_| Error::InvalidUrl(cursor.to_string()))?;
        self.get_json(cursor, &[]).await
    }
}
