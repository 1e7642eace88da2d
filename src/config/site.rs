//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the CMS access token
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Environment variable overriding the CMS API endpoint
pub const API_ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,

    // Content source
    #[serde(default)]
    pub cms: CmsConfig,

    // Listing page
    #[serde(default)]
    pub listing: ListingConfig,

    // Post pages
    #[serde(default)]
    pub post: PostConfig,

    // Date format
    pub date_format: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),

            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),

            cms: CmsConfig::default(),
            listing: ListingConfig::default(),
            post: PostConfig::default(),

            date_format: "dd MMM yyyy".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply credential overrides from the environment
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(API_ENDPOINT_ENV) {
            if !endpoint.is_empty() {
                tracing::debug!("Using CMS endpoint from {}", API_ENDPOINT_ENV);
                self.cms.endpoint = endpoint;
            }
        }
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using CMS access token from {}", ACCESS_TOKEN_ENV);
                self.cms.access_token = Some(token);
            }
        }
    }
}

/// Headless CMS connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// API entry point, e.g. `https://<repo>.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type holding blog posts
    pub document_type: String,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "p1".to_string(),
        }
    }
}

/// Listing (home) page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
    /// Seconds before the listing page is regenerated
    pub revalidate: u64,
    pub load_more_label: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 2,
            revalidate: 60 * 60 * 24,
            load_more_label: "Carregar mais posts".to_string(),
        }
    }
}

impl ListingConfig {
    pub fn revalidate_after(&self) -> Duration {
        Duration::from_secs(self.revalidate)
    }
}

/// Post detail page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    /// How many post paths are generated ahead of time
    pub prerender_limit: usize,
    pub words_per_minute: usize,
    pub loading_label: String,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            prerender_limit: 2,
            words_per_minute: 200,
            loading_label: "Carregando...".to_string(),
        }
    }
}
