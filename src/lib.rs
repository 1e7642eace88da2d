//! spacetraveling: a static blog frontend fed by a headless CMS
//!
//! Posts are fetched from a Prismic repository, rendered with embedded Tera
//! templates into a public directory, and served with on-demand generation of
//! post pages that were not built ahead of time.

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod pages;
pub mod richtext;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{ContentSource, PrismicClient};

/// The main application
#[derive(Debug, Clone)]
pub struct Spacetraveling {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Spacetraveling {
    /// Create a new instance from a directory.
    ///
    /// Reads `_config.yml` when present and applies credential overrides from
    /// the environment.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();

        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            public_dir,
        })
    }

    /// Client for the configured CMS repository
    pub fn content_source(&self) -> Result<Arc<dyn ContentSource>> {
        let client = PrismicClient::new(&self.config.cms)?;
        Ok(Arc::new(client))
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
