//! Generator module - writes the static site from CMS content

use anyhow::{Context as _, Result};
use serde::Serialize;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::cms::ContentSource;
use crate::config::SiteConfig;
use crate::content::ListingState;
use crate::pages::{is_valid_slug, ListingPage, PostPage};
use crate::templates::{base_context, TemplateRenderer, LOGO, STYLESHEET};
use crate::Spacetraveling;

/// Outcome of a full generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generated {
    /// Posts on the first listing page
    pub listed: usize,
    /// Uids of the prerendered post pages
    pub posts: Vec<String>,
}

/// Static site generator
pub struct Generator {
    config: SiteConfig,
    public_dir: PathBuf,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Spacetraveling) -> Result<Self> {
        Self::with_config(site.config.clone(), site.public_dir.clone())
    }

    pub fn with_config(config: SiteConfig, public_dir: PathBuf) -> Result<Self> {
        let renderer = TemplateRenderer::new(&config)?;
        Ok(Self {
            config,
            public_dir,
            renderer,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Generate the entire site from the latest content version
    pub async fn generate<S: ContentSource + ?Sized>(&self, source: &S) -> Result<Generated> {
        fs::create_dir_all(&self.public_dir)?;
        source.refresh().await?;

        self.write_assets()?;
        self.write("404.html", &self.render_not_found()?)?;

        let listed = self.build_listing(source).await?;

        let paths = PostPage::get_static_paths(&self.config, source).await?;
        tracing::info!("Prerendering {} posts", paths.slugs.len());
        for slug in &paths.slugs {
            self.build_post(source, slug).await?;
        }

        Ok(Generated {
            listed,
            posts: paths.slugs,
        })
    }

    /// Regenerate the listing page and its props from the latest content
    pub async fn generate_listing<S: ContentSource + ?Sized>(&self, source: &S) -> Result<usize> {
        source.refresh().await?;
        self.build_listing(source).await
    }

    /// Generate one post page from the latest content, returning the path of its HTML
    pub async fn generate_post<S: ContentSource + ?Sized>(
        &self,
        source: &S,
        slug: &str,
    ) -> Result<PathBuf> {
        if !is_valid_slug(slug) {
            anyhow::bail!("Refusing to generate post with uid {:?}", slug);
        }
        source.refresh().await?;
        self.build_post(source, slug).await
    }

    async fn build_listing<S: ContentSource + ?Sized>(&self, source: &S) -> Result<usize> {
        let page = ListingPage::new(&self.config, &self.renderer);
        let props = page.get_static_props(source).await?;

        let state = ListingState::new(props.props.posts_pagination.clone());
        let html = page.render(&state)?;

        self.write_json("index.json", &props)?;
        let output_path = self.write("index.html", &html)?;
        tracing::debug!("Generated: {:?}", output_path);

        Ok(state.posts().len())
    }

    async fn build_post<S: ContentSource + ?Sized>(
        &self,
        source: &S,
        slug: &str,
    ) -> Result<PathBuf> {
        let props = PostPage::get_static_props(&self.config, source, slug).await?;
        let mut page = PostPage::new(&self.config, &self.renderer);
        let html = page.render(Some(&props.props), false)?;

        self.write_json(&format!("post/{}/props.json", slug), &props)?;
        let output_path = self.write(&format!("post/{}/index.html", slug), &html)?;
        tracing::debug!(
            "Generated post: {:?} ({} min read)",
            output_path,
            page.reading_time()
        );

        Ok(output_path)
    }

    /// Placeholder served while a post is generated on demand
    pub fn render_fallback(&self) -> Result<String> {
        PostPage::new(&self.config, &self.renderer).render(None, true)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.renderer
            .render("not_found.html", &base_context(&self.config))
    }

    fn write_assets(&self) -> Result<()> {
        self.write("css/style.css", STYLESHEET)?;
        self.write("images/logo.svg", LOGO)?;
        Ok(())
    }

    /// Replace `relative` under the public dir. The content lands in a
    /// temporary file next to the target first and is renamed over it, so a
    /// concurrent reader gets either the old or the new file.
    fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let output_path = self.public_dir.join(relative);
        let parent = output_path.parent().unwrap_or(self.public_dir.as_path());
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;

        let mut file = tempfile::Builder::new()
            .prefix(".tmp")
            .tempfile_in(parent)
            .with_context(|| format!("Failed to create a temporary file in {:?}", parent))?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write {:?}", file.path()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))?;
        }
        file.persist(&output_path)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        Ok(output_path)
    }

    fn write_json<T: Serialize>(&self, relative: &str, value: &T) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(value)?;
        self.write(relative, &json)
    }
}
