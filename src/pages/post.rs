//! Post detail page

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{is_valid_slug, StaticPaths, StaticProps};
use crate::cms::{ContentSource, Predicate, QueryOptions};
use crate::config::SiteConfig;
use crate::content::{PostDetail, ReadingTime};
use crate::helpers::{post_permalink, post_url};
use crate::richtext::Link;
use crate::templates::{base_context, embed_json, TemplateRenderer};

/// Seconds between reloads of the fallback placeholder
const FALLBACK_REFRESH_SECONDS: u64 = 2;

/// Props of a post page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProps {
    pub post: PostDetail,
}

/// A post page instance.
///
/// Owns the reading time state, which survives re-renders of the same page
/// and is recomputed only when the post or the fallback flag changes.
pub struct PostPage<'a> {
    config: &'a SiteConfig,
    renderer: &'a TemplateRenderer,
    reading: ReadingTime,
}

impl<'a> PostPage<'a> {
    pub fn new(config: &'a SiteConfig, renderer: &'a TemplateRenderer) -> Self {
        Self {
            config,
            renderer,
            reading: ReadingTime::new(config.post.words_per_minute),
        }
    }

    /// Enumerate the posts generated ahead of time
    pub async fn get_static_paths<S: ContentSource + ?Sized>(
        config: &SiteConfig,
        source: &S,
    ) -> Result<StaticPaths> {
        let doc_type = &config.cms.document_type;
        let options = QueryOptions::new().page_size(config.post.prerender_limit);
        let response = source
            .query(&[Predicate::document_type(doc_type)], &options)
            .await?;

        let slugs = response
            .results
            .iter()
            .filter_map(|doc| match doc.uid.as_deref() {
                Some(uid) if is_valid_slug(uid) => Some(uid.to_string()),
                other => {
                    tracing::warn!("Skipping document {} with unusable uid {:?}", doc.id, other);
                    None
                }
            })
            .collect();

        Ok(StaticPaths {
            slugs,
            fallback: true,
        })
    }

    /// Fetch and render-prepare a single post
    pub async fn get_static_props<S: ContentSource + ?Sized>(
        config: &SiteConfig,
        source: &S,
        slug: &str,
    ) -> Result<StaticProps<PostProps>> {
        let document = source.get_by_uid(&config.cms.document_type, slug).await?;
        let resolver = |link: &Link| resolve_link(config, link);
        let post = PostDetail::from_document(&document, &resolver)?;

        Ok(StaticProps {
            props: PostProps { post },
            revalidate: None,
        })
    }

    pub fn reading_time(&self) -> usize {
        self.reading.minutes()
    }

    /// Render the page. `props` is `None` while the page is still in fallback.
    pub fn render(&mut self, props: Option<&PostProps>, is_fallback: bool) -> Result<String> {
        let post = props.map(|p| &p.post);
        let reading_time = self.reading.update(post, is_fallback);

        let mut context = base_context(self.config);
        context.insert("is_fallback", &is_fallback);
        context.insert("loading_label", &self.config.post.loading_label);
        context.insert("refresh_seconds", &FALLBACK_REFRESH_SECONDS);
        context.insert("reading_time", &reading_time);

        match (post, is_fallback) {
            (Some(post), false) => {
                context.insert("post", post);
                context.insert("permalink", &post_permalink(self.config, &post.uid));
                context.insert("props_json", &embed_json(&props)?);
            }
            (None, false) => anyhow::bail!("Post page rendered without props"),
            (_, true) => {}
        }

        self.renderer.render("post.html", &context)
    }
}

/// Hrefs for links inside post bodies; posts of our type link to their page
fn resolve_link(config: &SiteConfig, link: &Link) -> Option<String> {
    match (&link.uid, &link.doc_type) {
        (Some(uid), Some(doc_type)) if *doc_type == config.cms.document_type => {
            Some(post_url(config, uid))
        }
        _ => link.url.clone(),
    }
}
