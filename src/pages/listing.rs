//! Listing (home) page

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::StaticProps;
use crate::cms::{ContentSource, Predicate, QueryOptions};
use crate::config::SiteConfig;
use crate::content::{ListingState, PostSummary, PostsPagination};
use crate::helpers::{month_names, url_for};
use crate::templates::{base_context, embed_json, TemplateRenderer};

/// Props of the listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeProps {
    pub posts_pagination: PostsPagination,
}

pub struct ListingPage<'a> {
    config: &'a SiteConfig,
    renderer: &'a TemplateRenderer,
}

impl<'a> ListingPage<'a> {
    pub fn new(config: &'a SiteConfig, renderer: &'a TemplateRenderer) -> Self {
        Self { config, renderer }
    }

    /// Search options of the first page: summary fields only
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::new()
            .fetch_fields(&self.config.cms.document_type, &PostSummary::FIELDS)
            .page_size(self.config.listing.page_size)
    }

    /// Fetch the first page of summaries
    pub async fn get_static_props<S: ContentSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<StaticProps<HomeProps>> {
        let response = source
            .query(
                &[Predicate::document_type(&self.config.cms.document_type)],
                &self.query_options(),
            )
            .await?;
        let posts_pagination = PostsPagination::from_response(&response)?;
        tracing::debug!(
            "Listing has {} posts, more: {}",
            posts_pagination.results.len(),
            posts_pagination.next_page.is_some()
        );

        Ok(StaticProps {
            props: HomeProps { posts_pagination },
            revalidate: Some(self.config.listing.revalidate_after()),
        })
    }

    /// Render the listing as it currently stands
    pub fn render(&self, state: &ListingState) -> Result<String> {
        let props = HomeProps {
            posts_pagination: PostsPagination {
                next_page: state.next_page().map(str::to_string),
                results: state.posts().to_vec(),
            },
        };

        let mut context = base_context(self.config);
        context.insert("posts", state.posts());
        context.insert("next_page", &state.next_page());
        context.insert("load_more_label", &self.config.listing.load_more_label);
        context.insert("props_json", &embed_json(&props)?);
        context.insert(
            "months_json",
            &serde_json::to_string(month_names(&self.config.language))?,
        );
        context.insert("root_json", &serde_json::to_string(&url_for(self.config, ""))?);

        self.renderer.render("index.html", &context)
    }
}
