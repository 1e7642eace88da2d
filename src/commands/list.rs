//! List posts

use anyhow::Result;

use crate::cms::ContentSource;
use crate::config::SiteConfig;
use crate::content::{ListingState, PostSummary};
use crate::helpers::display_date;
use crate::pages::ListingPage;
use crate::templates::TemplateRenderer;
use crate::Spacetraveling;

/// Print every post, following the listing cursor to the end
pub async fn run(site: &Spacetraveling) -> Result<()> {
    let source = site.content_source()?;
    let posts = collect_posts(&site.config, source.as_ref()).await?;

    println!("Posts ({}):", posts.len());
    for post in &posts {
        let date = display_date(
            post.first_publication_date.as_deref(),
            &site.config.date_format,
            &site.config.language,
            &site.config.timezone,
        );
        println!("  {} - {} [{}] by {}", date, post.title, post.uid, post.author);
    }

    Ok(())
}

/// All post summaries, in listing order
pub async fn collect_posts<S: ContentSource + ?Sized>(
    config: &SiteConfig,
    source: &S,
) -> Result<Vec<PostSummary>> {
    let renderer = TemplateRenderer::new(config)?;
    let page = ListingPage::new(config, &renderer);
    let props = page.get_static_props(source).await?;

    let mut state = ListingState::new(props.props.posts_pagination);
    while state.has_more() {
        let added = state.load_more(source).await?;
        tracing::debug!("Loaded {} more posts", added);
        if added == 0 {
            tracing::warn!("Empty page before the end of the listing, stopping");
            break;
        }
    }

    Ok(state.posts().to_vec())
}
