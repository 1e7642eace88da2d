//! Generate static files

use anyhow::Result;

use crate::cms::ContentSource;
use crate::generator::{Generated, Generator};
use crate::Spacetraveling;

/// Generate the static site from the configured CMS
pub async fn run(site: &Spacetraveling) -> Result<Generated> {
    let source = site.content_source()?;
    run_with_source(site, source.as_ref()).await
}

/// Generate the static site from any content source
pub async fn run_with_source<S: ContentSource + ?Sized>(
    site: &Spacetraveling,
    source: &S,
) -> Result<Generated> {
    let start = std::time::Instant::now();

    let generator = Generator::new(site)?;
    let generated = generator.generate(source).await?;

    tracing::info!(
        "Listed {} posts, prerendered {} post pages",
        generated.listed,
        generated.posts.len()
    );
    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(generated)
}
