//! Preview server with on-demand post generation
//!
//! Serves the public directory. Post pages that were not generated ahead of
//! time are generated on their first request: that request gets the loading
//! placeholder, which refreshes itself until the real page is on disk. The
//! listing page is regenerated in the background once it is older than the
//! revalidation window.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{header, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use indexmap::IndexMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::{services::ServeDir, trace::TraceLayer};
use walkdir::WalkDir;

use crate::cms::{self, ContentSource};
use crate::generator::Generator;
use crate::pages::is_valid_slug;
use crate::Spacetraveling;

/// Most unknown uids remembered at once
const MAX_MISSING: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageState {
    Ready,
    Pending,
    Missing(Instant),
}

/// Result of looking a post up in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Generated and on disk
    Ready,
    /// Another request is generating it
    Pending,
    /// The caller now owns generating it
    Claimed,
    /// The CMS recently said there is no such post
    Missing,
}

/// Known post pages: the prerendered set plus everything generated on demand.
///
/// At most one generation per slug is in flight; a claimed slug stays
/// pending until it is marked ready, missing or released. Misses are
/// dropped once they expire, and only the latest [`MAX_MISSING`] are kept.
pub struct PageRegistry {
    pages: Mutex<IndexMap<String, PageState>>,
    missing_for: Duration,
}

impl PageRegistry {
    /// Registry of already generated pages. Unknown uids are remembered
    /// as missing for `missing_for` before the CMS is asked again.
    pub fn new<I: IntoIterator<Item = String>>(ready: I, missing_for: Duration) -> Self {
        let pages = ready
            .into_iter()
            .map(|slug| (slug, PageState::Ready))
            .collect();
        Self {
            pages: Mutex::new(pages),
            missing_for,
        }
    }

    /// Registry of the post pages found under `public_dir`
    pub fn scan(public_dir: &Path, missing_for: Duration) -> Self {
        let post_dir = public_dir.join("post");
        let slugs: Vec<String> = WalkDir::new(&post_dir)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name() == "index.html")
            .filter_map(|e| {
                let slug = e.path().parent()?.file_name()?.to_str()?.to_string();
                is_valid_slug(&slug).then_some(slug)
            })
            .collect();
        tracing::debug!("Found {} generated posts in {:?}", slugs.len(), post_dir);
        Self::new(slugs, missing_for)
    }

    pub async fn lookup_or_claim(&self, slug: &str) -> Lookup {
        let mut pages = self.pages.lock().await;
        match pages.get(slug).copied() {
            Some(PageState::Ready) => Lookup::Ready,
            Some(PageState::Pending) => Lookup::Pending,
            Some(PageState::Missing(since)) if since.elapsed() < self.missing_for => {
                Lookup::Missing
            }
            _ => {
                pages.insert(slug.to_string(), PageState::Pending);
                Lookup::Claimed
            }
        }
    }

    pub async fn mark_ready(&self, slug: &str) {
        self.pages
            .lock()
            .await
            .insert(slug.to_string(), PageState::Ready);
    }

    pub async fn mark_missing(&self, slug: &str) {
        let mut pages = self.pages.lock().await;
        let missing_for = self.missing_for;
        pages.retain(|_, state| match state {
            PageState::Missing(since) => since.elapsed() < missing_for,
            _ => true,
        });

        pages.shift_remove(slug);
        pages.insert(slug.to_string(), PageState::Missing(Instant::now()));

        let missing = pages
            .values()
            .filter(|state| matches!(state, PageState::Missing(_)))
            .count();
        if missing > MAX_MISSING {
            let oldest = pages
                .iter()
                .find(|(_, state)| matches!(state, PageState::Missing(_)))
                .map(|(slug, _)| slug.clone());
            if let Some(oldest) = oldest {
                pages.shift_remove(&oldest);
            }
        }
    }

    /// Forget a slug so the next request tries again
    pub async fn release(&self, slug: &str) {
        self.pages.lock().await.shift_remove(slug);
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.pages.lock().await.len()
    }

    /// Slugs with a generated page, in the order they became known
    pub async fn ready(&self) -> Vec<String> {
        self.pages
            .lock()
            .await
            .iter()
            .filter(|(_, state)| **state == PageState::Ready)
            .map(|(slug, _)| slug.clone())
            .collect()
    }
}

/// Age of the generated listing page
struct ListingFreshness {
    generated_at: Mutex<Instant>,
    regenerating: AtomicBool,
    revalidate: Duration,
}

impl ListingFreshness {
    fn new(revalidate: Duration) -> Self {
        Self {
            generated_at: Mutex::new(Instant::now()),
            regenerating: AtomicBool::new(false),
            revalidate,
        }
    }

    /// Whether the caller should regenerate the listing now
    async fn claim_if_stale(&self) -> bool {
        let generated_at = *self.generated_at.lock().await;
        if generated_at.elapsed() < self.revalidate {
            return false;
        }
        !self.regenerating.swap(true, Ordering::SeqCst)
    }

    async fn finish(&self, regenerated: bool) {
        if regenerated {
            *self.generated_at.lock().await = Instant::now();
        }
        self.regenerating.store(false, Ordering::SeqCst);
    }
}

/// Server state
struct ServerState {
    generator: Generator,
    source: Arc<dyn ContentSource>,
    registry: PageRegistry,
    listing: ListingFreshness,
}

/// Build the router over an already generated site
pub fn router(
    generator: Generator,
    source: Arc<dyn ContentSource>,
    registry: PageRegistry,
) -> Router {
    let listing = ListingFreshness::new(generator.config().listing.revalidate_after());
    let state = Arc::new(ServerState {
        generator,
        source,
        registry,
        listing,
    });

    Router::new()
        .route("/", get(listing_handler))
        .route("/index.html", get(listing_handler))
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the preview server
pub async fn start(
    site: &Spacetraveling,
    source: Arc<dyn ContentSource>,
    ip: &str,
    port: u16,
    open: bool,
) -> Result<()> {
    let generator = Generator::new(site)?;
    let registry = PageRegistry::scan(&site.public_dir, site.config.listing.revalidate_after());
    let app = router(generator, source, registry);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn listing_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    if state.listing.claim_if_stale().await {
        let state = state.clone();
        tokio::spawn(async move {
            tracing::info!("Listing is stale, regenerating");
            let result = state.generator.generate_listing(state.source.as_ref()).await;
            if let Err(e) = &result {
                tracing::error!("Listing regeneration failed: {:#}", e);
            }
            state.listing.finish(result.is_ok()).await;
        });
    }
    serve_static(&state, request).await
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    UrlPath(slug): UrlPath<String>,
) -> Response {
    if !is_valid_slug(&slug) {
        return not_found(&state);
    }

    match state.registry.lookup_or_claim(&slug).await {
        Lookup::Ready => serve_post(&state, &slug).await,
        Lookup::Pending => fallback(&state),
        Lookup::Claimed => {
            spawn_post_generation(state.clone(), slug);
            fallback(&state)
        }
        Lookup::Missing => not_found(&state),
    }
}

fn spawn_post_generation(state: Arc<ServerState>, slug: String) {
    tokio::spawn(async move {
        tracing::info!("Generating post {} on demand", slug);
        match state
            .generator
            .generate_post(state.source.as_ref(), &slug)
            .await
        {
            Ok(_) => state.registry.mark_ready(&slug).await,
            Err(e) if is_not_found(&e) => {
                tracing::info!("No post with uid {}", slug);
                state.registry.mark_missing(&slug).await;
            }
            Err(e) => {
                tracing::error!("Failed to generate post {}: {:#}", slug, e);
                state.registry.release(&slug).await;
            }
        }
    });
}

fn is_not_found(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<cms::Error>(),
        Some(cms::Error::NotFound { .. })
    )
}

async fn serve_post(state: &ServerState, slug: &str) -> Response {
    let file_path = state
        .generator
        .public_dir()
        .join("post")
        .join(slug)
        .join("index.html");
    match tokio::fs::read_to_string(&file_path).await {
        Ok(content) => Html(content).into_response(),
        Err(e) => {
            // removed behind our back, e.g. by `clean`
            tracing::warn!("Cannot read {:?}: {}", file_path, e);
            state.registry.release(slug).await;
            fallback(state)
        }
    }
}

async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    serve_static(&state, request).await
}

/// Serve a file from the public directory using tower-http
async fn serve_static(state: &ServerState, request: Request<Body>) -> Response {
    let mut service =
        ServeDir::new(state.generator.public_dir()).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => not_found(state),
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

fn fallback(state: &ServerState) -> Response {
    match state.generator.render_fallback() {
        Ok(html) => ([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render fallback page: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

fn not_found(state: &ServerState) -> Response {
    match state.generator.render_not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::MemorySource;
    use crate::config::SiteConfig;
    use crate::generator::tests::{document, source};
    use reqwest::StatusCode as HttpStatus;

    const DAY: Duration = Duration::from_secs(86400);

    async fn spawn_site(config: SiteConfig, source: Arc<MemorySource>) -> (String, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let generator = Generator::with_config(config, dir.path().join("public")).unwrap();
        let generated = generator.generate(source.as_ref()).await.unwrap();
        let registry = PageRegistry::new(generated.posts, DAY);
        let source: Arc<dyn ContentSource> = source;
        let app = router(generator, source, registry);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (base, dir)
    }

    async fn get(url: &str) -> (HttpStatus, String) {
        let response = reqwest::get(url).await.unwrap();
        let status = response.status();
        (status, response.text().await.unwrap())
    }

    /// Poll `url` until `done` holds
    async fn get_until<F: Fn(HttpStatus, &str) -> bool>(url: &str, done: F) -> (HttpStatus, String) {
        for _ in 0..100 {
            let (status, body) = get(url).await;
            if done(status, &body) {
                return (status, body);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("{} never reached the expected state", url);
    }

    #[tokio::test]
    async fn test_registry_claims_once() {
        let registry = PageRegistry::new(vec!["a".to_string()], DAY);
        assert_eq!(registry.lookup_or_claim("a").await, Lookup::Ready);
        assert_eq!(registry.lookup_or_claim("b").await, Lookup::Claimed);
        assert_eq!(registry.lookup_or_claim("b").await, Lookup::Pending);

        registry.mark_ready("b").await;
        assert_eq!(registry.lookup_or_claim("b").await, Lookup::Ready);
        assert_eq!(registry.ready().await, vec!["a", "b"]);

        assert_eq!(registry.lookup_or_claim("c").await, Lookup::Claimed);
        registry.mark_missing("c").await;
        assert_eq!(registry.lookup_or_claim("c").await, Lookup::Missing);

        assert_eq!(registry.lookup_or_claim("d").await, Lookup::Claimed);
        registry.release("d").await;
        assert_eq!(registry.lookup_or_claim("d").await, Lookup::Claimed);
    }

    #[tokio::test]
    async fn test_registry_missing_expires() {
        let registry = PageRegistry::new(Vec::new(), Duration::ZERO);
        assert_eq!(registry.lookup_or_claim("x").await, Lookup::Claimed);
        registry.mark_missing("x").await;
        assert_eq!(registry.lookup_or_claim("x").await, Lookup::Claimed);
    }

    #[tokio::test]
    async fn test_registry_drops_expired_misses() {
        let registry = PageRegistry::new(vec!["a".to_string()], Duration::ZERO);
        for slug in ["x", "y", "z"] {
            assert_eq!(registry.lookup_or_claim(slug).await, Lookup::Claimed);
            registry.mark_missing(slug).await;
        }
        // only the latest miss and the ready page are left
        assert_eq!(registry.len().await, 2);
        assert_eq!(registry.ready().await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_registry_bounds_misses() {
        let registry = PageRegistry::new(Vec::new(), DAY);
        for i in 0..MAX_MISSING + 10 {
            registry.mark_missing(&format!("miss-{}", i)).await;
        }
        assert_eq!(registry.len().await, MAX_MISSING);
        assert_eq!(registry.lookup_or_claim("miss-0").await, Lookup::Claimed);
        let last = format!("miss-{}", MAX_MISSING + 9);
        assert_eq!(registry.lookup_or_claim(&last).await, Lookup::Missing);
    }

    #[tokio::test]
    async fn test_registry_scan() {
        let dir = tempfile::tempdir().unwrap();
        for slug in ["mars-trip", "venus"] {
            let post = dir.path().join("post").join(slug);
            std::fs::create_dir_all(&post).unwrap();
            std::fs::write(post.join("index.html"), "<html></html>").unwrap();
        }
        std::fs::create_dir_all(dir.path().join("post/empty")).unwrap();

        let registry = PageRegistry::scan(dir.path(), DAY);
        let mut ready = registry.ready().await;
        ready.sort();
        assert_eq!(ready, vec!["mars-trip", "venus"]);
    }

    #[tokio::test]
    async fn test_serves_prerendered_post() {
        let (base, _dir) = spawn_site(SiteConfig::default(), Arc::new(source())).await;

        let (status, body) = get(&format!("{}/post/first/", base)).await;
        assert_eq!(status, HttpStatus::OK);
        assert!(body.contains("Title first"));
        assert!(!body.contains("Carregando..."));

        let (status, body) = get(&format!("{}/post/second", base)).await;
        assert_eq!(status, HttpStatus::OK);
        assert!(body.contains("Title second"));
    }

    #[tokio::test]
    async fn test_generates_post_on_first_request() {
        let (base, dir) = spawn_site(SiteConfig::default(), Arc::new(source())).await;
        let url = format!("{}/post/third/", base);

        let (status, body) = get(&url).await;
        assert_eq!(status, HttpStatus::OK);
        assert!(body.contains("Carregando..."));

        let (_, body) = get_until(&url, |_, body| !body.contains("Carregando...")).await;
        assert!(body.contains("Title third"));
        assert!(dir.path().join("public/post/third/index.html").is_file());
    }

    #[tokio::test]
    async fn test_generates_post_published_after_start() {
        let source = Arc::new(source());
        let (base, _dir) = spawn_site(SiteConfig::default(), source.clone()).await;

        source.publish(document("late", 10)).await;
        let url = format!("{}/post/late/", base);
        let (status, body) = get_until(&url, |_, body| !body.contains("Carregando...")).await;
        assert_eq!(status, HttpStatus::OK);
        assert!(body.contains("Title late"));
    }

    #[tokio::test]
    async fn test_unknown_post_becomes_not_found() {
        let (base, _dir) = spawn_site(SiteConfig::default(), Arc::new(source())).await;
        let url = format!("{}/post/venus/", base);

        let (status, body) = get_until(&url, |status, _| status == HttpStatus::NOT_FOUND).await;
        assert_eq!(status, HttpStatus::NOT_FOUND);
        assert!(body.contains("404"));
    }

    #[tokio::test]
    async fn test_invalid_slug_is_not_found() {
        let (base, _dir) = spawn_site(SiteConfig::default(), Arc::new(source())).await;
        let (status, _) = get(&format!("{}/post/Mars%20Trip/", base)).await;
        assert_eq!(status, HttpStatus::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_files() {
        let (base, _dir) = spawn_site(SiteConfig::default(), Arc::new(source())).await;

        let (status, body) = get(&format!("{}/css/style.css", base)).await;
        assert_eq!(status, HttpStatus::OK);
        assert!(!body.is_empty());

        let (status, body) = get(&format!("{}/post/first/props.json", base)).await;
        assert_eq!(status, HttpStatus::OK);
        assert!(body.contains("\"uid\": \"first\""));

        let (status, _) = get(&format!("{}/nowhere", base)).await;
        assert_eq!(status, HttpStatus::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stale_listing_is_regenerated() {
        let mut config = SiteConfig::default();
        config.listing.revalidate = 0;
        let source = Arc::new(MemorySource::new(vec![document("first", 10)]));
        let (base, _dir) = spawn_site(config, source.clone()).await;

        let (_, body) = get(&format!("{}/", base)).await;
        assert!(!body.contains("Title late"));

        source.publish(document("late", 10)).await;
        let (status, body) =
            get_until(&format!("{}/", base), |_, body| body.contains("Title late")).await;
        assert_eq!(status, HttpStatus::OK);
        assert_eq!(body.matches(r#"class="post-link""#).count(), 2);
    }
}
