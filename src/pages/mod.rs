//! Page components
//!
//! Each page fetches its props from the content source at build time and
//! renders them to HTML. Props are also written next to the HTML so the
//! browser side can pick them up.

pub mod listing;
pub mod post;

use serde::Serialize;
use std::time::Duration;

pub use listing::{HomeProps, ListingPage};
pub use post::{PostPage, PostProps};

/// Props produced at build time, with an optional regeneration window
#[derive(Debug, Clone, Serialize)]
pub struct StaticProps<P> {
    pub props: P,
    /// Seconds after which the page should be regenerated
    #[serde(serialize_with = "as_seconds")]
    pub revalidate: Option<Duration>,
}

fn as_seconds<S: serde::Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => s.serialize_some(&d.as_secs()),
        None => s.serialize_none(),
    }
}

/// Paths generated ahead of time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPaths {
    pub slugs: Vec<String>,
    /// Whether unknown paths are generated on first request instead of 404
    pub fallback: bool,
}

/// Whether a CMS uid can be used as a path segment as-is
pub fn is_valid_slug(uid: &str) -> bool {
    !uid.is_empty() && slug::slugify(uid) == uid
}
