//! Configuration module

mod site;

pub use site::CmsConfig;
pub use site::ListingConfig;
pub use site::PostConfig;
pub use site::SiteConfig;
pub use site::{ACCESS_TOKEN_ENV, API_ENDPOINT_ENV};
