//! Built-in site templates using Tera template engine
//!
//! Templates and static assets are embedded in the binary.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::helpers::{display_date, post_url};

/// Stylesheet written to `css/style.css`
pub const STYLESHEET: &str = include_str!("site/assets/style.css");

/// Logo written to `images/logo.svg`
pub const LOGO: &str = include_str!("site/assets/logo.svg");

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer; filters are bound to the site configuration
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        // CMS text is escaped explicitly in the templates; rendered rich text
        // and embedded JSON must go out untouched
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
        ])?;

        tera.register_filter(
            "pub_date",
            PubDateFilter {
                format: config.date_format.clone(),
                language: config.language.clone(),
                timezone: config.timezone.clone(),
            },
        );
        tera.register_filter(
            "post_url",
            PostUrlFilter {
                config: config.clone(),
            },
        );

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: format a CMS publication date, empty for null
struct PubDateFilter {
    format: String,
    language: String,
    timezone: String,
}

impl tera::Filter for PubDateFilter {
    fn filter(
        &self,
        value: &tera::Value,
        _args: &HashMap<String, tera::Value>,
    ) -> tera::Result<tera::Value> {
        let formatted = display_date(value.as_str(), &self.format, &self.language, &self.timezone);
        Ok(tera::Value::String(formatted))
    }
}

/// Tera filter: link to a post from its uid
struct PostUrlFilter {
    config: SiteConfig,
}

impl tera::Filter for PostUrlFilter {
    fn filter(
        &self,
        value: &tera::Value,
        _args: &HashMap<String, tera::Value>,
    ) -> tera::Result<tera::Value> {
        let uid = tera::try_get_value!("post_url", "value", String, value);
        Ok(tera::Value::String(post_url(&self.config, &uid)))
    }
}

/// Serialize page props for embedding in a `<script type="application/json">`
pub fn embed_json<T: Serialize>(value: &T) -> Result<String> {
    // `<` never appears raw so the payload cannot close the script element
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub language: String,
    pub root: String,
}

impl ConfigData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            language: config.language.clone(),
            root: crate::helpers::url_for(config, ""),
        }
    }
}

/// Context shared by every page
pub fn base_context(config: &SiteConfig) -> Context {
    let mut context = Context::new();
    context.insert("config", &ConfigData::from_config(config));
    context.insert("version", env!("CARGO_PKG_VERSION"));
    context
}
