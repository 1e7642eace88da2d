//! Post models and their mapping from raw CMS documents

use serde::{Deserialize, Serialize};

use super::{Error, Result};
use crate::cms::Document;
use crate::helpers::count_words;
use crate::richtext::{self, Block, LinkResolver};

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

#[derive(Deserialize)]
struct SummaryFields {
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    author: String,
}

impl PostSummary {
    /// Fields of the post type a summary needs
    pub const FIELDS: [&'static str; 3] = ["title", "subtitle", "author"];

    pub fn from_document(document: &Document) -> Result<Self> {
        let uid = require_uid(document)?;
        let fields: SummaryFields = decode(document)?;
        Ok(Self {
            uid,
            first_publication_date: document.first_publication_date.clone(),
            title: fields.title,
            subtitle: fields.subtitle.unwrap_or_default(),
            author: fields.author,
        })
    }
}

/// A fully rendered post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub title: String,
    pub banner_url: String,
    pub author: String,
    pub content: Vec<ContentBlock>,
}

/// One section of a post: a heading and its pre-rendered body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body_html: String,
    /// Body text without markup, blocks separated by a space
    #[serde(default)]
    pub body_text: String,
}

#[derive(Deserialize)]
struct DetailFields {
    title: String,
    banner: Banner,
    author: String,
    content: Vec<RawSection>,
}

#[derive(Deserialize)]
struct Banner {
    url: String,
}

#[derive(Deserialize)]
struct RawSection {
    #[serde(default)]
    heading: Option<String>,
    #[serde(default)]
    body: Vec<Block>,
}

impl PostDetail {
    /// Map a full document, rendering every body through the rich-text serializer
    pub fn from_document<R: LinkResolver + ?Sized>(document: &Document, resolver: &R) -> Result<Self> {
        let uid = require_uid(document)?;
        let fields: DetailFields = decode(document)?;
        let content = fields
            .content
            .into_iter()
            .map(|section| ContentBlock {
                heading: section.heading.unwrap_or_default(),
                body_html: richtext::as_html_with(&section.body, resolver),
                body_text: richtext::as_text(&section.body, " "),
            })
            .collect();

        Ok(Self {
            uid,
            first_publication_date: document.first_publication_date.clone(),
            title: fields.title,
            banner_url: fields.banner.url,
            author: fields.author,
            content,
        })
    }

    /// Words across all headings and bodies
    pub fn word_count(&self) -> usize {
        self.content
            .iter()
            .map(|block| count_words(&block.heading) + count_words(&block.body_text))
            .sum()
    }
}

fn require_uid(document: &Document) -> Result<String> {
    document
        .uid
        .clone()
        .ok_or_else(|| Error::MissingUid(document.id.clone()))
}

fn decode<T: serde::de::DeserializeOwned>(document: &Document) -> Result<T> {
    serde_json::from_value(document.data.clone()).map_err(|source| Error::InvalidData {
        id: document.id.clone(),
        source,
    })
}
