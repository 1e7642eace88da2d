//! Structured rich text as stored by the CMS, and its HTML rendering
//!
//! A rich-text field is a list of blocks. Text blocks carry their formatting
//! as spans: `[start, end)` ranges over the block text, counted in UTF-16
//! code units like the editor that produced them.

mod html;

use serde::{Deserialize, Serialize};

pub use html::{as_html, as_html_with, LinkResolver};

/// One block of a rich-text field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    /// Block kinds this renderer does not know; rendered as nothing
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TextBlock {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            spans: Vec::new(),
            label: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default, rename = "linkTo", skip_serializing_if = "Option::is_none")]
    pub link_to: Option<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    pub oembed: Oembed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Oembed {
    #[serde(default)]
    pub embed_url: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// A formatting range `[start, end)` inside a text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Span {
    #[serde(rename = "strong")]
    Strong { start: usize, end: usize },
    #[serde(rename = "em")]
    Em { start: usize, end: usize },
    #[serde(rename = "hyperlink")]
    Hyperlink { start: usize, end: usize, data: Link },
    #[serde(rename = "label")]
    Label { start: usize, end: usize, data: Label },
    /// Span kinds this renderer does not know; ignored
    #[serde(other)]
    Unknown,
}

impl Span {
    pub fn range(&self) -> Option<(usize, usize)> {
        match self {
            Span::Strong { start, end }
            | Span::Em { start, end }
            | Span::Hyperlink { start, end, .. }
            | Span::Label { start, end, .. } => Some((*start, *end)),
            Span::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub label: String,
}

/// Target of a hyperlink span or a linked image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub link_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    /// Set for links to other documents
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default, rename = "type")]
    pub doc_type: Option<String>,
}

impl Block {
    /// Text of the block, empty for images and embeds
    pub fn text(&self) -> &str {
        match self.text_block() {
            Some(block) => &block.text,
            None => "",
        }
    }

    fn text_block(&self) -> Option<&TextBlock> {
        match self {
            Block::Heading1(b)
            | Block::Heading2(b)
            | Block::Heading3(b)
            | Block::Heading4(b)
            | Block::Heading5(b)
            | Block::Heading6(b)
            | Block::Paragraph(b)
            | Block::Preformatted(b)
            | Block::ListItem(b)
            | Block::OrderedListItem(b) => Some(b),
            Block::Image(_) | Block::Embed(_) | Block::Unknown => None,
        }
    }
}

/// Plain text of a rich-text field, blocks separated by `separator`
pub fn as_text(blocks: &[Block], separator: &str) -> String {
    blocks
        .iter()
        .map(Block::text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blocks() {
        let blocks: Vec<Block> = serde_json::from_str(
            r#"[
                {"type": "heading2", "text": "Launch", "spans": []},
                {"type": "paragraph", "text": "Go now", "spans": [
                    {"start": 0, "end": 2, "type": "strong"},
                    {"start": 3, "end": 6, "type": "hyperlink",
                     "data": {"link_type": "Web", "url": "https://nasa.gov", "target": "_blank"}}
                ]},
                {"type": "image", "url": "https://img/x.png", "alt": "x", "copyright": null,
                 "dimensions": {"width": 10, "height": 10}},
                {"type": "some-future-block", "text": "?"}
            ]"#,
        )
        .unwrap();

        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0], Block::Heading2(TextBlock::plain("Launch")));
        match &blocks[1] {
            Block::Paragraph(p) => {
                assert_eq!(p.spans[0], Span::Strong { start: 0, end: 2 });
                assert_eq!(p.spans[1].range(), Some((3, 6)));
                match &p.spans[1] {
                    Span::Hyperlink { data, .. } => {
                        assert_eq!(data.url.as_deref(), Some("https://nasa.gov"));
                    }
                    other => panic!("unexpected span {:?}", other),
                }
            }
            other => panic!("unexpected block {:?}", other),
        }
        assert!(matches!(blocks[2], Block::Image(_)));
        assert_eq!(blocks[3], Block::Unknown);
    }

    #[test]
    fn test_as_text() {
        let blocks = vec![
            Block::Paragraph(TextBlock::plain("one two")),
            Block::Image(ImageBlock::default()),
            Block::ListItem(TextBlock::plain("three")),
        ];
        assert_eq!(as_text(&blocks, " "), "one two three");
    }
}
