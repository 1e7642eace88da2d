//! Rich text to HTML

use super::{Block, EmbedBlock, ImageBlock, Link, Span, TextBlock};
use crate::helpers::html_escape as escape;

/// Turns link targets into hrefs
pub trait LinkResolver {
    fn resolve(&self, link: &Link) -> Option<String>;
}

impl<F> LinkResolver for F
where
    F: Fn(&Link) -> Option<String>,
{
    fn resolve(&self, link: &Link) -> Option<String> {
        self(link)
    }
}

fn web_link(link: &Link) -> Option<String> {
    link.url.clone()
}

/// Render blocks to HTML, resolving only web links
pub fn as_html(blocks: &[Block]) -> String {
    as_html_with(blocks, &web_link)
}

/// Render blocks to HTML with a custom link resolver for document links.
///
/// Consecutive list items are grouped into one `<ul>` or `<ol>`.
pub fn as_html_with<R: LinkResolver + ?Sized>(blocks: &[Block], resolver: &R) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list = match block {
            Block::ListItem(_) => Some("ul"),
            Block::OrderedListItem(_) => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        match block {
            Block::Heading1(b) => push_text_block(&mut html, "h1", b, resolver),
            Block::Heading2(b) => push_text_block(&mut html, "h2", b, resolver),
            Block::Heading3(b) => push_text_block(&mut html, "h3", b, resolver),
            Block::Heading4(b) => push_text_block(&mut html, "h4", b, resolver),
            Block::Heading5(b) => push_text_block(&mut html, "h5", b, resolver),
            Block::Heading6(b) => push_text_block(&mut html, "h6", b, resolver),
            Block::Paragraph(b) => push_text_block(&mut html, "p", b, resolver),
            Block::Preformatted(b) => push_text_block(&mut html, "pre", b, resolver),
            Block::ListItem(b) | Block::OrderedListItem(b) => {
                push_text_block(&mut html, "li", b, resolver)
            }
            Block::Image(image) => push_image(&mut html, image, resolver),
            Block::Embed(embed) => push_embed(&mut html, embed),
            Block::Unknown => {}
        }
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

fn push_text_block<R: LinkResolver + ?Sized>(
    html: &mut String,
    tag: &str,
    block: &TextBlock,
    resolver: &R,
) {
    let class = block
        .label
        .as_ref()
        .map(|l| format!(r#" class="{}""#, escape(l)))
        .unwrap_or_default();
    html.push_str(&format!("<{}{}>", tag, class));
    html.push_str(&render_spans(&block.text, &block.spans, resolver));
    html.push_str(&format!("</{}>", tag));
}

fn push_image<R: LinkResolver + ?Sized>(html: &mut String, image: &ImageBlock, resolver: &R) {
    let href = image.link_to.as_ref().and_then(|l| resolver.resolve(l));
    html.push_str(r#"<p class="block-img">"#);
    if let Some(href) = &href {
        html.push_str(&format!(r#"<a href="{}">"#, escape(href)));
    }
    html.push_str(&format!(
        r#"<img src="{}" alt="{}" copyright="{}">"#,
        escape(&image.url),
        escape(image.alt.as_deref().unwrap_or("")),
        escape(image.copyright.as_deref().unwrap_or(""))
    ));
    if href.is_some() {
        html.push_str("</a>");
    }
    html.push_str("</p>");
}

fn push_embed(html: &mut String, embed: &EmbedBlock) {
    let oembed = &embed.oembed;
    html.push_str(&format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
        escape(&oembed.embed_url),
        escape(&oembed.kind),
        escape(oembed.provider_name.as_deref().unwrap_or("")),
        oembed.html.as_deref().unwrap_or("")
    ));
}

/// A span resolved to byte offsets of the block text
struct Range<'a> {
    start: usize,
    end: usize,
    order: usize,
    span: &'a Span,
}

/// Render text with its spans, splitting ranges that cross so the output
/// always nests properly.
fn render_spans<R: LinkResolver + ?Sized>(text: &str, spans: &[Span], resolver: &R) -> String {
    let ranges: Vec<Range> = spans
        .iter()
        .enumerate()
        .filter_map(|(order, span)| {
            let (start, end) = span.range()?;
            let start = byte_offset(text, start);
            let end = byte_offset(text, end);
            (start < end).then_some(Range {
                start,
                end,
                order,
                span,
            })
        })
        .collect();

    let mut bounds: Vec<usize> = vec![0, text.len()];
    for range in &ranges {
        bounds.push(range.start);
        bounds.push(range.end);
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut html = String::new();
    let mut stack: Vec<&Range> = Vec::new();

    for pair in bounds.windows(2) {
        let (from, to) = (pair[0], pair[1]);

        let mut active: Vec<&Range> = ranges
            .iter()
            .filter(|r| r.start <= from && r.end >= to)
            .collect();
        active.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(a.order.cmp(&b.order))
        });

        let keep = stack
            .iter()
            .zip(active.iter())
            .take_while(|(open, wanted)| open.order == wanted.order)
            .count();
        while stack.len() > keep {
            if let Some(closed) = stack.pop() {
                html.push_str(close_tag(closed.span));
            }
        }
        for range in active[keep..].iter().copied() {
            html.push_str(&open_tag(range.span, resolver));
            stack.push(range);
        }

        html.push_str(&escape(&text[from..to]).replace('\n', "<br />"));
    }

    while let Some(closed) = stack.pop() {
        html.push_str(close_tag(closed.span));
    }

    html
}

fn open_tag<R: LinkResolver + ?Sized>(span: &Span, resolver: &R) -> String {
    match span {
        Span::Strong { .. } => "<strong>".to_string(),
        Span::Em { .. } => "<em>".to_string(),
        Span::Hyperlink { data, .. } => {
            let target = data
                .target
                .as_ref()
                .map(|t| format!(r#" target="{}" rel="noopener""#, escape(t)))
                .unwrap_or_default();
            match resolver.resolve(data) {
                Some(href) => format!(r#"<a href="{}"{}>"#, escape(&href), target),
                None => format!("<a{}>", target),
            }
        }
        Span::Label { data, .. } => format!(r#"<span class="{}">"#, escape(&data.label)),
        Span::Unknown => String::new(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span {
        Span::Strong { .. } => "</strong>",
        Span::Em { .. } => "</em>",
        Span::Hyperlink { .. } => "</a>",
        Span::Label { .. } => "</span>",
        Span::Unknown => "",
    }
}

/// Byte index of a UTF-16 offset, clamped to the text
fn byte_offset(text: &str, utf16: usize) -> usize {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        if units >= utf16 {
            return idx;
        }
        units += ch.len_utf16();
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::{Label, Oembed};

    fn paragraph(text: &str, spans: Vec<Span>) -> Block {
        Block::Paragraph(TextBlock {
            text: text.to_string(),
            spans,
            label: None,
        })
    }

    #[test]
    fn test_plain_blocks() {
        let blocks = vec![
            Block::Heading2(TextBlock::plain("Chapter")),
            paragraph("Hello <world> & \"you\"", vec![]),
            Block::Preformatted(TextBlock::plain("line 1\nline 2")),
        ];
        assert_eq!(
            as_html(&blocks),
            "<h2>Chapter</h2>\
             <p>Hello &lt;world&gt; &amp; &quot;you&quot;</p>\
             <pre>line 1<br />line 2</pre>"
        );
    }

    #[test]
    fn test_nested_spans() {
        let block = paragraph(
            "Go to Mars now",
            vec![
                Span::Strong { start: 0, end: 10 },
                Span::Em { start: 6, end: 10 },
            ],
        );
        assert_eq!(
            as_html(&[block]),
            "<p><strong>Go to <em>Mars</em></strong> now</p>"
        );
    }

    #[test]
    fn test_crossing_spans_are_split() {
        let block = paragraph(
            "abcdef",
            vec![Span::Strong { start: 0, end: 4 }, Span::Em { start: 2, end: 6 }],
        );
        assert_eq!(
            as_html(&[block]),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_hyperlink_and_label() {
        let block = paragraph(
            "see NASA site",
            vec![
                Span::Hyperlink {
                    start: 4,
                    end: 8,
                    data: Link {
                        link_type: "Web".to_string(),
                        url: Some("https://nasa.gov".to_string()),
                        target: Some("_blank".to_string()),
                        ..Link::default()
                    },
                },
                Span::Label {
                    start: 9,
                    end: 13,
                    data: Label {
                        label: "codespan".to_string(),
                    },
                },
            ],
        );
        assert_eq!(
            as_html(&[block]),
            r#"<p>see <a href="https://nasa.gov" target="_blank" rel="noopener">NASA</a> <span class="codespan">site</span></p>"#
        );
    }

    #[test]
    fn test_document_links_use_resolver() {
        let block = paragraph(
            "next post",
            vec![Span::Hyperlink {
                start: 0,
                end: 4,
                data: Link {
                    link_type: "Document".to_string(),
                    uid: Some("mars-trip".to_string()),
                    doc_type: Some("p1".to_string()),
                    ..Link::default()
                },
            }],
        );
        let resolver = |link: &Link| link.uid.as_ref().map(|uid| format!("/post/{}", uid));
        assert_eq!(
            as_html_with(&[block], &resolver),
            r#"<p><a href="/post/mars-trip">next</a> post</p>"#
        );
    }

    #[test]
    fn test_lists_are_grouped() {
        let blocks = vec![
            Block::ListItem(TextBlock::plain("a")),
            Block::ListItem(TextBlock::plain("b")),
            Block::OrderedListItem(TextBlock::plain("1")),
            paragraph("end", vec![]),
        ];
        assert_eq!(
            as_html(&blocks),
            "<ul><li>a</li><li>b</li></ul><ol><li>1</li></ol><p>end</p>"
        );
    }

    #[test]
    fn test_offsets_are_utf16() {
        // The rocket takes two UTF-16 units
        let block = paragraph("🚀 décollage", vec![Span::Strong { start: 3, end: 12 }]);
        assert_eq!(as_html(&[block]), "<p>🚀 <strong>décollage</strong></p>");
    }

    #[test]
    fn test_image_and_embed() {
        let blocks = vec![
            Block::Image(ImageBlock {
                url: "https://images.prismic.io/x.png".to_string(),
                alt: Some("rocket".to_string()),
                copyright: None,
                link_to: None,
            }),
            Block::Embed(EmbedBlock {
                oembed: Oembed {
                    embed_url: "https://youtu.be/x".to_string(),
                    kind: "video".to_string(),
                    provider_name: Some("YouTube".to_string()),
                    html: Some("<iframe></iframe>".to_string()),
                },
            }),
        ];
        assert_eq!(
            as_html(&blocks),
            r#"<p class="block-img"><img src="https://images.prismic.io/x.png" alt="rocket" copyright=""></p><div data-oembed="https://youtu.be/x" data-oembed-type="video" data-oembed-provider="YouTube"><iframe></iframe></div>"#
        );
    }
}
