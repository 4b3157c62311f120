//! Prismic structured text
//!
//! A rich text field is a list of block nodes (paragraphs, headings, list
//! items, images, embeds). Inline formatting is carried as spans whose
//! offsets count UTF-16 code units, the way the CMS editor measures them.

use serde::{Deserialize, Serialize};

use crate::helpers::escape_html;

/// A block of structured text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<serde_json::Value>,
}

impl RichTextNode {
    /// A plain paragraph
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: "paragraph".to_string(),
            text: text.into(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }
}

/// Inline formatting over `[start, end)` of a node's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Plain text of the nodes, joined with a space
pub fn as_text(nodes: &[RichTextNode]) -> String {
    nodes
        .iter()
        .map(|n| n.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the nodes as HTML; consecutive list items share one list element
pub fn as_html(nodes: &[RichTextNode]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for node in nodes {
        let list = match node.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };
        if list != open_list {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        let inline = render_inline(&node.text, &node.spans);
        match node.kind.as_str() {
            "list-item" | "o-list-item" => html.push_str(&format!("<li>{}</li>", inline)),
            "preformatted" => html.push_str(&format!("<pre>{}</pre>", inline)),
            "image" => {
                let src = node.url.as_deref().unwrap_or_default();
                let alt = node.alt.as_deref().unwrap_or_default();
                html.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                    escape_html(src),
                    escape_html(alt)
                ));
            }
            "embed" => {
                let embed = node
                    .oembed
                    .as_ref()
                    .and_then(|o| o.get("html"))
                    .and_then(|h| h.as_str())
                    .unwrap_or_default();
                let url = node
                    .oembed
                    .as_ref()
                    .and_then(|o| o.get("embed_url"))
                    .and_then(|u| u.as_str())
                    .unwrap_or_default();
                html.push_str(&format!(
                    r#"<div data-oembed="{}">{}</div>"#,
                    escape_html(url),
                    embed
                ));
            }
            kind => match heading_level(kind) {
                Some(level) => html.push_str(&format!("<h{0}>{1}</h{0}>", level, inline)),
                None => html.push_str(&format!("<p>{}</p>", inline)),
            },
        }
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }
    html
}

fn heading_level(kind: &str) -> Option<u8> {
    kind.strip_prefix("heading")
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=6).contains(n))
}

/// Escape the text and wrap the spans around it.
///
/// Overlapping spans are split: when an outer span closes first, the spans
/// opened inside it are closed and reopened right after.
fn render_inline(text: &str, spans: &[Span]) -> String {
    let mut spans: Vec<&Span> = spans.iter().filter(|s| s.start < s.end).collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut next = 0;
    let mut pos = 0;

    for ch in text.chars() {
        close_spans(&mut out, &mut open, pos);
        while next < spans.len() && spans[next].start <= pos {
            out.push_str(&open_tag(spans[next]));
            open.push(spans[next]);
            next += 1;
        }
        match ch {
            '\n' => out.push_str("<br />"),
            _ => out.push_str(&escape_html(ch.encode_utf8(&mut [0; 4]))),
        }
        pos += ch.len_utf16();
    }
    close_spans(&mut out, &mut open, usize::MAX);
    out
}

fn close_spans<'a>(out: &mut String, open: &mut Vec<&'a Span>, pos: usize) {
    while let Some(idx) = open.iter().position(|s| s.end <= pos) {
        let reopen: Vec<&Span> = open.drain(idx + 1..).collect();
        for span in reopen.iter().rev() {
            out.push_str(close_tag(span));
        }
        if let Some(span) = open.pop() {
            out.push_str(close_tag(span));
        }
        for span in reopen.into_iter().filter(|s| s.end > pos) {
            out.push_str(&open_tag(span));
            open.push(span);
        }
    }
}

fn span_data<'a>(span: &'a Span, key: &str) -> Option<&'a str> {
    span.data.as_ref()?.get(key)?.as_str()
}

fn open_tag(span: &Span) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let href = span_data(span, "url").unwrap_or("#");
            match span_data(span, "target") {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener noreferrer">"#,
                    escape_html(href),
                    escape_html(target)
                ),
                None => format!(r#"<a href="{}">"#, escape_html(href)),
            }
        }
        "label" => format!(
            r#"<span class="{}">"#,
            escape_html(span_data(span, "label").unwrap_or_default())
        ),
        _ => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(kind: &str, text: &str) -> RichTextNode {
        RichTextNode {
            kind: kind.to_string(),
            ..RichTextNode::paragraph(text)
        }
    }

    fn span(kind: &str, start: usize, end: usize) -> Span {
        Span {
            start,
            end,
            kind: kind.to_string(),
            data: None,
        }
    }

    #[test]
    fn test_as_text() {
        let nodes = vec![node("paragraph", "Hello world"), node("image", ""), node("heading2", "Bye")];
        assert_eq!(as_text(&nodes), "Hello world Bye");
        assert_eq!(as_text(&[]), "");
    }

    #[test]
    fn test_blocks_and_lists() {
        let nodes = vec![
            node("heading3", "Title"),
            node("list-item", "one"),
            node("list-item", "two"),
            node("o-list-item", "first"),
            node("paragraph", "a < b"),
        ];
        assert_eq!(
            as_html(&nodes),
            "<h3>Title</h3><ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><p>a &lt; b</p>"
        );
    }

    #[test]
    fn test_spans() {
        let mut p = node("paragraph", "bold and link");
        p.spans = vec![
            span("strong", 0, 4),
            Span {
                data: Some(json!({ "url": "https://example.com", "target": "_blank" })),
                ..span("hyperlink", 9, 13)
            },
        ];
        assert_eq!(
            as_html(&[p]),
            r#"<p><strong>bold</strong> and <a href="https://example.com" target="_blank" rel="noopener noreferrer">link</a></p>"#
        );
    }

    #[test]
    fn test_nested_and_overlapping_spans() {
        let mut nested = node("paragraph", "abcd");
        nested.spans = vec![span("em", 1, 3), span("strong", 0, 4)];
        assert_eq!(as_html(&[nested]), "<p><strong>a<em>bc</em>d</strong></p>");

        let mut overlap = node("paragraph", "abcd");
        overlap.spans = vec![span("strong", 0, 2), span("em", 1, 4)];
        assert_eq!(
            as_html(&[overlap]),
            "<p><strong>a<em>b</em></strong><em>cd</em></p>"
        );
    }

    #[test]
    fn test_nested_spans_with_shared_end() {
        let mut last_word = node("paragraph", "abcd");
        last_word.spans = vec![span("strong", 0, 4), span("em", 2, 4)];
        assert_eq!(as_html(&[last_word]), "<p><strong>ab<em>cd</em></strong></p>");

        let mut mid_text = node("paragraph", "abcde");
        mid_text.spans = vec![span("strong", 0, 4), span("em", 2, 4)];
        assert_eq!(as_html(&[mid_text]), "<p><strong>ab<em>cd</em></strong>e</p>");
    }

    #[test]
    fn test_span_offsets_are_utf16() {
        let mut p = node("paragraph", "😀 ok");
        // the emoji takes two UTF-16 units
        p.spans = vec![span("em", 3, 5)];
        assert_eq!(as_html(&[p]), "<p>😀 <em>ok</em></p>");
    }

    #[test]
    fn test_newlines_become_breaks() {
        assert_eq!(as_html(&[node("paragraph", "a\nb")]), "<p>a<br />b</p>");
    }

    #[test]
    fn test_image_block() {
        let mut img = node("image", "");
        img.url = Some("https://images.prismic.io/x.png".to_string());
        img.alt = Some("A \"quote\"".to_string());
        assert_eq!(
            as_html(&[img]),
            r#"<p class="block-img"><img src="https://images.prismic.io/x.png" alt="A &quot;quote&quot;" /></p>"#
        );
    }

    #[test]
    fn test_deserialize_prismic_node() {
        let json = r#"{
            "type": "paragraph",
            "text": "Lorem ipsum",
            "spans": [{ "start": 0, "end": 5, "type": "strong" }]
        }"#;
        let node: RichTextNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, "paragraph");
        assert_eq!(node.spans.len(), 1);
        assert!(node.url.is_none());
    }
}
