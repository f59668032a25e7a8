//! Converts raw model output into an [`Article`].
//!
//! Models answer either in Markdown (the prompt asks for `# Title` and `##`
//! sections) or, occasionally, in HTML. Both are accepted. The body handed to
//! the store and the CMS is always HTML.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{Article, ProcessingError};

static HTML_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(h[1-6]|p|ul|ol|div|article|section)[\s>]").expect("valid regex")
});
static HTML_H1: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("valid regex"));
static HTML_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*|__([^_]+)__").expect("valid regex"));
static ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*\s][^*]*)\*").expect("valid regex"));
static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s+(.*)$").expect("valid regex"));

/// Turns raw generated text into an article.
pub trait PostProcessor: Send + Sync {
    fn process(&self, raw: &str) -> Result<Article, ProcessingError>;
}

/// Default post-processor producing an HTML body.
#[derive(Debug, Clone, Default)]
pub struct HtmlPostProcessor;

impl HtmlPostProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl PostProcessor for HtmlPostProcessor {
    fn process(&self, raw: &str) -> Result<Article, ProcessingError> {
        let text = strip_code_fence(raw.trim());

        if HTML_BLOCK.is_match(text) {
            let (title, body) = split_html(text);
            return Article::new(title, body);
        }

        let (title, body) = split_markdown(text);
        Article::new(title, render_markdown(&body))
    }
}

/// Remove a wrapping ```lang ... ``` fence if the whole answer is fenced.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => return text,
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

fn split_html(text: &str) -> (String, String) {
    if let Some(caps) = HTML_H1.captures(text) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        let title = caps.get(1).map(|m| strip_tags(m.as_str())).unwrap_or_default();
        let mut body = String::with_capacity(text.len());
        body.push_str(&text[..whole.start]);
        body.push_str(&text[whole.end..]);
        return (title, strip_document_shell(&body));
    }

    if let Some(caps) = HTML_TITLE.captures(text) {
        let title = caps.get(1).map(|m| strip_tags(m.as_str())).unwrap_or_default();
        return (title, strip_document_shell(text));
    }

    // First non-empty text line as title
    let title = text
        .lines()
        .map(strip_tags)
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default();
    (title, strip_document_shell(text))
}

/// Drop `<html>`, `<head>` and `<body>` wrappers, keeping the content.
fn strip_document_shell(html: &str) -> String {
    let mut out = html.to_string();
    if let (Some(start), Some(end)) = (out.find("<head"), out.find("</head>")) {
        if start < end {
            out.replace_range(start..end + "</head>".len(), "");
        }
    }
    for tag in [
        "<!DOCTYPE html>",
        "<!doctype html>",
        "<html>",
        "</html>",
        "<body>",
        "</body>",
    ] {
        out = out.replace(tag, "");
    }
    out.trim().to_string()
}

fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, "").trim().to_string()
}

fn split_markdown(text: &str) -> (String, String) {
    let mut lines = text.lines();
    let mut title = String::new();
    for line in lines.by_ref() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        title = clean_title(trimmed);
        break;
    }
    let body = lines.collect::<Vec<_>>().join("\n");
    (title, body)
}

fn clean_title(line: &str) -> String {
    let line = strip_bold(line.trim_start_matches('#').trim());
    let line = line
        .strip_prefix("Title:")
        .or_else(|| line.strip_prefix("title:"))
        .unwrap_or(line)
        .trim();
    strip_bold(line).trim_matches('"').trim().to_string()
}

fn strip_bold(text: &str) -> &str {
    text.strip_prefix("**")
        .and_then(|t| t.strip_suffix("**"))
        .unwrap_or(text)
        .trim()
}

enum Block {
    None,
    Paragraph(Vec<String>),
    Unordered(Vec<String>),
    Ordered(Vec<String>),
}

/// Render the Markdown subset models actually produce.
fn render_markdown(text: &str) -> String {
    let mut html = Vec::new();
    let mut block = Block::None;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush(&mut block, &mut html);
            continue;
        }

        if let Some((level, heading)) = heading(trimmed) {
            flush(&mut block, &mut html);
            html.push(format!("<h{level}>{}</h{level}>", inline(heading)));
            continue;
        }

        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
            .or_else(|| trimmed.strip_prefix("+ "))
        {
            if !matches!(block, Block::Unordered(_)) {
                flush(&mut block, &mut html);
                block = Block::Unordered(Vec::new());
            }
            if let Block::Unordered(items) = &mut block {
                items.push(inline(item.trim()));
            }
            continue;
        }

        if let Some(caps) = ORDERED_ITEM.captures(trimmed) {
            let item = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if !matches!(block, Block::Ordered(_)) {
                flush(&mut block, &mut html);
                block = Block::Ordered(Vec::new());
            }
            if let Block::Ordered(items) = &mut block {
                items.push(inline(item.trim()));
            }
            continue;
        }

        if !matches!(block, Block::Paragraph(_)) {
            flush(&mut block, &mut html);
            block = Block::Paragraph(Vec::new());
        }
        if let Block::Paragraph(lines) = &mut block {
            lines.push(inline(trimmed));
        }
    }
    flush(&mut block, &mut html);

    html.join("\n")
}

fn flush(block: &mut Block, html: &mut Vec<String>) {
    match std::mem::replace(block, Block::None) {
        Block::None => {}
        Block::Paragraph(lines) => html.push(format!("<p>{}</p>", lines.join(" "))),
        Block::Unordered(items) => html.push(list("ul", &items)),
        Block::Ordered(items) => html.push(list("ol", &items)),
    }
}

fn list(tag: &str, items: &[String]) -> String {
    let items: String = items.iter().map(|i| format!("<li>{i}</li>")).collect();
    format!("<{tag}>{items}</{tag}>")
}

/// Heading level (2..=6) and text. A stray `#` heading inside the body is
/// demoted to `<h2>`, the page title is the only `<h1>`.
fn heading(line: &str) -> Option<(usize, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = line[hashes..].strip_prefix(' ')?;
    Some((hashes.max(2), rest.trim()))
}

fn inline(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    let bolded = BOLD.replace_all(&escaped, |caps: &regex_lite::Captures| {
        let inner = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        format!("<strong>{inner}</strong>")
    });
    ITALIC
        .replace_all(&bolded, "<em>$1</em>")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(raw: &str) -> Result<Article, ProcessingError> {
        HtmlPostProcessor::new().process(raw)
    }

    #[test]
    fn test_markdown_article() {
        let raw = "# The Future of Solar Energy\n\n\
                   Solar power is **growing** fast.\nCosts keep falling.\n\n\
                   ## Key Drivers\n\n\
                   - Cheaper panels\n- Better *storage*\n\n\
                   1. Install\n2. Save";
        let article = process(raw).unwrap();

        assert_eq!(article.title, "The Future of Solar Energy");
        assert_eq!(
            article.body,
            "<p>Solar power is <strong>growing</strong> fast. Costs keep falling.</p>\n\
             <h2>Key Drivers</h2>\n\
             <ul><li>Cheaper panels</li><li>Better <em>storage</em></li></ul>\n\
             <ol><li>Install</li><li>Save</li></ol>"
        );
    }

    #[test]
    fn test_fenced_markdown() {
        let raw = "```markdown\n# EV Batteries\n\nLithium chemistry explained.\n```";
        let article = process(raw).unwrap();
        assert_eq!(article.title, "EV Batteries");
        assert_eq!(article.body, "<p>Lithium chemistry explained.</p>");
    }

    #[test]
    fn test_title_prefix_and_bold_are_cleaned() {
        let article = process("**Title: Urban Gardening**\nGrow food at home.").unwrap();
        assert_eq!(article.title, "Urban Gardening");

        let article = process("Title: Composting 101\nStart small.").unwrap();
        assert_eq!(article.title, "Composting 101");
    }

    #[test]
    fn test_html_article_passes_through() {
        let raw = "<h1>Wind Power</h1>\n<p>Turbines are <em>big</em>.</p>";
        let article = process(raw).unwrap();
        assert_eq!(article.title, "Wind Power");
        assert_eq!(article.body, "<p>Turbines are <em>big</em>.</p>");
    }

    #[test]
    fn test_html_document_shell_is_removed() {
        let raw = "<!DOCTYPE html><html><head><title>Tides</title></head>\
                   <body><p>The moon pulls the sea.</p></body></html>";
        let article = process(raw).unwrap();
        assert_eq!(article.title, "Tides");
        assert_eq!(article.body, "<p>The moon pulls the sea.</p>");
    }

    #[test]
    fn test_text_is_escaped() {
        let article = process("# Math\n\n1 < 2 & 3 > 2").unwrap();
        assert_eq!(article.body, "<p>1 &lt; 2 &amp; 3 &gt; 2</p>");
    }

    #[test]
    fn test_title_only_is_empty_body() {
        assert!(matches!(
            process("# Just a title\n\n"),
            Err(ProcessingError::EmptyBody)
        ));
    }

    #[test]
    fn test_blank_input_has_no_title() {
        assert!(matches!(process("   \n  "), Err(ProcessingError::NoTitle)));
        assert!(matches!(process("#\nbody"), Err(ProcessingError::NoTitle)));
    }
}
