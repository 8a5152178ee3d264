// EPUB parsing and markdown extraction

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Markdown extracted from an EPUB, with book metadata
#[derive(Debug)]
pub struct Extraction {
    /// Book title
    pub title: String,
    /// Book author(s)
    pub author: Option<String>,
    /// Extracted markdown content
    pub markdown: String,
}

impl Extraction {
    /// Total word count across the extracted content (approximate)
    pub fn total_words(&self) -> usize {
        self.markdown.split_whitespace().count()
    }
}

/// Parse an EPUB file and extract its content as markdown.
///
/// Headings are kept as ATX lines: the first heading of each document stays
/// at level 1 (the chapter title), everything else is demoted one level.
/// Tables, figures, code blocks and footnotes are dropped.
pub fn extract_epub_to_markdown(path: &Path) -> Result<Extraction> {
    let mut doc =
        epub::doc::EpubDoc::new(path).map_err(|e| anyhow::anyhow!("Failed to open EPUB: {}", e))?;

    let title = doc
        .mdata("title")
        .map(|m| m.value.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    let author = doc.mdata("creator").map(|m| m.value.clone());

    let mut markdown = String::new();
    markdown.push_str(&format!("# {}\n\n", title));
    if let Some(ref author) = author {
        markdown.push_str(&format!("By {}\n\n", author));
    }

    let spine = doc.spine.clone();
    for spine_item in spine.iter() {
        if let Some((content_bytes, _mime)) = doc.get_resource(&spine_item.idref) {
            let html = String::from_utf8_lossy(&content_bytes).to_string();
            let text = html_to_markdown(&html);

            // Skip empty documents (cover pages, image-only sections)
            if text.trim().is_empty() {
                continue;
            }

            markdown.push_str(text.trim());
            markdown.push_str("\n\n");
        }
    }

    let markdown = collapse_blank_lines(&markdown);

    Ok(Extraction {
        title,
        author,
        markdown,
    })
}

/// Write extracted markdown to a file.
pub fn write_markdown(extraction: &Extraction, output: &Path) -> Result<()> {
    std::fs::write(output, &extraction.markdown)
        .with_context(|| format!("Failed to write markdown to {}", output.display()))
}

/// Block-level elements whose content should not be vocalized.
static STRIP_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["script", "style", "figure", "figcaption", "table", "pre"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
        .collect()
});

static FOOTNOTE_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<p[^>]*data-type="footnote".*?</p\s*>"#).unwrap());

/// Links and images: keep link text, drop everything else.
static INLINE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?(a|img)\b[^>]*>").unwrap());

static HEADING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/?)h([1-6])((?:\s[^>]*)?)>").unwrap());

/// Emphasis and stray markup characters left over after conversion.
static EMPHASIS_MARKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*|\*|__|\^|_").unwrap());

static EXTRA_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Convert one EPUB document's HTML into markdown-style text.
fn html_to_markdown(html: &str) -> String {
    let mut html = html.to_string();
    for re in STRIP_BLOCKS.iter() {
        html = re.replace_all(&html, " ").into_owned();
    }
    html = FOOTNOTE_PARAGRAPH.replace_all(&html, " ").into_owned();
    html = INLINE_TAGS.replace_all(&html, "").into_owned();
    html = rewrite_headings(&html);

    let text = html2text::from_read(html.as_bytes(), 1000);
    let text = EMPHASIS_MARKS.replace_all(&text, "").into_owned();
    collapse_blank_lines(&text)
}

/// Normalize heading levels within one document: the first heading becomes
/// the chapter title at level 1, every other heading is demoted one level
/// (capped at 6) so chapter boundaries stay unambiguous.
fn rewrite_headings(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last_end = 0;
    let mut first_seen = false;
    let mut open_level: Option<u8> = None;

    for caps in HEADING_TAG.captures_iter(html) {
        let m = caps.get(0).unwrap();
        out.push_str(&html[last_end..m.start()]);

        let closing = &caps[1] == "/";
        let level: u8 = caps[2].parse().unwrap();

        if closing {
            let mapped = open_level.take().unwrap_or_else(|| demoted(level));
            out.push_str(&format!("</h{}>", mapped));
        } else {
            let mapped = if first_seen { demoted(level) } else { 1 };
            first_seen = true;
            open_level = Some(mapped);
            out.push_str(&format!("<h{}{}>", mapped, &caps[3]));
        }

        last_end = m.end();
    }
    out.push_str(&html[last_end..]);
    out
}

fn demoted(level: u8) -> u8 {
    (level + 1).min(6)
}

/// Collapse runs of three or more newlines into a paragraph break.
fn collapse_blank_lines(text: &str) -> String {
    EXTRA_BLANK_LINES.replace_all(text, "\n\n").into_owned()
}
