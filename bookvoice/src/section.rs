//! Section splitting: partitions a markdown document into titled sections at
//! heading boundaries.
//!
//! The document is first flattened into an ordered sequence of block
//! elements, then sliced between boundary headings. Headings below the
//! selected split depth stay in the flow as ordinary content so no text is
//! dropped.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

/// A titled, ordered slice of the document's text.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Section title, taken from the boundary heading
    pub title: String,
    /// Spoken content: the heading text followed by the body blocks
    pub content: String,
    /// Position in the document (0-based)
    pub order: usize,
}

/// A block-level element of the flattened document.
#[derive(Debug, Clone, PartialEq)]
enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
}

impl Block {
    fn text(&self) -> &str {
        match self {
            Block::Heading { text, .. } => text,
            Block::Paragraph(text) => text,
        }
    }
}

static ATX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").unwrap());

/// Flatten a markdown document into an ordered sequence of blocks.
///
/// Recognizes ATX headings; consecutive non-blank lines form one paragraph.
fn project_blocks(document: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    let flush = |paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>| {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(paragraph.join(" ")));
            paragraph.clear();
        }
    };

    for line in document.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush(&mut paragraph, &mut blocks);
            continue;
        }

        if let Some(caps) = ATX_HEADING.captures(trimmed) {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading {
                level: caps[1].len() as u8,
                text: caps[2].trim().to_string(),
            });
        } else {
            paragraph.push(trimmed);
        }
    }
    flush(&mut paragraph, &mut blocks);

    blocks
}

/// Render a run of blocks into section content: every part is followed by a
/// blank line so paragraph boundaries survive into synthesis.
fn render_parts<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut content = String::new();
    for part in parts {
        content.push_str(part);
        content.push_str("\n\n");
    }
    content
}

/// Split a markdown document into ordered sections at heading boundaries.
///
/// Boundaries are level-1 headings, or levels 1-2 when
/// `split_at_subheadings` is set. Content before the first boundary becomes
/// a synthetic "Intro" section when non-empty. A document with no boundary
/// headings yields a single "Content" section holding the whole text.
pub fn split_into_sections(document: &str, split_at_subheadings: bool) -> Result<Vec<Section>> {
    let blocks = project_blocks(document);
    if blocks.is_empty() {
        anyhow::bail!("document contains no readable text");
    }

    let max_level: u8 = if split_at_subheadings { 2 } else { 1 };
    let boundaries: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| matches!(b, Block::Heading { level, .. } if *level <= max_level))
        .map(|(i, _)| i)
        .collect();

    if boundaries.is_empty() {
        return Ok(vec![Section {
            title: "Content".to_string(),
            content: document.to_string(),
            order: 0,
        }]);
    }

    let mut sections = Vec::new();

    // Pre-heading content becomes a synthetic intro section
    let intro = render_parts(blocks[..boundaries[0]].iter().map(|b| b.text()));
    if !intro.trim().is_empty() {
        sections.push(Section {
            title: "Intro".to_string(),
            content: intro,
            order: sections.len(),
        });
    }

    for (i, &start) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(i + 1)
            .copied()
            .unwrap_or(blocks.len());

        let title = blocks[start].text().to_string();
        let content = render_parts(blocks[start..end].iter().map(|b| b.text()));

        sections.push(Section {
            title,
            content,
            order: sections.len(),
        });
    }

    Ok(sections)
}
