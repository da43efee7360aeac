pub mod rich_text;

pub use rich_text::{RichNode, RichText};

/// A single content block of a rendered page, in document order.
///
/// Blocks are supplied by whatever reads the page (see [`crate::source`]) and
/// are never mutated by extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A heading. Level 1 carries the page title, levels 2-4 drive sections.
    Heading { level: u8, text: String },
    /// A quote block; becomes a comment in the feature file.
    Quote(RichText),
    /// Plain paragraph text as rendered. May still contain literal
    /// `[label](url)` link syntax and embedded line breaks.
    Paragraph(String),
    /// A single bulleted list item.
    BulletItem(String),
    /// A table as rows of cell text, header row first.
    Table(Vec<Vec<String>>),
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph(text.into())
    }

    pub fn bullet(text: impl Into<String>) -> Self {
        Block::BulletItem(text.into())
    }

    /// Short name of the variant, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "heading",
            Block::Quote(_) => "quote",
            Block::Paragraph(_) => "paragraph",
            Block::BulletItem(_) => "bullet item",
            Block::Table(_) => "table",
        }
    }
}
