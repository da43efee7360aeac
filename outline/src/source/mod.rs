//! Block sources. The extractor only sees `&[Block]`; this module provides a
//! reader for Markdown exports of a page.

mod markdown;
pub mod warning;

pub use markdown::read_blocks;
pub use warning::ReadWarning;

use crate::block::Block;

/// Blocks read from a page, with notices about anything skipped.
#[derive(Debug, Clone, Default)]
pub struct PageBlocks {
    pub blocks: Vec<Block>,
    pub warnings: Vec<ReadWarning>,
}
