use std::ops::Range;

use log::debug;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};

use crate::block::{Block, RichNode, RichText};
use crate::source::PageBlocks;
use crate::source::warning::ReadWarning;

type Events<'e> = [(Event<'e>, Range<usize>)];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read a Markdown export of a page into content blocks, in document order.
///
/// Headings, paragraphs, block quotes, bulleted list items and tables become
/// blocks. Anything else (code blocks, numbered lists, raw HTML) is skipped
/// and reported as a [`ReadWarning`].
pub fn read_blocks(source: &str, file_id: usize) -> PageBlocks {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let parser = CmarkParser::new_ext(source, options);
    let events: Vec<(Event<'_>, Range<usize>)> = parser.into_offset_iter().collect();

    let mut reader = BlockReader::new(file_id);
    reader.process_events(&events);
    debug!(
        "read {} block(s) with {} warning(s)",
        reader.blocks.len(),
        reader.warnings.len()
    );
    PageBlocks {
        blocks: reader.blocks,
        warnings: reader.warnings,
    }
}

// ---------------------------------------------------------------------------
// Reader state
// ---------------------------------------------------------------------------

/// How link markup is rendered into plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkStyle {
    /// `[label](dest)`, as the link reads on the page source.
    Markdown,
    /// The label only.
    Label,
}

struct BlockReader {
    file_id: usize,
    blocks: Vec<Block>,
    warnings: Vec<ReadWarning>,
}

impl BlockReader {
    fn new(file_id: usize) -> Self {
        BlockReader {
            file_id,
            blocks: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn process_events(&mut self, events: &Events<'_>) {
        let mut i = 0;

        while i < events.len() {
            let (ref ev, _) = events[i];

            match ev {
                Event::Start(Tag::Heading { level, .. }) => {
                    let level = heading_level_to_u8(level);
                    i += 1;
                    let text = collect_inline_text(events, &mut i, LinkStyle::Label);
                    finish_block(events, &mut i, |e| matches!(e, TagEnd::Heading(_)));
                    self.blocks.push(Block::Heading { level, text });
                }

                // Paragraph text keeps link markup; the extractor unwraps it
                Event::Start(Tag::Paragraph) => {
                    i += 1;
                    let text = collect_inline_text(events, &mut i, LinkStyle::Markdown);
                    finish_block(events, &mut i, |e| matches!(e, TagEnd::Paragraph));
                    self.blocks.push(Block::Paragraph(text));
                }

                Event::Start(Tag::BlockQuote(_)) => {
                    i += 1;
                    let nodes =
                        self.collect_rich_nodes(events, &mut i, &|e| {
                            matches!(e, TagEnd::BlockQuote(_))
                        });
                    self.blocks.push(Block::Quote(RichText::new(nodes)));
                }

                // Unordered list = one bullet block per item
                Event::Start(Tag::List(None)) => {
                    i += 1;
                    let mut items = Vec::new();
                    self.collect_list_items(events, &mut i, &mut items);
                    self.blocks.extend(items);
                }

                Event::Start(Tag::Table(_)) => {
                    i += 1;
                    let rows = collect_table(events, &mut i);
                    self.blocks.push(Block::Table(rows));
                }

                Event::Start(_) => self.skip_block(events, &mut i),

                _ => {
                    i += 1;
                }
            }
        }
    }

    /// Collect the items of an unordered list (after its Start event) as
    /// bullet blocks. Nested list items follow their parent item.
    fn collect_list_items(&mut self, events: &Events<'_>, i: &mut usize, out: &mut Vec<Block>) {
        while *i < events.len() {
            let (ref ev, _) = events[*i];
            match ev {
                Event::End(TagEnd::List(_)) => {
                    *i += 1;
                    break;
                }
                Event::Start(Tag::Item) => {
                    *i += 1;
                    self.collect_item(events, i, out);
                }
                _ => {
                    *i += 1;
                }
            }
        }
    }

    fn collect_item(&mut self, events: &Events<'_>, i: &mut usize, out: &mut Vec<Block>) {
        let mut text = String::new();
        let mut nested = Vec::new();

        while *i < events.len() {
            let (ref ev, _) = events[*i];
            match ev {
                Event::End(TagEnd::Item) => {
                    *i += 1;
                    break;
                }
                // Loose list: item text is wrapped in paragraphs
                Event::Start(Tag::Paragraph) => {
                    *i += 1;
                    let run = collect_inline_text(events, i, LinkStyle::Label);
                    finish_block(events, i, |e| matches!(e, TagEnd::Paragraph));
                    push_joined(&mut text, &run);
                }
                Event::Start(Tag::List(None)) => {
                    *i += 1;
                    self.collect_list_items(events, i, &mut nested);
                }
                Event::Start(tag) if !is_inline(tag) => self.skip_block(events, i),
                // Tight list: inline content sits directly in the item
                _ => {
                    let before = *i;
                    let run = collect_inline_text(events, i, LinkStyle::Label);
                    push_joined(&mut text, &run);
                    if *i == before {
                        *i += 1;
                    }
                }
            }
        }

        out.push(Block::BulletItem(text));
        out.extend(nested);
    }

    /// Collect the structure of a quote until the matching End tag.
    fn collect_rich_nodes(
        &mut self,
        events: &Events<'_>,
        i: &mut usize,
        is_end: &dyn Fn(&TagEnd) -> bool,
    ) -> Vec<RichNode> {
        let mut nodes = Vec::new();

        while *i < events.len() {
            let (ref ev, _) = events[*i];
            match ev {
                Event::End(tag_end) if is_end(tag_end) => {
                    *i += 1;
                    break;
                }
                Event::Text(s) | Event::Code(s) => {
                    nodes.push(RichNode::Text(s.to_string()));
                    *i += 1;
                }
                Event::SoftBreak | Event::HardBreak => {
                    nodes.push(RichNode::LineBreak);
                    *i += 1;
                }
                Event::Start(Tag::Paragraph) => {
                    *i += 1;
                    let children =
                        self.collect_rich_nodes(events, i, &|e| matches!(e, TagEnd::Paragraph));
                    nodes.push(RichNode::Container(children));
                }
                Event::Start(Tag::BlockQuote(_)) => {
                    *i += 1;
                    let children = self.collect_rich_nodes(events, i, &|e| {
                        matches!(e, TagEnd::BlockQuote(_))
                    });
                    nodes.push(RichNode::Container(children));
                }
                Event::Start(Tag::Heading { .. }) => {
                    *i += 1;
                    let children =
                        self.collect_rich_nodes(events, i, &|e| matches!(e, TagEnd::Heading(_)));
                    nodes.push(RichNode::Container(children));
                }
                Event::Start(Tag::Item) => {
                    *i += 1;
                    let children =
                        self.collect_rich_nodes(events, i, &|e| matches!(e, TagEnd::Item));
                    nodes.push(RichNode::Container(children));
                }
                // List wrappers are transparent; each item is its own line
                Event::Start(Tag::List(_)) | Event::End(TagEnd::List(_)) => {
                    *i += 1;
                }
                Event::Start(Tag::Strong) => {
                    *i += 1;
                    let children =
                        self.collect_rich_nodes(events, i, &|e| matches!(e, TagEnd::Strong));
                    nodes.push(RichNode::Span(children));
                }
                Event::Start(Tag::Emphasis) => {
                    *i += 1;
                    let children =
                        self.collect_rich_nodes(events, i, &|e| matches!(e, TagEnd::Emphasis));
                    nodes.push(RichNode::Span(children));
                }
                Event::Start(Tag::Strikethrough) => {
                    *i += 1;
                    let children = self.collect_rich_nodes(events, i, &|e| {
                        matches!(e, TagEnd::Strikethrough)
                    });
                    nodes.push(RichNode::Span(children));
                }
                Event::Start(Tag::Link { .. }) => {
                    *i += 1;
                    let children =
                        self.collect_rich_nodes(events, i, &|e| matches!(e, TagEnd::Link));
                    nodes.push(RichNode::Span(children));
                }
                Event::Start(_) => self.skip_block(events, i),
                _ => {
                    *i += 1;
                }
            }
        }

        nodes
    }

    /// Skip a whole block the reader has no counterpart for (the current
    /// event must be its Start), recording a warning at its span.
    fn skip_block(&mut self, events: &Events<'_>, i: &mut usize) {
        let (ref ev, ref range) = events[*i];
        if let Event::Start(tag) = ev {
            let what = describe(tag);
            debug!("skipping {} at {:?}", what, range);
            self.warnings
                .push(ReadWarning::skipped(what, range.clone(), self.file_id));
        }

        let mut depth = 0usize;
        while *i < events.len() {
            match events[*i].0 {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
            *i += 1;
            if depth == 0 {
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn is_inline(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
    )
}

fn describe(tag: &Tag<'_>) -> &'static str {
    match tag {
        Tag::CodeBlock(_) => "code block",
        Tag::List(Some(_)) => "numbered list",
        Tag::HtmlBlock => "HTML block",
        Tag::FootnoteDefinition(_) => "footnote definition",
        _ => "unsupported block",
    }
}

/// Collect inline content as plain text, stopping before the first event
/// that is not inline content (left unconsumed for the caller).
fn collect_inline_text(events: &Events<'_>, i: &mut usize, links: LinkStyle) -> String {
    let mut text = String::new();

    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::Text(s) | Event::Code(s) => text.push_str(s),
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),
            Event::InlineHtml(_) => {}
            Event::Start(Tag::Link { dest_url, .. }) => {
                let dest = dest_url.to_string();
                *i += 1;
                let label = collect_inline_text(events, i, links);
                if matches!(events.get(*i), Some((Event::End(TagEnd::Link), _))) {
                    *i += 1;
                }
                match links {
                    LinkStyle::Markdown if unwraps_cleanly(&label, &dest) => {
                        text.push_str(&format!("[{}]({})", label, dest))
                    }
                    _ => text.push_str(&label),
                }
                continue;
            }
            // Ends the label of the enclosing link
            Event::End(TagEnd::Link) => break,
            Event::Start(tag) if is_inline(tag) => {}
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Image) => {}
            _ => break,
        }
        *i += 1;
    }

    text
}

/// Whether `[label](dest)` reads back as `label` once the extractor strips
/// link markup. Anything else is written as the bare label.
fn unwraps_cleanly(label: &str, dest: &str) -> bool {
    !label.is_empty() && !label.contains(']') && !dest.is_empty() && !dest.contains(')')
}

/// Advance past the End event matching `is_end`.
fn finish_block(events: &Events<'_>, i: &mut usize, is_end: impl Fn(&TagEnd) -> bool) {
    while *i < events.len() {
        let (ref ev, _) = events[*i];
        *i += 1;
        if let Event::End(tag_end) = ev {
            if is_end(tag_end) {
                break;
            }
        }
    }
}

/// Collect table rows (header row first) until End(Table).
fn collect_table(events: &Events<'_>, i: &mut usize) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();

    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(TagEnd::Table) => {
                *i += 1;
                break;
            }
            Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => {
                rows.push(std::mem::take(&mut current_row));
                *i += 1;
            }
            Event::Start(Tag::TableCell) => {
                *i += 1;
                let cell = collect_inline_text(events, i, LinkStyle::Label);
                finish_block(events, i, |e| matches!(e, TagEnd::TableCell));
                current_row.push(cell.trim().to_string());
            }
            _ => {
                *i += 1;
            }
        }
    }

    rows
}

fn push_joined(text: &mut String, run: &str) {
    let run = run.trim();
    if run.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(run);
}
