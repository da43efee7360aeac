use std::sync::LazyLock;

use regex::Regex;

static BREAK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("line break pattern is valid"));

/// Nested inline/block structure of a quote.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RichText {
    pub nodes: Vec<RichNode>,
}

/// One node of a [`RichText`] tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RichNode {
    /// Raw text run.
    Text(String),
    /// Inline child (emphasis, link, ...). Adds no break of its own.
    Span(Vec<RichNode>),
    /// Block-level child (paragraph-like container, quoted sub-block).
    /// Followed by a line break when flattened.
    Container(Vec<RichNode>),
    /// Explicit line break.
    LineBreak,
}

impl RichText {
    pub fn new(nodes: Vec<RichNode>) -> Self {
        RichText { nodes }
    }

    /// Rich text made of a single raw run.
    pub fn plain(text: impl Into<String>) -> Self {
        RichText {
            nodes: vec![RichNode::Text(text.into())],
        }
    }

    /// Flatten to comment text.
    ///
    /// Runs of blank lines collapse to a single break and every continuation
    /// line is indented by two spaces so it lines up under the comment marker.
    pub fn flatten(&self) -> String {
        let mut raw = String::new();
        flatten_into(&self.nodes, &mut raw);
        let collapsed = BREAK_RUNS.replace_all(raw.trim(), "\n");
        collapsed.replace('\n', "\n  ")
    }
}

fn flatten_into(nodes: &[RichNode], out: &mut String) {
    for node in nodes {
        match node {
            RichNode::Text(text) => out.push_str(text),
            RichNode::Span(children) => flatten_into(children, out),
            RichNode::Container(children) => {
                flatten_into(children, out);
                out.push('\n');
            }
            RichNode::LineBreak => out.push('\n'),
        }
    }
}
