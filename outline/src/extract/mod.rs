//! Outline extraction: a single pass over the page blocks.
//!
//! Level-2 headings open (`Feature`, `User Story`) or close a feature region,
//! level-3 headings pick the `Background` or `Scenarios` section inside it and
//! level-4 headings start scenarios. Paragraphs, quotes, bullets and tables
//! are filed under whatever section is current when they are seen.

pub mod state;
pub mod text;

use log::{debug, info};
use thiserror::Error;

use crate::block::Block;
use crate::model::Outline;

pub use state::{ExtractionState, Section};
pub use text::DEFAULT_TABLE_HEADER;

/// Why no outline could be extracted. Extraction never yields a partial
/// outline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("the page has no content blocks")]
    NoBlocks,
    #[error("no level-1 heading found to use as the feature title")]
    MissingTitle,
}

/// Heading names and defaults the extractor matches against.
///
/// Heading names are compared after trimming and lower-casing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub feature_headings: Vec<String>,
    pub background_heading: String,
    pub scenarios_heading: String,
    pub default_table_header: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            feature_headings: vec!["feature".to_string(), "user story".to_string()],
            background_heading: "background".to_string(),
            scenarios_heading: "scenarios".to_string(),
            default_table_header: DEFAULT_TABLE_HEADER.to_string(),
        }
    }
}

impl ExtractOptions {
    /// Lower-case and trim the heading names so they compare against
    /// normalized heading text.
    pub fn normalized(mut self) -> Self {
        self.feature_headings = self
            .feature_headings
            .iter()
            .map(|heading| heading.trim().to_lowercase())
            .collect();
        self.background_heading = self.background_heading.trim().to_lowercase();
        self.scenarios_heading = self.scenarios_heading.trim().to_lowercase();
        self
    }
}

/// Turns a block sequence into an [`Outline`].
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Self {
        Extractor {
            options: options.normalized(),
        }
    }

    /// Run one extraction pass over `blocks`.
    pub fn run(&self, blocks: &[Block]) -> Result<Outline, ExtractError> {
        if blocks.is_empty() {
            return Err(ExtractError::NoBlocks);
        }

        let outline = blocks
            .iter()
            .fold(ExtractionState::new(&self.options), |state, block| {
                debug!("{} block", block.kind());
                state.apply(block)
            })
            .finish()
            .ok_or(ExtractError::MissingTitle)?;

        info!(
            "extracted '{}': {} background line(s), {} scenario(s), {} comment(s)",
            outline.title,
            outline.background.len(),
            outline.scenarios.len(),
            outline.comments.len()
        );
        Ok(outline)
    }
}

/// Extract with the default heading names.
pub fn extract(blocks: &[Block]) -> Result<Outline, ExtractError> {
    Extractor::default().run(blocks)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::block::{RichNode, RichText};
    use crate::model::{Element, Scenario, Table};

    fn feature_page(body: Vec<Block>) -> Vec<Block> {
        let mut blocks = vec![Block::heading(1, "Login"), Block::heading(2, "Feature")];
        blocks.extend(body);
        blocks
    }

    fn scenario_page(body: Vec<Block>) -> Vec<Block> {
        let mut blocks = feature_page(vec![
            Block::heading(3, "Scenarios"),
            Block::heading(4, "Happy path"),
        ]);
        blocks.extend(body);
        blocks
    }

    fn elements(outline: &Outline) -> &[Element] {
        &outline.scenarios[0].elements
    }

    #[test]
    fn login_page() {
        let blocks = vec![
            Block::heading(1, "Login"),
            Block::heading(2, "Feature"),
            Block::heading(3, "Background"),
            Block::paragraph("Given app is open"),
            Block::heading(3, "Scenarios"),
            Block::heading(4, "Happy path"),
            Block::paragraph("When user logs in"),
            Block::paragraph("Then success shown"),
        ];

        let outline = extract(&blocks).unwrap();
        assert_eq!(
            outline,
            Outline {
                title: "Login".into(),
                background: vec!["Given app is open".into()],
                scenarios: vec![Scenario {
                    name: "Happy path".into(),
                    elements: vec![
                        Element::Step("When user logs in".into()),
                        Element::Step("Then success shown".into()),
                    ],
                }],
                comments: vec![],
            }
        );
    }

    #[test]
    fn empty_sequence_fails() {
        assert_eq!(extract(&[]), Err(ExtractError::NoBlocks));
    }

    #[test]
    fn missing_title_fails_whole_extraction() {
        let blocks = vec![
            Block::heading(2, "Feature"),
            Block::heading(3, "Background"),
            Block::paragraph("Given app is open"),
        ];
        assert_eq!(extract(&blocks), Err(ExtractError::MissingTitle));
    }

    #[test]
    fn background_keeps_every_paragraph() {
        let blocks = feature_page(vec![
            Block::heading(3, "Background"),
            Block::paragraph("Background"),
            Block::paragraph("Scenarios"),
            Block::paragraph("Given [the app](https://example.com) is\nopen"),
            Block::paragraph("   "),
        ]);
        let outline = extract(&blocks).unwrap();
        assert_eq!(
            outline.background,
            vec!["Background", "Scenarios", "Given the app isopen", ""]
        );
    }

    #[test]
    fn empty_background_paragraph_still_counts() {
        let blocks = feature_page(vec![
            Block::heading(3, "Background"),
            Block::paragraph(""),
        ]);
        let outline = extract(&blocks).unwrap();
        assert_eq!(outline.background, vec![""]);
        assert!(outline.is_valid());
    }

    #[test]
    fn empty_quotes_are_kept() {
        let blocks = scenario_page(vec![Block::Quote(RichText::plain("   "))]);
        let mut blocks_with_comment = vec![
            Block::heading(1, "Login"),
            Block::Quote(RichText::new(vec![])),
        ];
        blocks_with_comment.extend(blocks);

        let outline = extract(&blocks_with_comment).unwrap();
        assert_eq!(outline.comments, vec!["  "]);
        assert_eq!(elements(&outline), &[Element::CommentStep(String::new())]);
    }

    #[test]
    fn keyword_paragraph_outside_scenario_is_not_a_step() {
        let blocks = feature_page(vec![
            Block::heading(3, "Scenarios"),
            Block::paragraph("Given no scenario yet"),
            Block::heading(3, "Notes"),
            Block::heading(4, "Ignored"),
            Block::paragraph("When still nothing"),
        ]);
        let outline = extract(&blocks).unwrap();
        assert!(outline.scenarios.is_empty());
        assert!(outline.background.is_empty());
    }

    #[test]
    fn non_step_paragraphs_are_dropped() {
        let blocks = scenario_page(vec![
            Block::paragraph("Some prose about the scenario"),
            Block::paragraph("Given a real step"),
        ]);
        let outline = extract(&blocks).unwrap();
        assert_eq!(elements(&outline), &[Element::Step("Given a real step".into())]);
    }

    #[test]
    fn quotes_become_comment_steps_or_top_level_comments() {
        let blocks = vec![
            Block::heading(1, "Login"),
            Block::Quote(RichText::plain("Owned by the auth team")),
            Block::heading(2, "Feature"),
            Block::heading(3, "Scenarios"),
            Block::heading(4, "Happy path"),
            Block::Quote(RichText::new(vec![
                RichNode::Container(vec![RichNode::Text("first".into())]),
                RichNode::Container(vec![RichNode::Text("second".into())]),
            ])),
        ];
        let outline = extract(&blocks).unwrap();
        assert_eq!(outline.comments, vec!["  Owned by the auth team"]);
        assert_eq!(
            elements(&outline),
            &[Element::CommentStep("first\n  second".into())]
        );
    }

    #[test]
    fn tables_need_an_active_scenario() {
        let rows = vec![
            vec!["user".to_string(), "role".to_string()],
            vec!["alice".to_string(), "admin".to_string()],
        ];
        let blocks = feature_page(vec![
            Block::Table(rows.clone()),
            Block::heading(3, "Scenarios"),
            Block::Table(rows.clone()),
            Block::heading(4, "Happy path"),
            Block::Table(rows.clone()),
        ]);
        let outline = extract(&blocks).unwrap();
        assert_eq!(elements(&outline), &[Element::Table(Table::from_rows(&rows))]);
    }

    #[test]
    fn tables_outside_feature_are_ignored() {
        let blocks = vec![
            Block::heading(1, "Login"),
            Block::heading(2, "Feature"),
            Block::heading(3, "Scenarios"),
            Block::heading(4, "Happy path"),
            Block::heading(2, "Appendix"),
            Block::Table(vec![vec!["a".into()]]),
        ];
        let outline = extract(&blocks).unwrap();
        assert!(elements(&outline).is_empty());
    }

    #[test]
    fn bullets_use_inferred_header() {
        let blocks = scenario_page(vec![
            Block::paragraph("Then I see the following errors:"),
            Block::bullet(" Invalid password "),
            Block::bullet(""),
            Block::bullet("Account locked"),
        ]);
        let outline = extract(&blocks).unwrap();
        assert_eq!(
            elements(&outline),
            &[
                Element::Step("Then I see the following errors:".into()),
                Element::MonoTable {
                    header: "Errors".into(),
                    value: "Invalid password".into(),
                },
                Element::MonoTable {
                    header: "Errors".into(),
                    value: "Account locked".into(),
                },
            ]
        );
    }

    #[test]
    fn bullets_default_to_elements_header() {
        let blocks = scenario_page(vec![Block::bullet("first")]);
        let outline = extract(&blocks).unwrap();
        assert_eq!(
            elements(&outline),
            &[Element::MonoTable {
                header: "Elements".into(),
                value: "first".into(),
            }]
        );
    }

    #[test]
    fn feature_region_can_be_reentered() {
        let blocks = vec![
            Block::heading(1, "Login"),
            Block::heading(2, "Feature"),
            Block::heading(3, "Scenarios"),
            Block::heading(4, "One"),
            Block::heading(2, "Discussion"),
            Block::heading(3, "Scenarios"),
            Block::heading(4, "Not recorded"),
            Block::heading(2, "user story"),
            Block::heading(3, "scenarios"),
            Block::heading(4, "Two"),
        ];
        let outline = extract(&blocks).unwrap();
        let names: Vec<&str> = outline.scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two"]);
    }

    #[test]
    fn custom_heading_names() {
        let extractor = Extractor::new(ExtractOptions {
            feature_headings: vec!["  Fonctionnalité ".into()],
            background_heading: "Contexte".into(),
            scenarios_heading: "Scénarios".into(),
            default_table_header: "Valeurs".into(),
        });
        let blocks = vec![
            Block::heading(1, "Connexion"),
            Block::heading(2, "Fonctionnalité"),
            Block::heading(3, "Contexte"),
            Block::paragraph("Given l'application est ouverte"),
            Block::heading(3, "Scénarios"),
            Block::heading(4, "Cas nominal"),
            Block::bullet("un"),
        ];
        let outline = extractor.run(&blocks).unwrap();
        assert_eq!(outline.background, vec!["Given l'application est ouverte"]);
        assert_eq!(
            elements(&outline),
            &[Element::MonoTable {
                header: "Valeurs".into(),
                value: "un".into(),
            }]
        );
    }
}
