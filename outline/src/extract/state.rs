use log::debug;

use crate::block::{Block, RichText};
use crate::extract::ExtractOptions;
use crate::extract::text::{clean_paragraph, infer_table_header, is_step};
use crate::model::{Element, Outline, Scenario, Table};

/// Which part of a feature region the walk is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    None,
    Background,
    Scenarios,
}

/// State threaded through one extraction pass.
///
/// Each call to [`ExtractionState::apply`] consumes one block and returns the
/// next state. The active scenario is an index into `outline.scenarios`.
#[derive(Debug, Clone)]
pub struct ExtractionState<'o> {
    options: &'o ExtractOptions,
    outline: Outline,
    title: Option<String>,
    recording: bool,
    section: Section,
    active_scenario: Option<usize>,
    table_header: String,
}

impl<'o> ExtractionState<'o> {
    pub fn new(options: &'o ExtractOptions) -> Self {
        ExtractionState {
            options,
            outline: Outline::default(),
            title: None,
            recording: false,
            section: Section::None,
            active_scenario: None,
            table_header: options.default_table_header.clone(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn active_scenario(&self) -> Option<&Scenario> {
        self.active_scenario
            .and_then(|index| self.outline.scenarios.get(index))
    }

    /// Header given to the next bullet table.
    pub fn table_header(&self) -> &str {
        &self.table_header
    }

    /// The outline built so far. The title is only filled in by `finish`.
    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    /// Consume one block.
    pub fn apply(mut self, block: &Block) -> Self {
        match block {
            Block::Heading { level, text } => self.on_heading(*level, text),
            Block::Quote(rich) => self.on_quote(rich),
            Block::Paragraph(text) => self.on_paragraph(text),
            Block::BulletItem(text) => self.on_bullet(text),
            Block::Table(rows) => self.on_table(rows),
        }
        self
    }

    /// End the pass. `None` when no title heading was seen.
    pub fn finish(self) -> Option<Outline> {
        let title = self.title?;
        Some(Outline {
            title,
            ..self.outline
        })
    }

    fn on_heading(&mut self, level: u8, text: &str) {
        let normalized = text.trim().to_lowercase();
        match level {
            1 => self.title = Some(text.trim().to_string()),
            2 => {
                self.recording = self
                    .options
                    .feature_headings
                    .iter()
                    .any(|heading| *heading == normalized);
                self.section = Section::None;
                self.active_scenario = None;
                debug!(
                    "heading '{}' {} recording",
                    text.trim(),
                    if self.recording { "starts" } else { "stops" }
                );
            }
            3 if self.recording => {
                self.section = if normalized == self.options.background_heading {
                    Section::Background
                } else if normalized == self.options.scenarios_heading {
                    Section::Scenarios
                } else {
                    Section::None
                };
                self.active_scenario = None;
                debug!("section {:?} from heading '{}'", self.section, text.trim());
            }
            4 if self.recording && self.section == Section::Scenarios => {
                self.outline.scenarios.push(Scenario::new(text.trim()));
                self.active_scenario = Some(self.outline.scenarios.len() - 1);
            }
            _ => debug!("ignoring level {} heading '{}'", level, text.trim()),
        }
    }

    fn on_quote(&mut self, rich: &RichText) {
        let text = rich.flatten();
        match self.active_scenario_mut() {
            Some(scenario) => scenario.elements.push(Element::CommentStep(text)),
            None => self.outline.comments.push(format!("  {}", text)),
        }
    }

    fn on_paragraph(&mut self, raw: &str) {
        let text = clean_paragraph(raw);
        match self.section {
            Section::Background => self.outline.background.push(text),
            Section::Scenarios if is_step(&text) => {
                let header = infer_table_header(&text, &self.options.default_table_header);
                match self.active_scenario_mut() {
                    Some(scenario) => {
                        scenario.elements.push(Element::Step(text));
                    }
                    None => {
                        debug!("step '{}' outside any scenario, skipped", text);
                        return;
                    }
                }
                self.table_header = header;
            }
            _ => debug!("paragraph '{}' outside a step context, skipped", text),
        }
    }

    fn on_table(&mut self, rows: &[Vec<String>]) {
        if !self.recording {
            return;
        }
        let table = Table::from_rows(rows);
        if table.is_empty() {
            return;
        }
        if self.section != Section::Scenarios {
            debug!("table outside the scenarios section, skipped");
            return;
        }
        match self.active_scenario_mut() {
            Some(scenario) => scenario.elements.push(Element::Table(table)),
            None => debug!("table before the first scenario, skipped"),
        }
    }

    fn on_bullet(&mut self, raw: &str) {
        let value = raw.trim();
        if value.is_empty() || self.section != Section::Scenarios {
            return;
        }
        let header = self.table_header.clone();
        if let Some(scenario) = self.active_scenario_mut() {
            scenario.elements.push(Element::MonoTable {
                header,
                value: value.to_string(),
            });
        }
    }

    fn active_scenario_mut(&mut self) -> Option<&mut Scenario> {
        self.active_scenario
            .and_then(|index| self.outline.scenarios.get_mut(index))
    }
}
