//! Outline to Gherkin conversion.

use log::{debug, warn};

use outline::{Element, Outline, Scenario, Table};

use crate::align::align_tables;
use crate::error::ConversionError;

const STEP_INDENT: usize = 2;
const TABLE_INDENT: usize = 4;
const COMMENT_INDENT: usize = 2;

/// Convert an extracted outline into feature file text.
///
/// `None` stands for a failed extraction. Nothing is rendered unless the
/// outline has a title and at least one background step or scenario.
pub fn convert_to_gherkin(outline: Option<&Outline>) -> Result<String, ConversionError> {
    let Some(outline) = outline else {
        return Err(ConversionError::MissingContent);
    };
    if !outline.is_valid() {
        return Err(ConversionError::InvalidContent);
    }
    Ok(compose_feature_file(outline))
}

/// Convert and, when `align` is set, run the table alignment pass. Conversion
/// errors are rendered as their error body.
pub fn render_feature(outline: Option<&Outline>, align: bool) -> String {
    let text = convert_to_gherkin(outline).unwrap_or_else(|error| {
        warn!("conversion failed: {:?}", error);
        error.to_string()
    });
    if align { align_tables(&text) } else { text }
}

fn compose_feature_file(outline: &Outline) -> String {
    let mut parts = vec![format!("Feature: {}", outline.title)];

    // Comments sit directly under the feature line as its description
    if !outline.comments.is_empty() {
        parts.push(outline.comments.join("\n"));
    }

    if !outline.background.is_empty() {
        let mut lines = vec!["\nBackground:".to_string()];
        lines.extend(outline.background.iter().map(|line| indent(line, STEP_INDENT)));
        parts.push(lines.join("\n"));
    }

    if !outline.scenarios.is_empty() {
        let scenarios: Vec<String> = outline.scenarios.iter().map(compose_scenario).collect();
        parts.push(scenarios.join("\n"));
    }

    parts.join("\n")
}

fn compose_scenario(scenario: &Scenario) -> String {
    let mut lines = vec![format!("\nScenario: {}", scenario.name)];
    lines.extend(format_elements(&scenario.elements));
    lines.join("\n")
}

/// Render scenario elements, one string per element (tables span several
/// lines).
fn format_elements(elements: &[Element]) -> Vec<String> {
    let retained = merge_consecutive_duplicate_tables(elements);
    if retained.len() < elements.len() {
        debug!(
            "dropped {} repeated table(s)",
            elements.len() - retained.len()
        );
    }

    retained
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let previous = index.checked_sub(1).map(|prev| retained[prev]);
            match element {
                Element::Step(text) => indent(text, STEP_INDENT),
                Element::Table(table) => format_table(table, TABLE_INDENT),
                Element::MonoTable { header, value } => {
                    if matches!(previous, Some(Element::MonoTable { .. })) {
                        format_row(std::slice::from_ref(value), TABLE_INDENT)
                    } else {
                        [header, value]
                            .iter()
                            .map(|cell| format_row(std::slice::from_ref(*cell), TABLE_INDENT))
                            .collect::<Vec<_>>()
                            .join("\n")
                    }
                }
                Element::CommentStep(text) => indent(&format!("#{}", text), COMMENT_INDENT),
            }
        })
        .collect()
}

/// Drop every table that repeats the table retained right before it.
fn merge_consecutive_duplicate_tables(elements: &[Element]) -> Vec<&Element> {
    let mut retained: Vec<&Element> = Vec::with_capacity(elements.len());
    for element in elements {
        if let Element::Table(table) = element {
            if matches!(retained.last(), Some(Element::Table(last)) if last == table) {
                continue;
            }
        }
        retained.push(element);
    }
    retained
}

fn format_table(table: &Table, spaces: usize) -> String {
    table
        .rows()
        .iter()
        .map(|row| format_row(row, spaces))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_row(cells: &[String], spaces: usize) -> String {
    indent(&format!("| {} |", cells.join(" | ")), spaces)
}

fn indent(content: &str, spaces: usize) -> String {
    format!("{}{}", " ".repeat(spaces), content)
}
