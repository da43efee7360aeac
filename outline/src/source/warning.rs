use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

const READ_CONSTRUCTS: &str = "only headings, paragraphs, quotes, bullet lists and tables are read";

/// A page construct the Markdown reader dropped instead of turning it into
/// a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWarning {
    /// What was dropped, e.g. `"code block"`.
    pub construct: &'static str,
    /// Byte range of the whole construct in the page source.
    pub span: Range<usize>,
    pub file_id: usize,
}

impl ReadWarning {
    pub fn skipped(construct: &'static str, span: Range<usize>, file_id: usize) -> Self {
        ReadWarning {
            construct,
            span,
            file_id,
        }
    }

    pub fn message(&self) -> String {
        format!("{} skipped", self.construct)
    }

    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut notes = vec![READ_CONSTRUCTS.to_string()];
        // Numbered steps are a common slip for bullet tables
        if self.construct == "numbered list" {
            notes.push("use a bulleted list to get a one-column table".to_string());
        }

        Diagnostic::warning()
            .with_message(self.message())
            .with_labels(vec![
                Label::primary(self.file_id, self.span.clone())
                    .with_message(format!("this {} is left out of the feature", self.construct)),
            ])
            .with_notes(notes)
    }
}

#[cfg(test)]
mod tests {
    use codespan_reporting::diagnostic::Severity;

    use super::*;

    #[test]
    fn diagnostic_points_at_the_construct() {
        let diagnostic = ReadWarning::skipped("code block", 10..24, 3).to_diagnostic();
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(diagnostic.message, "code block skipped");
        assert_eq!(diagnostic.labels[0].file_id, 3);
        assert_eq!(diagnostic.labels[0].range, 10..24);
        assert_eq!(diagnostic.notes, vec![READ_CONSTRUCTS.to_string()]);
    }

    #[test]
    fn numbered_lists_suggest_bullets() {
        let diagnostic = ReadWarning::skipped("numbered list", 0..5, 0).to_diagnostic();
        assert_eq!(diagnostic.notes.len(), 2);
        assert!(diagnostic.notes[1].contains("bulleted list"));
    }
}
