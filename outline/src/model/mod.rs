/// The extracted feature outline: the intermediate form between the page
/// blocks and the rendered feature file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outline {
    pub title: String,
    /// Background steps, one per line, unindented.
    pub background: Vec<String>,
    pub scenarios: Vec<Scenario>,
    /// Top-level comments. Each one already carries its two-space indent.
    pub comments: Vec<String>,
}

impl Outline {
    /// An outline can be rendered only with a title and at least one
    /// background step or scenario.
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty() && (!self.background.is_empty() || !self.scenarios.is_empty())
    }
}

/// A named scenario and its elements in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scenario {
    pub name: String,
    pub elements: Vec<Element>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Scenario {
            name: name.into(),
            elements: Vec::new(),
        }
    }
}

/// One line group inside a scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A Given/When/Then/And step.
    Step(String),
    /// A quote attached to the scenario, rendered as a comment.
    CommentStep(String),
    /// A multi-column data table.
    Table(Table),
    /// A one-column table built from a single bullet item: `[header], [value]`.
    MonoTable { header: String, value: String },
}

/// A rectangular table: every row has the same number of cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from raw rows, trimming every cell and padding short rows
    /// with empty cells. Rows without any cell are dropped.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let mut rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.as_ref().trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Table { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
