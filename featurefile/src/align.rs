//! Column alignment for pipe tables in rendered feature text.
//!
//! Every run of consecutive table lines is aligned on its own; lines between
//! runs pass through untouched.

/// Pad the cells of each table run so its columns line up.
///
/// The run keeps the indentation of its first line. Running the pass on
/// already aligned text returns it unchanged.
pub fn align_tables(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut run_indent = "";

    for line in text.split('\n') {
        if is_table_line(line) {
            if run.is_empty() {
                run_indent = leading_whitespace(line);
            }
            run.push(line);
        } else {
            flush_run(&mut run, run_indent, &mut lines);
            lines.push(line.to_string());
        }
    }
    flush_run(&mut run, run_indent, &mut lines);

    lines.join("\n")
}

fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|')
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

fn split_cells(line: &str) -> Vec<&str> {
    let trimmed = line.trim();
    let inner = trimmed
        .strip_prefix('|')
        .and_then(|rest| rest.strip_suffix('|'))
        .unwrap_or("");
    inner.split('|').map(str::trim).collect()
}

fn flush_run(run: &mut Vec<&str>, indent: &str, out: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }

    let rows: Vec<Vec<&str>> = run.iter().map(|line| split_cells(line)).collect();

    let mut widths: Vec<usize> = Vec::new();
    for row in &rows {
        for (column, cell) in row.iter().enumerate() {
            let width = cell.chars().count();
            match widths.get_mut(column) {
                Some(max) => *max = (*max).max(width),
                None => widths.push(width),
            }
        }
    }

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        out.push(format!("{}| {} |", indent, cells.join(" | ")));
    }

    run.clear();
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn aligns_columns_within_a_run() {
        assert_eq!(
            align_tables("    | a | bb |\n    | ccc | d |"),
            "    | a   | bb |\n    | ccc | d  |"
        );
    }

    #[test]
    fn alignment_is_idempotent() {
        let text = "Feature: X\n\nScenario: Y\n  Given rows\n    | name | role |\n    | alice | administrator |\n  Then done";
        let once = align_tables(text);
        assert_eq!(align_tables(&once), once);
    }

    #[test]
    fn separate_runs_align_independently() {
        let text = "    | a | b |\n    | long cell | c |\n  And then\n    | x |\n    | yy |";
        assert_eq!(
            align_tables(text),
            "    | a         | b |\n    | long cell | c |\n  And then\n    | x  |\n    | yy |"
        );
    }

    #[test]
    fn run_uses_first_line_indentation() {
        assert_eq!(
            align_tables("  | a |\n      | bbb |"),
            "  | a   |\n  | bbb |"
        );
    }

    #[test]
    fn other_lines_pass_through() {
        let text = "Feature: X\n  # not | a table\n\n  Given | partial";
        assert_eq!(align_tables(text), text);
    }

    #[test]
    fn widths_count_characters_not_bytes() {
        assert_eq!(
            align_tables("| é | x |\n| ab | y |"),
            "| é  | x |\n| ab | y |"
        );
    }

    #[test]
    fn ragged_rows_keep_their_cells() {
        assert_eq!(
            align_tables("| a | b | c |\n| dd |"),
            "| a  | b | c |\n| dd |"
        );
    }
}
