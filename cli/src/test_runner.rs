use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::{
    Color, ColorChoice, ColorSpec, StandardStream, WriteColor,
};
use log::debug;
use serde::Deserialize;

use outline::Extractor;
use outline::source::read_blocks;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Expected feature text (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected conversion failure: the error body must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Expected number of reader warnings. Unchecked when absent.
    #[serde(default)]
    pub expect_warnings: Option<usize>,

    /// Run the table alignment pass before comparing.
    #[serde(default = "default_align")]
    pub align: bool,
}

fn default_align() -> bool {
    true
}

/// Split a `.test.md` file into its TOML front matter and Markdown page.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- front matter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- front matter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let page = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, page))
}

#[derive(Debug, PartialEq, Eq)]
pub enum TestOutcome {
    Pass,
    Fail(String),
}

#[derive(Debug)]
pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path, extractor: &Extractor) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, page) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("front matter error: {}", e)),
    };
    let description = config.description.clone();

    let blocks = read_blocks(page, 0);
    let outline = extractor.run(&blocks.blocks).ok();
    let converted = featurefile::convert_to_gherkin(outline.as_ref());

    let mismatch = match (&config.expect_error, &config.expect_output, converted) {
        (Some(expected), _, Err(error)) => {
            let body = error.to_string();
            (!body.contains(expected.as_str()))
                .then(|| format!("expected error containing \"{}\", got: {}", expected, body))
        }
        (Some(expected), _, Ok(_)) => Some(format!(
            "expected error containing \"{}\", but conversion succeeded",
            expected
        )),
        (None, _, Err(error)) => Some(format!("unexpected conversion error: {}", error)),
        (None, Some(expected), Ok(text)) => {
            let actual = if config.align {
                featurefile::align_tables(&text)
            } else {
                text
            };
            (actual.trim() != expected.trim()).then(|| {
                format!(
                    "output mismatch\n--- expected\n{}\n--- actual\n{}",
                    expected.trim(),
                    actual.trim()
                )
            })
        }
        (None, None, Ok(_)) => None,
    };
    if let Some(reason) = mismatch {
        return fail(description, reason);
    }

    if let Some(expected) = config.expect_warnings {
        if blocks.warnings.len() != expected {
            let actual: Vec<String> = blocks
                .warnings
                .iter()
                .map(|w| format!("  - {}", w.message()))
                .collect();
            return fail(
                description,
                format!(
                    "expected {} warning(s), got {}\n{}",
                    expected,
                    blocks.warnings.len(),
                    actual.join("\n")
                ),
            );
        }
    }

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Pass,
    }
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.md"))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// Keep only the requested categories (and their subcategories).
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut selected = BTreeMap::new();
    for wanted in requested {
        let wanted = wanted.trim_matches('/');
        let before = selected.len();
        for (category, files) in all {
            if category == wanted || category.starts_with(&format!("{}/", wanted)) {
                selected.insert(category.as_str(), files);
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                wanted,
                available.join(", ")
            );
        }
    }
    selected
}

/// Run all `.test.md` files under `path` (or a single file).
/// Returns all results in run order.
pub fn collect_results(path: &Path, categories: &[String], extractor: &Extractor) -> Vec<TestResult> {
    if path.is_file() {
        return vec![run_single_test(path, extractor)];
    }

    let all = discover_categorized(path);
    select_categories(&all, categories)
        .values()
        .flat_map(|files| files.iter())
        .map(|file| {
            debug!("running {}", file.display());
            run_single_test(file, extractor)
        })
        .collect()
}

/// Run the tests and report to stderr. Returns the process exit code:
/// 0 when every test passed, 1 otherwise.
pub fn run_tests(path: &Path, color: ColorChoice, categories: &[String], extractor: &Extractor) -> i32 {
    let results = collect_results(path, categories, extractor);
    let mut stderr = StandardStream::stderr(color);

    if results.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }

    if let Err(e) = report(&mut stderr, &results) {
        eprintln!("error: cannot write test report: {}", e);
    }

    if results.iter().all(|r| r.outcome == TestOutcome::Pass) {
        0
    } else {
        1
    }
}

fn report(out: &mut StandardStream, results: &[TestResult]) -> std::io::Result<()> {
    let mut passed = 0usize;
    for result in results {
        let (label, color) = match result.outcome {
            TestOutcome::Pass => {
                passed += 1;
                ("PASS", Color::Green)
            }
            TestOutcome::Fail(_) => ("FAIL", Color::Red),
        };
        write!(out, "  ")?;
        out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(out, "{}", label)?;
        out.reset()?;
        writeln!(out, "  {}", result.label())?;
    }

    let failed = results.len() - passed;
    if failed > 0 {
        writeln!(out)?;
        writeln!(out, "failures:")?;
        for result in results {
            if let TestOutcome::Fail(reason) = &result.outcome {
                writeln!(out)?;
                writeln!(out, "  --- {} ---", result.path.display())?;
                for line in reason.lines() {
                    writeln!(out, "  {}", line)?;
                }
            }
        }
    }

    writeln!(out)?;
    write!(out, "test result: ")?;
    if failed == 0 {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(out, "ok")?;
        out.reset()?;
        writeln!(out, ". {} passed, 0 failed", passed)
    } else {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
        write!(out, "FAILED")?;
        out.reset()?;
        writeln!(
            out,
            ". {} passed, {} failed (of {})",
            passed,
            failed,
            results.len()
        )
    }
}
