mod config;
mod test_runner;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use env_logger::Env;
use log::{debug, info};

use outline::source::{ReadWarning, read_blocks};
use outline::{ExtractError, Extractor, Outline};

use crate::config::Config;

const SUBCOMMANDS: &[&str] = &["convert", "test", "help"];

#[derive(Parser)]
#[command(
    name = "featurefile",
    version,
    about = "Turn a structured Markdown page into a Gherkin feature file"
)]
struct Cli {
    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    /// Config file (defaults to ./featurefile.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log extraction decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a Markdown page to a feature file
    Convert(ConvertArgs),

    /// Run .test.md fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Markdown page to convert ("-" reads stdin)
    file: String,

    /// Write the feature file here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only check that the page converts (exit 0 if it does)
    #[arg(long)]
    check: bool,

    /// Dump the extracted outline
    #[arg(long)]
    outline: bool,

    /// Leave table columns unpadded
    #[arg(long)]
    no_align: bool,

    /// Suppress reader warnings
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `featurefile page.md` works like `featurefile convert page.md`
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = first_positional(&args) {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "convert".to_string());
        }
    }

    let cli = Cli::parse_from(&args);

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(2);
        }
    };
    debug!("config: {:?}", config);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Convert(convert_args) => {
            let exit_code = do_convert(convert_args, &config, color_choice);
            process::exit(exit_code);
        }
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let extractor = Extractor::new(config.extract_options());
            let exit_code =
                test_runner::run_tests(path, color_choice, &test_args.category, &extractor);
            process::exit(exit_code);
        }
    }
}

/// Index of the first positional argument, skipping the value of `--config`.
fn first_positional(args: &[String]) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "--config" {
            i += 2;
            continue;
        }
        if arg == "-" || !arg.starts_with('-') {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn read_source(file: &str) -> std::io::Result<String> {
    if file == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        std::fs::read_to_string(file)
    }
}

fn do_convert(args: ConvertArgs, config: &Config, color_choice: ColorChoice) -> i32 {
    let source = match read_source(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            return 2;
        }
    };

    let name = if args.file == "-" {
        "<stdin>".to_string()
    } else {
        args.file.clone()
    };
    let mut files = SimpleFiles::new();
    let file_id = files.add(name, source.clone());

    let page = read_blocks(&source, file_id);

    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();

    if !args.quiet {
        emit_warnings(&writer, &term_config, &files, &page.warnings);
    }

    let extractor = Extractor::new(config.extract_options());
    let extracted = extractor.run(&page.blocks);
    if let Err(error) = &extracted {
        let diagnostic = extract_diagnostic(error, file_id, source.len());
        let _ = term::emit_to_write_style(&mut writer.lock(), &term_config, &files, &diagnostic);
    }
    let outline = extracted.ok();

    if args.outline {
        return dump_outline(outline.as_ref(), &mut std::io::stdout());
    }

    let converted = featurefile::convert_to_gherkin(outline.as_ref());

    if args.check {
        return match converted {
            Ok(_) => {
                eprintln!("ok: {} converts to a feature file", args.file);
                0
            }
            Err(error) => {
                eprintln!("{}", error.to_string().trim_end());
                1
            }
        };
    }

    let align = config.output.align_tables && !args.no_align;
    let (text, exit_code) = match converted {
        Ok(text) if align => (featurefile::align_tables(&text), 0),
        Ok(text) => (text, 0),
        Err(error) => (error.to_string(), 1),
    };

    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, format!("{}\n", text)) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                return 2;
            }
            info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout();
            let _ = writeln!(stdout, "{}", text);
        }
    }

    exit_code
}

/// Print the extracted outline. Exits 1 when there is none, like a
/// conversion that ends in an error body.
fn dump_outline(outline: Option<&Outline>, out: &mut impl Write) -> i32 {
    let _ = writeln!(out, "{:#?}", outline);
    if outline.is_some() { 0 } else { 1 }
}

/// Extraction errors have no single offending block, so the label covers the
/// start of the page.
fn extract_diagnostic(error: &ExtractError, file_id: usize, source_len: usize) -> Diagnostic<usize> {
    let note = match error {
        ExtractError::NoBlocks => "the page is empty or contains only skipped blocks",
        ExtractError::MissingTitle => "add a `# Title` heading above the feature section",
    };
    Diagnostic::error()
        .with_message(error.to_string())
        .with_labels(vec![Label::primary(file_id, 0..source_len.min(1))])
        .with_notes(vec![note.to_string()])
}

fn emit_warnings(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    warnings: &[ReadWarning],
) {
    for warning in warnings {
        let diagnostic = warning.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn first_positional_skips_flags_and_config_value() {
        assert_eq!(first_positional(&argv(&["featurefile", "page.md"])), Some(1));
        assert_eq!(
            first_positional(&argv(&["featurefile", "--no-color", "--config", "x.toml", "test", "dir"])),
            Some(4)
        );
        assert_eq!(first_positional(&argv(&["featurefile", "-v", "-"])), Some(2));
        assert_eq!(first_positional(&argv(&["featurefile", "--help"])), None);
    }

    #[test]
    fn bare_file_parses_as_convert() {
        let mut args = argv(&["featurefile", "-v", "page.md", "--no-align"]);
        let pos = first_positional(&args).unwrap();
        args.insert(pos, "convert".to_string());

        let cli = Cli::try_parse_from(&args).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Convert(convert) => {
                assert_eq!(convert.file, "page.md");
                assert!(convert.no_align);
                assert!(!convert.check);
            }
            Command::Test(_) => panic!("expected convert"),
        }
    }

    #[test]
    fn outline_dump_fails_without_an_outline() {
        let mut out = Vec::new();
        assert_eq!(dump_outline(None, &mut out), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "None\n");

        let outline = Outline {
            title: "Login".into(),
            background: vec!["Given app is open".into()],
            ..Outline::default()
        };
        let mut out = Vec::new();
        assert_eq!(dump_outline(Some(&outline), &mut out), 0);
        assert!(String::from_utf8(out).unwrap().starts_with("Some(\n    Outline {"));
    }

    #[test]
    fn extraction_errors_get_a_note() {
        let diagnostic = extract_diagnostic(&ExtractError::MissingTitle, 0, 40);
        assert_eq!(
            diagnostic.message,
            "no level-1 heading found to use as the feature title"
        );
        assert_eq!(diagnostic.labels[0].range, 0..1);
        assert_eq!(diagnostic.notes.len(), 1);
    }

    #[test]
    fn empty_page_label_is_empty() {
        let diagnostic = extract_diagnostic(&ExtractError::NoBlocks, 0, 0);
        assert_eq!(diagnostic.labels[0].range, 0..0);
    }
}
