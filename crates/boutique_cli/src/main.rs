use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use boutique_core::core_api::{CoreError, CoreErrorCode, Engine, Session};
use boutique_core::{Catalog, Format, SiblingFile};
use boutique_render::{
    EntrySelection, JsonStyle, TextRenderOptions, render_conflicts_text, render_json_conflicts,
    render_json_matches, render_json_session, render_matches_text, render_session_text,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Spid,
    Skypatcher,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log parser and detector activity to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the detected format, entries and diagnostics of a rule file.
    Inspect {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long)]
        format: Option<FormatArg>,
        #[arg(long)]
        json: bool,
    },
    /// Regenerate a rule file in another format.
    Convert {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long)]
        to: FormatArg,
        /// Read the input as this format instead of detecting it.
        #[arg(long)]
        format: Option<FormatArg>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the NPCs each entry applies to.
    Match {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long, env = "BOUTIQUE_CATALOG", value_name = "JSON")]
        catalog: PathBuf,
        #[arg(long)]
        entry: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Report NPCs assigned more than one outfit.
    Conflicts {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long, env = "BOUTIQUE_CATALOG", value_name = "JSON")]
        catalog: PathBuf,
        #[arg(long = "sibling", value_name = "FILE")]
        siblings: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Inspect { path, format, json } => {
            let session = open_session(&path, format.map(to_core_format));
            if json {
                print_json(&render_json_session(&session, JsonStyle::CanonicalV1));
            } else {
                let options = TextRenderOptions {
                    verbose: cli.verbose,
                };
                print!("{}", render_session_text(&session, options));
            }
        }
        Command::Convert {
            path,
            to,
            format,
            output,
        } => {
            let mut session = open_session(&path, format.map(to_core_format));
            session.set_format(to_core_format(to));
            let document = session.render();
            if document.upgraded {
                let reasons: Vec<&str> = session
                    .capabilities()
                    .issues
                    .iter()
                    .map(|issue| issue.describe())
                    .collect();
                eprintln!(
                    "Note: {} cannot express {}; wrote {} instead",
                    session.format(),
                    reasons.join(", "),
                    document.format
                );
            }
            match output {
                Some(out_path) => {
                    fs::write(&out_path, &document.text).unwrap_or_else(|e| {
                        eprintln!("Error writing {}: {e}", out_path.display());
                        process::exit(1);
                    });
                    println!("Wrote {} rules to {}", document.format, out_path.display());
                }
                None => println!("{}", document.text),
            }
        }
        Command::Match {
            path,
            catalog,
            entry,
            json,
        } => {
            let session = open_session(&path, None);
            let catalog = load_catalog(&catalog);
            let selection = match entry {
                Some(index) if index >= session.entries().len() => {
                    eprintln!(
                        "--entry {index} is out of range; the file has {} entries",
                        session.entries().len()
                    );
                    process::exit(2);
                }
                Some(index) => EntrySelection::Single(index),
                None => EntrySelection::All,
            };
            if json {
                print_json(&render_json_matches(
                    &session,
                    &catalog,
                    selection,
                    JsonStyle::CanonicalV1,
                ));
            } else {
                print!("{}", render_matches_text(&session, &catalog, selection));
            }
        }
        Command::Conflicts {
            path,
            catalog,
            siblings,
            json,
        } => {
            let session = open_session(&path, None);
            let catalog = load_catalog(&catalog);
            let intra = session.detect_intra_file_conflicts(&catalog);
            let cross = if siblings.is_empty() {
                None
            } else {
                let siblings: Vec<SiblingFile> = siblings
                    .iter()
                    .map(|sibling| SiblingFile::from_text(file_name(sibling), &read_text(sibling)))
                    .collect();
                debug!(count = siblings.len(), "loaded sibling files");
                Some(session.detect_cross_file_conflicts(&siblings, &file_name(&path), &catalog))
            };

            if json {
                print_json(&render_json_conflicts(
                    &intra,
                    cross.as_ref(),
                    JsonStyle::CanonicalV1,
                ));
            } else {
                print!("{}", render_conflicts_text(&intra, cross.as_ref()));
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn open_session(path: &Path, hint: Option<Format>) -> Session {
    let bytes = read_file(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path.display(), e.message);
        process::exit(1);
    });
    Engine::new().open_bytes(bytes, hint).unwrap_or_else(|e| {
        eprintln!("Error parsing rule file: {}", path.display());
        eprintln!("  {}", e);
        process::exit(1);
    })
}

fn load_catalog(path: &Path) -> Catalog {
    let text = read_text(path);
    Catalog::from_json_str(&text).unwrap_or_else(|e| {
        eprintln!("Error loading catalog {}: {}", path.display(), e.message);
        process::exit(1);
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>, CoreError> {
    fs::read(path).map_err(|e| CoreError::new(CoreErrorCode::Io, e.to_string()))
}

fn read_text(path: &Path) -> String {
    let bytes = read_file(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path.display(), e.message);
        process::exit(1);
    });
    String::from_utf8_lossy(&bytes).into_owned()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json(json: &JsonValue) {
    let rendered = serde_json::to_string_pretty(json).unwrap_or_else(|e| {
        eprintln!("Error rendering JSON output: {e}");
        process::exit(1);
    });
    println!("{rendered}");
}

fn to_core_format(format: FormatArg) -> Format {
    match format {
        FormatArg::Spid => Format::Spid,
        FormatArg::Skypatcher => Format::SkyPatcher,
    }
}
