//! Format detection plus the two entry points of the format engine:
//! [`parse`] and [`generate`].
//!
//! Both are total over their input. Every non-blank line of a rule file ends
//! up as an [`Entry`], a preserved pass-through or a dropped-line diagnostic,
//! and generation never fails.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entry::Entry;
use crate::{skypatcher, spid};

const HEADER_TITLE: &str = "; Generated by Boutique - outfit distribution rules";
const SPID_HEADER: [&str; 2] = [HEADER_TITLE, "; Format: SPID (Spell Perk Item Distributor)"];
const SKYPATCHER_HEADER: [&str; 2] = [HEADER_TITLE, "; Format: SkyPatcher"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// Pipe-delimited `_DISTR.ini` rules.
    Spid,
    /// Colon-delimited `key=value` rules.
    SkyPatcher,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Spid => "SPID",
            Self::SkyPatcher => "SkyPatcher",
        }
    }

    pub fn header_lines(&self) -> &'static [&'static str] {
        match *self {
            Self::Spid => &SPID_HEADER,
            Self::SkyPatcher => &SKYPATCHER_HEADER,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A user comment carried through unchanged. Not an error.
    Comment,
    /// Valid content the entry model does not decompose.
    Unsupported,
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    /// 1-based line number in the parsed text.
    pub line_number: usize,
    pub line: String,
    pub reason: String,
    /// Preserved lines are re-emitted verbatim by the generator.
    pub preserved: bool,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub entries: Vec<Entry>,
    pub format: Format,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParseOutcome {
    pub fn preserved_lines(&self) -> impl Iterator<Item = &ParseDiagnostic> {
        self.diagnostics.iter().filter(|d| d.preserved)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ParseDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.kind != DiagnosticKind::Comment)
    }
}

/// What a single format-specific line parser made of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineOutcome {
    Entry(Box<Entry>),
    Preserved(String),
    Dropped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub text: String,
    pub format: Format,
    /// Set when the requested format could not express the entries and
    /// SPID was used instead.
    pub upgraded: bool,
}

/// Detects the format from the first rule-bearing line. Empty and
/// comment-only files are SkyPatcher.
pub fn detect_format(text: &str) -> Format {
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        if let Some((head, _)) = trimmed.split_once('=')
            && spid::is_record_type(head.trim())
        {
            return Format::Spid;
        }
        return Format::SkyPatcher;
    }
    Format::SkyPatcher
}

/// Parses rule text. With `hint = None` the format is auto-detected.
pub fn parse(text: &str, hint: Option<Format>) -> ParseOutcome {
    let format = hint.unwrap_or_else(|| detect_format(text));
    let mut entries = Vec::new();
    let mut diagnostics = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_generated_header(trimmed) {
            continue;
        }

        let diagnostic = |reason: String, preserved: bool, kind: DiagnosticKind| ParseDiagnostic {
            line_number: index + 1,
            line: line.to_string(),
            reason,
            preserved,
            kind,
        };

        if is_comment(trimmed) {
            diagnostics.push(diagnostic(
                "comment".to_string(),
                true,
                DiagnosticKind::Comment,
            ));
            continue;
        }

        let outcome = match format {
            Format::Spid => spid::parse_line(trimmed),
            Format::SkyPatcher => skypatcher::parse_line(trimmed),
        };
        match outcome {
            LineOutcome::Entry(entry) => entries.push(*entry),
            LineOutcome::Preserved(reason) => {
                debug!(line = index + 1, %reason, "preserving line verbatim");
                diagnostics.push(diagnostic(reason, true, DiagnosticKind::Unsupported));
            }
            LineOutcome::Dropped(reason) => {
                warn!(line = index + 1, %reason, "dropping unparsable line");
                diagnostics.push(diagnostic(reason, false, DiagnosticKind::Malformed));
            }
        }
    }

    debug!(
        %format,
        entries = entries.len(),
        diagnostics = diagnostics.len(),
        "parsed rule file"
    );

    ParseOutcome {
        entries,
        format,
        diagnostics,
    }
}

/// The format generation will actually use. SkyPatcher is upgraded to SPID
/// as soon as one entry needs a SPID-only feature.
pub fn effective_format(entries: &[Entry], requested: Format) -> Format {
    match requested {
        Format::SkyPatcher if entries.iter().any(Entry::requires_spid) => Format::Spid,
        other => other,
    }
}

/// Renders one entry in the given format, or `None` when the entry has no
/// target (or the format cannot express it).
pub fn render_entry(entry: &Entry, format: Format) -> Option<String> {
    match format {
        Format::Spid => spid::render_line(entry),
        Format::SkyPatcher => skypatcher::render_line(entry),
    }
}

pub fn generate_document(
    entries: &[Entry],
    requested: Format,
    diagnostics: &[ParseDiagnostic],
) -> GeneratedDocument {
    let format = effective_format(entries, requested);
    let upgraded = format != requested;
    if upgraded {
        debug!(%requested, %format, "entries need SPID-only features, upgrading output format");
    }

    let mut lines: Vec<String> = format
        .header_lines()
        .iter()
        .map(|line| (*line).to_string())
        .collect();
    lines.extend(entries.iter().filter_map(|entry| render_entry(entry, format)));
    lines.extend(
        diagnostics
            .iter()
            .filter(|d| d.preserved)
            .map(|d| d.line.clone()),
    );

    GeneratedDocument {
        text: lines.join("\n"),
        format,
        upgraded,
    }
}

/// Generates rule text. Preserved diagnostic lines follow the entries as a
/// trailing block in their original relative order.
pub fn generate(entries: &[Entry], requested: Format, diagnostics: &[ParseDiagnostic]) -> String {
    generate_document(entries, requested, diagnostics).text
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with(';')
}

fn is_generated_header(trimmed: &str) -> bool {
    SPID_HEADER.contains(&trimmed) || SKYPATCHER_HEADER.contains(&trimmed)
}

#[cfg(test)]
mod tests {
    use super::{Format, detect_format};

    #[test]
    fn detects_spid_from_first_rule_line() {
        let text = "; comment\n\nOutfit = 0x800~Skyrim.esm|NONE|ThievesGuild\n";
        assert_eq!(detect_format(text), Format::Spid);
    }

    #[test]
    fn detects_skypatcher_from_first_rule_line() {
        let text = "filterByNpcs=Skyrim.esm|13BBF:outfitDefault=Skyrim.esm|D3E05\nOutfit = 0x1";
        assert_eq!(detect_format(text), Format::SkyPatcher);
    }

    #[test]
    fn empty_and_comment_only_files_default_to_skypatcher() {
        assert_eq!(detect_format(""), Format::SkyPatcher);
        assert_eq!(detect_format("; only a comment\n;another"), Format::SkyPatcher);
    }
}
