use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::Catalog;
use crate::conflict::{self, ConflictReport, IntraFileReport, SiblingFile};
use crate::entry::Entry;
use crate::format::{self, Format, GeneratedDocument, ParseDiagnostic};
use crate::matching;
use crate::record::RecordKey;

use super::error::{CoreError, CoreErrorCode};
use super::types::{Capabilities, Snapshot};

const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

/// An open rule file: editable entries, the format they are written in and
/// the lines the parser could not decompose.
#[derive(Debug, Clone)]
pub struct Session {
    format: Format,
    entries: Vec<Entry>,
    diagnostics: Vec<ParseDiagnostic>,
    revision: u64,
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    /// Starts an empty rule file.
    pub fn new_session(&self, format: Format) -> Session {
        Session {
            format,
            entries: Vec::new(),
            diagnostics: Vec::new(),
            revision: 0,
        }
    }

    pub fn open_text(&self, text: &str, hint: Option<Format>) -> Session {
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
        let outcome = format::parse(text, hint);
        Session {
            format: outcome.format,
            entries: outcome.entries,
            diagnostics: outcome.diagnostics,
            revision: 0,
        }
    }

    pub fn open_bytes<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        hint: Option<Format>,
    ) -> Result<Session, CoreError> {
        let text = std::str::from_utf8(bytes.as_ref()).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Parse,
                format!("rule file is not valid UTF-8: {e}"),
            )
        })?;
        Ok(self.open_text(text, hint))
    }
}

impl Session {
    pub fn format(&self) -> Format {
        self.format
    }

    /// Changes the requested output format. Entries are untouched; the
    /// upgrade rule still applies on generation.
    pub fn set_format(&mut self, format: Format) {
        if self.format != format {
            self.format = format;
            self.bump();
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    /// Bumped by every edit. Detection results computed from an older
    /// revision are stale.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add_entry(&mut self, entry: Entry) -> usize {
        self.entries.push(entry);
        self.bump();
        self.entries.len() - 1
    }

    pub fn update_entry(&mut self, index: usize, entry: Entry) -> Result<(), CoreError> {
        let slot = self
            .entries
            .get_mut(index)
            .ok_or_else(|| missing_entry(index))?;
        *slot = entry;
        self.bump();
        Ok(())
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<Entry, CoreError> {
        if index >= self.entries.len() {
            return Err(missing_entry(index));
        }
        let removed = self.entries.remove(index);
        self.bump();
        Ok(removed)
    }

    pub fn effective_format(&self) -> Format {
        format::effective_format(&self.entries, self.format)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_entries(&self.entries, self.format)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            revision: self.revision,
            format: self.format,
            entries: self.entries.clone(),
        }
    }

    pub fn render(&self) -> GeneratedDocument {
        format::generate_document(&self.entries, self.format, &self.diagnostics)
    }

    /// The exact text to write back to disk.
    pub fn to_text(&self) -> String {
        self.render().text
    }

    pub fn match_entry(
        &self,
        index: usize,
        catalog: &Catalog,
    ) -> Result<BTreeSet<RecordKey>, CoreError> {
        let entry = self.entry(index).ok_or_else(|| missing_entry(index))?;
        Ok(matching::match_entry(entry, catalog))
    }

    pub fn detect_cross_file_conflicts(
        &self,
        siblings: &[SiblingFile],
        candidate_file_name: &str,
        catalog: &Catalog,
    ) -> ConflictReport {
        conflict::detect_cross_file_conflicts(&self.entries, siblings, candidate_file_name, catalog)
    }

    pub fn detect_intra_file_conflicts(&self, catalog: &Catalog) -> IntraFileReport {
        conflict::detect_intra_file_conflicts(&self.entries, catalog)
    }

    fn bump(&mut self) {
        self.revision += 1;
        debug!(revision = self.revision, entries = self.entries.len(), "session edited");
    }
}

fn missing_entry(index: usize) -> CoreError {
    CoreError::new(
        CoreErrorCode::UnsupportedOperation,
        format!("entry index {index} is out of range"),
    )
}
