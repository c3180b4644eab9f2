//! Outfit distribution rules for SPID and SkyPatcher.
//!
//! The crate parses both rule file formats into one [`Entry`] model,
//! regenerates exact text from it, resolves entries against a catalog
//! snapshot of game records and reports NPCs targeted by more than one rule.
//! It performs no I/O.

pub mod catalog;
pub mod conflict;
pub mod core_api;
pub mod entry;
pub mod format;
pub mod gender;
pub mod matching;
pub mod record;
pub mod skypatcher;
pub mod spid;

use std::collections::BTreeSet;

pub use catalog::{Catalog, NpcRecord, Record};
pub use conflict::{
    ConflictReport, FileConflict, IntraFileConflict, IntraFileReport, SiblingFile,
    detect_cross_file_conflicts, detect_intra_file_conflicts,
};
pub use entry::{Chance, Entry, EntryKind, Filter, FilterSet, TraitFilters};
pub use format::{
    DiagnosticKind, Format, GeneratedDocument, ParseDiagnostic, ParseOutcome, detect_format,
    generate, generate_document,
};
pub use gender::Gender;
pub use record::{RecordCategory, RecordKey, RecordRef};

/// Parses rule text, detecting its format.
pub fn parse(text: &str) -> ParseOutcome {
    format::parse(text, None)
}

/// Parses rule text as the given format.
pub fn parse_as(text: &str, format: Format) -> ParseOutcome {
    format::parse(text, Some(format))
}

pub fn match_entry(entry: &Entry, catalog: &Catalog) -> BTreeSet<RecordKey> {
    matching::match_entry(entry, catalog)
}
