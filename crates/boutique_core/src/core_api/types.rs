use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::conflict::{self, ConflictReport, IntraFileReport, SiblingFile};
use crate::entry::{Entry, EntryKind};
use crate::format::Format;
use crate::matching;
use crate::record::RecordKey;

/// A feature present in the entries that a format cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityIssue {
    KeywordRules,
    Chance,
    TraitFlags,
    ClassFilters,
    LevelFilters,
    CountOrIndex,
}

impl CapabilityIssue {
    pub fn describe(&self) -> &'static str {
        match *self {
            Self::KeywordRules => "keyword distribution rules",
            Self::Chance => "chance",
            Self::TraitFlags => "trait filters other than gender",
            Self::ClassFilters => "class filters",
            Self::LevelFilters => "level filters",
            Self::CountOrIndex => "count/index",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Capabilities {
    pub requested: Format,
    /// The format generation will use after the upgrade rule.
    pub effective: Format,
    pub issues: Vec<CapabilityIssue>,
}

impl Capabilities {
    pub fn for_entries(entries: &[Entry], requested: Format) -> Self {
        let mut issues = Vec::new();
        if requested == Format::SkyPatcher {
            let mut note = |present: bool, issue: CapabilityIssue| {
                if present && !issues.contains(&issue) {
                    issues.push(issue);
                }
            };
            for entry in entries {
                note(entry.kind == EntryKind::Keyword, CapabilityIssue::KeywordRules);
                note(entry.chance.is_some(), CapabilityIssue::Chance);
                note(entry.traits.has_flags(), CapabilityIssue::TraitFlags);
                note(!entry.class_filters.is_empty(), CapabilityIssue::ClassFilters);
                note(entry.level_filters.is_some(), CapabilityIssue::LevelFilters);
                note(entry.count_or_index.is_some(), CapabilityIssue::CountOrIndex);
            }
        }
        let effective = if issues.is_empty() {
            requested
        } else {
            Format::Spid
        };
        Self {
            requested,
            effective,
            issues,
        }
    }

    pub fn is_upgraded(&self) -> bool {
        self.requested != self.effective
    }
}

/// Owned copy of a session's entries, safe to hand to another thread for
/// matching and conflict detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub revision: u64,
    pub format: Format,
    pub entries: Vec<Entry>,
}

impl Snapshot {
    pub fn match_entry(&self, index: usize, catalog: &Catalog) -> Option<BTreeSet<RecordKey>> {
        self.entries
            .get(index)
            .map(|entry| matching::match_entry(entry, catalog))
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
}
