//! Conflict detection: NPCs targeted by more than one outfit rule, either
//! across rule files or within the file being edited.
//!
//! Detection is best-effort feedback. An empty catalog yields an empty
//! report, never an error.

pub mod naming;
mod sibling;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, NpcIndex};
use crate::entry::{Entry, EntryKind};
use crate::matching::match_entry_indexed;
use crate::record::RecordKey;

pub use sibling::{SiblingAssignment, SiblingFile};

/// NPC names listed in a summary before collapsing into "+N more".
pub const SUMMARY_NAME_LIMIT: usize = 5;

const NO_CONFLICTS: &str = "No conflicts detected.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConflict {
    pub npc: RecordKey,
    pub npc_name: String,
    pub file_name: String,
    /// Index of the current entry whose match set contains the NPC.
    pub entry_index: usize,
    /// The outfit the sibling file assigns, as written there.
    pub outfit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub has_conflicts: bool,
    pub resolved_by_filename: bool,
    pub summary_text: String,
    pub suggested_file_name: Option<String>,
    pub conflicts: Vec<FileConflict>,
}

impl Default for ConflictReport {
    fn default() -> Self {
        Self {
            has_conflicts: false,
            resolved_by_filename: false,
            summary_text: NO_CONFLICTS.to_string(),
            suggested_file_name: None,
            conflicts: Vec::new(),
        }
    }
}

impl ConflictReport {
    /// Distinct sibling files involved, in first-seen order.
    pub fn conflicting_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        for conflict in &self.conflicts {
            if !files.contains(&conflict.file_name.as_str()) {
                files.push(&conflict.file_name);
            }
        }
        files
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntraFileConflict {
    pub npc: RecordKey,
    pub npc_name: String,
    /// Indices of the current entries matching the NPC, ascending.
    pub entry_indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntraFileReport {
    pub has_conflicts: bool,
    pub summary_text: String,
    pub conflicts: Vec<IntraFileConflict>,
}

impl Default for IntraFileReport {
    fn default() -> Self {
        Self {
            has_conflicts: false,
            summary_text: NO_CONFLICTS.to_string(),
            conflicts: Vec::new(),
        }
    }
}

/// Match sets of every outfit entry that produces a line, keyed by entry
/// index.
fn outfit_matches(entries: &[Entry], npcs: &NpcIndex<'_>) -> Vec<(usize, BTreeSet<RecordKey>)> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.kind == EntryKind::Outfit && entry.has_target())
        .map(|(index, entry)| (index, match_entry_indexed(entry, npcs)))
        .filter(|(_, matched)| !matched.is_empty())
        .collect()
}

/// Compares the current entries against NPCs other rule files already
/// dress, and predicts whether `candidate_file_name` wins on load order.
pub fn detect_cross_file_conflicts(
    entries: &[Entry],
    siblings: &[SiblingFile],
    candidate_file_name: &str,
    catalog: &Catalog,
) -> ConflictReport {
    if catalog.is_empty() {
        debug!("catalog is empty, skipping cross-file conflict detection");
        return ConflictReport::default();
    }

    let npcs = NpcIndex::new(catalog);
    let matches = outfit_matches(entries, &npcs);
    let candidate_base = naming::base_name(candidate_file_name);
    let mut seen: HashSet<(RecordKey, &str, usize)> = HashSet::new();
    let mut conflicts = Vec::new();

    for sibling in siblings {
        if naming::base_name(&sibling.name).eq_ignore_ascii_case(candidate_base) {
            continue;
        }
        for assignment in sibling.assignments(&npcs) {
            for (index, matched) in &matches {
                if !matched.contains(&assignment.npc)
                    || !seen.insert((assignment.npc.clone(), sibling.name.as_str(), *index))
                {
                    continue;
                }
                conflicts.push(FileConflict {
                    npc: assignment.npc.clone(),
                    npc_name: npcs.display_name(&assignment.npc),
                    file_name: sibling.name.clone(),
                    entry_index: *index,
                    outfit: assignment.outfit.clone(),
                });
            }
        }
    }

    if conflicts.is_empty() {
        return ConflictReport::default();
    }

    let mut report = ConflictReport {
        has_conflicts: true,
        conflicts,
        ..ConflictReport::default()
    };
    let files = report.conflicting_files();
    let resolved = naming::sorts_last(candidate_file_name, &files);
    let suggested = if resolved {
        None
    } else {
        naming::suggest_file_name(candidate_file_name, &files)
    };
    let summary = cross_file_summary(&report, candidate_file_name, resolved, suggested.as_deref());

    debug!(
        conflicts = report.conflicts.len(),
        files = files.len(),
        resolved,
        "cross-file conflict detection finished"
    );

    report.resolved_by_filename = resolved;
    report.suggested_file_name = suggested;
    report.summary_text = summary;
    report
}

/// NPCs matched by two or more outfit entries of the same file.
pub fn detect_intra_file_conflicts(entries: &[Entry], catalog: &Catalog) -> IntraFileReport {
    if catalog.is_empty() {
        debug!("catalog is empty, skipping intra-file conflict detection");
        return IntraFileReport::default();
    }

    let npcs = NpcIndex::new(catalog);
    let mut by_npc: BTreeMap<RecordKey, Vec<usize>> = BTreeMap::new();
    for (index, matched) in outfit_matches(entries, &npcs) {
        for npc in matched {
            by_npc.entry(npc).or_default().push(index);
        }
    }

    let conflicts: Vec<IntraFileConflict> = by_npc
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .map(|(npc, entry_indices)| IntraFileConflict {
            npc_name: npcs.display_name(&npc),
            npc,
            entry_indices,
        })
        .collect();

    debug!(conflicts = conflicts.len(), "intra-file conflict detection finished");
    if conflicts.is_empty() {
        return IntraFileReport::default();
    }

    let names: Vec<&str> = conflicts.iter().map(|c| c.npc_name.as_str()).collect();
    IntraFileReport {
        has_conflicts: true,
        summary_text: format!(
            "{} matched by more than one outfit rule in this file: {}.",
            npc_count(conflicts.len()),
            name_list(&names)
        ),
        conflicts,
    }
}

fn cross_file_summary(
    report: &ConflictReport,
    candidate_file_name: &str,
    resolved: bool,
    suggested: Option<&str>,
) -> String {
    let mut seen_npcs = HashSet::new();
    let mut seen_outfits = HashSet::new();
    let mut npcs: Vec<&str> = Vec::new();
    let mut outfits: Vec<String> = Vec::new();
    for conflict in &report.conflicts {
        if seen_npcs.insert(conflict.npc_name.as_str()) {
            npcs.push(&conflict.npc_name);
        }
        if seen_outfits.insert((conflict.outfit.as_str(), conflict.file_name.as_str())) {
            outfits.push(format!("{} ({})", conflict.outfit, conflict.file_name));
        }
    }

    let mut summary = format!(
        "{} already assigned outfits by other files: {}. Existing outfits: {}.",
        npc_count(npcs.len()),
        name_list(&npcs),
        outfits.join(", ")
    );
    let candidate = naming::base_name(candidate_file_name);
    match (resolved, suggested) {
        (true, _) => summary.push_str(&format!(
            " {candidate} loads after them and its outfits take precedence."
        )),
        (false, Some(name)) => summary.push_str(&format!(
            " {candidate} does not load last and will be overridden; \
             rename it to {} so it loads last.",
            naming::base_name(name)
        )),
        (false, None) => summary.push_str(&format!(
            " {candidate} does not load last and will be overridden; \
             no Z prefix can make it load last."
        )),
    }
    summary
}

fn npc_count(count: usize) -> String {
    if count == 1 {
        "1 NPC is".to_string()
    } else {
        format!("{count} NPCs are")
    }
}

/// Up to [`SUMMARY_NAME_LIMIT`] names, then "+N more".
fn name_list(names: &[&str]) -> String {
    let shown = names.len().min(SUMMARY_NAME_LIMIT);
    let mut text = names[..shown].join(", ");
    if names.len() > shown {
        text.push_str(&format!(" +{} more", names.len() - shown));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::name_list;

    #[test]
    fn name_list_caps_at_five() {
        let names = ["A", "B", "C", "D", "E", "F", "G"];
        assert_eq!(name_list(&names), "A, B, C, D, E +2 more");
        assert_eq!(name_list(&names[..2]), "A, B");
    }
}
