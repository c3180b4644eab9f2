use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::NpcIndex;
use crate::record::{RecordKey, RecordRef};
use crate::{skypatcher, spid};

/// Another rule file already present next to the one being edited. Only its
/// outfit-assigning lines are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingFile {
    pub name: String,
    pub lines: Vec<String>,
}

/// One NPC a sibling file assigns an outfit to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiblingAssignment {
    pub npc: RecordKey,
    pub outfit: String,
}

impl SiblingFile {
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            name: name.into(),
            lines,
        }
    }

    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with(';'))
            .filter(|line| assigned_npcs(line).is_some())
            .map(str::to_string)
            .collect();
        Self::new(name, lines)
    }

    /// NPCs explicitly named by an outfit-assigning line, resolved through
    /// the catalog index. Filter-based assignments are not expanded.
    pub fn assignments(&self, npcs: &NpcIndex<'_>) -> Vec<SiblingAssignment> {
        let mut seen = HashSet::new();
        let mut assignments = Vec::new();
        for line in &self.lines {
            let Some((references, outfit)) = assigned_npcs(line) else {
                continue;
            };
            for reference in &references {
                for npc in npcs.resolve_keys(reference) {
                    let assignment = SiblingAssignment {
                        npc,
                        outfit: outfit.clone(),
                    };
                    if seen.insert(assignment.clone()) {
                        assignments.push(assignment);
                    }
                }
            }
        }
        assignments
    }
}

fn assigned_npcs(line: &str) -> Option<(Vec<RecordRef>, String)> {
    spid::assigned_npcs(line).or_else(|| skypatcher::assigned_npcs(line))
}
