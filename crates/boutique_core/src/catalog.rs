//! Read-only snapshot of the game records rules are matched against.
//!
//! The snapshot is produced by an external provider that already resolved
//! the load order; the core never mutates it. It deserializes from JSON so
//! shells can load an exported snapshot.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::gender::Gender;
use crate::record::{RecordCategory, RecordKey, RecordRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    #[serde(default)]
    pub editor_id: String,
    #[serde(default)]
    pub name: String,
}

impl Record {
    pub fn new(key: RecordKey, editor_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key,
            editor_id: editor_id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcRecord {
    pub key: RecordKey,
    #[serde(default)]
    pub editor_id: String,
    #[serde(default)]
    pub name: String,
    pub gender: Gender,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub child: bool,
    #[serde(default)]
    pub summonable: bool,
    #[serde(default)]
    pub leveled: bool,
    #[serde(default)]
    pub teammate: bool,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub factions: Vec<RecordKey>,
    #[serde(default)]
    pub race: Option<RecordKey>,
    #[serde(default)]
    pub class: Option<RecordKey>,
    /// Keyword editor IDs carried by the NPC or its race.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl NpcRecord {
    pub fn new(key: RecordKey, editor_id: impl Into<String>, gender: Gender) -> Self {
        Self {
            key,
            editor_id: editor_id.into(),
            name: String::new(),
            gender,
            unique: false,
            child: false,
            summonable: false,
            leveled: false,
            teammate: false,
            dead: false,
            factions: Vec::new(),
            race: None,
            class: None,
            keywords: Vec::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.editor_id.is_empty() {
            &self.editor_id
        } else {
            ""
        }
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword))
    }
}

/// Borrowed identity of any catalog record, NPCs included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordView<'a> {
    pub category: RecordCategory,
    pub key: &'a RecordKey,
    pub editor_id: &'a str,
    pub name: &'a str,
}

impl RecordView<'_> {
    pub fn matches(&self, reference: &RecordRef) -> bool {
        match reference {
            RecordRef::Key(key) => self.key == key,
            RecordRef::FormId(id) => self.key.local_id == *id,
            RecordRef::EditorId(text) => {
                (!self.editor_id.is_empty() && self.editor_id.eq_ignore_ascii_case(text))
                    || (!self.name.is_empty() && self.name.eq_ignore_ascii_case(text))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub npcs: Vec<NpcRecord>,
    #[serde(default)]
    pub factions: Vec<Record>,
    #[serde(default)]
    pub keywords: Vec<Record>,
    #[serde(default)]
    pub races: Vec<Record>,
    #[serde(default)]
    pub classes: Vec<Record>,
    #[serde(default)]
    pub outfits: Vec<Record>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Parse,
                format!("failed to parse catalog snapshot: {e}"),
            )
        })
    }

    /// A catalog without NPCs cannot match anything.
    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }

    pub fn npc(&self, key: &RecordKey) -> Option<&NpcRecord> {
        self.npcs.iter().find(|npc| &npc.key == key)
    }

    pub fn views(
        &self,
        category: RecordCategory,
    ) -> Box<dyn Iterator<Item = RecordView<'_>> + '_> {
        let records = match category {
            RecordCategory::Npc => {
                return Box::new(self.npcs.iter().map(move |npc| RecordView {
                    category,
                    key: &npc.key,
                    editor_id: &npc.editor_id,
                    name: &npc.name,
                }));
            }
            RecordCategory::Faction => &self.factions,
            RecordCategory::Keyword => &self.keywords,
            RecordCategory::Race => &self.races,
            RecordCategory::Class => &self.classes,
            RecordCategory::Outfit => &self.outfits,
        };
        Box::new(records.iter().map(move |record| RecordView {
            category,
            key: &record.key,
            editor_id: &record.editor_id,
            name: &record.name,
        }))
    }

    /// First record of `category` named by `reference`.
    pub fn resolve(
        &self,
        category: RecordCategory,
        reference: &RecordRef,
    ) -> Option<RecordView<'_>> {
        self.views(category).find(|view| view.matches(reference))
    }

    /// Every key `reference` may denote. A full record key always denotes
    /// itself, even when the snapshot does not contain it.
    pub fn resolve_keys(
        &self,
        category: RecordCategory,
        reference: &RecordRef,
    ) -> HashSet<RecordKey> {
        let mut keys: HashSet<RecordKey> = self
            .views(category)
            .filter(|view| view.matches(reference))
            .map(|view| view.key.clone())
            .collect();
        if let RecordRef::Key(key) = reference {
            keys.insert(key.clone());
        }
        keys
    }

    /// Human-readable label for a record reference, falling back to the
    /// reference text.
    pub fn display_name(&self, category: RecordCategory, reference: &RecordRef) -> String {
        self.resolve(category, reference)
            .map(|view| {
                if !view.name.is_empty() {
                    view.name.to_string()
                } else if !view.editor_id.is_empty() {
                    view.editor_id.to_string()
                } else {
                    view.key.to_string()
                }
            })
            .unwrap_or_else(|| reference.to_string())
    }
}

/// Hash lookups over the NPCs of one catalog, built once per detection run so
/// resolving thousands of references stays linear in the catalog size.
#[derive(Debug)]
pub struct NpcIndex<'a> {
    catalog: &'a Catalog,
    by_key: HashMap<&'a RecordKey, usize>,
    by_form_id: HashMap<u32, Vec<usize>>,
    /// Lowercased editor IDs and in-game names.
    by_name: HashMap<String, Vec<usize>>,
}

impl<'a> NpcIndex<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        let mut index = Self {
            catalog,
            by_key: HashMap::with_capacity(catalog.npcs.len()),
            by_form_id: HashMap::new(),
            by_name: HashMap::new(),
        };
        for (position, npc) in catalog.npcs.iter().enumerate() {
            index.by_key.entry(&npc.key).or_insert(position);
            index
                .by_form_id
                .entry(npc.key.local_id)
                .or_default()
                .push(position);
            for text in [&npc.editor_id, &npc.name] {
                if text.is_empty() {
                    continue;
                }
                let slot = index.by_name.entry(text.to_ascii_lowercase()).or_default();
                if slot.last() != Some(&position) {
                    slot.push(position);
                }
            }
        }
        index
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn npc(&self, key: &RecordKey) -> Option<&'a NpcRecord> {
        self.by_key.get(key).map(|&position| &self.catalog.npcs[position])
    }

    /// Same answer as [`Catalog::resolve_keys`] for the NPC category, in
    /// catalog order.
    pub fn resolve_keys(&self, reference: &RecordRef) -> Vec<RecordKey> {
        let positions = match reference {
            RecordRef::Key(key) => return vec![key.clone()],
            RecordRef::FormId(id) => self.by_form_id.get(id),
            RecordRef::EditorId(text) => self.by_name.get(&text.to_ascii_lowercase()),
        };
        positions
            .into_iter()
            .flatten()
            .map(|&position| self.catalog.npcs[position].key.clone())
            .collect()
    }

    /// Whether `reference` names at least one NPC of the catalog.
    pub fn resolves(&self, reference: &RecordRef) -> bool {
        match reference {
            RecordRef::Key(key) => self.by_key.contains_key(key),
            RecordRef::FormId(id) => self.by_form_id.contains_key(id),
            RecordRef::EditorId(text) => self.by_name.contains_key(&text.to_ascii_lowercase()),
        }
    }

    /// Same label as [`Catalog::display_name`] for an NPC key.
    pub fn display_name(&self, key: &RecordKey) -> String {
        match self.npc(key) {
            Some(npc) if !npc.display_name().is_empty() => npc.display_name().to_string(),
            Some(npc) => npc.key.to_string(),
            None => RecordRef::Key(key.clone()).to_string(),
        }
    }
}
