//! SkyPatcher NPC rules: colon-separated `key=value` clauses ending in an
//! `outfitDefault`.
//!
//! ```text
//! filterByNpcs=Skyrim.esm|13BBF,Lydia:filterByRaces=NordRace:outfitDefault=Skyrim.esm|D3E05
//! ```

use crate::entry::{Entry, EntryKind, FilterSet};
use crate::format::LineOutcome;
use crate::gender::Gender;
use crate::record::RecordRef;

pub const FILTER_BY_NPCS: &str = "filterByNpcs";
pub const FILTER_BY_NPCS_EXCLUDED: &str = "filterByNpcsExcluded";
pub const FILTER_BY_FACTIONS: &str = "filterByFactions";
pub const FILTER_BY_FACTIONS_EXCLUDED: &str = "filterByFactionsExcluded";
pub const FILTER_BY_KEYWORDS: &str = "filterByKeywords";
pub const FILTER_BY_KEYWORDS_EXCLUDED: &str = "filterByKeywordsExcluded";
pub const FILTER_BY_RACES: &str = "filterByRaces";
pub const FILTER_BY_RACES_EXCLUDED: &str = "filterByRacesExcluded";
pub const FILTER_BY_GENDER: &str = "filterByGender";
pub const OUTFIT_DEFAULT: &str = "outfitDefault";

const CHANCE: &str = "chance";
const KEYWORDS_TO_ADD: &str = "keywordsToAdd";

#[derive(Debug, Clone, Copy)]
enum RefList {
    Npcs,
    Factions,
    Races,
}

#[derive(Debug, Clone, Copy)]
enum Clause {
    Refs(RefList, bool),
    Keywords(bool),
    Gender,
    Outfit,
}

fn clause_for_key(key: &str) -> Option<Clause> {
    const CLAUSES: [(&str, Clause); 10] = [
        (FILTER_BY_NPCS, Clause::Refs(RefList::Npcs, false)),
        (FILTER_BY_NPCS_EXCLUDED, Clause::Refs(RefList::Npcs, true)),
        (FILTER_BY_FACTIONS, Clause::Refs(RefList::Factions, false)),
        (FILTER_BY_FACTIONS_EXCLUDED, Clause::Refs(RefList::Factions, true)),
        (FILTER_BY_KEYWORDS, Clause::Keywords(false)),
        (FILTER_BY_KEYWORDS_EXCLUDED, Clause::Keywords(true)),
        (FILTER_BY_RACES, Clause::Refs(RefList::Races, false)),
        (FILTER_BY_RACES_EXCLUDED, Clause::Refs(RefList::Races, true)),
        (FILTER_BY_GENDER, Clause::Gender),
        (OUTFIT_DEFAULT, Clause::Outfit),
    ];
    CLAUSES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, clause)| *clause)
}

pub(crate) fn parse_line(line: &str) -> LineOutcome {
    let mut entry = Entry {
        kind: EntryKind::Outfit,
        ..Entry::default()
    };
    let mut unsupported: Option<String> = None;

    for clause in line.split(':').map(str::trim).filter(|c| !c.is_empty()) {
        let Some((key, value)) = clause.split_once('=') else {
            return LineOutcome::Dropped(format!("clause `{clause}` is not key=value"));
        };
        let key = key.trim();
        let value = value.trim();

        let Some(kind) = clause_for_key(key) else {
            let reason = if key.eq_ignore_ascii_case(CHANCE) {
                "SkyPatcher rules cannot carry a chance; use SPID for chance-based rules"
                    .to_string()
            } else if key.eq_ignore_ascii_case(KEYWORDS_TO_ADD) {
                "SkyPatcher keyword distribution is not managed by this editor; use SPID"
                    .to_string()
            } else {
                format!("unsupported SkyPatcher key `{key}`")
            };
            unsupported.get_or_insert(reason);
            continue;
        };

        match kind {
            Clause::Refs(list, excluded) => {
                let set = match list {
                    RefList::Npcs => &mut entry.npc_filters,
                    RefList::Factions => &mut entry.faction_filters,
                    RefList::Races => &mut entry.race_filters,
                };
                for token in split_list(value) {
                    set.insert(RecordRef::parse_skypatcher(token), excluded);
                }
            }
            Clause::Keywords(excluded) => {
                for token in split_list(value) {
                    entry.keyword_filters.insert(token.to_string(), excluded);
                }
            }
            Clause::Gender => match Gender::from_keyword(value) {
                Some(gender) => entry.traits.gender = Some(gender),
                None => {
                    unsupported.get_or_insert(format!("unsupported gender filter `{value}`"));
                }
            },
            Clause::Outfit => {
                if !value.is_empty() {
                    entry.outfit = Some(RecordRef::parse_skypatcher(value));
                }
            }
        }
    }

    if let Some(reason) = unsupported {
        return LineOutcome::Preserved(reason);
    }
    if entry.outfit.is_none() {
        return LineOutcome::Dropped(format!("missing {OUTFIT_DEFAULT}"));
    }
    LineOutcome::Entry(Box::new(entry))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Renders an outfit entry. Keyword rules have no SkyPatcher form.
pub(crate) fn render_line(entry: &Entry) -> Option<String> {
    if entry.kind != EntryKind::Outfit {
        return None;
    }
    let outfit = entry.outfit.as_ref()?;

    let mut clauses = Vec::new();
    push_refs(&mut clauses, FILTER_BY_NPCS, &entry.npc_filters);
    push_refs(&mut clauses, FILTER_BY_FACTIONS, &entry.faction_filters);
    push_keywords(&mut clauses, &entry.keyword_filters);
    push_refs(&mut clauses, FILTER_BY_RACES, &entry.race_filters);
    if let Some(gender) = entry.traits.gender {
        clauses.push(format!("{FILTER_BY_GENDER}={}", gender.keyword()));
    }
    clauses.push(format!("{OUTFIT_DEFAULT}={}", outfit.to_skypatcher()));
    Some(clauses.join(":"))
}

fn push_refs(clauses: &mut Vec<String>, key: &str, set: &FilterSet<RecordRef>) {
    let included: Vec<String> = set.included().map(RecordRef::to_skypatcher).collect();
    let excluded: Vec<String> = set.excluded().map(RecordRef::to_skypatcher).collect();
    if !included.is_empty() {
        clauses.push(format!("{key}={}", included.join(",")));
    }
    if !excluded.is_empty() {
        clauses.push(format!("{key}Excluded={}", excluded.join(",")));
    }
}

fn push_keywords(clauses: &mut Vec<String>, set: &FilterSet<String>) {
    let included: Vec<&str> = set.included().map(String::as_str).collect();
    let excluded: Vec<&str> = set.excluded().map(String::as_str).collect();
    if !included.is_empty() {
        clauses.push(format!("{FILTER_BY_KEYWORDS}={}", included.join(",")));
    }
    if !excluded.is_empty() {
        clauses.push(format!("{FILTER_BY_KEYWORDS_EXCLUDED}={}", excluded.join(",")));
    }
}

/// Collects the NPC references and outfit of an outfit-assigning line
/// without building a full entry. Used for sibling files.
pub(crate) fn assigned_npcs(line: &str) -> Option<(Vec<RecordRef>, String)> {
    let mut npcs = Vec::new();
    let mut outfit = None;
    for clause in line.split(':') {
        let Some((key, value)) = clause.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case(FILTER_BY_NPCS) {
            npcs.extend(split_list(value).map(RecordRef::parse_skypatcher));
        } else if key.eq_ignore_ascii_case(OUTFIT_DEFAULT) {
            outfit = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        }
    }
    outfit.map(|outfit| (npcs, outfit))
}
