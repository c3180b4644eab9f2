//! SPID `_DISTR.ini` rules:
//!
//! ```text
//! Outfit = FormOrName|StringFilters|FormFilters|LevelFilters|TraitFilters|CountOrIndex|Chance
//! ```
//!
//! Fields are positional and optional from the right; `NONE` and an empty
//! field mean the same thing. `StringFilters` holds NPC names (comma-joined)
//! followed by a plus-joined keyword group. `FormFilters` holds up to three
//! comma-separated positional groups (factions, races, classes), each
//! plus-joined. Any token may carry a `-` exclusion prefix.

pub mod traits;

use crate::entry::{Chance, Entry, EntryKind, FilterSet};
use crate::format::LineOutcome;
use crate::record::RecordRef;

pub use traits::{parse_traits, render_traits};

const FIELD_COUNT: usize = 7;
const NONE_FIELD: &str = "NONE";

const STRING_FILTERS: usize = 1;
const FORM_FILTERS: usize = 2;
const LEVEL_FILTERS: usize = 3;
const TRAIT_FILTERS: usize = 4;
const COUNT_OR_INDEX: usize = 5;
const CHANCE: usize = 6;

/// Record types SPID distributes that this editor leaves untouched.
const OTHER_RECORD_TYPES: [&str; 10] = [
    "Spell",
    "Perk",
    "Item",
    "Shout",
    "LevSpell",
    "Package",
    "Faction",
    "SleepOutfit",
    "Skin",
    "DeathItem",
];

pub fn is_record_type(name: &str) -> bool {
    record_kind(name).is_some()
        || OTHER_RECORD_TYPES
            .iter()
            .any(|known| known.eq_ignore_ascii_case(name))
}

fn record_kind(name: &str) -> Option<EntryKind> {
    if name.eq_ignore_ascii_case("Outfit") {
        Some(EntryKind::Outfit)
    } else if name.eq_ignore_ascii_case("Keyword") {
        Some(EntryKind::Keyword)
    } else {
        None
    }
}

pub(crate) fn parse_line(line: &str) -> LineOutcome {
    let Some((head, rest)) = line.split_once('=') else {
        return LineOutcome::Dropped("expected `Type = Target|Filters...`".to_string());
    };
    let record_type = head.trim();
    let Some(kind) = record_kind(record_type) else {
        let reason = if is_record_type(record_type) {
            format!("{record_type} distribution is not managed by this editor")
        } else {
            format!("unknown distribution type `{record_type}`")
        };
        return LineOutcome::Preserved(reason);
    };

    let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
    if fields.len() > FIELD_COUNT {
        return LineOutcome::Preserved(format!(
            "expected at most {FIELD_COUNT} fields, found {}",
            fields.len()
        ));
    }
    let field = |index: usize| {
        fields
            .get(index)
            .copied()
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case(NONE_FIELD))
    };

    let Some(target) = field(0) else {
        return LineOutcome::Dropped("missing distribution target".to_string());
    };
    let mut entry = match kind {
        EntryKind::Outfit => Entry::outfit(RecordRef::parse_spid(target)),
        EntryKind::Keyword => Entry::keyword(target),
    };

    if let Some(strings) = field(STRING_FILTERS) {
        if strings.contains('*') {
            return LineOutcome::Preserved(
                "wildcard string filters are not supported by the editor".to_string(),
            );
        }
        parse_string_filters(strings, &mut entry);
    }

    if let Some(forms) = field(FORM_FILTERS)
        && let Err(reason) = parse_form_filters(forms, &mut entry)
    {
        return LineOutcome::Preserved(reason);
    }

    entry.level_filters = field(LEVEL_FILTERS).map(str::to_string);

    if let Some(codes) = field(TRAIT_FILTERS) {
        match parse_traits(codes) {
            Ok(traits) => entry.traits = traits,
            Err(code) => {
                return LineOutcome::Preserved(format!("unrecognized trait code `{code}`"));
            }
        }
    }

    entry.count_or_index = field(COUNT_OR_INDEX).map(str::to_string);

    if let Some(chance) = field(CHANCE) {
        match chance.parse::<u8>().ok().and_then(|p| Chance::new(p).ok()) {
            Some(chance) => entry.chance = Some(chance),
            None => {
                return LineOutcome::Preserved(format!(
                    "chance `{chance}` is not a whole percentage between 1 and 100"
                ));
            }
        }
    }

    LineOutcome::Entry(Box::new(entry))
}

fn parse_string_filters(field: &str, entry: &mut Entry) {
    for token in field.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if token.contains('+') {
            for part in token.split('+') {
                if let Some((excluded, name)) = split_exclusion(part) {
                    entry.keyword_filters.insert(name.to_string(), excluded);
                }
            }
        } else if let Some((excluded, name)) = split_exclusion(token) {
            entry
                .npc_filters
                .insert(RecordRef::parse_spid(name), excluded);
        }
    }
}

fn parse_form_filters(field: &str, entry: &mut Entry) -> Result<(), String> {
    let groups: Vec<&str> = field.split(',').collect();
    if groups.len() > 3 {
        return Err(format!(
            "expected at most 3 form filter groups (factions, races, classes), found {}",
            groups.len()
        ));
    }
    for (index, group) in groups.iter().enumerate() {
        let set = match index {
            0 => &mut entry.faction_filters,
            1 => &mut entry.race_filters,
            _ => &mut entry.class_filters,
        };
        for part in group.split('+') {
            if let Some((excluded, name)) = split_exclusion(part) {
                set.insert(RecordRef::parse_spid(name), excluded);
            }
        }
    }
    Ok(())
}

fn split_exclusion(token: &str) -> Option<(bool, &str)> {
    let token = token.trim();
    let (excluded, name) = match token.strip_prefix('-') {
        Some(rest) => (true, rest.trim()),
        None => (false, token),
    };
    (!name.is_empty()).then_some((excluded, name))
}

/// Collects the explicitly named NPCs and the outfit of an `Outfit` line.
/// Keyword groups and excluded names assign nothing. Used for sibling files.
pub(crate) fn assigned_npcs(line: &str) -> Option<(Vec<RecordRef>, String)> {
    let (head, rest) = line.split_once('=')?;
    if record_kind(head.trim()) != Some(EntryKind::Outfit) {
        return None;
    }
    let mut fields = rest.split('|').map(str::trim);
    let outfit = fields
        .next()
        .filter(|target| !target.is_empty() && !target.eq_ignore_ascii_case(NONE_FIELD))?;
    let npcs = fields
        .next()
        .filter(|strings| !strings.eq_ignore_ascii_case(NONE_FIELD))
        .map(|strings| {
            strings
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty() && !t.contains('+') && !t.starts_with('-'))
                .map(RecordRef::parse_spid)
                .collect()
        })
        .unwrap_or_default();
    Some((npcs, outfit.to_string()))
}

pub(crate) fn render_line(entry: &Entry) -> Option<String> {
    let target = match entry.kind {
        EntryKind::Outfit => entry.outfit.as_ref()?.to_spid(),
        EntryKind::Keyword => entry
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())?
            .to_string(),
    };

    let fields = [
        render_string_filters(entry),
        render_form_filters(entry),
        entry.level_filters.clone().unwrap_or_default(),
        render_traits(&entry.traits),
        entry.count_or_index.clone().unwrap_or_default(),
        entry
            .chance
            .map(|chance| chance.percent().to_string())
            .unwrap_or_default(),
    ];

    let mut line = format!("{} = {target}", entry.kind.as_str());
    if let Some(last) = fields.iter().rposition(|field| !field.is_empty()) {
        for (index, field) in fields[..=last].iter().enumerate() {
            line.push('|');
            // Filter gaps are spelled out; the remaining gaps stay empty.
            if field.is_empty() && index + 1 < LEVEL_FILTERS {
                line.push_str(NONE_FIELD);
            } else {
                line.push_str(field);
            }
        }
    }
    Some(line)
}

fn render_string_filters(entry: &Entry) -> String {
    let mut tokens: Vec<String> = entry
        .npc_filters
        .iter()
        .map(|f| with_exclusion(f.excluded, &f.value.to_spid()))
        .collect();
    let mut keywords: Vec<String> = entry
        .keyword_filters
        .iter()
        .map(|f| with_exclusion(f.excluded, &f.value))
        .collect();
    // A token without '+' reads back as an NPC name, so a lone keyword is doubled.
    if let [only] = keywords.as_slice() {
        keywords.push(only.clone());
    }
    if !keywords.is_empty() {
        tokens.push(keywords.join("+"));
    }
    tokens.join(",")
}

fn render_form_filters(entry: &Entry) -> String {
    let mut groups: Vec<String> = [
        &entry.faction_filters,
        &entry.race_filters,
        &entry.class_filters,
    ]
    .into_iter()
    .map(render_ref_group)
    .collect();
    while groups.last().is_some_and(String::is_empty) {
        groups.pop();
    }
    groups.join(",")
}

fn render_ref_group(set: &FilterSet<RecordRef>) -> String {
    set.iter()
        .map(|f| with_exclusion(f.excluded, &f.value.to_spid()))
        .collect::<Vec<_>>()
        .join("+")
}

fn with_exclusion(excluded: bool, value: &str) -> String {
    if excluded {
        format!("-{value}")
    } else {
        value.to_string()
    }
}
