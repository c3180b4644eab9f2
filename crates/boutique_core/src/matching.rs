//! Resolves an entry's filters against a catalog snapshot.
//!
//! Within a category filters are OR-combined and categories are
//! AND-combined. An included NPC filter is sufficient on its own. Exclusions in any
//! category always subtract, and every trait the entry sets must agree.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::catalog::{Catalog, NpcIndex, NpcRecord};
use crate::entry::{Entry, FilterSet, TraitFilters};
use crate::record::{RecordCategory, RecordKey, RecordRef};

/// Keys of every NPC in `catalog` the entry applies to. An entry without
/// inclusion filters matches nothing.
pub fn match_entry(entry: &Entry, catalog: &Catalog) -> BTreeSet<RecordKey> {
    if !entry.has_inclusion_filters() || catalog.is_empty() {
        return BTreeSet::new();
    }
    match_entry_indexed(entry, &NpcIndex::new(catalog))
}

/// [`match_entry`] against a prebuilt index, for callers matching many
/// entries against one catalog.
pub fn match_entry_indexed(entry: &Entry, npcs: &NpcIndex<'_>) -> BTreeSet<RecordKey> {
    let catalog = npcs.catalog();
    if !entry.has_inclusion_filters() || catalog.is_empty() {
        return BTreeSet::new();
    }

    let filters = ResolvedFilters::new(entry, npcs);
    let matched: BTreeSet<RecordKey> = catalog
        .npcs
        .iter()
        .filter(|npc| filters.matches(npc))
        .map(|npc| npc.key.clone())
        .collect();

    debug!(
        kind = entry.kind.as_str(),
        matched = matched.len(),
        "matched entry against catalog"
    );
    matched
}

/// One category's filters with references already resolved to keys.
#[derive(Debug, Default)]
struct KeyFilter {
    active: bool,
    included: HashSet<RecordKey>,
    excluded: HashSet<RecordKey>,
}

impl KeyFilter {
    fn new(set: &FilterSet<RecordRef>, resolve: impl Fn(&RecordRef) -> Vec<RecordKey>) -> Self {
        let mut filter = Self {
            active: set.has_inclusions(),
            ..Self::default()
        };
        for item in set {
            let keys = resolve(&item.value);
            if item.excluded {
                filter.excluded.extend(keys);
            } else {
                filter.included.extend(keys);
            }
        }
        filter
    }

    fn includes_any<'a>(&self, mut keys: impl Iterator<Item = &'a RecordKey>) -> bool {
        keys.any(|key| self.included.contains(key))
    }

    fn excludes_any<'a>(&self, mut keys: impl Iterator<Item = &'a RecordKey>) -> bool {
        keys.any(|key| self.excluded.contains(key))
    }
}

struct ResolvedFilters<'e> {
    npcs: KeyFilter,
    /// Name-style NPC references that name no NPC. The patcher checks these
    /// against keywords, so they join the keyword category.
    npc_keywords: Vec<(&'e str, bool)>,
    factions: KeyFilter,
    races: KeyFilter,
    classes: KeyFilter,
    keywords: &'e FilterSet<String>,
    traits: TraitFilters,
}

impl<'e> ResolvedFilters<'e> {
    fn new(entry: &'e Entry, npcs: &NpcIndex<'_>) -> Self {
        let catalog = npcs.catalog();
        let npc_keywords = entry
            .npc_filters
            .iter()
            .filter_map(|f| match &f.value {
                RecordRef::EditorId(name) if !npcs.resolves(&f.value) => {
                    Some((name.as_str(), f.excluded))
                }
                _ => None,
            })
            .collect();
        let in_category = |category: RecordCategory| {
            move |reference: &RecordRef| -> Vec<RecordKey> {
                catalog.resolve_keys(category, reference).into_iter().collect()
            }
        };
        Self {
            npcs: KeyFilter::new(&entry.npc_filters, |reference| npcs.resolve_keys(reference)),
            npc_keywords,
            factions: KeyFilter::new(&entry.faction_filters, in_category(RecordCategory::Faction)),
            races: KeyFilter::new(&entry.race_filters, in_category(RecordCategory::Race)),
            classes: KeyFilter::new(&entry.class_filters, in_category(RecordCategory::Class)),
            keywords: &entry.keyword_filters,
            traits: entry.traits,
        }
    }

    fn matches(&self, npc: &NpcRecord) -> bool {
        self.is_included(npc) && !self.is_excluded(npc) && traits_agree(&self.traits, npc)
    }

    fn is_included(&self, npc: &NpcRecord) -> bool {
        if self.npcs.included.contains(&npc.key) {
            return true;
        }

        let keywords_active = self.keywords.has_inclusions()
            || self.npc_keywords.iter().any(|(_, excluded)| !excluded);
        let keywords_satisfied = self.keywords.included().any(|k| npc.has_keyword(k))
            || self
                .npc_keywords
                .iter()
                .any(|(name, excluded)| !excluded && npc.has_keyword(name));

        let categories = [
            (self.factions.active, self.factions.includes_any(npc.factions.iter())),
            (self.races.active, self.races.includes_any(npc.race.iter())),
            (self.classes.active, self.classes.includes_any(npc.class.iter())),
            (keywords_active, keywords_satisfied),
        ];
        let mut any_active = false;
        for (active, satisfied) in categories {
            if active {
                any_active = true;
                if !satisfied {
                    return false;
                }
            }
        }
        any_active
    }

    fn is_excluded(&self, npc: &NpcRecord) -> bool {
        self.npcs.excluded.contains(&npc.key)
            || self
                .npc_keywords
                .iter()
                .any(|(name, excluded)| *excluded && npc.has_keyword(name))
            || self.factions.excludes_any(npc.factions.iter())
            || self.races.excludes_any(npc.race.iter())
            || self.classes.excludes_any(npc.class.iter())
            || self.keywords.excluded().any(|k| npc.has_keyword(k))
    }
}

fn traits_agree(traits: &TraitFilters, npc: &NpcRecord) -> bool {
    let flag = |filter: Option<bool>, actual: bool| filter.is_none_or(|wanted| wanted == actual);
    traits.gender.is_none_or(|gender| gender == npc.gender)
        && flag(traits.unique, npc.unique)
        && flag(traits.summonable, npc.summonable)
        && flag(traits.child, npc.child)
        && flag(traits.leveled, npc.leveled)
        && flag(traits.teammate, npc.teammate)
        && flag(traits.dead, npc.dead)
}
