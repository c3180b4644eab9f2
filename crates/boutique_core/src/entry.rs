//! The format-independent distribution rule model.

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::gender::Gender;
use crate::record::RecordRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryKind {
    #[default]
    Outfit,
    Keyword,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Outfit => "Outfit",
            Self::Keyword => "Keyword",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter<T> {
    pub value: T,
    pub excluded: bool,
}

/// Insertion-ordered set of filters, unique by value. Order only affects
/// rendering; two sets with the same members compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet<T> {
    items: Vec<Filter<T>>,
}

impl<T: PartialEq> PartialEq for FilterSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().all(|item| other.items.contains(item))
    }
}

impl<T: Eq> Eq for FilterSet<T> {}

impl<T> Default for FilterSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: PartialEq> FilterSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter. Re-inserting an existing value keeps its position and
    /// updates the exclusion flag. Returns `true` when the value was new.
    pub fn insert(&mut self, value: T, excluded: bool) -> bool {
        if let Some(existing) = self.items.iter_mut().find(|f| f.value == value) {
            existing.excluded = excluded;
            return false;
        }
        self.items.push(Filter { value, excluded });
        true
    }

    pub fn include(&mut self, value: T) -> bool {
        self.insert(value, false)
    }

    pub fn exclude(&mut self, value: T) -> bool {
        self.insert(value, true)
    }

    pub fn remove(&mut self, value: &T) -> Option<Filter<T>> {
        let index = self.items.iter().position(|f| &f.value == value)?;
        Some(self.items.remove(index))
    }

    pub fn contains(&self, value: &T) -> bool {
        self.items.iter().any(|f| &f.value == value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter<T>> {
        self.items.iter()
    }

    pub fn included(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter(|f| !f.excluded).map(|f| &f.value)
    }

    pub fn excluded(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter(|f| f.excluded).map(|f| &f.value)
    }

    pub fn has_inclusions(&self) -> bool {
        self.items.iter().any(|f| !f.excluded)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a FilterSet<T> {
    type Item = &'a Filter<T>;
    type IntoIter = std::slice::Iter<'a, Filter<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Tri-state trait predicates: `None` means the trait is not filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TraitFilters {
    pub gender: Option<Gender>,
    pub unique: Option<bool>,
    pub summonable: Option<bool>,
    pub child: Option<bool>,
    pub leveled: Option<bool>,
    pub teammate: Option<bool>,
    pub dead: Option<bool>,
}

impl TraitFilters {
    pub fn is_empty(&self) -> bool {
        self.gender.is_none() && !self.has_flags()
    }

    /// Any trait besides gender. SkyPatcher cannot express these.
    pub fn has_flags(&self) -> bool {
        self.flags().iter().any(|(_, value)| value.is_some())
    }

    /// The boolean traits in SPID code order.
    pub fn flags(&self) -> [(char, Option<bool>); 6] {
        [
            ('U', self.unique),
            ('S', self.summonable),
            ('C', self.child),
            ('L', self.leveled),
            ('T', self.teammate),
            ('D', self.dead),
        ]
    }

    pub fn flag_mut(&mut self, code: char) -> Option<&mut Option<bool>> {
        match code.to_ascii_uppercase() {
            'U' => Some(&mut self.unique),
            'S' => Some(&mut self.summonable),
            'C' => Some(&mut self.child),
            'L' => Some(&mut self.leveled),
            'T' => Some(&mut self.teammate),
            'D' => Some(&mut self.dead),
            _ => None,
        }
    }
}

/// Distribution probability in percent, always within 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Chance(u8);

impl Chance {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    pub fn new(percent: u8) -> Result<Self, CoreError> {
        if !(Self::MIN..=Self::MAX).contains(&percent) {
            return Err(CoreError::new(
                CoreErrorCode::InvalidValue,
                format!("chance {percent} is outside 1-100"),
            ));
        }
        Ok(Self(percent))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Chance {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Chance> for u8 {
    fn from(chance: Chance) -> Self {
        chance.0
    }
}

/// One distribution rule.
///
/// `outfit` is the target of an [`EntryKind::Outfit`] rule and `keyword` the
/// target of an [`EntryKind::Keyword`] rule; both are kept so switching the
/// kind back and forth while editing loses nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Entry {
    pub kind: EntryKind,
    pub outfit: Option<RecordRef>,
    pub keyword: Option<String>,
    pub npc_filters: FilterSet<RecordRef>,
    pub faction_filters: FilterSet<RecordRef>,
    pub race_filters: FilterSet<RecordRef>,
    pub class_filters: FilterSet<RecordRef>,
    pub keyword_filters: FilterSet<String>,
    pub traits: TraitFilters,
    pub chance: Option<Chance>,
    /// Raw SPID level filter field, e.g. `5/20` or `14(50/50)`.
    pub level_filters: Option<String>,
    /// Raw SPID count/index field.
    pub count_or_index: Option<String>,
}

impl Entry {
    pub fn outfit(target: impl Into<RecordRef>) -> Self {
        Self {
            kind: EntryKind::Outfit,
            outfit: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Keyword,
            keyword: Some(name.into()),
            ..Self::default()
        }
    }

    /// Whether this entry would produce a line when generated.
    pub fn has_target(&self) -> bool {
        match self.kind {
            EntryKind::Outfit => self.outfit.is_some(),
            EntryKind::Keyword => self
                .keyword
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty()),
        }
    }

    pub fn has_inclusion_filters(&self) -> bool {
        self.npc_filters.has_inclusions()
            || self.faction_filters.has_inclusions()
            || self.race_filters.has_inclusions()
            || self.class_filters.has_inclusions()
            || self.keyword_filters.has_inclusions()
    }

    pub fn has_filters(&self) -> bool {
        !self.npc_filters.is_empty()
            || !self.faction_filters.is_empty()
            || !self.race_filters.is_empty()
            || !self.class_filters.is_empty()
            || !self.keyword_filters.is_empty()
            || !self.traits.is_empty()
    }

    /// Features only the SPID format can express.
    pub fn requires_spid(&self) -> bool {
        self.kind == EntryKind::Keyword
            || self.chance.is_some()
            || self.traits.has_flags()
            || !self.class_filters.is_empty()
            || self.level_filters.is_some()
            || self.count_or_index.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{Chance, Entry, FilterSet};
    use crate::core_api::CoreErrorCode;
    use crate::record::RecordRef;

    #[test]
    fn filter_set_keeps_first_position_and_updates_exclusion() {
        let mut set = FilterSet::new();
        assert!(set.include("a".to_string()));
        assert!(set.include("b".to_string()));
        assert!(!set.exclude("a".to_string()));

        let values: Vec<_> = set.iter().map(|f| (f.value.as_str(), f.excluded)).collect();
        assert_eq!(values, vec![("a", true), ("b", false)]);
        assert!(set.has_inclusions());
    }

    #[test]
    fn chance_rejects_out_of_range_values() {
        assert_eq!(Chance::new(50).map(|c| c.percent()), Ok(50));
        let err = Chance::new(0).expect_err("zero chance should be rejected");
        assert_eq!(err.code, CoreErrorCode::InvalidValue);
        assert!(Chance::new(101).is_err());
    }

    #[test]
    fn keyword_entries_accept_any_chance() {
        let mut entry = Entry::keyword("BOS_Tagged");
        entry.chance = Some(Chance::new(25).expect("valid chance"));
        assert!(entry.requires_spid());
        assert!(entry.has_target());
    }

    #[test]
    fn outfit_entry_without_target_produces_nothing() {
        let mut entry = Entry::outfit(RecordRef::FormId(0x800));
        entry.outfit = None;
        assert!(!entry.has_target());
        assert!(!entry.requires_spid());
    }
}
