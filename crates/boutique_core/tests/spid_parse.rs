use std::fs;
use std::path::PathBuf;

use boutique_core::{
    DiagnosticKind, EntryKind, Format, Gender, RecordKey, RecordRef, parse, parse_as,
};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn spid_fixture(name: &str) -> String {
    let path = workspace_root().join("tests/spid_examples").join(name);
    fs::read_to_string(&path).expect("failed to read SPID fixture")
}

#[test]
fn parses_fixture_entries_and_diagnostics() {
    let outcome = parse(&spid_fixture("Boutique_DISTR.ini"));
    assert_eq!(outcome.format, Format::Spid);
    assert_eq!(outcome.entries.len(), 4);

    let first = &outcome.entries[0];
    assert_eq!(
        first.outfit,
        Some(RecordRef::Key(RecordKey::new("Boutique.esp", 0x801)))
    );
    assert_eq!(first.npc_filters.len(), 2);

    let third = &outcome.entries[2];
    assert_eq!(third.level_filters.as_deref(), Some("5/20"));
    assert_eq!(third.traits.gender, Some(Gender::Female));
    assert_eq!(third.traits.unique, Some(false));
    assert_eq!(third.chance.map(|c| c.percent()), Some(50));
    assert_eq!(third.keyword_filters.excluded().count(), 1);

    let keyword = &outcome.entries[3];
    assert_eq!(keyword.kind, EntryKind::Keyword);
    assert_eq!(keyword.keyword.as_deref(), Some("BOS_Noble"));
    assert_eq!(keyword.traits.gender, Some(Gender::Male));

    // Header lines are recognized; the user comment and the Spell line are kept.
    let kinds: Vec<_> = outcome.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::Comment, DiagnosticKind::Unsupported]);
    assert!(outcome.diagnostics.iter().all(|d| d.preserved));
    assert_eq!(outcome.diagnostics[1].line_number, 8);
    assert_eq!(outcome.errors().count(), 1);
}

#[test]
fn parses_documented_example_line() {
    let outcome = parse("Outfit = 0x800|JohnDoe|ThievesGuild||F/U||50");
    assert_eq!(outcome.format, Format::Spid);
    assert!(outcome.diagnostics.is_empty());

    let entry = &outcome.entries[0];
    assert_eq!(entry.kind, EntryKind::Outfit);
    assert_eq!(entry.outfit, Some(RecordRef::FormId(0x800)));
    assert!(entry.npc_filters.contains(&RecordRef::editor_id("JohnDoe")));
    assert!(
        entry
            .faction_filters
            .contains(&RecordRef::editor_id("ThievesGuild"))
    );
    assert_eq!(entry.traits.gender, Some(Gender::Female));
    assert_eq!(entry.traits.unique, Some(true));
    assert_eq!(entry.chance.map(|c| c.percent()), Some(50));
}

#[test]
fn none_and_missing_fields_are_equivalent() {
    let with_none = parse("Outfit = 0x1~Mod.esp|NONE|NONE|NONE|NONE|NONE|NONE");
    let bare = parse("Outfit = 0x1~Mod.esp");
    assert_eq!(with_none.entries, bare.entries);
    assert!(!bare.entries[0].has_filters());

    let lowercase = parse("outfit = 0x1~Mod.esp|none|ThievesGuild");
    assert_eq!(lowercase.entries.len(), 1);
    assert_eq!(lowercase.entries[0].faction_filters.len(), 1);
}

#[test]
fn malformed_lines_are_dropped_with_a_reason() {
    let outcome = parse_as(
        "Outfit = 0x1~Mod.esp|Lydia\nthis line has no equals sign\nOutfit = NONE|Lydia",
        Format::Spid,
    );
    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.diagnostics.len(), 2);
    for diagnostic in &outcome.diagnostics {
        assert!(!diagnostic.preserved);
        assert_eq!(diagnostic.kind, DiagnosticKind::Malformed);
        assert!(!diagnostic.reason.is_empty());
    }
    assert_eq!(outcome.diagnostics[0].line_number, 2);
    assert_eq!(outcome.diagnostics[0].line, "this line has no equals sign");
}

#[test]
fn unsupported_constructs_are_preserved_verbatim() {
    let text = concat!(
        "Outfit = 0x1~Mod.esp|*Guard\n",
        "Outfit = 0x1~Mod.esp|||||| 0\n",
        "Item = 0xF~Skyrim.esm|Lydia"
    );
    let outcome = parse_as(text, Format::Spid);
    assert!(outcome.entries.is_empty());
    let lines: Vec<_> = outcome.preserved_lines().map(|d| d.line.as_str()).collect();
    assert_eq!(lines, text.lines().collect::<Vec<_>>());
}
