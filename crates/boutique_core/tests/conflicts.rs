use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use boutique_core::conflict::naming::suggest_file_name;
use boutique_core::{
    Catalog, Entry, Gender, NpcRecord, RecordKey, RecordRef, SiblingFile,
    detect_cross_file_conflicts, detect_intra_file_conflicts, parse,
};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn read_fixture(relative: &str) -> String {
    fs::read_to_string(workspace_root().join("tests").join(relative))
        .expect("failed to read fixture")
}

fn catalog() -> Catalog {
    Catalog::from_json_str(&read_fixture("catalog/catalog.json"))
        .expect("failed to parse catalog fixture")
}

fn sibling(name: &str) -> SiblingFile {
    SiblingFile::from_text(name, &read_fixture(&format!("spid_examples/{name}")))
}

fn skyrim(id: u32) -> RecordKey {
    RecordKey::new("Skyrim.esm", id)
}

fn lydia_entry() -> Entry {
    let mut entry = Entry::outfit(RecordKey::new("Boutique.esp", 0x801));
    entry.npc_filters.include(RecordRef::editor_id("HousecarlWhiterun"));
    entry
}

#[test]
fn conflict_is_reported_against_the_assigning_sibling() {
    let report = detect_cross_file_conflicts(
        &[lydia_entry()],
        &[sibling("Aardvark_DISTR.ini")],
        "Boutique_DISTR.ini",
        &catalog(),
    );
    assert!(report.has_conflicts);
    assert_eq!(report.conflicts.len(), 1);
    let conflict = &report.conflicts[0];
    assert_eq!(conflict.npc, skyrim(0xA2C94));
    assert_eq!(conflict.npc_name, "Lydia");
    assert_eq!(conflict.file_name, "Aardvark_DISTR.ini");
    assert_eq!(conflict.outfit, "0x5~Aardvark.esp");
}

#[test]
fn candidate_sorting_last_resolves_by_filename() {
    let report = detect_cross_file_conflicts(
        &[lydia_entry()],
        &[sibling("Aardvark_DISTR.ini")],
        "Boutique_DISTR.ini",
        &catalog(),
    );
    assert!(report.resolved_by_filename);
    assert_eq!(report.suggested_file_name, None);
    assert!(report.summary_text.contains("Lydia"));
}

#[test]
fn candidate_sorting_early_gets_a_z_prefixed_suggestion() {
    let outcome = parse(&read_fixture("spid_examples/Boutique_DISTR.ini"));
    let report = detect_cross_file_conflicts(
        &outcome.entries,
        &[sibling("Aardvark_DISTR.ini"), sibling("Zebra_DISTR.ini")],
        "Boutique_Distribution.ini",
        &catalog(),
    );

    assert!(report.has_conflicts);
    assert!(!report.resolved_by_filename);
    assert_eq!(report.conflicting_files(), vec!["Aardvark_DISTR.ini", "Zebra_DISTR.ini"]);
    let suggested = report
        .suggested_file_name
        .as_deref()
        .expect("a rename should be suggested");
    assert!(suggested.starts_with('Z'));
    assert_eq!(suggested, "ZZBoutique_Distribution.ini");

    // Brynjolf is named in Zebra and matched by the first two entries.
    let brynjolf: Vec<_> = report
        .conflicts
        .iter()
        .filter(|c| c.npc == skyrim(0x1B07D))
        .map(|c| (c.file_name.as_str(), c.entry_index))
        .collect();
    assert_eq!(brynjolf, vec![("Zebra_DISTR.ini", 0), ("Zebra_DISTR.ini", 1)]);
    assert!(report.summary_text.contains("ZZBoutique_Distribution.ini"));
}

#[test]
fn keyword_groups_in_siblings_assign_nothing() {
    let mut entry = Entry::outfit(RecordKey::new("Boutique.esp", 0x801));
    entry.npc_filters.include(RecordRef::editor_id("WhiterunGuard"));
    let report = detect_cross_file_conflicts(
        &[entry],
        &[sibling("Zebra_DISTR.ini")],
        "Boutique_DISTR.ini",
        &catalog(),
    );
    assert!(!report.has_conflicts);
    assert!(report.conflicts.is_empty());
}

#[test]
fn keyword_entries_never_conflict() {
    let mut entry = Entry::keyword("BOS_Noble");
    entry.npc_filters.include(RecordRef::editor_id("HousecarlWhiterun"));
    let report = detect_cross_file_conflicts(
        &[entry],
        &[sibling("Aardvark_DISTR.ini")],
        "Boutique_DISTR.ini",
        &catalog(),
    );
    assert!(!report.has_conflicts);
}

#[test]
fn siblings_with_the_candidate_name_are_ignored() {
    let report = detect_cross_file_conflicts(
        &[lydia_entry()],
        &[SiblingFile::new(
            "Data/boutique_distr.ini",
            vec!["Outfit = 0x5~Aardvark.esp|HousecarlWhiterun".to_string()],
        )],
        "Boutique_DISTR.ini",
        &catalog(),
    );
    assert!(!report.has_conflicts);
}

#[test]
fn empty_catalog_yields_an_empty_report() {
    let report = detect_cross_file_conflicts(
        &[lydia_entry()],
        &[sibling("Aardvark_DISTR.ini")],
        "Boutique_DISTR.ini",
        &Catalog::default(),
    );
    assert!(!report.has_conflicts);
    assert!(report.conflicts.is_empty());
    assert_eq!(report.suggested_file_name, None);

    let intra = detect_intra_file_conflicts(&[lydia_entry(), lydia_entry()], &Catalog::default());
    assert!(!intra.has_conflicts);
}

#[test]
fn intra_file_conflicts_list_every_matching_entry() {
    let outcome = parse(&read_fixture("spid_examples/Boutique_DISTR.ini"));
    let report = detect_intra_file_conflicts(&outcome.entries, &catalog());
    assert!(report.has_conflicts);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].npc, skyrim(0x1B07D));
    assert_eq!(report.conflicts[0].npc_name, "Brynjolf");
    assert_eq!(report.conflicts[0].entry_indices, vec![0, 1]);
    assert!(report.summary_text.contains("Brynjolf"));
}

#[test]
fn summary_caps_the_npc_list() {
    let mut entry = Entry::outfit(RecordKey::new("Boutique.esp", 0x801));
    entry.keyword_filters.include("ActorTypeNPC".to_string());
    let names = [
        "HousecarlWhiterun",
        "UthgerdTheUnbroken",
        "Brynjolf",
        "Vex",
        "Lucia",
        "WhiterunGuard",
    ];
    let sibling = SiblingFile::new(
        "Aardvark_DISTR.ini",
        vec![format!("Outfit = 0x5~Aardvark.esp|{}", names.join(","))],
    );
    let report =
        detect_cross_file_conflicts(&[entry], &[sibling], "Boutique_DISTR.ini", &catalog());
    assert_eq!(report.conflicts.len(), 6);
    assert!(report.summary_text.contains("6 NPCs"));
    assert!(report.summary_text.contains("+1 more"));
    assert!(!report.summary_text.contains("Whiterun Guard"));
}

#[test]
fn suggestion_for_the_documented_names() {
    // "Boutique_Distribution.ini" already sorts after "Aardvark_DISTR.ini";
    // a sibling that sorts later forces the rename.
    assert_eq!(
        suggest_file_name("Boutique_Distribution.ini", &["Aardvark_DISTR.ini"]).as_deref(),
        Some("ZBoutique_Distribution.ini")
    );
    assert_eq!(
        suggest_file_name("Boutique_Distribution.ini", &["Zulu_DISTR.ini"]).as_deref(),
        Some("ZZBoutique_Distribution.ini")
    );
}

#[test]
fn large_catalog_cross_file_detection_stays_linear() {
    const NPCS: u32 = 8000;
    let mut catalog = Catalog::new();
    for id in 0..NPCS {
        let key = RecordKey::new("Mod.esp", 0x800 + id);
        let mut npc = NpcRecord::new(key, format!("Npc{id}"), Gender::Male);
        npc.keywords.push("ActorTypeNPC".to_string());
        catalog.npcs.push(npc);
    }
    let mut entry = Entry::outfit(RecordKey::new("Boutique.esp", 0x801));
    entry.keyword_filters.include("ActorTypeNPC".to_string());
    let names: Vec<String> = (0..NPCS).map(|id| format!("Npc{id}")).collect();
    let sibling = SiblingFile::new(
        "Aardvark_DISTR.ini",
        vec![format!("Outfit = 0x5~Aardvark.esp|{}", names.join(","))],
    );

    let started = Instant::now();
    let report = detect_cross_file_conflicts(&[entry], &[sibling], "Boutique_DISTR.ini", &catalog);
    let elapsed = started.elapsed();

    assert_eq!(report.conflicts.len(), NPCS as usize);
    assert_eq!(report.conflicts[0].npc_name, "Npc0");
    assert!(report.resolved_by_filename);
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
}
