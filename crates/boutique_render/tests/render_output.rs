use std::path::PathBuf;

use boutique_core::core_api::{Engine, Session};
use boutique_core::{Catalog, Entry, Format, SiblingFile};
use boutique_render::{
    EntrySelection, JsonStyle, TextRenderOptions, render_conflicts_text, render_json_conflicts,
    render_json_matches, render_json_session, render_matches_text, render_session_text,
};
use serde_json::Value;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn read_fixture(relative: &str) -> String {
    std::fs::read_to_string(workspace_root().join("tests").join(relative))
        .expect("fixture should be readable")
}

fn session_from_fixture(relative: &str) -> Session {
    Engine::new()
        .open_bytes(read_fixture(relative), None)
        .expect("fixture should parse")
}

fn catalog() -> Catalog {
    Catalog::from_json_str(&read_fixture("catalog/catalog.json")).expect("catalog should parse")
}

fn keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect()
}

#[test]
fn session_json_uses_canonical_key_order() {
    let session = session_from_fixture("spid_examples/Boutique_DISTR.ini");
    let value = render_json_session(&session, JsonStyle::CanonicalV1);

    assert_eq!(
        keys(&value),
        vec!["format", "effective_format", "upgrade_reasons", "entries", "diagnostics"]
    );
    assert_eq!(
        keys(&value["entries"][0]),
        vec![
            "index",
            "kind",
            "target",
            "npcs",
            "factions",
            "races",
            "classes",
            "keywords",
            "traits",
            "chance",
            "level_filters",
            "count_or_index",
            "line",
        ]
    );
    assert_eq!(value["format"], "SPID");
    assert_eq!(value["entries"][2]["chance"], 50);
    assert_eq!(value["entries"][2]["traits"]["gender"], "Female");
    assert_eq!(value["entries"][2]["traits"]["unique"], false);
    assert_eq!(value["entries"][2]["traits"]["dead"], Value::Null);
    assert_eq!(value["entries"][3]["target"], "BOS_Noble");
    assert_eq!(value["diagnostics"][1]["kind"], "Unsupported");
}

#[test]
fn upgraded_skypatcher_session_reports_reasons() {
    let mut session = Engine::new().new_session(Format::SkyPatcher);
    session.add_entry(Entry::keyword("BOS_Noble"));

    let value = render_json_session(&session, JsonStyle::CanonicalV1);
    assert_eq!(value["format"], "SkyPatcher");
    assert_eq!(value["effective_format"], "SPID");
    assert_eq!(value["upgrade_reasons"][0], "keyword distribution rules");

    let text = render_session_text(&session, TextRenderOptions::default());
    assert!(text.contains("Output format: SPID (needs keyword distribution rules)"));
}

#[test]
fn match_json_lists_npcs_in_key_order() {
    let session = session_from_fixture("spid_examples/Boutique_DISTR.ini");
    let value = render_json_matches(
        &session,
        &catalog(),
        EntrySelection::Single(0),
        JsonStyle::CanonicalV1,
    );

    let matches = value["matches"].as_array().expect("matches should be an array");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["count"], 2);
    assert_eq!(matches[0]["npcs"][0]["key"], "Skyrim.esm|1B07D");
    assert_eq!(matches[0]["npcs"][0]["name"], "Brynjolf");
    assert_eq!(matches[0]["npcs"][1]["name"], "Lydia");
    assert_eq!(
        matches[0]["line"],
        "Outfit = 0x801~Boutique.esp|HousecarlWhiterun,Brynjolf"
    );

    let out_of_range = render_json_matches(
        &session,
        &catalog(),
        EntrySelection::Single(99),
        JsonStyle::CanonicalV1,
    );
    assert_eq!(out_of_range["matches"], Value::Array(Vec::new()));
}

#[test]
fn conflict_json_and_text_cover_both_reports() {
    let session = session_from_fixture("spid_examples/Boutique_DISTR.ini");
    let catalog = catalog();
    let siblings = [SiblingFile::from_text(
        "Zebra_DISTR.ini",
        &read_fixture("spid_examples/Zebra_DISTR.ini"),
    )];
    let intra = session.detect_intra_file_conflicts(&catalog);
    let cross = session.detect_cross_file_conflicts(&siblings, "Boutique_DISTR.ini", &catalog);

    let value = render_json_conflicts(&intra, Some(&cross), JsonStyle::CanonicalV1);
    assert_eq!(keys(&value), vec!["intra_file", "cross_file"]);
    assert_eq!(value["intra_file"]["conflicts"][0]["entries"], serde_json::json!([0, 1]));
    assert_eq!(value["cross_file"]["resolved_by_filename"], false);
    assert_eq!(value["cross_file"]["suggested_file_name"], "ZZBoutique_DISTR.ini");

    let without_siblings = render_json_conflicts(&intra, None, JsonStyle::CanonicalV1);
    assert_eq!(without_siblings["cross_file"], Value::Null);

    let text = render_conflicts_text(&intra, Some(&cross));
    assert!(text.contains(" ::: This file :::"));
    assert!(text.contains(" ::: Other files :::"));
    assert!(text.contains("Suggested file name: ZZBoutique_DISTR.ini"));
}

#[test]
fn text_views_contain_expected_sections() {
    let session = session_from_fixture("spid_examples/Boutique_DISTR.ini");

    let quiet = render_session_text(&session, TextRenderOptions::default());
    assert!(quiet.starts_with("Format: SPID\n"));
    assert!(quiet.contains(" ::: Entries (4) :::"));
    assert!(quiet.contains("    #0  Outfit = 0x801~Boutique.esp|HousecarlWhiterun,Brynjolf"));
    assert!(quiet.contains(" ::: Diagnostics (1) :::"));

    let verbose = render_session_text(&session, TextRenderOptions { verbose: true });
    assert!(verbose.contains(" ::: Diagnostics (2) :::"));

    let matches = render_matches_text(&session, &catalog(), EntrySelection::All);
    assert!(matches.contains(" ::: #3 Keyword = BOS_Noble|NONE|PotentialFollowerFaction||M :::"));
    assert!(matches.contains("  no NPCs matched"));
    assert!(matches.contains("Lucia"));
}
