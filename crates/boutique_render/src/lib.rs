use std::collections::BTreeSet;
use std::fmt::Write as _;

use boutique_core::core_api::Session;
use boutique_core::format::render_entry;
use boutique_core::{
    Catalog, ConflictReport, DiagnosticKind, Entry, EntryKind, Filter, FilterSet,
    IntraFileReport, ParseDiagnostic, RecordCategory, RecordKey, RecordRef, TraitFilters,
    match_entry,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

const RULE_COL_WIDTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    /// Also list comment lines among the diagnostics.
    pub verbose: bool,
}

/// Entries whose match sets are rendered: one entry, or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntrySelection {
    #[default]
    All,
    Single(usize),
}

impl EntrySelection {
    fn indices(&self, len: usize) -> Vec<usize> {
        match *self {
            Self::All => (0..len).collect(),
            Self::Single(index) if index < len => vec![index],
            Self::Single(_) => Vec::new(),
        }
    }
}

// ----------------------------------------------------------------------------
// JSON
// ----------------------------------------------------------------------------

pub fn render_json_session(session: &Session, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(session_json(session)),
    }
}

pub fn render_json_matches(
    session: &Session,
    catalog: &Catalog,
    selection: EntrySelection,
    style: JsonStyle,
) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => {
            let format = session.effective_format();
            let matches = selection
                .indices(session.entries().len())
                .into_iter()
                .map(|index| {
                    let entry = &session.entries()[index];
                    let npcs = match_entry(entry, catalog);
                    let mut out = JsonMap::new();
                    out.insert("index".to_string(), JsonValue::from(index));
                    out.insert("line".to_string(), optional_string(render_entry(entry, format)));
                    out.insert("count".to_string(), JsonValue::from(npcs.len()));
                    out.insert("npcs".to_string(), npcs_to_json(catalog, &npcs));
                    JsonValue::Object(out)
                })
                .collect();
            let mut out = JsonMap::new();
            out.insert("format".to_string(), JsonValue::from(format.as_str()));
            out.insert("matches".to_string(), JsonValue::Array(matches));
            JsonValue::Object(out)
        }
    }
}

pub fn render_json_conflicts(
    intra: &IntraFileReport,
    cross: Option<&ConflictReport>,
    style: JsonStyle,
) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => {
            let mut out = JsonMap::new();
            out.insert("intra_file".to_string(), intra_report_json(intra));
            out.insert(
                "cross_file".to_string(),
                cross.map_or(JsonValue::Null, cross_report_json),
            );
            JsonValue::Object(out)
        }
    }
}

fn session_json(session: &Session) -> JsonMap<String, JsonValue> {
    let capabilities = session.capabilities();
    let mut out = JsonMap::new();

    out.insert(
        "format".to_string(),
        JsonValue::from(session.format().as_str()),
    );
    out.insert(
        "effective_format".to_string(),
        JsonValue::from(capabilities.effective.as_str()),
    );
    out.insert(
        "upgrade_reasons".to_string(),
        JsonValue::Array(
            capabilities
                .issues
                .iter()
                .map(|issue| JsonValue::from(issue.describe()))
                .collect(),
        ),
    );
    out.insert(
        "entries".to_string(),
        JsonValue::Array(
            session
                .entries()
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    entry_to_json(index, entry, render_entry(entry, capabilities.effective))
                })
                .collect(),
        ),
    );
    out.insert(
        "diagnostics".to_string(),
        JsonValue::Array(session.diagnostics().iter().map(diagnostic_to_json).collect()),
    );

    out
}

fn entry_to_json(index: usize, entry: &Entry, line: Option<String>) -> JsonValue {
    let target = match entry.kind {
        EntryKind::Outfit => entry.outfit.as_ref().map(RecordRef::to_spid),
        EntryKind::Keyword => entry.keyword.clone(),
    };

    let mut out = JsonMap::new();
    out.insert("index".to_string(), JsonValue::from(index));
    out.insert("kind".to_string(), JsonValue::from(entry.kind.as_str()));
    out.insert("target".to_string(), optional_string(target));
    out.insert("npcs".to_string(), ref_filters_to_json(&entry.npc_filters));
    out.insert(
        "factions".to_string(),
        ref_filters_to_json(&entry.faction_filters),
    );
    out.insert("races".to_string(), ref_filters_to_json(&entry.race_filters));
    out.insert(
        "classes".to_string(),
        ref_filters_to_json(&entry.class_filters),
    );
    out.insert(
        "keywords".to_string(),
        filters_to_json(&entry.keyword_filters, |value| value.clone()),
    );
    out.insert("traits".to_string(), traits_to_json(&entry.traits));
    out.insert(
        "chance".to_string(),
        entry
            .chance
            .map_or(JsonValue::Null, |chance| JsonValue::from(chance.percent())),
    );
    out.insert(
        "level_filters".to_string(),
        optional_string(entry.level_filters.clone()),
    );
    out.insert(
        "count_or_index".to_string(),
        optional_string(entry.count_or_index.clone()),
    );
    out.insert("line".to_string(), optional_string(line));
    JsonValue::Object(out)
}

fn ref_filters_to_json(set: &FilterSet<RecordRef>) -> JsonValue {
    filters_to_json(set, RecordRef::to_spid)
}

fn filters_to_json<T>(set: &FilterSet<T>, text: impl Fn(&T) -> String) -> JsonValue
where
    T: PartialEq,
{
    JsonValue::Array(
        set.iter()
            .map(|Filter { value, excluded }| {
                let mut out = JsonMap::new();
                out.insert("value".to_string(), JsonValue::String(text(value)));
                out.insert("excluded".to_string(), JsonValue::Bool(*excluded));
                JsonValue::Object(out)
            })
            .collect(),
    )
}

fn traits_to_json(traits: &TraitFilters) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "gender".to_string(),
        traits
            .gender
            .map_or(JsonValue::Null, |gender| JsonValue::from(gender.as_str())),
    );
    for (code, value) in traits.flags() {
        out.insert(
            trait_name(code).to_string(),
            value.map_or(JsonValue::Null, JsonValue::Bool),
        );
    }
    JsonValue::Object(out)
}

fn trait_name(code: char) -> &'static str {
    match code {
        'U' => "unique",
        'S' => "summonable",
        'C' => "child",
        'L' => "leveled",
        'T' => "teammate",
        'D' => "dead",
        _ => "unknown",
    }
}

fn diagnostic_to_json(diagnostic: &ParseDiagnostic) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "line_number".to_string(),
        JsonValue::from(diagnostic.line_number),
    );
    out.insert(
        "kind".to_string(),
        JsonValue::from(format!("{:?}", diagnostic.kind)),
    );
    out.insert(
        "preserved".to_string(),
        JsonValue::Bool(diagnostic.preserved),
    );
    out.insert(
        "reason".to_string(),
        JsonValue::String(diagnostic.reason.clone()),
    );
    out.insert("line".to_string(), JsonValue::String(diagnostic.line.clone()));
    JsonValue::Object(out)
}

fn npcs_to_json(catalog: &Catalog, npcs: &BTreeSet<RecordKey>) -> JsonValue {
    JsonValue::Array(
        npcs.iter()
            .map(|key| npc_to_json(key, &npc_name(catalog, key)))
            .collect(),
    )
}

fn npc_to_json(key: &RecordKey, name: &str) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("key".to_string(), JsonValue::String(key.to_string()));
    out.insert("name".to_string(), JsonValue::String(name.to_string()));
    JsonValue::Object(out)
}

fn intra_report_json(report: &IntraFileReport) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "has_conflicts".to_string(),
        JsonValue::Bool(report.has_conflicts),
    );
    out.insert(
        "summary".to_string(),
        JsonValue::String(report.summary_text.clone()),
    );
    out.insert(
        "conflicts".to_string(),
        JsonValue::Array(
            report
                .conflicts
                .iter()
                .map(|conflict| {
                    let mut out = JsonMap::new();
                    out.insert("npc".to_string(), npc_to_json(&conflict.npc, &conflict.npc_name));
                    out.insert(
                        "entries".to_string(),
                        JsonValue::from(conflict.entry_indices.clone()),
                    );
                    JsonValue::Object(out)
                })
                .collect(),
        ),
    );
    JsonValue::Object(out)
}

fn cross_report_json(report: &ConflictReport) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "has_conflicts".to_string(),
        JsonValue::Bool(report.has_conflicts),
    );
    out.insert(
        "resolved_by_filename".to_string(),
        JsonValue::Bool(report.resolved_by_filename),
    );
    out.insert(
        "suggested_file_name".to_string(),
        optional_string(report.suggested_file_name.clone()),
    );
    out.insert(
        "summary".to_string(),
        JsonValue::String(report.summary_text.clone()),
    );
    out.insert(
        "conflicts".to_string(),
        JsonValue::Array(
            report
                .conflicts
                .iter()
                .map(|conflict| {
                    let mut out = JsonMap::new();
                    out.insert("npc".to_string(), npc_to_json(&conflict.npc, &conflict.npc_name));
                    out.insert(
                        "file".to_string(),
                        JsonValue::String(conflict.file_name.clone()),
                    );
                    out.insert("entry".to_string(), JsonValue::from(conflict.entry_index));
                    out.insert(
                        "outfit".to_string(),
                        JsonValue::String(conflict.outfit.clone()),
                    );
                    JsonValue::Object(out)
                })
                .collect(),
        ),
    );
    JsonValue::Object(out)
}

fn optional_string(value: Option<String>) -> JsonValue {
    value.map_or(JsonValue::Null, JsonValue::String)
}

fn npc_name(catalog: &Catalog, key: &RecordKey) -> String {
    catalog.display_name(RecordCategory::Npc, &RecordRef::Key(key.clone()))
}

// ----------------------------------------------------------------------------
// Text
// ----------------------------------------------------------------------------

pub fn render_session_text(session: &Session, options: TextRenderOptions) -> String {
    let capabilities = session.capabilities();
    let mut out = String::new();

    writeln!(out, "Format: {}", session.format()).expect("writing to String cannot fail");
    if capabilities.is_upgraded() {
        let reasons: Vec<&str> = capabilities.issues.iter().map(|i| i.describe()).collect();
        writeln!(
            out,
            "Output format: {} (needs {})",
            capabilities.effective,
            reasons.join(", ")
        )
        .expect("writing to String cannot fail");
    }
    writeln!(out).expect("writing to String cannot fail");

    writeln!(out, " ::: Entries ({}) :::", session.entries().len())
        .expect("writing to String cannot fail");
    for (index, entry) in session.entries().iter().enumerate() {
        let line = render_entry(entry, capabilities.effective)
            .unwrap_or_else(|| "(no target, not written)".to_string());
        writeln!(out, "{:>width$}  {line}", format!("#{index}"), width = RULE_COL_WIDTH)
            .expect("writing to String cannot fail");
    }

    let diagnostics: Vec<&ParseDiagnostic> = session
        .diagnostics()
        .iter()
        .filter(|d| options.verbose || d.kind != DiagnosticKind::Comment)
        .collect();
    if !diagnostics.is_empty() {
        writeln!(out).expect("writing to String cannot fail");
        writeln!(out, " ::: Diagnostics ({}) :::", diagnostics.len())
            .expect("writing to String cannot fail");
        for diagnostic in diagnostics {
            let status = if diagnostic.preserved {
                "kept"
            } else {
                "dropped"
            };
            writeln!(
                out,
                "{:>width$}  {status}: {}",
                format!("L{}", diagnostic.line_number),
                diagnostic.reason,
                width = RULE_COL_WIDTH
            )
            .expect("writing to String cannot fail");
            writeln!(out, "{:>width$}  {}", "", diagnostic.line, width = RULE_COL_WIDTH)
                .expect("writing to String cannot fail");
        }
    }

    out
}

pub fn render_matches_text(
    session: &Session,
    catalog: &Catalog,
    selection: EntrySelection,
) -> String {
    let format = session.effective_format();
    let mut out = String::new();

    for index in selection.indices(session.entries().len()) {
        let entry = &session.entries()[index];
        let npcs = match_entry(entry, catalog);
        let line = render_entry(entry, format).unwrap_or_else(|| "(no target)".to_string());
        writeln!(out, " ::: #{index} {line} :::").expect("writing to String cannot fail");
        if npcs.is_empty() {
            writeln!(out, "  no NPCs matched").expect("writing to String cannot fail");
        }
        for key in &npcs {
            writeln!(out, "  {:<30}{key}", npc_name(catalog, key))
                .expect("writing to String cannot fail");
        }
        writeln!(out).expect("writing to String cannot fail");
    }

    out
}

pub fn render_conflicts_text(intra: &IntraFileReport, cross: Option<&ConflictReport>) -> String {
    let mut out = String::new();

    writeln!(out, " ::: This file :::").expect("writing to String cannot fail");
    writeln!(out, "  {}", intra.summary_text).expect("writing to String cannot fail");
    for conflict in &intra.conflicts {
        let entries: Vec<String> = conflict
            .entry_indices
            .iter()
            .map(|i| format!("#{i}"))
            .collect();
        writeln!(
            out,
            "  {:<30}{}",
            conflict.npc_name,
            entries.join(", ")
        )
        .expect("writing to String cannot fail");
    }

    if let Some(cross) = cross {
        writeln!(out).expect("writing to String cannot fail");
        writeln!(out, " ::: Other files :::").expect("writing to String cannot fail");
        writeln!(out, "  {}", cross.summary_text).expect("writing to String cannot fail");
        for conflict in &cross.conflicts {
            writeln!(
                out,
                "  {:<30}#{:<5}{} ({})",
                conflict.npc_name, conflict.entry_index, conflict.file_name, conflict.outfit
            )
            .expect("writing to String cannot fail");
        }
        if let Some(name) = &cross.suggested_file_name {
            writeln!(out, "  Suggested file name: {name}").expect("writing to String cannot fail");
        }
    }

    out
}
