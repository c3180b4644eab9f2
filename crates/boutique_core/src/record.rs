//! Record identities shared by rule files and the catalog snapshot.
//!
//! A [`RecordKey`] is the stable `plugin + local id` identity of a game
//! record. Rule files may also name records by a bare form id or by editor
//! ID, so filters and targets hold a [`RecordRef`] that the catalog resolves
//! later.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordCategory {
    Npc,
    Faction,
    Keyword,
    Race,
    Class,
    Outfit,
}

impl RecordCategory {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Npc => "npc",
            Self::Faction => "faction",
            Self::Keyword => "keyword",
            Self::Race => "race",
            Self::Class => "class",
            Self::Outfit => "outfit",
        }
    }
}

/// Plugin names compare ASCII-case-insensitively, matching how the game
/// resolves load order entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordKey {
    pub plugin: String,
    pub local_id: u32,
}

impl RecordKey {
    pub fn new(plugin: impl Into<String>, local_id: u32) -> Self {
        Self {
            plugin: plugin.into(),
            local_id,
        }
    }

    /// `0x800~Plugin.esp`
    pub fn parse_spid(token: &str) -> Option<Self> {
        let (id, plugin) = token.split_once('~')?;
        Self::from_parts(plugin, id)
    }

    /// `Plugin.esp|800`
    pub fn parse_skypatcher(token: &str) -> Option<Self> {
        let (plugin, id) = token.rsplit_once('|')?;
        Self::from_parts(plugin, id)
    }

    pub fn to_spid(&self) -> String {
        format!("0x{:X}~{}", self.local_id, self.plugin)
    }

    pub fn to_skypatcher(&self) -> String {
        format!("{}|{:X}", self.plugin, self.local_id)
    }

    fn from_parts(plugin: &str, id: &str) -> Option<Self> {
        let plugin = plugin.trim();
        if plugin.is_empty() {
            return None;
        }
        let local_id = parse_hex(id.trim())?;
        Some(Self::new(plugin, local_id))
    }
}

impl PartialEq for RecordKey {
    fn eq(&self, other: &Self) -> bool {
        self.local_id == other.local_id && self.plugin.eq_ignore_ascii_case(&other.plugin)
    }
}

impl Eq for RecordKey {}

impl Hash for RecordKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.plugin.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        self.local_id.hash(state);
    }
}

impl Ord for RecordKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.plugin.bytes().map(|b| b.to_ascii_lowercase());
        let rhs = other.plugin.bytes().map(|b| b.to_ascii_lowercase());
        lhs.cmp(rhs).then(self.local_id.cmp(&other.local_id))
    }
}

impl PartialOrd for RecordKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{:X}", self.plugin, self.local_id)
    }
}

impl FromStr for RecordKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_skypatcher(s)
            .or_else(|| Self::parse_spid(s))
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::Parse,
                    format!("invalid record key '{s}', expected Plugin.esp|ID or 0xID~Plugin.esp"),
                )
            })
    }
}

impl TryFrom<String> for RecordKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordKey> for String {
    fn from(key: RecordKey) -> Self {
        key.to_string()
    }
}

/// How a rule file names a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordRef {
    Key(RecordKey),
    /// A form id written without its owning plugin, e.g. `0x800`.
    FormId(u32),
    EditorId(String),
}

impl RecordRef {
    pub fn editor_id(value: impl Into<String>) -> Self {
        Self::EditorId(value.into())
    }

    pub fn parse_spid(token: &str) -> Self {
        let token = token.trim();
        if token.contains('~')
            && let Some(key) = RecordKey::parse_spid(token)
        {
            return Self::Key(key);
        }
        Self::bare(token)
    }

    pub fn parse_skypatcher(token: &str) -> Self {
        let token = token.trim();
        if token.contains('|')
            && let Some(key) = RecordKey::parse_skypatcher(token)
        {
            return Self::Key(key);
        }
        Self::bare(token)
    }

    pub fn to_spid(&self) -> String {
        match self {
            Self::Key(key) => key.to_spid(),
            Self::FormId(id) => format!("0x{id:X}"),
            Self::EditorId(name) => name.clone(),
        }
    }

    pub fn to_skypatcher(&self) -> String {
        match self {
            Self::Key(key) => key.to_skypatcher(),
            Self::FormId(id) => format!("0x{id:X}"),
            Self::EditorId(name) => name.clone(),
        }
    }

    pub fn as_key(&self) -> Option<&RecordKey> {
        match self {
            Self::Key(key) => Some(key),
            _ => None,
        }
    }

    fn bare(token: &str) -> Self {
        let hex = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"));
        if let Some(hex) = hex
            && let Some(id) = parse_hex(hex)
        {
            return Self::FormId(id);
        }
        Self::EditorId(token.to_string())
    }
}

impl From<RecordKey> for RecordRef {
    fn from(key: RecordKey) -> Self {
        Self::Key(key)
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_spid())
    }
}

fn parse_hex(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || digits.len() > 8 {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
