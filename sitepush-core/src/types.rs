//! Domain types for sitepush records.
//!
//! Remote and snapshot paths are `String`s: they are POSIX-style, `/`
//! separated and relative to the published root, never host filesystem paths.
//! All types are serializable/deserializable via serde + serde_yaml.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque label attached to a snapshot (usually a short VCS revision).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct VersionLabel(pub String);

/// An all-digit revision written unquoted by another producer parses as a
/// YAML number.
#[derive(Deserialize)]
#[serde(untagged)]
enum VersionLabelCompat {
    Text(String),
    Number(serde_yaml::Number),
}

impl<'de> Deserialize<'de> for VersionLabel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match VersionLabelCompat::deserialize(deserializer)? {
            VersionLabelCompat::Text(s) => Self(s),
            VersionLabelCompat::Number(n) => Self(n.to_string()),
        })
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for VersionLabel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VersionLabel {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How newly required directories are collapsed before creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FoldStrategy {
    /// Sorted, order-independent minimal covering set. Prefixes are matched
    /// on `/` segment boundaries.
    #[default]
    Canonical,
    /// First-match fold over the encounter order with raw string prefixes.
    /// Output depends on input order.
    Legacy,
}

impl fmt::Display for FoldStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoldStrategy::Canonical => write!(f, "canonical"),
            FoldStrategy::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for FoldStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "canonical" => Ok(Self::Canonical),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!(
                "unknown fold strategy '{other}'; expected: canonical, legacy"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Content hashes of every regular file under a published root.
///
/// `entries` maps the root-relative path to its lowercase hex digest. The map
/// is ordered so the persisted form is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub version: VersionLabel,
    #[serde(rename = "data", default)]
    pub entries: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn new(version: impl Into<VersionLabel>) -> Self {
        Self {
            version: version.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The ordered work needed to move a remote from one snapshot to another.
///
/// `dir` is optional on disk: producers before directory inference never
/// emitted it, and its absence reads as an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changeset {
    #[serde(default)]
    pub old_version: VersionLabel,
    #[serde(default)]
    pub new_version: VersionLabel,
    #[serde(rename = "dir", default, deserialize_with = "nullable_list")]
    pub directories: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub add: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub update: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub delete: Vec<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub after: Vec<String>,
}

impl Changeset {
    /// Number of remote steps this changeset will perform, directories included.
    pub fn step_count(&self) -> usize {
        self.directories.len()
            + self.add.len()
            + self.update.len()
            + self.delete.len()
            + self.after.len()
    }

    /// True when nothing but bookkeeping would be uploaded.
    pub fn has_no_content_changes(&self) -> bool {
        self.add.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// `key: ~` and `key: []` both mean "no entries".
fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
