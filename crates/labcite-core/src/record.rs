//! Bibliographic record model shared by every pipeline stage.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Where a record came from. Decides the failure policy when citation
/// resolution fails: user-authored records are kept (hard error), adapter
/// discoveries are dropped (soft warning).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Hand-entered by the user in the `sources` data files.
    UserAuthored,
    /// Discovered by a metadata adapter (e.g. `dblp`).
    AdapterSourced { adapter: String },
}

impl Origin {
    /// Name written to the `plugin` output key.
    pub fn plugin_name(&self) -> &str {
        match self {
            Origin::UserAuthored => "sources",
            Origin::AdapterSourced { adapter } => adapter,
        }
    }
}

/// Provenance attached to every record at ingestion by the record loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub origin: Origin,
    /// Name of the data file the record came from.
    pub file: String,
}

/// One bibliographic entry: recognized fields plus a pass-through bag for
/// everything else.
///
/// Field *presence* matters — merging and overlaying are presence-based, a
/// present-but-empty value still overrides — so every recognized field is an
/// `Option`. Unrecognized keys flow through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_stringish"
    )]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Accept either a string or a bare number (YAML `date: 2023`) as a string.
fn de_stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, got {other}"
        ))),
    }
}

impl Source {
    /// Deserialize one data-file mapping into a source. Fails on ill-typed
    /// recognized fields; unrecognized keys land in `extra`.
    pub fn from_entry(entry: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(entry.clone()))
    }

    /// The non-blank identifier, if any. Absent, empty, and whitespace-only
    /// ids all count as "no identifier".
    pub fn identifier(&self) -> Option<&str> {
        match self.id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(id) => Some(id),
        }
    }

    /// Short human-readable handle for log lines: the id, else the title.
    pub fn label(&self) -> &str {
        self.identifier()
            .or(self.title.as_deref())
            .unwrap_or("<no id or title>")
    }

    /// Per-field last-write-wins update: every field *present* in `other`
    /// overrides the corresponding field here; absent fields are untouched.
    pub fn merge_from(&mut self, other: &Source) {
        if other.id.is_some() {
            self.id = other.id.clone();
        }
        if other.title.is_some() {
            self.title = other.title.clone();
        }
        if other.authors.is_some() {
            self.authors = other.authors.clone();
        }
        if other.date.is_some() {
            self.date = other.date.clone();
        }
        if other.publisher.is_some() {
            self.publisher = other.publisher.clone();
        }
        if other.link.is_some() {
            self.link = other.link.clone();
        }
        if other.remove.is_some() {
            self.remove = other.remove;
        }
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// A source tagged with provenance, flowing through the merge and resolution
/// stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub source: Source,
    pub provenance: Provenance,
}

/// A fully resolved citation ready for output. Serializes as one flat mapping
/// with the provenance under the `plugin` and `file` keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub source: Source,
    pub provenance: Provenance,
}

impl Citation {
    pub fn new(source: Source, provenance: Provenance) -> Self {
        Self { source, provenance }
    }

    pub fn identifier(&self) -> Option<&str> {
        self.source.identifier()
    }

    pub fn label(&self) -> &str {
        self.source.label()
    }
}

impl Serialize for Citation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Flatten the source fields and append plugin/file. Going through a
        // serde_json map keeps the `extra` flattening behavior of `Source`.
        let fields = serde_json::to_value(&self.source).map_err(serde::ser::Error::custom)?;
        let Value::Object(fields) = fields else {
            return Err(serde::ser::Error::custom("source did not serialize to a mapping"));
        };
        let mut map = serializer.serialize_map(Some(fields.len() + 2))?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("plugin", self.provenance.origin.plugin_name())?;
        map.serialize_entry("file", &self.provenance.file)?;
        map.end()
    }
}
