//! Flowsheet document schema.

use std::collections::BTreeMap;

use fc_codec::{DecodeOptions, EncodeOptions};
use serde::{Deserialize, Serialize};

pub type AttrsDef = BTreeMap<String, String>;

/// A flowsheet stored on disk.
///
/// Either `units`/`streams` list the graph explicitly, or `notation` holds it
/// as codec text; a document with both is rejected by validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowsheetDoc {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub codec: CodecDef,
    #[serde(default)]
    pub units: Vec<UnitDef>,
    #[serde(default)]
    pub streams: Vec<StreamDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notation: Option<String>,
}

/// Codec settings stored with the document; CLI flags override them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CodecDef {
    #[serde(default)]
    pub encode: EncodeOptions,
    #[serde(default)]
    pub decode: DecodeOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: AttrsDef,
    /// Per-slot attributes of a merged heat-integrated unit.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stream_attrs: BTreeMap<u32, AttrsDef>,
}

impl UnitDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: AttrsDef::new(),
            stream_attrs: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamDef {
    pub from: String,
    pub to: String,
    /// Role labels such as `hot_in`, `tout` or `not_next_unitop`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: AttrsDef,
}

impl StreamDef {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            tags: Vec::new(),
            attrs: AttrsDef::new(),
        }
    }

    pub fn with_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.tags = tags.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }
}
