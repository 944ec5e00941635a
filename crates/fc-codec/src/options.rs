//! Codec configuration.

use serde::{Deserialize, Serialize};

/// Notation dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotationVersion {
    /// Units, branches and markers only.
    V1,
    /// Adds stream role tags, heat-integration group tags and control-code tags.
    #[default]
    V2,
}

/// How branch choices are ordered during traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Traversal {
    /// Rank order; isomorphic graphs give identical strings.
    #[default]
    Canonical,
    /// Seeded permutation of the ranks, for producing alternative but valid
    /// encodings of the same graph.
    Randomized { seed: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub version: NotationVersion,
    /// Write heat-exchange role tags; without them the merger re-derives
    /// numbered slot roles after decoding.
    pub include_heat_tags: bool,
    pub traversal: Traversal,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            version: NotationVersion::V2,
            include_heat_tags: true,
            traversal: Traversal::Canonical,
        }
    }
}

impl EncodeOptions {
    pub fn with_version(mut self, version: NotationVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_heat_tags(mut self, include: bool) -> Self {
        self.include_heat_tags = include;
        self
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn is_canonical(&self) -> bool {
        self.traversal == Traversal::Canonical
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Fold `/k` shadow units back into their physical unit.
    pub merge_heat_integration: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            merge_heat_integration: true,
        }
    }
}

impl DecodeOptions {
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge_heat_integration = merge;
        self
    }
}
