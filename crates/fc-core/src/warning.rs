//! Non-fatal heat-integration reports.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeStage {
    Split,
    Merge,
}

/// A multi-stream unit that could not be split (before encoding) or merged
/// (after decoding) and was kept as a single multi-edge node instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedMerge {
    pub unit: String,
    pub stage: MergeStage,
    pub reason: String,
}

impl DegradedMerge {
    pub fn split(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            stage: MergeStage::Split,
            reason: reason.into(),
        }
    }

    pub fn merge(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            stage: MergeStage::Merge,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DegradedMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage {
            MergeStage::Split => "split",
            MergeStage::Merge => "merge",
        };
        write!(f, "cannot {} unit {}: {}", stage, self.unit, self.reason)
    }
}
