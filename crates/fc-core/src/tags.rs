//! Stream tag vocabulary.
//!
//! Each stream carries at most one tag per category. The categories are
//! closed enums so that an invalid or duplicated role cannot be represented
//! once a `StreamTags` value exists; ambiguity is reported while parsing
//! labels into one.

use core::fmt;

use crate::error::{CodecError, CodecResult};

/// Which stream of a multi-stream unit a heat role refers to.
///
/// Ordering puts numbered slots first, then cold, then hot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeatSlot {
    Numbered(u32),
    Cold,
    Hot,
}

/// Heat-exchange role of a stream at a multi-stream unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeatRole {
    HotIn,
    HotOut,
    ColdIn,
    ColdOut,
    SlotIn(u32),
    SlotOut(u32),
}

impl HeatRole {
    pub fn slot(self) -> HeatSlot {
        match self {
            HeatRole::HotIn | HeatRole::HotOut => HeatSlot::Hot,
            HeatRole::ColdIn | HeatRole::ColdOut => HeatSlot::Cold,
            HeatRole::SlotIn(k) | HeatRole::SlotOut(k) => HeatSlot::Numbered(k),
        }
    }

    /// True for roles describing a stream entering the unit.
    pub fn is_inlet(self) -> bool {
        matches!(self, HeatRole::HotIn | HeatRole::ColdIn | HeatRole::SlotIn(_))
    }

    pub fn label(self) -> String {
        match self {
            HeatRole::HotIn => "hot_in".to_string(),
            HeatRole::HotOut => "hot_out".to_string(),
            HeatRole::ColdIn => "cold_in".to_string(),
            HeatRole::ColdOut => "cold_out".to_string(),
            HeatRole::SlotIn(k) => format!("{k}_in"),
            HeatRole::SlotOut(k) => format!("{k}_out"),
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "hot_in" => return Some(HeatRole::HotIn),
            "hot_out" => return Some(HeatRole::HotOut),
            "cold_in" => return Some(HeatRole::ColdIn),
            "cold_out" => return Some(HeatRole::ColdOut),
            _ => {}
        }
        let (slot, direction) = label.split_once('_')?;
        if slot.is_empty() || !slot.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let k = slot.parse().ok()?;
        match direction {
            "in" => Some(HeatRole::SlotIn(k)),
            "out" => Some(HeatRole::SlotOut(k)),
            _ => None,
        }
    }
}

/// Connectivity at a column (distillation, absorption, extraction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColumnRole {
    TopIn,
    TopOut,
    BottomIn,
    BottomOut,
}

impl ColumnRole {
    pub fn label(self) -> &'static str {
        match self {
            ColumnRole::TopIn => "tin",
            ColumnRole::TopOut => "tout",
            ColumnRole::BottomIn => "bin",
            ColumnRole::BottomOut => "bout",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "tin" => Some(ColumnRole::TopIn),
            "tout" => Some(ColumnRole::TopOut),
            "bin" => Some(ColumnRole::BottomIn),
            "bout" => Some(ColumnRole::BottomOut),
            _ => None,
        }
    }
}

/// Control-loop connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalRole {
    /// Drives the immediately following unit; doubles as a structural stream.
    NextUnit,
    /// Drives a non-adjacent unit; written with signal cycle markers.
    NonAdjacent,
}

impl SignalRole {
    pub fn label(self) -> &'static str {
        match self {
            SignalRole::NextUnit => "next_unitop",
            SignalRole::NonAdjacent => "not_next_unitop",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "next_unitop" => Some(SignalRole::NextUnit),
            "not_next_unitop" => Some(SignalRole::NonAdjacent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagCategory {
    Heat,
    Column,
    Signal,
}

impl TagCategory {
    pub fn name(self) -> &'static str {
        match self {
            TagCategory::Heat => "heat-exchange",
            TagCategory::Column => "column",
            TagCategory::Signal => "signal",
        }
    }
}

/// One tag of any category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Heat(HeatRole),
    Column(ColumnRole),
    Signal(SignalRole),
}

impl Tag {
    pub fn parse(label: &str) -> Option<Self> {
        if let Some(role) = HeatRole::parse(label) {
            return Some(Tag::Heat(role));
        }
        if let Some(role) = ColumnRole::parse(label) {
            return Some(Tag::Column(role));
        }
        SignalRole::parse(label).map(Tag::Signal)
    }

    pub fn category(self) -> TagCategory {
        match self {
            Tag::Heat(_) => TagCategory::Heat,
            Tag::Column(_) => TagCategory::Column,
            Tag::Signal(_) => TagCategory::Signal,
        }
    }

    pub fn label(self) -> String {
        match self {
            Tag::Heat(role) => role.label(),
            Tag::Column(role) => role.label().to_string(),
            Tag::Signal(role) => role.label().to_string(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// The tag set of one stream: at most one tag per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamTags {
    pub heat: Option<HeatRole>,
    pub column: Option<ColumnRole>,
    pub signal: Option<SignalRole>,
}

impl StreamTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse textual labels; two different labels in one category are ambiguous.
    pub fn from_labels<I, S>(labels: I) -> CodecResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags = Self::default();
        for label in labels {
            let label = label.as_ref();
            let tag = Tag::parse(label).ok_or_else(|| CodecError::UnknownTag {
                label: label.to_string(),
            })?;
            tags.insert(tag)?;
        }
        Ok(tags)
    }

    pub fn with(mut self, tag: Tag) -> CodecResult<Self> {
        self.insert(tag)?;
        Ok(self)
    }

    /// Add a tag. Re-adding the same tag is a no-op; a different tag in an
    /// occupied category is an `AmbiguousTag` error.
    pub fn insert(&mut self, tag: Tag) -> CodecResult<()> {
        let existing = self.get(tag.category());
        match existing {
            Some(current) if current == tag => Ok(()),
            Some(current) => Err(CodecError::AmbiguousTag {
                stream: String::new(),
                category: tag.category().name(),
                first: current.label(),
                second: tag.label(),
            }),
            None => {
                match tag {
                    Tag::Heat(role) => self.heat = Some(role),
                    Tag::Column(role) => self.column = Some(role),
                    Tag::Signal(role) => self.signal = Some(role),
                }
                Ok(())
            }
        }
    }

    pub fn get(&self, category: TagCategory) -> Option<Tag> {
        match category {
            TagCategory::Heat => self.heat.map(Tag::Heat),
            TagCategory::Column => self.column.map(Tag::Column),
            TagCategory::Signal => self.signal.map(Tag::Signal),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heat.is_none() && self.column.is_none() && self.signal.is_none()
    }

    /// Tags in notation order: heat, column, signal.
    pub fn iter(&self) -> impl Iterator<Item = Tag> {
        [
            self.heat.map(Tag::Heat),
            self.column.map(Tag::Column),
            self.signal.map(Tag::Signal),
        ]
        .into_iter()
        .flatten()
    }

    pub fn labels(&self) -> Vec<String> {
        self.iter().map(Tag::label).collect()
    }

    pub fn is_signal(&self) -> bool {
        self.signal.is_some()
    }

    pub fn is_non_adjacent_signal(&self) -> bool {
        self.signal == Some(SignalRole::NonAdjacent)
    }

    /// Sort key used to order otherwise indistinguishable parallel streams.
    pub fn sort_key(&self) -> String {
        self.labels().join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_into_categories() {
        let tags = StreamTags::from_labels(["hot_in", "tout", "next_unitop"]).unwrap();
        assert_eq!(tags.heat, Some(HeatRole::HotIn));
        assert_eq!(tags.column, Some(ColumnRole::TopOut));
        assert_eq!(tags.signal, Some(SignalRole::NextUnit));
        assert_eq!(tags.labels(), vec!["hot_in", "tout", "next_unitop"]);
    }

    #[test]
    fn numbered_slots() {
        assert_eq!(HeatRole::parse("2_in"), Some(HeatRole::SlotIn(2)));
        assert_eq!(HeatRole::parse("12_out"), Some(HeatRole::SlotOut(12)));
        assert_eq!(HeatRole::parse("x_in"), None);
        assert_eq!(HeatRole::SlotOut(3).label(), "3_out");
        assert!(HeatRole::SlotIn(3).is_inlet());
        assert!(!HeatRole::HotOut.is_inlet());
    }

    #[test]
    fn slot_ordering_puts_numbers_first() {
        let mut slots = vec![HeatSlot::Hot, HeatSlot::Numbered(2), HeatSlot::Cold, HeatSlot::Numbered(1)];
        slots.sort();
        assert_eq!(
            slots,
            vec![HeatSlot::Numbered(1), HeatSlot::Numbered(2), HeatSlot::Cold, HeatSlot::Hot]
        );
    }

    #[test]
    fn two_heat_roles_are_ambiguous() {
        let err = StreamTags::from_labels(["hot_in", "cold_in"]).unwrap_err();
        assert!(matches!(err, CodecError::AmbiguousTag { category: "heat-exchange", .. }));
    }

    #[test]
    fn repeated_tag_is_not_ambiguous() {
        let tags = StreamTags::from_labels(["bout", "bout"]).unwrap();
        assert_eq!(tags.column, Some(ColumnRole::BottomOut));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = StreamTags::from_labels(["sideways"]).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownTag {
                label: "sideways".into()
            }
        );
    }
}
