//! fc-core: stable foundation for flowcode.
//!
//! Contains:
//! - error (the codec error taxonomy shared by every crate)
//! - ids (unit identifiers: type, instance number, stream/control suffix)
//! - tags (closed stream-tag vocabulary, one enum per category)
//! - warning (non-fatal degraded split/merge reports)

pub mod error;
pub mod ids;
pub mod tags;
pub mod warning;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CodecError, CodecResult};
pub use ids::{CONTROL_KIND, UnitId, UnitSuffix};
pub use tags::{ColumnRole, HeatRole, HeatSlot, SignalRole, StreamTags, Tag, TagCategory};
pub use warning::{DegradedMerge, MergeStage};
