//! fc-graph: flowsheet graph model for flowcode.
//!
//! Provides:
//! - Core graph data structures (Unit, Stream, FlowsheetGraph)
//! - Incremental builder with validation (`add_unit`, `add_stream`)
//! - Structural queries used by the codec (weak components, reachable sets,
//!   type-level signatures)
//!
//! # Example
//!
//! ```
//! use fc_graph::FlowsheetBuilder;
//!
//! let mut builder = FlowsheetBuilder::new();
//! builder.add_unit("raw-1");
//! builder.add_unit("pump-1");
//! builder.add_stream("raw-1", "pump-1", &[] as &[&str]);
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.unit_count(), 2);
//! assert_eq!(graph.stream_count(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod structure;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::FlowsheetBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{Attrs, FlowsheetGraph, Stream, StreamIx, StreamRef, Unit, UnitIx};
pub use structure::Structure;
