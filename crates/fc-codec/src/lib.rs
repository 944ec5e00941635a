//! fc-codec: flowsheet graph to notation and back.
//!
//! Provides:
//! - Canonical unit ranking (Morgan-style refinement plus tie-break rules)
//! - Heat-integration split before encoding and merge after decoding
//! - Depth-first encoder producing branch, cycle and signal-marker notation
//! - Tokenizer, instance renumbering and decoder
//! - Control-structure removal and rayon-backed batch helpers
//!
//! # Example
//!
//! ```
//! use fc_codec::{DecodeOptions, EncodeOptions, decode, encode};
//!
//! let decoded = decode("(raw)(pump)(product)", &DecodeOptions::default()).unwrap();
//! let encoded = encode(&decoded.graph, &EncodeOptions::default()).unwrap();
//!
//! assert_eq!(encoded.notation, "(raw-1)(pump-1)(product-1)");
//! assert_eq!(encoded.generalized, "(raw)(pump)(product)");
//! ```

pub mod batch;
pub mod control;
pub mod decode;
pub mod encode;
pub mod heat;
pub mod lexer;
pub mod options;
pub mod rank;
pub mod renumber;
pub mod token;

pub use batch::{decode_batch, encode_batch, encode_variants};
pub use control::{material_notation, strip_control, strip_notation};
pub use decode::{Decoded, decode, decode_tokens};
pub use encode::{Encoded, encode};
pub use heat::{MergeOutcome, SplitOutcome, merge_heat_integration, split_heat_integration};
pub use lexer::tokenize;
pub use options::{DecodeOptions, EncodeOptions, NotationVersion, Traversal};
pub use rank::{Ranks, rank};
pub use renumber::{NamingContext, renumber, renumber_with};
pub use token::{CycleRef, MarkerSide, Namespace, Token, render};
