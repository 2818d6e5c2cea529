//! Parser for the indentation-delimited telemetry format carried in the
//! `result` field of simulator responses.
//!
//! ```text
//! 16785664:
//!     Name: F-15C
//!     LatLongAlt:
//!         Lat: 41.5
//! ```

mod errors;
mod parser;
mod render;
mod value;

pub use errors::TreeDiagnostic;
pub use parser::{TAB_WIDTH, TreeDocument, parse_tree};
pub use render::render_tree;
pub use value::{ParsedObject, Value, infer_value};
pub(crate) use value::numeric_literal;

const TREE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::tree");
