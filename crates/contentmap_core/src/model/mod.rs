//! Core data model: raw store nodes, typed values and mapped records.

pub mod node;
pub mod record;
pub mod value;

pub use node::{NodeId, RawNode, UserId, RECYCLE_BIN_NODE_ID};
pub use record::{Record, SystemFields};
pub use value::FieldValue;
