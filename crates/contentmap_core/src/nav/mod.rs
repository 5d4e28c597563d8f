//! Read-path orchestrators above the node mapper.

pub mod query;
pub mod tree;

pub use query::{QueryError, QuerySelector};
pub use tree::{Children, TreeNavigator};
