//! Write-back path from typed records onto store nodes.

pub mod content_writer;

pub use content_writer::{ContentWriter, ValidationError, WriteError};
