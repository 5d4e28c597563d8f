//! Raw store node read model.
//!
//! # Responsibility
//! - Mirror one content-store node exactly as the store exposes it.
//! - Provide path helpers for soft-deletion detection.
//!
//! # Invariants
//! - `id == 0` marks an unresolved node, never a persisted one.
//! - `path` is a comma-delimited ancestor-id chain, e.g. `",1,10,42,"`.
//! - Field aliases are unique within one node.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Store-assigned node identifier. `0` means "not persisted / unresolved".
pub type NodeId = i64;

/// Identity of the user that created or last wrote a node.
pub type UserId = Uuid;

/// Well-known container id marking logically deleted subtrees.
pub const RECYCLE_BIN_NODE_ID: NodeId = -20;

/// One content-store node as the store hands it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    /// Store-assigned id.
    pub id: NodeId,
    /// Store-side discriminator selecting the declared target type.
    pub type_tag: String,
    /// Parent node id, `0` when none or unresolvable.
    pub parent_id: NodeId,
    /// Delimited ancestor-id chain including this node's own id.
    pub path: String,
    /// User-facing node name.
    pub name: String,
    /// Template identifier, empty when the store assigns none.
    pub template: String,
    /// Public url, empty when the store assigns none.
    pub url: String,
    /// Stable child order key within one parent.
    pub sort_order: i64,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
    /// Identity of the creating user.
    pub creator: UserId,
    /// Identity of the last writing user.
    pub writer: UserId,
    /// Store version counter, bumped on every save.
    pub version: i64,
    /// Raw field values keyed by alias.
    pub fields: BTreeMap<String, String>,
}

impl RawNode {
    /// Returns the raw value for one alias, `None` when the alias is absent.
    pub fn field(&self, alias: &str) -> Option<&str> {
        self.fields.get(alias).map(String::as_str)
    }

    /// Returns whether `id` appears anywhere in this node's ancestor path.
    pub fn path_contains(&self, id: NodeId) -> bool {
        self.path
            .split(',')
            .filter(|segment| !segment.is_empty())
            .any(|segment| segment.parse::<NodeId>() == Ok(id))
    }

    /// Returns whether this node sits inside the recycle bin.
    pub fn is_trashed(&self) -> bool {
        self.path_contains(RECYCLE_BIN_NODE_ID)
    }

    /// Returns whether this node can be mapped at all.
    ///
    /// A node with id `0` or an empty type tag is treated as unresolved.
    pub fn is_resolvable(&self) -> bool {
        self.id != 0 && !self.type_tag.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{RawNode, UserId, RECYCLE_BIN_NODE_ID};
    use std::collections::BTreeMap;

    fn node_with_path(path: &str) -> RawNode {
        RawNode {
            id: 42,
            type_tag: "Page".to_string(),
            parent_id: 10,
            path: path.to_string(),
            name: "page".to_string(),
            template: String::new(),
            url: String::new(),
            sort_order: 0,
            created_at: 0,
            updated_at: 0,
            creator: UserId::nil(),
            writer: UserId::nil(),
            version: 1,
            fields: BTreeMap::new(),
        }
    }

    #[test]
    fn path_contains_matches_whole_segments_only() {
        let node = node_with_path(",1,10,42,");
        assert!(node.path_contains(10));
        assert!(!node.path_contains(4));
        assert!(!node.path_contains(2));
    }

    #[test]
    fn trash_detection_uses_recycle_bin_segment() {
        assert!(node_with_path(",1,10,-20,43,").is_trashed());
        assert!(!node_with_path(",1,10,43,").is_trashed());
        assert_eq!(RECYCLE_BIN_NODE_ID, -20);
    }
}
