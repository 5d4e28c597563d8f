//! Lazy tree traversal and filtering.
//!
//! # Responsibility
//! - Enumerate direct children or the full descendant set of one parent.
//! - Exclude recycled nodes, apply the optional type-tag filter, and map
//!   survivors into typed records.
//!
//! # Invariants
//! - An unresolved parent yields an empty sequence, never an error.
//! - Deep traversal fetches one child listing per visited node; the subtree
//!   is never materialized up front.
//! - Nodes that map to no instance are skipped silently.

use crate::convert::ConverterRegistry;
use crate::map::{MapError, NodeMapper};
use crate::model::{NodeId, RawNode, Record};
use crate::schema::TypeRegistry;
use crate::store::ContentStore;
use log::debug;

/// Traverses the content tree from a parent id.
pub struct TreeNavigator<'a, S: ContentStore> {
    store: &'a S,
    mapper: NodeMapper<'a, S>,
}

impl<'a, S: ContentStore> TreeNavigator<'a, S> {
    pub fn new(store: &'a S, types: &'a TypeRegistry, converters: &'a ConverterRegistry) -> Self {
        Self {
            store,
            mapper: NodeMapper::new(store, types, converters),
        }
    }

    /// Returns a lazily produced, finite, non-restartable child sequence.
    ///
    /// `deep` selects the full descendant set in pre-order; `type_tag`
    /// additionally filters by store type tag. Consumption drives further
    /// store queries, so abandoning the iterator early performs fewer
    /// lookups.
    pub fn children(
        &self,
        parent_id: NodeId,
        deep: bool,
        type_tag: Option<&str>,
    ) -> Children<'a, S> {
        let mut pending = Vec::new();
        let mut init_error = None;

        match self.store.get_node(parent_id) {
            Ok(Some(_)) => match self.store.children_of(parent_id) {
                Ok(nodes) => pending.extend(nodes.into_iter().rev()),
                Err(err) => init_error = Some(MapError::Store(err)),
            },
            Ok(None) => {
                debug!(
                    "event=tree_children module=nav status=empty parent_id={parent_id} reason=unresolved_parent"
                );
            }
            Err(err) => init_error = Some(MapError::Store(err)),
        }

        Children {
            store: self.store,
            mapper: self.mapper,
            pending,
            init_error,
            deep,
            filter: type_tag.map(str::to_string),
        }
    }
}

/// Lazily evaluated child sequence in pre-order.
pub struct Children<'a, S: ContentStore> {
    store: &'a S,
    mapper: NodeMapper<'a, S>,
    /// Stack of nodes not yet yielded; top is the next candidate.
    pending: Vec<RawNode>,
    init_error: Option<MapError>,
    deep: bool,
    filter: Option<String>,
}

impl<S: ContentStore> Iterator for Children<'_, S> {
    type Item = Result<Record, MapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.init_error.take() {
            self.pending.clear();
            return Some(Err(err));
        }

        loop {
            let node = self.pending.pop()?;

            // Recycled subtrees are invisible to traversal.
            if node.is_trashed() {
                continue;
            }

            if self.deep {
                match self.store.children_of(node.id) {
                    Ok(children) => self.pending.extend(children.into_iter().rev()),
                    Err(err) => {
                        self.pending.clear();
                        return Some(Err(MapError::Store(err)));
                    }
                }
            }

            if let Some(filter) = &self.filter {
                if node.type_tag != *filter {
                    continue;
                }
            }

            match self.mapper.map_node(Some(&node)) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(err) => {
                    self.pending.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}
