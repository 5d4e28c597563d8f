//! Structural path queries over a full tree snapshot.
//!
//! # Responsibility
//! - Parse path queries of the form `/Tag/Sub`, `//Tag`, `*` wildcards and
//!   one optional `[alias=value]` raw-field predicate per step.
//! - Evaluate against a snapshot and map every match eagerly.
//!
//! # Invariants
//! - Evaluation order is snapshot order; duplicates are collapsed keeping
//!   the first occurrence.
//! - Recycled subtrees never match, same as traversal.
//! - A query that matches nothing yields an empty result, never an error.

use crate::convert::ConverterRegistry;
use crate::map::{MapError, NodeMapper};
use crate::model::{NodeId, RawNode, Record};
use crate::schema::TypeRegistry;
use crate::store::{ContentStore, StoreError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

static STEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*|[A-Za-z_][A-Za-z0-9_]*)(?:\[([A-Za-z_][A-Za-z0-9_]*)=(?:'([^']*)'|([^\]]*))\])?$")
        .expect("valid query step regex")
});

/// Structural query failures.
#[derive(Debug)]
pub enum QueryError {
    /// Query string cannot be parsed.
    InvalidQuery { query: String, message: String },
    /// Mapping a matched node failed.
    Map(MapError),
    /// Snapshot could not be obtained.
    Store(StoreError),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid structural query `{query}`: {message}")
            }
            Self::Map(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Map(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<MapError> for QueryError {
    fn from(value: MapError) -> Self {
        Self::Map(value)
    }
}

impl From<StoreError> for QueryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    /// `//` step: match at any depth below the context.
    descendant: bool,
    /// Type tag to match, `*` for any.
    name: String,
    /// Optional raw-field equality predicate.
    predicate: Option<(String, String)>,
}

/// Evaluates structural queries against a snapshot of the whole tree.
pub struct QuerySelector<'a, S: ContentStore> {
    store: &'a S,
    mapper: NodeMapper<'a, S>,
}

impl<'a, S: ContentStore> QuerySelector<'a, S> {
    pub fn new(store: &'a S, types: &'a TypeRegistry, converters: &'a ConverterRegistry) -> Self {
        Self {
            store,
            mapper: NodeMapper::new(store, types, converters),
        }
    }

    /// Evaluates one query and eagerly maps every matching node.
    pub fn select(&self, query: &str) -> Result<Vec<Record>, QueryError> {
        let steps = parse_query(query)?;
        let snapshot = self.store.snapshot()?;

        let mut by_id: BTreeMap<NodeId, usize> = BTreeMap::new();
        let mut children: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();
        for (index, node) in snapshot.iter().enumerate() {
            by_id.insert(node.id, index);
            children.entry(node.parent_id).or_default().push(index);
        }

        // The virtual root (parent id 0) is the initial context.
        let mut context: Vec<NodeId> = vec![0];
        for step in &steps {
            let mut matched = Vec::new();
            let mut seen = BTreeSet::new();
            for id in &context {
                let candidates = if step.descendant {
                    descendants_of(*id, &children, &snapshot)
                } else {
                    children.get(id).cloned().unwrap_or_default()
                };
                for index in candidates {
                    let node = &snapshot[index];
                    if node.is_trashed() {
                        continue;
                    }
                    if step_matches(step, node) && seen.insert(node.id) {
                        matched.push(node.id);
                    }
                }
            }
            context = matched;
        }

        let mut records = Vec::new();
        for id in context {
            let index = by_id[&id];
            if let Some(record) = self.mapper.map_node(Some(&snapshot[index]))? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

fn descendants_of(
    id: NodeId,
    children: &BTreeMap<NodeId, Vec<usize>>,
    snapshot: &[RawNode],
) -> Vec<usize> {
    let mut result = Vec::new();
    let mut stack: Vec<usize> = children
        .get(&id)
        .map(|direct| direct.iter().rev().copied().collect())
        .unwrap_or_default();
    while let Some(index) = stack.pop() {
        result.push(index);
        if let Some(grandchildren) = children.get(&snapshot[index].id) {
            stack.extend(grandchildren.iter().rev().copied());
        }
    }
    result
}

fn step_matches(step: &Step, node: &RawNode) -> bool {
    if step.name != "*" && node.type_tag != step.name {
        return false;
    }
    match &step.predicate {
        None => true,
        Some((alias, value)) => node.field(alias) == Some(value.as_str()),
    }
}

fn parse_query(query: &str) -> Result<Vec<Step>, QueryError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(invalid(query, "query is empty"));
    }

    let mut rest = trimmed;
    let mut steps = Vec::new();
    while !rest.is_empty() {
        let descendant = if let Some(stripped) = rest.strip_prefix("//") {
            rest = stripped;
            true
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
            false
        } else if steps.is_empty() {
            false
        } else {
            return Err(invalid(query, "expected `/` between steps"));
        };

        let end = rest.find('/').unwrap_or(rest.len());
        let token = &rest[..end];
        rest = &rest[end..];
        if token.is_empty() {
            return Err(invalid(query, "empty step"));
        }

        let captures = STEP_RE
            .captures(token)
            .ok_or_else(|| invalid(query, "malformed step"))?;
        let name = captures[1].to_string();
        let predicate = captures.get(2).map(|alias| {
            let value = captures
                .get(3)
                .or_else(|| captures.get(4))
                .map(|value| value.as_str().to_string())
                .unwrap_or_default();
            (alias.as_str().to_string(), value)
        });

        steps.push(Step {
            descendant,
            name,
            predicate,
        });
    }

    Ok(steps)
}

fn invalid(query: &str, message: &str) -> QueryError {
    QueryError::InvalidQuery {
        query: query.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_query, Step};

    #[test]
    fn parses_plain_and_descendant_steps() {
        let steps = parse_query("/Page//News").unwrap();
        assert_eq!(
            steps,
            vec![
                Step {
                    descendant: false,
                    name: "Page".to_string(),
                    predicate: None,
                },
                Step {
                    descendant: true,
                    name: "News".to_string(),
                    predicate: None,
                },
            ]
        );
    }

    #[test]
    fn parses_predicates_with_and_without_quotes() {
        let steps = parse_query("//Page[title='Hello']").unwrap();
        assert_eq!(
            steps[0].predicate,
            Some(("title".to_string(), "Hello".to_string()))
        );

        let steps = parse_query("//Page[rank=7]").unwrap();
        assert_eq!(steps[0].predicate, Some(("rank".to_string(), "7".to_string())));
    }

    #[test]
    fn rejects_malformed_queries() {
        assert!(parse_query("").is_err());
        assert!(parse_query("/Page[").is_err());
        assert!(parse_query("//").is_err());
    }
}
