//! SQLite-backed reference content store.
//!
//! # Responsibility
//! - Implement the `ContentStore` contract over the migrated schema.
//! - Keep SQL details and ordering behavior inside the store boundary.
//!
//! # Invariants
//! - Child listing is deterministic: `sort_order ASC, id ASC`.
//! - `save_node` bumps `version` and `updated_at`.
//! - Soft delete reparents under the recycle bin and rewrites subtree paths.

use super::{ContentStore, StoreError, StoreResult};
use crate::db::migrations::latest_version;
use crate::model::{NodeId, RawNode, UserId, RECYCLE_BIN_NODE_ID};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use uuid::Uuid;

const NODE_COLUMNS: &str = "id,
    type_tag,
    parent_id,
    path,
    name,
    template,
    url,
    sort_order,
    created_at,
    updated_at,
    creator,
    writer,
    version";

/// SQLite-backed content store over a migrated connection.
pub struct SqliteContentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContentStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Declares the alias definitions of one node type.
    ///
    /// Idempotent; used by embedding code and tests to seed type schemas.
    pub fn define_type(&self, type_tag: &str, aliases: &[&str]) -> StoreResult<()> {
        for alias in aliases {
            self.conn.execute(
                "INSERT OR IGNORE INTO type_fields (type_tag, alias) VALUES (?1, ?2);",
                params![type_tag, alias],
            )?;
        }
        Ok(())
    }

    /// Stores the markup fragment backing one node/alias.
    pub fn set_markup(&self, id: NodeId, alias: &str, fragment: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO node_markup (node_id, alias, fragment) VALUES (?1, ?2, ?3)
             ON CONFLICT (node_id, alias) DO UPDATE SET fragment = excluded.fragment;",
            params![id, alias, fragment],
        )?;
        Ok(())
    }
}

impl ContentStore for SqliteContentStore<'_> {
    fn get_node(&self, id: NodeId) -> StoreResult<Option<RawNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1;"
        ))?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut node = parse_node_row(row)?;
        node.fields = load_node_fields(self.conn, id)?;
        Ok(Some(node))
    }

    fn create_node(
        &self,
        name: &str,
        parent_id: NodeId,
        type_tag: &str,
        user: UserId,
    ) -> StoreResult<NodeId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let parent_path: Option<String> = tx
            .query_row(
                "SELECT path FROM nodes WHERE id = ?1;",
                [parent_id],
                |row| row.get(0),
            )
            .optional()?;
        let sort_order = next_sort_order(&tx, parent_id)?;

        tx.execute(
            "INSERT INTO nodes (type_tag, parent_id, path, name, sort_order, creator, writer)
             VALUES (?1, ?2, '', ?3, ?4, ?5, ?5);",
            params![type_tag, parent_id, name, sort_order, user.to_string()],
        )?;
        let id = tx.last_insert_rowid();

        let path = match parent_path {
            Some(parent_path) => format!("{parent_path}{id},"),
            None => format!(",{id},"),
        };
        tx.execute(
            "UPDATE nodes SET path = ?2 WHERE id = ?1;",
            params![id, path],
        )?;

        tx.commit()?;
        Ok(id)
    }

    fn set_field(&self, id: NodeId, alias: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO node_fields (node_id, alias, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (node_id, alias) DO UPDATE SET value = excluded.value;",
            params![id, alias, value],
        )?;
        Ok(())
    }

    fn save_node(&self, id: NodeId, name: &str, user: UserId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE nodes
             SET name = ?2,
                 writer = ?3,
                 version = version + 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, name, user.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NodeNotFound(id));
        }
        Ok(())
    }

    fn publish_node(&self, id: NodeId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE nodes
             SET published = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(StoreError::NodeNotFound(id));
        }
        Ok(())
    }

    fn delete_node(&self, id: NodeId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "WITH RECURSIVE subtree(id) AS (
                SELECT id FROM nodes WHERE id = ?1
                UNION ALL
                SELECT child.id
                FROM nodes child
                INNER JOIN subtree parent ON child.parent_id = parent.id
            )
            DELETE FROM nodes WHERE id IN (SELECT id FROM subtree);",
            [id],
        )?;
        if changed == 0 {
            return Err(StoreError::NodeNotFound(id));
        }
        Ok(())
    }

    fn move_to_recycle_bin(&self, id: NodeId) -> StoreResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let old_path: Option<String> = tx
            .query_row("SELECT path FROM nodes WHERE id = ?1;", [id], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(old_path) = old_path else {
            return Err(StoreError::NodeNotFound(id));
        };

        let bin_path: String = tx.query_row(
            "SELECT path FROM nodes WHERE id = ?1;",
            [RECYCLE_BIN_NODE_ID],
            |row| row.get(0),
        )?;
        let new_path = format!("{bin_path}{id},");
        let sort_order = next_sort_order(&tx, RECYCLE_BIN_NODE_ID)?;

        tx.execute(
            "UPDATE nodes
             SET parent_id = ?2,
                 path = ?3,
                 sort_order = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, RECYCLE_BIN_NODE_ID, new_path, sort_order],
        )?;

        // Rewrite descendant paths onto the new prefix.
        tx.execute(
            "UPDATE nodes
             SET path = ?2 || substr(path, ?3),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE path LIKE ?1 || '%'
               AND id != ?4;",
            params![
                old_path.as_str(),
                new_path.as_str(),
                old_path.len() as i64 + 1,
                id
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn type_field_aliases(&self, type_tag: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT alias FROM type_fields WHERE type_tag = ?1 ORDER BY alias ASC;")?;
        let mut rows = stmt.query([type_tag])?;
        let mut aliases = Vec::new();
        while let Some(row) = rows.next()? {
            aliases.push(row.get(0)?);
        }
        Ok(aliases)
    }

    fn children_of(&self, id: NodeId) -> StoreResult<Vec<RawNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NODE_COLUMNS}
             FROM nodes
             WHERE parent_id = ?1
             ORDER BY sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([id])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row)?);
        }
        for node in &mut nodes {
            node.fields = load_node_fields(self.conn, node.id)?;
        }
        Ok(nodes)
    }

    fn parent_of(&self, node: &RawNode) -> StoreResult<Option<RawNode>> {
        if node.parent_id == 0 {
            return Ok(None);
        }
        self.get_node(node.parent_id)
    }

    fn snapshot(&self) -> StoreResult<Vec<RawNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NODE_COLUMNS}
             FROM nodes
             ORDER BY parent_id ASC, sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row)?);
        }

        let mut fields_by_node: BTreeMap<NodeId, BTreeMap<String, String>> = BTreeMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT node_id, alias, value FROM node_fields;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let node_id: NodeId = row.get(0)?;
            let alias: String = row.get(1)?;
            let value: String = row.get(2)?;
            fields_by_node.entry(node_id).or_default().insert(alias, value);
        }
        for node in &mut nodes {
            if let Some(fields) = fields_by_node.remove(&node.id) {
                node.fields = fields;
            }
        }
        Ok(nodes)
    }

    fn markup_fragment(&self, id: NodeId, alias: &str) -> StoreResult<Option<String>> {
        let fragment = self
            .conn
            .query_row(
                "SELECT fragment FROM node_markup WHERE node_id = ?1 AND alias = ?2;",
                params![id, alias],
                |row| row.get(0),
            )
            .optional()?;
        Ok(fragment)
    }
}

fn load_node_fields(conn: &Connection, id: NodeId) -> StoreResult<BTreeMap<String, String>> {
    let mut stmt =
        conn.prepare("SELECT alias, value FROM node_fields WHERE node_id = ?1;")?;
    let mut rows = stmt.query([id])?;
    let mut fields = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let alias: String = row.get(0)?;
        let value: String = row.get(1)?;
        fields.insert(alias, value);
    }
    Ok(fields)
}

fn next_sort_order(conn: &Connection, parent_id: NodeId) -> StoreResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM nodes WHERE parent_id = ?1;",
        [parent_id],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn parse_node_row(row: &Row<'_>) -> StoreResult<RawNode> {
    let creator_text: String = row.get("creator")?;
    let writer_text: String = row.get("writer")?;
    Ok(RawNode {
        id: row.get("id")?,
        type_tag: row.get("type_tag")?,
        parent_id: row.get("parent_id")?,
        path: row.get("path")?,
        name: row.get("name")?,
        template: row.get("template")?,
        url: row.get("url")?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        creator: parse_user(&creator_text, "nodes.creator")?,
        writer: parse_user(&writer_text, "nodes.writer")?,
        version: row.get("version")?,
        fields: BTreeMap::new(),
    })
}

fn parse_user(value: &str, column: &'static str) -> StoreResult<UserId> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["nodes", "node_fields", "type_fields", "node_markup"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }

    Ok(())
}
