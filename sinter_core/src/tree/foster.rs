// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Foster parenting.
//!
//! Content that arrives while a table, row group or row is the insertion
//! point cannot live there. It is moved out and inserted immediately before
//! the nearest enclosing `<table>`, under the table's parent. The first
//! non-void element placed this way opens a *foster tree*: until it closes,
//! further content nests inside it rather than landing back in the table.

use crate::node::{NodeId, NodeStore, Tag};

/// The open end of a foster tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FosterCursor {
    /// Insertion point inside the foster tree.
    pub node: NodeId,
    /// The table the foster tree sits in front of.
    pub table: NodeId,
    /// The table's parent; foster content is its child and closing walks
    /// stop below it.
    pub table_parent: NodeId,
}

impl FosterCursor {
    /// Whether the cursor still describes the tree: all three nodes alive and
    /// the table still a child of `table_parent`.
    #[must_use]
    pub fn is_valid(&self, store: &NodeStore) -> bool {
        store.is_alive(self.node)
            && store.is_alive(self.table)
            && store.is_alive(self.table_parent)
            && store.parent(self.table) == Some(self.table_parent)
    }

    /// The cursor after popping to `node`, or `None` if that reached the
    /// table's parent.
    #[must_use]
    pub fn moved_to(self, node: NodeId) -> Option<Self> {
        (node != self.table_parent).then_some(Self { node, ..self })
    }
}

/// Finds where content misplaced under `context` goes: the nearest enclosing
/// table and that table's parent.
///
/// A row or row group with no table above it stands in for the table: the
/// outermost of the table contexts directly enclosing `context` is used.
/// Returns `None` when that node has no parent.
#[must_use]
pub fn foster_target(store: &NodeStore, context: NodeId) -> Option<(NodeId, NodeId)> {
    let mut outermost = context;
    for node in store.ancestors(context) {
        let tag = store.tag(node);
        if tag == Tag::Table {
            outermost = node;
            break;
        }
        if !tag.is_table_context() {
            break;
        }
        outermost = node;
    }
    let parent = store.parent(outermost)?;
    Some((outermost, parent))
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn target_is_table_and_its_parent() {
        let mut store = NodeStore::new();
        let body = store.create_element(Tag::Body, Vec::new(), 0);
        store.set_root(body);
        let table = store.create_element(Tag::Table, Vec::new(), 0);
        let tr = store.create_element(Tag::Tr, Vec::new(), 0);
        store.append_child(body, table);
        store.append_child(table, tr);
        assert_eq!(foster_target(&store, tr), Some((table, body)));
        assert_eq!(foster_target(&store, table), Some((table, body)));
    }

    #[test]
    fn bare_row_stands_in_for_table() {
        let mut store = NodeStore::new();
        let body = store.create_element(Tag::Body, Vec::new(), 0);
        store.set_root(body);
        let tbody = store.create_element(Tag::Tbody, Vec::new(), 0);
        let tr = store.create_element(Tag::Tr, Vec::new(), 0);
        store.append_child(body, tbody);
        store.append_child(tbody, tr);
        assert_eq!(foster_target(&store, tr), Some((tbody, body)));
    }

    #[test]
    fn no_target_without_parent() {
        let mut store = NodeStore::new();
        let tr = store.create_element(Tag::Tr, Vec::new(), 0);
        assert_eq!(foster_target(&store, tr), None);
    }

    #[test]
    fn cursor_invalidated_by_moving_table() {
        let mut store = NodeStore::new();
        let body = store.create_element(Tag::Body, Vec::new(), 0);
        store.set_root(body);
        let b = store.create_element(Tag::B, Vec::new(), 0);
        let table = store.create_element(Tag::Table, Vec::new(), 0);
        store.append_child(body, b);
        store.append_child(body, table);
        let cursor = FosterCursor {
            node: b,
            table,
            table_parent: body,
        };
        assert!(cursor.is_valid(&store));
        assert_eq!(cursor.moved_to(body), None);
        assert_eq!(cursor.moved_to(b), Some(cursor));
        store.detach(table);
        assert!(!cursor.is_valid(&store));
    }
}
