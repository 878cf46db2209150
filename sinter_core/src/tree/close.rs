// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Explicit and implicit closing.
//!
//! Both walks start at the insertion point and climb ancestors, stopping
//! before `bound` (`None` climbs to the top of the tree). They report how
//! many open nodes to pop, with the insertion point itself counting as one;
//! zero means nothing closes.

use crate::node::{NodeId, NodeStore, Tag};

use super::content::{CloseAction, ContentModel};

/// Number of open nodes a `</closing>` tag pops.
///
/// Returns the depth of the first ancestor-or-self of `from` whose tag is
/// `closing`. The walk gives up and returns 0 on reaching a table-level node
/// whose level is at least `closing`'s, so a stray close tag never escapes a
/// cell, row or table. `html`, `head` and `body` never close.
#[must_use]
pub fn explicit_close(store: &NodeStore, from: NodeId, closing: Tag, bound: Option<NodeId>) -> usize {
    if matches!(closing, Tag::Html | Tag::Head | Tag::Body) {
        return 0;
    }
    for (depth, node) in bounded_ancestors(store, from, bound).enumerate() {
        let tag = store.tag(node);
        if tag == closing {
            return depth + 1;
        }
        if tag.table_level() > 0 && closing.table_level() <= tag.table_level() {
            return 0;
        }
    }
    0
}

/// Number of open nodes an incoming `<incoming>` start tag pops.
///
/// Asks `model` about each ancestor-or-self of `from` in turn. Every
/// [`CloseAction::Close`] records its depth, [`CloseAction::Stop`] ends the
/// walk, and the deepest recorded closure wins.
#[must_use]
pub fn implicit_close(
    store: &NodeStore,
    model: &dyn ContentModel,
    from: NodeId,
    incoming: Tag,
    bound: Option<NodeId>,
) -> usize {
    let mut count = 0;
    for (depth, node) in bounded_ancestors(store, from, bound).enumerate() {
        match model.should_auto_close(store.tag(node), incoming) {
            CloseAction::Close => count = depth + 1,
            CloseAction::Stop => break,
            CloseAction::Continue => {}
        }
    }
    count
}

/// The node `count` levels above `from`.
///
/// Falls back to `from` if the walk would leave the tree.
#[must_use]
pub fn pop(store: &NodeStore, from: NodeId, count: usize) -> NodeId {
    store.ancestors(from).nth(count).unwrap_or(from)
}

fn bounded_ancestors(
    store: &NodeStore,
    from: NodeId,
    bound: Option<NodeId>,
) -> impl Iterator<Item = NodeId> + '_ {
    store
        .ancestors(from)
        .take_while(move |&node| Some(node) != bound)
}
