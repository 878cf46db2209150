// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, ordering and the
//! orphan registry.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use super::id::{INVALID, Lifecycle, NodeId};
use super::tag::{Tag, TagTable};
use super::traverse::{Ancestors, Children, Descendants};

/// A single element attribute.
///
/// Names are stored ASCII-lowercased; values are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Attribute value (empty for bare attributes).
    pub value: String,
}

impl Attribute {
    /// Creates an attribute, lowercasing `name`.
    #[must_use]
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug)]
enum Payload {
    Element(Vec<Attribute>),
    Text(String),
}

/// Struct-of-arrays storage for every node of a document.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; destroyed slots are recycled through a free list and the
/// generation counter makes old handles fail validation.
///
/// A store holds one document tree (rooted at [`root`](Self::root)) plus any
/// number of detached subtrees whose roots are listed in the orphan registry.
/// Every node is in exactly one of those trees.
#[derive(Debug)]
pub struct NodeStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Node data --
    tag: Vec<Tag>,
    payload: Vec<Payload>,
    offset: Vec<usize>,
    lifecycle: Vec<Lifecycle>,

    // -- Document order --
    sequence: Vec<u32>,
    sequence_ok: bool,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    free_list: Vec<u32>,
    len: u32,

    // -- Roots --
    root: u32,
    orphans: Vec<u32>,

    tags: TagTable,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Creates an empty store with no document root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            tag: Vec::new(),
            payload: Vec::new(),
            offset: Vec::new(),
            lifecycle: Vec::new(),
            sequence: Vec::new(),
            sequence_ok: false,
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            root: INVALID,
            orphans: Vec::new(),
            tags: TagTable::new(),
        }
    }

    // -- Allocation API --

    /// Creates a detached element.
    ///
    /// The new node is an orphan root until it is attached somewhere or made
    /// the document root.
    pub fn create_element(&mut self, tag: Tag, attrs: Vec<Attribute>, offset: usize) -> NodeId {
        assert!(tag != Tag::Text, "elements cannot carry the text tag");
        self.allocate(tag, Payload::Element(attrs), offset)
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>, offset: usize) -> NodeId {
        self.allocate(Tag::Text, Payload::Text(text.into()), offset)
    }

    /// Destroys `id` and its whole subtree, freeing the slots for reuse.
    ///
    /// `on_discard` is called for every doomed node in pre-order before any
    /// link is severed, so collaborators can drop cached style and geometry
    /// while the subtree is still intact.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy(&mut self, id: NodeId, mut on_discard: impl FnMut(&Self, NodeId)) {
        self.validate(id);
        let doomed: Vec<u32> = self.descendants(id).map(|n| n.idx).collect();
        for &idx in &doomed {
            on_discard(self, self.id_at(idx));
        }

        let idx = id.idx;
        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        } else if self.root == idx {
            self.root = INVALID;
        } else {
            self.orphans.retain(|&o| o != idx);
        }

        for &idx in doomed.iter().rev() {
            self.free_slot(idx);
        }
        self.sequence_ok = false;
    }

    /// Returns whether the handle refers to a node that has not been destroyed.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.lifecycle[id.idx as usize] != Lifecycle::Destroyed
    }

    /// Number of nodes currently alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Document root and orphan registry --

    /// Returns the document root, if one has been installed.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        (self.root != INVALID).then(|| self.id_at(self.root))
    }

    /// Makes a detached node the document root.
    ///
    /// # Panics
    ///
    /// Panics if a root is already installed, the handle is stale, or the
    /// node has a parent.
    pub fn set_root(&mut self, id: NodeId) {
        self.validate(id);
        assert!(self.root == INVALID, "document root already installed");
        assert!(
            self.parent[id.idx as usize] == INVALID,
            "document root cannot have a parent"
        );
        self.orphans.retain(|&o| o != id.idx);
        self.lifecycle[id.idx as usize] = Lifecycle::Live;
        self.root = id.idx;
        self.sequence_ok = false;
    }

    /// Iterates the orphan registry in registration order.
    pub fn orphans(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.orphans.iter().map(|&idx| self.id_at(idx))
    }

    /// Returns whether `id` is outside the document tree, either as an orphan
    /// root or somewhere inside an orphaned subtree.
    #[must_use]
    pub fn is_orphan(&self, id: NodeId) -> bool {
        self.validate(id);
        self.tree_root_idx(id.idx) != self.root
    }

    /// Returns the lifecycle state of a node's slot.
    ///
    /// Only parentless subtree roots are [`Lifecycle::Orphan`]; nodes inside
    /// a detached subtree report [`Lifecycle::Live`] while
    /// [`is_orphan`](Self::is_orphan) is true for them.
    #[must_use]
    pub fn lifecycle(&self, id: NodeId) -> Lifecycle {
        self.validate(id);
        self.lifecycle[id.idx as usize]
    }

    // -- Node data --

    /// Returns the tag of a node. Text nodes report [`Tag::Text`].
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Tag {
        self.validate(id);
        self.tag[id.idx as usize]
    }

    /// Returns the name of a node's tag.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> &str {
        self.tags.name(self.tag(id))
    }

    /// Resolves a tag name, interning custom names.
    pub fn intern_tag(&mut self, name: &str) -> Tag {
        self.tags.intern(name)
    }

    /// The custom tag interning table.
    #[must_use]
    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    /// Returns the source offset recorded when the node was created.
    #[must_use]
    pub fn offset(&self, id: NodeId) -> usize {
        self.validate(id);
        self.offset[id.idx as usize]
    }

    /// Returns the payload of a text node, or `None` for elements.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.validate(id);
        match &self.payload[id.idx as usize] {
            Payload::Text(text) => Some(text),
            Payload::Element(_) => None,
        }
    }

    /// Appends to the payload of a text node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is an element.
    pub fn push_text(&mut self, id: NodeId, more: &str) {
        self.validate(id);
        match &mut self.payload[id.idx as usize] {
            Payload::Text(text) => text.push_str(more),
            Payload::Element(_) => panic!("push_text on element {id:?}"),
        }
    }

    /// Returns the attributes of an element (empty for text nodes).
    #[must_use]
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.validate(id);
        match &self.payload[id.idx as usize] {
            Payload::Element(attrs) => attrs,
            Payload::Text(_) => &[],
        }
    }

    /// Looks up an attribute value by name, ignoring ASCII case.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Sets an attribute, returning the previous value.
    ///
    /// # Panics
    ///
    /// Panics if `id` is a text node.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Option<String> {
        let attrs = self.element_attrs_mut(id);
        let value = value.into();
        if let Some(existing) = attrs.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
            return Some(core::mem::replace(&mut existing.value, value));
        }
        attrs.push(Attribute::new(name, value));
        None
    }

    /// Removes an attribute, returning its value.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        let attrs = self.element_attrs_mut(id);
        let pos = attrs.iter().position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(attrs.remove(pos).value)
    }

    /// Adds every attribute in `extra` that `id` does not already carry.
    ///
    /// Returns whether anything was added.
    pub fn merge_attrs(&mut self, id: NodeId, extra: Vec<Attribute>) -> bool {
        let attrs = self.element_attrs_mut(id);
        let before = attrs.len();
        for attr in extra {
            if !attrs.iter().any(|a| a.name == attr.name) {
                attrs.push(attr);
            }
        }
        attrs.len() != before
    }

    // -- Topology queries --

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.link(self.parent[id.idx as usize])
    }

    /// Returns the first child of a node, if any.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.link(self.first_child[id.idx as usize])
    }

    /// Returns the last child of a node, if any.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.link(self.last_child[id.idx as usize])
    }

    /// Returns the next sibling of a node, if any.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.link(self.next_sibling[id.idx as usize])
    }

    /// Returns the previous sibling of a node, if any.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.link(self.prev_sibling[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator from `id` up to the root of its tree.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, id.idx)
    }

    /// Returns a pre-order iterator over the subtree rooted at `id`.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        self.validate(id);
        Descendants::new(self, id.idx)
    }

    /// Position of `id` among its siblings.
    #[must_use]
    pub fn child_index(&self, id: NodeId) -> usize {
        self.validate(id);
        let mut count = 0;
        let mut prev = self.prev_sibling[id.idx as usize];
        while prev != INVALID {
            count += 1;
            prev = self.prev_sibling[prev as usize];
        }
        count
    }

    // -- Topology mutation --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, `parent` is a text node, `child`
    /// already has a parent, `child` is the document root, or `parent` lies
    /// inside `child`'s subtree.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.check_attach(parent, child);
        let p = parent.idx;
        let c = child.idx;

        let last = self.last_child[p as usize];
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = last;
        self.next_sibling[c as usize] = INVALID;
        if last == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[last as usize] = c;
        }
        self.last_child[p as usize] = c;

        self.adopt(c);
    }

    /// Inserts `child` immediately before `reference` under the same parent.
    ///
    /// # Panics
    ///
    /// Panics under the conditions of [`append_child`](Self::append_child),
    /// or if `reference` has no parent.
    pub fn insert_before(&mut self, child: NodeId, reference: NodeId) {
        self.validate(reference);
        let s = reference.idx;
        let p = self.parent[s as usize];
        assert!(p != INVALID, "reference node has no parent");
        self.check_attach(self.id_at(p), child);
        let c = child.idx;

        let prev = self.prev_sibling[s as usize];
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = prev;
        if prev == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[prev as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.adopt(c);
    }

    /// Inserts `child` immediately after `reference` under the same parent.
    ///
    /// # Panics
    ///
    /// Panics under the conditions of [`insert_before`](Self::insert_before).
    pub fn insert_after(&mut self, child: NodeId, reference: NodeId) {
        self.validate(reference);
        match self.next_sibling[reference.idx as usize] {
            INVALID => {
                let p = self.parent[reference.idx as usize];
                assert!(p != INVALID, "reference node has no parent");
                self.append_child(self.id_at(p), child);
            }
            next => self.insert_before(child, self.id_at(next)),
        }
    }

    /// Detaches `id` from its parent and registers it as an orphan root.
    ///
    /// Returns the former parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn detach(&mut self, id: NodeId) -> NodeId {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        assert!(p != INVALID, "node has no parent");
        self.unlink_from_parent(id.idx);
        self.lifecycle[id.idx as usize] = Lifecycle::Orphan;
        self.orphans.push(id.idx);
        self.sequence_ok = false;
        self.id_at(p)
    }

    // -- Document order --

    /// Whether sequence numbers reflect the current structure.
    #[must_use]
    pub fn sequence_ok(&self) -> bool {
        self.sequence_ok
    }

    /// Renumbers every node in document order if any structural mutation
    /// happened since the last numbering.
    ///
    /// The document tree is numbered first, then each orphan subtree in
    /// registry order.
    pub fn sequence(&mut self) {
        if self.sequence_ok {
            return;
        }
        let mut next = 0_u32;
        let roots: Vec<u32> = core::iter::once(self.root)
            .filter(|&r| r != INVALID)
            .chain(self.orphans.iter().copied())
            .collect();
        for root in roots {
            let mut idx = root;
            while idx != INVALID {
                self.sequence[idx as usize] = next;
                next += 1;
                idx = self.preorder_successor(idx, root);
            }
        }
        self.sequence_ok = true;
    }

    /// Returns the document-order number of `id`, renumbering first if stale.
    pub fn sequence_of(&mut self, id: NodeId) -> u32 {
        self.validate(id);
        self.sequence();
        self.sequence[id.idx as usize]
    }

    /// Orders two nodes by document position.
    pub fn compare_document_order(&mut self, a: NodeId, b: NodeId) -> Ordering {
        let sa = self.sequence_of(a);
        let sb = self.sequence_of(b);
        sa.cmp(&sb)
    }

    /// Finds a node that covers both `candidate` and `node`.
    ///
    /// With no candidate, `node` itself is returned. Otherwise each
    /// ancestor-or-self `A` of `candidate` is tried in turn against the
    /// ancestors-or-self `B` of `node`: `B == A` returns `A`, and `B`
    /// sharing `A`'s parent returns that parent. The result is an
    /// ancestor-or-self of both inputs but not necessarily the lowest one.
    ///
    /// Nodes in disjoint trees have no common ancestor; the topmost ancestor
    /// of `candidate` is returned in that case.
    #[must_use]
    pub fn upgrade_root(&self, candidate: Option<NodeId>, node: NodeId) -> NodeId {
        self.validate(node);
        let Some(candidate) = candidate else {
            return node;
        };
        self.validate(candidate);

        let mut a = candidate.idx;
        let mut top = a;
        while a != INVALID {
            let parent_a = self.parent[a as usize];
            let mut b = node.idx;
            while b != INVALID {
                if b == a {
                    return self.id_at(a);
                }
                let parent_b = self.parent[b as usize];
                if parent_a != INVALID && parent_b == parent_a {
                    return self.id_at(parent_a);
                }
                b = parent_b;
            }
            top = a;
            a = parent_a;
        }
        self.id_at(top)
    }

    // -- Consistency --

    /// Walks every slot and panics on the first broken structural invariant.
    ///
    /// Checks parent/child/sibling link symmetry, that text nodes are leaves,
    /// that orphan roots and parented nodes are disjoint, and that every live
    /// node belongs to exactly one tree.
    pub fn check_invariants(&self) {
        let mut owners = 0_usize;
        for idx in 0..self.len {
            let i = idx as usize;
            if self.lifecycle[i] == Lifecycle::Destroyed {
                assert!(
                    self.parent[i] == INVALID && self.first_child[i] == INVALID,
                    "tree invariant violated: destroyed slot {idx} still linked"
                );
                continue;
            }
            let p = self.parent[i];
            let registered = self.orphans.contains(&idx);
            if p == INVALID {
                owners += 1;
                assert!(
                    (idx == self.root) != registered,
                    "tree invariant violated: parentless node {idx} must be the root or a single orphan"
                );
                let expected = if registered { Lifecycle::Orphan } else { Lifecycle::Live };
                assert!(
                    self.lifecycle[i] == expected,
                    "tree invariant violated: node {idx} lifecycle {:?}",
                    self.lifecycle[i]
                );
            } else {
                assert!(
                    !registered,
                    "tree invariant violated: node {idx} is both parented and orphaned"
                );
                assert!(
                    self.lifecycle[p as usize] != Lifecycle::Destroyed
                        && self.tag[p as usize] != Tag::Text,
                    "tree invariant violated: node {idx} has invalid parent {p}"
                );
                assert!(
                    self.children_raw(p).any(|c| c == idx),
                    "tree invariant violated: node {idx} missing from parent {p}"
                );
            }
            if self.tag[i] == Tag::Text {
                assert!(
                    self.first_child[i] == INVALID,
                    "tree invariant violated: text node {idx} has children"
                );
            }
            let mut prev = INVALID;
            for c in self.children_raw(idx) {
                assert!(
                    self.parent[c as usize] == idx && self.prev_sibling[c as usize] == prev,
                    "tree invariant violated: sibling links of {c} under {idx}"
                );
                prev = c;
            }
            assert!(
                self.last_child[i] == prev,
                "tree invariant violated: last child of {idx}"
            );
        }
        assert!(
            owners == self.orphans.len() + usize::from(self.root != INVALID),
            "tree invariant violated: orphan registry out of sync"
        );
    }

    // -- Internal helpers --

    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn link(&self, idx: u32) -> Option<NodeId> {
        (idx != INVALID).then(|| self.id_at(idx))
    }

    /// Next node after `idx` in a pre-order walk confined to `root`'s subtree.
    pub(crate) fn preorder_successor(&self, idx: u32, root: u32) -> u32 {
        let first = self.first_child[idx as usize];
        if first != INVALID {
            return first;
        }
        let mut n = idx;
        while n != root {
            let next = self.next_sibling[n as usize];
            if next != INVALID {
                return next;
            }
            n = self.parent[n as usize];
        }
        INVALID
    }

    fn children_raw(&self, idx: u32) -> impl Iterator<Item = u32> + '_ {
        core::iter::successors(
            Some(self.first_child[idx as usize]).filter(|&c| c != INVALID),
            |&c| Some(self.next_sibling[c as usize]).filter(|&n| n != INVALID),
        )
    }

    fn tree_root_idx(&self, mut idx: u32) -> u32 {
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
        }
        idx
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn element_attrs_mut(&mut self, id: NodeId) -> &mut Vec<Attribute> {
        self.validate(id);
        match &mut self.payload[id.idx as usize] {
            Payload::Element(attrs) => attrs,
            Payload::Text(_) => panic!("text node {id:?} has no attributes"),
        }
    }

    fn check_attach(&self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.tag[parent.idx as usize] != Tag::Text,
            "text nodes cannot have children"
        );
        assert!(
            self.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );
        assert!(child.idx != self.root, "cannot attach the document root");
        assert!(
            self.tree_root_idx(parent.idx) != child.idx,
            "attaching {child:?} under {parent:?} would create a cycle"
        );
    }

    /// Bookkeeping shared by every attach path once links are in place.
    fn adopt(&mut self, c: u32) {
        self.orphans.retain(|&o| o != c);
        self.lifecycle[c as usize] = Lifecycle::Live;
        self.sequence_ok = false;
    }

    fn allocate(&mut self, tag: Tag, payload: Payload, offset: usize) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.tag[i] = tag;
            self.payload[i] = payload;
            self.offset[i] = offset;
            self.lifecycle[i] = Lifecycle::Orphan;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.tag.push(tag);
            self.payload.push(payload);
            self.offset.push(offset);
            self.lifecycle.push(Lifecycle::Orphan);
            self.sequence.push(0);
            self.generation.push(0);
            idx
        };
        self.orphans.push(idx);
        self.sequence_ok = false;
        self.id_at(idx)
    }

    fn free_slot(&mut self, idx: u32) {
        let i = idx as usize;
        self.parent[i] = INVALID;
        self.first_child[i] = INVALID;
        self.last_child[i] = INVALID;
        self.next_sibling[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.payload[i] = Payload::Element(Vec::new());
        self.lifecycle[i] = Lifecycle::Destroyed;
        // Old handles fail validation from here on.
        self.generation[i] += 1;
        self.free_list.push(idx);
    }

    /// Removes `idx` from its parent's child list.
    fn unlink_from_parent(&mut self, idx: u32) {
        let i = idx as usize;
        let p = self.parent[i] as usize;
        let prev = self.prev_sibling[i];
        let next = self.next_sibling[i];

        if prev == INVALID {
            self.first_child[p] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next == INVALID {
            self.last_child[p] = prev;
        } else {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.next_sibling[i] = INVALID;
        self.sequence_ok = false;
    }
}
