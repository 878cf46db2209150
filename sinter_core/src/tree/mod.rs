// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental tree construction from tokenizer events.
//!
//! [`TreeBuilder`] turns a stream of start tags, text runs and end tags into
//! nodes in a [`NodeStore`], tolerating malformed nesting the way browsers
//! do. Every token yields a deterministic tree; nothing is ever rejected.
//!
//! - Start tags first *implicitly close* open elements that cannot contain
//!   them (a `<p>` inside a `<p>`, a `<td>` inside a `<td>`), as decided by a
//!   [`ContentModel`].
//! - End tags *explicitly close* up to the matching open element, but never
//!   across a table boundary and never the `html`/`head`/`body` skeleton.
//! - Content that arrives inside a table, row group or row is *foster
//!   parented* in front of the table (see [`foster`]).
//!
//! Every inserted element is scheduled for restyle, and its new parent for
//! layout, on the [`Scheduler`] passed in.

mod close;
mod content;
pub mod foster;
mod token;

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::node::{Attribute, NodeId, NodeStore, Tag};
use crate::scheduler::Scheduler;

pub use close::{explicit_close, implicit_close, pop};
pub use content::{CloseAction, ContentModel, HtmlContentModel};
pub use foster::{FosterCursor, foster_target};
pub use token::Token;

/// Tree builder options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeBuilderConfig {
    /// Merge a text run into a directly preceding text sibling instead of
    /// creating a second text node.
    pub coalesce_text: bool,
}

impl TreeBuilderConfig {
    /// Default options: text coalescing on.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            coalesce_text: true,
        }
    }

    /// Enables or disables text coalescing.
    #[must_use]
    pub const fn with_coalesce_text(mut self, coalesce: bool) -> Self {
        self.coalesce_text = coalesce;
        self
    }
}

impl Default for TreeBuilderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the builder is in the token stream.
///
/// Fields are public so a builder can be positioned directly, for example to
/// resume from a partial stream in tests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeBuilderState {
    /// Insertion point in the main tree.
    pub current: Option<NodeId>,
    /// Open foster tree, if any.
    pub foster: Option<FosterCursor>,
    /// The skeleton `head` element.
    pub head: Option<NodeId>,
    /// The skeleton `body` element.
    pub body: Option<NodeId>,
    /// Whether body content has been seen; head content after this point
    /// stays where it appears.
    pub body_started: bool,
    /// Container collecting a fragment, when building one.
    pub fragment: Option<NodeId>,
}

/// Builds a document tree from tokens.
pub struct TreeBuilder {
    config: TreeBuilderConfig,
    state: TreeBuilderState,
    model: Box<dyn ContentModel>,
}

impl core::fmt::Debug for TreeBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(TreeBuilderConfig::new())
    }
}

impl TreeBuilder {
    /// Creates a builder using [`HtmlContentModel`].
    #[must_use]
    pub fn new(config: TreeBuilderConfig) -> Self {
        Self::with_content_model(config, Box::new(HtmlContentModel))
    }

    /// Creates a builder with a custom content model.
    #[must_use]
    pub fn with_content_model(config: TreeBuilderConfig, model: Box<dyn ContentModel>) -> Self {
        Self {
            config,
            state: TreeBuilderState::default(),
            model,
        }
    }

    /// Creates a builder that collects content into a detached container
    /// instead of the document. Finish with [`into_fragment`].
    ///
    /// [`into_fragment`]: Self::into_fragment
    #[must_use]
    pub fn for_fragment(config: TreeBuilderConfig, store: &mut NodeStore) -> Self {
        let container = store.create_element(Tag::Body, Vec::new(), 0);
        let mut builder = Self::new(config);
        builder.state = TreeBuilderState {
            current: Some(container),
            body_started: true,
            fragment: Some(container),
            ..TreeBuilderState::default()
        };
        builder
    }

    /// Detaches everything built by a fragment builder and returns the top
    /// nodes, in order, as orphan roots.
    ///
    /// A builder not created with [`for_fragment`](Self::for_fragment)
    /// returns nothing.
    pub fn into_fragment(self, store: &mut NodeStore) -> Vec<NodeId> {
        let Some(container) = self.state.fragment else {
            return Vec::new();
        };
        let tops: Vec<NodeId> = store.children(container).collect();
        for &top in &tops {
            store.detach(top);
        }
        store.destroy(container, |_, _| {});
        tops
    }

    /// Options in effect.
    #[must_use]
    pub fn config(&self) -> TreeBuilderConfig {
        self.config
    }

    /// Current position.
    #[must_use]
    pub fn state(&self) -> &TreeBuilderState {
        &self.state
    }

    /// Mutable access to the position.
    pub fn state_mut(&mut self) -> &mut TreeBuilderState {
        &mut self.state
    }

    /// Forgets the position. The next token starts a fresh skeleton if the
    /// store has no root.
    pub fn reset(&mut self) {
        self.state = TreeBuilderState::default();
    }

    /// Ends the token stream: any foster tree is flushed and insertion
    /// returns to `body`.
    pub fn finish(&mut self) {
        self.state.foster = None;
        if let Some(body) = self.state.body {
            self.state.current = Some(body);
        }
    }

    /// Processes one token.
    pub fn feed(&mut self, store: &mut NodeStore, scheduler: &mut Scheduler, token: Token) {
        match token {
            Token::Open {
                name,
                attrs,
                self_closing,
                offset,
            } => {
                self.open_tag(store, scheduler, &name, attrs, self_closing, offset);
            }
            Token::Text { text, offset } => {
                self.text(store, scheduler, &text, offset);
            }
            Token::Close { name, offset } => {
                self.close_tag(store, scheduler, &name, offset);
            }
        }
    }

    // -- Start tags --

    /// Handles a start tag and returns the element it produced.
    ///
    /// `<html>`, `<head>` and `<body>` do not create elements; their
    /// attributes are merged into the skeleton node, which is returned.
    pub fn open_tag(
        &mut self,
        store: &mut NodeStore,
        scheduler: &mut Scheduler,
        name: &str,
        attrs: Vec<Attribute>,
        self_closing: bool,
        offset: usize,
    ) -> NodeId {
        let tag = store.intern_tag(name);
        let mut current = self.insertion_point(store, scheduler);
        let leaf = self_closing || tag.is_void();

        if self.state.fragment.is_none() {
            if let Some(node) = self.skeleton_node(store, tag) {
                if store.merge_attrs(node, attrs) {
                    scheduler.schedule_restyle(store, node);
                }
                match tag {
                    Tag::Body => {
                        self.enter_body(store);
                    }
                    Tag::Head if !self.state.body_started => self.state.current = Some(node),
                    _ => {}
                }
                return node;
            }

            if self.in_head(store, current) {
                let head = self.state.head.filter(|_| tag.is_head_content());
                if let Some(head) = head.filter(|_| !self.state.body_started) {
                    let node = store.create_element(tag, attrs, offset);
                    store.append_child(head, node);
                    if !leaf {
                        self.state.current = Some(node);
                    }
                    inserted(store, scheduler, node, head);
                    return node;
                }
                current = self.enter_body(store).unwrap_or(current);
            }
            self.state.body_started = true;
        }

        if let Some(cursor) = self.live_foster(store) {
            if tag.is_table_structure() {
                log::trace!("<{name}> flushes foster content");
                self.state.foster = None;
            } else {
                return self.insert_fostered(store, scheduler, cursor, tag, attrs, leaf, offset);
            }
        }

        let closed = implicit_close(store, &*self.model, current, tag, None);
        let parent = pop(store, current, closed);
        let node = store.create_element(tag, attrs, offset);

        let misplaced = store.tag(parent).is_table_context() && !tag.is_table_structure();
        match foster_target(store, parent).filter(|_| misplaced) {
            Some((table, table_parent)) => {
                store.insert_before(node, table);
                self.state.current = Some(parent);
                if !leaf {
                    self.state.foster = Some(FosterCursor {
                        node,
                        table,
                        table_parent,
                    });
                }
                inserted(store, scheduler, node, table_parent);
            }
            None => {
                store.append_child(parent, node);
                self.state.current = Some(if leaf { parent } else { node });
                inserted(store, scheduler, node, parent);
            }
        }
        node
    }

    fn insert_fostered(
        &mut self,
        store: &mut NodeStore,
        scheduler: &mut Scheduler,
        cursor: FosterCursor,
        tag: Tag,
        attrs: Vec<Attribute>,
        leaf: bool,
        offset: usize,
    ) -> NodeId {
        let closed = implicit_close(store, &*self.model, cursor.node, tag, Some(cursor.table_parent));
        let at = pop(store, cursor.node, closed);
        let node = store.create_element(tag, attrs, offset);
        let parent = if at == cursor.table_parent {
            store.insert_before(node, cursor.table);
            cursor.table_parent
        } else {
            store.append_child(at, node);
            at
        };
        self.state.foster = if leaf {
            cursor.moved_to(at)
        } else {
            Some(FosterCursor { node, ..cursor })
        };
        inserted(store, scheduler, node, parent);
        node
    }

    // -- Text --

    /// Handles a text run and returns the text node holding it.
    ///
    /// Returns `None` when the run is dropped: empty text, whitespace before
    /// any body content, and whitespace addressed to a table, row group or
    /// row.
    pub fn text(
        &mut self,
        store: &mut NodeStore,
        scheduler: &mut Scheduler,
        text: &str,
        offset: usize,
    ) -> Option<NodeId> {
        if text.is_empty() {
            return None;
        }
        let blank = text.chars().all(char::is_whitespace);
        if blank && self.state.fragment.is_none() && store.root().is_none() {
            return None;
        }
        let mut current = self.insertion_point(store, scheduler);

        if self.state.fragment.is_none() {
            if self.in_head(store, current) {
                if Some(current) == self.state.head {
                    if blank {
                        return None;
                    }
                    current = self.enter_body(store).unwrap_or(current);
                }
            } else if !self.state.body_started {
                if blank {
                    return None;
                }
                self.state.body_started = true;
            }
        }

        if let Some(cursor) = self.live_foster(store) {
            return Some(self.append_text(store, scheduler, cursor.node, text, offset));
        }

        if store.tag(current).is_table_context() {
            if blank {
                return None;
            }
            if let Some((table, table_parent)) = foster_target(store, current) {
                if let Some(prev) = store.prev_sibling(table).filter(|&p| self.coalesces(store, p)) {
                    store.push_text(prev, text);
                    scheduler.schedule_layout(store, table_parent);
                    return Some(prev);
                }
                let node = store.create_text(text, offset);
                store.insert_before(node, table);
                inserted(store, scheduler, node, table_parent);
                return Some(node);
            }
        }

        Some(self.append_text(store, scheduler, current, text, offset))
    }

    fn append_text(
        &self,
        store: &mut NodeStore,
        scheduler: &mut Scheduler,
        parent: NodeId,
        text: &str,
        offset: usize,
    ) -> NodeId {
        if let Some(last) = store.last_child(parent).filter(|&l| self.coalesces(store, l)) {
            store.push_text(last, text);
            scheduler.schedule_layout(store, parent);
            return last;
        }
        let node = store.create_text(text, offset);
        store.append_child(parent, node);
        inserted(store, scheduler, node, parent);
        node
    }

    fn coalesces(&self, store: &NodeStore, sibling: NodeId) -> bool {
        self.config.coalesce_text && store.tag(sibling) == Tag::Text
    }

    // -- End tags --

    /// Handles an end tag and returns how many open elements it closed.
    pub fn close_tag(
        &mut self,
        store: &mut NodeStore,
        scheduler: &mut Scheduler,
        name: &str,
        offset: usize,
    ) -> usize {
        let Some(tag) = store.tags().lookup(name) else {
            log::trace!("ignoring </{name}> at {offset}: never opened");
            return 0;
        };
        if self.state.fragment.is_none() && store.root().is_none() {
            log::trace!("ignoring </{name}> at {offset}: empty document");
            return 0;
        }
        let current = self.insertion_point(store, scheduler);

        if let Some(cursor) = self.live_foster(store) {
            if tag.is_table_structure() {
                self.state.foster = None;
            } else {
                let closed = explicit_close(store, cursor.node, tag, Some(cursor.table_parent));
                if closed > 0 {
                    self.state.foster = cursor.moved_to(pop(store, cursor.node, closed));
                } else {
                    log::trace!("ignoring </{name}> at {offset}: no match in foster tree");
                }
                return closed;
            }
        }

        let closed = explicit_close(store, current, tag, None);
        if closed > 0 {
            self.state.current = Some(pop(store, current, closed));
        } else {
            log::trace!("ignoring </{name}> at {offset}: no open match");
        }
        closed
    }

    // -- Position helpers --

    /// The insertion point, creating the document skeleton on first use.
    fn insertion_point(&mut self, store: &mut NodeStore, scheduler: &mut Scheduler) -> NodeId {
        if let Some(current) = self.state.current.filter(|&c| store.is_alive(c)) {
            if self.state.fragment.is_some() || !store.is_orphan(current) {
                return current;
            }
        }
        if let Some(container) = self.state.fragment {
            self.state.current = Some(container);
            self.state.foster = None;
            return container;
        }

        self.state.foster = None;
        let resume = match store.root() {
            Some(root) => self
                .state
                .body
                .filter(|&b| store.is_alive(b) && !store.is_orphan(b))
                .unwrap_or(root),
            None => self.build_skeleton(store, scheduler),
        };
        self.state.current = Some(resume);
        resume
    }

    fn build_skeleton(&mut self, store: &mut NodeStore, scheduler: &mut Scheduler) -> NodeId {
        let html = store.create_element(Tag::Html, Vec::new(), 0);
        store.set_root(html);
        let head = store.create_element(Tag::Head, Vec::new(), 0);
        let body = store.create_element(Tag::Body, Vec::new(), 0);
        store.append_child(html, head);
        store.append_child(html, body);
        self.state.head = Some(head);
        self.state.body = Some(body);
        self.state.body_started = false;
        scheduler.schedule_restyle(store, html);
        scheduler.schedule_layout(store, html);
        head
    }

    fn skeleton_node(&self, store: &NodeStore, tag: Tag) -> Option<NodeId> {
        let node = match tag {
            Tag::Html => store.root(),
            Tag::Head => self.state.head,
            Tag::Body => self.state.body,
            _ => None,
        }?;
        (store.is_alive(node) && !store.is_orphan(node)).then_some(node)
    }

    fn in_head(&self, store: &NodeStore, node: NodeId) -> bool {
        self.state
            .head
            .is_some_and(|head| store.is_alive(head) && store.ancestors(node).any(|a| a == head))
    }

    /// Moves insertion to `body` if the current point is inside `head`.
    fn enter_body(&mut self, store: &NodeStore) -> Option<NodeId> {
        self.state.body_started = true;
        let body = self
            .state
            .body
            .filter(|&b| store.is_alive(b) && !store.is_orphan(b))?;
        if self.state.current.is_none_or(|c| self.in_head(store, c)) {
            self.state.current = Some(body);
        }
        self.state.current
    }

    /// Drops insertion points that no longer lie in the document after a
    /// host removal or destruction.
    pub(crate) fn forget_detached(&mut self, store: &NodeStore) {
        if self.state.fragment.is_some() {
            return;
        }
        let outside = |n: NodeId| !store.is_alive(n) || store.is_orphan(n);
        if self.state.current.is_some_and(outside) {
            self.state.current = None;
        }
        if self.state.foster.is_some_and(|f| outside(f.node)) {
            self.state.foster = None;
        }
    }

    fn live_foster(&mut self, store: &NodeStore) -> Option<FosterCursor> {
        let cursor = self.state.foster?;
        if cursor.is_valid(store) {
            Some(cursor)
        } else {
            self.state.foster = None;
            None
        }
    }
}

fn inserted(store: &NodeStore, scheduler: &mut Scheduler, node: NodeId, parent: NodeId) {
    if store.tag(node) != Tag::Text {
        scheduler.schedule_restyle(store, node);
    }
    scheduler.schedule_layout(store, parent);
}
