// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The document façade.
//!
//! [`Document`] owns the [`NodeStore`], the [`TreeBuilder`] position and the
//! [`Scheduler`], and is the single entry point for hosts: feed tokens or
//! mutate the tree, then call [`run_idle`](Document::run_idle) when the event
//! loop goes idle.
//!
//! ```text
//!   tokens ──► TreeBuilder ─┐
//!                           ├──► NodeStore ──► Scheduler ──(idle)──► pipeline
//!   host mutations ─────────┘
//! ```

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Rect, Size, Vec2};

use crate::error::{Error, PhaseError};
use crate::host::Collaborators;
use crate::node::{Attribute, NodeId, NodeStore};
use crate::pipeline::RunReport;
use crate::scheduler::{Pending, Scheduler};
use crate::tree::{ContentModel, Token, TreeBuilder, TreeBuilderConfig};

/// Document options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DocumentConfig {
    /// Initial viewport size.
    pub viewport: Size,
    /// Maximum back-to-back runs [`Document::run_until_idle`] performs before
    /// reporting runaway re-entrancy.
    pub max_idle_cycles: u32,
    /// Tree builder options.
    pub builder: TreeBuilderConfig,
}

impl DocumentConfig {
    /// Default run cap for [`Document::run_until_idle`].
    pub const DEFAULT_MAX_IDLE_CYCLES: u32 = 64;

    /// Options for a viewport of the given size.
    #[must_use]
    pub const fn new(viewport: Size) -> Self {
        Self {
            viewport,
            max_idle_cycles: Self::DEFAULT_MAX_IDLE_CYCLES,
            builder: TreeBuilderConfig::new(),
        }
    }

    /// Sets the run cap for [`Document::run_until_idle`].
    #[must_use]
    pub const fn with_max_idle_cycles(mut self, cycles: u32) -> Self {
        self.max_idle_cycles = cycles;
        self
    }

    /// Sets the tree builder options.
    #[must_use]
    pub const fn with_builder(mut self, builder: TreeBuilderConfig) -> Self {
        self.builder = builder;
        self
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self::new(Size::new(800.0, 600.0))
    }
}

/// A markup document with incremental rendering state.
#[derive(Debug)]
pub struct Document {
    config: DocumentConfig,
    store: NodeStore,
    scheduler: Scheduler,
    builder: TreeBuilder,
    errors: Vec<PhaseError>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DocumentConfig::default())
    }
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new(config: DocumentConfig) -> Self {
        Self::with_content_model(config, Box::new(crate::tree::HtmlContentModel))
    }

    /// Creates an empty document whose builder uses `model` for implicit
    /// closing.
    #[must_use]
    pub fn with_content_model(config: DocumentConfig, model: Box<dyn ContentModel>) -> Self {
        Self {
            config,
            store: NodeStore::new(),
            scheduler: Scheduler::new(config.viewport),
            builder: TreeBuilder::with_content_model(config.builder, model),
            errors: Vec::new(),
        }
    }

    /// Options in effect.
    #[must_use]
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// The node tree.
    #[must_use]
    pub fn tree(&self) -> &NodeStore {
        &self.store
    }

    /// The invalidation state.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The tree builder.
    #[must_use]
    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    /// Mutable access to the tree builder's position.
    pub fn builder_mut(&mut self) -> &mut TreeBuilder {
        &mut self.builder
    }

    // -- Token input --

    /// Processes one tokenizer event.
    pub fn feed(&mut self, token: Token) {
        self.builder.feed(&mut self.store, &mut self.scheduler, token);
        self.debug_check();
    }

    /// Processes a run of tokenizer events.
    pub fn feed_all(&mut self, tokens: impl IntoIterator<Item = Token>) {
        for token in tokens {
            self.feed(token);
        }
    }

    /// Adds an element for a start tag. See [`TreeBuilder::open_tag`].
    pub fn open_tag(
        &mut self,
        name: &str,
        attrs: Vec<Attribute>,
        self_closing: bool,
        offset: usize,
    ) -> NodeId {
        let node = self.builder.open_tag(
            &mut self.store,
            &mut self.scheduler,
            name,
            attrs,
            self_closing,
            offset,
        );
        self.debug_check();
        node
    }

    /// Adds a text run. See [`TreeBuilder::text`].
    pub fn text(&mut self, text: &str, offset: usize) -> Option<NodeId> {
        let node = self
            .builder
            .text(&mut self.store, &mut self.scheduler, text, offset);
        self.debug_check();
        node
    }

    /// Handles an end tag and returns how many elements it closed. See
    /// [`TreeBuilder::close_tag`].
    pub fn close_tag(&mut self, name: &str, offset: usize) -> usize {
        let closed = self
            .builder
            .close_tag(&mut self.store, &mut self.scheduler, name, offset);
        self.debug_check();
        closed
    }

    /// Ends the token stream.
    pub fn finish(&mut self) {
        self.builder.finish();
    }

    /// Builds `tokens` into detached subtrees and returns their roots.
    ///
    /// The roots are orphans: they are not rendered until attached with
    /// [`append_child`](Self::append_child) or a sibling insert.
    pub fn parse_fragment(&mut self, tokens: impl IntoIterator<Item = Token>) -> Vec<NodeId> {
        let mut builder = TreeBuilder::for_fragment(self.config.builder, &mut self.store);
        for token in tokens {
            builder.feed(&mut self.store, &mut self.scheduler, token);
        }
        let roots = builder.into_fragment(&mut self.store);
        self.debug_check();
        roots
    }

    // -- Host mutation --

    /// Creates a detached element. Attach it to render it.
    pub fn create_element(&mut self, name: &str, attrs: Vec<Attribute>) -> NodeId {
        let tag = self.store.intern_tag(name);
        self.store.create_element(tag, attrs, 0)
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.store.create_text(text, 0)
    }

    /// Attaches `child` as the last child of `parent`.
    ///
    /// A `child` that already has a parent is moved: it is detached first and
    /// its old parent is scheduled as if it had been removed.
    ///
    /// # Panics
    ///
    /// See [`NodeStore::append_child`].
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach_for_move(child);
        self.store.append_child(parent, child);
        self.attached(child, parent);
    }

    /// Attaches `child` immediately before `reference`, moving it if it is
    /// already attached. Inserting a node relative to itself does nothing.
    ///
    /// # Panics
    ///
    /// See [`NodeStore::insert_before`].
    pub fn insert_before(&mut self, child: NodeId, reference: NodeId) {
        if child == reference {
            return;
        }
        self.detach_for_move(child);
        self.store.insert_before(child, reference);
        if let Some(parent) = self.store.parent(child) {
            self.attached(child, parent);
        }
    }

    /// Attaches `child` immediately after `reference`, moving it if it is
    /// already attached. Inserting a node relative to itself does nothing.
    ///
    /// # Panics
    ///
    /// See [`NodeStore::insert_after`].
    pub fn insert_after(&mut self, child: NodeId, reference: NodeId) {
        if child == reference {
            return;
        }
        self.detach_for_move(child);
        self.store.insert_after(child, reference);
        if let Some(parent) = self.store.parent(child) {
            self.attached(child, parent);
        }
    }

    /// Detaches `node` and its subtree into the orphan registry.
    ///
    /// Returns the former parent, or `None` (doing nothing) if the node had
    /// no parent.
    pub fn remove(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.detach_for_move(node)?;
        self.debug_check();
        Some(parent)
    }

    /// Destroys `node` and its subtree.
    ///
    /// Cached style and geometry of every destroyed node is discarded at the
    /// start of the next pipeline run.
    pub fn destroy(&mut self, node: NodeId) {
        let parent = self.store.parent(node);
        self.scheduler.retarget_roots(&self.store, node, parent);
        let scheduler = &mut self.scheduler;
        self.store.destroy(node, |_, doomed| scheduler.note_destroyed(doomed));
        self.builder.forget_detached(&self.store);
        if let Some(parent) = parent {
            self.scheduler.schedule_restyle(&self.store, parent);
            self.scheduler.schedule_layout(&self.store, parent);
        }
        self.debug_check();
    }

    /// Sets an attribute and schedules a restyle of the element. Returns the
    /// previous value.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Option<String> {
        let old = self.store.set_attr(node, name, value);
        self.scheduler.schedule_restyle(&self.store, node);
        old
    }

    /// Removes an attribute, scheduling a restyle if it was present.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String> {
        let old = self.store.remove_attr(node, name);
        if old.is_some() {
            self.scheduler.schedule_restyle(&self.store, node);
        }
        old
    }

    /// Detaches `node` if it has a parent, retargeting the scheduler roots
    /// and scheduling the old parent. Returns the old parent.
    fn detach_for_move(&mut self, node: NodeId) -> Option<NodeId> {
        let parent = self.store.parent(node)?;
        self.scheduler.retarget_roots(&self.store, node, Some(parent));
        self.store.detach(node);
        self.builder.forget_detached(&self.store);
        self.scheduler.schedule_restyle(&self.store, parent);
        self.scheduler.schedule_layout(&self.store, parent);
        Some(parent)
    }

    fn attached(&mut self, child: NodeId, parent: NodeId) {
        self.scheduler.schedule_restyle(&self.store, child);
        self.scheduler.schedule_layout(&self.store, parent);
        self.debug_check();
    }

    // -- Scheduling --

    /// See [`Scheduler::schedule_dynamic`].
    pub fn schedule_dynamic(&mut self, node: NodeId) {
        self.scheduler.schedule_dynamic(&self.store, node);
    }

    /// See [`Scheduler::schedule_restyle`].
    pub fn schedule_restyle(&mut self, node: NodeId) {
        self.scheduler.schedule_restyle(&self.store, node);
    }

    /// See [`Scheduler::schedule_layout`].
    pub fn schedule_layout(&mut self, node: NodeId) {
        self.scheduler.schedule_layout(&self.store, node);
    }

    /// See [`Scheduler::schedule_damage`].
    pub fn schedule_damage(&mut self, rect: Rect) -> bool {
        self.scheduler.schedule_damage(rect)
    }

    /// See [`Scheduler::schedule_scroll_x`].
    pub fn schedule_scroll_x(&mut self, offset: f64) {
        self.scheduler.schedule_scroll_x(offset);
    }

    /// See [`Scheduler::schedule_scroll_y`].
    pub fn schedule_scroll_y(&mut self, offset: f64) {
        self.scheduler.schedule_scroll_y(offset);
    }

    /// Resizes the viewport. See [`Scheduler::set_viewport`].
    pub fn set_viewport(&mut self, viewport: Size) {
        self.scheduler.set_viewport(&self.store, viewport);
    }

    // -- Running --

    /// The idle callback: runs the pipeline if it is armed.
    pub fn run_idle(&mut self, collaborators: &mut Collaborators<'_>) -> Option<RunReport> {
        if !self.scheduler.is_armed() {
            return None;
        }
        self.run(collaborators, false)
    }

    /// Runs the pipeline now if anything is pending, armed or not.
    ///
    /// Forcing again with nothing newly scheduled does nothing.
    pub fn force(&mut self, collaborators: &mut Collaborators<'_>) -> Option<RunReport> {
        self.run(collaborators, true)
    }

    /// Runs idle callbacks back to back until the scheduler stays disarmed.
    ///
    /// Returns the number of runs performed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RunawayReentrancy`] if the scheduler is still armed
    /// after [`DocumentConfig::max_idle_cycles`] runs. Pending work is left
    /// in place.
    pub fn run_until_idle(&mut self, collaborators: &mut Collaborators<'_>) -> Result<u32, Error> {
        let cap = self.config.max_idle_cycles;
        let mut runs = 0;
        while runs < cap {
            if self.run_idle(collaborators).is_none() {
                return Ok(runs);
            }
            runs += 1;
        }
        if self.scheduler.is_armed() {
            log::error!(
                "pipeline still armed after {cap} runs (pending {:?})",
                self.scheduler.pending()
            );
            return Err(Error::RunawayReentrancy { cycles: cap });
        }
        Ok(runs)
    }

    fn run(&mut self, collaborators: &mut Collaborators<'_>, forced: bool) -> Option<RunReport> {
        let report = self
            .scheduler
            .run(&self.store, collaborators, forced, &mut self.errors)?;
        if report.reset_requested {
            log::debug!("reset requested during run {}", report.cycle);
            self.reset();
        }
        Some(report)
    }

    /// Returns to the empty state.
    ///
    /// The document tree and every orphan are destroyed, the builder
    /// position is forgotten and all pending work is dropped. Caches of the
    /// destroyed nodes are still discarded at the start of the next run.
    pub fn reset(&mut self) {
        let roots: Vec<NodeId> = self.store.root().into_iter().chain(self.store.orphans()).collect();
        for root in roots {
            let scheduler = &mut self.scheduler;
            self.store.destroy(root, |_, doomed| scheduler.note_destroyed(doomed));
        }
        self.builder.reset();
        self.scheduler.reset();
        self.debug_check();
    }

    // -- Queries --

    /// The document root, once any content has arrived.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.store.root()
    }

    /// Whether `node` is outside the document tree.
    #[must_use]
    pub fn is_orphan(&self, node: NodeId) -> bool {
        self.store.is_orphan(node)
    }

    /// Renumbers nodes in document order if the tree changed.
    pub fn sequence(&mut self) {
        self.store.sequence();
    }

    /// Document-order number of `node`.
    pub fn sequence_of(&mut self, node: NodeId) -> u32 {
        self.store.sequence_of(node)
    }

    /// Phases with outstanding work.
    #[must_use]
    pub fn pending(&self) -> Pending {
        self.scheduler.pending()
    }

    /// Whether the idle callback is armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.scheduler.is_armed()
    }

    /// Pending viewport damage.
    #[must_use]
    pub fn damage(&self) -> &[Rect] {
        self.scheduler.damage()
    }

    /// Subtree awaiting restyle.
    #[must_use]
    pub fn restyle_root(&self) -> Option<NodeId> {
        self.scheduler.restyle_root()
    }

    /// Subtree awaiting dynamic-condition checks.
    #[must_use]
    pub fn dynamic_root(&self) -> Option<NodeId> {
        self.scheduler.dynamic_root()
    }

    /// Current clamped scroll offset.
    #[must_use]
    pub fn scroll_offset(&self) -> Vec2 {
        self.scheduler.scroll_offset()
    }

    /// Collaborator failures caught since the last call.
    pub fn take_errors(&mut self) -> Vec<PhaseError> {
        core::mem::take(&mut self.errors)
    }

    fn debug_check(&self) {
        #[cfg(debug_assertions)]
        self.store.check_invariants();
    }
}
