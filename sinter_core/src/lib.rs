// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental markup tree construction and idle-time invalidation.
//!
//! `sinter_core` builds a mutable markup document from a stream of tokenizer
//! events and keeps a rendered view of it consistent without re-deriving the
//! whole view on every change. It is `no_std` compatible (with `alloc`) and
//! stores nodes in struct-of-arrays storage addressed by generational handles.
//!
//! # Architecture
//!
//! ```text
//!   Token ──► TreeBuilder ──► NodeStore
//!                                │ schedule_{dynamic,restyle,layout}
//!                                ▼
//!                            Scheduler ──(idle)──► pipeline run
//!                                                     │
//!        ┌──────────┬──────────┬──────────┬───────────┘
//!        ▼          ▼          ▼          ▼
//!     Dynamic ─► Restyle ─► Layout ─► Repair ─► Scroll
//!   StyleResolver   │   LayoutEngine  Canvas    Viewport
//! ```
//!
//! **[`node`]**: Struct-of-arrays node tree with generational [`NodeId`]
//! handles, an orphan registry for detached subtrees, lazy document-order
//! sequence numbers and restyle-root upgrading.
//!
//! **[`tree`]**: The [`TreeBuilder`](tree::TreeBuilder), which applies
//! explicit and implicit closing and foster parenting so that any token
//! sequence yields a well-formed tree.
//!
//! **[`scheduler`]**: Coalesces invalidation requests into a few roots and
//! bits; [`pipeline`] consumes them in one run per idle callback.
//!
//! **[`damage`]** and **[`snapshot`]**: Viewport damage rectangles with
//! containment culling, and display-list snapshots diffed after relayout.
//!
//! **[`host`]**: The collaborator traits the host implements: style,
//! layout, canvas and viewport.
//!
//! **[`document`]**: [`Document`] ties all of the above together.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! pipeline instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates damage-rect
//!   and layout-invalidation events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod damage;
pub mod dirty;
pub mod document;
pub mod error;
pub mod host;
pub mod node;
pub mod pipeline;
pub mod scheduler;
pub mod snapshot;
pub mod time;
pub mod trace;
pub mod tree;

pub use document::{Document, DocumentConfig};
pub use error::{CollaboratorError, Error, PhaseError};
pub use node::NodeId;
