// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The scheduler records which nodes' cached geometry is stale in an
//! [`understory_dirty`] tracker keyed by node slot index.
//!
//! # Propagation semantics
//!
//! Layout invalidation flows *upward*: a node's box depends on its
//! descendants, so [`Scheduler::schedule_layout`] marks the node and every
//! ancestor explicitly. Marks are local; the tracker is used as an ordered,
//! deduplicated set rather than for dependency propagation.
//!
//! # Consumption
//!
//! The layout phase drains [`LAYOUT`] once per pipeline run and hands every
//! drained node to [`LayoutEngine::invalidate_cache`] before laying out.
//!
//! [`Scheduler::schedule_layout`]: crate::scheduler::Scheduler::schedule_layout
//! [`LayoutEngine::invalidate_cache`]: crate::host::LayoutEngine::invalidate_cache

use understory_dirty::Channel;

/// Cached geometry is stale and must be recomputed.
pub const LAYOUT: Channel = Channel::new(0);
