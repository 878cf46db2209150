// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Structural operations never fail: malformed markup produces a
//! deterministic tree and misuse of handles panics. What remains are
//! failures reported by collaborators during a pipeline run, which are
//! caught per call site and queued as [`PhaseError`]s, and the runaway
//! re-entrancy guard on [`Document::run_until_idle`].
//!
//! [`Document::run_until_idle`]: crate::Document::run_until_idle

use alloc::string::String;
use core::fmt;

use crate::node::NodeId;
use crate::trace::PhaseKind;

/// A failure reported by a style resolver, layout engine, canvas or viewport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollaboratorError {
    message: String,
}

impl CollaboratorError {
    /// Creates an error carrying a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message supplied by the collaborator.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for CollaboratorError {}

/// A collaborator failure caught during a pipeline run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseError {
    /// Pipeline run in which the failure happened.
    pub cycle: u64,
    /// Phase that was running.
    pub phase: PhaseKind,
    /// Node being processed, for per-node calls.
    pub node: Option<NodeId>,
    /// What the collaborator reported.
    pub error: CollaboratorError,
}

impl fmt::Display for PhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} phase of run {}", self.phase.name(), self.cycle)?;
        if let Some(node) = self.node {
            write!(f, " at {node:?}")?;
        }
        write!(f, ": {}", self.error)
    }
}

impl core::error::Error for PhaseError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Errors returned by document-level operations.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Collaborators kept scheduling work from inside the pipeline, so it was
    /// still armed after the configured number of back-to-back runs.
    RunawayReentrancy {
        /// Runs performed before giving up.
        cycles: u32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunawayReentrancy { cycles } => write!(
                f,
                "pipeline still armed after {cycles} consecutive runs; collaborators keep rescheduling work"
            ),
        }
    }
}

impl core::error::Error for Error {}
