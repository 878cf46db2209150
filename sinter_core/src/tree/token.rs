// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tokenizer events.

use alloc::string::String;
use alloc::vec::Vec;

use crate::node::Attribute;

/// One event from a markup tokenizer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// A start tag.
    Open {
        /// Tag name as written.
        name: String,
        /// Attributes in source order.
        attrs: Vec<Attribute>,
        /// Written as `<name/>`.
        self_closing: bool,
        /// Byte offset of the tag in the source.
        offset: usize,
    },
    /// A run of character data.
    Text {
        /// The characters, entity references already resolved.
        text: String,
        /// Byte offset of the run in the source.
        offset: usize,
    },
    /// An end tag.
    Close {
        /// Tag name as written.
        name: String,
        /// Byte offset of the tag in the source.
        offset: usize,
    },
}

impl Token {
    /// A start tag with no attributes at offset 0.
    #[must_use]
    pub fn open(name: &str) -> Self {
        Self::Open {
            name: name.into(),
            attrs: Vec::new(),
            self_closing: false,
            offset: 0,
        }
    }

    /// A text run at offset 0.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::Text {
            text: text.into(),
            offset: 0,
        }
    }

    /// An end tag at offset 0.
    #[must_use]
    pub fn close(name: &str) -> Self {
        Self::Close {
            name: name.into(),
            offset: 0,
        }
    }

    /// Adds an attribute to a start tag. Other tokens are returned unchanged.
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        if let Self::Open { attrs, .. } = &mut self {
            attrs.push(Attribute::new(name, value));
        }
        self
    }

    /// Marks a start tag as self-closing.
    #[must_use]
    pub fn self_closing(mut self) -> Self {
        if let Self::Open { self_closing, .. } = &mut self {
            *self_closing = true;
        }
        self
    }

    /// Sets the source offset.
    #[must_use]
    pub fn at(mut self, at: usize) -> Self {
        match &mut self {
            Self::Open { offset, .. } | Self::Text { offset, .. } | Self::Close { offset, .. } => {
                *offset = at;
            }
        }
        self
    }

    /// Source offset of the token.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::Open { offset, .. } | Self::Text { offset, .. } | Self::Close { offset, .. } => {
                *offset
            }
        }
    }
}
