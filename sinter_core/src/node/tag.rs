// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tag identity.
//!
//! Known markup tags are a closed [`Tag`] enum so that comparisons in the
//! tree builder's hot paths are a single integer compare. Names outside the
//! known set are interned in a [`TagTable`] and carried as
//! [`Tag::Custom`] with the interned [`Atom`].

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

/// An interned custom tag name. Only meaningful for the [`TagTable`] that
/// produced it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom(pub(crate) u32);

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({})", self.0)
    }
}

/// Identity of a node's tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[expect(missing_docs, reason = "variants are the tag names they spell")]
pub enum Tag {
    Html,
    Head,
    Body,
    Title,
    Meta,
    Link,
    Base,
    Style,
    Script,
    Div,
    P,
    Span,
    A,
    B,
    I,
    U,
    S,
    Em,
    Strong,
    Small,
    Big,
    Code,
    Tt,
    Sub,
    Sup,
    Font,
    Label,
    Abbr,
    Cite,
    Q,
    Br,
    Hr,
    Img,
    Input,
    Area,
    Param,
    Embed,
    Wbr,
    Source,
    Track,
    Ul,
    Ol,
    Li,
    Dl,
    Dt,
    Dd,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Pre,
    Blockquote,
    Address,
    Center,
    Form,
    Fieldset,
    Table,
    Caption,
    Colgroup,
    Col,
    Thead,
    Tbody,
    Tfoot,
    Tr,
    Td,
    Th,
    Select,
    Option,
    Textarea,
    Button,
    /// The tag carried by text nodes.
    Text,
    /// A tag name outside the known set.
    Custom(Atom),
}

/// Known tag names, sorted for binary search.
const KNOWN: &[(&str, Tag)] = &[
    ("a", Tag::A),
    ("abbr", Tag::Abbr),
    ("address", Tag::Address),
    ("area", Tag::Area),
    ("b", Tag::B),
    ("base", Tag::Base),
    ("big", Tag::Big),
    ("blockquote", Tag::Blockquote),
    ("body", Tag::Body),
    ("br", Tag::Br),
    ("button", Tag::Button),
    ("caption", Tag::Caption),
    ("center", Tag::Center),
    ("cite", Tag::Cite),
    ("code", Tag::Code),
    ("col", Tag::Col),
    ("colgroup", Tag::Colgroup),
    ("dd", Tag::Dd),
    ("div", Tag::Div),
    ("dl", Tag::Dl),
    ("dt", Tag::Dt),
    ("em", Tag::Em),
    ("embed", Tag::Embed),
    ("fieldset", Tag::Fieldset),
    ("font", Tag::Font),
    ("form", Tag::Form),
    ("h1", Tag::H1),
    ("h2", Tag::H2),
    ("h3", Tag::H3),
    ("h4", Tag::H4),
    ("h5", Tag::H5),
    ("h6", Tag::H6),
    ("head", Tag::Head),
    ("hr", Tag::Hr),
    ("html", Tag::Html),
    ("i", Tag::I),
    ("img", Tag::Img),
    ("input", Tag::Input),
    ("label", Tag::Label),
    ("li", Tag::Li),
    ("link", Tag::Link),
    ("meta", Tag::Meta),
    ("ol", Tag::Ol),
    ("option", Tag::Option),
    ("p", Tag::P),
    ("param", Tag::Param),
    ("pre", Tag::Pre),
    ("q", Tag::Q),
    ("s", Tag::S),
    ("script", Tag::Script),
    ("select", Tag::Select),
    ("small", Tag::Small),
    ("source", Tag::Source),
    ("span", Tag::Span),
    ("strong", Tag::Strong),
    ("style", Tag::Style),
    ("sub", Tag::Sub),
    ("sup", Tag::Sup),
    ("table", Tag::Table),
    ("tbody", Tag::Tbody),
    ("td", Tag::Td),
    ("textarea", Tag::Textarea),
    ("tfoot", Tag::Tfoot),
    ("th", Tag::Th),
    ("thead", Tag::Thead),
    ("title", Tag::Title),
    ("tr", Tag::Tr),
    ("track", Tag::Track),
    ("tt", Tag::Tt),
    ("u", Tag::U),
    ("ul", Tag::Ul),
    ("wbr", Tag::Wbr),
];

impl Tag {
    /// Looks up a known tag by name, ignoring ASCII case.
    #[must_use]
    pub fn from_known_name(name: &str) -> Option<Self> {
        KNOWN
            .binary_search_by(|&(known, _)| cmp_ignore_ascii_case(known, name))
            .ok()
            .map(|i| KNOWN[i].1)
    }

    /// Returns the lowercase name of a known tag.
    ///
    /// Custom tags return `None`; resolve them through the store's
    /// [`TagTable`]. Text nodes report `"#text"`.
    #[must_use]
    pub fn known_name(self) -> Option<&'static str> {
        match self {
            Self::Text => Some("#text"),
            Self::Custom(_) => None,
            tag => KNOWN
                .iter()
                .find(|&&(_, known)| known == tag)
                .map(|&(name, _)| name),
        }
    }

    /// Position in the table hierarchy.
    ///
    /// `table` is 4, row groups are 3, `tr` is 2, cells are 1, and every other
    /// tag is 0. Closing tags never pop past an open node whose level is at
    /// least their own.
    #[must_use]
    pub const fn table_level(self) -> u8 {
        match self {
            Self::Table => 4,
            Self::Thead | Self::Tbody | Self::Tfoot => 3,
            Self::Tr => 2,
            Self::Td | Self::Th => 1,
            _ => 0,
        }
    }

    /// Whether this is a table, row group or row: a context whose direct
    /// children must be table structure.
    #[must_use]
    pub const fn is_table_context(self) -> bool {
        self.table_level() >= 2
    }

    /// Whether content with this tag may sit directly inside a table context
    /// without being foster-parented.
    #[must_use]
    pub const fn is_table_structure(self) -> bool {
        self.table_level() > 0
            || matches!(
                self,
                Self::Caption | Self::Colgroup | Self::Col | Self::Script | Self::Style
            )
    }

    /// Void elements never have children.
    #[must_use]
    pub const fn is_void(self) -> bool {
        matches!(
            self,
            Self::Br
                | Self::Hr
                | Self::Img
                | Self::Input
                | Self::Meta
                | Self::Link
                | Self::Base
                | Self::Col
                | Self::Area
                | Self::Param
                | Self::Embed
                | Self::Wbr
                | Self::Source
                | Self::Track
        )
    }

    /// Tags that belong in the document head.
    #[must_use]
    pub const fn is_head_content(self) -> bool {
        matches!(
            self,
            Self::Title | Self::Meta | Self::Link | Self::Base | Self::Style | Self::Script
        )
    }

    /// Phrasing-level tags.
    #[must_use]
    pub const fn is_inline(self) -> bool {
        matches!(
            self,
            Self::Span
                | Self::A
                | Self::B
                | Self::I
                | Self::U
                | Self::S
                | Self::Em
                | Self::Strong
                | Self::Small
                | Self::Big
                | Self::Code
                | Self::Tt
                | Self::Sub
                | Self::Sup
                | Self::Font
                | Self::Label
                | Self::Abbr
                | Self::Cite
                | Self::Q
                | Self::Br
                | Self::Img
                | Self::Input
                | Self::Select
                | Self::Textarea
                | Self::Button
                | Self::Wbr
                | Self::Text
        )
    }

    /// Flow-level tags that end an open paragraph or inline run.
    #[must_use]
    pub const fn is_block(self) -> bool {
        matches!(
            self,
            Self::Div
                | Self::P
                | Self::Ul
                | Self::Ol
                | Self::Li
                | Self::Dl
                | Self::Dt
                | Self::Dd
                | Self::H1
                | Self::H2
                | Self::H3
                | Self::H4
                | Self::H5
                | Self::H6
                | Self::Pre
                | Self::Blockquote
                | Self::Address
                | Self::Center
                | Self::Form
                | Self::Fieldset
                | Self::Hr
                | Self::Table
                | Self::Caption
        ) || self.table_level() > 0
    }
}

/// Interning table for custom tag names.
///
/// Names are folded to ASCII lowercase before interning, so `<My-Widget>`
/// and `<my-widget>` share one [`Atom`].
#[derive(Clone, Debug, Default)]
pub struct TagTable {
    index: BTreeMap<Box<str>, Atom>,
    names: Vec<Box<str>>,
}

impl TagTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            index: BTreeMap::new(),
            names: Vec::new(),
        }
    }

    /// Resolves `name` to a [`Tag`], interning it if it is not a known tag.
    pub fn intern(&mut self, name: &str) -> Tag {
        if let Some(tag) = Tag::from_known_name(name) {
            return tag;
        }
        let folded = name.to_ascii_lowercase().into_boxed_str();
        if let Some(&atom) = self.index.get(&folded) {
            return Tag::Custom(atom);
        }
        let atom = atom_at(self.names.len());
        self.names.push(folded.clone());
        self.index.insert(folded, atom);
        Tag::Custom(atom)
    }

    /// Resolves `name` without interning. Unknown custom names yield `None`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Tag> {
        if let Some(tag) = Tag::from_known_name(name) {
            return Some(tag);
        }
        let found = if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.index.get(name.to_ascii_lowercase().as_str())
        } else {
            self.index.get(name)
        };
        found.map(|&atom| Tag::Custom(atom))
    }

    /// Number of interned custom names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no custom name has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the name of any tag.
    #[must_use]
    pub fn name(&self, tag: Tag) -> &str {
        match tag {
            Tag::Custom(atom) => self.names.get(atom.0 as usize).map_or("", |n| n),
            known => known.known_name().unwrap_or(""),
        }
    }
}

fn cmp_ignore_ascii_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "a document never interns anywhere near u32::MAX distinct tag names"
)]
fn atom_at(pos: usize) -> Atom {
    Atom(pos as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_ignore_case() {
        assert_eq!(Tag::from_known_name("TABLE"), Some(Tag::Table));
        assert_eq!(Tag::from_known_name("Td"), Some(Tag::Td));
        assert_eq!(Tag::from_known_name("blink"), None);
        assert_eq!(Tag::Tbody.known_name(), Some("tbody"));
    }

    #[test]
    fn table_levels() {
        assert_eq!(Tag::Table.table_level(), 4);
        assert_eq!(Tag::Tfoot.table_level(), 3);
        assert_eq!(Tag::Tr.table_level(), 2);
        assert_eq!(Tag::Th.table_level(), 1);
        assert_eq!(Tag::Div.table_level(), 0);
        assert!(Tag::Tr.is_table_context());
        assert!(!Tag::Td.is_table_context());
        assert!(Tag::Td.is_table_structure());
        assert!(!Tag::B.is_table_structure());
    }

    #[test]
    fn custom_names_intern_once() {
        let mut table = TagTable::new();
        let a = table.intern("x-widget");
        let b = table.intern("X-Widget");
        let c = table.intern("x-other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.name(a), "x-widget");
        assert_eq!(table.lookup("X-OTHER"), Some(c));
        assert_eq!(table.lookup("x-missing"), None);
        assert_eq!(table.intern("div"), Tag::Div, "known names never intern");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn known_table_is_sorted() {
        assert!(
            KNOWN.windows(2).all(|w| w[0].0 < w[1].0),
            "binary search needs sorted names"
        );
        for &(name, tag) in KNOWN {
            assert_eq!(Tag::from_known_name(name), Some(tag));
        }
        assert_eq!(Tag::from_known_name("H6"), Some(Tag::H6));
        assert_eq!(Tag::from_known_name(""), None);
    }

    #[test]
    fn interning_many_names_keeps_atoms_stable() {
        let mut table = TagTable::new();
        let atoms: Vec<Tag> = (0..200)
            .map(|i| table.intern(&alloc::format!("x-el-{i}")))
            .collect();
        assert_eq!(table.len(), 200);
        assert_eq!(table.lookup("X-EL-150"), Some(atoms[150]));
        assert_eq!(table.intern("x-el-7"), atoms[7]);
        assert_eq!(table.name(atoms[199]), "x-el-199");
    }
}
