// Copyright 2026 the Sinter Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content models: which open elements an incoming tag implicitly closes.

use crate::node::Tag;

/// Verdict for one open ancestor during implicit closing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CloseAction {
    /// The ancestor cannot contain the incoming tag; close it (and everything
    /// below it) and keep looking further up.
    Close,
    /// The ancestor accepts the incoming tag; stop looking.
    Stop,
    /// The ancestor has no opinion; ask its parent.
    Continue,
}

/// Decides how an incoming start tag interacts with the open elements.
pub trait ContentModel {
    /// What `open` does when `incoming` arrives while it is an open ancestor
    /// of the insertion point.
    fn should_auto_close(&self, open: Tag, incoming: Tag) -> CloseAction;
}

/// The classic HTML content model.
///
/// | Open element                    | Closes on                                   |
/// |---------------------------------|---------------------------------------------|
/// | `p`, inline elements            | any block-level tag (`a` also on `a`)       |
/// | `li`                            | `li`                                        |
/// | `dt`, `dd`                      | `dt`, `dd`                                  |
/// | `option`                        | `option`                                    |
/// | `td`, `th`                      | cells, rows, row groups, `caption`, `colgroup` |
/// | `tr`                            | rows, row groups, `caption`, `colgroup`     |
/// | `thead`, `tbody`, `tfoot`       | row groups, `caption`, `colgroup`           |
/// | `caption`                       | any table structure                         |
/// | `colgroup`                      | anything but `col`                          |
///
/// `html`, `head`, `body`, `table`, list containers, `select` and head
/// content stop the search. Every other element lets it continue upward.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlContentModel;

impl ContentModel for HtmlContentModel {
    fn should_auto_close(&self, open: Tag, incoming: Tag) -> CloseAction {
        use CloseAction::{Close, Continue, Stop};

        let closes_if = |cond: bool| if cond { Close } else { Stop };
        match open {
            Tag::Html | Tag::Head | Tag::Body | Tag::Table => Stop,
            Tag::Ul | Tag::Ol | Tag::Dl | Tag::Select => Stop,
            Tag::P => closes_if(incoming.is_block()),
            Tag::A => closes_if(incoming.is_block() || incoming == Tag::A),
            Tag::Li => closes_if(incoming == Tag::Li),
            Tag::Dt | Tag::Dd => closes_if(matches!(incoming, Tag::Dt | Tag::Dd)),
            Tag::Option => closes_if(incoming == Tag::Option),
            Tag::Td | Tag::Th => closes_if(matches!(
                incoming,
                Tag::Td
                    | Tag::Th
                    | Tag::Tr
                    | Tag::Thead
                    | Tag::Tbody
                    | Tag::Tfoot
                    | Tag::Caption
                    | Tag::Colgroup
            )),
            Tag::Tr => closes_if(matches!(
                incoming,
                Tag::Tr | Tag::Thead | Tag::Tbody | Tag::Tfoot | Tag::Caption | Tag::Colgroup
            )),
            Tag::Thead | Tag::Tbody | Tag::Tfoot => closes_if(matches!(
                incoming,
                Tag::Thead | Tag::Tbody | Tag::Tfoot | Tag::Caption | Tag::Colgroup
            )),
            Tag::Caption => closes_if(incoming.is_table_structure()),
            Tag::Colgroup => {
                if incoming == Tag::Col {
                    Stop
                } else {
                    Close
                }
            }
            open if open.is_head_content() => Stop,
            open if open.is_inline() => closes_if(incoming.is_block()),
            _ => Continue,
        }
    }
}
