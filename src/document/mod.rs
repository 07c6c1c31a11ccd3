//! Capability interface to the structured rich-text engine.
//!
//! The modal layer never owns document content. It reads the selection and
//! block structure through [`Document`] and writes exclusively through
//! [`Transaction`]s, so the engine's own undo history stays authoritative.

use thiserror::Error;

mod memory;

pub use memory::{LayoutMetrics, MemoryDocument};

/// Document-wide offset.
pub type Pos = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub anchor: Pos,
    pub head: Pos,
}

impl Selection {
    pub fn caret(pos: Pos) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    pub fn range(anchor: Pos, head: Pos) -> Self {
        Self { anchor, head }
    }

    pub fn from(&self) -> Pos {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> Pos {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// Text extent of one block (the line-equivalent unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockBounds {
    pub start: Pos,
    pub end: Pos,
}

impl BlockBounds {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos >= self.start && pos <= self.end
    }
}

/// Screen rectangle of a caret position, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coords {
    pub left: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Delete { from: Pos, to: Pos },
    Insert { at: Pos, text: String },
    /// New block after the block containing `after`, or at document start.
    InsertBlock { after: Option<Pos>, text: String },
    DeleteBlock { at: Pos },
}

/// Atomic unit of mutation. Steps apply in order; each step's positions refer
/// to the document as left by the previous step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub steps: Vec<Step>,
    pub selection_after: Option<Selection>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete(mut self, from: Pos, to: Pos) -> Self {
        self.steps.push(Step::Delete { from, to });
        self
    }

    pub fn insert(mut self, at: Pos, text: impl Into<String>) -> Self {
        self.steps.push(Step::Insert {
            at,
            text: text.into(),
        });
        self
    }

    pub fn insert_block(mut self, after: Option<Pos>, text: impl Into<String>) -> Self {
        self.steps.push(Step::InsertBlock {
            after,
            text: text.into(),
        });
        self
    }

    pub fn delete_block(mut self, at: Pos) -> Self {
        self.steps.push(Step::DeleteBlock { at });
        self
    }

    pub fn select(mut self, selection: Selection) -> Self {
        self.selection_after = Some(selection);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.selection_after.is_none()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("position {pos} is not inside any block")]
    InvalidPosition { pos: Pos },
    #[error("range {from}..{to} is inverted or out of bounds")]
    InvalidRange { from: Pos, to: Pos },
    #[error("inline text must not contain line breaks")]
    LineBreakInInlineText,
    #[error("transaction would leave the document without blocks")]
    EmptyDocument,
}

pub type ChangeListener = Box<dyn FnMut(u64)>;

pub trait Document {
    /// `None` when the editing surface has no live selection (e.g. torn down).
    fn selection(&self) -> Option<Selection>;

    fn block_bounds(&self, pos: Pos) -> Option<BlockBounds>;

    fn prev_block(&self, pos: Pos) -> Option<BlockBounds>;

    fn next_block(&self, pos: Pos) -> Option<BlockBounds>;

    /// Text in `[from, to)`; block boundaries are rendered as `\n`.
    fn text_between(&self, from: Pos, to: Pos) -> String;

    fn start_position(&self) -> Option<Pos>;

    fn end_position(&self) -> Option<Pos>;

    fn coords_at(&self, pos: Pos) -> Option<Coords>;

    fn pos_at_point(&self, point: Point) -> Option<Pos>;

    fn set_selection(&mut self, selection: Selection);

    fn dispatch(&mut self, transaction: Transaction) -> Result<(), DocumentError>;

    fn undo(&mut self) -> bool;

    fn redo(&mut self) -> bool;

    fn version(&self) -> u64;

    fn on_change(&mut self, listener: ChangeListener);

    fn head(&self) -> Option<Pos> {
        self.selection().map(|selection| selection.head)
    }
}

/// Byte index of the `char_idx`-th char, clamped to the string length.
pub(crate) fn char_to_byte_idx(s: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    s.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}
