//! Visual-mode selection state and operator application.

use std::ops::Range;

use crate::document::{BlockBounds, Document, DocumentError, Pos, Selection, Transaction};
use crate::keymap::Operator;
use crate::register::YankRegister;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualAnchor {
    Char(Pos),
    Line { start: Pos, end: Pos },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualState {
    pub anchor: VisualAnchor,
    pub head: Pos,
}

impl VisualState {
    pub fn char_wise(head: Pos) -> Self {
        Self {
            anchor: VisualAnchor::Char(head),
            head,
        }
    }

    pub fn line_wise(doc: &dyn Document, head: Pos) -> Option<Self> {
        let bounds = doc.block_bounds(head)?;
        Some(Self {
            anchor: VisualAnchor::Line {
                start: bounds.start,
                end: bounds.end,
            },
            head,
        })
    }

    pub fn is_line_wise(&self) -> bool {
        matches!(self.anchor, VisualAnchor::Line { .. })
    }

    /// Switches to character-wise selection, re-anchoring at the start of a
    /// line-wise anchor.
    pub fn into_char_wise(self) -> Self {
        let anchor = match self.anchor {
            VisualAnchor::Char(pos) => pos,
            VisualAnchor::Line { start, .. } => start,
        };
        Self {
            anchor: VisualAnchor::Char(anchor),
            head: self.head,
        }
    }

    /// Switches to line-wise selection, expanding the anchor to its line.
    pub fn into_line_wise(self, doc: &dyn Document) -> Option<Self> {
        let anchor = match self.anchor {
            VisualAnchor::Char(pos) => {
                let bounds = doc.block_bounds(pos)?;
                VisualAnchor::Line {
                    start: bounds.start,
                    end: bounds.end,
                }
            }
            line @ VisualAnchor::Line { .. } => line,
        };
        Some(Self {
            anchor,
            head: self.head,
        })
    }

    /// Selection mirrored into the document while the mode is active.
    pub fn live_selection(&self, doc: &dyn Document) -> Selection {
        match self.anchor {
            VisualAnchor::Char(anchor) => Selection::range(anchor, self.head),
            VisualAnchor::Line { .. } => {
                let union = self.line_union(doc);
                Selection::range(union.start, union.end)
            }
        }
    }

    /// Range drawn as highlighted: `min..max` character-wise, the line union
    /// line-wise.
    pub fn highlight(&self, doc: &dyn Document) -> Range<Pos> {
        match self.anchor {
            VisualAnchor::Char(anchor) => anchor.min(self.head)..anchor.max(self.head),
            VisualAnchor::Line { .. } => self.line_union(doc),
        }
    }

    /// Range operators act on. Character-wise ranges include the char under
    /// the later end, clamped to that block's end.
    pub fn effective_range(&self, doc: &dyn Document) -> Range<Pos> {
        match self.anchor {
            VisualAnchor::Char(anchor) => {
                let from = anchor.min(self.head);
                let last = anchor.max(self.head);
                let to = doc
                    .block_bounds(last)
                    .map_or(last, |bounds| (last + 1).min(bounds.end));
                from..to
            }
            VisualAnchor::Line { .. } => self.line_union(doc),
        }
    }

    fn line_union(&self, doc: &dyn Document) -> Range<Pos> {
        let (start, end) = match self.anchor {
            VisualAnchor::Line { start, end } => (start, end),
            VisualAnchor::Char(pos) => (pos, pos),
        };
        match doc.block_bounds(self.head) {
            Some(head_line) => start.min(head_line.start)..end.max(head_line.end),
            None => start..end,
        }
    }
}

/// Yanks the effective range, then deletes or changes it. Returns the caret
/// position to restore once the visual mode is left.
pub fn apply_operator(
    doc: &mut dyn Document,
    register: &mut YankRegister,
    state: &VisualState,
    operator: Operator,
) -> Result<Pos, DocumentError> {
    let range = state.effective_range(doc);
    register.set(doc.text_between(range.start, range.end));

    match operator {
        Operator::Yank => Ok(range.start),
        Operator::Delete if state.is_line_wise() => delete_lines(doc, range),
        Operator::Delete | Operator::Change => {
            if !range.is_empty() {
                doc.dispatch(
                    Transaction::new()
                        .delete(range.start, range.end)
                        .select(Selection::caret(range.start)),
                )?;
            }
            Ok(range.start)
        }
    }
}

/// Removes every block touched by `range`, keeping at least one empty block.
fn delete_lines(doc: &mut dyn Document, range: Range<Pos>) -> Result<Pos, DocumentError> {
    let Some(first) = doc.block_bounds(range.start) else {
        return Ok(range.start);
    };
    let mut last = first;
    let mut count = 1usize;
    while last.end < range.end {
        let Some(next) = doc.next_block(last.start) else {
            break;
        };
        last = next;
        count += 1;
    }

    let mut transaction = Transaction::new();
    for _ in 0..count {
        transaction = transaction.delete_block(first.start);
    }
    let caret = match (doc.next_block(last.start), doc.prev_block(first.start)) {
        (Some(_), _) => first.start,
        (None, Some(BlockBounds { start, .. })) => start,
        (None, None) => {
            transaction = transaction.insert_block(None, "");
            first.start
        }
    };
    doc.dispatch(transaction.select(Selection::caret(caret)))?;
    Ok(caret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;

    fn doc(text: &str) -> MemoryDocument {
        MemoryDocument::from_text(text)
    }

    #[test]
    fn char_wise_effective_range_should_include_last_char() {
        let doc = doc("hello world");
        let state = VisualState {
            anchor: VisualAnchor::Char(4),
            head: 2,
        };
        assert_eq!(state.highlight(&doc), 2..4);
        assert_eq!(state.effective_range(&doc), 2..5);
    }

    #[test]
    fn char_wise_effective_range_should_clamp_to_block_end() {
        let doc = doc("abc\ndef");
        let state = VisualState {
            anchor: VisualAnchor::Char(2),
            head: 4,
        };
        assert_eq!(state.effective_range(&doc), 2..4);
    }

    #[test]
    fn line_wise_range_should_cover_anchor_and_head_lines() {
        let doc = doc("one\ntwo\nthree");
        let state = VisualState::line_wise(&doc, 7)
            .expect("line")
            .into_line_wise(&doc)
            .expect("line");
        let moved = VisualState { head: 2, ..state };
        assert_eq!(moved.effective_range(&doc), 1..9);
        assert_eq!(moved.live_selection(&doc), Selection::range(1, 9));
    }

    #[test]
    fn switching_to_char_wise_should_anchor_at_line_start() {
        let doc = doc("one\ntwo");
        let state = VisualState::line_wise(&doc, 8).expect("line");
        let switched = state.into_char_wise();
        assert_eq!(switched.anchor, VisualAnchor::Char(6));
        assert!(!switched.is_line_wise());
    }

    #[test]
    fn yank_operator_should_copy_without_deleting() {
        let mut doc = doc("hello world");
        let mut register = YankRegister::new();
        let state = VisualState {
            anchor: VisualAnchor::Char(1),
            head: 4,
        };
        let caret = apply_operator(&mut doc, &mut register, &state, Operator::Yank).expect("yank");
        assert_eq!(register.get(), Some("hell"));
        assert_eq!(caret, 1);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn delete_operator_should_remove_effective_range() {
        let mut doc = doc("hello world");
        let mut register = YankRegister::new();
        let state = VisualState {
            anchor: VisualAnchor::Char(7),
            head: 10,
        };
        apply_operator(&mut doc, &mut register, &state, Operator::Delete).expect("delete");
        assert_eq!(doc.blocks(), ["hello d"]);
        assert_eq!(register.get(), Some("worl"));
    }

    #[test]
    fn line_wise_delete_should_remove_whole_blocks() {
        let mut doc = doc("one\ntwo\nthree");
        let mut register = YankRegister::new();
        let state = VisualState {
            head: 6,
            ..VisualState::line_wise(&doc, 2).expect("line")
        };
        let caret =
            apply_operator(&mut doc, &mut register, &state, Operator::Delete).expect("delete");
        assert_eq!(doc.blocks(), ["three"]);
        assert_eq!(register.get(), Some("one\ntwo"));
        assert_eq!(caret, 1);
        assert_eq!(doc.undo_depth(), 1);
    }

    #[test]
    fn line_wise_delete_of_everything_should_leave_empty_block() {
        let mut doc = doc("one\ntwo");
        let mut register = YankRegister::new();
        let state = VisualState {
            head: 7,
            ..VisualState::line_wise(&doc, 1).expect("line")
        };
        apply_operator(&mut doc, &mut register, &state, Operator::Delete).expect("delete");
        assert_eq!(doc.blocks(), [""]);
    }

    #[test]
    fn line_wise_change_should_leave_one_empty_block() {
        let mut doc = doc("one\ntwo\nthree");
        let mut register = YankRegister::new();
        let state = VisualState {
            head: 6,
            ..VisualState::line_wise(&doc, 2).expect("line")
        };
        let caret =
            apply_operator(&mut doc, &mut register, &state, Operator::Change).expect("change");
        assert_eq!(doc.blocks(), ["", "three"]);
        assert_eq!(caret, 1);
    }
}
