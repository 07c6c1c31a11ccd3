//! Movement primitives. Every resolver is a pure read of the document; `None`
//! means the motion is a no-op at the current position.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Document, Point, Pos, char_to_byte_idx};

static WORD_FORWARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w*\W+\w").expect("word-forward pattern is valid"));
static WORD_BACKWARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+\W*$").expect("word-backward pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    CharLeft,
    CharRight,
    LineUp,
    LineDown,
    WordForward,
    WordBackward,
    LineStart,
    LineEnd,
    DocStart,
    DocEnd,
}

impl Motion {
    pub fn resolve(self, doc: &dyn Document, head: Pos) -> Option<Pos> {
        let target = match self {
            Motion::CharLeft => char_left(doc, head),
            Motion::CharRight => char_right(doc, head),
            Motion::LineUp => line_up(doc, head),
            Motion::LineDown => line_down(doc, head),
            Motion::WordForward => word_forward(doc, head),
            Motion::WordBackward => word_backward(doc, head),
            Motion::LineStart => line_start(doc, head),
            Motion::LineEnd => line_end(doc, head),
            Motion::DocStart => doc.start_position(),
            Motion::DocEnd => doc.end_position(),
        }?;
        (target != head).then_some(target)
    }
}

pub fn char_left(doc: &dyn Document, head: Pos) -> Option<Pos> {
    let bounds = doc.block_bounds(head)?;
    (head > bounds.start).then(|| head - 1)
}

pub fn char_right(doc: &dyn Document, head: Pos) -> Option<Pos> {
    let bounds = doc.block_bounds(head)?;
    (head < bounds.end).then(|| head + 1)
}

pub fn line_up(doc: &dyn Document, head: Pos) -> Option<Pos> {
    let coords = doc.coords_at(head)?;
    let half_line = (coords.bottom - coords.top) / 2.0;
    doc.pos_at_point(Point {
        x: coords.left,
        y: coords.top - half_line,
    })
}

pub fn line_down(doc: &dyn Document, head: Pos) -> Option<Pos> {
    let coords = doc.coords_at(head)?;
    let half_line = (coords.bottom - coords.top) / 2.0;
    doc.pos_at_point(Point {
        x: coords.left,
        y: coords.bottom + half_line,
    })
}

/// Start of the next word in the block, else the next block's start.
pub fn word_forward(doc: &dyn Document, head: Pos) -> Option<Pos> {
    let bounds = doc.block_bounds(head)?;
    let text = doc.text_between(bounds.start, bounds.end);
    let offset = head - bounds.start;
    let after = &text[char_to_byte_idx(&text, offset)..];
    if let Some(found) = WORD_FORWARD.find(after) {
        let consumed = found.as_str().chars().count();
        return Some(head + consumed - 1);
    }
    if let Some(next) = doc.next_block(head) {
        return Some(next.start);
    }
    (head < bounds.end).then_some(bounds.end)
}

/// Start of the word before the cursor, else the previous block's end.
pub fn word_backward(doc: &dyn Document, head: Pos) -> Option<Pos> {
    let bounds = doc.block_bounds(head)?;
    let text = doc.text_between(bounds.start, bounds.end);
    let offset = head - bounds.start;
    let before = &text[..char_to_byte_idx(&text, offset)];
    if let Some(found) = WORD_BACKWARD.find(before) {
        return Some(bounds.start + before[..found.start()].chars().count());
    }
    if let Some(prev) = doc.prev_block(head) {
        return Some(prev.end);
    }
    (head > bounds.start).then_some(bounds.start)
}

pub fn line_start(doc: &dyn Document, head: Pos) -> Option<Pos> {
    doc.block_bounds(head).map(|bounds| bounds.start)
}

pub fn line_end(doc: &dyn Document, head: Pos) -> Option<Pos> {
    doc.block_bounds(head).map(|bounds| bounds.end)
}
