//! Edit primitives. Each one issues at most a single transaction, so one
//! command is always one undo step in the document engine. A missing
//! selection turns every primitive into a no-op.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{BlockBounds, Document, DocumentError, Pos, Selection, Transaction};
use crate::register::YankRegister;
use crate::text_object::TextObject;

static CHANGE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+|\s+|[^\w\s]+)").expect("change-word pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edit {
    DeleteChar,
    DeleteLine,
    DeleteToLineEnd,
    YankLine,
    PasteAfter,
    Undo,
    Redo,
    ChangeWord,
    ChangeLine,
    ChangeToLineEnd,
    DeleteObject(TextObject),
    ChangeObject(TextObject),
    InsertBefore,
    Append,
    AppendLineEnd,
    InsertLineStart,
    OpenBelow,
    OpenAbove,
}

impl Edit {
    pub fn apply(
        self,
        doc: &mut dyn Document,
        register: &mut YankRegister,
    ) -> Result<(), DocumentError> {
        match self {
            Edit::DeleteChar => delete_char(doc),
            Edit::DeleteLine => delete_line(doc, register),
            Edit::DeleteToLineEnd => delete_to_line_end(doc, register),
            Edit::YankLine => {
                yank_line(doc, register);
                Ok(())
            }
            Edit::PasteAfter => paste_after(doc, register),
            Edit::Undo => {
                doc.undo();
                Ok(())
            }
            Edit::Redo => {
                doc.redo();
                Ok(())
            }
            Edit::ChangeWord => change_word(doc),
            Edit::ChangeLine => change_line(doc),
            Edit::ChangeToLineEnd => change_to_line_end(doc),
            Edit::DeleteObject(object) | Edit::ChangeObject(object) => {
                delete_object(doc, object)
            }
            Edit::InsertBefore => Ok(()),
            Edit::Append => {
                append(doc);
                Ok(())
            }
            Edit::AppendLineEnd => {
                move_within_line(doc, |bounds, _| bounds.end);
                Ok(())
            }
            Edit::InsertLineStart => {
                move_within_line(doc, |bounds, _| bounds.start);
                Ok(())
            }
            Edit::OpenBelow => open_below(doc),
            Edit::OpenAbove => open_above(doc),
        }
    }
}

fn current_line(doc: &dyn Document) -> Option<(Pos, BlockBounds)> {
    let head = doc.head()?;
    let bounds = doc.block_bounds(head)?;
    Some((head, bounds))
}

pub fn delete_char(doc: &mut dyn Document) -> Result<(), DocumentError> {
    let Some((head, bounds)) = current_line(doc) else {
        return Ok(());
    };
    if head >= bounds.end {
        return Ok(());
    }
    doc.dispatch(
        Transaction::new()
            .delete(head, head + 1)
            .select(Selection::caret(head)),
    )
}

/// Yanks the block's text and removes the block. The last remaining block is
/// replaced by an empty one so the document never runs out of blocks.
pub fn delete_line(
    doc: &mut dyn Document,
    register: &mut YankRegister,
) -> Result<(), DocumentError> {
    let Some((head, bounds)) = current_line(doc) else {
        return Ok(());
    };
    register.set(doc.text_between(bounds.start, bounds.end));

    let transaction = if doc.next_block(head).is_some() {
        Transaction::new()
            .delete_block(head)
            .select(Selection::caret(bounds.start))
    } else if let Some(prev) = doc.prev_block(head) {
        Transaction::new()
            .delete_block(head)
            .select(Selection::caret(prev.start))
    } else {
        Transaction::new()
            .delete_block(head)
            .insert_block(None, "")
            .select(Selection::caret(bounds.start))
    };
    doc.dispatch(transaction)
}

pub fn delete_to_line_end(
    doc: &mut dyn Document,
    register: &mut YankRegister,
) -> Result<(), DocumentError> {
    let Some((head, bounds)) = current_line(doc) else {
        return Ok(());
    };
    if head >= bounds.end {
        return Ok(());
    }
    register.set(doc.text_between(head, bounds.end));
    doc.dispatch(
        Transaction::new()
            .delete(head, bounds.end)
            .select(Selection::caret(head)),
    )
}

pub fn yank_line(doc: &dyn Document, register: &mut YankRegister) {
    if let Some((_, bounds)) = current_line(doc) {
        register.set(doc.text_between(bounds.start, bounds.end));
    }
}

/// Inserts the register as new blocks after the current one, one block per
/// line of register text, and moves the caret to the first of them.
pub fn paste_after(doc: &mut dyn Document, register: &YankRegister) -> Result<(), DocumentError> {
    let Some(text) = register.get() else {
        return Ok(());
    };
    let Some((head, bounds)) = current_line(doc) else {
        return Ok(());
    };

    let first_start = bounds.end + 2;
    let mut transaction = Transaction::new();
    let mut after = head;
    let mut next_start = first_start;
    for line in text.split('\n') {
        transaction = transaction.insert_block(Some(after), line);
        after = next_start;
        next_start += line.chars().count() + 2;
    }
    doc.dispatch(transaction.select(Selection::caret(first_start)))
}

/// Deletes the word, whitespace run or punctuation run starting at the caret.
pub fn change_word(doc: &mut dyn Document) -> Result<(), DocumentError> {
    let Some((head, bounds)) = current_line(doc) else {
        return Ok(());
    };
    let rest = doc.text_between(head, bounds.end);
    let Some(found) = CHANGE_WORD.find(&rest) else {
        return Ok(());
    };
    let len = found.as_str().chars().count();
    doc.dispatch(
        Transaction::new()
            .delete(head, head + len)
            .select(Selection::caret(head)),
    )
}

pub fn change_line(doc: &mut dyn Document) -> Result<(), DocumentError> {
    let Some((_, bounds)) = current_line(doc) else {
        return Ok(());
    };
    if bounds.is_empty() {
        doc.set_selection(Selection::caret(bounds.start));
        return Ok(());
    }
    doc.dispatch(
        Transaction::new()
            .delete(bounds.start, bounds.end)
            .select(Selection::caret(bounds.start)),
    )
}

pub fn change_to_line_end(doc: &mut dyn Document) -> Result<(), DocumentError> {
    let Some((head, bounds)) = current_line(doc) else {
        return Ok(());
    };
    if head >= bounds.end {
        return Ok(());
    }
    doc.dispatch(
        Transaction::new()
            .delete(head, bounds.end)
            .select(Selection::caret(head)),
    )
}

/// Removes the object's range without touching the register. Both the delete
/// and the change flavours land here; the caller decides the mode afterwards.
pub fn delete_object(doc: &mut dyn Document, object: TextObject) -> Result<(), DocumentError> {
    let Some(head) = doc.head() else {
        return Ok(());
    };
    let Some(range) = object.resolve(doc, head) else {
        return Ok(());
    };
    if range.is_empty() {
        doc.set_selection(Selection::caret(range.start));
        return Ok(());
    }
    doc.dispatch(
        Transaction::new()
            .delete(range.start, range.end)
            .select(Selection::caret(range.start)),
    )
}

fn append(doc: &mut dyn Document) {
    move_within_line(doc, |bounds, head| (head + 1).min(bounds.end));
}

fn move_within_line(doc: &mut dyn Document, target: impl Fn(BlockBounds, Pos) -> Pos) {
    if let Some((head, bounds)) = current_line(doc) {
        doc.set_selection(Selection::caret(target(bounds, head)));
    }
}

pub fn open_below(doc: &mut dyn Document) -> Result<(), DocumentError> {
    let Some((head, bounds)) = current_line(doc) else {
        return Ok(());
    };
    doc.dispatch(
        Transaction::new()
            .insert_block(Some(head), "")
            .select(Selection::caret(bounds.end + 2)),
    )
}

pub fn open_above(doc: &mut dyn Document) -> Result<(), DocumentError> {
    let Some((head, bounds)) = current_line(doc) else {
        return Ok(());
    };
    let after = doc.prev_block(head).map(|prev| prev.start);
    doc.dispatch(
        Transaction::new()
            .insert_block(after, "")
            .select(Selection::caret(bounds.start)),
    )
}

/// Native text input: replaces the selection with `text`. Line breaks split
/// the block, carrying the text after the caret into the last new block.
pub fn insert_text(doc: &mut dyn Document, text: &str) -> Result<(), DocumentError> {
    let Some(selection) = doc.selection() else {
        return Ok(());
    };
    let (from, to) = (selection.from(), selection.to());
    let Some(bounds) = doc.block_bounds(from) else {
        return Ok(());
    };

    let mut lines = text.split('\n');
    let first = lines.next().unwrap_or_default();
    let rest = lines.collect::<Vec<_>>();
    if rest.is_empty() {
        return doc.dispatch(
            Transaction::new()
                .delete(from, to)
                .insert(from, first)
                .select(Selection::caret(from + first.chars().count())),
        );
    }

    let tail_end = doc.block_bounds(to).map_or(bounds.end, |tail| tail.end);
    let tail = doc.text_between(to, tail_end);
    let mut transaction = Transaction::new().delete(from, tail_end).insert(from, first);
    let mut after = from;
    let mut start = from + first.chars().count() + 2;
    let mut caret = start;
    for (idx, line) in rest.iter().enumerate() {
        let block = if idx + 1 == rest.len() {
            caret = start + line.chars().count();
            format!("{line}{tail}")
        } else {
            line.to_string()
        };
        let len = block.chars().count();
        transaction = transaction.insert_block(Some(after), block);
        after = start;
        start += len + 2;
    }
    doc.dispatch(transaction.select(Selection::caret(caret)))
}

/// Native backspace: removes the selection or the char before the caret,
/// joining with the previous block at a block start.
pub fn delete_before_caret(doc: &mut dyn Document) -> Result<(), DocumentError> {
    let Some(selection) = doc.selection() else {
        return Ok(());
    };
    let (from, to) = if !selection.is_empty() {
        (selection.from(), selection.to())
    } else {
        let head = selection.head;
        let Some(bounds) = doc.block_bounds(head) else {
            return Ok(());
        };
        if head > bounds.start {
            (head - 1, head)
        } else if let Some(prev) = doc.prev_block(head) {
            (prev.end, head)
        } else {
            return Ok(());
        }
    };
    doc.dispatch(
        Transaction::new()
            .delete(from, to)
            .select(Selection::caret(from)),
    )
}
