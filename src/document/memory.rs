use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_width::UnicodeWidthChar;

use super::{
    BlockBounds, ChangeListener, Coords, Document, DocumentError, Point, Pos, Selection, Step,
    Transaction, char_to_byte_idx,
};

/// Monospace layout used to answer screen-coordinate probes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub wrap_columns: usize,
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            wrap_columns: 80,
            char_width: 8.0,
            line_height: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryEntry {
    before: Vec<String>,
    after: Vec<String>,
    before_selection: Selection,
    after_selection: Selection,
}

/// In-process document engine: a flat list of text blocks addressed through
/// the block-token position model (`start_0 = 1`, `start_{i+1} = end_i + 2`).
pub struct MemoryDocument {
    blocks: Vec<String>,
    selection: Option<Selection>,
    version: u64,
    layout: LayoutMetrics,
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    listeners: Vec<ChangeListener>,
}

impl MemoryDocument {
    const MAX_HISTORY_ENTRIES: usize = 256;
    const FIRST_BLOCK_START: Pos = 1;

    pub fn new() -> Self {
        Self::from_blocks(vec![String::new()])
    }

    /// One block per line.
    pub fn from_text(text: &str) -> Self {
        Self::from_blocks(split_blocks(text))
    }

    pub fn from_blocks(blocks: Vec<String>) -> Self {
        let blocks = if blocks.is_empty() {
            vec![String::new()]
        } else {
            blocks
        };
        Self {
            blocks,
            selection: Some(Selection::caret(Self::FIRST_BLOCK_START)),
            version: 0,
            layout: LayoutMetrics::default(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn with_layout(mut self, layout: LayoutMetrics) -> Self {
        self.layout = LayoutMetrics {
            wrap_columns: layout.wrap_columns.max(1),
            ..layout
        };
        self
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn to_text(&self) -> String {
        self.blocks.join("\n")
    }

    /// Start offset of the block at `index`.
    pub fn block_start(&self, index: usize) -> Option<Pos> {
        (index < self.blocks.len()).then(|| block_start(&self.blocks, index))
    }

    /// Drops the live selection, as a torn-down editing surface would.
    pub fn detach_selection(&mut self) {
        self.selection = None;
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    fn bounds_of(&self, index: usize) -> BlockBounds {
        bounds_of(&self.blocks, index)
    }

    fn push_history_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        if self.undo_stack.len() > Self::MAX_HISTORY_ENTRIES {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    fn bump_version(&mut self) {
        self.version = self.version.saturating_add(1);
        let version = self.version;
        for listener in &mut self.listeners {
            listener(version);
        }
    }

    fn visual_rows(&self, text: &str) -> usize {
        let width = display_width(text);
        width.div_ceil(self.layout.wrap_columns).max(1)
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("blocks", &self.blocks)
            .field("selection", &self.selection)
            .field("version", &self.version)
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .finish_non_exhaustive()
    }
}

impl Document for MemoryDocument {
    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn block_bounds(&self, pos: Pos) -> Option<BlockBounds> {
        locate(&self.blocks, pos).map(|(index, _)| self.bounds_of(index))
    }

    fn prev_block(&self, pos: Pos) -> Option<BlockBounds> {
        let (index, _) = locate(&self.blocks, pos)?;
        index.checked_sub(1).map(|prev| self.bounds_of(prev))
    }

    fn next_block(&self, pos: Pos) -> Option<BlockBounds> {
        let (index, _) = locate(&self.blocks, pos)?;
        let next = index.saturating_add(1);
        (next < self.blocks.len()).then(|| self.bounds_of(next))
    }

    fn text_between(&self, from: Pos, to: Pos) -> String {
        if from >= to {
            return String::new();
        }
        let mut pieces = Vec::new();
        let mut start = Self::FIRST_BLOCK_START;
        for block in &self.blocks {
            let len = block.chars().count();
            let end = start.saturating_add(len);
            if end >= from && start <= to {
                let take_from = from.max(start).saturating_sub(start);
                let take_to = to.min(end).saturating_sub(start);
                pieces.push(
                    block
                        .chars()
                        .skip(take_from)
                        .take(take_to.saturating_sub(take_from))
                        .collect::<String>(),
                );
            }
            start = end.saturating_add(2);
        }
        pieces.join("\n")
    }

    fn start_position(&self) -> Option<Pos> {
        (!self.blocks.is_empty()).then_some(Self::FIRST_BLOCK_START)
    }

    fn end_position(&self) -> Option<Pos> {
        let last = self.blocks.len().checked_sub(1)?;
        Some(self.bounds_of(last).end)
    }

    fn coords_at(&self, pos: Pos) -> Option<Coords> {
        let (index, offset) = locate(&self.blocks, pos)?;
        let rows_before = self.blocks[..index]
            .iter()
            .map(|block| self.visual_rows(block))
            .sum::<usize>();
        let block = &self.blocks[index];
        let wrap = self.layout.wrap_columns;
        let col = display_width_of_char_prefix(block, offset);
        let at_block_end = offset == block.chars().count();
        let (row, x_col) = if col > 0 && col % wrap == 0 && at_block_end {
            (col / wrap - 1, wrap)
        } else {
            (col / wrap, col % wrap)
        };
        let top = (rows_before + row) as f32 * self.layout.line_height;
        Some(Coords {
            left: x_col as f32 * self.layout.char_width,
            top,
            bottom: top + self.layout.line_height,
        })
    }

    fn pos_at_point(&self, point: Point) -> Option<Pos> {
        if point.y < 0.0 {
            return None;
        }
        let target_row = (point.y / self.layout.line_height).floor() as usize;
        let wrap = self.layout.wrap_columns;
        let mut rows_seen = 0usize;
        for (index, block) in self.blocks.iter().enumerate() {
            let rows = self.visual_rows(block);
            if target_row >= rows_seen + rows {
                rows_seen += rows;
                continue;
            }
            let row_in_block = target_row - rows_seen;
            let x_cols = (point.x.max(0.0) / self.layout.char_width).round() as usize;
            let row_end_col = ((row_in_block + 1) * wrap).min(display_width(block));
            let target_col = (row_in_block * wrap + x_cols.min(wrap)).min(row_end_col);
            let offset = char_offset_at_display_col(block, target_col);
            return Some(self.bounds_of(index).start + offset);
        }
        None
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(clamp_selection(&self.blocks, selection));
    }

    fn dispatch(&mut self, transaction: Transaction) -> Result<(), DocumentError> {
        if transaction.steps.is_empty() {
            if let Some(selection) = transaction.selection_after {
                self.set_selection(selection);
            }
            return Ok(());
        }

        let mut blocks = self.blocks.clone();
        for step in &transaction.steps {
            apply_step(&mut blocks, step)?;
        }
        if blocks.is_empty() {
            return Err(DocumentError::EmptyDocument);
        }

        let before_selection = self
            .selection
            .unwrap_or(Selection::caret(Self::FIRST_BLOCK_START));
        let after_selection = clamp_selection(
            &blocks,
            transaction.selection_after.unwrap_or(before_selection),
        );
        let before = std::mem::replace(&mut self.blocks, blocks);
        self.push_history_entry(HistoryEntry {
            before,
            after: self.blocks.clone(),
            before_selection,
            after_selection,
        });
        self.selection = Some(after_selection);
        debug!(steps = transaction.steps.len(), "transaction applied");
        self.bump_version();
        Ok(())
    }

    fn undo(&mut self) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        self.blocks = entry.before.clone();
        self.selection = Some(entry.before_selection);
        self.redo_stack.push(entry);
        if self.redo_stack.len() > Self::MAX_HISTORY_ENTRIES {
            self.redo_stack.remove(0);
        }
        self.bump_version();
        true
    }

    fn redo(&mut self) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        self.blocks = entry.after.clone();
        self.selection = Some(entry.after_selection);
        self.undo_stack.push(entry);
        if self.undo_stack.len() > Self::MAX_HISTORY_ENTRIES {
            self.undo_stack.remove(0);
        }
        self.bump_version();
        true
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }
}

fn split_blocks(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

fn block_start(blocks: &[String], index: usize) -> Pos {
    MemoryDocument::FIRST_BLOCK_START
        + blocks[..index]
            .iter()
            .map(|block| block.chars().count() + 2)
            .sum::<usize>()
}

fn bounds_of(blocks: &[String], index: usize) -> BlockBounds {
    let start = block_start(blocks, index);
    BlockBounds {
        start,
        end: start + blocks[index].chars().count(),
    }
}

/// Block index and char offset for a position inside a block's text.
fn locate(blocks: &[String], pos: Pos) -> Option<(usize, usize)> {
    let mut start = MemoryDocument::FIRST_BLOCK_START;
    for (index, block) in blocks.iter().enumerate() {
        let end = start + block.chars().count();
        if pos < start {
            return None;
        }
        if pos <= end {
            return Some((index, pos - start));
        }
        start = end + 2;
    }
    None
}

fn clamp_pos(blocks: &[String], pos: Pos) -> Pos {
    let mut start = MemoryDocument::FIRST_BLOCK_START;
    let mut last_end = start;
    for block in blocks {
        let end = start + block.chars().count();
        if pos < start {
            return last_end.max(MemoryDocument::FIRST_BLOCK_START).min(start);
        }
        if pos <= end {
            return pos;
        }
        last_end = end;
        start = end + 2;
    }
    last_end
}

fn clamp_selection(blocks: &[String], selection: Selection) -> Selection {
    Selection {
        anchor: clamp_pos(blocks, selection.anchor),
        head: clamp_pos(blocks, selection.head),
    }
}

fn apply_step(blocks: &mut Vec<String>, step: &Step) -> Result<(), DocumentError> {
    match step {
        Step::Delete { from, to } => {
            if from > to {
                return Err(DocumentError::InvalidRange {
                    from: *from,
                    to: *to,
                });
            }
            let (from_index, from_offset) =
                locate(blocks, *from).ok_or(DocumentError::InvalidPosition { pos: *from })?;
            let (to_index, to_offset) =
                locate(blocks, *to).ok_or(DocumentError::InvalidPosition { pos: *to })?;
            if from_index == to_index {
                let line = &mut blocks[from_index];
                let start = char_to_byte_idx(line, from_offset);
                let end = char_to_byte_idx(line, to_offset);
                line.drain(start..end);
            } else {
                let head_keep = char_to_byte_idx(&blocks[from_index], from_offset);
                let tail_keep = char_to_byte_idx(&blocks[to_index], to_offset);
                let merged = format!(
                    "{}{}",
                    &blocks[from_index][..head_keep],
                    &blocks[to_index][tail_keep..]
                );
                blocks[from_index] = merged;
                blocks.drain(from_index + 1..=to_index);
            }
        }
        Step::Insert { at, text } => {
            if text.contains('\n') {
                return Err(DocumentError::LineBreakInInlineText);
            }
            let (index, offset) =
                locate(blocks, *at).ok_or(DocumentError::InvalidPosition { pos: *at })?;
            let line = &mut blocks[index];
            let byte_idx = char_to_byte_idx(line, offset);
            line.insert_str(byte_idx, text);
        }
        Step::InsertBlock { after, text } => {
            if text.contains('\n') {
                return Err(DocumentError::LineBreakInInlineText);
            }
            let insert_at = match after {
                Some(pos) => {
                    locate(blocks, *pos)
                        .ok_or(DocumentError::InvalidPosition { pos: *pos })?
                        .0
                        + 1
                }
                None => 0,
            };
            blocks.insert(insert_at, text.clone());
        }
        Step::DeleteBlock { at } => {
            let (index, _) =
                locate(blocks, *at).ok_or(DocumentError::InvalidPosition { pos: *at })?;
            blocks.remove(index);
        }
    }
    Ok(())
}

fn display_width(line: &str) -> usize {
    line.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

fn display_width_of_char_prefix(line: &str, char_count: usize) -> usize {
    line.chars()
        .take(char_count)
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

fn char_offset_at_display_col(line: &str, target_col: usize) -> usize {
    let mut acc = 0usize;
    for (offset, ch) in line.chars().enumerate() {
        if acc >= target_col {
            return offset;
        }
        let width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if acc + width > target_col {
            return offset;
        }
        acc += width;
    }
    line.chars().count()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn doc(text: &str) -> MemoryDocument {
        MemoryDocument::from_text(text)
    }

    #[test]
    fn block_bounds_should_follow_token_offsets() {
        let doc = doc("first\nsecond");
        assert_eq!(doc.block_bounds(1), Some(BlockBounds { start: 1, end: 6 }));
        assert_eq!(doc.block_bounds(8), Some(BlockBounds { start: 8, end: 14 }));
        assert_eq!(doc.block_bounds(7), None);
        assert_eq!(doc.end_position(), Some(14));
    }

    #[test]
    fn text_between_should_join_blocks_with_newline() {
        let doc = doc("first\nsecond");
        assert_eq!(doc.text_between(1, 6), "first");
        assert_eq!(doc.text_between(3, 10), "rst\nse");
        assert_eq!(doc.text_between(6, 8), "\n");
        assert_eq!(doc.text_between(4, 4), "");
    }

    #[test]
    fn delete_across_blocks_should_merge_boundary_blocks() {
        let mut doc = doc("first\nsecond\nthird");
        doc.dispatch(Transaction::new().delete(3, 10)).expect("delete");
        assert_eq!(doc.blocks(), ["ficond", "third"]);
    }

    #[test]
    fn failed_step_should_leave_document_untouched() {
        let mut doc = doc("abc");
        let result = doc.dispatch(Transaction::new().delete(1, 2).insert(40, "x"));
        assert_eq!(result, Err(DocumentError::InvalidPosition { pos: 40 }));
        assert_eq!(doc.blocks(), ["abc"]);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn deleting_last_block_should_be_rejected() {
        let mut doc = doc("only");
        let result = doc.dispatch(Transaction::new().delete_block(1));
        assert_eq!(result, Err(DocumentError::EmptyDocument));
        assert_eq!(doc.blocks(), ["only"]);
    }

    #[test]
    fn insert_block_should_support_document_start() {
        let mut doc = doc("b");
        doc.dispatch(Transaction::new().insert_block(None, "a"))
            .expect("insert");
        doc.dispatch(Transaction::new().insert_block(Some(4), "c"))
            .expect("insert");
        assert_eq!(doc.blocks(), ["a", "b", "c"]);
    }

    #[test]
    fn undo_redo_should_restore_blocks_and_selection() {
        let mut doc = doc("hello");
        doc.dispatch(
            Transaction::new()
                .delete(1, 3)
                .select(Selection::caret(1)),
        )
        .expect("delete");
        assert_eq!(doc.blocks(), ["llo"]);

        assert!(doc.undo());
        assert_eq!(doc.blocks(), ["hello"]);
        assert_eq!(doc.selection(), Some(Selection::caret(1)));

        assert!(doc.redo());
        assert_eq!(doc.blocks(), ["llo"]);
        assert!(!doc.redo());
    }

    #[test]
    fn new_edit_should_clear_redo_stack() {
        let mut doc = doc("hello");
        doc.dispatch(Transaction::new().delete(1, 2)).expect("delete");
        assert!(doc.undo());
        doc.dispatch(Transaction::new().insert(1, "j")).expect("insert");
        assert!(!doc.redo());
    }

    #[test]
    fn history_should_be_bounded() {
        let mut doc = doc("");
        for _ in 0..300 {
            doc.dispatch(Transaction::new().insert(1, "x")).expect("insert");
        }
        assert_eq!(doc.undo_depth(), MemoryDocument::MAX_HISTORY_ENTRIES);
    }

    #[test]
    fn listeners_should_receive_new_versions() {
        let mut doc = doc("abc");
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        doc.on_change(Box::new(move |version| sink.set(version)));

        doc.dispatch(Transaction::new().delete(1, 2)).expect("delete");
        assert_eq!(seen.get(), 1);
        doc.undo();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn set_selection_should_clamp_between_blocks() {
        let mut doc = doc("ab\ncd");
        doc.set_selection(Selection::caret(4));
        assert_eq!(doc.head(), Some(3));
        doc.set_selection(Selection::caret(99));
        assert_eq!(doc.head(), Some(7));
        doc.set_selection(Selection::caret(0));
        assert_eq!(doc.head(), Some(1));
    }

    #[test]
    fn coordinate_probe_should_round_trip_on_same_row() {
        let doc = doc("hello\nworld");
        let coords = doc.coords_at(3).expect("coords");
        assert_eq!(coords.top, 0.0);
        let pos = doc.pos_at_point(Point {
            x: coords.left,
            y: coords.top + 1.0,
        });
        assert_eq!(pos, Some(3));

        let below = doc.pos_at_point(Point {
            x: coords.left,
            y: coords.bottom + 10.0,
        });
        assert_eq!(below, Some(10));
    }

    #[test]
    fn coordinate_probe_should_follow_soft_wrapped_rows() {
        let doc = doc("abcdefgh\nxy").with_layout(LayoutMetrics {
            wrap_columns: 4,
            ..LayoutMetrics::default()
        });
        let coords = doc.coords_at(7).expect("coords");
        assert_eq!(coords.top, 20.0);
        assert_eq!(coords.left, 16.0);

        let above = doc.pos_at_point(Point {
            x: coords.left,
            y: coords.top - 10.0,
        });
        assert_eq!(above, Some(3));
        assert_eq!(doc.pos_at_point(Point { x: 0.0, y: 200.0 }), None);
    }

    #[test]
    fn wide_chars_should_use_display_width() {
        let doc = doc("日本語\nabcdef");
        let coords = doc.coords_at(3).expect("coords");
        assert_eq!(coords.left, 32.0);
        let below = doc.pos_at_point(Point {
            x: coords.left,
            y: coords.bottom + 10.0,
        });
        assert_eq!(below, Some(10));
    }
}
