//! Cursor decorations. One call yields the overlay set and the native caret
//! visibility together, so a host applies both in the same update.

use crate::document::{Document, Pos, Selection};
use crate::mode::EditorMode;
use crate::visual::VisualState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decoration {
    /// One-character overlay drawn over `[from, to)`.
    BlockCursor { from: Pos, to: Pos },
    /// Zero-width widget at a block end, where no character can be overlaid.
    EndOfLineCursor { pos: Pos },
    Highlight { from: Pos, to: Pos },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
    pub version: u64,
    pub items: Vec<Decoration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaretVisibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    pub decorations: DecorationSet,
    pub caret: CaretVisibility,
}

/// Pure decoration pass over the current mode and selection.
pub fn render(doc: &dyn Document, mode: EditorMode, visual: Option<&VisualState>) -> RenderFrame {
    let mut items = Vec::new();
    let mut caret = CaretVisibility::Visible;

    if mode.shows_block_cursor() {
        let head = match (mode.is_visual(), visual) {
            (true, Some(state)) => Some(state.head),
            _ => doc.head(),
        };
        if let Some(head) = head
            && let Some(bounds) = doc.block_bounds(head)
        {
            if mode.is_visual()
                && let Some(state) = visual
            {
                let range = state.highlight(doc);
                if !range.is_empty() {
                    items.push(Decoration::Highlight {
                        from: range.start,
                        to: range.end,
                    });
                }
            }
            items.push(if head < bounds.end {
                Decoration::BlockCursor {
                    from: head,
                    to: head + 1,
                }
            } else {
                Decoration::EndOfLineCursor { pos: head }
            });
            caret = CaretVisibility::Hidden;
        }
    }

    RenderFrame {
        decorations: DecorationSet {
            version: doc.version(),
            items,
        },
        caret,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderKey {
    version: u64,
    mode: EditorMode,
    selection: Option<Selection>,
    visual: Option<VisualState>,
}

/// Memoizing wrapper around [`render`].
#[derive(Debug, Default)]
pub struct CursorRenderer {
    last_key: Option<RenderKey>,
}

impl CursorRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a frame only when something that affects the decorations
    /// changed since the previous call.
    pub fn render(
        &mut self,
        doc: &dyn Document,
        mode: EditorMode,
        visual: Option<&VisualState>,
    ) -> Option<RenderFrame> {
        let key = RenderKey {
            version: doc.version(),
            mode,
            selection: doc.selection(),
            visual: visual.copied(),
        };
        if self.last_key == Some(key) {
            return None;
        }
        self.last_key = Some(key);
        Some(render(doc, mode, visual))
    }

    pub fn invalidate(&mut self) {
        self.last_key = None;
    }
}
