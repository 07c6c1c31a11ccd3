#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditorMode {
    #[default]
    Normal,
    Insert,
    Command,
    Visual,
    VisualLine,
}

impl EditorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorMode::Normal => "NORMAL",
            EditorMode::Insert => "INSERT",
            EditorMode::Command => "COMMAND",
            EditorMode::Visual => "VISUAL",
            EditorMode::VisualLine => "VISUAL LINE",
        }
    }

    pub fn is_visual(&self) -> bool {
        matches!(self, EditorMode::Visual | EditorMode::VisualLine)
    }

    /// Modes in which a block cursor replaces the native caret.
    pub fn shows_block_cursor(&self) -> bool {
        matches!(
            self,
            EditorMode::Normal | EditorMode::Visual | EditorMode::VisualLine
        )
    }

    /// Modes in which literal text may reach the document.
    pub fn accepts_text_input(&self) -> bool {
        matches!(self, EditorMode::Insert | EditorMode::Command)
    }
}
