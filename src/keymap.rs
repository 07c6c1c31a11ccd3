//! Command tables for normal and visual mode, and buffered-sequence lookup.

use crate::edit::Edit;
use crate::motion::Motion;
use crate::text_object::TextObject;

/// Operators applied to the effective range of a visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Delete,
    Yank,
    Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Move(Motion),
    Edit(Edit),
    Operate(Operator),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub keys: &'static str,
    pub command: Command,
    pub enters_insert: bool,
    pub repeatable: bool,
}

impl CommandSpec {
    const fn new(keys: &'static str, command: Command) -> Self {
        Self {
            keys,
            command,
            enters_insert: false,
            repeatable: false,
        }
    }

    const fn motion(keys: &'static str, motion: Motion) -> Self {
        Self::new(keys, Command::Move(motion))
    }

    const fn edit(keys: &'static str, edit: Edit) -> Self {
        Self::new(keys, Command::Edit(edit))
    }

    const fn operator(keys: &'static str, operator: Operator) -> Self {
        Self::new(keys, Command::Operate(operator))
    }

    const fn enters_insert(mut self) -> Self {
        self.enters_insert = true;
        self
    }

    const fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMatch {
    Exact(&'static CommandSpec),
    Pending,
    NoMatch,
}

const fn pair(open: char, close: char) -> TextObject {
    TextObject::InsidePair { open, close }
}

static NORMAL_COMMANDS: &[CommandSpec] = &[
    CommandSpec::motion("h", Motion::CharLeft),
    CommandSpec::motion("l", Motion::CharRight),
    CommandSpec::motion("j", Motion::LineDown),
    CommandSpec::motion("k", Motion::LineUp),
    CommandSpec::motion("w", Motion::WordForward),
    CommandSpec::motion("b", Motion::WordBackward),
    CommandSpec::motion("0", Motion::LineStart),
    CommandSpec::motion("$", Motion::LineEnd),
    CommandSpec::motion("gg", Motion::DocStart),
    CommandSpec::motion("G", Motion::DocEnd),
    CommandSpec::edit("i", Edit::InsertBefore).enters_insert(),
    CommandSpec::edit("a", Edit::Append).enters_insert(),
    CommandSpec::edit("A", Edit::AppendLineEnd).enters_insert(),
    CommandSpec::edit("I", Edit::InsertLineStart).enters_insert(),
    CommandSpec::edit("o", Edit::OpenBelow).enters_insert(),
    CommandSpec::edit("O", Edit::OpenAbove).enters_insert(),
    CommandSpec::edit("x", Edit::DeleteChar).repeatable(),
    CommandSpec::edit("dd", Edit::DeleteLine).repeatable(),
    CommandSpec::edit("D", Edit::DeleteToLineEnd).repeatable(),
    CommandSpec::edit("yy", Edit::YankLine),
    CommandSpec::edit("p", Edit::PasteAfter).repeatable(),
    CommandSpec::edit("u", Edit::Undo),
    CommandSpec::edit("diw", Edit::DeleteObject(TextObject::InnerWord)).repeatable(),
    CommandSpec::edit("di\"", Edit::DeleteObject(pair('"', '"'))).repeatable(),
    CommandSpec::edit("di'", Edit::DeleteObject(pair('\'', '\''))).repeatable(),
    CommandSpec::edit("di(", Edit::DeleteObject(pair('(', ')'))).repeatable(),
    CommandSpec::edit("di)", Edit::DeleteObject(pair('(', ')'))).repeatable(),
    CommandSpec::edit("di{", Edit::DeleteObject(pair('{', '}'))).repeatable(),
    CommandSpec::edit("di}", Edit::DeleteObject(pair('{', '}'))).repeatable(),
    CommandSpec::edit("cw", Edit::ChangeWord)
        .enters_insert()
        .repeatable(),
    CommandSpec::edit("cc", Edit::ChangeLine)
        .enters_insert()
        .repeatable(),
    CommandSpec::edit("C", Edit::ChangeToLineEnd)
        .enters_insert()
        .repeatable(),
    CommandSpec::edit("ciw", Edit::ChangeObject(TextObject::InnerWord)).enters_insert(),
    CommandSpec::edit("ci\"", Edit::ChangeObject(pair('"', '"'))).enters_insert(),
    CommandSpec::edit("ci'", Edit::ChangeObject(pair('\'', '\''))).enters_insert(),
    CommandSpec::edit("ci(", Edit::ChangeObject(pair('(', ')'))).enters_insert(),
    CommandSpec::edit("ci)", Edit::ChangeObject(pair('(', ')'))).enters_insert(),
    CommandSpec::edit("ci{", Edit::ChangeObject(pair('{', '}'))).enters_insert(),
    CommandSpec::edit("ci}", Edit::ChangeObject(pair('{', '}'))).enters_insert(),
];

static VISUAL_COMMANDS: &[CommandSpec] = &[
    CommandSpec::motion("h", Motion::CharLeft),
    CommandSpec::motion("l", Motion::CharRight),
    CommandSpec::motion("j", Motion::LineDown),
    CommandSpec::motion("k", Motion::LineUp),
    CommandSpec::motion("w", Motion::WordForward),
    CommandSpec::motion("b", Motion::WordBackward),
    CommandSpec::motion("0", Motion::LineStart),
    CommandSpec::motion("$", Motion::LineEnd),
    CommandSpec::motion("gg", Motion::DocStart),
    CommandSpec::motion("G", Motion::DocEnd),
    CommandSpec::operator("d", Operator::Delete),
    CommandSpec::operator("x", Operator::Delete),
    CommandSpec::operator("y", Operator::Yank),
    CommandSpec::operator("c", Operator::Change).enters_insert(),
];

pub fn normal_commands() -> &'static [CommandSpec] {
    NORMAL_COMMANDS
}

pub fn visual_commands() -> &'static [CommandSpec] {
    VISUAL_COMMANDS
}

/// Exact match wins; otherwise the buffer stays pending while some longer
/// command still starts with it.
pub fn resolve_sequence(table: &'static [CommandSpec], keys: &str) -> SequenceMatch {
    if keys.is_empty() {
        return SequenceMatch::NoMatch;
    }
    if let Some(spec) = table.iter().find(|spec| spec.keys == keys) {
        return SequenceMatch::Exact(spec);
    }
    if table.iter().any(|spec| spec.keys.starts_with(keys)) {
        SequenceMatch::Pending
    } else {
        SequenceMatch::NoMatch
    }
}
