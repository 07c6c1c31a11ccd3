//! Modal key dispatch: the state machine deciding what each keystroke does.
//!
//! Every key runs synchronously against the document and produces at most
//! one transaction. Document errors raised by a primitive are logged and the
//! key still counts as handled, so a failed edit never leaks literal text.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::command_line::ExCommand;
use crate::document::{Document, DocumentError, Selection};
use crate::edit::Edit;
use crate::key::{Key, KeyEvent};
use crate::key_buffer::{Clock, DEFAULT_SEQUENCE_TIMEOUT, KeyBuffer, SystemClock, TimerToken};
use crate::keymap::{self, Command, CommandSpec, Operator, SequenceMatch};
use crate::mode::EditorMode;
use crate::register::YankRegister;
use crate::visual::{self, VisualState};

/// Callbacks fired toward the host shell. All default to no-ops.
pub trait SessionHooks {
    fn on_mode_change(&mut self, _mode: EditorMode) {}

    fn on_command_mode(&mut self) {}

    fn on_save_and_close(&mut self) {}

    fn on_close_without_saving(&mut self) {}
}

/// Result of routing one keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Consumed; the host must suppress its default behaviour.
    Handled,
    /// Consumed and buffered. The host may call `on_timeout` with the token
    /// once the sequence timeout elapses.
    Pending(TimerToken),
    /// Not ours; the host's native behaviour applies.
    PassThrough,
}

impl KeyOutcome {
    pub fn is_handled(&self) -> bool {
        !matches!(self, KeyOutcome::PassThrough)
    }
}

pub struct Dispatcher {
    mode: EditorMode,
    buffer: KeyBuffer,
    register: YankRegister,
    last_command: Option<Edit>,
    visual: Option<VisualState>,
    clock: Box<dyn Clock>,
    enabled: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock), DEFAULT_SEQUENCE_TIMEOUT)
    }

    pub fn with_clock(clock: Box<dyn Clock>, sequence_timeout: Duration) -> Self {
        Self {
            mode: EditorMode::Normal,
            buffer: KeyBuffer::new(sequence_timeout),
            register: YankRegister::new(),
            last_command: None,
            visual: None,
            clock,
            enabled: true,
        }
    }

    /// A disabled dispatcher passes every key through untouched.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.buffer.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn register(&self) -> &YankRegister {
        &self.register
    }

    pub fn pending_keys(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn visual_state(&self) -> Option<&VisualState> {
        self.visual.as_ref()
    }

    pub fn last_command(&self) -> Option<Edit> {
        self.last_command
    }

    /// Secondary insertion guard: literal text may only land in Insert mode
    /// or in the external command line.
    pub fn allows_text_input(&self) -> bool {
        !self.enabled || self.mode.accepts_text_input()
    }

    pub fn handle_key(
        &mut self,
        doc: &mut dyn Document,
        hooks: &mut dyn SessionHooks,
        key: KeyEvent,
    ) -> KeyOutcome {
        if !self.enabled {
            return KeyOutcome::PassThrough;
        }
        if self.buffer.expire_if_due(self.clock.now()) {
            debug!("abandoned buffered sequence after timeout");
        }

        match self.mode {
            EditorMode::Normal => self.handle_normal_mode_key(doc, hooks, key),
            EditorMode::Insert => self.handle_insert_mode_key(hooks, key),
            EditorMode::Command => KeyOutcome::PassThrough,
            EditorMode::Visual | EditorMode::VisualLine => {
                self.handle_visual_mode_key(doc, hooks, key)
            }
        }
    }

    /// Host timer callback for a buffered sequence.
    pub fn on_timeout(&mut self, token: TimerToken) {
        let pending = self.buffer.as_str().to_string();
        if self.buffer.fire(token) {
            debug!(keys = %pending, "buffered sequence timed out");
        }
    }

    /// Line submitted by the external command-line UI.
    pub fn submit_command(&mut self, hooks: &mut dyn SessionHooks, line: &str) {
        match ExCommand::parse(line) {
            ExCommand::SaveAndClose => {
                info!("command line requested save and close");
                hooks.on_save_and_close();
            }
            ExCommand::CloseWithoutSaving => {
                info!("command line requested close without saving");
                hooks.on_close_without_saving();
            }
            ExCommand::Unknown(command) => {
                info!(command = %command, "ignoring unknown command");
            }
        }
        self.set_mode(hooks, EditorMode::Normal);
    }

    pub fn cancel_command(&mut self, hooks: &mut dyn SessionHooks) {
        self.set_mode(hooks, EditorMode::Normal);
    }

    fn handle_normal_mode_key(
        &mut self,
        doc: &mut dyn Document,
        hooks: &mut dyn SessionHooks,
        key: KeyEvent,
    ) -> KeyOutcome {
        if key.modifiers.has_system_modifier() {
            if key.is_redo_shortcut() {
                self.buffer.clear();
                self.run_edit(doc, Edit::Redo);
                return KeyOutcome::Handled;
            }
            return KeyOutcome::PassThrough;
        }
        if key.key.is_arrow() {
            self.buffer.clear();
            return KeyOutcome::PassThrough;
        }

        let Key::Char(ch) = key.key else {
            self.buffer.clear();
            return KeyOutcome::Handled;
        };

        match ch {
            ':' => {
                self.buffer.clear();
                self.set_mode(hooks, EditorMode::Command);
                hooks.on_command_mode();
                KeyOutcome::Handled
            }
            '.' => {
                self.buffer.clear();
                if let Some(edit) = self.last_command {
                    debug!(?edit, "repeating last command");
                    self.run_edit(doc, edit);
                }
                KeyOutcome::Handled
            }
            'v' => {
                self.buffer.clear();
                self.enter_visual(doc, hooks, false);
                KeyOutcome::Handled
            }
            'V' => {
                self.buffer.clear();
                self.enter_visual(doc, hooks, true);
                KeyOutcome::Handled
            }
            _ => self.push_sequence_key(doc, hooks, ch, keymap::normal_commands()),
        }
    }

    fn handle_insert_mode_key(&mut self, hooks: &mut dyn SessionHooks, key: KeyEvent) -> KeyOutcome {
        if key.key == Key::Escape && !key.modifiers.has_system_modifier() {
            self.buffer.clear();
            self.set_mode(hooks, EditorMode::Normal);
            return KeyOutcome::Handled;
        }
        KeyOutcome::PassThrough
    }

    fn handle_visual_mode_key(
        &mut self,
        doc: &mut dyn Document,
        hooks: &mut dyn SessionHooks,
        key: KeyEvent,
    ) -> KeyOutcome {
        if key.modifiers.has_system_modifier() {
            return KeyOutcome::PassThrough;
        }
        let Some(state) = self.visual else {
            self.set_mode(hooks, EditorMode::Normal);
            return KeyOutcome::Handled;
        };

        match key.key {
            Key::Escape => {
                self.buffer.clear();
                self.exit_visual(doc, hooks, state.head, EditorMode::Normal);
                KeyOutcome::Handled
            }
            Key::Char('v') => {
                self.buffer.clear();
                if state.is_line_wise() {
                    self.switch_visual(doc, hooks, state.into_char_wise(), EditorMode::Visual);
                } else {
                    self.exit_visual(doc, hooks, state.head, EditorMode::Normal);
                }
                KeyOutcome::Handled
            }
            Key::Char('V') => {
                self.buffer.clear();
                if state.is_line_wise() {
                    self.exit_visual(doc, hooks, state.head, EditorMode::Normal);
                } else if let Some(line_wise) = state.into_line_wise(doc) {
                    self.switch_visual(doc, hooks, line_wise, EditorMode::VisualLine);
                }
                KeyOutcome::Handled
            }
            Key::Char(ch) => self.push_sequence_key(doc, hooks, ch, keymap::visual_commands()),
            _ => {
                self.buffer.clear();
                KeyOutcome::Handled
            }
        }
    }

    fn push_sequence_key(
        &mut self,
        doc: &mut dyn Document,
        hooks: &mut dyn SessionHooks,
        ch: char,
        table: &'static [CommandSpec],
    ) -> KeyOutcome {
        self.buffer.push(ch);
        match keymap::resolve_sequence(table, self.buffer.as_str()) {
            SequenceMatch::Exact(spec) => {
                debug!(keys = spec.keys, "resolved command");
                self.buffer.clear();
                self.execute(doc, hooks, spec);
                KeyOutcome::Handled
            }
            SequenceMatch::Pending => {
                debug!(keys = %self.buffer.as_str(), "awaiting more keys");
                KeyOutcome::Pending(self.buffer.arm(self.clock.now()))
            }
            SequenceMatch::NoMatch => {
                debug!(keys = %self.buffer.as_str(), "discarding unknown sequence");
                self.buffer.clear();
                KeyOutcome::Handled
            }
        }
    }

    fn execute(&mut self, doc: &mut dyn Document, hooks: &mut dyn SessionHooks, spec: &CommandSpec) {
        match spec.command {
            Command::Move(motion) => {
                let Some(head) = self.current_head(doc) else {
                    return;
                };
                let Some(target) = motion.resolve(doc, head) else {
                    return;
                };
                match self.visual.as_mut() {
                    Some(state) => {
                        state.head = target;
                        let selection = state.live_selection(doc);
                        doc.set_selection(selection);
                    }
                    None => doc.set_selection(Selection::caret(target)),
                }
            }
            Command::Edit(edit) => {
                self.run_edit(doc, edit);
                if spec.repeatable {
                    self.last_command = Some(edit);
                }
                if spec.enters_insert {
                    self.set_mode(hooks, EditorMode::Insert);
                }
            }
            Command::Operate(operator) => self.apply_visual_operator(doc, hooks, operator),
        }
    }

    fn apply_visual_operator(
        &mut self,
        doc: &mut dyn Document,
        hooks: &mut dyn SessionHooks,
        operator: Operator,
    ) {
        let Some(state) = self.visual else {
            return;
        };
        let caret = match visual::apply_operator(doc, &mut self.register, &state, operator) {
            Ok(caret) => caret,
            Err(err) => {
                log_document_error(&err);
                state.effective_range(doc).start
            }
        };
        let next_mode = match operator {
            Operator::Change => EditorMode::Insert,
            Operator::Delete | Operator::Yank => EditorMode::Normal,
        };
        self.exit_visual(doc, hooks, caret, next_mode);
    }

    fn run_edit(&mut self, doc: &mut dyn Document, edit: Edit) {
        if let Err(err) = edit.apply(doc, &mut self.register) {
            log_document_error(&err);
        }
    }

    fn current_head(&self, doc: &dyn Document) -> Option<usize> {
        match &self.visual {
            Some(state) => Some(state.head),
            None => doc.head(),
        }
    }

    fn enter_visual(&mut self, doc: &mut dyn Document, hooks: &mut dyn SessionHooks, line_wise: bool) {
        let Some(head) = doc.head() else {
            return;
        };
        let (state, mode) = if line_wise {
            let Some(state) = VisualState::line_wise(doc, head) else {
                return;
            };
            (state, EditorMode::VisualLine)
        } else {
            (VisualState::char_wise(head), EditorMode::Visual)
        };
        self.switch_visual(doc, hooks, state, mode);
    }

    fn switch_visual(
        &mut self,
        doc: &mut dyn Document,
        hooks: &mut dyn SessionHooks,
        state: VisualState,
        mode: EditorMode,
    ) {
        let selection = state.live_selection(doc);
        doc.set_selection(selection);
        self.visual = Some(state);
        self.set_mode(hooks, mode);
    }

    fn exit_visual(
        &mut self,
        doc: &mut dyn Document,
        hooks: &mut dyn SessionHooks,
        caret: usize,
        mode: EditorMode,
    ) {
        self.visual = None;
        doc.set_selection(Selection::caret(caret));
        self.set_mode(hooks, mode);
    }

    fn set_mode(&mut self, hooks: &mut dyn SessionHooks, mode: EditorMode) {
        if self.mode == mode {
            return;
        }
        debug!(from = self.mode.as_str(), to = mode.as_str(), "mode change");
        if !mode.is_visual() {
            self.visual = None;
        }
        self.mode = mode;
        hooks.on_mode_change(mode);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn log_document_error(err: &DocumentError) {
    warn!(error = %err, "document rejected edit");
}

#[cfg(test)]
mod tests;
