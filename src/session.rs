//! A document editing session: the dispatcher, the cursor renderer and the
//! host shell wired to one document.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::VimConfig;
use crate::dispatch::{Dispatcher, KeyOutcome, SessionHooks};
use crate::document::Document;
use crate::edit;
use crate::key::KeyEvent;
use crate::key_buffer::{Clock, SystemClock, TimerToken};
use crate::mode::EditorMode;
use crate::register::YankRegister;
use crate::render::{CursorRenderer, RenderFrame};

/// Host shell of a session: lifecycle callbacks plus the view the cursor
/// frames are drawn into.
pub trait SessionHost: SessionHooks {
    /// Applies decorations and caret visibility in a single update.
    fn apply_frame(&mut self, frame: &RenderFrame);
}

pub struct VimSession<D: Document, H: SessionHost> {
    doc: D,
    host: H,
    dispatcher: Dispatcher,
    renderer: CursorRenderer,
    doc_changed: Rc<Cell<bool>>,
}

impl<D: Document, H: SessionHost> VimSession<D, H> {
    pub fn new(doc: D, host: H, config: &VimConfig) -> Self {
        Self::with_clock(doc, host, config, Box::new(SystemClock))
    }

    pub fn with_clock(mut doc: D, host: H, config: &VimConfig, clock: Box<dyn Clock>) -> Self {
        let doc_changed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&doc_changed);
        doc.on_change(Box::new(move |_version| flag.set(true)));

        let mut dispatcher = Dispatcher::with_clock(clock, config.sequence_timeout());
        dispatcher.set_enabled(config.enabled);

        let mut session = Self {
            doc,
            host,
            dispatcher,
            renderer: CursorRenderer::new(),
            doc_changed,
        };
        session.sync_view();
        session
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let outcome = self
            .dispatcher
            .handle_key(&mut self.doc, &mut self.host, key);
        self.sync_view();
        outcome
    }

    /// Programmatic text insertion. Rejected unless the mode accepts literal
    /// text; in Command mode the text belongs to the external command line
    /// and the document is left alone.
    pub fn handle_text_input(&mut self, text: &str) -> bool {
        if !self.dispatcher.allows_text_input() {
            debug!(mode = self.dispatcher.mode().as_str(), "rejected text input");
            return false;
        }
        if self.dispatcher.is_enabled() && self.dispatcher.mode() == EditorMode::Command {
            return true;
        }
        if let Err(err) = edit::insert_text(&mut self.doc, text) {
            warn!(error = %err, "document rejected text input");
        }
        self.sync_view();
        true
    }

    /// Native backspace in Insert mode, for hosts without their own editor.
    pub fn handle_backspace(&mut self) -> bool {
        if !self.dispatcher.allows_text_input() || self.dispatcher.mode() == EditorMode::Command {
            return false;
        }
        if let Err(err) = edit::delete_before_caret(&mut self.doc) {
            warn!(error = %err, "document rejected backspace");
        }
        self.sync_view();
        true
    }

    pub fn submit_command(&mut self, line: &str) {
        self.dispatcher.submit_command(&mut self.host, line);
        self.sync_view();
    }

    pub fn cancel_command(&mut self) {
        self.dispatcher.cancel_command(&mut self.host);
        self.sync_view();
    }

    pub fn on_timeout(&mut self, token: TimerToken) {
        self.dispatcher.on_timeout(token);
    }

    /// Renders once and hands the frame to the host when anything visible
    /// changed. Document change notifications force a fresh frame.
    pub fn sync_view(&mut self) {
        if self.doc_changed.replace(false) {
            self.renderer.invalidate();
        }
        // Disabled sessions edit natively, like Insert mode.
        let mode = if self.dispatcher.is_enabled() {
            self.dispatcher.mode()
        } else {
            EditorMode::Insert
        };
        if let Some(frame) = self
            .renderer
            .render(&self.doc, mode, self.dispatcher.visual_state())
        {
            self.host.apply_frame(&frame);
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.dispatcher.mode()
    }

    pub fn register(&self) -> &YankRegister {
        self.dispatcher.register()
    }

    pub fn pending_keys(&self) -> &str {
        self.dispatcher.pending_keys()
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    /// Direct access for host-driven edits; call `sync_view` afterwards.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_parts(self) -> (D, H) {
        (self.doc, self.host)
    }
}
