use crate::dispatch::{Dispatcher, KeyOutcome, SessionHooks};
use crate::document::{Document, MemoryDocument, Selection};
use crate::key::{KeyEvent, parse_keys};
use crate::key_buffer::{DEFAULT_SEQUENCE_TIMEOUT, ManualClock};
use crate::mode::EditorMode;

#[derive(Debug, Default)]
pub(super) struct RecordingHooks {
	pub modes: Vec<EditorMode>,
	pub command_mode_requests: usize,
	pub save_and_close_requests: usize,
	pub close_without_saving_requests: usize,
}

impl SessionHooks for RecordingHooks {
	fn on_mode_change(&mut self, mode: EditorMode) {
		self.modes.push(mode);
	}

	fn on_command_mode(&mut self) {
		self.command_mode_requests += 1;
	}

	fn on_save_and_close(&mut self) {
		self.save_and_close_requests += 1;
	}

	fn on_close_without_saving(&mut self) {
		self.close_without_saving_requests += 1;
	}
}

pub(super) struct Harness {
	pub doc: MemoryDocument,
	pub dispatcher: Dispatcher,
	pub hooks: RecordingHooks,
	pub clock: ManualClock,
}

impl Harness {
	pub fn mode(&self) -> EditorMode {
		self.dispatcher.mode()
	}

	pub fn head(&self) -> usize {
		self.doc.head().expect("selection should be live")
	}

	pub fn register(&self) -> Option<&str> {
		self.dispatcher.register().get()
	}

	pub fn press(&mut self, key: KeyEvent) -> KeyOutcome {
		self.dispatcher
			.handle_key(&mut self.doc, &mut self.hooks, key)
	}

	pub fn keys(&mut self, notation: &str) -> Vec<KeyOutcome> {
		parse_keys(notation)
			.expect("key notation should parse")
			.into_iter()
			.map(|key| self.press(key))
			.collect()
	}
}

/// Normal-mode harness over `text` with the caret at `head`.
pub(super) fn harness(text: &str, head: usize) -> Harness {
	let mut doc = MemoryDocument::from_text(text);
	doc.set_selection(Selection::caret(head));
	let clock = ManualClock::new();
	let dispatcher = Dispatcher::with_clock(Box::new(clock.clone()), DEFAULT_SEQUENCE_TIMEOUT);
	Harness {
		doc,
		dispatcher,
		hooks: RecordingHooks::default(),
		clock,
	}
}
