use std::time::Duration;

use notevim::config::VimConfig;
use notevim::document::{Document, MemoryDocument, Selection};
use notevim::key_buffer::ManualClock;
use notevim::render::{CaretVisibility, Decoration, RenderFrame};
use notevim::{EditorMode, KeyOutcome, SessionHooks, SessionHost, VimSession, parse_keys};

#[derive(Debug, Default)]
struct RecordingHost {
    frames: Vec<RenderFrame>,
    modes: Vec<EditorMode>,
    saved: bool,
    discarded: bool,
}

impl SessionHooks for RecordingHost {
    fn on_mode_change(&mut self, mode: EditorMode) {
        self.modes.push(mode);
    }

    fn on_save_and_close(&mut self) {
        self.saved = true;
    }

    fn on_close_without_saving(&mut self) {
        self.discarded = true;
    }
}

impl SessionHost for RecordingHost {
    fn apply_frame(&mut self, frame: &RenderFrame) {
        self.frames.push(frame.clone());
    }
}

type Session = VimSession<MemoryDocument, RecordingHost>;

fn session_at(text: &str, head: usize) -> (Session, ManualClock) {
    let mut doc = MemoryDocument::from_text(text);
    doc.set_selection(Selection::caret(head));
    let clock = ManualClock::new();
    let session = VimSession::with_clock(
        doc,
        RecordingHost::default(),
        &VimConfig::default(),
        Box::new(clock.clone()),
    );
    (session, clock)
}

fn press(session: &mut Session, notation: &str) -> Vec<KeyOutcome> {
    parse_keys(notation)
        .expect("key notation should parse")
        .into_iter()
        .map(|key| session.handle_key(key))
        .collect()
}

fn head(session: &Session) -> usize {
    session.document().head().expect("selection should be live")
}

#[test]
fn change_inner_word_then_type_should_replace_word() {
    let (mut session, _) = session_at("hello world", 3);
    press(&mut session, "ciw");
    assert_eq!(session.document().blocks(), [" world"]);
    assert_eq!(session.mode(), EditorMode::Insert);

    assert!(session.handle_text_input("bye"));
    press(&mut session, "<Esc>");
    assert_eq!(session.document().blocks(), ["bye world"]);
    assert_eq!(session.mode(), EditorMode::Normal);
    assert_eq!(
        session.host().modes,
        [EditorMode::Insert, EditorMode::Normal]
    );
}

#[test]
fn delete_line_should_drop_block_and_yank_it() {
    let (mut session, _) = session_at("first\nsecond", 2);
    press(&mut session, "dd");
    assert_eq!(session.document().blocks(), ["second"]);
    assert_eq!(session.register().get(), Some("first"));
    assert_eq!(head(&session), 1);
}

#[test]
fn delete_line_then_paste_should_restore_document() {
    let (mut session, _) = session_at("alpha\nbeta\ngamma", 8);
    press(&mut session, "dd");
    assert_eq!(session.document().blocks(), ["alpha", "gamma"]);
    press(&mut session, "kp");
    assert_eq!(session.document().blocks(), ["alpha", "beta", "gamma"]);
}

#[test]
fn visual_yank_should_capture_inclusive_span() {
    let (mut session, _) = session_at("hello world", 1);
    press(&mut session, "vlll");
    assert_eq!(session.mode(), EditorMode::Visual);
    press(&mut session, "y");
    assert_eq!(session.register().get(), Some("hell"));
    assert_eq!(session.mode(), EditorMode::Normal);
    assert_eq!(session.document().blocks(), ["hello world"]);
}

#[test]
fn visual_delete_should_remove_highlighted_range() {
    let (mut session, _) = session_at("hello world", 1);
    press(&mut session, "vlll");
    let highlight = session
        .host()
        .frames
        .last()
        .expect("frame")
        .decorations
        .items[0];
    assert_eq!(highlight, Decoration::Highlight { from: 1, to: 4 });

    press(&mut session, "d");
    assert_eq!(session.document().blocks(), ["o world"]);
    assert_eq!(session.register().get(), Some("hell"));
    assert_eq!(session.mode(), EditorMode::Normal);
}

#[test]
fn visual_line_delete_should_remove_every_touched_block() {
    let (mut session, _) = session_at("one\ntwo\nthree", 2);
    press(&mut session, "Vjd");
    assert_eq!(session.document().blocks(), ["three"]);
    assert_eq!(session.register().get(), Some("one\ntwo"));
}

#[test]
fn gg_within_timeout_should_jump_to_document_start() {
    let (mut session, clock) = session_at("one\ntwo\nthree", 12);
    assert!(matches!(press(&mut session, "g")[0], KeyOutcome::Pending(_)));
    clock.advance(Duration::from_millis(200));
    assert_eq!(press(&mut session, "g"), [KeyOutcome::Handled]);
    assert_eq!(head(&session), 1);
    assert_eq!(session.pending_keys(), "");
}

#[test]
fn gg_after_timeout_should_restart_sequence() {
    let (mut session, clock) = session_at("one\ntwo\nthree", 12);
    press(&mut session, "g");
    clock.advance(Duration::from_millis(600));
    assert!(matches!(press(&mut session, "g")[0], KeyOutcome::Pending(_)));
    assert_eq!(head(&session), 12);
    assert_eq!(session.pending_keys(), "g");
}

#[test]
fn expired_timer_should_clear_pending_keys() {
    let (mut session, _) = session_at("abc", 1);
    let KeyOutcome::Pending(token) = press(&mut session, "d")[0] else {
        panic!("d should wait for more keys");
    };
    session.on_timeout(token);
    assert_eq!(session.pending_keys(), "");
    press(&mut session, "d");
    assert_eq!(session.pending_keys(), "d");
    assert_eq!(session.document().blocks(), ["abc"]);
}

#[test]
fn movement_should_stay_in_bounds_and_never_edit() {
    let (mut session, _) = session_at("ab\ncd", 1);
    press(&mut session, "hhhkkk");
    assert_eq!(head(&session), 1);
    press(&mut session, "jjjlllll");
    let end = session.document().end_position().expect("end");
    assert!(head(&session) <= end);
    press(&mut session, "G0$wb");
    assert_eq!(session.document().blocks(), ["ab", "cd"]);
    assert_eq!(session.document().version(), 0);
}

#[test]
fn repeat_should_replay_last_edit() {
    let (mut session, _) = session_at("abcdef", 1);
    press(&mut session, "x..");
    assert_eq!(session.document().blocks(), ["def"]);
}

#[test]
fn command_line_submit_should_reach_host() {
    let (mut session, _) = session_at("abc", 1);
    press(&mut session, ":");
    assert_eq!(session.mode(), EditorMode::Command);
    let last = session.host().frames.last().expect("frame");
    assert_eq!(last.caret, CaretVisibility::Visible);

    session.submit_command("wq");
    assert!(session.host().saved);
    assert_eq!(session.mode(), EditorMode::Normal);

    press(&mut session, ":");
    session.submit_command("q!");
    assert!(session.host().discarded);
}

#[test]
fn insert_newline_should_split_block() {
    let (mut session, _) = session_at("headtail", 5);
    press(&mut session, "i");
    session.handle_text_input("\n");
    assert_eq!(session.document().blocks(), ["head", "tail"]);
    assert!(session.handle_backspace());
    assert_eq!(session.document().blocks(), ["headtail"]);
}
