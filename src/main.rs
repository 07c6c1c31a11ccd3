use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use notevim::document::Document;
use notevim::render::RenderFrame;
use notevim::{
	EditorMode, Key, KeyOutcome, MemoryDocument, NotevimConfig, Selection, SessionHooks, SessionHost,
	VimSession, logging, parse_keys,
};
use tracing::info;

/// Replays vim keystrokes against a document loaded one block per line.
#[derive(Debug, Parser)]
#[command(name = "notevim", version)]
struct Cli {
	/// TOML configuration file.
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Write a trace log to the user log directory.
	#[arg(long)]
	log: bool,

	/// Input text file, or `-` for stdin.
	#[arg(short, long)]
	input: PathBuf,

	/// Keys in vim notation, e.g. `ciwnew<Esc>`.
	#[arg(short, long)]
	keys: String,

	/// Initial caret position.
	#[arg(long)]
	cursor: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum CloseRequest {
	SaveAndClose,
	CloseWithoutSaving,
}

#[derive(Debug, Default)]
struct ReplayHost {
	close_request: Option<CloseRequest>,
	frames: usize,
}

impl SessionHooks for ReplayHost {
	fn on_save_and_close(&mut self) {
		self.close_request = Some(CloseRequest::SaveAndClose);
	}

	fn on_close_without_saving(&mut self) {
		self.close_request = Some(CloseRequest::CloseWithoutSaving);
	}
}

impl SessionHost for ReplayHost {
	fn apply_frame(&mut self, _frame: &RenderFrame) {
		self.frames += 1;
	}
}

fn main() {
	if let Err(err) = run() {
		eprintln!("{:#}", err);
		std::process::exit(1);
	}
}

fn run() -> Result<()> {
	let cli = Cli::parse();
	let config = match &cli.config {
		Some(path) => NotevimConfig::load(path)
			.with_context(|| format!("load config {} failed", path.display()))?,
		None => NotevimConfig::default(),
	};
	if cli.log {
		logging::init_logging(&config.log.filter).context("initialize logging failed")?;
	}

	let text = read_input(&cli.input)?;
	let mut doc = MemoryDocument::from_text(&text).with_layout(config.layout);
	if let Some(cursor) = cli.cursor {
		doc.set_selection(Selection::caret(cursor));
	}
	let keys = parse_keys(&cli.keys).context("parse key notation failed")?;
	info!(keys = keys.len(), "replaying keys");

	let mut session = VimSession::new(doc, ReplayHost::default(), &config.vim);
	let mut command_line = String::new();
	for key in keys {
		if session.mode() == EditorMode::Command {
			match key.key {
				Key::Enter => session.submit_command(&std::mem::take(&mut command_line)),
				Key::Escape => {
					command_line.clear();
					session.cancel_command();
				}
				Key::Backspace => {
					command_line.pop();
				}
				Key::Char(ch) => command_line.push(ch),
				_ => {}
			}
		} else if session.handle_key(key) == KeyOutcome::PassThrough {
			match key.key {
				Key::Char(ch) if !key.modifiers.has_system_modifier() => {
					session.handle_text_input(ch.encode_utf8(&mut [0; 4]));
				}
				Key::Enter => {
					session.handle_text_input("\n");
				}
				Key::Tab => {
					session.handle_text_input("\t");
				}
				Key::Backspace => {
					session.handle_backspace();
				}
				_ => {}
			}
		}
		if session.host().close_request.is_some() {
			break;
		}
	}

	print_report(&session);
	Ok(())
}

fn read_input(path: &Path) -> Result<String> {
	if path.as_os_str() == "-" {
		let mut text = String::new();
		std::io::stdin().read_to_string(&mut text).context("read stdin failed")?;
		return Ok(text);
	}
	std::fs::read_to_string(path).with_context(|| format!("read {} failed", path.display()))
}

fn print_report(session: &VimSession<MemoryDocument, ReplayHost>) {
	let doc = session.document();
	for block in doc.blocks() {
		println!("{block}");
	}
	println!("-- mode: {}", session.mode().as_str());
	if let Some(head) = doc.head() {
		println!("-- cursor: {head}");
	}
	if let Some(text) = session.register().get() {
		println!("-- register: {text:?}");
	}
	match session.host().close_request {
		Some(CloseRequest::SaveAndClose) => println!("-- close: save"),
		Some(CloseRequest::CloseWithoutSaving) => println!("-- close: discard"),
		None => {}
	}
	println!("-- frames: {}", session.host().frames);
}
