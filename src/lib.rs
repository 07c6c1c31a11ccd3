//! Vim-style modal editing over a block-structured rich-text document.

pub mod command_line;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod edit;
pub mod key;
pub mod key_buffer;
pub mod keymap;
pub mod logging;
pub mod mode;
pub mod motion;
pub mod register;
pub mod render;
pub mod session;
pub mod text_object;
pub mod visual;

pub use config::NotevimConfig;
pub use dispatch::{Dispatcher, KeyOutcome, SessionHooks};
pub use document::{Document, MemoryDocument, Selection, Transaction};
pub use key::{Key, KeyEvent, Modifiers, parse_keys};
pub use mode::EditorMode;
pub use render::RenderFrame;
pub use session::{SessionHost, VimSession};
