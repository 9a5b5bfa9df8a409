//! Clipboard readers.
//!
//! The desktop clipboard is read through `arboard` (feature `system-clipboard`).
//! `CLIP_RENAME_CLIPBOARD_CMD` swaps in an external paste command, and tests
//! point `CLIP_RENAME_FAKE_CLIPBOARD` at a file instead.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Env var holding a full paste command line (whitespace separated).
pub const CLIPBOARD_CMD_ENV: &str = "CLIP_RENAME_CLIPBOARD_CMD";

/// Env var pointing at a file whose contents stand in for the clipboard.
pub const FAKE_CLIPBOARD_ENV: &str = "CLIP_RENAME_FAKE_CLIPBOARD";

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("Clipboard read failed: {0}")]
    Io(String),
}

/// Anything that can hand back the current clipboard text.
pub trait ClipboardSource {
    fn paste(&self) -> Result<String, ClipboardError>;
}

/// Fixed clipboard contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticClipboard(pub String);

impl StaticClipboard {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl ClipboardSource for StaticClipboard {
    fn paste(&self) -> Result<String, ClipboardError> {
        Ok(self.0.clone())
    }
}

/// Reads the desktop clipboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemClipboard;

#[cfg(feature = "system-clipboard")]
impl ClipboardSource for SystemClipboard {
    fn paste(&self) -> Result<String, ClipboardError> {
        let mut ctx =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        match ctx.get_text() {
            Ok(text) => Ok(strip_line_terminators(&text)),
            Err(arboard::Error::ContentNotAvailable) => {
                debug!("clipboard holds no text");
                Ok(String::new())
            }
            Err(e) => Err(ClipboardError::Io(e.to_string())),
        }
    }
}

#[cfg(not(feature = "system-clipboard"))]
impl ClipboardSource for SystemClipboard {
    fn paste(&self) -> Result<String, ClipboardError> {
        Err(ClipboardError::Unavailable(format!(
            "built without the system-clipboard feature; set {CLIPBOARD_CMD_ENV}"
        )))
    }
}

/// Reads the clipboard by running an external paste command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandClipboard {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// Build from a whitespace-separated command line. Returns `None` when blank.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self { program, args: parts.collect() })
    }

}

impl ClipboardSource for CommandClipboard {
    fn paste(&self) -> Result<String, ClipboardError> {
        debug!(program = %self.program, "reading clipboard");
        let output = Command::new(&self.program).args(&self.args).output().map_err(|e| {
            ClipboardError::Unavailable(format!("failed to spawn {}: {e}", self.program))
        })?;
        if !output.status.success() {
            // Paste tools exit non-zero on an empty selection; treat that as no text.
            debug!(status = %output.status, "paste tool reported no clipboard contents");
            return Ok(String::new());
        }
        Ok(strip_line_terminators(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Clipboard backed by a file (`CLIP_RENAME_FAKE_CLIPBOARD`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileClipboard {
    pub path: PathBuf,
}

impl ClipboardSource for FileClipboard {
    fn paste(&self) -> Result<String, ClipboardError> {
        let body = std::fs::read_to_string(&self.path).map_err(|e| {
            ClipboardError::Io(format!("failed to read {}: {e}", self.path.display()))
        })?;
        Ok(strip_line_terminators(&body))
    }
}

/// Which clipboard a frontend reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardChoice {
    Fake(FileClipboard),
    Command(CommandClipboard),
    System,
}

impl ClipboardChoice {
    /// Fake file first, then a custom paste command, then the desktop clipboard.
    pub fn resolve(fake: Option<PathBuf>, command: Option<&str>) -> Self {
        if let Some(path) = fake {
            return Self::Fake(FileClipboard { path });
        }
        match command.and_then(CommandClipboard::from_command_line) {
            Some(cmd) => Self::Command(cmd),
            None => Self::System,
        }
    }

    pub fn from_env() -> Self {
        let command = std::env::var(CLIPBOARD_CMD_ENV).ok();
        Self::resolve(std::env::var_os(FAKE_CLIPBOARD_ENV).map(PathBuf::from), command.as_deref())
    }

    pub fn into_source(self) -> Box<dyn ClipboardSource> {
        match self {
            Self::Fake(file) => Box::new(file),
            Self::Command(cmd) => Box::new(cmd),
            Self::System => Box::new(SystemClipboard),
        }
    }
}

/// The clipboard a frontend should use, as configured by the environment.
pub fn system_clipboard() -> Box<dyn ClipboardSource> {
    let choice = ClipboardChoice::from_env();
    debug!(?choice, "clipboard selected");
    choice.into_source()
}

impl<T: ClipboardSource + ?Sized> ClipboardSource for Box<T> {
    fn paste(&self) -> Result<String, ClipboardError> {
        (**self).paste()
    }
}

fn strip_line_terminators(text: &str) -> String {
    text.trim_end_matches(['\r', '\n']).to_string()
}
