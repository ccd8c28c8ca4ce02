//! Line editing for the REPL, including masked password entry.

use std::borrow::Cow;

use rustyline::completion::Completer;
use rustyline::config::Configurer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{ColorMode, Editor, Helper, Result};

/// The REPL's line editor.
pub type LineEditor = Editor<PasswordMask, DefaultHistory>;

/// Draws every typed character as `*` while masking is on.
#[derive(Debug, Default)]
pub struct PasswordMask {
    masking: bool,
}

impl PasswordMask {
    /// Turns masking on or off.
    pub fn set_masking(&mut self, masking: bool) {
        self.masking = masking;
    }

    /// Whether input is currently masked.
    pub fn is_masking(&self) -> bool {
        self.masking
    }
}

impl Completer for PasswordMask {
    type Candidate = String;
}

impl Hinter for PasswordMask {
    type Hint = String;
}

impl Validator for PasswordMask {}

impl Highlighter for PasswordMask {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if self.masking {
            Cow::Owned("*".repeat(line.chars().count()))
        } else {
            Cow::Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        self.masking
    }
}

impl Helper for PasswordMask {}

/// Creates the editor with masking available but off.
pub fn line_editor() -> Result<LineEditor> {
    let mut rl = LineEditor::new()?;
    rl.set_helper(Some(PasswordMask::default()));
    Ok(rl)
}

/// Reads one line with its characters masked. The line is never added to
/// history.
pub fn read_secret(rl: &mut LineEditor, prompt: &str) -> Result<String> {
    let color_mode = rl.config_mut().color_mode();
    let auto_history = rl.config_mut().auto_add_history();
    if let Some(helper) = rl.helper_mut() {
        helper.set_masking(true);
    }
    // Highlighting, and with it the mask, is skipped unless color is forced.
    rl.set_color_mode(ColorMode::Forced);
    rl.set_auto_add_history(false);

    let line = rl.readline(prompt);

    if let Some(helper) = rl.helper_mut() {
        helper.set_masking(false);
    }
    rl.set_color_mode(color_mode);
    rl.set_auto_add_history(auto_history);
    line
}
