use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    dialog::{handle_yes_no_keys, DialogResult},
    drives::{Drive, MountAction},
    jobs::JobId,
    ops::Resolution,
    panel::PanelId,
};

// ============================================================================
// Text input
// ============================================================================

/// Single-line editable text with a character cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    /// Cursor position in chars, not bytes
    cursor: usize,
}

impl TextInput {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn into_text(self) -> String {
        self.text
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Insert pasted text; line breaks are dropped
    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.insert(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Returns true when the key edited or moved within the text
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.text.clear();
                self.cursor = 0;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.text.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.chars().count(),
            _ => return false,
        }
        true
    }
}

// ============================================================================
// Modal contexts
// ============================================================================

#[derive(Debug, Default)]
pub enum Modal {
    #[default]
    None,
    /// `f <name>` or `d <name>` in `dir`
    NameInput { dir: PathBuf, input: TextInput },
    Rename { target: PathBuf, input: TextInput },
    ShellCommand { dir: PathBuf, input: TextInput },
    DeleteConfirmation { paths: Vec<PathBuf> },
    MountPassword {
        action: MountAction,
        drive: Drive,
        input: TextInput,
    },
    Filter { panel: PanelId, input: TextInput },
    Conflict { job_id: JobId, path: PathBuf },
    QuitConfirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalOutcome {
    /// Nothing to act on yet
    Pending,
    /// The text changed; live modals (filter) re-apply it
    Edited,
    Confirm,
    Cancel,
    Choose(Resolution),
}

impl Modal {
    pub fn is_active(&self) -> bool {
        !matches!(self, Modal::None)
    }

    pub fn input(&self) -> Option<&TextInput> {
        match self {
            Modal::NameInput { input, .. }
            | Modal::Rename { input, .. }
            | Modal::ShellCommand { input, .. }
            | Modal::MountPassword { input, .. }
            | Modal::Filter { input, .. } => Some(input),
            _ => None,
        }
    }

    fn input_mut(&mut self) -> Option<&mut TextInput> {
        match self {
            Modal::NameInput { input, .. }
            | Modal::Rename { input, .. }
            | Modal::ShellCommand { input, .. }
            | Modal::MountPassword { input, .. }
            | Modal::Filter { input, .. } => Some(input),
            _ => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalOutcome {
        match self {
            Modal::None => ModalOutcome::Pending,
            Modal::DeleteConfirmation { .. } | Modal::QuitConfirmation => {
                match handle_yes_no_keys(key.code) {
                    DialogResult::Accept => ModalOutcome::Confirm,
                    DialogResult::Reject => ModalOutcome::Cancel,
                    DialogResult::Pending => ModalOutcome::Pending,
                }
            }
            Modal::Conflict { .. } => match key.code {
                KeyCode::Char('o') | KeyCode::Char('O') => ModalOutcome::Choose(Resolution::Overwrite),
                KeyCode::Char('s') | KeyCode::Char('S') => ModalOutcome::Choose(Resolution::Skip),
                KeyCode::Char('r') | KeyCode::Char('R') => ModalOutcome::Choose(Resolution::Rename),
                KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Esc => {
                    ModalOutcome::Choose(Resolution::Cancel)
                }
                _ => ModalOutcome::Pending,
            },
            _ => match key.code {
                KeyCode::Enter => ModalOutcome::Confirm,
                KeyCode::Esc => ModalOutcome::Cancel,
                _ => match self.input_mut() {
                    Some(input) => {
                        if input.handle_key(key) {
                            ModalOutcome::Edited
                        } else {
                            ModalOutcome::Pending
                        }
                    }
                    None => ModalOutcome::Pending,
                },
            },
        }
    }

    /// Bracketed paste goes into the text field, if there is one
    pub fn handle_paste(&mut self, text: &str) -> ModalOutcome {
        match self.input_mut() {
            Some(input) => {
                input.insert_str(text);
                ModalOutcome::Edited
            }
            None => ModalOutcome::Pending,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Modal::None => "",
            Modal::NameInput { .. } => "New (f <file> | d <dir>)",
            Modal::Rename { .. } => "Rename",
            Modal::ShellCommand { .. } => "Shell command ({file} = selection)",
            Modal::DeleteConfirmation { .. } => "Delete",
            Modal::MountPassword { action: MountAction::Mount, .. } => "sudo password to mount",
            Modal::MountPassword { action: MountAction::Unmount, .. } => "sudo password to unmount",
            Modal::Filter { .. } => "Filter",
            Modal::Conflict { .. } => "File exists",
            Modal::QuitConfirmation => "Quit",
        }
    }

    /// Text fields whose contents are never drawn
    pub fn is_masked(&self) -> bool {
        matches!(self, Modal::MountPassword { .. })
    }
}
