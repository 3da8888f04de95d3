//! Defines the core state structures for the application.
//!
//! `App` owns every store the view reads: the persisted agent settings and
//! conversations, the transient panel visibility flags, the input composer and
//! whichever modal overlay is open.

use crate::agent::config::ClientConfig;
use crate::agent::{AgentManager, AgentSettings, ConversationStore};
use crate::store::Persistent;

/// The main application state.
pub struct App {
    /// Flag to indicate if the application should quit.
    pub should_quit: bool,
    /// Resolved client configuration.
    pub config: ClientConfig,
    /// Agent settings, saved as `agent-settings-storage`.
    pub settings: Persistent<AgentSettings>,
    /// Conversations and the active message list, saved as `chat-storage`.
    pub chat: Persistent<ConversationStore>,
    /// Which side panels are open.
    pub panels: PanelVisibility,
    /// The area that receives keyboard input.
    pub focus: FocusArea,
    /// The chat input box.
    pub composer: ChatComposer,
    /// The currently active overlay, if any.
    pub overlay: Option<OverlayState>,
    /// Index into `ConversationStore::conversations_by_recency` highlighted in the drawer.
    pub history_selected: usize,
    /// Field highlighted in the settings panel.
    pub settings_field: SettingsField,
    /// Lines scrolled up from the bottom of the message list.
    pub scroll: u16,
    /// Largest useful `scroll` for the message list, as of the last frame.
    pub(crate) max_scroll: u16,
    /// The message currently displayed in the status bar.
    pub status_message: String,
    /// Advances on every tick; drives the typing indicator.
    pub(crate) spinner_frame: usize,
    pub(crate) agent_manager: AgentManager,
}

/// Keyboard focus targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusArea {
    Chat,
    History,
    Settings,
}

/// Open/closed state of the two side panels. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelVisibility {
    pub settings_open: bool,
    pub history_open: bool,
}

impl PanelVisibility {
    pub fn toggle_settings(&mut self) {
        self.settings_open = !self.settings_open;
    }

    pub fn set_settings_open(&mut self, open: bool) {
        self.settings_open = open;
    }

    pub fn toggle_history(&mut self) {
        self.history_open = !self.history_open;
    }

    pub fn set_history_open(&mut self, open: bool) {
        self.history_open = open;
    }
}

/// Rows of the settings panel, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Agent,
    Model,
    Temperature,
    MaxTokens,
    ClearChat,
}

impl SettingsField {
    pub const ALL: [SettingsField; 5] = [
        SettingsField::Agent,
        SettingsField::Model,
        SettingsField::Temperature,
        SettingsField::MaxTokens,
        SettingsField::ClearChat,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SettingsField::Agent => "代理類型",
            SettingsField::Model => "模型",
            SettingsField::Temperature => "溫度",
            SettingsField::MaxTokens => "最大輸出",
            SettingsField::ClearChat => "清除對話",
        }
    }

    /// Moves up or down the list, stopping at either end.
    pub fn step(&self, delta: isize) -> Self {
        let index = Self::ALL.iter().position(|f| f == self).unwrap_or(0) as isize;
        let next = (index + delta).clamp(0, Self::ALL.len() as isize - 1);
        Self::ALL[next as usize]
    }
}

/// State for the text input composer.
///
/// Manages the text buffer, cursor position, and prompt history.
#[derive(Clone, Default)]
pub struct ChatComposer {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
}

impl ChatComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// True while a history entry is loaded into the buffer.
    pub fn is_browsing_history(&self) -> bool {
        self.history_index.is_some()
    }

    /// Inserts a character at the current cursor position.
    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.reset_history_navigation();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Deletes the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.buffer.drain(idx..self.cursor);
            self.cursor = idx;
            self.reset_history_navigation();
        }
    }

    /// Deletes the character at the cursor.
    pub fn delete(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            let end = self.cursor + ch.len_utf8();
            self.buffer.drain(self.cursor..end);
            self.reset_history_navigation();
        }
    }

    pub fn move_left(&mut self) {
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_to_line_start(&mut self) {
        self.cursor = self.buffer[..self.cursor].rfind('\n').map_or(0, |pos| pos + 1);
    }

    pub fn move_to_line_end(&mut self) {
        self.cursor += self.buffer[self.cursor..]
            .find('\n')
            .unwrap_or(self.buffer.len() - self.cursor);
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.reset_history_navigation();
    }

    /// Takes the buffer, recording non-blank text in the prompt history.
    pub fn take(&mut self) -> String {
        let content = std::mem::take(&mut self.buffer);
        if !content.trim().is_empty() {
            self.history.push(content.clone());
        }
        self.cursor = 0;
        self.reset_history_navigation();
        content
    }

    /// Loads the previous prompt. Returns whether the buffer changed.
    pub fn history_previous(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        let target = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.load_history(target)
    }

    /// Loads the next prompt, or clears the buffer past the newest one.
    pub fn history_next(&mut self) -> bool {
        match self.history_index {
            Some(idx) if idx + 1 < self.history.len() => self.load_history(idx + 1),
            Some(_) => {
                self.history_index = None;
                self.buffer.clear();
                self.cursor = 0;
                true
            }
            None => false,
        }
    }

    fn load_history(&mut self, index: usize) -> bool {
        let Some(entry) = self.history.get(index).cloned() else {
            return false;
        };
        self.buffer = entry;
        self.cursor = self.buffer.len();
        self.history_index = Some(index);
        true
    }

    fn reset_history_navigation(&mut self) {
        self.history_index = None;
    }

    /// The (col, row) of the cursor when the buffer is wrapped at `width` cells.
    pub fn cursor_display_position(&self, width: usize) -> (u16, u16) {
        if width == 0 {
            return (0, 0);
        }
        let mut col = 0usize;
        let mut row = 0usize;
        for ch in self.buffer[..self.cursor].chars() {
            if ch == '\n' {
                row += 1;
                col = 0;
                continue;
            }
            let char_width = unicode_width::UnicodeWidthChar::width(ch)
                .unwrap_or(1)
                .max(1);
            if col + char_width > width {
                row += 1;
                col = 0;
            }
            col += char_width;
            if col >= width {
                row += 1;
                col = 0;
            }
        }
        (col as u16, row as u16)
    }
}

/// Modal panels drawn on top of everything else.
#[derive(Debug, Clone)]
pub enum OverlayState {
    RenameConversation(InputPromptState),
    ConfirmDelete(ConfirmDeleteState),
}

/// State for the rename prompt.
#[derive(Debug, Clone)]
pub struct InputPromptState {
    pub title: String,
    pub value: String,
    pub placeholder: String,
    /// Conversation being renamed.
    pub target_id: String,
    pub error: Option<String>,
}

impl InputPromptState {
    pub fn new(
        title: impl Into<String>,
        placeholder: impl Into<String>,
        target_id: impl Into<String>,
        initial: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            value: initial.unwrap_or_default(),
            placeholder: placeholder.into(),
            target_id: target_id.into(),
            error: None,
        }
    }
}

/// State for the "confirm delete" overlay.
#[derive(Debug, Clone)]
pub struct ConfirmDeleteState {
    pub target_id: String,
    /// Title shown to the user.
    pub display: String,
    /// 0 for Confirm, 1 for Cancel.
    pub selected_index: usize,
}

impl ConfirmDeleteState {
    pub fn new(target_id: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            display: display.into(),
            selected_index: 1,
        }
    }

    pub fn toggle_selection(&mut self) {
        self.selected_index = (self.selected_index + 1) % 2;
    }

    pub fn select(&mut self, index: usize) {
        self.selected_index = index.min(1);
    }

    pub fn confirm_selected(&self) -> bool {
        self.selected_index == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_flags_are_independent() {
        let mut panels = PanelVisibility::default();
        panels.toggle_settings();
        assert!(panels.settings_open);
        assert!(!panels.history_open);

        panels.toggle_history();
        panels.set_settings_open(false);
        assert!(!panels.settings_open);
        assert!(panels.history_open);

        panels.set_history_open(false);
        assert_eq!(panels, PanelVisibility::default());
    }

    #[test]
    fn composer_edits_multibyte_text() {
        let mut composer = ChatComposer::new();
        for ch in "天氣?".chars() {
            composer.insert_char(ch);
        }
        composer.move_left();
        composer.backspace();
        assert_eq!(composer.buffer(), "天?");
        composer.move_to_line_end();
        composer.insert_newline();
        composer.insert_char('x');
        assert_eq!(composer.buffer(), "天?\nx");
        assert_eq!(composer.cursor_display_position(20), (1, 1));
    }

    #[test]
    fn composer_history_round_trips() {
        let mut composer = ChatComposer::new();
        composer.insert_char('a');
        assert_eq!(composer.take(), "a");
        composer.insert_char('b');
        composer.take();

        assert!(composer.history_previous());
        assert_eq!(composer.buffer(), "b");
        assert!(composer.history_previous());
        assert_eq!(composer.buffer(), "a");
        assert!(composer.history_next());
        assert_eq!(composer.buffer(), "b");
        assert!(composer.history_next());
        assert!(composer.is_empty());
        assert!(!composer.history_next());
    }

    #[test]
    fn settings_field_steps_stop_at_the_ends() {
        assert_eq!(SettingsField::Agent.step(-1), SettingsField::Agent);
        assert_eq!(SettingsField::Agent.step(2), SettingsField::Temperature);
        assert_eq!(SettingsField::MaxTokens.step(5), SettingsField::ClearChat);
    }

    #[test]
    fn delete_confirmation_defaults_to_cancel() {
        let mut state = ConfirmDeleteState::new("1", "Trip");
        assert!(!state.confirm_selected());
        state.toggle_selection();
        assert!(state.confirm_selected());
        state.select(7);
        assert!(!state.confirm_selected());
    }
}
