use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{App, FocusArea, SettingsField};

/// Lines moved per PageUp/PageDown in the message list.
const SCROLL_STEP: u16 = 5;

impl App {
    /// The main entry point for handling keyboard events.
    ///
    /// This function acts as a router, dispatching the key event to the appropriate
    /// handler based on the application's current state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        // Overlays capture all input.
        if self.overlay.is_some() {
            self.handle_overlay_key(key);
            return;
        }

        if self.handle_global_shortcuts(key) {
            return;
        }

        match self.focus {
            FocusArea::Chat => self.handle_chat_key(key),
            FocusArea::History => self.handle_history_key(key),
            FocusArea::Settings => self.handle_settings_key(key),
        }
    }

    /// Handles application-wide shortcuts. Returns `true` if the key was consumed.
    fn handle_global_shortcuts(&mut self, key: KeyEvent) -> bool {
        if !key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('c') => self.should_quit = true,
            KeyCode::Char('h') => self.toggle_history(),
            KeyCode::Char('o') => self.toggle_settings(),
            KeyCode::Char('n') => self.start_new_conversation(),
            _ => return false,
        }
        true
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        let modifiers = key.modifiers;
        match key.code {
            KeyCode::Enter => {
                if modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                    self.composer.insert_newline();
                } else {
                    self.submit_prompt();
                }
            }
            KeyCode::Backspace => self.composer.backspace(),
            KeyCode::Delete => self.composer.delete(),
            KeyCode::Left => self.composer.move_left(),
            KeyCode::Right => self.composer.move_right(),
            KeyCode::Home => self.composer.move_to_line_start(),
            KeyCode::End => self.composer.move_to_line_end(),
            KeyCode::Esc => {
                self.composer.clear();
                self.status_message = String::from("Input cleared");
            }
            // Prompt history only while the composer is empty or already browsing.
            KeyCode::Up => {
                if self.composer.is_empty() || self.composer.is_browsing_history() {
                    self.composer.history_previous();
                }
            }
            KeyCode::Down => {
                if self.composer.is_browsing_history() {
                    self.composer.history_next();
                }
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_add(SCROLL_STEP).min(self.max_scroll);
            }
            KeyCode::PageDown => self.scroll = self.scroll.saturating_sub(SCROLL_STEP),
            KeyCode::Char(ch) => {
                if !(modifiers.contains(KeyModifiers::CONTROL)
                    || modifiers.contains(KeyModifiers::ALT))
                {
                    self.composer.insert_char(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_history_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_history_selection(1),
            KeyCode::Enter => self.open_highlighted_conversation(),
            KeyCode::Char('n') => self.start_new_conversation(),
            KeyCode::Char('r') => self.prompt_rename_highlighted(),
            KeyCode::Char('d') | KeyCode::Delete => self.prompt_delete_highlighted(),
            KeyCode::Esc => self.close_history(),
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.settings_field = self.settings_field.step(-1),
            KeyCode::Down | KeyCode::Tab => self.settings_field = self.settings_field.step(1),
            KeyCode::Left => self.adjust_setting(-1),
            KeyCode::Right => self.adjust_setting(1),
            KeyCode::Enter if self.settings_field == SettingsField::ClearChat => self.clear_chat(),
            KeyCode::Enter => self.adjust_setting(1),
            KeyCode::Esc => self.close_settings(),
            _ => {}
        }
    }
}
