use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{App, ConfirmDeleteState, InputPromptState, OverlayState};

// Implementation block for overlay-related logic in the App.
impl App {
    /// Routes a key press to the active overlay.
    pub(crate) fn handle_overlay_key(&mut self, key: KeyEvent) {
        // Take the state out so the handlers can borrow `self` freely.
        if let Some(overlay) = self.overlay.take() {
            match overlay {
                OverlayState::RenameConversation(state) => self.handle_rename_key(key, state),
                OverlayState::ConfirmDelete(state) => self.handle_confirm_delete_key(key, state),
            }
        }
    }

    fn handle_rename_key(&mut self, key: KeyEvent, mut state: InputPromptState) {
        match key.code {
            KeyCode::Esc => {
                self.status_message = String::from("Rename cancelled");
                return;
            }
            KeyCode::Enter => {
                let title = state.value.trim().to_string();
                if title.is_empty() {
                    state.error = Some(String::from("Title cannot be empty"));
                } else {
                    self.rename_conversation(&state.target_id, &title);
                    return;
                }
            }
            KeyCode::Backspace => {
                state.value.pop();
                state.error = None;
            }
            KeyCode::Char(ch)
                if !(key.modifiers.contains(KeyModifiers::CONTROL)
                    || key.modifiers.contains(KeyModifiers::ALT)) =>
            {
                state.value.push(ch);
                state.error = None;
            }
            _ => {}
        }
        self.overlay = Some(OverlayState::RenameConversation(state));
    }

    fn handle_confirm_delete_key(&mut self, key: KeyEvent, mut state: ConfirmDeleteState) {
        match key.code {
            KeyCode::Esc => {
                self.status_message = format!("Deletion cancelled: {}", state.display);
                return;
            }
            KeyCode::Left | KeyCode::Up => state.select(0),
            KeyCode::Right | KeyCode::Down => state.select(1),
            KeyCode::Tab | KeyCode::BackTab => state.toggle_selection(),
            KeyCode::Enter => {
                if state.confirm_selected() {
                    self.delete_conversation(&state.target_id, &state.display);
                } else {
                    self.status_message = format!("Deletion cancelled: {}", state.display);
                }
                return;
            }
            _ => {}
        }
        self.overlay = Some(OverlayState::ConfirmDelete(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::test_app;


    fn press(app: &mut App, code: KeyCode) {
        app.handle_overlay_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn rename_prompt_applies_the_new_title() {
        let mut app = test_app();
        app.prompt_rename_highlighted();
        for _ in 0.."Conversation 1".len() {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.overlay.is_some(), "empty titles are rejected");

        for ch in "Trip".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Enter);
        assert!(app.overlay.is_none());
        assert_eq!(app.chat.conversations[0].title, "Trip");
    }

    #[test]
    fn delete_needs_explicit_confirmation() {
        let mut app = test_app();
        app.prompt_delete_highlighted();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.chat.conversations.len(), 1);

        app.prompt_delete_highlighted();
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        assert!(app.chat.conversations.is_empty());
        assert!(app.chat.current_conversation_id.is_none());
    }
}
