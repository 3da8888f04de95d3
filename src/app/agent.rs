use log::{debug, info, warn};

use super::{App, ConfirmDeleteState, FocusArea, InputPromptState, OverlayState, SettingsField};
use crate::agent::AgentEvent;
use crate::agent::config::{MAX_TOKENS_STEP, TEMPERATURE_STEP};
use crate::agent::providers::ReplyChunk;

// Implementation block for chat and conversation actions in the App.
impl App {
    /// Submits the composer's text to the selected agent.
    ///
    /// Refused while a reply is pending; the text stays in the composer.
    pub(crate) fn submit_prompt(&mut self) {
        if self.chat.is_streaming {
            self.status_message = String::from("Agent is still replying, please wait");
            return;
        }
        if self.composer.buffer().trim().is_empty() {
            self.status_message = String::from("Message is empty, not sending.");
            return;
        }
        let prompt = self.composer.take();
        if self.chat.current_conversation_id.is_none() {
            self.chat.update(|chat| chat.create_new_conversation());
        }

        let variant = self.settings.agent_variant();
        self.chat.update(|chat| chat.begin_send(&prompt));
        info!(
            "Submitting prompt to {} agent: {}",
            variant.slug(),
            prompt.lines().next().unwrap_or("")
        );
        self.agent_manager.dispatch(prompt, variant);
        self.scroll = 0;
        self.status_message = format!("Sent to {} agent", variant.display_name());
    }

    /// Applies one background event to the conversation store.
    pub(crate) fn apply_agent_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Reply(outcome) => {
                self.status_message = match &outcome {
                    Ok(_) => String::from("Reply received"),
                    Err(err) => format!("Agent error: {}", err),
                };
                self.chat.update(|chat| chat.complete_send(outcome));
            }
            AgentEvent::Chunk(ReplyChunk::Token(token)) => {
                self.chat.update(|chat| chat.append_token(&token));
            }
            AgentEvent::Chunk(ReplyChunk::Tool(action)) => {
                self.status_message = format!("Tool {}: {}", action.name, action.status.label());
                self.chat.update(|chat| chat.attach_tool_action(action));
            }
            AgentEvent::StreamClosed(None) => {
                self.chat.update(|chat| chat.finish_streaming());
                self.status_message = String::from("Reply received");
            }
            AgentEvent::StreamClosed(Some(err)) => {
                self.status_message = format!("Agent error: {}", err);
                self.chat.update(|chat| chat.complete_send(Err(err)));
            }
            AgentEvent::Health(Ok(health)) => {
                info!("Agent service healthy: {:?}", health.available_agents);
                self.status_message = format!(
                    "Connected to {} ({} agents available)",
                    self.agent_manager.backend_name(),
                    health.available_agents.len()
                );
            }
            AgentEvent::Health(Err(err)) => {
                warn!("Agent service health check failed: {}", err);
                self.status_message = format!("Agent service unreachable: {}", err);
            }
        }
    }

    /// Replies land in the active list, so it must not change under a pending one.
    fn refuse_while_streaming(&mut self, action: &str) -> bool {
        if self.chat.is_streaming {
            self.status_message = format!("Agent is still replying, cannot {} now", action);
            return true;
        }
        false
    }

    /// Ctrl+N and the drawer's "new" entry.
    pub(crate) fn start_new_conversation(&mut self) {
        if self.refuse_while_streaming("start a new conversation") {
            return;
        }
        let id = self.chat.update(|chat| chat.create_new_conversation());
        self.history_selected = 0;
        self.scroll = 0;
        debug!("Created conversation {}", id);
        self.status_message = String::from("Started a new conversation");
    }

    /// The "Clear Chat History" action: begins a fresh conversation and closes settings.
    pub(crate) fn clear_chat(&mut self) {
        if self.refuse_while_streaming("clear the chat") {
            return;
        }
        self.start_new_conversation();
        self.close_settings();
    }

    /// Id and title of the conversation highlighted in the history drawer.
    pub(crate) fn highlighted_conversation(&self) -> Option<(String, String)> {
        self.chat
            .conversations_by_recency()
            .get(self.history_selected)
            .map(|c| (c.id.clone(), c.title.clone()))
    }

    pub(crate) fn move_history_selection(&mut self, delta: isize) {
        let len = self.chat.conversations.len();
        if len == 0 {
            self.history_selected = 0;
            return;
        }
        let next = (self.history_selected as isize + delta).clamp(0, len as isize - 1);
        self.history_selected = next as usize;
    }

    /// Makes the highlighted conversation active and closes the drawer.
    pub(crate) fn open_highlighted_conversation(&mut self) {
        let Some((id, title)) = self.highlighted_conversation() else {
            return;
        };
        let switching = self.chat.current_conversation_id.as_deref() != Some(id.as_str());
        if switching && self.refuse_while_streaming("switch conversations") {
            return;
        }
        self.chat.update(|chat| chat.set_current_conversation(&id));
        self.scroll = 0;
        self.close_history();
        self.status_message = format!("Opened {}", title);
    }

    pub(crate) fn prompt_rename_highlighted(&mut self) {
        let Some((id, title)) = self.highlighted_conversation() else {
            return;
        };
        self.overlay = Some(OverlayState::RenameConversation(InputPromptState::new(
            "重新命名對話",
            "輸入新的對話標題",
            id,
            Some(title),
        )));
        self.status_message = String::from("Rename conversation: waiting for input");
    }

    pub(crate) fn prompt_delete_highlighted(&mut self) {
        let Some((id, title)) = self.highlighted_conversation() else {
            return;
        };
        self.overlay = Some(OverlayState::ConfirmDelete(ConfirmDeleteState::new(id, title)));
    }

    pub(crate) fn rename_conversation(&mut self, id: &str, title: &str) {
        self.chat
            .update(|chat| chat.update_conversation_title(id, title));
        self.status_message = format!("Renamed to {}", title);
    }

    pub(crate) fn delete_conversation(&mut self, id: &str, display: &str) {
        let active = self.chat.current_conversation_id.as_deref() == Some(id);
        if active && self.refuse_while_streaming("delete the active conversation") {
            return;
        }
        self.chat.update(|chat| chat.delete_conversation(id));
        self.move_history_selection(0);
        info!("Deleted conversation {}", id);
        self.status_message = format!("Deleted {}", display);
    }

    /// Changes the highlighted setting by `delta` steps.
    pub(crate) fn adjust_setting(&mut self, delta: isize) {
        let field = self.settings_field;
        self.settings.update(|settings| match field {
            SettingsField::Agent => {
                let next = settings.agent_variant().cycle(delta);
                settings.set_agent_variant(next);
            }
            SettingsField::Model => settings.cycle_model(delta),
            SettingsField::Temperature => {
                let step = TEMPERATURE_STEP * delta as f32;
                settings.set_temperature(settings.temperature() + step);
            }
            SettingsField::MaxTokens => {
                let step = MAX_TOKENS_STEP as i64 * delta as i64;
                let next = (settings.max_tokens() as i64 + step).max(0) as u32;
                settings.set_max_tokens(next);
            }
            SettingsField::ClearChat => {}
        });
        self.status_message = match field {
            SettingsField::Agent => format!("Agent: {}", self.settings.agent_variant().display_name()),
            SettingsField::Model => format!("Model: {}", self.settings.model_label()),
            SettingsField::Temperature => format!("Temperature: {:.1}", self.settings.temperature()),
            SettingsField::MaxTokens => format!("Max tokens: {}", self.settings.max_tokens()),
            SettingsField::ClearChat => return,
        };
    }

    pub(crate) fn toggle_history(&mut self) {
        self.panels.toggle_history();
        self.focus = if self.panels.history_open {
            self.history_selected = 0;
            FocusArea::History
        } else {
            self.fallback_focus()
        };
    }

    pub(crate) fn toggle_settings(&mut self) {
        self.panels.toggle_settings();
        self.focus = if self.panels.settings_open {
            FocusArea::Settings
        } else {
            self.fallback_focus()
        };
    }

    pub(crate) fn close_history(&mut self) {
        self.panels.set_history_open(false);
        self.focus = self.fallback_focus();
    }

    pub(crate) fn close_settings(&mut self) {
        self.panels.set_settings_open(false);
        self.focus = self.fallback_focus();
    }

    fn fallback_focus(&self) -> FocusArea {
        if self.panels.history_open {
            FocusArea::History
        } else if self.panels.settings_open {
            FocusArea::Settings
        } else {
            FocusArea::Chat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ERROR_REPLY;
    use crate::agent::config::AgentVariant;
    use crate::agent::message::{Role, ToolAction, ToolStatus};
    use crate::agent::providers::GatewayError;
    use crate::app::testing::test_app;

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.composer.insert_char(ch);
        }
    }

    #[test]
    fn a_conversation_is_active_from_the_start() {
        let app = test_app();
        assert!(app.chat.current_conversation_id.is_some());
        assert_eq!(app.chat.conversations.len(), 1);
    }

    #[tokio::test]
    async fn submit_is_refused_while_streaming() {
        let mut app = test_app();
        type_text(&mut app, "first");
        app.submit_prompt();
        assert!(app.chat.is_streaming);

        type_text(&mut app, "second");
        app.submit_prompt();
        assert_eq!(app.composer.buffer(), "second");
        assert_eq!(app.chat.messages.len(), 1);
    }

    #[tokio::test]
    async fn pending_reply_stays_with_the_conversation_that_asked() {
        let mut app = test_app();
        let first = app.chat.current_conversation_id.clone().unwrap();
        type_text(&mut app, "bitcoin?");
        app.submit_prompt();

        app.start_new_conversation();
        app.clear_chat();
        app.delete_conversation(&first, "Conversation 1");
        assert_eq!(app.chat.conversations.len(), 1);
        assert_eq!(app.chat.current_conversation_id.as_deref(), Some(first.as_str()));

        app.apply_agent_event(AgentEvent::Chunk(ReplyChunk::Token(String::from("kept "))));
        app.apply_agent_event(AgentEvent::Chunk(ReplyChunk::Token(String::from("tokens"))));
        app.apply_agent_event(AgentEvent::StreamClosed(None));

        let saved = app.chat.current_conversation().unwrap();
        let contents: Vec<(Role, &str)> = saved
            .messages
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            contents,
            vec![(Role::User, "bitcoin?"), (Role::Assistant, "kept tokens")]
        );

        app.start_new_conversation();
        assert_eq!(app.chat.conversations.len(), 2);
    }

    #[tokio::test]
    async fn switching_is_refused_while_a_reply_is_pending() {
        let mut app = test_app();
        app.start_new_conversation();
        let second = app.chat.current_conversation_id.clone().unwrap();
        type_text(&mut app, "weather?");
        app.submit_prompt();

        app.history_selected = 1;
        app.open_highlighted_conversation();
        assert_eq!(app.chat.current_conversation_id.as_deref(), Some(second.as_str()));

        app.apply_agent_event(AgentEvent::Reply(Ok(String::from("Sunny"))));
        assert_eq!(app.chat.messages.len(), 2);
        assert_eq!(app.chat.current_conversation().unwrap().messages[1].content, "Sunny");
    }

    #[test]
    fn blank_input_is_not_sent() {
        let mut app = test_app();
        type_text(&mut app, "   ");
        app.submit_prompt();
        assert!(app.chat.messages.is_empty());
        assert!(!app.chat.is_streaming);
    }

    #[tokio::test]
    async fn streamed_events_build_the_reply() {
        let mut app = test_app();
        type_text(&mut app, "bitcoin?");
        app.submit_prompt();

        let mut action = ToolAction::pending("t1", "crypto_price");
        app.apply_agent_event(AgentEvent::Chunk(ReplyChunk::Tool(action.clone())));
        app.apply_agent_event(AgentEvent::Chunk(ReplyChunk::Token(String::from("Up "))));
        app.apply_agent_event(AgentEvent::Chunk(ReplyChunk::Token(String::from("today."))));
        action.status = ToolStatus::Completed;
        app.apply_agent_event(AgentEvent::Chunk(ReplyChunk::Tool(action)));
        app.apply_agent_event(AgentEvent::StreamClosed(None));

        assert!(!app.chat.is_streaming);
        assert_eq!(app.chat.messages.len(), 2);
        let reply = &app.chat.messages[1];
        assert_eq!(reply.content, "Up today.");
        assert_eq!(
            reply.tool_actions.as_ref().unwrap()[0].status,
            ToolStatus::Completed
        );
        let active = app.chat.current_conversation().unwrap();
        assert_eq!(active.messages.len(), 2);
    }

    #[tokio::test]
    async fn failed_reply_shows_the_error_bubble() {
        let mut app = test_app();
        type_text(&mut app, "hello");
        app.submit_prompt();
        app.apply_agent_event(AgentEvent::Reply(Err(GatewayError::Rejected(String::from(
            "error",
        )))));

        assert!(!app.chat.is_streaming);
        let last = app.chat.messages.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, ERROR_REPLY);
    }

    #[test]
    fn settings_adjust_within_range() {
        let mut app = test_app();
        app.settings_field = SettingsField::Agent;
        app.adjust_setting(1);
        assert_eq!(app.settings.agent_variant(), AgentVariant::Crypto);

        app.settings_field = SettingsField::Temperature;
        for _ in 0..10 {
            app.adjust_setting(1);
        }
        assert!((app.settings.temperature() - 1.0).abs() < f32::EPSILON);

        app.settings_field = SettingsField::MaxTokens;
        for _ in 0..100 {
            app.adjust_setting(-1);
        }
        assert_eq!(app.settings.max_tokens(), 128);
    }

    #[test]
    fn history_drawer_actions_follow_recency() {
        let mut app = test_app();
        let first = app.chat.current_conversation_id.clone().unwrap();
        app.chat
            .update(|chat| chat.update_conversation_title(&first, "Older"));
        app.start_new_conversation();
        app.chat.update(|chat| {
            chat.conversations[0].updated_at = chrono::Utc::now() - chrono::Duration::hours(1);
        });

        app.toggle_history();
        assert_eq!(app.focus, FocusArea::History);
        app.move_history_selection(1);
        assert_eq!(app.highlighted_conversation().unwrap().1, "Older");

        app.open_highlighted_conversation();
        assert_eq!(app.chat.current_conversation_id.as_deref(), Some(first.as_str()));
        assert!(!app.panels.history_open);
        assert_eq!(app.focus, FocusArea::Chat);
    }

    #[test]
    fn clearing_chat_starts_fresh_and_closes_settings() {
        let mut app = test_app();
        app.chat.update(|chat| chat.begin_send("old"));
        app.toggle_settings();
        app.clear_chat();
        assert!(app.chat.messages.is_empty());
        assert_eq!(app.chat.conversations.len(), 2);
        assert!(!app.panels.settings_open);
    }
}
