use anyhow::Result;
use log::{debug, info};

use super::{App, ChatComposer, FocusArea, PanelVisibility, SettingsField};
use crate::agent::config::ClientConfig;
use crate::agent::{AgentManager, AgentSettings, ConversationStore};
use crate::store::{CHAT_BLOB, Persistent, SETTINGS_BLOB, StateStorage};

impl App {
    /// Creates the application state from a resolved configuration.
    ///
    /// Both persisted stores are rehydrated from the state directory and the
    /// backend health probe is started in the background.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let storage = StateStorage::new(config.state_dir.clone());
        debug!("Loading client state from {}", storage.root().display());
        let settings = Persistent::rehydrate(storage.clone(), SETTINGS_BLOB);
        let chat = Persistent::rehydrate(storage, CHAT_BLOB);
        let manager = AgentManager::from_config(&config);

        let app = Self::with_stores(config, settings, chat, manager);
        app.agent_manager.check_health();
        Ok(app)
    }

    /// Assembles an `App` from already-built parts.
    pub fn with_stores(
        config: ClientConfig,
        settings: Persistent<AgentSettings>,
        chat: Persistent<ConversationStore>,
        agent_manager: AgentManager,
    ) -> Self {
        let backend = agent_manager.backend_name().to_string();
        let mut app = Self {
            should_quit: false,
            config,
            settings,
            chat,
            panels: PanelVisibility::default(),
            focus: FocusArea::Chat,
            composer: ChatComposer::new(),
            overlay: None,
            history_selected: 0,
            settings_field: SettingsField::Agent,
            scroll: 0,
            max_scroll: 0,
            status_message: format!(
                "Connecting to {} agent… Ctrl+H history · Ctrl+O settings · Ctrl+Q quit",
                backend
            ),
            spinner_frame: 0,
            agent_manager,
        };

        if app.chat.current_conversation_id.is_none() {
            let id = app.chat.update(|chat| chat.create_new_conversation());
            info!("Started conversation {}", id);
        }
        app
    }
}
