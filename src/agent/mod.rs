//! 代理對話的核心：資料結構、設定、後端通訊與對話狀態。

/// `config` 模組：代理設定（模型、溫度、輸出上限、代理類型）與用戶端設定的分層載入。
pub mod config;

/// `manager` 模組：提供 `AgentManager`，在背景任務中呼叫後端並以事件回報結果。
pub mod manager;

/// `message` 模組：訊息、工具步驟與對話的資料模型。
pub mod message;

/// `providers` 模組：與代理後端通訊的具體實作（HTTP 與離線模擬）。
pub mod providers;

/// `session` 模組：對話狀態 `ConversationStore` 及其所有操作。
pub mod session;

pub use config::{AgentSettings, AgentVariant, ClientConfig, ConfigOverrides};
pub use manager::{AgentEvent, AgentManager};
pub use message::{Conversation, Message, Role, ToolAction, ToolStatus};
pub use session::{ConversationStore, ERROR_REPLY};
