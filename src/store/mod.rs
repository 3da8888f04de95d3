//! 用戶端狀態的持久化基礎。

pub mod persist;

pub use persist::{Persistent, StateStorage, StorageError};

/// 代理設定的儲存名稱。
pub const SETTINGS_BLOB: &str = "agent-settings-storage";
/// 對話狀態的儲存名稱。
pub const CHAT_BLOB: &str = "chat-storage";
