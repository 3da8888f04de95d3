//! `app` 模組是聊天客戶端的核心。
//!
//! 它負責管理應用程式的整體狀態、處理鍵盤輸入，
//! 並協調訊息列表、歷史抽屜與設定面板之間的互動。

/// `agent` 模組：提交訊息、套用代理事件，以及對話與設定的操作。
mod agent;
/// `init` 模組：負責 `App` 結構的初始化和設定。
mod init;
/// `keyboard` 模組：專門處理所有的鍵盤輸入事件。
mod keyboard;
/// `overlays` 模組：重新命名與刪除確認彈窗的按鍵邏輯。
mod overlays;
/// `state` 模組：定義了 `App` 結構以及所有核心的狀態類型。
mod state;
/// `tick` 模組：處理應用程式的定時更新事件（tick）。
mod tick;

pub use state::{
    App, ChatComposer, ConfirmDeleteState, FocusArea, InputPromptState, OverlayState,
    PanelVisibility, SettingsField,
};
