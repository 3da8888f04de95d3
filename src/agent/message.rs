use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 訊息的發送者角色。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// 對話中的單一訊息。
///
/// 建立後僅有 `content`（串流期間附加文字）與 `tool_actions`（工具步驟推進）會被修改。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// 依建立順序可排序的唯一識別碼。
    pub id: String,
    /// 訊息文字內容。
    pub content: String,
    pub role: Role,
    /// 建立時間。
    pub timestamp: DateTime<Utc>,
    /// 代理在產生此訊息時執行的工具步驟（可選）。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_actions: Option<Vec<ToolAction>>,
}

impl Message {
    /// 建立一則使用者訊息。
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// 建立一則代理訊息。
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: next_id(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
            tool_actions: None,
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// 新增或更新一個工具步驟。
    ///
    /// 相同 `id` 的步驟只能依 `pending -> running -> completed | error` 順序前進。
    pub fn upsert_tool_action(&mut self, action: ToolAction) -> Result<(), ToolActionError> {
        let actions = self.tool_actions.get_or_insert_with(Vec::new);
        if let Some(existing) = actions.iter_mut().find(|a| a.id == action.id) {
            existing.advance(action.status)?;
            if let Some(progress) = action.progress {
                existing.set_progress(progress);
            }
            if action.result.is_some() {
                existing.result = action.result;
            }
        } else {
            actions.push(action);
        }
        Ok(())
    }
}

/// 一個工具步驟的執行狀態。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl ToolStatus {
    /// 回傳狀態的顯示名稱。
    pub fn label(&self) -> &'static str {
        match self {
            ToolStatus::Pending => "Pending",
            ToolStatus::Running => "Running",
            ToolStatus::Completed => "Completed",
            ToolStatus::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ToolStatus::Completed | ToolStatus::Error)
    }

    fn can_become(self, next: ToolStatus) -> bool {
        match (self, next) {
            (current, next) if current == next => !current.is_terminal(),
            (ToolStatus::Pending, _) => true,
            (ToolStatus::Running, ToolStatus::Completed | ToolStatus::Error) => true,
            _ => false,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("tool action {id}: cannot move from {from:?} to {to:?}")]
pub struct ToolActionError {
    pub id: String,
    pub from: ToolStatus,
    pub to: ToolStatus,
}

/// 代理後端的一次工具呼叫，於訊息氣泡中以卡片呈現。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolAction {
    pub id: String,
    /// 顯示名稱。
    pub name: String,
    pub status: ToolStatus,
    /// 進度百分比（0..=100），僅在 `running` 時有意義。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// 任意形狀的結果資料。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl ToolAction {
    /// 建立一個處於 `pending` 狀態的工具步驟。
    pub fn pending(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: ToolStatus::Pending,
            progress: None,
            result: None,
        }
    }

    /// 將狀態往前推進；倒退或離開終止狀態會被拒絕。
    pub fn advance(&mut self, next: ToolStatus) -> Result<(), ToolActionError> {
        if !self.status.can_become(next) {
            return Err(ToolActionError {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next != ToolStatus::Running {
            self.progress = None;
        }
        Ok(())
    }

    /// 設定進度；非 `running` 狀態時忽略。
    pub fn set_progress(&mut self, progress: u8) {
        if self.status == ToolStatus::Running {
            self.progress = Some(progress.min(100));
        }
    }
}

/// 一段具名、帶時間戳記的訊息序列。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: next_id(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }
}

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// 產生以毫秒時間為基礎、在程序內嚴格遞增的識別碼。
///
/// 補零至 13 位數，使字典序與建立順序一致。
pub fn next_id() -> String {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return format!("{:013}", candidate),
            Err(actual) => last = actual,
        }
    }
}
