use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::agent::config::AgentVariant;
use crate::agent::message::{Conversation, Message, ToolAction};
use crate::agent::providers::{AgentBackend, GatewayError};
use crate::store::Persistent;

/// 後端呼叫失敗時顯示給使用者的固定回覆。
pub const ERROR_REPLY: &str = "Sorry, I couldn't reach the agent service. Please try again.";

/// 對話狀態：目前顯示的訊息、所有已儲存的對話，以及作用中對話的指標。
///
/// 所有訊息異動都會寫回作用中的對話紀錄，因此切換對話不會遺失內容。
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStore {
    /// 目前顯示的訊息列表。
    pub messages: Vec<Message>,
    /// 正在等待代理回覆。不會被序列化，重新載入時一律為 `false`。
    #[serde(skip)]
    pub is_streaming: bool,
    pub current_conversation_id: Option<String>,
    pub conversations: Vec<Conversation>,
}

impl ConversationStore {
    /// 送出流程的前半段：加入使用者訊息並標記為串流中。
    ///
    /// 呼叫端需先確認文字非空白。
    pub fn begin_send(&mut self, text: &str) {
        self.messages.push(Message::user(text));
        self.is_streaming = true;
        self.sync_active();
    }

    /// 送出流程的後半段：成功時加入代理回覆，失敗時加入固定的錯誤訊息。
    pub fn complete_send(&mut self, outcome: Result<String, GatewayError>) {
        let content = match outcome {
            Ok(content) => content,
            Err(err) => {
                warn!("Agent call failed: {}", err);
                ERROR_REPLY.to_string()
            }
        };
        self.messages.push(Message::assistant(content));
        self.is_streaming = false;
        self.sync_active();
    }

    /// 將一段文字附加到最後一則代理訊息；若最後一則不是代理訊息則新增一則。
    /// 訊息列表為空時不做任何事。
    pub fn append_token(&mut self, token: &str) {
        let Some(last) = self.messages.last_mut() else {
            return;
        };
        if last.is_assistant() {
            last.content.push_str(token);
        } else {
            self.messages.push(Message::assistant(token));
        }
        self.sync_active();
    }

    /// 在最後一則代理訊息上記錄或推進一個工具步驟，必要時先建立一則空白代理訊息。
    pub fn attach_tool_action(&mut self, action: ToolAction) {
        if !self.messages.last().is_some_and(Message::is_assistant) {
            self.messages.push(Message::assistant(""));
        }
        if let Some(last) = self.messages.last_mut()
            && let Err(err) = last.upsert_tool_action(action)
        {
            warn!("Ignoring tool update: {}", err);
            return;
        }
        self.sync_active();
    }

    /// 增量回覆結束後清除串流旗標。
    pub fn finish_streaming(&mut self) {
        self.is_streaming = false;
    }

    /// 切換到指定的對話；未知的 id 不做任何事。
    pub fn set_current_conversation(&mut self, id: &str) {
        let Some(conversation) = self.conversations.iter().find(|c| c.id == id) else {
            debug!("Ignoring switch to unknown conversation {}", id);
            return;
        };
        self.messages = conversation.messages.clone();
        self.current_conversation_id = Some(conversation.id.clone());
    }

    /// 建立一個空白對話並設為作用中，回傳其 id。
    pub fn create_new_conversation(&mut self) -> String {
        let conversation = Conversation::new(format!("Conversation {}", self.conversations.len() + 1));
        let id = conversation.id.clone();
        self.conversations.push(conversation);
        self.current_conversation_id = Some(id.clone());
        self.messages.clear();
        id
    }

    /// 刪除對話；若刪除的是作用中的對話，一併清空指標與訊息列表。
    pub fn delete_conversation(&mut self, id: &str) {
        self.conversations.retain(|c| c.id != id);
        if self.current_conversation_id.as_deref() == Some(id) {
            self.current_conversation_id = None;
            self.messages.clear();
        }
    }

    /// 重新命名對話並更新時間戳記；未知的 id 不做任何事。
    pub fn update_conversation_title(&mut self, id: &str, title: &str) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) {
            conversation.title = title.to_string();
            conversation.updated_at = Utc::now();
        }
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        let id = self.current_conversation_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    /// 依最後更新時間由新到舊排列的對話。
    pub fn conversations_by_recency(&self) -> Vec<&Conversation> {
        let mut ordered: Vec<&Conversation> = self.conversations.iter().collect();
        ordered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
        ordered
    }

    fn sync_active(&mut self) {
        let Some(id) = self.current_conversation_id.as_deref() else {
            return;
        };
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) {
            conversation.messages = self.messages.clone();
            conversation.updated_at = Utc::now();
        }
    }
}

impl Persistent<ConversationStore> {
    /// 完整的送出流程：使用者訊息、呼叫後端、代理回覆，每一步都會寫入儲存。
    pub async fn send_message(
        &mut self,
        text: &str,
        backend: &dyn AgentBackend,
        variant: AgentVariant,
    ) {
        self.update(|store| store.begin_send(text));
        let outcome = backend
            .send_message(text, variant)
            .await
            .map(|response| response.result.content);
        self.update(|store| store.complete_send(outcome));
    }
}
