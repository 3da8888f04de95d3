use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};

use crate::agent::message::{Conversation, Message, Role};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("conversation store is unavailable: {0}")]
    Poisoned(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage seam for the history endpoints.
pub trait ConversationRepository: Send + Sync + 'static {
    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<Conversation>>>;

    fn get(&self, id: &str) -> BoxFuture<'static, RepositoryResult<Option<Conversation>>>;

    /// Returns whether a conversation was removed.
    fn delete(&self, id: &str) -> BoxFuture<'static, RepositoryResult<bool>>;
}

/// In-memory repository; contents reset with the process.
#[derive(Clone, Default)]
pub struct InMemoryConversationRepository {
    conversations: Arc<Mutex<Vec<Conversation>>>,
}

impl InMemoryConversationRepository {
    pub fn new(conversations: Vec<Conversation>) -> Self {
        Self {
            conversations: Arc::new(Mutex::new(conversations)),
        }
    }

    /// The two demo conversations served by `GET /api/history`.
    pub fn seeded() -> Self {
        Self::new(seed_conversations())
    }
}

fn lock_error(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Poisoned(format!("Failed to lock conversations: {}", e))
}

impl ConversationRepository for InMemoryConversationRepository {
    fn list(&self) -> BoxFuture<'static, RepositoryResult<Vec<Conversation>>> {
        let conversations = self.conversations.clone();
        Box::pin(async move {
            let store = conversations.lock().map_err(lock_error)?;
            Ok(store.clone())
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'static, RepositoryResult<Option<Conversation>>> {
        let conversations = self.conversations.clone();
        let id = id.to_string();
        Box::pin(async move {
            let store = conversations.lock().map_err(lock_error)?;
            Ok(store.iter().find(|c| c.id == id).cloned())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'static, RepositoryResult<bool>> {
        let conversations = self.conversations.clone();
        let id = id.to_string();
        Box::pin(async move {
            let mut store = conversations.lock().map_err(lock_error)?;
            let before = store.len();
            store.retain(|c| c.id != id);
            Ok(store.len() != before)
        })
    }
}

fn seeded_message(id: &str, role: Role, content: &str, age: Duration) -> Message {
    Message {
        id: id.to_string(),
        content: content.to_string(),
        role,
        timestamp: Utc::now() - age,
        tool_actions: None,
    }
}

fn seed_conversations() -> Vec<Conversation> {
    let now = Utc::now();
    vec![
        Conversation {
            id: String::from("1"),
            title: String::from("Bitcoin Price Inquiry"),
            created_at: now - Duration::days(1),
            updated_at: now - Duration::hours(1),
            messages: vec![
                seeded_message(
                    "1-1",
                    Role::User,
                    "What is the current price of Bitcoin?",
                    Duration::hours(1),
                ),
                seeded_message(
                    "1-2",
                    Role::Assistant,
                    "Based on current market data, Bitcoin is trading at approximately $87,000.",
                    Duration::seconds(3590),
                ),
            ],
        },
        Conversation {
            id: String::from("2"),
            title: String::from("Weather in London"),
            created_at: now - Duration::days(2),
            updated_at: now - Duration::minutes(20),
            messages: vec![
                seeded_message(
                    "2-1",
                    Role::User,
                    "What's the weather in London?",
                    Duration::minutes(20),
                ),
                seeded_message(
                    "2-2",
                    Role::Assistant,
                    "The current weather in London is partly cloudy with a temperature of 18°C.",
                    Duration::seconds(1190),
                ),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_repository_lists_two_conversations() {
        let repo = InMemoryConversationRepository::seeded();
        let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
        let weather = repo.get("2").await.unwrap().unwrap();
        assert_eq!(weather.title, "Weather in London");
        assert_eq!(weather.messages.len(), 2);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let repo = InMemoryConversationRepository::seeded();
        assert!(repo.delete("1").await.unwrap());
        assert!(!repo.delete("1").await.unwrap());
        assert!(repo.get("1").await.unwrap().is_none());
    }
}
