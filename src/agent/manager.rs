use std::sync::Arc;

use log::{debug, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::agent::config::{AgentVariant, ClientConfig};
use crate::agent::providers::{
    AgentBackend, GatewayError, HealthResponse, HttpBackend, ReplyChunk, SimulatedBackend,
};

/// Events emitted by background agent calls.
/// The UI loop drains them on every tick and applies them to the conversation store.
#[derive(Debug)]
pub enum AgentEvent {
    /// A single request/response call settled.
    Reply(Result<String, GatewayError>),
    /// One piece of an incremental reply.
    Chunk(ReplyChunk),
    /// An incremental reply finished, with the error that ended it early, if any.
    StreamClosed(Option<GatewayError>),
    /// Result of the startup connectivity probe.
    Health(Result<HealthResponse, GatewayError>),
}

/// Owns the active backend and the channel background calls report through.
///
/// Calls never block the caller: each one runs on its own tokio task.
pub struct AgentManager {
    backend: Arc<dyn AgentBackend>,
    tx: UnboundedSender<AgentEvent>,
    rx: UnboundedReceiver<AgentEvent>,
}

impl AgentManager {
    pub fn new(backend: Arc<dyn AgentBackend>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { backend, tx, rx }
    }

    /// Picks the backend the configuration asks for.
    pub fn from_config(config: &ClientConfig) -> Self {
        let backend: Arc<dyn AgentBackend> = if config.offline {
            info!(
                "Offline mode: simulated agent with {:?} latency",
                config.simulated_latency
            );
            Arc::new(SimulatedBackend::new(config.simulated_latency))
        } else {
            info!("Agent backend at {}", config.backend_url);
            Arc::new(HttpBackend::new(config.backend_url.clone()))
        };
        Self::new(backend)
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Sends `query` to the agent on a background task.
    pub fn dispatch(&self, query: String, variant: AgentVariant) {
        let backend = Arc::clone(&self.backend);
        let events = self.tx.clone();
        debug!("Dispatching query to {} via {}", variant.slug(), backend.name());

        if backend.streams_replies() {
            tokio::spawn(async move {
                let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel();
                let producer = backend.stream_message(&query, variant, chunk_tx);
                let forward = async {
                    while let Some(chunk) = chunk_rx.recv().await {
                        let _ = events.send(AgentEvent::Chunk(chunk));
                    }
                };
                let (result, ()) = tokio::join!(producer, forward);
                let _ = events.send(AgentEvent::StreamClosed(result.err()));
            });
        } else {
            tokio::spawn(async move {
                let outcome = backend
                    .send_message(&query, variant)
                    .await
                    .map(|response| response.result.content);
                let _ = events.send(AgentEvent::Reply(outcome));
            });
        }
    }

    /// Probes the backend's health endpoint on a background task.
    pub fn check_health(&self) {
        let backend = Arc::clone(&self.backend);
        let events = self.tx.clone();
        tokio::spawn(async move {
            let _ = events.send(AgentEvent::Health(backend.health().await));
        });
    }

    /// Non-blocking; returns `None` when nothing is queued.
    pub fn poll_event(&mut self) -> Option<AgentEvent> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::agent::message::ToolStatus;

    async fn drain_until<F>(manager: &mut AgentManager, mut done: F) -> Vec<AgentEvent>
    where
        F: FnMut(&AgentEvent) -> bool,
    {
        let mut events = Vec::new();
        for _ in 0..1000 {
            while let Some(event) = manager.poll_event() {
                let finished = done(&event);
                events.push(event);
                if finished {
                    return events;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("agent never finished; got {:?}", events);
    }

    #[tokio::test]
    async fn streaming_backend_reports_chunks_then_closes() {
        let mut manager = AgentManager::new(Arc::new(SimulatedBackend::new(Duration::ZERO)));
        manager.dispatch(String::from("bitcoin price?"), AgentVariant::Crypto);

        let events =
            drain_until(&mut manager, |e| matches!(e, AgentEvent::StreamClosed(_))).await;
        let mut text = String::new();
        let mut last_tool = None;
        for event in &events {
            match event {
                AgentEvent::Chunk(ReplyChunk::Token(token)) => text.push_str(token),
                AgentEvent::Chunk(ReplyChunk::Tool(action)) => last_tool = Some(action.status),
                AgentEvent::StreamClosed(err) => assert!(err.is_none()),
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert!(text.starts_with("Based on current market data"));
        assert_eq!(last_tool, Some(ToolStatus::Completed));
    }

    #[tokio::test]
    async fn request_response_backend_reports_a_single_reply() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let mut manager =
            AgentManager::new(Arc::new(HttpBackend::new(format!("http://{}", addr))));
        assert_eq!(manager.backend_name(), "HTTP");
        manager.dispatch(String::from("hello"), AgentVariant::Law);

        let events = drain_until(&mut manager, |e| matches!(e, AgentEvent::Reply(_))).await;
        assert!(matches!(events.last(), Some(AgentEvent::Reply(Err(_)))));
    }

    #[tokio::test]
    async fn health_probe_reports_back() {
        let mut manager = AgentManager::new(Arc::new(SimulatedBackend::new(Duration::ZERO)));
        manager.check_health();
        let events = drain_until(&mut manager, |e| matches!(e, AgentEvent::Health(_))).await;
        match events.last() {
            Some(AgentEvent::Health(Ok(health))) => assert_eq!(health.status, "healthy"),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
