use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::events::ServerEvent;

/// Per-connection outbound queue depth.
pub const LISTENER_BUFFER: usize = 64;

type Listeners = HashMap<Uuid, mpsc::Sender<ServerEvent>>;

/// Subscription registry: conversation id -> connected listeners.
#[derive(Clone, Default)]
pub struct RealtimeHub {
    rooms: Arc<RwLock<HashMap<i64, Listeners>>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` to a conversation. Joining twice is a no-op.
    pub async fn join(&self, conversation_id: i64, listener: Uuid, tx: mpsc::Sender<ServerEvent>) {
        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(conversation_id).or_default();
        room.insert(listener, tx);
        info!(
            conversation_id,
            listener = %listener,
            listeners = room.len(),
            "listener joined conversation"
        );
    }

    /// Forgets a disconnected listener everywhere; empty rooms are dropped.
    pub async fn drop_listener(&self, listener: Uuid) {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|conversation_id, room| {
            if room.remove(&listener).is_some() {
                debug!(conversation_id, listener = %listener, "listener left conversation");
            }
            !room.is_empty()
        });
    }

    /// Sends `event` to every listener of the conversation, the sender included.
    /// Slow or closed listeners miss the event. Returns how many accepted it.
    pub async fn broadcast(&self, conversation_id: i64, event: ServerEvent) -> usize {
        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(&conversation_id) else {
            return 0;
        };
        let mut delivered = 0;
        for (listener, tx) in room {
            if tx.try_send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(conversation_id, listener = %listener, "dropping event for slow listener");
            }
        }
        delivered
    }

    #[cfg(test)]
    pub async fn listener_count(&self, conversation_id: i64) -> usize {
        self.rooms
            .read()
            .await
            .get(&conversation_id)
            .map_or(0, HashMap::len)
    }
}
