//! Feed de cambios en tiempo real
//!
//! Cada escritura sobre issues o ubicaciones publica un `ChangeEvent` en un
//! canal broadcast. Los suscriptores vuelven a pedir la lista completa; no
//! hay merge incremental.

use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTable {
    Issues,
    LiveLocations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Insert,
    Update,
    Upsert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub action: ChangeAction,
    pub id: Uuid,
}

/// Lo que recibe un suscriptor
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Change(ChangeEvent),
    /// El suscriptor se quedó atrás; debe refrescar todo
    Resync { missed: u64 },
}

#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publicar un cambio; sin suscriptores no es un error
    pub fn publish(&self, table: ChangeTable, action: ChangeAction, id: Uuid) {
        let event = ChangeEvent { table, action, id };
        match self.sender.send(event) {
            Ok(receivers) => log::debug!("📣 Cambio publicado a {} suscriptores", receivers),
            Err(_) => log::trace!("📣 Cambio sin suscriptores"),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Stream de mensajes; termina cuando el feed se destruye
    pub fn subscribe(&self) -> impl Stream<Item = FeedMessage> + Send + 'static {
        let receiver = self.sender.subscribe();
        stream::unfold(receiver, |mut receiver| async move {
            match receiver.recv().await {
                Ok(event) => Some((FeedMessage::Change(event), receiver)),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    log::warn!("⚠️ Suscriptor atrasado, {} eventos perdidos", missed);
                    Some((FeedMessage::Resync { missed }, receiver))
                }
                Err(broadcast::error::RecvError::Closed) => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_subscriber_receives_published_events() {
        let feed = ChangeFeed::new();
        let stream = feed.subscribe();
        tokio::pin!(stream);

        let id = Uuid::new_v4();
        feed.publish(ChangeTable::Issues, ChangeAction::Insert, id);

        assert_eq!(
            stream.next().await,
            Some(FeedMessage::Change(ChangeEvent {
                table: ChangeTable::Issues,
                action: ChangeAction::Insert,
                id,
            }))
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.subscriber_count(), 0);
        feed.publish(ChangeTable::LiveLocations, ChangeAction::Upsert, Uuid::new_v4());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_gets_resync() {
        let feed = ChangeFeed::new();
        let stream = feed.subscribe();
        tokio::pin!(stream);

        for _ in 0..(CHANNEL_CAPACITY + 10) {
            feed.publish(ChangeTable::Issues, ChangeAction::Update, Uuid::new_v4());
        }

        assert_eq!(stream.next().await, Some(FeedMessage::Resync { missed: 10 }));
    }

    #[test]
    fn test_event_json_shape() {
        let id = Uuid::nil();
        let json = serde_json::to_value(ChangeEvent {
            table: ChangeTable::LiveLocations,
            action: ChangeAction::Upsert,
            id,
        })
        .unwrap();
        assert_eq!(json["table"], "live_locations");
        assert_eq!(json["action"], "upsert");
    }
}
