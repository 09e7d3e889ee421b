//! Observer connections.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use super::events::EventEnvelope;
use super::progress_broadcaster::ProgressBroadcaster;
use crate::error::NotifyError;

/// Identifies one registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A live channel to one observer.
///
/// `send` must not block: a connection that cannot accept a message right
/// now reports an error and is pruned by the broadcaster.
pub trait Connection: Send + Sync {
    fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// Bounded in-process connection backed by a tokio mpsc channel.
pub struct ChannelConnection {
    sender: mpsc::Sender<String>,
}

impl ChannelConnection {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self { sender }
    }
}

impl Connection for ChannelConnection {
    fn send(&self, message: &str) -> Result<(), NotifyError> {
        self.sender
            .try_send(message.to_string())
            .map_err(|e| match e {
                TrySendError::Full(_) => NotifyError::Full,
                TrySendError::Closed(_) => NotifyError::Closed,
            })
    }
}

/// Bookkeeping for a registered observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub file_id: String,
    pub connected_at: DateTime<Utc>,
}

/// Receiving end of a [`ChannelConnection`] registered for one file.
///
/// Dropping the subscription unregisters it.
pub struct Subscription {
    id: ConnectionId,
    file_id: String,
    receiver: mpsc::Receiver<String>,
    broadcaster: Arc<ProgressBroadcaster>,
}

impl Subscription {
    pub(crate) fn new(
        id: ConnectionId,
        file_id: String,
        receiver: mpsc::Receiver<String>,
        broadcaster: Arc<ProgressBroadcaster>,
    ) -> Self {
        Self {
            id,
            file_id,
            receiver,
            broadcaster,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Waits for the next raw message. Returns `None` once unregistered.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Waits for the next message and decodes it. Undecodable messages are skipped.
    pub async fn recv_event(&mut self) -> Option<EventEnvelope> {
        while let Some(message) = self.recv().await {
            match serde_json::from_str(&message) {
                Ok(envelope) => return Some(envelope),
                Err(e) => log::debug!("Skipping non-event message on {}: {}", self.id, e),
            }
        }
        None
    }

    pub fn try_recv_event(&mut self) -> Option<EventEnvelope> {
        while let Some(message) = self.try_recv() {
            if let Ok(envelope) = serde_json::from_str(&message) {
                return Some(envelope);
            }
        }
        None
    }

    /// Drains every message currently buffered.
    pub fn drain_events(&mut self) -> Vec<EventEnvelope> {
        let mut events = Vec::new();
        while let Some(envelope) = self.try_recv_event() {
            events.push(envelope);
        }
        events
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.unregister(&self.file_id, self.id);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("file_id", &self.file_id)
            .finish()
    }
}
