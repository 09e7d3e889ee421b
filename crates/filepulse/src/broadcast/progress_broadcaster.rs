//! Registry of observers keyed by file id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tokio::sync::mpsc;

use super::connection::{ChannelConnection, Connection, ConnectionId, ConnectionInfo, Subscription};
use super::events::{EventEnvelope, FileEvent};

pub const DEFAULT_OBSERVER_BUFFER: usize = 64;

struct Observer {
    info: ConnectionInfo,
    connection: Arc<dyn Connection>,
}

#[derive(Default)]
struct Registry {
    by_file: HashMap<String, HashMap<ConnectionId, Observer>>,
    file_of: HashMap<ConnectionId, String>,
}

/// Fans file events out to every observer registered for that file.
///
/// Registration, unregistration and publishing may run concurrently from
/// any thread. Sends happen outside the registry lock, and an observer
/// whose send fails is unregistered without affecting the others.
pub struct ProgressBroadcaster {
    registry: RwLock<Registry>,
    next_id: AtomicU64,
    observer_buffer: usize,
}

impl ProgressBroadcaster {
    pub fn new(observer_buffer: usize) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            next_id: AtomicU64::new(1),
            observer_buffer: observer_buffer.max(1),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        match self.registry.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Broadcaster registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        match self.registry.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Broadcaster registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Adds `connection` to the observer set for `file_id`.
    pub fn register(&self, file_id: &str, connection: Arc<dyn Connection>) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let info = ConnectionInfo {
            id,
            file_id: file_id.to_string(),
            connected_at: Utc::now(),
        };

        let mut registry = self.write();
        registry
            .by_file
            .entry(file_id.to_string())
            .or_default()
            .insert(id, Observer { info, connection });
        registry.file_of.insert(id, file_id.to_string());
        drop(registry);

        log::debug!("Registered observer {} for file {}", id, file_id);
        id
    }

    /// Registers a bounded in-process channel and returns its receiving end.
    pub fn subscribe(self: &Arc<Self>, file_id: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.observer_buffer);
        let id = self.register(file_id, Arc::new(ChannelConnection::new(tx)));
        Subscription::new(id, file_id.to_string(), rx, Arc::clone(self))
    }

    /// Removes one observer. Returns false if it was not registered.
    ///
    /// The file entry is dropped once its last observer leaves.
    pub fn unregister(&self, file_id: &str, id: ConnectionId) -> bool {
        let mut registry = self.write();

        let removed = match registry.by_file.get_mut(file_id) {
            Some(observers) => {
                let removed = observers.remove(&id).is_some();
                if observers.is_empty() {
                    registry.by_file.remove(file_id);
                }
                removed
            }
            None => false,
        };
        if removed {
            registry.file_of.remove(&id);
        }
        drop(registry);

        if removed {
            log::debug!("Unregistered observer {} for file {}", id, file_id);
        }
        removed
    }

    /// Delivers `event` to every observer of `file_id`.
    ///
    /// Returns the number of observers that accepted the message. Observers
    /// whose send fails are unregistered. Never fails.
    pub fn publish(&self, file_id: &str, event: &FileEvent) -> usize {
        let message = match EventEnvelope::new(file_id, event).to_json() {
            Ok(message) => message,
            Err(e) => {
                log::error!("Dropping event for file {}: {}", file_id, e);
                return 0;
            }
        };

        let targets: Vec<(ConnectionId, Arc<dyn Connection>)> = {
            let registry = self.read();
            match registry.by_file.get(file_id) {
                Some(observers) => observers
                    .iter()
                    .map(|(id, observer)| (*id, Arc::clone(&observer.connection)))
                    .collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (id, connection) in targets {
            match connection.send(&message) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    log::warn!("Observer {} for file {} dropped: {}", id, file_id, e);
                    dead.push(id);
                }
            }
        }

        for id in dead {
            self.unregister(file_id, id);
        }

        delivered
    }

    /// Sends a raw message to one observer. A failed send unregisters it.
    pub fn send_to(&self, id: ConnectionId, message: &str) -> bool {
        let target = {
            let registry = self.read();
            registry.file_of.get(&id).and_then(|file_id| {
                registry
                    .by_file
                    .get(file_id)
                    .and_then(|observers| observers.get(&id))
                    .map(|observer| (file_id.clone(), Arc::clone(&observer.connection)))
            })
        };

        let Some((file_id, connection)) = target else {
            return false;
        };

        match connection.send(message) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Observer {} for file {} dropped: {}", id, file_id, e);
                self.unregister(&file_id, id);
                false
            }
        }
    }

    pub fn observer_count(&self, file_id: &str) -> usize {
        self.read().by_file.get(file_id).map_or(0, HashMap::len)
    }

    pub fn total_observers(&self) -> usize {
        self.read().file_of.len()
    }

    pub fn connection_info(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        let registry = self.read();
        let file_id = registry.file_of.get(&id)?;
        registry
            .by_file
            .get(file_id)
            .and_then(|observers| observers.get(&id))
            .map(|observer| observer.info.clone())
    }
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_OBSERVER_BUFFER)
    }
}
