use parley_types::ServerEvent;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Default per-connection buffer
pub const DEFAULT_CONNECTION_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, mpsc::Sender<ServerEvent>>,
    groups: HashMap<String, HashSet<ConnectionId>>,
}

impl Registry {
    fn remove(&mut self, conn: ConnectionId) {
        self.connections.remove(&conn);
        self.groups.retain(|_, members| {
            members.remove(&conn);
            !members.is_empty()
        });
    }
}

/// Thread-scoped broadcast groups over per-connection channels
///
/// Delivery is fire-and-forget: a closed subscriber is dropped from every
/// group, a full one misses the event.
pub struct RealtimeNotifier {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
    buffer: usize,
}

impl RealtimeNotifier {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_CONNECTION_BUFFER)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a connection and hand back its event stream
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<ServerEvent>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.buffer);
        self.registry().connections.insert(id, tx);
        tracing::debug!(connection = %id, "realtime connection registered");
        (id, rx)
    }

    /// Add a connection to a thread's group. Returns false if it was already
    /// a member or is not connected.
    pub fn subscribe(&self, conn: ConnectionId, thread_id: &str) -> bool {
        let mut registry = self.registry();
        if !registry.connections.contains_key(&conn) {
            return false;
        }
        let added = registry
            .groups
            .entry(thread_id.to_string())
            .or_default()
            .insert(conn);
        if added {
            tracing::debug!(connection = %conn, thread_id, "joined thread");
        }
        added
    }

    pub fn disconnect(&self, conn: ConnectionId) {
        self.registry().remove(conn);
        tracing::debug!(connection = %conn, "realtime connection closed");
    }

    /// Deliver to every subscriber of the thread; returns how many accepted it
    pub fn publish(&self, thread_id: &str, event: ServerEvent) -> usize {
        let mut registry = self.registry();
        let Some(members) = registry.groups.get(thread_id) else {
            return 0;
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for conn in members {
            let Some(tx) = registry.connections.get(conn) else {
                closed.push(*conn);
                continue;
            };
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(connection = %conn, thread_id, "subscriber lagging, event dropped");
                }
                Err(TrySendError::Closed(_)) => closed.push(*conn),
            }
        }

        for conn in closed {
            registry.remove(conn);
        }
        delivered
    }

    /// Deliver to a single connection, regardless of its groups
    pub fn notify(&self, conn: ConnectionId, event: ServerEvent) -> bool {
        let mut registry = self.registry();
        let Some(tx) = registry.connections.get(&conn) else {
            return false;
        };
        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(connection = %conn, "connection lagging, event dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                registry.remove(conn);
                false
            }
        }
    }

    pub fn subscriber_count(&self, thread_id: &str) -> usize {
        self.registry().groups.get(thread_id).map_or(0, HashSet::len)
    }
}

impl Default for RealtimeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
