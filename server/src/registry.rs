//! Shared registry of connected clients
//!
//! This module holds the only state shared between connection handlers:
//! - The output sinks of every client eligible to receive broadcasts
//! - The username to color mapping used for display
//!
//! Both tables sit behind their own async read-write lock. Broadcasts take a
//! snapshot of the sinks and deliver outside the lock, so registrations and
//! removals never wait on a slow fan-out.

use crate::color::Color;
use log::info;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio::sync::RwLock;

/// Identifier the registry hands out for each registered sink
pub type SinkId = u64;

/// Sending half of a connection's outbound line queue
pub type LineSender = Sender<String>;

/// Receiving half, drained by the connection's writer
pub type LineReceiver = Receiver<String>;

/// Lines a connection may have queued before it counts as not reading
pub const SINK_CAPACITY: usize = 256;

/// Creates the outbound line queue for one connection
pub fn sink_channel() -> (LineSender, LineReceiver) {
    mpsc::channel(SINK_CAPACITY)
}

/// Output handle for one connected client
///
/// Lines pushed here are written to the client's socket, in order, by the
/// connection's writer task. Cloning a sink clones the handle, not the queue.
#[derive(Debug, Clone)]
pub struct Sink {
    id: SinkId,
    sender: LineSender,
}

impl Sink {
    pub fn id(&self) -> SinkId {
        self.id
    }

    /// Queues one line for delivery without waiting
    ///
    /// Fails when the connection's writer has already gone away or when its
    /// queue is full because the client stopped reading.
    pub fn send_line(&self, line: &str) -> Result<(), TrySendError<String>> {
        self.sender.try_send(line.to_string())
    }
}

struct SinkTable {
    sinks: HashMap<SinkId, Sink>,
    next_sink_id: SinkId,
}

/// Concurrency-safe collection of client sinks and user colors
///
/// Every method may be called from any number of handler tasks at once.
/// Usernames are not identities: two sessions with the same name share one
/// color entry, and either session's cleanup removes it.
pub struct ClientRegistry {
    sinks: RwLock<SinkTable>,
    colors: RwLock<HashMap<String, Color>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            sinks: RwLock::new(SinkTable {
                sinks: HashMap::new(),
                next_sink_id: 1,
            }),
            colors: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a connection's output queue to the broadcast set
    ///
    /// Returns the sink handle, tagged with a fresh id, which the caller
    /// later uses to deregister.
    pub async fn register(&self, sender: LineSender) -> Sink {
        let mut table = self.sinks.write().await;

        let id = table.next_sink_id;
        table.next_sink_id += 1;

        let sink = Sink { id, sender };
        table.sinks.insert(id, sink.clone());
        info!("Sink {} registered, {} active", id, table.sinks.len());

        sink
    }

    /// Removes a sink from the broadcast set
    ///
    /// Returns false if the sink was already gone.
    pub async fn deregister(&self, id: SinkId) -> bool {
        let mut table = self.sinks.write().await;
        if table.sinks.remove(&id).is_some() {
            info!("Sink {} deregistered, {} active", id, table.sinks.len());
            true
        } else {
            false
        }
    }

    /// Records the display color for a username, replacing any previous entry
    pub async fn set_color(&self, username: &str, color: Color) {
        self.colors.write().await.insert(username.to_string(), color);
    }

    pub async fn remove_color(&self, username: &str) -> Option<Color> {
        self.colors.write().await.remove(username)
    }

    pub async fn color_of(&self, username: &str) -> Option<Color> {
        self.colors.read().await.get(username).copied()
    }

    /// Copies out the sinks registered right now
    ///
    /// Sinks registered or removed after the copy is taken are not reflected.
    pub async fn snapshot(&self) -> Vec<Sink> {
        self.sinks.read().await.sinks.values().cloned().collect()
    }

    /// Returns the number of registered sinks
    pub async fn len(&self) -> usize {
        self.sinks.read().await.sinks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sinks.read().await.sinks.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PALETTE;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_registry_creation() {
        let registry = ClientRegistry::new();
        assert!(registry.is_empty().await);
        assert_eq!(registry.len().await, 0);
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_assigns_increasing_ids() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = sink_channel();

        let first = registry.register(tx.clone()).await;
        let second = registry.register(tx).await;

        assert_eq!(first.id(), 1);
        assert_eq!(second.id(), 2);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_deregister_twice_is_noop() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = sink_channel();

        let sink = registry.register(tx).await;

        assert!(registry.deregister(sink.id()).await);
        assert!(!registry.deregister(sink.id()).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_deregister_unknown_sink() {
        let registry = ClientRegistry::new();
        assert!(!registry.deregister(999).await);
    }

    #[tokio::test]
    async fn test_sink_delivers_to_queue() {
        let registry = ClientRegistry::new();
        let (tx, mut rx) = sink_channel();

        let sink = registry.register(tx).await;
        sink.send_line("hola").unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("hola"));
    }

    #[tokio::test]
    async fn test_sink_send_fails_after_receiver_dropped() {
        let registry = ClientRegistry::new();
        let (tx, rx) = sink_channel();

        let sink = registry.register(tx).await;
        drop(rx);

        assert!(sink.send_line("hola").is_err());
    }

    #[tokio::test]
    async fn test_color_upsert_and_remove() {
        let registry = ClientRegistry::new();

        registry.set_color("Ana", PALETTE[0]).await;
        assert_eq!(registry.color_of("Ana").await, Some(PALETTE[0]));

        // Same name overwrites silently
        registry.set_color("Ana", PALETTE[3]).await;
        assert_eq!(registry.color_of("Ana").await, Some(PALETTE[3]));

        assert_eq!(registry.remove_color("Ana").await, Some(PALETTE[3]));
        assert_eq!(registry.color_of("Ana").await, None);
        assert_eq!(registry.remove_color("Ana").await, None);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_from_later_changes() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = sink_channel();

        let sink = registry.register(tx.clone()).await;
        let snapshot = registry.snapshot().await;

        registry.deregister(sink.id()).await;
        registry.register(tx).await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), sink.id());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_are_not_lost() {
        let registry = Arc::new(ClientRegistry::new());
        let mut handles = Vec::new();

        for _ in 0..64 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let (tx, _rx) = sink_channel();
                registry.register(tx).await.id()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }

        assert_eq!(ids.len(), 64);
        assert_eq!(registry.len().await, 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_churn_with_snapshots() {
        let registry = Arc::new(ClientRegistry::new());
        let (tx, _rx) = sink_channel();

        let mut keep = Vec::new();
        for _ in 0..32 {
            keep.push(registry.register(tx.clone()).await);
        }

        let mut handles = Vec::new();
        for i in 0..32 {
            let registry = Arc::clone(&registry);
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                let sink = registry.register(tx).await;
                let _ = registry.snapshot().await;
                if i % 2 == 0 {
                    registry.deregister(sink.id()).await;
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        // 32 kept plus the 16 odd registrations that stayed
        assert_eq!(registry.len().await, 48);
        for sink in keep {
            assert!(registry.deregister(sink.id()).await);
        }
        assert_eq!(registry.len().await, 16);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_instead_of_growing() {
        let registry = ClientRegistry::new();
        let (tx, mut rx) = sink_channel();
        let sink = registry.register(tx).await;

        for i in 0..SINK_CAPACITY {
            sink.send_line(&format!("linea {i}")).unwrap();
        }
        assert!(matches!(
            sink.send_line("una mas"),
            Err(TrySendError::Full(_))
        ));

        // Draining makes room again
        assert_eq!(rx.recv().await.as_deref(), Some("linea 0"));
        assert!(sink.send_line("una mas").is_ok());
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = sink_channel();

        let mut seen = HashSet::new();
        for _ in 0..100 {
            let sink = registry.register(tx.clone()).await;
            assert!(seen.insert(sink.id()));
            registry.deregister(sink.id()).await;
        }

        let live = registry.register(tx.clone()).await;
        let next = registry.register(tx).await;
        assert!(next.id() > live.id());
        assert_eq!(registry.len().await, 2);
    }
}
