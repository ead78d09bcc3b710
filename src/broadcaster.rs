//! Fan-out from producer threads to websocket subscribers.
//!
//! Queue mutation is guarded by a short-lived `std::sync::Mutex` rather than
//! the event-loop "schedule a callback" hand-off the original service used —
//! Rust's `Mutex` is already safe to lock from either a producer thread or
//! the consumer task, so there is no separate thread-safe scheduling
//! primitive to build. See `Subscriber::enqueue`/`Subscriber::recv` for the
//! drop-oldest and idle-timeout behavior this replaces.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

/// One subscriber's bounded, drop-oldest queue.
pub struct Subscriber {
    id: u64,
    capacity: usize,
    queue: Mutex<VecDeque<String>>,
    notify: Notify,
}

impl Subscriber {
    /// Pushes a message, dropping the oldest queued message first if the
    /// queue is already at capacity. Never blocks.
    fn enqueue(&self, message: String) {
        {
            let mut queue = self.queue.lock().unwrap();
            if queue.len() >= self.capacity {
                queue.pop_front();
            }
            queue.push_back(message);
        }
        self.notify.notify_one();
    }

    /// Waits for the next message, or returns `None` after `idle_timeout`
    /// with nothing received.
    pub async fn recv(&self, idle_timeout: Duration) -> Option<String> {
        loop {
            let notified = self.notify.notified();
            if let Some(message) = self.queue.lock().unwrap().pop_front() {
                return Some(message);
            }
            match tokio::time::timeout(idle_timeout, notified).await {
                Ok(()) => continue,
                Err(_elapsed) => return None,
            }
        }
    }

    #[cfg(test)]
    fn snapshot(&self) -> Vec<String> {
        self.queue.lock().unwrap().iter().cloned().collect()
    }
}

/// Process-wide subscriber set, owned by the service's main task and
/// handed to producer threads by reference.
pub struct Broadcaster {
    subscribers: Mutex<Vec<Arc<Subscriber>>>,
    next_id: AtomicU64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a new subscriber with the given queue capacity.
    pub fn add(&self, capacity: usize) -> Arc<Subscriber> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber {
            id,
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
        });
        self.subscribers.lock().unwrap().push(subscriber.clone());
        subscriber
    }

    /// Deregisters a subscriber. Safe to call unconditionally, even if the
    /// subscriber was already removed.
    pub fn remove(&self, subscriber: &Arc<Subscriber>) {
        self.subscribers.lock().unwrap().retain(|s| s.id != subscriber.id);
    }

    /// Enqueues `message` into every currently-registered subscriber.
    /// Iterates a snapshot, so concurrent `add`/`remove` during broadcast
    /// is safe but may or may not include the changed subscriber.
    pub fn broadcast(&self, message: &str) {
        let snapshot: Vec<Arc<Subscriber>> = self.subscribers.lock().unwrap().clone();
        for subscriber in snapshot {
            subscriber.enqueue(message.to_string());
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_oldest_overflow_keeps_newest_entries() {
        let broadcaster = Broadcaster::new();
        let subscriber = broadcaster.add(2);

        broadcaster.broadcast("A");
        broadcaster.broadcast("B");
        broadcaster.broadcast("C");

        assert_eq!(subscriber.snapshot(), vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn queue_size_never_exceeds_capacity() {
        let broadcaster = Broadcaster::new();
        let subscriber = broadcaster.add(2);
        for i in 0..10 {
            broadcaster.broadcast(&i.to_string());
            let size = subscriber.snapshot().len();
            assert!(size <= 2);
        }
    }

    #[test]
    fn broadcast_reaches_every_registered_subscriber() {
        let broadcaster = Broadcaster::new();
        let a = broadcaster.add(10);
        let b = broadcaster.add(10);

        broadcaster.broadcast("hello");

        assert_eq!(a.snapshot(), vec!["hello".to_string()]);
        assert_eq!(b.snapshot(), vec!["hello".to_string()]);
    }

    #[test]
    fn remove_stops_future_broadcasts() {
        let broadcaster = Broadcaster::new();
        let subscriber = broadcaster.add(10);
        broadcaster.remove(&subscriber);
        assert_eq!(broadcaster.len(), 0);

        broadcaster.broadcast("after removal");
        assert!(subscriber.snapshot().is_empty());
    }

    #[tokio::test]
    async fn recv_returns_none_after_idle_timeout() {
        let broadcaster = Broadcaster::new();
        let subscriber = broadcaster.add(10);
        let result = subscriber.recv(Duration::from_millis(20)).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn recv_wakes_promptly_on_enqueue() {
        let broadcaster = Broadcaster::new();
        let subscriber = broadcaster.add(10);
        broadcaster.broadcast("ping");
        let result = subscriber.recv(Duration::from_secs(1)).await;
        assert_eq!(result.as_deref(), Some("ping"));
    }
}
