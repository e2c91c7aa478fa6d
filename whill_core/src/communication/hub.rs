use crate::communication::config::{HubConfig, Transport};
use crate::core::node::{LogSummary, NodeInfo};
use crate::error::{WhillError, WhillResult};
use crate::memory::ShmTopic;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Default per-subscriber history depth
pub const DEFAULT_DEPTH: usize = 10;

/// Connection state for Hub connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl ConnectionState {
    fn into_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connected => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Lock-free counters for Hub monitoring
#[derive(Debug, Default)]
pub struct AtomicHubMetrics {
    pub messages_sent: AtomicU64,
    pub messages_received: AtomicU64,
    pub messages_dropped: AtomicU64,
    pub send_failures: AtomicU64,
}

impl AtomicHubMetrics {
    pub fn snapshot(&self) -> HubMetrics {
        HubMetrics {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubMetrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    /// Messages evicted from a full history or skipped by a lagging ring reader
    pub messages_dropped: u64,
    pub send_failures: u64,
}

/// Bounded receive queue owned by one Hub; the oldest message is evicted when full
struct SubscriberQueue<T> {
    id: u64,
    depth: usize,
    messages: Mutex<VecDeque<T>>,
    metrics: Arc<AtomicHubMetrics>,
}

impl<T> SubscriberQueue<T> {
    fn push(&self, msg: T) {
        let mut messages = self.messages.lock();
        if messages.len() >= self.depth {
            messages.pop_front();
            self.metrics.messages_dropped.fetch_add(1, Ordering::Relaxed);
        }
        messages.push_back(msg);
    }

    fn pop(&self) -> Option<T> {
        self.messages.lock().pop_front()
    }

    fn len(&self) -> usize {
        self.messages.lock().len()
    }
}

/// All subscriber queues registered on one named topic
struct TopicChannel<T> {
    subscribers: RwLock<Vec<Arc<SubscriberQueue<T>>>>,
    next_id: AtomicU64,
}

impl<T> TopicChannel<T> {
    fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

struct TopicEntry {
    type_id: TypeId,
    type_name: &'static str,
    channel: Arc<dyn Any + Send + Sync>,
}

static TOPICS: Lazy<Mutex<HashMap<String, TopicEntry>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Names of every in-process topic created in this process, with their message types
pub fn list_topics() -> Vec<(String, &'static str)> {
    let mut topics: Vec<_> = TOPICS
        .lock()
        .iter()
        .map(|(name, entry)| (name.clone(), entry.type_name))
        .collect();
    topics.sort();
    topics
}

fn open_channel<T: Send + 'static>(topic_name: &str) -> WhillResult<Arc<TopicChannel<T>>> {
    let mut topics = TOPICS.lock();

    if let Some(entry) = topics.get(topic_name) {
        if entry.type_id != TypeId::of::<T>() {
            return Err(WhillError::communication(format!(
                "Topic '{}' carries {}, not {}",
                topic_name,
                entry.type_name,
                std::any::type_name::<T>()
            )));
        }
        return entry
            .channel
            .clone()
            .downcast::<TopicChannel<T>>()
            .map_err(|_| WhillError::Internal(format!("Topic '{}' is corrupted", topic_name)));
    }

    let channel = Arc::new(TopicChannel::<T>::new());
    topics.insert(
        topic_name.to_string(),
        TopicEntry {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            channel: channel.clone(),
        },
    );
    log::debug!("Created topic '{}' ({})", topic_name, std::any::type_name::<T>());
    Ok(channel)
}

/// Where a Hub's messages travel
enum Backend<T> {
    /// Per-Hub queues in this process's topic registry
    InProcess {
        channel: Arc<TopicChannel<T>>,
        queue: Arc<SubscriberQueue<T>>,
    },
    /// Serialized ring in shared memory, visible to other processes
    SharedMemory(ShmTopic<T>),
}

/// Typed handle on a named topic
///
/// Every Hub is both a publisher and a subscriber: `send` delivers the
/// message to every *other* Hub on the same topic, and `recv` pops from
/// this Hub's own bounded history. Messages published before a Hub is
/// created are not replayed to it.
///
/// In-process Hubs hand clones through per-Hub queues. Shared memory Hubs
/// encode messages into a ring under [`crate::memory::shm_topics_dir`] so
/// that nodes in separate processes see each other's traffic.
pub struct Hub<T> {
    backend: Backend<T>,
    topic_name: String,
    depth: usize,
    state: AtomicU8,
    metrics: Arc<AtomicHubMetrics>,
}

impl<T> std::fmt::Debug for Hub<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = ConnectionState::from_u8(self.state.load(Ordering::Relaxed));
        f.debug_struct("Hub")
            .field("topic_name", &self.topic_name)
            .field("transport", &self.transport())
            .field("depth", &self.depth)
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

impl<T> Hub<T> {
    pub fn transport(&self) -> Transport {
        match self.backend {
            Backend::InProcess { .. } => Transport::InProcess,
            Backend::SharedMemory(_) => Transport::SharedMemory,
        }
    }
}

fn validate(topic_name: &str, depth: usize) -> WhillResult<()> {
    if topic_name.is_empty() {
        return Err(WhillError::config("Topic name must not be empty"));
    }
    if depth == 0 {
        return Err(WhillError::config(format!(
            "History depth for '{}' must be at least 1",
            topic_name
        )));
    }
    Ok(())
}

impl<T> Hub<T>
where
    T: Clone + Send + Serialize + DeserializeOwned + 'static,
{
    /// In-process Hub with the default history depth
    pub fn new(topic_name: &str) -> WhillResult<Self> {
        Self::new_with_depth(topic_name, DEFAULT_DEPTH)
    }

    pub fn new_with_depth(topic_name: &str, depth: usize) -> WhillResult<Self> {
        validate(topic_name, depth)?;

        let channel = open_channel::<T>(topic_name)?;
        let metrics = Arc::new(AtomicHubMetrics::default());
        let queue = Arc::new(SubscriberQueue {
            id: channel.next_id.fetch_add(1, Ordering::Relaxed),
            depth,
            messages: Mutex::new(VecDeque::with_capacity(depth)),
            metrics: metrics.clone(),
        });
        channel.subscribers.write().push(queue.clone());

        Ok(Hub {
            backend: Backend::InProcess { channel, queue },
            topic_name: topic_name.to_string(),
            depth,
            state: AtomicU8::new(ConnectionState::Connected.into_u8()),
            metrics,
        })
    }

    /// Hub on the shared memory ring for `topic_name`, creating the ring if needed
    pub fn new_shared(topic_name: &str, depth: usize) -> WhillResult<Self> {
        validate(topic_name, depth)?;

        let topic = ShmTopic::open(topic_name, depth)?;
        Ok(Hub {
            depth: topic.depth(),
            backend: Backend::SharedMemory(topic),
            topic_name: topic_name.to_string(),
            state: AtomicU8::new(ConnectionState::Connected.into_u8()),
            metrics: Arc::new(AtomicHubMetrics::default()),
        })
    }

    pub fn from_config(config: &HubConfig) -> WhillResult<Self> {
        match config.transport {
            Transport::InProcess => Self::new_with_depth(&config.name, config.depth),
            Transport::SharedMemory => Self::new_shared(&config.name, config.depth),
        }
    }

    /// Publish a message to every other Hub on this topic
    ///
    /// Returns the message back if this Hub has been disconnected, or if a
    /// shared memory Hub cannot encode it into a ring slot.
    pub fn send(&self, msg: T, ctx: Option<&mut NodeInfo>) -> Result<(), T>
    where
        T: LogSummary,
    {
        if self.get_connection_state() != ConnectionState::Connected {
            self.metrics.send_failures.fetch_add(1, Ordering::Relaxed);
            return Err(msg);
        }

        match &self.backend {
            Backend::InProcess { channel, queue } => {
                if let Some(ctx) = ctx {
                    ctx.log_pub_summary(&self.topic_name, &msg.log_summary());
                }
                let subscribers = channel.subscribers.read();
                for subscriber in subscribers.iter().filter(|s| s.id != queue.id) {
                    subscriber.push(msg.clone());
                }
            }
            Backend::SharedMemory(topic) => {
                if let Err(e) = topic.send(&msg) {
                    log::warn!("Failed to publish on '{}': {}", self.topic_name, e);
                    self.metrics.send_failures.fetch_add(1, Ordering::Relaxed);
                    return Err(msg);
                }
                if let Some(ctx) = ctx {
                    ctx.log_pub_summary(&self.topic_name, &msg.log_summary());
                }
            }
        }
        self.metrics.messages_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Take the oldest queued message, if any
    pub fn recv(&self, ctx: Option<&mut NodeInfo>) -> Option<T>
    where
        T: LogSummary,
    {
        let msg = match &self.backend {
            Backend::InProcess { queue, .. } => queue.pop(),
            Backend::SharedMemory(topic) => {
                let msg = topic.recv();
                let skipped = topic.take_skipped();
                if skipped > 0 {
                    self.metrics
                        .messages_dropped
                        .fetch_add(skipped, Ordering::Relaxed);
                }
                msg
            }
        }?;
        if let Some(ctx) = ctx {
            ctx.log_sub_summary(&self.topic_name, &msg.log_summary());
        }
        self.metrics.messages_received.fetch_add(1, Ordering::Relaxed);
        Some(msg)
    }

    /// Number of messages waiting for this Hub
    ///
    /// For shared memory Hubs this may include messages this Hub sent,
    /// which `recv` skips.
    pub fn pending(&self) -> usize {
        match &self.backend {
            Backend::InProcess { queue, .. } => queue.len(),
            Backend::SharedMemory(topic) => topic.pending(),
        }
    }

    /// Stop publishing; queued and future incoming messages are still readable
    pub fn disconnect(&self) {
        self.state
            .store(ConnectionState::Disconnected.into_u8(), Ordering::Relaxed);
    }

    pub fn get_connection_state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Relaxed))
    }

    pub fn get_metrics(&self) -> HubMetrics {
        self.metrics.snapshot()
    }

    pub fn get_topic_name(&self) -> &str {
        &self.topic_name
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl<T> Drop for Hub<T> {
    fn drop(&mut self) {
        if let Backend::InProcess { channel, queue } = &self.backend {
            let id = queue.id;
            channel.subscribers.write().retain(|s| s.id != id);
        }
    }
}
