use crate::error::WhillResult;
use colored::Colorize;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

/// Trait for providing lightweight logging summaries of message types
///
/// Hubs call this before handing a message over so that the pub/sub trace
/// never needs to keep a reference to the message itself.
pub trait LogSummary {
    /// Return a compact string representation suitable for logging
    fn log_summary(&self) -> String;
}

/// Node states for monitoring and lifecycle management
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    Uninitialized,
    Initializing,
    Running,
    Stopping,
    Stopped,
    Error(String),
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Uninitialized => write!(f, "Uninitialized"),
            NodeState::Initializing => write!(f, "Initializing"),
            NodeState::Running => write!(f, "Running"),
            NodeState::Stopping => write!(f, "Stopping"),
            NodeState::Stopped => write!(f, "Stopped"),
            NodeState::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Performance metrics for node execution
#[derive(Debug, Clone, Default)]
pub struct NodeMetrics {
    pub total_ticks: u64,
    pub successful_ticks: u64,
    pub failed_ticks: u64,
    pub avg_tick_duration_ms: f64,
    pub max_tick_duration_ms: f64,
    pub last_tick_duration_ms: f64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub errors_count: u64,
    pub warnings_count: u64,
}

/// Configuration parameters for node behavior
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub enable_logging: bool,
    /// One of "QUIET", "INFO" or "DEBUG"
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            enable_logging: true,
            log_level: "INFO".to_string(),
        }
    }
}

const HISTORY_LIMIT: usize = 100;

/// Runtime context handed to a node on every lifecycle call
pub struct NodeInfo {
    name: String,
    instance_id: String,

    state: NodeState,

    config: NodeConfig,
    metrics: NodeMetrics,

    tick_start_time: Option<Instant>,

    error_history: Vec<(Instant, String)>,
    warning_history: Vec<(Instant, String)>,

    // topic -> message count
    published_topics: HashMap<String, u64>,
    subscribed_topics: HashMap<String, u64>,
}

impl NodeInfo {
    pub fn new(node_name: String, logging_enabled: bool) -> Self {
        let config = NodeConfig {
            enable_logging: logging_enabled,
            ..Default::default()
        };
        Self::new_with_config(node_name, config)
    }

    pub fn new_with_config(node_name: String, config: NodeConfig) -> Self {
        Self {
            name: node_name,
            instance_id: uuid::Uuid::new_v4().to_string(),
            state: NodeState::Uninitialized,
            config,
            metrics: NodeMetrics::default(),
            tick_start_time: None,
            error_history: Vec::new(),
            warning_history: Vec::new(),
            published_topics: HashMap::new(),
            subscribed_topics: HashMap::new(),
        }
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn set_state(&mut self, new_state: NodeState) {
        self.state = new_state;
    }

    pub fn transition_to_error(&mut self, error_msg: String) {
        self.log_error(&error_msg);
        self.set_state(NodeState::Error(error_msg));
    }

    // Tick Management
    pub fn start_tick(&mut self) {
        self.tick_start_time = Some(Instant::now());
    }

    pub fn record_tick(&mut self) {
        let Some(start_time) = self.tick_start_time.take() else {
            return;
        };
        let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        self.metrics.total_ticks += 1;
        self.metrics.successful_ticks += 1;
        self.metrics.last_tick_duration_ms = duration_ms;
        if duration_ms > self.metrics.max_tick_duration_ms {
            self.metrics.max_tick_duration_ms = duration_ms;
        }

        let total_duration =
            self.metrics.avg_tick_duration_ms * (self.metrics.successful_ticks - 1) as f64;
        self.metrics.avg_tick_duration_ms =
            (total_duration + duration_ms) / self.metrics.successful_ticks as f64;
    }

    pub fn record_tick_failure(&mut self, error_msg: String) {
        self.metrics.total_ticks += 1;
        self.metrics.failed_ticks += 1;
        if let Some(start_time) = self.tick_start_time.take() {
            self.metrics.last_tick_duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        }
        self.log_error(&error_msg);
    }

    /// Trace an outgoing message; `summary` is computed before the message moves
    pub fn log_pub_summary(&mut self, topic: &str, summary: &str) {
        if self.config.enable_logging && self.config.log_level == "DEBUG" {
            println!(
                "{} {} {} {} = {}",
                format!("[{}]", chrono::Local::now().format("%H:%M:%S%.3f")).cyan(),
                self.name.yellow(),
                "--PUB-->".green().bold(),
                format!("'{}'", topic).magenta(),
                summary
            );
        }

        *self.published_topics.entry(topic.to_string()).or_insert(0) += 1;
        self.metrics.messages_sent += 1;
    }

    pub fn log_sub_summary(&mut self, topic: &str, summary: &str) {
        if self.config.enable_logging && self.config.log_level == "DEBUG" {
            println!(
                "{} {} {} {} = {}",
                format!("[{}]", chrono::Local::now().format("%H:%M:%S%.3f")).cyan(),
                self.name.yellow(),
                "<--SUB--".blue().bold(),
                format!("'{}'", topic).magenta(),
                summary
            );
        }

        *self.subscribed_topics.entry(topic.to_string()).or_insert(0) += 1;
        self.metrics.messages_received += 1;
    }

    pub fn log_info(&self, message: &str) {
        if self.config.enable_logging
            && (self.config.log_level == "INFO" || self.config.log_level == "DEBUG")
        {
            log::info!("[{}] {}", self.name.yellow(), message);
        }
    }

    pub fn log_warning(&mut self, message: &str) {
        if self.config.enable_logging {
            log::warn!("[{}] {}", self.name.yellow(), message);
        }

        push_bounded(&mut self.warning_history, message);
        self.metrics.warnings_count += 1;
    }

    pub fn log_error(&mut self, message: &str) {
        if self.config.enable_logging {
            log::error!("[{}] {}", self.name.yellow(), message);
        }

        push_bounded(&mut self.error_history, message);
        self.metrics.errors_count += 1;
    }

    pub fn log_debug(&mut self, message: &str) {
        if self.config.enable_logging && self.config.log_level == "DEBUG" {
            log::debug!("[{}] {}", self.name.yellow(), message);
        }
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }
    pub fn published_topics(&self) -> &HashMap<String, u64> {
        &self.published_topics
    }
    pub fn subscribed_topics(&self) -> &HashMap<String, u64> {
        &self.subscribed_topics
    }
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.warning_history.iter().map(|(_, msg)| msg.as_str())
    }
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.error_history.iter().map(|(_, msg)| msg.as_str())
    }

    pub fn set_config(&mut self, config: NodeConfig) {
        self.config = config;
    }
}

fn push_bounded(history: &mut Vec<(Instant, String)>, message: &str) {
    history.push((Instant::now(), message.to_string()));
    if history.len() > HISTORY_LIMIT {
        history.remove(0);
    }
}

/// Topic metadata for monitoring and introspection
#[derive(Debug, Clone, PartialEq)]
pub struct TopicMetadata {
    pub topic_name: String,
    pub type_name: String,
}

impl TopicMetadata {
    pub fn of<T>(topic_name: &str) -> Self {
        Self {
            topic_name: topic_name.to_string(),
            type_name: std::any::type_name::<T>().to_string(),
        }
    }
}

/// A schedulable unit with an init / tick / shutdown lifecycle
///
/// The scheduler owns each node and drives it from a single worker thread,
/// so `tick` never runs concurrently with itself or with `init`/`shutdown`.
pub trait Node: Send {
    /// Get the node's name (must be unique)
    fn name(&self) -> &'static str;

    /// Initialize the node (called once at startup)
    fn init(&mut self, ctx: &mut NodeInfo) -> WhillResult<()> {
        ctx.log_info("Node initialized successfully");
        Ok(())
    }

    /// Main execution step (called repeatedly at the node's rate)
    fn tick(&mut self, ctx: Option<&mut NodeInfo>);

    /// Shutdown the node (called once at cleanup)
    fn shutdown(&mut self, ctx: &mut NodeInfo) -> WhillResult<()> {
        ctx.log_info("Node shutdown successfully");
        Ok(())
    }

    fn get_publishers(&self) -> Vec<TopicMetadata> {
        Vec::new()
    }

    fn get_subscribers(&self) -> Vec<TopicMetadata> {
        Vec::new()
    }
}

impl LogSummary for f32 {
    fn log_summary(&self) -> String {
        format!("{:.3}", self)
    }
}

impl LogSummary for f64 {
    fn log_summary(&self) -> String {
        format!("{:.3}", self)
    }
}

impl LogSummary for i32 {
    fn log_summary(&self) -> String {
        self.to_string()
    }
}

impl LogSummary for bool {
    fn log_summary(&self) -> String {
        self.to_string()
    }
}

impl LogSummary for String {
    fn log_summary(&self) -> String {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_state_display() {
        assert_eq!(NodeState::Running.to_string(), "Running");
        assert_eq!(
            NodeState::Error("bad init".to_string()).to_string(),
            "Error: bad init"
        );
    }

    #[test]
    fn test_record_tick_updates_metrics() {
        let mut info = NodeInfo::new("metrics_node".to_string(), false);
        for _ in 0..3 {
            info.start_tick();
            info.record_tick();
        }
        // A record without a matching start is ignored
        info.record_tick();

        assert_eq!(info.metrics().total_ticks, 3);
        assert_eq!(info.metrics().successful_ticks, 3);
        assert_eq!(info.metrics().failed_ticks, 0);
    }

    #[test]
    fn test_tick_failure_is_counted_and_remembered() {
        let mut info = NodeInfo::new("failing_node".to_string(), false);
        info.start_tick();
        info.record_tick_failure("tick panicked".to_string());

        assert_eq!(info.metrics().failed_ticks, 1);
        assert_eq!(info.metrics().errors_count, 1);
        assert_eq!(info.errors().collect::<Vec<_>>(), vec!["tick panicked"]);
    }

    #[test]
    fn test_warning_history_is_bounded() {
        let mut info = NodeInfo::new("chatty_node".to_string(), false);
        for i in 0..(HISTORY_LIMIT + 20) {
            info.log_warning(&format!("warning {}", i));
        }

        assert_eq!(info.warnings().count(), HISTORY_LIMIT);
        assert_eq!(info.warnings().next(), Some("warning 20"));
        assert_eq!(info.metrics().warnings_count, (HISTORY_LIMIT + 20) as u64);
    }

    #[test]
    fn test_pub_sub_counters() {
        let mut info = NodeInfo::new("counter_node".to_string(), false);
        info.log_pub_summary("/distance", "1.000");
        info.log_pub_summary("/distance", "1.000");
        info.log_sub_summary("/joy", "buttons=[]");

        assert_eq!(info.published_topics().get("/distance"), Some(&2));
        assert_eq!(info.subscribed_topics().get("/joy"), Some(&1));
        assert_eq!(info.metrics().messages_sent, 2);
        assert_eq!(info.metrics().messages_received, 1);
    }

    #[test]
    fn test_transition_to_error() {
        let mut info = NodeInfo::new("broken_node".to_string(), false);
        info.transition_to_error("hub missing".to_string());
        assert_eq!(info.state(), &NodeState::Error("hub missing".to_string()));
    }
}
