use super::config::SchedulerConfig;
use crate::core::{Node, NodeConfig, NodeInfo, NodeMetrics, NodeState};
use crate::error::{WhillError, WhillResult};
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Longest single sleep of a worker, so that stop requests are noticed quickly
const MAX_SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Node registration info with lifecycle tracking and per-node rate control
struct RegisteredNode {
    node: Box<dyn Node>,
    priority: u32,
    initialized: bool,
    context: NodeInfo,
    rate_hz: Option<f64>, // None = use global scheduler rate
}

/// Cloneable stop switch for a running scheduler
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    running: Arc<AtomicBool>,
}

impl SchedulerHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Central orchestrator: holds nodes and drives each from its own worker thread.
pub struct Scheduler {
    nodes: Vec<RegisteredNode>,
    running: Arc<AtomicBool>,
    scheduler_name: String,
    config: SchedulerConfig,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
            scheduler_name: "DefaultScheduler".to_string(),
            config: SchedulerConfig::default(),
        }
    }

    /// Set scheduler name (for logging)
    pub fn with_name(mut self, name: &str) -> Self {
        self.scheduler_name = name.to_string();
        self
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.set_config(config);
        self
    }

    pub fn set_config(&mut self, config: SchedulerConfig) -> &mut Self {
        if config.global_rate_hz > 0.0 {
            self.config = config;
        } else {
            log::warn!(
                "Ignoring scheduler config with non-positive rate {}",
                config.global_rate_hz
            );
        }
        self
    }

    /// Add a node with given priority (lower number = started first).
    /// Logging defaults to false.
    ///
    /// # Example
    /// ```ignore
    /// scheduler.add(node, 0, Some(true));  // Highest priority, logging on
    /// scheduler.add(node, 10, None);       // Logging off
    /// ```
    pub fn add(
        &mut self,
        node: Box<dyn Node>,
        priority: u32,
        logging_enabled: Option<bool>,
    ) -> &mut Self {
        let node_name = node.name().to_string();
        let logging_enabled = logging_enabled.unwrap_or(false);

        log::info!(
            "Added node '{}' with priority {} (logging: {})",
            node_name,
            priority,
            logging_enabled
        );

        self.nodes.push(RegisteredNode {
            node,
            priority,
            initialized: false,
            context: NodeInfo::new(node_name, logging_enabled),
            rate_hz: None,
        });
        self
    }

    /// Set per-node rate control (chainable)
    ///
    /// Nodes without a rate tick at the global scheduler rate.
    pub fn set_node_rate(&mut self, name: &str, rate_hz: f64) -> &mut Self {
        if rate_hz <= 0.0 {
            log::warn!("Ignoring non-positive rate {} for node '{}'", rate_hz, name);
            return self;
        }

        match self.nodes.iter_mut().find(|r| r.node.name() == name) {
            Some(registered) => {
                registered.rate_hz = Some(rate_hz);
                log::info!("Set node '{}' rate to {:.1} Hz", name, rate_hz);
            }
            None => log::warn!("Cannot set rate: no node named '{}'", name),
        }
        self
    }

    /// Replace a node's logging config (chainable)
    ///
    /// A `log_level` of "DEBUG" turns on the per-message publish and
    /// subscribe trace for that node.
    pub fn set_node_config(&mut self, name: &str, config: NodeConfig) -> &mut Self {
        match self.nodes.iter_mut().find(|r| r.node.name() == name) {
            Some(registered) => {
                log::info!(
                    "Set node '{}' logging to {} (enabled: {})",
                    name,
                    config.log_level,
                    config.enable_logging
                );
                registered.context.set_config(config);
            }
            None => log::warn!("Cannot set config: no node named '{}'", name),
        }
        self
    }

    pub fn node_config(&self, name: &str) -> Option<NodeConfig> {
        self.find(name).map(|r| r.context.config().clone())
    }

    pub fn stop_handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            running: self.running.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn get_node_list(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|registered| registered.node.name().to_string())
            .collect()
    }

    pub fn node_state(&self, name: &str) -> Option<NodeState> {
        self.find(name).map(|r| r.context.state().clone())
    }

    pub fn node_metrics(&self, name: &str) -> Option<NodeMetrics> {
        self.find(name).map(|r| r.context.metrics().clone())
    }

    fn find(&self, name: &str) -> Option<&RegisteredNode> {
        self.nodes.iter().find(|r| r.node.name() == name)
    }

    /// Main loop; returns after Ctrl+C or `stop()`
    pub fn run(&mut self) -> WhillResult<()> {
        let running = self.running.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            eprintln!("{}", "\nCtrl+C received! Shutting down scheduler...".red());
            running.store(false, Ordering::Release);
            thread::spawn(|| {
                thread::sleep(Duration::from_secs(2));
                eprintln!("{}", "Force terminating application...".red());
                std::process::exit(0);
            });
        }) {
            log::warn!("Failed to set signal handler: {}", e);
        }

        self.run_with_duration(None)
    }

    /// Run all nodes for a specified duration, then shutdown gracefully
    pub fn run_for(&mut self, duration: Duration) -> WhillResult<()> {
        self.run_with_duration(Some(duration))
    }

    fn run_with_duration(&mut self, duration: Option<Duration>) -> WhillResult<()> {
        if self.nodes.is_empty() {
            return Err(WhillError::config(format!(
                "Scheduler '{}' has no nodes to run",
                self.scheduler_name
            )));
        }

        self.nodes.sort_by_key(|r| r.priority);
        self.running.store(true, Ordering::Release);

        let global_rate_hz = self.config.global_rate_hz;
        let tick_budget_ms = self.config.tick_budget_ms;
        let running = self.running.clone();
        let running = running.as_ref();
        let mut spawn_error = None;

        log::info!(
            "Scheduler '{}' starting {} node(s)",
            self.scheduler_name,
            self.nodes.len()
        );

        thread::scope(|s| {
            for registered in self.nodes.iter_mut() {
                let rate_hz = registered.rate_hz.unwrap_or(global_rate_hz);
                let spawned = thread::Builder::new()
                    .name(format!("whill-{}", registered.node.name()))
                    .spawn_scoped(s, move || {
                        drive_node(registered, running, rate_hz, tick_budget_ms)
                    });

                if let Err(e) = spawned {
                    spawn_error = Some(WhillError::Internal(format!(
                        "Failed to spawn node worker: {}",
                        e
                    )));
                    running.store(false, Ordering::Release);
                    break;
                }
            }

            let start_time = Instant::now();
            while running.load(Ordering::Acquire) {
                if let Some(max_duration) = duration {
                    if start_time.elapsed() >= max_duration {
                        log::info!("Scheduler reached time limit of {:?}", max_duration);
                        break;
                    }
                }
                thread::sleep(Duration::from_millis(5));
            }
            running.store(false, Ordering::Release);
        });

        log::info!("Scheduler '{}' shutdown complete", self.scheduler_name);
        match spawn_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Worker body: init once, tick at `rate_hz` until stopped, then shutdown
fn drive_node(
    registered: &mut RegisteredNode,
    running: &AtomicBool,
    rate_hz: f64,
    tick_budget_ms: f64,
) {
    let RegisteredNode {
        node,
        initialized,
        context,
        ..
    } = registered;
    let node_name = node.name();

    if !*initialized {
        context.set_state(NodeState::Initializing);
        match node.init(context) {
            Ok(()) => {
                *initialized = true;
                context.set_state(NodeState::Running);
                log::info!(
                    "Initialized node '{}' (instance {})",
                    node_name,
                    context.instance_id()
                );
            }
            Err(e) => {
                log::error!("Failed to initialize node '{}': {}", node_name, e);
                context.transition_to_error(format!("Initialization failed: {}", e));
                return;
            }
        }
    }

    let period = Duration::from_secs_f64(1.0 / rate_hz);
    while running.load(Ordering::Acquire) {
        let tick_start = Instant::now();
        context.start_tick();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            node.tick(Some(&mut *context));
        }));

        match result {
            Ok(()) => {
                context.record_tick();
                let tick_ms = context.metrics().last_tick_duration_ms;
                if tick_ms > tick_budget_ms {
                    context.log_warning(&format!(
                        "Tick took {:.1}ms (budget {:.1}ms)",
                        tick_ms, tick_budget_ms
                    ));
                }
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                context.record_tick_failure(format!("Tick panicked: {}", reason));
            }
        }

        sleep_until(tick_start + period, running);
    }

    context.set_state(NodeState::Stopping);
    match node.shutdown(context) {
        Ok(()) => {
            context.set_state(NodeState::Stopped);
            log::info!("Shutdown node '{}' successfully", node_name);
        }
        Err(e) => {
            log::error!("Error shutting down node '{}': {}", node_name, e);
            context.transition_to_error(format!("Shutdown failed: {}", e));
        }
    }
    *initialized = false;
}

fn sleep_until(deadline: Instant, running: &AtomicBool) {
    loop {
        let now = Instant::now();
        if now >= deadline || !running.load(Ordering::Acquire) {
            return;
        }
        thread::sleep((deadline - now).min(MAX_SLEEP_SLICE));
    }
}
