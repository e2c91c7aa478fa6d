use serde::{Deserialize, Serialize};

/// Scheduler-wide timing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Tick rate for nodes that have no per-node rate
    #[serde(default = "default_global_rate_hz")]
    pub global_rate_hz: f64,

    /// Ticks slower than this are reported as warnings on the node context
    #[serde(default = "default_tick_budget_ms")]
    pub tick_budget_ms: f64,
}

fn default_global_rate_hz() -> f64 {
    100.0
}

fn default_tick_budget_ms() -> f64 {
    50.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            global_rate_hz: default_global_rate_hz(),
            tick_budget_ms: default_tick_budget_ms(),
        }
    }
}
