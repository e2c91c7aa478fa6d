//! # WHILL Core
//!
//! The runtime the WHILL telemetry nodes run on:
//!
//! - **Nodes**: independent units with an init / tick / shutdown lifecycle
//! - **Communication**: typed publish/subscribe over named topics
//! - **Memory**: shared memory rings that carry topics between processes
//! - **Scheduling**: one worker thread per node, per-node tick rates
//! - **Configuration**: TOML/YAML config files with standard search paths
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whill_core::{Hub, Node, NodeInfo, Scheduler};
//!
//! struct Heartbeat {
//!     output: Hub<f32>,
//! }
//!
//! impl Node for Heartbeat {
//!     fn name(&self) -> &'static str { "heartbeat" }
//!
//!     fn tick(&mut self, ctx: Option<&mut NodeInfo>) {
//!         let _ = self.output.send(1.0, ctx);
//!     }
//! }
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.add(Box::new(Heartbeat { output: Hub::new("beat").unwrap() }), 0, None);
//! scheduler.run().unwrap();
//! ```

pub mod communication;
pub mod core;
pub mod error;
pub mod memory;
pub mod scheduling;

pub use crate::core::{
    LogSummary, Node, NodeConfig, NodeInfo, NodeInfoExt, NodeMetrics, NodeState, TopicMetadata,
    WallTimer,
};
pub use communication::{Hub, HubConfig, Transport};
pub use error::{WhillError, WhillResult};
pub use scheduling::{Scheduler, SchedulerConfig, SchedulerHandle};
