//! # Core types and traits for the WHILL telemetry runtime
//!
//! - **Node**: the base trait for every schedulable unit
//! - **NodeInfo**: runtime context, metrics and logging handed to nodes
//! - **WallTimer**: fixed-period timer polled from `tick`
//!
//! ## Node Lifecycle
//!
//! 1. **Construction** - node is created with its topics and configuration
//! 2. **Initialization** - `init()` is called once on the node's worker thread
//! 3. **Execution** - `tick()` is called repeatedly at the node's rate
//! 4. **Shutdown** - `shutdown()` is called once when the scheduler stops

pub mod node;
pub mod node_info_ext;
pub mod timer;

pub use node::{LogSummary, Node, NodeConfig, NodeInfo, NodeMetrics, NodeState, TopicMetadata};
pub use node_info_ext::NodeInfoExt;
pub use timer::WallTimer;
