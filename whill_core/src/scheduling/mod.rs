//! # Scheduling
//!
//! The scheduler owns every registered node and drives each one from its own
//! worker thread, so callbacks of one node are serialized while different
//! nodes run in parallel.
//!
//! ```rust,ignore
//! use whill_core::Scheduler;
//!
//! let mut scheduler = Scheduler::new().with_name("telemetry");
//! scheduler.add(Box::new(sensor_node), 0, Some(true));
//! scheduler.add(Box::new(display_node), 10, None);
//! scheduler.set_node_rate("display_node", 10.0);
//! scheduler.run()?; // Ctrl+C stops it
//! ```

pub mod config;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use scheduler::{Scheduler, SchedulerHandle};
