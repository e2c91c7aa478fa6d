//! # WHILL Telemetry Library
//!
//! Messages and nodes for the WHILL RViz telemetry overlay.
//!
//! ```text
//! whill_library/
//! ── messages/       # Odometry, Joy, Twist, Float32, OverlayText
//! ── nodes/          # distance calculator and info overlay nodes
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use whill_library::{DistanceCalculatorNode, WhillInfoNode};
//! use whill_core::Scheduler;
//!
//! let distance = DistanceCalculatorNode::new()?;
//! let reader = distance.reader();
//!
//! let mut scheduler = Scheduler::new().with_name("rviz_info_display");
//! scheduler
//!     .add(Box::new(distance), 0, Some(true))
//!     .add(Box::new(WhillInfoNode::new()?), 1, Some(true));
//! scheduler.run()?;
//! ```

pub mod messages;
pub mod nodes;

// Re-export core traits needed for message types
pub use whill_core::core::LogSummary;

// Re-export message types at the crate root for convenience
pub use messages::*;

pub use nodes::{DistanceCalculatorNode, DistanceReader, WhillInfoNode};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::LogSummary;

    pub use crate::messages::{Float32, Joy, Odometry, OverlayText, Point, Twist};

    pub use crate::nodes::{
        DistanceCalculatorConfig, DistanceCalculatorNode, DistanceReader, InfoOverlayConfig,
        TelemetrySnapshot, WhillInfoNode,
    };
}
