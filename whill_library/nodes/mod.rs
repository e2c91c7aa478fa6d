//! WHILL telemetry nodes
//!
//! Both nodes follow the same constructor pattern: `NodeName::new()` for the
//! standard WHILL topics or `NodeName::new_with_config()` to rename topics,
//! change history depth or change the publish period.
//!
//! - `DistanceCalculatorNode` - integrates odometry into travelled distance,
//!   joystick button 8 resets it
//! - `WhillInfoNode` - renders speed, battery, distance and state into an
//!   RViz text overlay
//!
//! ```rust,ignore
//! use whill_library::nodes::*;
//!
//! let distance = DistanceCalculatorNode::new()?;   // /whill/odom + /joy -> /distance
//! let info = WhillInfoNode::new()?;                // ... -> /whill_info
//! ```

pub mod distance_calculator;
pub mod info_overlay;

pub use distance_calculator::{
    DistanceAccumulator, DistanceCalculatorConfig, DistanceCalculatorNode, DistanceReader,
    ResetTrigger,
};
pub use info_overlay::{InfoOverlayConfig, TelemetrySnapshot, WhillInfoNode};
