//! Message types exchanged between the telemetry nodes
//!
//! Messages are organized by domain:
//! - Geometry: spatial primitives (Point, Pose, Twist, ...)
//! - Sensor: Odometry and Joy
//! - Std: plain scalar samples (Float32)
//! - Overlay: text overlays for a visualization tool (OverlayText)
//!
//! All message types are re-exported at the crate root for convenience.

pub mod geometry;
pub mod overlay;
pub mod sensor;
pub mod std_msgs;

pub use geometry::{
    Point, Pose, PoseWithCovariance, Quaternion, Twist, TwistWithCovariance, Vector3,
};
pub use overlay::{ColorRGBA, HorizontalAlignment, OverlayAction, OverlayText, VerticalAlignment};
pub use sensor::{Joy, Odometry};
pub use std_msgs::Float32;
