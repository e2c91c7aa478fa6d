use crate::messages::geometry::{Point, PoseWithCovariance, TwistWithCovariance};
use serde::{Deserialize, Serialize};
use whill_core::core::LogSummary;

fn now_nanos() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Estimated pose and velocity of the robot base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Odometry {
    pub stamp_nanos: u64,
    pub frame_id: String,
    pub child_frame_id: String,
    pub pose: PoseWithCovariance,
    pub twist: TwistWithCovariance,
}

impl Default for Odometry {
    fn default() -> Self {
        Self {
            stamp_nanos: 0,
            frame_id: "odom".to_string(),
            child_frame_id: "base_link".to_string(),
            pose: PoseWithCovariance::default(),
            twist: TwistWithCovariance::default(),
        }
    }
}

impl Odometry {
    pub fn new() -> Self {
        Self {
            stamp_nanos: now_nanos(),
            ..Default::default()
        }
    }

    /// Odometry at a planar position, everything else default
    pub fn at(x: f64, y: f64) -> Self {
        let mut odom = Self::new();
        odom.pose.pose.position = Point::new(x, y, 0.0);
        odom
    }

    pub fn position(&self) -> &Point {
        &self.pose.pose.position
    }
}

/// Joystick state: analog axes and digital buttons (1 = pressed)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Joy {
    pub stamp_nanos: u64,
    pub axes: Vec<f32>,
    pub buttons: Vec<i32>,
}

impl Joy {
    pub fn new(axes: Vec<f32>, buttons: Vec<i32>) -> Self {
        Self {
            stamp_nanos: now_nanos(),
            axes,
            buttons,
        }
    }

    /// `Some(true)` if the button exists and reads 1, `None` if the array is too short
    pub fn button_pressed(&self, index: usize) -> Option<bool> {
        self.buttons.get(index).map(|&value| value == 1)
    }
}

impl LogSummary for Odometry {
    fn log_summary(&self) -> String {
        let position = self.position();
        format!(
            "Odometry(frame={}, x={:.3}, y={:.3}, vx={:.2})",
            self.frame_id, position.x, position.y, self.twist.twist.linear.x
        )
    }
}

impl LogSummary for Joy {
    fn log_summary(&self) -> String {
        format!("Joy(axes={:?}, buttons={:?})", self.axes, self.buttons)
    }
}
