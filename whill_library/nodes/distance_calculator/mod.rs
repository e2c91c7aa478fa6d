use crate::{Float32, Joy, Odometry};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use whill_core::communication::HubConfig;
use whill_core::core::TopicMetadata;
use whill_core::error::WhillResult;
use whill_core::{Hub, Node, NodeInfo, NodeInfoExt, WallTimer};

type Result<T> = WhillResult<T>;

/// Running path length over successive planar position samples
///
/// Each new sample adds the straight-line chord from the previous reference
/// position. The first sample after construction or a reset only anchors
/// the reference and adds nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceAccumulator {
    total: f64,
    reference: Option<(f64, f64)>,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a position sample; returns the distance it added
    pub fn add_sample(&mut self, x: f64, y: f64) -> f64 {
        let increment = match self.reference {
            Some((last_x, last_y)) => {
                let dx = x - last_x;
                let dy = y - last_y;
                (dx * dx + dy * dy).sqrt()
            }
            None => 0.0,
        };

        self.total += increment;
        self.reference = Some((x, y));
        increment
    }

    /// Zero the total and forget the reference position
    pub fn reset(&mut self) {
        self.total = 0.0;
        self.reference = None;
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn reference_position(&self) -> Option<(f64, f64)> {
        self.reference
    }

    pub fn is_initialized(&self) -> bool {
        self.reference.is_some()
    }
}

/// Cloneable, thread-safe view of a calculator's running total
#[derive(Debug, Clone)]
pub struct DistanceReader {
    state: Arc<Mutex<DistanceAccumulator>>,
}

impl DistanceReader {
    pub fn total(&self) -> f64 {
        self.state.lock().total()
    }
}

/// How a Joy message relates to the reset button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTrigger {
    Pressed,
    Released,
    /// The message has fewer buttons than the reset index needs
    TooFewButtons(usize),
}

impl ResetTrigger {
    pub fn from_joy(joy: &Joy, button_index: usize) -> Self {
        match joy.button_pressed(button_index) {
            Some(true) => ResetTrigger::Pressed,
            Some(false) => ResetTrigger::Released,
            None => ResetTrigger::TooFewButtons(joy.buttons.len()),
        }
    }
}

/// One drained input message
#[derive(Debug, Clone, PartialEq)]
enum Input {
    Odometry(Odometry),
    Joy(Joy),
}

/// Interleave two arrival-ordered streams by `stamp_nanos`
///
/// Each stream keeps its own order; on equal stamps odometry goes first.
fn merge_by_stamp(mut odoms: VecDeque<Odometry>, mut joys: VecDeque<Joy>) -> Vec<Input> {
    let mut merged = Vec::with_capacity(odoms.len() + joys.len());
    loop {
        let take_joy = match (odoms.front(), joys.front()) {
            (Some(odom), Some(joy)) => joy.stamp_nanos < odom.stamp_nanos,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_joy {
            joys.pop_front().map(Input::Joy)
        } else {
            odoms.pop_front().map(Input::Odometry)
        };
        merged.extend(next);
    }
    merged
}

/// Topics and timing for [`DistanceCalculatorNode`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceCalculatorConfig {
    pub odom_topic: HubConfig,
    pub joy_topic: HubConfig,
    pub distance_topic: HubConfig,
    /// Index into `Joy::buttons` that resets the total
    pub reset_button: usize,
    pub publish_period_ms: u64,
}

impl Default for DistanceCalculatorConfig {
    fn default() -> Self {
        Self {
            odom_topic: HubConfig::new("/whill/odom"),
            joy_topic: HubConfig::new("/joy"),
            distance_topic: HubConfig::new("/distance"),
            reset_button: 8,
            publish_period_ms: 100,
        }
    }
}

/// Distance Calculator Node
///
/// Integrates odometry positions into total travelled distance and
/// republishes the total on a fixed period whether or not it changed.
/// Holding the reset button on the joystick zeroes the total.
///
/// # Topics
/// - subscribes `/whill/odom` (Odometry) and `/joy` (Joy)
/// - publishes `/distance` (Float32) every 100 ms
///
/// # Example
/// ```rust,ignore
/// use whill_library::nodes::DistanceCalculatorNode;
///
/// let node = DistanceCalculatorNode::new()?;
/// let reader = node.reader(); // query the total from any thread
/// scheduler.add(Box::new(node), 0, Some(true));
/// ```
pub struct DistanceCalculatorNode {
    odom_sub: Hub<Odometry>,
    joy_sub: Hub<Joy>,
    distance_pub: Hub<Float32>,

    state: Arc<Mutex<DistanceAccumulator>>,
    publish_timer: WallTimer,
    reset_button: usize,

    // Last short button count that was reported, to avoid repeating the warning
    reported_short_joy: Option<usize>,
}

impl DistanceCalculatorNode {
    /// Create a calculator on the standard WHILL topics
    pub fn new() -> Result<Self> {
        Self::new_with_config(&DistanceCalculatorConfig::default())
    }

    pub fn new_with_config(config: &DistanceCalculatorConfig) -> Result<Self> {
        Ok(Self {
            odom_sub: Hub::from_config(&config.odom_topic)?,
            joy_sub: Hub::from_config(&config.joy_topic)?,
            distance_pub: Hub::from_config(&config.distance_topic)?,
            state: Arc::new(Mutex::new(DistanceAccumulator::new())),
            publish_timer: WallTimer::new(Duration::from_millis(config.publish_period_ms)),
            reset_button: config.reset_button,
            reported_short_joy: None,
        })
    }

    pub fn reader(&self) -> DistanceReader {
        DistanceReader {
            state: self.state.clone(),
        }
    }

    pub fn get_total_distance(&self) -> f64 {
        self.state.lock().total()
    }

    pub fn reset_distance(&mut self) {
        self.state.lock().reset();
    }

    fn handle_odometry(&mut self, odom: &Odometry) {
        let position = odom.position();
        self.state.lock().add_sample(position.x, position.y);
    }

    fn handle_joy(&mut self, joy: &Joy, mut ctx: Option<&mut NodeInfo>) {
        match ResetTrigger::from_joy(joy, self.reset_button) {
            ResetTrigger::Pressed => {
                self.reset_distance();
                ctx.log_info("Distance reset to 0");
            }
            ResetTrigger::Released => {}
            ResetTrigger::TooFewButtons(len) => {
                if self.reported_short_joy != Some(len) {
                    self.reported_short_joy = Some(len);
                    ctx.log_warning(&format!(
                        "Joy message has {} buttons; reset button {} ignored",
                        len, self.reset_button
                    ));
                }
            }
        }
    }

    fn publish_distance(&mut self, mut ctx: Option<&mut NodeInfo>) {
        // Published as float32, matching the /distance wire type
        let msg = Float32::new(self.get_total_distance() as f32);
        if self.distance_pub.send(msg, ctx.as_deref_mut()).is_err() {
            ctx.log_error("Failed to publish distance");
        }
    }

    /// Apply pending input in stamp order, then emit the heartbeat if the timer is due
    ///
    /// A reset that was stamped between two odometry samples takes effect
    /// between them even when all three arrive within one tick.
    fn process(&mut self, now: Instant, mut ctx: Option<&mut NodeInfo>) {
        let mut odoms = VecDeque::new();
        while let Some(odom) = self.odom_sub.recv(ctx.as_deref_mut()) {
            odoms.push_back(odom);
        }
        let mut joys = VecDeque::new();
        while let Some(joy) = self.joy_sub.recv(ctx.as_deref_mut()) {
            joys.push_back(joy);
        }

        for input in merge_by_stamp(odoms, joys) {
            match input {
                Input::Odometry(odom) => self.handle_odometry(&odom),
                Input::Joy(joy) => self.handle_joy(&joy, ctx.as_deref_mut()),
            }
        }

        if self.publish_timer.poll(now) {
            self.publish_distance(ctx);
        }
    }
}

impl Node for DistanceCalculatorNode {
    fn name(&self) -> &'static str {
        "distance_calculator"
    }

    fn init(&mut self, ctx: &mut NodeInfo) -> Result<()> {
        self.publish_timer.start(Instant::now());
        ctx.log_info(&format!(
            "Tracking '{}' (reset: '{}' button {}), publishing '{}' every {:?}",
            self.odom_sub.get_topic_name(),
            self.joy_sub.get_topic_name(),
            self.reset_button,
            self.distance_pub.get_topic_name(),
            self.publish_timer.period()
        ));
        Ok(())
    }

    fn tick(&mut self, ctx: Option<&mut NodeInfo>) {
        self.process(Instant::now(), ctx);
    }

    fn shutdown(&mut self, ctx: &mut NodeInfo) -> Result<()> {
        ctx.log_info(&format!(
            "Stopped with {:.2} m travelled",
            self.get_total_distance()
        ));
        Ok(())
    }

    fn get_publishers(&self) -> Vec<TopicMetadata> {
        vec![TopicMetadata::of::<Float32>(self.distance_pub.get_topic_name())]
    }

    fn get_subscribers(&self) -> Vec<TopicMetadata> {
        vec![
            TopicMetadata::of::<Odometry>(self.odom_sub.get_topic_name()),
            TopicMetadata::of::<Joy>(self.joy_sub.get_topic_name()),
        ]
    }
}
