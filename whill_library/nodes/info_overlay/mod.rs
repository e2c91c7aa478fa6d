use crate::{ColorRGBA, Float32, OverlayAction, OverlayText, Twist};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use whill_core::communication::HubConfig;
use whill_core::core::TopicMetadata;
use whill_core::error::WhillResult;
use whill_core::{Hub, Node, NodeInfo, NodeInfoExt, WallTimer};

type Result<T> = WhillResult<T>;

pub const OVERLAY_WIDTH: i32 = 400;
pub const OVERLAY_HEIGHT: i32 = 100;
pub const OVERLAY_TEXT_SIZE: f32 = 12.0;
pub const OVERLAY_LINE_WIDTH: i32 = 2;
pub const OVERLAY_FONT: &str = "Arial";
pub const OVERLAY_BG_ALPHA: f32 = 0.5;

/// Last known value of each telemetry stream
///
/// Fields start at zero and are overwritten by every new sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub speed: f32,
    pub battery: f32,
    pub distance: f32,
    pub state: f32,
}

impl TelemetrySnapshot {
    pub fn update_speed(&mut self, cmd_vel: &Twist) {
        self.speed = cmd_vel.linear.x as f32;
    }

    pub fn update_battery(&mut self, value: f32) {
        self.battery = value;
    }

    pub fn update_distance(&mut self, value: f32) {
        self.distance = value;
    }

    pub fn update_state(&mut self, value: f32) {
        self.state = value;
    }

    /// Display line; battery and state are truncated toward zero
    pub fn render_text(&self) -> String {
        format!(
            "speed:    {:.2}   battery:  {}   distance: {:.2}   state:    {}",
            self.speed, self.battery as i32, self.distance, self.state as i32
        )
    }

    /// Overlay with the fixed panel style and the rendered text
    pub fn to_overlay(&self) -> OverlayText {
        OverlayText {
            action: OverlayAction::Add,
            width: OVERLAY_WIDTH,
            height: OVERLAY_HEIGHT,
            text_size: OVERLAY_TEXT_SIZE,
            line_width: OVERLAY_LINE_WIDTH,
            font: OVERLAY_FONT.to_string(),
            fg_color: ColorRGBA::white(),
            bg_color: ColorRGBA::black(OVERLAY_BG_ALPHA),
            text: self.render_text(),
            ..Default::default()
        }
    }
}

/// Topics and timing for [`WhillInfoNode`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoOverlayConfig {
    pub cmd_vel_topic: HubConfig,
    pub battery_topic: HubConfig,
    pub distance_topic: HubConfig,
    pub state_topic: HubConfig,
    pub overlay_topic: HubConfig,
    pub publish_period_ms: u64,
}

impl Default for InfoOverlayConfig {
    fn default() -> Self {
        Self {
            cmd_vel_topic: HubConfig::new("/whill/controller/cmd_vel"),
            battery_topic: HubConfig::new("/for_rviz"),
            distance_topic: HubConfig::new("/distance"),
            state_topic: HubConfig::new("/state"),
            overlay_topic: HubConfig::new("/whill_info"),
            publish_period_ms: 100,
        }
    }
}

/// WHILL Info Node - telemetry overlay for RViz
///
/// Collects commanded speed, battery level, travelled distance and the
/// controller state, and republishes them as one `OverlayText` panel on
/// every period.
pub struct WhillInfoNode {
    cmd_vel_sub: Hub<Twist>,
    battery_sub: Hub<Float32>,
    distance_sub: Hub<Float32>,
    state_sub: Hub<Float32>,
    overlay_pub: Hub<OverlayText>,

    snapshot: TelemetrySnapshot,
    publish_timer: WallTimer,
}

impl WhillInfoNode {
    pub fn new() -> Result<Self> {
        Self::new_with_config(&InfoOverlayConfig::default())
    }

    pub fn new_with_config(config: &InfoOverlayConfig) -> Result<Self> {
        Ok(Self {
            cmd_vel_sub: Hub::from_config(&config.cmd_vel_topic)?,
            battery_sub: Hub::from_config(&config.battery_topic)?,
            distance_sub: Hub::from_config(&config.distance_topic)?,
            state_sub: Hub::from_config(&config.state_topic)?,
            overlay_pub: Hub::from_config(&config.overlay_topic)?,
            snapshot: TelemetrySnapshot::default(),
            publish_timer: WallTimer::new(Duration::from_millis(config.publish_period_ms)),
        })
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot
    }

    fn publish_overlay(&mut self, mut ctx: Option<&mut NodeInfo>) {
        let overlay = self.snapshot.to_overlay();
        if self.overlay_pub.send(overlay, ctx.as_deref_mut()).is_err() {
            ctx.log_error("Failed to publish overlay");
        }
    }

    fn process(&mut self, now: Instant, mut ctx: Option<&mut NodeInfo>) {
        while let Some(cmd_vel) = self.cmd_vel_sub.recv(ctx.as_deref_mut()) {
            self.snapshot.update_speed(&cmd_vel);
        }
        while let Some(battery) = self.battery_sub.recv(ctx.as_deref_mut()) {
            self.snapshot.update_battery(battery.data);
        }
        while let Some(distance) = self.distance_sub.recv(ctx.as_deref_mut()) {
            self.snapshot.update_distance(distance.data);
        }
        while let Some(state) = self.state_sub.recv(ctx.as_deref_mut()) {
            self.snapshot.update_state(state.data);
        }

        if self.publish_timer.poll(now) {
            self.publish_overlay(ctx);
        }
    }
}

impl Node for WhillInfoNode {
    fn name(&self) -> &'static str {
        "whill_info_publisher"
    }

    fn init(&mut self, ctx: &mut NodeInfo) -> Result<()> {
        self.publish_timer.start(Instant::now());
        ctx.log_info(&format!(
            "Publishing overlay on '{}' every {:?}",
            self.overlay_pub.get_topic_name(),
            self.publish_timer.period()
        ));
        Ok(())
    }

    fn tick(&mut self, ctx: Option<&mut NodeInfo>) {
        self.process(Instant::now(), ctx);
    }

    fn get_publishers(&self) -> Vec<TopicMetadata> {
        vec![TopicMetadata::of::<OverlayText>(
            self.overlay_pub.get_topic_name(),
        )]
    }

    fn get_subscribers(&self) -> Vec<TopicMetadata> {
        vec![
            TopicMetadata::of::<Twist>(self.cmd_vel_sub.get_topic_name()),
            TopicMetadata::of::<Float32>(self.battery_sub.get_topic_name()),
            TopicMetadata::of::<Float32>(self.distance_sub.get_topic_name()),
            TopicMetadata::of::<Float32>(self.state_sub.get_topic_name()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whill_core::communication::Transport;

    fn test_config(prefix: &str) -> InfoOverlayConfig {
        let topic = |suffix: &str| {
            HubConfig::new(&format!("{}/{}", prefix, suffix)).with_transport(Transport::InProcess)
        };
        InfoOverlayConfig {
            cmd_vel_topic: topic("cmd_vel"),
            battery_topic: topic("battery"),
            distance_topic: topic("distance"),
            state_topic: topic("state"),
            overlay_topic: topic("info"),
            publish_period_ms: 100,
        }
    }

    #[test]
    fn test_render_text_layout() {
        let snapshot = TelemetrySnapshot {
            speed: 3.456,
            battery: 72.9,
            distance: 12.345,
            state: 1.0,
        };
        assert_eq!(
            snapshot.render_text(),
            "speed:    3.46   battery:  72   distance: 12.35   state:    1"
        );
    }

    #[test]
    fn test_render_defaults_to_zero() {
        assert_eq!(
            TelemetrySnapshot::default().render_text(),
            "speed:    0.00   battery:  0   distance: 0.00   state:    0"
        );
    }

    #[test]
    fn test_integers_truncate_toward_zero() {
        let snapshot = TelemetrySnapshot {
            speed: -0.5,
            battery: -1.9,
            distance: 0.0,
            state: -1.9,
        };
        assert_eq!(
            snapshot.render_text(),
            "speed:    -0.50   battery:  -1   distance: 0.00   state:    -1"
        );
    }

    #[test]
    fn test_large_values_stay_fixed_point() {
        let snapshot = TelemetrySnapshot {
            distance: 1.0e7,
            ..Default::default()
        };
        assert!(snapshot.render_text().contains("distance: 10000000.00"));
    }

    #[test]
    fn test_overlay_style() {
        let overlay = TelemetrySnapshot::default().to_overlay();
        assert_eq!(overlay.action, OverlayAction::Add);
        assert_eq!(overlay.width, 400);
        assert_eq!(overlay.height, 100);
        assert_eq!(overlay.text_size, 12.0);
        assert_eq!(overlay.line_width, 2);
        assert_eq!(overlay.font, "Arial");
        assert_eq!(overlay.fg_color, ColorRGBA::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(overlay.bg_color, ColorRGBA::new(0.0, 0.0, 0.0, 0.5));
    }

    #[test]
    fn test_speed_comes_from_linear_x() {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.update_speed(&Twist::new_2d(0.75, 1.2));
        assert_eq!(snapshot.speed, 0.75);
    }

    #[test]
    fn test_node_keeps_latest_values_and_publishes() {
        let config = test_config("test/info/latest");
        let mut node = WhillInfoNode::new_with_config(&config).unwrap();
        let cmd_vel_pub = Hub::<Twist>::new(&config.cmd_vel_topic.name).unwrap();
        let battery_pub = Hub::<Float32>::new(&config.battery_topic.name).unwrap();
        let state_pub = Hub::<Float32>::new(&config.state_topic.name).unwrap();
        let overlay_sub = Hub::<OverlayText>::new(&config.overlay_topic.name).unwrap();
        let t0 = Instant::now();
        node.publish_timer.start(t0);

        cmd_vel_pub.send(Twist::new_2d(1.0, 0.0), None).unwrap();
        cmd_vel_pub.send(Twist::new_2d(0.25, 0.0), None).unwrap();
        battery_pub.send(Float32::new(88.0), None).unwrap();
        state_pub.send(Float32::new(2.0), None).unwrap();
        node.process(t0 + Duration::from_millis(10), None);

        assert_eq!(node.snapshot().speed, 0.25);
        assert_eq!(node.snapshot().battery, 88.0);
        assert_eq!(node.snapshot().distance, 0.0);
        assert!(overlay_sub.recv(None).is_none());

        node.process(t0 + Duration::from_millis(100), None);
        let overlay = overlay_sub.recv(None).unwrap();
        assert_eq!(
            overlay.text,
            "speed:    0.25   battery:  88   distance: 0.00   state:    2"
        );
    }

    #[test]
    fn test_heartbeat_without_new_input() {
        let config = test_config("test/info/heartbeat");
        let mut node = WhillInfoNode::new_with_config(&config).unwrap();
        let overlay_sub = Hub::<OverlayText>::new(&config.overlay_topic.name).unwrap();
        let t0 = Instant::now();
        node.publish_timer.start(t0);

        for step in 1..=3 {
            node.process(t0 + Duration::from_millis(100 * step), None);
        }

        let texts: Vec<String> = std::iter::from_fn(|| overlay_sub.recv(None))
            .map(|overlay| overlay.text)
            .collect();
        assert_eq!(texts.len(), 3);
        assert!(texts.iter().all(|text| text == &texts[0]));
    }

    #[test]
    fn test_default_topics() {
        let config = InfoOverlayConfig::default();
        assert_eq!(config.cmd_vel_topic.name, "/whill/controller/cmd_vel");
        assert_eq!(config.battery_topic.name, "/for_rviz");
        assert_eq!(config.distance_topic.name, "/distance");
        assert_eq!(config.state_topic.name, "/state");
        assert_eq!(config.overlay_topic.name, "/whill_info");
    }
}
