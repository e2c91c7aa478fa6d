// End-to-end wiring: odometry -> distance calculator -> info overlay
use approx::assert_relative_eq;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use whill_core::{Hub, HubConfig, Scheduler, Transport};
use whill_library::nodes::{DistanceCalculatorConfig, InfoOverlayConfig};
use whill_library::{
    DistanceCalculatorNode, Float32, Joy, LogSummary, Odometry, OverlayText, Twist, WhillInfoNode,
};

struct Topics {
    odom: String,
    joy: String,
    distance: String,
    cmd_vel: String,
    battery: String,
    state: String,
    overlay: String,
}

impl Topics {
    fn new(prefix: &str) -> Self {
        let topic = |suffix: &str| format!("{}/{}", prefix, suffix);
        Self {
            odom: topic("odom"),
            joy: topic("joy"),
            distance: topic("distance"),
            cmd_vel: topic("cmd_vel"),
            battery: topic("battery"),
            state: topic("state"),
            overlay: topic("info"),
        }
    }

    fn distance_config(&self) -> DistanceCalculatorConfig {
        DistanceCalculatorConfig {
            odom_topic: local(&self.odom),
            joy_topic: local(&self.joy),
            distance_topic: local(&self.distance),
            ..Default::default()
        }
    }

    fn overlay_config(&self) -> InfoOverlayConfig {
        InfoOverlayConfig {
            cmd_vel_topic: local(&self.cmd_vel),
            battery_topic: local(&self.battery),
            distance_topic: local(&self.distance),
            state_topic: local(&self.state),
            overlay_topic: local(&self.overlay),
            ..Default::default()
        }
    }
}

fn local(name: &str) -> HubConfig {
    HubConfig::new(name).with_transport(Transport::InProcess)
}

fn drain<T>(hub: &Hub<T>) -> Vec<T>
where
    T: Clone + Send + Serialize + DeserializeOwned + LogSummary + 'static,
{
    std::iter::from_fn(|| hub.recv(None)).collect()
}

#[test]
fn test_distance_reaches_overlay() {
    let topics = Topics::new("pipeline/distance");
    let distance_node = DistanceCalculatorNode::new_with_config(&topics.distance_config()).unwrap();
    let info_node = WhillInfoNode::new_with_config(&topics.overlay_config()).unwrap();
    let reader = distance_node.reader();

    let odom_pub = Hub::<Odometry>::new(&topics.odom).unwrap();
    let cmd_vel_pub = Hub::<Twist>::new(&topics.cmd_vel).unwrap();
    let battery_pub = Hub::<Float32>::new(&topics.battery).unwrap();
    let state_pub = Hub::<Float32>::new(&topics.state).unwrap();
    let distance_sub = Hub::<Float32>::new(&topics.distance).unwrap();
    let overlay_sub = Hub::<OverlayText>::new(&topics.overlay).unwrap();

    for (x, y) in [(0.0, 0.0), (3.0, 4.0), (3.0, 4.0)] {
        odom_pub.send(Odometry::at(x, y), None).unwrap();
    }
    cmd_vel_pub.send(Twist::new_2d(0.8, 0.0), None).unwrap();
    battery_pub.send(Float32::new(64.7), None).unwrap();
    state_pub.send(Float32::new(3.0), None).unwrap();

    let mut scheduler = Scheduler::new().with_name("pipeline");
    scheduler
        .add(Box::new(distance_node), 0, None)
        .add(Box::new(info_node), 1, None);
    scheduler.run_for(Duration::from_millis(450)).unwrap();

    assert_relative_eq!(reader.total(), 5.0);

    let published = drain(&distance_sub);
    assert!(published.len() >= 2, "got {} distance messages", published.len());
    assert!(published.iter().all(|msg| msg.data == 5.0));

    let overlays = drain(&overlay_sub);
    let last = overlays.last().expect("no overlay published");
    assert_eq!(
        last.text,
        "speed:    0.80   battery:  64   distance: 5.00   state:    3"
    );
    assert_eq!(last.font, "Arial");
}

#[test]
fn test_joystick_reset_zeroes_total() {
    let topics = Topics::new("pipeline/reset");
    let distance_node = DistanceCalculatorNode::new_with_config(&topics.distance_config()).unwrap();
    let reader = distance_node.reader();

    let odom_pub = Hub::<Odometry>::new(&topics.odom).unwrap();
    let joy_pub = Hub::<Joy>::new(&topics.joy).unwrap();

    odom_pub.send(Odometry::at(0.0, 0.0), None).unwrap();
    odom_pub.send(Odometry::at(0.0, 2.0), None).unwrap();

    let mut scheduler = Scheduler::new();
    scheduler.add(Box::new(distance_node), 0, None);
    let handle = scheduler.stop_handle();

    let driver = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        let before = reader.total();

        let mut buttons = vec![0; 11];
        buttons[8] = 1;
        joy_pub.send(Joy::new(vec![0.0; 6], buttons), None).unwrap();
        std::thread::sleep(Duration::from_millis(100));
        let after = reader.total();

        handle.stop();
        (before, after)
    });

    scheduler.run_for(Duration::from_secs(5)).unwrap();
    let (before, after) = driver.join().unwrap();

    assert_relative_eq!(before, 2.0);
    assert_relative_eq!(after, 0.0);
}
