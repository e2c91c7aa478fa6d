/// RViz info display for WHILL
///
/// Hosts two nodes on one scheduler:
/// - `distance_calculator`: `/whill/odom` + `/joy` -> `/distance`
/// - `whill_info_publisher`: cmd_vel, battery, distance and state -> `/whill_info`
///
/// Runs until Ctrl+C.
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::AppConfig;
use std::path::PathBuf;
use tracing::info;
use whill_core::{Node, NodeConfig, Scheduler};
use whill_library::{DistanceCalculatorNode, WhillInfoNode};

#[derive(Parser, Debug)]
#[command(name = "rviz_info_display")]
#[command(about = "WHILL travelled distance and telemetry overlay for RViz", long_about = None)]
struct Args {
    /// Config file (TOML or YAML); standard search paths are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging, including a trace of every published and received message
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over the defaults
    let default_filter = if args.verbose {
        "whill=debug,rviz_info_display=debug,info"
    } else {
        "whill=info,rviz_info_display=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let distance_node = DistanceCalculatorNode::new_with_config(&config.distance)
        .context("Failed to create distance calculator")?;
    let info_node =
        WhillInfoNode::new_with_config(&config.overlay).context("Failed to create info overlay")?;

    let distance_name = distance_node.name();
    let info_name = info_node.name();

    let mut scheduler = Scheduler::new()
        .with_name("rviz_info_display")
        .with_config(config.scheduler.clone());
    scheduler
        .add(Box::new(distance_node), 0, Some(true))
        .add(Box::new(info_node), 1, Some(true))
        .set_node_rate(distance_name, config.node_rate_hz)
        .set_node_rate(info_name, config.node_rate_hz);

    if args.verbose {
        let debug = NodeConfig {
            enable_logging: true,
            log_level: "DEBUG".to_string(),
        };
        scheduler
            .set_node_config(distance_name, debug.clone())
            .set_node_config(info_name, debug);
    }

    info!(
        "Publishing '{}' and '{}'; press Ctrl+C to stop",
        config.distance.distance_topic.name, config.overlay.overlay_topic.name
    );
    scheduler.run().context("Scheduler stopped with an error")?;

    Ok(())
}
