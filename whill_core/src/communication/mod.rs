//! # Communication layer
//!
//! Typed publish/subscribe over named topics, either inside one process or
//! across processes through shared memory rings.
//!
//! - **Hub**: a typed handle on a topic; sends to every other Hub on the
//!   same topic and receives from its own bounded history
//! - **config**: topic tables, transports and TOML/YAML config file loading

pub mod config;
pub mod hub;

pub use config::{HubConfig, Transport};
pub use hub::{list_topics, ConnectionState, Hub, HubMetrics, DEFAULT_DEPTH};
