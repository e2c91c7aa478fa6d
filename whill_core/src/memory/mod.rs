//! # Shared memory transport
//!
//! - **ShmRegion**: a named memory-mapped file under [`shm_topics_dir`]
//! - **ShmTopic**: a multi-producer ring of serialized messages in one region,
//!   readable by every process that maps it
//!
//! Messages are encoded with `bincode` into fixed-size slots, so any
//! `Serialize + DeserializeOwned` type can cross the process boundary,
//! including types that own heap data.

pub mod platform;
pub mod shm_region;
pub mod shm_topic;

pub use platform::{shm_base_dir, shm_topics_dir};
pub use shm_region::ShmRegion;
pub use shm_topic::{ShmTopic, RING_SLOTS, SLOT_PAYLOAD_BYTES};
