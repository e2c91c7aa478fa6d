use serde::{Deserialize, Serialize};
use whill_core::core::LogSummary;

/// Single 32-bit float sample (battery level, travelled distance, state code)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Float32 {
    pub data: f32,
}

impl Float32 {
    pub fn new(data: f32) -> Self {
        Self { data }
    }
}

impl From<f32> for Float32 {
    fn from(data: f32) -> Self {
        Self { data }
    }
}

impl LogSummary for Float32 {
    fn log_summary(&self) -> String {
        format!("Float32({:.3})", self.data)
    }
}
