use serde::{Deserialize, Serialize};
use whill_core::core::LogSummary;

/// RGBA color with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorRGBA {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRGBA {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    pub fn black(alpha: f32) -> Self {
        Self::new(0.0, 0.0, 0.0, alpha)
    }
}

/// Whether the display should draw (or replace) the overlay, or remove it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum OverlayAction {
    #[default]
    Add = 0,
    Delete = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum HorizontalAlignment {
    #[default]
    Left = 0,
    Right = 1,
    Center = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum VerticalAlignment {
    Center = 2,
    #[default]
    Top = 3,
    Bottom = 4,
}

/// Text box drawn on top of the 3D view of a visualization tool
///
/// Sizes are in screen pixels; `text_size` is in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayText {
    pub action: OverlayAction,
    pub width: i32,
    pub height: i32,
    /// Offset from the aligned edge
    pub horizontal_distance: i32,
    pub vertical_distance: i32,
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
    pub bg_color: ColorRGBA,
    pub line_width: i32,
    pub text_size: f32,
    pub font: String,
    pub fg_color: ColorRGBA,
    pub text: String,
}

impl Default for OverlayText {
    fn default() -> Self {
        Self {
            action: OverlayAction::Add,
            width: 0,
            height: 0,
            horizontal_distance: 0,
            vertical_distance: 0,
            horizontal_alignment: HorizontalAlignment::default(),
            vertical_alignment: VerticalAlignment::default(),
            bg_color: ColorRGBA::default(),
            line_width: 0,
            text_size: 0.0,
            font: String::new(),
            fg_color: ColorRGBA::default(),
            text: String::new(),
        }
    }
}

impl OverlayText {
    /// Overlay that removes whatever is currently shown
    pub fn delete() -> Self {
        Self {
            action: OverlayAction::Delete,
            ..Default::default()
        }
    }
}

impl LogSummary for OverlayText {
    fn log_summary(&self) -> String {
        format!(
            "OverlayText({:?}, {}x{}, \"{}\")",
            self.action, self.width, self.height, self.text
        )
    }
}
