//! Watch-face configuration: wire-contract constants and per-shape layout.
//!
//! Everything here is plain data resolved once at startup. The paths and keys
//! are a private contract with the paired handheld device and must match its
//! side of the channel byte for byte.

use embassy_time::Duration;

/// Data-item path the handheld publishes weather payloads on.
pub const PATH_WEATHER_INFO: &str = "/weather-info";

/// Data-item path used as a resync trigger. The payload value is never read
/// by the receiver; a fresh session id merely forces a change notification.
pub const PATH_WEATHER: &str = "/weather";

/// Resync payload key carrying the session id.
pub const KEY_UUID: &str = "uuid";
/// Weather payload key: formatted high temperature.
pub const KEY_HIGH: &str = "high_temp";
/// Weather payload key: formatted low temperature.
pub const KEY_LOW: &str = "low_temp";
/// Weather payload key: integer condition id.
pub const KEY_WEATHER_ID: &str = "weatherId";

/// Redraw interval in interactive mode. One second, since seconds are shown.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(1000);

/// Display width in pixels.
pub const DISPLAY_WIDTH_PX: u32 = 240;
/// Display height in pixels.
pub const DISPLAY_HEIGHT_PX: u32 = 240;

/// Physical shape of the watch display.
///
/// Round devices need the face pushed further down so nothing clips against
/// the bezel curve; rectangular devices can use the full height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceShape {
    Round,
    Rect,
}

/// Text baselines and icon anchor for one device shape.
///
/// Vertical positions are text baselines, matching how the draw routine
/// positions each string.
#[derive(Debug, Clone, Copy)]
pub struct FaceLayout {
    pub time_baseline_y: i32,
    pub date_baseline_y: i32,
    pub weather_baseline_y: i32,
    pub icon_center_y: i32,
    /// Horizontal gap between the high and low temperature strings.
    pub temp_gap_px: i32,
    /// Horizontal gap between the time string and its seconds/meridiem suffix.
    pub suffix_gap_px: i32,
}

const ROUND_LAYOUT: FaceLayout = FaceLayout {
    time_baseline_y: 98,
    date_baseline_y: 136,
    weather_baseline_y: 180,
    icon_center_y: 212,
    temp_gap_px: 20,
    suffix_gap_px: 5,
};

const RECT_LAYOUT: FaceLayout = FaceLayout {
    time_baseline_y: 88,
    date_baseline_y: 126,
    weather_baseline_y: 172,
    icon_center_y: 206,
    temp_gap_px: 20,
    suffix_gap_px: 5,
};

impl FaceLayout {
    pub const fn for_shape(shape: DeviceShape) -> Self {
        match shape {
            DeviceShape::Round => ROUND_LAYOUT,
            DeviceShape::Rect => RECT_LAYOUT,
        }
    }
}
