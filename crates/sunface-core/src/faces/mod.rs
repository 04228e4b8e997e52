//! Watch-face abstraction.
//!
//! A face owns its layout and dirty tracking; the engine feeds it a
//! [`FaceState`] per draw. Faces are pure renderers: all mutable state they
//! read lives in the engine.

use chrono::NaiveDateTime;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::ui::HourStyle;
use crate::weather::WeatherSnapshot;

mod digital;

pub use digital::DigitalFace;

/// Everything a face needs for one draw.
pub struct FaceState<'a> {
    /// Local wall time at this tick.
    pub time: NaiveDateTime,
    pub hour_style: HourStyle,
    /// Low-power mode: black background, no seconds.
    pub ambient: bool,
    pub weather: &'a WeatherSnapshot,
}

/// Contract every watch face implements.
pub trait Face {
    /// Render the whole face for the given state.
    fn draw_face<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        state: &FaceState<'_>,
        display: &mut D,
    ) -> Result<(), D::Error>;

    /// Bounding rectangle of the face (the full display).
    fn bounds(&self) -> Rectangle;

    /// Whether the face needs redrawing.
    fn is_dirty(&self) -> bool;

    /// Clear the dirty flag after a successful draw.
    fn mark_clean(&mut self);

    /// Force a redraw on the next frame.
    fn mark_dirty(&mut self);
}
