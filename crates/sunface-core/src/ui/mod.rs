//! UI support: text formatting and condition icons for the face.

pub mod format;
pub mod icons;

pub use format::{HourStyle, date_text, meridiem_text, seconds_text, time_text};
