//! Weather state synced from the handheld.
//!
//! The snapshot mirrors the last payload seen on the weather-info path. Each
//! field is overwritten independently when its key is present, so a partial
//! payload can leave the snapshot mixing old and new data. That weak
//! consistency is part of the observed contract and is covered by tests
//! rather than papered over.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use heapless::String;

/// Weather condition bucket, derived from the handheld's integer condition
/// id (OpenWeatherMap id ranges).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Storm,
    LightRain,
    Rain,
    Snow,
    Fog,
    Clear,
    LightClouds,
    Clouds,
}

impl WeatherCondition {
    /// Map a condition id onto its bucket.
    ///
    /// Ranges follow the handheld's own icon table, including its quirk that
    /// id 761 falls in the fog range while 781 is a storm. Ids outside every
    /// range yield `None`; the caller logs and keeps the previous condition.
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            200..=232 => Some(Self::Storm),
            300..=321 => Some(Self::LightRain),
            500..=504 | 520..=531 => Some(Self::Rain),
            511 | 600..=622 => Some(Self::Snow),
            701..=761 => Some(Self::Fog),
            781 => Some(Self::Storm),
            800 => Some(Self::Clear),
            801 => Some(Self::LightClouds),
            802..=804 => Some(Self::Clouds),
            _ => None,
        }
    }

    /// Background tint drawn behind the interactive face for this condition.
    pub fn background_color(self) -> Rgb565 {
        match self {
            Self::Storm => Rgb565::CSS_DARK_SLATE_GRAY,
            Self::LightRain | Self::Rain => Rgb565::CSS_STEEL_BLUE,
            Self::Snow => Rgb565::CSS_LIGHT_STEEL_BLUE,
            Self::Fog => Rgb565::CSS_SLATE_GRAY,
            Self::Clear => Rgb565::CSS_GOLDENROD,
            Self::LightClouds | Self::Clouds => Rgb565::CSS_CADET_BLUE,
        }
    }
}

/// Capacity for one formatted temperature string ("25°", "-12°C").
const TEMP_LEN: usize = 12;

/// Latest weather state, fields absent until first sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeatherSnapshot {
    high: Option<String<TEMP_LEN>>,
    low: Option<String<TEMP_LEN>>,
    condition: Option<WeatherCondition>,
}

impl WeatherSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_high(&mut self, text: &str) {
        self.high = Some(bounded(text));
    }

    pub fn set_low(&mut self, text: &str) {
        self.low = Some(bounded(text));
    }

    pub fn set_condition(&mut self, condition: WeatherCondition) {
        self.condition = Some(condition);
    }

    pub fn high(&self) -> Option<&str> {
        self.high.as_deref()
    }

    pub fn low(&self) -> Option<&str> {
        self.low.as_deref()
    }

    pub fn condition(&self) -> Option<WeatherCondition> {
        self.condition
    }

    /// Whether the face may draw the weather section. Any missing field
    /// suppresses the whole section; this is not an error state.
    pub fn is_complete(&self) -> bool {
        self.high.is_some() && self.low.is_some() && self.condition.is_some()
    }
}

fn bounded(s: &str) -> String<TEMP_LEN> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
