//! Digital face: time with seconds, date line, synced weather.
//!
//! In ambient mode the face is black with the time (no seconds; meridiem
//! suffix under a 12-hour style), the date, and the weather temperatures.
//! In interactive mode it adds a condition-tinted background, a two-digit
//! seconds suffix, and the condition icon. The weather section is suppressed
//! entirely while any of high/low/condition is missing.

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Text};
use heapless::String;
use profont::{PROFONT_12_POINT, PROFONT_14_POINT, PROFONT_18_POINT, PROFONT_24_POINT};

use crate::config::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, DeviceShape, FaceLayout};
use crate::faces::{Face, FaceState};
use crate::ui::format::{HourStyle, date_text, meridiem_text, seconds_text, time_text};
use crate::ui::icons::draw_icon;
use chrono::NaiveDateTime;

const TIME_FONT: &MonoFont<'static> = &PROFONT_24_POINT;
const SUFFIX_FONT: &MonoFont<'static> = &PROFONT_14_POINT;
const TEMP_FONT: &MonoFont<'static> = &PROFONT_18_POINT;
const DATE_FONT: &MonoFont<'static> = &PROFONT_12_POINT;

/// The handheld app's primary blue, as Rgb565.
const BASE_BACKGROUND: Rgb565 = Rgb565::new(4, 37, 29);

/// Alpha applied to the condition tint over the base background.
const BACKGROUND_ALPHA: u8 = 80;

/// The digital watch face.
pub struct DigitalFace {
    bounds: Rectangle,
    layout: FaceLayout,
    low_bit_ambient: bool,
    dirty: bool,
}

impl DigitalFace {
    pub fn new(shape: DeviceShape) -> Self {
        Self {
            bounds: Rectangle::new(
                Point::zero(),
                Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX),
            ),
            layout: FaceLayout::for_shape(shape),
            low_bit_ambient: false,
            dirty: true,
        }
    }

    /// Display property: fewer bits per color in ambient mode. Switches the
    /// ambient palette to pure white-on-black.
    pub fn set_low_bit_ambient(&mut self, low_bit: bool) {
        if self.low_bit_ambient != low_bit {
            self.low_bit_ambient = low_bit;
            self.dirty = true;
        }
    }

    fn background_color(&self, state: &FaceState<'_>) -> Rgb565 {
        if state.ambient {
            return Rgb565::BLACK;
        }
        match state.weather.condition() {
            Some(condition) => blend(
                BASE_BACKGROUND,
                condition.background_color(),
                BACKGROUND_ALPHA,
            ),
            None => BASE_BACKGROUND,
        }
    }

    fn date_color(&self, ambient: bool) -> Rgb565 {
        if ambient {
            if self.low_bit_ambient {
                Rgb565::WHITE
            } else {
                Rgb565::CSS_SILVER
            }
        } else {
            Rgb565::CSS_GAINSBORO
        }
    }

    fn draw_time_row<D>(&self, state: &FaceState<'_>, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let time = time_text(state.time, state.hour_style);
        let suffix = suffix_text(state.time, state.hour_style, state.ambient);

        // The time-plus-suffix block is centered as a whole; the suffix
        // hangs off the right edge of the time.
        let time_w = text_width(TIME_FONT, time.len());
        let suffix_w = suffix
            .as_ref()
            .map(|s| text_width(SUFFIX_FONT, s.len()))
            .unwrap_or(0);
        let time_x = self.bounds.center().x - time_w / 2 - suffix_w / 2;
        let baseline = self.layout.time_baseline_y;

        let time_style = MonoTextStyle::new(TIME_FONT, Rgb565::WHITE);
        Text::new(&time, Point::new(time_x, baseline), time_style).draw(display)?;

        if let Some(suffix) = suffix {
            let suffix_style = MonoTextStyle::new(SUFFIX_FONT, Rgb565::WHITE);
            Text::new(
                &suffix,
                Point::new(time_x + time_w + self.layout.suffix_gap_px, baseline),
                suffix_style,
            )
            .draw(display)?;
        }
        Ok(())
    }

    fn draw_date_row<D>(&self, state: &FaceState<'_>, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let date = date_text(state.time);
        let style = MonoTextStyle::new(DATE_FONT, self.date_color(state.ambient));
        Text::with_alignment(
            &date,
            Point::new(self.bounds.center().x, self.layout.date_baseline_y),
            style,
            Alignment::Center,
        )
        .draw(display)?;
        Ok(())
    }

    fn draw_weather_row<D>(&self, state: &FaceState<'_>, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        // Partial state suppresses the whole section; never an error.
        let (Some(high), Some(low), Some(condition)) = (
            state.weather.high(),
            state.weather.low(),
            state.weather.condition(),
        ) else {
            return Ok(());
        };

        let high_w = text_width(TEMP_FONT, high.len());
        let low_w = text_width(TEMP_FONT, low.len());
        let gap = self.layout.temp_gap_px;
        let x = self.bounds.center().x - (high_w + low_w + gap) / 2;
        let baseline = self.layout.weather_baseline_y;

        let high_style = MonoTextStyle::new(TEMP_FONT, Rgb565::WHITE);
        let low_color = if state.ambient {
            Rgb565::WHITE
        } else {
            Rgb565::CSS_GAINSBORO
        };
        let low_style = MonoTextStyle::new(TEMP_FONT, low_color);

        Text::new(high, Point::new(x, baseline), high_style).draw(display)?;
        Text::new(low, Point::new(x + high_w + gap, baseline), low_style).draw(display)?;

        if !state.ambient {
            // Icon scales with the temperature text height
            let size = TEMP_FONT.character_size.height;
            draw_icon(
                condition,
                Point::new(self.bounds.center().x, self.layout.icon_center_y),
                size,
                display,
            )?;
        }
        Ok(())
    }
}

impl Face for DigitalFace {
    fn draw_face<D: DrawTarget<Color = Rgb565>>(
        &mut self,
        state: &FaceState<'_>,
        display: &mut D,
    ) -> Result<(), D::Error> {
        self.bounds
            .into_styled(PrimitiveStyle::with_fill(self.background_color(state)))
            .draw(display)?;

        self.draw_time_row(state, display)?;
        self.draw_date_row(state, display)?;
        self.draw_weather_row(state, display)?;
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.bounds
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// Suffix next to the time: seconds when interactive, meridiem in ambient
/// mode under a 12-hour style, nothing in ambient 24-hour mode.
fn suffix_text(time: NaiveDateTime, style: HourStyle, ambient: bool) -> Option<String<4>> {
    if !ambient {
        return Some(seconds_text(time));
    }
    match style {
        HourStyle::H12 => {
            let mut out = String::new();
            out.push_str(meridiem_text(time)).ok();
            Some(out)
        }
        HourStyle::H24 => None,
    }
}

fn text_width(font: &MonoFont<'_>, chars: usize) -> i32 {
    chars as i32 * (font.character_size.width + font.character_spacing) as i32
}

/// Mix `tint` over `base` at `alpha`/255, per channel.
fn blend(base: Rgb565, tint: Rgb565, alpha: u8) -> Rgb565 {
    let mix = |b: u8, t: u8| {
        ((b as u16 * (255 - alpha as u16) + t as u16 * alpha as u16) / 255) as u8
    };
    Rgb565::new(
        mix(base.r(), tint.r()),
        mix(base.g(), tint.g()),
        mix(base.b(), tint.b()),
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::framebuffer::FrameBuffer;
    use crate::weather::{WeatherCondition, WeatherSnapshot};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 7, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn draw(face: &mut DigitalFace, state: &FaceState<'_>) -> FrameBuffer {
        let mut fb = FrameBuffer::default();
        face.draw_face(state, &mut fb).unwrap();
        fb
    }

    #[test]
    fn test_suffix_is_seconds_interactive_and_meridiem_ambient() {
        let t = at(15, 4, 7);
        assert_eq!(
            suffix_text(t, HourStyle::H12, false).unwrap().as_str(),
            "07"
        );
        assert_eq!(
            suffix_text(t, HourStyle::H24, false).unwrap().as_str(),
            "07"
        );
        assert_eq!(
            suffix_text(t, HourStyle::H12, true).unwrap().as_str(),
            "PM"
        );
        assert_eq!(
            suffix_text(at(9, 0, 0), HourStyle::H12, true).unwrap().as_str(),
            "AM"
        );
        assert_eq!(suffix_text(t, HourStyle::H24, true), None);
    }

    #[test]
    fn test_ambient_background_is_black() {
        let weather = WeatherSnapshot::new();
        let mut face = DigitalFace::new(DeviceShape::Round);
        let fb = draw(
            &mut face,
            &FaceState {
                time: at(1, 2, 3),
                hour_style: HourStyle::H24,
                ambient: true,
                weather: &weather,
            },
        );
        assert_eq!(fb.pixel(Point::new(0, 0)), Some(Rgb565::BLACK));
        assert_eq!(fb.pixel(Point::new(239, 239)), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_interactive_background_is_tinted_by_condition() {
        let mut weather = WeatherSnapshot::new();
        let mut face = DigitalFace::new(DeviceShape::Round);
        let state_time = at(10, 0, 0);

        let plain = draw(
            &mut face,
            &FaceState {
                time: state_time,
                hour_style: HourStyle::H24,
                ambient: false,
                weather: &weather,
            },
        );
        assert_eq!(plain.pixel(Point::new(0, 0)), Some(BASE_BACKGROUND));

        weather.set_high("25\u{b0}");
        weather.set_low("16\u{b0}");
        weather.set_condition(WeatherCondition::Clear);
        let tinted = draw(
            &mut face,
            &FaceState {
                time: state_time,
                hour_style: HourStyle::H24,
                ambient: false,
                weather: &weather,
            },
        );
        assert_ne!(tinted.pixel(Point::new(0, 0)), Some(BASE_BACKGROUND));
        assert_ne!(tinted.pixel(Point::new(0, 0)), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_incomplete_weather_draws_no_icon() {
        let mut weather = WeatherSnapshot::new();
        weather.set_high("25\u{b0}");
        weather.set_low("16\u{b0}");
        // Condition missing: nothing of the weather section may render

        let mut face = DigitalFace::new(DeviceShape::Rect);
        let fb = draw(
            &mut face,
            &FaceState {
                time: at(10, 0, 0),
                hour_style: HourStyle::H24,
                ambient: false,
                weather: &weather,
            },
        );

        // The icon row stays background-colored
        let layout = FaceLayout::for_shape(DeviceShape::Rect);
        for dx in -20..=20 {
            let p = Point::new(120 + dx, layout.icon_center_y);
            assert_eq!(fb.pixel(p), Some(BASE_BACKGROUND));
        }
        // And no temperature text appears on the weather baseline row
        for dx in -60..=60 {
            let p = Point::new(120 + dx, layout.weather_baseline_y - 4);
            assert_eq!(fb.pixel(p), Some(BASE_BACKGROUND));
        }
    }

    #[test]
    fn test_complete_weather_draws_text_and_icon() {
        let mut weather = WeatherSnapshot::new();
        weather.set_high("25\u{b0}");
        weather.set_low("16\u{b0}");
        weather.set_condition(WeatherCondition::Clear);

        let mut face = DigitalFace::new(DeviceShape::Rect);
        let fb = draw(
            &mut face,
            &FaceState {
                time: at(10, 0, 0),
                hour_style: HourStyle::H24,
                ambient: false,
                weather: &weather,
            },
        );

        // The clear-sky icon leaves gold pixels around the icon anchor
        assert!(fb.count_pixels(Rgb565::CSS_GOLD) > 0);
        // Temperature text leaves white pixels on the weather row
        let layout = FaceLayout::for_shape(DeviceShape::Rect);
        let row_has_white = (-60..=60).any(|dx| {
            fb.pixel(Point::new(120 + dx, layout.weather_baseline_y - 4)) == Some(Rgb565::WHITE)
        });
        assert!(row_has_white);
    }

    #[test]
    fn test_low_bit_ambient_uses_pure_white_palette() {
        let weather = WeatherSnapshot::new();
        let mut face = DigitalFace::new(DeviceShape::Round);
        let state = FaceState {
            time: at(10, 0, 0),
            hour_style: HourStyle::H24,
            ambient: true,
            weather: &weather,
        };

        let fb = draw(&mut face, &state);
        assert!(fb.count_pixels(Rgb565::CSS_SILVER) > 0, "date renders silver");

        face.set_low_bit_ambient(true);
        let fb = draw(&mut face, &state);
        assert_eq!(fb.count_pixels(Rgb565::CSS_SILVER), 0);
    }

    #[test]
    fn test_ambient_skips_the_icon_but_keeps_temperatures() {
        let mut weather = WeatherSnapshot::new();
        weather.set_high("25\u{b0}");
        weather.set_low("16\u{b0}");
        weather.set_condition(WeatherCondition::Clear);

        let mut face = DigitalFace::new(DeviceShape::Round);
        let fb = draw(
            &mut face,
            &FaceState {
                time: at(10, 0, 0),
                hour_style: HourStyle::H24,
                ambient: true,
                weather: &weather,
            },
        );
        assert_eq!(fb.count_pixels(Rgb565::CSS_GOLD), 0);
        let layout = FaceLayout::for_shape(DeviceShape::Round);
        let row_has_white = (-60..=60).any(|dx| {
            fb.pixel(Point::new(120 + dx, layout.weather_baseline_y - 4)) == Some(Rgb565::WHITE)
        });
        assert!(row_has_white);
    }
}
