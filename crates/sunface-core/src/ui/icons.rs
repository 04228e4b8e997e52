//! Condition icons, drawn from primitives.
//!
//! Each icon fits a square of the requested size centered on the anchor
//! point, so the face can scale the icon to the temperature text height.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle, Triangle};

use crate::weather::WeatherCondition;

/// Draw the icon for `condition` centered on `center` within a square of
/// `size` pixels.
pub fn draw_icon<D>(
    condition: WeatherCondition,
    center: Point,
    size: u32,
    display: &mut D,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    match condition {
        WeatherCondition::Clear => draw_sun(center, size, display),
        WeatherCondition::LightClouds => {
            draw_sun(Point::new(center.x - size as i32 / 4, center.y), size / 2, display)?;
            draw_cloud(center, size, Rgb565::CSS_LIGHT_GRAY, display)
        }
        WeatherCondition::Clouds => draw_cloud(center, size, Rgb565::CSS_LIGHT_GRAY, display),
        WeatherCondition::LightRain => {
            draw_cloud(center, size, Rgb565::CSS_LIGHT_GRAY, display)?;
            draw_drops(center, size, 2, display)
        }
        WeatherCondition::Rain => {
            draw_cloud(center, size, Rgb565::CSS_GRAY, display)?;
            draw_drops(center, size, 3, display)
        }
        WeatherCondition::Storm => {
            draw_cloud(center, size, Rgb565::CSS_DIM_GRAY, display)?;
            draw_bolt(center, size, display)
        }
        WeatherCondition::Snow => {
            draw_cloud(center, size, Rgb565::CSS_LIGHT_GRAY, display)?;
            draw_flakes(center, size, display)
        }
        WeatherCondition::Fog => draw_fog(center, size, display),
    }
}

fn draw_sun<D>(center: Point, size: u32, display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let disc = size * 3 / 5;
    let half = disc as i32 / 2;
    Circle::new(Point::new(center.x - half, center.y - half), disc)
        .into_styled(PrimitiveStyle::with_fill(Rgb565::CSS_GOLD))
        .draw(display)?;

    // Four cardinal rays
    let reach = size as i32 / 2;
    let inner = half + 2;
    for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
        Line::new(
            Point::new(center.x + dx * inner, center.y + dy * inner),
            Point::new(center.x + dx * reach, center.y + dy * reach),
        )
        .into_styled(PrimitiveStyle::with_stroke(Rgb565::CSS_GOLD, 2))
        .draw(display)?;
    }
    Ok(())
}

fn draw_cloud<D>(center: Point, size: u32, color: Rgb565, display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let w = size as i32;
    let lobe = size / 2;
    let base_h = size / 4;
    let base_y = center.y - base_h as i32 / 2 + lobe as i32 / 4;

    // Two lobes over a flat base
    Circle::new(
        Point::new(center.x - w / 2, base_y - lobe as i32 / 2),
        lobe,
    )
    .into_styled(PrimitiveStyle::with_fill(color))
    .draw(display)?;
    Circle::new(
        Point::new(center.x - w / 8, base_y - lobe as i32 * 3 / 4),
        lobe,
    )
    .into_styled(PrimitiveStyle::with_fill(color))
    .draw(display)?;
    Rectangle::new(
        Point::new(center.x - w / 2, base_y),
        Size::new(size, base_h),
    )
    .into_styled(PrimitiveStyle::with_fill(color))
    .draw(display)?;
    Ok(())
}

fn draw_drops<D>(center: Point, size: u32, count: i32, display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let top = center.y + size as i32 / 4;
    let len = size as i32 / 4;
    let spread = size as i32 / 2;
    for i in 0..count {
        let x = center.x - spread / 2 + spread * i / (count - 1).max(1);
        Line::new(Point::new(x, top), Point::new(x - 2, top + len))
            .into_styled(PrimitiveStyle::with_stroke(Rgb565::CSS_DODGER_BLUE, 2))
            .draw(display)?;
    }
    Ok(())
}

fn draw_bolt<D>(center: Point, size: u32, display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let top = center.y + size as i32 / 8;
    let h = size as i32 / 2;
    Triangle::new(
        Point::new(center.x + 2, top),
        Point::new(center.x - 4, top + h * 2 / 3),
        Point::new(center.x + 4, top + h),
    )
    .into_styled(PrimitiveStyle::with_fill(Rgb565::CSS_GOLD))
    .draw(display)?;
    Ok(())
}

fn draw_flakes<D>(center: Point, size: u32, display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let y = center.y + size as i32 / 3;
    let spread = size as i32 / 2;
    for i in 0..3 {
        let x = center.x - spread / 2 + spread * i / 2;
        Circle::new(Point::new(x - 1, y - 1), 3)
            .into_styled(PrimitiveStyle::with_fill(Rgb565::WHITE))
            .draw(display)?;
    }
    Ok(())
}

fn draw_fog<D>(center: Point, size: u32, display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let w = size as i32;
    let step = size as i32 / 4;
    for i in -1..=1 {
        let y = center.y + i * step;
        Line::new(Point::new(center.x - w / 2, y), Point::new(center.x + w / 2, y))
            .into_styled(PrimitiveStyle::with_stroke(Rgb565::CSS_LIGHT_GRAY, 2))
            .draw(display)?;
    }
    Ok(())
}
