//! In-memory render surface with changed-region tracking.
//!
//! The face draws into this buffer; a hardware backend then flushes only the
//! bounding rectangle of pixels that actually changed. The simulator and the
//! test suite use it directly as the reference `DrawTarget`.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::trace;

use crate::config::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

/// Heap-backed pixel buffer implementing `DrawTarget<Color = Rgb565>`.
///
/// Tracks the bounding box of changed pixels between flushes. Writes that
/// leave a pixel's color unchanged do not grow the dirty region.
pub struct FrameBuffer {
    size: Size,
    pixels: Vec<Rgb565>,
    dirty: Option<Rectangle>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX))
    }
}

impl FrameBuffer {
    /// Allocate a buffer of the given size, filled with black.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pixels: vec![Rgb565::BLACK; (size.width * size.height) as usize],
            dirty: None,
        }
    }

    /// Color at `point`, or `None` outside the buffer.
    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        self.index_of(point).map(|idx| self.pixels[idx])
    }

    /// Bounding rectangle of pixels changed since the last flush/take.
    pub fn dirty_region(&self) -> Option<Rectangle> {
        self.dirty
    }

    /// Clear and return the dirty region.
    pub fn take_dirty(&mut self) -> Option<Rectangle> {
        self.dirty.take()
    }

    /// Number of pixels currently holding `color`.
    pub fn count_pixels(&self, color: Rgb565) -> usize {
        self.pixels.iter().filter(|p| **p == color).count()
    }

    /// Flush the dirty region to a backing display and reset it.
    ///
    /// No-op when nothing changed.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(area) = self.dirty.take() else {
            return Ok(());
        };
        trace!(
            "flushing {}x{} region at ({}, {})",
            area.size.width, area.size.height, area.top_left.x, area.top_left.y
        );

        let stride = self.size.width as usize;
        let pixels = &self.pixels;
        let x0 = area.top_left.x as usize;
        let width = area.size.width as usize;
        let rows = area.top_left.y..area.top_left.y + area.size.height as i32;
        let pixel_iter = rows.flat_map(move |y| {
            let row_start = y as usize * stride + x0;
            pixels[row_start..row_start + width].iter().copied()
        });
        display.fill_contiguous(&area, pixel_iter)
    }

    fn index_of(&self, point: Point) -> Option<usize> {
        if point.x < 0
            || point.y < 0
            || point.x as u32 >= self.size.width
            || point.y as u32 >= self.size.height
        {
            return None;
        }
        Some(point.y as usize * self.size.width as usize + point.x as usize)
    }

    fn set_pixel(&mut self, point: Point, color: Rgb565) {
        let Some(idx) = self.index_of(point) else {
            return;
        };
        if self.pixels[idx] == color {
            return;
        }
        self.pixels[idx] = color;
        let pixel_rect = Rectangle::new(point, Size::new(1, 1));
        self.dirty = Some(match self.dirty {
            Some(region) => envelope(region, pixel_rect),
            None => pixel_rect,
        });
    }
}

/// Smallest rectangle containing both `a` and `b`.
fn envelope(a: Rectangle, b: Rectangle) -> Rectangle {
    let left = a.top_left.x.min(b.top_left.x);
    let top = a.top_left.y.min(b.top_left.y);
    let right = (a.top_left.x + a.size.width as i32).max(b.top_left.x + b.size.width as i32);
    let bottom = (a.top_left.y + a.size.height as i32).max(b.top_left.y + b.size.height as i32);
    Rectangle::new(
        Point::new(left, top),
        Size::new((right - left) as u32, (bottom - top) as u32),
    )
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point, color);
        }
        Ok(())
    }
}
