//! SIXEL image builder: parser events in, RGBA raster out.

use lumen_graphics::{PixelCoord, PixelSize, RgbColor, RgbaColor};

use crate::palette::SharedPalette;
use crate::parser::SixelEvents;

/// Builds an RGBA pixel buffer from the event stream of one SIXEL image.
///
/// The builder starts at the maximum raster extent filled with the
/// background color; a `"` raster declaration shrinks it to the announced
/// dimensions. The **sixel cursor** walks the raster one pixel column per
/// rendered sixel and six pixel rows per graphics newline. Writes outside
/// the raster are dropped, so a stream that overruns its declared size
/// clips instead of corrupting memory.
///
/// The palette is shared with the surrounding decoder session: colors
/// defined while building one image stay defined for the next.
#[derive(Debug)]
pub struct SixelImageBuilder {
    max_size: PixelSize,
    palette: SharedPalette,
    size: PixelSize,
    /// RGBA, row-major, top row first; always `size.rgba_len()` bytes.
    buffer: Vec<u8>,
    sixel_cursor: PixelCoord,
    current_color: u32,
    background: RgbaColor,
    aspect_numerator: u32,
    aspect_denominator: u32,
}

impl SixelImageBuilder {
    /// Create a builder for one image decode.
    ///
    /// `max_size` is the hard ceiling the raster declaration is clamped to.
    /// `aspect_vertical` / `aspect_horizontal` seed the aspect ratio used
    /// until the stream declares its own.
    pub fn new(
        max_size: PixelSize,
        aspect_vertical: u32,
        aspect_horizontal: u32,
        background: RgbaColor,
        palette: SharedPalette,
    ) -> Self {
        let mut this = Self {
            max_size,
            palette,
            size: max_size,
            buffer: Vec::new(),
            sixel_cursor: PixelCoord::default(),
            current_color: 0,
            background,
            aspect_numerator: aspect_vertical,
            aspect_denominator: aspect_horizontal,
        };
        this.clear(background);
        this
    }

    /// The hard raster ceiling.
    pub fn max_size(&self) -> PixelSize {
        self.max_size
    }

    /// The current raster extent.
    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn aspect_numerator(&self) -> u32 {
        self.aspect_numerator
    }

    pub fn aspect_denominator(&self) -> u32 {
        self.aspect_denominator
    }

    /// The write head, in pixel coordinates. The row is always a multiple
    /// of six.
    pub fn sixel_cursor(&self) -> PixelCoord {
        self.sixel_cursor
    }

    /// The color sixels currently paint with.
    pub fn current_color(&self) -> RgbColor {
        self.palette.borrow().at(self.current_color)
    }

    /// The raw RGBA buffer.
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Paint the whole raster with `fill` and home the cursor.
    pub fn clear(&mut self, fill: RgbaColor) {
        self.sixel_cursor = PixelCoord::default();
        self.buffer = fill.to_bytes().repeat(self.size.pixel_count());
    }

    /// Read the pixel at `coord`, wrapping both axes around the raster.
    pub fn at(&self, coord: PixelCoord) -> RgbaColor {
        if self.size.pixel_count() == 0 {
            return self.background;
        }
        let row = coord.row % self.size.height;
        let column = coord.column % self.size.width;
        let base = (row as usize * self.size.width as usize + column as usize) * 4;
        RgbaColor::from_bytes([
            self.buffer[base],
            self.buffer[base + 1],
            self.buffer[base + 2],
            self.buffer[base + 3],
        ])
    }

    /// Surrender the finished raster to the caller (extent plus RGBA
    /// buffer), ready for `ImagePool::create`.
    pub fn into_parts(self) -> (PixelSize, Vec<u8>) {
        (self.size, self.buffer)
    }

    /// Bounds-checked opaque pixel write; out-of-raster writes are dropped.
    fn write(&mut self, coord: PixelCoord, color: RgbColor) {
        if coord.row < self.size.height && coord.column < self.size.width {
            let base = (coord.row as usize * self.size.width as usize + coord.column as usize) * 4;
            self.buffer[base] = color.r;
            self.buffer[base + 1] = color.g;
            self.buffer[base + 2] = color.b;
            self.buffer[base + 3] = 0xFF;
        }
    }
}

impl SixelEvents for SixelImageBuilder {
    fn set_color(&mut self, index: u32, color: RgbColor) {
        self.palette.borrow_mut().set_color(index, color);
    }

    fn use_color(&mut self, index: u32) {
        let len = self.palette.borrow().len() as u32;
        self.current_color = if len == 0 { 0 } else { index % len };
    }

    fn rewind(&mut self) {
        self.sixel_cursor.column = 0;
    }

    fn newline(&mut self) {
        self.sixel_cursor.column = 0;
        // Advance only while another band starts inside the raster; once
        // past the bottom, subsequent writes clip.
        if self.sixel_cursor.row + 6 <= self.size.height {
            self.sixel_cursor.row += 6;
        }
    }

    fn set_raster(&mut self, pan: u32, pad: u32, size: PixelSize) {
        self.aspect_numerator = pan;
        self.aspect_denominator = pad;

        let clamped = PixelSize::new(
            size.width.min(self.max_size.width),
            size.height.min(self.max_size.height),
        );
        if clamped != size {
            log::debug!(
                "raster {}x{} clamped to {}x{}",
                size.width,
                size.height,
                clamped.width,
                clamped.height
            );
        }
        self.size = clamped;
        self.buffer = self.background.to_bytes().repeat(self.size.pixel_count());
    }

    fn render(&mut self, sixel: u8) {
        let column = self.sixel_cursor.column;
        if column >= self.size.width {
            return;
        }
        let color = self.current_color();
        for bit in 0..6 {
            if (sixel >> bit) & 1 == 1 {
                self.write(PixelCoord::new(self.sixel_cursor.row + bit, column), color);
            }
        }
        self.sixel_cursor.column += 1;
    }
}
