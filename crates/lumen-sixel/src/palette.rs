//! SIXEL color registers.

use std::cell::RefCell;
use std::rc::Rc;

use lumen_graphics::RgbColor;

/// The VT340 default color palette (16 registers).
///
/// <https://www.vt100.net/docs/vt3xx-gp/chapter2.html#S2.4>
pub const VT340_DEFAULT_PALETTE: [RgbColor; 16] = [
    RgbColor::new(0, 0, 0),       //  0: black
    RgbColor::new(51, 51, 204),   //  1: blue
    RgbColor::new(204, 33, 33),   //  2: red
    RgbColor::new(51, 204, 51),   //  3: green
    RgbColor::new(204, 51, 204),  //  4: magenta
    RgbColor::new(51, 204, 204),  //  5: cyan
    RgbColor::new(204, 204, 51),  //  6: yellow
    RgbColor::new(135, 135, 135), //  7: gray 50%
    RgbColor::new(66, 66, 66),    //  8: gray 25%
    RgbColor::new(84, 84, 153),   //  9: less saturated blue
    RgbColor::new(153, 66, 66),   // 10: less saturated red
    RgbColor::new(84, 153, 84),   // 11: less saturated green
    RgbColor::new(153, 84, 153),  // 12: less saturated magenta
    RgbColor::new(84, 153, 153),  // 13: less saturated cyan
    RgbColor::new(153, 153, 84),  // 14: less saturated yellow
    RgbColor::new(204, 204, 204), // 15: gray 75%
];

/// A resizable, bounded array of RGB color registers.
///
/// Lookups wrap modulo the current length; writes past the cap are dropped.
/// One palette may be shared across several image builds (colors defined by
/// one image remain visible to the next), hence [`SharedPalette`].
#[derive(Debug, Clone)]
pub struct SixelColorPalette {
    palette: Vec<RgbColor>,
    max_size: usize,
}

/// Shared ownership of a palette within one decoder thread.
pub type SharedPalette = Rc<RefCell<SixelColorPalette>>;

impl SixelColorPalette {
    /// Create a palette with `size` registers, capped at `max_size`, seeded
    /// from the VT340 defaults.
    pub fn new(size: usize, max_size: usize) -> Self {
        let mut this = Self {
            palette: vec![RgbColor::default(); size.min(max_size)],
            max_size,
        };
        this.reset();
        this
    }

    /// Wrap a palette for sharing across image builds.
    pub fn shared(self) -> SharedPalette {
        Rc::new(RefCell::new(self))
    }

    /// Restore the VT340 defaults in the first `min(len, 16)` registers.
    /// Registers beyond that keep their current colors.
    pub fn reset(&mut self) {
        let n = self.palette.len().min(VT340_DEFAULT_PALETTE.len());
        self.palette[..n].copy_from_slice(&VT340_DEFAULT_PALETTE[..n]);
    }

    /// Number of registers currently defined.
    pub fn len(&self) -> usize {
        self.palette.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }

    /// The register cap.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    /// Resize to `min(n, max_size)` registers. New registers are black.
    pub fn set_size(&mut self, n: usize) {
        self.palette.resize(n.min(self.max_size), RgbColor::default());
    }

    /// Define the color of register `index`, growing the palette up to the
    /// cap if needed. An index at or past the cap is dropped.
    pub fn set_color(&mut self, index: u32, color: RgbColor) {
        let index = index as usize;
        if index >= self.max_size {
            return;
        }
        if index >= self.palette.len() {
            self.set_size(index + 1);
        }
        self.palette[index] = color;
    }

    /// Read register `index`, wrapping modulo the palette length.
    pub fn at(&self, index: u32) -> RgbColor {
        if self.palette.is_empty() {
            return RgbColor::default();
        }
        self.palette[index as usize % self.palette.len()]
    }
}
