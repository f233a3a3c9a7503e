//! Streaming SIXEL decoder for the Lumen terminal graphics subsystem.
//!
//! Sixel is a bitmap graphics protocol from DEC's VT240/VT330/VT340 line:
//! each printable byte encodes a vertical column of six pixels. This crate
//! decodes the data between the DCS introducer and ST — the surrounding
//! escape-sequence dispatcher owns those — into an RGBA raster:
//!
//! ```text
//! code points
//!     │
//!     ▼
//! SixelParser::parse()        ← streaming state machine
//!     │  SixelEvents calls
//!     ▼
//! SixelImageBuilder           ← raster writes, palette, sixel cursor
//!     │  into_parts()
//!     ▼
//! lumen_graphics::ImagePool   ← storage and cell-grid rasterization
//! ```
//!
//! The decoder is tolerant by contract: malformed input is dropped, never
//! fatal, and every stream yields some image.
//!
//! # Example
//!
//! ```
//! use lumen_graphics::{PixelSize, RgbaColor};
//! use lumen_sixel::{SixelColorPalette, SixelImageBuilder, SixelParser};
//!
//! let palette = SixelColorPalette::new(256, 256).shared();
//! let mut builder = SixelImageBuilder::new(
//!     PixelSize::new(80, 24),
//!     1,
//!     1,
//!     RgbaColor::OPAQUE_BLACK,
//!     palette,
//! );
//! SixelParser::decode("\"1;1;4;6#2!4~", &mut builder);
//! let (size, rgba) = builder.into_parts();
//! assert_eq!(rgba.len(), size.rgba_len());
//! ```

pub mod builder;
pub mod palette;
pub mod parser;

// Re-export primary types at the crate root for convenience.
pub use builder::SixelImageBuilder;
pub use palette::{SharedPalette, SixelColorPalette, VT340_DEFAULT_PALETTE};
pub use parser::{SixelEvents, SixelParser};
