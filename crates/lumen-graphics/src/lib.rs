//! Image pool and grid-aligned rasterization for the Lumen terminal
//! graphics subsystem.
//!
//! This crate owns decoded images and turns them into cell-sized RGBA tiles
//! for the display layer:
//!
//! - **Image storage**: shared, address-stable handles with explicit
//!   removal and an observer hook for the renderer
//! - **Rasterization**: fitting an image to a cell grid (span, cell size,
//!   alignment/resize policies, default fill)
//! - **Fragmenting**: slicing a rasterization into per-cell texture tiles
//!
//! # Architecture
//!
//! ```text
//! decoded pixels (e.g. lumen-sixel)
//!     │
//!     ▼
//! ImagePool::create()        ← intake, RGBA normalization, quota
//! ImagePool::rasterize()     ← fit to the cell grid
//!     │
//!     ▼
//! RasterizedImage::fragment() ← one RGBA tile per cell, for upload
//!
//! ImagePool::remove_image() ──▶ removal observer ──▶ ImageDiscardQueue
//!                                                      (drained on the
//!                                                       render thread)
//! ```
//!
//! # Pixel format
//!
//! Everything is **canonical RGBA**, one byte per channel, row-major with
//! the top row first. RGB input is expanded at intake; no other format
//! reaches the fragmenter.

pub mod color;
pub mod discard;
pub mod error;
pub mod geometry;
pub mod pool;

// Re-export primary types for convenience.
pub use color::{RgbColor, RgbaColor};
pub use discard::ImageDiscardQueue;
pub use error::GraphicsError;
pub use geometry::{CellCoord, CellSpan, PixelCoord, PixelSize};
pub use pool::{
    Image, ImageAlignment, ImageFormat, ImageId, ImagePool, ImageResize, RasterizedImage,
    RemovalObserver,
};
