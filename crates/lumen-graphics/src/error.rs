//! Error types for the image pool.

use crate::pool::ImageId;

/// Errors that can occur during image pool operations.
///
/// Streaming SIXEL decode never produces these — the decoder is tolerant by
/// contract and always yields some image. These cover pool misuse and
/// resource limits.
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// The image ID was not found in the pool.
    #[error("image not found: {0:?}")]
    ImageNotFound(ImageId),

    /// The pixel buffer length does not match the declared size and format.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// The image data exceeds the maximum allowed size.
    #[error("image too large: {size} bytes (max {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    /// Storing the image would exceed the pool's memory quota.
    #[error("memory quota exceeded: {used} / {quota} bytes")]
    QuotaExceeded { used: usize, quota: usize },

    /// Invalid dimensions (zero-sized cell, degenerate raster).
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}
