//! Image storage, lifecycle, and grid-aligned rasterization.
//!
//! The [`ImagePool`] is the central store for decoded images. Images enter
//! the pool as raw pixel buffers (RGB or RGBA; RGB is expanded to RGBA at
//! intake so everything downstream sees one format), live behind shared
//! handles with stable storage addresses, and leave through an explicit
//! removal routine that notifies a registered observer before the entry is
//! erased — the renderer uses that hook to release texture-atlas slots.
//!
//! A [`RasterizedImage`] fits one image to a cell grid: a cell span, a cell
//! size in pixels, and fill/alignment policies. The renderer pulls one
//! [`RasterizedImage::fragment`] per cell, each a fixed-size RGBA tile.
//!
//! # Memory management
//!
//! The pool enforces a configurable memory quota (default 320 MiB) and a
//! per-image cap (64 MiB). Unlike a texture cache there is no implicit
//! eviction: an image stays resident until it is explicitly removed, so
//! shared handles and named references never dangle. Hitting the quota is
//! reported as an error to the caller instead.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::color::RgbaColor;
use crate::error::GraphicsError;
use crate::geometry::{CellCoord, CellSpan, PixelSize};

/// Default memory quota: 320 MiB.
const DEFAULT_QUOTA_BYTES: usize = 320 * 1024 * 1024;

/// Maximum single image size: 64 MiB.
const MAX_IMAGE_BYTES: usize = 64 * 1024 * 1024;

/// Unique identifier for a stored image.
///
/// Assigned by the pool, strictly increasing for its lifetime. ID 0 is never
/// issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(pub u64);

/// Pixel format of image data handed to the pool.
///
/// RGB data is expanded to RGBA (alpha = 255) at intake; stored images are
/// always RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    /// 3 bytes per pixel: red, green, blue.
    Rgb,
    /// 4 bytes per pixel: red, green, blue, alpha.
    Rgba,
}

impl ImageFormat {
    /// Bytes per pixel for this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ImageFormat::Rgb => 3,
            ImageFormat::Rgba => 4,
        }
    }
}

/// Horizontal/vertical placement of an image inside its cell rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageAlignment {
    TopStart,
    TopCenter,
    TopEnd,
    MiddleStart,
    #[default]
    MiddleCenter,
    MiddleEnd,
    BottomStart,
    BottomCenter,
    BottomEnd,
}

/// How an image is scaled into its cell rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageResize {
    /// Use the image's own pixel dimensions.
    #[default]
    NoResize,
    /// Scale preserving aspect ratio so the image fits inside the rectangle.
    ResizeToFit,
    /// Scale preserving aspect ratio so the image covers the rectangle.
    ResizeToFill,
    /// Scale ignoring aspect ratio to exactly the rectangle.
    StretchToFill,
}

/// A decoded image owned by the pool.
///
/// The pixel buffer is immutable for the image's whole lifetime; all grid
/// fitting happens in [`RasterizedImage`] without touching it.
#[derive(Debug)]
pub struct Image {
    id: ImageId,
    format: ImageFormat,
    size: PixelSize,
    data: Vec<u8>,
}

impl Image {
    /// The pool-unique id.
    #[inline]
    pub fn id(&self) -> ImageId {
        self.id
    }

    /// Stored pixel format (always [`ImageFormat::Rgba`] after intake).
    #[inline]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Pixel extent.
    #[inline]
    pub fn size(&self) -> PixelSize {
        self.size
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// The raw RGBA pixel buffer, row-major, top row first.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// An [`Image`] fitted to a terminal cell grid.
///
/// Holds a strong reference to the image, so a rasterization stays usable
/// even after the image was removed from the pool.
#[derive(Debug)]
pub struct RasterizedImage {
    image: Arc<Image>,
    alignment: ImageAlignment,
    resize: ImageResize,
    default_color: RgbaColor,
    cell_span: CellSpan,
    cell_size: PixelSize,
}

impl RasterizedImage {
    /// The underlying image.
    #[inline]
    pub fn image(&self) -> &Arc<Image> {
        &self.image
    }

    #[inline]
    pub fn alignment(&self) -> ImageAlignment {
        self.alignment
    }

    #[inline]
    pub fn resize_policy(&self) -> ImageResize {
        self.resize
    }

    #[inline]
    pub fn cell_span(&self) -> CellSpan {
        self.cell_span
    }

    #[inline]
    pub fn cell_size(&self) -> PixelSize {
        self.cell_size
    }

    /// Extract one cell-sized RGBA tile at the given cell coordinate.
    ///
    /// The returned buffer is always exactly
    /// `cell_size.width * cell_size.height * 4` bytes, row-major,
    /// top row first. Where the image does not reach the cell rectangle
    /// (trailing cells of the span), pixels are filled with the configured
    /// default color. Rows copied from the image are vertically mirrored
    /// within the available height, matching the texture uploader's
    /// bottom-up origin.
    ///
    /// # Panics
    ///
    /// Panics if the cell's pixel offset lies outside the image — callers
    /// must only request cells inside the rasterization's span.
    // TODO: apply the alignment and resize policies when slicing fragments.
    pub fn fragment(&self, cell: CellCoord) -> Vec<u8> {
        let cell_w = self.cell_size.width as usize;
        let cell_h = self.cell_size.height as usize;
        let image_w = self.image.width() as usize;
        let image_h = self.image.height() as usize;

        let x_offset = cell.column as usize * cell_w;
        let y_offset = cell.row as usize * cell_h;
        assert!(
            x_offset <= image_w,
            "fragment column {} starts at pixel {x_offset}, beyond image width {image_w}",
            cell.column
        );
        assert!(
            y_offset <= image_h,
            "fragment row {} starts at pixel {y_offset}, beyond image height {image_h}",
            cell.row
        );

        let avail_w = (image_w - x_offset).min(cell_w);
        let avail_h = (image_h - y_offset).min(cell_h);
        let fill = self.default_color.to_bytes();
        let data = self.image.data();

        let mut tile = Vec::with_capacity(cell_w * cell_h * 4);
        for y in 0..avail_h {
            let src_row = y_offset + (avail_h - 1 - y);
            let start = (src_row * image_w + x_offset) * 4;
            tile.extend_from_slice(&data[start..start + avail_w * 4]);
            for _ in avail_w..cell_w {
                tile.extend_from_slice(&fill);
            }
        }
        for _ in avail_h * cell_w..cell_h * cell_w {
            tile.extend_from_slice(&fill);
        }

        tile
    }
}

/// Observer invoked with the image just before the pool erases it.
pub type RemovalObserver = Arc<dyn Fn(&Image) + Send + Sync>;

/// Owns decoded images and their grid rasterizations.
///
/// The pool itself lives on the decoder thread. The removal observer is the
/// one cross-thread edge: it must be callable from any thread, and anything
/// expensive (GPU work) must be deferred — see
/// [`ImageDiscardQueue`](crate::discard::ImageDiscardQueue).
pub struct ImagePool {
    /// Stored images keyed by their id.
    images: HashMap<u64, Arc<Image>>,
    /// Live rasterizations, removed by handle identity.
    rasterized: Vec<Arc<RasterizedImage>>,
    /// Name → image mapping for hyperlink-style references.
    named: HashMap<String, Arc<Image>>,
    /// Next image id; strictly increasing, never reused.
    next_image_id: u64,
    /// Current total pixel-buffer bytes.
    total_bytes: usize,
    /// Maximum total pixel-buffer bytes.
    quota_bytes: usize,
    /// Invoked with the image just before erase.
    on_image_remove: Option<RemovalObserver>,
}

impl std::fmt::Debug for ImagePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePool")
            .field("images", &self.images.len())
            .field("rasterized", &self.rasterized.len())
            .field("named", &self.named.len())
            .field("next_image_id", &self.next_image_id)
            .field("total_bytes", &self.total_bytes)
            .field("quota_bytes", &self.quota_bytes)
            .finish()
    }
}

impl Default for ImagePool {
    fn default() -> Self {
        Self::new()
    }
}

impl ImagePool {
    /// Create a pool with the default quota (320 MiB).
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            rasterized: Vec::new(),
            named: HashMap::new(),
            next_image_id: 1,
            total_bytes: 0,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            on_image_remove: None,
        }
    }

    /// Create a pool with a custom quota.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes,
            ..Self::new()
        }
    }

    /// Register the observer invoked before an image is erased.
    ///
    /// Replaces any previously registered observer.
    pub fn set_removal_observer(&mut self, observer: RemovalObserver) {
        self.on_image_remove = Some(observer);
    }

    /// Number of stored images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Number of live rasterizations.
    pub fn rasterized_count(&self) -> usize {
        self.rasterized.len()
    }

    /// Current total pixel-buffer bytes.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Configured memory quota in bytes.
    pub fn quota_bytes(&self) -> usize {
        self.quota_bytes
    }

    /// Look up a stored image by id.
    pub fn image(&self, id: ImageId) -> Option<&Arc<Image>> {
        self.images.get(&id.0)
    }

    /// Store a decoded image, returning a shared handle.
    ///
    /// The buffer length must match `size` under `format`. RGB input is
    /// expanded to RGBA before storage. The handle's storage address is
    /// stable until [`remove_image`](Self::remove_image).
    pub fn create(
        &mut self,
        format: ImageFormat,
        size: PixelSize,
        data: Vec<u8>,
    ) -> Result<Arc<Image>, GraphicsError> {
        let expected = size.pixel_count() * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(GraphicsError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let data = to_rgba(format, data);
        let bytes = data.len();

        if bytes > MAX_IMAGE_BYTES {
            return Err(GraphicsError::ImageTooLarge {
                size: bytes,
                max: MAX_IMAGE_BYTES,
            });
        }
        if self.total_bytes + bytes > self.quota_bytes {
            return Err(GraphicsError::QuotaExceeded {
                used: self.total_bytes + bytes,
                quota: self.quota_bytes,
            });
        }

        let id = ImageId(self.next_image_id);
        self.next_image_id += 1;

        let image = Arc::new(Image {
            id,
            format: ImageFormat::Rgba,
            size,
            data,
        });
        self.images.insert(id.0, Arc::clone(&image));
        self.total_bytes += bytes;
        log::debug!(
            "stored image {id:?}: {}x{} ({bytes} bytes), pool total {} bytes",
            size.width,
            size.height,
            self.total_bytes
        );

        Ok(image)
    }

    /// Remove an image from the pool.
    ///
    /// The removal observer runs before the entry is erased; named
    /// references to the image are unlinked. Rasterizations keep their own
    /// strong reference and remain valid. Outstanding handles keep the pixel
    /// data alive, but the id is gone from the pool for good.
    pub fn remove_image(&mut self, id: ImageId) -> Result<(), GraphicsError> {
        let image = self
            .images
            .get(&id.0)
            .cloned()
            .ok_or(GraphicsError::ImageNotFound(id))?;

        if let Some(observer) = &self.on_image_remove {
            observer(&image);
        }

        self.images.remove(&id.0);
        self.total_bytes = self.total_bytes.saturating_sub(image.data.len());
        self.named.retain(|name, referent| {
            let keep = referent.id != id;
            if !keep {
                log::debug!("unlinking name {name:?} of removed image {id:?}");
            }
            keep
        });
        log::debug!(
            "removed image {id:?}, pool total {} bytes",
            self.total_bytes
        );
        Ok(())
    }

    /// Fit an image to a cell grid, returning a shared handle.
    ///
    /// The rasterization never mutates the image. Fails on a degenerate
    /// cell size; a zero cell span is allowed (no fragments exist).
    pub fn rasterize(
        &mut self,
        image: &Arc<Image>,
        alignment: ImageAlignment,
        resize: ImageResize,
        default_color: RgbaColor,
        cell_span: CellSpan,
        cell_size: PixelSize,
    ) -> Result<Arc<RasterizedImage>, GraphicsError> {
        if cell_size.width == 0 || cell_size.height == 0 {
            return Err(GraphicsError::InvalidDimensions {
                width: cell_size.width,
                height: cell_size.height,
            });
        }

        let rasterized = Arc::new(RasterizedImage {
            image: Arc::clone(image),
            alignment,
            resize,
            default_color,
            cell_span,
            cell_size,
        });
        self.rasterized.push(Arc::clone(&rasterized));
        Ok(rasterized)
    }

    /// Evict a rasterization from the pool's list.
    ///
    /// Identity-based: only the exact handle previously returned by
    /// [`rasterize`](Self::rasterize) matches. Returns `false` for an
    /// unknown handle. No removal observer fires for rasterizations.
    pub fn remove_rasterized(&mut self, handle: &Arc<RasterizedImage>) -> bool {
        let before = self.rasterized.len();
        self.rasterized.retain(|r| !Arc::ptr_eq(r, handle));
        let removed = self.rasterized.len() != before;
        if !removed {
            log::warn!("remove_rasterized: handle not owned by this pool");
        }
        removed
    }

    /// Associate a name with an image. An existing name is overwritten.
    pub fn link(&mut self, name: impl Into<String>, image: Arc<Image>) {
        self.named.insert(name.into(), image);
    }

    /// Look up a named image.
    pub fn find_image_by_name(&self, name: &str) -> Option<&Arc<Image>> {
        self.named.get(name)
    }

    /// Drop a name. Unknown names are ignored.
    pub fn unlink(&mut self, name: &str) {
        self.named.remove(name);
    }
}

/// Expand a pixel buffer to RGBA. A no-op for RGBA input.
fn to_rgba(format: ImageFormat, data: Vec<u8>) -> Vec<u8> {
    match format {
        ImageFormat::Rgba => data,
        ImageFormat::Rgb => {
            let mut rgba = Vec::with_capacity(data.len() / 3 * 4);
            for pixel in data.chunks_exact(3) {
                rgba.extend_from_slice(pixel);
                rgba.push(0xFF);
            }
            rgba
        }
    }
}
