//! Deferred image discards across the renderer boundary.
//!
//! The pool's removal observer may fire on whatever thread drops the last
//! handle, but GPU-side eviction (atlas slots, textures) must only happen on
//! the render thread. The [`ImageDiscardQueue`] bridges the two: any thread
//! pushes the id of a discarded image, and the render thread drains the
//! queue at its per-frame safe point.

use std::sync::{Arc, Mutex};

use crate::pool::{Image, ImageId, RemovalObserver};

/// A mutex-guarded queue of image ids awaiting GPU-side eviction.
///
/// Cheap to clone; clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct ImageDiscardQueue {
    queue: Arc<Mutex<Vec<ImageId>>>,
}

impl ImageDiscardQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an image for eviction. Callable from any thread.
    pub fn push(&self, id: ImageId) {
        self.queue.lock().expect("discard queue poisoned").push(id);
    }

    /// Take all pending ids. Call from the render thread at a safe point.
    pub fn drain(&self) -> Vec<ImageId> {
        let mut queue = self.queue.lock().expect("discard queue poisoned");
        std::mem::take(&mut *queue)
    }

    /// A removal observer that feeds this queue, for
    /// [`ImagePool::set_removal_observer`](crate::pool::ImagePool::set_removal_observer).
    pub fn observer(&self) -> RemovalObserver {
        let queue = self.clone();
        Arc::new(move |image: &Image| {
            log::debug!("queueing image {:?} for GPU discard", image.id());
            queue.push(image.id());
        })
    }
}
