use std::sync::{Arc, Mutex};

use super::TextureError;

/// Opaque handle to a texture owned by a [`TextureBackend`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub(crate) u32);

impl TextureId {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Queue of handles awaiting destruction.
///
/// A [`Texture2d`](super::Texture2d) dropped while loaded cannot reach its
/// backend, so it pushes its handle here instead; the backend drains the queue
/// at its next maintenance point. Cloning shares the underlying queue.
///
/// The engine is single-threaded, but the queue is `Arc<Mutex<..>>` so
/// resources stay `Send`.
#[derive(Debug, Clone, Default)]
pub struct ReleaseQueue(Arc<Mutex<Vec<TextureId>>>);

impl ReleaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `id` for destruction at the backend's next maintenance point.
    pub fn defer(&self, id: TextureId) {
        match self.0.lock() {
            Ok(mut q) => q.push(id),
            Err(poisoned) => poisoned.into_inner().push(id),
        }
    }

    /// Takes all pending handles, leaving the queue empty.
    pub fn drain(&self) -> Vec<TextureId> {
        match self.0.lock() {
            Ok(mut q) => std::mem::take(&mut *q),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.0.lock() {
            Ok(q) => q.is_empty(),
            Err(poisoned) => poisoned.into_inner().is_empty(),
        }
    }
}

/// Storage seam for uploaded textures.
///
/// Implementations own the actual GPU (or fake) memory; resources hold only
/// [`TextureId`]s. The backend must outlive every resource that references it
/// — that ordering is a precondition, not a recoverable error.
pub trait TextureBackend {
    /// Uploads premultiplied RGBA8 pixels and returns a fresh handle.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        premultiplied_rgba: &[u8],
        label: Option<&str>,
    ) -> Result<TextureId, TextureError>;

    /// Destroys a handle immediately. Unknown ids are ignored.
    fn destroy_texture(&mut self, id: TextureId);

    /// The shared queue that dropped resources defer their handles to.
    fn release_queue(&self) -> ReleaseQueue;

    /// Number of live textures, for diagnostics and leak tests.
    fn texture_count(&self) -> usize;

    /// Destroys every handle deferred to the release queue.
    ///
    /// Backends call this once per frame (or before creating new textures);
    /// tests call it directly.
    fn flush_released(&mut self) {
        for id in self.release_queue().drain() {
            self.destroy_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue() {
        let q = ReleaseQueue::new();
        q.defer(TextureId(1));
        q.defer(TextureId(2));
        assert_eq!(q.drain(), vec![TextureId(1), TextureId(2)]);
        assert!(q.is_empty());
    }

    #[test]
    fn clones_share_the_queue() {
        let q = ReleaseQueue::new();
        let q2 = q.clone();
        q2.defer(TextureId(7));
        assert_eq!(q.drain(), vec![TextureId(7)]);
    }
}
