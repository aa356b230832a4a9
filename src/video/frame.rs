use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use parking_lot::Mutex;

/// One decoded image. Immutable once published.
#[derive(Debug)]
pub struct Frame {
    /// 1-based position in the stream, strictly increasing per collector.
    pub sequence: u64,
    pub captured_at: Instant,
    pub image: RgbaImage,
}

impl Frame {
    pub fn new(sequence: u64, image: RgbaImage) -> Self {
        Self {
            sequence,
            captured_at: Instant::now(),
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

struct SlotEntry {
    frame: Arc<Frame>,
    observed: bool,
}

/// Single-capacity hand-off between the collector and the display.
///
/// Publishing replaces whatever is stored; undelivered frames are dropped.
/// The lock only guards an `Arc` swap or clone, so neither side ever waits
/// on decoding or scaling work.
pub struct FrameSlot {
    entry: Mutex<Option<SlotEntry>>,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self {
            entry: Mutex::new(None),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, frame: Frame) {
        let frame = Arc::new(frame);
        let previous = self.entry.lock().replace(SlotEntry { frame, observed: false });

        self.published.fetch_add(1, Ordering::Relaxed);
        if let Some(previous) = previous {
            if !previous.observed {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::trace!("Frame {} replaced before display", previous.frame.sequence);
            }
        }
    }

    /// Most recent frame, if any. Never blocks on the producer beyond the swap.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        let mut entry = self.entry.lock();
        entry.as_mut().map(|entry| {
            entry.observed = true;
            Arc::clone(&entry.frame)
        })
    }

    pub fn latest_sequence(&self) -> Option<u64> {
        self.entry.lock().as_ref().map(|entry| entry.frame.sequence)
    }

    pub fn clear(&self) {
        self.entry.lock().take();
    }

    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Frames overwritten before any reader saw them.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}
