//! In-memory doubles for the decoder and the widget.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;

use crate::core::{VideoError, VideoResult};
use crate::gui::ImageSink;
use crate::video::{FrameRead, Interrupter, SourceOpener, VideoSource};

#[derive(Debug, Clone)]
pub enum Step {
    Frame { width: u32, height: u32 },
    EndOfStream,
    Fail,
    /// Blocks until interrupted, then reports a decode error.
    Block,
}

/// Replays a fixed script of reads. Once the script runs out it repeats
/// frames forever when `endless` is set, otherwise ends the stream.
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    fps: f64,
    read_delay: Duration,
    endless: Option<(u32, u32)>,
    interrupted: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>, fps: f64) -> Self {
        Self {
            steps: steps.into(),
            fps,
            read_delay: Duration::ZERO,
            endless: None,
            interrupted: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn frames(count: usize, width: u32, height: u32, fps: f64) -> Self {
        Self::new(vec![Step::Frame { width, height }; count], fps)
    }

    pub fn endless(width: u32, height: u32, fps: f64) -> Self {
        let mut source = Self::new(Vec::new(), fps);
        source.endless = Some((width, height));
        source
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl VideoSource for ScriptedSource {
    fn read_frame(&mut self) -> VideoResult<FrameRead> {
        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay);
        }

        let step = match self.steps.pop_front() {
            Some(step) => step,
            None => match self.endless {
                Some((width, height)) => Step::Frame { width, height },
                None => Step::EndOfStream,
            },
        };

        match step {
            Step::Frame { width, height } => Ok(FrameRead::Frame(RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255])))),
            Step::EndOfStream => Ok(FrameRead::EndOfStream),
            Step::Fail => Err(VideoError::Decode("corrupt packet".to_string())),
            Step::Block => {
                while !self.interrupted.load(Ordering::SeqCst) {
                    std::thread::sleep(Duration::from_millis(1));
                }
                Err(VideoError::Decode("interrupted".to_string()))
            }
        }
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn interrupter(&self) -> Option<Interrupter> {
        let interrupted = Arc::clone(&self.interrupted);
        Some(Interrupter::new(move || interrupted.store(true, Ordering::SeqCst)))
    }
}

/// Hands out scripted sources and records the start frame of each open.
pub struct ScriptedOpener {
    make: Box<dyn Fn() -> ScriptedSource + Send + Sync>,
    pub opens: Arc<Mutex<Vec<u64>>>,
    pub unavailable: bool,
    pub preview: bool,
    pub open_count: Arc<AtomicU32>,
}

impl ScriptedOpener {
    pub fn new(make: impl Fn() -> ScriptedSource + Send + Sync + 'static) -> Self {
        Self {
            make: Box::new(make),
            opens: Arc::new(Mutex::new(Vec::new())),
            unavailable: false,
            preview: false,
            open_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        let mut opener = Self::new(|| ScriptedSource::new(Vec::new(), 0.0));
        opener.unavailable = true;
        opener
    }
}

impl SourceOpener for ScriptedOpener {
    fn open(&self, start_frame: u64) -> VideoResult<Box<dyn VideoSource>> {
        if self.unavailable {
            return Err(VideoError::SourceUnavailable("no such device".to_string()));
        }
        self.open_count.fetch_add(1, Ordering::SeqCst);
        self.opens.lock().push(start_frame);
        Ok(Box::new((self.make)()))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }

    fn supports_preview(&self) -> bool {
        self.preview
    }
}

/// Counts `set_image` calls and keeps the sizes it was handed.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub images: Vec<(u32, u32)>,
    pub last: Option<RgbaImage>,
}

impl RecordingSink {
    pub fn calls(&self) -> usize {
        self.images.len()
    }
}

impl ImageSink for RecordingSink {
    fn set_image(&mut self, image: RgbaImage) {
        self.images.push(image.dimensions());
        self.last = Some(image);
    }
}
