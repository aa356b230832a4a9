use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::core::VideoResult;

/// What to open: a file, a capture device by index, or a raw ffmpeg input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSpec {
    File(PathBuf),
    Device(u32),
    Input {
        format: Option<String>,
        input: String,
    },
}

impl SourceSpec {
    /// Files can be previewed and seeked; live inputs cannot.
    pub fn is_file(&self) -> bool {
        matches!(self, SourceSpec::File(_))
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::File(path) => write!(f, "{}", path.display()),
            SourceSpec::Device(index) => write!(f, "device {}", index),
            SourceSpec::Input { format: Some(format), input } => write!(f, "{} ({})", input, format),
            SourceSpec::Input { format: None, input } => write!(f, "{}", input),
        }
    }
}

#[derive(Debug)]
pub enum FrameRead {
    Frame(RgbaImage),
    EndOfStream,
}

/// Cancels a read that is blocked inside the source from another thread.
#[derive(Clone)]
pub struct Interrupter(Arc<dyn Fn() + Send + Sync>);

impl Interrupter {
    pub fn new(interrupt: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(interrupt))
    }

    pub fn interrupt(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Interrupter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Interrupter")
    }
}

/// An opened stream of decoded frames.
pub trait VideoSource: Send {
    fn read_frame(&mut self) -> VideoResult<FrameRead>;

    /// Nominal frame rate; zero when unknown.
    fn fps(&self) -> f64;

    /// Releases the underlying handle. Must tolerate repeated calls.
    fn close(&mut self);

    fn interrupter(&self) -> Option<Interrupter> {
        None
    }
}

/// Opens sources on demand so playback can be restarted at a given frame.
pub trait SourceOpener: Send + Sync {
    fn open(&self, start_frame: u64) -> VideoResult<Box<dyn VideoSource>>;

    fn describe(&self) -> String;

    /// Whether a single frame can be shown before playback starts.
    fn supports_preview(&self) -> bool {
        false
    }

    /// Live inputs produce frames in real time and are never throttled.
    fn is_live(&self) -> bool {
        !self.supports_preview()
    }
}

/// Duration of one frame at `fps`, or `fallback` when the rate is unusable.
pub fn frame_interval(fps: f64, fallback: Duration) -> Duration {
    if !fps.is_finite() || fps <= 0.0 {
        return fallback;
    }
    // Rates so small that one frame outlasts `Duration::MAX` are unusable too.
    Duration::try_from_secs_f64(1.0 / fps)
        .ok()
        .filter(|interval| !interval.is_zero())
        .unwrap_or(fallback)
}
