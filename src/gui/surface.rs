use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};

use crate::gui::{compute_placement, render_frame, FitMode, Placement, Size};
use crate::video::{frame_interval, FrameSlot};

/// The label-like target that shows rendered frames.
pub trait ImageSink {
    fn set_image(&mut self, image: RgbaImage);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Slot has no frame yet.
    Empty,
    /// Widget has no area yet.
    NoBounds,
    /// Nothing changed since the last render.
    Unchanged,
    Rendered { sequence: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderKey {
    sequence: u64,
    placement: Placement,
}

/// Pulls the newest frame from the slot and keeps the sink in sync with the
/// widget size, rendering only when the frame or the placement changed.
pub struct DisplaySurface<S: ImageSink> {
    slot: Arc<FrameSlot>,
    sink: S,
    fit_mode: FitMode,
    flipped: bool,
    background: Rgba<u8>,
    bounds: Size,
    last_render: Option<RenderKey>,
    dirty: bool,
    interval: Duration,
    fallback_interval: Duration,
    render_count: u64,
}

impl<S: ImageSink> DisplaySurface<S> {
    pub fn new(slot: Arc<FrameSlot>, sink: S, fallback_interval: Duration) -> Self {
        Self {
            slot,
            sink,
            fit_mode: FitMode::Contain,
            flipped: false,
            background: Rgba([0, 0, 0, 255]),
            bounds: Size::default(),
            last_render: None,
            dirty: false,
            interval: fallback_interval,
            fallback_interval,
            render_count: 0,
        }
    }

    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Redraw interval for a source rate; unusable rates fall back.
    pub fn set_source_fps(&mut self, fps: f64) {
        self.interval = frame_interval(fps, self.fallback_interval);
        log::debug!("Display interval set to {:?} for {:.2} FPS", self.interval, fps);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    pub fn set_fit_mode(&mut self, fit_mode: FitMode) {
        if self.fit_mode != fit_mode {
            self.fit_mode = fit_mode;
            self.dirty = true;
        }
    }

    pub fn flipped(&self) -> bool {
        self.flipped
    }

    pub fn set_flipped(&mut self, flipped: bool) {
        if self.flipped != flipped {
            self.flipped = flipped;
            self.dirty = true;
        }
    }

    pub fn set_background(&mut self, background: [u8; 4]) {
        let background = Rgba(background);
        if self.background != background {
            self.background = background;
            self.dirty = true;
        }
    }

    /// Forces the next tick to render even if nothing else changed.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Records the new widget size. Rendering waits for the next tick, so a
    /// burst of resizes costs one render at the latest size.
    pub fn on_resize(&mut self, bounds: Size) {
        self.bounds = bounds;
    }

    pub fn last_rendered_sequence(&self) -> Option<u64> {
        self.last_render.map(|key| key.sequence)
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Forgets what was rendered so the next frame is drawn unconditionally.
    pub fn reset(&mut self) {
        self.last_render = None;
        self.dirty = true;
    }

    pub fn tick(&mut self) -> TickOutcome {
        let Some(frame) = self.slot.latest() else {
            return TickOutcome::Empty;
        };

        let source = Size::new(frame.width(), frame.height());
        let Some(placement) = compute_placement(source, self.bounds, self.fit_mode) else {
            return TickOutcome::NoBounds;
        };

        let key = RenderKey { sequence: frame.sequence, placement };
        if !self.dirty && self.last_render == Some(key) {
            return TickOutcome::Unchanged;
        }

        let image = render_frame(&frame.image, &placement, self.flipped, self.background);
        self.sink.set_image(image);

        self.last_render = Some(key);
        self.dirty = false;
        self.render_count += 1;
        log::trace!("Frame {} shown {:?} after capture", frame.sequence, frame.captured_at.elapsed());
        TickOutcome::Rendered { sequence: frame.sequence }
    }
}
