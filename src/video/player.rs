use std::sync::Arc;
use std::time::Duration;

use crate::core::{PlayerConfig, VideoError, VideoResult};
use crate::gui::{DisplaySurface, ImageSink, Size, TickOutcome};
use crate::video::{CollectorEvent, CollectorOptions, Frame, FrameCollector, FrameRead, FrameSlot, SourceOpener};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Ended,
    Failed,
}

/// Ties a source, its collector and a display surface together with
/// play/pause/reset controls.
pub struct VideoPlayer<S: ImageSink> {
    opener: Box<dyn SourceOpener>,
    surface: DisplaySurface<S>,
    collector: Option<FrameCollector>,
    pace_to_source_fps: bool,
    fallback_interval: Duration,
    frame_number: u64,
    state: PlaybackState,
    last_error: Option<String>,
}

impl<S: ImageSink> VideoPlayer<S> {
    pub fn new(opener: Box<dyn SourceOpener>, sink: S, config: &PlayerConfig) -> Self {
        let fallback_interval = config.default_frame_interval();
        let mut surface = DisplaySurface::new(Arc::new(FrameSlot::new()), sink, fallback_interval);
        surface.set_fit_mode(config.fit_mode);
        surface.set_flipped(config.flipped);
        surface.set_background(config.background);

        Self {
            opener,
            surface,
            collector: None,
            pace_to_source_fps: config.pace_to_source_fps,
            fallback_interval,
            frame_number: config.start_frame,
            state: PlaybackState::Idle,
            last_error: None,
        }
    }

    pub fn describe(&self) -> String {
        self.opener.describe()
    }

    pub fn surface(&self) -> &DisplaySurface<S> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut DisplaySurface<S> {
        &mut self.surface
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Position of the newest delivered frame, or the resume point when stopped.
    pub fn frame_number(&self) -> u64 {
        match &self.collector {
            Some(_) => self.surface.slot().latest_sequence().unwrap_or(self.frame_number),
            None => self.frame_number,
        }
    }

    /// Shows the frame at the resume point without starting playback.
    /// Live sources have nothing to preview and are left alone.
    pub fn load_preview(&mut self) -> VideoResult<()> {
        if !self.opener.supports_preview() || self.collector.is_some() {
            return Ok(());
        }

        let mut source = self.opener.open(self.frame_number)?;
        self.surface.set_source_fps(source.fps());
        let read = source.read_frame();
        source.close();

        match read? {
            FrameRead::Frame(image) => {
                self.surface.slot().publish(Frame::new(self.frame_number + 1, image));
                self.surface.mark_dirty();
                Ok(())
            }
            FrameRead::EndOfStream => Err(VideoError::Decode("source has no frames".to_string())),
        }
    }

    pub fn play(&mut self) -> VideoResult<()> {
        if let Some(collector) = &mut self.collector {
            collector.resume();
            self.state = PlaybackState::Playing;
            return Ok(());
        }

        if self.state == PlaybackState::Ended {
            self.frame_number = 0;
            self.surface.slot().clear();
            self.surface.reset();
        }

        // Live inputs arrive in real time; sleeping between reads only adds lag.
        let options = CollectorOptions {
            pace_to_source_fps: self.pace_to_source_fps && !self.opener.is_live(),
            fallback_interval: self.fallback_interval,
            start_frame: self.frame_number,
        };

        match FrameCollector::start(self.opener.as_ref(), Arc::clone(self.surface.slot()), options) {
            Ok(collector) => {
                self.surface.set_source_fps(collector.fps());
                self.collector = Some(collector);
                self.state = PlaybackState::Playing;
                self.last_error = None;
                log::info!("Playing {} from frame {}", self.opener.describe(), self.frame_number);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to start {}: {}", self.opener.describe(), e);
                self.state = PlaybackState::Failed;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Parks the collector; the source stays open so resuming is immediate.
    pub fn pause(&mut self) {
        if let Some(collector) = &mut self.collector {
            collector.pause();
            self.state = PlaybackState::Paused;
        }
    }

    pub fn toggle_play_pause(&mut self) -> VideoResult<()> {
        if self.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Tears the collector down, remembering where playback got to.
    /// Calling it again, or before any playback, does nothing.
    pub fn stop(&mut self) {
        if let Some(mut collector) = self.collector.take() {
            collector.stop();
            if let Some(sequence) = self.surface.slot().latest_sequence() {
                self.frame_number = sequence;
            }
            if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
                self.state = PlaybackState::Idle;
            }
        }
    }

    /// Stops and rewinds to the first frame. The old frame is dropped so a
    /// stop before the next frame arrives cannot resume from it.
    pub fn reset(&mut self) {
        self.stop();
        self.frame_number = 0;
        self.state = PlaybackState::Idle;
        self.surface.slot().clear();
        self.surface.reset();
    }

    /// Drains collector events. Returns `false` once the stream has ended.
    pub fn update(&mut self) -> bool {
        let mut finished = false;

        if let Some(collector) = &self.collector {
            while let Some(event) = collector.poll_event() {
                match event {
                    CollectorEvent::EndOfStream { last_sequence } => {
                        log::info!("{} finished at frame {}", self.opener.describe(), last_sequence);
                        self.frame_number = last_sequence;
                        self.state = PlaybackState::Ended;
                        finished = true;
                    }
                    CollectorEvent::Failed(e) => {
                        self.last_error = Some(e.to_string());
                        self.state = PlaybackState::Failed;
                        finished = true;
                    }
                }
            }
        }

        if finished {
            if let Some(mut collector) = self.collector.take() {
                collector.stop();
            }
            if self.state == PlaybackState::Failed {
                if let Some(sequence) = self.surface.slot().latest_sequence() {
                    self.frame_number = sequence;
                }
            }
        }

        self.state != PlaybackState::Ended
    }

    pub fn on_resize(&mut self, bounds: Size) {
        self.surface.on_resize(bounds);
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.surface.tick()
    }
}

impl<S: ImageSink> Drop for VideoPlayer<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
