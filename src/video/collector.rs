use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::{VideoError, VideoResult};
use crate::video::{frame_interval, Frame, FrameRead, FrameSlot, Interrupter, SourceOpener, VideoSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectorCommand {
    Pause,
    Resume,
    Stop,
}

/// Reported once when the acquisition loop ends on its own.
#[derive(Debug)]
pub enum CollectorEvent {
    EndOfStream { last_sequence: u64 },
    Failed(VideoError),
}

#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Sleep to the source frame rate instead of decoding as fast as possible.
    pub pace_to_source_fps: bool,
    /// Pacing interval when the source rate is unknown.
    pub fallback_interval: Duration,
    /// Frames already consumed; the first published frame is `start_frame + 1`.
    pub start_frame: u64,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            pace_to_source_fps: false,
            fallback_interval: Duration::from_millis(crate::core::DEFAULT_FRAME_INTERVAL_MS),
            start_frame: 0,
        }
    }
}

/// Owns the background thread that pulls frames into a [`FrameSlot`].
pub struct FrameCollector {
    command_sender: Sender<CollectorCommand>,
    event_receiver: Receiver<CollectorEvent>,
    thread: Option<thread::JoinHandle<()>>,
    stopping: Arc<AtomicBool>,
    interrupter: Option<Interrupter>,
    fps: f64,
    paused: bool,
}

impl FrameCollector {
    /// Opens the source on the calling thread so open failures reach the caller,
    /// then moves it onto a dedicated acquisition thread.
    pub fn start(opener: &dyn SourceOpener, slot: Arc<FrameSlot>, options: CollectorOptions) -> VideoResult<Self> {
        let source = opener.open(options.start_frame)?;
        Ok(Self::spawn(source, slot, options))
    }

    pub fn spawn(source: Box<dyn VideoSource>, slot: Arc<FrameSlot>, options: CollectorOptions) -> Self {
        let (command_sender, command_receiver) = mpsc::channel();
        let (event_sender, event_receiver) = mpsc::channel();
        let stopping = Arc::new(AtomicBool::new(false));
        let interrupter = source.interrupter();
        let fps = source.fps();

        let thread = {
            let stopping = Arc::clone(&stopping);
            thread::Builder::new()
                .name("frame-collector".to_string())
                .spawn(move || {
                    collect_frames(source, slot, command_receiver, event_sender, stopping, options);
                })
        };

        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn frame collector thread: {}", e);
                None
            }
        };

        Self {
            command_sender,
            event_receiver,
            thread,
            stopping,
            interrupter,
            fps,
            paused: false,
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        if !self.paused && self.command_sender.send(CollectorCommand::Pause).is_ok() {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        if self.paused && self.command_sender.send(CollectorCommand::Resume).is_ok() {
            self.paused = false;
        }
    }

    /// Non-blocking; returns the next lifecycle event if one is pending.
    pub fn poll_event(&self) -> Option<CollectorEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Ends the loop and releases the source. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let Some(handle) = self.thread.take() else {
            return;
        };

        self.stopping.store(true, Ordering::SeqCst);
        let _ = self.command_sender.send(CollectorCommand::Stop);
        if let Some(interrupter) = &self.interrupter {
            interrupter.interrupt();
        }

        if handle.join().is_err() {
            log::error!("Frame collector thread panicked");
        }
        self.paused = false;
        log::debug!("Frame collector stopped");
    }
}

impl Drop for FrameCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn collect_frames(
    mut source: Box<dyn VideoSource>,
    slot: Arc<FrameSlot>,
    commands: Receiver<CollectorCommand>,
    events: Sender<CollectorEvent>,
    stopping: Arc<AtomicBool>,
    options: CollectorOptions,
) {
    let pacing = options
        .pace_to_source_fps
        .then(|| frame_interval(source.fps(), options.fallback_interval));
    let mut sequence = options.start_frame;
    let mut paused = false;
    let mut pending: Option<CollectorCommand> = None;
    let mut next_frame_time = Instant::now();

    log::debug!("Frame collector running (pacing: {:?})", pacing);

    loop {
        let command = match pending.take() {
            Some(command) => Some(command),
            None if paused => Some(commands.recv().unwrap_or(CollectorCommand::Stop)),
            None => match commands.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(CollectorCommand::Stop),
            },
        };

        match command {
            Some(CollectorCommand::Stop) => break,
            Some(CollectorCommand::Pause) => {
                paused = true;
                log::debug!("Frame collector paused at frame {}", sequence);
                continue;
            }
            Some(CollectorCommand::Resume) => {
                paused = false;
                next_frame_time = Instant::now();
                log::debug!("Frame collector resumed at frame {}", sequence);
                continue;
            }
            None => {}
        }

        match source.read_frame() {
            Ok(FrameRead::Frame(image)) => {
                sequence += 1;
                slot.publish(Frame::new(sequence, image));
            }
            Ok(FrameRead::EndOfStream) => {
                if !stopping.load(Ordering::SeqCst) {
                    log::info!("Reached end of stream after frame {}", sequence);
                    let _ = events.send(CollectorEvent::EndOfStream { last_sequence: sequence });
                }
                break;
            }
            Err(e) => {
                // A killed decoder during stop() surfaces as an error; that is not a failure.
                if !stopping.load(Ordering::SeqCst) {
                    log::error!("Frame collector failed after frame {}: {}", sequence, e);
                    let _ = events.send(CollectorEvent::Failed(e));
                }
                break;
            }
        }

        if let Some(interval) = pacing {
            next_frame_time += interval;
            let now = Instant::now();
            if next_frame_time > now {
                match commands.recv_timeout(next_frame_time - now) {
                    Ok(command) => pending = Some(command),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            } else if now - next_frame_time > interval {
                // Fell behind by more than a frame; do not burst to catch up.
                next_frame_time = now;
            }
        }
    }

    source.close();
}
