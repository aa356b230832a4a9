pub mod collector;
pub mod ffmpeg_source;
pub mod frame;
pub mod player;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::*;
pub use ffmpeg_source::{FfmpegOpener, FfmpegSource, StreamInfo};
pub use frame::*;
pub use player::*;
pub use source::*;
