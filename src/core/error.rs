use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    /// The source could not be opened. Not retried automatically.
    #[error("video source unavailable: {0}")]
    SourceUnavailable(String),

    /// Mid-stream failure. Ends the collector loop and is reported once.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VideoResult<T> = Result<T, VideoError>;
