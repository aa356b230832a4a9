use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;

use crate::core::{PlayerConfig, VideoError, VideoResult};
use crate::video::{FrameRead, Interrupter, SourceOpener, SourceSpec, VideoSource};

/// Stream metadata reported by ffprobe.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Opens sources by spawning `ffmpeg` and reading raw RGBA frames from its stdout.
#[derive(Debug, Clone)]
pub struct FfmpegOpener {
    spec: SourceSpec,
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    capture_size: Option<(u32, u32)>,
    capture_fps: Option<f64>,
}

impl FfmpegOpener {
    pub fn new(spec: SourceSpec, config: &PlayerConfig) -> Self {
        Self {
            spec,
            ffmpeg: config.ffmpeg_path.clone().unwrap_or_else(|| PathBuf::from("ffmpeg")),
            ffprobe: config.ffprobe_path.clone().unwrap_or_else(|| PathBuf::from("ffprobe")),
            capture_size: config.capture_size(),
            capture_fps: config.capture_fps,
        }
    }

    /// Demuxer options and `-i` argument for the configured source.
    fn input_args(&self) -> VideoResult<Vec<String>> {
        let mut args = Vec::new();

        match &self.spec {
            SourceSpec::File(path) => {
                if !path.exists() {
                    return Err(VideoError::SourceUnavailable(format!("{} does not exist", path.display())));
                }
                args.push("-i".to_string());
                args.push(path.to_string_lossy().into_owned());
            }
            SourceSpec::Device(index) => {
                let (format, input) = device_input(*index)?;
                args.push("-f".to_string());
                args.push(format.to_string());
                self.push_capture_options(&mut args);
                args.push("-i".to_string());
                args.push(input);
            }
            SourceSpec::Input { format, input } => {
                if let Some(format) = format {
                    args.push("-f".to_string());
                    args.push(format.clone());
                }
                self.push_capture_options(&mut args);
                args.push("-i".to_string());
                args.push(input.clone());
            }
        }

        Ok(args)
    }

    fn push_capture_options(&self, args: &mut Vec<String>) {
        if let Some((width, height)) = self.capture_size {
            args.push("-video_size".to_string());
            args.push(format!("{}x{}", width, height));
        }
        if let Some(fps) = self.capture_fps.filter(|fps| *fps > 0.0) {
            args.push("-framerate".to_string());
            args.push(format!("{}", fps));
        }
    }

    pub fn probe(&self) -> VideoResult<StreamInfo> {
        let mut command = Command::new(&self.ffprobe);
        command.args(["-v", "quiet", "-print_format", "json", "-show_streams", "-select_streams", "v:0"]);
        command.args(self.input_args()?);

        let output = command.output()
            .map_err(|e| VideoError::SourceUnavailable(format!("failed to run {}: {}", self.ffprobe.display(), e)))?;
        if !output.status.success() {
            return Err(VideoError::SourceUnavailable(format!("ffprobe could not open {}", self.spec)));
        }

        parse_probe_output(&output.stdout)
            .ok_or_else(|| VideoError::SourceUnavailable(format!("no video stream in {}", self.spec)))
    }

    /// Resolves output size and rate, probing only when something is unknown.
    fn stream_info(&self) -> VideoResult<StreamInfo> {
        match (&self.spec, self.capture_size) {
            (SourceSpec::File(_), _) => {
                let mut info = self.probe()?;
                if let Some((width, height)) = self.capture_size {
                    info.width = width;
                    info.height = height;
                }
                Ok(info)
            }
            // Live inputs with a requested size skip the probe, which can take
            // seconds on some webcams.
            (_, Some((width, height))) => Ok(StreamInfo {
                width,
                height,
                fps: self.capture_fps.unwrap_or(0.0),
            }),
            (_, None) => self.probe(),
        }
    }
}

impl SourceOpener for FfmpegOpener {
    fn open(&self, start_frame: u64) -> VideoResult<Box<dyn VideoSource>> {
        let info = self.stream_info()?;
        if info.width == 0 || info.height == 0 {
            return Err(VideoError::SourceUnavailable(format!("{} reports an empty frame size", self.spec)));
        }

        let mut command = Command::new(&self.ffmpeg);
        command.args(["-hide_banner", "-loglevel", "error", "-nostdin"]);
        if self.spec.is_file() && start_frame > 0 && info.fps > 0.0 {
            command.arg("-ss").arg(format!("{:.6}", start_frame as f64 / info.fps));
        }
        let output_size = format!("{}x{}", info.width, info.height);
        command.args(self.input_args()?);
        command.args([
            "-an",
            "-f", "rawvideo",
            "-pix_fmt", "rgba",
            "-s", output_size.as_str(),
            "-",
        ]);
        command.stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null());

        let mut child = command.spawn()
            .map_err(|e| VideoError::SourceUnavailable(format!("failed to run {}: {}", self.ffmpeg.display(), e)))?;
        let stdout = child.stdout.take()
            .ok_or_else(|| VideoError::SourceUnavailable("ffmpeg stdout was not captured".to_string()))?;

        log::info!("Opened {}: {}x{} at {:.2} FPS (start frame {})",
            self.spec, info.width, info.height, info.fps, start_frame);

        Ok(Box::new(FfmpegSource {
            child: Arc::new(Mutex::new(Some(child))),
            stdout,
            info,
        }))
    }

    fn describe(&self) -> String {
        self.spec.to_string()
    }

    fn supports_preview(&self) -> bool {
        self.spec.is_file()
    }

    fn is_live(&self) -> bool {
        !self.spec.is_file()
    }
}

pub struct FfmpegSource {
    child: Arc<Mutex<Option<Child>>>,
    stdout: ChildStdout,
    info: StreamInfo,
}

impl FfmpegSource {
    fn frame_len(&self) -> usize {
        self.info.width as usize * self.info.height as usize * 4
    }
}

impl VideoSource for FfmpegSource {
    fn read_frame(&mut self) -> VideoResult<FrameRead> {
        let mut buffer = vec![0u8; self.frame_len()];
        let mut filled = 0;

        while filled < buffer.len() {
            match self.stdout.read(&mut buffer[filled..]) {
                Ok(0) if filled == 0 => return Ok(FrameRead::EndOfStream),
                Ok(0) => {
                    return Err(VideoError::Decode(format!(
                        "stream ended mid-frame ({} of {} bytes)", filled, buffer.len()
                    )))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(VideoError::Decode(e.to_string())),
            }
        }

        RgbaImage::from_raw(self.info.width, self.info.height, buffer)
            .map(FrameRead::Frame)
            .ok_or_else(|| VideoError::Decode("frame buffer size mismatch".to_string()))
    }

    fn fps(&self) -> f64 {
        self.info.fps
    }

    fn close(&mut self) {
        kill_child(&self.child);
    }

    fn interrupter(&self) -> Option<Interrupter> {
        let child = Arc::clone(&self.child);
        Some(Interrupter::new(move || kill_child(&child)))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.close();
    }
}

fn kill_child(child: &Mutex<Option<Child>>) {
    if let Some(mut process) = child.lock().take() {
        let _ = process.kill();
        match process.wait() {
            Ok(status) => log::debug!("ffmpeg exited with {}", status),
            Err(e) => log::warn!("Failed to reap ffmpeg process: {}", e),
        }
    }
}

fn device_input(index: u32) -> VideoResult<(&'static str, String)> {
    if cfg!(target_os = "linux") {
        Ok(("v4l2", format!("/dev/video{}", index)))
    } else if cfg!(target_os = "macos") {
        Ok(("avfoundation", format!("{}:none", index)))
    } else {
        Err(VideoError::SourceUnavailable(format!(
            "capture device {} must be given as a named input on this platform", index
        )))
    }
}

fn parse_probe_output(stdout: &[u8]) -> Option<StreamInfo> {
    let json: serde_json::Value = serde_json::from_slice(stdout).ok()?;
    let stream = json["streams"]
        .as_array()?
        .iter()
        .find(|s| s["codec_type"] == "video")?;

    let width = stream["width"].as_u64()? as u32;
    let height = stream["height"].as_u64()? as u32;
    let fps = ["avg_frame_rate", "r_frame_rate"]
        .iter()
        .filter_map(|key| stream[*key].as_str().and_then(parse_frame_rate))
        .next()
        .unwrap_or(0.0);

    Some(StreamInfo { width, height, fps })
}

/// Parses ffprobe rates such as "30/1", "30000/1001" or "25". "0/0" means unknown.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: f64 = numerator.trim().parse().ok()?;
            let denominator: f64 = denominator.trim().parse().ok()?;
            if denominator == 0.0 {
                return None;
            }
            numerator / denominator
        }
        None => rate.trim().parse().ok()?,
    };

    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_frame_rate_rejects_unknown() {
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("0/1"), None);
        assert_eq!(parse_frame_rate("abc"), None);
        assert_eq!(parse_frame_rate(""), None);
    }

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "streams": [
                { "codec_type": "video", "width": 1920, "height": 1080,
                  "r_frame_rate": "60/1", "avg_frame_rate": "0/0" }
            ]
        }"#;
        let info = parse_probe_output(json).expect("probe output should parse");
        assert_eq!(info, StreamInfo { width: 1920, height: 1080, fps: 60.0 });
    }

    #[test]
    fn test_parse_probe_output_without_video_stream() {
        let json = br#"{ "streams": [ { "codec_type": "audio" } ] }"#;
        assert!(parse_probe_output(json).is_none());
        assert!(parse_probe_output(b"not json").is_none());
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let spec = SourceSpec::File(PathBuf::from("/definitely/not/here.mp4"));
        let opener = FfmpegOpener::new(spec, &PlayerConfig::default());
        match opener.open(0) {
            Err(VideoError::SourceUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("opening a missing file should fail"),
        }
    }

    #[test]
    fn test_live_input_with_capture_size_skips_probe() {
        let mut config = PlayerConfig::default();
        config.capture_width = Some(640);
        config.capture_height = Some(480);
        let spec = SourceSpec::Input { format: Some("lavfi".to_string()), input: "testsrc".to_string() };
        let opener = FfmpegOpener::new(spec, &config);

        let info = opener.stream_info().expect("no probe needed");
        assert_eq!((info.width, info.height), (640, 480));
        assert_eq!(info.fps, 0.0);
        assert!(!opener.supports_preview());
    }

    #[test]
    fn test_only_files_are_paced_sources() {
        let config = PlayerConfig::default();
        let file = FfmpegOpener::new(SourceSpec::File(PathBuf::from("clip.mp4")), &config);
        let webcam = FfmpegOpener::new(SourceSpec::Device(0), &config);
        let stream = FfmpegOpener::new(SourceSpec::Input { format: None, input: "rtsp://camera/live".to_string() }, &config);

        assert!(!file.is_live());
        assert!(webcam.is_live());
        assert!(stream.is_live());
    }
}
