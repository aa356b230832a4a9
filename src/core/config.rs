use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::gui::FitMode;
use crate::video::SourceSpec;

/// Interval used when a source reports no usable frame rate.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub source: Option<SourceSpec>,
    pub fit_mode: FitMode,
    pub flipped: bool,
    pub capture_width: Option<u32>,
    pub capture_height: Option<u32>,
    pub capture_fps: Option<f64>,
    /// Sleep between frames so files play in real time instead of as fast as they decode.
    pub pace_to_source_fps: bool,
    pub start_frame: u64,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub default_frame_interval_ms: u64,
    pub background: [u8; 4],
    pub autoplay: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            source: None,
            fit_mode: FitMode::Contain,
            flipped: false,
            capture_width: None,
            capture_height: None,
            capture_fps: None,
            pace_to_source_fps: true,
            start_frame: 0,
            ffmpeg_path: None,
            ffprobe_path: None,
            default_frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            background: [0, 0, 0, 255],
            autoplay: true,
        }
    }
}

impl PlayerConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e))?;

            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config)
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), creating new one with defaults", e);
                    let new_config = Self::default();
                    new_config.save()
                        .map_err(|save_err| anyhow::anyhow!("Failed to save new config: {}", save_err))?;
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config.save()
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("video-label")
            .join("config.json")
    }

    /// Fallback redraw interval, never zero.
    pub fn default_frame_interval(&self) -> Duration {
        Duration::from_millis(self.default_frame_interval_ms.max(1))
    }

    /// Requested capture size, only when both dimensions are set.
    pub fn capture_size(&self) -> Option<(u32, u32)> {
        match (self.capture_width, self.capture_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}
