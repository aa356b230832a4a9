#[cfg(test)]
mod tests {

    use std::path::PathBuf;
    use std::time::Duration;
    use crate::core::PlayerConfig;
    use crate::gui::FitMode;
    use crate::video::SourceSpec;

    #[test]
    fn test_player_config_default() {
        let config = PlayerConfig::default();
        assert!(config.source.is_none());
        assert_eq!(config.fit_mode, FitMode::Contain);
        assert!(!config.flipped);
        assert!(config.pace_to_source_fps);
        assert_eq!(config.start_frame, 0);
        assert_eq!(config.default_frame_interval(), Duration::from_millis(33));
        assert!(config.capture_size().is_none());
    }

    #[test]
    fn test_player_config_serialization() {
        let mut config = PlayerConfig::default();
        config.source = Some(SourceSpec::File(PathBuf::from("/videos/clip.avi")));
        config.fit_mode = FitMode::Expand;
        config.flipped = true;
        config.capture_width = Some(1920);
        config.capture_height = Some(1080);

        let serialized = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: PlayerConfig = serde_json::from_str(&serialized).expect("Failed to deserialize config");

        assert_eq!(config.source, deserialized.source);
        assert_eq!(deserialized.fit_mode, FitMode::Expand);
        assert!(deserialized.flipped);
        assert_eq!(deserialized.capture_size(), Some((1920, 1080)));
    }

    #[test]
    fn test_config_backward_compatibility() {
        // Old config files without newer fields still load
        let old_config_json = r#"{
            "source": { "device": 0 },
            "flipped": true
        }"#;

        let config: PlayerConfig = serde_json::from_str(old_config_json).expect("Failed to parse old config");

        assert_eq!(config.source, Some(SourceSpec::Device(0)));
        assert!(config.flipped);
        assert_eq!(config.fit_mode, FitMode::Contain);
        assert_eq!(config.default_frame_interval_ms, 33);
        assert_eq!(config.background, [0, 0, 0, 255]);
    }

    #[test]
    fn test_partial_capture_size_is_ignored() {
        let mut config = PlayerConfig::default();
        config.capture_width = Some(1280);
        assert!(config.capture_size().is_none());

        config.capture_height = Some(0);
        assert!(config.capture_size().is_none());
    }

    #[test]
    fn test_zero_default_interval_is_clamped() {
        let mut config = PlayerConfig::default();
        config.default_frame_interval_ms = 0;
        assert_eq!(config.default_frame_interval(), Duration::from_millis(1));
    }
}
