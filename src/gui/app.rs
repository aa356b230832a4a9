use eframe::egui;

use crate::core::PlayerConfig;
use crate::gui::{FitMode, VideoLabel};
use crate::video::{FfmpegOpener, PlaybackState, SourceSpec};

const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mkv", "mov", "webm", "m4v", "wmv"];

pub struct VideoLabelApp {
    pub config: PlayerConfig,
    pub label: Option<VideoLabel>,
    pub status_message: String,
}

impl VideoLabelApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: PlayerConfig) -> anyhow::Result<Self> {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let mut app = Self {
            config,
            label: None,
            status_message: String::new(),
        };

        if let Some(spec) = app.config.source.clone() {
            app.open_source(&cc.egui_ctx, spec);
        } else {
            app.status_message = "Open a video file or a webcam to start".to_string();
        }

        Ok(app)
    }

    fn open_source(&mut self, ctx: &egui::Context, spec: SourceSpec) {
        // Drop the old label first so its decoder is gone before the new one starts
        self.label = None;

        let opener = FfmpegOpener::new(spec.clone(), &self.config);
        let mut label = VideoLabel::new(ctx, Box::new(opener), &self.config);

        if let Err(e) = label.player_mut().load_preview() {
            log::warn!("Could not load preview for {}: {}", spec, e);
        }

        self.status_message = if self.config.autoplay {
            match label.player_mut().play() {
                Ok(()) => format!("Playing {}", spec),
                Err(e) => format!("Failed to open {}: {}", spec, e),
            }
        } else {
            format!("Loaded {}", spec)
        };

        if let Some(error) = label.player().last_error() {
            label.set_placeholder(error.to_string());
        }

        self.label = Some(label);
        self.config.source = Some(spec);
        self.save_config();
    }

    fn save_config(&mut self) {
        if let Err(e) = self.config.save() {
            log::error!("Failed to save config: {}", e);
            self.status_message = format!("Failed to save settings: {}", e);
        }
    }

    fn show_toolbar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("📂 Open").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Video", &VIDEO_EXTENSIONS[..])
                    .pick_file()
                {
                    self.open_source(ctx, SourceSpec::File(path));
                }
            }
            if ui.button("📷 Webcam").clicked() {
                self.open_source(ctx, SourceSpec::Device(0));
            }

            ui.separator();

            if let Some(label) = &mut self.label {
                let player = label.player_mut();
                let play_text = if player.is_playing() { "⏸ Pause" } else { "▶ Play" };
                if ui.button(play_text).clicked() {
                    if let Err(e) = player.toggle_play_pause() {
                        self.status_message = format!("Playback failed: {}", e);
                    }
                }
                if ui.button("⏮ Reset").clicked() {
                    player.reset();
                    self.status_message = "Rewound to start".to_string();
                }
            }

            ui.separator();

            let mut settings_changed = false;
            egui::ComboBox::from_label("Fit")
                .selected_text(self.config.fit_mode.label())
                .show_ui(ui, |ui| {
                    for mode in FitMode::ALL {
                        settings_changed |= ui.selectable_value(&mut self.config.fit_mode, mode, mode.label()).changed();
                    }
                });
            settings_changed |= ui.checkbox(&mut self.config.flipped, "Mirror").changed();

            if settings_changed {
                if let Some(label) = &mut self.label {
                    let surface = label.player_mut().surface_mut();
                    surface.set_fit_mode(self.config.fit_mode);
                    surface.set_flipped(self.config.flipped);
                }
                self.save_config();
            }
        });
    }

    fn update_playback(&mut self) {
        let Some(label) = &mut self.label else {
            return;
        };

        let player = label.player_mut();
        let was_failed = player.state() == PlaybackState::Failed;
        if !player.update() {
            self.status_message = format!("Finished {}", player.describe());
        } else if !was_failed && player.state() == PlaybackState::Failed {
            let error = player.last_error().unwrap_or("unknown error").to_string();
            self.status_message = format!("Playback stopped: {}", error);
        }
    }
}

impl eframe::App for VideoLabelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_playback();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.show_toolbar(ctx, ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);
                if let Some(label) = &self.label {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format!("Frame {}", label.player().frame_number()));
                    });
                }
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| match &mut self.label {
                Some(label) => {
                    label.show(ui);
                }
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.label("No video loaded");
                    });
                }
            });
    }
}
