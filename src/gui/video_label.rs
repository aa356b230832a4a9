use std::time::Instant;

use egui::{Align2, Color32, ColorImage, Context, FontId, Rect, Sense, TextureHandle, TextureOptions};
use image::RgbaImage;

use crate::core::PlayerConfig;
use crate::gui::{FramePacer, ImageSink, Size};
use crate::video::{SourceOpener, VideoPlayer};

/// Uploads rendered frames into a single egui texture.
pub struct TextureSink {
    ctx: Context,
    name: String,
    texture: Option<TextureHandle>,
}

impl TextureSink {
    pub fn new(ctx: &Context, name: impl Into<String>) -> Self {
        Self {
            ctx: ctx.clone(),
            name: name.into(),
            texture: None,
        }
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }
}

impl ImageSink for TextureSink {
    fn set_image(&mut self, image: RgbaImage) {
        let size = [image.width() as usize, image.height() as usize];
        let color_image = ColorImage::from_rgba_unmultiplied(size, image.as_raw());

        match &mut self.texture {
            Some(texture) => texture.set(color_image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(self.ctx.load_texture(&self.name, color_image, TextureOptions::LINEAR));
            }
        }
    }
}

/// A label that fills its space with the playing video.
pub struct VideoLabel {
    player: VideoPlayer<TextureSink>,
    pacer: FramePacer,
    placeholder: String,
}

impl VideoLabel {
    pub fn new(ctx: &Context, opener: Box<dyn SourceOpener>, config: &PlayerConfig) -> Self {
        let player = VideoPlayer::new(opener, TextureSink::new(ctx, "video_frame"), config);
        let pacer = FramePacer::new(player.surface().interval(), Instant::now());

        Self {
            player,
            pacer,
            placeholder: "Loading".to_string(),
        }
    }

    pub fn player(&self) -> &VideoPlayer<TextureSink> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut VideoPlayer<TextureSink> {
        &mut self.player
    }

    pub fn set_placeholder(&mut self, text: impl Into<String>) {
        self.placeholder = text.into();
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let pixels_per_point = ui.ctx().pixels_per_point();

        let bounds = Size::new(
            (rect.width() * pixels_per_point).round().max(0.0) as u32,
            (rect.height() * pixels_per_point).round().max(0.0) as u32,
        );
        self.player.on_resize(bounds);

        let now = Instant::now();
        self.pacer.set_interval(self.player.surface().interval(), now);
        if self.pacer.poll(now) {
            self.player.tick();
        }

        match self.player.surface().sink().texture() {
            Some(texture) => {
                let image_rect = Rect::from_center_size(rect.center(), texture.size_vec2() / pixels_per_point);
                let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                ui.painter().image(texture.id(), image_rect, uv, Color32::WHITE);
            }
            None => {
                ui.painter().text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    &self.placeholder,
                    FontId::proportional(16.0),
                    ui.visuals().text_color(),
                );
            }
        }

        ui.ctx().request_repaint_after(self.pacer.until_next(Instant::now()));
        response
    }
}
