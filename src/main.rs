use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use video_label::core::PlayerConfig;
use video_label::gui::{FitMode, VideoLabelApp};
use video_label::video::SourceSpec;

#[derive(Parser, Debug)]
#[command(name = "video-label", about = "Play a video file or webcam in a resizable window")]
struct Args {
    /// Video file to play
    source: Option<PathBuf>,

    /// Capture device index instead of a file
    #[arg(long, conflicts_with = "source")]
    device: Option<u32>,

    #[arg(long, value_enum)]
    fit: Option<FitMode>,

    /// Mirror the image horizontally
    #[arg(long)]
    flip: bool,

    /// Decode files as fast as possible instead of at their frame rate
    #[arg(long)]
    no_pace: bool,
}

impl Args {
    fn apply(self, config: &mut PlayerConfig) {
        if let Some(path) = self.source {
            config.source = Some(SourceSpec::File(path));
        } else if let Some(index) = self.device {
            config.source = Some(SourceSpec::Device(index));
        }
        if let Some(fit) = self.fit {
            config.fit_mode = fit;
        }
        if self.flip {
            config.flipped = true;
        }
        if self.no_pace {
            config.pace_to_source_fps = false;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut config = PlayerConfig::load()?;
    args.apply(&mut config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 600.0])
            .with_min_inner_size([480.0, 320.0])
            .with_title("Video Label"),
        ..Default::default()
    };

    eframe::run_native(
        "Video Label",
        options,
        Box::new(move |cc| {
            match VideoLabelApp::new(cc, config) {
                Ok(app) => Ok(Box::new(app)),
                Err(e) => {
                    eprintln!("Failed to initialize app: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
