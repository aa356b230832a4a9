use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// How a frame's aspect ratio is mapped onto the widget bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Whole frame visible, letterboxed.
    #[default]
    Contain,
    /// Bounds fully covered, excess cropped around the center.
    Expand,
}

impl FitMode {
    pub const ALL: [FitMode; 2] = [FitMode::Contain, FitMode::Expand];

    pub fn label(self) -> &'static str {
        match self {
            FitMode::Contain => "Contain",
            FitMode::Expand => "Expand",
        }
    }
}

/// Where the scaled frame lands inside the bounds. Negative offsets are cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub bounds: Size,
    pub scaled: Size,
    pub offset_x: i64,
    pub offset_y: i64,
}

fn div_ceil(numerator: u64, denominator: u64) -> u64 {
    (numerator + denominator - 1) / denominator
}

/// Computes the scaled size and offset of `source` inside `bounds`.
///
/// Aspect ratios are compared by cross-multiplication so exact matches stay
/// exact; the free dimension is rounded up. Returns `None` for empty sizes.
pub fn compute_placement(source: Size, bounds: Size, mode: FitMode) -> Option<Placement> {
    if source.is_empty() || bounds.is_empty() {
        return None;
    }

    let (sw, sh) = (source.width as u64, source.height as u64);
    let (bw, bh) = (bounds.width as u64, bounds.height as u64);
    let source_wide = sw * bh;
    let bounds_wide = bw * sh;

    let (width, height) = if source_wide == bounds_wide {
        (bw, bh)
    } else {
        // Source narrower than bounds when source_wide < bounds_wide.
        let narrower = source_wide < bounds_wide;
        match (mode, narrower) {
            (FitMode::Contain, true) | (FitMode::Expand, false) => (div_ceil(bh * sw, sh), bh),
            (FitMode::Contain, false) | (FitMode::Expand, true) => (bw, div_ceil(bw * sh, sw)),
        }
    };

    let scaled = Size::new(width.max(1) as u32, height.max(1) as u32);
    Some(Placement {
        bounds,
        scaled,
        offset_x: (bw as i64 - scaled.width as i64) / 2,
        offset_y: (bh as i64 - scaled.height as i64) / 2,
    })
}

/// Length of source covering `bound` pixels once the source is scaled to `scaled`.
fn visible_extent(source: u32, bound: u32, scaled: u32) -> u32 {
    let extent = (bound as u64 * source as u64 + scaled as u64 / 2) / scaled as u64;
    extent.clamp(1, source as u64) as u32
}

/// Produces a bounds-sized image: the frame scaled per `placement`,
/// over `background` where it does not cover.
///
/// Parts that would be cropped away are cut from the source before scaling,
/// and mirroring happens on the scaled result.
pub fn render_frame(frame: &RgbaImage, placement: &Placement, flipped: bool, background: Rgba<u8>) -> RgbaImage {
    let (source_width, source_height) = frame.dimensions();
    let (bounds, scaled) = (placement.bounds, placement.scaled);

    let (crop_width, target_width) = if scaled.width > bounds.width {
        (visible_extent(source_width, bounds.width, scaled.width), bounds.width)
    } else {
        (source_width, scaled.width)
    };
    let (crop_height, target_height) = if scaled.height > bounds.height {
        (visible_extent(source_height, bounds.height, scaled.height), bounds.height)
    } else {
        (source_height, scaled.height)
    };

    let mut image = if (crop_width, crop_height) == (source_width, source_height) {
        if frame.dimensions() == (target_width, target_height) {
            frame.clone()
        } else {
            imageops::resize(frame, target_width, target_height, FilterType::Triangle)
        }
    } else {
        let x = (source_width - crop_width) / 2;
        let y = (source_height - crop_height) / 2;
        let visible = imageops::crop_imm(frame, x, y, crop_width, crop_height).to_image();
        imageops::resize(&visible, target_width, target_height, FilterType::Triangle)
    };

    if flipped {
        imageops::flip_horizontal_in_place(&mut image);
    }

    if image.dimensions() == (bounds.width, bounds.height) {
        return image;
    }

    let mut canvas = RgbaImage::from_pixel(bounds.width, bounds.height, background);
    let offset_x = placement.offset_x.max(0);
    let offset_y = placement.offset_y.max(0);
    imageops::replace(&mut canvas, &image, offset_x, offset_y);
    canvas
}
