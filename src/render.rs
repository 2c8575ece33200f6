//! Plan execution: resize, trim, round, composite, and encode.
//!
//! The renderer is the only module that touches pixel data. It executes a
//! [`CanvasPlan`] verbatim — all geometry decisions were already made by the
//! planner. Per-image preparation (resize + trim + corner rounding) runs on
//! a `rayon` pool; results are joined back in plan order before compositing,
//! so completion order never changes the output.

use std::path::Path;

use image::imageops::FilterType;
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::debug;

use crate::color::CanvasColor;
use crate::error::MergeError;
use crate::layout::grid::{GridConfig, SquareConfig};
use crate::layout::masonry::MasonryConfig;
use crate::layout::{CanvasPlan, ImagePlacement, Rect};
use crate::loader;

/// Output formats the encoder accepts, by extension (case-insensitive).
pub const OUTPUT_EXTENSIONS: &[&str] = &["bmp", "gif", "jpeg", "jpg", "png", "tiff"];

/// Rendering knobs that are raster-side only (the plan stays pure geometry).
#[derive(Default)]
pub struct RenderOptions<'a> {
    /// Corner rounding radius in pixels; 0 disables.
    pub corner_radius: u32,
    /// Progress handle, bumped once per prepared image.
    pub progress: Option<&'a ProgressBar>,
}

/// Plan a masonry layout for `images` and composite it in one call.
pub fn compose_masonry(
    images: &[DynamicImage],
    config: &MasonryConfig,
) -> Result<RgbaImage, MergeError> {
    let plan = config.plan(&loader::dimensions(images))?;
    render(images, &plan, &RenderOptions::default())
}

/// Plan a fixed-aspect grid for `images` and composite it in one call.
pub fn compose_grid(
    images: &[DynamicImage],
    config: &GridConfig,
) -> Result<RgbaImage, MergeError> {
    let plan = config.plan(&loader::dimensions(images))?;
    render(images, &plan, &RenderOptions::default())
}

/// Plan a square grid for `images` and composite it in one call.
pub fn compose_square(
    images: &[DynamicImage],
    config: &SquareConfig,
) -> Result<RgbaImage, MergeError> {
    let plan = config.plan(&loader::dimensions(images))?;
    render(images, &plan, &RenderOptions::default())
}

/// Composite `images` onto a canvas according to `plan`.
pub fn render(
    images: &[DynamicImage],
    plan: &CanvasPlan,
    options: &RenderOptions<'_>,
) -> Result<RgbaImage, MergeError> {
    if let Some(p) = plan.images.iter().find(|p| p.source >= images.len()) {
        return Err(MergeError::PlanMismatch {
            index: p.source,
            count: images.len(),
        });
    }

    // Resize and trim concurrently; collect() preserves plan order.
    let prepared: Vec<RgbaImage> = plan
        .images
        .par_iter()
        .map(|placement| {
            let img = prepare(&images[placement.source], placement, options.corner_radius);
            if let Some(pb) = options.progress {
                pb.inc(1);
            }
            img
        })
        .collect();

    let mut canvas = RgbaImage::from_pixel(
        plan.canvas.width,
        plan.canvas.height,
        Rgba(plan.background.rgba8()),
    );
    for (placement, img) in plan.images.iter().zip(&prepared) {
        if let Some(backdrop) = &placement.backdrop {
            fill_rect(&mut canvas, backdrop.rect, backdrop.color);
        }
        imageops::overlay(&mut canvas, img, placement.x as i64, placement.y as i64);
    }

    debug!(
        width = canvas.width(),
        height = canvas.height(),
        images = prepared.len(),
        "canvas composited"
    );
    Ok(canvas)
}

/// Resize one source to its planned dimensions, apply the trim, and round
/// corners if requested.
fn prepare(source: &DynamicImage, placement: &ImagePlacement, radius: u32) -> RgbaImage {
    let to = placement.resize_to;
    let mut resized = source.resize_exact(to.width, to.height, FilterType::Lanczos3);
    if let Some(r) = &placement.trim {
        resized = resized.crop_imm(r.x, r.y, r.width, r.height);
    }
    let mut rgba = resized.into_rgba8();
    if radius > 0 {
        round_corners(&mut rgba, radius);
    }
    rgba
}

/// Overwrite a rectangle with a solid color (backdrop fills sit beneath the
/// image, above the canvas background).
fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: CanvasColor) {
    let pixel = Rgba(color.rgba8());
    let x_end = (rect.x + rect.width).min(canvas.width());
    let y_end = (rect.y + rect.height).min(canvas.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            canvas.put_pixel(x, y, pixel);
        }
    }
}

/// Zero the alpha of every pixel outside a radius-`r` rounded rectangle.
fn round_corners(img: &mut RgbaImage, radius: u32) {
    let (w, h) = img.dimensions();
    let r = radius.min(w / 2).min(h / 2);
    if r == 0 {
        return;
    }
    let rr = (r as f64) * (r as f64);
    for dy in 0..r {
        for dx in 0..r {
            // Distance from the corner-circle center, at pixel centers.
            let fx = r as f64 - (dx as f64 + 0.5);
            let fy = r as f64 - (dy as f64 + 0.5);
            if fx * fx + fy * fy > rr {
                for (x, y) in [
                    (dx, dy),
                    (w - 1 - dx, dy),
                    (dx, h - 1 - dy),
                    (w - 1 - dx, h - 1 - dy),
                ] {
                    img.get_pixel_mut(x, y).0[3] = 0;
                }
            }
        }
    }
}

/// Whether `path` has a supported output extension.
pub fn is_supported_output(path: &Path) -> bool {
    path.extension()
        .and_then(std::ffi::OsStr::to_str)
        .is_some_and(|ext| OUTPUT_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
}

/// Encode the composited canvas at `path`, format inferred from the
/// extension. JPEG has no alpha channel, so the canvas is flattened first
/// (the background color is already composited in).
pub fn save(canvas: &RgbaImage, path: &Path) -> Result<(), MergeError> {
    if !is_supported_output(path) {
        return Err(MergeError::UnsupportedOutput {
            path: path.to_path_buf(),
        });
    }
    let format = ImageFormat::from_path(path).map_err(|_| MergeError::UnsupportedOutput {
        path: path.to_path_buf(),
    })?;

    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(canvas.clone()).to_rgb8().save(path),
        _ => canvas.save(path),
    };
    result.map_err(|source| MergeError::Encode {
        path: path.to_path_buf(),
        source,
    })
}
