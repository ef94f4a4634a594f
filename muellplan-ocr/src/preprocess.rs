//! Image enhancement applied to a cell before it is handed to the recognizer.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use muellplan_core::config::PreprocessConfig;
use tracing::debug;

use crate::grid::compute_bounds;

/// Largest pixel count an upscaled cell may have.
const MAX_UPSCALED_PIXELS: u64 = 1 << 26;

#[derive(Debug, Clone, Copy, Default)]
/// Grayscale conversion, contrast equalization, denoising and upscaling.
pub struct Preprocessor {
    settings: PreprocessConfig,
}

impl Preprocessor {
    /// Creates a preprocessor with the given parameters.
    #[must_use]
    pub const fn new(settings: PreprocessConfig) -> Self {
        Self { settings }
    }

    /// Runs the full chain on one cell image.
    #[must_use]
    pub fn apply(&self, cell: &DynamicImage) -> GrayImage {
        let gray = cell.to_luma8();
        let equalized = equalize_contrast(
            &gray,
            self.settings.clahe_clip_limit,
            self.settings.clahe_tiles,
        );
        let denoised = denoise(
            &equalized,
            self.settings.bilateral_diameter,
            self.settings.bilateral_sigma_color,
            self.settings.bilateral_sigma_space,
        );
        upscale(&denoised, self.settings.upscale)
    }
}

/// Contrast limited adaptive histogram equalization over a `tiles × tiles` grid.
///
/// Each tile gets its own clipped histogram mapping and every pixel is
/// bilinearly interpolated between the mappings of its four nearest tiles.
/// A tile count of `0` returns the image unchanged.
#[must_use]
pub fn equalize_contrast(image: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if tiles == 0 || width == 0 || height == 0 {
        return image.clone();
    }
    let tiles_x = tiles.min(width);
    let tiles_y = tiles.min(height);
    let col_bounds = compute_bounds(width, tiles_x);
    let row_bounds = compute_bounds(height, tiles_y);

    let mut luts = Vec::new();
    for rows in row_bounds.windows(2) {
        let mut lut_row = Vec::new();
        for cols in col_bounds.windows(2) {
            if let (&[left, right], &[top, bottom]) = (cols, rows) {
                lut_row.push(tile_mapping(image, (left, right), (top, bottom), clip_limit));
            }
        }
        luts.push(lut_row);
    }

    GrayImage::from_fn(width, height, |col, row| {
        let value = image.get_pixel(col, row).0[0];
        let (left, right, x_weight) = neighbours(col, width, tiles_x);
        let (upper, lower, y_weight) = neighbours(row, height, tiles_y);
        let lookup = |tile_row: usize, tile_col: usize| {
            luts.get(tile_row)
                .and_then(|lut_row| lut_row.get(tile_col))
                .and_then(|lut| lut.get(usize::from(value)))
                .map_or(f64::from(value), |mapped| f64::from(*mapped))
        };
        let top = lookup(upper, left) * (1.0 - x_weight) + lookup(upper, right) * x_weight;
        let bottom = lookup(lower, left) * (1.0 - x_weight) + lookup(lower, right) * x_weight;
        Luma([to_pixel(top * (1.0 - y_weight) + bottom * y_weight)])
    })
}

fn tile_mapping(
    image: &GrayImage,
    (left, right): (u32, u32),
    (top, bottom): (u32, u32),
    clip_limit: f32,
) -> [u8; 256] {
    let mut histogram = [0_u64; 256];
    for row in top..bottom {
        for col in left..right {
            if let Some(bin) = histogram.get_mut(usize::from(image.get_pixel(col, row).0[0])) {
                *bin += 1;
            }
        }
    }
    let area = u64::from(right - left) * u64::from(bottom - top);

    if clip_limit > 0.0 {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss,
            reason = "clip value is a small positive bin count"
        )]
        let clip = ((f64::from(clip_limit) * area as f64 / 256.0) as u64).max(1);
        let mut excess = 0;
        for bin in &mut histogram {
            if *bin > clip {
                excess += *bin - clip;
                *bin = clip;
            }
        }
        let bonus = excess / 256;
        let residual = excess - bonus * 256;
        for (index, bin) in (0_u64..).zip(histogram.iter_mut()) {
            *bin += bonus + u64::from(index < residual);
        }
    }

    let mut mapping = [0_u8; 256];
    let mut cumulative = 0;
    for (target, count) in mapping.iter_mut().zip(histogram) {
        cumulative += count;
        *target = u8::try_from((cumulative * 255 + area / 2) / area.max(1)).unwrap_or(u8::MAX);
    }
    mapping
}

/// Indices of the two tiles around `position` and the weight of the second one.
fn neighbours(position: u32, extent: u32, tiles: u32) -> (usize, usize, f64) {
    let scaled = (f64::from(position) + 0.5) * f64::from(tiles) / f64::from(extent) - 0.5;
    let lower = scaled.floor();
    let last = f64::from(tiles.saturating_sub(1));
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "indices are clamped to the tile range"
    )]
    let index = |tile: f64| tile.clamp(0.0, last) as usize;
    (index(lower), index(lower + 1.0), scaled - lower)
}

/// Edge preserving bilateral filter with a circular window of `diameter` pixels.
///
/// A diameter of `0` returns the image unchanged.
#[must_use]
pub fn denoise(
    image: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    let (width, height) = image.dimensions();
    if diameter == 0 || width == 0 || height == 0 {
        return image.clone();
    }
    let radius = i32::try_from(diameter / 2).unwrap_or(i32::MAX);
    let color_coeff = -0.5 / positive_sigma(sigma_color).powi(2);
    let space_coeff = -0.5 / positive_sigma(sigma_space).powi(2);

    let kernel: Vec<(i32, i32, f64)> = (-radius..=radius)
        .flat_map(|dy| (-radius..=radius).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx * dx + dy * dy <= radius * radius)
        .map(|(dx, dy)| (dx, dy, (f64::from(dx * dx + dy * dy) * space_coeff).exp()))
        .collect();
    let color_weights: Vec<f64> = (0_u8..=u8::MAX)
        .map(|diff| (f64::from(diff).powi(2) * color_coeff).exp())
        .collect();

    GrayImage::from_fn(width, height, |col, row| {
        let center = image.get_pixel(col, row).0[0];
        let mut sum = 0.0;
        let mut norm = 0.0;
        for &(dx, dy, space_weight) in &kernel {
            let (Some(sample_col), Some(sample_row)) =
                (col.checked_add_signed(dx), row.checked_add_signed(dy))
            else {
                continue;
            };
            if sample_col >= width || sample_row >= height {
                continue;
            }
            let sample = image.get_pixel(sample_col, sample_row).0[0];
            let color_weight = color_weights
                .get(usize::from(center.abs_diff(sample)))
                .copied()
                .unwrap_or(0.0);
            let weight = space_weight * color_weight;
            sum += weight * f64::from(sample);
            norm += weight;
        }
        if norm > 0.0 {
            Luma([to_pixel(sum / norm)])
        } else {
            Luma([center])
        }
    })
}

fn positive_sigma(sigma: f32) -> f64 {
    if sigma > 0.0 { f64::from(sigma) } else { 1.0 }
}

/// Enlarges the image by `factor` with bicubic interpolation.
///
/// Falls back to the unscaled image if the target size is empty or too large.
#[must_use]
pub fn upscale(image: &GrayImage, factor: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if factor <= 1 {
        return image.clone();
    }
    match (width.checked_mul(factor), height.checked_mul(factor)) {
        (Some(target_width), Some(target_height))
            if target_width > 0
                && target_height > 0
                && u64::from(target_width) * u64::from(target_height) <= MAX_UPSCALED_PIXELS =>
        {
            imageops::resize(image, target_width, target_height, FilterType::CatmullRom)
        }
        _ => {
            debug!(width, height, factor, "skipping upscale");
            image.clone()
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to the pixel range"
)]
fn to_pixel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
