//! Gamma-aware resampling.
//!
//! Filtering display-encoded sRGB values directly blends colors in a
//! non-linear space and produces halos and darkened edges at sharp
//! boundaries. The resampler decodes color channels to linear light,
//! filters there, and re-encodes afterwards. Alpha carries no gamma and is
//! filtered in its original range.

use image::imageops::FilterType;
use image::{imageops, Rgba32FImage, RgbaImage};

/// sRGB display encoding to linear light, both in [0, 1].
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Linear light back to sRGB display encoding, both in [0, 1].
pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Resize with Lanczos filtering in linear-light space.
///
/// The float resampler clamps accumulated samples into [0, 1], so filter
/// overshoot cannot wrap when the result is re-encoded to 8-bit.
pub fn resize_gamma_aware(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut linear = Rgba32FImage::new(src.width(), src.height());
    for (src_px, dst_px) in src.pixels().zip(linear.pixels_mut()) {
        let [r, g, b, a] = src_px.0;
        dst_px.0 = [
            srgb_to_linear(r as f32 / 255.0),
            srgb_to_linear(g as f32 / 255.0),
            srgb_to_linear(b as f32 / 255.0),
            a as f32 / 255.0,
        ];
    }

    let resized = imageops::resize(&linear, width, height, FilterType::Lanczos3);

    let mut out = RgbaImage::new(width, height);
    for (src_px, dst_px) in resized.pixels().zip(out.pixels_mut()) {
        let [r, g, b, a] = src_px.0;
        dst_px.0 = [
            encode_channel(linear_to_srgb(r)),
            encode_channel(linear_to_srgb(g)),
            encode_channel(linear_to_srgb(b)),
            encode_channel(a),
        ];
    }
    out
}

fn encode_channel(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
