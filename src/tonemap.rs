//! Compression of the accumulated HDR buffer into 8-bit RGB.

use image::{Rgb, RgbImage};
use log::debug;

use crate::canvas::Canvas;

/// The observed range of written values in channel 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    /// Scan the written pixels of `canvas`, or `None` when nothing was written.
    pub fn of(canvas: &Canvas) -> Option<Self> {
        canvas.pixels().flatten().fold(None, |range, color| {
            let v = color.r;
            Some(match range {
                None => Range { min: v, max: v },
                Some(Range { min, max }) => Range {
                    min: min.min(v),
                    max: max.max(v),
                },
            })
        })
    }

    pub fn dif(&self) -> f32 {
        self.max - self.min
    }
}

/// Logarithmic tone mapping: `log2((v - min) / (max - min) + 1)` scaled to a byte.
///
/// The grayscale value of channel 0 is replicated across RGB. Pixels that were never written are
/// black, and a buffer without any spread encodes as all black.
pub fn log_tonemap(canvas: &Canvas) -> RgbImage {
    let mut out = RgbImage::new(canvas.width(), canvas.height());

    let range = match Range::of(canvas) {
        Some(range) if range.dif() > 0. => range,
        _ => {
            debug!("accumulated buffer has no dynamic range, emitting a black image");
            return out;
        }
    };

    let dif = range.dif();
    for (pixel, color) in out.pixels_mut().zip(canvas.pixels()) {
        if let Some(color) = color {
            let norm = ((color.r - range.min) / dif + 1.).log2();
            let byte = (norm * 255.).clamp(0., 255.).round() as u8;
            *pixel = Rgb([byte, byte, byte]);
        }
    }

    out
}

/// Linear normalization by the brightest channel value, for buffers that are non-negative and
/// unbounded above.
pub fn max_normalize(canvas: &Canvas) -> RgbImage {
    let mut out = RgbImage::new(canvas.width(), canvas.height());

    let max = canvas
        .pixels()
        .flatten()
        .flat_map(|color| color.channels())
        .fold(0f32, f32::max);
    let max = if max == 0. { 1. } else { max };

    for (pixel, color) in out.pixels_mut().zip(canvas.pixels()) {
        if let Some(color) = color {
            let convert = |v: f32| (v / max * 255.).clamp(0., 255.) as u8;
            let [r, g, b] = color.channels();
            *pixel = Rgb([convert(r), convert(g), convert(b)]);
        }
    }

    out
}
