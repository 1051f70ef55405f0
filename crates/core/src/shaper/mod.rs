use std::f64::consts::PI;

use crate::{Bounds, Point, Rgba, StyleConfig};

/// Upper bound on vertices emitted for a single wave. Sampling stops here
/// even if the right edge has not been reached.
pub const MAX_POINTS_PER_WAVE: usize = 1 << 16;

/// Geometry of a single wave before it is paired with a stroke style.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveShape {
    pub points: Vec<Point>,
    /// Alpha falloff in `[1/3, 1]`; 1.0 for the frontmost wave.
    pub alpha_multiplier: f32,
}

/// Pure mapping from (level, phase, wave index, bounds) to a polyline.
///
/// Only the two style parameters that affect sampling are captured; stroke
/// width is passed per call because it differs between primary and secondary
/// waves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveShaper {
    frequency: f32,
    density: f32,
}

impl WaveShaper {
    /// Creates a shaper sampling `frequency` sine cycles every `density` pixels.
    pub fn new(frequency: f32, density: f32) -> Self {
        Self { frequency, density }
    }

    /// Takes the sampling parameters from `style`.
    pub fn from_style(style: &StyleConfig) -> Self {
        Self::new(style.frequency, style.density)
    }

    /// Samples wave `index` of `count` across `bounds`.
    ///
    /// `index` 0 is the frontmost wave. Back waves get a smaller, eventually
    /// negative, amplitude factor which inverts them relative to the front.
    /// Zero-sized bounds yield no points, and at most
    /// [`MAX_POINTS_PER_WAVE`] points are emitted.
    pub fn shape(
        &self,
        index: usize,
        count: usize,
        amplitude: f32,
        phase: f32,
        bounds: Bounds,
        stroke_width: f32,
    ) -> WaveShape {
        let progress = wave_progress(index, count);
        let alpha_multiplier = alpha_multiplier(progress);

        if bounds.is_degenerate() {
            return WaveShape {
                points: Vec::new(),
                alpha_multiplier,
            };
        }

        let Bounds { width, height } = bounds;
        let half_height = height / 2.0;
        let mid = width / 2.0;
        let max_amplitude = half_height - stroke_width / 2.0;
        let normed_amplitude = (1.5 * progress - 0.5) * amplitude;
        let gain = f64::from(max_amplitude) * f64::from(normed_amplitude);

        let steps = ((width + self.density) / self.density).ceil() as usize;
        let mut points = Vec::with_capacity(steps.min(MAX_POINTS_PER_WAVE));
        let mut x = 0.0_f32;
        while x < width + self.density && points.len() < MAX_POINTS_PER_WAVE {
            // Parabolic taper: 1 at the centre, 0 at both edges.
            let scaling = 1.0 - f64::from((x - mid) / mid).powi(2);
            let angle = 2.0 * PI * f64::from(x / width) * f64::from(self.frequency)
                + f64::from(phase);
            let y = (scaling * gain * angle.sin() + f64::from(half_height)) as f32;
            points.push(Point::new(x, y));
            x += self.density;
        }

        WaveShape {
            points,
            alpha_multiplier,
        }
    }
}

/// 1.0 for the frontmost wave, approaching `1 / count` for the backmost.
pub fn wave_progress(index: usize, count: usize) -> f32 {
    1.0 - index as f32 / count as f32
}

/// Alpha falloff for a wave at `progress`, capped at 1.0.
pub fn alpha_multiplier(progress: f32) -> f32 {
    (progress / 3.0 * 2.0 + 1.0 / 3.0).min(1.0)
}

/// Scales the alpha channel of `color` by `multiplier`, keeping RGB.
///
/// The alpha is normalised to `[0, 1]`, scaled, then quantised back with
/// `floor(v * 256)` clamped to 255; exactly 1.0 maps to 255.
pub fn composite_alpha(color: Rgba, multiplier: f32) -> Rgba {
    let scaled = f32::from(color.a) / 255.0 * multiplier;
    let quantised = if scaled == 1.0 {
        255.0
    } else {
        (f64::from(scaled) * 256.0).floor()
    };
    color.with_alpha(quantised.round().clamp(0.0, 255.0) as u8)
}
