use serde::{Deserialize, Serialize};

use crate::{LineCap, LineJoin, Result, VisualiserError};

/// Level a freshly constructed engine reports before the first update.
pub const DEFAULT_LEVEL: f32 = 0.5;

/// Smallest vertex spacing, in pixels, a style may ask for.
pub const MIN_DENSITY: f32 = 1e-3;

const DEFAULT_DENSITY_DP: f32 = 5.0;
const DEFAULT_PRIMARY_WIDTH_DP: f32 = 3.0;
const DEFAULT_SECONDARY_WIDTH_DP: f32 = 1.0;

/// 8-bit per channel colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Creates a colour from its four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpacks a `0xAARRGGBB` word.
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Packs the colour back into `0xAARRGGBB`.
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Returns the same colour with its alpha channel replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// Visual parameters of the wave stack. Immutable once handed to an engine;
/// use [`crate::VisualizationEngine::restyle`] to swap in a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Sine cycles across the drawable width.
    pub frequency: f32,
    /// Amplitude floor used when the incoming level is near zero.
    pub idle_amplitude: f32,
    /// Count of stacked waves; at least 1.
    pub number_of_waves: usize,
    /// Phase added on every level update.
    pub phase_shift: f32,
    /// Horizontal pixel spacing between path vertices.
    pub density: f32,
    pub primary_stroke_width: f32,
    pub secondary_stroke_width: f32,
    pub primary_color: Rgba,
    pub secondary_color: Rgba,
    /// Join and cap applied to every wave stroke.
    pub line_join: LineJoin,
    pub line_cap: LineCap,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self::for_display_scale(1.0)
    }
}

impl StyleConfig {
    /// Builds the default style with its density-independent sizes converted
    /// to pixels for a display with the given scale factor.
    pub fn for_display_scale(scale: f32) -> Self {
        Self {
            frequency: 1.5,
            idle_amplitude: 0.01,
            number_of_waves: 5,
            phase_shift: -0.15,
            density: dp_to_px(DEFAULT_DENSITY_DP, scale),
            primary_stroke_width: dp_to_px(DEFAULT_PRIMARY_WIDTH_DP, scale),
            secondary_stroke_width: dp_to_px(DEFAULT_SECONDARY_WIDTH_DP, scale),
            primary_color: Rgba::from_argb(0xFF3F_51B5),
            secondary_color: Rgba::from_argb(0xFFFF_4081),
            line_join: LineJoin::Round,
            line_cap: LineCap::Round,
        }
    }

    /// Parses a JSON preset. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let style: Self = serde_json::from_str(json)?;
        style.validate()?;
        Ok(style)
    }

    /// Checks every parameter the engine would have to draw with.
    pub fn validate(&self) -> Result<()> {
        if self.number_of_waves < 1 {
            return Err(VisualiserError::invalid_style(
                "number_of_waves must be at least 1",
            ));
        }
        if !self.density.is_finite() || self.density < MIN_DENSITY {
            return Err(VisualiserError::invalid_style(format!(
                "density must be at least {MIN_DENSITY} pixels, got {}",
                self.density
            )));
        }
        for (name, width) in [
            ("primary_stroke_width", self.primary_stroke_width),
            ("secondary_stroke_width", self.secondary_stroke_width),
        ] {
            if !width.is_finite() || width < 0.0 {
                return Err(VisualiserError::invalid_style(format!(
                    "{name} must be a non-negative number, got {width}"
                )));
            }
        }
        for (name, value) in [
            ("frequency", self.frequency),
            ("idle_amplitude", self.idle_amplitude),
            ("phase_shift", self.phase_shift),
        ] {
            if !value.is_finite() {
                return Err(VisualiserError::invalid_style(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

fn dp_to_px(dp: f32, scale: f32) -> f32 {
    (dp * scale).round()
}
