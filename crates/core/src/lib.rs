//! Core library for the Wave Visualiser.
//!
//! A [`VisualizationEngine`] maps a scalar level (conventionally `0..=1`) and
//! an accumulated phase onto a stack of tapered sine-wave polylines. Each level
//! update produces one immutable [`Frame`], which drawing surfaces read through
//! [`VisualizationEngine::render`] or a [`FrameHandle`] without recomputing it.
//! Geometry comes from [`WaveShaper`], a pure function of its inputs.

pub mod config;
pub mod engine;
pub mod error;
pub mod render;
pub mod shaper;

pub use config::{Rgba, StyleConfig, DEFAULT_LEVEL, MIN_DENSITY};
pub use engine::{FrameHandle, RedrawListener, VisualizationEngine};
pub use error::{Result, VisualiserError};
pub use render::{
    Bounds, DirtyRect, Frame, LineCap, LineJoin, Point, StrokeRole, StrokeStyle, WaveStroke,
};
pub use shaper::{composite_alpha, WaveShape, WaveShaper, MAX_POINTS_PER_WAVE};
