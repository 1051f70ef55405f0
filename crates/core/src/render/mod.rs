use serde::{Deserialize, Serialize};

use crate::Rgba;

/// Drawable size in pixels, as reported by the host surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    /// Creates bounds of `width` by `height` pixels.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when there is no area to draw into.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Creates a point at pixel coordinates `(x, y)`.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Which base style of the [`crate::StyleConfig`] a stroke was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrokeRole {
    /// Frontmost wave.
    Primary,
    Secondary,
}

/// Shape drawn where two segments of a polyline meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

/// Shape drawn at both ends of a polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

/// Stroke parameters for one wave of one frame. Built fresh for every frame,
/// never shared with the style it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub role: StrokeRole,
    pub width: f32,
    /// Base colour with the falloff already applied to its alpha channel.
    pub color: Rgba,
    pub alpha_multiplier: f32,
    pub join: LineJoin,
    pub cap: LineCap,
    pub miter_limit: f32,
}

impl StrokeStyle {
    /// Creates a round-joined, round-capped stroke with miter limit 10.
    pub fn new(role: StrokeRole, width: f32, color: Rgba, alpha_multiplier: f32) -> Self {
        Self {
            role,
            width,
            color,
            alpha_multiplier,
            join: LineJoin::Round,
            cap: LineCap::Round,
            miter_limit: 10.0,
        }
    }

    /// Replaces the join and cap.
    pub fn with_line(self, join: LineJoin, cap: LineCap) -> Self {
        Self { join, cap, ..self }
    }
}

/// One polyline of the frame together with the style it is stroked with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveStroke {
    /// Logical wave index; 0 is the frontmost wave.
    pub index: usize,
    pub points: Vec<Point>,
    pub style: StrokeStyle,
}

/// Ready-to-draw snapshot of every wave. Published frames are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// 0 for the blank frame, then incremented on every level update.
    pub sequence: u64,
    pub bounds: Bounds,
    /// Strokes in draw order: the backmost wave first, wave 0 last.
    pub waves: Vec<WaveStroke>,
}

impl Frame {
    /// Number of strokes, one per wave.
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Looks up a stroke by logical wave index.
    pub fn wave(&self, index: usize) -> Option<&WaveStroke> {
        let count = self.waves.len();
        if index >= count {
            return None;
        }
        self.waves.get(count - 1 - index)
    }

    /// The frontmost stroke, wave 0, which is drawn last.
    pub fn front(&self) -> Option<&WaveStroke> {
        self.waves.last()
    }

    /// Iterates over all points of all strokes in draw order.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.waves.iter().flat_map(|wave| wave.points.iter())
    }

    /// Smallest integer rectangle covering every emitted point, if any.
    pub fn dirty_rect(&self) -> Option<DirtyRect> {
        DirtyRect::round_out(self.points())
    }
}

/// Integer pixel rectangle the host should redisplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirtyRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl DirtyRect {
    /// Expands the real-valued bounding box of `points` outwards to whole
    /// pixels. Returns `None` when there are no points.
    pub fn round_out<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in iter {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Some(Self {
            left: min_x.floor() as i32,
            top: min_y.floor() as i32,
            right: max_x.ceil() as i32,
            bottom: max_y.ceil() as i32,
        })
    }

    /// Horizontal extent in pixels.
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Vertical extent in pixels.
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}
