use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    shaper::{alpha_multiplier, composite_alpha, wave_progress},
    Bounds, DirtyRect, Frame, Result, Rgba, StrokeRole, StrokeStyle, StyleConfig, WaveShaper,
    WaveStroke, DEFAULT_LEVEL,
};

/// Receives the region that changed after every published frame.
pub trait RedrawListener: Send {
    fn redraw_requested(&self, rect: DirtyRect);
}

impl<F> RedrawListener for F
where
    F: Fn(DirtyRect) + Send,
{
    fn redraw_requested(&self, rect: DirtyRect) {
        self(rect)
    }
}

/// Owns the session state and publishes a fresh [`Frame`] on every level
/// update. Drawing surfaces read the published frame through
/// [`VisualizationEngine::render`] or a [`FrameHandle`].
pub struct VisualizationEngine {
    style: StyleConfig,
    shaper: WaveShaper,
    level: f32,
    amplitude: f32,
    phase: f32,
    bounds: Bounds,
    sequence: u64,
    published: Arc<Mutex<Arc<Frame>>>,
    listener: Option<Box<dyn RedrawListener>>,
}

impl VisualizationEngine {
    /// Creates an engine with zero-sized bounds.
    pub fn new(style: StyleConfig) -> Result<Self> {
        Self::with_bounds(style, Bounds::default())
    }

    /// Creates an engine drawing into `bounds`. Fails if `style` is invalid.
    pub fn with_bounds(style: StyleConfig, bounds: Bounds) -> Result<Self> {
        style.validate()?;
        let bounds = sanitize_bounds(bounds);
        let blank = blank_frame(&style, bounds);
        Ok(Self {
            shaper: WaveShaper::from_style(&style),
            level: DEFAULT_LEVEL,
            amplitude: DEFAULT_LEVEL.max(style.idle_amplitude),
            phase: 0.0,
            bounds,
            sequence: 0,
            published: Arc::new(Mutex::new(Arc::new(blank))),
            listener: None,
            style,
        })
    }

    /// The style frames are currently built with.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Last level passed to [`Self::set_level`], not the derived amplitude.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// `max(level, idle_amplitude)` as of the last update.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Phase accumulated over all updates so far.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Bounds the next recomputation will use.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Installs the listener told about every redraw rectangle, replacing
    /// any previous one.
    pub fn set_listener<L>(&mut self, listener: L)
    where
        L: RedrawListener + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Removes the listener; hints are then only returned from
    /// [`Self::set_level`].
    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Returns a cheap, thread-safe reader for the published frame.
    pub fn handle(&self) -> FrameHandle {
        FrameHandle::new(self.published.clone())
    }

    /// Records the new drawable size.
    ///
    /// The published frame is not recomputed; it keeps the old geometry until
    /// the next [`Self::set_level`]. Negative or non-finite sizes are treated
    /// as zero.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds = sanitize_bounds(Bounds::new(width, height));
    }

    /// Advances the phase, recomputes every wave back to front and swaps the
    /// result in as the published frame. Returns the rectangle covering all
    /// emitted points, or `None` when the bounds are degenerate.
    pub fn set_level(&mut self, level: f32) -> Option<DirtyRect> {
        self.level = level;
        self.phase += self.style.phase_shift;
        self.amplitude = level.max(self.style.idle_amplitude);
        tracing::debug!(
            level,
            amplitude = self.amplitude,
            phase = self.phase,
            waves = self.style.number_of_waves,
            "recomputing frame"
        );

        self.recompute()
    }

    /// Replaces the style and republishes the current level with it. The
    /// phase is left untouched.
    pub fn restyle(&mut self, style: StyleConfig) -> Result<()> {
        style.validate()?;
        tracing::info!(waves = style.number_of_waves, "applying new style");
        self.shaper = WaveShaper::from_style(&style);
        self.amplitude = self.level.max(style.idle_amplitude);
        self.style = style;

        self.recompute();
        Ok(())
    }

    /// The most recently published frame. Never blocks on recomputation.
    pub fn render(&self) -> Arc<Frame> {
        lock_frame(&self.published).clone()
    }

    fn recompute(&mut self) -> Option<DirtyRect> {
        self.sequence += 1;
        let frame = self.compute_frame();
        let dirty = frame.dirty_rect();
        // Swap under the lock; the previous frame is released outside it.
        let previous = std::mem::replace(&mut *lock_frame(&self.published), Arc::new(frame));
        drop(previous);

        if let (Some(rect), Some(listener)) = (dirty, self.listener.as_ref()) {
            listener.redraw_requested(rect);
        }
        dirty
    }

    fn compute_frame(&self) -> Frame {
        let count = self.style.number_of_waves;
        let mut waves = Vec::with_capacity(count);
        for index in (0..count).rev() {
            let (role, width, base) = base_stroke(&self.style, index);
            let shape = self
                .shaper
                .shape(index, count, self.amplitude, self.phase, self.bounds, width);
            tracing::trace!(
                index,
                points = shape.points.len(),
                alpha_multiplier = shape.alpha_multiplier,
                "shaped wave"
            );
            let color = composite_alpha(base, shape.alpha_multiplier);
            waves.push(WaveStroke {
                index,
                points: shape.points,
                style: StrokeStyle::new(role, width, color, shape.alpha_multiplier)
                    .with_line(self.style.line_join, self.style.line_cap),
            });
        }

        Frame {
            sequence: self.sequence,
            bounds: self.bounds,
            waves,
        }
    }
}

impl std::fmt::Debug for VisualizationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualizationEngine")
            .field("style", &self.style)
            .field("level", &self.level)
            .field("amplitude", &self.amplitude)
            .field("phase", &self.phase)
            .field("bounds", &self.bounds)
            .field("sequence", &self.sequence)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Shared, thread-safe view over the frame published by a
/// [`VisualizationEngine`].
#[derive(Clone)]
pub struct FrameHandle {
    shared: Arc<Mutex<Arc<Frame>>>,
}

impl FrameHandle {
    pub(crate) fn new(shared: Arc<Mutex<Arc<Frame>>>) -> Self {
        Self { shared }
    }

    /// Returns the current frame. The lock is only held for the pointer copy.
    pub fn render(&self) -> Arc<Frame> {
        lock_frame(&self.shared).clone()
    }
}

impl std::fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHandle").finish()
    }
}

// The guarded value is a single pointer, so a poisoned lock cannot hold a
// torn frame.
fn lock_frame(shared: &Mutex<Arc<Frame>>) -> MutexGuard<'_, Arc<Frame>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn base_stroke(style: &StyleConfig, index: usize) -> (StrokeRole, f32, Rgba) {
    if index == 0 {
        (
            StrokeRole::Primary,
            style.primary_stroke_width,
            style.primary_color,
        )
    } else {
        (
            StrokeRole::Secondary,
            style.secondary_stroke_width,
            style.secondary_color,
        )
    }
}

fn blank_frame(style: &StyleConfig, bounds: Bounds) -> Frame {
    let count = style.number_of_waves;
    let waves = (0..count)
        .rev()
        .map(|index| {
            let (role, width, base) = base_stroke(style, index);
            let multiplier = alpha_multiplier(wave_progress(index, count));
            WaveStroke {
                index,
                points: Vec::new(),
                style: StrokeStyle::new(role, width, composite_alpha(base, multiplier), multiplier)
                    .with_line(style.line_join, style.line_cap),
            }
        })
        .collect();

    Frame {
        sequence: 0,
        bounds,
        waves,
    }
}

fn sanitize_bounds(bounds: Bounds) -> Bounds {
    let clamp = |value: f32| if value.is_finite() && value > 0.0 { value } else { 0.0 };
    let sanitized = Bounds::new(clamp(bounds.width), clamp(bounds.height));
    let suspicious = |value: f32| !value.is_finite() || value < 0.0;
    if suspicious(bounds.width) || suspicious(bounds.height) {
        tracing::warn!(
            width = bounds.width,
            height = bounds.height,
            "invalid drawable bounds, treating as empty"
        );
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::{LineCap, LineJoin, VisualiserError, MAX_POINTS_PER_WAVE, MIN_DENSITY};

    fn engine(width: f32, height: f32) -> VisualizationEngine {
        VisualizationEngine::with_bounds(StyleConfig::default(), Bounds::new(width, height))
            .unwrap()
    }

    #[test]
    fn starts_at_default_level_with_blank_frame() {
        let engine = engine(300.0, 100.0);
        assert_eq!(engine.level(), DEFAULT_LEVEL);
        assert_eq!(engine.phase(), 0.0);

        let frame = engine.render();
        assert_eq!(frame.sequence, 0);
        assert_eq!(frame.len(), 5);
        assert!(frame.points().next().is_none());
    }

    #[test]
    fn rejects_invalid_style_at_construction() {
        let style = StyleConfig {
            number_of_waves: 0,
            ..StyleConfig::default()
        };
        let err = VisualizationEngine::new(style).unwrap_err();
        assert!(matches!(err, VisualiserError::InvalidStyle(_)));
    }

    #[test]
    fn amplitude_is_floored_by_idle_amplitude() {
        let mut engine = engine(300.0, 100.0);
        for level in [0.0, 0.005, 0.01, 0.3, 1.0] {
            engine.set_level(level);
            assert_eq!(engine.level(), level);
            assert_eq!(engine.amplitude(), level.max(0.01));
        }
    }

    #[test]
    fn frame_is_ordered_back_to_front() {
        let mut engine = engine(300.0, 100.0);
        engine.set_level(0.8);
        let frame = engine.render();

        let indices: Vec<usize> = frame.waves.iter().map(|wave| wave.index).collect();
        assert_eq!(indices, vec![4, 3, 2, 1, 0]);

        let front = frame.front().unwrap();
        assert_eq!(front.style.role, StrokeRole::Primary);
        assert_eq!(front.style.width, 3.0);
        assert_eq!(front.style.color, StyleConfig::default().primary_color);
        for wave in &frame.waves[..4] {
            assert_eq!(wave.style.role, StrokeRole::Secondary);
            assert_eq!(wave.style.width, 1.0);
            assert!(wave.style.color.a < 255);
        }
    }

    #[test]
    fn each_wave_gets_its_own_alpha() {
        let mut engine = engine(300.0, 100.0);
        engine.set_level(0.8);
        let frame = engine.render();

        let expected = [(0, 255), (1, 221), (2, 187), (3, 153), (4, 119)];
        for (index, alpha) in expected {
            let wave = frame.wave(index).unwrap();
            assert_eq!(wave.index, index);
            assert_eq!(wave.style.color.a, alpha, "wave {index}");
        }
        assert_eq!(engine.render().waves[0].style.color.a, 119);
    }

    #[test]
    fn blank_frame_carries_composited_alpha() {
        let frame = engine(300.0, 100.0).render();
        let alphas: Vec<u8> = frame.waves.iter().map(|wave| wave.style.color.a).collect();
        assert_eq!(alphas, vec![119, 153, 187, 221, 255]);
    }

    #[test]
    fn strokes_use_configured_join_and_cap() {
        let style = StyleConfig {
            line_join: LineJoin::Miter,
            line_cap: LineCap::Butt,
            ..StyleConfig::default()
        };
        let mut engine =
            VisualizationEngine::with_bounds(style, Bounds::new(300.0, 100.0)).unwrap();
        assert!(engine.render().waves.iter().all(|wave| wave.style.join == LineJoin::Miter));

        engine.set_level(0.5);
        for wave in &engine.render().waves {
            assert_eq!(wave.style.join, LineJoin::Miter);
            assert_eq!(wave.style.cap, LineCap::Butt);
            assert_eq!(wave.style.miter_limit, 10.0);
        }
    }

    #[test]
    fn tiny_density_is_rejected_before_shaping() {
        let style = StyleConfig {
            density: 1e-30,
            ..StyleConfig::default()
        };
        let err = VisualizationEngine::with_bounds(style, Bounds::new(300.0, 100.0)).unwrap_err();
        assert!(matches!(err, VisualiserError::InvalidStyle(_)));
    }

    #[test]
    fn smallest_density_finishes_with_capped_waves() {
        let style = StyleConfig {
            density: MIN_DENSITY,
            ..StyleConfig::default()
        };
        let mut engine =
            VisualizationEngine::with_bounds(style, Bounds::new(300.0, 100.0)).unwrap();
        assert!(engine.set_level(0.5).is_some());
        for wave in &engine.render().waves {
            assert_eq!(wave.points.len(), MAX_POINTS_PER_WAVE);
        }
    }

    #[test]
    fn render_is_idempotent_between_updates() {
        let mut engine = engine(300.0, 100.0);
        engine.set_level(0.4);
        let first = engine.render();
        let second = engine.render();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn resize_leaves_published_frame_stale() {
        let mut engine = engine(300.0, 100.0);
        engine.set_level(0.5);
        engine.resize(600.0, 200.0);

        let stale = engine.render();
        assert_eq!(stale.bounds, Bounds::new(300.0, 100.0));

        engine.set_level(0.5);
        assert_eq!(engine.render().bounds, Bounds::new(600.0, 200.0));
    }

    #[test]
    fn invalid_bounds_are_treated_as_empty() {
        let mut engine = engine(300.0, 100.0);
        engine.resize(-10.0, f32::NAN);
        assert_eq!(engine.bounds(), Bounds::new(0.0, 0.0));
        assert!(engine.set_level(0.5).is_none());
        assert!(engine.render().waves.iter().all(|wave| wave.points.is_empty()));
    }

    #[test]
    fn listener_receives_dirty_rect() {
        let (tx, rx) = mpsc::channel();
        let mut engine = engine(300.0, 100.0);
        engine.set_listener(move |rect: DirtyRect| {
            let _ = tx.send(rect);
        });

        let returned = engine.set_level(0.6).unwrap();
        assert_eq!(rx.try_recv().unwrap(), returned);
    }

    #[test]
    fn cleared_listener_hears_nothing() {
        let (tx, rx) = mpsc::channel();
        let mut engine = engine(300.0, 100.0);
        engine.set_listener(move |rect: DirtyRect| {
            let _ = tx.send(rect);
        });
        engine.clear_listener();

        assert!(engine.set_level(0.6).is_some());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn listener_is_silent_for_degenerate_bounds() {
        let (tx, rx) = mpsc::channel();
        let mut engine = engine(0.0, 100.0);
        engine.set_listener(move |rect: DirtyRect| {
            let _ = tx.send(rect);
        });

        assert!(engine.set_level(0.6).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn restyle_republishes_with_new_wave_count() {
        let mut engine = engine(300.0, 100.0);
        engine.set_level(0.7);
        let phase = engine.phase();

        let style = StyleConfig {
            number_of_waves: 2,
            ..StyleConfig::default()
        };
        engine.restyle(style).unwrap();

        let frame = engine.render();
        assert_eq!(frame.len(), 2);
        assert_eq!(engine.phase(), phase);
        assert!(frame.points().next().is_some());
    }

    #[test]
    fn restyle_keeps_old_style_on_error() {
        let mut engine = engine(300.0, 100.0);
        let style = StyleConfig {
            density: 0.0,
            ..StyleConfig::default()
        };
        assert!(engine.restyle(style).is_err());
        assert_eq!(engine.style(), &StyleConfig::default());
    }
}
