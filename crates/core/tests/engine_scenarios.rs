use std::{sync::Arc, thread};

use wave_visualiser_core::{Bounds, Frame, StrokeRole, StyleConfig, VisualizationEngine};

fn default_engine() -> VisualizationEngine {
    VisualizationEngine::with_bounds(StyleConfig::default(), Bounds::new(300.0, 100.0))
        .expect("default style is valid")
}

fn vertical_span(frame: &Frame) -> f32 {
    let (min, max) = frame
        .points()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), point| {
            (min.min(point.y), max.max(point.y))
        });
    max - min
}

#[test]
fn louder_level_spans_more_vertical_space() {
    let mut engine = default_engine();

    engine.set_level(0.0);
    let quiet = engine.render();
    engine.set_level(1.0);
    let loud = engine.render();

    assert!(vertical_span(&loud) > vertical_span(&quiet));
    assert!((engine.phase() - -0.30).abs() < 1e-6, "phase {}", engine.phase());
    assert_eq!(loud.sequence, quiet.sequence + 1);
}

#[test]
fn every_frame_has_one_stroke_per_wave() {
    let mut engine = default_engine();
    for step in 0..20 {
        engine.set_level(step as f32 * 0.05);
        let frame = engine.render();
        assert_eq!(frame.len(), 5);
        assert_eq!(frame.front().unwrap().index, 0);
        assert_eq!(frame.front().unwrap().style.role, StrokeRole::Primary);
        assert_eq!(frame.waves[0].index, 4);
    }
}

#[test]
fn redraw_hint_covers_full_width_within_height() {
    let mut engine = default_engine();
    let rect = engine.set_level(0.5).expect("non-empty bounds emit points");

    assert_eq!(rect.width(), 300);
    assert!(rect.height() <= 100);
    assert!(rect.top >= 0 && rect.bottom <= 100);
}

#[test]
fn zero_sized_bounds_render_empty_paths() {
    for bounds in [Bounds::new(0.0, 100.0), Bounds::new(300.0, 0.0)] {
        let mut engine = VisualizationEngine::with_bounds(StyleConfig::default(), bounds).unwrap();
        assert!(engine.set_level(0.7).is_none());
        let frame = engine.render();
        assert_eq!(frame.len(), 5);
        assert!(frame.waves.iter().all(|wave| wave.points.is_empty()));
    }
}

#[test]
fn identical_inputs_give_identical_frames() {
    let mut first = default_engine();
    let mut second = default_engine();
    for level in [0.2, 0.9, 0.4] {
        first.set_level(level);
        second.set_level(level);
    }
    assert_eq!(*first.render(), *second.render());
}

#[test]
fn render_thread_only_sees_complete_frames() {
    let mut engine = default_engine();
    let handle = engine.handle();

    let reader = thread::spawn(move || {
        let mut last_sequence = 0;
        for _ in 0..2_000 {
            let frame = handle.render();
            assert_eq!(frame.len(), 5);
            assert!(frame.sequence >= last_sequence);
            if frame.sequence > 0 {
                assert!(frame.waves.iter().all(|wave| wave.points.len() == 61));
            }
            last_sequence = frame.sequence;
        }
        last_sequence
    });

    for tick in 0..200 {
        engine.set_level((tick % 100) as f32 / 100.0);
    }
    let seen = reader.join().expect("reader thread panicked");
    assert!(seen <= 200);

    let latest: Arc<Frame> = engine.render();
    assert_eq!(latest.sequence, 200);
}
