// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parity of whole frames, rebuilt from the bytes the driver uploaded.

use std::time::Duration;

use glyphfill::primitives::{CURVE_CONTROL_UV, CURVE_END_UV, CURVE_START_UV};
use glyphfill::{builtin, Animation, BufferConfig, FrameDriver, Glyph, GlyphSet};
use glyphfill_tests::{RecordingTarget, Submitted};

/// Draws a single frame of `glyph` at a fixed scale.
fn render(glyph: Glyph, scale: f32, aspect_ratio: Option<f32>) -> Submitted {
    let glyphs = GlyphSet::new(vec![glyph]).unwrap();
    let animation = Animation {
        display_duration: Duration::from_secs(1),
        base_scale: scale,
        max_scale: scale,
    };
    let mut driver = FrameDriver::new(&glyphs, animation, BufferConfig::default());
    driver.set_aspect_ratio(aspect_ratio);
    let mut target = RecordingTarget::new();
    driver.frame(Duration::ZERO, &mut target).unwrap();
    driver.finish(&mut target).unwrap();
    target.frames.pop().unwrap()
}

#[test]
fn ring_parity_through_the_driver() {
    let frame = render(builtin::ring().unwrap(), 1.0, None);
    let model = frame.stencil_model().unwrap();
    // 8 curve triangles, then 4 fan triangles per contour.
    assert_eq!(model.triangle_count(), 16);

    // Between the two chord polygons.
    assert!(model.is_inside([0.6, 0.05]));
    // Between the outer chord and the outer arc.
    assert!(model.is_inside([0.5, 0.5]));
    // Beyond the outer arc, though inside its curve triangle.
    assert!(!model.is_inside([0.65, 0.65]));
    // The hole.
    assert!(!model.is_inside([0.05, 0.02]));
    assert!(!model.is_inside([-0.95, 0.9]));
}

#[test]
fn smaller_scale_shrinks_the_fill() {
    let frame = render(builtin::circle().unwrap(), 0.5, None);
    let model = frame.stencil_model().unwrap();
    assert!(model.is_inside([0.0, 0.0]));
    assert!(model.is_inside([0.25, -0.05]));
    // Inside the circle at full scale, outside at half.
    assert!(!model.is_inside([0.6, 0.05]));
}

#[test]
fn wide_surface_narrows_the_glyph() {
    let frame = render(builtin::circle().unwrap(), 1.0, Some(2.0));
    let model = frame.stencil_model().unwrap();
    assert!(model.is_inside([0.05, 0.6]));
    assert!(!model.is_inside([0.6, 0.05]));
    for segment in frame.segments() {
        for vertex in segment.vertices() {
            assert!(vertex.pos[0].abs() <= 0.5);
        }
    }
}

#[test]
fn two_segment_contour_at_small_scale() {
    // A lens spanning the whole box, from the bottom-left to the top-right corner and back.
    let glyph = Glyph::from_raw(
        "lens",
        [0., 0., 100., 100.],
        [vec![0., 0., 100., 0., 100., 100., 0., 100., 0., 0.]],
    )
    .unwrap();
    let frame = render(glyph, 0.1, None);

    let segments = frame.segments();
    assert_eq!(segments.len(), 2);
    for segment in &segments {
        let [p0, p1, p2] = segment.vertices();
        assert_eq!([p0.uv, p1.uv, p2.uv], [CURVE_START_UV, CURVE_CONTROL_UV, CURVE_END_UV]);
        for vertex in [p0, p1, p2] {
            assert!(vertex.pos[0].abs() <= 0.1);
            assert!(vertex.pos[1].abs() <= 0.1);
        }
    }
    // Font y points up, device y points down after the flip.
    assert_eq!(segments[0].p0.pos, [-0.1, 0.1, 0.0]);
    assert_eq!(segments[0].p1.pos, [0.1, 0.1, 0.0]);
    assert_eq!(segments[0].p2.pos, [0.1, -0.1, 0.0]);
    assert_eq!(segments[1].p2.pos, segments[0].p0.pos);

    // Pivot, both anchors, then the first anchor again.
    let fan: Vec<_> = frame.fan_vertices().iter().map(|v| v.pos).collect();
    assert_eq!(
        fan,
        [
            [-1.0, -1.0, 0.0],
            [-0.1, 0.1, 0.0],
            [0.1, -0.1, 0.0],
            [-0.1, 0.1, 0.0],
        ]
    );
    assert_eq!(frame.fan_draws(), [0..4]);

    // The lens covers the area between its two arcs.
    let model = frame.stencil_model().unwrap();
    assert!(model.is_inside([0.03, 0.03]));
    assert!(model.is_inside([-0.03, -0.03]));
    assert!(model.is_inside([0.05, 0.02]));
    assert!(!model.is_inside([0.2, 0.2]));
}

#[test]
fn depth_reaches_every_vertex() {
    let glyphs = GlyphSet::new(vec![builtin::ring().unwrap()]).unwrap();
    let mut driver = FrameDriver::new(&glyphs, Animation::default(), BufferConfig::default());
    driver.set_depth(0.5);
    let mut target = RecordingTarget::new();
    driver.frame(Duration::ZERO, &mut target).unwrap();

    let frame = &target.frames[0];
    let segments = frame.segments();
    assert_eq!(segments.len(), 8);
    for segment in &segments {
        assert!(segment.vertices().iter().all(|v| v.pos[2] == 0.5));
    }
    assert!(frame.fan_vertices().iter().all(|v| v.pos[2] == 0.5));
    // Depth doesn't change which points are covered.
    assert!(frame.stencil_model().unwrap().is_inside([0.06, 0.002]));
}
