// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping glyph contours from font units into render primitives.
//!
//! Each point is mapped into the `[-1, 1]` square spanned by the glyph's bounding box, scaled,
//! and flipped vertically: font coordinates are y-up while normalized device space here is
//! y-down.

use crate::glyph::{Bounds, Contour, Glyph};
use crate::primitives::{ContourPrimitives, CurveSegment, FanVertex};

/// Pivot shared by every fan.
///
/// Any point works for even-odd accumulation. A corner of the normalized square keeps the fan
/// triangles inside the viewport for any scale up to 1.
pub const FAN_PIVOT: [f32; 2] = [-1.0, -1.0];

/// Per-axis scale and compositing depth applied while normalizing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub scale_x: f32,
    pub scale_y: f32,
    /// Depth given to every emitted vertex.
    pub depth: f32,
}

impl Transform {
    /// The same scale on both axes, ignoring the target's aspect ratio.
    pub const fn uniform(scale: f32) -> Self {
        Self {
            scale_x: scale,
            scale_y: scale,
            depth: 0.0,
        }
    }

    /// Scales by `scale` and corrects for a target of `aspect_ratio` (width / height).
    ///
    /// The longer axis is compressed so that a square glyph box stays square on screen.
    pub fn new(scale: f32, aspect_ratio: f32) -> Self {
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Self::uniform(scale);
        }
        if aspect_ratio >= 1.0 {
            Self {
                scale_x: scale / aspect_ratio,
                scale_y: scale,
                depth: 0.0,
            }
        } else {
            Self {
                scale_x: scale,
                scale_y: scale * aspect_ratio,
                depth: 0.0,
            }
        }
    }

    #[must_use]
    pub const fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    /// Maps a point in font units to normalized device space.
    pub fn apply(&self, bounds: &Bounds, x: f32, y: f32) -> [f32; 3] {
        let nx = (2.0 * (x - bounds.x_min()) / bounds.width() - 1.0) * self.scale_x;
        let ny = (2.0 * (y - bounds.y_min()) / bounds.height() - 1.0) * self.scale_y;
        [nx, -ny, self.depth]
    }
}

/// Builds the curve triangles and the fill fan of one contour.
pub fn normalize_contour(
    contour: &Contour,
    bounds: &Bounds,
    transform: &Transform,
) -> ContourPrimitives {
    let segments: Vec<CurveSegment> = contour
        .segments()
        .map(|[start, control, end]| {
            CurveSegment::new(
                transform.apply(bounds, start[0], start[1]),
                transform.apply(bounds, control[0], control[1]),
                transform.apply(bounds, end[0], end[1]),
            )
        })
        .collect();

    // The fan boundary is the polygon through the on-curve anchors.
    let mut fan = Vec::with_capacity(segments.len() + 2);
    fan.push(FanVertex::new(FAN_PIVOT[0], FAN_PIVOT[1], transform.depth));
    fan.extend(segments.iter().map(|s| FanVertex { pos: s.p0.pos }));
    if let Some(first) = segments.first() {
        fan.push(FanVertex { pos: first.p0.pos });
    }

    ContourPrimitives { segments, fan }
}

/// Normalizes every contour of a glyph, in order.
pub fn normalize_glyph(glyph: &Glyph, transform: &Transform) -> Vec<ContourPrimitives> {
    glyph
        .contours()
        .iter()
        .map(|contour| normalize_contour(contour, glyph.bounds(), transform))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{CURVE_CONTROL_UV, CURVE_END_UV, CURVE_START_UV};

    fn square_glyph() -> Glyph {
        // Two segments around a square-ish outline in a 100 unit box.
        Glyph::from_raw(
            "square",
            [0., 0., 100., 100.],
            [vec![0., 0., 100., 0., 100., 100., 0., 100., 0., 0.]],
        )
        .unwrap()
    }

    #[test]
    fn corners_map_exactly() {
        let bounds = Bounds::new(0., 0., 100., 100.).unwrap();
        let t = Transform::uniform(1.0);
        assert_eq!(t.apply(&bounds, 0., 0.), [-1., 1., 0.]);
        assert_eq!(t.apply(&bounds, 100., 100.), [1., -1., 0.]);
        assert_eq!(t.apply(&bounds, 100., 0.), [1., 1., 0.]);
        assert_eq!(t.apply(&bounds, 50., 50.), [0., 0., 0.]);
    }

    #[test]
    fn small_scale_stays_in_range_and_flips_y() {
        let glyph = square_glyph();
        let contours = normalize_glyph(&glyph, &Transform::uniform(0.1));
        assert_eq!(contours.len(), 1);
        let prims = &contours[0];
        assert_eq!(prims.segments.len(), 2);
        let raw = glyph.contours()[0].coords();
        let mut raw_points = raw.chunks_exact(2);
        for (ix, segment) in prims.segments.iter().enumerate() {
            assert_eq!(segment.p0.uv, CURVE_START_UV);
            assert_eq!(segment.p1.uv, CURVE_CONTROL_UV);
            assert_eq!(segment.p2.uv, CURVE_END_UV);
            for v in segment.vertices() {
                assert!(v.pos[0].abs() <= 0.1 && v.pos[1].abs() <= 0.1);
            }
            // Font y below the box centre ends up above it.
            let start = raw_points.nth(if ix == 0 { 0 } else { 1 }).unwrap();
            let centred_y = start[1] - 50.0;
            if centred_y != 0.0 {
                assert_eq!(segment.p0.pos[1].signum(), -centred_y.signum());
            }
        }
    }

    #[test]
    fn fan_walks_the_anchors() {
        let glyph = square_glyph();
        let prims = normalize_contour(
            &glyph.contours()[0],
            glyph.bounds(),
            &Transform::uniform(0.5).with_depth(0.25),
        );
        let fan: Vec<_> = prims.fan.iter().map(|v| v.pos).collect();
        assert_eq!(
            fan,
            vec![
                [-1., -1., 0.25],
                [-0.5, 0.5, 0.25],
                [0.5, -0.5, 0.25],
                [-0.5, 0.5, 0.25],
            ]
        );
    }

    #[test]
    fn aspect_ratio_compresses_the_long_axis() {
        let wide = Transform::new(0.4, 2.0);
        assert_eq!((wide.scale_x, wide.scale_y), (0.2, 0.4));
        let tall = Transform::new(0.4, 0.5);
        assert_eq!((tall.scale_x, tall.scale_y), (0.4, 0.2));
        assert_eq!(Transform::new(0.4, 0.0), Transform::uniform(0.4));
    }
}
