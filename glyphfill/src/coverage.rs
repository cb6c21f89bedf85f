// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU model of the stencil parity, for checking what the two passes will produce.
//!
//! [`StencilModel`] holds the same triangles the prepass rasterizes and evaluates, at a single
//! point, the stencil value the GPU would accumulate there. It is a verification aid for a
//! handful of sample points, not a rasterizer.

use crate::buffer::FrameLayout;
use crate::primitives::{ContourPrimitives, CurveSegment, FanVertex, FAN_VERTEX_SIZE, SEGMENT_SIZE};
use crate::stencil::{STENCIL_MASK, STENCIL_REFERENCE};

#[derive(Debug, Copy, Clone, PartialEq)]
struct Triangle {
    pos: [[f32; 2]; 3],
    /// Curve coordinates, for curve triangles.
    uv: Option<[[f32; 2]; 3]>,
}

impl Triangle {
    /// Barycentric weights of `p`, or `None` if it isn't strictly inside.
    ///
    /// Points on an edge count as outside. Degenerate triangles contain nothing.
    fn weights(&self, p: [f32; 2]) -> Option<[f32; 3]> {
        let [a, b, c] = self.pos;
        let cross = |o: [f32; 2], s: [f32; 2], t: [f32; 2]| {
            (s[0] - o[0]) * (t[1] - o[1]) - (s[1] - o[1]) * (t[0] - o[0])
        };
        let area = cross(a, b, c);
        if area == 0.0 {
            return None;
        }
        let wb = cross(a, p, c) / area;
        let wc = cross(a, b, p) / area;
        let wa = 1.0 - wb - wc;
        (wa > 0.0 && wb > 0.0 && wc > 0.0).then_some([wa, wb, wc])
    }

    /// Whether a fragment at `p` would invert the stencil.
    fn contributes(&self, p: [f32; 2]) -> bool {
        let Some(w) = self.weights(p) else {
            return false;
        };
        match self.uv {
            None => true,
            Some(uv) => {
                let u = w[0] * uv[0][0] + w[1] * uv[1][0] + w[2] * uv[2][0];
                let v = w[0] * uv[0][1] + w[1] * uv[1][1] + w[2] * uv[2][1];
                u * u - v < 0.0
            }
        }
    }
}

/// The prepass geometry of one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StencilModel {
    triangles: Vec<Triangle>,
}

impl StencilModel {
    /// Builds the model from normalized contours, the way they'd be pushed in a frame.
    pub fn from_primitives(contours: &[ContourPrimitives]) -> Self {
        let mut model = Self::default();
        for contour in contours {
            for segment in &contour.segments {
                model.add_segment(segment);
            }
        }
        for contour in contours {
            model.add_fan(&contour.fan);
        }
        model
    }

    /// Builds the model from the staged bytes of a partition, as described by `layout`.
    ///
    /// `bytes` starts at the partition base, as returned by
    /// [`PrimitiveBuffer::contents`](crate::PrimitiveBuffer::contents). Returns `None` if it is
    /// shorter than the layout requires.
    pub fn from_layout(layout: &FrameLayout, bytes: &[u8]) -> Option<Self> {
        let segment_bytes = layout.segment_count as usize * SEGMENT_SIZE;
        let fan_bytes = layout.fan_vertex_count() as usize * FAN_VERTEX_SIZE;
        if bytes.len() < segment_bytes + fan_bytes {
            return None;
        }
        let mut model = Self::default();
        for chunk in bytes[..segment_bytes].chunks_exact(SEGMENT_SIZE) {
            model.add_segment(&bytemuck::pod_read_unaligned(chunk));
        }
        let fans = &bytes[segment_bytes..segment_bytes + fan_bytes];
        for range in &layout.fan_ranges {
            let start = range.begin as usize * FAN_VERTEX_SIZE;
            let end = range.end as usize * FAN_VERTEX_SIZE;
            let vertices: Vec<FanVertex> = fans[start..end]
                .chunks_exact(FAN_VERTEX_SIZE)
                .map(bytemuck::pod_read_unaligned)
                .collect();
            model.add_fan(&vertices);
        }
        Some(model)
    }

    fn add_segment(&mut self, segment: &CurveSegment) {
        let [p0, p1, p2] = segment.vertices();
        self.triangles.push(Triangle {
            pos: [xy(p0.pos), xy(p1.pos), xy(p2.pos)],
            uv: Some([p0.uv, p1.uv, p2.uv]),
        });
    }

    fn add_fan(&mut self, fan: &[FanVertex]) {
        let Some((pivot, rest)) = fan.split_first() else {
            return;
        };
        for pair in rest.windows(2) {
            self.triangles.push(Triangle {
                pos: [xy(pivot.pos), xy(pair[0].pos), xy(pair[1].pos)],
                uv: None,
            });
        }
    }

    /// Number of triangles the prepass would draw.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// The stencil value left at `p` (in normalized device space) after the prepass.
    pub fn stencil_at(&self, p: [f32; 2]) -> u8 {
        let hits = self.triangles.iter().filter(|t| t.contributes(p)).count();
        (hits as u32 & STENCIL_MASK) as u8
    }

    /// Whether the resolve pass would colour `p`.
    pub fn is_inside(&self, p: [f32; 2]) -> bool {
        u32::from(self.stencil_at(p)) & STENCIL_MASK != STENCIL_REFERENCE & STENCIL_MASK
    }
}

fn xy(pos: [f32; 3]) -> [f32; 2] {
    [pos[0], pos[1]]
}
