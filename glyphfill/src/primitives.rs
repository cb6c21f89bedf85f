// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vertex types shared between the host and the shaders.
//!
//! These structs are written byte for byte into the dynamic primitive buffer, so their layout
//! must match the vertex buffer layouts in `shaders.rs`.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

/// Curve coordinate of a segment's start point.
pub const CURVE_START_UV: [f32; 2] = [0.0, 0.0];
/// Curve coordinate of a segment's control point.
pub const CURVE_CONTROL_UV: [f32; 2] = [0.5, 0.0];
/// Curve coordinate of a segment's end point.
pub const CURVE_END_UV: [f32; 2] = [1.0, 1.0];

/// Size in bytes of one [`CurveSegment`] in the dynamic buffer.
pub const SEGMENT_SIZE: usize = size_of::<CurveSegment>();
/// Size in bytes of one [`FanVertex`] in the dynamic buffer.
pub const FAN_VERTEX_SIZE: usize = size_of::<FanVertex>();

const_assert_eq!(size_of::<CurveVertex>(), 20);
const_assert_eq!(SEGMENT_SIZE, 60);
const_assert_eq!(FAN_VERTEX_SIZE, 12);

/// A position in normalized device space paired with its curve coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct CurveVertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

/// One quadratic segment, drawn as a single triangle.
///
/// The curve coordinates interpolate to `(t, t²)` along the curve, so `u² - v` is zero on the
/// curve, negative between the chord and the curve and positive towards the control point.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct CurveSegment {
    pub p0: CurveVertex,
    pub p1: CurveVertex,
    pub p2: CurveVertex,
}

impl CurveSegment {
    pub fn new(start: [f32; 3], control: [f32; 3], end: [f32; 3]) -> Self {
        Self {
            p0: CurveVertex {
                pos: start,
                uv: CURVE_START_UV,
            },
            p1: CurveVertex {
                pos: control,
                uv: CURVE_CONTROL_UV,
            },
            p2: CurveVertex {
                pos: end,
                uv: CURVE_END_UV,
            },
        }
    }

    pub fn vertices(&self) -> [CurveVertex; 3] {
        [self.p0, self.p1, self.p2]
    }

    /// Vertex attributes for the segment pipeline.
    #[cfg(feature = "wgpu")]
    pub fn vertex_attributes() -> [wgpu::VertexAttribute; 2] {
        wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x2,
        ]
    }
}

/// A fan vertex: a bare position in normalized device space.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct FanVertex {
    pub pos: [f32; 3],
}

impl FanVertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { pos: [x, y, z] }
    }

    /// Vertex attributes for the fan and resolve pipelines.
    #[cfg(feature = "wgpu")]
    pub fn vertex_attributes() -> [wgpu::VertexAttribute; 1] {
        wgpu::vertex_attr_array![0 => Float32x3]
    }
}

/// Two triangles covering the whole target, drawn by the resolve pass.
pub const FULL_SCREEN_QUAD: [FanVertex; 6] = [
    FanVertex::new(-1.0, -1.0, 0.0),
    FanVertex::new(1.0, -1.0, 0.0),
    FanVertex::new(-1.0, 1.0, 0.0),
    FanVertex::new(1.0, -1.0, 0.0),
    FanVertex::new(-1.0, 1.0, 0.0),
    FanVertex::new(1.0, 1.0, 0.0),
];

/// The render primitives of one contour for one frame.
///
/// Discarded once copied into the dynamic buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourPrimitives {
    pub segments: Vec<CurveSegment>,
    /// Pivot first, then each segment's start, then the first start again.
    pub fan: Vec<FanVertex>,
}
