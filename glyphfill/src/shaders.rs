// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! WGSL sources for the three pipelines.
//!
//! Vertex positions arrive in y-down normalized device space and are flipped into wgpu's y-up
//! clip space here.

/// Curve triangles for the stencil prepass.
///
/// `u² - v` is negative strictly between the chord and the curve; every other fragment is
/// discarded before it can touch the stencil. The curve coordinate is interpolated per sample
/// so that multisampled edges follow the curve rather than the pixel centre.
pub(crate) const SEGMENT: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) @interpolate(perspective, sample) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) pos: vec3<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4(pos.x, -pos.y, pos.z, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) {
    if in.uv.x * in.uv.x - in.uv.y >= 0.0 {
        discard;
    }
}
"#;

/// Fan triangles for the stencil prepass, and the resolve quad.
///
/// The resolve pipeline colours every fragment that passes its stencil test with the fill
/// colour.
pub(crate) const FILL: &str = r#"
struct Params {
    fill_color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> params: Params;

@vertex
fn vs_main(@location(0) pos: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4(pos.x, -pos.y, pos.z, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return params.fill_color;
}
"#;
