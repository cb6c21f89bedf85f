// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pipeline table.

use wgpu::{
    BindGroupLayout, CompareFunction, DepthStencilState, Device, PipelineCompilationOptions,
    RenderPipeline, StencilFaceState, StencilOperation, StencilState, TextureFormat,
};

use crate::primitives::{CurveSegment, FanVertex, FAN_VERTEX_SIZE, SEGMENT_SIZE};
use crate::recording::PipelineId;
use crate::shaders;
use crate::stencil::STENCIL_MASK;

/// Format of the stencil target shared by both passes.
pub(crate) const STENCIL_FORMAT: TextureFormat = TextureFormat::Stencil8;

/// Stencil test and op for a pipeline.
///
/// The prepass inverts on every fragment that survives the fragment stage. `NotEqual` against
/// the reference makes the resolve pass draw only where the parity bit is set; in the prepass
/// the op is the same whether the test passes or fails.
fn stencil_state(id: PipelineId) -> DepthStencilState {
    let op = match id {
        PipelineId::SegmentStencil | PipelineId::FanStencil => StencilOperation::Invert,
        PipelineId::Resolve => StencilOperation::Keep,
    };
    let face = StencilFaceState {
        compare: CompareFunction::NotEqual,
        fail_op: op,
        depth_fail_op: op,
        pass_op: op,
    };
    DepthStencilState {
        format: STENCIL_FORMAT,
        depth_write_enabled: false,
        depth_compare: CompareFunction::Always,
        stencil: StencilState {
            front: face,
            back: face,
            read_mask: STENCIL_MASK,
            write_mask: match id {
                PipelineId::Resolve => 0,
                _ => STENCIL_MASK,
            },
        },
        bias: wgpu::DepthBiasState::default(),
    }
}

/// The compiled pipelines, indexed by [`PipelineId`].
#[derive(Debug)]
pub(crate) struct Pipelines {
    pipelines: [RenderPipeline; 3],
    pub(crate) resolve_bind_group_layout: BindGroupLayout,
}

impl Pipelines {
    pub(crate) fn new(device: &Device, color_format: TextureFormat, sample_count: u32) -> Self {
        let segment_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Segment Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SEGMENT.into()),
        });
        let fill_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fill Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::FILL.into()),
        });

        let resolve_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Resolve Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });
        let stencil_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Stencil Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        let resolve_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Resolve Pipeline Layout"),
            bind_group_layouts: &[&resolve_bind_group_layout],
            push_constant_ranges: &[],
        });

        let multisample = wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        };
        let primitive = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        };
        let segment_attributes = CurveSegment::vertex_attributes();
        let fan_attributes = FanVertex::vertex_attributes();
        let segment_buffers = [wgpu::VertexBufferLayout {
            // One vertex of a segment.
            array_stride: (SEGMENT_SIZE / 3) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &segment_attributes,
        }];
        let fan_buffers = [wgpu::VertexBufferLayout {
            array_stride: FAN_VERTEX_SIZE as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &fan_attributes,
        }];

        let segment = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Segment Stencil Pipeline"),
            layout: Some(&stencil_layout),
            vertex: wgpu::VertexState {
                module: &segment_shader,
                entry_point: Some("vs_main"),
                buffers: &segment_buffers,
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &segment_shader,
                entry_point: Some("fs_main"),
                targets: &[],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive,
            depth_stencil: Some(stencil_state(PipelineId::SegmentStencil)),
            multisample,
            multiview: None,
            cache: None,
        });

        let fan = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Fan Stencil Pipeline"),
            layout: Some(&stencil_layout),
            vertex: wgpu::VertexState {
                module: &fill_shader,
                entry_point: Some("vs_main"),
                buffers: &fan_buffers,
                compilation_options: PipelineCompilationOptions::default(),
            },
            // Stencil only.
            fragment: None,
            primitive,
            depth_stencil: Some(stencil_state(PipelineId::FanStencil)),
            multisample,
            multiview: None,
            cache: None,
        });

        let resolve = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Resolve Pipeline"),
            layout: Some(&resolve_layout),
            vertex: wgpu::VertexState {
                module: &fill_shader,
                entry_point: Some("vs_main"),
                buffers: &fan_buffers,
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fill_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive,
            depth_stencil: Some(stencil_state(PipelineId::Resolve)),
            multisample,
            multiview: None,
            cache: None,
        });

        log::debug!("Created pipelines for {color_format:?} with {sample_count} samples");
        Self {
            pipelines: [segment, fan, resolve],
            resolve_bind_group_layout,
        }
    }

    pub(crate) fn get(&self, id: PipelineId) -> &RenderPipeline {
        &self.pipelines[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepass_inverts_parity_bit() {
        for id in [PipelineId::SegmentStencil, PipelineId::FanStencil] {
            let state = stencil_state(id);
            assert_eq!(state.stencil.front.pass_op, StencilOperation::Invert);
            assert_eq!(state.stencil.front.fail_op, StencilOperation::Invert);
            assert_eq!(state.stencil.write_mask, 1);
            assert_eq!(state.stencil.back, state.stencil.front);
        }
        let resolve = stencil_state(PipelineId::Resolve);
        assert_eq!(resolve.stencil.front.compare, CompareFunction::NotEqual);
        assert_eq!(resolve.stencil.front.pass_op, StencilOperation::Keep);
        assert_eq!(resolve.stencil.write_mask, 0);
        assert!(!resolve.depth_write_enabled);
    }
}
