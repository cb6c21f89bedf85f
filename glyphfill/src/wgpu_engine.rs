// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Replays recorded frames on a wgpu device.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use wgpu::{
    BindGroup, Buffer, CommandEncoder, Device, Queue, RenderPass, SubmissionIndex, Surface,
    TextureFormat, TextureView,
};

use crate::buffer::BufferConfig;
use crate::driver::{Frame, FrameTarget};
use crate::pipelines::{Pipelines, STENCIL_FORMAT};
use crate::primitives::FULL_SCREEN_QUAD;
use crate::recording::{Command, PassKind, PipelineId, VertexSource};
use crate::stencil::{fan_index_count, fan_indices, STENCIL_REFERENCE};
use crate::{AaConfig, Error, RenderParams, Result};

/// Options which are set at renderer creation time, used only during creation.
#[derive(Debug, Copy, Clone)]
pub struct RendererOptions {
    /// The format of the texture used for surfaces with this renderer/device.
    pub surface_format: TextureFormat,
    /// Anti-aliasing used by both passes.
    pub antialiasing: AaConfig,
    /// Sizing of the dynamic primitive buffer, normally [`FrameDriver::buffer_config`].
    ///
    /// Frames whose partitions don't fit are rejected with [`Error::PartitionOverflow`].
    ///
    /// [`FrameDriver::buffer_config`]: crate::FrameDriver::buffer_config
    pub buffer: BufferConfig,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ResolveUniforms {
    fill_color: [f32; 4],
}

/// Render targets that depend on the surface extent.
#[derive(Debug)]
struct Targets {
    width: u32,
    height: u32,
    /// Written by the prepass, tested by the resolve pass.
    stencil: TextureView,
    /// Multisampled colour target, resolved into the surface. `None` without MSAA.
    msaa: Option<TextureView>,
}

impl Targets {
    fn new(
        device: &Device,
        format: TextureFormat,
        sample_count: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let create = |label, format, usage| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width: width.max(1),
                        height: height.max(1),
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        let stencil = create(
            "Stencil Target",
            STENCIL_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let msaa = (sample_count > 1).then(|| {
            create(
                "MSAA Colour Target",
                format,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
        });
        log::debug!("Created {width}x{height} render targets with {sample_count} samples");
        Self {
            width,
            height,
            stencil,
            msaa,
        }
    }
}

/// Shared fan index pattern, grown on demand.
#[derive(Debug)]
struct FanIndexBuffer {
    buffer: Buffer,
    /// Longest fan the buffer can draw.
    capacity: u32,
}

impl FanIndexBuffer {
    const INITIAL_CAPACITY: u32 = 256;

    fn new(device: &Device, capacity: u32) -> Self {
        let capacity = capacity.max(3);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fan Index Buffer"),
            contents: bytemuck::cast_slice(&fan_indices(capacity)),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { buffer, capacity }
    }

    fn ensure(&mut self, device: &Device, vertices: u32) {
        if vertices > self.capacity {
            *self = Self::new(device, vertices.next_power_of_two());
        }
    }
}

/// Executes frames recorded by the [`FrameDriver`](crate::FrameDriver).
#[derive(Debug)]
pub struct Renderer {
    options: RendererOptions,
    pipelines: Pipelines,
    targets: Targets,
    /// Device side of the dynamic primitive buffer, both partitions.
    primitives: Buffer,
    quad: Buffer,
    fan_indices: FanIndexBuffer,
    uniforms: Buffer,
    resolve_bind_group: BindGroup,
    params: RenderParams,
}

impl Renderer {
    /// Creates a new renderer for targets of `width` by `height`.
    pub fn new(device: &Device, options: &RendererOptions, width: u32, height: u32) -> Self {
        let sample_count = options.antialiasing.sample_count();
        let pipelines = Pipelines::new(device, options.surface_format, sample_count);
        let targets = Targets::new(device, options.surface_format, sample_count, width, height);
        let primitives = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dynamic Primitive Buffer"),
            size: options.buffer.total_size(),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Full Screen Quad"),
            contents: bytemuck::cast_slice(&FULL_SCREEN_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let params = RenderParams::default();
        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Resolve Uniforms"),
            contents: bytemuck::bytes_of(&ResolveUniforms {
                fill_color: params.fill_color,
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let resolve_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Resolve Bind Group"),
            layout: &pipelines.resolve_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });
        Self {
            options: *options,
            pipelines,
            targets,
            primitives,
            quad,
            fan_indices: FanIndexBuffer::new(device, FanIndexBuffer::INITIAL_CAPACITY),
            uniforms,
            resolve_bind_group,
            params,
        }
    }

    /// Rebuilds every resource that depends on the surface extent.
    ///
    /// The primitive buffer and its partitions are untouched.
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        if (width, height) == (self.targets.width, self.targets.height) {
            return;
        }
        self.targets = Targets::new(
            device,
            self.options.surface_format,
            self.options.antialiasing.sample_count(),
            width,
            height,
        );
    }

    /// Sets the colours used from the next frame on.
    pub fn set_params(&mut self, queue: &Queue, params: RenderParams) {
        if params.fill_color != self.params.fill_color {
            queue.write_buffer(
                &self.uniforms,
                0,
                bytemuck::bytes_of(&ResolveUniforms {
                    fill_color: params.fill_color,
                }),
            );
        }
        self.params = params;
    }

    /// A frame target presenting to `surface`.
    pub fn target<'a, 's>(
        &'a mut self,
        device: &'a Device,
        queue: &'a Queue,
        surface: &'a Surface<'s>,
    ) -> SurfaceTarget<'a, 's> {
        SurfaceTarget {
            renderer: self,
            device,
            queue,
            surface,
        }
    }

    /// Uploads the frame's primitives and renders it into `view`.
    ///
    /// `view` must match the surface format and the extent the renderer was last sized for.
    pub fn render_to_view(
        &mut self,
        device: &Device,
        queue: &Queue,
        frame: &Frame<'_>,
        view: &TextureView,
    ) -> Result<SubmissionIndex> {
        check_upload(frame, self.primitives.size())?;
        if !frame.bytes.is_empty() {
            queue.write_buffer(&self.primitives, frame.upload_offset(), frame.bytes);
        }
        let longest_fan = frame
            .recording
            .commands
            .iter()
            .filter_map(|command| match command {
                Command::DrawFan { vertices } => Some(vertices.len() as u32),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        self.fan_indices.ensure(device, longest_fan);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Glyphfill Frame"),
        });
        self.encode(&mut encoder, frame, view)?;
        Ok(queue.submit(Some(encoder.finish())))
    }

    fn encode(
        &self,
        encoder: &mut CommandEncoder,
        frame: &Frame<'_>,
        view: &TextureView,
    ) -> Result<()> {
        let mut pass: Option<RenderPass<'static>> = None;
        for command in &frame.recording.commands {
            match command {
                Command::BeginPass(kind) => {
                    // The previous pass must end before the encoder is borrowed again.
                    drop(pass.take());
                    pass = Some(self.begin_pass(encoder, *kind, view).forget_lifetime());
                }
                Command::EndPass => pass = None,
                command => {
                    let Some(pass) = pass.as_mut() else {
                        return Err(Error::CommandOutsidePass);
                    };
                    self.replay(pass, command);
                }
            }
        }
        Ok(())
    }

    fn replay(&self, pass: &mut RenderPass<'static>, command: &Command) {
        match command {
            Command::BindPipeline(id) => {
                pass.set_pipeline(self.pipelines.get(*id));
                pass.set_stencil_reference(STENCIL_REFERENCE);
                match id {
                    PipelineId::FanStencil => pass.set_index_buffer(
                        self.fan_indices.buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    ),
                    PipelineId::Resolve => pass.set_bind_group(0, &self.resolve_bind_group, &[]),
                    PipelineId::SegmentStencil => {}
                }
            }
            Command::BindVertices { source, offset } => {
                let buffer = match source {
                    VertexSource::Dynamic => &self.primitives,
                    VertexSource::FullScreenQuad => &self.quad,
                };
                pass.set_vertex_buffer(0, buffer.slice(*offset..));
            }
            Command::Draw { vertices } => pass.draw(vertices.clone(), 0..1),
            Command::DrawFan { vertices } => {
                let count = fan_index_count(vertices.len() as u32);
                pass.draw_indexed(0..count, vertices.start as i32, 0..1);
            }
            Command::BeginPass(_) | Command::EndPass => {}
        }
    }

    fn begin_pass<'e>(
        &self,
        encoder: &'e mut CommandEncoder,
        kind: PassKind,
        view: &TextureView,
    ) -> RenderPass<'e> {
        match kind {
            PassKind::Stencil => encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Stencil Prepass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.stencil,
                    depth_ops: None,
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            }),
            PassKind::Resolve => {
                let [r, g, b, a] = self.params.background;
                let (color_view, resolve_target) = match &self.targets.msaa {
                    Some(msaa) => (msaa, Some(view)),
                    None => (view, None),
                };
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Resolve Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: color_view,
                        resolve_target,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.targets.stencil,
                        depth_ops: None,
                        stencil_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Discard,
                        }),
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
            }
        }
    }
}

/// Rejects a frame whose bytes would land past the end of a device buffer of `capacity` bytes.
fn check_upload(frame: &Frame<'_>, capacity: u64) -> Result<()> {
    let offset = frame.upload_offset();
    if offset + frame.bytes.len() as u64 > capacity {
        return Err(Error::PartitionOverflow {
            requested: frame.bytes.len(),
            available: capacity.saturating_sub(offset) as usize,
        });
    }
    Ok(())
}

/// A [`FrameTarget`] that renders into the next image of a surface and presents it.
pub struct SurfaceTarget<'a, 's> {
    renderer: &'a mut Renderer,
    device: &'a Device,
    queue: &'a Queue,
    surface: &'a Surface<'s>,
}

impl FrameTarget for SurfaceTarget<'_, '_> {
    type Submission = SubmissionIndex;

    fn wait(&mut self, submission: SubmissionIndex) -> Result<()> {
        self.device
            .poll(wgpu::PollType::WaitForSubmissionIndex(submission))?;
        Ok(())
    }

    fn submit(&mut self, frame: &Frame<'_>) -> Result<SubmissionIndex> {
        let texture = self.surface.get_current_texture()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let submission = self
            .renderer
            .render_to_view(self.device, self.queue, frame, &view)?;
        texture.present();
        Ok(submission)
    }
}

impl std::fmt::Debug for SurfaceTarget<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceTarget")
            .field("renderer", &self.renderer)
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}
