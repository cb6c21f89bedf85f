// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Device and surface setup for applications.
//!
//! A device is only usable if both the surface's colour format and the stencil format can be
//! rendered at the sample count of the chosen [`AaConfig`].

use wgpu::{
    Adapter, Device, Instance, Queue, Surface, SurfaceConfiguration, SurfaceTarget,
    TextureFormat, TextureFormatFeatureFlags,
};

use crate::buffer::PARTITION_COUNT;
use crate::pipelines::STENCIL_FORMAT;
use crate::{AaConfig, Error, Result};

/// The wgpu instance and every device opened through it.
pub struct RenderContext {
    pub instance: Instance,
    pub devices: Vec<DeviceHandle>,
}

pub struct DeviceHandle {
    adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl DeviceHandle {
    /// Whether `format` and the stencil target can both be rendered with `antialiasing`.
    fn supports(&self, format: TextureFormat, antialiasing: AaConfig) -> bool {
        [format, STENCIL_FORMAT].into_iter().all(|format| {
            let features = self.adapter.get_texture_format_features(format);
            renders_with(features.flags, antialiasing)
        })
    }
}

impl RenderContext {
    #[expect(
        clippy::new_without_default,
        reason = "Creating a wgpu Instance is something which should only be done rarely"
    )]
    pub fn new() -> Self {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::from_env().unwrap_or_default(),
            flags: wgpu::InstanceFlags::from_build_config().with_env(),
            backend_options: wgpu::BackendOptions::from_env_or_default(),
            ..Default::default()
        });
        Self {
            instance,
            devices: Vec::new(),
        }
    }

    /// Creates a surface for `window` on a device that can render it with `antialiasing`.
    pub async fn create_surface<'w>(
        &mut self,
        window: impl Into<SurfaceTarget<'w>>,
        width: u32,
        height: u32,
        antialiasing: AaConfig,
    ) -> Result<RenderSurface<'w>> {
        let surface = self.instance.create_surface(window.into())?;
        let dev_id = match self.find_device(&surface, antialiasing) {
            Some(id) => id,
            None => self.open_device(&surface).await?,
        };
        let handle = &self.devices[dev_id];
        let format = pick_format(&surface.get_capabilities(&handle.adapter).formats)
            .ok_or(Error::UnsupportedSurfaceFormat)?;
        if !handle.supports(format, antialiasing) {
            log::warn!(
                "{:?} can't render {format:?} with {antialiasing:?}",
                handle.adapter.get_info().name
            );
            return Err(Error::NoCompatibleDevice);
        }

        let surface = RenderSurface {
            surface,
            config: SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width,
                height,
                present_mode: wgpu::PresentMode::AutoVsync,
                // One frame in flight per primitive buffer partition.
                desired_maximum_frame_latency: PARTITION_COUNT as u32,
                alpha_mode: wgpu::CompositeAlphaMode::Auto,
                view_formats: vec![],
            },
            dev_id,
            format,
        };
        self.configure_surface(&surface);
        Ok(surface)
    }

    /// Resizes the surface. Zero-sized extents are ignored, as they can't be configured.
    pub fn resize_surface(&self, surface: &mut RenderSurface<'_>, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        surface.config.width = width;
        surface.config.height = height;
        self.configure_surface(surface);
    }

    /// Reconfigures the surface with its current configuration, after it was lost or outdated.
    pub fn configure_surface(&self, surface: &RenderSurface<'_>) {
        let device = &self.devices[surface.dev_id].device;
        surface.surface.configure(device, &surface.config);
    }

    /// An already open device that can present to `surface` with `antialiasing`.
    fn find_device(&self, surface: &Surface<'_>, antialiasing: AaConfig) -> Option<usize> {
        self.devices.iter().position(|handle| {
            handle.adapter.is_surface_supported(surface)
                && pick_format(&surface.get_capabilities(&handle.adapter).formats)
                    .is_some_and(|format| handle.supports(format, antialiasing))
        })
    }

    async fn open_device(&mut self, surface: &Surface<'_>) -> Result<usize> {
        let adapter =
            wgpu::util::initialize_adapter_from_env_or_default(&self.instance, Some(surface))
                .await
                .map_err(|_| Error::NoCompatibleDevice)?;
        // Stencil8 render attachments and 4x multisampling are part of the baseline.
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Glyphfill Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|_| Error::NoCompatibleDevice)?;
        log::debug!("Created device on {:?}", adapter.get_info().name);
        self.devices.push(DeviceHandle {
            adapter,
            device,
            queue,
        });
        Ok(self.devices.len() - 1)
    }
}

/// The first plain 8-bit RGBA or BGRA format, the ones the resolve pipeline blends into.
fn pick_format(formats: &[TextureFormat]) -> Option<TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|it| matches!(it, TextureFormat::Rgba8Unorm | TextureFormat::Bgra8Unorm))
}

fn renders_with(flags: TextureFormatFeatureFlags, antialiasing: AaConfig) -> bool {
    flags.sample_count_supported(antialiasing.sample_count())
}

/// A configured surface and the device it belongs to.
#[derive(Debug)]
pub struct RenderSurface<'s> {
    pub surface: Surface<'s>,
    pub config: SurfaceConfiguration,
    pub dev_id: usize,
    pub format: TextureFormat,
}

impl RenderSurface<'_> {
    /// Width over height, or `None` for an empty surface.
    pub fn aspect_ratio(&self) -> Option<f32> {
        (self.config.width > 0 && self.config.height > 0)
            .then(|| self.config.width as f32 / self.config.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_formats_are_preferred_in_order() {
        let formats = [
            TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Bgra8Unorm,
            TextureFormat::Rgba8Unorm,
        ];
        assert_eq!(pick_format(&formats), Some(TextureFormat::Bgra8Unorm));
        assert_eq!(pick_format(&[TextureFormat::Rgba16Float]), None);
    }

    #[test]
    fn msaa_needs_four_samples() {
        let single = TextureFormatFeatureFlags::empty();
        assert!(renders_with(single, AaConfig::None));
        assert!(!renders_with(single, AaConfig::Msaa4));
        assert!(renders_with(
            TextureFormatFeatureFlags::MULTISAMPLE_X4,
            AaConfig::Msaa4
        ));
    }
}
