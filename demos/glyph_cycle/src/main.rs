// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cycles through a set of glyphs, growing each one in before moving to the next.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use glyphfill::util::{RenderContext, RenderSurface};
use glyphfill::wgpu::{self, SubmissionIndex};
use glyphfill::{
    builtin, AaConfig, Animation, BufferConfig, Error, FrameDriver, GlyphSet, RenderParams,
    Renderer, RendererOptions,
};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser, Debug)]
#[command(about, long_about = None, bin_name = "cargo run -p glyph_cycle --")]
struct Args {
    /// Font file to take glyphs from. The built-in shapes are shown if omitted.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Characters to cycle through when a font is given.
    #[arg(long, default_value = "glyphfill")]
    text: String,
    /// Seconds each glyph stays on screen.
    #[arg(long, default_value_t = 1.0)]
    duration: f32,
    /// Render with 4x multisampling.
    #[arg(long)]
    msaa: bool,
}

struct ActiveRenderState {
    // The fields MUST be in this order, so that the surface is dropped before the window
    surface: RenderSurface<'static>,
    window: Arc<Window>,
}

enum RenderState {
    Active(ActiveRenderState),
    // Cache a window so that it can be reused when the app is resumed after being suspended
    Suspended(Option<Arc<Window>>),
}

struct GlyphCycleApp<'g> {
    context: RenderContext,
    renderer: Option<Renderer>,
    state: RenderState,
    driver: FrameDriver<'g, SubmissionIndex>,
    antialiasing: AaConfig,
    last_frame: Option<Instant>,
}

impl GlyphCycleApp<'_> {
    fn create_surface(&mut self, window: Arc<Window>) -> Result<RenderSurface<'static>> {
        let size = window.inner_size();
        let surface = pollster::block_on(self.context.create_surface(
            window,
            size.width,
            size.height,
            self.antialiasing,
        ))?;
        let device = &self.context.devices[surface.dev_id].device;
        let (width, height) = (surface.config.width, surface.config.height);
        match &mut self.renderer {
            Some(renderer) => renderer.resize(device, width, height),
            None => {
                let options = RendererOptions {
                    surface_format: surface.format,
                    antialiasing: self.antialiasing,
                    buffer: self.driver.buffer_config(),
                };
                let mut renderer = Renderer::new(device, &options, width, height);
                renderer.set_params(
                    &self.context.devices[surface.dev_id].queue,
                    RenderParams {
                        fill_color: [0.95, 0.9, 0.8, 1.0],
                        background: [0.05, 0.05, 0.08, 1.0],
                    },
                );
                self.renderer = Some(renderer);
            }
        }
        self.driver.set_aspect_ratio(surface.aspect_ratio());
        Ok(surface)
    }

    /// Draws the next frame. Returns `false` if the app should exit.
    fn redraw(&mut self) -> bool {
        let RenderState::Active(state) = &self.state else {
            return true;
        };
        let Some(renderer) = self.renderer.as_mut() else {
            return true;
        };
        let now = Instant::now();
        let dt = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.duration_since(last));
        self.last_frame = Some(now);

        let device_handle = &self.context.devices[state.surface.dev_id];
        let mut target = renderer.target(
            &device_handle.device,
            &device_handle.queue,
            &state.surface.surface,
        );
        match self.driver.frame(dt, &mut target) {
            Ok(stats) => log::trace!("{stats:?}"),
            Err(Error::Surface(
                err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated),
            )) => {
                log::warn!("Surface {err}, reconfiguring");
                self.context.configure_surface(&state.surface);
            }
            Err(Error::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Timed out acquiring surface texture, skipping frame");
            }
            Err(err) => {
                log::error!("Frame failed: {err}");
                return false;
            }
        }
        state.window.request_redraw();
        true
    }

    fn finish(&mut self) {
        let (RenderState::Active(state), Some(renderer)) = (&self.state, self.renderer.as_mut())
        else {
            return;
        };
        let device_handle = &self.context.devices[state.surface.dev_id];
        let mut target = renderer.target(
            &device_handle.device,
            &device_handle.queue,
            &state.surface.surface,
        );
        if let Err(err) = self.driver.finish(&mut target) {
            log::warn!("Couldn't wait for in-flight frames: {err}");
        }
    }
}

impl ApplicationHandler for GlyphCycleApp<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let RenderState::Suspended(cached_window) = &mut self.state else {
            return;
        };

        // Get the winit window cached in a previous Suspended event or else create a new window
        let window = match cached_window.take() {
            Some(window) => window,
            None => match create_winit_window(event_loop) {
                Ok(window) => window,
                Err(err) => {
                    log::error!("Couldn't create window: {err}");
                    event_loop.exit();
                    return;
                }
            },
        };

        match self.create_surface(window.clone()) {
            Ok(surface) => {
                self.state = RenderState::Active(ActiveRenderState { window, surface });
                self.last_frame = None;
                event_loop.set_control_flow(ControlFlow::Poll);
            }
            Err(err) => {
                log::error!("Couldn't create surface: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn suspended(&mut self, event_loop: &ActiveEventLoop) {
        self.finish();
        if let RenderState::Active(state) = &self.state {
            self.state = RenderState::Suspended(Some(state.window.clone()));
        }
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let render_state = match &mut self.state {
            RenderState::Active(state) if state.window.id() == window_id => state,
            _ => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                self.finish();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                // Minimized. Keep the last size until a real one arrives.
                if size.width == 0 || size.height == 0 {
                    return;
                }
                self.context
                    .resize_surface(&mut render_state.surface, size.width, size.height);
                if let Some(renderer) = &mut self.renderer {
                    let device = &self.context.devices[render_state.surface.dev_id].device;
                    renderer.resize(device, size.width, size.height);
                }
                self.driver
                    .set_aspect_ratio(render_state.surface.aspect_ratio());
                render_state.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                if !self.redraw() {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

fn create_winit_window(event_loop: &ActiveEventLoop) -> Result<Arc<Window>> {
    let attr = Window::default_attributes()
        .with_inner_size(LogicalSize::new(800, 800))
        .with_resizable(true)
        .with_title("Glyphfill");
    Ok(Arc::new(event_loop.create_window(attr)?))
}

fn load_glyphs(args: &Args) -> Result<GlyphSet> {
    let Some(path) = &args.font else {
        return Ok(builtin::glyphs()?);
    };
    let data = std::fs::read(path)
        .with_context(|| format!("couldn't read {}", path.display()))?;
    let glyphs = GlyphSet::from_font(&data, &args.text)?;
    log::info!("Loaded {} glyphs from {}", glyphs.len(), path.display());
    Ok(glyphs)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let display_duration = Duration::try_from_secs_f32(args.duration)
        .context("--duration must be a non-negative number of seconds")?;
    let glyphs = load_glyphs(&args)?;

    let animation = Animation {
        display_duration,
        ..Animation::default()
    };
    let mut app = GlyphCycleApp {
        context: RenderContext::new(),
        renderer: None,
        state: RenderState::Suspended(None),
        driver: FrameDriver::new(&glyphs, animation, BufferConfig::default()),
        antialiasing: if args.msaa {
            AaConfig::Msaa4
        } else {
            AaConfig::None
        },
        last_frame: None,
    };

    let event_loop = EventLoop::new()?;
    event_loop
        .run_app(&mut app)
        .context("couldn't run event loop")?;
    Ok(())
}
