// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyphfill fills outline-font contours on the GPU, straight from their quadratic Bézier
//! control points, using [`wgpu`].
//!
//! No curve is ever flattened on the host. Each frame, the contours of a glyph are normalized
//! into two primitive sets:
//!
//! - one triangle per quadratic segment, carrying the canonical curve coordinates
//!   `(0, 0)`, `(0.5, 0)` and `(1, 1)` so that the fragment stage can evaluate the implicit
//!   function `u² - v` and keep only the region between the chord and the curve;
//! - one triangle fan per contour, pivoting around a fixed point and walking the on-curve
//!   anchors, which covers the polygon interior.
//!
//! A stencil-only prepass inverts the low stencil bit for every fragment either primitive
//! covers, so the final bit holds the even-odd parity of the glyph. A full-screen resolve pass
//! then writes the fill colour wherever that bit is set.
//!
//! ## Getting started
//!
//! ```ignore
//! let glyphs = glyphfill::builtin::glyphs()?;
//! let mut renderer = Renderer::new(
//!     &device,
//!     &RendererOptions {
//!         surface_format: surface.format,
//!         antialiasing: AaConfig::Msaa4,
//!         buffer: BufferConfig::default(),
//!     },
//!     width,
//!     height,
//! );
//! let mut driver = FrameDriver::new(&glyphs, Animation::default(), BufferConfig::default());
//!
//! // Once per frame:
//! let mut target = renderer.target(&device, &queue, &surface.surface);
//! driver.frame(dt, &mut target)?;
//! ```
//!
//! See `demos/glyph_cycle` for how this integrates with winit.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![allow(
    clippy::cast_possible_truncation,
    reason = "GPU vertex and byte counts are bounded by the partition size, which fits in u32"
)]

pub mod buffer;
pub mod builtin;
pub mod coverage;
pub mod driver;
pub mod font;
pub mod glyph;
pub mod normalize;
pub mod primitives;
pub mod recording;
pub mod resolve;
pub mod stencil;

#[cfg(feature = "wgpu")]
mod pipelines;
#[cfg(feature = "wgpu")]
mod shaders;
#[cfg(feature = "wgpu")]
pub mod util;
#[cfg(feature = "wgpu")]
mod wgpu_engine;

#[cfg(feature = "wgpu")]
pub use wgpu;

pub use buffer::{BufferConfig, FanRange, FrameLayout, PrimitiveBuffer};
pub use driver::{Animation, Frame, FrameDriver, FrameState, FrameStats, FrameTarget};
pub use glyph::{Bounds, Contour, ContourError, Glyph, GlyphSet};
pub use normalize::{normalize_contour, normalize_glyph, Transform};
pub use primitives::{ContourPrimitives, CurveSegment, CurveVertex, FanVertex};
pub use recording::{Command, PassKind, PipelineId, Recording, VertexSource};

#[cfg(feature = "wgpu")]
pub use wgpu_engine::{Renderer, RendererOptions, SurfaceTarget};

/// Represents the anti-aliasing method used by both passes.
///
/// The stencil target and the resolve colour target share the sample count, so the parity of
/// every sample is accumulated and resolved independently.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum AaConfig {
    /// One sample per pixel. Edges are aliased.
    #[default]
    None,
    /// 4x multisampling, with the curve test evaluated per sample.
    Msaa4,
}

impl AaConfig {
    /// Number of samples per pixel for render targets and pipelines.
    pub fn sample_count(self) -> u32 {
        match self {
            Self::None => 1,
            Self::Msaa4 => 4,
        }
    }
}

/// Parameters used in a single render that are configurable by the client.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderParams {
    /// Colour written where the stencil parity bit is set, as linear RGBA.
    pub fill_color: [f32; 4],
    /// Colour the target is cleared to before the resolve pass.
    pub background: [f64; 4],
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            fill_color: [1.0, 1.0, 1.0, 1.0],
            background: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Errors that can occur in Glyphfill.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The primitives of a frame don't fit in one partition of the dynamic buffer.
    ///
    /// Truncating would render a corrupted glyph, so the frame is abandoned instead.
    #[error("write of {requested} bytes exceeds the {available} bytes left in the partition")]
    PartitionOverflow { requested: usize, available: usize },
    /// Curve segments were pushed after a fan in the same frame.
    ///
    /// Fan data is placed right after the last segment, so a late segment would overwrite it.
    #[error("curve segments must all be pushed before the first fan of a frame")]
    SegmentsAfterFan,
    /// A glyph's bounding box has zero (or non-finite) width or height.
    #[error("glyph '{glyph}' has a degenerate bounding box")]
    DegenerateBounds { glyph: String },
    /// A glyph has no contours to fill.
    #[error("glyph '{glyph}' has no contours")]
    EmptyGlyph { glyph: String },
    /// A contour of a glyph is not a valid chain of quadratic segments.
    #[error("contour {contour} of glyph '{glyph}' is invalid")]
    InvalidContour {
        glyph: String,
        contour: usize,
        #[source]
        source: ContourError,
    },
    /// A draw or bind command was recorded outside of a render pass.
    #[error("command recorded outside of a render pass")]
    CommandOutsidePass,
    /// A glyph data source produced no glyphs.
    #[error("the glyph set is empty")]
    EmptyGlyphSet,
    /// Failed to read the font tables.
    #[error("couldn't read font data")]
    Font(#[from] skrifa::raw::ReadError),
    /// Failed to draw a glyph outline from a font.
    #[error("couldn't draw glyph outline: {0}")]
    Draw(skrifa::outline::DrawError),
    /// The font has no glyph mapped to this character.
    #[error("font has no glyph for {0:?}")]
    MissingGlyph(char),

    /// There is no available device with the features required by Glyphfill.
    #[cfg(feature = "wgpu")]
    #[error("Couldn't find suitable device")]
    NoCompatibleDevice,
    /// Failed to create surface.
    /// See [`wgpu::CreateSurfaceError`] for more information.
    #[cfg(feature = "wgpu")]
    #[error("Couldn't create wgpu surface")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    /// Surface doesn't support the required texture formats.
    #[cfg(feature = "wgpu")]
    #[error("Couldn't find `Rgba8Unorm` or `Bgra8Unorm` texture formats for surface")]
    UnsupportedSurfaceFormat,
    /// Failed to acquire the next presentable image.
    #[cfg(feature = "wgpu")]
    #[error("Couldn't acquire surface texture")]
    Surface(#[from] wgpu::SurfaceError),
    /// Waiting for a previous submission failed.
    #[cfg(feature = "wgpu")]
    #[error("Couldn't wait for GPU work to complete")]
    Poll(#[from] wgpu::PollError),
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;
