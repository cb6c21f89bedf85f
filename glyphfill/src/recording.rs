// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A backend-independent list of GPU commands for one frame.
//!
//! The stencil and resolve passes are recorded here first and replayed by a backend such as
//! the `wgpu` engine. This keeps the pass logic testable without a device.

use std::ops::Range;

/// The three fixed pipelines used by the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PipelineId {
    /// Curve triangles, stencil invert, fragments outside the curve discarded.
    SegmentStencil,
    /// Fan triangles, stencil invert.
    FanStencil,
    /// Full-screen quad, coloured where the stencil parity bit is set.
    Resolve,
}

impl PipelineId {
    pub const ALL: [Self; 3] = [Self::SegmentStencil, Self::FanStencil, Self::Resolve];

    pub fn index(self) -> usize {
        match self {
            Self::SegmentStencil => 0,
            Self::FanStencil => 1,
            Self::Resolve => 2,
        }
    }
}

/// Which vertex buffer a draw reads from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VertexSource {
    /// The double-buffered dynamic primitive buffer.
    Dynamic,
    /// The static full-screen quad.
    FullScreenQuad,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PassKind {
    /// Clears the stencil to zero and accumulates parity. Writes no colour.
    Stencil,
    /// Loads the stencil and writes the fill colour.
    Resolve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    BeginPass(PassKind),
    BindPipeline(PipelineId),
    /// Binds a vertex buffer starting at an absolute byte offset.
    BindVertices { source: VertexSource, offset: u64 },
    /// Draws a triangle list.
    Draw { vertices: Range<u32> },
    /// Draws a triangle fan; vertices are relative to the last bound offset.
    DrawFan { vertices: Range<u32> },
    EndPass,
}

/// The commands of one frame, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recording {
    pub commands: Vec<Command>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_pass(&mut self, kind: PassKind) {
        self.commands.push(Command::BeginPass(kind));
    }

    pub fn bind_pipeline(&mut self, pipeline: PipelineId) {
        self.commands.push(Command::BindPipeline(pipeline));
    }

    pub fn bind_vertices(&mut self, source: VertexSource, offset: u64) {
        self.commands.push(Command::BindVertices { source, offset });
    }

    pub fn draw(&mut self, vertices: Range<u32>) {
        self.commands.push(Command::Draw { vertices });
    }

    pub fn draw_fan(&mut self, vertices: Range<u32>) {
        self.commands.push(Command::DrawFan { vertices });
    }

    pub fn end_pass(&mut self) {
        self.commands.push(Command::EndPass);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of draw commands of either kind.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. } | Command::DrawFan { .. }))
            .count()
    }
}
