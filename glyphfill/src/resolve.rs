// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The resolve pass: one full-screen quad, coloured wherever the prepass left the parity bit
//! set. The colour target is cleared to the background; the stencil is loaded from the prepass.

use crate::primitives::FULL_SCREEN_QUAD;
use crate::recording::{PassKind, PipelineId, Recording, VertexSource};

/// Records the resolve pass. It reads the static quad, so it doesn't depend on the frame.
pub fn record_resolve_pass(recording: &mut Recording) {
    recording.begin_pass(PassKind::Resolve);
    recording.bind_pipeline(PipelineId::Resolve);
    recording.bind_vertices(VertexSource::FullScreenQuad, 0);
    recording.draw(0..FULL_SCREEN_QUAD.len() as u32);
    recording.end_pass();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::Command;

    #[test]
    fn draws_the_quad() {
        let mut recording = Recording::new();
        record_resolve_pass(&mut recording);
        assert_eq!(recording.draw_count(), 1);
        assert_eq!(
            recording.commands[..3],
            [
                Command::BeginPass(PassKind::Resolve),
                Command::BindPipeline(PipelineId::Resolve),
                Command::BindVertices {
                    source: VertexSource::FullScreenQuad,
                    offset: 0,
                },
            ]
        );
        assert_eq!(recording.commands[3], Command::Draw { vertices: 0..6 });
        assert_eq!(recording.commands.last(), Some(&Command::EndPass));
    }
}
