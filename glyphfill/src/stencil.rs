// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stencil accumulation pass.
//!
//! Every curve triangle and every fan triangle inverts the stencil of the fragments it covers.
//! Curve triangles only cover the region between their chord and the curve; the fragment stage
//! discards the rest. The low stencil bit therefore ends up holding the even-odd parity of the
//! glyph at each sample. No colour is written.

use crate::buffer::FrameLayout;
use crate::recording::{PassKind, PipelineId, Recording, VertexSource};

/// Stencil reference value used by both passes.
pub const STENCIL_REFERENCE: u32 = 0;
/// Only the parity bit is read and written.
pub const STENCIL_MASK: u32 = 1;

/// Records the prepass for a frame whose primitives are described by `layout`.
///
/// The segment section is drawn as one triangle list. The fan section is bound once and each
/// contour's fan is drawn from its recorded range.
pub fn record_stencil_pass(recording: &mut Recording, layout: &FrameLayout) {
    recording.begin_pass(PassKind::Stencil);
    if layout.segment_count > 0 {
        recording.bind_pipeline(PipelineId::SegmentStencil);
        recording.bind_vertices(VertexSource::Dynamic, layout.base_offset);
        recording.draw(0..layout.segment_vertex_count());
    }
    let fans = layout.fan_ranges.iter().filter(|r| r.len() >= 3);
    let mut bound = false;
    for range in fans {
        if !bound {
            recording.bind_pipeline(PipelineId::FanStencil);
            recording.bind_vertices(VertexSource::Dynamic, layout.fan_base_offset());
            bound = true;
        }
        recording.draw_fan((*range).into());
    }
    recording.end_pass();
}

/// Number of indices needed to draw a fan of `vertices` vertices as a triangle list.
pub fn fan_index_count(vertices: u32) -> u32 {
    3 * vertices.saturating_sub(2)
}

/// Triangle-list indices for a fan of `vertices` vertices: `0, i, i + 1` for each triangle.
///
/// Every fan shares this pattern; the draw offsets it with the fan's first vertex.
pub fn fan_indices(vertices: u32) -> Vec<u32> {
    (1..vertices.saturating_sub(1))
        .flat_map(|i| [0, i, i + 1])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::FanRange;
    use crate::primitives::SEGMENT_SIZE;
    use crate::recording::Command;

    #[test]
    fn fan_pattern() {
        assert_eq!(fan_indices(4), vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(fan_index_count(4), 6);
        assert_eq!(fan_indices(5).len() as u32, fan_index_count(5));
        assert!(fan_indices(2).is_empty());
        assert_eq!(fan_index_count(0), 0);
    }

    #[test]
    fn records_segments_then_fans() {
        let layout = FrameLayout {
            partition: 1,
            base_offset: 4096,
            segment_count: 5,
            fan_ranges: vec![
                FanRange { begin: 0, end: 4 },
                FanRange { begin: 4, end: 7 },
            ],
        };
        let mut recording = Recording::new();
        record_stencil_pass(&mut recording, &layout);
        assert_eq!(
            recording.commands,
            vec![
                Command::BeginPass(PassKind::Stencil),
                Command::BindPipeline(PipelineId::SegmentStencil),
                Command::BindVertices {
                    source: VertexSource::Dynamic,
                    offset: 4096,
                },
                Command::Draw { vertices: 0..15 },
                Command::BindPipeline(PipelineId::FanStencil),
                Command::BindVertices {
                    source: VertexSource::Dynamic,
                    offset: 4096 + 5 * SEGMENT_SIZE as u64,
                },
                Command::DrawFan { vertices: 0..4 },
                Command::DrawFan { vertices: 4..7 },
                Command::EndPass,
            ]
        );
    }

    #[test]
    fn empty_frame_still_clears() {
        let layout = FrameLayout {
            partition: 0,
            base_offset: 0,
            segment_count: 0,
            fan_ranges: vec![FanRange { begin: 0, end: 2 }],
        };
        let mut recording = Recording::new();
        record_stencil_pass(&mut recording, &layout);
        assert_eq!(
            recording.commands,
            vec![Command::BeginPass(PassKind::Stencil), Command::EndPass]
        );
    }
}
