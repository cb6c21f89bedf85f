// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyphfill tests.
//!
//! [`RecordingTarget`] stands in for a GPU: it keeps a copy of everything submitted and logs
//! each wait, so tests can check what a frame would have done and in which order.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![allow(
    missing_debug_implementations,
    missing_docs,
    clippy::missing_assert_message,
    clippy::allow_attributes_without_reason
)]

use glyphfill::coverage::StencilModel;
use glyphfill::primitives::{FAN_VERTEX_SIZE, SEGMENT_SIZE};
use glyphfill::{Command, CurveSegment, Error, FanVertex, Frame, FrameLayout, FrameTarget};

/// Something the fake GPU was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Waited for the submission with this id.
    Wait(usize),
    /// Accepted a frame, assigning it this id.
    Submit(usize),
}

/// A frame as the fake GPU saw it.
#[derive(Debug, Clone)]
pub struct Submitted {
    pub id: usize,
    pub layout: FrameLayout,
    pub bytes: Vec<u8>,
    pub commands: Vec<Command>,
}

impl Submitted {
    /// Rebuilds the prepass geometry from the uploaded bytes.
    pub fn stencil_model(&self) -> Option<StencilModel> {
        StencilModel::from_layout(&self.layout, &self.bytes)
    }

    /// The curve segments as uploaded.
    pub fn segments(&self) -> Vec<CurveSegment> {
        let len = self.layout.segment_count as usize * SEGMENT_SIZE;
        self.bytes[..len]
            .chunks_exact(SEGMENT_SIZE)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    /// All fan vertices as uploaded, across contours.
    pub fn fan_vertices(&self) -> Vec<FanVertex> {
        let start = self.layout.segment_count as usize * SEGMENT_SIZE;
        let len = self.layout.fan_vertex_count() as usize * FAN_VERTEX_SIZE;
        self.bytes[start..start + len]
            .chunks_exact(FAN_VERTEX_SIZE)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    /// The fan draws of the stencil pass, in order.
    pub fn fan_draws(&self) -> Vec<std::ops::Range<u32>> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::DrawFan { vertices } => Some(vertices.clone()),
                _ => None,
            })
            .collect()
    }
}

/// A [`FrameTarget`] that records instead of rendering.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    pub events: Vec<Event>,
    pub frames: Vec<Submitted>,
    /// Ids of submissions that have been waited on.
    completed: Vec<usize>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the submission with this id has been waited on.
    pub fn is_complete(&self, id: usize) -> bool {
        self.completed.contains(&id)
    }

    /// Ids of all submissions that were never waited on.
    pub fn pending(&self) -> Vec<usize> {
        self.frames
            .iter()
            .map(|f| f.id)
            .filter(|id| !self.is_complete(*id))
            .collect()
    }
}

impl FrameTarget for RecordingTarget {
    type Submission = usize;

    fn wait(&mut self, submission: usize) -> Result<(), Error> {
        self.events.push(Event::Wait(submission));
        self.completed.push(submission);
        Ok(())
    }

    fn submit(&mut self, frame: &Frame<'_>) -> Result<usize, Error> {
        let id = self.frames.len();
        // A partition may only be rewritten once the GPU is done with its previous contents.
        let partition = frame.layout.partition;
        for previous in self.frames.iter().filter(|f| f.layout.partition == partition) {
            assert!(
                self.is_complete(previous.id),
                "partition {partition} rewritten while submission {} was in flight",
                previous.id
            );
        }
        self.events.push(Event::Submit(id));
        self.frames.push(Submitted {
            id,
            layout: frame.layout.clone(),
            bytes: frame.bytes.to_vec(),
            commands: frame.recording.commands.clone(),
        });
        Ok(id)
    }
}
