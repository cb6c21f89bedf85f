// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame loop.
//!
//! [`FrameDriver`] owns the dynamic primitive buffer and walks one frame through
//! `Idle → SelectGlyph → Normalize → Accumulate → Resolve → Present → Idle`. Submitting the
//! recorded passes is left to a [`FrameTarget`], so the loop can run against a GPU or against
//! a fake in tests.

use std::time::Duration;

use crate::buffer::{BufferConfig, FrameLayout, PrimitiveBuffer, PARTITION_COUNT};
use crate::glyph::GlyphSet;
use crate::normalize::{normalize_glyph, Transform};
use crate::primitives::ContourPrimitives;
use crate::recording::Recording;
use crate::resolve::record_resolve_pass;
use crate::stencil::record_stencil_pass;
use crate::Result;

/// Everything a backend needs to run one frame.
#[derive(Debug)]
pub struct Frame<'a> {
    /// Where the primitives live in the GPU buffer.
    pub layout: &'a FrameLayout,
    /// The used bytes of the partition, to be uploaded at [`Frame::upload_offset`].
    pub bytes: &'a [u8],
    pub recording: &'a Recording,
}

impl Frame<'_> {
    /// The partition written this frame.
    pub fn partition(&self) -> usize {
        self.layout.partition
    }

    /// Absolute byte offset the bytes must be uploaded to.
    pub fn upload_offset(&self) -> u64 {
        self.layout.base_offset
    }
}

/// Executes recorded frames.
pub trait FrameTarget {
    /// Identifies submitted work so it can be waited on later.
    type Submission;

    /// Blocks until the GPU has finished with `submission`.
    fn wait(&mut self, submission: Self::Submission) -> Result<()>;

    /// Uploads the frame's primitives, then runs its recording.
    fn submit(&mut self, frame: &Frame<'_>) -> Result<Self::Submission>;
}

/// How each glyph grows in while it is displayed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Animation {
    /// Time each glyph stays on screen.
    pub display_duration: Duration,
    /// Scale when a glyph first appears.
    pub base_scale: f32,
    /// Scale at the end of its display duration.
    pub max_scale: f32,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            display_duration: Duration::from_secs(1),
            base_scale: 0.1,
            max_scale: 0.4,
        }
    }
}

impl Animation {
    /// Linear interpolation from `base_scale` to `max_scale` over the display duration.
    pub fn scale_at(&self, elapsed: Duration) -> f32 {
        let t = if self.display_duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.display_duration.as_secs_f32()).min(1.0)
        };
        self.base_scale + (self.max_scale - self.base_scale) * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    SelectGlyph,
    Normalize,
    Accumulate,
    Resolve,
    Present,
}

/// What one frame drew.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameStats {
    /// Number of the frame, counting from zero.
    pub frame: u64,
    pub glyph_index: usize,
    pub partition: usize,
    pub scale: f32,
    pub segment_count: u32,
    pub fan_vertex_count: u32,
    pub bytes_used: usize,
}

/// Cycles through a glyph set, rendering one glyph per frame.
pub struct FrameDriver<'g, S> {
    glyphs: &'g GlyphSet,
    animation: Animation,
    buffer: PrimitiveBuffer,
    recording: Recording,
    glyph_index: usize,
    elapsed: Duration,
    aspect_ratio: Option<f32>,
    depth: f32,
    state: FrameState,
    in_flight: [Option<S>; PARTITION_COUNT],
    frame: u64,
}

impl<'g, S> FrameDriver<'g, S> {
    pub fn new(glyphs: &'g GlyphSet, animation: Animation, buffer: BufferConfig) -> Self {
        Self {
            glyphs,
            animation,
            buffer: PrimitiveBuffer::new(&buffer),
            recording: Recording::new(),
            glyph_index: 0,
            elapsed: Duration::ZERO,
            aspect_ratio: None,
            depth: 0.0,
            state: FrameState::Idle,
            in_flight: std::array::from_fn(|_| None),
            frame: 0,
        }
    }

    /// Corrects for the target's aspect ratio (width / height). `None` scales both axes alike.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: Option<f32>) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Sets the depth given to every vertex.
    ///
    /// Vertices outside the clip volume's `0..=1` depth range would be clipped away, so the value
    /// is clamped into it. NaN is treated as zero.
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = if depth.is_nan() {
            0.0
        } else {
            depth.clamp(0.0, 1.0)
        };
    }

    pub fn glyph_index(&self) -> usize {
        self.glyph_index
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Partition the next frame will write.
    pub fn current_partition(&self) -> usize {
        self.buffer.current_partition()
    }

    /// Sizing of the primitive buffer. A renderer executing this driver's frames needs a device
    /// buffer at least this large.
    pub fn buffer_config(&self) -> BufferConfig {
        BufferConfig::new(self.buffer.partition_size())
    }

    fn set_state(&mut self, state: FrameState) {
        log::trace!("frame {}: {:?} -> {:?}", self.frame, self.state, state);
        self.state = state;
    }

    /// Advances the clock, moving to the next glyph once the display duration has passed.
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
        if self.elapsed > self.animation.display_duration {
            self.glyph_index = (self.glyph_index + 1) % self.glyphs.len();
            self.elapsed = Duration::ZERO;
            log::debug!(
                "showing glyph {} '{}'",
                self.glyph_index,
                self.glyphs[self.glyph_index].name()
            );
        }
    }

    /// The transform for the current point of the animation.
    pub fn transform(&self) -> Transform {
        let scale = self.animation.scale_at(self.elapsed);
        match self.aspect_ratio {
            Some(aspect) => Transform::new(scale, aspect),
            None => Transform::uniform(scale),
        }
        .with_depth(self.depth)
    }

    /// Runs one frame: advances by `dt`, then normalizes, records and submits the active glyph.
    ///
    /// Before writing a partition, waits for the submission that last read it. On error the
    /// partition is cleared and nothing is submitted.
    pub fn frame<T>(&mut self, dt: Duration, target: &mut T) -> Result<FrameStats>
    where
        T: FrameTarget<Submission = S>,
    {
        let result = self.try_frame(dt, target);
        if result.is_err() {
            self.buffer.reset();
            self.recording.clear();
            self.set_state(FrameState::Idle);
        }
        result
    }

    fn try_frame<T>(&mut self, dt: Duration, target: &mut T) -> Result<FrameStats>
    where
        T: FrameTarget<Submission = S>,
    {
        self.set_state(FrameState::SelectGlyph);
        self.advance(dt);
        let partition = self.buffer.current_partition();
        if let Some(submission) = self.in_flight[partition].take() {
            target.wait(submission)?;
        }

        self.set_state(FrameState::Normalize);
        let transform = self.transform();
        let contours = normalize_glyph(&self.glyphs[self.glyph_index], &transform);
        self.push(&contours)?;

        self.set_state(FrameState::Accumulate);
        let layout = self.buffer.layout();
        self.recording.clear();
        record_stencil_pass(&mut self.recording, &layout);

        self.set_state(FrameState::Resolve);
        record_resolve_pass(&mut self.recording);

        self.set_state(FrameState::Present);
        let submission = target.submit(&Frame {
            layout: &layout,
            bytes: self.buffer.contents(),
            recording: &self.recording,
        })?;
        self.in_flight[partition] = Some(submission);

        let stats = FrameStats {
            frame: self.frame,
            glyph_index: self.glyph_index,
            partition,
            scale: self.animation.scale_at(self.elapsed),
            segment_count: self.buffer.segment_count(),
            fan_vertex_count: self.buffer.fan_vertex_count(),
            bytes_used: self.buffer.used_bytes(),
        };
        self.buffer.reset();
        self.buffer.swap();
        self.set_state(FrameState::Idle);
        self.frame += 1;
        Ok(stats)
    }

    /// All segments of all contours first, then all fans.
    fn push(&mut self, contours: &[ContourPrimitives]) -> Result<()> {
        for contour in contours {
            self.buffer.push_segments(&contour.segments)?;
        }
        for contour in contours {
            self.buffer.push_fan(&contour.fan)?;
        }
        Ok(())
    }

    /// Waits for every submission still in flight.
    pub fn finish<T>(&mut self, target: &mut T) -> Result<()>
    where
        T: FrameTarget<Submission = S>,
    {
        for slot in &mut self.in_flight {
            if let Some(submission) = slot.take() {
                target.wait(submission)?;
            }
        }
        Ok(())
    }
}

impl<S> std::fmt::Debug for FrameDriver<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("glyph_index", &self.glyph_index)
            .field("elapsed", &self.elapsed)
            .field("state", &self.state)
            .field("partition", &self.buffer.current_partition())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::Error;

    /// Counts submissions and remembers the upload offsets.
    #[derive(Default)]
    struct Counter {
        submitted: Vec<u64>,
        waited: Vec<usize>,
    }

    impl FrameTarget for Counter {
        type Submission = usize;

        fn wait(&mut self, submission: usize) -> Result<()> {
            self.waited.push(submission);
            Ok(())
        }

        fn submit(&mut self, frame: &Frame<'_>) -> Result<usize> {
            self.submitted.push(frame.upload_offset());
            Ok(self.submitted.len() - 1)
        }
    }

    #[test]
    fn scale_grows_linearly() {
        let animation = Animation::default();
        assert_eq!(animation.scale_at(Duration::ZERO), 0.1);
        assert!((animation.scale_at(Duration::from_millis(500)) - 0.25).abs() < 1e-6);
        // Clamped once the display duration has passed.
        assert!((animation.scale_at(Duration::from_secs(3)) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn depth_stays_in_the_clip_volume() {
        let glyphs = builtin::glyphs().unwrap();
        let mut driver =
            FrameDriver::<usize>::new(&glyphs, Animation::default(), BufferConfig::default());
        assert_eq!(driver.transform().depth, 0.0);
        driver.set_depth(0.25);
        assert_eq!(driver.transform().depth, 0.25);
        driver.set_depth(2.5);
        assert_eq!(driver.transform().depth, 1.0);
        driver.set_depth(-1.0);
        assert_eq!(driver.transform().depth, 0.0);
        driver.set_depth(f32::NAN);
        assert_eq!(driver.transform().depth, 0.0);
    }

    #[test]
    fn glyph_index_wraps() {
        let glyphs = builtin::glyphs().unwrap();
        let mut driver =
            FrameDriver::<usize>::new(&glyphs, Animation::default(), BufferConfig::default());
        let step = Duration::from_millis(600);
        let mut seen = vec![];
        for _ in 0..10 {
            driver.advance(step);
            seen.push(driver.glyph_index());
        }
        assert_eq!(seen, [0, 1, 1, 2, 2, 3, 3, 0, 0, 1]);
    }

    #[test]
    fn frames_alternate_partitions() {
        let glyphs = builtin::glyphs().unwrap();
        let config = BufferConfig::new(4096);
        let mut driver = FrameDriver::new(&glyphs, Animation::default(), config);
        let mut target = Counter::default();
        let partitions: Vec<_> = (0..4)
            .map(|_| {
                driver
                    .frame(Duration::from_millis(16), &mut target)
                    .unwrap()
                    .partition
            })
            .collect();
        assert_eq!(partitions, [0, 1, 0, 1]);
        assert_eq!(target.submitted, [0, 4096, 0, 4096]);
        assert_eq!(driver.buffer_config(), config);
        // Frames 2 and 3 each waited for the frame two before them.
        assert_eq!(target.waited, [0, 1]);
        assert_eq!(driver.state(), FrameState::Idle);

        driver.finish(&mut target).unwrap();
        assert_eq!(target.waited, [0, 1, 2, 3]);
    }

    #[test]
    fn overflow_abandons_the_frame() {
        let glyphs = builtin::glyphs().unwrap();
        let mut driver = FrameDriver::new(&glyphs, Animation::default(), BufferConfig::new(128));
        let mut target = Counter::default();
        let err = driver.frame(Duration::ZERO, &mut target).unwrap_err();
        assert!(matches!(err, Error::PartitionOverflow { .. }));
        assert!(target.submitted.is_empty());
        assert_eq!(driver.state(), FrameState::Idle);
        assert_eq!(driver.current_partition(), 0);
    }
}
