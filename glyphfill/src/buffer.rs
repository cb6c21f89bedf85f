// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The double-buffered dynamic primitive buffer.
//!
//! The GPU buffer is split into [`PARTITION_COUNT`] equal partitions. While the GPU reads the
//! partition written for the previous frame, the host fills the other one. Each partition is
//! laid out as all curve segments of a frame first, then all fan vertices:
//!
//! ```text
//! | segment 0 | segment 1 | ... | fan 0 | fan 1 | ... | unused |
//! ^ base_offset                 ^ fan_base_offset
//! ```
//!
//! The host side of each partition is an owned staging slab; the driver hands the used bytes
//! to the backend, which uploads them at [`FrameLayout::base_offset`] before recording.

use std::ops::Range;

use crate::primitives::{CurveSegment, FanVertex, FAN_VERTEX_SIZE, SEGMENT_SIZE};
use crate::{Error, Result};

/// Default size of one partition: 1 MiB.
pub const DEFAULT_PARTITION_SIZE: usize = 1024 * 1024;
/// Number of partitions the GPU buffer is split into.
pub const PARTITION_COUNT: usize = 2;
/// Partition sizes are rounded down to a multiple of this, the buffer copy alignment.
pub const PARTITION_ALIGNMENT: usize = 4;

/// Sizing of the dynamic primitive buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// Size in bytes of one partition.
    pub partition_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            partition_size: DEFAULT_PARTITION_SIZE,
        }
    }
}

impl BufferConfig {
    pub fn new(partition_size: usize) -> Self {
        Self { partition_size }
    }

    /// The partition size, rounded down to [`PARTITION_ALIGNMENT`].
    pub fn aligned_partition_size(&self) -> usize {
        self.partition_size - self.partition_size % PARTITION_ALIGNMENT
    }

    /// Size in bytes of the whole GPU buffer.
    pub fn total_size(&self) -> u64 {
        (self.aligned_partition_size() * PARTITION_COUNT) as u64
    }
}

/// A range of fan vertices, as indices into the fan section of a partition.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FanRange {
    pub begin: u32,
    pub end: u32,
}

impl FanRange {
    pub fn len(&self) -> u32 {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

impl From<FanRange> for Range<u32> {
    fn from(range: FanRange) -> Self {
        range.begin..range.end
    }
}

/// Where a frame's primitives live in the GPU buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    pub partition: usize,
    /// Absolute byte offset of the partition.
    pub base_offset: u64,
    pub segment_count: u32,
    pub fan_ranges: Vec<FanRange>,
}

impl FrameLayout {
    /// Number of vertices in the segment section.
    pub fn segment_vertex_count(&self) -> u32 {
        self.segment_count * 3
    }

    /// Absolute byte offset of the first fan vertex.
    pub fn fan_base_offset(&self) -> u64 {
        self.base_offset + u64::from(self.segment_count) * SEGMENT_SIZE as u64
    }

    /// Total number of fan vertices.
    pub fn fan_vertex_count(&self) -> u32 {
        self.fan_ranges.last().map_or(0, |r| r.end)
    }
}

/// Host staging for the dynamic primitive buffer.
#[derive(Debug)]
pub struct PrimitiveBuffer {
    partitions: [Box<[u8]>; PARTITION_COUNT],
    partition_size: usize,
    current: usize,
    segment_count: u32,
    fan_vertex_count: u32,
    fan_ranges: Vec<FanRange>,
}

impl PrimitiveBuffer {
    pub fn new(config: &BufferConfig) -> Self {
        let partition_size = config.aligned_partition_size();
        Self {
            partitions: std::array::from_fn(|_| vec![0; partition_size].into_boxed_slice()),
            partition_size,
            current: 0,
            segment_count: 0,
            fan_vertex_count: 0,
            fan_ranges: Vec::new(),
        }
    }

    pub fn partition_size(&self) -> usize {
        self.partition_size
    }

    /// Index of the partition currently being written.
    pub fn current_partition(&self) -> usize {
        self.current
    }

    /// Absolute byte offset of the current partition.
    pub fn partition_base(&self) -> u64 {
        (self.current * self.partition_size) as u64
    }

    pub fn segment_count(&self) -> u32 {
        self.segment_count
    }

    pub fn fan_vertex_count(&self) -> u32 {
        self.fan_vertex_count
    }

    pub fn fan_ranges(&self) -> &[FanRange] {
        &self.fan_ranges
    }

    /// Bytes taken by the segment section.
    pub fn segment_bytes(&self) -> usize {
        self.segment_count as usize * SEGMENT_SIZE
    }

    /// Bytes written to the current partition so far.
    pub fn used_bytes(&self) -> usize {
        self.segment_bytes() + self.fan_vertex_count as usize * FAN_VERTEX_SIZE
    }

    fn reserve(&self, requested: usize) -> Result<usize> {
        let used = self.used_bytes();
        let available = self.partition_size - used;
        if requested > available {
            return Err(Error::PartitionOverflow {
                requested,
                available,
            });
        }
        Ok(used)
    }

    /// Appends curve segments, returning the absolute byte offset they were written at.
    ///
    /// Fails without writing anything if a fan has already been pushed this frame or if the
    /// segments don't fit.
    pub fn push_segments(&mut self, segments: &[CurveSegment]) -> Result<u64> {
        if self.fan_vertex_count > 0 {
            return Err(Error::SegmentsAfterFan);
        }
        let bytes: &[u8] = bytemuck::cast_slice(segments);
        let start = self.reserve(bytes.len())?;
        let base = self.partition_base();
        self.partitions[self.current][start..start + bytes.len()].copy_from_slice(bytes);
        self.segment_count += segments.len() as u32;
        Ok(base + start as u64)
    }

    /// Appends one fan, returning its vertex range within the fan section.
    pub fn push_fan(&mut self, fan: &[FanVertex]) -> Result<FanRange> {
        let bytes: &[u8] = bytemuck::cast_slice(fan);
        let start = self.reserve(bytes.len())?;
        self.partitions[self.current][start..start + bytes.len()].copy_from_slice(bytes);
        let range = FanRange {
            begin: self.fan_vertex_count,
            end: self.fan_vertex_count + fan.len() as u32,
        };
        self.fan_vertex_count = range.end;
        self.fan_ranges.push(range);
        Ok(range)
    }

    /// Absolute byte offset of the first vertex of `range`.
    pub fn fan_offset(&self, range: FanRange) -> u64 {
        self.partition_base()
            + self.segment_bytes() as u64
            + u64::from(range.begin) * FAN_VERTEX_SIZE as u64
    }

    /// Forgets everything written to the current partition.
    pub fn reset(&mut self) {
        self.segment_count = 0;
        self.fan_vertex_count = 0;
        self.fan_ranges.clear();
    }

    /// Moves on to the other partition. Counters are left alone; call [`reset`](Self::reset).
    pub fn swap(&mut self) {
        self.current = (self.current + 1) % PARTITION_COUNT;
    }

    /// Snapshot of the current frame's layout, for recording draws.
    pub fn layout(&self) -> FrameLayout {
        FrameLayout {
            partition: self.current,
            base_offset: self.partition_base(),
            segment_count: self.segment_count,
            fan_ranges: self.fan_ranges.clone(),
        }
    }

    /// The bytes written to the current partition this frame.
    pub fn contents(&self) -> &[u8] {
        &self.partitions[self.current][..self.used_bytes()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(offset: f32) -> CurveSegment {
        CurveSegment::new([offset, 0., 0.], [offset, 1., 0.], [offset, 2., 0.])
    }

    fn fan(len: usize) -> Vec<FanVertex> {
        (0..len).map(|i| FanVertex::new(i as f32, 0., 0.)).collect()
    }

    #[test]
    fn partition_size_is_aligned() {
        assert_eq!(BufferConfig::new(1023).aligned_partition_size(), 1020);
        assert_eq!(BufferConfig::default().total_size(), 2 * 1024 * 1024);
    }

    #[test]
    fn exact_fit_then_overflow() {
        // Two segments and one fan of four vertices fill the partition exactly.
        let size = 2 * SEGMENT_SIZE + 4 * FAN_VERTEX_SIZE;
        let mut buffer = PrimitiveBuffer::new(&BufferConfig::new(size));
        assert_eq!(buffer.push_segments(&[segment(0.), segment(1.)]).unwrap(), 0);
        buffer.push_fan(&fan(4)).unwrap();
        assert_eq!(buffer.used_bytes(), size);

        let err = buffer.push_fan(&fan(1)).unwrap_err();
        assert!(matches!(
            err,
            Error::PartitionOverflow {
                requested: 12,
                available: 0
            }
        ));
        // The failed push left the frame untouched.
        assert_eq!(buffer.fan_ranges().len(), 1);
        assert_eq!(buffer.contents().len(), size);
    }

    #[test]
    fn segments_after_fan_are_rejected() {
        let mut buffer = PrimitiveBuffer::new(&BufferConfig::default());
        buffer.push_segments(&[segment(0.), segment(1.)]).unwrap();
        buffer.push_fan(&fan(4)).unwrap();
        assert!(matches!(
            buffer.push_segments(&[segment(2.)]),
            Err(Error::SegmentsAfterFan)
        ));
    }

    #[test]
    fn fan_offsets_follow_the_segments() {
        let mut buffer = PrimitiveBuffer::new(&BufferConfig::default());
        buffer.swap();
        let base = buffer.partition_base();
        assert_eq!(base, DEFAULT_PARTITION_SIZE as u64);

        let segments: Vec<_> = (0..7).map(|i| segment(i as f32)).collect();
        assert_eq!(buffer.push_segments(&segments[..3]).unwrap(), base);
        assert_eq!(
            buffer.push_segments(&segments[3..]).unwrap(),
            base + 3 * SEGMENT_SIZE as u64
        );

        let ranges: Vec<_> = [4, 5, 6]
            .into_iter()
            .map(|len| buffer.push_fan(&fan(len)).unwrap())
            .collect();
        assert_eq!(
            ranges,
            vec![
                FanRange { begin: 0, end: 4 },
                FanRange { begin: 4, end: 9 },
                FanRange { begin: 9, end: 15 },
            ]
        );
        let segment_bytes = 7 * SEGMENT_SIZE as u64;
        assert_eq!(buffer.fan_offset(ranges[0]), base + segment_bytes);
        assert_eq!(
            buffer.fan_offset(ranges[2]),
            base + segment_bytes + 9 * FAN_VERTEX_SIZE as u64
        );

        let layout = buffer.layout();
        assert_eq!(layout.partition, 1);
        assert_eq!(layout.segment_vertex_count(), 21);
        assert_eq!(layout.fan_base_offset(), base + segment_bytes);
        assert_eq!(layout.fan_vertex_count(), 15);

        // The staged bytes decode back to what was pushed.
        let contents = buffer.contents();
        let first: CurveSegment = bytemuck::pod_read_unaligned(&contents[..SEGMENT_SIZE]);
        assert_eq!(first, segments[0]);
        let fan_start = segment_bytes as usize + 4 * FAN_VERTEX_SIZE;
        let second_fan: FanVertex =
            bytemuck::pod_read_unaligned(&contents[fan_start..fan_start + FAN_VERTEX_SIZE]);
        assert_eq!(second_fan, FanVertex::new(0., 0., 0.));
    }

    #[test]
    fn swap_alternates_and_reset_clears() {
        let mut buffer = PrimitiveBuffer::new(&BufferConfig::new(4096));
        let mut seen = vec![];
        for _ in 0..4 {
            buffer.push_segments(&[segment(0.), segment(1.)]).unwrap();
            buffer.push_fan(&fan(4)).unwrap();
            seen.push(buffer.current_partition());
            buffer.reset();
            assert_eq!(buffer.used_bytes(), 0);
            assert!(buffer.fan_ranges().is_empty());
            assert_eq!(buffer.segment_count(), 0);
            buffer.swap();
        }
        assert_eq!(seen, vec![0, 1, 0, 1]);
    }
}
