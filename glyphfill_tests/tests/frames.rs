// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame loop behaviour against a recording target.

use std::time::Duration;

use glyphfill::buffer::DEFAULT_PARTITION_SIZE;
use glyphfill::primitives::{FAN_VERTEX_SIZE, SEGMENT_SIZE};
use glyphfill::{
    builtin, Animation, BufferConfig, Command, Error, FrameDriver, PassKind, PipelineId,
};
use glyphfill_tests::{Event, RecordingTarget};

const FRAME: Duration = Duration::from_millis(16);

#[test]
fn partitions_alternate_and_wait_before_reuse() {
    let glyphs = builtin::glyphs().unwrap();
    let mut driver = FrameDriver::new(&glyphs, Animation::default(), BufferConfig::default());
    let mut target = RecordingTarget::new();
    for _ in 0..4 {
        driver.frame(FRAME, &mut target).unwrap();
    }

    let partitions: Vec<_> = target.frames.iter().map(|f| f.layout.partition).collect();
    assert_eq!(partitions, [0, 1, 0, 1]);
    let offsets: Vec<_> = target.frames.iter().map(|f| f.layout.base_offset).collect();
    let size = DEFAULT_PARTITION_SIZE as u64;
    assert_eq!(offsets, [0, size, 0, size]);

    // Frame 2 reuses partition 0 only after frame 0's work has completed.
    assert_eq!(
        target.events,
        [
            Event::Submit(0),
            Event::Submit(1),
            Event::Wait(0),
            Event::Submit(2),
            Event::Wait(1),
            Event::Submit(3),
        ]
    );

    driver.finish(&mut target).unwrap();
    assert!(target.pending().is_empty());
}

#[test]
fn segments_precede_fans_in_every_partition() {
    let glyphs = builtin::glyphs().unwrap();
    let mut driver = FrameDriver::new(&glyphs, Animation::default(), BufferConfig::default());
    let mut target = RecordingTarget::new();
    // Jump to the ring, which has two contours.
    driver.advance(Duration::from_millis(1001));
    driver.advance(Duration::from_millis(1001));
    let stats = driver.frame(Duration::ZERO, &mut target).unwrap();
    assert_eq!(stats.glyph_index, 2);
    assert_eq!(stats.segment_count, 8);
    // Each fan: pivot, four anchors, closing anchor.
    assert_eq!(stats.fan_vertex_count, 12);
    assert_eq!(stats.bytes_used, 8 * SEGMENT_SIZE + 12 * FAN_VERTEX_SIZE);

    let frame = &target.frames[0];
    assert_eq!(frame.bytes.len(), stats.bytes_used);
    assert_eq!(frame.fan_draws(), [0..6, 6..12]);
    assert_eq!(
        frame.layout.fan_base_offset(),
        frame.layout.base_offset + 8 * SEGMENT_SIZE as u64
    );
}

#[test]
fn frame_records_prepass_then_resolve() {
    let glyphs = builtin::glyphs().unwrap();
    let mut driver = FrameDriver::new(&glyphs, Animation::default(), BufferConfig::default());
    let mut target = RecordingTarget::new();
    driver.frame(FRAME, &mut target).unwrap();

    let commands = &target.frames[0].commands;
    let passes: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            Command::BeginPass(kind) => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(passes, [PassKind::Stencil, PassKind::Resolve]);
    let pipelines: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            Command::BindPipeline(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(pipelines, PipelineId::ALL);
    assert_eq!(commands.last(), Some(&Command::EndPass));
}

#[test]
fn overflowing_frame_is_not_submitted() {
    let glyphs = builtin::glyphs().unwrap();
    // Room for the square but not for the ring.
    let config = BufferConfig::new(4 * SEGMENT_SIZE + 6 * FAN_VERTEX_SIZE);
    let mut driver = FrameDriver::new(&glyphs, Animation::default(), config);
    let mut target = RecordingTarget::new();
    driver.frame(FRAME, &mut target).unwrap();

    driver.advance(Duration::from_millis(1001));
    driver.advance(Duration::from_millis(1001));
    let err = driver.frame(Duration::ZERO, &mut target).unwrap_err();
    assert!(matches!(err, Error::PartitionOverflow { .. }));
    assert_eq!(target.frames.len(), 1);
    // The failed frame keeps its partition for the next attempt.
    assert_eq!(driver.current_partition(), 1);
}

#[test]
fn scale_grows_while_a_glyph_is_shown() {
    let glyphs = builtin::glyphs().unwrap();
    let mut driver = FrameDriver::new(&glyphs, Animation::default(), BufferConfig::default());
    let mut target = RecordingTarget::new();
    let scales: Vec<_> = (0..5)
        .map(|_| {
            driver
                .frame(Duration::from_millis(200), &mut target)
                .unwrap()
                .scale
        })
        .collect();
    assert!(scales.windows(2).all(|w| w[0] < w[1]));
    assert!(scales.iter().all(|s| (0.1..=0.4).contains(s)));

    // Past the display duration the next glyph starts small again.
    let stats = driver.frame(Duration::from_millis(200), &mut target).unwrap();
    assert_eq!(stats.glyph_index, 1);
    assert_eq!(stats.scale, 0.1);
}
