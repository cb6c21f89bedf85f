// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small table of hand-made glyphs, usable without a font file.
//!
//! Every glyph lives in a 100 by 100 unit em box.

use crate::glyph::{Glyph, GlyphSet};
use crate::Result;

const EM_BOX: [f32; 4] = [0.0, 0.0, 100.0, 100.0];

/// Four quadratic arcs approximating a circle, with controls on the corners of its square.
///
/// Counter-clockwise (in y-up font units) starting at the rightmost point, unless `reverse`.
pub fn arc_chain(cx: f32, cy: f32, r: f32, reverse: bool) -> Vec<f32> {
    let mut points = vec![
        [cx + r, cy],
        [cx + r, cy + r],
        [cx, cy + r],
        [cx - r, cy + r],
        [cx - r, cy],
        [cx - r, cy - r],
        [cx, cy - r],
        [cx + r, cy - r],
        [cx + r, cy],
    ];
    if reverse {
        points.reverse();
    }
    points.into_iter().flatten().collect()
}

/// A square made of four straight segments.
pub fn square() -> Result<Glyph> {
    Glyph::from_raw(
        "square",
        EM_BOX,
        [vec![
            10., 10., 50., 10., 90., 10., 90., 50., 90., 90., 50., 90., 10., 90., 10., 50., 10.,
            10.,
        ]],
    )
}

pub fn circle() -> Result<Glyph> {
    Glyph::from_raw("circle", EM_BOX, [arc_chain(50., 50., 40., false)])
}

/// A circle with a round hole, the inner contour running the other way.
pub fn ring() -> Result<Glyph> {
    Glyph::from_raw(
        "ring",
        EM_BOX,
        [
            arc_chain(50., 50., 40., false),
            arc_chain(50., 50., 20., true),
        ],
    )
}

/// A square whose top edge bulges inwards.
pub fn notch() -> Result<Glyph> {
    Glyph::from_raw(
        "notch",
        EM_BOX,
        [vec![
            10., 10., 50., 10., 90., 10., 90., 50., 90., 90., 50., 50., 10., 90., 10., 50., 10.,
            10.,
        ]],
    )
}

/// All built-in glyphs, in display order.
pub fn glyphs() -> Result<GlyphSet> {
    GlyphSet::new(vec![square()?, circle()?, ring()?, notch()?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_glyphs_are_valid() {
        let set = glyphs().unwrap();
        let names: Vec<_> = set.iter().map(Glyph::name).collect();
        assert_eq!(names, ["square", "circle", "ring", "notch"]);
        assert_eq!(set[2].contours().len(), 2);
        assert_eq!(set[1].segment_count(), 4);
    }

    #[test]
    fn reversed_chain_is_closed() {
        let chain = arc_chain(0., 0., 1., true);
        assert_eq!(chain.len(), 18);
        assert_eq!(chain[..2], chain[16..]);
        assert_eq!(chain[..2], [1., 0.]);
    }
}
