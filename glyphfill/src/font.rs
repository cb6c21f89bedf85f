// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loading glyph outlines from a TrueType or OpenType font.

use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef, MetadataProvider};

use crate::glyph::{Bounds, Contour, Glyph, GlyphSet, MIN_SEGMENTS};
use crate::{Error, Result};

impl GlyphSet {
    /// Builds a glyph set from the outlines of the characters in `text`, in order.
    ///
    /// Outlines are read unscaled, in font units, at the default location of a variable font.
    /// Characters without an outline, such as spaces, are skipped. Fails if the font can't be
    /// read, maps no glyph for a character, or no character has an outline.
    pub fn from_font(data: &[u8], text: &str) -> Result<Self> {
        let font = FontRef::new(data)?;
        let charmap = font.charmap();
        let outlines = font.outline_glyphs();
        let mut glyphs = Vec::new();
        for ch in text.chars() {
            let glyph_id = charmap.map(ch).ok_or(Error::MissingGlyph(ch))?;
            let Some(outline) = outlines.get(glyph_id) else {
                log::warn!("no outline for {ch:?}, skipping");
                continue;
            };
            let mut pen = ChainPen::default();
            outline
                .draw(
                    DrawSettings::unhinted(Size::unscaled(), LocationRef::default()),
                    &mut pen,
                )
                .map_err(Error::Draw)?;
            match pen.into_glyph(ch.to_string()) {
                Ok(glyph) => glyphs.push(glyph),
                Err(err @ (Error::EmptyGlyph { .. } | Error::DegenerateBounds { .. })) => {
                    log::warn!("{err}, skipping");
                }
                Err(err) => return Err(err),
            }
        }
        Self::new(glyphs)
    }
}

/// Collects pen commands into quadratic chains.
///
/// Lines become quadratics with their control at the midpoint. Cubics are reduced to the
/// single quadratic whose control is the average of the two candidates `(3c0 - p0) / 2` and
/// `(3c1 - p3) / 2`. Open subpaths are closed with a line.
#[derive(Debug, Default)]
pub(crate) struct ChainPen {
    contours: Vec<Vec<f32>>,
    current: Vec<f32>,
    start: [f32; 2],
    last: [f32; 2],
}

impl ChainPen {
    fn begin_if_needed(&mut self) {
        if self.current.is_empty() {
            self.current.extend(self.last);
            self.start = self.last;
        }
    }

    fn push(&mut self, control: [f32; 2], end: [f32; 2]) {
        self.begin_if_needed();
        self.current.extend(control);
        self.current.extend(end);
        self.last = end;
    }

    fn finish_contour(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let coords = std::mem::take(&mut self.current);
        let segments = coords.len().saturating_sub(2) / 4;
        if segments < MIN_SEGMENTS {
            log::warn!("dropping contour with {segments} segments");
            return;
        }
        self.contours.push(coords);
    }

    /// Finishes the last contour and validates the result.
    pub(crate) fn into_glyph(mut self, name: String) -> Result<Glyph> {
        self.close();
        let all: Vec<f32> = self.contours.iter().flatten().copied().collect();
        let Some(bounds) = Bounds::from_coords(&all) else {
            if self.contours.is_empty() {
                return Err(Error::EmptyGlyph { glyph: name });
            }
            return Err(Error::DegenerateBounds { glyph: name });
        };
        let contours = self
            .contours
            .into_iter()
            .enumerate()
            .map(|(ix, coords)| {
                Contour::new(coords).map_err(|source| Error::InvalidContour {
                    glyph: name.clone(),
                    contour: ix,
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Glyph::new(name, bounds, contours)
    }
}

impl OutlinePen for ChainPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.finish_contour();
        self.current.extend([x, y]);
        self.start = [x, y];
        self.last = [x, y];
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let [x0, y0] = self.last;
        self.push([(x0 + x) * 0.5, (y0 + y) * 0.5], [x, y]);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.push([cx0, cy0], [x, y]);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let [x0, y0] = self.last;
        let cx = (3.0 * (cx0 + cx1) - x0 - x) * 0.25;
        let cy = (3.0 * (cy0 + cy1) - y0 - y) * 0.25;
        self.push([cx, cy], [x, y]);
    }

    fn close(&mut self) {
        if !self.current.is_empty() && self.last != self.start {
            let [x, y] = self.start;
            self.line_to(x, y);
        }
        self.finish_contour();
    }
}
