// Copyright 2025 the Glyphfill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph outlines as handed to the renderer.
//!
//! A contour is a flat list of `x, y` pairs forming a closed chain of quadratic Bézier
//! segments: `start, control, end, control, end, ...`, where each segment's end is the next
//! segment's start. A chain of `n` segments therefore holds `2 * n + 1` points, or
//! `4 * n + 2` scalars.
//!
//! Glyphs are validated once, when they are built, so that the render loop never sees a
//! malformed contour or a bounding box it can't normalize against.

use crate::{Error, Result};

/// Minimum number of curve segments in a contour.
///
/// A single segment encloses nothing that its own triangle doesn't already cover, and the fan
/// built from its anchors would be degenerate.
pub const MIN_SEGMENTS: usize = 2;

/// Reasons a coordinate list is not a usable contour.
#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContourError {
    /// The scalar count isn't `4 * n + 2`.
    #[error("{len} coordinates don't form a chain of quadratic segments")]
    Malformed { len: usize },
    /// The chain is well formed but too short.
    #[error("{segments} curve segments, at least 2 are needed")]
    TooFewSegments { segments: usize },
    /// A coordinate is NaN or infinite.
    #[error("coordinate {index} is not finite")]
    NonFinite { index: usize },
}

/// Axis-aligned bounding box in font units, with a finite, non-zero width and height.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
}

impl Bounds {
    /// Creates a bounding box, or `None` if it has no area.
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Option<Self> {
        let bounds = Self {
            x_min,
            y_min,
            x_max,
            y_max,
        };
        bounds.has_area().then_some(bounds)
    }

    /// Also false for NaN and infinite extents.
    fn has_area(&self) -> bool {
        self.width() > 0.0
            && self.height() > 0.0
            && self.width().is_finite()
            && self.height().is_finite()
    }

    /// Smallest box holding every point of a flat `x, y` list.
    pub fn from_coords(coords: &[f32]) -> Option<Self> {
        let mut points = coords.chunks_exact(2);
        let first = points.next()?;
        let (mut x_min, mut y_min) = (first[0], first[1]);
        let (mut x_max, mut y_max) = (x_min, y_min);
        for p in points {
            x_min = x_min.min(p[0]);
            y_min = y_min.min(p[1]);
            x_max = x_max.max(p[0]);
            y_max = y_max.max(p[1]);
        }
        Self::new(x_min, y_min, x_max, y_max)
    }

    pub fn x_min(&self) -> f32 {
        self.x_min
    }

    pub fn y_min(&self) -> f32 {
        self.y_min
    }

    pub fn x_max(&self) -> f32 {
        self.x_max
    }

    pub fn y_max(&self) -> f32 {
        self.y_max
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

/// One closed contour of a glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    coords: Vec<f32>,
}

impl Contour {
    /// Validates a flat `x, y` list as a closed chain of quadratic segments.
    pub fn new(coords: Vec<f32>) -> Result<Self, ContourError> {
        let len = coords.len();
        if len < 6 || (len - 2) % 4 != 0 {
            return Err(ContourError::Malformed { len });
        }
        let segments = (len - 2) / 4;
        if segments < MIN_SEGMENTS {
            return Err(ContourError::TooFewSegments { segments });
        }
        if let Some(index) = coords.iter().position(|c| !c.is_finite()) {
            return Err(ContourError::NonFinite { index });
        }
        Ok(Self { coords })
    }

    /// The raw `x, y` list.
    pub fn coords(&self) -> &[f32] {
        &self.coords
    }

    /// Number of control points, on-curve and off-curve.
    pub fn point_count(&self) -> usize {
        self.coords.len() / 2
    }

    /// Number of quadratic segments in the chain.
    pub fn segment_count(&self) -> usize {
        (self.coords.len() - 2) / 4
    }

    /// Iterates the segments as `[start, control, end]` point triples.
    pub fn segments(&self) -> impl Iterator<Item = [[f32; 2]; 3]> + '_ {
        // Consecutive triples share an endpoint, so step by two points.
        (0..self.segment_count()).map(move |i| {
            let c = &self.coords[i * 4..i * 4 + 6];
            [[c[0], c[1]], [c[2], c[3]], [c[4], c[5]]]
        })
    }
}

/// An immutable glyph outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    name: String,
    bounds: Bounds,
    contours: Vec<Contour>,
}

impl Glyph {
    /// Creates a glyph from already validated parts.
    pub fn new(name: impl Into<String>, bounds: Bounds, contours: Vec<Contour>) -> Result<Self> {
        let name = name.into();
        if !bounds.has_area() {
            return Err(Error::DegenerateBounds { glyph: name });
        }
        if contours.is_empty() {
            return Err(Error::EmptyGlyph { glyph: name });
        }
        Ok(Self {
            name,
            bounds,
            contours,
        })
    }

    /// Creates a glyph from raw data, rejecting it if any part is malformed.
    ///
    /// `bounds` is `[x_min, y_min, x_max, y_max]` in font units.
    pub fn from_raw(
        name: impl Into<String>,
        bounds: [f32; 4],
        contours: impl IntoIterator<Item = Vec<f32>>,
    ) -> Result<Self> {
        let name = name.into();
        let [x_min, y_min, x_max, y_max] = bounds;
        let Some(bounds) = Bounds::new(x_min, y_min, x_max, y_max) else {
            return Err(Error::DegenerateBounds { glyph: name });
        };
        let contours = contours
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
        Self::new(name, bounds, contours)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Total number of curve segments over all contours.
    pub fn segment_count(&self) -> usize {
        self.contours.iter().map(Contour::segment_count).sum()
    }
}

/// A read-only, non-empty collection of glyphs.
///
/// This is the data source the frame driver borrows for its whole lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSet {
    glyphs: Vec<Glyph>,
}

impl GlyphSet {
    pub fn new(glyphs: Vec<Glyph>) -> Result<Self> {
        if glyphs.is_empty() {
            return Err(Error::EmptyGlyphSet);
        }
        log::debug!("Loaded {} glyphs", glyphs.len());
        Ok(Self { glyphs })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false`; a glyph set can't be built empty.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Glyph> {
        self.glyphs.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Glyph> {
        self.glyphs.iter()
    }
}

impl std::ops::Index<usize> for GlyphSet {
    type Output = Glyph;

    fn index(&self, index: usize) -> &Glyph {
        &self.glyphs[index]
    }
}

impl<'a> IntoIterator for &'a GlyphSet {
    type Item = &'a Glyph;
    type IntoIter = std::slice::Iter<'a, Glyph>;

    fn into_iter(self) -> Self::IntoIter {
        self.glyphs.iter()
    }
}
