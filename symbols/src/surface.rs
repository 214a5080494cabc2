//! The drawing surface symbols render onto.  Implemented by rendering backends; the handle
//! types are created and owned by the backend and only passed through here.

use sympath::{Transform2, Vec2};

/// Backend pen: color, width, caps and joins of a stroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PenHandle(pub u32);

/// Backend area fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BrushHandle(pub u32);

/// Backend glyph, drawn around its own origin with x along the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GlyphHandle(pub u32);

pub trait DrawSurface {
  fn stroke_polyline(&mut self, points: &[Vec2], pen: PenHandle);

  /// Fills the even-odd union of `rings`.
  fn fill_polygons(&mut self, rings: &[Vec<Vec2>], brush: BrushHandle);

  fn stamp_glyph(&mut self, glyph: GlyphHandle, transform: &Transform2);

  /// Stamps a glyph that must be clipped to the even-odd union of `clip`.  Surfaces without
  /// clipping support draw it unclipped.
  fn stamp_glyph_clipped(&mut self, glyph: GlyphHandle, transform: &Transform2, clip: &[Vec<Vec2>]) {
    let _ = clip;
    self.stamp_glyph(glyph, transform);
  }
}
