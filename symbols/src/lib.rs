//! Map symbol placement: dash patterns, glyph decorations along lines, and area hatching and
//! pattern tiling, computed from [`sympath`] paths and handed to a [`DrawSurface`].

pub mod dash;
pub mod glyph;
pub mod pattern;
pub mod surface;
pub mod symdef;

pub use sympath::{self, ErrorStack, Metric, PointKind, SymPath, Transform2, Vec2};

pub use self::{
  dash::{
    compute_dashes, dash_pieces, gap_count, DashOutput, DashSpec, DecreaseProfile, SecondaryGaps,
    SpacingMethod,
  },
  glyph::{
    place_glyphs, place_glyphs_with_full_length, GlyphInstance, GlyphLocation,
    GlyphPlacementSpec, CORNER_STRETCH_LIMIT, MIN_GLYPH_SCALE,
  },
  pattern::{
    hatch_lines, tile_pattern, AreaPath, FillMode, HatchSpec, Irregularity, PatternSpec,
    PatternTile, MAX_PATTERN_TILES,
  },
  surface::{BrushHandle, DrawSurface, GlyphHandle, PenHandle},
  symdef::{AreaSymbolDef, DoubleLine, LineSymbolDef, SymbolDef},
};
