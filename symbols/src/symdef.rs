//! Line and area symbol definitions: the parameters of a symbol plus the logic that turns a
//! path into drawing calls on a [`DrawSurface`].

use sympath::{ErrorStack, Metric, Rect, SymPath, Vec2};

use crate::{
  dash::{dash_pieces, DashSpec},
  glyph::{place_glyphs_with_full_length, GlyphPlacementSpec},
  pattern::{hatch_lines, tile_pattern, AreaPath, FillMode, HatchSpec, PatternSpec},
  surface::{BrushHandle, DrawSurface, GlyphHandle, PenHandle},
};

fn polyline(path: &SymPath) -> Vec<Vec2> {
  path.flattened().positions().collect()
}

/// Two borders running parallel to the line on either side.
#[derive(Clone, Debug, PartialEq)]
pub struct DoubleLine {
  /// Distance of each border from the center line.
  pub offset: f32,
  pub pen: PenHandle,
  pub width: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineSymbolDef {
  /// Main stroke.  `None` (or a zero width) draws only the decorations.
  pub pen: Option<PenHandle>,
  pub width: f32,
  pub dash: Option<DashSpec>,
  pub glyphs: Vec<(GlyphHandle, GlyphPlacementSpec)>,
  pub double_line: Option<DoubleLine>,
  pub shorten_start: f32,
  pub shorten_end: f32,
  pub miter_limit: f32,
  /// Sub-path set to draw; `None` ignores the path's segment flags.
  pub subpath_bit: Option<u32>,
  pub metric: Metric,
}

impl LineSymbolDef {
  pub fn new(pen: PenHandle, width: f32) -> Self {
    LineSymbolDef {
      pen: Some(pen),
      width,
      dash: None,
      glyphs: Vec::new(),
      double_line: None,
      shorten_start: 0.,
      shorten_end: 0.,
      miter_limit: 4.,
      subpath_bit: None,
      metric: Metric::Euclidean,
    }
  }

  pub fn draw(&self, path: &SymPath, surface: &mut dyn DrawSurface) -> Result<(), ErrorStack> {
    let pieces = match self.subpath_bit {
      Some(bit) => path.subpaths(bit),
      None => vec![path.clone()],
    };
    for piece in &pieces {
      self
        .draw_piece(piece, surface)
        .map_err(|err| err.wrap("Error drawing line symbol"))?;
    }
    Ok(())
  }

  fn draw_piece(&self, path: &SymPath, surface: &mut dyn DrawSurface) -> Result<(), ErrorStack> {
    let full_length = path.length(self.metric);
    let Some(trimmed) = path.shorten(self.shorten_start, self.shorten_end, self.metric)? else {
      log::debug!("line of length {full_length} vanished after shortening");
      return Ok(());
    };

    if let Some(pen) = self.pen.filter(|_| self.width > 0.) {
      match &self.dash {
        Some(dash) => {
          for piece in dash_pieces(&trimmed, dash, self.metric)? {
            surface.stroke_polyline(&polyline(&piece), pen);
          }
        }
        None => surface.stroke_polyline(&polyline(&trimmed), pen),
      }
    }

    if let Some(double) = &self.double_line {
      for side in [1., -1.] {
        let border = trimmed.offset_right(side * double.offset, self.miter_limit);
        surface.stroke_polyline(&polyline(&border), double.pen);
      }
    }

    for (glyph, spec) in &self.glyphs {
      let instances = place_glyphs_with_full_length(
        &trimmed,
        full_length - self.shorten_start,
        spec,
        self.metric,
      )?;
      for instance in instances {
        surface.stamp_glyph(*glyph, &instance.transform());
      }
    }
    Ok(())
  }

  pub fn has_pen(&self, pen: PenHandle) -> bool {
    self.pen == Some(pen) || self.double_line.as_ref().is_some_and(|d| d.pen == pen)
  }

  /// Bounds of the strokes drawn for `path`.  Glyph extents are backend knowledge and are not
  /// included.
  pub fn calc_bounds(&self, path: &SymPath) -> Rect {
    let miter = path.max_miter_factor().min(self.miter_limit.max(1.));
    let mut extent = self.width / 2. * miter;
    if let Some(double) = &self.double_line {
      extent = extent.max((double.offset.abs() + double.width / 2.) * miter);
    }
    path.bounding_box().inflate(extent)
  }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct AreaSymbolDef {
  pub brush: Option<BrushHandle>,
  pub hatches: Vec<(PenHandle, HatchSpec)>,
  pub pattern: Option<(GlyphHandle, PatternSpec)>,
  pub border: Option<LineSymbolDef>,
}

impl AreaSymbolDef {
  pub fn draw(&self, area: &AreaPath, surface: &mut dyn DrawSurface) -> Result<(), ErrorStack> {
    let rings = area.polygons();
    if let Some(brush) = self.brush {
      surface.fill_polygons(&rings, brush);
    }

    for (pen, hatch) in &self.hatches {
      let lines = hatch_lines(area, hatch).map_err(|err| err.wrap("Error hatching area"))?;
      for line in lines {
        surface.stroke_polyline(&line, *pen);
      }
    }

    if let Some((glyph, spec)) = &self.pattern {
      let tiles = tile_pattern(area, spec).map_err(|err| err.wrap("Error tiling area pattern"))?;
      for tile in tiles {
        if spec.fill_mode == FillMode::Clip {
          surface.stamp_glyph_clipped(*glyph, &tile.transform(), &rings);
        } else {
          surface.stamp_glyph(*glyph, &tile.transform());
        }
      }
    }

    if let Some(border) = &self.border {
      for ring in area.rings() {
        border.draw(ring, surface)?;
      }
    }
    Ok(())
  }

  pub fn has_pen(&self, pen: PenHandle) -> bool {
    self.hatches.iter().any(|(hatch_pen, _)| *hatch_pen == pen)
      || self.border.as_ref().is_some_and(|b| b.has_pen(pen))
  }

  pub fn calc_bounds(&self, area: &AreaPath) -> Rect {
    match &self.border {
      Some(border) => area
        .rings()
        .fold(area.bounding_box(), |acc, ring| acc.union(&border.calc_bounds(ring))),
      None => area.bounding_box(),
    }
  }
}

/// Any symbol that can be drawn along a path or inside an area.
#[derive(Clone, Debug, PartialEq)]
pub enum SymbolDef {
  Line(LineSymbolDef),
  Area(AreaSymbolDef),
}

impl SymbolDef {
  /// Line symbols are drawn along the outline and every hole.
  pub fn draw(&self, geometry: &AreaPath, surface: &mut dyn DrawSurface) -> Result<(), ErrorStack> {
    match self {
      SymbolDef::Line(def) => {
        for ring in geometry.rings() {
          def.draw(ring, surface)?;
        }
        Ok(())
      }
      SymbolDef::Area(def) => def.draw(geometry, surface),
    }
  }

  pub fn has_pen(&self, pen: PenHandle) -> bool {
    match self {
      SymbolDef::Line(def) => def.has_pen(pen),
      SymbolDef::Area(def) => def.has_pen(pen),
    }
  }

  pub fn has_brush(&self, brush: BrushHandle) -> bool {
    match self {
      SymbolDef::Line(_) => false,
      SymbolDef::Area(def) => def.brush == Some(brush),
    }
  }

  pub fn calc_bounds(&self, geometry: &AreaPath) -> Rect {
    match self {
      SymbolDef::Line(def) => geometry
        .rings()
        .map(|ring| def.calc_bounds(ring))
        .fold(Rect::empty(), |acc, r| acc.union(&r)),
      SymbolDef::Area(def) => def.calc_bounds(geometry),
    }
  }
}

#[cfg(test)]
mod tests {
  use sympath::{PointKind, Transform2};

  use super::*;
  use crate::glyph::GlyphLocation;

  #[derive(Default)]
  struct RecordingSurface {
    strokes: Vec<(Vec<Vec2>, PenHandle)>,
    fills: Vec<(usize, BrushHandle)>,
    glyphs: Vec<(GlyphHandle, Transform2, bool)>,
  }

  impl DrawSurface for RecordingSurface {
    fn stroke_polyline(&mut self, points: &[Vec2], pen: PenHandle) {
      self.strokes.push((points.to_vec(), pen));
    }

    fn fill_polygons(&mut self, rings: &[Vec<Vec2>], brush: BrushHandle) {
      self.fills.push((rings.len(), brush));
    }

    fn stamp_glyph(&mut self, glyph: GlyphHandle, transform: &Transform2) {
      self.glyphs.push((glyph, *transform, false));
    }

    fn stamp_glyph_clipped(&mut self, glyph: GlyphHandle, transform: &Transform2, _clip: &[Vec<Vec2>]) {
      self.glyphs.push((glyph, *transform, true));
    }
  }

  fn assert_vec2_close(actual: Vec2, expected: Vec2) {
    let diff = (actual - expected).norm();
    assert!(
      diff < 1e-3,
      "Expected {expected:?}, got {actual:?} (diff {diff})"
    );
  }

  fn line(len: f32) -> SymPath {
    SymPath::from_polyline(vec![Vec2::new(0., 0.), Vec2::new(len, 0.)]).unwrap()
  }

  fn square() -> SymPath {
    SymPath::new(
      vec![
        Vec2::new(0., 0.),
        Vec2::new(10., 0.),
        Vec2::new(10., 10.),
        Vec2::new(0., 10.),
        Vec2::new(0., 0.),
      ],
      vec![PointKind::Corner; 5],
      None,
    )
    .unwrap()
  }

  const PEN: PenHandle = PenHandle(1);
  const BORDER_PEN: PenHandle = PenHandle(2);
  const GLYPH: GlyphHandle = GlyphHandle(7);

  #[test]
  fn dashed_line_strokes_each_dash() {
    let mut def = LineSymbolDef::new(PEN, 0.5);
    def.dash = Some(DashSpec::new(10., 5.));
    let mut surface = RecordingSurface::default();
    def.draw(&line(40.), &mut surface).unwrap();
    assert_eq!(surface.strokes.len(), 3);
    assert!(surface.strokes.iter().all(|(_, pen)| *pen == PEN));
    assert_vec2_close(surface.strokes[2].0[0], Vec2::new(30., 0.));
  }

  #[test]
  fn shortened_line_with_end_glyph() {
    let mut def = LineSymbolDef::new(PEN, 0.5);
    def.shorten_start = 2.;
    def.shorten_end = 3.;
    def
      .glyphs
      .push((GLYPH, GlyphPlacementSpec::new(GlyphLocation::End)));
    let mut surface = RecordingSurface::default();
    def.draw(&line(40.), &mut surface).unwrap();

    let (points, _) = &surface.strokes[0];
    assert_vec2_close(points[0], Vec2::new(2., 0.));
    assert_vec2_close(points[points.len() - 1], Vec2::new(37., 0.));

    assert_eq!(surface.glyphs.len(), 1);
    let (glyph, transform, clipped) = &surface.glyphs[0];
    assert_eq!(*glyph, GLYPH);
    assert!(!clipped);
    assert_vec2_close(transform.apply_point(Vec2::zeros()), Vec2::new(40., 0.));
  }

  #[test]
  fn fully_shortened_line_draws_nothing() {
    let mut def = LineSymbolDef::new(PEN, 0.5);
    def.shorten_start = 30.;
    def.shorten_end = 30.;
    let mut surface = RecordingSurface::default();
    def.draw(&line(40.), &mut surface).unwrap();
    assert!(surface.strokes.is_empty());
  }

  #[test]
  fn double_line_borders() {
    let mut def = LineSymbolDef::new(PEN, 2.);
    def.pen = None;
    def.double_line = Some(DoubleLine {
      offset: 1.,
      pen: BORDER_PEN,
      width: 0.2,
    });
    let mut surface = RecordingSurface::default();
    def.draw(&line(10.), &mut surface).unwrap();
    assert_eq!(surface.strokes.len(), 2);
    assert_vec2_close(surface.strokes[0].0[0], Vec2::new(0., -1.));
    assert_vec2_close(surface.strokes[1].0[1], Vec2::new(10., 1.));
    assert!(def.has_pen(BORDER_PEN));
    assert!(!def.has_pen(PEN));
  }

  #[test]
  fn hidden_subpaths_are_skipped() {
    let path = SymPath::new(
      vec![Vec2::new(0., 0.), Vec2::new(10., 0.), Vec2::new(20., 0.), Vec2::new(30., 0.)],
      vec![PointKind::Normal; 4],
      Some(vec![0, 1, 0]),
    )
    .unwrap();
    let mut def = LineSymbolDef::new(PEN, 1.);
    def.subpath_bit = Some(0);
    let mut surface = RecordingSurface::default();
    def.draw(&path, &mut surface).unwrap();
    assert_eq!(surface.strokes.len(), 2);

    def.subpath_bit = None;
    let mut surface = RecordingSurface::default();
    def.draw(&path, &mut surface).unwrap();
    assert_eq!(surface.strokes.len(), 1);
  }

  #[test]
  fn line_bounds_include_miters() {
    let def = LineSymbolDef::new(PEN, 2.);
    let bounds = def.calc_bounds(&square());
    let extent = std::f32::consts::SQRT_2;
    assert_vec2_close(bounds.min, Vec2::new(-extent, -extent));
    assert_vec2_close(bounds.max, Vec2::new(10. + extent, 10. + extent));
  }

  #[test]
  fn area_symbol_draws_every_layer() {
    let area = AreaPath::new(
      square(),
      vec![SymPath::from_polyline(vec![
        Vec2::new(4., 4.),
        Vec2::new(6., 4.),
        Vec2::new(6., 6.),
        Vec2::new(4., 6.),
        Vec2::new(4., 4.),
      ])
      .unwrap()],
    );
    let def = SymbolDef::Area(AreaSymbolDef {
      brush: Some(BrushHandle(3)),
      hatches: vec![(
        PEN,
        HatchSpec {
          spacing: 2.,
          line_width: 0.1,
          angle_degrees: 0.,
          offset: 1.,
        },
      )],
      pattern: Some((GLYPH, PatternSpec::new(5., 5.))),
      border: Some(LineSymbolDef::new(BORDER_PEN, 0.3)),
    });

    let mut surface = RecordingSurface::default();
    def.draw(&area, &mut surface).unwrap();
    assert_eq!(surface.fills, vec![(2, BrushHandle(3))]);
    let hatch_count = surface.strokes.iter().filter(|(_, pen)| *pen == PEN).count();
    assert_eq!(hatch_count, 6);
    let border_count = surface
      .strokes
      .iter()
      .filter(|(_, pen)| *pen == BORDER_PEN)
      .count();
    assert_eq!(border_count, 2);
    assert!(!surface.glyphs.is_empty());
    assert!(surface.glyphs.iter().all(|(glyph, _, clipped)| *glyph == GLYPH && *clipped));

    assert!(def.has_pen(PEN));
    assert!(def.has_pen(BORDER_PEN));
    assert!(!def.has_pen(PenHandle(99)));
    assert!(def.has_brush(BrushHandle(3)));
    let bounds = def.calc_bounds(&area);
    assert!(bounds.min.x < 0. && bounds.max.x > 10.);
  }

  #[test]
  fn line_symbol_on_area_geometry_draws_all_rings() {
    let def = SymbolDef::Line(LineSymbolDef::new(PEN, 1.));
    let hole = square()
      .transformed(&Transform2::scaling(0.5, 0.5))
      .unwrap();
    let area = AreaPath::new(square(), vec![hole]);
    let mut surface = RecordingSurface::default();
    def.draw(&area, &mut surface).unwrap();
    assert_eq!(surface.strokes.len(), 2);
    assert!(!def.has_brush(BrushHandle(3)));
  }

  #[test]
  fn invalid_specs_surface_as_errors() {
    let mut def = LineSymbolDef::new(PEN, 1.);
    def.dash = Some(DashSpec::new(0., 0.));
    let err = def
      .draw(&line(10.), &mut RecordingSurface::default())
      .unwrap_err();
    assert_eq!(err.errors.last().map(String::as_str), Some("Error drawing line symbol"));
  }
}
