//! Tiling of area interiors with glyph patterns and hatch lines.

use std::ops::RangeInclusive;

use float_ord::FloatOrd;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use sympath::{ErrorStack, Rect, SymPath, Transform2, Vec2, LENGTH_EPSILON};

/// Cap on grid cells (or hatch lines) considered for one area.
pub const MAX_PATTERN_TILES: usize = 250_000;

/// An area outline with optional holes.  Inside-ness is even-odd across all rings.
#[derive(Clone, Debug)]
pub struct AreaPath {
  pub outline: SymPath,
  pub holes: Vec<SymPath>,
}

impl AreaPath {
  pub fn new(outline: SymPath, holes: Vec<SymPath>) -> Self {
    AreaPath { outline, holes }
  }

  pub fn rings(&self) -> impl Iterator<Item = &SymPath> + '_ {
    std::iter::once(&self.outline).chain(self.holes.iter())
  }

  pub fn bounding_box(&self) -> Rect {
    self.outline.bounding_box()
  }

  pub fn is_inside(&self, pt: Vec2) -> bool {
    if !pt.x.is_finite() || !pt.y.is_finite() {
      log::warn!("skipping inside test for non-finite point {pt:?}");
      return false;
    }
    self.rings().filter(|ring| ring.is_inside(pt)).count() % 2 == 1
  }

  /// Flattened rings, outline first.
  pub fn polygons(&self) -> Vec<Vec<Vec2>> {
    self
      .rings()
      .map(|ring| ring.flattened().positions().collect())
      .collect()
  }
}

impl From<SymPath> for AreaPath {
  fn from(outline: SymPath) -> Self {
    AreaPath::new(outline, Vec::new())
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FillMode {
  /// Every tile touching the area's bounds; the drawing surface clips them to the area.
  #[default]
  Clip,
  FullyInside,
  CenterInside,
  PartiallyInside,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Irregularity {
  /// Largest jitter as a fraction of the tile width.
  pub max_x: f32,
  /// Largest jitter as a fraction of the tile height.
  pub max_y: f32,
  /// Tiles landing closer than this to an earlier neighbour are dropped.
  pub min_distance: f32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PatternSpec {
  pub width: f32,
  pub height: f32,
  pub angle_degrees: f32,
  pub fill_mode: FillMode,
  /// Shift every odd row by half a tile.
  pub row_offset: bool,
  pub irregular: Option<Irregularity>,
  /// Center of tile `(0, 0)`.
  pub origin: Vec2,
}

impl PatternSpec {
  pub fn new(width: f32, height: f32) -> Self {
    PatternSpec {
      width,
      height,
      angle_degrees: 0.,
      fill_mode: FillMode::default(),
      row_offset: false,
      irregular: None,
      origin: Vec2::zeros(),
    }
  }

  pub fn validate(&self) -> Result<(), ErrorStack> {
    if !(self.width > 0.) || !(self.height > 0.) || !self.width.is_finite() || !self.height.is_finite()
    {
      return Err(ErrorStack::new(format!(
        "pattern tiles must have a positive size, found {}x{}",
        self.width, self.height
      )));
    }
    if !self.angle_degrees.is_finite() || !self.origin.x.is_finite() || !self.origin.y.is_finite() {
      return Err(ErrorStack::new("pattern angle and origin must be finite"));
    }
    if let Some(irregular) = &self.irregular {
      for (name, value) in [("x", irregular.max_x), ("y", irregular.max_y)] {
        if !(0. ..=1.).contains(&value) {
          return Err(ErrorStack::new(format!(
            "max {name} irregularity must be within [0, 1], found {value}"
          )));
        }
      }
      if !(irregular.min_distance >= 0.) || !irregular.min_distance.is_finite() {
        return Err(ErrorStack::new(format!(
          "minimum tile distance must be a non-negative number, found {}",
          irregular.min_distance
        )));
      }
    }
    Ok(())
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternTile {
  pub grid: (i32, i32),
  pub center: Vec2,
  pub angle_degrees: f32,
}

impl PatternTile {
  pub fn transform(&self) -> Transform2 {
    Transform2::placement(self.center, self.angle_degrees, Vec2::new(1., 1.))
  }
}

/// The rotated tile grid of a pattern.  Grid-local x runs along the pattern's angle.
struct PatternGrid<'a> {
  spec: &'a PatternSpec,
  rotation: Transform2,
  unrotation: Transform2,
  to_world: Transform2,
}

impl<'a> PatternGrid<'a> {
  fn new(spec: &'a PatternSpec) -> Self {
    let rotation = Transform2::rotation_degrees(spec.angle_degrees);
    let to_world = rotation.then(&Transform2::translation(spec.origin));
    PatternGrid {
      spec,
      rotation,
      unrotation: Transform2::rotation_degrees(-spec.angle_degrees),
      to_world,
    }
  }

  fn to_local(&self, p: Vec2) -> Vec2 {
    self.unrotation.apply_vector(p - self.spec.origin)
  }

  /// Tile center in grid-local coordinates, before jitter.
  fn local_center(&self, i: i32, j: i32) -> Vec2 {
    let shift = if self.spec.row_offset && j.rem_euclid(2) == 1 {
      0.5
    } else {
      0.
    };
    Vec2::new(
      (i as f32 + shift) * self.spec.width,
      j as f32 * self.spec.height,
    )
  }

  /// World-space tile center including jitter.  Depends only on the grid coordinates.
  fn center(&self, i: i32, j: i32) -> Vec2 {
    let mut local = self.local_center(i, j);
    if let Some(irregular) = &self.spec.irregular {
      let mut rng = common::tile_rng(i, j);
      local.x += common::random_signed(&mut rng) * irregular.max_x * self.spec.width;
      local.y += common::random_signed(&mut rng) * irregular.max_y * self.spec.height;
    }
    self.to_world.apply_point(local)
  }

  fn corners(&self, center: Vec2) -> SmallVec<[Vec2; 4]> {
    let half_w = self.spec.width / 2.;
    let half_h = self.spec.height / 2.;
    [(-1., -1.), (1., -1.), (1., 1.), (-1., 1.)]
      .into_iter()
      .map(|(sx, sy)| center + self.rotation.apply_vector(Vec2::new(sx * half_w, sy * half_h)))
      .collect()
  }

  /// Grid coordinates of every cell that could hold a tile overlapping `bounds`.
  fn covering(&self, bounds: &Rect) -> (RangeInclusive<i32>, RangeInclusive<i32>) {
    let corners: SmallVec<[Vec2; 4]> = bounds.corners().iter().map(|c| self.to_local(*c)).collect();
    let local = Rect::from_points(corners.iter());
    // one extra cell on every side for row shifts and jitter
    let cell = |v: f32, size: f32, round: fn(f32) -> f32, pad: i64| {
      let ix = round(v / size) as i64 + pad;
      ix.clamp(i32::MIN as i64 / 2, i32::MAX as i64 / 2) as i32
    };
    let i_min = cell(local.min.x, self.spec.width, f32::floor, -1);
    let mut i_max = cell(local.max.x, self.spec.width, f32::ceil, 1);
    let j_min = cell(local.min.y, self.spec.height, f32::floor, -1);
    let mut j_max = cell(local.max.y, self.spec.height, f32::ceil, 1);

    let columns = (i_max as i64 - i_min as i64 + 1) as usize;
    let rows = (j_max as i64 - j_min as i64 + 1) as usize;
    if columns.saturating_mul(rows) > MAX_PATTERN_TILES {
      log::warn!(
        "pattern grid of {columns}x{rows} cells exceeds the limit of {MAX_PATTERN_TILES}; \
         truncating"
      );
      let columns = columns.min(MAX_PATTERN_TILES);
      let rows = (MAX_PATTERN_TILES / columns).max(1);
      i_max = i_min + (columns as i32 - 1);
      j_max = j_min + (rows as i32 - 1);
    }
    (i_min..=i_max, j_min..=j_max)
  }

  /// Whether the jittered tile at `(i, j)` lands too close to one of the neighbours visited
  /// before it.
  fn crowded(&self, i: i32, j: i32, center: Vec2, min_distance: f32) -> bool {
    [(i - 1, j), (i - 1, j - 1), (i, j - 1), (i + 1, j - 1)]
      .into_iter()
      .any(|(ni, nj)| (self.center(ni, nj) - center).norm() < min_distance)
  }

  fn accepts(&self, area: &AreaPath, bounds: &Rect, center: Vec2) -> bool {
    let corners = self.corners(center);
    match self.spec.fill_mode {
      FillMode::Clip => Rect::from_points(corners.iter()).intersects(bounds),
      FillMode::CenterInside => area.is_inside(center),
      FillMode::FullyInside => {
        area.is_inside(center) && corners.iter().all(|c| area.is_inside(*c))
      }
      FillMode::PartiallyInside => {
        area.is_inside(center) || corners.iter().any(|c| area.is_inside(*c))
      }
    }
  }
}

/// Every tile of `spec` that the fill mode keeps for `area`, row by row.
pub fn tile_pattern(area: &AreaPath, spec: &PatternSpec) -> Result<Vec<PatternTile>, ErrorStack> {
  spec
    .validate()
    .map_err(|err| err.wrap("Invalid pattern spec"))?;

  let bounds = area.bounding_box();
  if bounds.is_empty() {
    return Ok(Vec::new());
  }

  let grid = PatternGrid::new(spec);
  let (columns, rows) = grid.covering(&bounds);
  let min_distance = spec
    .irregular
    .map(|irregular| irregular.min_distance)
    .unwrap_or(0.);

  let mut out = Vec::new();
  for j in rows {
    for i in columns.clone() {
      let center = grid.center(i, j);
      if min_distance > 0. && grid.crowded(i, j, center, min_distance) {
        continue;
      }
      if !grid.accepts(area, &bounds, center) {
        continue;
      }
      out.push(PatternTile {
        grid: (i, j),
        center,
        angle_degrees: spec.angle_degrees,
      });
    }
  }
  Ok(out)
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HatchSpec {
  pub spacing: f32,
  pub line_width: f32,
  pub angle_degrees: f32,
  /// Distance of the first line from the origin, across the line direction.
  pub offset: f32,
}

impl HatchSpec {
  pub fn validate(&self) -> Result<(), ErrorStack> {
    if !(self.spacing > 0.) || !self.spacing.is_finite() {
      return Err(ErrorStack::new(format!(
        "hatch spacing must be positive, found {}",
        self.spacing
      )));
    }
    if !(self.line_width >= 0.) || !self.angle_degrees.is_finite() || !self.offset.is_finite() {
      return Err(ErrorStack::new(
        "hatch line width must be non-negative and its angle and offset finite",
      ));
    }
    Ok(())
  }
}

/// Parallel hatch lines clipped to `area`.  Lines run along `spec.angle_degrees` and are
/// anchored to the world origin.
pub fn hatch_lines(area: &AreaPath, spec: &HatchSpec) -> Result<Vec<[Vec2; 2]>, ErrorStack> {
  spec
    .validate()
    .map_err(|err| err.wrap("Invalid hatch spec"))?;

  let to_world = Transform2::rotation_degrees(spec.angle_degrees);
  let to_local = Transform2::rotation_degrees(-spec.angle_degrees);
  let rings: Vec<Vec<Vec2>> = area
    .polygons()
    .into_iter()
    .map(|ring| ring.into_iter().map(|p| to_local.apply_point(p)).collect())
    .collect();
  let bounds = Rect::from_points(rings.iter().flatten());
  if bounds.is_empty() || bounds.height() <= 0. {
    return Ok(Vec::new());
  }

  let first = ((bounds.min.y - spec.offset) / spec.spacing).ceil() as i64;
  let mut last = ((bounds.max.y - spec.offset) / spec.spacing).floor() as i64;
  if last - first + 1 > MAX_PATTERN_TILES as i64 {
    log::warn!(
      "area needs {} hatch lines, more than the limit of {MAX_PATTERN_TILES}; truncating",
      last - first + 1
    );
    last = first + MAX_PATTERN_TILES as i64 - 1;
  }

  let mut out = Vec::new();
  let mut crossings: Vec<f32> = Vec::new();
  for k in first..=last {
    let y = spec.offset + k as f32 * spec.spacing;
    crossings.clear();
    for ring in &rings {
      for (ix, a) in ring.iter().enumerate() {
        let b = ring[(ix + 1) % ring.len()];
        if (a.y > y) != (b.y > y) {
          crossings.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
        }
      }
    }
    crossings.sort_unstable_by_key(|x| FloatOrd(*x));
    for pair in crossings.chunks_exact(2) {
      if pair[1] - pair[0] <= LENGTH_EPSILON {
        continue;
      }
      out.push([
        to_world.apply_point(Vec2::new(pair[0], y)),
        to_world.apply_point(Vec2::new(pair[1], y)),
      ]);
    }
  }
  Ok(out)
}
