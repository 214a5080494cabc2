//! The immutable symbol path: points tagged with kinds, optional per-step sub-path flags, and
//! lazily derived data (flattened polyline, lengths, bounds, miter factor).

use std::sync::Arc;

use once_cell::race::OnceBox;

use crate::{
  error::ErrorStack,
  flatten::FlatPath,
  geom::{miter_factor, turn_angle, Metric, Rect, LENGTH_EPSILON},
  Vec2,
};

/// Default maximum distance between a curve and its flattened polyline, in map units.
pub const DEFAULT_FLATTEN_TOLERANCE: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PointKind {
  #[default]
  Normal,
  BezierControl,
  /// Direction-change boundary: delimits dash segments and receives corner glyphs.
  Corner,
  /// Manually placed dash break.
  DashMarker,
}

impl PointKind {
  pub fn is_anchor(self) -> bool {
    self != PointKind::BezierControl
  }
}

/// Bitmask stored per point-step.  Bit `b` set means the element starting at that point is
/// excluded from sub-path set `b`.
pub type SegmentFlags = u8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlattenSettings {
  pub tolerance: f32,
}

impl Default for FlattenSettings {
  fn default() -> Self {
    FlattenSettings {
      tolerance: DEFAULT_FLATTEN_TOLERANCE,
    }
  }
}

/// One drawable piece of a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Element {
  Line {
    start: Vec2,
    end: Vec2,
  },
  Cubic {
    p0: Vec2,
    c1: Vec2,
    c2: Vec2,
    p3: Vec2,
  },
}

impl Element {
  /// Number of point-steps the element spans.
  pub fn steps(&self) -> usize {
    match self {
      Element::Line { .. } => 1,
      Element::Cubic { .. } => 3,
    }
  }

  pub fn start(&self) -> Vec2 {
    match self {
      Element::Line { start, .. } => *start,
      Element::Cubic { p0, .. } => *p0,
    }
  }

  pub fn end(&self) -> Vec2 {
    match self {
      Element::Line { end, .. } => *end,
      Element::Cubic { p3, .. } => *p3,
    }
  }
}

#[derive(Debug)]
pub(crate) struct PathStats {
  pub bounds: Rect,
  pub max_miter: f32,
}

struct PathInner {
  points: Vec<Vec2>,
  kinds: Vec<PointKind>,
  flags: Option<Vec<SegmentFlags>>,
  settings: FlattenSettings,
  /// Index of the first point of each element.
  element_starts: Vec<usize>,
  flat: OnceBox<FlatPath>,
  stats: OnceBox<PathStats>,
}

/// Immutable path.  Cloning is cheap and shares the memoized derived data.
///
/// Derived data lives in `OnceBox`es: two threads racing on first access may both compute it,
/// but only one fully-built value is ever published and readers never see a partial one.
#[derive(Clone)]
pub struct SymPath {
  inner: Arc<PathInner>,
}

impl SymPath {
  pub fn new(
    points: Vec<Vec2>,
    kinds: Vec<PointKind>,
    flags: Option<Vec<SegmentFlags>>,
  ) -> Result<Self, ErrorStack> {
    Self::with_settings(points, kinds, flags, FlattenSettings::default())
  }

  pub fn with_settings(
    points: Vec<Vec2>,
    kinds: Vec<PointKind>,
    flags: Option<Vec<SegmentFlags>>,
    settings: FlattenSettings,
  ) -> Result<Self, ErrorStack> {
    validate(&points, &kinds, flags.as_deref(), settings)
      .map_err(|err| err.wrap("Invalid path"))?;
    Ok(Self::from_validated(points, kinds, flags, settings))
  }

  /// Straight polyline with every point `Normal`.
  pub fn from_polyline(points: Vec<Vec2>) -> Result<Self, ErrorStack> {
    let kinds = vec![PointKind::Normal; points.len()];
    Self::new(points, kinds, None)
  }

  /// Caller guarantees the invariants checked by `validate`.
  pub(crate) fn from_validated(
    points: Vec<Vec2>,
    kinds: Vec<PointKind>,
    flags: Option<Vec<SegmentFlags>>,
    settings: FlattenSettings,
  ) -> Self {
    debug_assert!(validate(&points, &kinds, flags.as_deref(), settings).is_ok());

    let flags = flags.filter(|flags| flags.iter().any(|&f| f != 0));

    let mut element_starts = Vec::new();
    let mut ix = 0;
    while ix + 1 < points.len() {
      element_starts.push(ix);
      ix += if kinds[ix + 1] == PointKind::BezierControl {
        3
      } else {
        1
      };
    }

    SymPath {
      inner: Arc::new(PathInner {
        points,
        kinds,
        flags,
        settings,
        element_starts,
        flat: OnceBox::new(),
        stats: OnceBox::new(),
      }),
    }
  }

  pub fn points(&self) -> &[Vec2] {
    &self.inner.points
  }

  pub fn kinds(&self) -> &[PointKind] {
    &self.inner.kinds
  }

  /// Per-step flags, or `None` when every step is in every sub-path set.
  pub fn flags(&self) -> Option<&[SegmentFlags]> {
    self.inner.flags.as_deref()
  }

  pub fn settings(&self) -> FlattenSettings {
    self.inner.settings
  }

  pub fn first_point(&self) -> Vec2 {
    self.inner.points[0]
  }

  pub fn last_point(&self) -> Vec2 {
    self.inner.points[self.inner.points.len() - 1]
  }

  pub fn is_closed(&self) -> bool {
    self.first_point() == self.last_point()
  }

  pub fn is_zero_length(&self) -> bool {
    let first = self.first_point();
    self.inner.points.iter().all(|p| *p == first)
  }

  pub fn element_count(&self) -> usize {
    self.inner.element_starts.len()
  }

  /// Index of the first point of element `element_ix`.
  pub fn element_start(&self, element_ix: usize) -> usize {
    self.inner.element_starts[element_ix]
  }

  pub fn element(&self, element_ix: usize) -> Element {
    let ix = self.inner.element_starts[element_ix];
    let pts = &self.inner.points;
    if self.inner.kinds[ix + 1] == PointKind::BezierControl {
      Element::Cubic {
        p0: pts[ix],
        c1: pts[ix + 1],
        c2: pts[ix + 2],
        p3: pts[ix + 3],
      }
    } else {
      Element::Line {
        start: pts[ix],
        end: pts[ix + 1],
      }
    }
  }

  pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
    (0..self.element_count()).map(move |ix| self.element(ix))
  }

  /// Flag governing element `element_ix` (the flag of its first step).
  pub fn element_flags(&self, element_ix: usize) -> SegmentFlags {
    match &self.inner.flags {
      Some(flags) => flags[self.inner.element_starts[element_ix]],
      None => 0,
    }
  }

  pub fn flattened(&self) -> &FlatPath {
    self
      .inner
      .flat
      .get_or_init(|| Box::new(FlatPath::build(self)))
  }

  fn stats(&self) -> &PathStats {
    self.inner.stats.get_or_init(|| Box::new(self.build_stats()))
  }

  fn build_stats(&self) -> PathStats {
    let flat = self.flattened();
    let bounds = Rect::from_points(flat.points.iter().map(|p| &p.pos));

    let mut max_miter: f32 = 1.;
    for ix in 0..flat.len() {
      if flat.points[ix].interpolated || flat.points[ix].kind != PointKind::Corner {
        continue;
      }
      if let (Some(d_in), Some(d_out)) = self.flat_directions(ix) {
        max_miter = max_miter.max(miter_factor(turn_angle(d_in, d_out)));
      }
    }

    PathStats { bounds, max_miter }
  }

  /// Bounds of the path itself.  Bezier control points only contribute through the curve.
  pub fn bounding_box(&self) -> Rect {
    self.stats().bounds
  }

  /// Largest miter factor over the `Corner` points, 1 when there are none.
  pub fn max_miter_factor(&self) -> f32 {
    self.stats().max_miter
  }

  pub fn length(&self, metric: Metric) -> f32 {
    self.flattened().total_length(metric)
  }

  /// Incoming and outgoing unit directions at flattened point `flat_ix`, skipping zero-length
  /// pieces.  Closed paths wrap around at their ends.
  pub fn flat_directions(&self, flat_ix: usize) -> (Option<Vec2>, Option<Vec2>) {
    let flat = &self.flattened().points;
    let n = flat.len();
    let closed = self.is_closed();
    let here = flat[flat_ix].pos;

    // the last point of a closed path duplicates the first one, so wrapping skips it
    let wrap_back = if closed { flat_ix + 1..n - 1 } else { 0..0 };
    let d_in = (0..flat_ix)
      .rev()
      .chain(wrap_back.rev())
      .map(|ix| here - flat[ix].pos)
      .find(|v| v.norm() > LENGTH_EPSILON)
      .map(|v| v.normalize());

    let wrap_forward = if closed { 1..flat_ix } else { 0..0 };
    let d_out = (flat_ix + 1..n)
      .chain(wrap_forward)
      .map(|ix| flat[ix].pos - here)
      .find(|v| v.norm() > LENGTH_EPSILON)
      .map(|v| v.normalize());

    (d_in, d_out)
  }
}

impl std::fmt::Debug for SymPath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SymPath")
      .field("points", &self.inner.points)
      .field("kinds", &self.inner.kinds)
      .field("flags", &self.inner.flags)
      .finish()
  }
}

fn validate(
  points: &[Vec2],
  kinds: &[PointKind],
  flags: Option<&[SegmentFlags]>,
  settings: FlattenSettings,
) -> Result<(), ErrorStack> {
  if points.len() < 2 {
    return Err(ErrorStack::new(format!(
      "a path needs at least 2 points, found {}",
      points.len()
    )));
  }
  if points.len() != kinds.len() {
    return Err(ErrorStack::new(format!(
      "point count ({}) does not match point kind count ({})",
      points.len(),
      kinds.len()
    )));
  }
  if let Some((ix, p)) = points
    .iter()
    .enumerate()
    .find(|(_, p)| !p.x.is_finite() || !p.y.is_finite())
  {
    return Err(ErrorStack::new(format!(
      "point {ix} has non-finite coordinates: {p:?}"
    )));
  }
  if !(settings.tolerance > 0.) {
    return Err(ErrorStack::new(format!(
      "flattening tolerance must be positive, found {}",
      settings.tolerance
    )));
  }
  if kinds[0] == PointKind::BezierControl || kinds[kinds.len() - 1] == PointKind::BezierControl {
    return Err(ErrorStack::new(
      "a path cannot start or end with a bezier control point",
    ));
  }

  let mut ix = 0;
  while ix < kinds.len() {
    if kinds[ix] != PointKind::BezierControl {
      ix += 1;
      continue;
    }
    let run_start = ix;
    while ix < kinds.len() && kinds[ix] == PointKind::BezierControl {
      ix += 1;
    }
    let run_len = ix - run_start;
    if run_len != 2 {
      return Err(ErrorStack::new(format!(
        "bezier control points must come in pairs; found a run of {run_len} starting at point \
         {run_start}"
      )));
    }
  }

  if let Some(flags) = flags {
    if flags.len() != points.len() - 1 {
      return Err(ErrorStack::new(format!(
        "expected {} segment flags (one per segment), found {}",
        points.len() - 1,
        flags.len()
      )));
    }
  }

  Ok(())
}
