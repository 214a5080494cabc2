//! Pure measurement queries over a [`SymPath`].

use float_ord::FloatOrd;

use crate::{
  flatten::FlatLocation,
  geom::{project_onto_segment, Metric, LENGTH_EPSILON},
  path::{PointKind, SymPath},
  Vec2,
};

/// Result of [`SymPath::distance_from_point`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointDistance {
  pub distance: f32,
  pub closest: Vec2,
  /// Euclidean distance along the path from its start to `closest`.
  pub along: f32,
}

/// Which classified points split a path into dash segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SegmentBreak {
  #[default]
  CornersAndDashMarkers,
  Corners,
  DashMarkers,
  None,
}

impl SegmentBreak {
  pub fn breaks_at(self, kind: PointKind) -> bool {
    match self {
      SegmentBreak::CornersAndDashMarkers => {
        kind == PointKind::Corner || kind == PointKind::DashMarker
      }
      SegmentBreak::Corners => kind == PointKind::Corner,
      SegmentBreak::DashMarkers => kind == PointKind::DashMarker,
      SegmentBreak::None => false,
    }
  }
}

/// A run of the path between two break points, measured along the path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSpan {
  pub start: f32,
  pub length: f32,
}

impl PathSpan {
  pub fn end(&self) -> f32 {
    self.start + self.length
  }
}

/// A classified point of the path and its distance from the start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifiedPoint {
  pub point_ix: usize,
  pub flat_ix: usize,
  pub kind: PointKind,
  pub pos: Vec2,
  pub distance: f32,
}

impl SymPath {
  /// Point at `distance` along the path, clamped to the path ends.
  pub fn point_at_length(&self, distance: f32, metric: Metric) -> Vec2 {
    self.flattened().locate(distance, metric).pos
  }

  pub fn locate(&self, distance: f32, metric: Metric) -> FlatLocation {
    self.flattened().locate(distance, metric)
  }

  /// Unit direction of travel at `distance`.  Zero-length pieces are skipped, looking forward
  /// first; a zero-length path reports the positive x axis.
  pub fn tangent_at_length(&self, distance: f32, metric: Metric) -> Vec2 {
    let flat = &self.flattened().points;
    let loc = self.locate(distance, metric);
    let forward = (loc.seg..flat.len() - 1).map(|seg| flat[seg + 1].pos - flat[seg].pos);
    let backward = (0..loc.seg).rev().map(|seg| flat[seg + 1].pos - flat[seg].pos);
    forward
      .chain(backward)
      .find(|v| v.norm() > LENGTH_EPSILON)
      .map(|v| v.normalize())
      .unwrap_or_else(|| Vec2::new(1., 0.))
  }

  /// Even-odd test against the flattened outline, treated as closed even when the path isn't.
  ///
  /// Points exactly on the boundary are classified by the half-open crossing rule, so the
  /// answer for them is arbitrary but stable.
  pub fn is_inside(&self, pt: Vec2) -> bool {
    let flat = &self.flattened().points;
    let n = flat.len();
    let mut inside = false;
    for ix in 0..n {
      let a = flat[ix].pos;
      let b = flat[(ix + 1) % n].pos;
      if (a.y > pt.y) != (b.y > pt.y) {
        let x_cross = a.x + (pt.y - a.y) * (b.x - a.x) / (b.y - a.y);
        if pt.x < x_cross {
          inside = !inside;
        }
      }
    }
    inside
  }

  /// Closest location on the flattened path to `pt`.  Ties resolve to the earliest segment.
  pub fn closest_location(&self, pt: Vec2) -> (f32, FlatLocation) {
    let flat = &self.flattened().points;
    (0..flat.len() - 1)
      .map(|seg| {
        let a = flat[seg].pos;
        let b = flat[seg + 1].pos;
        let alpha = project_onto_segment(pt, a, b);
        let pos = a + (b - a) * alpha;
        ((pt - pos).norm(), FlatLocation { seg, alpha, pos })
      })
      .min_by_key(|(dist, loc)| (FloatOrd(*dist), loc.seg))
      .unwrap_or((
        (pt - flat[0].pos).norm(),
        FlatLocation {
          seg: 0,
          alpha: 0.,
          pos: flat[0].pos,
        },
      ))
  }

  pub fn distance_from_point(&self, pt: Vec2) -> PointDistance {
    let (distance, loc) = self.closest_location(pt);
    let cum = self.flattened().cumulative(Metric::Euclidean);
    let seg_start = self.flattened().points[loc.seg].pos;
    PointDistance {
      distance,
      closest: loc.pos,
      along: cum[loc.seg] + (loc.pos - seg_start).norm(),
    }
  }

  /// Non-interpolated points whose kind matches `pred`, in path order, with their distance
  /// from the start.
  pub fn classified_points(
    &self,
    metric: Metric,
    pred: impl Fn(PointKind) -> bool,
  ) -> Vec<ClassifiedPoint> {
    let flat = self.flattened();
    let cum = flat.cumulative(metric);
    (0..self.points().len())
      .filter_map(|point_ix| {
        let flat_ix = flat.flat_index_of(point_ix)?;
        let fp = &flat.points[flat_ix];
        if !pred(fp.kind) {
          return None;
        }
        Some(ClassifiedPoint {
          point_ix,
          flat_ix,
          kind: fp.kind,
          pos: fp.pos,
          distance: cum[flat_ix],
        })
      })
      .collect()
  }

  /// Splits the path at interior points selected by `breaks` into consecutive spans covering
  /// the whole length.  Zero-length spans caused by repeated break points are kept so span
  /// indices line up with break points.
  pub fn segments(&self, breaks: SegmentBreak, metric: Metric) -> Vec<PathSpan> {
    let total = self.length(metric);
    let last_ix = self.points().len() - 1;
    let mut spans = Vec::new();
    let mut start = 0.;
    for cp in self.classified_points(metric, |kind| breaks.breaks_at(kind)) {
      if cp.point_ix == 0 || cp.point_ix == last_ix {
        continue;
      }
      spans.push(PathSpan {
        start,
        length: cp.distance - start,
      });
      start = cp.distance;
    }
    spans.push(PathSpan {
      start,
      length: total - start,
    });
    spans
  }
}
