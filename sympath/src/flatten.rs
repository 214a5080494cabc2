//! Conversion of a [`SymPath`] into a bezier-free polyline.
//!
//! Every flattened point remembers where it came from (element index and curve parameter) so
//! that positions found on the polyline can be mapped back onto the original path for
//! splitting, and so corner / dash-marker classification survives flattening.

use crate::{
  geom::{cubic_flatness, cubic_point, split_cubic, Metric},
  path::{Element, PointKind, SymPath},
  Vec2,
};

/// Flattening stops subdividing a curve after this many halvings (at most 2^10 pieces per curve).
pub const MAX_FLATTEN_DEPTH: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatPoint {
  pub pos: Vec2,
  /// Kind of the original point, or `Normal` for points generated while subdividing curves.
  pub kind: PointKind,
  /// `true` for points generated while subdividing curves.
  pub interpolated: bool,
  /// Element this point starts (or lies within).  The final point refers to the last element
  /// with `t == 1`.
  pub element: usize,
  pub t: f32,
}

/// Location on the flattened polyline: `alpha` of the way along flat segment `seg`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatLocation {
  pub seg: usize,
  pub alpha: f32,
  pub pos: Vec2,
}

/// Location on the original path's elements.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementLocation {
  pub element: usize,
  pub t: f32,
}

#[derive(Debug)]
pub struct FlatPath {
  pub points: Vec<FlatPoint>,
  /// Index into `points` for every original point that is not a bezier control point.
  pub(crate) point_to_flat: Vec<Option<usize>>,
  euclidean: Vec<f32>,
  skewed: Vec<f32>,
}

impl FlatPath {
  pub(crate) fn build(path: &SymPath) -> FlatPath {
    let tolerance = path.settings().tolerance;
    let src_points = path.points();
    let kinds = path.kinds();

    let mut points = Vec::with_capacity(src_points.len());
    let mut point_to_flat = vec![None; src_points.len()];

    for (element_ix, element) in path.elements().enumerate() {
      let start_ix = path.element_start(element_ix);
      point_to_flat[start_ix] = Some(points.len());
      points.push(FlatPoint {
        pos: src_points[start_ix],
        kind: kinds[start_ix],
        interpolated: false,
        element: element_ix,
        t: 0.,
      });

      if let Element::Cubic { p0, c1, c2, p3 } = element {
        let mut samples = Vec::new();
        flatten_cubic([p0, c1, c2, p3], 0., 1., tolerance, 0, &mut samples);
        for (t, pos) in samples {
          points.push(FlatPoint {
            pos,
            kind: PointKind::Normal,
            interpolated: true,
            element: element_ix,
            t,
          });
        }
      }
    }

    let last_ix = src_points.len() - 1;
    point_to_flat[last_ix] = Some(points.len());
    points.push(FlatPoint {
      pos: src_points[last_ix],
      kind: kinds[last_ix],
      interpolated: false,
      element: path.element_count() - 1,
      t: 1.,
    });

    let euclidean = cumulative(&points, Metric::Euclidean);
    let skewed = cumulative(&points, Metric::Skewed);

    FlatPath {
      points,
      point_to_flat,
      euclidean,
      skewed,
    }
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
    self.points.iter().map(|p| p.pos)
  }

  /// Cumulative distance from the start to each flattened point.
  pub fn cumulative(&self, metric: Metric) -> &[f32] {
    match metric {
      Metric::Euclidean => &self.euclidean,
      Metric::Skewed => &self.skewed,
    }
  }

  pub fn total_length(&self, metric: Metric) -> f32 {
    self.cumulative(metric).last().copied().unwrap_or(0.)
  }

  /// Flattened index of original point `point_ix`, or `None` for bezier control points.
  pub fn flat_index_of(&self, point_ix: usize) -> Option<usize> {
    self.point_to_flat.get(point_ix).copied().flatten()
  }

  /// Finds the location at `distance` along the polyline, clamped to the path ends.
  pub fn locate(&self, distance: f32, metric: Metric) -> FlatLocation {
    let cum = self.cumulative(metric);
    let last_seg = self.points.len() - 2;
    if distance.is_nan() || distance <= 0. {
      return FlatLocation {
        seg: 0,
        alpha: 0.,
        pos: self.points[0].pos,
      };
    }
    let total = cum[cum.len() - 1];
    if distance >= total {
      return FlatLocation {
        seg: last_seg,
        alpha: 1.,
        pos: self.points[last_seg + 1].pos,
      };
    }

    // first index whose cumulative distance reaches `distance`; always >= 1 here
    let ix = cum.partition_point(|&c| c < distance).max(1);
    let seg = ix - 1;
    let span = cum[ix] - cum[seg];
    let alpha = if span > 0. {
      common::clamp((distance - cum[seg]) / span, 0., 1.)
    } else {
      1.
    };
    let a = self.points[seg].pos;
    let b = self.points[ix].pos;
    FlatLocation {
      seg,
      alpha,
      pos: a + (b - a) * alpha,
    }
  }

  /// Maps a polyline location back onto the original path's elements.
  pub fn to_element_location(&self, loc: FlatLocation) -> ElementLocation {
    let start = &self.points[loc.seg];
    let end = &self.points[loc.seg + 1];
    let t_end = if end.element == start.element {
      end.t
    } else {
      1.
    };
    ElementLocation {
      element: start.element,
      t: start.t + (t_end - start.t) * loc.alpha,
    }
  }
}

fn cumulative(points: &[FlatPoint], metric: Metric) -> Vec<f32> {
  let mut out = Vec::with_capacity(points.len());
  let mut total = 0.;
  out.push(0.);
  for pair in points.windows(2) {
    total += metric.distance(pair[0].pos, pair[1].pos);
    out.push(total);
  }
  out
}

/// Recursively subdivides a cubic until each piece is within `tolerance` of its chord, pushing
/// the interior split points (excluding both curve ends) with their parameter on the original
/// curve.
fn flatten_cubic(
  [p0, c1, c2, p3]: [Vec2; 4],
  t0: f32,
  t1: f32,
  tolerance: f32,
  depth: u32,
  out: &mut Vec<(f32, Vec2)>,
) {
  if depth >= MAX_FLATTEN_DEPTH || cubic_flatness(p0, c1, c2, p3) <= tolerance {
    return;
  }

  let (left, right) = split_cubic(p0, c1, c2, p3, 0.5);
  let t_mid = (t0 + t1) * 0.5;
  flatten_cubic(left, t0, t_mid, tolerance, depth + 1, out);
  out.push((t_mid, left[3]));
  flatten_cubic(right, t_mid, t1, tolerance, depth + 1, out);
}

/// Evaluates `element` at parameter `t`.
pub fn element_point(element: Element, t: f32) -> Vec2 {
  match element {
    Element::Line { start, end } => start + (end - start) * t,
    Element::Cubic { p0, c1, c2, p3 } => cubic_point(p0, c1, c2, p3, t),
  }
}
