//! Stateless geometry helpers shared by the path engine and the symbol algorithms.

use std::f32::consts::PI;

use nalgebra::{Affine2, Matrix3, Point2};

use crate::Vec2;

/// Distances at or below this are treated as zero when deciding whether a segment has a
/// direction.
pub const LENGTH_EPSILON: f32 = 1e-5;

/// Distance function used when measuring along a path.
///
/// `Skewed` is `max(|dx|, |dy|) + min(|dx|, |dy|) / 2`.  It only exists so that dash and
/// text-on-path placement can match files produced by the legacy engine; nothing defaults to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Metric {
  #[default]
  Euclidean,
  Skewed,
}

impl Metric {
  #[inline]
  pub fn distance(self, a: Vec2, b: Vec2) -> f32 {
    match self {
      Metric::Euclidean => (b - a).norm(),
      Metric::Skewed => skewed_distance(a, b),
    }
  }
}

#[inline]
pub fn skewed_distance(a: Vec2, b: Vec2) -> f32 {
  let dx = (b.x - a.x).abs();
  let dy = (b.y - a.y).abs();
  if dx > dy {
    dx + dy / 2.
  } else {
    dy + dx / 2.
  }
}

#[inline(always)]
pub fn lerp_vec2(a: Vec2, b: Vec2, t: f32) -> Vec2 {
  a + (b - a) * t
}

/// Angle of `v` in degrees, counter-clockwise from the positive x axis.
pub fn angle_degrees(v: Vec2) -> f32 {
  v.y.atan2(v.x).to_degrees()
}

/// Unit normal pointing to the right of travel direction `dir` (y axis up).
#[inline]
pub fn right_normal(dir: Vec2) -> Vec2 {
  Vec2::new(dir.y, -dir.x)
}

/// Angle in radians, in `[0, PI]`, that the direction of travel turns through going from
/// `d_in` to `d_out`.  Both must be non-zero.
pub fn turn_angle(d_in: Vec2, d_out: Vec2) -> f32 {
  let denom = d_in.norm() * d_out.norm();
  if denom <= 0. {
    return 0.;
  }
  let cos = common::clamp(d_in.dot(&d_out) / denom, -1., 1.);
  cos.acos()
}

/// How far a miter join extends, relative to the half line width, when the line turns by
/// `turn` radians.  Infinite for a full reversal.
pub fn miter_factor(turn: f32) -> f32 {
  let c = (turn / 2.).cos();
  if c <= LENGTH_EPSILON {
    f32::INFINITY
  } else {
    1. / c
  }
}

/// Axis-aligned bounding rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
  pub min: Vec2,
  pub max: Vec2,
}

impl Rect {
  pub fn empty() -> Self {
    Rect {
      min: Vec2::new(f32::INFINITY, f32::INFINITY),
      max: Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
    }
  }

  pub fn new(min: Vec2, max: Vec2) -> Self {
    Rect { min, max }
  }

  pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec2>) -> Self {
    let mut rect = Rect::empty();
    for p in points {
      rect.extend(*p);
    }
    rect
  }

  pub fn is_empty(&self) -> bool {
    self.min.x > self.max.x || self.min.y > self.max.y
  }

  pub fn extend(&mut self, p: Vec2) {
    self.min.x = self.min.x.min(p.x);
    self.min.y = self.min.y.min(p.y);
    self.max.x = self.max.x.max(p.x);
    self.max.y = self.max.y.max(p.y);
  }

  pub fn union(&self, other: &Rect) -> Rect {
    let mut out = *self;
    if !other.is_empty() {
      out.extend(other.min);
      out.extend(other.max);
    }
    out
  }

  pub fn inflate(&self, amount: f32) -> Rect {
    if self.is_empty() {
      return *self;
    }
    let d = Vec2::new(amount, amount);
    Rect {
      min: self.min - d,
      max: self.max + d,
    }
  }

  pub fn width(&self) -> f32 {
    (self.max.x - self.min.x).max(0.)
  }

  pub fn height(&self) -> f32 {
    (self.max.y - self.min.y).max(0.)
  }

  pub fn center(&self) -> Vec2 {
    (self.min + self.max) * 0.5
  }

  pub fn contains(&self, p: Vec2) -> bool {
    p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
  }

  pub fn intersects(&self, other: &Rect) -> bool {
    !(self.is_empty()
      || other.is_empty()
      || other.min.x > self.max.x
      || other.max.x < self.min.x
      || other.min.y > self.max.y
      || other.max.y < self.min.y)
  }

  /// Corners in counter-clockwise order starting at `min`.
  pub fn corners(&self) -> [Vec2; 4] {
    [
      self.min,
      Vec2::new(self.max.x, self.min.y),
      self.max,
      Vec2::new(self.min.x, self.max.y),
    ]
  }
}

/// 2x3 affine transform, stored as a homogeneous 3x3 matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2 {
  matrix: Matrix3<f32>,
}

impl Default for Transform2 {
  fn default() -> Self {
    Self::identity()
  }
}

impl Transform2 {
  pub fn identity() -> Self {
    Transform2 {
      matrix: Matrix3::identity(),
    }
  }

  /// Builds a transform from the six coefficients of `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
  pub fn from_2x3(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
    Transform2 {
      matrix: Matrix3::new(a, c, e, b, d, f, 0., 0., 1.),
    }
  }

  pub fn translation(offset: Vec2) -> Self {
    Transform2 {
      matrix: Matrix3::new_translation(&offset),
    }
  }

  pub fn rotation_degrees(degrees: f32) -> Self {
    Transform2 {
      matrix: Matrix3::new_rotation(degrees.to_radians()),
    }
  }

  pub fn scaling(sx: f32, sy: f32) -> Self {
    Transform2 {
      matrix: Matrix3::new_nonuniform_scaling(&Vec2::new(sx, sy)),
    }
  }

  /// Returns the transform that applies `self` first and then `next`.
  pub fn then(&self, next: &Transform2) -> Transform2 {
    Transform2 {
      matrix: next.matrix * self.matrix,
    }
  }

  /// Scale, then rotate, then translate.  This is the placement transform of a glyph.
  pub fn placement(position: Vec2, angle_degrees: f32, scale: Vec2) -> Transform2 {
    Transform2::scaling(scale.x, scale.y)
      .then(&Transform2::rotation_degrees(angle_degrees))
      .then(&Transform2::translation(position))
  }

  pub fn apply_point(&self, p: Vec2) -> Vec2 {
    self.matrix.transform_point(&Point2::from(p)).coords
  }

  pub fn apply_vector(&self, v: Vec2) -> Vec2 {
    self.matrix.transform_vector(&v)
  }

  pub fn inverse(&self) -> Option<Transform2> {
    self
      .matrix
      .try_inverse()
      .map(|matrix| Transform2 { matrix })
  }

  pub fn matrix(&self) -> &Matrix3<f32> {
    &self.matrix
  }

  pub fn to_affine(&self) -> Affine2<f32> {
    Affine2::from_matrix_unchecked(self.matrix)
  }

  /// `[a, b, c, d, e, f]` in the same order as [`Transform2::from_2x3`].
  pub fn as_2x3(&self) -> [f32; 6] {
    let m = &self.matrix;
    [m[(0, 0)], m[(1, 0)], m[(0, 1)], m[(1, 1)], m[(0, 2)], m[(1, 2)]]
  }
}

pub fn cubic_point(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
  let u = 1.0 - t;
  let tt = t * t;
  let uu = u * u;
  let uuu = uu * u;
  let ttt = tt * t;
  uuu * p0 + 3.0 * uu * t * p1 + 3.0 * u * tt * p2 + ttt * p3
}

pub fn cubic_derivative(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
  let u = 1.0 - t;
  3.0 * u * u * (p1 - p0) + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
}

/// De Casteljau subdivision of a cubic at `t`.  Both halves share the point on the curve at `t`.
pub fn split_cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> ([Vec2; 4], [Vec2; 4]) {
  let p01 = lerp_vec2(p0, p1, t);
  let p12 = lerp_vec2(p1, p2, t);
  let p23 = lerp_vec2(p2, p3, t);
  let p012 = lerp_vec2(p01, p12, t);
  let p123 = lerp_vec2(p12, p23, t);
  let mid = lerp_vec2(p012, p123, t);
  ([p0, p01, p012, mid], [mid, p123, p23, p3])
}

/// Undoes [`split_cubic`]: the cubic that `left` and `right` were cut from, provided every
/// control point agrees with that split to within `epsilon`.
pub fn unsplit_cubic(left: [Vec2; 4], right: [Vec2; 4], epsilon: f32) -> Option<[Vec2; 4]> {
  let [p0, p01, p012, mid] = left;
  let [_, p123, p23, p3] = right;
  let span = p123 - p012;
  let span_sq = span.norm_squared();
  if span_sq <= LENGTH_EPSILON * LENGTH_EPSILON {
    return None;
  }
  let t = (mid - p012).dot(&span) / span_sq;
  if !(t > 0. && t < 1.) {
    return None;
  }

  let p1 = p0 + (p01 - p0) / t;
  let p2 = p3 + (p23 - p3) / (1. - t);
  let (l, r) = split_cubic(p0, p1, p2, p3, t);
  let agrees = l
    .iter()
    .chain(&r)
    .zip(left.iter().chain(&right))
    .all(|(a, b)| (a - b).norm() <= epsilon);
  agrees.then_some([p0, p1, p2, p3])
}

fn distance_to_line(p: Vec2, a: Vec2, b: Vec2) -> f32 {
  let ab = b - a;
  let len = ab.norm();
  if len <= LENGTH_EPSILON {
    return (p - a).norm();
  }
  (ab.x * (p.y - a.y) - ab.y * (p.x - a.x)).abs() / len
}

/// Upper bound on how far the curve strays from its chord: the control points' distance from
/// the chord line.
pub fn cubic_flatness(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> f32 {
  distance_to_line(p1, p0, p3).max(distance_to_line(p2, p0, p3))
}

/// Closest point on segment `a`-`b` to `p`, returned as the interpolation parameter in `[0, 1]`.
pub fn project_onto_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
  let ab = b - a;
  let len_sq = ab.norm_squared();
  if len_sq <= LENGTH_EPSILON * LENGTH_EPSILON {
    return 0.;
  }
  common::clamp((p - a).dot(&ab) / len_sq, 0., 1.)
}

pub fn normalize_degrees(mut degrees: f32) -> f32 {
  while degrees > 180. {
    degrees -= 360.;
  }
  while degrees <= -180. {
    degrees += 360.;
  }
  degrees
}

pub const HALF_PI: f32 = PI / 2.;

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_vec2_close(actual: Vec2, expected: Vec2) {
    let diff = (actual - expected).norm();
    assert!(
      diff < 1e-4,
      "Expected {expected:?}, got {actual:?} (diff {diff})"
    );
  }

  #[test]
  fn skewed_metric_matches_definition() {
    let a = Vec2::new(0., 0.);
    assert_eq!(skewed_distance(a, Vec2::new(4., 2.)), 5.);
    assert_eq!(skewed_distance(a, Vec2::new(-2., 4.)), 5.);
    assert_eq!(skewed_distance(a, Vec2::new(3., 0.)), 3.);
    assert_eq!(Metric::Euclidean.distance(a, Vec2::new(3., 4.)), 5.);
    assert_eq!(Metric::Skewed.distance(a, Vec2::new(3., 4.)), 5.5);
  }

  #[test]
  fn miter_factor_values() {
    assert!((miter_factor(0.) - 1.).abs() < 1e-6);
    assert!((miter_factor(HALF_PI) - std::f32::consts::SQRT_2).abs() < 1e-5);
    assert!(miter_factor(PI).is_infinite());
  }

  #[test]
  fn turn_angle_of_right_angle() {
    let turn = turn_angle(Vec2::new(1., 0.), Vec2::new(0., 1.));
    assert!((turn - HALF_PI).abs() < 1e-6);
    assert_eq!(turn_angle(Vec2::new(1., 0.), Vec2::new(2., 0.)), 0.);
  }

  #[test]
  fn unsplit_cubic_recovers_original() {
    let cubic = [
      Vec2::new(0., 0.),
      Vec2::new(2., 6.),
      Vec2::new(9., 7.),
      Vec2::new(12., 1.),
    ];
    for t in [0.05, 0.3, 0.9] {
      let (left, right) = split_cubic(cubic[0], cubic[1], cubic[2], cubic[3], t);
      let merged = unsplit_cubic(left, right, 1e-3).unwrap();
      for (a, b) in merged.iter().zip(&cubic) {
        assert_vec2_close(*a, *b);
      }
    }

    // a smooth seam between unrelated curves is not mistaken for a split
    let (left, mut right) = split_cubic(cubic[0], cubic[1], cubic[2], cubic[3], 0.5);
    right[2] += Vec2::new(0.5, 0.5);
    assert!(unsplit_cubic(left, right, 1e-3).is_none());
  }

  #[test]
  fn split_cubic_shares_midpoint() {
    let (p0, p1, p2, p3) = (
      Vec2::new(0., 0.),
      Vec2::new(0., 1.),
      Vec2::new(1., 1.),
      Vec2::new(1., 0.),
    );
    let (left, right) = split_cubic(p0, p1, p2, p3, 0.3);
    let on_curve = cubic_point(p0, p1, p2, p3, 0.3);
    assert_vec2_close(left[3], on_curve);
    assert_vec2_close(right[0], on_curve);
    // a point on the left half maps back to the original parameterization
    assert_vec2_close(
      cubic_point(left[0], left[1], left[2], left[3], 0.5),
      cubic_point(p0, p1, p2, p3, 0.15),
    );
    assert_vec2_close(
      cubic_point(right[0], right[1], right[2], right[3], 0.5),
      cubic_point(p0, p1, p2, p3, 0.65),
    );
  }

  #[test]
  fn transform_composition() {
    let t = Transform2::placement(Vec2::new(10., 5.), 90., Vec2::new(2., 1.));
    assert_vec2_close(t.apply_point(Vec2::new(1., 0.)), Vec2::new(10., 7.));
    assert_vec2_close(t.apply_vector(Vec2::new(0., 1.)), Vec2::new(-1., 0.));
    let inv = t.inverse().unwrap();
    assert_vec2_close(inv.apply_point(Vec2::new(10., 7.)), Vec2::new(1., 0.));

    let raw = Transform2::from_2x3(1., 2., 3., 4., 5., 6.);
    assert_eq!(raw.as_2x3(), [1., 2., 3., 4., 5., 6.]);
    assert_vec2_close(raw.apply_point(Vec2::new(1., 1.)), Vec2::new(9., 12.));
    let affine = raw.to_affine();
    assert_vec2_close(
      (affine * Point2::new(1., 1.)).coords,
      Vec2::new(9., 12.),
    );
  }

  #[test]
  fn rect_ops() {
    let mut r = Rect::empty();
    assert!(r.is_empty());
    r.extend(Vec2::new(1., 2.));
    r.extend(Vec2::new(-1., 4.));
    assert_eq!(r.min, Vec2::new(-1., 2.));
    assert_eq!(r.max, Vec2::new(1., 4.));
    assert!(r.contains(Vec2::new(0., 3.)));
    assert!(!r.contains(Vec2::new(0., 5.)));
    let grown = r.inflate(1.);
    assert_eq!(grown.width(), 4.);
    assert_eq!(grown.height(), 4.);
    assert!(grown.intersects(&r));
    assert_eq!(r.corners()[2], r.max);
  }

  #[test]
  fn flatness_of_straight_cubic_is_zero() {
    let f = cubic_flatness(
      Vec2::new(0., 0.),
      Vec2::new(1., 0.),
      Vec2::new(2., 0.),
      Vec2::new(3., 0.),
    );
    assert!(f < 1e-6);
  }

  #[test]
  fn projection_clamps() {
    let a = Vec2::new(0., 0.);
    let b = Vec2::new(10., 0.);
    assert_eq!(project_onto_segment(Vec2::new(5., 3.), a, b), 0.5);
    assert_eq!(project_onto_segment(Vec2::new(-5., 3.), a, b), 0.);
    assert_eq!(project_onto_segment(Vec2::new(15., 3.), a, b), 1.);
  }

  #[test]
  fn degrees_are_normalized() {
    assert_eq!(normalize_degrees(270.), -90.);
    assert_eq!(normalize_degrees(-180.), 180.);
    assert!((angle_degrees(Vec2::new(0., 1.)) - 90.).abs() < 1e-4);
  }
}
