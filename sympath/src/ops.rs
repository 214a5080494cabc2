//! Operations producing new paths from existing ones: splitting, trimming, joining, offsetting
//! and sub-path extraction.

use crate::{
  error::ErrorStack,
  flatten::ElementLocation,
  geom::{right_normal, split_cubic, unsplit_cubic, Metric, Transform2, LENGTH_EPSILON},
  path::{Element, PointKind, SegmentFlags, SymPath},
  Vec2,
};

/// Raw point data of a path being assembled.
#[derive(Default)]
struct PathParts {
  points: Vec<Vec2>,
  kinds: Vec<PointKind>,
  flags: Vec<SegmentFlags>,
}

impl PathParts {
  fn push_range(&mut self, path: &SymPath, start: usize, end_inclusive: usize) {
    self
      .points
      .extend_from_slice(&path.points()[start..=end_inclusive]);
    self
      .kinds
      .extend_from_slice(&path.kinds()[start..=end_inclusive]);
    self.push_step_flags(path, start, end_inclusive);
  }

  fn push_step_flags(&mut self, path: &SymPath, start: usize, end_point: usize) {
    match path.flags() {
      Some(flags) => self.flags.extend_from_slice(&flags[start..end_point]),
      None => self
        .flags
        .extend(std::iter::repeat(0).take(end_point - start)),
    }
  }

  fn build(self, path: &SymPath) -> SymPath {
    let flags = if self.flags.iter().any(|&f| f != 0) {
      Some(self.flags)
    } else {
      None
    };
    SymPath::from_validated(self.points, self.kinds, flags, path.settings())
  }
}

impl SymPath {
  /// Splits the path at `pt`, which must lie on the path (within the flattening tolerance).
  /// Both halves share the split point.
  pub fn split_at(&self, pt: Vec2) -> Result<(SymPath, SymPath), ErrorStack> {
    let (distance, loc) = self.closest_location(pt);
    let tolerance = self.settings().tolerance.max(LENGTH_EPSILON);
    if distance > tolerance {
      log::error!("split point {pt:?} is {distance} away from the path");
      return Err(ErrorStack::new(format!(
        "split point {pt:?} is {distance} away from the path, more than the tolerance of \
         {tolerance}"
      )));
    }
    let el = self.flattened().to_element_location(loc);
    Ok(self.split_at_location(el))
  }

  /// Splits element `loc.element` exactly at parameter `loc.t`.  Splitting at an element end
  /// cuts at the anchor point; cutting at the very start or end of the path yields a
  /// zero-length two-point path on that side.
  pub fn split_at_location(&self, loc: ElementLocation) -> (SymPath, SymPath) {
    let element_ix = loc.element.min(self.element_count() - 1);
    let start = self.element_start(element_ix);
    let element = self.element(element_ix);
    let end = start + element.steps();

    if !(loc.t > 0.) {
      return self.split_at_anchor(start);
    }
    if loc.t >= 1. {
      return self.split_at_anchor(end);
    }

    let flag = self.element_flags(element_ix);
    let mut head = PathParts::default();
    let mut tail = PathParts::default();
    head.push_range(self, 0, start);
    match element {
      Element::Line { start: a, end: b } => {
        let mid = a + (b - a) * loc.t;
        head.points.push(mid);
        head.kinds.push(PointKind::Normal);
        head.flags.push(flag);

        tail.points.push(mid);
        tail.kinds.push(PointKind::Normal);
        tail.flags.push(flag);
      }
      Element::Cubic { p0, c1, c2, p3 } => {
        let (left, right) = split_cubic(p0, c1, c2, p3, loc.t);
        head.points.extend_from_slice(&left[1..]);
        head.kinds.extend_from_slice(&[
          PointKind::BezierControl,
          PointKind::BezierControl,
          PointKind::Normal,
        ]);
        head.flags.extend_from_slice(&[flag; 3]);

        tail.points.extend_from_slice(&right[..3]);
        tail.kinds.extend_from_slice(&[
          PointKind::Normal,
          PointKind::BezierControl,
          PointKind::BezierControl,
        ]);
        tail.flags.extend_from_slice(&[flag; 3]);
      }
    }
    let last = self.points().len() - 1;
    tail.points.extend_from_slice(&self.points()[end..]);
    tail.kinds.extend_from_slice(&self.kinds()[end..]);
    tail.push_step_flags(self, end, last);

    (head.build(self), tail.build(self))
  }

  fn split_at_anchor(&self, point_ix: usize) -> (SymPath, SymPath) {
    let last = self.points().len() - 1;
    let degenerate = |ix: usize| {
      SymPath::from_validated(
        vec![self.points()[ix]; 2],
        vec![self.kinds()[ix]; 2],
        None,
        self.settings(),
      )
    };

    let head = if point_ix == 0 {
      degenerate(0)
    } else {
      let mut parts = PathParts::default();
      parts.push_range(self, 0, point_ix);
      parts.build(self)
    };
    let tail = if point_ix >= last {
      degenerate(last)
    } else {
      let mut parts = PathParts::default();
      parts.push_range(self, point_ix, last);
      parts.build(self)
    };
    (head, tail)
  }

  /// Removes `start_trim` from the start and `end_trim` from the end of the path, measured with
  /// `metric`.  Returns `None` if nothing of meaningful length remains.
  pub fn shorten(
    &self,
    start_trim: f32,
    end_trim: f32,
    metric: Metric,
  ) -> Result<Option<SymPath>, ErrorStack> {
    if !(start_trim >= 0.) || !(end_trim >= 0.) {
      log::error!("invalid shorten amounts: start={start_trim}, end={end_trim}");
      return Err(ErrorStack::new(format!(
        "shorten amounts must be non-negative, found start={start_trim}, end={end_trim}"
      )));
    }

    let len = self.length(metric);
    if len - start_trim - end_trim <= LENGTH_EPSILON {
      return Ok(None);
    }
    if start_trim == 0. && end_trim == 0. {
      return Ok(Some(self.clone()));
    }

    let flat = self.flattened();
    let loc_a = flat.to_element_location(flat.locate(start_trim, metric));
    let loc_b = flat.to_element_location(flat.locate(len - end_trim, metric));

    let head = if end_trim > 0. {
      self.split_at_location(loc_b).0
    } else {
      self.clone()
    };
    if start_trim == 0. {
      return Ok(Some(head));
    }

    // the cut at `loc_b` reparameterizes its element, so `loc_a` has to follow
    let mut loc_a = loc_a;
    if end_trim > 0. && loc_a.element == loc_b.element {
      if loc_b.t <= 0. {
        return Ok(None);
      }
      if loc_b.t < 1. {
        loc_a.t /= loc_b.t;
      }
    }
    if loc_a.element >= head.element_count() {
      return Ok(None);
    }
    Ok(Some(head.split_at_location(loc_a).1))
  }

  /// Appends `other` to this path.  The last point of `self` and the first point of `other`
  /// must coincide within the flattening tolerance; the merged seam point gets `seam_kind`.
  /// A zero-length two-point side (as produced by splitting at a path end) is absorbed, and two
  /// halves of a cubic cut by [`SymPath::split_at`] are merged back into that cubic.
  pub fn join(&self, other: &SymPath, seam_kind: PointKind) -> Result<SymPath, ErrorStack> {
    let gap = (self.last_point() - other.first_point()).norm();
    let tolerance = self.settings().tolerance.max(LENGTH_EPSILON);
    if gap > tolerance {
      log::error!("joined paths are {gap} apart");
      return Err(ErrorStack::new(format!(
        "cannot join paths whose endpoints are {gap} apart (tolerance {tolerance})"
      )));
    }
    if seam_kind == PointKind::BezierControl {
      log::error!("tried to join paths with a bezier control seam");
      return Err(ErrorStack::new("a join seam cannot be a bezier control point"));
    }

    let is_stub = |p: &SymPath| p.points().len() == 2 && p.is_zero_length();
    if is_stub(other) {
      return Ok(self.with_endpoint_kind(self.points().len() - 1, seam_kind));
    }
    if is_stub(self) {
      return Ok(other.with_endpoint_kind(0, seam_kind));
    }
    if let Some(merged) = self.rejoin_split_cubic(other, seam_kind) {
      return Ok(merged);
    }

    let self_last = self.points().len() - 1;
    let mut parts = PathParts::default();
    parts.push_range(self, 0, self_last);
    parts.kinds[self_last] = seam_kind;
    parts
      .points
      .extend_from_slice(&other.points()[1..]);
    parts.kinds.extend_from_slice(&other.kinds()[1..]);
    parts.push_step_flags(other, 0, other.points().len() - 1);
    Ok(parts.build(self))
  }

  fn rejoin_split_cubic(&self, other: &SymPath, seam_kind: PointKind) -> Option<SymPath> {
    if seam_kind != PointKind::Normal {
      return None;
    }
    let head_ix = self.element_count() - 1;
    let (Element::Cubic { p0, c1, c2, p3 }, Element::Cubic { p0: q0, c1: d1, c2: d2, p3: q3 }) =
      (self.element(head_ix), other.element(0))
    else {
      return None;
    };
    let flag = self.element_flags(head_ix);
    if flag != other.element_flags(0) {
      return None;
    }
    let tolerance = self.settings().tolerance.max(LENGTH_EPSILON);
    let [_, c1, c2, _] = unsplit_cubic([p0, c1, c2, p3], [q0, d1, d2, q3], tolerance)?;

    let start = self.element_start(head_ix);
    let other_last = other.points().len() - 1;
    let mut parts = PathParts::default();
    parts.push_range(self, 0, start);
    parts.points.extend_from_slice(&[c1, c2]);
    parts
      .kinds
      .extend_from_slice(&[PointKind::BezierControl, PointKind::BezierControl]);
    parts.flags.extend_from_slice(&[flag; 3]);
    parts.points.extend_from_slice(&other.points()[3..]);
    parts.kinds.extend_from_slice(&other.kinds()[3..]);
    parts.push_step_flags(other, 3, other_last);
    Some(parts.build(self))
  }

  fn with_endpoint_kind(&self, point_ix: usize, kind: PointKind) -> SymPath {
    let mut kinds = self.kinds().to_vec();
    kinds[point_ix] = kind;
    SymPath::from_validated(
      self.points().to_vec(),
      kinds,
      self.flags().map(<[SegmentFlags]>::to_vec),
      self.settings(),
    )
  }

  /// Parallel path at `amount` to the right of the direction of travel (negative offsets go
  /// left).  Curves are flattened first, so the result only has straight segments and one point
  /// per flattened point.  At vertices the displacement follows the turn bisector, stretched by
  /// the miter factor but never more than `miter_limit`.
  pub fn offset_right(&self, amount: f32, miter_limit: f32) -> SymPath {
    let amount = if amount.is_finite() {
      amount
    } else {
      log::warn!("non-finite offset amount {amount}; leaving path unchanged");
      0.
    };

    let flat = self.flattened();
    let mut points = Vec::with_capacity(flat.len());
    let mut kinds = Vec::with_capacity(flat.len());
    for (ix, fp) in flat.points.iter().enumerate() {
      let (d_in, d_out) = self.flat_directions(ix);
      let disp = match (d_in.map(right_normal), d_out.map(right_normal)) {
        (Some(n_in), Some(n_out)) => {
          let sum = n_in + n_out;
          let sum_len = sum.norm();
          if sum_len <= LENGTH_EPSILON {
            // the path doubles back on itself here
            n_in * amount
          } else {
            // |n_in + n_out| = 2 cos(turn / 2)
            let stretch = (2. / sum_len).min(miter_limit.max(1.));
            sum / sum_len * amount * stretch
          }
        }
        (Some(n), None) | (None, Some(n)) => n * amount,
        (None, None) => Vec2::zeros(),
      };
      points.push(fp.pos + disp);
      kinds.push(if fp.interpolated {
        PointKind::Normal
      } else {
        fp.kind
      });
    }

    SymPath::from_validated(points, kinds, None, self.settings())
  }

  /// Pieces of the path whose elements are in sub-path set `bit`, in path order.  On a closed
  /// path, a piece running through the closing point is returned as one path.
  pub fn subpaths(&self, bit: u32) -> Vec<SymPath> {
    let mask: SegmentFlags = (1 as SegmentFlags).checked_shl(bit).unwrap_or(0);
    if self.flags().is_none() || mask == 0 {
      return vec![self.clone()];
    }

    let element_count = self.element_count();
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut run_start = None;
    for element_ix in 0..element_count {
      let included = (self.element_flags(element_ix) & mask) == 0;
      match (included, run_start) {
        (true, None) => run_start = Some(element_ix),
        (false, Some(start)) => {
          runs.push((start, element_ix - 1));
          run_start = None;
        }
        _ => (),
      }
    }
    if let Some(start) = run_start {
      runs.push((start, element_count - 1));
    }

    if runs.len() == 1 && runs[0] == (0, element_count - 1) {
      return vec![self.clone()];
    }

    let element_end = |element_ix: usize| {
      self.element_start(element_ix) + self.element(element_ix).steps()
    };
    let run_parts = |(first, last): (usize, usize)| {
      let mut parts = PathParts::default();
      parts.push_range(self, self.element_start(first), element_end(last));
      parts
    };

    let wraps = self.is_closed()
      && runs.len() > 1
      && runs[0].0 == 0
      && runs[runs.len() - 1].1 == element_count - 1;
    let mut out = Vec::with_capacity(runs.len());
    if wraps {
      let first_run = runs.remove(0);
      let Some(last_run) = runs.pop() else {
        return out;
      };
      for &run in &runs {
        out.push(run_parts(run).build(self));
      }
      let mut merged = run_parts(last_run);
      let head = run_parts(first_run);
      merged.points.extend_from_slice(&head.points[1..]);
      merged.kinds.extend_from_slice(&head.kinds[1..]);
      merged.flags.extend_from_slice(&head.flags);
      out.push(merged.build(self));
    } else {
      for &run in &runs {
        out.push(run_parts(run).build(self));
      }
    }
    out
  }

  /// The same path traversed in the opposite direction.
  pub fn reversed(&self) -> SymPath {
    let mut points = self.points().to_vec();
    let mut kinds = self.kinds().to_vec();
    points.reverse();
    kinds.reverse();

    // every step of an element takes the element's flag so the reversed element is governed by
    // the same value
    let flags = self.flags().map(|_| {
      let mut flags = Vec::with_capacity(points.len() - 1);
      for element_ix in 0..self.element_count() {
        let flag = self.element_flags(element_ix);
        let steps = self.element(element_ix).steps();
        flags.extend(std::iter::repeat(flag).take(steps));
      }
      flags.reverse();
      flags
    });

    SymPath::from_validated(points, kinds, flags, self.settings())
  }

  /// Fails if the transform sends a point to infinity or NaN.
  pub fn transformed(&self, transform: &Transform2) -> Result<SymPath, ErrorStack> {
    let points = self
      .points()
      .iter()
      .map(|&p| transform.apply_point(p))
      .collect();
    SymPath::with_settings(
      points,
      self.kinds().to_vec(),
      self.flags().map(<[SegmentFlags]>::to_vec),
      self.settings(),
    )
    .map_err(|err| err.wrap("Error transforming path"))
  }
}
