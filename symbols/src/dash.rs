//! Dash and spacing computation.
//!
//! Gap lengths are kept exactly as configured; dashes stretch or shrink to absorb whatever is
//! left of each segment.  Segments are the pieces of a path between corner and dash-marker
//! points, and the dashes on either side of a segment boundary are merged into one.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sympath::{ErrorStack, Metric, PathSpan, SegmentBreak, SymPath, LENGTH_EPSILON};

/// Upper bound for the gap count of a single segment.  Only reachable with absurdly small
/// dash/gap lengths relative to the segment.
const MAX_GAPS_PER_SEGMENT: usize = 1 << 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpacingMethod {
  /// Rounds the ideal gap count to nearest.
  #[default]
  Legacy,
  /// Picks whichever of floor/ceiling needs the smallest uniform dash stretch.
  AltSpacingA,
  /// Keeps the end dashes fixed and picks whichever of floor/ceiling needs the smallest middle
  /// dash stretch.
  AltSpacingB,
}

/// Sub-gaps cut into a dash.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecondaryGaps {
  pub count: u32,
  pub length: f32,
}

impl SecondaryGaps {
  pub const NONE: SecondaryGaps = SecondaryGaps {
    count: 0,
    length: 0.,
  };

  /// Pushes `dash` split into `count + 1` equal sub-dashes separated by the sub-gaps, or whole
  /// if it isn't long enough to hold them.
  fn split_dash(&self, dash: f32, out: &mut Vec<f32>) {
    if self.count == 0 {
      out.push(dash);
      return;
    }

    let n = self.count as f32;
    if !(dash > n * self.length) {
      if dash > 0. {
        log::debug!(
          "dash of length {dash} too short for {} secondary gaps of {}; keeping it whole",
          self.count,
          self.length
        );
      }
      out.push(dash);
      return;
    }

    let sub = (dash - n * self.length) / (n + 1.);
    out.push(sub);
    for _ in 0..self.count {
      out.push(self.length);
      out.push(sub);
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DashSpec {
  pub dash_length: f32,
  pub first_dash_length: f32,
  pub last_dash_length: f32,
  pub gap_length: f32,
  /// On closed paths, both end dashes become half a dash so they join into one at the
  /// closing point.
  pub halve_ends_on_closed: bool,
  pub min_gaps: u32,
  pub middle_secondary: SecondaryGaps,
  pub end_secondary: SecondaryGaps,
  pub spacing: SpacingMethod,
}

impl DashSpec {
  /// Plain dash pattern with end dashes as long as the others.
  pub fn new(dash_length: f32, gap_length: f32) -> Self {
    DashSpec {
      dash_length,
      first_dash_length: dash_length,
      last_dash_length: dash_length,
      gap_length,
      halve_ends_on_closed: false,
      min_gaps: 0,
      middle_secondary: SecondaryGaps::NONE,
      end_secondary: SecondaryGaps::NONE,
      spacing: SpacingMethod::Legacy,
    }
  }

  pub fn validate(&self) -> Result<(), ErrorStack> {
    let lengths = [
      ("dash length", self.dash_length),
      ("first dash length", self.first_dash_length),
      ("last dash length", self.last_dash_length),
      ("gap length", self.gap_length),
      ("middle secondary gap length", self.middle_secondary.length),
      ("end secondary gap length", self.end_secondary.length),
    ];
    for (name, value) in lengths {
      if !value.is_finite() || value < 0. {
        return Err(ErrorStack::new(format!(
          "{name} must be a non-negative number, found {value}"
        )));
      }
    }
    if self.dash_length + self.gap_length <= 0. && self.min_gaps == 0 {
      return Err(ErrorStack::new(
        "dash and gap lengths are both zero and no minimum gap count is set",
      ));
    }
    Ok(())
  }

  /// First and last dash of a whole path.
  pub fn end_dashes(&self, is_closed: bool) -> (f32, f32) {
    if is_closed && self.halve_ends_on_closed {
      let half = self.dash_length / 2.;
      (half, half)
    } else {
      (self.first_dash_length, self.last_dash_length)
    }
  }

  fn ideal_gaps(&self, interior: f32) -> f32 {
    let period = self.dash_length + self.gap_length;
    if period > 0. {
      (interior + self.dash_length) / period
    } else {
      0.
    }
  }

  /// Dash scale that fits `n` gaps into `len` when every dash stretches by the same factor.
  fn uniform_scale(&self, len: f32, first: f32, last: f32, n: usize) -> f32 {
    let budget = len - n as f32 * self.gap_length;
    let nominal = first + last + (n as f32 - 1.) * self.dash_length;
    if nominal > 0. {
      budget / nominal
    } else {
      f32::INFINITY
    }
  }

  fn uniform_score(&self, len: f32, first: f32, last: f32, n: usize) -> f32 {
    let scale = self.uniform_scale(len, first, last, n);
    // squashing dashes below half their nominal length is penalized
    let penalty = if scale < 0.5 { 1. } else { 0. };
    (scale - 1.).abs() + penalty
  }

  fn fixed_end_score(&self, len: f32, first: f32, last: f32, n: usize) -> f32 {
    if n < 2 {
      return self.uniform_score(len, first, last, n);
    }
    let budget = len - n as f32 * self.gap_length;
    let middle = (budget - first - last) / (n as f32 - 1.);
    if middle < 0. {
      f32::INFINITY
    } else if self.dash_length > 0. {
      (middle / self.dash_length - 1.).abs()
    } else {
      middle
    }
  }
}

/// Number of gaps to place on a segment of length `len` whose end dashes are `first` and
/// `last`, never fewer than `min_gaps`.
fn choose_gap_count(len: f32, first: f32, last: f32, spec: &DashSpec, min_gaps: u32) -> usize {
  let interior = len - first - last;
  let natural = if len <= 0. || interior < spec.gap_length {
    0
  } else {
    let ideal = spec.ideal_gaps(interior);
    let ideal = if ideal > MAX_GAPS_PER_SEGMENT as f32 {
      log::warn!("dash pattern needs {ideal} gaps on a segment of length {len}; capping");
      MAX_GAPS_PER_SEGMENT as f32
    } else {
      ideal
    };
    let lo = (ideal.floor() as usize).max(1);
    let hi = (ideal.ceil() as usize).max(1);
    match spec.spacing {
      SpacingMethod::Legacy => ((ideal + 0.5).floor() as usize).max(1),
      _ if lo == hi => lo,
      SpacingMethod::AltSpacingA => {
        let lo_score = spec.uniform_score(len, first, last, lo);
        let hi_score = spec.uniform_score(len, first, last, hi);
        if hi_score < lo_score {
          hi
        } else {
          lo
        }
      }
      SpacingMethod::AltSpacingB => {
        let lo_score = spec.fixed_end_score(len, first, last, lo);
        let hi_score = spec.fixed_end_score(len, first, last, hi);
        if hi_score <= lo_score {
          hi
        } else {
          lo
        }
      }
    }
  };
  let min_gaps = if min_gaps as usize > MAX_GAPS_PER_SEGMENT {
    log::warn!("minimum gap count {min_gaps} exceeds the per-segment cap; capping");
    MAX_GAPS_PER_SEGMENT
  } else {
    min_gaps as usize
  };
  natural.max(min_gaps)
}

/// Gap count for a whole path consisting of a single segment of length `segment_len`.
pub fn gap_count(segment_len: f32, spec: &DashSpec, is_closed: bool, min_gaps: u32) -> usize {
  let (first, last) = spec.end_dashes(is_closed);
  choose_gap_count(segment_len, first, last, spec, min_gaps)
}

/// Alternating dash/gap lengths for one segment holding `n` gaps, starting and ending with a
/// dash.
fn segment_lengths(len: f32, first: f32, last: f32, n: usize, spec: &DashSpec) -> Vec<f32> {
  if n == 0 {
    return vec![len];
  }

  let budget = len - n as f32 * spec.gap_length;
  if budget <= 0. {
    log::debug!("no room for dashes on a segment of length {len} with {n} gaps");
    return vec![0., len, 0.];
  }

  let mut dashes = vec![spec.dash_length; n + 1];
  dashes[0] = first;
  dashes[n] = last;

  let fixed_middle = budget - first - last;
  if spec.spacing == SpacingMethod::AltSpacingB && n >= 2 && fixed_middle >= 0. {
    let middle = fixed_middle / (n as f32 - 1.);
    for dash in &mut dashes[1..n] {
      *dash = middle;
    }
  } else {
    let scale = spec.uniform_scale(len, first, last, n);
    if scale.is_finite() {
      for dash in &mut dashes {
        *dash *= scale;
      }
    } else {
      let even = budget / (n as f32 + 1.);
      dashes.iter_mut().for_each(|dash| *dash = even);
    }
  }

  let mut out = Vec::with_capacity(2 * n + 1);
  for (ix, dash) in dashes.into_iter().enumerate() {
    if ix > 0 {
      out.push(spec.gap_length);
    }
    out.push(dash);
  }
  out
}

/// Result of running the dash algorithm over a whole path.
#[derive(Clone, Debug, PartialEq)]
pub struct DashOutput {
  /// Length of the path in the metric used.
  pub length: f32,
  /// Alternating dash and gap lengths, starting and ending with a dash, after secondary gaps
  /// were cut into the dashes.  Zero-length dashes mean "don't draw".
  pub dash_gap_lengths: Vec<f32>,
  /// Same as `dash_gap_lengths` before secondary gaps were applied.
  main: Vec<f32>,
}

impl DashOutput {
  /// Runs the algorithm on a single segment of length `len`.
  pub fn for_length(len: f32, spec: &DashSpec, is_closed: bool) -> Result<DashOutput, ErrorStack> {
    spec
      .validate()
      .map_err(|err| err.wrap("Invalid dash spec"))?;
    let span = PathSpan {
      start: 0.,
      length: len.max(0.),
    };
    Ok(Self::for_spans(&[span], spec, is_closed))
  }

  fn for_spans(spans: &[PathSpan], spec: &DashSpec, is_closed: bool) -> DashOutput {
    let length = spans.last().map(PathSpan::end).unwrap_or(0.);
    let (start_dash, end_dash) = spec.end_dashes(is_closed);

    // the first of several equally long segments wins
    let mut longest = 0;
    for (ix, span) in spans.iter().enumerate() {
      if span.length > spans[longest].length {
        longest = ix;
      }
    }

    let mut main: Vec<f32> = Vec::new();
    for (ix, span) in spans.iter().enumerate() {
      // interior segment ends take a full dash; the two meeting at a boundary are merged below
      let first = if ix == 0 { start_dash } else { spec.dash_length };
      let last = if ix == spans.len() - 1 {
        end_dash
      } else {
        spec.dash_length
      };
      let min_gaps = match spec.spacing {
        SpacingMethod::AltSpacingB => spec.min_gaps,
        _ if ix == longest => spec.min_gaps,
        _ => 0,
      };
      let n = choose_gap_count(span.length, first, last, spec, min_gaps);
      let lengths = segment_lengths(span.length, first, last, n, spec);

      match main.last_mut() {
        Some(straddling) => {
          *straddling += lengths[0];
          main.extend_from_slice(&lengths[1..]);
        }
        None => main = lengths,
      }
    }
    if main.is_empty() {
      main.push(length);
    }

    let last_ix = main.len() - 1;
    let mut dash_gap_lengths = Vec::with_capacity(main.len());
    for (ix, &len) in main.iter().enumerate() {
      if ix % 2 == 1 {
        dash_gap_lengths.push(len);
        continue;
      }
      let secondary = if ix == 0 || ix == last_ix {
        &spec.end_secondary
      } else {
        &spec.middle_secondary
      };
      secondary.split_dash(len, &mut dash_gap_lengths);
    }

    DashOutput {
      length,
      dash_gap_lengths,
      main,
    }
  }

  /// Number of main dashes (including zero-length ones).
  pub fn dash_count(&self) -> usize {
    self.main.len().div_ceil(2)
  }

  /// Number of main gaps.
  pub fn gap_count(&self) -> usize {
    self.main.len() / 2
  }

  /// Alternating main dash/gap lengths, ignoring secondary gaps.
  pub fn main_lengths(&self) -> &[f32] {
    &self.main
  }

  fn centers(&self, dashes: bool) -> Vec<f32> {
    let mut out = Vec::new();
    let mut pos = 0.;
    for (ix, &len) in self.main.iter().enumerate() {
      let is_dash = ix % 2 == 0;
      if is_dash == dashes && !(is_dash && len <= 0.) {
        out.push(pos + len / 2.);
      }
      pos += len;
    }
    out
  }

  /// Distance along the path to the center of every non-empty main dash.
  pub fn dash_centers(&self) -> Vec<f32> {
    self.centers(true)
  }

  /// Distance along the path to the center of every main gap.
  pub fn gap_centers(&self) -> Vec<f32> {
    self.centers(false)
  }

  /// Gap centers moved forward by `offset`, without the final gap.
  pub fn gap_centers_offset(&self, offset: f32) -> Vec<f32> {
    let mut centers = self.gap_centers();
    centers.pop();
    for center in &mut centers {
      *center += offset;
    }
    centers
  }

  /// `(start, end)` of every drawn dash, after secondary gaps.
  pub fn dash_intervals(&self) -> Vec<(f32, f32)> {
    let mut out = Vec::new();
    let mut pos = 0.;
    for (ix, &len) in self.dash_gap_lengths.iter().enumerate() {
      if ix % 2 == 0 && len > LENGTH_EPSILON {
        out.push((pos, pos + len));
      }
      pos += len;
    }
    out
  }
}

/// Runs the dash algorithm over `path`, segmenting it at corner and dash-marker points.
pub fn compute_dashes(
  path: &SymPath,
  spec: &DashSpec,
  metric: Metric,
) -> Result<DashOutput, ErrorStack> {
  spec
    .validate()
    .map_err(|err| err.wrap("Invalid dash spec"))?;
  let spans = path.segments(SegmentBreak::CornersAndDashMarkers, metric);
  Ok(DashOutput::for_spans(&spans, spec, path.is_closed()))
}

/// Cuts `path` into the pieces that are drawn as dashes.  On a closed path, a dash running
/// through the closing point is returned as one piece, last.
pub fn dash_pieces(
  path: &SymPath,
  spec: &DashSpec,
  metric: Metric,
) -> Result<Vec<SymPath>, ErrorStack> {
  let output = compute_dashes(path, spec, metric)?;
  let intervals = output.dash_intervals();
  let tolerance = path.settings().tolerance;
  let wraps = path.is_closed()
    && intervals.len() > 1
    && intervals.first().is_some_and(|&(start, _)| start <= tolerance)
    && intervals
      .last()
      .is_some_and(|&(_, end)| end >= output.length - tolerance);

  let mut pieces = Vec::with_capacity(intervals.len());
  for (start, end) in intervals {
    let end_trim = (output.length - end).max(0.);
    if let Some(piece) = path
      .shorten(start, end_trim, metric)
      .map_err(|err| err.wrap("Error cutting dash out of path"))?
    {
      pieces.push(piece);
    }
  }

  if wraps && pieces.len() > 1 {
    let head = pieces.remove(0);
    if let Some(tail) = pieces.pop() {
      let closing = tail
        .join(&head, path.kinds()[0])
        .map_err(|err| err.wrap("Error joining dash across the closing point"))?;
      pieces.push(closing);
    }
  }
  Ok(pieces)
}

/// Size profile shrinking a sequence of symbols linearly from full size down to `limit`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecreaseProfile {
  pub limit: f32,
  /// Shrink toward both ends from the center instead of toward the end only.
  pub both_ends: bool,
}

impl Default for DecreaseProfile {
  fn default() -> Self {
    DecreaseProfile {
      limit: 1.,
      both_ends: false,
    }
  }
}

impl DecreaseProfile {
  pub fn scales(&self, count: usize) -> Vec<f32> {
    if count <= 1 {
      return vec![1.; count];
    }

    let drop = 1. - self.limit;
    if !self.both_ends {
      let max = (count - 1) as f32;
      return (0..count)
        .map(|ix| 1. - drop * ix as f32 / max)
        .collect();
    }

    let half = count / 2;
    let odd = count % 2 == 1;
    // even counts share the full-size center between the two middle positions
    let max_dist = if odd { half } else { half - 1 };
    if max_dist == 0 {
      return vec![1.; count];
    }
    (0..count)
      .map(|ix| {
        let dist = if odd {
          ix.abs_diff(half)
        } else if ix < half {
          half - 1 - ix
        } else {
          ix - half
        };
        1. - drop * dist as f32 / max_dist as f32
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use sympath::{PointKind, Vec2};

  fn assert_close(actual: f32, expected: f32) {
    assert!(
      (actual - expected).abs() < 1e-4,
      "Expected {expected}, got {actual}"
    );
  }

  fn assert_lengths(actual: &[f32], expected: &[f32]) {
    assert_eq!(
      actual.len(),
      expected.len(),
      "Expected {expected:?}, got {actual:?}"
    );
    for (a, e) in actual.iter().zip(expected) {
      assert_close(*a, *e);
    }
  }

  fn rectangle() -> SymPath {
    SymPath::new(
      vec![
        Vec2::new(0., 0.),
        Vec2::new(100., 0.),
        Vec2::new(100., 50.),
        Vec2::new(0., 50.),
        Vec2::new(0., 0.),
      ],
      vec![PointKind::Corner; 5],
      None,
    )
    .unwrap()
  }

  #[test]
  fn rectangle_side_keeps_gaps_exact() {
    let spec = DashSpec::new(10., 5.);
    let out = DashOutput::for_length(100., &spec, false).unwrap();
    assert_eq!(out.dash_count(), 7);
    assert_eq!(out.gap_count(), 6);
    for (ix, len) in out.dash_gap_lengths.iter().enumerate() {
      if ix % 2 == 1 {
        assert_eq!(*len, 5.);
      }
    }
    let dash_total: f32 = out.dash_gap_lengths.iter().step_by(2).sum();
    assert_close(dash_total, 70.);
  }

  #[test]
  fn closed_rectangle_long_sides_match() {
    let spec = DashSpec::new(10., 5.);
    let out = compute_dashes(&rectangle(), &spec, Metric::Euclidean).unwrap();
    let gaps_within = |from: f32, to: f32| {
      out
        .gap_centers()
        .into_iter()
        .filter(|c| *c > from && *c < to)
        .count()
    };
    assert_eq!(gaps_within(0., 100.), 6);
    assert_eq!(gaps_within(150., 250.), 6);
    assert_eq!(gaps_within(100., 150.), 3);
    assert_eq!(gaps_within(250., 300.), 3);

    // the first long side holds 6 whole dashes of 10 plus the corner dash starting at 90
    let main = out.main_lengths();
    for (ix, len) in main[..12].iter().enumerate() {
      assert_close(*len, if ix % 2 == 0 { 10. } else { 5. });
    }
    // each short side stretches its 4 dashes of 10 into 35 units
    assert_close(main[12], 10. + 8.75);
    assert_close(main[main.len() - 1], 8.75);
  }

  #[test]
  fn huge_min_gaps_are_capped() {
    let mut spec = DashSpec::new(1., 1.);
    spec.min_gaps = u32::MAX;
    assert_eq!(gap_count(10., &spec, false, spec.min_gaps), MAX_GAPS_PER_SEGMENT);
  }

  #[test]
  fn gap_length_survives_every_segment_length() {
    for method in [
      SpacingMethod::Legacy,
      SpacingMethod::AltSpacingA,
      SpacingMethod::AltSpacingB,
    ] {
      let mut spec = DashSpec::new(4., 1.5);
      spec.spacing = method;
      let mut len = 0.5;
      while len < 60. {
        let out = DashOutput::for_length(len, &spec, false).unwrap();
        let lengths = &out.dash_gap_lengths;
        let total: f32 = lengths.iter().sum();
        assert!((total - len).abs() < 1e-3, "{method:?} {len}: {lengths:?}");
        if lengths.len() > 3 || (lengths.len() == 3 && lengths[0] > 0.) {
          for gap in lengths.iter().skip(1).step_by(2) {
            assert_eq!(*gap, 1.5);
          }
        }
        len += 0.7;
      }
    }
  }

  #[test]
  fn short_path_is_one_dash() {
    let spec = DashSpec::new(10., 5.);
    let out = DashOutput::for_length(4., &spec, false).unwrap();
    assert_lengths(&out.dash_gap_lengths, &[4.]);
    assert_lengths(&out.dash_centers(), &[2.]);
    assert!(out.gap_centers().is_empty());
  }

  #[test]
  fn forced_gaps_without_room_collapse_into_one_gap() {
    let mut spec = DashSpec::new(10., 5.);
    spec.min_gaps = 3;
    let out = DashOutput::for_length(12., &spec, false).unwrap();
    assert_lengths(&out.dash_gap_lengths, &[0., 12., 0.]);
    assert!(out.dash_centers().is_empty());
    assert_lengths(&out.gap_centers(), &[6.]);
    assert!(out.dash_intervals().is_empty());
  }

  #[test]
  fn legacy_rounding() {
    let spec = DashSpec::new(10., 5.);
    // interior 15: ideal (15 + 10) / 15 = 1.67 -> 2
    assert_eq!(gap_count(35., &spec, false, 0), 2);
    // interior 4 is shorter than a gap
    assert_eq!(gap_count(24., &spec, false, 0), 0);
    // interior 5: ideal 1 -> 1
    assert_eq!(gap_count(25., &spec, false, 0), 1);
    assert_eq!(gap_count(25., &spec, false, 4), 4);
  }

  #[test]
  fn alt_spacing_a_minimizes_stretch() {
    let mut spec = DashSpec::new(10., 5.);
    spec.spacing = SpacingMethod::AltSpacingA;
    // interior 21.5: ideal 2.1, floor 2 needs scale 1.05, ceil 3 needs 0.66
    assert_eq!(gap_count(41.5, &spec, false, 0), 2);
    // interior 28: ideal 2.53, floor 2 needs scale 1.27, ceil 3 needs 0.825
    assert_eq!(gap_count(48., &spec, false, 0), 3);
  }

  #[test]
  fn exact_ties_between_candidates() {
    let mut spec = DashSpec::new(4., 2.);
    spec.first_dash_length = 0.;
    spec.last_dash_length = 0.;
    // ideal 2.33; two gaps stretch the dashes to 1.5x, three shrink them to 0.5x
    spec.spacing = SpacingMethod::AltSpacingA;
    assert_eq!(gap_count(10., &spec, false, 0), 2);
    spec.spacing = SpacingMethod::AltSpacingB;
    assert_eq!(gap_count(10., &spec, false, 0), 3);
  }

  #[test]
  fn alt_spacing_b_keeps_end_dashes() {
    let mut spec = DashSpec::new(10., 5.);
    spec.first_dash_length = 4.;
    spec.last_dash_length = 4.;
    spec.spacing = SpacingMethod::AltSpacingB;
    let out = DashOutput::for_length(60., &spec, false).unwrap();
    let lengths = &out.dash_gap_lengths;
    assert_close(lengths[0], 4.);
    assert_close(lengths[lengths.len() - 1], 4.);
    let middle: Vec<f32> = lengths[2..lengths.len() - 2].iter().step_by(2).copied().collect();
    assert!(!middle.is_empty());
    for dash in &middle {
      assert_close(*dash, middle[0]);
    }
  }

  #[test]
  fn halved_ends_on_closed_paths() {
    let mut spec = DashSpec::new(10., 5.);
    spec.halve_ends_on_closed = true;
    assert_eq!(spec.end_dashes(true), (5., 5.));
    assert_eq!(spec.end_dashes(false), (10., 10.));
  }

  #[test]
  fn corners_split_and_merge_segments() {
    let spec = DashSpec::new(10., 5.);
    let out = compute_dashes(&rectangle(), &spec, Metric::Euclidean).unwrap();
    let total: f32 = out.dash_gap_lengths.iter().sum();
    assert_close(total, 300.);
    for gap in out.dash_gap_lengths.iter().skip(1).step_by(2) {
      assert_eq!(*gap, 5.);
    }

    // a dash straddles every corner
    let mut pos = 0f32;
    let mut straddled = 0;
    for (ix, &len) in out.dash_gap_lengths.iter().enumerate() {
      if ix % 2 == 0 {
        for corner in [100., 150., 250.] {
          if pos < corner && corner < pos + len {
            straddled += 1;
          }
        }
      }
      pos += len;
    }
    assert_eq!(straddled, 3);
  }

  #[test]
  fn min_gaps_only_on_longest_segment() {
    let path = SymPath::new(
      vec![Vec2::new(0., 0.), Vec2::new(20., 0.), Vec2::new(20., 8.)],
      vec![PointKind::Normal, PointKind::Corner, PointKind::Normal],
      None,
    )
    .unwrap();
    let mut spec = DashSpec::new(10., 1.);
    spec.first_dash_length = 1.;
    spec.last_dash_length = 1.;
    spec.min_gaps = 5;
    let legacy = compute_dashes(&path, &spec, Metric::Euclidean).unwrap();
    // 5 on the 20-unit segment, the natural count on the 8-unit one
    let natural_short = choose_gap_count(8., 10., 1., &spec, 0);
    assert_eq!(legacy.gap_count(), 5 + natural_short);

    spec.spacing = SpacingMethod::AltSpacingB;
    let per_segment = compute_dashes(&path, &spec, Metric::Euclidean).unwrap();
    assert_eq!(per_segment.gap_count(), 10);
  }

  #[test]
  fn secondary_gaps() {
    let mut spec = DashSpec::new(10., 5.);
    spec.middle_secondary = SecondaryGaps {
      count: 1,
      length: 2.,
    };
    spec.end_secondary = SecondaryGaps {
      count: 2,
      length: 6.,
    };
    let out = DashOutput::for_length(40., &spec, false).unwrap();
    // main: [10, 5, 10, 5, 10]; end dashes too short for 2 x 6
    assert_lengths(out.main_lengths(), &[10., 5., 10., 5., 10.]);
    assert_lengths(
      &out.dash_gap_lengths,
      &[10., 5., 4., 2., 4., 5., 10.],
    );
    assert_lengths(&out.dash_centers(), &[5., 20., 35.]);
  }

  #[test]
  fn gap_center_offsets() {
    let spec = DashSpec::new(10., 5.);
    let out = DashOutput::for_length(40., &spec, false).unwrap();
    assert_lengths(&out.gap_centers(), &[12.5, 27.5]);
    assert_lengths(&out.gap_centers_offset(1.), &[13.5]);
  }

  #[test]
  fn rejects_degenerate_specs() {
    let err = DashOutput::for_length(10., &DashSpec::new(0., 0.), false).unwrap_err();
    assert!(err.root().contains("both zero"));
    let mut forced = DashSpec::new(0., 0.);
    forced.min_gaps = 2;
    assert!(forced.validate().is_ok());
    assert!(DashSpec::new(-1., 2.).validate().is_err());
    assert!(DashSpec::new(f32::NAN, 2.).validate().is_err());
  }

  #[test]
  fn dash_pieces_follow_path() {
    let path = SymPath::from_polyline(vec![Vec2::new(0., 0.), Vec2::new(40., 0.)]).unwrap();
    let pieces = dash_pieces(&path, &DashSpec::new(10., 5.), Metric::Euclidean).unwrap();
    assert_eq!(pieces.len(), 3);
    assert!((pieces[1].first_point() - Vec2::new(15., 0.)).norm() < 1e-4);
    assert!((pieces[1].last_point() - Vec2::new(25., 0.)).norm() < 1e-4);
  }

  #[test]
  fn closing_dash_is_one_piece() {
    let square = SymPath::from_polyline(vec![
      Vec2::new(0., 0.),
      Vec2::new(40., 0.),
      Vec2::new(40., 40.),
      Vec2::new(0., 40.),
      Vec2::new(0., 0.),
    ])
    .unwrap();
    let mut spec = DashSpec::new(10., 5.);
    spec.halve_ends_on_closed = true;
    let pieces = dash_pieces(&square, &spec, Metric::Euclidean).unwrap();
    // 11 gaps, so 12 dashes of which the first and last form one stroke
    assert_eq!(pieces.len(), 11);
    let closing = &pieces[10];
    let half = 5. * 105. / 110.;
    assert!((closing.first_point() - Vec2::new(0., half)).norm() < 1e-3);
    assert!((closing.last_point() - Vec2::new(half, 0.)).norm() < 1e-3);
    assert!(closing.points().iter().any(|p| p.norm() < 1e-3));
    assert!((closing.length(Metric::Euclidean) - 2. * half).abs() < 1e-3);
  }

  #[test]
  fn decreasing_profiles() {
    let one_sided = DecreaseProfile {
      limit: 0.,
      both_ends: false,
    };
    assert_lengths(&one_sided.scales(3), &[1., 0.5, 0.]);
    assert_lengths(&one_sided.scales(1), &[1.]);
    assert!(one_sided.scales(0).is_empty());

    let both = DecreaseProfile {
      limit: 0.5,
      both_ends: true,
    };
    assert_lengths(&both.scales(5), &[0.5, 0.75, 1., 0.75, 0.5]);
    assert_lengths(&both.scales(4), &[0.5, 1., 1., 0.5]);
    assert_lengths(&both.scales(6), &[0.5, 0.75, 1., 1., 0.75, 0.5]);
    assert_lengths(&both.scales(2), &[1., 1.]);
  }
}
