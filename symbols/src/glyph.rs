//! Placement of glyphs (small decorations) along a line.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use sympath::{
  geom::{angle_degrees, miter_factor, turn_angle},
  ErrorStack, Metric, PointKind, SymPath, Transform2, Vec2, LENGTH_EPSILON,
};

use crate::dash::{compute_dashes, DashOutput, DashSpec, DecreaseProfile};

/// Most a corner glyph is stretched across the line to compensate for a sharp turn.
pub const CORNER_STRETCH_LIMIT: f32 = 2.;

/// Glyphs shrunk below this scale are not emitted.
pub const MIN_GLYPH_SCALE: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GlyphLocation {
  Start,
  End,
  /// Corner points plus both path ends.
  Corners,
  CornersIgnoreEnds,
  /// Dash-marker points plus both path ends.
  DashPoints,
  DashPointsIgnoreEnds,
  DashCenters,
  GapCenters,
  Spaced,
  SpacedWithOffset,
  SpacedDecreasing,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlyphPlacementSpec {
  pub location: GlyphLocation,
  pub spacing: f32,
  pub first_spacing: f32,
  pub last_spacing: f32,
  /// Forward shift for `SpacedWithOffset`.
  pub offset: f32,
  pub min_count: u32,
  pub repeat_count: u32,
  pub repeat_spacing: f32,
  pub decrease: DecreaseProfile,
  /// Dash pattern for `DashCenters` / `GapCenters`.  Its spacing method also governs the
  /// spaced modes.
  pub dash: DashSpec,
}

impl GlyphPlacementSpec {
  pub fn new(location: GlyphLocation) -> Self {
    GlyphPlacementSpec {
      location,
      spacing: 1.,
      first_spacing: 1.,
      last_spacing: 1.,
      offset: 0.,
      min_count: 0,
      repeat_count: 1,
      repeat_spacing: 0.,
      decrease: DecreaseProfile::default(),
      dash: DashSpec::new(1., 1.),
    }
  }

  /// Evenly spaced glyphs `spacing` apart, the first and last one `spacing` from the ends.
  pub fn spaced(spacing: f32) -> Self {
    GlyphPlacementSpec {
      spacing,
      first_spacing: spacing,
      last_spacing: spacing,
      ..Self::new(GlyphLocation::Spaced)
    }
  }

  fn is_spaced(&self) -> bool {
    matches!(
      self.location,
      GlyphLocation::Spaced | GlyphLocation::SpacedWithOffset | GlyphLocation::SpacedDecreasing
    )
  }

  pub fn validate(&self) -> Result<(), ErrorStack> {
    if self.is_spaced() {
      if !(self.spacing > 0.) || !self.spacing.is_finite() {
        return Err(ErrorStack::new(format!(
          "glyph spacing must be positive, found {}",
          self.spacing
        )));
      }
      for (name, value) in [
        ("first spacing", self.first_spacing),
        ("last spacing", self.last_spacing),
      ] {
        if !(value >= 0.) || !value.is_finite() {
          return Err(ErrorStack::new(format!(
            "{name} must be a non-negative number, found {value}"
          )));
        }
      }
    }
    if !self.repeat_spacing.is_finite() || !self.offset.is_finite() {
      return Err(ErrorStack::new("glyph repeat spacing and offset must be finite"));
    }
    if !(0. ..=1.).contains(&self.decrease.limit) {
      return Err(ErrorStack::new(format!(
        "decrease limit must be within [0, 1], found {}",
        self.decrease.limit
      )));
    }
    if matches!(
      self.location,
      GlyphLocation::DashCenters | GlyphLocation::GapCenters
    ) {
      self
        .dash
        .validate()
        .map_err(|err| err.wrap("Invalid dash spec for glyph placement"))?;
    }
    Ok(())
  }

  /// Dash pattern whose boundaries are the spaced glyph positions.
  fn spacing_dashes(&self) -> DashSpec {
    DashSpec {
      dash_length: self.spacing,
      first_dash_length: self.first_spacing,
      last_dash_length: self.last_spacing,
      gap_length: 0.,
      halve_ends_on_closed: false,
      min_gaps: self.min_count,
      spacing: self.dash.spacing,
      ..DashSpec::new(self.spacing, 0.)
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphInstance {
  pub position: Vec2,
  pub angle_degrees: f32,
  /// x along the line, y across it.
  pub scale: Vec2,
}

impl GlyphInstance {
  pub fn transform(&self) -> Transform2 {
    Transform2::placement(self.position, self.angle_degrees, self.scale)
  }
}

/// Computes every glyph instance `spec` places on `path`.
pub fn place_glyphs(
  path: &SymPath,
  spec: &GlyphPlacementSpec,
  metric: Metric,
) -> Result<Vec<GlyphInstance>, ErrorStack> {
  place_glyphs_with_full_length(path, path.length(metric), spec, metric)
}

/// Like [`place_glyphs`], for a path whose end was trimmed off before drawing: `full_length`
/// is its length before trimming, and the `End` glyph goes where the untrimmed end was,
/// continuing along the final direction of `path`.
pub fn place_glyphs_with_full_length(
  path: &SymPath,
  full_length: f32,
  spec: &GlyphPlacementSpec,
  metric: Metric,
) -> Result<Vec<GlyphInstance>, ErrorStack> {
  spec
    .validate()
    .map_err(|err| err.wrap("Invalid glyph placement spec"))?;

  if path.is_zero_length() {
    log::debug!("skipping glyph placement on zero-length path");
    return Ok(Vec::new());
  }

  let length = path.length(metric);
  let mut out = Vec::new();
  match spec.location {
    GlyphLocation::Start => push_repeats(path, spec, metric, 0., 1., length, &mut out),
    GlyphLocation::End => {
      let end = full_length.max(length);
      push_repeats(path, spec, metric, end, 1., end, &mut out)
    }
    GlyphLocation::Corners => place_at_points(path, PointKind::Corner, true, true, metric, &mut out),
    GlyphLocation::CornersIgnoreEnds => {
      place_at_points(path, PointKind::Corner, false, true, metric, &mut out)
    }
    GlyphLocation::DashPoints => {
      place_at_points(path, PointKind::DashMarker, true, false, metric, &mut out)
    }
    GlyphLocation::DashPointsIgnoreEnds => {
      place_at_points(path, PointKind::DashMarker, false, false, metric, &mut out)
    }
    GlyphLocation::DashCenters | GlyphLocation::GapCenters => {
      let dashes = compute_dashes(path, &spec.dash, metric)?;
      let distances = if spec.location == GlyphLocation::DashCenters {
        dashes.dash_centers()
      } else {
        dashes.gap_centers()
      };
      for d in distances {
        push_repeats(path, spec, metric, d, 1., length, &mut out);
      }
    }
    GlyphLocation::Spaced | GlyphLocation::SpacedWithOffset | GlyphLocation::SpacedDecreasing => {
      let distances = spaced_distances(path, spec, metric)?;
      let scales = if spec.location == GlyphLocation::SpacedDecreasing {
        spec.decrease.scales(distances.len())
      } else {
        vec![1.; distances.len()]
      };
      for (d, scale) in distances.into_iter().zip(scales) {
        if scale < MIN_GLYPH_SCALE {
          continue;
        }
        push_repeats(path, spec, metric, d, scale, length, &mut out);
      }
    }
  }
  Ok(out)
}

/// Distances of spaced glyphs: the boundaries between "dashes" of the spacing length, laid out
/// with the dash algorithm over the whole path.
fn spaced_distances(
  path: &SymPath,
  spec: &GlyphPlacementSpec,
  metric: Metric,
) -> Result<Vec<f32>, ErrorStack> {
  let spacing = spec.spacing_dashes();
  let output = DashOutput::for_length(path.length(metric), &spacing, path.is_closed())?;
  Ok(match spec.location {
    GlyphLocation::SpacedWithOffset => output.gap_centers_offset(spec.offset),
    _ => output.gap_centers(),
  })
}

/// Pushes `repeat_count` instances centered on distance `d`, clamped to `[0, end]`.  Distances
/// past the end of the path continue straight along its final direction.
fn push_repeats(
  path: &SymPath,
  spec: &GlyphPlacementSpec,
  metric: Metric,
  d: f32,
  scale: f32,
  end: f32,
  out: &mut Vec<GlyphInstance>,
) {
  let length = path.length(metric);
  let count = spec.repeat_count.max(1);
  let middle = (count as f32 - 1.) / 2.;
  let distances: SmallVec<[f32; 4]> = (0..count)
    .map(|k| common::clamp(d + (k as f32 - middle) * spec.repeat_spacing, 0., end))
    .collect();
  for d in distances {
    let tangent = path.tangent_at_length(d.min(length), metric);
    let position = if d > length {
      path.last_point() + tangent * (d - length)
    } else {
      path.point_at_length(d, metric)
    };
    out.push(GlyphInstance {
      position,
      angle_degrees: angle_degrees(tangent),
      scale: Vec2::new(scale, scale),
    });
  }
}

/// One instance per point of `kind`, plus the path ends if `include_ends`.  A closed path's
/// shared end point is visited once.
fn place_at_points(
  path: &SymPath,
  kind: PointKind,
  include_ends: bool,
  stretch: bool,
  metric: Metric,
  out: &mut Vec<GlyphInstance>,
) {
  let last_ix = path.points().len() - 1;
  let closed = path.is_closed();
  let points = path.classified_points(metric, |k| k.is_anchor());
  for cp in points {
    let is_end = cp.point_ix == 0 || cp.point_ix == last_ix;
    if closed && cp.point_ix == last_ix {
      continue;
    }
    let wanted = if is_end {
      include_ends || (closed && cp.kind == kind)
    } else {
      cp.kind == kind
    };
    if !wanted {
      continue;
    }

    let (d_in, d_out) = path.flat_directions(cp.flat_ix);
    let (direction, across) = match (d_in, d_out) {
      (Some(d_in), Some(d_out)) => {
        let sum = d_in + d_out;
        let direction = if sum.norm() > LENGTH_EPSILON {
          sum
        } else {
          d_in
        };
        let across = if stretch {
          miter_factor(turn_angle(d_in, d_out)).min(CORNER_STRETCH_LIMIT)
        } else {
          1.
        };
        (direction, across)
      }
      (Some(d), None) | (None, Some(d)) => (d, 1.),
      (None, None) => (Vec2::new(1., 0.), 1.),
    };
    out.push(GlyphInstance {
      position: cp.pos,
      angle_degrees: angle_degrees(direction),
      scale: Vec2::new(1., across),
    });
  }
}
