//! Path geometry for map symbols: an immutable point/kind path with lazily flattened curves,
//! length queries under two metrics, and the split / shorten / join / offset operations line
//! and area symbols are built from.

pub mod error;
pub mod flatten;
pub mod geom;
pub mod ops;
pub mod path;
pub mod query;

pub type Vec2 = nalgebra::Vector2<f32>;

pub use self::{
  error::ErrorStack,
  flatten::{ElementLocation, FlatLocation, FlatPath, FlatPoint, MAX_FLATTEN_DEPTH},
  geom::{Metric, Rect, Transform2, LENGTH_EPSILON},
  path::{
    Element, FlattenSettings, PointKind, SegmentFlags, SymPath, DEFAULT_FLATTEN_TOLERANCE,
  },
  query::{ClassifiedPoint, PathSpan, PointDistance, SegmentBreak},
};
