use kurbo::{BezPath, Point};
use polars::prelude::Column;

use crate::{Error, ResultExt, error::Result};

/// Uncertainty drawn around each point of a scatter.
#[derive(Clone, Copy)]
pub enum ErrorBars<'a> {
  /// The same half-width for every point.
  Uniform(f64),
  /// One half-width per point, in the order of the data.
  PerPoint(&'a Column),
}

#[derive(Clone, Copy)]
pub(crate) enum Direction {
  Horizontal,
  Vertical,
}

impl ErrorBars<'_> {
  pub(crate) fn check_len(&self, points: usize) -> Result<()> {
    match self {
      ErrorBars::PerPoint(column) if column.len() != points => {
        Err(Error::LengthMismatch { expected: points, found: column.len() })
      }
      _ => Ok(()),
    }
  }

  /// Half-width at point `i`. Unreadable values are logged and skipped.
  pub(crate) fn at(&self, i: usize) -> Option<f64> {
    match self {
      ErrorBars::Uniform(v) => Some(*v),
      ErrorBars::PerPoint(column) => {
        column.get(i).and_then(|v| v.try_extract::<f64>()).log_err().map(f64::abs)
      }
    }
  }
}

/// One segment per point, spanning `point ± error` along `direction`, in data
/// coordinates.
pub(crate) fn bar_path(
  points: impl IntoIterator<Item = (Point, f64)>,
  direction: Direction,
) -> BezPath {
  let mut path = BezPath::new();

  for (p, err) in points {
    let (from, to) = match direction {
      Direction::Horizontal => (Point::new(p.x - err, p.y), Point::new(p.x + err, p.y)),
      Direction::Vertical => (Point::new(p.x, p.y - err), Point::new(p.x, p.y + err)),
    };
    path.move_to(from);
    path.line_to(to);
  }

  path
}
