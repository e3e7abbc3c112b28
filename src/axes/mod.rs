mod error_bar;
mod line;
mod scatter;

pub use error_bar::ErrorBars;
use kurbo::{Affine, Point};
pub use line::LineAxes;
use peniko::Brush;
use polars::prelude::*;
pub use scatter::ScatterAxes;

use crate::{Bounds, Plot, ResultExt, error::Result, render::Render};

pub enum Axes<'a> {
  Scatter(ScatterAxes<'a>),
  Line(LineAxes<'a>),
}

impl<'a> Plot<'a> {
  pub fn scatter(&mut self, x: &'a Column, y: &'a Column) -> &mut ScatterAxes<'a> {
    self.axes.push(Axes::Scatter(ScatterAxes::new(x, y)));
    match self.axes.last_mut().unwrap() {
      Axes::Scatter(sa) => sa,
      _ => unreachable!(),
    }
  }

  pub fn line(&mut self, x: &'a Column, y: &'a Column) -> &mut LineAxes<'a> {
    self.axes.push(Axes::Line(LineAxes::new(x, y)));
    match self.axes.last_mut().unwrap() {
      Axes::Line(la) => la,
      _ => unreachable!(),
    }
  }
}

impl Axes<'_> {
  pub(crate) fn data_bounds(&self) -> Result<Bounds> {
    match self {
      Axes::Scatter(sa) => sa.data_bounds(),
      Axes::Line(la) => la.data_bounds(),
    }
  }

  pub(crate) fn color_override(&self) -> Option<&Brush> {
    match self {
      Axes::Scatter(sa) => sa.color_override(),
      Axes::Line(la) => la.color_override(),
    }
  }

  pub(crate) fn draw(&self, render: &mut Render, transform: Affine, color: &Brush) {
    match self {
      Axes::Scatter(sa) => sa.draw(render, transform, color),
      Axes::Line(la) => la.draw(render, transform, color),
    }
  }
}

/// Paired `(x, y)` values by row index. Rows that can't be read as numbers are
/// logged and skipped.
pub(crate) fn data_points<'b>(
  x: &'b Column,
  y: &'b Column,
) -> impl Iterator<Item = (usize, Point)> + 'b {
  (0..x.len().min(y.len())).filter_map(move |i| {
    let px = x.get(i).and_then(|v| v.try_extract::<f64>()).log_err()?;
    let py = y.get(i).and_then(|v| v.try_extract::<f64>()).log_err()?;

    Some((i, Point::new(px, py)))
  })
}
