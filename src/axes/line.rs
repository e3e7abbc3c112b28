use kurbo::{Affine, BezPath, Stroke};
use peniko::Brush;
use polars::prelude::*;

use super::data_points;
use crate::{Bounds, Error, Range, Result, render::Render};

pub struct LineAxes<'a> {
  x:       &'a Column,
  y:       &'a Column,
  options: LineOptions,
}

pub struct LineOptions {
  pub width: f64,
  /// Falls back to the theme's series color.
  pub color: Option<Brush>,
  pub dash:  Option<Vec<f64>>,
}

impl Default for LineOptions {
  fn default() -> Self { LineOptions { width: 3.0, color: None, dash: None } }
}

impl<'a> LineAxes<'a> {
  pub(crate) fn new(x: &'a Column, y: &'a Column) -> Self {
    LineAxes { x, y, options: LineOptions::default() }
  }

  pub fn width(&mut self, width: f64) -> &mut Self {
    self.options.width = width;
    self
  }

  pub fn color(&mut self, color: Brush) -> &mut Self {
    self.options.color = Some(color);
    self
  }

  pub fn dash(&mut self, dash: Vec<f64>) -> &mut Self {
    self.options.dash = Some(dash);
    self
  }

  pub(crate) fn color_override(&self) -> Option<&Brush> { self.options.color.as_ref() }

  pub(crate) fn data_bounds(&self) -> Result<Bounds> {
    if self.x.len() != self.y.len() {
      return Err(Error::LengthMismatch { expected: self.x.len(), found: self.y.len() });
    }

    let points: Vec<_> = data_points(self.x, self.y).map(|(_, p)| p).collect();
    Ok(Bounds::new(
      Range::from_values(points.iter().map(|p| p.x)).unwrap_or_default(),
      Range::from_values(points.iter().map(|p| p.y)).unwrap_or_default(),
    ))
  }

  pub(crate) fn draw(&self, render: &mut Render, transform: Affine, color: &Brush) {
    let mut shape = BezPath::new();

    for (i, (_, point)) in data_points(self.x, self.y).enumerate() {
      let point = transform * point;
      if i == 0 {
        shape.move_to(point);
      } else {
        shape.line_to(point);
      }
    }

    let mut stroke = Stroke::new(self.options.width);
    if let Some(dash) = &self.options.dash {
      stroke = stroke.with_dashes(0.0, dash.clone());
    }

    render.stroke(&shape, Affine::IDENTITY, color, &stroke);
  }
}
