use kurbo::{Affine, Point, Stroke};
use peniko::Brush;
use polars::prelude::*;

use super::{
  data_points,
  error_bar::{Direction, ErrorBars, bar_path},
};
use crate::{Bounds, Error, Range, Result, marker::Marker, render::Render};

pub struct ScatterAxes<'a> {
  x:       &'a Column,
  y:       &'a Column,
  options: ScatterOptions,

  x_err: Option<ErrorBars<'a>>,
  y_err: Option<ErrorBars<'a>>,
}

pub struct ScatterOptions {
  pub marker:    Marker,
  /// Marker diameter in pixels.
  pub size:      f64,
  /// Falls back to the theme's series color.
  pub color:     Option<Brush>,
  pub bar_width: f64,
}

impl Default for ScatterOptions {
  fn default() -> Self {
    ScatterOptions { marker: Marker::Circle, size: 12.0, color: None, bar_width: 2.0 }
  }
}

impl<'a> ScatterAxes<'a> {
  pub(crate) fn new(x: &'a Column, y: &'a Column) -> Self {
    ScatterAxes { x, y, options: ScatterOptions::default(), x_err: None, y_err: None }
  }

  pub fn marker(&mut self, marker: Marker) -> &mut Self {
    self.options.marker = marker;
    self
  }

  pub fn size(&mut self, size: f64) -> &mut Self {
    self.options.size = size;
    self
  }

  pub fn color(&mut self, color: Brush) -> &mut Self {
    self.options.color = Some(color);
    self
  }

  /// Horizontal error bars. A per-point column must have one value per point.
  pub fn x_err(&mut self, bars: ErrorBars<'a>) -> Result<&mut Self> {
    bars.check_len(self.x.len())?;
    self.x_err = Some(bars);
    Ok(self)
  }

  /// Vertical error bars. A per-point column must have one value per point.
  pub fn y_err(&mut self, bars: ErrorBars<'a>) -> Result<&mut Self> {
    bars.check_len(self.y.len())?;
    self.y_err = Some(bars);
    Ok(self)
  }

  pub(crate) fn color_override(&self) -> Option<&Brush> { self.options.color.as_ref() }

  pub(crate) fn data_bounds(&self) -> Result<Bounds> {
    if self.x.len() != self.y.len() {
      return Err(Error::LengthMismatch { expected: self.x.len(), found: self.y.len() });
    }

    let extents: Vec<(Point, f64, f64)> = data_points(self.x, self.y)
      .map(|(i, p)| {
        let dx = self.x_err.and_then(|e| e.at(i)).unwrap_or(0.0);
        let dy = self.y_err.and_then(|e| e.at(i)).unwrap_or(0.0);
        (p, dx, dy)
      })
      .collect();

    let x = Range::from_values(extents.iter().flat_map(|(p, dx, _)| [p.x - dx, p.x + dx]));
    let y = Range::from_values(extents.iter().flat_map(|(p, _, dy)| [p.y - dy, p.y + dy]));

    Ok(Bounds::new(x.unwrap_or_default(), y.unwrap_or_default()))
  }

  fn bars(&self, bars: Option<ErrorBars<'a>>, direction: Direction) -> Option<kurbo::BezPath> {
    let bars = bars?;
    Some(bar_path(
      data_points(self.x, self.y).filter_map(|(i, p)| Some((p, bars.at(i)?))),
      direction,
    ))
  }

  pub(crate) fn draw(&self, render: &mut Render, transform: Affine, color: &Brush) {
    let stroke = Stroke::new(self.options.bar_width);
    for path in [
      self.bars(self.x_err, Direction::Horizontal),
      self.bars(self.y_err, Direction::Vertical),
    ]
    .into_iter()
    .flatten()
    {
      render.stroke(&(transform * path), Affine::IDENTITY, color, &stroke);
    }

    let marker = self.options.marker.to_path(0.01);
    for (_, point) in data_points(self.x, self.y) {
      let center: Point = transform * point;
      render.fill(
        &marker,
        Affine::translate(center.to_vec2()) * Affine::scale(self.options.size),
        color,
      );
    }
  }
}
