use kurbo::{Affine, Cap, Line, Point, Rect, Size, Stroke};
use parley::FontWeight;
use peniko::Brush;

use crate::{
  axes::Axes,
  latex::MathText,
  render::{Align, DrawText, Render, RenderConfig},
  theme::Theme,
};

mod axes;
pub mod bounds;
mod error;
pub mod fit;
mod latex;
pub mod marker;
mod render;
pub mod theme;

pub use axes::{ErrorBars, LineAxes, ScatterAxes};
pub use bounds::{Bounds, Range};
pub use error::{Error, Result, ResultExt};
pub use marker::Marker;

/// Fraction of the data range added on each side of an axis.
const DATA_MARGIN: f64 = 0.05;

const MARGIN_LEFT: f64 = 150.0;
const MARGIN_RIGHT: f64 = 50.0;
const MARGIN_TOP: f64 = 90.0;
const MARGIN_BOTTOM: f64 = 120.0;

#[derive(Default)]
pub struct Plot<'a> {
  title: Option<String>,
  pub x: Axis,
  pub y: Axis,

  axes:   Vec<Axes<'a>>,
  theme:  Theme,
  config: RenderConfig,
}

#[derive(Default)]
pub struct Axis {
  title: Option<String>,
  min:   Option<f64>,
  max:   Option<f64>,
}

impl<'a> Plot<'a> {
  pub fn new() -> Plot<'a> { Plot::default() }

  pub fn title(&mut self, title: &str) -> &mut Self {
    self.title = Some(title.to_string());
    self
  }

  pub fn theme(&mut self, theme: Theme) -> &mut Self {
    self.theme = theme;
    self
  }

  /// Output size in pixels, for both `save` and the initial window.
  pub fn size(&mut self, width: u32, height: u32) -> &mut Self {
    self.config = RenderConfig { width: width.max(1), height: height.max(1) };
    self
  }
}

impl Axis {
  /// Axis label. Text between `$` signs is typeset as math.
  pub fn title(&mut self, title: &str) -> &mut Self {
    self.title = Some(title.to_string());
    self
  }

  pub fn min(&mut self, min: f64) -> &mut Self {
    self.min = Some(min);
    self
  }

  pub fn max(&mut self, max: f64) -> &mut Self {
    self.max = Some(max);
    self
  }

  fn limit(&self, range: Range) -> Range {
    Range::new(self.min.unwrap_or(range.min), self.max.unwrap_or(range.max))
  }
}

impl Plot<'_> {
  /// Union of every series' extent, with margins, then any explicit axis
  /// limits. Fails if any series has mismatched columns.
  pub(crate) fn data_bounds(&self) -> Result<Bounds> {
    let mut bounds = Bounds::empty();
    for ax in &self.axes {
      bounds = bounds.union(ax.data_bounds()?);
    }

    let bounds = Bounds::new(bounds.x.non_degenerate(), bounds.y.non_degenerate())
      .expand_by(DATA_MARGIN);
    Ok(Bounds::new(
      self.x.limit(bounds.x).non_degenerate(),
      self.y.limit(bounds.y).non_degenerate(),
    ))
  }

  pub(crate) fn series_color(&self, index: usize) -> Brush {
    self.axes[index].color_override().cloned().unwrap_or_else(|| self.theme.series_color(index))
  }

  pub(crate) fn draw(&self, render: &mut Render, size: Size) -> Result<()> {
    let data_bounds = self.data_bounds()?;

    let text_color = Brush::Solid(self.theme.text);
    let line_color = Brush::Solid(self.theme.frame);

    let viewport = Bounds::new(
      Range::new(MARGIN_LEFT, size.width - MARGIN_RIGHT),
      Range::new(size.height - MARGIN_BOTTOM, MARGIN_TOP),
    );
    let center = Point::new(
      (viewport.x.min + viewport.x.max) / 2.0,
      (viewport.y.min + viewport.y.max) / 2.0,
    );

    if let Some(title) = &self.title {
      let title = MathText::parse(title);
      render.draw_text(DrawText {
        text: &title.text,
        italic: &title.italic,
        size: 30.0,
        weight: FontWeight::BOLD,
        brush: text_color.clone(),
        position: Point::new(center.x, viewport.y.max - 20.0),
        horizontal_align: Align::Center,
        vertical_align: Align::End,
        ..Default::default()
      });
    }

    if let Some(x_label) = &self.x.title {
      let label = MathText::parse(x_label);
      render.draw_text(DrawText {
        text: &label.text,
        italic: &label.italic,
        size: 24.0,
        brush: text_color.clone(),
        position: Point::new(center.x, viewport.y.min + 50.0),
        horizontal_align: Align::Center,
        vertical_align: Align::Start,
        ..Default::default()
      });
    }

    if let Some(y_label) = &self.y.title {
      let label = MathText::parse(y_label);
      render.draw_text(DrawText {
        text: &label.text,
        italic: &label.italic,
        size: 24.0,
        brush: text_color.clone(),
        position: Point::new(viewport.x.min - 80.0, center.y),
        transform: Affine::rotate(-std::f64::consts::FRAC_PI_2),
        horizontal_align: Align::Center,
        vertical_align: Align::End,
        ..Default::default()
      });
    }

    let border_stroke = Stroke::new(2.0);
    render.stroke(
      &Line::new(
        Point::new(viewport.x.min, viewport.y.min),
        Point::new(viewport.x.max, viewport.y.min),
      ),
      Affine::IDENTITY,
      &line_color,
      &border_stroke,
    );
    render.stroke(
      &Line::new(
        Point::new(viewport.x.min, viewport.y.min),
        Point::new(viewport.x.min, viewport.y.max),
      ),
      Affine::IDENTITY,
      &line_color,
      &border_stroke,
    );

    let transform = data_bounds.transform_to(viewport);
    let tick_stroke = border_stroke.clone().with_start_cap(Cap::Butt);

    let ticks = 8;
    let iter = data_bounds.y.nice_ticks(ticks);
    let decimals = iter.decimals();
    for (y, vy) in iter
      .map(|v| (v, (transform * Point::new(0.0, v)).y))
      .filter(|(_, vy)| viewport.y.contains(vy))
    {
      render.stroke(
        &Line::new(Point::new(viewport.x.min, vy), Point::new(viewport.x.min - 10.0, vy)),
        Affine::IDENTITY,
        &line_color,
        &tick_stroke,
      );
      render.draw_text(DrawText {
        text: &format_tick(y, decimals),
        size: 18.0,
        brush: text_color.clone(),
        position: Point::new(viewport.x.min - 15.0, vy),
        horizontal_align: Align::End,
        vertical_align: Align::Center,
        ..Default::default()
      });
    }

    let iter = data_bounds.x.nice_ticks(ticks);
    let decimals = iter.decimals();
    for (x, vx) in iter
      .map(|v| (v, (transform * Point::new(v, 0.0)).x))
      .filter(|(_, vx)| viewport.x.contains(vx))
    {
      render.stroke(
        &Line::new(Point::new(vx, viewport.y.min), Point::new(vx, viewport.y.min + 10.0)),
        Affine::IDENTITY,
        &line_color,
        &tick_stroke,
      );
      render.draw_text(DrawText {
        text: &format_tick(x, decimals),
        size: 18.0,
        brush: text_color.clone(),
        position: Point::new(vx, viewport.y.min + 15.0),
        horizontal_align: Align::Center,
        vertical_align: Align::Start,
        ..Default::default()
      });
    }

    render.push_clip(&Rect::new(viewport.x.min, viewport.y.max, viewport.x.max, viewport.y.min));
    for (i, ax) in self.axes.iter().enumerate() {
      ax.draw(render, transform, &self.series_color(i));
    }
    render.pop_clip();

    Ok(())
  }
}

fn format_tick(value: f64, decimals: usize) -> String {
  // -0.0 prints as "-0"
  let value = if value == 0.0 { 0.0 } else { value };
  format!("{value:.decimals$}")
}

#[cfg(test)]
mod tests {
  use color::{OpaqueColor, Srgb};
  use peniko::Color;
  use polars::prelude::Column;

  use super::*;

  fn assert_close(a: f64, b: f64) { assert!((a - b).abs() < 1e-9, "{a} != {b}"); }

  #[test]
  fn bounds_cover_error_bars_and_margin() {
    let x = Column::new("x".into(), [1, 2, 3, 4, 5]);
    let y = Column::new("y".into(), [3, 9, 27, 48, 54]);
    let y_err = Column::new("y_err".into(), [1, 2, 3, 4, 5]);

    let mut plot = Plot::new();
    plot
      .scatter(&x, &y)
      .x_err(ErrorBars::Uniform(0.5))
      .unwrap()
      .y_err(ErrorBars::PerPoint(&y_err))
      .unwrap();

    // x: 0.5..5.5, y: 2..59, plus 5% of the size on each side
    let bounds = plot.data_bounds().unwrap();
    assert_close(bounds.x.min, 0.25);
    assert_close(bounds.x.max, 5.75);
    assert_close(bounds.y.min, 2.0 - 2.85);
    assert_close(bounds.y.max, 59.0 + 2.85);
  }

  #[test]
  fn axis_limits_override_data() {
    let x = Column::new("x".into(), [0.0, 10.0]);
    let y = Column::new("y".into(), [0.0, 10.0]);

    let mut plot = Plot::new();
    plot.line(&x, &y);
    plot.y.min(-5.0);
    plot.x.max(20.0);

    let bounds = plot.data_bounds().unwrap();
    assert_close(bounds.y.min, -5.0);
    assert_close(bounds.y.max, 10.5);
    assert_close(bounds.x.min, -0.5);
    assert_close(bounds.x.max, 20.0);
  }

  #[test]
  fn mismatched_error_bars_are_rejected() {
    let x = Column::new("x".into(), [1, 2, 3]);
    let y = Column::new("y".into(), [1, 2, 3]);
    let y_err = Column::new("y_err".into(), [1, 2]);

    let mut plot = Plot::new();
    let err = plot.scatter(&x, &y).y_err(ErrorBars::PerPoint(&y_err)).err();
    assert!(matches!(err, Some(Error::LengthMismatch { expected: 3, found: 2 })));
  }

  #[test]
  fn mismatched_series_fail_bounds() {
    let x = Column::new("x".into(), [1, 2, 3]);
    let y = Column::new("y".into(), [1, 2]);

    let mut plot = Plot::new();
    plot.scatter(&x, &y);
    assert!(matches!(plot.data_bounds(), Err(Error::LengthMismatch { .. })));
  }

  #[test]
  fn series_take_colors_in_order() {
    let x = Column::new("x".into(), [1.0, 2.0]);
    let y = Column::new("y".into(), [1.0, 2.0]);
    let red = Brush::Solid(Color::from_rgb8(255, 0, 0));

    let mut plot = Plot::new();
    plot.scatter(&x, &y);
    plot.line(&x, &y);
    plot.line(&x, &y).color(red.clone());

    let theme = Theme::default();
    assert_eq!(plot.series_color(0), theme.series_color(0));
    assert_eq!(plot.series_color(1), theme.series_color(1));
    assert_eq!(plot.series_color(2), red);
  }

  #[test]
  fn tick_labels() {
    assert_eq!(format_tick(-0.0, 0), "0");
    assert_eq!(format_tick(2.5, 1), "2.5");
    assert_eq!(format_tick(60.0, 0), "60");
  }

  #[test]
  fn custom_theme_colors_series() {
    const MONO: [OpaqueColor<Srgb>; 1] = [OpaqueColor::new([0.0, 0.0, 1.0])];
    let x = Column::new("x".into(), [1.0, 2.0]);
    let y = Column::new("y".into(), [1.0, 2.0]);

    let mut plot = Plot::new();
    plot.theme(Theme { background: Color::BLACK, cycle: &MONO, ..Theme::default() });
    plot.scatter(&x, &y);
    plot.line(&x, &y);

    let blue = Brush::Solid(Color::from_rgb8(0, 0, 255));
    assert_eq!(plot.series_color(0), blue);
    assert_eq!(plot.series_color(1), blue);
    assert_eq!(plot.theme.background, Color::BLACK);
  }

  #[test]
  fn single_point_series_stays_in_bounds() {
    let x = Column::new("x".into(), [0.0, 1.0]);
    let y = Column::new("y".into(), [0.0, 1.0]);
    let px = Column::new("px".into(), [10.0]);
    let py = Column::new("py".into(), [10.0]);

    let mut plot = Plot::new();
    plot.line(&x, &y);
    plot.scatter(&px, &py);

    let bounds = plot.data_bounds().unwrap();
    assert!(bounds.x.contains(&10.0) && bounds.y.contains(&10.0), "{bounds:?}");

    let mut plot = Plot::new();
    plot.scatter(&px, &py);
    let bounds = plot.data_bounds().unwrap();
    assert!(bounds.x.min < 10.0 && bounds.x.max > 10.0, "{bounds:?}");
  }

  #[test]
  fn equal_axis_limits_still_draw() {
    let x = Column::new("x".into(), [1.0, 2.0]);
    let y = Column::new("y".into(), [1.0, 2.0]);

    let mut plot = Plot::new();
    plot.line(&x, &y);
    plot.x.min(1.0).max(1.0);

    let bounds = plot.data_bounds().unwrap();
    assert!(bounds.x.size() > 0.0);

    let mut render = Render::new(Color::WHITE);
    plot.draw(&mut render, Size::new(640.0, 480.0)).unwrap();
  }

  #[test]
  fn draw_rejects_mismatched_series() {
    let x = Column::new("x".into(), [1, 2, 3]);
    let y = Column::new("y".into(), [1, 2]);

    let mut plot = Plot::new();
    plot.scatter(&x, &y);

    let mut render = Render::new(Color::WHITE);
    let err = plot.draw(&mut render, Size::new(640.0, 480.0)).unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { expected: 3, found: 2 }));
    assert!(render.scene.encoding().is_empty());
  }

  #[test]
  fn draws_full_figure() {
    let x = Column::new("x".into(), [1, 2, 3, 4, 5]);
    let y = Column::new("y".into(), [3, 9, 27, 48, 54]);
    let y_err = Column::new("y_err".into(), [1, 2, 3, 4, 5]);
    let x_fit = Column::new("x_fit".into(), Range::new(1.0, 5.0).linspace(100));
    let y_fit = Column::new(
      "y_fit".into(),
      Range::new(1.0, 5.0).linspace(100).iter().map(|x| 14.1 * x - 14.1).collect::<Vec<_>>(),
    );

    let mut plot = Plot::new();
    plot
      .scatter(&x, &y)
      .x_err(ErrorBars::Uniform(0.5))
      .unwrap()
      .y_err(ErrorBars::PerPoint(&y_err))
      .unwrap();
    plot.line(&x_fit, &y_fit);
    plot.title("Example of a graph title");
    plot.x.title("An x-axis label");
    plot.y.title("A y-axis label using $LaTeX$ syntax");

    let mut render = Render::new(Color::WHITE);
    plot.draw(&mut render, Size::new(1280.0, 960.0)).unwrap();
    assert!(!render.scene.encoding().is_empty());
  }
}
