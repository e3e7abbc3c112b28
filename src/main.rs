use anyhow::Context;
use fitplot::{
  ErrorBars, Marker, Plot, Range,
  fit::{self, Linear},
};
use polars::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_target(false)
    .compact()
    .init();

  let df = df! {
    "x" => &[1, 2, 3, 4, 5],
    "y" => &[3, 9, 27, 48, 54],
    "y_err" => &[1, 2, 3, 4, 5],
  }?;
  let x = df.column("x")?;
  let y = df.column("y")?;

  let fit = fit::curve_fit(&Linear, x, y).context("fitting a line to the samples")?;

  let x_range = Range::from_column(x)?.linspace(100);
  let x_fit = Column::new("x_fit".into(), &x_range);
  let y_fit = fit.eval_column(&Linear, "y_fit", &x_range);

  let mut plot = Plot::new();
  plot
    .scatter(x, y)
    .marker(Marker::Circle)
    .x_err(ErrorBars::Uniform(0.5))?
    .y_err(ErrorBars::PerPoint(df.column("y_err")?))?;
  plot.line(&x_fit, &y_fit);

  plot.title("Example of a graph title");
  plot.x.title("An x-axis label");
  plot.y.title("A y-axis label using $LaTeX$ syntax");

  plot.save("ch4.png").context("saving ch4.png")?;
  plot.show()?;

  Ok(())
}
