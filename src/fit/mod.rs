//! Unweighted least-squares curve fitting.
//!
//! ```ignore
//! let fit = curve_fit(&Linear, df.column("x")?, df.column("y")?)?;
//! let [a, b] = fit.params() else { unreachable!() };
//! ```

mod lm;
mod model;

pub use model::{Linear, Model};
use nalgebra::DMatrix;
use polars::prelude::Column;

use crate::{Error, Result};

/// Termination settings for [`curve_fit_with`].
#[derive(Clone, Debug)]
pub struct FitOptions {
  /// Starting parameters. Defaults to all ones.
  pub initial:        Option<Vec<f64>>,
  /// Relative reduction of the squared residuals below which the fit stops.
  pub ftol:           f64,
  /// Relative parameter step below which the fit stops.
  pub xtol:           f64,
  pub gtol:           f64,
  /// Defaults to `200 * (params + 1)`.
  pub max_iterations: Option<usize>,
}

impl Default for FitOptions {
  fn default() -> Self {
    FitOptions { initial: None, ftol: 1.49012e-8, xtol: 1.49012e-8, gtol: 0.0, max_iterations: None }
  }
}

#[derive(Clone, Debug)]
pub struct FitResult {
  params:                  Vec<f64>,
  covariance:              DMatrix<f64>,
  residual_sum_of_squares: f64,
  iterations:              usize,
}

impl FitResult {
  pub fn params(&self) -> &[f64] { &self.params }
  pub fn covariance(&self) -> &DMatrix<f64> { &self.covariance }
  pub fn residual_sum_of_squares(&self) -> f64 { self.residual_sum_of_squares }
  pub fn iterations(&self) -> usize { self.iterations }

  /// One standard deviation of each parameter, from the covariance diagonal.
  pub fn std_errors(&self) -> Vec<f64> {
    self.covariance.diagonal().iter().map(|v| v.sqrt()).collect()
  }

  /// Evaluates `model` with the fitted parameters.
  pub fn eval<M: Model + ?Sized>(&self, model: &M, x: f64) -> f64 { model.eval(x, &self.params) }

  /// Evaluates `model` at every value, producing a column named `name`.
  pub fn eval_column<M: Model + ?Sized>(&self, model: &M, name: &str, xs: &[f64]) -> Column {
    Column::new(name.into(), xs.iter().map(|&x| self.eval(model, x)).collect::<Vec<f64>>())
  }
}

pub fn curve_fit<M: Model + ?Sized>(model: &M, x: &Column, y: &Column) -> Result<FitResult> {
  curve_fit_with(model, x, y, &FitOptions::default())
}

pub fn curve_fit_with<M: Model + ?Sized>(
  model: &M,
  x: &Column,
  y: &Column,
  options: &FitOptions,
) -> Result<FitResult> {
  if x.len() != y.len() {
    return Err(Error::LengthMismatch { expected: x.len(), found: y.len() });
  }
  curve_fit_values(model, &column_values(x)?, &column_values(y)?, options)
}

/// Same as [`curve_fit_with`], over plain slices.
pub fn curve_fit_values<M: Model + ?Sized>(
  model: &M,
  x: &[f64],
  y: &[f64],
  options: &FitOptions,
) -> Result<FitResult> {
  let p = model.param_count();
  if x.len() != y.len() {
    return Err(Error::LengthMismatch { expected: x.len(), found: y.len() });
  }
  if x.len() < p {
    return Err(Error::TooFewPoints { points: x.len(), params: p });
  }

  let initial = options.initial.clone().unwrap_or_else(|| vec![1.0; p]);
  if initial.len() != p {
    return Err(Error::LengthMismatch { expected: p, found: initial.len() });
  }

  let solution = lm::minimize(model, x, y, initial, options)?;
  let covariance = covariance(&solution.jacobian, solution.cost, x.len())?;

  tracing::info!(
    params = ?solution.params.as_slice(),
    cost = solution.cost,
    iterations = solution.iterations,
    "least-squares fit converged"
  );

  Ok(FitResult {
    params: solution.params.as_slice().to_vec(),
    covariance,
    residual_sum_of_squares: solution.cost,
    iterations: solution.iterations,
  })
}

/// `(JᵀJ)⁻¹ · SSR / (n - p)`, computed through the SVD of `J`.
fn covariance(jacobian: &DMatrix<f64>, cost: f64, n: usize) -> Result<DMatrix<f64>> {
  let (rows, p) = jacobian.shape();
  let svd = jacobian.clone().svd(false, true);
  let v_t = svd.v_t.ok_or(Error::SingularJacobian)?;

  let largest = svd.singular_values.max();
  let threshold = f64::EPSILON * rows.max(p) as f64 * largest;
  if largest == 0.0 || svd.singular_values.iter().any(|&s| s <= threshold) {
    return Err(Error::SingularJacobian);
  }

  let inv_sq = DMatrix::from_diagonal(&svd.singular_values.map(|s| 1.0 / (s * s)));
  let unscaled = v_t.transpose() * inv_sq * v_t;

  if n > p {
    Ok(unscaled * (cost / (n - p) as f64))
  } else {
    tracing::warn!("covariance of the parameters could not be estimated");
    Ok(DMatrix::from_element(p, p, f64::INFINITY))
  }
}

/// Reads a numeric column as `f64`, failing on nulls or non-numeric values.
pub(crate) fn column_values(column: &Column) -> Result<Vec<f64>> {
  (0..column.len()).map(|i| -> Result<f64> { Ok(column.get(i)?.try_extract::<f64>()?) }).collect()
}

#[cfg(test)]
mod tests {
  use polars::prelude::*;

  use super::*;
  use crate::Error;

  #[test]
  fn rejects_mismatched_columns() {
    let x = Column::new("x".into(), [1.0, 2.0, 3.0]);
    let y = Column::new("y".into(), [1.0, 2.0]);

    let err = curve_fit(&Linear, &x, &y).unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { expected: 3, found: 2 }));
  }

  #[test]
  fn rejects_too_few_points() {
    let err = curve_fit_values(&Linear, &[1.0], &[2.0], &FitOptions::default()).unwrap_err();
    assert!(matches!(err, Error::TooFewPoints { points: 1, params: 2 }));
  }

  #[test]
  fn collinear_x_is_singular() {
    let x = [2.0, 2.0, 2.0, 2.0];
    let y = [1.0, 2.0, 3.0, 4.0];

    let err = curve_fit_values(&Linear, &x, &y, &FitOptions::default()).unwrap_err();
    assert!(matches!(err, Error::SingularJacobian));
  }

  #[test]
  fn exact_fit_has_infinite_covariance() {
    let fit = curve_fit_values(&Linear, &[0.0, 1.0], &[1.0, 3.0], &FitOptions::default()).unwrap();
    assert!((fit.params()[0] - 2.0).abs() < 1e-6);
    assert!(fit.covariance().iter().all(|v| v.is_infinite()));
  }

  #[test]
  fn fits_exponential_decay() {
    let model = (2_usize, |x: f64, p: &[f64]| p[0] * (-p[1] * x).exp());
    let x: Vec<f64> = (0..20).map(|i| f64::from(i) * 0.25).collect();
    let y: Vec<f64> = x.iter().map(|&x| 3.0 * (-0.7 * x).exp()).collect();

    let fit = curve_fit_values(&model, &x, &y, &FitOptions::default()).unwrap();
    assert!((fit.params()[0] - 3.0).abs() < 1e-4, "{:?}", fit.params());
    assert!((fit.params()[1] - 0.7).abs() < 1e-4, "{:?}", fit.params());
  }

  #[test]
  fn integer_columns_are_accepted() {
    let df = df! {
      "x" => &[0, 1, 2, 3],
      "y" => &[1, 3, 5, 7],
    }
    .unwrap();

    let fit = curve_fit(&Linear, df.column("x").unwrap(), df.column("y").unwrap()).unwrap();
    assert!((fit.params()[0] - 2.0).abs() < 1e-6);
    assert!((fit.params()[1] - 1.0).abs() < 1e-6);
    assert!((fit.eval(&Linear, 10.0) - 21.0).abs() < 1e-5);
  }
}
