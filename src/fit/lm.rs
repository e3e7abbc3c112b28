use nalgebra::{DMatrix, DVector};

use super::{FitOptions, Model};
use crate::{Error, Result};

const LAMBDA_INITIAL: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e16;

pub(crate) struct Solution {
  pub params:     DVector<f64>,
  /// `n × p` jacobian of the model at `params`.
  pub jacobian:   DMatrix<f64>,
  pub cost:       f64,
  pub iterations: usize,
}

/// Levenberg–Marquardt minimization of `Σ (y - f(x; p))²`, damping the normal
/// equations with `λ·diag(JᵀJ)`.
pub(crate) fn minimize<M: Model + ?Sized>(
  model: &M,
  x: &[f64],
  y: &[f64],
  initial: Vec<f64>,
  options: &FitOptions,
) -> Result<Solution> {
  let p = model.param_count();
  let max_iterations = options.max_iterations.unwrap_or(200 * (p + 1));

  let mut params = DVector::from_vec(initial);
  let mut residuals = residual_vector(model, x, y, &params);
  let mut cost = residuals.norm_squared();
  let mut lambda = LAMBDA_INITIAL;

  for iteration in 1..=max_iterations {
    let jac = jacobian(model, x, &params);
    let jtj = jac.tr_mul(&jac);
    let gradient = jac.tr_mul(&residuals);

    if cost == 0.0 || gradient.amax() <= options.gtol {
      return Ok(Solution { params, jacobian: jac, cost, iterations: iteration - 1 });
    }

    loop {
      let mut damped = jtj.clone();
      for i in 0..p {
        let d = jtj[(i, i)];
        damped[(i, i)] += lambda * if d > 0.0 { d } else { 1.0 };
      }

      let step = damped.cholesky().map(|c| c.solve(&gradient));
      let small_step = |step: &DVector<f64>, params: &DVector<f64>| {
        step.norm() <= options.xtol * (params.norm() + options.xtol)
      };

      if let Some(step) = step {
        let candidate = &params + &step;
        let candidate_residuals = residual_vector(model, x, y, &candidate);
        let candidate_cost = candidate_residuals.norm_squared();

        if candidate_cost.is_finite() && candidate_cost < cost {
          let reduction = (cost - candidate_cost) / cost;
          let converged = reduction <= options.ftol || small_step(&step, &candidate);

          params = candidate;
          residuals = candidate_residuals;
          cost = candidate_cost;
          lambda = (lambda / 10.0).max(f64::EPSILON);
          tracing::debug!(iteration, cost, lambda, "accepted step");

          if converged {
            let jac = jacobian(model, x, &params);
            return Ok(Solution { params, jacobian: jac, cost, iterations: iteration });
          }
          break;
        }

        // No downhill step left at this resolution.
        if small_step(&step, &params) {
          return Ok(Solution { params, jacobian: jac, cost, iterations: iteration });
        }
      }

      lambda *= 10.0;
      tracing::debug!(iteration, cost, lambda, "rejected step");
      if lambda > LAMBDA_MAX {
        return Err(Error::NoConvergence { iterations: iteration });
      }
    }
  }

  Err(Error::NoConvergence { iterations: max_iterations })
}

fn residual_vector<M: Model + ?Sized>(
  model: &M,
  x: &[f64],
  y: &[f64],
  params: &DVector<f64>,
) -> DVector<f64> {
  DVector::from_iterator(
    x.len(),
    x.iter().zip(y).map(|(&x, &y)| y - model.eval(x, params.as_slice())),
  )
}

fn jacobian<M: Model + ?Sized>(model: &M, x: &[f64], params: &DVector<f64>) -> DMatrix<f64> {
  let p = model.param_count();
  let mut jac = DMatrix::zeros(x.len(), p);
  let mut row = vec![0.0; p];

  for (i, &x) in x.iter().enumerate() {
    model.gradient(x, params.as_slice(), &mut row);
    for (j, &v) in row.iter().enumerate() {
      jac[(i, j)] = v;
    }
  }

  jac
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fit::Linear;

  #[test]
  fn exact_line_converges_to_zero_cost() {
    let x = [0.0, 1.0, 2.0, 3.0];
    let y = [1.0, 3.0, 5.0, 7.0];

    let solution = minimize(&Linear, &x, &y, vec![1.0, 1.0], &FitOptions::default()).unwrap();
    assert!((solution.params[0] - 2.0).abs() < 1e-6);
    assert!((solution.params[1] - 1.0).abs() < 1e-6);
    assert!(solution.cost < 1e-10);
  }

  #[test]
  fn starting_at_the_optimum_returns_immediately() {
    let x = [0.0, 1.0, 2.0];
    let y = [1.0, 3.0, 5.0];

    let solution = minimize(&Linear, &x, &y, vec![2.0, 1.0], &FitOptions::default()).unwrap();
    assert_eq!(solution.iterations, 0);
    assert_eq!(solution.params.as_slice(), &[2.0, 1.0]);
  }

  #[test]
  fn iteration_limit_is_enforced() {
    let model = (1_usize, |x: f64, p: &[f64]| (p[0] * x).exp());
    let x = [0.0, 1.0, 2.0, 3.0];
    let y = [1.0, 20.0, 400.0, 8000.0];

    let options = FitOptions { max_iterations: Some(1), ..FitOptions::default() };
    let err = minimize(&model, &x, &y, vec![0.1], &options).err();
    assert!(matches!(err, Some(Error::NoConvergence { iterations: 1 })));
  }
}
