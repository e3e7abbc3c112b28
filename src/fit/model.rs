/// A function `f(x; params)` whose parameters are estimated by
/// [`curve_fit`](super::curve_fit).
pub trait Model {
  fn param_count(&self) -> usize;

  fn eval(&self, x: f64, params: &[f64]) -> f64;

  /// Partial derivatives of `eval` with respect to each parameter, written
  /// into `out`. The default is a forward difference.
  fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
    let base = self.eval(x, params);
    let mut shifted = params.to_vec();

    for (i, slot) in out.iter_mut().enumerate() {
      let h = f64::EPSILON.sqrt() * params[i].abs().max(1.0);
      shifted[i] = params[i] + h;
      *slot = (self.eval(x, &shifted) - base) / h;
      shifted[i] = params[i];
    }
  }
}

/// `f(x; a, b) = a·x + b`
#[derive(Clone, Copy, Debug, Default)]
pub struct Linear;

impl Model for Linear {
  fn param_count(&self) -> usize { 2 }

  fn eval(&self, x: f64, params: &[f64]) -> f64 { params[0] * x + params[1] }

  fn gradient(&self, x: f64, _: &[f64], out: &mut [f64]) {
    out[0] = x;
    out[1] = 1.0;
  }
}

impl<F> Model for (usize, F)
where
  F: Fn(f64, &[f64]) -> f64,
{
  fn param_count(&self) -> usize { self.0 }

  fn eval(&self, x: f64, params: &[f64]) -> f64 { (self.1)(x, params) }
}
