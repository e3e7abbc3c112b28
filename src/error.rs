use polars::error::PolarsError;

/// Errors produced while fitting or rendering a plot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error(transparent)]
  Polars(#[from] PolarsError),

  /// Two columns that must pair up element-wise have different lengths.
  #[error("length mismatch: expected {expected} values, found {found}")]
  LengthMismatch { expected: usize, found: usize },

  /// The model has more free parameters than there are data points.
  #[error("improper input: {params} parameters cannot be fitted to {points} points")]
  TooFewPoints { points: usize, params: usize },

  #[error("least-squares fit did not converge after {iterations} iterations")]
  NoConvergence { iterations: usize },

  /// `JᵀJ` at the solution is rank deficient, so no covariance exists.
  #[error("singular jacobian: parameters are not identifiable from the data")]
  SingularJacobian,

  #[error("gpu: {0}")]
  Gpu(String),

  #[error(transparent)]
  Image(#[from] image::ImageError),

  #[error(transparent)]
  Window(#[from] winit::error::EventLoopError),
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ResultExt<T> {
  /// Logs the error and discards it.
  fn log_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
  fn log_err(self) -> Option<T> {
    match self {
      Ok(v) => Some(v),
      Err(e) => {
        tracing::warn!("{e}");
        None
      }
    }
  }
}
