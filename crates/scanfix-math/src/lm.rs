//! Levenberg-Marquardt nonlinear least squares
//!
//! Minimizes `Σ wᵢ·(targetᵢ − f(inputᵢ; p))²` over the parameter vector `p`.
//! Each iteration builds the Gauss-Newton approximation of the Hessian from
//! the model's analytic gradient, boosts its diagonal by `(1 + λ)`, solves
//! for a step with [`LuDecomposition`], and keeps the step only when the
//! error does not grow. A rejected step multiplies `λ` by 10, an accepted
//! one by 0.1. The final `λ` is returned so a caller can resume.

use crate::error::{MathError, MathResult};
use crate::lu::LuDecomposition;
use crate::matrix::Matrix;
use scanfix_core::CancelToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Consecutive small error changes that end the iteration.
const CONVERGED_STREAK: u32 = 4;

/// Model fitted by [`LevenbergMarquardt`].
pub trait LmModel {
    /// One sample's independent variables.
    type Input;

    /// Model value at `input` for `params`.
    fn value(&self, input: &Self::Input, params: &[f64]) -> f64;

    /// Partial derivatives of [`value`](Self::value) with respect to every
    /// parameter, written into `grad` (same length as `params`).
    fn gradient(&self, input: &Self::Input, params: &[f64], grad: &mut [f64]);
}

/// Solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmOptions {
    /// Upper bound on iterations
    pub max_iterations: u32,
    /// Error change counted as "no progress"
    pub tolerance: f64,
    /// Starting damping factor
    pub initial_lambda: f64,
    /// Which parameters may change; `None` means all
    pub varying: Option<Vec<bool>>,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-10,
            initial_lambda: 0.001,
            varying: None,
        }
    }
}

impl LmOptions {
    /// Set the iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the starting damping factor, e.g. the `lambda` of an earlier run.
    pub fn with_initial_lambda(mut self, lambda: f64) -> Self {
        self.initial_lambda = lambda;
        self
    }

    /// Restrict which parameters are adjusted.
    pub fn with_varying(mut self, varying: Vec<bool>) -> Self {
        self.varying = Some(varying);
        self
    }
}

/// Result of a fit.
#[derive(Debug, Clone, PartialEq)]
pub struct LmOutcome {
    /// Final parameters
    pub params: Vec<f64>,
    /// Weighted sum of squared residuals at `params`
    pub error: f64,
    /// Final damping factor
    pub lambda: f64,
    /// Iterations performed
    pub iterations: u32,
}

/// Levenberg-Marquardt solver.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    options: LmOptions,
}

impl LevenbergMarquardt {
    /// Create a solver.
    pub fn new(options: LmOptions) -> Self {
        Self { options }
    }

    /// Solver settings.
    pub fn options(&self) -> &LmOptions {
        &self.options
    }

    /// Fit `model` to `(inputs, targets)` starting from `initial`.
    ///
    /// `weights` defaults to 1 for every sample. The token is polled once
    /// per iteration.
    ///
    /// # Errors
    ///
    /// Returns [`MathError::DimensionMismatch`] when the sample, weight or
    /// varying-mask lengths disagree, [`MathError::InvalidArgument`] for an
    /// empty parameter vector, and [`MathError::Cancelled`] when the token
    /// fires. A singular step or a non-finite error is not an error: the
    /// step is rejected and damping increases.
    pub fn fit<M: LmModel>(
        &self,
        model: &M,
        inputs: &[M::Input],
        targets: &[f64],
        weights: Option<&[f64]>,
        initial: &[f64],
        cancel: &CancelToken,
    ) -> MathResult<LmOutcome> {
        let n = initial.len();
        if n == 0 {
            return Err(MathError::InvalidArgument(
                "no parameters to fit".to_string(),
            ));
        }
        if inputs.len() != targets.len() {
            return Err(MathError::DimensionMismatch(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        if let Some(w) = weights {
            if w.len() != targets.len() {
                return Err(MathError::DimensionMismatch(format!(
                    "{} weights for {} samples",
                    w.len(),
                    targets.len()
                )));
            }
        }
        let active: Vec<usize> = match &self.options.varying {
            Some(mask) if mask.len() != n => {
                return Err(MathError::DimensionMismatch(format!(
                    "varying mask of length {} for {} parameters",
                    mask.len(),
                    n
                )));
            }
            Some(mask) => (0..n).filter(|&i| mask[i]).collect(),
            None => (0..n).collect(),
        };

        let weight = |i: usize| weights.map_or(1.0, |w| w[i]);
        let total_error = |params: &[f64]| -> f64 {
            inputs
                .iter()
                .zip(targets)
                .enumerate()
                .map(|(i, (input, &t))| {
                    let r = t - model.value(input, params);
                    weight(i) * r * r
                })
                .sum()
        };

        let mut params = initial.to_vec();
        let mut error = total_error(params.as_slice());
        let mut lambda = self.options.initial_lambda;
        let mut iterations = 0;
        let mut streak = 0;
        let k = active.len();
        let mut grad = vec![0.0; n];

        while k > 0 && iterations < self.options.max_iterations && streak < CONVERGED_STREAK {
            if cancel.is_cancelled() {
                return Err(MathError::Cancelled);
            }
            iterations += 1;

            let mut alpha = Matrix::new(k, k);
            let mut beta = vec![0.0; k];
            for (i, (input, &t)) in inputs.iter().zip(targets).enumerate() {
                let w = weight(i);
                let r = t - model.value(input, &params);
                model.gradient(input, &params, &mut grad);
                for (a, &pa) in active.iter().enumerate() {
                    beta[a] += w * r * grad[pa];
                    for (b, &pb) in active.iter().enumerate().take(a + 1) {
                        alpha[(a, b)] += w * grad[pa] * grad[pb];
                    }
                }
            }
            for a in 0..k {
                for b in 0..a {
                    alpha[(b, a)] = alpha[(a, b)];
                }
                alpha[(a, a)] *= 1.0 + lambda;
            }

            let step = match LuDecomposition::new(&alpha).and_then(|lu| lu.solve_vec(&beta)) {
                Ok(step) => step,
                Err(e) => {
                    warn!(iteration = iterations, lambda, error = %e, "LM step solve failed");
                    lambda *= 10.0;
                    streak = 0;
                    continue;
                }
            };

            let mut trial = params.clone();
            for (&p, s) in active.iter().zip(&step) {
                trial[p] += s;
            }
            let new_error = total_error(trial.as_slice());

            if (new_error - error).abs() < self.options.tolerance {
                streak += 1;
            } else {
                streak = 0;
            }

            // NaN compares false and is rejected
            if new_error <= error {
                lambda *= 0.1;
                params = trial;
                error = new_error;
            } else {
                lambda *= 10.0;
            }
        }

        debug!(iterations, error, lambda, "LM finished");
        Ok(LmOutcome {
            params,
            error,
            lambda,
            iterations,
        })
    }
}
