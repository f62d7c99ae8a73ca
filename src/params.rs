//! Parameter structures for pretraining, fine-tuning, and the optimizer.
//!
//! These are plain data with `Default` impls carrying the stock constants;
//! set fields directly with struct-update syntax:
//!
//! ```
//! use deepbelief::params::PretrainParameters;
//!
//! let params = PretrainParameters {
//!     epsilon_w: 0.05,
//!     max_iters: 500,
//!     ..PretrainParameters::default()
//! };
//! assert_eq!(params.batch_size, 100);
//! ```
//!
//! Validation happens eagerly, before any numeric work: a malformed momentum
//! vector is rejected by [`PretrainParameters::valid_momentums`] before the
//! first batch is drawn.

use std::fmt;
use std::str::FromStr;

use crate::error::{DbnError, DbnResult};
use crate::progress::Interrupt;

/// Weight-penalty flavor applied to the contrastive-divergence deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Penalty {
    L1,
    L2,
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Penalty::L1 => write!(f, "l1"),
            Penalty::L2 => write!(f, "l2"),
        }
    }
}

impl FromStr for Penalty {
    type Err = DbnError;

    fn from_str(s: &str) -> DbnResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "l1" => Ok(Penalty::L1),
            "l2" => Ok(Penalty::L2),
            other => Err(DbnError::InvalidArgument(format!(
                "penalization not l1 or l2: {}",
                other
            ))),
        }
    }
}

/// Per-layer contrastive-divergence pretraining parameters.
#[derive(Debug, Clone)]
pub struct PretrainParameters {
    /// Learning rates for the visible bias, hidden bias, and weights.
    pub epsilon_b: f64,
    pub epsilon_c: f64,
    pub epsilon_w: f64,
    /// Penalty coefficients for the visible bias, hidden bias, and weights.
    pub lambda_b: f64,
    pub lambda_c: f64,
    pub lambda_w: f64,
    pub penalty: Penalty,
    /// Momentum schedule seed: a vector of length 1 (constant), 2 (linear
    /// ramp endpoints), or `max_iters` (explicit per-iteration values). Any
    /// other length is rejected before training starts.
    pub momentums: Vec<f64>,
    pub min_iters: usize,
    pub max_iters: usize,
    /// Minibatch size; 0 means `sample_count / max_iters`.
    pub batch_size: usize,
    /// Whether the visible/hidden biases are updated (weights always are).
    pub train_b: bool,
    pub train_c: bool,
    /// Worker-thread count handed to the dense kernels; 0 disables parallel
    /// execution. Opaque to the training logic itself.
    pub nb_threads: usize,
    /// Fixed sampler seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Cooperative cancellation handle checked once per iteration.
    pub interrupt: Interrupt,
}

impl Default for PretrainParameters {
    fn default() -> Self {
        Self {
            epsilon_b: 0.001,
            epsilon_c: 0.001,
            epsilon_w: 0.001,
            lambda_b: 0.0,
            lambda_c: 0.0,
            lambda_w: 0.0,
            penalty: Penalty::L1,
            momentums: vec![0.0],
            min_iters: 100,
            max_iters: 100,
            batch_size: 100,
            train_b: true,
            train_c: true,
            nb_threads: 0,
            seed: None,
            interrupt: Interrupt::none(),
        }
    }
}

impl PretrainParameters {
    /// Set all three learning rates at once.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon_b = epsilon;
        self.epsilon_c = epsilon;
        self.epsilon_w = epsilon;
        self
    }

    /// Set all three penalty coefficients at once.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda_b = lambda;
        self.lambda_c = lambda;
        self.lambda_w = lambda;
        self
    }

    /// Expand the momentum seed into a per-iteration schedule of length
    /// `max_iters`.
    ///
    /// A length-2 seed ramps linearly from `momentums[0]` to `momentums[1]`.
    /// Fails with `InvalidArgument` for any other length than 1, 2, or
    /// `max_iters`.
    pub fn valid_momentums(&self) -> DbnResult<Vec<f64>> {
        match self.momentums.len() {
            1 => Ok(vec![self.momentums[0]; self.max_iters]),
            2 => {
                let from = self.momentums[0];
                let to = self.momentums[1];
                let increment = if self.max_iters > 1 {
                    (to - from) / (self.max_iters as f64 - 1.0)
                } else {
                    0.0
                };
                Ok((0..self.max_iters)
                    .map(|i| from + increment * i as f64)
                    .collect())
            }
            n if n == self.max_iters => Ok(self.momentums.clone()),
            _ => Err(DbnError::InvalidArgument(
                "momentums of wrong size: should be 1, 2 or max_iters".to_string(),
            )),
        }
    }
}

/// Conjugate-gradient direction-update rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgUpdate {
    FletcherReeves,
    PolakRibiere,
    BealeSorenson,
}

impl fmt::Display for CgUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CgUpdate::FletcherReeves => write!(f, "fletcher-reeves"),
            CgUpdate::PolakRibiere => write!(f, "polak-ribiere"),
            CgUpdate::BealeSorenson => write!(f, "beale-sorenson"),
        }
    }
}

impl FromStr for CgUpdate {
    type Err = DbnError;

    fn from_str(s: &str) -> DbnResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fletcher-reeves" | "fr" => Ok(CgUpdate::FletcherReeves),
            "polak-ribiere" | "pr" => Ok(CgUpdate::PolakRibiere),
            "beale-sorenson" | "bs" => Ok(CgUpdate::BealeSorenson),
            other => Err(DbnError::InvalidArgument(format!(
                "unknown conjugate-gradient update rule: {}",
                other
            ))),
        }
    }
}

/// Knobs of the conjugate-gradient minimizer.
#[derive(Debug, Clone)]
pub struct CgMinParams {
    pub update: CgUpdate,
    /// Gradient-evaluation cap per call; 0 evaluates the objective once and
    /// returns.
    pub max_cg_iters: usize,
    /// Initial line-search step length.
    pub steplength: f64,
    /// Multiplicative step shrink applied on a rejected step.
    pub stepredn: f64,
    /// Acceptance tolerance of the sufficient-decrease test.
    pub acctol: f64,
    /// Scale of the relative-equality guard that detects steps below the
    /// representable resolution of the parameters.
    pub reltest: f64,
    /// Absolute tolerance on the objective.
    pub abstol: f64,
    /// Relative tolerance feeding the gradient-norm test.
    pub intol: f64,
    /// Growth factor applied to the accepted step when seeding the next
    /// search.
    pub setstep: f64,
}

impl Default for CgMinParams {
    fn default() -> Self {
        Self {
            update: CgUpdate::PolakRibiere,
            max_cg_iters: 10,
            steplength: 1.0,
            stepredn: 0.2,
            acctol: 0.0001,
            reltest: 10.0,
            abstol: f64::NEG_INFINITY,
            intol: f64::EPSILON.sqrt(),
            setstep: 1.7,
        }
    }
}

/// Outer fine-tuning loop parameters.
#[derive(Debug, Clone)]
pub struct TrainParameters {
    pub cg: CgMinParams,
    pub batch_size: usize,
    pub min_iters: usize,
    pub max_iters: usize,
    /// Worker-thread count handed to the dense kernels; 0 disables parallel
    /// execution. Opaque to the training logic itself.
    pub nb_threads: usize,
    /// Fixed sampler seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Cooperative cancellation handle checked once per outer iteration.
    pub interrupt: Interrupt,
}

impl Default for TrainParameters {
    fn default() -> Self {
        Self {
            cg: CgMinParams::default(),
            batch_size: 100,
            min_iters: 100,
            max_iters: 1000,
            nb_threads: 0,
            seed: None,
            interrupt: Interrupt::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_penalty_round_trip() {
        assert_eq!("l1".parse::<Penalty>().unwrap(), Penalty::L1);
        assert_eq!("L2".parse::<Penalty>().unwrap(), Penalty::L2);
        assert!(matches!(
            "elastic".parse::<Penalty>(),
            Err(DbnError::InvalidArgument(_))
        ));
        assert_eq!(Penalty::L1.to_string(), "l1");
    }

    #[test]
    fn test_cg_update_parsing() {
        assert_eq!("fr".parse::<CgUpdate>().unwrap(), CgUpdate::FletcherReeves);
        assert_eq!(
            "Polak-Ribiere".parse::<CgUpdate>().unwrap(),
            CgUpdate::PolakRibiere
        );
        assert_eq!("bs".parse::<CgUpdate>().unwrap(), CgUpdate::BealeSorenson);
        assert!("newton".parse::<CgUpdate>().is_err());
    }

    #[test]
    fn test_constant_momentum_expansion() {
        let params = PretrainParameters {
            momentums: vec![0.5],
            max_iters: 4,
            ..PretrainParameters::default()
        };
        assert_eq!(params.valid_momentums().unwrap(), vec![0.5; 4]);
    }

    #[test]
    fn test_ramp_momentum_expansion() {
        let params = PretrainParameters {
            momentums: vec![0.0, 0.9],
            max_iters: 4,
            ..PretrainParameters::default()
        };
        let schedule = params.valid_momentums().unwrap();
        assert_eq!(schedule.len(), 4);
        assert_abs_diff_eq!(schedule[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(schedule[1], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(schedule[3], 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_explicit_momentum_schedule() {
        let params = PretrainParameters {
            momentums: vec![0.1, 0.2, 0.3],
            max_iters: 3,
            ..PretrainParameters::default()
        };
        assert_eq!(params.valid_momentums().unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_invalid_momentum_length() {
        let params = PretrainParameters {
            momentums: vec![0.1, 0.2, 0.3],
            max_iters: 10,
            ..PretrainParameters::default()
        };
        assert!(matches!(
            params.valid_momentums(),
            Err(DbnError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bulk_setters() {
        let params = PretrainParameters::default()
            .with_epsilon(0.01)
            .with_lambda(0.001);
        assert_eq!(params.epsilon_b, 0.01);
        assert_eq!(params.epsilon_c, 0.01);
        assert_eq!(params.epsilon_w, 0.01);
        assert_eq!(params.lambda_w, 0.001);
    }

    #[test]
    fn test_cgmin_defaults() {
        let params = CgMinParams::default();
        assert_eq!(params.update, CgUpdate::PolakRibiere);
        assert_eq!(params.max_cg_iters, 10);
        assert_eq!(params.abstol, f64::NEG_INFINITY);
        assert_abs_diff_eq!(params.intol, f64::EPSILON.sqrt(), epsilon = 1e-18);
    }
}
