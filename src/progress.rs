//! Progress reporting, continuation policies, and cooperative cancellation.
//!
//! Training loops report through capability traits with default no-op
//! methods; callers inject whatever implementation they want (or
//! [`NoOpPretrainProgress`] / [`NoOpTrainProgress`] explicitly). Whether a
//! loop keeps running is decided by a [`ContinuePolicy`]: an explicit
//! strategy value with a patience counter, defaulting to "always continue".

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::Array2;

use crate::dbn::DeepBeliefNet;
use crate::error::{DbnError, DbnResult};
use crate::rbm::Rbm;

/// Diagnostic hook a pretraining progress reporter may carry: maps a machine
/// and a test set to a scalar (typically a held-out reconstruction error).
pub type PretrainDiagnostic = Box<dyn FnMut(&Rbm, &Array2<f64>) -> f64>;

/// Diagnostic hook a fine-tuning progress reporter may carry.
pub type TrainDiagnostic = Box<dyn FnMut(&DeepBeliefNet, &Array2<f64>) -> f64>;

/// Observer invoked during contrastive-divergence pretraining.
///
/// `step` runs once per iteration (including a zeroth call before the first
/// batch); how often an implementation actually reports is its own business.
/// All methods default to no-ops so implementations only override what they
/// need.
pub trait PretrainProgress {
    /// Called every iteration with the machine being trained, the current
    /// minibatch, and the iteration index (0 before the first batch).
    fn step(&mut self, _rbm: &Rbm, _batch: &Array2<f64>, _iter: usize) {}
    /// Layer index when pretraining a whole network, 1-based.
    fn set_layer(&mut self, _layer: usize) {}
    fn set_batch_size(&mut self, _batch_size: usize) {}
    fn set_max_iters(&mut self, _max_iters: usize) {}
    /// Hand over a held-out test set for diagnostics.
    fn set_data(&mut self, _test_set: Array2<f64>) {}
    /// Install the diagnostic evaluated against the held test set.
    fn set_function(&mut self, _diagnostic: PretrainDiagnostic) {}
    /// Transform the held test set forward through a freshly trained machine
    /// so the next layer's pretraining sees embedded features.
    fn propagate_data(&mut self, _rbm: &Rbm) {}
    fn reset(&mut self) {}
}

/// Observer invoked once per outer iteration of fine-tuning.
pub trait TrainProgress {
    fn step(&mut self, _network: &DeepBeliefNet, _batch: &Array2<f64>, _iter: usize) {}
    fn set_batch_size(&mut self, _batch_size: usize) {}
    fn set_max_iters(&mut self, _max_iters: usize) {}
    fn set_data(&mut self, _test_set: Array2<f64>) {}
    fn set_function(&mut self, _diagnostic: TrainDiagnostic) {}
    fn reset(&mut self) {}
}

/// Progress reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPretrainProgress;

impl PretrainProgress for NoOpPretrainProgress {}

/// Fine-tuning progress reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTrainProgress;

impl TrainProgress for NoOpTrainProgress {}

/// Decision function consulted by the training loops:
/// `(error_history, iteration, batch_size, max_iters, layer) -> bool`,
/// where `true` means "keep going".
pub type ContinueStrategy = Box<dyn Fn(&[f64], usize, usize, usize, usize) -> bool>;

/// Continuation policy with patience semantics.
///
/// The strategy is consulted every `frequency` iterations once the loop has
/// passed its minimum iteration count. Each consecutive `false` answer
/// increments a patience counter; any `true` resets it. The loop stops when
/// the counter reaches `limit`.
pub struct ContinuePolicy {
    /// 1-based layer currently being trained; 0 outside layer-wise loops.
    pub layer: usize,
    /// Check cadence in iterations.
    pub frequency: usize,
    /// Patience: consecutive "stop" answers required to halt the loop.
    pub limit: usize,
    strategy: ContinueStrategy,
}

impl ContinuePolicy {
    pub fn new(frequency: usize, limit: usize, strategy: ContinueStrategy) -> Self {
        Self {
            layer: 0,
            frequency,
            limit,
            strategy,
        }
    }

    /// Policy that always answers "keep going".
    pub fn always() -> Self {
        Self::new(100, 3, Box::new(|_, _, _, _, _| true))
    }

    pub fn set_layer(&mut self, layer: usize) {
        self.layer = layer;
    }

    /// Ask the strategy whether the loop should continue.
    pub fn should_continue(
        &self,
        errors: &[f64],
        iter: usize,
        batch_size: usize,
        max_iters: usize,
    ) -> bool {
        (self.strategy)(errors, iter, batch_size, max_iters, self.layer)
    }
}

impl Default for ContinuePolicy {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for ContinuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuePolicy")
            .field("layer", &self.layer)
            .field("frequency", &self.frequency)
            .field("limit", &self.limit)
            .finish()
    }
}

/// Cooperative cancellation handle.
///
/// Long-running loops call [`Interrupt::check`] once per outer iteration and
/// abort with [`DbnError::Cancelled`] when the shared flag has been raised —
/// typically from a signal handler or a supervising thread. The default
/// handle never cancels.
#[derive(Clone, Default)]
pub struct Interrupt {
    flag: Option<Arc<AtomicBool>>,
}

impl Interrupt {
    /// Handle that never cancels.
    pub fn none() -> Self {
        Self { flag: None }
    }

    /// Handle observing an externally owned flag.
    pub fn watching(flag: Arc<AtomicBool>) -> Self {
        Self { flag: Some(flag) }
    }

    /// Cancellation point: errs with `Cancelled` if the flag is raised.
    pub fn check(&self) -> DbnResult<()> {
        match &self.flag {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(DbnError::Cancelled),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interrupt")
            .field("armed", &self.flag.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_always_continues() {
        let policy = ContinuePolicy::default();
        assert!(policy.should_continue(&[1.0, 0.5], 100, 10, 1000));
        assert_eq!(policy.frequency, 100);
        assert_eq!(policy.limit, 3);
    }

    #[test]
    fn test_custom_strategy_sees_arguments() {
        let policy = ContinuePolicy::new(
            10,
            2,
            Box::new(|errors, iter, batch_size, max_iters, layer| {
                assert_eq!(errors, &[3.0, 2.0]);
                assert_eq!(iter, 20);
                assert_eq!(batch_size, 5);
                assert_eq!(max_iters, 200);
                assert_eq!(layer, 1);
                errors.last().copied().unwrap_or(0.0) > 2.5
            }),
        );
        let mut policy = policy;
        policy.set_layer(1);
        assert!(!policy.should_continue(&[3.0, 2.0], 20, 5, 200));
    }

    #[test]
    fn test_interrupt_none_never_cancels() {
        let interrupt = Interrupt::none();
        assert!(interrupt.check().is_ok());
    }

    #[test]
    fn test_interrupt_flag_cancels() {
        let flag = Arc::new(AtomicBool::new(false));
        let interrupt = Interrupt::watching(Arc::clone(&flag));
        assert!(interrupt.check().is_ok());

        flag.store(true, Ordering::Relaxed);
        assert!(matches!(interrupt.check(), Err(DbnError::Cancelled)));
    }

    #[test]
    fn test_noop_progress_compiles_as_trait_object() {
        let mut progress: Box<dyn PretrainProgress> = Box::new(NoOpPretrainProgress);
        progress.set_layer(1);
        progress.reset();
    }
}
