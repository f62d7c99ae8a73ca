//! # deepbelief
//!
//! Deep belief network training from stacked restricted Boltzmann machines.
//!
//! ## Overview
//!
//! A [`DeepBeliefNet`] is an ordered stack of [`Rbm`]s whose parameters all
//! live in one shared [`WeightArena`]; each machine is a *view* into a
//! window of that buffer, with adjacent machines overlapping on the shared
//! boundary bias. Training is a three-phase protocol:
//!
//! 1. **Pretrain** — layer-wise unsupervised contrastive divergence, each
//!    layer fed the previous layer's activities;
//! 2. **Unroll** — mirror the stack into a symmetric tied-weight
//!    autoencoder (encoder followed by transposed decoder);
//! 3. **Fine-tune** — minimize the autoencoder's reconstruction error with
//!    backpropagated gradients driving a nonlinear conjugate-gradient
//!    minimizer ([`cgmin`]).
//!
//! Data matrices hold one example per column. Three unit types are
//! supported — binary (logistic), gaussian (linear), and continuous
//! (truncated exponential) — see [`UnitKind`] for their activation,
//! sampling, and derivative formulas.
//!
//! ## Structure
//!
//! - [`arena`] — shared, reference-counted parameter storage with views
//! - [`layer`] — layer descriptors and unit-type math
//! - [`rbm`] — restricted Boltzmann machines and contrastive divergence
//! - [`dbn`] — the network stack: unroll, reverse, predict, pretrain
//! - [`cgmin`] — the conjugate-gradient minimizer
//! - [`params`] — pretraining, fine-tuning, and optimizer parameters
//! - [`progress`] — progress traits, continuation policies, cancellation
//! - [`sampler`] — minibatch and unit-noise sampling
//! - [`checkpoint`] — JSON persistence of arena, layers, and phase flags

pub mod arena;
pub mod cgmin;
pub mod checkpoint;
pub mod dbn;
pub mod error;
pub mod layer;
pub mod params;
pub mod progress;
pub mod rbm;
pub mod sampler;
mod train;

pub use arena::WeightArena;
pub use cgmin::{cgmin, CgOutcome};
pub use dbn::DeepBeliefNet;
pub use error::{DbnError, DbnResult};
pub use layer::{Layer, UnitKind};
pub use params::{CgMinParams, CgUpdate, Penalty, PretrainParameters, TrainParameters};
pub use progress::{
    ContinuePolicy, Interrupt, NoOpPretrainProgress, NoOpTrainProgress, PretrainProgress,
    TrainProgress,
};
pub use rbm::Rbm;
pub use sampler::Sampler;
