//! Backpropagation gradient and conjugate-gradient fine-tuning.
//!
//! Both operations require an [unrolled](crate::dbn::DeepBeliefNet::unroll)
//! network: the autoencoder's reconstruction error is differentiated through
//! every machine, and the resulting gradient drives [`cgmin`] inside the
//! outer fine-tuning loop.
//!
//! The gradient is stored in a second vector of [`Rbm`] views bound to a
//! separate arena of identical layout, so the per-machine `dW`/`dc` slots
//! reuse the stack's own offset bookkeeping.

use log::info;
use ndarray::{Array2, Axis};

use crate::arena::WeightArena;
use crate::cgmin::cgmin;
use crate::dbn::DeepBeliefNet;
use crate::error::{DbnError, DbnResult};
use crate::layer::UnitKind;
use crate::params::TrainParameters;
use crate::progress::{ContinuePolicy, TrainProgress};
use crate::rbm::Rbm;
use crate::sampler::Sampler;

impl DeepBeliefNet {
    /// Reconstruction-error gradient, written into caller-supplied gradient
    /// machine views.
    ///
    /// Forward-propagates `data` collecting per-layer activations and
    /// activities, seeds the output delta with
    /// `(reconstruction − input) ⊙ f'(activations)` for the output layer's
    /// unit type, then walks the deltas down through the transposed weights,
    /// each time applying the current layer's input-type derivative
    /// (gaussian layers pass the signal through unmodified). Each gradient
    /// machine receives `dc = Σ_batch delta` and `dW = delta · activityᵗ`;
    /// visible-bias slots stay untouched, consistent with tied-weight
    /// autoencoder semantics. When `error_out` is supplied it receives the
    /// scalar reconstruction error of this batch.
    ///
    /// Fails with `InvalidState` on a network that was never unrolled.
    pub fn write_gradient(
        &self,
        data: &Array2<f64>,
        gradient: &mut [Rbm],
        error_out: Option<&mut f64>,
    ) -> DbnResult<()> {
        if !self.unrolled {
            return Err(DbnError::InvalidState(
                "the network must be unrolled before computing its gradient".to_string(),
            ));
        }
        let depth = self.rbms.len();
        if gradient.len() != depth {
            return Err(DbnError::InvalidArgument(format!(
                "{} gradient machines for {} network machines",
                gradient.len(),
                depth
            )));
        }

        // Forward pass, keeping both activations and activities per layer.
        let mut activations: Vec<Array2<f64>> = Vec::with_capacity(depth + 1);
        let mut activities: Vec<Array2<f64>> = Vec::with_capacity(depth + 1);
        activations.push(Array2::zeros((0, 0))); // layer 0 has no activation
        activities.push(data.clone());
        for (l, rbm) in self.rbms.iter().enumerate() {
            let act = rbm.forward_activations(&activities[l]);
            let mut activity = act.clone();
            rbm.forward_activities_in_place(&mut activity);
            activations.push(act);
            activities.push(activity);
        }
        let reconstructions = &activities[depth];

        if let Some(error_out) = error_out {
            *error_out = self.error_sum_with(data, reconstructions);
        }

        // Output-layer delta.
        let residual = reconstructions - data;
        let output_kind = self.layers[depth].kind();
        let mut delta = match output_kind {
            UnitKind::Gaussian => residual,
            kind => residual * kind.activation_derivative(&activations[depth]),
        };

        // Walk down, emitting each machine's gradient as its upper delta
        // becomes available.
        for l in (0..depth).rev() {
            gradient[l].set_c(&delta.sum_axis(Axis(1)))?;
            gradient[l].set_w(&delta.dot(&activities[l].t()))?;
            if l > 0 {
                let back = self.rbms[l].weights_t_dot(&delta);
                delta = match self.rbms[l].input().kind() {
                    UnitKind::Gaussian => back,
                    kind => kind.activation_derivative(&activations[l]) * back,
                };
            }
        }

        Ok(())
    }

    /// Reconstruction-error gradient in a freshly allocated arena, returned
    /// with the machine views over it.
    pub fn gradient(&self, data: &Array2<f64>) -> DbnResult<(WeightArena, Vec<Rbm>)> {
        let arena = WeightArena::allocate(self.data.len());
        let mut machines = Self::construct_rbms(&self.layers, &arena)?;
        self.write_gradient(data, &mut machines, None)?;
        Ok((arena, machines))
    }

    /// Fine-tune the unrolled autoencoder with conjugate gradients.
    ///
    /// Works on a deep clone so the caller's parameters stay intact until
    /// the run completes; each outer iteration draws a fresh minibatch and
    /// runs one bounded [`cgmin`] call whose objective is the batch
    /// reconstruction error sum and whose gradient is
    /// [`write_gradient`](Self::write_gradient). The per-iteration objective
    /// minima feed the continuation policy with the usual patience
    /// semantics; a cgmin call that hits its gradient-evaluation cap counts
    /// as a normal iteration. On completion the final parameters are copied
    /// back into this network and the finetuned flag is set.
    ///
    /// Fails with `InvalidState` on a network that was never unrolled, with
    /// `NumericFailure` if the objective is non-finite at a starting point,
    /// and with `Cancelled` when the interrupt handle fires; the network is
    /// left unmodified in all error cases.
    pub fn train(
        &mut self,
        data: &Array2<f64>,
        params: &TrainParameters,
        progress: &mut dyn TrainProgress,
        keep_going: &ContinuePolicy,
    ) -> DbnResult<()> {
        if !self.unrolled {
            return Err(DbnError::InvalidState(
                "only unrolled networks can be fine-tuned".to_string(),
            ));
        }

        let training = self.deep_clone()?;
        let mut sampler = Sampler::from_seed_opt(params.seed);
        let mut batch = Array2::zeros((self.layers[0].size(), params.batch_size));

        // Gradient storage with the network's own layout.
        let gradient_arena = WeightArena::allocate(self.data.len());
        let mut gradient_rbms = Self::construct_rbms(&self.layers, &gradient_arena)?;

        // Working parameter vector handed to the minimizer, plus its
        // line-search scratch.
        let mut bvec = training.data().to_vec();
        let mut scratch = vec![0.0; bvec.len()];

        let mut errors: Vec<f64> = Vec::with_capacity(params.max_iters);
        let mut stop_counter = 0usize;
        let mut iter = 0usize;

        progress.set_batch_size(params.batch_size);
        progress.set_max_iters(params.max_iters);
        sampler.sample_batch(data, &mut batch);
        progress.step(&training, &batch, iter);

        info!(
            "fine-tuning until the stop counter reaches {}",
            keep_going.limit
        );

        while stop_counter < keep_going.limit && iter < params.max_iters {
            iter += 1;
            params.interrupt.check()?;

            let outcome = cgmin(
                &mut bvec,
                &mut scratch,
                &params.cg,
                |p| {
                    training.data().copy_from_slice(p);
                    training.error_sum(&batch)
                },
                |p, df| {
                    training.data().copy_from_slice(p);
                    training.write_gradient(&batch, &mut gradient_rbms, None)?;
                    gradient_arena.with(|g| df.copy_from_slice(g));
                    Ok(())
                },
            )?;
            errors.push(outcome.fmin);

            training.data().copy_from_slice(&bvec);
            progress.step(&training, &batch, iter);

            if iter >= params.min_iters
                && keep_going.frequency > 0
                && iter % keep_going.frequency == 0
            {
                if keep_going.should_continue(&errors, iter, params.batch_size, params.max_iters) {
                    stop_counter = 0;
                } else {
                    stop_counter += 1;
                }
            }

            if stop_counter < keep_going.limit && iter < params.max_iters {
                sampler.sample_batch(data, &mut batch);
            }
        }

        info!(
            "final error: {}",
            training.error_sum(&batch) / params.batch_size as f64
        );

        // Commit the trained parameters to the caller's network.
        self.data.copy_from_slice(&bvec);
        self.finetuned = true;
        Ok(())
    }
}
