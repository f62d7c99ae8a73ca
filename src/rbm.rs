//! Restricted Boltzmann machines as views into shared parameter storage.
//!
//! An [`Rbm`] pairs a visible and a hidden [`Layer`] and interprets a window
//! of a [`WeightArena`] as its parameters, laid out as the visible bias `b`,
//! the weight matrix `W` (hidden × visible, row-major by hidden unit), and
//! the hidden bias `c`, in that order. Machines built consecutively from one
//! arena overlap so that one machine's hidden bias window is the next
//! machine's visible bias window.
//!
//! ## Forward and backward passes
//!
//! The forward *activation* of the hidden layer is `W·v .+ c` (broadcast over
//! example columns); the *activity* applies the hidden layer's unit
//! nonlinearity. The backward pass is symmetric with `Wᵗ` and `b`, using the
//! visible layer's unit type. See [`UnitKind`] for the unit math.

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis};

use crate::arena::WeightArena;
use crate::error::{DbnError, DbnResult};
use crate::layer::{Layer, UnitKind};
use crate::params::{Penalty, PretrainParameters};
use crate::progress::{ContinuePolicy, PretrainProgress};
use crate::sampler::Sampler;

/// Restricted Boltzmann machine over a parameter-arena window.
///
/// Plain [`Clone`] shares the underlying parameter storage (both machines
/// observe each other's updates); [`Rbm::deep_clone`] copies the window into
/// independent storage.
#[derive(Debug, Clone)]
pub struct Rbm {
    input: Layer,
    output: Layer,
    offsets: (usize, usize, usize, usize),
    data: WeightArena,
    pretrained: bool,
}

impl Rbm {
    /// Parameter-window offsets for a visible/hidden layer pair:
    /// `(b start, W start, c start, total length)`.
    pub fn compute_offsets(input: Layer, output: Layer) -> (usize, usize, usize, usize) {
        let m = input.size();
        let n = output.size();
        (0, m, m + m * n, m + m * n + n)
    }

    /// Machine owning its own zero-initialized parameter storage.
    pub fn new(input: Layer, output: Layer) -> Self {
        let offsets = Self::compute_offsets(input, output);
        Self {
            input,
            output,
            offsets,
            data: WeightArena::allocate(offsets.3),
            pretrained: false,
        }
    }

    /// Machine viewing the first `b`+`W`+`c` window of `data`.
    ///
    /// Fails with `OutOfRange` when the arena view is too short for the
    /// layer pair.
    pub fn with_arena(
        input: Layer,
        output: Layer,
        data: &WeightArena,
        pretrained: bool,
    ) -> DbnResult<Self> {
        let offsets = Self::compute_offsets(input, output);
        Ok(Self {
            input,
            output,
            offsets,
            data: data.with_length(offsets.3)?,
            pretrained,
        })
    }

    /* Accessors */

    pub fn n_input(&self) -> usize {
        self.input.size()
    }

    pub fn n_output(&self) -> usize {
        self.output.size()
    }

    pub fn n_weights(&self) -> usize {
        self.input.size() * self.output.size()
    }

    /// Total parameter count of this machine (`b` + `W` + `c`).
    pub fn total_size(&self) -> usize {
        self.offsets.3
    }

    pub fn input(&self) -> Layer {
        self.input
    }

    pub fn output(&self) -> Layer {
        self.output
    }

    pub fn offsets(&self) -> (usize, usize, usize, usize) {
        self.offsets
    }

    pub fn data(&self) -> &WeightArena {
        &self.data
    }

    pub fn is_pretrained(&self) -> bool {
        self.pretrained
    }

    pub(crate) fn set_pretrained(&mut self, pretrained: bool) {
        self.pretrained = pretrained;
    }

    /// Arena offset of the hidden bias relative to this machine's window.
    /// The next machine in a stack starts its visible bias here.
    pub fn relative_offset_c(&self) -> usize {
        self.offsets.2
    }

    /* Parameter views */

    fn with_views<R>(&self, f: impl FnOnce(ArrayView1<f64>, ArrayView2<f64>, ArrayView1<f64>) -> R) -> R {
        let (m, n) = (self.input.size(), self.output.size());
        let (_, w_start, c_start, _) = self.offsets;
        self.data.with(|s| {
            let (b, rest) = s.split_at(w_start);
            let (w, c) = rest.split_at(c_start - w_start);
            let w = ArrayView2::from_shape((n, m), w).expect("window length matches layer sizes");
            f(ArrayView1::from(b), w, ArrayView1::from(c))
        })
    }

    fn with_views_mut<R>(
        &mut self,
        f: impl FnOnce(ArrayViewMut1<f64>, ArrayViewMut2<f64>, ArrayViewMut1<f64>) -> R,
    ) -> R {
        let (m, n) = (self.input.size(), self.output.size());
        let (_, w_start, c_start, _) = self.offsets;
        self.data.with_mut(|s| {
            let (b, rest) = s.split_at_mut(w_start);
            let (w, c) = rest.split_at_mut(c_start - w_start);
            let w =
                ArrayViewMut2::from_shape((n, m), w).expect("window length matches layer sizes");
            f(ArrayViewMut1::from(b), w, ArrayViewMut1::from(c))
        })
    }

    /// Copy of the visible bias.
    pub fn get_b(&self) -> Array1<f64> {
        self.with_views(|b, _, _| b.to_owned())
    }

    /// Copy of the hidden bias.
    pub fn get_c(&self) -> Array1<f64> {
        self.with_views(|_, _, c| c.to_owned())
    }

    /// Copy of the weight matrix (hidden × visible).
    pub fn get_w(&self) -> Array2<f64> {
        self.with_views(|_, w, _| w.to_owned())
    }

    /// Overwrite the visible bias.
    pub fn set_b(&mut self, new_b: &Array1<f64>) -> DbnResult<()> {
        if new_b.len() != self.input.size() {
            return Err(DbnError::InvalidArgument(format!(
                "visible bias has {} entries, expected {}",
                new_b.len(),
                self.input.size()
            )));
        }
        self.with_views_mut(|mut b, _, _| b.assign(new_b));
        Ok(())
    }

    /// Overwrite the hidden bias.
    pub fn set_c(&mut self, new_c: &Array1<f64>) -> DbnResult<()> {
        if new_c.len() != self.output.size() {
            return Err(DbnError::InvalidArgument(format!(
                "hidden bias has {} entries, expected {}",
                new_c.len(),
                self.output.size()
            )));
        }
        self.with_views_mut(|_, _, mut c| c.assign(new_c));
        Ok(())
    }

    /// Overwrite the weight matrix (any memory order accepted).
    pub fn set_w(&mut self, new_w: &Array2<f64>) -> DbnResult<()> {
        let expected = (self.output.size(), self.input.size());
        if new_w.dim() != expected {
            return Err(DbnError::InvalidArgument(format!(
                "weight matrix is {:?}, expected {:?}",
                new_w.dim(),
                expected
            )));
        }
        self.with_views_mut(|_, mut w, _| w.assign(new_w));
        Ok(())
    }

    /* Forward pass */

    /// Hidden activations `W·v .+ c` for a matrix of visible columns.
    pub fn forward_activations(&self, visible: &Array2<f64>) -> Array2<f64> {
        self.with_views(|_, w, c| {
            let mut act = w.dot(visible);
            act += &c.insert_axis(Axis(1));
            act
        })
    }

    /// Apply the hidden layer's nonlinearity to activations, in place.
    pub fn forward_activities_in_place(&self, activations: &mut Array2<f64>) {
        self.output.kind().apply_activity(activations);
    }

    /// Hidden activities for a matrix of visible columns.
    pub fn forward_activities(&self, visible: &Array2<f64>) -> Array2<f64> {
        let mut act = self.forward_activations(visible);
        self.forward_activities_in_place(&mut act);
        act
    }

    /* Backward pass */

    /// Visible activations `Wᵗ·h .+ b` for a matrix of hidden columns.
    pub fn backward_activations(&self, hidden: &Array2<f64>) -> Array2<f64> {
        self.with_views(|b, w, _| {
            let mut act = w.t().dot(hidden);
            act += &b.insert_axis(Axis(1));
            act
        })
    }

    /// Apply the visible layer's nonlinearity to activations, in place.
    pub fn backward_activities_in_place(&self, activations: &mut Array2<f64>) {
        self.input.kind().apply_activity(activations);
    }

    /// Visible activities for a matrix of hidden columns.
    pub fn backward_activities(&self, hidden: &Array2<f64>) -> Array2<f64> {
        let mut act = self.backward_activations(hidden);
        self.backward_activities_in_place(&mut act);
        act
    }

    /// Multiply by the transposed weights without adding a bias. Used to
    /// push error signals down one layer during backpropagation.
    pub(crate) fn weights_t_dot(&self, rhs: &Array2<f64>) -> Array2<f64> {
        self.with_views(|_, w, _| w.t().dot(rhs))
    }

    /* Predictions */

    /// Hidden activities of `data` (the forward pass).
    pub fn predict(&self, data: &Array2<f64>) -> Array2<f64> {
        self.forward_activities(data)
    }

    /// Visible activities of `hidden` (the backward pass).
    pub fn reverse_predict(&self, hidden: &Array2<f64>) -> Array2<f64> {
        self.backward_activities(hidden)
    }

    /// Forward then backward pass: the machine's reconstruction of `data`.
    pub fn reconstruct(&self, data: &Array2<f64>) -> Array2<f64> {
        self.reverse_predict(&self.predict(data))
    }

    /// Stochastic hidden activities: forward activations converted with one
    /// noise draw per unit.
    pub fn sample(&self, data: &Array2<f64>, sampler: &mut Sampler) -> Array2<f64> {
        let mut act = self.forward_activations(data);
        let noise = sampler.noise(self.output.kind(), act.dim());
        self.output.kind().apply_sampled_activity(&mut act, &noise);
        act
    }

    /* Reconstruction error and energy */

    /// Squared reconstruction error per data column, against precomputed
    /// reconstructions.
    pub fn error_with(&self, data: &Array2<f64>, reconstructions: &Array2<f64>) -> Array1<f64> {
        (reconstructions - data).mapv(|v| v * v).sum_axis(Axis(0))
    }

    /// Squared reconstruction error per data column.
    pub fn error(&self, data: &Array2<f64>) -> Array1<f64> {
        self.error_with(data, &self.reconstruct(data))
    }

    /// Total squared reconstruction error.
    pub fn error_sum(&self, data: &Array2<f64>) -> f64 {
        self.error(data).sum()
    }

    /// Free energy per data column:
    /// `−Σ(v + b) − Σ(h + c) − Σ((W·v) ⊙ h)` with `h` the mean-field hidden
    /// activities.
    pub fn energy(&self, data: &Array2<f64>) -> Array1<f64> {
        let hidden = self.predict(data);
        self.with_views(|b, w, c| {
            let visible_term = (data + &b.insert_axis(Axis(1))).sum_axis(Axis(0));
            let hidden_term = (&hidden + &c.insert_axis(Axis(1))).sum_axis(Axis(0));
            let coupling = (w.dot(data) * &hidden).sum_axis(Axis(0));
            -(visible_term + hidden_term + coupling)
        })
    }

    /// Total free energy over all data columns.
    pub fn energy_sum(&self, data: &Array2<f64>) -> f64 {
        self.energy(data).sum()
    }

    /* Restructuring */

    /// Deep copy: identical parameters in independent storage.
    pub fn deep_clone(&self) -> Rbm {
        Rbm {
            data: self.data.deep_clone(),
            ..self.clone()
        }
    }

    /// Reversed machine: layers swapped, `W` transposed, biases exchanged.
    pub fn reverse(&self) -> DbnResult<Rbm> {
        let mut reversed = Rbm::new(self.output, self.input);
        reversed.set_w(&self.get_w().t().to_owned())?;
        reversed.set_b(&self.get_c())?;
        reversed.set_c(&self.get_b())?;
        reversed.pretrained = self.pretrained;
        Ok(reversed)
    }

    /* Contrastive-divergence pretraining */

    /// Train this machine with one-step contrastive divergence.
    ///
    /// Each iteration draws a minibatch of data columns, samples hidden
    /// activities (positive phase), reconstructs the visible layer, and
    /// recomputes hidden activities from the reconstruction (negative
    /// phase). The phase statistics give raw deltas which are averaged over
    /// the batch, penalized per [`Penalty`], and applied through a `tanh`
    /// bound that caps per-step movement. `train_b`/`train_c` gate the bias
    /// updates; the weights always move.
    ///
    /// One scalar step error (root-mean-square of the penalized deltas over
    /// the parameter count) is recorded per iteration; the continuation
    /// policy sees the history every `frequency` iterations once `min_iters`
    /// have elapsed, and its patience semantics decide early termination.
    /// The progress reporter is called every iteration and once before the
    /// first batch; the interrupt handle is checked once per iteration.
    ///
    /// The momentum schedule is expanded and validated before any batch is
    /// drawn, but the update rule does not currently consume it.
    pub fn pretrain(
        &mut self,
        data: &Array2<f64>,
        params: &PretrainParameters,
        progress: &mut dyn PretrainProgress,
        keep_going: &ContinuePolicy,
    ) -> DbnResult<()> {
        let _momentums = params.valid_momentums()?;

        let sample_size = data.ncols();
        let batch_size = if params.batch_size == 0 {
            (sample_size / params.max_iters.max(1)).max(1)
        } else {
            params.batch_size
        };
        let batch_size_f = batch_size as f64;
        let (m, n) = (self.input.size(), self.output.size());

        info!(
            "pre-training {}-{} x {}-{} machine with {} x {} out of {}",
            m,
            self.input.kind(),
            n,
            self.output.kind(),
            params.max_iters,
            batch_size,
            sample_size
        );
        debug!(
            "learning rate (b, W, c) = {}, {}, {}; penalization (b, W, c) = {} * ({}, {}, {}); updating (b, c) = ({}, {})",
            params.epsilon_b,
            params.epsilon_w,
            params.epsilon_c,
            params.penalty,
            params.lambda_b,
            params.lambda_w,
            params.lambda_c,
            params.train_b,
            params.train_c
        );

        let mut sampler = Sampler::from_seed_opt(params.seed);
        let mut batch = Array2::zeros((m, batch_size));
        let mut noise = Array2::zeros((n, batch_size));
        let mut errors: Vec<f64> = Vec::with_capacity(params.max_iters);
        let mut stop_counter = 0usize;

        progress.step(self, &batch, 0);

        for iter in 1..=params.max_iters {
            params.interrupt.check()?;

            sampler.sample_batch(data, &mut batch);

            // Positive phase: sampled hidden activities given the data.
            let mut alpha = self.forward_activations(&batch);
            sampler.fill_noise(self.output.kind(), &mut noise);
            self.output.kind().apply_sampled_activity(&mut alpha, &noise);

            // Reconstruction, then negative-phase hidden probabilities.
            let beta = self.backward_activities(&alpha);
            let alpha2 = self.forward_activities(&beta);

            // Raw phase-statistics deltas.
            let mut delta_b = (&batch - &beta).sum_axis(Axis(1));
            let mut delta_c = (&alpha - &alpha2).sum_axis(Axis(1));
            let mut delta_w = alpha.dot(&batch.t()) - alpha2.dot(&beta.t());

            // Batch average and penalty.
            self.with_views(|b, w, c| match params.penalty {
                Penalty::L1 => {
                    for (d, &p) in delta_b.iter_mut().zip(b.iter()) {
                        *d = *d / batch_size_f
                            - if p > 0.0 { params.lambda_b } else { -params.lambda_b };
                    }
                    for (d, &p) in delta_c.iter_mut().zip(c.iter()) {
                        *d = *d / batch_size_f
                            - if p > 0.0 { params.lambda_c } else { -params.lambda_c };
                    }
                    for (d, &p) in delta_w.iter_mut().zip(w.iter()) {
                        *d = *d / batch_size_f
                            - if p > 0.0 { params.lambda_w } else { -params.lambda_w };
                    }
                }
                Penalty::L2 => {
                    for (d, &p) in delta_b.iter_mut().zip(b.iter()) {
                        *d = *d / batch_size_f - params.lambda_b * p;
                    }
                    for (d, &p) in delta_c.iter_mut().zip(c.iter()) {
                        *d = *d / batch_size_f - params.lambda_c * p;
                    }
                    for (d, &p) in delta_w.iter_mut().zip(w.iter()) {
                        *d = *d / batch_size_f - params.lambda_w * p;
                    }
                }
            });

            let squared_sum = delta_b.mapv(|v| v * v).sum()
                + delta_c.mapv(|v| v * v).sum()
                + delta_w.mapv(|v| v * v).sum();
            errors.push((squared_sum / self.total_size() as f64).sqrt());

            // tanh-bounded increments cap each parameter's per-step movement.
            self.with_views_mut(|mut b, mut w, mut c| {
                if params.train_b {
                    for (p, &d) in b.iter_mut().zip(delta_b.iter()) {
                        *p += (params.epsilon_b * d).tanh();
                    }
                }
                if params.train_c {
                    for (p, &d) in c.iter_mut().zip(delta_c.iter()) {
                        *p += (params.epsilon_c * d).tanh();
                    }
                }
                for (p, &d) in w.iter_mut().zip(delta_w.iter()) {
                    *p += (params.epsilon_w * d).tanh();
                }
            });

            progress.step(self, &batch, iter);

            if iter >= params.min_iters
                && keep_going.frequency > 0
                && iter % keep_going.frequency == 0
            {
                if keep_going.should_continue(&errors, iter, batch_size, params.max_iters) {
                    stop_counter = 0;
                } else {
                    stop_counter += 1;
                }
                if stop_counter >= keep_going.limit {
                    debug!("stopping pre-training at iteration {}", iter);
                    break;
                }
            }
        }

        self.pretrained = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoOpPretrainProgress;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn small_rbm() -> Rbm {
        Rbm::new(
            Layer::new(3, UnitKind::Binary),
            Layer::new(2, UnitKind::Binary),
        )
    }

    #[test]
    fn test_offsets_layout() {
        let rbm = small_rbm();
        assert_eq!(rbm.offsets(), (0, 3, 3 + 6, 3 + 6 + 2));
        assert_eq!(rbm.total_size(), 11);
        assert_eq!(rbm.n_weights(), 6);
        assert_eq!(rbm.relative_offset_c(), 9);
    }

    #[test]
    fn test_set_get_round_trip() {
        let mut rbm = small_rbm();
        let b = array![1.0, 2.0, 3.0];
        let c = array![-1.0, -2.0];
        let w = array![[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]];
        rbm.set_b(&b).unwrap();
        rbm.set_c(&c).unwrap();
        rbm.set_w(&w).unwrap();
        assert_eq!(rbm.get_b(), b);
        assert_eq!(rbm.get_c(), c);
        assert_eq!(rbm.get_w(), w);
    }

    #[test]
    fn test_set_shape_mismatch() {
        let mut rbm = small_rbm();
        assert!(rbm.set_b(&array![1.0]).is_err());
        assert!(rbm.set_c(&array![1.0, 2.0, 3.0]).is_err());
        assert!(rbm.set_w(&array![[1.0, 2.0], [3.0, 4.0]]).is_err());
    }

    #[test]
    fn test_forward_activations_broadcast_bias() {
        let mut rbm = Rbm::new(
            Layer::new(2, UnitKind::Gaussian),
            Layer::new(2, UnitKind::Gaussian),
        );
        rbm.set_w(&array![[1.0, 0.0], [0.0, 1.0]]).unwrap();
        rbm.set_c(&array![10.0, 20.0]).unwrap();

        let data = array![[1.0, 2.0], [3.0, 4.0]];
        let act = rbm.forward_activations(&data);
        assert_eq!(act, array![[11.0, 12.0], [23.0, 24.0]]);

        // Gaussian hidden units: activity == activation.
        assert_eq!(rbm.predict(&data), act);
    }

    #[test]
    fn test_backward_is_transpose_with_visible_bias() {
        let mut rbm = Rbm::new(
            Layer::new(2, UnitKind::Gaussian),
            Layer::new(1, UnitKind::Gaussian),
        );
        rbm.set_w(&array![[2.0, 3.0]]).unwrap();
        rbm.set_b(&array![1.0, -1.0]).unwrap();

        let hidden = array![[1.0, 2.0]];
        let visible = rbm.reverse_predict(&hidden);
        assert_eq!(visible, array![[3.0, 5.0], [2.0, 5.0]]);
    }

    #[test]
    fn test_reconstruct_identity_when_error_is_zero() {
        // erroring against its own reconstructions is zero by definition
        let rbm = small_rbm();
        let data = array![[0.0, 1.0], [1.0, 0.0], [0.5, 0.5]];
        let rec = rbm.reconstruct(&data);
        let err = rbm.error_with(&rec, &rec);
        for &e in err.iter() {
            assert_eq!(e, 0.0);
        }
    }

    #[test]
    fn test_error_matches_manual_sum() {
        let rbm = small_rbm();
        let data = array![[1.0], [0.0], [1.0]];
        let rec = array![[0.5], [0.5], [0.5]];
        let err = rbm.error_with(&data, &rec);
        assert_abs_diff_eq!(err[0], 0.25 + 0.25 + 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(
            rbm.error_with(&data, &rec).sum(),
            0.75,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_energy_shape_and_finiteness() {
        let mut rbm = small_rbm();
        rbm.set_w(&array![[0.5, -0.5, 0.1], [0.2, 0.3, -0.1]]).unwrap();
        let data = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let energy = rbm.energy(&data);
        assert_eq!(energy.len(), data.ncols());
        assert!(energy.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_deep_clone_breaks_aliasing() {
        let mut rbm = small_rbm();
        rbm.set_b(&array![1.0, 2.0, 3.0]).unwrap();

        let mut cloned = rbm.deep_clone();
        assert_eq!(cloned.get_b(), rbm.get_b());

        cloned.set_b(&array![9.0, 9.0, 9.0]).unwrap();
        assert_eq!(rbm.get_b(), array![1.0, 2.0, 3.0]);

        // A plain copy, by contrast, shares parameter mutations.
        let mut shared = rbm.clone();
        shared.set_b(&array![7.0, 7.0, 7.0]).unwrap();
        assert_eq!(rbm.get_b(), array![7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_reverse_swaps_roles() {
        let mut rbm = small_rbm();
        rbm.set_b(&array![1.0, 2.0, 3.0]).unwrap();
        rbm.set_c(&array![-1.0, -2.0]).unwrap();
        rbm.set_w(&array![[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]).unwrap();

        let reversed = rbm.reverse().unwrap();
        assert_eq!(reversed.n_input(), 2);
        assert_eq!(reversed.n_output(), 3);
        assert_eq!(reversed.get_b(), rbm.get_c());
        assert_eq!(reversed.get_c(), rbm.get_b());
        assert_eq!(reversed.get_w(), rbm.get_w().t().to_owned());
    }

    #[test]
    fn test_pretrain_rejects_bad_momentums_before_training() {
        let mut rbm = small_rbm();
        let data = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let params = PretrainParameters {
            momentums: vec![0.1, 0.2, 0.3],
            max_iters: 10,
            ..PretrainParameters::default()
        };
        let before = rbm.data().to_vec();
        let result = rbm.pretrain(
            &data,
            &params,
            &mut NoOpPretrainProgress,
            &ContinuePolicy::default(),
        );
        assert!(matches!(result, Err(DbnError::InvalidArgument(_))));
        assert_eq!(rbm.data().to_vec(), before);
        assert!(!rbm.is_pretrained());
    }

    #[test]
    fn test_pretrain_sets_flag_and_moves_parameters() {
        let mut rbm = small_rbm();
        let data = array![
            [1.0, 1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0]
        ];
        let params = PretrainParameters {
            max_iters: 20,
            min_iters: 20,
            batch_size: 4,
            seed: Some(11),
            ..PretrainParameters::default().with_epsilon(0.1)
        };
        let before = rbm.data().to_vec();
        rbm.pretrain(
            &data,
            &params,
            &mut NoOpPretrainProgress,
            &ContinuePolicy::default(),
        )
        .unwrap();
        assert!(rbm.is_pretrained());
        assert_ne!(rbm.data().to_vec(), before);
    }

    #[test]
    fn test_pretrain_respects_bias_gating() {
        let mut rbm = small_rbm();
        let data = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let params = PretrainParameters {
            max_iters: 5,
            min_iters: 5,
            batch_size: 2,
            train_b: false,
            train_c: false,
            seed: Some(3),
            ..PretrainParameters::default().with_epsilon(0.1)
        };
        rbm.pretrain(
            &data,
            &params,
            &mut NoOpPretrainProgress,
            &ContinuePolicy::default(),
        )
        .unwrap();
        assert_eq!(rbm.get_b(), Array1::<f64>::zeros(3));
        assert_eq!(rbm.get_c(), Array1::<f64>::zeros(2));
        assert!(rbm.get_w().iter().any(|&v| v != 0.0));
    }
}
