//! Deep belief networks: ordered RBM stacks over one shared arena.
//!
//! A [`DeepBeliefNet`] owns a single [`WeightArena`] sized for all of its
//! layer pairs and builds its machines as overlapping views into it, so that
//! machine `i`'s hidden bias occupies the same window as machine `i+1`'s
//! visible bias. Copying a network by value shares the arena; use
//! [`DeepBeliefNet::deep_clone`] for an independent copy.
//!
//! The training protocol is phased: layer-wise contrastive-divergence
//! [`pretrain`](DeepBeliefNet::pretrain), [`unroll`](DeepBeliefNet::unroll)
//! into a mirrored autoencoder, then conjugate-gradient fine-tuning (see the
//! gradient/training methods on this type). The three phase flags record
//! where a network is in that protocol.

use log::info;
use ndarray::{Array1, Array2, Axis};

use crate::arena::WeightArena;
use crate::error::{DbnError, DbnResult};
use crate::layer::Layer;
use crate::params::PretrainParameters;
use crate::progress::{ContinuePolicy, PretrainProgress};
use crate::rbm::Rbm;
use crate::sampler::Sampler;

/// Stack of restricted Boltzmann machines sharing one parameter arena.
#[derive(Debug, Clone)]
pub struct DeepBeliefNet {
    pub(crate) layers: Vec<Layer>,
    pub(crate) data: WeightArena,
    pub(crate) rbms: Vec<Rbm>,
    pub(crate) pretrained: bool,
    pub(crate) unrolled: bool,
    pub(crate) finetuned: bool,
}

impl DeepBeliefNet {
    /// Arena length needed to hold all parameters of a layer sequence:
    /// the first layer's bias plus, per pair, the weight matrix and the
    /// following layer's bias (shared boundary biases counted once).
    pub fn compute_data_size(layers: &[Layer]) -> usize {
        let mut size = layers.first().map_or(0, Layer::size);
        for pair in layers.windows(2) {
            size += pair[0].size() * pair[1].size() + pair[1].size();
        }
        size
    }

    /// Build the machine views for `layers` over `data`, each starting where
    /// the previous machine's hidden bias begins.
    pub fn construct_rbms(layers: &[Layer], data: &WeightArena) -> DbnResult<Vec<Rbm>> {
        let n_rbms = layers.len().saturating_sub(1);
        let mut rbms = Vec::with_capacity(n_rbms);
        let mut next_offset = 0;
        for pair in layers.windows(2) {
            let slice = data.slice_from(next_offset)?;
            let rbm = Rbm::with_arena(pair[0], pair[1], &slice, false)?;
            next_offset += rbm.relative_offset_c();
            rbms.push(rbm);
        }
        Ok(rbms)
    }

    /// Fresh network with zero-initialized parameters.
    ///
    /// Fails with `InvalidArgument` for fewer than two layers.
    pub fn new(layers: Vec<Layer>) -> DbnResult<Self> {
        if layers.len() < 2 {
            return Err(DbnError::InvalidArgument(
                "a network needs at least two layers".to_string(),
            ));
        }
        let data = WeightArena::allocate(Self::compute_data_size(&layers));
        Self::from_parts(layers, data, false, false, false)
    }

    /// Network over existing parameter storage with explicit phase flags.
    ///
    /// The arena view must exactly cover the layer sequence's parameters.
    pub fn from_parts(
        layers: Vec<Layer>,
        data: WeightArena,
        pretrained: bool,
        unrolled: bool,
        finetuned: bool,
    ) -> DbnResult<Self> {
        if layers.len() < 2 {
            return Err(DbnError::InvalidArgument(
                "a network needs at least two layers".to_string(),
            ));
        }
        let expected = Self::compute_data_size(&layers);
        if data.len() != expected {
            return Err(DbnError::InvalidArgument(format!(
                "arena holds {} parameters, layer sequence needs {}",
                data.len(),
                expected
            )));
        }
        let rbms = Self::construct_rbms(&layers, &data)?;
        Ok(Self {
            layers,
            data,
            rbms,
            pretrained,
            unrolled,
            finetuned,
        })
    }

    /* Accessors */

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn n_rbms(&self) -> usize {
        self.rbms.len()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn rbms(&self) -> &[Rbm] {
        &self.rbms
    }

    pub fn rbm(&self, index: usize) -> &Rbm {
        &self.rbms[index]
    }

    /// Mutable access to one machine, e.g. to seed its weights directly.
    pub fn rbm_mut(&mut self, index: usize) -> &mut Rbm {
        &mut self.rbms[index]
    }

    pub fn data(&self) -> &WeightArena {
        &self.data
    }

    pub fn is_pretrained(&self) -> bool {
        self.pretrained
    }

    pub fn is_unrolled(&self) -> bool {
        self.unrolled
    }

    pub fn is_finetuned(&self) -> bool {
        self.finetuned
    }

    /* Parameter storage management */

    /// Deep copy: identical parameters in independent storage, with all
    /// machine views rebuilt against the new arena.
    pub fn deep_clone(&self) -> DbnResult<Self> {
        let mut cloned = Self::from_parts(
            self.layers.clone(),
            self.data.deep_clone(),
            self.pretrained,
            self.unrolled,
            self.finetuned,
        )?;
        for (new_rbm, old_rbm) in cloned.rbms.iter_mut().zip(&self.rbms) {
            new_rbm.set_pretrained(old_rbm.is_pretrained());
        }
        Ok(cloned)
    }

    /// Rebind the network to a different arena of the same layout.
    pub fn apply_data(&mut self, new_data: WeightArena) -> DbnResult<()> {
        let expected = Self::compute_data_size(&self.layers);
        if new_data.len() != expected {
            return Err(DbnError::InvalidArgument(format!(
                "arena holds {} parameters, layer sequence needs {}",
                new_data.len(),
                expected
            )));
        }
        self.rbms = Self::construct_rbms(&self.layers, &new_data)?;
        self.data = new_data;
        Ok(())
    }

    /// Rebind only if `new_data` is not already this network's storage.
    pub fn apply_data_if_needed(&mut self, new_data: WeightArena) -> DbnResult<()> {
        if !self.data.ptr_eq(&new_data) {
            self.apply_data(new_data)?;
        }
        Ok(())
    }

    /* Restructuring */

    /// Unroll the stack into a symmetric autoencoder.
    ///
    /// The layer sequence is mirrored (`L0..Ln, Ln-1..L0`), a fresh arena is
    /// allocated for the doubled topology, and the decoder half is the
    /// transpose of the encoder: decoder weights are `Wᵗ`, decoder hidden
    /// biases are the encoder's visible biases. Inherits the pretrained
    /// flag; the result is unrolled and not finetuned.
    pub fn unroll(&self) -> DbnResult<Self> {
        let mut new_layers = self.layers.clone();
        new_layers.extend(self.layers.iter().rev().skip(1).copied());

        let data = WeightArena::allocate(Self::compute_data_size(&new_layers));
        let mut unrolled = Self::from_parts(new_layers, data, self.pretrained, true, false)?;

        unrolled.rbms[0].set_b(&self.rbms[0].get_b())?;

        let last = unrolled.rbms.len() - 1;
        for (i, old_rbm) in self.rbms.iter().enumerate() {
            let w = old_rbm.get_w();
            unrolled.rbms[i].set_w(&w)?;
            unrolled.rbms[i].set_c(&old_rbm.get_c())?;
            unrolled.rbms[last - i].set_w(&w.t().to_owned())?;
            unrolled.rbms[last - i].set_c(&old_rbm.get_b())?;
        }

        Ok(unrolled)
    }

    /// Reversed deep clone: layer order flipped, every machine's weights
    /// transposed and biases exchanged, so the result predicts backwards
    /// through the original stack.
    pub fn reverse(&self) -> DbnResult<Self> {
        let mut reversed = self.deep_clone()?;
        reversed.layers.reverse();
        reversed.rbms = Self::construct_rbms(&reversed.layers, &reversed.data)?;

        let n = self.rbms.len();
        for i in 0..n {
            let source = &self.rbms[n - 1 - i];
            reversed.rbms[i].set_b(&source.get_c())?;
            reversed.rbms[i].set_c(&source.get_b())?;
            reversed.rbms[i].set_w(&source.get_w().t().to_owned())?;
        }
        Ok(reversed)
    }

    /* Predictions */

    /// Forward pass. On an unrolled network only the encoder half runs, so
    /// the result is the code layer; otherwise all machines run.
    pub fn predict(&self, data: &Array2<f64>) -> Array2<f64> {
        let last = if self.unrolled {
            self.rbms.len() / 2
        } else {
            self.rbms.len()
        };
        let mut current = data.clone();
        for rbm in &self.rbms[..last] {
            current = rbm.predict(&current);
        }
        current
    }

    /// Backward pass. On an unrolled network the decoder half runs forward;
    /// otherwise all machines run backward in reverse order.
    pub fn reverse_predict(&self, hidden: &Array2<f64>) -> Array2<f64> {
        let mut current = hidden.clone();
        if self.unrolled {
            let first = self.rbms.len() / 2;
            for rbm in &self.rbms[first..] {
                current = rbm.predict(&current);
            }
        } else {
            for rbm in self.rbms.iter().rev() {
                current = rbm.reverse_predict(&current);
            }
        }
        current
    }

    /// Reconstruction: `reverse_predict(predict(data))`. On an unrolled
    /// network this runs the full encoder-decoder pipeline.
    pub fn reconstruct(&self, data: &Array2<f64>) -> Array2<f64> {
        self.reverse_predict(&self.predict(data))
    }

    /// Stochastic forward pass through every machine, sampling activities at
    /// each layer.
    pub fn sample(&self, data: &Array2<f64>, sampler: &mut Sampler) -> Array2<f64> {
        let mut current = data.clone();
        for rbm in &self.rbms {
            current = rbm.sample(&current, sampler);
        }
        current
    }

    /* Reconstruction error and energy */

    /// Root-mean-square reconstruction error per data column, against
    /// precomputed reconstructions.
    pub fn error_with(&self, data: &Array2<f64>, reconstructions: &Array2<f64>) -> Array1<f64> {
        let rows = data.nrows() as f64;
        ((reconstructions - data).mapv(|v| v * v).sum_axis(Axis(0)) / rows).mapv(f64::sqrt)
    }

    /// Root-mean-square reconstruction error per data column.
    pub fn error(&self, data: &Array2<f64>) -> Array1<f64> {
        self.error_with(data, &self.reconstruct(data))
    }

    pub fn error_sum(&self, data: &Array2<f64>) -> f64 {
        self.error(data).sum()
    }

    pub fn error_sum_with(&self, data: &Array2<f64>, reconstructions: &Array2<f64>) -> f64 {
        self.error_with(data, reconstructions).sum()
    }

    /// Free energy per data column, summed over the stack with the data
    /// propagated one layer at a time.
    pub fn energy(&self, data: &Array2<f64>) -> Array1<f64> {
        let mut energy = self.rbms[0].energy(data);
        let mut current = data.clone();
        for layer in 1..self.rbms.len() {
            current = self.rbms[layer - 1].predict(&current);
            energy = energy + self.rbms[layer].energy(&current);
        }
        energy
    }

    pub fn energy_sum(&self, data: &Array2<f64>) -> f64 {
        self.energy(data).sum()
    }

    /* Layer-wise pretraining */

    /// Pretrain every machine in turn with contrastive divergence, feeding
    /// each layer the previous layer's activities.
    ///
    /// `params` supplies one parameter set per machine and is validated
    /// eagerly — including every momentum schedule — before any training
    /// starts. Machines whose 1-based index appears in `skip` are left
    /// untouched but the data still flows through them. The progress
    /// reporter is rewired per layer (`set_layer`, `propagate_data`); the
    /// continuation policy's layer index follows along.
    pub fn pretrain(
        &mut self,
        data: &Array2<f64>,
        params: &[PretrainParameters],
        progress: &mut dyn PretrainProgress,
        keep_going: &mut ContinuePolicy,
        skip: &[usize],
    ) -> DbnResult<()> {
        if params.len() != self.rbms.len() {
            return Err(DbnError::InvalidArgument(format!(
                "{} parameter sets for {} machines",
                params.len(),
                self.rbms.len()
            )));
        }
        for layer_params in params {
            layer_params.valid_momentums()?;
        }

        info!(
            "pre-training {} - {} network with {} layers",
            self.layers[0].size(),
            self.layers[self.layers.len() - 1].size(),
            self.n_layers()
        );
        if !skip.is_empty() {
            info!("ignoring layers {:?}", skip);
        }

        let mut flowing = data.clone();
        for i in 0..self.rbms.len() {
            if skip.contains(&(i + 1)) {
                info!(
                    "skipping {}-{} x {}-{} machine",
                    self.rbms[i].n_input(),
                    self.rbms[i].input().kind(),
                    self.rbms[i].n_output(),
                    self.rbms[i].output().kind()
                );
            } else {
                progress.set_batch_size(params[i].batch_size);
                progress.set_max_iters(params[i].max_iters);
                progress.set_layer(i + 1);
                keep_going.set_layer(i + 1);
                self.rbms[i].pretrain(&flowing, &params[i], progress, keep_going)?;
            }
            if i < self.rbms.len() - 1 {
                flowing = self.rbms[i].predict(&flowing);
                progress.propagate_data(&self.rbms[i]);
            }
        }

        self.pretrained = true;
        Ok(())
    }
}
