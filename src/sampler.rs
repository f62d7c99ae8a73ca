//! Random minibatch and noise sampling.
//!
//! A [`Sampler`] owns the RNG state for one training run. It provides the two
//! draws the training loops need: uniform-with-replacement column sampling
//! for minibatches, and iid noise fills matching a layer's unit-type noise
//! model (standard normal for gaussian units, uniform `[0, 1)` otherwise).

use ndarray::Array2;
use ndarray_rand::RandomExt;
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::layer::UnitKind;

/// RNG wrapper for batch and noise sampling.
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    /// Sampler seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sampler for reproducible runs and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded sampler if a seed is configured, entropy-seeded otherwise.
    pub fn from_seed_opt(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        }
    }

    /// Fill `batch` with columns of `data` drawn uniformly with replacement.
    ///
    /// Row counts must agree; panics (through `ndarray`) otherwise, and on an
    /// empty data set.
    pub fn sample_batch(&mut self, data: &Array2<f64>, batch: &mut Array2<f64>) {
        let columns = Uniform::from(0..data.ncols());
        for mut out in batch.columns_mut() {
            let pick = self.rng.sample(columns);
            out.assign(&data.column(pick));
        }
    }

    /// Overwrite `out` with iid draws from the unit type's noise model.
    pub fn fill_noise(&mut self, kind: UnitKind, out: &mut Array2<f64>) {
        match kind {
            UnitKind::Gaussian => {
                for v in out.iter_mut() {
                    *v = self.rng.sample(StandardNormal);
                }
            }
            UnitKind::Binary | UnitKind::Continuous => {
                let unit = Uniform::new(0.0, 1.0);
                for v in out.iter_mut() {
                    *v = self.rng.sample(unit);
                }
            }
        }
    }

    /// Freshly allocated noise array for the given unit type and shape.
    pub fn noise(&mut self, kind: UnitKind, shape: (usize, usize)) -> Array2<f64> {
        match kind {
            UnitKind::Gaussian => Array2::random_using(shape, StandardNormal, &mut self.rng),
            UnitKind::Binary | UnitKind::Continuous => {
                Array2::random_using(shape, Uniform::new(0.0, 1.0), &mut self.rng)
            }
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler").finish()
    }
}
