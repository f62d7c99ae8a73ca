//! Layer descriptors and unit-type math.
//!
//! A [`Layer`] is an immutable descriptor: a unit count plus a [`UnitKind`].
//! Two layers make up a restricted Boltzmann machine. The unit kind owns the
//! numerics that depend on it — turning pre-nonlinearity *activations* into
//! post-nonlinearity *activities*, drawing stochastic activities from a noise
//! array, and the activation derivative used by backpropagation.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;

use crate::error::{DbnError, DbnResult};

/// The three supported unit types.
///
/// - `Binary`: logistic units, activity is `σ(a) = 1/(1+e^{-a})`.
/// - `Gaussian`: linear units with unit-variance noise, activity equals the
///   activation.
/// - `Continuous`: truncated-exponential units on `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Binary,
    Gaussian,
    Continuous,
}

impl UnitKind {
    /// Convert activations to mean-field activities in place, according to
    /// the target unit type.
    ///
    /// The continuous branch has a removable singularity at `a = 0`; the
    /// mean of the truncated exponential tends to 0.5 there, so values with
    /// `|a| < 1e-5` short-circuit to 0.5.
    pub fn apply_activity(self, activations: &mut Array2<f64>) {
        match self {
            UnitKind::Binary => {
                activations.mapv_inplace(|a| 1.0 / ((-a).exp() + 1.0));
            }
            UnitKind::Gaussian => {}
            UnitKind::Continuous => {
                activations.mapv_inplace(|a| {
                    if a.abs() < 1e-5 {
                        0.5
                    } else {
                        (a.exp() * (1.0 - 1.0 / a) + 1.0 / a) / (a.exp() - 1.0)
                    }
                });
            }
        }
    }

    /// Convert activations to *sampled* activities in place, consuming one
    /// noise value per unit.
    ///
    /// The noise array must follow the unit type's noise model (see
    /// [`crate::sampler::Sampler::fill_noise`]): uniform `[0, 1)` draws for
    /// binary and continuous units, standard normal draws for gaussian
    /// units.
    ///
    /// - binary: compute `σ(a)`, then threshold — 1 if the draw falls below
    ///   the probability, 0 otherwise;
    /// - gaussian: add the noise to the activation;
    /// - continuous: inverse-CDF sampling `ln(u·(e^a − 1) + 1) / a`, with the
    ///   draw passed through unchanged where `|a| < 1e-6`.
    pub fn apply_sampled_activity(self, activations: &mut Array2<f64>, noise: &Array2<f64>) {
        match self {
            UnitKind::Binary => {
                activations.zip_mut_with(noise, |a, &u| {
                    let p = 1.0 / ((-*a).exp() + 1.0);
                    *a = if u < p { 1.0 } else { 0.0 };
                });
            }
            UnitKind::Gaussian => {
                activations.zip_mut_with(noise, |a, &u| *a += u);
            }
            UnitKind::Continuous => {
                activations.zip_mut_with(noise, |a, &u| {
                    if a.abs() < 1e-6 {
                        *a = u;
                    } else {
                        *a = 1.0 / *a * (u * (a.exp() - 1.0) + 1.0).ln();
                    }
                });
            }
        }
    }

    /// Derivative of the activity with respect to the activation, evaluated
    /// elementwise on an activation matrix.
    ///
    /// The continuous derivative is evaluated by its Taylor expansion
    /// `1/12 − a²/240` where `|a| < 1e-2`, since both closed-form terms lose
    /// all precision near zero.
    pub fn activation_derivative(self, activations: &Array2<f64>) -> Array2<f64> {
        match self {
            UnitKind::Binary => activations.mapv(|a| {
                let e = (-a).exp();
                e / ((e + 1.0) * (e + 1.0))
            }),
            UnitKind::Gaussian => Array2::ones(activations.raw_dim()),
            UnitKind::Continuous => activations.mapv(|a| {
                if a.abs() < 1e-2 {
                    1.0 / 12.0 - a * a / 240.0
                } else {
                    1.0 / (a * a) - 1.0 / (a.exp() + (-a).exp() - 2.0)
                }
            }),
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitKind::Binary => "binary",
            UnitKind::Gaussian => "gaussian",
            UnitKind::Continuous => "continuous",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for UnitKind {
    type Err = DbnError;

    fn from_str(s: &str) -> DbnResult<Self> {
        match s {
            "binary" => Ok(UnitKind::Binary),
            "gaussian" => Ok(UnitKind::Gaussian),
            "continuous" => Ok(UnitKind::Continuous),
            other => Err(DbnError::InvalidArgument(format!(
                "unknown unit type string: {}",
                other
            ))),
        }
    }
}

/// Immutable layer descriptor: unit count plus unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layer {
    size: usize,
    kind: UnitKind,
}

impl Layer {
    pub fn new(size: usize, kind: UnitKind) -> Self {
        Self { size, kind }
    }

    /// Parse the unit type from its string form.
    pub fn from_kind_str(size: usize, kind: &str) -> DbnResult<Self> {
        Ok(Self::new(size, kind.parse()?))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }
}
