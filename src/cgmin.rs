//! Nonlinear conjugate-gradient function minimizer.
//!
//! A self-contained minimizer over a flat `f64` parameter vector with three
//! selectable direction updates (Fletcher-Reeves, Polak-Ribiere,
//! Beale-Sorenson), a backtracking line search, and a restart cycle bounded
//! by the problem dimension. Derived from the classic compact
//! conjugate-gradients routine of Nash's *Compact Numerical Methods for
//! Computers*.
//!
//! The caller supplies the objective and gradient as closures over the
//! parameter slice; the starting point is updated in place and holds the
//! best point found on return.

use log::debug;

use crate::error::{DbnError, DbnResult};
use crate::params::{CgMinParams, CgUpdate};

/// Result of one [`cgmin`] call.
#[derive(Debug, Clone, Copy)]
pub struct CgOutcome {
    /// Best objective value found.
    pub fmin: f64,
    /// False when the gradient-evaluation cap stopped the search before the
    /// convergence test was met. Not an error: the point reached is still
    /// the best one seen.
    pub converged: bool,
    /// Objective evaluations used.
    pub fn_evals: usize,
    /// Gradient evaluations used.
    pub gr_evals: usize,
}

/// Minimize `objective` starting from (and writing back into) `bvec`.
///
/// `scratch` must have the same length as `bvec`; it carries the line-search
/// base point between steps so repeated calls can reuse one allocation.
/// `gradient` fills its second argument with the gradient at the point given
/// by its first.
///
/// The search accepts a step when the objective drops at least
/// `acctol · step · gradient-projection` below the incumbent and the stepped
/// point is numerically distinguishable from the base point under the
/// `reltest` guard; a rejected step shrinks by `stepredn`. When an accepted
/// step under-performs the quadratic model's predicted minimum, one
/// interpolation step refines it. Termination: squared gradient norm at most
/// `intol · n · sqrt(intol)`, objective at most `abstol`, or the
/// gradient-evaluation cap (reported via [`CgOutcome::converged`]).
///
/// A non-finite objective at the starting point is a fatal
/// [`DbnError::NumericFailure`].
#[allow(clippy::float_cmp)] // the reltest-shifted equality is the step-resolution guard
pub fn cgmin<F, G>(
    bvec: &mut [f64],
    scratch: &mut [f64],
    params: &CgMinParams,
    mut objective: F,
    mut gradient: G,
) -> DbnResult<CgOutcome>
where
    F: FnMut(&[f64]) -> f64,
    G: FnMut(&[f64], &mut [f64]) -> DbnResult<()>,
{
    let n = bvec.len();
    if scratch.len() != n {
        return Err(DbnError::InvalidArgument(format!(
            "scratch vector has {} entries, expected {}",
            scratch.len(),
            n
        )));
    }

    let stepredn = params.stepredn;
    let acctol = params.acctol;
    let reltest = params.reltest;
    let abstol = params.abstol;
    let setstep = params.setstep;
    let maxit = params.max_cg_iters;

    if maxit == 0 {
        let fmin = objective(bvec);
        return Ok(CgOutcome {
            fmin,
            converged: true,
            fn_evals: 0,
            gr_evals: 0,
        });
    }

    debug!(
        "conjugate gradients: {} update, {} parameters",
        params.update, n
    );

    let mut g = vec![0.0; n];
    let mut c = vec![0.0; n];
    let mut t = vec![0.0; n];
    let cyclimit = n;
    let tol = params.intol * n as f64 * params.intol.sqrt();

    let mut f = objective(bvec);
    if !f.is_finite() {
        return Err(DbnError::NumericFailure(
            "objective cannot be evaluated at the initial parameters".to_string(),
        ));
    }
    let mut fmin = f;
    let mut fn_evals = 1usize;
    let mut gr_evals = 0usize;

    let mut steplength = params.steplength;
    let mut g1;
    let mut count;
    let mut cycle;

    loop {
        t.fill(0.0);
        c.fill(0.0);
        cycle = 0;
        let mut oldstep = 1.0;
        count = 0;

        loop {
            cycle += 1;
            gr_evals += 1;
            if gr_evals > maxit {
                debug!("gradient-evaluation cap reached after {} cycles", cycle);
                return Ok(CgOutcome {
                    fmin,
                    converged: false,
                    fn_evals,
                    gr_evals,
                });
            }

            gradient(bvec, &mut g)?;

            g1 = 0.0;
            let mut g2 = 0.0;
            for i in 0..n {
                scratch[i] = bvec[i];
                match params.update {
                    CgUpdate::FletcherReeves => {
                        g1 += g[i] * g[i];
                        g2 += c[i] * c[i];
                    }
                    CgUpdate::PolakRibiere => {
                        g1 += g[i] * (g[i] - c[i]);
                        g2 += c[i] * c[i];
                    }
                    CgUpdate::BealeSorenson => {
                        g1 += g[i] * (g[i] - c[i]);
                        g2 += t[i] * (g[i] - c[i]);
                    }
                }
                c[i] = g[i];
            }

            if g1 > tol {
                let g3 = if g2 > 0.0 { g1 / g2 } else { 1.0 };
                let mut gradproj = 0.0;
                for i in 0..n {
                    t[i] = t[i] * g3 - g[i];
                    gradproj += t[i] * g[i];
                }
                steplength = oldstep;

                let mut accpoint = false;
                loop {
                    count = 0;
                    for i in 0..n {
                        bvec[i] = scratch[i] + steplength * t[i];
                        if reltest + scratch[i] == reltest + bvec[i] {
                            count += 1;
                        }
                    }
                    if count < n {
                        f = objective(bvec);
                        fn_evals += 1;
                        accpoint =
                            f.is_finite() && f <= fmin + gradproj * steplength * acctol;
                        if !accpoint {
                            steplength *= stepredn;
                        } else {
                            fmin = f;
                        }
                    }
                    if count == n || accpoint {
                        break;
                    }
                }

                if count < n {
                    // Refine with the quadratic model's predicted minimum.
                    let denom = 2.0 * (f - fmin - gradproj * steplength);
                    if denom > 0.0 {
                        let newstep = -(gradproj * steplength * steplength / denom);
                        for i in 0..n {
                            bvec[i] = scratch[i] + newstep * t[i];
                        }
                        fmin = f;
                        f = objective(bvec);
                        fn_evals += 1;
                        if f < fmin {
                            fmin = f;
                        } else {
                            // The interpolated point lost; go back to the
                            // accepted line-search point.
                            for i in 0..n {
                                bvec[i] = scratch[i] + steplength * t[i];
                            }
                        }
                    }
                }
            }

            oldstep = setstep * steplength;
            if oldstep > 1.0 {
                oldstep = 1.0;
            }

            if !(count != n && g1 > tol && cycle != cyclimit) {
                break;
            }
        }

        if !(cycle != 1 || (count != n && g1 > tol && fmin > abstol)) {
            break;
        }
    }

    debug!(
        "conjugate gradients done: {} objective and {} gradient evaluations",
        fn_evals, gr_evals
    );

    Ok(CgOutcome {
        fmin,
        converged: true,
        fn_evals,
        gr_evals,
    })
}
