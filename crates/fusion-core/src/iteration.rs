// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Profile Iteration Step
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One self-consistent profile update.
//!
//! Given kinetic profiles, pressure and the inductive current, pull the
//! current flux-surface geometry, add the bootstrap current, optionally
//! redistribute the core current, and convert the total toroidal current
//! into normalized P' and FF' shapes ready for the equilibrium solver.
//!
//! The step reads the solver but never mutates it; pushing the profiles
//! and solving is the driver's job.

use crate::bootstrap::{evaluate_closure, require_closure, BootstrapClosure};
use crate::dynamo::redistribute;
use crate::equilibrium::{pull_geometry, EquilibriumSolver};
use crate::flux::{ffprime_from_jtor_pprime, pprime_from_pressure, rescale_current, surface_integral};
use crate::smoothing::smooth_profile;
use fusion_types::config::{DriverConfig, RedistributionStrategy};
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::{IterationResult, KineticProfiles, Profile};
use ndarray::Array1;
use tracing::debug;

/// Per-call switches for [`profile_iteration_step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRequest {
    pub include_bootstrap: bool,
    /// Flattened-pedestal initialisation: the I_p rescale is skipped.
    pub lmode_init: bool,
    /// Reshape the inductive current by the passing fraction.
    pub rescale_by_ftr: bool,
    /// Driver iteration index, used by the dynamo bulk ramp.
    pub iteration: usize,
    /// Crossing location reused by the dynamo when none is found.
    pub last_crossing: f64,
}

impl StepRequest {
    /// A main-loop step with bootstrap current.
    pub fn hmode(iteration: usize, rescale_by_ftr: bool, last_crossing: f64) -> Self {
        StepRequest {
            include_bootstrap: true,
            lmode_init: false,
            rescale_by_ftr,
            iteration,
            last_crossing,
        }
    }

    /// The initialisation step on flattened kinetic profiles.
    pub fn lmode(rescale_by_ftr: bool, last_crossing: f64) -> Self {
        StepRequest {
            include_bootstrap: false,
            lmode_init: true,
            rescale_by_ftr,
            iteration: 0,
            last_crossing,
        }
    }
}

/// Compute the next P' and FF' source shapes.
///
/// Both returned profiles are divided by their on-axis value, have their
/// edge sample set to 0 and any non-finite sample replaced by 0.
pub fn profile_iteration_step<S: EquilibriumSolver + ?Sized>(
    solver: &S,
    closure: Option<&dyn BootstrapClosure>,
    config: &DriverConfig,
    kinetic: &KineticProfiles,
    pressure: &Array1<f64>,
    j_inductive: &Array1<f64>,
    request: &StepRequest,
) -> FusionResult<IterationResult> {
    let n = j_inductive.len();
    if n < 2 {
        return Err(FusionError::Precondition(format!(
            "inductive current needs at least 2 samples, got {n}"
        )));
    }
    if pressure.len() != n {
        return Err(FusionError::Precondition(format!(
            "pressure has {} samples, inductive current has {n}",
            pressure.len()
        )));
    }
    let psi_norm = Array1::linspace(0.0, 1.0, n);

    let (psi_axis, psi_edge) = solver.psi_bounds();
    let pprime = pprime_from_pressure(&psi_norm, pressure, 1.0 / (psi_edge - psi_axis))?;
    let geometry = pull_geometry(solver, n)?;

    let mut j_ind = j_inductive.clone();
    if request.rescale_by_ftr {
        let total = surface_integral(&j_ind, &geometry.a_avg)?;
        let reshaped = &j_ind * &geometry.f_passing;
        let (scaled, factor) = rescale_current(&reshaped, &geometry.a_avg, total)?;
        debug!("trapped-fraction reshape, rescaling factor = {:.6}", factor);
        j_ind = scaled;
    }

    let last = n - 1;
    let mut j_bootstrap = None;
    let mut bootstrap_raw = None;
    let mut crossing = None;
    let mut redistributed = false;

    let j_total = if request.include_bootstrap {
        let closure = require_closure(closure)?;
        let raw = evaluate_closure(closure, kinetic, pressure, &geometry, &config.charge_numbers)?;
        j_ind[last] = 0.0;
        let mut j_bs = &raw * &geometry.r_avg / &geometry.f * config.jbs_scale;
        j_bs[last] = 0.0;

        let inductive_target = match solver.targets().ip() {
            Some(ip) if !request.lmode_init => {
                let bootstrap_current = surface_integral(&j_bs, &geometry.a_avg)?;
                Some(ip - bootstrap_current)
            }
            _ => None,
        };
        if let Some(target) = inductive_target {
            let (scaled, factor) = rescale_current(&j_ind, &geometry.a_avg, target)?;
            debug!("inductive current rescaling factor = {:.6}", factor);
            j_ind = scaled;
        }

        if let RedistributionStrategy::Dynamo(params) = &config.redistribution {
            let outcome = redistribute(
                params,
                &geometry,
                &j_ind,
                &j_bs,
                request.iteration,
                request.last_crossing,
                inductive_target,
            )?;
            redistributed = outcome.applied();
            crossing = outcome.location();
            j_ind = outcome.j_inductive;
        }

        let total = &j_ind + &j_bs;
        j_bootstrap = Some(j_bs);
        bootstrap_raw = Some(raw);
        total
    } else {
        j_ind[last] = 0.0;
        j_ind.clone()
    };

    let ffprime = ffprime_from_jtor_pprime(
        &j_total,
        pprime.values(),
        &geometry.r_avg,
        &geometry.one_over_r_avg,
    );
    let mut ffp_prof = Profile::new(psi_norm, ffprime)?;
    let mut pp_prof = pprime;
    if config.smooth_inputs {
        let smoothing = config.smoothing;
        ffp_prof = smooth_profile(&ffp_prof, &smoothing)?;
        pp_prof = smooth_profile(&pp_prof, &smoothing)?;
    }

    Ok(IterationResult {
        pp_prof: finalize_source(&pp_prof),
        ffp_prof: finalize_source(&ffp_prof),
        j_bootstrap,
        j_inductive: j_ind,
        j_total,
        bootstrap_raw,
        q0: geometry.q0(),
        crossing,
        redistributed,
    })
}

/// Normalize to the axis value, pin the edge to 0 and zero out non-finite samples.
pub fn finalize_source(profile: &Profile) -> Profile {
    profile.normalized_by_axis().with_edge(0.0).finite_or_zero()
}
