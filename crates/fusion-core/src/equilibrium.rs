// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Equilibrium Solver Interface
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Contract between the iteration engine and a free-boundary
//! Grad-Shafranov solver.
//!
//! The engine never solves the equilibrium itself. It pulls flux-surface
//! quantities, pushes normalized P' and FF' shapes, and calls `solve()`.
//! A negative return code from `solve()` is a failure; see
//! [`SolveFailureReason::from_code`](fusion_types::error::SolveFailureReason::from_code).

use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::{FluxGeometry, Profile, Targets};
use ndarray::Array1;

/// Flux functions on `npsi` uniform ψ_norm samples.
#[derive(Debug, Clone)]
pub struct FluxFunctions {
    pub psi: Array1<f64>,
    pub f: Array1<f64>,
    pub f_prime: Array1<f64>,
    pub p: Array1<f64>,
    pub p_prime: Array1<f64>,
}

/// Safety factor and flux-surface averages of R.
#[derive(Debug, Clone)]
pub struct SafetyFactorProfile {
    pub psi: Array1<f64>,
    pub q: Array1<f64>,
    pub r_avg: Array1<f64>,
    pub one_over_r_avg: Array1<f64>,
    /// Length of the last closed flux surface [m].
    pub edge_length: f64,
    /// Radial extent [R_min, R_max] of the plasma [m].
    pub r_bounds: [f64; 2],
    /// Vertical extent [Z_min, Z_max] of the plasma [m].
    pub z_bounds: [f64; 2],
}

/// Sauter trapped-particle quantities.
#[derive(Debug, Clone)]
pub struct TrappedFractionProfile {
    pub psi: Array1<f64>,
    /// Passing fraction f_c = 1 - f_t.
    pub fc: Array1<f64>,
    pub r_avg: Array1<f64>,
    pub one_over_r_avg: Array1<f64>,
    /// Flux-surface averaged minor radius.
    pub a_avg: Array1<f64>,
    pub b_avg: Array1<f64>,
    pub b2_avg: Array1<f64>,
}

/// Free-boundary equilibrium solver driven by the iteration engine.
pub trait EquilibriumSolver {
    fn get_profiles(&self, npsi: usize) -> FusionResult<FluxFunctions>;

    fn get_q(&self, npsi: usize) -> FusionResult<SafetyFactorProfile>;

    fn sauter_fc(&self, npsi: usize) -> FusionResult<TrappedFractionProfile>;

    /// Install normalized FF' and P' source shapes for the next solve.
    fn set_profiles(&mut self, ffp: &Profile, pp: &Profile) -> FusionResult<()>;

    /// Run the nonlinear solve. Returns 0 on success, negative on failure.
    fn solve(&mut self) -> i32;

    /// Update scalar targets. With `retain_previous`, disabled fields in
    /// `targets` leave the current value in place.
    fn set_targets(&mut self, targets: Targets, retain_previous: bool);

    fn targets(&self) -> Targets;

    /// (ψ_axis, ψ_edge) of the current equilibrium.
    fn psi_bounds(&self) -> (f64, f64);
}

/// Assemble a [`FluxGeometry`] snapshot from the solver at `npsi` samples.
///
/// ⟨R⟩ and ⟨1/R⟩ come from `get_q`; ε = ⟨a⟩/⟨R⟩ uses the Sauter averages.
pub fn pull_geometry<S: EquilibriumSolver + ?Sized>(
    solver: &S,
    npsi: usize,
) -> FusionResult<FluxGeometry> {
    let flux = solver.get_profiles(npsi)?;
    let trapped = solver.sauter_fc(npsi)?;
    let safety = solver.get_q(npsi)?;

    let lengths = [
        ("get_profiles", flux.psi.len()),
        ("get_q", safety.q.len()),
        ("sauter_fc", trapped.fc.len()),
    ];
    for (source, len) in lengths {
        if len != npsi {
            return Err(FusionError::Precondition(format!(
                "solver {source} returned {len} samples, requested {npsi}"
            )));
        }
    }

    let epsilon = &trapped.a_avg / &trapped.r_avg;
    let (psi_axis, psi_edge) = solver.psi_bounds();
    Ok(FluxGeometry {
        psi_norm: flux.psi,
        q: safety.q,
        f: flux.f,
        f_prime: flux.f_prime,
        f_passing: trapped.fc,
        r_avg: safety.r_avg,
        one_over_r_avg: safety.one_over_r_avg,
        a_avg: trapped.a_avg,
        epsilon,
        psi_axis,
        psi_edge,
    })
}
