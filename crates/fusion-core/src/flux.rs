// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Flux-Surface Operators
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flux-surface operators: P' from pressure, cross-section current
//! integral, current rescaling, and the J_tor ↔ FF' conversion.
//!
//! FF' convention: the solver's FF' carries no 1/2, so
//!   FF' = (J_tor - ⟨R⟩(-P')) μ₀ / ⟨1/R⟩
//!   J_tor = ⟨R⟩(-P') + ⟨1/R⟩ FF' / μ₀
//! The pair is pinned by `test_ffprime_jtor_contract` below.

use fusion_math::spline::CubicSpline;
use fusion_types::constants::MU0_SI;
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::Profile;
use ndarray::Array1;
use std::f64::consts::PI;

/// dP/dψ in physical flux units.
///
/// Fits a not-a-knot cubic spline through the pressure samples, takes its
/// derivative at each sample and multiplies by `inv_flux_span`
/// = 1/(ψ_edge - ψ_axis).
pub fn pprime_from_pressure(
    psi_norm: &Array1<f64>,
    pressure: &Array1<f64>,
    inv_flux_span: f64,
) -> FusionResult<Profile> {
    let profile = Profile::new(psi_norm.clone(), pressure.clone())?;
    if !inv_flux_span.is_finite() {
        return Err(FusionError::Precondition(format!(
            "inverse flux span must be finite, got {inv_flux_span}"
        )));
    }
    let x = psi_norm.to_vec();
    let spline = CubicSpline::new(&x, &pressure.to_vec())?;
    let pprime = Array1::from_iter(x.iter().map(|&p| spline.derivative(p) * inv_flux_span));
    profile.with_values(pprime)
}

/// 2π ∫ a f(a) da over [min a, max a].
///
/// `a_avg` is the flux-surface averaged minor radius and must be strictly
/// increasing.
pub fn surface_integral(values: &Array1<f64>, a_avg: &Array1<f64>) -> FusionResult<f64> {
    if values.len() != a_avg.len() {
        return Err(FusionError::Precondition(format!(
            "surface integral: {} values on {} radii",
            values.len(),
            a_avg.len()
        )));
    }
    let a = a_avg.to_vec();
    let integrand: Vec<f64> = a.iter().zip(values.iter()).map(|(r, f)| r * f).collect();
    let spline = CubicSpline::new(&a, &integrand)?;
    let (lo, hi) = spline.domain();
    Ok(2.0 * PI * spline.integrate(lo, hi)?)
}

/// Scale `j` so that its surface integral equals `target`.
///
/// Returns the rescaled current and the factor applied.
pub fn rescale_current(
    j: &Array1<f64>,
    a_avg: &Array1<f64>,
    target: f64,
) -> FusionResult<(Array1<f64>, f64)> {
    let current = surface_integral(j, a_avg)?;
    if current == 0.0 {
        return Err(FusionError::ZeroCurrentIntegral);
    }
    let factor = target / current;
    Ok((j.mapv(|v| v * factor), factor))
}

/// FF' from toroidal current density and P'.
pub fn ffprime_from_jtor_pprime(
    jtor: &Array1<f64>,
    pprime: &Array1<f64>,
    r_avg: &Array1<f64>,
    one_over_r_avg: &Array1<f64>,
) -> Array1<f64> {
    let pressure_current = r_avg * &pprime.mapv(|v| -v);
    (jtor - &pressure_current) * MU0_SI / one_over_r_avg
}

/// Toroidal current density from FF' and P'. Inverse of
/// [`ffprime_from_jtor_pprime`].
pub fn jtor_from_ffprime_pprime(
    ffprime: &Array1<f64>,
    pprime: &Array1<f64>,
    r_avg: &Array1<f64>,
    one_over_r_avg: &Array1<f64>,
) -> Array1<f64> {
    r_avg * &pprime.mapv(|v| -v) + one_over_r_avg * ffprime / MU0_SI
}
