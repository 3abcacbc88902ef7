// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — L-mode Initialisation Profiles
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flattened-pedestal kinetic profiles for the initial equilibrium.
//!
//! Samples from ψ_norm ≈ 0.5 up to (not including) the edge are dropped
//! and a least-squares cubic is fitted through the core plus the single
//! edge anchor. Starting the solver from this L-mode-like state before the
//! pedestal is raised makes the H-mode iteration far more likely to converge.

use fusion_math::linalg::{polyfit, polyval};
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::KineticProfiles;
use ndarray::Array1;

/// Cubic fit needs four points; keep a margin so the core is not just the fit.
pub const MIN_SAMPLES: usize = 6;

const FIT_DEGREE: usize = 3;

/// Indices kept for the fit: [0, N/2) plus the last sample.
pub fn retained_indices(n: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..n / 2).collect();
    idx.push(n - 1);
    idx
}

/// Replace ne, Te, ni, Ti by cubic fits through the core and edge anchor.
/// Z_eff is left as is.
pub fn flatten_pedestal(
    psi_norm: &Array1<f64>,
    kinetic: &KineticProfiles,
) -> FusionResult<KineticProfiles> {
    let n = psi_norm.len();
    if n < MIN_SAMPLES {
        return Err(FusionError::Precondition(format!(
            "L-mode initialisation needs at least {MIN_SAMPLES} samples, got {n}"
        )));
    }
    kinetic.validate(n)?;

    let keep = retained_indices(n);
    let x: Vec<f64> = keep.iter().map(|&i| psi_norm[i]).collect();
    let fit = |arr: &Array1<f64>| -> FusionResult<Array1<f64>> {
        let y: Vec<f64> = keep.iter().map(|&i| arr[i]).collect();
        let coefs = polyfit(&x, &y, FIT_DEGREE)?;
        Ok(psi_norm.mapv(|p| polyval(&coefs, p)))
    };

    Ok(KineticProfiles {
        ne: fit(&kinetic.ne)?,
        te: fit(&kinetic.te)?,
        ni: fit(&kinetic.ni)?,
        ti: fit(&kinetic.ti)?,
        zeff: kinetic.zeff.clone(),
    })
}
