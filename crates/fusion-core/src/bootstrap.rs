// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Bootstrap Closure Interface
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Neoclassical bootstrap closure interface and its kinetic inputs.
//!
//! The closure (Sauter-type) returns ⟨B·j_BS⟩ on each flux surface; the
//! iteration step converts that into a toroidal current density.

use fusion_math::interp::derivative;
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::{FluxGeometry, KineticProfiles};
use ndarray::Array1;

/// Everything a bootstrap closure gets to see for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapInputs<'a> {
    pub psi_norm: &'a Array1<f64>,
    pub kinetic: &'a KineticProfiles,
    pub gradients: &'a KineticGradients,
    pub pressure: &'a Array1<f64>,
    pub charge_numbers: &'a [f64],
    /// Unnormalized flux ψ_norm·(ψ_edge - ψ_axis) + ψ_axis.
    pub psi_raw: &'a Array1<f64>,
    pub r_avg: &'a Array1<f64>,
    pub epsilon: &'a Array1<f64>,
    pub q: &'a Array1<f64>,
    pub f_trapped: &'a Array1<f64>,
    /// Poloidal current function F (a.k.a. I(ψ)).
    pub f: &'a Array1<f64>,
}

/// ψ derivatives of the kinetic profiles in physical flux units.
#[derive(Debug, Clone)]
pub struct KineticGradients {
    pub dne_dpsi: Array1<f64>,
    pub dte_dpsi: Array1<f64>,
    pub dni_dpsi: Array1<f64>,
    pub dti_dpsi: Array1<f64>,
}

impl KineticGradients {
    /// Finite differences (second order inside, first order at the ends)
    /// divided by the physical flux span.
    pub fn from_profiles(
        kinetic: &KineticProfiles,
        psi_norm: &Array1<f64>,
        flux_span: f64,
    ) -> FusionResult<Self> {
        if flux_span == 0.0 || !flux_span.is_finite() {
            return Err(FusionError::Precondition(format!(
                "flux span must be finite and non-zero, got {flux_span}"
            )));
        }
        kinetic.validate(psi_norm.len())?;
        let x = psi_norm.to_vec();
        let d = |arr: &Array1<f64>| -> Array1<f64> {
            Array1::from(derivative(&arr.to_vec(), &x)) / flux_span
        };
        Ok(KineticGradients {
            dne_dpsi: d(&kinetic.ne),
            dte_dpsi: d(&kinetic.te),
            dni_dpsi: d(&kinetic.ni),
            dti_dpsi: d(&kinetic.ti),
        })
    }
}

/// A neoclassical bootstrap current model.
pub trait BootstrapClosure {
    /// Flux-surface average ⟨B·j_BS⟩ [T·A/m²] on each sample.
    fn flux_avg_b_dot_jbs(&self, inputs: &BootstrapInputs<'_>) -> FusionResult<Array1<f64>>;
}

/// Borrow the closure or fail with `MissingDependency`.
pub fn require_closure<'c>(
    closure: Option<&'c dyn BootstrapClosure>,
) -> FusionResult<&'c dyn BootstrapClosure> {
    closure.ok_or_else(|| {
        FusionError::MissingDependency(
            "bootstrap current requested but no bootstrap closure was provided".to_string(),
        )
    })
}

/// Evaluate the closure for the given geometry snapshot.
pub fn evaluate_closure(
    closure: &dyn BootstrapClosure,
    kinetic: &KineticProfiles,
    pressure: &Array1<f64>,
    geometry: &FluxGeometry,
    charge_numbers: &[f64],
) -> FusionResult<Array1<f64>> {
    let gradients =
        KineticGradients::from_profiles(kinetic, &geometry.psi_norm, geometry.flux_span())?;
    let psi_raw = geometry.psi_raw();
    let f_trapped = geometry.f_trapped();
    let inputs = BootstrapInputs {
        psi_norm: &geometry.psi_norm,
        kinetic,
        gradients: &gradients,
        pressure,
        charge_numbers,
        psi_raw: &psi_raw,
        r_avg: &geometry.r_avg,
        epsilon: &geometry.epsilon,
        q: &geometry.q,
        f_trapped: &f_trapped,
        f: &geometry.f,
    };
    let out = closure.flux_avg_b_dot_jbs(&inputs)?;
    if out.len() != geometry.len() {
        return Err(FusionError::Precondition(format!(
            "bootstrap closure returned {} samples, expected {}",
            out.len(),
            geometry.len()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinetic(n: usize) -> KineticProfiles {
        let psi = Array1::linspace(0.0, 1.0, n);
        KineticProfiles {
            ne: psi.mapv(|x| 1e20 * (1.0 - 0.5 * x)),
            te: psi.mapv(|x| 5000.0 * (1.0 - x * x)),
            ni: psi.mapv(|x| 1e20 * (1.0 - 0.5 * x)),
            ti: Array1::from_elem(n, 3000.0),
            zeff: Array1::from_elem(n, 1.5),
        }
    }

    #[test]
    fn test_gradients_use_physical_span() {
        let n = 21;
        let psi = Array1::linspace(0.0, 1.0, n);
        let g = KineticGradients::from_profiles(&kinetic(n), &psi, 2.0).unwrap();
        // ne is linear: -0.5e20 per unit ψ_norm, halved by the span.
        for v in g.dne_dpsi.iter() {
            assert!((v + 0.25e20).abs() < 1e8, "dne/dψ = {v}");
        }
        assert!(g.dti_dpsi.iter().all(|v| v.abs() < 1e-9));
        // Interior te derivative is exact for a quadratic.
        let mid = n / 2;
        let expected = -5000.0 * 2.0 * psi[mid] / 2.0;
        assert!((g.dte_dpsi[mid] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zero_span_rejected() {
        let psi = Array1::linspace(0.0, 1.0, 5);
        assert!(KineticGradients::from_profiles(&kinetic(5), &psi, 0.0).is_err());
    }

    #[test]
    fn test_missing_closure() {
        assert!(matches!(
            require_closure(None),
            Err(FusionError::MissingDependency(_))
        ));
    }
}
