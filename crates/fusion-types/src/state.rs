// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{DISABLED_TARGET, Q_ELECTRON};
use crate::error::{FusionError, FusionResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A 1D flux function sampled over normalized poloidal flux ψ_norm ∈ [0, 1].
///
/// The grid is strictly increasing. Transformations return a new profile;
/// a profile handed to the equilibrium solver is never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    psi_norm: Array1<f64>,
    values: Array1<f64>,
}

impl Profile {
    pub fn new(psi_norm: Array1<f64>, values: Array1<f64>) -> FusionResult<Self> {
        if psi_norm.is_empty() {
            return Err(FusionError::Precondition(
                "profile must contain at least one sample".to_string(),
            ));
        }
        if psi_norm.len() != values.len() {
            return Err(FusionError::Precondition(format!(
                "profile grid length {} does not match value length {}",
                psi_norm.len(),
                values.len()
            )));
        }
        ensure_strictly_increasing(&psi_norm, "profile psi_norm")?;
        Ok(Profile { psi_norm, values })
    }

    /// Profile on a uniform grid linspace(0, 1, values.len()).
    pub fn uniform(values: Array1<f64>) -> FusionResult<Self> {
        let psi_norm = Array1::linspace(0.0, 1.0, values.len());
        Self::new(psi_norm, values)
    }

    pub fn psi_norm(&self) -> &Array1<f64> {
        &self.psi_norm
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn axis_value(&self) -> f64 {
        self.values[0]
    }

    pub fn edge_value(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Same grid, new values.
    pub fn with_values(&self, values: Array1<f64>) -> FusionResult<Self> {
        Self::new(self.psi_norm.clone(), values)
    }

    /// Copy with the separatrix sample set to `edge`.
    pub fn with_edge(&self, edge: f64) -> Self {
        let mut values = self.values.clone();
        let last = values.len() - 1;
        values[last] = edge;
        Profile {
            psi_norm: self.psi_norm.clone(),
            values,
        }
    }

    /// Copy divided by the on-axis value.
    pub fn normalized_by_axis(&self) -> Self {
        let axis = self.axis_value();
        Profile {
            psi_norm: self.psi_norm.clone(),
            values: self.values.mapv(|v| v / axis),
        }
    }

    /// Copy with every non-finite sample replaced by zero.
    pub fn finite_or_zero(&self) -> Self {
        Profile {
            psi_norm: self.psi_norm.clone(),
            values: self
                .values
                .mapv(|v| if v.is_finite() { v } else { 0.0 }),
        }
    }
}

/// Measured or assumed kinetic profiles, all sampled on the same uniform ψ_norm grid.
/// Temperatures in eV, densities in m^-3.
#[derive(Debug, Clone, PartialEq)]
pub struct KineticProfiles {
    pub ne: Array1<f64>,
    pub te: Array1<f64>,
    pub ni: Array1<f64>,
    pub ti: Array1<f64>,
    pub zeff: Array1<f64>,
}

impl KineticProfiles {
    pub fn len(&self) -> usize {
        self.ne.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ne.is_empty()
    }

    /// Check that every profile has `n` finite samples.
    pub fn validate(&self, n: usize) -> FusionResult<()> {
        let named = [
            ("ne", &self.ne),
            ("te", &self.te),
            ("ni", &self.ni),
            ("ti", &self.ti),
            ("zeff", &self.zeff),
        ];
        for (name, arr) in named {
            if arr.len() != n {
                return Err(FusionError::Precondition(format!(
                    "kinetic profile {name} has {} samples, expected {n}",
                    arr.len()
                )));
            }
            if let Some(i) = arr.iter().position(|v| !v.is_finite()) {
                return Err(FusionError::Precondition(format!(
                    "kinetic profile {name} is non-finite at index {i}"
                )));
            }
        }
        Ok(())
    }

    /// Kinetic pressure p = e (n_e T_e + n_i T_i) in Pa.
    pub fn pressure(&self) -> Array1<f64> {
        (&self.ne * &self.te + &self.ni * &self.ti).mapv(|v| v * Q_ELECTRON)
    }
}

/// Flux-surface geometry snapshot pulled from the equilibrium solver.
/// Rebuilt on every iteration.
#[derive(Debug, Clone)]
pub struct FluxGeometry {
    pub psi_norm: Array1<f64>,
    /// Safety factor q(ψ).
    pub q: Array1<f64>,
    /// Poloidal current function F and F'.
    pub f: Array1<f64>,
    pub f_prime: Array1<f64>,
    /// Passing-particle fraction f_c = 1 - f_t.
    pub f_passing: Array1<f64>,
    /// Flux-surface averaged R and 1/R.
    pub r_avg: Array1<f64>,
    pub one_over_r_avg: Array1<f64>,
    /// Flux-surface averaged minor radius, ~√ψ near the axis.
    pub a_avg: Array1<f64>,
    /// Inverse aspect ratio ⟨a⟩/⟨R⟩.
    pub epsilon: Array1<f64>,
    pub psi_axis: f64,
    pub psi_edge: f64,
}

impl FluxGeometry {
    pub fn len(&self) -> usize {
        self.psi_norm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.psi_norm.is_empty()
    }

    /// ψ_edge - ψ_axis in physical flux units.
    pub fn flux_span(&self) -> f64 {
        self.psi_edge - self.psi_axis
    }

    pub fn q0(&self) -> f64 {
        self.q[0]
    }

    /// Trapped-particle fraction f_t = 1 - f_c.
    pub fn f_trapped(&self) -> Array1<f64> {
        self.f_passing.mapv(|fc| 1.0 - fc)
    }

    /// Raw (unnormalized) flux on the sample grid.
    pub fn psi_raw(&self) -> Array1<f64> {
        let span = self.flux_span();
        self.psi_norm.mapv(|p| p * span + self.psi_axis)
    }
}

/// Scalar equilibrium targets. A disabled target holds [`DISABLED_TARGET`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Targets {
    pub ip: f64,
    pub pax: f64,
}

impl Default for Targets {
    fn default() -> Self {
        Targets {
            ip: DISABLED_TARGET,
            pax: DISABLED_TARGET,
        }
    }
}

impl Targets {
    pub fn ip(&self) -> Option<f64> {
        enabled(self.ip)
    }

    pub fn pax(&self) -> Option<f64> {
        enabled(self.pax)
    }

    pub fn with_ip(self, ip: f64) -> Self {
        Targets { ip, ..self }
    }

    pub fn with_pax(self, pax: f64) -> Self {
        Targets { pax, ..self }
    }

    /// Merge `update` on top of `self`; disabled fields in `update` keep the
    /// current value.
    pub fn retain_merge(self, update: Targets) -> Self {
        Targets {
            ip: enabled(update.ip).unwrap_or(self.ip),
            pax: enabled(update.pax).unwrap_or(self.pax),
        }
    }
}

fn enabled(value: f64) -> Option<f64> {
    if value == DISABLED_TARGET {
        None
    } else {
        Some(value)
    }
}

/// Output of one self-consistent profile update.
#[derive(Debug, Clone)]
pub struct IterationResult {
    /// Normalized P' shape handed to the solver.
    pub pp_prof: Profile,
    /// Normalized FF' shape handed to the solver.
    pub ffp_prof: Profile,
    pub j_bootstrap: Option<Array1<f64>>,
    pub j_inductive: Array1<f64>,
    pub j_total: Array1<f64>,
    /// Raw ⟨B·j_BS⟩ from the bootstrap closure.
    pub bootstrap_raw: Option<Array1<f64>>,
    /// q on axis in the geometry the step was computed from.
    pub q0: f64,
    /// q = q_target surface location used by the redistribution, if any.
    pub crossing: Option<f64>,
    pub redistributed: bool,
}

/// Fail unless `arr` is strictly increasing and finite.
pub fn ensure_strictly_increasing(arr: &Array1<f64>, what: &str) -> FusionResult<()> {
    if let Some(i) = arr.iter().position(|v| !v.is_finite()) {
        return Err(FusionError::Precondition(format!(
            "{what} is non-finite at index {i}"
        )));
    }
    for i in 1..arr.len() {
        if arr[i] <= arr[i - 1] {
            return Err(FusionError::Precondition(format!(
                "{what} must be strictly increasing: [{}] = {} <= [{}] = {}",
                i,
                arr[i],
                i - 1,
                arr[i - 1]
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_profile_rejects_mismatched_lengths() {
        let err = Profile::new(array![0.0, 0.5, 1.0], array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, FusionError::Precondition(_)));
    }

    #[test]
    fn test_profile_rejects_non_increasing_grid() {
        assert!(Profile::new(array![0.0, 0.5, 0.5], array![1.0, 2.0, 3.0]).is_err());
        assert!(Profile::new(array![0.0, 0.7, 0.5], array![1.0, 2.0, 3.0]).is_err());
        assert!(Profile::new(array![], array![]).is_err());
    }

    #[test]
    fn test_edge_and_nan_transforms_are_pure() {
        let p = Profile::uniform(array![2.0, f64::NAN, 1.0]).unwrap();
        let q = p.with_edge(0.0).finite_or_zero().normalized_by_axis();
        assert_eq!(q.values(), &array![1.0, 0.0, 0.0]);
        // Source profile untouched
        assert!(p.values()[1].is_nan());
        assert_eq!(p.edge_value(), 1.0);
    }

    #[test]
    fn test_pressure_units() {
        let k = KineticProfiles {
            ne: array![1e20, 1e19],
            te: array![1000.0, 100.0],
            ni: array![1e20, 1e19],
            ti: array![500.0, 50.0],
            zeff: array![1.5, 1.5],
        };
        let p = k.pressure();
        let expected0 = Q_ELECTRON * (1e20 * 1000.0 + 1e20 * 500.0);
        assert!((p[0] - expected0).abs() / expected0 < 1e-12);
        k.validate(2).unwrap();
        assert!(k.validate(3).is_err());
    }

    #[test]
    fn test_targets_sentinel() {
        let t = Targets::default();
        assert!(t.ip().is_none());
        assert!(t.pax().is_none());
        let t = t.with_ip(1e6);
        assert_eq!(t.ip(), Some(1e6));
        let merged = t.retain_merge(Targets::default().with_pax(5e4));
        assert_eq!(merged.ip(), Some(1e6));
        assert_eq!(merged.pax(), Some(5e4));
    }
}
