// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Synthetic Equilibrium
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Analytic large-aspect-ratio circular equilibrium.
//!
//! Stands in for a Grad-Shafranov solver in tests and benchmarks. Flux
//! surfaces are concentric circles with ψ_norm = (r/a)². The installed FF'
//! shape is turned into a current density through ⟨1/R⟩ (low β, so P'
//! only shapes the pressure) and scaled to the I_p target:
//!
//!   j(ψ)  = s · FF'(ψ) R0 / √(R0² - a²ψ)
//!   I(ψ)  = π a² s ∫₀^ψ j/s dψ'
//!   q(ψ)  = 2 B0 ψ / (R0 μ₀ s ∫₀^ψ j/s dψ')
//!
//! so q0 grows with the ratio of mean to on-axis current.

use crate::bootstrap::{BootstrapClosure, BootstrapInputs};
use crate::equilibrium::{
    EquilibriumSolver, FluxFunctions, SafetyFactorProfile, TrappedFractionProfile,
};
use fusion_math::interp::{interp1d_many, linspace};
use fusion_types::constants::{MU0_SI, Q_ELECTRON};
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::{Profile, Targets};
use ndarray::Array1;
use std::f64::consts::PI;

/// Trapped fraction f_t ≈ 1.46 √ε at large aspect ratio.
const TRAPPED_FRACTION_COEFF: f64 = 1.46;

const CODE_OK: i32 = 0;
const CODE_BAD_STATE: i32 = -1;
const CODE_ZERO_FLUX: i32 = -2;
const CODE_LOW_CURRENT: i32 = -5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticParams {
    /// Major radius [m].
    pub r0: f64,
    /// Minor radius [m].
    pub a: f64,
    /// Vacuum toroidal field on axis [T].
    pub b0: f64,
    /// Plasma current used when no I_p target is set [A].
    pub ip: f64,
    /// Internal ψ_norm samples.
    pub resolution: usize,
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            r0: 3.0,
            a: 1.0,
            b0: 2.5,
            ip: 2.0e6,
            resolution: 201,
        }
    }
}

impl SyntheticParams {
    /// q0 for a current density linear in ψ, (1 - ψ).
    pub fn q0_linear_current(&self) -> f64 {
        PI * self.a * self.a * self.b0 / (self.r0 * MU0_SI * self.ip)
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticEquilibrium {
    params: SyntheticParams,
    targets: Targets,
    ffp: Profile,
    pp: Profile,
    grid: Vec<f64>,
    j: Vec<f64>,
    q: Vec<f64>,
    p: Vec<f64>,
    p_prime: Vec<f64>,
    psi_edge: f64,
    solves: usize,
}

impl SyntheticEquilibrium {
    /// Build and solve once with a current density ∝ (1 - ψ).
    pub fn new(params: SyntheticParams) -> FusionResult<Self> {
        if !(params.r0 > 0.0 && params.a > 0.0 && params.a < params.r0) {
            return Err(FusionError::ConfigError(format!(
                "synthetic equilibrium needs 0 < a < R0, got a = {}, R0 = {}",
                params.a, params.r0
            )));
        }
        if !(params.b0 > 0.0 && params.ip > 0.0) {
            return Err(FusionError::ConfigError(format!(
                "synthetic equilibrium needs B0 > 0 and Ip > 0, got {} and {}",
                params.b0, params.ip
            )));
        }
        if params.resolution < 3 {
            return Err(FusionError::ConfigError(format!(
                "synthetic equilibrium resolution must be >= 3, got {}",
                params.resolution
            )));
        }

        let grid = linspace(0.0, 1.0, params.resolution);
        let psi = Array1::from(grid.clone());
        let ffp_values = psi.mapv(|x| {
            (1.0 - x) * (params.r0 * params.r0 - params.a * params.a * x).sqrt() / params.r0
        });
        let ffp = Profile::new(psi.clone(), ffp_values)?;
        let pp = Profile::new(psi, Array1::from_elem(params.resolution, 1.0))?;

        let n = params.resolution;
        let mut eq = SyntheticEquilibrium {
            params,
            targets: Targets::default(),
            ffp,
            pp,
            grid,
            j: vec![0.0; n],
            q: vec![0.0; n],
            p: vec![0.0; n],
            p_prime: vec![0.0; n],
            psi_edge: 0.0,
            solves: 0,
        };
        let code = eq.solve();
        if code < 0 {
            return Err(FusionError::ConfigError(format!(
                "synthetic equilibrium initial solve failed with code {code}"
            )));
        }
        eq.solves = 0;
        Ok(eq)
    }

    pub fn params(&self) -> &SyntheticParams {
        &self.params
    }

    /// Number of `solve()` calls since construction.
    pub fn solve_count(&self) -> usize {
        self.solves
    }

    /// Toroidal current density on the internal grid [A/m²].
    pub fn current_density(&self) -> &[f64] {
        &self.j
    }

    pub fn q0(&self) -> f64 {
        self.q[0]
    }

    fn minor_radius(&self, psi: f64) -> f64 {
        self.params.a * psi.max(0.0).sqrt()
    }

    fn one_over_r(&self, psi: f64) -> f64 {
        let r = self.minor_radius(psi);
        1.0 / (self.params.r0 * self.params.r0 - r * r).sqrt()
    }

    fn resample(&self, values: &[f64], npsi: usize) -> (Array1<f64>, Array1<f64>) {
        let psi = linspace(0.0, 1.0, npsi);
        let out = interp1d_many(&psi, &self.grid, values);
        (Array1::from(psi), Array1::from(out))
    }
}

fn cumulative_trapezoid(x: &[f64], y: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; x.len()];
    for i in 1..x.len() {
        out[i] = out[i - 1] + 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
    }
    out
}

impl EquilibriumSolver for SyntheticEquilibrium {
    fn get_profiles(&self, npsi: usize) -> FusionResult<FluxFunctions> {
        let (psi, j) = self.resample(&self.j, npsi);
        let (_, p) = self.resample(&self.p, npsi);
        let (_, p_prime) = self.resample(&self.p_prime, npsi);
        let f_value = self.params.r0 * self.params.b0;
        let f_prime = Array1::from_iter(
            psi.iter()
                .zip(j.iter())
                .map(|(&x, &jv)| MU0_SI * jv / self.one_over_r(x) / f_value),
        );
        Ok(FluxFunctions {
            f: Array1::from_elem(npsi, f_value),
            f_prime,
            p,
            p_prime,
            psi,
        })
    }

    fn get_q(&self, npsi: usize) -> FusionResult<SafetyFactorProfile> {
        let (psi, q) = self.resample(&self.q, npsi);
        let one_over_r_avg = psi.mapv(|x| self.one_over_r(x));
        let SyntheticParams { r0, a, .. } = self.params;
        Ok(SafetyFactorProfile {
            r_avg: Array1::from_elem(npsi, r0),
            one_over_r_avg,
            edge_length: 2.0 * PI * a,
            r_bounds: [r0 - a, r0 + a],
            z_bounds: [-a, a],
            psi,
            q,
        })
    }

    fn sauter_fc(&self, npsi: usize) -> FusionResult<TrappedFractionProfile> {
        let psi = Array1::linspace(0.0, 1.0, npsi);
        let a_avg = psi.mapv(|x| self.minor_radius(x));
        let r0 = self.params.r0;
        let fc = a_avg.mapv(|r| 1.0 - TRAPPED_FRACTION_COEFF * (r / r0).sqrt());
        let b0 = self.params.b0;
        Ok(TrappedFractionProfile {
            fc,
            r_avg: Array1::from_elem(npsi, r0),
            one_over_r_avg: psi.mapv(|x| self.one_over_r(x)),
            a_avg,
            b_avg: Array1::from_elem(npsi, b0),
            b2_avg: Array1::from_elem(npsi, b0 * b0),
            psi,
        })
    }

    fn set_profiles(&mut self, ffp: &Profile, pp: &Profile) -> FusionResult<()> {
        for (name, prof) in [("ffp", ffp), ("pp", pp)] {
            if prof.values().iter().any(|v| !v.is_finite()) {
                return Err(FusionError::Precondition(format!(
                    "{name} profile contains non-finite samples"
                )));
            }
        }
        self.ffp = ffp.clone();
        self.pp = pp.clone();
        Ok(())
    }

    fn solve(&mut self) -> i32 {
        self.solves += 1;
        let SyntheticParams { r0, a, b0, .. } = self.params;
        let grid = &self.grid;

        let ffp = interp1d_many(grid, &self.ffp.psi_norm().to_vec(), &self.ffp.values().to_vec());
        let shape: Vec<f64> = grid
            .iter()
            .zip(&ffp)
            .map(|(&x, &f)| f * r0 * self.one_over_r(x))
            .collect();
        if shape.iter().any(|v| !v.is_finite()) {
            return CODE_BAD_STATE;
        }

        let cumulative = cumulative_trapezoid(grid, &shape);
        let total = cumulative[cumulative.len() - 1];
        if !(total > 0.0) {
            return CODE_LOW_CURRENT;
        }
        let ip = self.targets.ip().unwrap_or(self.params.ip);
        let scale = ip / (PI * a * a * total);
        if scale < 0.0 {
            return CODE_LOW_CURRENT;
        }

        let mean: Vec<f64> = grid
            .iter()
            .zip(&cumulative)
            .enumerate()
            .map(|(i, (&x, &c))| if i == 0 { shape[0] } else { c / x })
            .collect();
        if mean.iter().any(|m| !(*m > 0.0)) {
            return CODE_BAD_STATE;
        }

        let span = r0 * MU0_SI * a * a * scale / 4.0 * cumulative_trapezoid(grid, &mean)[grid.len() - 1];
        if span == 0.0 {
            return CODE_ZERO_FLUX;
        }

        let pax = self.targets.pax().unwrap_or(0.0);
        let pp = interp1d_many(grid, &self.pp.psi_norm().to_vec(), &self.pp.values().to_vec());
        let pp_cumulative = cumulative_trapezoid(grid, &pp);
        let pp_total = pp_cumulative[pp_cumulative.len() - 1];
        if pp_total != 0.0 {
            self.p = pp_cumulative.iter().map(|c| pax * (1.0 - c / pp_total)).collect();
            self.p_prime = pp.iter().map(|v| -pax * v / (pp_total * span)).collect();
        } else {
            self.p = vec![pax; grid.len()];
            self.p_prime = vec![0.0; grid.len()];
        }

        self.q = mean.iter().map(|m| 2.0 * b0 / (r0 * MU0_SI * scale * m)).collect();
        self.j = shape.iter().map(|v| scale * v).collect();
        self.psi_edge = span;
        CODE_OK
    }

    fn set_targets(&mut self, targets: Targets, retain_previous: bool) {
        self.targets = if retain_previous {
            self.targets.retain_merge(targets)
        } else {
            targets
        };
    }

    fn targets(&self) -> Targets {
        self.targets
    }

    fn psi_bounds(&self) -> (f64, f64) {
        (0.0, self.psi_edge)
    }
}

/// Pressure-gradient bootstrap estimate for the synthetic equilibrium:
/// ⟨B·j_BS⟩ = -c √ε F dp/dψ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureGradientBootstrap {
    pub coefficient: f64,
}

impl Default for PressureGradientBootstrap {
    fn default() -> Self {
        Self { coefficient: 1.0 }
    }
}

impl BootstrapClosure for PressureGradientBootstrap {
    fn flux_avg_b_dot_jbs(&self, inputs: &BootstrapInputs<'_>) -> FusionResult<Array1<f64>> {
        let k = inputs.kinetic;
        let g = inputs.gradients;
        let dp_dpsi = (&k.te * &g.dne_dpsi
            + &k.ne * &g.dte_dpsi
            + &k.ti * &g.dni_dpsi
            + &k.ni * &g.dti_dpsi)
            * Q_ELECTRON;
        let sqrt_eps = inputs.epsilon.mapv(|e| e.max(0.0).sqrt());
        Ok(-self.coefficient * &sqrt_eps * inputs.f * &dp_dpsi)
    }
}
