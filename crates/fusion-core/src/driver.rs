// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Convergence Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Outer loop: iterate profile updates and equilibrium solves.
//!
//! INIT → (L-mode init) → ITERATING → {Converged, Failed, Exhausted}.
//!
//! The plain bootstrap variant runs max_iterations + 1 solves and reports
//! convergence. The dynamo variant stops early once post-solve q0 enters
//! the exit band and reports `Exhausted` if it never does.

use crate::bootstrap::BootstrapClosure;
use crate::equilibrium::EquilibriumSolver;
use crate::iteration::{profile_iteration_step, StepRequest};
use crate::lmode::flatten_pedestal;
use fusion_types::config::{DriverConfig, DynamoParams};
use fusion_types::error::{FusionError, FusionResult, SolveFailureReason, SolveStage};
use fusion_types::state::{IterationResult, KineticProfiles, Targets};
use ndarray::Array1;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverStatus {
    Converged,
    /// A main-loop solve returned a negative code.
    Failed {
        code: i32,
        reason: SolveFailureReason,
    },
    /// Dynamo variant ran out of iterations without q0 entering the exit band.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct DriverOutcome {
    pub status: DriverStatus,
    /// Main-loop solves attempted.
    pub iterations: usize,
    /// Result of the last profile update, including a failed iteration's.
    pub last: Option<IterationResult>,
    /// Axis pressure pushed as the `pax` target [Pa].
    pub pressure_axis: f64,
    /// q0 seen by each step (L-mode init first, when enabled).
    pub q0_history: Vec<f64>,
    /// Crossing location used by each step, if any.
    pub crossing_history: Vec<Option<f64>>,
    /// Post-solve q0 of the last successful solve.
    pub final_q0: Option<f64>,
}

impl DriverOutcome {
    pub fn is_converged(&self) -> bool {
        self.status == DriverStatus::Converged
    }
}

/// Drives one solver through the bootstrap iteration.
///
/// The solver is borrowed mutably for the driver's lifetime.
pub struct ConvergenceDriver<'a, S: EquilibriumSolver + ?Sized> {
    solver: &'a mut S,
    closure: Option<&'a dyn BootstrapClosure>,
    config: DriverConfig,
}

impl<'a, S: EquilibriumSolver + ?Sized> ConvergenceDriver<'a, S> {
    pub fn new(
        solver: &'a mut S,
        closure: Option<&'a dyn BootstrapClosure>,
        config: DriverConfig,
    ) -> FusionResult<Self> {
        config.validate()?;
        Ok(ConvergenceDriver {
            solver,
            closure,
            config,
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn solver(&self) -> &S {
        self.solver
    }

    /// Run the iteration from kinetic profiles and an inductive current,
    /// all sampled on the same uniform ψ_norm grid.
    ///
    /// A failed L-mode initialisation solve is returned as
    /// `Err(SolveFailure)`. A failed main-loop solve ends the run with
    /// `DriverStatus::Failed` and the partial results.
    pub fn run(
        &mut self,
        kinetic: &KineticProfiles,
        j_inductive: &Array1<f64>,
    ) -> FusionResult<DriverOutcome> {
        let npsi = j_inductive.len();
        kinetic.validate(npsi)?;
        if let Some(i) = j_inductive.iter().position(|v| !v.is_finite()) {
            return Err(FusionError::Precondition(format!(
                "inductive current is non-finite at index {i}"
            )));
        }
        let psi_norm = Array1::linspace(0.0, 1.0, npsi);
        let pressure = kinetic.pressure();
        let pressure_axis = pressure[0];
        self.solver
            .set_targets(Targets::default().with_pax(pressure_axis), true);

        let dynamo = self.config.dynamo_params().copied();
        let mut last_crossing = dynamo
            .map(|p| p.fallback_crossing)
            .unwrap_or(DynamoParams::default().fallback_crossing);
        let mut rescale_by_ftr = self.config.rescale_ind_jtor_by_ftr;
        let mut j_ind = j_inductive.clone();
        let mut q0_history = Vec::new();
        let mut crossing_history = Vec::new();

        if self.config.initialize_eq {
            info!("initialising equilibrium with pedestal removed");
            let lmode = flatten_pedestal(&psi_norm, kinetic)?;
            let lmode_pressure = lmode.pressure();
            let step = profile_iteration_step(
                &*self.solver,
                self.closure,
                &self.config,
                &lmode,
                &lmode_pressure,
                &j_ind,
                &StepRequest::lmode(rescale_by_ftr, last_crossing),
            )?;
            q0_history.push(step.q0);
            crossing_history.push(step.crossing);
            j_ind = step.j_inductive.clone();
            self.solver.set_profiles(&step.ffp_prof, &step.pp_prof)?;
            let code = self.solver.solve();
            if let Some(reason) = SolveFailureReason::from_code(code) {
                warn!("equilibrium solve failed at initialisation: {}", reason);
                return Err(FusionError::SolveFailure {
                    stage: SolveStage::LModeInit,
                    code,
                    reason,
                });
            }
            rescale_by_ftr = false;
        }

        let bound = self.config.max_iterations;
        let mut n = 0;
        let mut last;
        let mut final_q0 = None;
        info!("iterating on H-mode equilibrium");
        let status = loop {
            if n > bound + 1 {
                return Err(FusionError::LogicContractViolation {
                    iteration: n,
                    bound: bound + 1,
                });
            }
            info!("iteration {}", n);
            let step = profile_iteration_step(
                &*self.solver,
                self.closure,
                &self.config,
                kinetic,
                &pressure,
                &j_ind,
                &StepRequest::hmode(n, rescale_by_ftr, last_crossing),
            )?;
            q0_history.push(step.q0);
            crossing_history.push(step.crossing);
            if let Some(location) = step.crossing {
                last_crossing = location;
            }
            j_ind = step.j_inductive.clone();
            self.solver.set_profiles(&step.ffp_prof, &step.pp_prof)?;
            let code = self.solver.solve();
            last = Some(step);
            rescale_by_ftr = false;
            n += 1;

            if let Some(reason) = SolveFailureReason::from_code(code) {
                warn!("equilibrium solve failed at iteration {}: {}", n - 1, reason);
                break DriverStatus::Failed { code, reason };
            }

            if let Some(params) = &dynamo {
                let q0 = self.solver.get_q(npsi)?.q[0];
                final_q0 = Some(q0);
                let [lo, hi] = params.exit_band;
                if q0 >= lo && q0 <= hi {
                    info!("q0 = {:.4} inside exit band after {} iterations", q0, n);
                    break DriverStatus::Converged;
                }
                if n > bound {
                    warn!("q0 = {:.4} still outside exit band after {} iterations", q0, n);
                    break DriverStatus::Exhausted;
                }
            } else {
                // q0 is only reported here; a failed query does not end the run.
                final_q0 = match self.solver.get_q(npsi) {
                    Ok(profile) => Some(profile.q[0]),
                    Err(e) => {
                        debug!("q0 unavailable after iteration {}: {}", n - 1, e);
                        None
                    }
                };
                if n > bound {
                    break DriverStatus::Converged;
                }
            }
        };

        Ok(DriverOutcome {
            status,
            iterations: n,
            last,
            pressure_axis,
            q0_history,
            crossing_history,
            final_q0,
        })
    }
}
