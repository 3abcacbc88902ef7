// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Driver Integration Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! End-to-end runs of the convergence driver against the synthetic
//! circular equilibrium.
//!
//! Covers: current conservation through a full run, bootstrap pickup at
//! the pedestal, dynamo steering of q0 and exhaustion, and the failure paths.

use fusion_core::bootstrap::{BootstrapClosure, BootstrapInputs};
use fusion_core::driver::{ConvergenceDriver, DriverStatus};
use fusion_core::equilibrium::{
    EquilibriumSolver, FluxFunctions, SafetyFactorProfile, TrappedFractionProfile,
};
use fusion_core::flux::surface_integral;
use fusion_core::iteration::{profile_iteration_step, StepRequest};
use fusion_core::synthetic::{PressureGradientBootstrap, SyntheticEquilibrium, SyntheticParams};
use fusion_types::config::{DriverConfig, DynamoParams, RedistributionStrategy};
use fusion_types::error::{FusionError, FusionResult, SolveFailureReason, SolveStage};
use fusion_types::state::{KineticProfiles, Profile, Targets};
use ndarray::Array1;
use std::cell::Cell;
use std::f64::consts::PI;

const NPSI: usize = 101;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Closure that reports no bootstrap current.
struct NoBootstrap;

impl BootstrapClosure for NoBootstrap {
    fn flux_avg_b_dot_jbs(&self, inputs: &BootstrapInputs<'_>) -> FusionResult<Array1<f64>> {
        Ok(Array1::zeros(inputs.psi_norm.len()))
    }
}

fn psi_grid() -> Array1<f64> {
    Array1::linspace(0.0, 1.0, NPSI)
}

fn flat_kinetic() -> KineticProfiles {
    KineticProfiles {
        ne: Array1::from_elem(NPSI, 5.0e19),
        te: Array1::from_elem(NPSI, 1.0e3),
        ni: Array1::from_elem(NPSI, 5.0e19),
        ti: Array1::from_elem(NPSI, 1.0e3),
        zeff: Array1::from_elem(NPSI, 1.5),
    }
}

/// Core profile with a tanh pedestal at ψ_norm = 0.93.
fn hmode_kinetic() -> KineticProfiles {
    let psi = psi_grid();
    let pedestal = psi.mapv(|x| 0.5 * (1.0 - ((x - 0.93) / 0.025).tanh()));
    let core = psi.mapv(|x| 1.0 - 0.3 * x);
    let shape = &pedestal * &core;
    KineticProfiles {
        ne: shape.mapv(|s| 5.0e19 * (0.1 + s)),
        te: shape.mapv(|s| 3.0e3 * (0.02 + s)),
        ni: shape.mapv(|s| 4.5e19 * (0.1 + s)),
        ti: shape.mapv(|s| 3.0e3 * (0.02 + s)),
        zeff: Array1::from_elem(NPSI, 1.8),
    }
}

/// (1 - ψ) current density carrying `ip` on the unit-radius circle.
fn linear_current(ip: f64) -> Array1<f64> {
    psi_grid().mapv(|x| (1.0 - x) * ip / (0.5 * PI))
}

fn a_avg(solver: &SyntheticEquilibrium) -> Array1<f64> {
    solver.sauter_fc(NPSI).unwrap().a_avg
}

fn solver_with_ip(ip: f64) -> SyntheticEquilibrium {
    let params = SyntheticParams {
        ip,
        ..SyntheticParams::default()
    };
    let mut solver = SyntheticEquilibrium::new(params).unwrap();
    solver.set_targets(Targets::default().with_ip(ip), false);
    solver
}

/// Synthetic solver whose first q query after each solve fails.
struct FlakySafetyFactor {
    inner: SyntheticEquilibrium,
    fail_next_q: Cell<bool>,
}

impl EquilibriumSolver for FlakySafetyFactor {
    fn get_profiles(&self, npsi: usize) -> FusionResult<FluxFunctions> {
        self.inner.get_profiles(npsi)
    }

    fn get_q(&self, npsi: usize) -> FusionResult<SafetyFactorProfile> {
        if self.fail_next_q.replace(false) {
            return Err(FusionError::Precondition("q unavailable".to_string()));
        }
        self.inner.get_q(npsi)
    }

    fn sauter_fc(&self, npsi: usize) -> FusionResult<TrappedFractionProfile> {
        self.inner.sauter_fc(npsi)
    }

    fn set_profiles(&mut self, ffp: &Profile, pp: &Profile) -> FusionResult<()> {
        self.inner.set_profiles(ffp, pp)
    }

    fn solve(&mut self) -> i32 {
        self.fail_next_q.set(true);
        self.inner.solve()
    }

    fn set_targets(&mut self, targets: Targets, retain_previous: bool) {
        self.inner.set_targets(targets, retain_previous)
    }

    fn targets(&self) -> Targets {
        self.inner.targets()
    }

    fn psi_bounds(&self) -> (f64, f64) {
        self.inner.psi_bounds()
    }
}

// ── Plain Bootstrap Iteration ────────────────────────────────────────

#[test]
fn test_flat_pressure_run_conserves_current() {
    init_tracing();
    let mut solver = solver_with_ip(2.0e6);
    let config = DriverConfig {
        max_iterations: 1,
        ..DriverConfig::bootstrap()
    };
    let closure = NoBootstrap;
    let outcome = {
        let mut driver = ConvergenceDriver::new(&mut solver, Some(&closure), config).unwrap();
        driver.run(&flat_kinetic(), &linear_current(2.0e6)).unwrap()
    };

    assert!(outcome.is_converged(), "status {:?}", outcome.status);
    assert_eq!(outcome.iterations, 2);
    // L-mode init plus two main-loop steps.
    assert_eq!(outcome.q0_history.len(), 3);
    assert_eq!(solver.solve_count(), 3);

    let last = outcome.last.expect("last iteration result");
    let total = surface_integral(&last.j_total, &a_avg(&solver)).unwrap();
    assert!((total - 2.0e6).abs() < 1e-8 * 2.0e6, "total current {total}");
    assert!(last.j_bootstrap.unwrap().iter().all(|v| *v == 0.0));
    assert_eq!(last.ffp_prof.axis_value(), 1.0);
    assert_eq!(last.ffp_prof.edge_value(), 0.0);
    assert!(!last.redistributed);
}

#[test]
fn test_pedestal_drives_bootstrap_current() {
    init_tracing();
    let mut solver = solver_with_ip(2.0e6);
    let config = DriverConfig {
        max_iterations: 2,
        ..DriverConfig::bootstrap()
    };
    let closure = PressureGradientBootstrap::default();
    let kinetic = hmode_kinetic();
    let outcome = {
        let mut driver = ConvergenceDriver::new(&mut solver, Some(&closure), config).unwrap();
        driver.run(&kinetic, &linear_current(2.0e6)).unwrap()
    };

    assert!(outcome.is_converged(), "status {:?}", outcome.status);
    assert!((outcome.pressure_axis - kinetic.pressure()[0]).abs() < 1e-9);
    assert_eq!(solver.targets().pax(), Some(outcome.pressure_axis));

    let last = outcome.last.expect("last iteration result");
    let j_bs = last.j_bootstrap.clone().unwrap();
    let peak = j_bs
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
    assert!(peak.1 > 0.0, "no bootstrap current");
    let psi_peak = peak.0 as f64 / (NPSI - 1) as f64;
    assert!(psi_peak > 0.85 && psi_peak < 1.0, "bootstrap peak at psi = {psi_peak}");
    assert_eq!(j_bs[NPSI - 1], 0.0);

    let a = a_avg(&solver);
    let total = surface_integral(&last.j_total, &a).unwrap();
    assert!((total - 2.0e6).abs() < 1e-8 * 2.0e6, "total current {total}");
    let bootstrap = surface_integral(&j_bs, &a).unwrap();
    let inductive = surface_integral(&last.j_inductive, &a).unwrap();
    assert!((inductive - (2.0e6 - bootstrap)).abs() < 1e-8 * 2.0e6);
}

#[test]
fn test_plain_run_tolerates_missing_q0() {
    init_tracing();
    let mut solver = FlakySafetyFactor {
        inner: solver_with_ip(2.0e6),
        fail_next_q: Cell::new(false),
    };
    let config = DriverConfig {
        max_iterations: 1,
        initialize_eq: false,
        ..DriverConfig::bootstrap()
    };
    let outcome = {
        let mut driver =
            ConvergenceDriver::new(&mut solver, Some(&NoBootstrap), config).unwrap();
        driver.run(&flat_kinetic(), &linear_current(2.0e6)).unwrap()
    };
    assert!(outcome.is_converged(), "status {:?}", outcome.status);
    assert_eq!(outcome.iterations, 2);
    assert!(outcome.final_q0.is_none());
    assert_eq!(solver.inner.solve_count(), 2);
}

// ── Dynamo Redistribution ────────────────────────────────────────────

#[test]
fn test_dynamo_step_moves_q0_toward_target() {
    init_tracing();
    let ip = 2.3e6;
    let base = solver_with_ip(ip);
    assert!(base.q0() < 0.95, "q0 {}", base.q0());

    let plain_config = DriverConfig {
        smooth_inputs: false,
        rescale_ind_jtor_by_ftr: false,
        ..DriverConfig::bootstrap()
    };
    let dynamo_config = DriverConfig {
        smooth_inputs: false,
        ..DriverConfig::dynamo()
    };
    let q_target = dynamo_config.dynamo_params().unwrap().q_target;
    let kinetic = flat_kinetic();
    let pressure = kinetic.pressure();
    let j = linear_current(ip);
    let request = StepRequest::hmode(0, false, 0.2);

    let post_solve_q0 = |config: &DriverConfig| {
        let mut solver = base.clone();
        let step = profile_iteration_step(
            &solver,
            Some(&NoBootstrap),
            config,
            &kinetic,
            &pressure,
            &j,
            &request,
        )
        .unwrap();
        solver.set_profiles(&step.ffp_prof, &step.pp_prof).unwrap();
        assert_eq!(solver.solve(), 0);
        (step, solver.q0())
    };

    let (plain_step, q0_plain) = post_solve_q0(&plain_config);
    let (dynamo_step, q0_dynamo) = post_solve_q0(&dynamo_config);

    assert!(!plain_step.redistributed);
    assert!(dynamo_step.redistributed);
    let crossing = dynamo_step.crossing.expect("crossing location");
    assert!(crossing > 0.0 && crossing < 0.5, "crossing {crossing}");
    assert!(
        (q0_dynamo - q_target).abs() < (q0_plain - q_target).abs(),
        "dynamo q0 {q0_dynamo}, plain q0 {q0_plain}"
    );
}

#[test]
fn test_dynamo_run_closes_q0_gap() {
    init_tracing();
    let ip = 2.3e6;
    let mut solver = solver_with_ip(ip);
    let initial_q0 = solver.q0();
    let config = DriverConfig {
        smooth_inputs: false,
        initialize_eq: false,
        ..DriverConfig::dynamo()
    };
    let q_target = config.dynamo_params().unwrap().q_target;
    let outcome = {
        let mut driver =
            ConvergenceDriver::new(&mut solver, Some(&NoBootstrap), config).unwrap();
        driver.run(&flat_kinetic(), &linear_current(ip)).unwrap()
    };

    assert!(
        matches!(outcome.status, DriverStatus::Converged | DriverStatus::Exhausted),
        "status {:?}",
        outcome.status
    );
    assert_eq!(outcome.q0_history.len(), outcome.iterations);
    assert_eq!(outcome.crossing_history.len(), outcome.iterations);
    assert!(outcome.crossing_history[0].is_some());
    let final_q0 = outcome.final_q0.expect("final q0");
    assert!(
        (final_q0 - q_target).abs() < (initial_q0 - q_target).abs(),
        "final q0 {final_q0}, initial q0 {initial_q0}"
    );
}

#[test]
fn test_dynamo_run_exhausts_outside_exit_band() {
    init_tracing();
    let ip = 2.3e6;
    let mut solver = solver_with_ip(ip);
    let params = DynamoParams {
        exit_band: [5.0, 6.0],
        ..DynamoParams::default()
    };
    let config = DriverConfig {
        max_iterations: 0,
        smooth_inputs: false,
        initialize_eq: false,
        redistribution: RedistributionStrategy::Dynamo(params),
        ..DriverConfig::dynamo()
    };
    let outcome = {
        let mut driver =
            ConvergenceDriver::new(&mut solver, Some(&NoBootstrap), config).unwrap();
        driver.run(&flat_kinetic(), &linear_current(ip)).unwrap()
    };

    assert_eq!(outcome.status, DriverStatus::Exhausted);
    assert!(!outcome.is_converged());
    assert_eq!(outcome.iterations, 1);
    let final_q0 = outcome.final_q0.expect("final q0");
    assert!(final_q0 < 5.0, "q0 {final_q0}");
    assert_eq!(solver.solve_count(), 1);
}

#[test]
fn test_dynamo_config_file_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs/dynamo.json");
    let config = DriverConfig::from_file(path).unwrap();
    match config.redistribution {
        RedistributionStrategy::Dynamo(params) => {
            assert_eq!(params.q_target, 1.02);
            assert_eq!(params.exit_band, [1.02, 1.07]);
        }
        RedistributionStrategy::None => panic!("expected dynamo redistribution"),
    }
}

// ── Failure Paths ────────────────────────────────────────────────────

#[test]
fn test_missing_closure_is_reported() {
    init_tracing();
    let mut solver = solver_with_ip(2.0e6);
    let config = DriverConfig {
        initialize_eq: false,
        ..DriverConfig::bootstrap()
    };
    let mut driver = ConvergenceDriver::new(&mut solver, None, config).unwrap();
    let err = driver.run(&flat_kinetic(), &linear_current(2.0e6)).unwrap_err();
    assert!(matches!(err, FusionError::MissingDependency(_)), "{err}");
}

#[test]
fn test_lmode_solve_failure_is_an_error() {
    init_tracing();
    // A zero I_p target leaves the synthetic solve with no poloidal flux.
    let mut solver = solver_with_ip(2.0e6);
    solver.set_targets(Targets::default().with_ip(0.0), true);
    let mut driver =
        ConvergenceDriver::new(&mut solver, Some(&NoBootstrap), DriverConfig::bootstrap())
            .unwrap();
    let err = driver.run(&flat_kinetic(), &linear_current(2.0e6)).unwrap_err();
    match err {
        FusionError::SolveFailure {
            stage,
            code,
            reason,
        } => {
            assert_eq!(stage, SolveStage::LModeInit);
            assert_eq!(code, -2);
            assert_eq!(reason, SolveFailureReason::ZeroTotalFlux);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_main_loop_solve_failure_ends_run() {
    init_tracing();
    // Rescaling the inductive current to a zero target leaves no current.
    let mut solver = solver_with_ip(2.0e6);
    solver.set_targets(Targets::default().with_ip(0.0), true);
    let config = DriverConfig {
        initialize_eq: false,
        ..DriverConfig::bootstrap()
    };
    let outcome = {
        let mut driver =
            ConvergenceDriver::new(&mut solver, Some(&NoBootstrap), config).unwrap();
        driver.run(&flat_kinetic(), &linear_current(2.0e6)).unwrap()
    };
    assert_eq!(
        outcome.status,
        DriverStatus::Failed {
            code: -5,
            reason: SolveFailureReason::ToroidalCurrentTooLow,
        }
    );
    assert_eq!(outcome.iterations, 1);
    assert!(outcome.last.is_some());
    assert!(outcome.final_q0.is_none());
}

#[test]
fn test_mismatched_inputs_are_rejected() {
    let mut solver = solver_with_ip(2.0e6);
    let mut driver =
        ConvergenceDriver::new(&mut solver, Some(&NoBootstrap), DriverConfig::bootstrap())
            .unwrap();
    let short = Array1::from_elem(NPSI - 1, 1.0e6);
    let err = driver.run(&flat_kinetic(), &short).unwrap_err();
    assert!(matches!(err, FusionError::Precondition(_)), "{err}");
}
