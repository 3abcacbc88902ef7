// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Core Current Redistribution
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Heuristic "dynamo" that moves inductive current out of the q < 1 core.
//!
//! Current is subtracted around the axis and deposited just outside the
//! q = q_target surface and in the bulk at ρ = 0.5, which lifts q on axis.
//! Amplitudes scale with the q0 offset and with the average current
//! density inside the crossing. This is a profile-shaping device, not a
//! model of sawtooth dynamics.

use crate::crossing::{find_psi_crossing, CrossingResult};
use crate::flux::{rescale_current, surface_integral};
use fusion_math::bspline::BSpline;
use fusion_types::config::DynamoParams;
use fusion_types::error::FusionResult;
use fusion_types::state::FluxGeometry;
use ndarray::Array1;
use std::f64::consts::PI;
use tracing::{debug, info, warn};

/// Outside deposit sits at √x + OUTSIDE_STEP_BASE + OUTSIDE_STEP_SLOPE·min(x, CROSSING_CAP).
const OUTSIDE_STEP_BASE: f64 = 0.08;
const OUTSIDE_STEP_SLOPE: f64 = 0.4;
const CROSSING_CAP: f64 = 0.2;

/// Radius of the disc used for the average current density: min(√x + pad, cap).
const DENSITY_RADIUS_PAD: f64 = 0.15;
const DENSITY_RADIUS_CAP: f64 = 0.8;

/// Gaussian widths in ρ.
const ADD_WIDTH_PAD: f64 = 0.1;
const BULK_WIDTH: f64 = 0.3;
const SUBTRACT_WIDTH_CAP: f64 = 0.15;
const SUBTRACT_WIDTH_PAD: f64 = 0.1;

/// Bulk deposit centre in ρ.
const BULK_CENTER: f64 = 0.5;

/// Bulk weight ramps as (BULK_RAMP_OFFSET + iteration) / BULK_RAMP_SCALE.
const BULK_RAMP_OFFSET: f64 = 5.0;
const BULK_RAMP_SCALE: f64 = 30.0;

/// Spline degree used to find inboard current maxima.
const INBOARD_SPLINE_DEGREE: usize = 4;

/// What the redistributor did on this call.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamoDecision {
    /// q0 offset inside the trigger band; current untouched.
    WithinBand,
    /// Redistribution needed but no usable crossing (q0 below target).
    Skipped(CrossingResult),
    /// Current was reshaped around `location`. `found` is false when the
    /// previous location was reused.
    Applied { location: f64, found: bool },
}

#[derive(Debug, Clone)]
pub struct DynamoOutcome {
    pub j_inductive: Array1<f64>,
    pub decision: DynamoDecision,
}

impl DynamoOutcome {
    pub fn applied(&self) -> bool {
        matches!(self.decision, DynamoDecision::Applied { .. })
    }

    /// Crossing location used, if the current was reshaped.
    pub fn location(&self) -> Option<f64> {
        match self.decision {
            DynamoDecision::Applied { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// Normalized Gaussian 1/(√(2π)σ) exp(-((x-μ)/σ)²/2).
pub fn gaussian(x: f64, mu: f64, sigma: f64) -> f64 {
    let z = (x - mu) / sigma;
    (-0.5 * z * z).exp() / ((2.0 * PI).sqrt() * sigma)
}

/// Redistribute the inductive current for one iteration.
///
/// `last_location` is reused when q0 is above target and no crossing
/// exists. `inductive_target` is I_p - I_BS when an I_p target is active;
/// the reshaped current is rescaled to it.
pub fn redistribute(
    params: &DynamoParams,
    geometry: &FluxGeometry,
    j_inductive: &Array1<f64>,
    j_bootstrap: &Array1<f64>,
    iteration: usize,
    last_location: f64,
    inductive_target: Option<f64>,
) -> FusionResult<DynamoOutcome> {
    let q0 = geometry.q0();
    let mut q_offset = q0 - params.q_target;
    if q_offset >= params.trigger_band[0] && q_offset <= params.trigger_band[1] {
        debug!("q0 = {:.4} inside trigger band, no redistribution", q0);
        return Ok(DynamoOutcome {
            j_inductive: j_inductive.clone(),
            decision: DynamoDecision::WithinBand,
        });
    }
    if q_offset > 0.0 {
        q_offset *= params.positive_offset_damping;
    }

    let psi = &geometry.psi_norm;
    let crossing = find_psi_crossing(psi, &geometry.q, params.q_target)?;
    let (location, nearest, found) = match crossing.found() {
        Some(c) => {
            info!("q0 = {:.4}, q = {} surface at psi = {:.4}", q0, params.q_target, c.psi);
            (c.psi, Some(c.nearest_index), true)
        }
        None if q_offset < 0.0 => {
            warn!(
                "q0 = {:.4} below target but crossing unusable ({:?}), skipping redistribution",
                q0, crossing
            );
            return Ok(DynamoOutcome {
                j_inductive: j_inductive.clone(),
                decision: DynamoDecision::Skipped(crossing),
            });
        }
        None => {
            info!(
                "q0 = {:.4} above target, reusing last crossing psi = {:.4}",
                q0, last_location
            );
            (last_location, None, false)
        }
    };

    let rho = psi.mapv(f64::sqrt);
    let j_total = j_inductive + j_bootstrap;
    let total_current = surface_integral(&j_total, &rho)?;
    let disc_radius = (location.sqrt() + DENSITY_RADIUS_PAD).min(DENSITY_RADIUS_CAP);
    let avg_density = total_current / (PI * disc_radius * disc_radius);
    let drive = (-q_offset + params.q_offset_floor) * avg_density;

    let outside_step = OUTSIDE_STEP_BASE + OUTSIDE_STEP_SLOPE * location.min(CROSSING_CAP);
    let add_center = location.sqrt() + outside_step;
    let add_width = location.min(CROSSING_CAP) + ADD_WIDTH_PAD;
    let subtract_width = location.min(SUBTRACT_WIDTH_CAP) + SUBTRACT_WIDTH_PAD;

    let [w_add, w_bulk, w_subtract] = params.weights;
    let add_amp = w_add * drive;
    let bulk_amp = w_bulk * ((BULK_RAMP_OFFSET + iteration as f64) / BULK_RAMP_SCALE) * drive;
    let subtract_amp = w_subtract * location * drive;
    debug!(
        "dynamo drive = {:.4e}, add = {:.4e}, bulk = {:.4e}, subtract = {:.4e}",
        drive, add_amp, bulk_amp, subtract_amp
    );

    let mut j: Array1<f64> = j_inductive
        .iter()
        .zip(rho.iter())
        .map(|(&jv, &r)| {
            jv - subtract_amp * gaussian(r, 0.0, subtract_width)
                + add_amp * gaussian(r, add_center, add_width)
                + bulk_amp * gaussian(r, BULK_CENTER, BULK_WIDTH)
        })
        .collect();

    // Samples inside the crossing are floored at the unperturbed j[i_near].
    if let Some(i_near) = nearest {
        let floor = j_inductive[i_near];
        for v in j.iter_mut().take(i_near) {
            if *v < floor {
                *v = floor;
            }
        }
    }

    damp_inboard_maximum(&mut j, psi, params)?;

    if let Some(target) = inductive_target {
        let (scaled, factor) = rescale_current(&j, &geometry.a_avg, target)?;
        debug!("dynamo inductive rescale factor = {:.6}", factor);
        j = scaled;
    }

    Ok(DynamoOutcome {
        j_inductive: j,
        decision: DynamoDecision::Applied { location, found },
    })
}

/// Pull samples inside the first local current maximum below
/// `inboard_limit` toward the spline value at that maximum.
fn damp_inboard_maximum(
    j: &mut Array1<f64>,
    psi: &Array1<f64>,
    params: &DynamoParams,
) -> FusionResult<()> {
    let x = psi.to_vec();
    let spline = BSpline::interpolate(&x, &j.to_vec(), INBOARD_SPLINE_DEGREE)?;
    let slope = spline.derivative()?;
    let curvature = slope.derivative()?;
    let first_max = slope
        .roots()
        .into_iter()
        .find(|&r| r < params.inboard_limit && curvature.eval(r) < 0.0);

    if let Some(psi_max) = first_max {
        let peak = spline.eval(psi_max);
        debug!("damping inboard current maximum at psi = {:.4}", psi_max);
        for (v, &p) in j.iter_mut().zip(psi.iter()) {
            if p < psi_max {
                *v -= params.inboard_damping * (*v - peak);
            }
        }
    }
    Ok(())
}
