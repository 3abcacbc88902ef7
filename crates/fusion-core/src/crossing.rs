// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Flux-Surface Crossing Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Locate the flux surface where q(ψ) crosses a target value.

use fusion_math::spline::CubicSpline;
use fusion_types::error::FusionResult;
use ndarray::Array1;

/// Two roots further apart than this are treated as separate crossings.
const ROOT_SEPARATION: f64 = 0.3;

/// A double crossing is only rejected when q dips this far below target.
const DEEP_DIP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsiCrossing {
    /// ψ_norm of the crossing.
    pub psi: f64,
    /// Grid index with the smallest |q - q_target|.
    pub nearest_index: usize,
}

/// Outcome of a crossing search. Only `Found` carries a usable location.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossingResult {
    Found(PsiCrossing),
    /// q > q_target everywhere.
    AlreadyAbove,
    /// q on axis is too far above target for a monotone profile.
    HollowProfile,
    /// q dips below target but no root lies strictly inside (0, 1).
    NoRoot,
    /// Crossings that are too many or too far apart to pick one.
    MultipleCrossings { roots: Vec<f64> },
}

impl CrossingResult {
    pub fn found(&self) -> Option<PsiCrossing> {
        match self {
            CrossingResult::Found(c) => Some(*c),
            _ => None,
        }
    }
}

/// Find ψ where q(ψ) = q_target.
///
/// With d = q - q_target: min d > 0 is `AlreadyAbove`; d(0) > q_target is
/// `HollowProfile`; an exact zero at the grid point nearest the target is
/// returned directly; otherwise the roots of a cubic spline through d are
/// filtered to (0, 1). One root is taken as is. Two roots are rejected
/// when they are more than 0.3 apart and q dips more than 0.1 below
/// target, else the outer one is used. Three roots are rejected when the
/// outer pair is more than 0.3 apart, else the outermost is used.
pub fn find_psi_crossing(
    psi: &Array1<f64>,
    q: &Array1<f64>,
    q_target: f64,
) -> FusionResult<CrossingResult> {
    let d: Vec<f64> = q.iter().map(|v| v - q_target).collect();
    let min_d = d.iter().cloned().fold(f64::INFINITY, f64::min);
    let nearest_index = argmin_abs(&d);

    if min_d > 0.0 {
        return Ok(CrossingResult::AlreadyAbove);
    }
    if d[0] > q_target {
        return Ok(CrossingResult::HollowProfile);
    }
    if d[nearest_index] == 0.0 {
        return Ok(CrossingResult::Found(PsiCrossing {
            psi: psi[nearest_index],
            nearest_index,
        }));
    }

    let spline = CubicSpline::new(&psi.to_vec(), &d)?;
    let roots: Vec<f64> = spline
        .roots()
        .into_iter()
        .filter(|r| *r > 0.0 && *r < 1.0)
        .collect();

    let chosen = match roots.as_slice() {
        [] => return Ok(CrossingResult::NoRoot),
        [only] => *only,
        [first, second] => {
            let q_min = min_d + q_target;
            if second - first > ROOT_SEPARATION && q_min < q_target - DEEP_DIP {
                return Ok(CrossingResult::MultipleCrossings { roots });
            }
            *second
        }
        [first, _, third] => {
            if third - first > ROOT_SEPARATION {
                return Ok(CrossingResult::MultipleCrossings { roots });
            }
            *third
        }
        _ => return Ok(CrossingResult::MultipleCrossings { roots }),
    };

    Ok(CrossingResult::Found(PsiCrossing {
        psi: chosen,
        nearest_index,
    }))
}

fn argmin_abs(d: &[f64]) -> usize {
    d.iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best_i, best), (i, v)| {
            if v.abs() < best {
                (i, v.abs())
            } else {
                (best_i, best)
            }
        })
        .0
}
