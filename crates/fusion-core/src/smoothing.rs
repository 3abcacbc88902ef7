// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Profile Smoother
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Loose re-spline of a source profile on a sparse control grid.
//!
//! Removes the small discontinuities a bootstrap closure produces and keeps
//! the forced edge zero from introducing a kink at the separatrix.

use fusion_math::interp::linspace;
use fusion_math::spline::CubicSpline;
use fusion_types::config::SmoothingConfig;
use fusion_types::error::FusionResult;
use fusion_types::state::Profile;
use ndarray::Array1;

/// Control points between the core grid and the pedestal.
const TRANSITION_POINTS: usize = 10;

/// Fraction of the left margin covered by the transition points.
const TRANSITION_FRACTION: f64 = 0.9;

/// Uniform control points across the pedestal.
const PEDESTAL_POINTS: usize = 50;

/// Sparse control abscissae for `cfg` (without the optional (1, 0) anchor).
pub fn control_grid(cfg: &SmoothingConfig) -> Vec<f64> {
    let core_end = cfg.ped_spot - cfg.pedsepl;
    let endsep = if cfg.endzero { cfg.endsep } else { 0.0 };
    let ped_start = cfg.ped_spot + cfg.pedsepr;
    let ped_range = (1.0 - endsep) - ped_start;

    let mut grid = Vec::with_capacity(cfg.preped_grid + TRANSITION_POINTS + PEDESTAL_POINTS + 1);
    for i in 0..cfg.preped_grid {
        grid.push(i as f64 / (cfg.preped_grid - 1) as f64 * core_end);
    }
    for i in 0..TRANSITION_POINTS {
        let step = (i + 1) as f64 / TRANSITION_POINTS as f64;
        grid.push(core_end + step * TRANSITION_FRACTION * cfg.pedsepl);
    }
    for i in 0..PEDESTAL_POINTS {
        grid.push(ped_start + i as f64 / (PEDESTAL_POINTS - 1) as f64 * ped_range);
    }
    grid
}

/// Smooth `profile` and resample it on max(npts, N) uniform points over [0, 1].
pub fn smooth_profile(profile: &Profile, cfg: &SmoothingConfig) -> FusionResult<Profile> {
    let dense = CubicSpline::new(&profile.psi_norm().to_vec(), &profile.values().to_vec())?;

    let mut psi = control_grid(cfg);
    let mut values = dense.eval_many(&psi);
    if cfg.endzero {
        psi.push(1.0);
        values.push(0.0);
    }
    let sparse = CubicSpline::new(&psi, &values)?;

    let npts = cfg.npts.max(profile.len());
    let new_psi = linspace(0.0, 1.0, npts);
    let resampled = sparse.eval_many(&new_psi);
    Profile::new(Array1::from(new_psi), Array1::from(resampled))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize, a: f64, b: f64) -> Profile {
        let psi = Array1::linspace(0.0, 1.0, n);
        let vals = psi.mapv(|x| a + b * x);
        Profile::new(psi, vals).unwrap()
    }

    #[test]
    fn test_control_grid_is_increasing() {
        let grid = control_grid(&SmoothingConfig::default());
        assert_eq!(grid.len(), 20 + 10 + 50);
        assert!(grid.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(grid[0], 0.0);
        assert!((grid[grid.len() - 1] - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_line_through_zero_edge_is_reproduced() {
        let p = line(101, 2.0, -2.0);
        let out = smooth_profile(&p, &SmoothingConfig::default()).unwrap();
        assert_eq!(out.len(), 200);
        for (x, v) in out.psi_norm().iter().zip(out.values()) {
            assert!((v - (2.0 - 2.0 * x)).abs() < 1e-9, "S({x}) = {v}");
        }
    }

    #[test]
    fn test_line_without_endzero_is_reproduced() {
        let cfg = SmoothingConfig {
            endzero: false,
            ..SmoothingConfig::default()
        };
        let p = line(60, 1.0, 0.5);
        let out = smooth_profile(&p, &cfg).unwrap();
        for (x, v) in out.psi_norm().iter().zip(out.values()) {
            assert!((v - (1.0 + 0.5 * x)).abs() < 1e-9, "S({x}) = {v}");
        }
        assert!((out.edge_value() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_endzero_pins_edge() {
        let p = line(60, 1.0, 0.5);
        let out = smooth_profile(&p, &SmoothingConfig::default()).unwrap();
        assert!(out.edge_value().abs() < 1e-12);
    }

    #[test]
    fn test_keeps_resolution_of_dense_input() {
        let p = line(600, 1.0, -1.0);
        let cfg = SmoothingConfig {
            npts: 450,
            ..SmoothingConfig::default()
        };
        assert_eq!(smooth_profile(&p, &cfg).unwrap().len(), 600);
    }
}
