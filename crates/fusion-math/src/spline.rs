// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Cubic Spline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Interpolating cubic spline with not-a-knot end conditions.
//!
//! Stored as knot values plus second derivatives M_i. On interval i with
//! t = x - x_i, h = x_{i+1} - x_i:
//!   S(t) = y_i + b_i t + M_i t²/2 + (M_{i+1} - M_i) t³ / (6h)
//!   b_i  = (y_{i+1} - y_i)/h - h (2 M_i + M_{i+1}) / 6
//!
//! Not-a-knot makes the third derivative continuous across x_1 and
//! x_{n-2}; the two extra equations are eliminated into the first and last
//! interior rows so the system stays tridiagonal.

use crate::tridiag::thomas_solve;
use fusion_types::error::{FusionError, FusionResult};

/// Critical values this close to zero, relative to max |y|, are roots.
const TANGENT_TOLERANCE: f64 = 1e-12;

/// Bisection steps per bracketed root.
const ROOT_BISECTION_STEPS: usize = 80;

#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit through `(x, y)`. `x` must be strictly increasing with at least
    /// two points. Two points give a line, three a parabola.
    pub fn new(x: &[f64], y: &[f64]) -> FusionResult<Self> {
        let n = x.len();
        if n < 2 {
            return Err(FusionError::Precondition(format!(
                "cubic spline needs at least 2 points, got {n}"
            )));
        }
        if y.len() != n {
            return Err(FusionError::Precondition(format!(
                "cubic spline x has {n} points but y has {}",
                y.len()
            )));
        }
        for i in 1..n {
            if !(x[i] > x[i - 1]) {
                return Err(FusionError::Precondition(format!(
                    "cubic spline abscissae must be strictly increasing at index {i}"
                )));
            }
        }

        let m = match n {
            2 => vec![0.0; 2],
            3 => {
                let h0 = x[1] - x[0];
                let h1 = x[2] - x[1];
                let d0 = (y[1] - y[0]) / h0;
                let d1 = (y[2] - y[1]) / h1;
                vec![2.0 * (d1 - d0) / (h0 + h1); 3]
            }
            _ => not_a_knot_second_derivatives(x, y)?,
        };

        Ok(CubicSpline {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Interval index containing `x`; outside points use the end intervals.
    fn interval(&self, x: f64) -> usize {
        let n = self.x.len();
        let idx = self.x.partition_point(|&xi| xi <= x);
        idx.saturating_sub(1).min(n - 2)
    }

    /// Cubic coefficients [c0, c1, c2, c3] of interval `i` in t = x - x_i.
    fn coefficients(&self, i: usize) -> [f64; 4] {
        let h = self.x[i + 1] - self.x[i];
        let slope = (self.y[i + 1] - self.y[i]) / h;
        let b = slope - h * (2.0 * self.m[i] + self.m[i + 1]) / 6.0;
        [
            self.y[i],
            b,
            0.5 * self.m[i],
            (self.m[i + 1] - self.m[i]) / (6.0 * h),
        ]
    }

    /// Value at `x` (end polynomials are extended outside the domain).
    pub fn eval(&self, x: f64) -> f64 {
        let i = self.interval(x);
        let [c0, c1, c2, c3] = self.coefficients(i);
        let t = x - self.x[i];
        c0 + t * (c1 + t * (c2 + t * c3))
    }

    /// First derivative at `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        let i = self.interval(x);
        let [_, c1, c2, c3] = self.coefficients(i);
        let t = x - self.x[i];
        c1 + t * (2.0 * c2 + 3.0 * t * c3)
    }

    /// Second derivative at `x`.
    pub fn second_derivative(&self, x: f64) -> f64 {
        let i = self.interval(x);
        let [_, _, c2, c3] = self.coefficients(i);
        let t = x - self.x[i];
        2.0 * c2 + 6.0 * t * c3
    }

    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }

    /// ∫_a^b S(x) dx. Extrapolation is disabled: both limits must lie in
    /// the sampled domain.
    pub fn integrate(&self, a: f64, b: f64) -> FusionResult<f64> {
        let (lo, hi) = self.domain();
        for limit in [a, b] {
            if !(lo..=hi).contains(&limit) {
                return Err(FusionError::Precondition(format!(
                    "spline integration limit {limit} outside sampled domain [{lo}, {hi}]"
                )));
            }
        }
        if a > b {
            return Ok(-self.integrate(b, a)?);
        }
        Ok(self.antiderivative(b) - self.antiderivative(a))
    }

    /// ∫_{x_0}^{x} S for x inside the domain.
    fn antiderivative(&self, x: f64) -> f64 {
        let i = self.interval(x);
        let mut total = 0.0;
        for k in 0..i {
            total += interval_integral(self.coefficients(k), self.x[k + 1] - self.x[k]);
        }
        total + interval_integral(self.coefficients(i), x - self.x[i])
    }

    /// Real roots inside the sampled domain, ascending.
    ///
    /// Each interval is split at the critical points of its cubic into
    /// monotone pieces, and every sign change is refined by bisection.
    /// A critical value within `TANGENT_TOLERANCE` of zero (relative to
    /// the largest knot value) is a tangential root and reported once.
    pub fn roots(&self) -> Vec<f64> {
        let scale = self.y.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let tol = TANGENT_TOLERANCE * scale;
        let mut roots: Vec<f64> = Vec::new();
        let last = self.x.len() - 2;
        for i in 0..=last {
            let coefs = self.coefficients(i);
            let h = self.x[i + 1] - self.x[i];
            let poly = |t: f64| coefs[0] + t * (coefs[1] + t * (coefs[2] + t * coefs[3]));

            let mut breaks = vec![0.0];
            breaks.extend(critical_points(coefs, h));
            breaks.push(h);
            let mut values: Vec<f64> = breaks.iter().map(|&t| poly(t)).collect();
            let interior = values.len() - 1;
            for v in values.iter_mut().take(interior).skip(1) {
                if v.abs() <= tol {
                    *v = 0.0;
                }
            }

            for k in 0..breaks.len() - 1 {
                let (t_a, f_a) = (breaks[k], values[k]);
                let (t_b, f_b) = (breaks[k + 1], values[k + 1]);
                if f_a == 0.0 {
                    push_root(&mut roots, self.x[i] + t_a);
                } else if f_a * f_b < 0.0 {
                    push_root(&mut roots, self.x[i] + bisect(&poly, t_a, t_b, f_a));
                }
            }
            if i == last && values[values.len() - 1] == 0.0 {
                push_root(&mut roots, self.x[i + 1]);
            }
        }
        roots
    }
}

/// Zeros of c1 + 2 c2 t + 3 c3 t² strictly inside (0, h), ascending.
fn critical_points(c: [f64; 4], h: f64) -> Vec<f64> {
    let (a, b, k) = (3.0 * c[3], 2.0 * c[2], c[1]);
    let mut out = Vec::with_capacity(2);
    if a == 0.0 {
        if b != 0.0 {
            out.push(-k / b);
        }
    } else {
        let disc = b * b - 4.0 * a * k;
        if disc >= 0.0 {
            let q = -0.5 * (b + b.signum() * disc.sqrt());
            if q != 0.0 {
                out.push(q / a);
                out.push(k / q);
            } else {
                out.push(0.0);
            }
        }
    }
    out.retain(|t| *t > 0.0 && *t < h && t.is_finite());
    out.sort_by(|x, y| x.total_cmp(y));
    out.dedup();
    out
}

fn interval_integral(c: [f64; 4], t: f64) -> f64 {
    t * (c[0] + t * (c[1] / 2.0 + t * (c[2] / 3.0 + t * c[3] / 4.0)))
}

pub(crate) fn push_root(roots: &mut Vec<f64>, root: f64) {
    match roots.last() {
        Some(&last) if (root - last).abs() <= 1e-12 * root.abs().max(1.0) => {}
        _ => roots.push(root),
    }
}

/// Bisection on a bracket with f(lo) = f_lo and a sign change inside.
pub(crate) fn bisect<F: Fn(f64) -> f64>(f: &F, mut lo: f64, mut hi: f64, mut f_lo: f64) -> f64 {
    for _ in 0..ROOT_BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 {
            return mid;
        }
        if f_lo * f_mid < 0.0 {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }
    0.5 * (lo + hi)
}

/// Second derivatives for n >= 4 points with not-a-knot ends.
fn not_a_knot_second_derivatives(x: &[f64], y: &[f64]) -> FusionResult<Vec<f64>> {
    let n = x.len();
    let h: Vec<f64> = (0..n - 1).map(|i| x[i + 1] - x[i]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    // Unknowns M_1 .. M_{n-2}
    let k = n - 2;
    let mut sub = vec![0.0; k];
    let mut diag = vec![0.0; k];
    let mut sup = vec![0.0; k];
    let mut rhs = vec![0.0; k];

    for j in 0..k {
        let i = j + 1;
        sub[j] = h[i - 1];
        diag[j] = 2.0 * (h[i - 1] + h[i]);
        sup[j] = h[i];
        rhs[j] = 6.0 * (delta[i] - delta[i - 1]);
    }

    // M_0 = ((h0 + h1) M_1 - h0 M_2) / h1
    let (h0, h1) = (h[0], h[1]);
    diag[0] = (h0 + h1) * (2.0 + h0 / h1);
    sup[0] = h1 - h0 * h0 / h1;
    sub[0] = 0.0;

    // M_{n-1} = ((h_{n-3} + h_{n-2}) M_{n-2} - h_{n-2} M_{n-3}) / h_{n-3}
    let (ha, hb) = (h[n - 3], h[n - 2]);
    diag[k - 1] = (ha + hb) * (2.0 + hb / ha);
    sub[k - 1] = ha - hb * hb / ha;
    sup[k - 1] = 0.0;

    let inner = if k == 2 {
        // Both end rows were rewritten; fix up the coupling terms.
        let det = diag[0] * diag[1] - sup[0] * sub[1];
        if det.abs() < 1e-300 {
            return Err(FusionError::LinAlg(
                "singular not-a-knot system for 4 points".to_string(),
            ));
        }
        vec![
            (rhs[0] * diag[1] - sup[0] * rhs[1]) / det,
            (diag[0] * rhs[1] - sub[1] * rhs[0]) / det,
        ]
    } else {
        thomas_solve(&sub, &diag, &sup, &rhs)?
    };

    let mut m = vec![0.0; n];
    m[1..n - 1].copy_from_slice(&inner);
    m[0] = ((h0 + h1) * m[1] - h0 * m[2]) / h1;
    m[n - 1] = ((ha + hb) * m[n - 2] - hb * m[n - 3]) / ha;
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| a + (b - a) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn test_reproduces_cubic_exactly() {
        // Not-a-knot reproduces any cubic, even on a non-uniform grid.
        let x = vec![0.0, 0.1, 0.25, 0.5, 0.6, 0.9, 1.0];
        let f = |t: f64| 2.0 - 3.0 * t + 0.5 * t * t + 4.0 * t * t * t;
        let y: Vec<f64> = x.iter().map(|&t| f(t)).collect();
        let s = CubicSpline::new(&x, &y).unwrap();
        for t in linspace(0.0, 1.0, 37) {
            assert!((s.eval(t) - f(t)).abs() < 1e-10, "S({t}) = {}", s.eval(t));
            let df = -3.0 + t + 12.0 * t * t;
            assert!((s.derivative(t) - df).abs() < 1e-9, "S'({t})");
            assert!((s.second_derivative(t) - (1.0 + 24.0 * t)).abs() < 1e-8);
        }
    }

    #[test]
    fn test_four_points_is_single_cubic() {
        let x = vec![0.0, 0.3, 0.7, 1.0];
        let f = |t: f64| t * t * t - t;
        let y: Vec<f64> = x.iter().map(|&t| f(t)).collect();
        let s = CubicSpline::new(&x, &y).unwrap();
        assert!((s.eval(0.5) - f(0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_small_point_counts() {
        let s = CubicSpline::new(&[0.0, 1.0], &[1.0, 3.0]).unwrap();
        assert!((s.eval(0.25) - 1.5).abs() < 1e-14);
        let s = CubicSpline::new(&[0.0, 0.5, 1.0], &[0.0, 0.25, 1.0]).unwrap();
        assert!((s.eval(0.3) - 0.09).abs() < 1e-14);
    }

    #[test]
    fn test_integral_of_polynomial() {
        let x = linspace(0.0, 2.0, 11);
        let y: Vec<f64> = x.iter().map(|&t| t * t).collect();
        let s = CubicSpline::new(&x, &y).unwrap();
        let integral = s.integrate(0.0, 2.0).unwrap();
        assert!((integral - 8.0 / 3.0).abs() < 1e-12, "∫x² = {integral}");
        let partial = s.integrate(0.5, 1.5).unwrap();
        assert!((partial - (1.5f64.powi(3) - 0.5f64.powi(3)) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_integration_refuses_extrapolation() {
        let x = linspace(0.0, 1.0, 6);
        let s = CubicSpline::new(&x, &x).unwrap();
        assert!(s.integrate(0.0, 1.1).is_err());
        assert!(s.integrate(-0.1, 1.0).is_err());
    }

    #[test]
    fn test_roots_of_linear_and_cubic() {
        let x = linspace(0.0, 1.0, 51);
        let y: Vec<f64> = x.iter().map(|&t| 0.98 - t).collect();
        let roots = CubicSpline::new(&x, &y).unwrap().roots();
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 0.98).abs() < 1e-10);

        let y: Vec<f64> = x
            .iter()
            .map(|&t| (t - 0.2) * (t - 0.45) * (t - 0.83))
            .collect();
        let roots = CubicSpline::new(&x, &y).unwrap().roots();
        assert_eq!(roots.len(), 3, "{roots:?}");
        for (r, e) in roots.iter().zip([0.2, 0.45, 0.83]) {
            assert!((r - e).abs() < 1e-8, "root {r} vs {e}");
        }
    }

    #[test]
    fn test_tangential_root_is_reported() {
        let x = linspace(0.0, 1.0, 101);
        let y: Vec<f64> = x.iter().map(|&t| (t - 0.373) * (t - 0.373)).collect();
        let roots = CubicSpline::new(&x, &y).unwrap().roots();
        assert_eq!(roots.len(), 1, "{roots:?}");
        assert!((roots[0] - 0.373).abs() < 1e-9, "root {}", roots[0]);

        // Double root next to a simple one.
        let y: Vec<f64> = x
            .iter()
            .map(|&t| 5.0 * (t - 0.605) * (t - 0.253) * (t - 0.253))
            .collect();
        let roots = CubicSpline::new(&x, &y).unwrap().roots();
        assert_eq!(roots.len(), 2, "{roots:?}");
        assert!((roots[0] - 0.253).abs() < 1e-9);
        assert!((roots[1] - 0.605).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(CubicSpline::new(&[0.0], &[1.0]).is_err());
        assert!(CubicSpline::new(&[0.0, 1.0], &[1.0]).is_err());
        assert!(CubicSpline::new(&[0.0, 0.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
    }
}
