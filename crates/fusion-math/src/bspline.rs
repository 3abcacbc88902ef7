// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Interpolating B-Spline
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Interpolating B-spline of arbitrary degree.
//!
//! Knot placement follows the FITPACK interpolation (s = 0) rule: k+1
//! repeated knots at each end, interior knots on data points for odd
//! degree and on midpoints between data points for even degree. For k = 3
//! this is the not-a-knot cubic.
//!
//! Evaluation uses the Cox–de Boor recurrence (Piegl & Tiller, A2.2).

use crate::linalg::solve_dense;
use crate::spline::{bisect, push_root};
use fusion_types::error::{FusionError, FusionResult};
use ndarray::{Array1, Array2};

/// Sub-samples per knot span when scanning for sign changes.
const ROOT_SUBDIVISIONS: usize = 8;

#[derive(Debug, Clone)]
pub struct BSpline {
    knots: Vec<f64>,
    coefs: Vec<f64>,
    degree: usize,
}

impl BSpline {
    /// Interpolate `(x, y)` with a degree-`k` spline. Needs `x` strictly
    /// increasing and more than `k` points.
    pub fn interpolate(x: &[f64], y: &[f64], k: usize) -> FusionResult<Self> {
        let n = x.len();
        if k == 0 {
            return Err(FusionError::Precondition(
                "B-spline degree must be at least 1".to_string(),
            ));
        }
        if y.len() != n {
            return Err(FusionError::Precondition(format!(
                "B-spline x has {n} points but y has {}",
                y.len()
            )));
        }
        if n <= k {
            return Err(FusionError::Precondition(format!(
                "degree-{k} interpolating spline needs more than {k} points, got {n}"
            )));
        }
        for i in 1..n {
            if !(x[i] > x[i - 1]) {
                return Err(FusionError::Precondition(format!(
                    "B-spline abscissae must be strictly increasing at index {i}"
                )));
            }
        }

        let mut knots = Vec::with_capacity(n + k + 1);
        knots.extend(std::iter::repeat(x[0]).take(k + 1));
        for j in 0..(n - k - 1) {
            let t = if k % 2 == 1 {
                x[j + (k + 1) / 2]
            } else {
                0.5 * (x[j + k / 2] + x[j + k / 2 + 1])
            };
            knots.push(t);
        }
        knots.extend(std::iter::repeat(x[n - 1]).take(k + 1));

        let mut spline = BSpline {
            knots,
            coefs: vec![0.0; n],
            degree: k,
        };

        let mut colloc = Array2::<f64>::zeros((n, n));
        for (row, &xi) in x.iter().enumerate() {
            let span = spline.find_span(xi);
            let basis = spline.basis_funs(span, xi);
            for (r, b) in basis.into_iter().enumerate() {
                colloc[[row, span - k + r]] = b;
            }
        }
        let rhs = Array1::from(y.to_vec());
        spline.coefs = solve_dense(&colloc, &rhs)?.to_vec();
        Ok(spline)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn domain(&self) -> (f64, f64) {
        (
            self.knots[self.degree],
            self.knots[self.coefs.len()],
        )
    }

    /// Largest `mu` in `[k, n-1]` with `t[mu] <= x`.
    fn find_span(&self, x: f64) -> usize {
        let k = self.degree;
        let n = self.coefs.len();
        if x >= self.knots[n] {
            return n - 1;
        }
        if x <= self.knots[k] {
            return k;
        }
        let pos = self.knots[k..=n].partition_point(|&t| t <= x);
        (k + pos - 1).min(n - 1)
    }

    /// The k+1 non-zero basis functions on `span` at `x`.
    fn basis_funs(&self, span: usize, x: f64) -> Vec<f64> {
        let k = self.degree;
        let t = &self.knots;
        let mut basis = vec![0.0; k + 1];
        let mut left = vec![0.0; k + 1];
        let mut right = vec![0.0; k + 1];
        basis[0] = 1.0;
        for j in 1..=k {
            left[j] = x - t[span + 1 - j];
            right[j] = t[span + j] - x;
            let mut saved = 0.0;
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                let temp = if denom == 0.0 { 0.0 } else { basis[r] / denom };
                basis[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            basis[j] = saved;
        }
        basis
    }

    pub fn eval(&self, x: f64) -> f64 {
        let span = self.find_span(x);
        let basis = self.basis_funs(span, x);
        let first = span - self.degree;
        basis
            .iter()
            .enumerate()
            .map(|(r, b)| b * self.coefs[first + r])
            .sum()
    }

    /// The derivative as a spline of degree k-1 on the inner knot vector.
    pub fn derivative(&self) -> FusionResult<BSpline> {
        let k = self.degree;
        if k == 0 {
            return Err(FusionError::Precondition(
                "cannot differentiate a degree-0 spline".to_string(),
            ));
        }
        let t = &self.knots;
        let n = self.coefs.len();
        let coefs = (0..n - 1)
            .map(|i| {
                let dt = t[i + k + 1] - t[i + 1];
                if dt == 0.0 {
                    0.0
                } else {
                    k as f64 * (self.coefs[i + 1] - self.coefs[i]) / dt
                }
            })
            .collect();
        Ok(BSpline {
            knots: t[1..t.len() - 1].to_vec(),
            coefs,
            degree: k - 1,
        })
    }

    /// Sign-changing zeros inside the domain, ascending.
    pub fn roots(&self) -> Vec<f64> {
        let k = self.degree;
        let n = self.coefs.len();
        let f = |x: f64| self.eval(x);
        let mut roots: Vec<f64> = Vec::new();
        for span in k..n {
            let (a, b) = (self.knots[span], self.knots[span + 1]);
            if b <= a {
                continue;
            }
            let mut x_prev = a;
            let mut f_prev = f(a);
            for s in 1..=ROOT_SUBDIVISIONS {
                let x = a + (b - a) * s as f64 / ROOT_SUBDIVISIONS as f64;
                let fx = f(x);
                if f_prev == 0.0 {
                    push_root(&mut roots, x_prev);
                } else if f_prev * fx < 0.0 {
                    push_root(&mut roots, bisect(&f, x_prev, x, f_prev));
                }
                x_prev = x;
                f_prev = fx;
            }
            if span == n - 1 && f_prev == 0.0 {
                push_root(&mut roots, b);
            }
        }
        roots
    }
}
