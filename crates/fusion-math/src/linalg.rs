// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Linear Algebra
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Small dense linear algebra: Gaussian elimination and polynomial fits.
//!
//! Sized for spline collocation matrices and low-degree least squares,
//! i.e. systems of a few hundred unknowns at most.

use fusion_types::error::{FusionError, FusionResult};
use ndarray::{Array1, Array2};

/// Pivot magnitude below which a matrix is treated as singular.
const SINGULAR_PIVOT: f64 = 1e-300;

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
pub fn solve_dense(a: &Array2<f64>, b: &Array1<f64>) -> FusionResult<Array1<f64>> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(FusionError::LinAlg(format!(
            "solve_dense needs a square matrix, got {rows}x{cols}"
        )));
    }
    if b.len() != rows {
        return Err(FusionError::LinAlg(format!(
            "solve_dense rhs length {} does not match matrix size {rows}",
            b.len()
        )));
    }
    let n = rows;
    let mut m = a.clone();
    let mut x = b.clone();

    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_abs = m[[col, col]].abs();
        for r in (col + 1)..n {
            let v = m[[r, col]].abs();
            if v > pivot_abs {
                pivot_abs = v;
                pivot_row = r;
            }
        }
        if pivot_abs < SINGULAR_PIVOT || !pivot_abs.is_finite() {
            return Err(FusionError::LinAlg(format!(
                "singular matrix at column {col}"
            )));
        }
        if pivot_row != col {
            for c in 0..n {
                m.swap([col, c], [pivot_row, c]);
            }
            x.swap(col, pivot_row);
        }
        let pivot = m[[col, col]];
        for r in (col + 1)..n {
            let factor = m[[r, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                m[[r, c]] -= factor * m[[col, c]];
            }
            x[r] -= factor * x[col];
        }
    }

    for row in (0..n).rev() {
        let mut acc = x[row];
        for c in (row + 1)..n {
            acc -= m[[row, c]] * x[c];
        }
        x[row] = acc / m[[row, row]];
    }
    Ok(x)
}

/// Least-squares polynomial fit of degree `deg`.
///
/// Returns coefficients in ascending order, `c[0] + c[1] x + ...`.
/// The abscissae are centred and scaled before forming the normal
/// equations so the system stays well conditioned.
pub fn polyfit(x: &[f64], y: &[f64], deg: usize) -> FusionResult<Vec<f64>> {
    if x.len() != y.len() {
        return Err(FusionError::Precondition(format!(
            "polyfit x has {} points but y has {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() <= deg {
        return Err(FusionError::Precondition(format!(
            "polyfit of degree {deg} needs more than {deg} points, got {}",
            x.len()
        )));
    }

    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let scale = x
        .iter()
        .map(|v| (v - mean).abs())
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);

    let ncoef = deg + 1;
    let mut ata = Array2::<f64>::zeros((ncoef, ncoef));
    let mut aty = Array1::<f64>::zeros(ncoef);
    for (&xi, &yi) in x.iter().zip(y) {
        let u = (xi - mean) / scale;
        let mut powers = vec![1.0; 2 * deg + 1];
        for p in 1..powers.len() {
            powers[p] = powers[p - 1] * u;
        }
        for r in 0..ncoef {
            aty[r] += powers[r] * yi;
            for c in 0..ncoef {
                ata[[r, c]] += powers[r + c];
            }
        }
    }
    let scaled = solve_dense(&ata, &aty)?;

    // Expand sum_k s_k ((x - mean)/scale)^k back into powers of x.
    let mut coefs = vec![0.0; ncoef];
    for (k, &sk) in scaled.iter().enumerate() {
        let factor = sk / scale.powi(k as i32);
        for j in 0..=k {
            let binom = binomial(k, j);
            coefs[j] += factor * binom * (-mean).powi((k - j) as i32);
        }
    }
    Ok(coefs)
}

/// Evaluate an ascending-order polynomial by Horner's rule.
pub fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

fn binomial(n: usize, k: usize) -> f64 {
    let mut out = 1.0;
    for i in 0..k {
        out = out * (n - i) as f64 / (i + 1) as f64;
    }
    out
}
