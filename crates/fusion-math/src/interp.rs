// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Interpolation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! 1D linear interpolation and finite-difference gradients.

/// Piecewise-linear interpolation of `(xp, fp)` at `x`.
///
/// `xp` must be increasing. Points outside `[xp[0], xp[n-1]]` are clamped
/// to the end values.
pub fn interp1d(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return 0.0;
    }
    if n == 1 || x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    let idx = xp[..n].partition_point(|&v| v <= x).clamp(1, n - 1);
    let (x0, x1) = (xp[idx - 1], xp[idx]);
    let (f0, f1) = (fp[idx - 1], fp[idx]);
    let dx = x1 - x0;
    if dx == 0.0 {
        return f1;
    }
    f0 + (f1 - f0) * (x - x0) / dx
}

/// [`interp1d`] over a slice of query points.
pub fn interp1d_many(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    x.iter().map(|&xi| interp1d(xi, xp, fp)).collect()
}

/// Finite-difference gradient with unit spacing.
///
/// Second-order central differences in the interior, first-order one-sided
/// differences at the two ends. Divide by the gradient of the abscissa to
/// get a derivative on a non-uniform grid.
pub fn gradient(f: &[f64]) -> Vec<f64> {
    let n = f.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let mut out = vec![0.0; n];
            out[0] = f[1] - f[0];
            out[n - 1] = f[n - 1] - f[n - 2];
            for i in 1..n - 1 {
                out[i] = 0.5 * (f[i + 1] - f[i - 1]);
            }
            out
        }
    }
}

/// `df/dx` sampled on `x` as `gradient(f) / gradient(x)`.
pub fn derivative(f: &[f64], x: &[f64]) -> Vec<f64> {
    gradient(f)
        .into_iter()
        .zip(gradient(x))
        .map(|(df, dx)| df / dx)
        .collect()
}

/// `n` evenly spaced points over `[a, b]`, both ends included.
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => (0..n)
            .map(|i| a + (b - a) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interp1d_exact_at_nodes() {
        let xp = [0.0, 0.5, 1.0];
        let fp = [1.0, 3.0, 2.0];
        for (x, f) in xp.iter().zip(fp) {
            assert!((interp1d(*x, &xp, &fp) - f).abs() < 1e-14);
        }
        assert!((interp1d(0.25, &xp, &fp) - 2.0).abs() < 1e-14);
        assert!((interp1d(0.75, &xp, &fp) - 2.5).abs() < 1e-14);
    }

    #[test]
    fn test_interp1d_clamps() {
        let xp = [0.0, 1.0];
        let fp = [4.0, 6.0];
        assert_eq!(interp1d(-1.0, &xp, &fp), 4.0);
        assert_eq!(interp1d(2.0, &xp, &fp), 6.0);
    }

    #[test]
    fn test_gradient_of_quadratic() {
        // Central differences are exact for quadratics in the interior.
        let x = linspace(0.0, 1.0, 11);
        let f: Vec<f64> = x.iter().map(|&t| t * t).collect();
        let d = derivative(&f, &x);
        for i in 1..10 {
            assert!((d[i] - 2.0 * x[i]).abs() < 1e-12, "d[{i}] = {}", d[i]);
        }
        assert!((d[0] - 0.1).abs() < 1e-12);
        assert!((d[10] - 1.9).abs() < 1e-12);
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(0.2, 0.8, 4);
        assert_eq!(v.len(), 4);
        assert_eq!(v[0], 0.2);
        assert!((v[3] - 0.8).abs() < 1e-15);
    }
}
