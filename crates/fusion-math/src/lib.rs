//! Mathematical primitives for SCPN Fusion Core.
//!
//! Splines, interpolation and small dense/tridiagonal solvers used by the
//! flux-surface profile operators.

pub mod bspline;
pub mod interp;
pub mod linalg;
pub mod spline;
pub mod tridiag;
