//! Self-consistent bootstrap current iteration engine.
//!
//! Stage 1: flux-surface operators, smoother, crossing solver
//! Stage 2: dynamo redistribution, iteration step, convergence driver

pub mod bootstrap;
pub mod crossing;
pub mod driver;
pub mod dynamo;
pub mod equilibrium;
pub mod flux;
pub mod iteration;
pub mod lmode;
pub mod smoothing;
pub mod synthetic;
