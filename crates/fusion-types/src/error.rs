// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Error
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::fmt;
use thiserror::Error;

/// Decoded meaning of a negative equilibrium-solver return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveFailureReason {
    ExceededMaxIterations,
    ZeroTotalFlux,
    ClosedFluxVolumeLost,
    AxisBelowRmin,
    ToroidalCurrentTooLow,
    TargetMatrixSolveFailed,
    IsofluxFitFailed,
    WallEigenmodeFitFailed,
    Unknown(i32),
}

impl SolveFailureReason {
    /// Map a solver return code to a reason. Returns `None` for codes >= 0.
    pub fn from_code(code: i32) -> Option<Self> {
        let reason = match code {
            c if c >= 0 => return None,
            -1 => Self::ExceededMaxIterations,
            -2 => Self::ZeroTotalFlux,
            -3 => Self::ClosedFluxVolumeLost,
            -4 => Self::AxisBelowRmin,
            -5 => Self::ToroidalCurrentTooLow,
            -6 => Self::TargetMatrixSolveFailed,
            -7 => Self::IsofluxFitFailed,
            -8 => Self::WallEigenmodeFitFailed,
            other => Self::Unknown(other),
        };
        Some(reason)
    }
}

impl fmt::Display for SolveFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExceededMaxIterations => write!(f, "exceeded \"maxits\""),
            Self::ZeroTotalFlux => write!(f, "total poloidal flux is zero"),
            Self::ClosedFluxVolumeLost => write!(f, "closed flux volume lost"),
            Self::AxisBelowRmin => write!(f, "axis dropped below \"rmin\""),
            Self::ToroidalCurrentTooLow => write!(f, "toroidal current dropped too low"),
            Self::TargetMatrixSolveFailed => write!(f, "matrix solve failed for targets"),
            Self::IsofluxFitFailed => write!(f, "isoflux fitting failed"),
            Self::WallEigenmodeFitFailed => {
                write!(f, "wall eigenmode flux loop fitting failed")
            }
            Self::Unknown(code) => write!(f, "unknown solver error code {code}"),
        }
    }
}

/// Where in the driver a solve was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStage {
    LModeInit,
    Iteration(usize),
}

impl fmt::Display for SolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LModeInit => write!(f, "L-mode initialisation"),
            Self::Iteration(n) => write!(f, "iteration {n}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Equilibrium solve failed during {stage} (code {code}): {reason}")]
    SolveFailure {
        stage: SolveStage,
        code: i32,
        reason: SolveFailureReason,
    },

    #[error("Cannot rescale current profile: surface integral is zero")]
    ZeroCurrentIntegral,

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Iteration count {iteration} exceeded its bound {bound}; this is an engine bug")]
    LogicContractViolation { iteration: usize, bound: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Linear algebra error: {0}")]
    LinAlg(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FusionResult<T> = Result<T, FusionError>;
