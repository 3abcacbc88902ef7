// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::DEFAULT_Q_TARGET;
use crate::error::{FusionError, FusionResult};
use serde::{Deserialize, Serialize};

/// Top-level configuration of the bootstrap convergence driver.
/// Every field has a default so a partial JSON file is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Maximum number of H-mode solve iterations (one grace iteration is added).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Scalar applied to the bootstrap current profile.
    #[serde(default = "default_jbs_scale")]
    pub jbs_scale: f64,
    /// Ion charge numbers handed to the bootstrap closure.
    #[serde(default = "default_charge_numbers")]
    pub charge_numbers: Vec<f64>,
    /// Smooth P' and FF' before handing them to the solver.
    #[serde(default = "default_true")]
    pub smooth_inputs: bool,
    /// Reshape the input inductive current by the passing fraction once.
    /// Use when the input was derived from Spitzer resistivity.
    #[serde(default = "default_true")]
    pub rescale_ind_jtor_by_ftr: bool,
    /// Start from a flattened-pedestal (L-mode like) equilibrium.
    #[serde(default = "default_true")]
    pub initialize_eq: bool,
    #[serde(default = "default_driver_smoothing")]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub redistribution: RedistributionStrategy,
}

/// Sparse control grid used by the profile smoother.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Pedestal location in normalized flux (default: 0.95²).
    #[serde(default = "default_ped_spot")]
    pub ped_spot: f64,
    /// Number of uniform control points in the core.
    #[serde(default = "default_preped_grid")]
    pub preped_grid: usize,
    /// Gap left of the pedestal where the core grid stops.
    #[serde(default = "default_pedsepl")]
    pub pedsepl: f64,
    /// Gap right of the pedestal where the dense pedestal grid starts.
    #[serde(default = "default_pedsepr")]
    pub pedsepr: f64,
    /// Gap before the separatrix anchor.
    #[serde(default = "default_endsep")]
    pub endsep: f64,
    /// Minimum number of output points.
    #[serde(default = "default_npts")]
    pub npts: usize,
    /// Append an explicit (1, 0) anchor.
    #[serde(default = "default_true")]
    pub endzero: bool,
}

/// Core current redistribution applied between bootstrap and FF' conversion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedistributionStrategy {
    #[default]
    None,
    Dynamo(DynamoParams),
}

/// Heuristic dynamo tuning. The numbers are empirically tuned; keep them
/// unless a calibration set says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamoParams {
    /// q value the redistribution aims for.
    #[serde(default = "default_q_target")]
    pub q_target: f64,
    /// q0 - q_target inside this band leaves the current untouched.
    #[serde(default = "default_trigger_band")]
    pub trigger_band: [f64; 2],
    /// Post-solve q0 inside this band ends the driver.
    #[serde(default = "default_exit_band")]
    pub exit_band: [f64; 2],
    /// Positive q offsets are multiplied by this before use.
    #[serde(default = "default_positive_offset_damping")]
    pub positive_offset_damping: f64,
    /// Offset floor added to the drive term.
    #[serde(default = "default_q_offset_floor")]
    pub q_offset_floor: f64,
    /// Weights for (outside-surface addition, bulk addition, axis subtraction).
    #[serde(default = "default_weights")]
    pub weights: [f64; 3],
    /// Local maxima of the current inside this psi are damped.
    #[serde(default = "default_inboard_limit")]
    pub inboard_limit: f64,
    /// Fraction by which inboard bumps are pulled toward the spline value.
    #[serde(default = "default_inboard_damping")]
    pub inboard_damping: f64,
    /// Crossing location used before any crossing has been found.
    #[serde(default = "default_fallback_crossing")]
    pub fallback_crossing: f64,
}

fn default_max_iterations() -> usize {
    6
}
fn default_jbs_scale() -> f64 {
    1.0
}
fn default_charge_numbers() -> Vec<f64> {
    vec![1.0]
}
fn default_true() -> bool {
    true
}
fn default_ped_spot() -> f64 {
    0.95 * 0.95
}
fn default_preped_grid() -> usize {
    20
}
fn default_pedsepl() -> f64 {
    0.1
}
fn default_pedsepr() -> f64 {
    0.005
}
fn default_endsep() -> f64 {
    0.01
}
fn default_npts() -> usize {
    200
}
fn default_driver_smoothing() -> SmoothingConfig {
    SmoothingConfig {
        npts: 450,
        ..SmoothingConfig::default()
    }
}
fn default_q_target() -> f64 {
    DEFAULT_Q_TARGET
}
fn default_trigger_band() -> [f64; 2] {
    [0.0, 0.05]
}
fn default_exit_band() -> [f64; 2] {
    [1.02, 1.07]
}
fn default_positive_offset_damping() -> f64 {
    0.8
}
fn default_q_offset_floor() -> f64 {
    0.03
}
fn default_weights() -> [f64; 3] {
    [0.5 * 0.2, 0.5 * 0.6, 0.5 * 1.0]
}
fn default_inboard_limit() -> f64 {
    0.2
}
fn default_inboard_damping() -> f64 {
    0.5
}
fn default_fallback_crossing() -> f64 {
    0.2
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        SmoothingConfig {
            ped_spot: default_ped_spot(),
            preped_grid: default_preped_grid(),
            pedsepl: default_pedsepl(),
            pedsepr: default_pedsepr(),
            endsep: default_endsep(),
            npts: default_npts(),
            endzero: true,
        }
    }
}

impl Default for DynamoParams {
    fn default() -> Self {
        DynamoParams {
            q_target: default_q_target(),
            trigger_band: default_trigger_band(),
            exit_band: default_exit_band(),
            positive_offset_damping: default_positive_offset_damping(),
            q_offset_floor: default_q_offset_floor(),
            weights: default_weights(),
            inboard_limit: default_inboard_limit(),
            inboard_damping: default_inboard_damping(),
            fallback_crossing: default_fallback_crossing(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::bootstrap()
    }
}

impl DriverConfig {
    /// Plain bootstrap iteration.
    pub fn bootstrap() -> Self {
        DriverConfig {
            max_iterations: default_max_iterations(),
            jbs_scale: default_jbs_scale(),
            charge_numbers: default_charge_numbers(),
            smooth_inputs: true,
            rescale_ind_jtor_by_ftr: true,
            initialize_eq: true,
            smoothing: default_driver_smoothing(),
            redistribution: RedistributionStrategy::None,
        }
    }

    /// Bootstrap iteration with dynamo redistribution of the core current.
    pub fn dynamo() -> Self {
        DriverConfig {
            rescale_ind_jtor_by_ftr: false,
            redistribution: RedistributionStrategy::Dynamo(DynamoParams::default()),
            ..Self::bootstrap()
        }
    }

    /// Load from JSON file.
    pub fn from_file(path: &str) -> FusionResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn dynamo_params(&self) -> Option<&DynamoParams> {
        match &self.redistribution {
            RedistributionStrategy::Dynamo(params) => Some(params),
            RedistributionStrategy::None => None,
        }
    }

    pub fn validate(&self) -> FusionResult<()> {
        if !self.jbs_scale.is_finite() {
            return Err(FusionError::ConfigError(format!(
                "jbs_scale must be finite, got {}",
                self.jbs_scale
            )));
        }
        if self.charge_numbers.is_empty() || self.charge_numbers.iter().any(|z| *z <= 0.0) {
            return Err(FusionError::ConfigError(
                "charge_numbers must be non-empty and positive".to_string(),
            ));
        }
        self.smoothing.validate()?;
        if let Some(params) = self.dynamo_params() {
            params.validate()?;
        }
        Ok(())
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> FusionResult<()> {
        if self.preped_grid < 2 {
            return Err(FusionError::ConfigError(format!(
                "smoothing preped_grid must be >= 2, got {}",
                self.preped_grid
            )));
        }
        let core_end = self.ped_spot - self.pedsepl;
        let ped_start = self.ped_spot + self.pedsepr;
        let ped_end = if self.endzero { 1.0 - self.endsep } else { 1.0 };
        if !(core_end > 0.0 && ped_start > core_end + 0.9 * self.pedsepl && ped_end > ped_start)
        {
            return Err(FusionError::ConfigError(format!(
                "smoothing control grid is not increasing: core end {core_end}, \
                 pedestal [{ped_start}, {ped_end}]"
            )));
        }
        if self.endzero && self.endsep <= 0.0 {
            return Err(FusionError::ConfigError(
                "smoothing endsep must be > 0 when endzero is set".to_string(),
            ));
        }
        Ok(())
    }
}

impl DynamoParams {
    pub fn validate(&self) -> FusionResult<()> {
        if self.trigger_band[0] > self.trigger_band[1] {
            return Err(FusionError::ConfigError(format!(
                "dynamo trigger band is inverted: {:?}",
                self.trigger_band
            )));
        }
        if self.exit_band[0] > self.exit_band[1] {
            return Err(FusionError::ConfigError(format!(
                "dynamo exit band is inverted: {:?}",
                self.exit_band
            )));
        }
        if !(0.0..=1.0).contains(&self.inboard_damping) {
            return Err(FusionError::ConfigError(format!(
                "dynamo inboard_damping must be in [0, 1], got {}",
                self.inboard_damping
            )));
        }
        if !(self.fallback_crossing > 0.0 && self.fallback_crossing < 1.0) {
            return Err(FusionError::ConfigError(format!(
                "dynamo fallback_crossing must be in (0, 1), got {}",
                self.fallback_crossing
            )));
        }
        Ok(())
    }
}
