// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Vacuum permeability (H/m) - real SI value.
/// The FF' conversion uses this directly; profiles handed to the
/// equilibrium solver are normalized afterwards so only the shape matters.
pub const MU0_SI: f64 = 1.2566370614e-6;

/// Elementary charge (C). Also the eV → J factor used for kinetic pressure.
pub const Q_ELECTRON: f64 = 1.602176634e-19;

/// Sentinel for a disabled scalar target (I_p, axis pressure).
/// Shared with the equilibrium solver wire contract.
pub const DISABLED_TARGET: f64 = -1.0e99;

/// Default q value the dynamo step aims for (q=1 plus a small offset).
pub const DEFAULT_Q_TARGET: f64 = 1.02;
