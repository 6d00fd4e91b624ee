//! Conversion of deposited energy to ionization electrons.
//!
//! Point-like models see only the deposited energy. Step-like models also
//! see the step length and use the stopping power `dE/dX` to compute the
//! fraction of ionization surviving recombination.

use std::sync::Arc;
use wcls_core::{units, EnergyDeposit, Error, Result};

/// Mean energy to create one electron-ion pair in liquid argon.
pub const W_ION: f64 = 23.6 * units::eV;

/// Default drift field.
pub const DEFAULT_EFIELD: f64 = 0.5 * units::kilovolt / units::cm;

/// Liquid argon density in g/cm^3.
pub const DEFAULT_RHO: f64 = 1.396;

/// Recombination model depending on deposited energy alone.
pub trait PointRecombination: Send + Sync {
    /// Ionization electrons produced by `de`.
    fn electrons(&self, de: f64) -> f64;
}

/// Recombination model depending on deposited energy and step length.
pub trait StepRecombination: Send + Sync {
    /// Ionization electrons produced by `de` over a step of length `dx`.
    fn electrons(&self, de: f64, dx: f64) -> f64;
}

impl<F> PointRecombination for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn electrons(&self, de: f64) -> f64 {
        self(de)
    }
}

impl<F> StepRecombination for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn electrons(&self, de: f64, dx: f64) -> f64 {
        self(de, dx)
    }
}

/// Stopping power in MeV/cm, or `None` for a degenerate step.
fn dedx_mev_per_cm(de: f64, dx: f64) -> Option<f64> {
    if de <= 0.0 || dx <= 0.0 {
        return None;
    }
    Some((de / units::MeV) / (dx / units::cm))
}

/// Field in kV/cm.
fn efield_kv_per_cm(efield: f64) -> f64 {
    efield / (units::kilovolt / units::cm)
}

/// Constant recombination factor for minimum ionizing particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MipRecombination {
    pub rmip: f64,
    pub wi: f64,
}

impl Default for MipRecombination {
    fn default() -> Self {
        Self {
            rmip: 0.7,
            wi: W_ION,
        }
    }
}

impl PointRecombination for MipRecombination {
    fn electrons(&self, de: f64) -> f64 {
        if de <= 0.0 {
            return 0.0;
        }
        self.rmip * de / self.wi
    }
}

/// Birks' law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirksRecombination {
    pub a3t: f64,
    /// In (kV/cm)(g/cm^2)/MeV.
    pub k3t: f64,
    pub efield: f64,
    pub rho: f64,
    pub wi: f64,
}

impl Default for BirksRecombination {
    fn default() -> Self {
        Self {
            a3t: 0.8,
            k3t: 0.0486,
            efield: DEFAULT_EFIELD,
            rho: DEFAULT_RHO,
            wi: W_ION,
        }
    }
}

impl BirksRecombination {
    /// Fraction of ionization surviving at stopping power `dedx` (MeV/cm).
    pub fn factor(&self, dedx: f64) -> f64 {
        self.a3t / (1.0 + dedx * self.k3t / (efield_kv_per_cm(self.efield) * self.rho))
    }
}

impl StepRecombination for BirksRecombination {
    fn electrons(&self, de: f64, dx: f64) -> f64 {
        dedx_mev_per_cm(de, dx).map_or(0.0, |dedx| self.factor(dedx) * de / self.wi)
    }
}

/// Modified box model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxRecombination {
    pub a: f64,
    /// In (kV/cm)(g/cm^2)/MeV.
    pub b: f64,
    pub efield: f64,
    pub rho: f64,
    pub wi: f64,
}

impl Default for BoxRecombination {
    fn default() -> Self {
        Self {
            a: 0.930,
            b: 0.212,
            efield: DEFAULT_EFIELD,
            rho: DEFAULT_RHO,
            wi: W_ION,
        }
    }
}

impl BoxRecombination {
    /// Fraction of ionization surviving at stopping power `dedx` (MeV/cm).
    pub fn factor(&self, dedx: f64) -> f64 {
        let xi = dedx * self.b / (efield_kv_per_cm(self.efield) * self.rho);
        (self.a + xi).ln() / xi
    }
}

impl StepRecombination for BoxRecombination {
    fn electrons(&self, de: f64, dx: f64) -> f64 {
        dedx_mev_per_cm(de, dx).map_or(0.0, |dedx| self.factor(dedx) * de / self.wi)
    }
}

/// How a deposit source turns an energy record into electrons.
#[derive(Clone, Default)]
pub enum ChargeModel {
    /// Use the record's precomputed electron count.
    #[default]
    Electrons,
    Point(Arc<dyn PointRecombination>),
    Step(Arc<dyn StepRecombination>),
}

impl std::fmt::Debug for ChargeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Electrons => f.write_str("Electrons"),
            Self::Point(_) => f.write_str("Point(..)"),
            Self::Step(_) => f.write_str("Step(..)"),
        }
    }
}

impl ChargeModel {
    /// Selects a model by name.
    ///
    /// An empty name or `"electrons"` selects [`ChargeModel::Electrons`].
    /// A `Type:instance` name is looked up by its type part.
    pub fn from_name(name: &str) -> Result<Self> {
        let kind = name.split(':').next().unwrap_or_default();
        match kind {
            "" | "electrons" => Ok(Self::Electrons),
            "MipRecombination" => Ok(Self::Point(Arc::new(MipRecombination::default()))),
            "BirksRecombination" => Ok(Self::Step(Arc::new(BirksRecombination::default()))),
            "BoxRecombination" => Ok(Self::Step(Arc::new(BoxRecombination::default()))),
            other => Err(Error::config(format!("unknown recombination model \"{other}\""))),
        }
    }

    /// Unscaled electron count for `sed`.
    pub fn electrons(&self, sed: &EnergyDeposit) -> f64 {
        match self {
            Self::Electrons => f64::from(sed.num_electrons),
            Self::Point(model) => model.electrons(sed.system_energy()),
            Self::Step(model) => model.electrons(sed.system_energy(), sed.system_step()),
        }
    }
}
