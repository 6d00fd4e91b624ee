//! Host-side records read from and written to an [`Event`](crate::Event).
//!
//! These mirror the simulation framework's own products and keep its
//! units: positions and lengths in cm, times in ns, energies in MeV.

use crate::geometry::ChannelId;
use crate::units;
use crate::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A simulated energy deposit along a particle step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnergyDeposit {
    pub track_id: i32,
    /// Track id of the originating (parent) particle.
    pub orig_track_id: i32,
    pub pdg: i32,
    /// Step midpoint in cm.
    pub midpoint: [f64; 3],
    /// Time in ns.
    pub time: f64,
    /// Deposited energy in MeV.
    pub energy: f64,
    /// Step length in cm.
    pub step_length: f64,
    /// Precomputed ionization electron count.
    pub num_electrons: u32,
}

impl Default for EnergyDeposit {
    fn default() -> Self {
        Self {
            track_id: 0,
            orig_track_id: crate::simchannel::BOGUS_TRACK_ID,
            pdg: 0,
            midpoint: [0.0; 3],
            time: 0.0,
            energy: 0.0,
            step_length: 0.0,
            num_electrons: 0,
        }
    }
}

impl EnergyDeposit {
    /// Midpoint in system units.
    pub fn position(&self) -> Point {
        Point::from(self.midpoint) * units::cm
    }

    /// Time in system units.
    pub fn system_time(&self) -> f64 {
        self.time * units::ns
    }

    /// Energy in system units.
    pub fn system_energy(&self) -> f64 {
        self.energy * units::MeV
    }

    /// Step length in system units.
    pub fn system_step(&self) -> f64 {
        self.step_length * units::cm
    }
}

/// A per-channel waveform, such as a deconvolved signal.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WireRecord {
    pub channel: ChannelId,
    /// Tick of the first sample.
    pub first_tick: i32,
    pub samples: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_conversion() {
        let sed = EnergyDeposit {
            midpoint: [1.0, 2.0, 3.0],
            time: 5.0,
            energy: 0.002,
            step_length: 0.03,
            ..Default::default()
        };
        assert_eq!(sed.position(), Point::new(10.0, 20.0, 30.0));
        assert_relative_eq!(sed.system_step(), 0.3);
        assert_relative_eq!(sed.system_energy(), 0.002);
        assert_eq!(sed.orig_track_id, -999);
    }
}
