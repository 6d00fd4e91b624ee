//! Per-channel records of ionization electrons arriving at the wires.

use crate::geometry::ChannelId;
use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Track id used when no origin track is known.
pub const BOGUS_TRACK_ID: i32 = -999;

/// Ionization electrons from one track in one time bin of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ide {
    pub track_id: i32,
    pub num_electrons: f64,
    /// Electron-weighted position of the origin, in cm.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub energy: f64,
    pub orig_track_id: i32,
}

/// Ionization electrons collected by one channel, keyed by time bin.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimChannel {
    channel: ChannelId,
    tdc_ides: BTreeMap<u32, Vec<Ide>>,
}

impl SimChannel {
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            tdc_ides: BTreeMap::new(),
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Time bins in ascending order with their IDEs.
    pub fn tdc_ides(&self) -> &BTreeMap<u32, Vec<Ide>> {
        &self.tdc_ides
    }

    /// IDEs recorded in `tdc`, empty if none.
    pub fn ides(&self, tdc: u32) -> &[Ide] {
        self.tdc_ides.get(&tdc).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.tdc_ides.is_empty()
    }

    /// Records `electrons` from `track_id` arriving in `tdc`.
    ///
    /// Contributions from a track already present in this time bin are
    /// merged into its IDE: electrons and energy add up and the position
    /// becomes the electron-weighted mean.
    pub fn add_ionization_electrons(
        &mut self,
        track_id: i32,
        tdc: u32,
        electrons: f64,
        xyz_cm: [f64; 3],
        energy: f64,
        orig_track_id: i32,
    ) {
        let ides = self.tdc_ides.entry(tdc).or_default();
        if let Some(ide) = ides.iter_mut().find(|ide| ide.track_id == track_id) {
            let total = ide.num_electrons + electrons;
            if total > 0.0 {
                let w_old = ide.num_electrons / total;
                let w_new = electrons / total;
                ide.x = ide.x * w_old + xyz_cm[0] * w_new;
                ide.y = ide.y * w_old + xyz_cm[1] * w_new;
                ide.z = ide.z * w_old + xyz_cm[2] * w_new;
            }
            ide.num_electrons = total;
            ide.energy += energy;
            return;
        }
        ides.push(Ide {
            track_id,
            num_electrons: electrons,
            x: xyz_cm[0],
            y: xyz_cm[1],
            z: xyz_cm[2],
            energy,
            orig_track_id,
        });
    }

    /// Electrons summed over all time bins and tracks.
    pub fn total_charge(&self) -> f64 {
        self.tdc_ides.values().flatten().map(|i| i.num_electrons).sum()
    }

    /// Energy summed over all time bins and tracks.
    pub fn total_energy(&self) -> f64 {
        self.tdc_ides.values().flatten().map(|i| i.energy).sum()
    }

    /// Electrons summed over tracks in `tdc`.
    pub fn charge_at(&self, tdc: u32) -> f64 {
        self.ides(tdc).iter().map(|i| i.num_electrons).sum()
    }
}

/// Accumulates [`SimChannel`]s for one event.
///
/// Channels are gathered in a hash map while deposits stream in and are
/// emitted sorted by channel id when the event is flushed.
#[derive(Debug, Default)]
pub struct ChannelAccumulator {
    channels: HashMap<ChannelId, SimChannel>,
}

impl ChannelAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The channel record for `channel`, created empty on first use.
    pub fn channel_mut(&mut self, channel: ChannelId) -> &mut SimChannel {
        self.channels
            .entry(channel)
            .or_insert_with(|| SimChannel::new(channel))
    }

    pub fn get(&self, channel: ChannelId) -> Option<&SimChannel> {
        self.channels.get(&channel)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }

    /// Drains all channels, sorted by channel id, leaving the accumulator
    /// empty for the next event.
    pub fn flush(&mut self) -> Vec<SimChannel> {
        let mut out: Vec<SimChannel> = self.channels.drain().map(|(_, sc)| sc).collect();
        out.sort_unstable_by_key(SimChannel::channel);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_same_track_merges() {
        let mut sc = SimChannel::new(12);
        sc.add_ionization_electrons(3, 100, 30.0, [0.0, 0.0, 0.0], 0.3, 1);
        sc.add_ionization_electrons(3, 100, 10.0, [4.0, 8.0, 0.0], 0.1, 1);
        let ides = sc.ides(100);
        assert_eq!(ides.len(), 1);
        assert_relative_eq!(ides[0].num_electrons, 40.0);
        assert_relative_eq!(ides[0].energy, 0.4);
        assert_relative_eq!(ides[0].x, 1.0);
        assert_relative_eq!(ides[0].y, 2.0);
    }

    #[test]
    fn test_distinct_tracks_and_tdcs() {
        let mut sc = SimChannel::new(1);
        sc.add_ionization_electrons(3, 100, 30.0, [0.0; 3], 0.3, 1);
        sc.add_ionization_electrons(4, 100, 20.0, [0.0; 3], 0.2, BOGUS_TRACK_ID);
        sc.add_ionization_electrons(4, 101, 5.0, [0.0; 3], 0.05, BOGUS_TRACK_ID);
        assert_eq!(sc.ides(100).len(), 2);
        assert_relative_eq!(sc.charge_at(100), 50.0);
        assert_relative_eq!(sc.total_charge(), 55.0);
        assert_relative_eq!(sc.total_energy(), 0.55);
        let tdcs: Vec<u32> = sc.tdc_ides().keys().copied().collect();
        assert_eq!(tdcs, vec![100, 101]);
    }

    #[test]
    fn test_accumulator_flush_sorted_and_cleared() {
        let mut acc = ChannelAccumulator::new();
        for ch in [9, 2, 5] {
            acc.channel_mut(ch)
                .add_ionization_electrons(1, 0, 1.0, [0.0; 3], 0.0, 0);
        }
        acc.channel_mut(2)
            .add_ionization_electrons(1, 0, 1.0, [0.0; 3], 0.0, 0);
        let out = acc.flush();
        let chans: Vec<ChannelId> = out.iter().map(SimChannel::channel).collect();
        assert_eq!(chans, vec![2, 5, 9]);
        assert_relative_eq!(out[0].total_charge(), 2.0);
        assert!(acc.is_empty());
        assert!(acc.flush().is_empty());
    }
}
