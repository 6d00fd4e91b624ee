//! Channel masks: per-channel lists of disabled time-bin ranges.

use crate::{Error, Result};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Half-open `[low, high)` range of time bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinRange {
    pub low: i32,
    pub high: i32,
}

impl BinRange {
    #[inline]
    pub fn new(low: i32, high: i32) -> Self {
        Self { low, high }
    }

    #[inline]
    pub fn contains(&self, tbin: i32) -> bool {
        self.low <= tbin && tbin < self.high
    }
}

/// Masked ranges keyed by channel.
///
/// Ranges within a channel keep insertion order and are never coalesced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelMasks {
    ranges: BTreeMap<i32, Vec<BinRange>>,
}

/// Named channel masks, as attached to a frame.
pub type ChannelMaskMap = BTreeMap<String, ChannelMasks>;

impl ChannelMasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses flattened `(channel, low, high)` triples.
    pub fn from_triples(flat: &[i32]) -> Result<Self> {
        if flat.len() % 3 != 0 {
            return Err(Error::MalformedMask { len: flat.len() });
        }
        let mut masks = Self::new();
        for t in flat.chunks_exact(3) {
            masks.add(t[0], BinRange::new(t[1], t[2]));
        }
        Ok(masks)
    }

    /// Appends one range to a channel.
    pub fn add(&mut self, channel: i32, range: BinRange) {
        self.ranges.entry(channel).or_default().push(range);
    }

    /// Ranges masked on `channel`, empty if none.
    pub fn get(&self, channel: i32) -> &[BinRange] {
        self.ranges.get(&channel).map_or(&[], Vec::as_slice)
    }

    /// True if `tbin` of `channel` falls in any masked range.
    pub fn is_masked(&self, channel: i32, tbin: i32) -> bool {
        self.get(channel).iter().any(|r| r.contains(tbin))
    }

    /// Number of channels with at least one range.
    pub fn nchannels(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Channels in ascending order with their ranges.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[BinRange])> {
        self.ranges.iter().map(|(ch, r)| (*ch, r.as_slice()))
    }

    /// Folds `other` into `self` by appending its ranges channel by channel.
    pub fn merge_from(&mut self, other: &ChannelMasks) {
        for (ch, ranges) in &other.ranges {
            self.ranges
                .entry(*ch)
                .or_default()
                .extend_from_slice(ranges);
        }
    }
}

/// Merges two mask sets. Overlapping ranges on a channel are both kept.
pub fn merge(a: &ChannelMasks, b: &ChannelMasks) -> ChannelMasks {
    let mut out = a.clone();
    out.merge_from(b);
    out
}

/// Merges any number of mask sets, in order.
pub fn merge_all<'a, I>(sets: I) -> ChannelMasks
where
    I: IntoIterator<Item = &'a ChannelMasks>,
{
    sets.into_iter().fold(ChannelMasks::new(), |mut acc, m| {
        acc.merge_from(m);
        acc
    })
}
