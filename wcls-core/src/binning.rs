//! Fixed-count, fixed-range 1D binning.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use crate::{Error, Result};
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `nbins` uniform bins spanning `[min, max)`.
///
/// Used for the readout time axis and for each wire plane's pitch axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "BinningSpec", into = "BinningSpec"))]
pub struct Binning {
    nbins: usize,
    min: f64,
    max: f64,
}

/// Unvalidated wire form of a [`Binning`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinningSpec {
    pub nbins: i64,
    pub min: f64,
    pub max: f64,
}

impl TryFrom<BinningSpec> for Binning {
    type Error = Error;

    fn try_from(spec: BinningSpec) -> Result<Self> {
        Binning::new(spec.nbins, spec.min, spec.max)
    }
}

impl From<Binning> for BinningSpec {
    fn from(b: Binning) -> Self {
        Self {
            nbins: b.nbins as i64,
            min: b.min,
            max: b.max,
        }
    }
}

impl Binning {
    /// Creates a binning, rejecting `nbins <= 0` and `max <= min`.
    pub fn new(nbins: i64, min: f64, max: f64) -> Result<Self> {
        if nbins <= 0 || min.is_nan() || max.is_nan() || max <= min {
            return Err(Error::InvalidBinning { nbins, min, max });
        }
        Ok(Self {
            nbins: nbins as usize,
            min,
            max,
        })
    }

    /// Number of bins.
    #[inline]
    pub fn nbins(&self) -> usize {
        self.nbins
    }

    /// Lower edge of the first bin.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper edge of the last bin.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Width of one bin.
    #[inline]
    pub fn binsize(&self) -> f64 {
        (self.max - self.min) / self.nbins as f64
    }

    /// Full extent, `max - min`.
    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Bin index holding `x`. Not clamped: values below `min` give a
    /// negative index and values at or above `max` give `>= nbins`.
    #[inline]
    pub fn bin(&self, x: f64) -> i64 {
        ((x - self.min) / self.binsize()).floor() as i64
    }

    /// Bin index holding `x`, or `None` when `x` is outside `[min, max)`.
    pub fn index(&self, x: f64) -> Option<usize> {
        if self.inside(x) {
            // Rounding can put a value just below max into bin nbins.
            Some((self.bin(x) as usize).min(self.nbins - 1))
        } else {
            None
        }
    }

    /// True if `x` is in `[min, max)`.
    #[inline]
    pub fn inside(&self, x: f64) -> bool {
        self.min <= x && x < self.max
    }

    /// Lower edge of bin `i`. `i == nbins` gives `max`.
    #[inline]
    pub fn edge(&self, i: i64) -> f64 {
        self.min + i as f64 * self.binsize()
    }

    /// Center of bin `i`.
    #[inline]
    pub fn center(&self, i: i64) -> f64 {
        self.min + (i as f64 + 0.5) * self.binsize()
    }

    /// Bins touched by the interval `[lo, hi]`, clipped to the binning.
    ///
    /// The range is empty when the interval lies entirely outside.
    pub fn sample_bin_range(&self, lo: f64, hi: f64) -> Range<usize> {
        let n = self.nbins as i64;
        let first = self.bin(lo).clamp(0, n);
        let last = self.bin(hi).saturating_add(1).clamp(0, n);
        if first >= last {
            return 0..0;
        }
        first as usize..last as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_binsize() {
        let b = Binning::new(10, 0.0, 5.0).unwrap();
        assert_eq!(b.nbins(), 10);
        assert_relative_eq!(b.binsize(), 0.5);
        assert_relative_eq!(b.span(), 5.0);
    }

    #[test]
    fn test_invalid_binning() {
        assert!(Binning::new(0, 0.0, 1.0).is_err());
        assert!(Binning::new(-3, 0.0, 1.0).is_err());
        assert!(Binning::new(5, 1.0, 1.0).is_err());
        assert!(Binning::new(5, 2.0, 1.0).is_err());
        assert!(Binning::new(5, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_bin_lookup() {
        let b = Binning::new(4, -2.0, 2.0).unwrap();
        assert_eq!(b.bin(-2.0), 0);
        assert_eq!(b.bin(-0.5), 1);
        assert_eq!(b.bin(1.999), 3);
        assert_eq!(b.bin(2.0), 4);
        assert_eq!(b.bin(-2.5), -1);

        assert_eq!(b.index(-2.0), Some(0));
        assert_eq!(b.index(2.0), None);
        assert_eq!(b.index(-2.1), None);
    }

    #[test]
    fn test_edges_and_centers() {
        let b = Binning::new(4, 0.0, 8.0).unwrap();
        assert_relative_eq!(b.edge(0), 0.0);
        assert_relative_eq!(b.edge(4), 8.0);
        assert_relative_eq!(b.center(1), 3.0);
    }

    #[test]
    fn test_sample_bin_range() {
        let b = Binning::new(10, 0.0, 10.0).unwrap();
        assert_eq!(b.sample_bin_range(2.5, 4.5), 2..5);
        assert_eq!(b.sample_bin_range(-5.0, 1.5), 0..2);
        assert_eq!(b.sample_bin_range(8.5, 50.0), 8..10);
        assert_eq!(b.sample_bin_range(3.2, 3.2), 3..4);
        assert!(b.sample_bin_range(11.0, 12.0).is_empty());
        assert!(b.sample_bin_range(-3.0, -1.0).is_empty());
    }
}
