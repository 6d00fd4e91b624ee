//! One-dimensional Gaussian descriptor.
#![allow(clippy::cast_precision_loss)]

use crate::Binning;
use statrs::function::erf::erf;
use std::f64::consts::{PI, SQRT_2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A Gaussian located at `center` with width `sigma`.
///
/// A zero `sigma` describes a delta function. [`GausDesc::distance`] is
/// undefined for it; the binned helpers below treat it explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GausDesc {
    pub center: f64,
    pub sigma: f64,
}

impl GausDesc {
    #[inline]
    pub fn new(center: f64, sigma: f64) -> Self {
        Self { center, sigma }
    }

    /// Signed distance from the center to `x` in units of sigma.
    #[inline]
    pub fn distance(&self, x: f64) -> f64 {
        (x - self.center) / self.sigma
    }

    /// True for a zero-width (delta) Gaussian.
    #[inline]
    pub fn is_delta(&self) -> bool {
        self.sigma <= 0.0
    }

    /// The interval `center ± nsigma * sigma`.
    #[inline]
    pub fn sigma_range(&self, nsigma: f64) -> (f64, f64) {
        let half = nsigma * self.sigma;
        (self.center - half, self.center + half)
    }

    /// Normal probability mass between `x0` and `x1`.
    pub fn mass(&self, x0: f64, x1: f64) -> f64 {
        if self.is_delta() {
            return if x0 <= self.center && self.center < x1 {
                1.0
            } else {
                0.0
            };
        }
        let z0 = self.distance(x0) / SQRT_2;
        let z1 = self.distance(x1) / SQRT_2;
        0.5 * (erf(z1) - erf(z0))
    }

    /// Probability density at `x`.
    pub fn pdf(&self, x: f64) -> f64 {
        let d = self.distance(x);
        (-0.5 * d * d).exp() / (self.sigma * (2.0 * PI).sqrt())
    }

    /// Mass in each of `n` consecutive bins of width `step` starting at
    /// `start`, integrated exactly at the bin edges.
    pub fn binint(&self, start: f64, step: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let lo = start + i as f64 * step;
                self.mass(lo, lo + step)
            })
            .collect()
    }

    /// Mass in each of `n` consecutive bins approximated by evaluating the
    /// density at `per_bin` evenly spaced sub-bin centers.
    pub fn sampled(&self, start: f64, step: f64, n: usize, per_bin: usize) -> Vec<f64> {
        if self.is_delta() {
            return self.binint(start, step, n);
        }
        let per_bin = per_bin.max(1);
        let sub = step / per_bin as f64;
        (0..n)
            .map(|i| {
                let lo = start + i as f64 * step;
                (0..per_bin)
                    .map(|k| self.pdf(lo + (k as f64 + 0.5) * sub) * sub)
                    .sum()
            })
            .collect()
    }

    /// True if no part of this Gaussian within `nsigma` reaches the binned
    /// range `[min, max)`. A delta is outside unless its center is inside.
    pub fn outside(&self, binning: &Binning, nsigma: f64) -> bool {
        if self.is_delta() {
            return !binning.inside(self.center);
        }
        self.distance(binning.min()) > nsigma || self.distance(binning.max()) < -nsigma
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_distance() {
        let g = GausDesc::new(5.0, 2.0);
        assert_relative_eq!(g.distance(5.0), 0.0);
        for k in [-3.0, -0.5, 1.0, 4.25] {
            assert_relative_eq!(g.distance(5.0 + k * 2.0), k);
        }
    }

    #[test]
    fn test_mass_of_whole_line() {
        let g = GausDesc::new(1.0, 0.3);
        assert_abs_diff_eq!(g.mass(-100.0, 100.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g.mass(1.0, 100.0), 0.5, epsilon = 1e-12);
        // one sigma each side
        assert_abs_diff_eq!(g.mass(0.7, 1.3), 0.682_689_492, epsilon = 1e-8);
    }

    #[test]
    fn test_binint_sums_to_one() {
        let g = GausDesc::new(0.0, 1.0);
        let w = g.binint(-10.0, 0.5, 40);
        assert_eq!(w.len(), 40);
        assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        // symmetric about the center
        assert_abs_diff_eq!(w[19], w[20], epsilon = 1e-15);
    }

    #[test]
    fn test_sampled_close_to_integral() {
        let g = GausDesc::new(0.2, 1.5);
        let exact = g.binint(-6.0, 1.0, 12);
        let approx = g.sampled(-6.0, 1.0, 12, 16);
        for (a, b) in exact.iter().zip(&approx) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_delta_mass() {
        let g = GausDesc::new(2.5, 0.0);
        assert!(g.is_delta());
        assert_eq!(g.binint(0.0, 1.0, 4), vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_outside_binning() {
        let b = Binning::new(10, 0.0, 100.0).unwrap();
        assert!(!GausDesc::new(50.0, 5.0).outside(&b, 3.0));
        assert!(!GausDesc::new(-10.0, 5.0).outside(&b, 3.0));
        assert!(GausDesc::new(-16.0, 5.0).outside(&b, 3.0));
        assert!(GausDesc::new(116.0, 5.0).outside(&b, 3.0));

        assert!(!GausDesc::new(0.0, 0.0).outside(&b, 3.0));
        assert!(!GausDesc::new(99.999, 0.0).outside(&b, 3.0));
        assert!(GausDesc::new(100.0, 0.0).outside(&b, 3.0));
    }
}
