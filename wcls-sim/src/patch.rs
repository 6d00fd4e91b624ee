//! Truncated 2D Gaussian diffusion patches.
//!
//! A deposit's charge is spread over a plane's pitch axis and the readout
//! time axis by two independent Gaussians. The patch covers only the bins
//! within `nsigma` of the center on each axis and holds, per (pitch, time)
//! cell, the probability mass landing there. Mass lost to truncation is not
//! redistributed.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::module_name_repetitions
)]

use ndarray::Array2;
use std::ops::Range;
use wcls_core::{Binning, GausDesc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the Gaussian is evaluated within each bin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KernelSampling {
    /// Exact normal mass between the bin edges.
    #[default]
    Integrated,
    /// Density sampled at `per_bin` sub-bin centers.
    Sampled { per_bin: usize },
}

/// Per-axis sampling options.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisSampling {
    /// Whole bins of padding added on each side of the truncated range.
    pub margin: usize,
    pub kernel: KernelSampling,
}

/// Patch construction options.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PatchConfig {
    /// Truncation in units of sigma.
    pub nsigma: f64,
    pub pitch: AxisSampling,
    pub time: AxisSampling,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            nsigma: 3.0,
            pitch: AxisSampling::default(),
            time: AxisSampling::default(),
        }
    }
}

impl PatchConfig {
    #[must_use]
    pub fn with_nsigma(mut self, nsigma: f64) -> Self {
        self.nsigma = nsigma;
        self
    }

    #[must_use]
    pub fn with_margins(mut self, pitch: usize, time: usize) -> Self {
        self.pitch.margin = pitch;
        self.time.margin = time;
        self
    }

    #[must_use]
    pub fn with_kernel(mut self, kernel: KernelSampling) -> Self {
        self.pitch.kernel = kernel;
        self.time.kernel = kernel;
        self
    }
}

/// Fractional charge of one deposit over a rectangle of (pitch, time) bins.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionPatch {
    values: Array2<f64>,
    pitch_offset: usize,
    time_offset: usize,
}

impl DiffusionPatch {
    fn empty() -> Self {
        Self {
            values: Array2::zeros((0, 0)),
            pitch_offset: 0,
            time_offset: 0,
        }
    }

    /// Cell values, rows are pitch bins and columns are time bins.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Absolute pitch bin of row 0.
    pub fn pitch_offset(&self) -> usize {
        self.pitch_offset
    }

    /// Absolute time bin of column 0.
    pub fn time_offset(&self) -> usize {
        self.time_offset
    }

    /// Number of pitch rows.
    pub fn npitch(&self) -> usize {
        self.values.nrows()
    }

    /// Number of time columns.
    pub fn ntime(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total mass in the patch.
    pub fn sum(&self) -> f64 {
        self.values.sum()
    }

    /// Cells as `(absolute pitch bin, absolute time bin, value)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.values
            .indexed_iter()
            .map(move |((p, t), &v)| (p + self.pitch_offset, t + self.time_offset, v))
    }
}

/// A deposit's Gaussian extent in time and in pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianDiffusion {
    pub time: GausDesc,
    pub pitch: GausDesc,
}

impl GaussianDiffusion {
    pub fn new(time: GausDesc, pitch: GausDesc) -> Self {
        Self { time, pitch }
    }

    /// Samples the separable kernel onto `tbins` x `pbins`.
    ///
    /// The patch is empty when either axis falls entirely outside its
    /// binning. A zero sigma collapses that axis to the single bin holding
    /// the center, with weight 1.
    pub fn patch(&self, tbins: &Binning, pbins: &Binning, config: &PatchConfig) -> DiffusionPatch {
        let pitch = axis_weights(&self.pitch, pbins, config.nsigma, &config.pitch);
        let time = axis_weights(&self.time, tbins, config.nsigma, &config.time);
        let (Some((poffset, pweights)), Some((toffset, tweights))) = (pitch, time) else {
            return DiffusionPatch::empty();
        };
        let values = Array2::from_shape_fn((pweights.len(), tweights.len()), |(ip, it)| {
            pweights[ip] * tweights[it]
        });
        DiffusionPatch {
            values,
            pitch_offset: poffset,
            time_offset: toffset,
        }
    }
}

/// Bins covered on one axis, before margins.
fn covered_bins(desc: &GausDesc, binning: &Binning, nsigma: f64) -> Range<usize> {
    if desc.is_delta() {
        return binning.index(desc.center).map_or(0..0, |b| b..b + 1);
    }
    let (lo, hi) = desc.sigma_range(nsigma);
    binning.sample_bin_range(lo, hi)
}

fn axis_weights(
    desc: &GausDesc,
    binning: &Binning,
    nsigma: f64,
    sampling: &AxisSampling,
) -> Option<(usize, Vec<f64>)> {
    let core = covered_bins(desc, binning, nsigma);
    if core.is_empty() {
        return None;
    }
    let first = core.start.saturating_sub(sampling.margin);
    let last = (core.end + sampling.margin).min(binning.nbins());
    let n = last - first;

    let weights = if desc.is_delta() {
        let mut w = vec![0.0; n];
        w[core.start - first] = 1.0;
        w
    } else {
        let start = binning.edge(first as i64);
        let step = binning.binsize();
        match sampling.kernel {
            KernelSampling::Integrated => desc.binint(start, step, n),
            KernelSampling::Sampled { per_bin } => desc.sampled(start, step, n, per_bin),
        }
    };
    Some((first, weights))
}
