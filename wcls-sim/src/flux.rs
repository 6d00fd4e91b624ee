//! Deposit flux writer: rasterizes deposits onto channels and time bins.
//!
//! Each queued deposit is located in the first anode face whose sensitive
//! volume contains it. For every plane of that face the deposit's time and
//! pitch Gaussians are sampled into a [`DiffusionPatch`], and each patch
//! cell carrying at least one electron is recorded in the [`SimChannel`] of
//! the wire it lands on. The channel list is written to the event once per
//! visit.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::module_name_repetitions
)]

use crate::patch::{AxisSampling, DiffusionPatch, GaussianDiffusion, PatchConfig};
use log::{debug, warn};
use wcls_core::{
    find_face, units, Anode, Binning, ChannelAccumulator, DepoSet, EnergyDeposit, Error, Event,
    EventVisitor, Face, GausDesc, Plane, Result, SimChannel, BOGUS_TRACK_ID,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cells carrying fewer electrons than this are dropped.
pub const MIN_CHARGE: f64 = 1.0;

/// Drift parameters of the field response.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldResponse {
    /// Nominal drift speed.
    pub speed: f64,
    /// Distance from the response plane to the collection plane.
    pub origin: f64,
}

impl FieldResponse {
    pub fn new(speed: f64, origin: f64) -> Self {
        Self { speed, origin }
    }

    /// Time to drift from the response plane to the collection plane.
    pub fn origin_time(&self) -> f64 {
        self.origin / self.speed
    }
}

/// Configuration for [`DepoFluxWriter`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FluxConfig {
    /// Readout sampling period.
    pub tick: f64,
    pub window_start: f64,
    /// Acceptance window length, truncated to whole ticks.
    pub window_duration: f64,
    /// Gaussian truncation in units of sigma.
    pub nsigma: f64,
    pub reference_time: f64,
    /// Either empty or one additive time offset per plane.
    pub time_offsets: Vec<f64>,
    /// Energy credited to every deposit, zero to use the deposit's own.
    pub energy: f64,
    /// Extra longitudinal smear in ticks.
    pub smear_long: f64,
    /// Extra transverse smear per plane in wire pitches.
    pub smear_tran: [f64; 3],
    /// Label of the ground-truth energy deposits, empty for none.
    pub sed_label: String,
    /// Label of the produced channel list.
    pub simchan_label: String,
    /// Stop at the first plane a deposit misses instead of testing every
    /// plane of the face.
    pub plane_early_exit: bool,
    pub pitch_sampling: AxisSampling,
    pub time_sampling: AxisSampling,
}

impl Default for FluxConfig {
    fn default() -> Self {
        let tick = 0.5 * units::us;
        Self {
            tick,
            window_start: 0.0,
            window_duration: 8096.0 * tick,
            nsigma: 3.0,
            reference_time: 0.0,
            time_offsets: Vec::new(),
            energy: 0.0,
            smear_long: 0.0,
            smear_tran: [0.0; 3],
            sed_label: String::new(),
            simchan_label: "simpleSC".to_string(),
            plane_early_exit: false,
            pitch_sampling: AxisSampling::default(),
            time_sampling: AxisSampling::default(),
        }
    }
}

impl FluxConfig {
    #[must_use]
    pub fn with_tick(mut self, tick: f64) -> Self {
        self.tick = tick;
        self
    }

    #[must_use]
    pub fn with_window(mut self, start: f64, duration: f64) -> Self {
        self.window_start = start;
        self.window_duration = duration;
        self
    }

    #[must_use]
    pub fn with_nsigma(mut self, nsigma: f64) -> Self {
        self.nsigma = nsigma;
        self
    }

    #[must_use]
    pub fn with_time_offsets(mut self, reference_time: f64, offsets: Vec<f64>) -> Self {
        self.reference_time = reference_time;
        self.time_offsets = offsets;
        self
    }

    #[must_use]
    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    #[must_use]
    pub fn with_smear(mut self, long: f64, tran: [f64; 3]) -> Self {
        self.smear_long = long;
        self.smear_tran = tran;
        self
    }

    #[must_use]
    pub fn with_sed_label(mut self, label: impl Into<String>) -> Self {
        self.sed_label = label.into();
        self
    }

    #[must_use]
    pub fn with_simchan_label(mut self, label: impl Into<String>) -> Self {
        self.simchan_label = label.into();
        self
    }

    #[must_use]
    pub fn with_plane_early_exit(mut self, early_exit: bool) -> Self {
        self.plane_early_exit = early_exit;
        self
    }

    /// Checks everything that can be checked without geometry.
    pub fn validate(&self) -> Result<()> {
        if !(self.tick.is_finite() && self.tick > 0.0) {
            return Err(Error::config(format!("tick must be positive, got {}", self.tick)));
        }
        if self.nsigma.is_nan() || self.nsigma < 0.0 {
            return Err(Error::config(format!(
                "nsigma must not be negative, got {}",
                self.nsigma
            )));
        }
        if !(self.time_offsets.is_empty() || self.time_offsets.len() == 3) {
            return Err(Error::config(format!(
                "time_offsets must be empty or hold 3 values, got {}",
                self.time_offsets.len()
            )));
        }
        if self.simchan_label.is_empty() {
            return Err(Error::config("simchan_label must not be empty"));
        }
        self.time_binning().map(|_| ())
    }

    /// Acceptance window as whole ticks starting at `window_start`.
    pub fn time_binning(&self) -> Result<Binning> {
        let nbins = (self.window_duration / self.tick) as i64;
        Binning::new(
            nbins,
            self.window_start,
            self.window_start + nbins as f64 * self.tick,
        )
    }

    /// Whole-tick shift applied to time bins of plane `iplane`.
    pub fn tick_offset(&self, iplane: usize) -> i64 {
        let offset = self.time_offsets.get(iplane).copied().unwrap_or(0.0);
        ((offset - self.reference_time) / self.tick) as i64
    }

    /// Extra transverse smear of plane `iplane`, in wire pitches.
    pub fn smear_tran(&self, iplane: usize) -> f64 {
        self.smear_tran.get(iplane).copied().unwrap_or(0.0)
    }

    pub fn patch_config(&self) -> PatchConfig {
        PatchConfig {
            nsigma: self.nsigma,
            pitch: self.pitch_sampling,
            time: self.time_sampling,
        }
    }
}

/// Track identities credited to one deposit.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Credit {
    track_id: i32,
    orig_track_id: i32,
    energy: f64,
    xyz_cm: [f64; 3],
}

/// Accumulates deposits into per-channel electron records.
///
/// Deposits are queued by [`DepoFluxWriter::push`] (or passed through
/// [`DepoFluxWriter::filter`]) and consumed by the next
/// [`EventVisitor::visit`], which writes a `Vec<SimChannel>` sorted by
/// channel to the event.
#[derive(Debug)]
pub struct DepoFluxWriter<A: Anode> {
    anodes: Vec<A>,
    response: FieldResponse,
    config: FluxConfig,
    tbins: Binning,
    patch: PatchConfig,
    depos: DepoSet,
    channels: ChannelAccumulator,
}

impl<A: Anode> DepoFluxWriter<A> {
    /// Creates a writer over `anodes`.
    ///
    /// Fails with [`Error::Config`] for an empty anode list, a non-positive
    /// drift speed or an invalid [`FluxConfig`].
    pub fn new(anodes: Vec<A>, response: FieldResponse, config: FluxConfig) -> Result<Self> {
        if anodes.is_empty() {
            return Err(Error::config("flux writer requires one or more anodes"));
        }
        if !(response.speed.is_finite() && response.speed > 0.0) {
            return Err(Error::config(format!(
                "drift speed must be positive, got {}",
                response.speed
            )));
        }
        config.validate()?;
        let tbins = config.time_binning()?;
        let patch = config.patch_config();
        Ok(Self {
            anodes,
            response,
            config,
            tbins,
            patch,
            depos: DepoSet::default(),
            channels: ChannelAccumulator::new(),
        })
    }

    pub fn config(&self) -> &FluxConfig {
        &self.config
    }

    pub fn anodes(&self) -> &[A] {
        &self.anodes
    }

    /// The acceptance window binning.
    pub fn time_binning(&self) -> &Binning {
        &self.tbins
    }

    /// Number of primary deposits waiting for the next visit.
    pub fn pending(&self) -> usize {
        self.depos.num_primaries()
    }

    /// Queues every deposit of `set`.
    pub fn push(&mut self, set: DepoSet) {
        self.depos.append(set);
    }

    /// Queues a copy of `set` and hands `set` on unchanged.
    pub fn filter(&mut self, set: DepoSet) -> DepoSet {
        self.push(set.clone());
        set
    }

    /// Rasterizes `depos` and returns the channel records sorted by channel.
    ///
    /// `seds`, when given and non-empty, is indexed by each deposit's
    /// resolved track id to find the true track and origin track ids.
    pub fn accumulate(
        &mut self,
        depos: &DepoSet,
        seds: Option<&[EnergyDeposit]>,
    ) -> Result<Vec<SimChannel>> {
        self.channels.clear();
        let seds = seds.filter(|s| !s.is_empty());
        for index in depos.primaries() {
            if let Err(err) = self.add_depo(depos, index, seds) {
                self.channels.clear();
                return Err(err);
            }
        }
        Ok(self.channels.flush())
    }

    fn credit(
        &self,
        depos: &DepoSet,
        index: usize,
        seds: Option<&[EnergyDeposit]>,
    ) -> Result<Option<Credit>> {
        let (Some(orig), Some(lineage)) =
            (depos.original(index), depos.lineage(index, self.config.energy))
        else {
            return Ok(None);
        };
        let (track_id, orig_track_id) = match seds {
            Some(seds) => {
                let sed = usize::try_from(lineage.track_id)
                    .ok()
                    .and_then(|i| seds.get(i))
                    .ok_or(Error::TrackIndex {
                        index: i64::from(lineage.track_id),
                        len: seds.len(),
                    })?;
                (sed.track_id, sed.orig_track_id)
            }
            None => (lineage.track_id, BOGUS_TRACK_ID),
        };
        Ok(Some(Credit {
            track_id,
            orig_track_id,
            energy: lineage.energy,
            xyz_cm: orig.pos.in_units(units::cm),
        }))
    }

    fn add_depo(
        &mut self,
        depos: &DepoSet,
        index: usize,
        seds: Option<&[EnergyDeposit]>,
    ) -> Result<()> {
        let Some(depo) = depos.get(index) else {
            return Ok(());
        };
        let Some(face) = find_face(&self.anodes, &depo.pos) else {
            return Ok(());
        };

        let speed = self.response.speed;
        let nominal_time = depo.time + self.response.origin_time();
        let extra_long = self.config.smear_long * self.tbins.binsize() * speed;
        let sigma_long = depo.extent_long.hypot(extra_long);
        let time_desc = GausDesc::new(nominal_time, sigma_long / speed);
        if time_desc.outside(&self.tbins, self.config.nsigma) {
            return Ok(());
        }

        let Some(credit) = self.credit(depos, index, seds)? else {
            return Ok(());
        };

        for plane in face.planes() {
            let Some(iplane) = plane.index() else {
                warn!("face {} has a plane with no index, skipping it", face.ident());
                continue;
            };
            let wbins = plane.region_binning();
            let extra_tran = self.config.smear_tran(iplane) * wbins.binsize();
            let sigma_tran = depo.extent_tran.hypot(extra_tran);
            let pitch_desc = GausDesc::new(plane.distance(&depo.pos), sigma_tran);
            if pitch_desc.outside(wbins, self.config.nsigma) {
                if self.config.plane_early_exit {
                    break;
                }
                continue;
            }

            let patch =
                GaussianDiffusion::new(time_desc, pitch_desc).patch(&self.tbins, wbins, &self.patch);
            let tick_offset = self.config.tick_offset(iplane);
            deliver(
                &mut self.channels,
                plane,
                &patch,
                depo.charge,
                tick_offset,
                &credit,
            );
        }
        Ok(())
    }
}

fn deliver<P: Plane>(
    channels: &mut ChannelAccumulator,
    plane: &P,
    patch: &DiffusionPatch,
    depo_charge: f64,
    tick_offset: i64,
    credit: &Credit,
) {
    for (pbin, tbin, weight) in patch.cells() {
        let charge = (weight * depo_charge).abs();
        if charge < MIN_CHARGE {
            continue;
        }
        let Some(channel) = plane.channel(pbin) else {
            continue;
        };
        let Ok(tdc) = u32::try_from(tbin as i64 + tick_offset) else {
            continue;
        };
        channels.channel_mut(channel).add_ionization_electrons(
            credit.track_id,
            tdc,
            charge,
            credit.xyz_cm,
            credit.energy * weight.abs(),
            credit.orig_track_id,
        );
    }
}

impl<A: Anode> EventVisitor for DepoFluxWriter<A> {
    /// Consumes the queued deposits and writes their channel records under
    /// the configured label.
    ///
    /// The queue is emptied whether or not the visit succeeds. On error
    /// nothing is written.
    fn visit(&mut self, event: &mut Event) -> Result<()> {
        let depos = std::mem::take(&mut self.depos);
        let seds = if self.config.sed_label.is_empty() {
            None
        } else {
            Some(
                event
                    .require::<Vec<EnergyDeposit>>(&self.config.sed_label)?
                    .as_slice(),
            )
        };
        let out = self.accumulate(&depos, seds)?;
        debug!(
            "event {}: {} deposits onto {} channels",
            event.id(),
            depos.num_primaries(),
            out.len()
        );
        event.put(self.config.simchan_label.clone(), out);
        Ok(())
    }
}
