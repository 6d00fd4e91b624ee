//! Deposit source: turns the event's energy deposits into a [`DepoSet`].
#![allow(clippy::module_name_repetitions)]

use crate::recombination::ChargeModel;
use log::{debug, warn};
use wcls_core::{Depo, DepoSet, EnergyDeposit, Error, Event, EventVisitor, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`SimDepoSetSource`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SourceConfig {
    /// Label of the energy deposits to convert.
    pub art_tag: String,
    /// Label of deposits aligned one to one with `art_tag`, describing an
    /// earlier stage of each deposit. Empty for none.
    pub assn_art_tag: String,
    /// Recombination model name, see [`ChargeModel::from_name`].
    pub model: String,
    /// Multiplies every electron count.
    pub scale: f64,
    /// Use the record's track id as deposit id, otherwise its index in the
    /// input collection.
    pub id_is_track: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            art_tag: String::new(),
            assn_art_tag: String::new(),
            model: String::new(),
            scale: 1.0,
            id_is_track: true,
        }
    }
}

impl SourceConfig {
    #[must_use]
    pub fn with_art_tag(mut self, tag: impl Into<String>) -> Self {
        self.art_tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_assn_art_tag(mut self, tag: impl Into<String>) -> Self {
        self.assn_art_tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn with_id_is_track(mut self, id_is_track: bool) -> Self {
        self.id_is_track = id_is_track;
        self
    }
}

/// Reads `Vec<EnergyDeposit>` from each event and holds the resulting
/// deposit set until it is taken with [`SimDepoSetSource::next_set`].
#[derive(Debug)]
pub struct SimDepoSetSource {
    config: SourceConfig,
    model: ChargeModel,
    pending: Option<DepoSet>,
    count: i32,
}

impl SimDepoSetSource {
    /// Creates a source using the model named in `config`.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let model = ChargeModel::from_name(&config.model)?;
        Self::with_model(config, model)
    }

    /// Creates a source with an explicitly supplied charge model. The
    /// configured model name is ignored.
    pub fn with_model(config: SourceConfig, model: ChargeModel) -> Result<Self> {
        if config.art_tag.is_empty() {
            return Err(Error::config("deposit source requires an art_tag"));
        }
        Ok(Self {
            config,
            model,
            pending: None,
            count: 0,
        })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Number of sets handed out so far.
    pub fn count(&self) -> i32 {
        self.count
    }

    /// Takes the set produced by the last visit, if not yet taken.
    pub fn next_set(&mut self) -> Option<DepoSet> {
        let set = self.pending.take()?;
        self.count += 1;
        Some(set)
    }

    fn convert(&self, sed: &EnergyDeposit, index: usize) -> Result<Depo> {
        let id = if self.config.id_is_track {
            sed.track_id
        } else {
            i32::try_from(index)
                .map_err(|_| Error::config(format!("deposit index {index} exceeds the id range")))?
        };
        let charge = self.config.scale * self.model.electrons(sed);
        Ok(Depo::new(sed.system_time(), sed.position(), charge)
            .with_energy(sed.system_energy())
            .with_id(id)
            .with_pdg(sed.pdg))
    }

    /// Builds the deposit set for `seds`, each deposit linked to its
    /// counterpart in `assn` when given. Deposits come out in ascending
    /// time order of `seds`.
    pub fn build(&self, seds: &[EnergyDeposit], assn: Option<&[EnergyDeposit]>) -> Result<DepoSet> {
        if let Some(assn) = assn {
            if assn.len() != seds.len() {
                return Err(Error::InputSizeMismatch {
                    primary: seds.len(),
                    associated: assn.len(),
                });
            }
        }

        let mut order: Vec<usize> = (0..seds.len()).collect();
        order.sort_by(|&a, &b| seds[a].time.total_cmp(&seds[b].time));

        let capacity = if assn.is_some() { 2 * seds.len() } else { seds.len() };
        let mut set = DepoSet::with_capacity(self.count, capacity);
        for index in order {
            let mut depo = self.convert(&seds[index], index)?;
            if let Some(assn) = assn {
                let prior = set.push(self.convert(&assn[index], index)?)?;
                depo = depo.with_prior(prior);
            }
            set.push(depo)?;
        }
        Ok(set)
    }
}

impl EventVisitor for SimDepoSetSource {
    fn visit(&mut self, event: &mut Event) -> Result<()> {
        let seds = event.require::<Vec<EnergyDeposit>>(&self.config.art_tag)?;
        debug!(
            "event {}: {} deposits from \"{}\"",
            event.id(),
            seds.len(),
            self.config.art_tag
        );

        if let Some(old) = self.pending.take() {
            if old.num_primaries() > 0 {
                warn!(
                    "dropping {} unused deposits from a previous event",
                    old.num_primaries()
                );
            }
        }

        let assn = if self.config.assn_art_tag.is_empty() {
            None
        } else {
            let assn = event.require::<Vec<EnergyDeposit>>(&self.config.assn_art_tag)?;
            debug!(
                "event {}: {} associated deposits from \"{}\"",
                event.id(),
                assn.len(),
                self.config.assn_art_tag
            );
            Some(assn.as_slice())
        };

        self.pending = Some(self.build(seds, assn)?);
        Ok(())
    }
}
