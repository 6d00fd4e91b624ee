//! Run configuration loaded from JSON.
//!
//! A run document has a `flux_writer` section and a `depo_source` section:
//!
//! ```json
//! {
//!   "flux_writer": {
//!     "anodes": ["apa0"],
//!     "field_response": { "speed": 1.6, "origin": 100.0 },
//!     "tick": 500.0,
//!     "smear_tran": 0.5,
//!     "sed_label": "largeant"
//!   },
//!   "depo_source": { "art_tag": "largeant", "model": "electrons" }
//! }
//! ```
//!
//! All quantities are in system units (mm, ns, MeV). Keys left out take
//! their defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use wcls_core::units;
use wcls_sim::{ChargeModel, FieldResponse, FluxConfig, PatchConfig, SourceConfig};

/// A value given either alone or as a list.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(v) => v,
        }
    }
}

// Intermediate structs for the JSON schema
#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonConfig {
    flux_writer: JsonFluxWriter,
    depo_source: JsonDepoSource,
}

#[derive(Deserialize)]
struct JsonFieldResponse {
    speed: f64,
    #[serde(default)]
    origin: f64,
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonFluxWriter {
    anodes: OneOrMany<String>,
    field_response: Option<JsonFieldResponse>,
    tick: f64,
    window_start: f64,
    window_duration: Option<f64>,
    nsigma: f64,
    reference_time: f64,
    time_offsets: Vec<f64>,
    energy: f64,
    smear_long: f64,
    smear_tran: OneOrMany<f64>,
    sed_label: String,
    simchan_label: String,
    plane_early_exit: bool,
    pitch_margin: usize,
    time_margin: usize,
}

impl Default for JsonFluxWriter {
    fn default() -> Self {
        let d = FluxConfig::default();
        Self {
            anodes: OneOrMany::Many(Vec::new()),
            field_response: None,
            tick: d.tick,
            window_start: d.window_start,
            window_duration: None,
            nsigma: d.nsigma,
            reference_time: d.reference_time,
            time_offsets: d.time_offsets,
            energy: d.energy,
            smear_long: d.smear_long,
            smear_tran: OneOrMany::One(0.0),
            sed_label: d.sed_label,
            simchan_label: d.simchan_label,
            plane_early_exit: d.plane_early_exit,
            pitch_margin: 0,
            time_margin: 0,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct JsonDepoSource {
    art_tag: String,
    assn_art_tag: String,
    model: String,
    scale: f64,
    id_is_track: bool,
}

impl Default for JsonDepoSource {
    fn default() -> Self {
        let d = SourceConfig::default();
        Self {
            art_tag: d.art_tag,
            assn_art_tag: d.assn_art_tag,
            model: d.model,
            scale: d.scale,
            id_is_track: d.id_is_track,
        }
    }
}

/// Everything needed to build a deposit source and a flux writer.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Names of the anodes to use, looked up in the geometry.
    pub anodes: Vec<String>,
    pub response: FieldResponse,
    pub flux: FluxConfig,
    pub source: SourceConfig,
}

impl RunConfig {
    /// Load a run configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let json: JsonConfig = serde_json::from_reader(BufReader::new(file))?;
        Self::from_json_config(json)
    }

    /// Load a run configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let json: JsonConfig = serde_json::from_str(json)?;
        Self::from_json_config(json)
    }

    fn from_json_config(config: JsonConfig) -> Result<Self> {
        let fw = config.flux_writer;

        let anodes = fw.anodes.into_vec();
        if anodes.is_empty() {
            return Err(Error::InvalidFormat(
                "flux_writer.anodes must name one or more anodes".into(),
            ));
        }
        let response = fw.field_response.ok_or_else(|| {
            Error::InvalidFormat("flux_writer.field_response is required".into())
        })?;

        let smear_tran = match fw.smear_tran {
            OneOrMany::One(s) => [s; 3],
            OneOrMany::Many(v) => <[f64; 3]>::try_from(v.as_slice()).map_err(|_| {
                Error::InvalidFormat(format!(
                    "flux_writer.smear_tran must be a number or hold 3 values, got {}",
                    v.len()
                ))
            })?,
        };

        let default_patch = PatchConfig::default().with_margins(fw.pitch_margin, fw.time_margin);
        let flux = FluxConfig {
            tick: fw.tick,
            window_start: fw.window_start,
            window_duration: fw.window_duration.unwrap_or(8096.0 * fw.tick),
            nsigma: fw.nsigma,
            reference_time: fw.reference_time,
            time_offsets: fw.time_offsets,
            energy: fw.energy,
            smear_long: fw.smear_long,
            smear_tran,
            sed_label: fw.sed_label,
            simchan_label: fw.simchan_label,
            plane_early_exit: fw.plane_early_exit,
            pitch_sampling: default_patch.pitch,
            time_sampling: default_patch.time,
        };
        flux.validate()?;

        let ds = config.depo_source;
        let source = SourceConfig {
            art_tag: ds.art_tag,
            assn_art_tag: ds.assn_art_tag,
            model: ds.model,
            scale: ds.scale,
            id_is_track: ds.id_is_track,
        };
        if source.art_tag.is_empty() {
            return Err(Error::InvalidFormat("depo_source.art_tag is required".into()));
        }
        ChargeModel::from_name(&source.model)?;

        let config = Self {
            anodes,
            response: FieldResponse::new(response.speed, response.origin),
            flux,
            source,
        };
        log::debug!(
            "run config: {} anodes, tick {} us, window {} ticks",
            config.anodes.len(),
            config.flux.tick / units::us,
            config.flux.time_binning()?.nbins()
        );
        Ok(config)
    }
}
