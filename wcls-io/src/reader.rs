//! Event files.
//!
//! An event file is a JSON document holding a list of events, each with
//! labeled collections of energy deposits, waveforms, flattened bad-channel
//! masks and per-channel thresholds:
//!
//! ```json
//! {
//!   "events": [{
//!     "id": 1, "time": 0.0,
//!     "deposits": { "largeant": [ { "track_id": 1, "midpoint": [1, 2, 3], "time": 10.0,
//!                                   "energy": 0.3, "num_electrons": 1000 } ] },
//!     "waveforms": { "wiener": [ { "channel": 4, "first_tick": 0, "samples": [0.5] } ] },
//!     "masks": { "bad": [4, 0, 100] },
//!     "thresholds": { "wiener": [1.5] }
//!   }]
//! }
//! ```

use crate::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use wcls_core::{EnergyDeposit, Event, WireRecord};

#[derive(Deserialize)]
struct JsonEventFile {
    events: Vec<JsonEvent>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct JsonEvent {
    id: Option<u64>,
    time: f64,
    deposits: BTreeMap<String, Vec<EnergyDeposit>>,
    waveforms: BTreeMap<String, Vec<WireRecord>>,
    masks: BTreeMap<String, Vec<i32>>,
    thresholds: BTreeMap<String, Vec<f64>>,
}

impl JsonEvent {
    fn into_event(self, default_id: u64) -> Event {
        let mut event = Event::new(self.id.unwrap_or(default_id)).with_time(self.time);
        for (label, seds) in self.deposits {
            event.put(label, seds);
        }
        for (label, records) in self.waveforms {
            event.put(label, records);
        }
        for (label, flat) in self.masks {
            event.put(label, flat);
        }
        for (label, values) in self.thresholds {
            event.put(label, values);
        }
        event
    }
}

/// Reads all events from a JSON event file.
///
/// Events without an `id` are numbered by their position in the file.
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<Event>> {
    let file = File::open(path.as_ref())?;
    let json: JsonEventFile = serde_json::from_reader(BufReader::new(file))?;
    let events = to_events(json);
    log::info!("read {} events from {}", events.len(), path.as_ref().display());
    Ok(events)
}

/// Parses events from a JSON string.
pub fn parse_events(json: &str) -> Result<Vec<Event>> {
    let json: JsonEventFile = serde_json::from_str(json)?;
    Ok(to_events(json))
}

fn to_events(json: JsonEventFile) -> Vec<Event> {
    json.events
        .into_iter()
        .zip(0u64..)
        .map(|(ev, i)| ev.into_event(i))
        .collect()
}
