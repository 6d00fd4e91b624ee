//! Anode geometry loaded from JSON.
//!
//! Each anode has one or more faces, each face a sensitive box and its wire
//! planes. A plane is either uniform (`pitch`, `nwires`, `first_channel`)
//! or lists its `channels` explicitly, one per wire.
//!
//! ```json
//! {
//!   "anodes": [{
//!     "name": "apa0", "ident": 0,
//!     "faces": [{
//!       "ident": 0,
//!       "sensitive": { "min": [0, -1000, 0], "max": [2000, 1000, 3000] },
//!       "planes": [
//!         { "index": 0, "origin": [0, 0, 0], "pitch_dir": [0, 0, 1],
//!           "pitch": 5.0, "nwires": 600, "first_channel": 0 }
//!       ]
//!     }]
//!   }]
//! }
//! ```
#![allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]

use crate::{Error, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use wcls_core::{Binning, BoundingBox, ChannelId, PlanarAnode, PlanarFace, PlanarPlane, Point};

#[derive(Deserialize)]
struct JsonGeometry {
    anodes: Vec<JsonAnode>,
}

#[derive(Deserialize)]
struct JsonAnode {
    name: String,
    ident: i32,
    faces: Vec<JsonFace>,
}

#[derive(Deserialize)]
struct JsonFace {
    ident: i32,
    sensitive: JsonBox,
    planes: Vec<JsonPlane>,
}

#[derive(Deserialize)]
struct JsonBox {
    min: Point,
    max: Point,
}

#[derive(Deserialize)]
struct JsonPlane {
    /// Absent for planes that carry no induction or collection role.
    index: Option<usize>,
    origin: Point,
    pitch_dir: Point,
    pitch: f64,
    /// Pitch coordinate of the low edge of the first wire bin.
    #[serde(default)]
    pitch_min: f64,
    nwires: Option<u32>,
    first_channel: Option<ChannelId>,
    channels: Option<Vec<ChannelId>>,
}

impl JsonPlane {
    fn build(self) -> Result<PlanarPlane> {
        if !(self.pitch.is_finite() && self.pitch > 0.0) {
            return Err(Error::InvalidFormat(format!(
                "wire pitch must be positive, got {}",
                self.pitch
            )));
        }
        let channels = match (self.channels, self.nwires) {
            (Some(channels), None) => channels,
            (None, Some(nwires)) => {
                let first = self.first_channel.unwrap_or(0);
                (0..nwires).map(|w| first + w).collect()
            }
            (Some(channels), Some(nwires)) if channels.len() == nwires as usize => channels,
            (Some(channels), Some(nwires)) => {
                return Err(Error::InvalidFormat(format!(
                    "plane lists {} channels for {nwires} wires",
                    channels.len()
                )))
            }
            (None, None) => {
                return Err(Error::InvalidFormat(
                    "plane needs either nwires or channels".into(),
                ))
            }
        };
        let nwires = channels.len();
        let binning = Binning::new(
            nwires as i64,
            self.pitch_min,
            self.pitch_min + nwires as f64 * self.pitch,
        )?;
        Ok(PlanarPlane::new(
            self.index,
            self.origin,
            self.pitch_dir,
            binning,
            channels,
        )?)
    }
}

/// Named anodes available to a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    anodes: Vec<(String, PlanarAnode)>,
}

impl Geometry {
    /// Load a geometry from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let json: JsonGeometry = serde_json::from_reader(BufReader::new(file))?;
        Self::from_json_geometry(json)
    }

    /// Load a geometry from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let json: JsonGeometry = serde_json::from_str(json)?;
        Self::from_json_geometry(json)
    }

    fn from_json_geometry(json: JsonGeometry) -> Result<Self> {
        let mut anodes: Vec<(String, PlanarAnode)> = Vec::with_capacity(json.anodes.len());
        for ja in json.anodes {
            if anodes.iter().any(|(name, _)| *name == ja.name) {
                return Err(Error::InvalidFormat(format!(
                    "anode '{}' is defined twice",
                    ja.name
                )));
            }
            let faces = ja
                .faces
                .into_iter()
                .map(|jf| {
                    let planes = jf
                        .planes
                        .into_iter()
                        .map(JsonPlane::build)
                        .collect::<Result<Vec<_>>>()?;
                    Ok(PlanarFace {
                        ident: jf.ident,
                        sensitive: BoundingBox::new(jf.sensitive.min, jf.sensitive.max),
                        planes,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            anodes.push((
                ja.name,
                PlanarAnode {
                    ident: ja.ident,
                    faces,
                },
            ));
        }
        Ok(Self { anodes })
    }

    /// Anode names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.anodes.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&PlanarAnode> {
        self.anodes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, anode)| anode)
    }

    pub fn len(&self) -> usize {
        self.anodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anodes.is_empty()
    }

    /// Clones the named anodes, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PlanarAnode>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).cloned().ok_or_else(|| {
                    Error::CoreError(wcls_core::Error::config(format!(
                        "no anode named '{name}' in geometry"
                    )))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcls_core::{find_face, Face, Plane};

    const TWO_FACES: &str = r#"{
        "anodes": [
            {
                "name": "apa0", "ident": 0,
                "faces": [
                    {
                        "ident": 0,
                        "sensitive": { "min": [0, -100, 0], "max": [1000, 100, 500] },
                        "planes": [
                            { "index": 0, "origin": [0, 0, 0], "pitch_dir": [0, 0, 1],
                              "pitch": 5.0, "nwires": 100, "first_channel": 0 },
                            { "index": 2, "origin": [0, 0, 0], "pitch_dir": [0, 0, 2],
                              "pitch": 5.0, "channels": [7, 9, 11] }
                        ]
                    },
                    {
                        "ident": 1,
                        "sensitive": { "min": [-1000, -100, 0], "max": [0, 100, 500] },
                        "planes": []
                    }
                ]
            },
            { "name": "apa1", "ident": 1, "faces": [] }
        ]
    }"#;

    #[test]
    fn test_load_geometry() {
        let geom = Geometry::from_json(TWO_FACES).unwrap();
        assert_eq!(geom.len(), 2);
        assert_eq!(geom.names().collect::<Vec<_>>(), vec!["apa0", "apa1"]);

        let apa0 = geom.get("apa0").unwrap();
        assert_eq!(apa0.faces.len(), 2);
        let planes = apa0.faces[0].planes();
        assert_eq!(planes[0].channel(42), Some(42));
        assert_eq!(planes[0].region_binning().nbins(), 100);
        assert_eq!(planes[1].index(), Some(2));
        assert_eq!(planes[1].channel(2), Some(11));
        assert_eq!(planes[1].channel(3), None);
        // pitch direction is normalized
        assert!((planes[1].distance(&Point::new(0.0, 0.0, 12.5)) - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_face_lookup() {
        let geom = Geometry::from_json(TWO_FACES).unwrap();
        let anodes = geom.select(&["apa0"]).unwrap();
        let face = find_face(&anodes, &Point::new(-10.0, 0.0, 10.0)).unwrap();
        assert_eq!(face.ident(), 1);
        assert!(find_face(&anodes, &Point::new(2000.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn test_select_unknown_anode() {
        let geom = Geometry::from_json(TWO_FACES).unwrap();
        assert!(geom.select(&["apa0", "apa7"]).is_err());
        assert_eq!(geom.select(&["apa1", "apa0"]).unwrap()[0].ident, 1);
    }

    #[test]
    fn test_invalid_planes() {
        let plane = |body: &str| {
            format!(
                r#"{{"anodes": [{{"name": "a", "ident": 0, "faces": [{{"ident": 0,
                    "sensitive": {{"min": [0, 0, 0], "max": [1, 1, 1]}},
                    "planes": [{{"origin": [0, 0, 0], {body}}}]}}]}}]}}"#
            )
        };
        for body in [
            r#""pitch_dir": [0, 0, 1], "pitch": 5.0"#,
            r#""pitch_dir": [0, 0, 1], "pitch": 0.0, "nwires": 3"#,
            r#""pitch_dir": [0, 0, 0], "pitch": 5.0, "nwires": 3"#,
            r#""pitch_dir": [0, 0, 1], "pitch": 5.0, "nwires": 3, "channels": [1, 2]"#,
        ] {
            assert!(Geometry::from_json(&plane(body)).is_err(), "accepted: {body}");
        }
        let valid = plane(r#""pitch_dir": [0, 0, 1], "pitch": 5.0, "nwires": 3"#);
        assert!(Geometry::from_json(&valid).is_ok());
    }

    #[test]
    fn test_duplicate_names() {
        let json = r#"{"anodes": [
            {"name": "a", "ident": 0, "faces": []},
            {"name": "a", "ident": 1, "faces": []}
        ]}"#;
        assert!(Geometry::from_json(json).is_err());
    }
}
