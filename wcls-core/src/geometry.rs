//! Anode geometry oracles.
//!
//! An anode holds one or more faces. A face has a sensitive volume and an
//! ordered list of wire planes. A plane maps a 3D position to a signed
//! distance along its pitch direction and maps pitch bins (wires) to
//! readout channels. The traits are read-only; the planar types are a
//! straightforward implementation for detectors with straight, uniformly
//! spaced wires.

use crate::{Binning, Error, Point, Result};

/// Readout channel identifier.
pub type ChannelId = u32;

/// A wire plane seen by the flux writer.
pub trait Plane {
    /// Index of this plane within its face, `None` when unassigned.
    fn index(&self) -> Option<usize>;

    /// Binning of the pitch axis, one bin per wire.
    fn region_binning(&self) -> &Binning;

    /// Signed pitch-axis coordinate of `pos`.
    fn distance(&self, pos: &Point) -> f64;

    /// Channel read out by wire `wire`.
    fn channel(&self, wire: usize) -> Option<ChannelId>;

    /// Number of wires.
    fn nwires(&self) -> usize {
        self.region_binning().nbins()
    }
}

/// One sensitive side of an anode.
pub trait Face {
    type Plane: Plane;

    fn ident(&self) -> i32;

    /// True if `pos` lies in the sensitive volume of this face.
    fn inside(&self, pos: &Point) -> bool;

    /// Planes of this face, in readout order.
    fn planes(&self) -> &[Self::Plane];
}

/// An anode plane assembly.
pub trait Anode {
    type Face: Face;

    fn ident(&self) -> i32;

    fn faces(&self) -> &[Self::Face];
}

/// Axis-aligned box, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Creates a box from two opposite corners in any order.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn inside(&self, p: &Point) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }
}

/// Plane of straight wires sharing one pitch direction.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarPlane {
    index: Option<usize>,
    origin: Point,
    pitch_dir: Point,
    binning: Binning,
    channels: Vec<ChannelId>,
}

impl PlanarPlane {
    /// Creates a plane whose pitch coordinate is measured from `origin`
    /// along `pitch_dir` and binned by `binning`, with one channel per bin.
    pub fn new(
        index: Option<usize>,
        origin: Point,
        pitch_dir: Point,
        binning: Binning,
        channels: Vec<ChannelId>,
    ) -> Result<Self> {
        let pitch_dir = pitch_dir
            .norm()
            .ok_or_else(|| Error::config("plane pitch direction has zero length"))?;
        if channels.len() != binning.nbins() {
            return Err(Error::config(format!(
                "plane has {} wire bins but {} channels",
                binning.nbins(),
                channels.len()
            )));
        }
        Ok(Self {
            index,
            origin,
            pitch_dir,
            binning,
            channels,
        })
    }

    /// Creates a plane of `nwires` wires spaced by `pitch`, covering pitch
    /// coordinates `[0, nwires * pitch)`, read out by consecutive channels
    /// starting at `first_channel`.
    pub fn uniform(
        index: usize,
        origin: Point,
        pitch_dir: Point,
        pitch: f64,
        nwires: u32,
        first_channel: ChannelId,
    ) -> Result<Self> {
        let binning = Binning::new(i64::from(nwires), 0.0, f64::from(nwires) * pitch)?;
        let channels = (0..nwires).map(|w| first_channel + w).collect();
        Self::new(Some(index), origin, pitch_dir, binning, channels)
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn pitch_dir(&self) -> Point {
        self.pitch_dir
    }

    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }
}

impl Plane for PlanarPlane {
    fn index(&self) -> Option<usize> {
        self.index
    }

    fn region_binning(&self) -> &Binning {
        &self.binning
    }

    fn distance(&self, pos: &Point) -> f64 {
        (*pos - self.origin).dot(&self.pitch_dir)
    }

    fn channel(&self, wire: usize) -> Option<ChannelId> {
        self.channels.get(wire).copied()
    }
}

/// Face made of planar wire planes and a box-shaped sensitive volume.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarFace {
    pub ident: i32,
    pub sensitive: BoundingBox,
    pub planes: Vec<PlanarPlane>,
}

impl Face for PlanarFace {
    type Plane = PlanarPlane;

    fn ident(&self) -> i32 {
        self.ident
    }

    fn inside(&self, pos: &Point) -> bool {
        self.sensitive.inside(pos)
    }

    fn planes(&self) -> &[PlanarPlane] {
        &self.planes
    }
}

/// Anode made of planar faces.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarAnode {
    pub ident: i32,
    pub faces: Vec<PlanarFace>,
}

impl Anode for PlanarAnode {
    type Face = PlanarFace;

    fn ident(&self) -> i32 {
        self.ident
    }

    fn faces(&self) -> &[PlanarFace] {
        &self.faces
    }
}

/// First face, over all anodes in order, whose sensitive volume holds `pos`.
pub fn find_face<'a, A: Anode>(anodes: &'a [A], pos: &Point) -> Option<&'a A::Face> {
    anodes
        .iter()
        .flat_map(Anode::faces)
        .find(|face| face.inside(pos))
}
