//! wcls-core: Core types for rasterizing ionization deposits onto wires.
//!
//! This crate provides the value types shared by the simulation and I/O
//! crates: binnings, Gaussian descriptors, deposits and their lineage,
//! anode geometry oracles, channel masks, per-channel electron records and
//! the labeled event record they are exchanged through.
//!

pub mod binning;
pub mod depo;
pub mod error;
pub mod event;
pub mod frame;
pub mod gauss;
pub mod geometry;
pub mod mask;
pub mod point;
pub mod records;
pub mod simchannel;
pub mod units;

pub use binning::Binning;
pub use depo::{Depo, DepoSet, Lineage};
pub use error::{Error, Result};
pub use event::{Event, EventVisitor};
pub use frame::{Frame, TaggedTraces, Trace};
pub use gauss::GausDesc;
pub use geometry::{
    find_face, Anode, BoundingBox, ChannelId, Face, PlanarAnode, PlanarFace, PlanarPlane, Plane,
};
pub use mask::{BinRange, ChannelMaskMap, ChannelMasks};
pub use point::Point;
pub use records::{EnergyDeposit, WireRecord};
pub use simchannel::{ChannelAccumulator, Ide, SimChannel, BOGUS_TRACK_ID};
