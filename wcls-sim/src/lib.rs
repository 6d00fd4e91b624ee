//! wcls-sim: Gaussian diffusion of ionization deposits onto wire planes.
//!
//! This crate provides the per-event processing components:
//! - **Diffusion patches** - truncated, separable 2D Gaussian sampling
//! - **Flux writer** - accumulates patches into per-channel electron records
//! - **Deposit source** - energy deposits to deposits, via recombination models
//! - **Frame source** - channel waveforms and bad-channel masks to frames
//!

pub mod depo_source;
pub mod flux;
pub mod frame_source;
pub mod patch;
mod processing;
pub mod recombination;

pub use depo_source::{SimDepoSetSource, SourceConfig};
pub use flux::{DepoFluxWriter, FieldResponse, FluxConfig, MIN_CHARGE};
pub use frame_source::{CookedFrameSource, FrameSourceConfig};
pub use patch::{AxisSampling, DiffusionPatch, GaussianDiffusion, KernelSampling, PatchConfig};
pub use processing::{process_event, process_events};
pub use recombination::{
    BirksRecombination, BoxRecombination, ChargeModel, MipRecombination, PointRecombination,
    StepRecombination,
};

// Re-export the core types the components exchange
pub use wcls_core::{DepoSet, Event, EventVisitor, SimChannel};
