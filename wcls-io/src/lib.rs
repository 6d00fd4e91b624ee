//! wcls-io: JSON configuration, geometry and event files for wcls.
//!
//! This crate loads run configurations and anode geometries, reads events
//! from JSON event files and writes per-channel electron records as CSV or
//! JSON lines.
//!

pub mod config;
mod error;
pub mod geometry;
mod reader;
mod writer;

pub use config::RunConfig;
pub use error::{Error, Result};
pub use geometry::Geometry;
pub use reader::{parse_events, read_events};
pub use writer::{OutputFormat, SimChannelWriter};
