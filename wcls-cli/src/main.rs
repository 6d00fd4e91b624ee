//! wcls command-line interface.
//!
//! Rasterizes simulated energy deposits onto wire-plane channels and
//! inspects the geometry, frames and diffusion patches involved.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use wcls_core::{units, Binning, Face, GausDesc, Plane, SimChannel};
use wcls_io::{Geometry, RunConfig, SimChannelWriter};
use wcls_sim::{
    process_event, CookedFrameSource, DepoFluxWriter, EventVisitor, FrameSourceConfig,
    GaussianDiffusion, PatchConfig, SimDepoSetSource,
};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    WclsIo(#[from] wcls_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] wcls_core::Error),

    #[error("event {event}: {source}")]
    Event {
        event: u64,
        source: wcls_core::Error,
    },
}

/// Deposit-to-channel rasterizer for wire-plane detectors.
#[derive(Parser)]
#[command(name = "wcls")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diffuse each event's deposits onto channels and write the result
    Flux {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Anode geometry (JSON)
        #[arg(short, long)]
        geometry: PathBuf,

        /// Input event file (JSON)
        #[arg(short, long)]
        events: PathBuf,

        /// Output file path (.csv or .jsonl)
        #[arg(short, long)]
        output: PathBuf,

        /// Keep going when an event fails
        #[arg(long)]
        keep_going: bool,
    },

    /// Show the anodes, faces and planes of a geometry file
    Info {
        /// Anode geometry (JSON)
        #[arg(short, long)]
        geometry: PathBuf,
    },

    /// Build frames from each event's waveforms and summarize them
    Frames {
        /// Input event file (JSON)
        events: PathBuf,

        /// Waveform label in standard mode
        #[arg(long, conflicts_with = "wiener")]
        art_tag: Option<String>,

        /// Wiener-filtered waveform label, enables imaging mode
        #[arg(long, requires_all = ["gauss", "badmask", "threshold"])]
        wiener: Option<String>,

        /// Gaussian-filtered waveform label
        #[arg(long)]
        gauss: Option<String>,

        /// Bad channel mask label(s)
        #[arg(long)]
        badmask: Vec<String>,

        /// Wiener threshold label
        #[arg(long)]
        threshold: Option<String>,

        /// Pad or truncate traces to this many ticks
        #[arg(long, default_value = "0")]
        nticks: usize,
    },

    /// Print the diffusion patch of a single deposit
    Patch {
        /// Take tick and nsigma from this run configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Drift time at the response plane (us)
        #[arg(long, default_value = "10.0")]
        time: f64,

        /// Longitudinal width (us)
        #[arg(long, default_value = "1.0")]
        time_sigma: f64,

        /// Pitch coordinate (mm)
        #[arg(long, default_value = "0.0")]
        pitch: f64,

        /// Transverse width (mm)
        #[arg(long, default_value = "3.0")]
        pitch_sigma: f64,

        /// Tick size (us)
        #[arg(long, default_value = "0.5")]
        tick: f64,

        /// Wire pitch (mm)
        #[arg(long, default_value = "5.0")]
        wire_pitch: f64,

        /// Truncation in sigmas
        #[arg(long, default_value = "3.0")]
        nsigma: f64,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_flux(
    config: &Path,
    geometry: &Path,
    events: &Path,
    output: &Path,
    keep_going: bool,
) -> Result<()> {
    let run = RunConfig::from_file(config)?;
    let geom = Geometry::from_file(geometry)?;
    let anodes = geom.select(&run.anodes)?;
    info!(
        "{} anodes, tick {} us, {} ticks",
        anodes.len(),
        run.flux.tick / units::us,
        run.flux.time_binning()?.nbins()
    );

    let mut source = SimDepoSetSource::new(run.source.clone())?;
    let mut writer = DepoFluxWriter::new(anodes, run.response, run.flux.clone())?;
    let mut out = SimChannelWriter::create(output)?;
    debug!("writing {:?} to {}", out.format(), output.display());

    let start = Instant::now();
    let mut events = wcls_io::read_events(events)?;
    let mut total_channels = 0usize;
    let mut failed = 0usize;

    for event in &mut events {
        let id = event.id();
        match process_event(event, &mut source, &mut writer) {
            Ok(n) => {
                total_channels += n;
                if let Some(channels) = event.get::<Vec<SimChannel>>(&run.flux.simchan_label) {
                    out.write_event(id, channels)?;
                }
            }
            Err(source) if keep_going => {
                log::warn!("event {id} skipped: {source}");
                failed += 1;
            }
            Err(source) => return Err(CliError::Event { event: id, source }),
        }
    }
    out.flush()?;

    let elapsed = start.elapsed();
    println!(
        "Processed {} events in {:.2}s",
        events.len(),
        elapsed.as_secs_f64()
    );
    println!("Total channels: {}", total_channels);
    println!("Rows written: {}", out.rows());
    if failed > 0 {
        println!("Failed events: {}", failed);
    }
    Ok(())
}

fn show_info(geometry: &Path) -> Result<()> {
    let geom = Geometry::from_file(geometry)?;
    println!("File: {}", geometry.display());
    println!("Anodes: {}", geom.len());
    for name in geom.names() {
        let Some(anode) = geom.get(name) else {
            continue;
        };
        println!("{} (ident {}): {} faces", name, anode.ident, anode.faces.len());
        for face in &anode.faces {
            let b = &face.sensitive;
            println!(
                "  face {}: x [{}, {}] y [{}, {}] z [{}, {}] mm",
                face.ident(),
                b.min.x,
                b.max.x,
                b.min.y,
                b.max.y,
                b.min.z,
                b.max.z
            );
            for plane in face.planes() {
                let bins = plane.region_binning();
                let channels = plane.channels();
                let index = plane
                    .index()
                    .map_or_else(|| "-".to_string(), |i| i.to_string());
                println!(
                    "    plane {}: {} wires, pitch {} mm over [{}, {}], channels {}..={}",
                    index,
                    bins.nbins(),
                    bins.binsize(),
                    bins.min(),
                    bins.max(),
                    channels.first().copied().unwrap_or_default(),
                    channels.last().copied().unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

fn show_frames(events: &Path, config: FrameSourceConfig) -> Result<()> {
    let mut source = CookedFrameSource::new(config)?;
    let mut events = wcls_io::read_events(events)?;
    for event in &mut events {
        source.visit(event)?;
        if source.pending() == 0 {
            println!("event {}: no frame", event.id());
        }
        while let Some(frame) = source.next_frame() {
            println!(
                "event {}: frame {} with {} traces, tags {:?}",
                event.id(),
                frame.ident,
                frame.traces.len(),
                frame.frame_tags
            );
            for (tag, tagged) in &frame.trace_tags {
                println!(
                    "  {}: {} traces, {} summary values",
                    tag,
                    tagged.indices.len(),
                    tagged.summary.len()
                );
            }
            for (name, masks) in &frame.masks {
                println!("  mask '{}': {} channels", name, masks.nchannels());
            }
        }
    }
    Ok(())
}

fn show_patch(
    time: f64,
    time_sigma: f64,
    pitch: f64,
    pitch_sigma: f64,
    tick: f64,
    wire_pitch: f64,
    nsigma: f64,
) -> Result<()> {
    let tick = tick * units::us;
    let time = time * units::us;
    let time_sigma = time_sigma * units::us;
    let ntbins = ((time + 10.0 * time_sigma) / tick).ceil().max(1.0) as i64;
    let tbins = Binning::new(ntbins, 0.0, ntbins as f64 * tick)?;
    let pitch = pitch * units::mm;
    let pitch_sigma = pitch_sigma * units::mm;
    let wire_pitch = wire_pitch * units::mm;
    let half = ((pitch.abs() + 10.0 * pitch_sigma) / wire_pitch).ceil().max(1.0) as i64;
    let pbins = Binning::new(
        2 * half,
        -(half as f64) * wire_pitch,
        half as f64 * wire_pitch,
    )?;

    let gd = GaussianDiffusion::new(
        GausDesc::new(time, time_sigma),
        GausDesc::new(pitch, pitch_sigma),
    );
    let patch = gd.patch(&tbins, &pbins, &PatchConfig::default().with_nsigma(nsigma));
    if patch.is_empty() {
        println!("empty patch");
        return Ok(());
    }
    println!(
        "{} wires x {} ticks, wire offset {}, tick offset {}, sum {:.6}",
        patch.npitch(),
        patch.ntime(),
        patch.pitch_offset(),
        patch.time_offset(),
        patch.sum()
    );
    for (ip, row) in patch.values().outer_iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:.4}", v)).collect();
        println!(
            "{:>6.1} mm | {}",
            pbins.edge((patch.pitch_offset() + ip) as i64) / units::mm,
            cells.join(" ")
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Flux {
            config,
            geometry,
            events,
            output,
            keep_going,
        } => run_flux(&config, &geometry, &events, &output, keep_going),

        Commands::Info { geometry } => show_info(&geometry),

        Commands::Frames {
            events,
            art_tag,
            wiener,
            gauss,
            badmask,
            threshold,
            nticks,
        } => {
            let config = match wiener {
                Some(wiener) => FrameSourceConfig::imaging(
                    wiener,
                    gauss.unwrap_or_default(),
                    badmask,
                    threshold.unwrap_or_default(),
                ),
                None => FrameSourceConfig::standard(art_tag.unwrap_or_default()),
            };
            show_frames(&events, config.with_nticks(nticks))
        }

        Commands::Patch {
            config,
            time,
            time_sigma,
            pitch,
            pitch_sigma,
            tick,
            wire_pitch,
            nsigma,
        } => {
            let (tick, nsigma) = match config {
                Some(path) => {
                    let run = RunConfig::from_file(path)?;
                    (run.flux.tick / units::us, run.flux.nsigma)
                }
                None => (tick, nsigma),
            };
            show_patch(
                time,
                time_sigma,
                pitch,
                pitch_sigma,
                tick,
                wire_pitch,
                nsigma,
            )
        }
    }
}
