//! Frame source: wraps the event's per-channel waveforms in a [`Frame`].
//!
//! In standard mode one waveform collection becomes one frame. In imaging
//! mode the Wiener and Gaussian filtered waveforms are concatenated into a
//! single frame, tagged per group, with the Wiener thresholds as the trace
//! summary and the bad-channel masks merged into one channel mask map.
#![allow(clippy::module_name_repetitions)]

use log::debug;
use std::collections::VecDeque;
use wcls_core::mask::merge_all;
use wcls_core::{
    units, ChannelMasks, Error, Event, EventVisitor, Frame, Result, Trace, WireRecord,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`CookedFrameSource`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrameSourceConfig {
    /// Label of the waveforms in standard mode.
    pub art_tag: String,
    pub tick: f64,
    /// Tags applied to every produced frame.
    pub frame_tags: Vec<String>,
    /// Truncate or zero-pad every trace to this many ticks, 0 to keep.
    pub nticks: usize,
    pub imaging: bool,
    pub wiener_label: String,
    pub gauss_label: String,
    pub badmask_labels: Vec<String>,
    pub threshold_label: String,
    /// Name of the merged channel mask in imaging frames.
    pub cmm_tag: String,
    pub wiener_tag: String,
    pub gauss_tag: String,
}

impl Default for FrameSourceConfig {
    fn default() -> Self {
        Self {
            art_tag: String::new(),
            tick: 0.5 * units::us,
            frame_tags: vec!["orig".to_string()],
            nticks: 0,
            imaging: false,
            wiener_label: String::new(),
            gauss_label: String::new(),
            badmask_labels: Vec::new(),
            threshold_label: String::new(),
            cmm_tag: String::new(),
            wiener_tag: "wiener".to_string(),
            gauss_tag: "gauss".to_string(),
        }
    }
}

impl FrameSourceConfig {
    /// Standard mode reading waveforms labeled `art_tag`.
    pub fn standard(art_tag: impl Into<String>) -> Self {
        Self {
            art_tag: art_tag.into(),
            ..Self::default()
        }
    }

    /// Imaging mode.
    pub fn imaging(
        wiener: impl Into<String>,
        gauss: impl Into<String>,
        badmasks: Vec<String>,
        threshold: impl Into<String>,
    ) -> Self {
        Self {
            imaging: true,
            wiener_label: wiener.into(),
            gauss_label: gauss.into(),
            badmask_labels: badmasks,
            threshold_label: threshold.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_nticks(mut self, nticks: usize) -> Self {
        self.nticks = nticks;
        self
    }

    #[must_use]
    pub fn with_frame_tags(mut self, tags: Vec<String>) -> Self {
        self.frame_tags = tags;
        self
    }

    #[must_use]
    pub fn with_cmm_tag(mut self, tag: impl Into<String>) -> Self {
        self.cmm_tag = tag.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.imaging {
            if self.art_tag.is_empty() {
                return Err(Error::config("frame source requires an art_tag"));
            }
            return Ok(());
        }
        if self.wiener_label.is_empty() {
            return Err(Error::config("imaging frame source requires a wiener label"));
        }
        if self.gauss_label.is_empty() {
            return Err(Error::config("imaging frame source requires a gauss label"));
        }
        if self.badmask_labels.is_empty() {
            return Err(Error::config("imaging frame source requires bad mask labels"));
        }
        if self.badmask_labels.iter().any(String::is_empty) {
            return Err(Error::config("bad mask labels must not be empty"));
        }
        if self.threshold_label.is_empty() {
            return Err(Error::config("imaging frame source requires a threshold label"));
        }
        Ok(())
    }
}

/// Waveform of `record` starting at tick 0, truncated or zero-padded to
/// `nticks` when non-zero.
fn make_trace(record: &WireRecord, nticks: usize) -> Trace {
    let mut charge = record.samples.clone();
    if nticks > 0 {
        charge.resize(nticks, 0.0);
    }
    Trace {
        channel: record.channel,
        tbin: 0,
        charge,
    }
}

/// Reads waveform collections from each event and queues frames built
/// from them.
#[derive(Debug)]
pub struct CookedFrameSource {
    config: FrameSourceConfig,
    frames: VecDeque<Frame>,
}

impl CookedFrameSource {
    pub fn new(config: FrameSourceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            frames: VecDeque::new(),
        })
    }

    pub fn config(&self) -> &FrameSourceConfig {
        &self.config
    }

    /// Pops the oldest queued frame.
    pub fn next_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    /// Number of frames waiting.
    pub fn pending(&self) -> usize {
        self.frames.len()
    }

    /// Fails when the event id does not fit a frame ident.
    fn new_frame(&self, event: &Event, traces: Vec<Trace>) -> Result<Frame> {
        let ident = i32::try_from(event.id()).map_err(|_| {
            Error::config(format!("event id {} does not fit a frame ident", event.id()))
        })?;
        let mut frame = Frame::new(ident, event.time(), self.config.tick, traces);
        for tag in &self.config.frame_tags {
            frame.tag_frame(tag.clone());
        }
        Ok(frame)
    }

    fn standard_frame(&self, event: &Event) -> Result<Option<Frame>> {
        let records = event.require::<Vec<WireRecord>>(&self.config.art_tag)?;
        if records.is_empty() {
            return Ok(None);
        }
        debug!(
            "event {}: {} waveforms from \"{}\"",
            event.id(),
            records.len(),
            self.config.art_tag
        );
        let traces = records
            .iter()
            .map(|r| make_trace(r, self.config.nticks))
            .collect();
        Ok(Some(self.new_frame(event, traces)?))
    }

    fn imaging_frame(&self, event: &Event) -> Result<Option<Frame>> {
        let mut masks = Vec::with_capacity(self.config.badmask_labels.len());
        for label in &self.config.badmask_labels {
            let flat = event.require::<Vec<i32>>(label)?;
            if flat.is_empty() {
                debug!("event {}: bad mask \"{label}\" is empty", event.id());
                return Ok(None);
            }
            masks.push(ChannelMasks::from_triples(flat)?);
        }

        let wiener = event.require::<Vec<WireRecord>>(&self.config.wiener_label)?;
        if wiener.is_empty() {
            return Ok(None);
        }
        let gauss = event.require::<Vec<WireRecord>>(&self.config.gauss_label)?;
        if gauss.is_empty() {
            return Ok(None);
        }
        let thresholds = event.require::<Vec<f64>>(&self.config.threshold_label)?;
        if thresholds.is_empty() {
            return Ok(None);
        }
        debug!(
            "event {}: {} wiener and {} gauss waveforms",
            event.id(),
            wiener.len(),
            gauss.len()
        );

        let nticks = self.config.nticks;
        let traces: Vec<Trace> = wiener
            .iter()
            .chain(gauss.iter())
            .map(|r| make_trace(r, nticks))
            .collect();
        let wiener_indices: Vec<usize> = (0..wiener.len()).collect();
        let gauss_indices: Vec<usize> = (wiener.len()..traces.len()).collect();

        let mut frame = self.new_frame(event, traces)?;
        frame
            .masks
            .insert(self.config.cmm_tag.clone(), merge_all(&masks));
        frame.tag_traces(self.config.wiener_tag.clone(), wiener_indices, thresholds.clone());
        frame.tag_traces(self.config.gauss_tag.clone(), gauss_indices, Vec::new());
        Ok(Some(frame))
    }
}

impl EventVisitor for CookedFrameSource {
    fn visit(&mut self, event: &mut Event) -> Result<()> {
        let frame = if self.config.imaging {
            self.imaging_frame(event)?
        } else {
            self.standard_frame(event)?
        };
        if let Some(frame) = frame {
            self.frames.push_back(frame);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcls_core::BinRange;

    fn wires(first: u32, n: u32, len: usize) -> Vec<WireRecord> {
        (first..first + n)
            .map(|channel| WireRecord {
                channel,
                first_tick: 0,
                samples: vec![1.0; len],
            })
            .collect()
    }

    #[test]
    fn test_config_validation() {
        assert!(CookedFrameSource::new(FrameSourceConfig::default()).is_err());
        assert!(CookedFrameSource::new(FrameSourceConfig::standard("caldata")).is_ok());
        let no_masks = FrameSourceConfig::imaging("w", "g", Vec::new(), "th");
        assert!(matches!(no_masks.validate(), Err(Error::Config(_))));
        let blank_mask = FrameSourceConfig::imaging("w", "g", vec![String::new()], "th");
        assert!(blank_mask.validate().is_err());
        let no_threshold = FrameSourceConfig::imaging("w", "g", vec!["bad".into()], "");
        assert!(no_threshold.validate().is_err());
    }

    #[test]
    fn test_standard_pads_and_truncates() {
        let mut src =
            CookedFrameSource::new(FrameSourceConfig::standard("caldata").with_nticks(6)).unwrap();
        let mut ev = Event::new(4).with_time(2.5);
        let mut records = wires(10, 2, 4);
        records[1].samples = vec![2.0; 9];
        ev.put("caldata", records);
        src.visit(&mut ev).unwrap();

        let frame = src.next_frame().unwrap();
        assert_eq!(frame.ident, 4);
        assert_eq!(frame.frame_tags, vec!["orig".to_string()]);
        assert_eq!(frame.traces[0].charge, vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(frame.traces[1].charge, vec![2.0; 6]);
        assert!(src.next_frame().is_none());
    }

    #[test]
    fn test_event_id_beyond_frame_ident() {
        let mut src = CookedFrameSource::new(FrameSourceConfig::standard("caldata")).unwrap();
        let mut ev = Event::new(u64::from(u32::MAX) + 1);
        ev.put("caldata", wires(10, 2, 4));
        assert!(matches!(src.visit(&mut ev), Err(Error::Config(_))));
        assert_eq!(src.pending(), 0);

        let mut ev = Event::new(2_147_483_647);
        ev.put("caldata", wires(10, 2, 4));
        src.visit(&mut ev).unwrap();
        assert_eq!(src.next_frame().unwrap().ident, i32::MAX);
    }

    #[test]
    fn test_standard_empty_and_missing() {
        let mut src = CookedFrameSource::new(FrameSourceConfig::standard("caldata")).unwrap();
        let mut ev = Event::new(0);
        assert!(matches!(
            src.visit(&mut ev),
            Err(Error::InputMissing { .. })
        ));
        ev.put("caldata", Vec::<WireRecord>::new());
        src.visit(&mut ev).unwrap();
        assert_eq!(src.pending(), 0);
    }

    fn imaging_event() -> Event {
        let mut ev = Event::new(1);
        ev.put("wiener", wires(0, 3, 5));
        ev.put("gauss", wires(0, 3, 5));
        ev.put("thresholds", vec![1.5, 2.5, 3.5]);
        ev.put("bad1", vec![5, 10, 20, 6, 0, 9]);
        ev.put("bad2", vec![5, 15, 25]);
        ev
    }

    fn imaging_source() -> CookedFrameSource {
        let cfg = FrameSourceConfig::imaging(
            "wiener",
            "gauss",
            vec!["bad1".into(), "bad2".into()],
            "thresholds",
        )
        .with_cmm_tag("bad");
        CookedFrameSource::new(cfg).unwrap()
    }

    #[test]
    fn test_imaging_frame() {
        let mut src = imaging_source();
        let mut ev = imaging_event();
        src.visit(&mut ev).unwrap();
        let frame = src.next_frame().unwrap();

        assert_eq!(frame.traces.len(), 6);
        let wiener = &frame.trace_tags["wiener"];
        assert_eq!(wiener.indices, vec![0, 1, 2]);
        assert_eq!(wiener.summary, vec![1.5, 2.5, 3.5]);
        assert_eq!(frame.trace_tags["gauss"].indices, vec![3, 4, 5]);
        assert_eq!(frame.tagged("gauss").len(), 3);

        let masks = &frame.masks["bad"];
        assert_eq!(masks.nchannels(), 2);
        assert_eq!(masks.get(5), &[BinRange::new(10, 20), BinRange::new(15, 25)]);
    }

    #[test]
    fn test_imaging_empty_mask_gives_no_frame() {
        let mut src = imaging_source();
        let mut ev = imaging_event();
        ev.put("bad2", Vec::<i32>::new());
        src.visit(&mut ev).unwrap();
        assert!(src.next_frame().is_none());
    }

    #[test]
    fn test_imaging_malformed_mask() {
        let mut src = imaging_source();
        let mut ev = imaging_event();
        ev.put("bad1", vec![1, 2]);
        assert_eq!(
            src.visit(&mut ev).unwrap_err(),
            Error::MalformedMask { len: 2 }
        );
    }
}
