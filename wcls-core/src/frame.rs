//! Frames of channel waveforms.

use crate::geometry::ChannelId;
use crate::mask::ChannelMaskMap;
use std::collections::BTreeMap;

/// Waveform of one channel starting at time bin `tbin`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub channel: ChannelId,
    pub tbin: i32,
    pub charge: Vec<f32>,
}

/// A group of traces sharing a tag, with an optional per-trace summary
/// value (for instance a threshold).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaggedTraces {
    pub indices: Vec<usize>,
    pub summary: Vec<f64>,
}

/// A readout frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub ident: i32,
    pub time: f64,
    pub tick: f64,
    pub traces: Vec<Trace>,
    pub frame_tags: Vec<String>,
    pub trace_tags: BTreeMap<String, TaggedTraces>,
    pub masks: ChannelMaskMap,
}

impl Frame {
    pub fn new(ident: i32, time: f64, tick: f64, traces: Vec<Trace>) -> Self {
        Self {
            ident,
            time,
            tick,
            traces,
            frame_tags: Vec::new(),
            trace_tags: BTreeMap::new(),
            masks: ChannelMaskMap::new(),
        }
    }

    pub fn tag_frame(&mut self, tag: impl Into<String>) {
        self.frame_tags.push(tag.into());
    }

    /// Tags the traces at `indices`, with `summary` either empty or one
    /// value per index.
    pub fn tag_traces(&mut self, tag: impl Into<String>, indices: Vec<usize>, summary: Vec<f64>) {
        self.trace_tags
            .insert(tag.into(), TaggedTraces { indices, summary });
    }

    /// Traces carrying `tag`, in tag order.
    pub fn tagged(&self, tag: &str) -> Vec<&Trace> {
        self.trace_tags.get(tag).map_or_else(Vec::new, |t| {
            t.indices
                .iter()
                .filter_map(|&i| self.traces.get(i))
                .collect()
        })
    }
}
