//! High-level helper chaining the deposit source into the flux writer.

use crate::depo_source::SimDepoSetSource;
use crate::flux::DepoFluxWriter;
use wcls_core::{Anode, Event, EventVisitor, Result, SimChannel};

/// Runs one event through `source` and `writer`.
///
/// The source reads the event's deposits, every set it produces is queued
/// on the writer, and the writer then stores its channel list in the event.
/// Returns the number of channels written. On error the event receives no
/// channel list.
pub fn process_event<A: Anode>(
    event: &mut Event,
    source: &mut SimDepoSetSource,
    writer: &mut DepoFluxWriter<A>,
) -> Result<usize> {
    source.visit(event)?;
    while let Some(set) = source.next_set() {
        writer.push(set);
    }
    writer.visit(event)?;
    Ok(event
        .get::<Vec<SimChannel>>(&writer.config().simchan_label)
        .map_or(0, Vec::len))
}

/// Runs every event in turn, stopping at the first failure.
pub fn process_events<'a, A, I>(
    events: I,
    source: &mut SimDepoSetSource,
    writer: &mut DepoFluxWriter<A>,
) -> Result<usize>
where
    A: Anode,
    I: IntoIterator<Item = &'a mut Event>,
{
    events.into_iter().try_fold(0, |total, event| {
        process_event(event, source, writer).map(|n| total + n)
    })
}
