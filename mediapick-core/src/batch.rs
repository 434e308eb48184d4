//! Concurrent materialization of a whole selection
//!
//! One task per entry runs on the picker's rayon pool. Each task writes its
//! outcome into its own slot, so results come back in selection order no
//! matter which finishes first.

use parking_lot::Mutex;
use rayon::ThreadPool;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{ItemError, PickerError, Result};
use crate::events::EventSink;
use crate::materialize::Materializer;
use crate::model::MediaResult;
use crate::provider::SelectionEntry;

/// Per-item outcomes of a batch, successes and failures separated
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successful items, ascending by index
    pub results: Vec<MediaResult>,
    /// Failed items, ascending by index
    pub errors: Vec<PickerError>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// All results, or one aggregate error listing every failed item
    pub fn into_result(self) -> Result<Vec<MediaResult>> {
        if self.errors.is_empty() {
            Ok(self.results)
        } else {
            Err(PickerError::Aggregate(
                self.errors.iter().map(ToString::to_string).collect(),
            ))
        }
    }
}

struct Slots {
    slots: Vec<Mutex<Option<Result<MediaResult>>>>,
}

impl Slots {
    fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| Mutex::new(None)).collect(),
        }
    }

    fn record(&self, index: usize, outcome: Result<MediaResult>) {
        *self.slots[index].lock() = Some(outcome);
    }

    fn into_report(self) -> BatchReport {
        let mut report = BatchReport::default();
        for (index, slot) in self.slots.into_iter().enumerate() {
            match slot.into_inner() {
                Some(Ok(result)) => report.results.push(result),
                Some(Err(err)) => report.errors.push(err),
                None => report
                    .errors
                    .push(ItemError::Load("no outcome recorded".into()).at(index)),
            }
        }
        report
    }
}

pub(crate) fn materialize_batch(
    materializer: &Materializer,
    pool: &ThreadPool,
    entries: &[SelectionEntry],
    events: &EventSink,
) -> BatchReport {
    if entries.is_empty() {
        return BatchReport::default();
    }
    let slots = Slots::new(entries.len());
    events.begin(entries.len());

    pool.scope(|scope| {
        for (index, entry) in entries.iter().enumerate() {
            let slots = &slots;
            scope.spawn(move |_| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| materializer.materialize_entry(index, entry)))
                    .unwrap_or_else(|_| Err(ItemError::Load("item processing panicked".into()).at(index)));
                match &outcome {
                    Ok(result) => log::debug!("item {} ready: {}", index, result.file.uri),
                    Err(e) => log::warn!("{}", e),
                }
                events.item_finished(index, outcome.is_ok());
                slots.record(index, outcome);
            });
        }
    });

    events.end();
    slots.into_report()
}
