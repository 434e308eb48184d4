//! Progress events for a host UI

use flume::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingEvent {
    /// Processing indicator should appear
    Begin { total: usize },
    ItemFinished { index: usize, ok: bool },
    /// Processing indicator should disappear
    End,
}

/// Optional event channel. `Begin`/`End` are only sent when the loader is shown.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink {
    tx: Option<Sender<ProcessingEvent>>,
    show_loader: bool,
}

impl EventSink {
    pub fn new(tx: Option<Sender<ProcessingEvent>>, show_loader: bool) -> Self {
        Self { tx, show_loader }
    }

    pub fn begin(&self, total: usize) {
        if self.show_loader {
            self.send(ProcessingEvent::Begin { total });
        }
    }

    pub fn item_finished(&self, index: usize, ok: bool) {
        self.send(ProcessingEvent::ItemFinished { index, ok });
    }

    pub fn end(&self) {
        if self.show_loader {
            self.send(ProcessingEvent::End);
        }
    }

    fn send(&self, event: ProcessingEvent) {
        if let Some(tx) = &self.tx {
            // Receiver may be gone; progress is best effort
            let _ = tx.send(event);
        }
    }
}
