//! Ingest progress events.
//!
//! The ingest pipeline reports progress through a [`ProgressReporter`]
//! instead of writing to a console. Sinks (stderr text, JSON lines, test
//! recorders) live with the caller. Any `Fn(IngestProgress)` closure is a
//! reporter.

/// A single progress event emitted by the ingest pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestProgress {
    /// The walker finished listing files. Chunk count not yet known.
    Discovered { files: usize },
    /// All files were chunked; embedding and upserting is about to start.
    Chunked { files: usize, chunks: usize },
    /// `processed` of `total` chunks have been embedded and persisted.
    Upserting { processed: usize, total: usize },
    /// Every chunk was persisted.
    Completed { files: usize, chunks: usize },
}

/// Receives progress events. Called from the ingest pipeline, in order.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: IngestProgress);
}

impl<F> ProgressReporter for F
where
    F: Fn(IngestProgress) + Send + Sync,
{
    fn report(&self, event: IngestProgress) {
        self(event)
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: IngestProgress) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_are_reporters() {
        let seen = Mutex::new(Vec::new());
        let reporter = |event: IngestProgress| seen.lock().unwrap().push(event);
        reporter.report(IngestProgress::Discovered { files: 2 });
        NoProgress.report(IngestProgress::Discovered { files: 3 });
        assert_eq!(
            seen.into_inner().unwrap(),
            vec![IngestProgress::Discovered { files: 2 }]
        );
    }
}
