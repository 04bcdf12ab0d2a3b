//! Ingest progress sinks.
//!
//! Progress is emitted on **stderr** so stdout remains parseable for
//! scripts. The pipeline itself only knows the
//! [`ProgressReporter`](vectordocs_core::progress::ProgressReporter) trait.

use std::io::Write;
use std::sync::Arc;

use vectordocs_core::progress::{IngestProgress, NoProgress, ProgressReporter};

/// Human-friendly progress on stderr: "ingest  upserting  1,230 / 5,000 chunks".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: IngestProgress) {
        let line = match event {
            IngestProgress::Discovered { files } => {
                format!("ingest  found {} files\n", format_number(files))
            }
            IngestProgress::Chunked { files, chunks } => format!(
                "ingest  analyzed {} files into {} chunks\n",
                format_number(files),
                format_number(chunks)
            ),
            IngestProgress::Upserting { processed, total } => format!(
                "ingest  upserting  {} / {} chunks\n",
                format_number(processed),
                format_number(total)
            ),
            IngestProgress::Completed { chunks, .. } => {
                format!("ingest  done  {} chunks loaded\n", format_number(chunks))
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: IngestProgress) {
        let obj = event_json(&event);
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

fn event_json(event: &IngestProgress) -> serde_json::Value {
    match event {
        IngestProgress::Discovered { files } => serde_json::json!({
            "event": "progress",
            "phase": "discovered",
            "files": files
        }),
        IngestProgress::Chunked { files, chunks } => serde_json::json!({
            "event": "progress",
            "phase": "chunked",
            "files": files,
            "chunks": chunks
        }),
        IngestProgress::Upserting { processed, total } => serde_json::json!({
            "event": "progress",
            "phase": "upserting",
            "n": processed,
            "total": total
        }),
        IngestProgress::Completed { files, chunks } => serde_json::json!({
            "event": "progress",
            "phase": "completed",
            "files": files,
            "chunks": chunks
        }),
    }
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Arc<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Arc::new(NoProgress),
            ProgressMode::Human => Arc::new(StderrProgress),
            ProgressMode::Json => Arc::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn json_events_carry_counts() {
        let v = event_json(&IngestProgress::Upserting {
            processed: 10,
            total: 25,
        });
        assert_eq!(v["phase"], "upserting");
        assert_eq!(v["n"], 10);
        assert_eq!(v["total"], 25);
    }
}
