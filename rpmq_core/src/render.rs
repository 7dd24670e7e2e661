/*============================================================
  Synavera Project: Syn-Syu
  Module: rpmq_core::render
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render package records as human-readable lines or JSON
    lines and accumulate a per-session summary.

  Security / Safety Notes:
    Writes only to the caller-provided sink (stdout in rpmq).

  Dependencies:
    serde_json for JSON line output.

  Operational Scope:
    Invoked by the entry point for every yielded record.

  Revision History:
    2025-11-12 COD  Authored text and JSON line renderer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic formatting for scripting
    - Explicit error propagation on write failures
============================================================*/

use std::io::Write;

use crate::error::{Result, RpmqError};
use crate::package_info::PackageRecord;

/// Output encoding for yielded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `name-version: 1,234,567`
    Text,
    /// One JSON object per line.
    Json,
}

/// Totals over the records written in one session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QuerySummary {
    pub packages: usize,
    pub total_size: u64,
}

/// Writes records to a sink in the selected format.
pub struct RecordWriter<W: Write> {
    sink: W,
    format: OutputFormat,
    summary: QuerySummary,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W, format: OutputFormat) -> Self {
        Self {
            sink,
            format,
            summary: QuerySummary::default(),
        }
    }

    pub fn write(&mut self, record: &PackageRecord) -> Result<()> {
        let line = render_record(record, self.format)?;
        writeln!(self.sink, "{line}")?;
        self.summary.packages += 1;
        self.summary.total_size = self.summary.total_size.saturating_add(record.size);
        Ok(())
    }

    /// Flush the sink and hand back the session totals.
    pub fn finish(mut self) -> Result<QuerySummary> {
        self.sink.flush()?;
        Ok(self.summary)
    }
}

pub fn render_record(record: &PackageRecord, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "{}-{}: {}",
            record.name,
            record.version,
            format_size(record.size)
        )),
        OutputFormat::Json => serde_json::to_string(record).map_err(|err| {
            RpmqError::Serialization(format!("Failed to encode {}: {err}", record.name))
        }),
    }
}

/// Format a byte count with comma thousands separators.
pub fn format_size(size: u64) -> String {
    let digits = size.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, digit) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}
