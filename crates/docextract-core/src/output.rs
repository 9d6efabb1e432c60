//! Extraction records and their JSON / JSON Lines serialization.

use crate::error::ExtractError;
use crate::extractor::ExtractionResult;
use crate::model::ModelId;
use crate::render::RenderMethod;
use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

/// Output format for extraction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON array holding every record
    Json,
    /// One record per line
    #[default]
    JsonLines,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Ok(Self::JsonLines),
            other => Err(format!("unknown output format '{other}' (expected json or jsonl)")),
        }
    }
}

/// Outcome of extracting one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRecord {
    /// Source file(s) of the document, one per page
    pub source: Vec<String>,
    pub model: String,
    pub method: RenderMethod,
    pub pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionRecord {
    pub fn new(
        source: Vec<String>,
        model: &ModelId,
        method: RenderMethod,
        outcome: Result<ExtractionResult, ExtractError>,
    ) -> Self {
        let pages = source.len();
        let (fields, error) = match outcome {
            Ok(fields) => (Some(fields), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            source,
            model: model.name().to_string(),
            method,
            pages,
            fields,
            error,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Writes extraction records as they complete.
///
/// JSON Lines records are written immediately. JSON records are buffered
/// and emitted as one array by [`OutputWriter::finish`].
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<ExtractionRecord>,
    succeeded: usize,
    failed: usize,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn write(&mut self, record: ExtractionRecord) -> io::Result<()> {
        if record.is_ok() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        match self.format {
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, &record).map_err(io::Error::other)?;
                writeln!(self.writer)
            }
            OutputFormat::Json => {
                self.pending.push(record);
                Ok(())
            }
        }
    }

    /// Emit buffered records and flush. Returns (succeeded, failed).
    pub fn finish(mut self) -> io::Result<(usize, usize)> {
        if self.format == OutputFormat::Json {
            if self.pretty {
                serde_json::to_writer_pretty(&mut self.writer, &self.pending)
                    .map_err(io::Error::other)?;
            } else {
                serde_json::to_writer(&mut self.writer, &self.pending).map_err(io::Error::other)?;
            }
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok((self.succeeded, self.failed))
    }
}
