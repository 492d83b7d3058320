//! Zip packaging of the report documents.

use serde::Serialize;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ReporterError, ReporterResult};

/// Entry name of the run manifest.
pub const REPORT_ENTRY: &str = "report.json";

/// Upload name of the packaged archive.
pub const ARCHIVE_NAME: &str = "report.zip";

/// In-memory archive of JSON documents.
pub struct ReportArchive {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    entries: usize,
}

impl ReportArchive {
    pub fn new() -> Self {
        ReportArchive {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            entries: 0,
        }
    }

    /// Serialize `value` as a compact JSON entry named `name`.
    pub fn add_json<T: Serialize>(&mut self, name: &str, value: &T) -> ReporterResult<()> {
        let json = serde_json::to_vec(value)?;

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer.start_file(name, options)?;
        self.writer
            .write_all(&json)
            .map_err(|e| ReporterError::Archive(format!("Failed to write {}: {}", name, e)))?;

        self.entries += 1;
        debug!("Added {} ({} bytes) to archive", name, json.len());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Write the central directory and return the archive bytes.
    pub fn finish(self) -> ReporterResult<Vec<u8>> {
        let cursor = self.writer.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for ReportArchive {
    fn default() -> Self {
        Self::new()
    }
}
