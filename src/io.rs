//! Splitting AmiraMesh sources into header text and raw payload

use crate::error::{AmiraError, Result};
use bytes::Bytes;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

/// Line separating the text header from the data section
pub const DATA_SECTION_SENTINEL: &str = "# Data section follows\n";

/// Header lines up to and including the sentinel, newlines preserved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeader {
    lines: Vec<String>,
}

impl RawHeader {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Read a header and payload from any buffered source.
///
/// Lines are accumulated until one equals [`DATA_SECTION_SENTINEL`]; the
/// line right after it is the `@1` separator and is discarded. Everything
/// else is the payload.
pub fn read_sections_from<R: BufRead>(mut reader: R) -> Result<(RawHeader, Bytes)> {
    let mut lines = Vec::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Err(AmiraError::MalformedFile(format!(
                "no {:?} line after {} header lines",
                DATA_SECTION_SENTINEL.trim_end(),
                lines.len()
            )));
        }
        let is_sentinel = line == DATA_SECTION_SENTINEL.as_bytes();
        lines.push(String::from_utf8_lossy(&line).into_owned());
        if is_sentinel {
            break;
        }
    }

    line.clear();
    reader.read_until(b'\n', &mut line)?;

    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;

    debug!(
        "Read AmiraMesh sections: {} header lines, {} payload bytes",
        lines.len(),
        payload.len()
    );
    Ok((RawHeader::new(lines), Bytes::from(payload)))
}

/// Read a header and payload from a file on disk.
///
/// The file handle is dropped before this returns, on success or failure.
pub fn read_sections(path: impl AsRef<Path>) -> Result<(RawHeader, Bytes)> {
    let file = File::open(path.as_ref())?;
    read_sections_from(BufReader::new(file))
}

/// Async variant of [`read_sections`] backed by `tokio::fs`
pub async fn read_sections_async(path: impl AsRef<Path>) -> Result<(RawHeader, Bytes)> {
    let data = tokio::fs::read(path.as_ref()).await?;
    read_sections_from(Cursor::new(data))
}
