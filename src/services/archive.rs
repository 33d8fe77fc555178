use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use thiserror::Error;
use tracing::warn;
use zip::{result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::storage::path;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Image is not valid base64")]
    InvalidBase64,
    #[error("Image is not a valid zip archive")]
    InvalidZip,
    #[error("Archive does not contain an image")]
    Empty,
    #[error("Failed to write archive: {0}")]
    Write(#[from] ZipError),
    #[error("Failed to read archive entry: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Builds a zip in memory, one deflated entry per file.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        ArchiveBuilder {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            names: HashSet::new(),
        }
    }

    /// Returns `false` when an entry with the same name was already added;
    /// the later one is skipped.
    pub fn add(&mut self, name: &str, data: &[u8]) -> Result<bool, ArchiveError> {
        if !self.names.insert(name.to_string()) {
            warn!(entry = name, "Duplicate zip entry skipped");
            return Ok(false);
        }

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer.start_file(name, options)?;
        self.writer.write_all(data)?;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        Ok(self.writer.finish()?.into_inner())
    }
}

pub fn extract(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|_| ArchiveError::InvalidZip)?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(|_| ArchiveError::InvalidZip)?;
        if file.is_dir() {
            continue;
        }
        let name = path::file_name(file.name()).to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        entries.push(ArchiveEntry { name, data });
    }

    Ok(entries)
}

/// The first file of the archive.
pub fn first_entry(bytes: &[u8]) -> Result<ArchiveEntry, ArchiveError> {
    extract(bytes)?.into_iter().next().ok_or(ArchiveError::Empty)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(value: &str) -> Result<Vec<u8>, ArchiveError> {
    STANDARD
        .decode(value.trim())
        .map_err(|_| ArchiveError::InvalidBase64)
}
