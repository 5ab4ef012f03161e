//! Multi-entry deflate container format.
//!
//! Layout:
//!
//! ```text
//! "SHRA" || version (u16 LE) || member blocks (deflate) ... ||
//! index (bincode Vec<MemberEntry>) || index_offset (u64 LE) || index_len (u64 LE)
//! ```
//!
//! The index lives at the tail so member data streams straight to disk
//! during writing. Duplicate member names are legal; readers resolve a
//! name to its last index entry, so the most recently written member wins.

use crate::config::{ARCHIVE_MAGIC, ARCHIVE_VERSION};
use crate::error::{Error, Result};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Header bytes before the first member block.
const HEADER_SIZE: u64 = 4 + 2;

/// Trailer bytes after the index: offset and length, both u64 LE.
const TRAILER_SIZE: u64 = 8 + 8;

/// One member in the container index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberEntry {
    /// Member name (a file base name, or the metadata member name).
    pub name: String,

    /// Offset of the deflate block from the start of the container.
    pub offset: u64,

    /// Compressed size on disk.
    pub stored_size: u64,

    /// Uncompressed size.
    pub raw_size: u64,
}

/// Sequential container writer.
pub struct ContainerWriter {
    file: BufWriter<File>,
    entries: Vec<MemberEntry>,
    position: u64,
    level: Compression,
}

impl ContainerWriter {
    /// Create a container at `path`, truncating any existing file.
    pub fn create(path: &Path, compression_level: u32) -> Result<Self> {
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(&ARCHIVE_MAGIC)?;
        file.write_all(&ARCHIVE_VERSION.to_le_bytes())?;

        Ok(Self {
            file,
            entries: Vec::new(),
            position: HEADER_SIZE,
            level: Compression::new(compression_level),
        })
    }

    /// Append a member, compressing from `reader`. Returns the
    /// uncompressed size.
    pub fn add_member(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64> {
        let offset = self.position;

        let mut encoder = DeflateEncoder::new(&mut self.file, self.level);
        let raw_size = io::copy(reader, &mut encoder)?;
        encoder.try_finish()?;
        let stored_size = encoder.total_out();
        drop(encoder);

        self.position = offset + stored_size;
        self.entries.push(MemberEntry {
            name: name.to_string(),
            offset,
            stored_size,
            raw_size,
        });

        Ok(raw_size)
    }

    /// Append a member from an in-memory buffer.
    pub fn add_member_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let mut reader = bytes;
        self.add_member(name, &mut reader)?;
        Ok(())
    }

    /// Number of members written so far.
    pub fn member_count(&self) -> usize {
        self.entries.len()
    }

    /// Write the index and trailer, consuming the writer.
    pub fn finish(mut self) -> Result<()> {
        let index = bincode::serialize(&self.entries)?;
        let index_offset = self.position;

        self.file.write_all(&index)?;
        self.file.write_all(&index_offset.to_le_bytes())?;
        self.file.write_all(&(index.len() as u64).to_le_bytes())?;
        self.file.flush()?;

        Ok(())
    }
}

/// Container reader over a seekable file.
pub struct ContainerReader {
    file: BufReader<File>,
    entries: Vec<MemberEntry>,
}

impl ContainerReader {
    /// Open a container and load its index.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = BufReader::new(File::open(path)?);

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if magic != ARCHIVE_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let mut version_bytes = [0u8; 2];
        file.read_exact(&mut version_bytes)?;
        let version = u16::from_le_bytes(version_bytes);
        if version != ARCHIVE_VERSION {
            return Err(Error::VersionMismatch {
                expected: ARCHIVE_VERSION,
                found: version,
            });
        }

        let end = file.seek(SeekFrom::End(0))?;
        if end < HEADER_SIZE + TRAILER_SIZE {
            return Err(Error::Serialization("container truncated".to_string()));
        }

        file.seek(SeekFrom::End(-(TRAILER_SIZE as i64)))?;
        let mut trailer = [0u8; TRAILER_SIZE as usize];
        file.read_exact(&mut trailer)?;

        let mut word = [0u8; 8];
        word.copy_from_slice(&trailer[..8]);
        let index_offset = u64::from_le_bytes(word);
        word.copy_from_slice(&trailer[8..]);
        let index_len = u64::from_le_bytes(word);

        if index_offset < HEADER_SIZE
            || index_offset
                .checked_add(index_len)
                .and_then(|n| n.checked_add(TRAILER_SIZE))
                != Some(end)
        {
            return Err(Error::Serialization(
                "container index out of bounds".to_string(),
            ));
        }

        file.seek(SeekFrom::Start(index_offset))?;
        let mut index = vec![0u8; index_len as usize];
        file.read_exact(&mut index)?;
        let entries: Vec<MemberEntry> = bincode::deserialize(&index)?;

        Ok(Self { file, entries })
    }

    /// Member entries in write order.
    pub fn entries(&self) -> &[MemberEntry] {
        &self.entries
    }

    /// Find the last entry with `name`. Duplicates resolve to the most
    /// recently written member.
    pub fn find(&self, name: &str) -> Option<&MemberEntry> {
        self.entries.iter().rev().find(|e| e.name == name)
    }

    /// Decompress one member into memory.
    pub fn read_member(&mut self, entry: &MemberEntry) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(entry.offset))?;
        let compressed = (&mut self.file).take(entry.stored_size);
        let mut decoder = DeflateDecoder::new(compressed);

        let mut data = Vec::new();
        decoder.read_to_end(&mut data)?;

        if data.len() as u64 != entry.raw_size {
            return Err(Error::Serialization(format!(
                "member '{}' decompressed to {} bytes, index says {}",
                entry.name,
                data.len(),
                entry.raw_size
            )));
        }

        Ok(data)
    }

    /// Decompress one member to a writer, streamed.
    pub fn extract_member(&mut self, entry: &MemberEntry, writer: &mut dyn Write) -> Result<u64> {
        self.file.seek(SeekFrom::Start(entry.offset))?;
        let compressed = (&mut self.file).take(entry.stored_size);
        let mut decoder = DeflateDecoder::new(compressed);

        let written = io::copy(&mut decoder, writer)?;
        if written != entry.raw_size {
            return Err(Error::Serialization(format!(
                "member '{}' decompressed to {} bytes, index says {}",
                entry.name, written, entry.raw_size
            )));
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.shra");

        let mut writer = ContainerWriter::create(&path, 6).unwrap();
        writer.add_member_bytes("first.txt", b"hello container").unwrap();
        writer.add_member_bytes("second.bin", &[0u8; 4096]).unwrap();
        writer.finish().unwrap();

        let mut reader = ContainerReader::open(&path).unwrap();
        assert_eq!(reader.entries().len(), 2);

        let first = reader.find("first.txt").unwrap().clone();
        assert_eq!(first.raw_size, 15);
        assert_eq!(reader.read_member(&first).unwrap(), b"hello container");

        let second = reader.find("second.bin").unwrap().clone();
        assert_eq!(reader.read_member(&second).unwrap(), vec![0u8; 4096]);
        // Zeros compress well.
        assert!(second.stored_size < second.raw_size);
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dup.shra");

        let mut writer = ContainerWriter::create(&path, 6).unwrap();
        writer.add_member_bytes("name", b"old contents").unwrap();
        writer.add_member_bytes("name", b"new contents").unwrap();
        writer.finish().unwrap();

        let mut reader = ContainerReader::open(&path).unwrap();
        assert_eq!(reader.entries().len(), 2);
        let entry = reader.find("name").unwrap().clone();
        assert_eq!(reader.read_member(&entry).unwrap(), b"new contents");
    }

    #[test]
    fn test_foreign_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foreign");
        std::fs::write(&path, b"this is not a container at all, honestly").unwrap();

        assert!(matches!(
            ContainerReader::open(&path),
            Err(Error::InvalidMagic)
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.shra");

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&ARCHIVE_MAGIC);
        bytes.extend_from_slice(&99u16.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 32]);
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            ContainerReader::open(&path),
            Err(Error::VersionMismatch {
                expected: ARCHIVE_VERSION,
                found: 99
            })
        ));
    }

    #[test]
    fn test_truncated_container_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trunc.shra");

        let mut writer = ContainerWriter::create(&path, 6).unwrap();
        writer.add_member_bytes("a", b"payload payload payload").unwrap();
        writer.finish().unwrap();

        let full = std::fs::read(&path).unwrap();
        std::fs::write(&path, &full[..full.len() - 9]).unwrap();

        assert!(ContainerReader::open(&path).is_err());
    }

    #[test]
    fn test_empty_member_allowed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.shra");

        let mut writer = ContainerWriter::create(&path, 9).unwrap();
        writer.add_member_bytes("zero-bytes", b"").unwrap();
        writer.finish().unwrap();

        let mut reader = ContainerReader::open(&path).unwrap();
        let entry = reader.find("zero-bytes").unwrap().clone();
        assert_eq!(entry.raw_size, 0);
        assert_eq!(reader.read_member(&entry).unwrap(), b"");
    }
}
