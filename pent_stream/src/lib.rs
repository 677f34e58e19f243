//! Shared savegame stream helpers.
//!
//! Every persisted object is written as a record: a length-prefixed class
//! name followed by the class' own payload. A zero-length class name ends a
//! record list. The records of each subsystem are stored as named sections
//! inside a savegame container that starts with a fixed header. This crate
//! keeps the byte layout in one place so the writer and the loader stay
//! interoperable.

use std::convert::TryFrom;
use std::io::{Cursor, Read};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use thiserror::Error;

/// Bytes that prefix every savegame file.
pub const SAVEGAME_MAGIC: [u8; 8] = *b"PENTSAVE";

/// Savegame revision produced by this crate.
pub const SAVEGAME_VERSION: u32 = 1;

/// Error conditions returned by the stream helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("stream truncated: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: u64, needed: usize },
    #[error("savegame magic mismatch")]
    BadMagic,
    #[error("invalid or corrupt savegame (version 0)")]
    InvalidVersion,
    #[error("unsupported savegame version {0}")]
    UnsupportedVersion(u32),
    #[error("class name is not valid UTF-8")]
    BadClassName,
    #[error("string of {0} bytes does not fit a u16 length prefix")]
    StringTooLong(usize),
    #[error("savegame has no section named {0}")]
    MissingSection(String),
    #[error("section {name} of {len} bytes does not fit a u32 length prefix")]
    SectionTooLarge { name: String, len: usize },
    #[error("{0} sections do not fit a u32 count")]
    TooManySections(usize),
}

/// Growable little-endian output buffer.
#[derive(Debug, Default, Clone)]
pub struct SaveWriter {
    buf: Vec<u8>,
}

impl SaveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Grows the buffer by `len` zero bytes and returns them for encoding.
    fn reserve_slot(&mut self, len: usize) -> &mut [u8] {
        let start = self.buf.len();
        self.buf.resize(start + len, 0);
        &mut self.buf[start..]
    }

    pub fn write_u16(&mut self, value: u16) {
        LittleEndian::write_u16(self.reserve_slot(2), value);
    }

    pub fn write_u32(&mut self, value: u32) {
        LittleEndian::write_u32(self.reserve_slot(4), value);
    }

    pub fn write_i32(&mut self, value: i32) {
        LittleEndian::write_i32(self.reserve_slot(4), value);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a `u16` length prefix followed by the raw UTF-8 bytes.
    pub fn write_str(&mut self, value: &str) -> Result<(), StreamError> {
        let len =
            u16::try_from(value.len()).map_err(|_| StreamError::StringTooLong(value.len()))?;
        self.write_u16(len);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Starts an object record. Class names must not be empty since an
    /// empty name is the list terminator.
    pub fn write_class_header(&mut self, class_name: &str) -> Result<(), StreamError> {
        debug_assert!(!class_name.is_empty(), "empty class name ends a record list");
        self.write_str(class_name)
    }

    /// Ends a record list.
    pub fn write_terminator(&mut self) {
        self.write_u16(0);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Little-endian reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct SaveReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> SaveReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn truncated(&self, needed: usize) -> StreamError {
        StreamError::Truncated {
            offset: self.cursor.position(),
            needed: needed.saturating_sub(self.remaining()),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, StreamError> {
        self.cursor.read_u8().map_err(|_| self.truncated(1))
    }

    pub fn read_bool(&mut self) -> Result<bool, StreamError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, StreamError> {
        if self.remaining() < 2 {
            return Err(self.truncated(2));
        }
        self.cursor
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated(2))
    }

    pub fn read_u32(&mut self) -> Result<u32, StreamError> {
        if self.remaining() < 4 {
            return Err(self.truncated(4));
        }
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| self.truncated(4))
    }

    pub fn read_i32(&mut self) -> Result<i32, StreamError> {
        if self.remaining() < 4 {
            return Err(self.truncated(4));
        }
        self.cursor
            .read_i32::<LittleEndian>()
            .map_err(|_| self.truncated(4))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, StreamError> {
        if self.remaining() < len {
            return Err(self.truncated(len));
        }
        let mut out = vec![0u8; len];
        self.cursor
            .read_exact(&mut out)
            .map_err(|_| self.truncated(len))?;
        Ok(out)
    }

    pub fn read_str(&mut self) -> Result<String, StreamError> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| StreamError::BadClassName)
    }

    /// Reads the next record header. Returns `None` on the list terminator.
    pub fn read_class_name(&mut self) -> Result<Option<String>, StreamError> {
        let name = self.read_str()?;
        if name.is_empty() {
            Ok(None)
        } else {
            Ok(Some(name))
        }
    }
}

/// Builds a savegame container out of named sections.
#[derive(Debug, Clone)]
pub struct SavegameWriter {
    version: u32,
    description: String,
    sections: Vec<(String, Vec<u8>)>,
}

impl SavegameWriter {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            version: SAVEGAME_VERSION,
            description: description.into(),
            sections: Vec::new(),
        }
    }

    /// Adds a section, replacing any earlier section with the same name.
    pub fn write_section(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        self.sections.retain(|(existing, _)| *existing != name);
        self.sections.push((name, bytes));
    }

    pub fn finish(self) -> Result<Vec<u8>, StreamError> {
        let payload_len: usize = self.sections.iter().map(|(_, b)| b.len()).sum();
        let mut out = SaveWriter::with_capacity(SAVEGAME_MAGIC.len() + 64 + payload_len);
        out.write_bytes(&SAVEGAME_MAGIC);
        out.write_u32(self.version);
        out.write_str(&self.description)?;
        let count = u32::try_from(self.sections.len())
            .map_err(|_| StreamError::TooManySections(self.sections.len()))?;
        out.write_u32(count);
        for (name, bytes) in &self.sections {
            out.write_str(name)?;
            let len = section_len(name, bytes.len())?;
            out.write_u32(len);
            out.write_bytes(bytes);
        }
        Ok(out.into_bytes())
    }
}

fn section_len(name: &str, len: usize) -> Result<u32, StreamError> {
    u32::try_from(len).map_err(|_| StreamError::SectionTooLarge {
        name: name.to_string(),
        len,
    })
}

/// Parsed view over a savegame container.
#[derive(Debug, Clone)]
pub struct Savegame<'a> {
    version: u32,
    description: String,
    sections: Vec<(String, &'a [u8])>,
}

impl<'a> Savegame<'a> {
    /// Decodes the header and section table. Version 0 is rejected as
    /// corrupt and versions newer than [`SAVEGAME_VERSION`] as unsupported.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, StreamError> {
        let mut reader = SaveReader::new(bytes);
        let magic = reader.read_bytes(SAVEGAME_MAGIC.len())?;
        if magic != SAVEGAME_MAGIC {
            return Err(StreamError::BadMagic);
        }
        let version = reader.read_u32()?;
        if version == 0 {
            return Err(StreamError::InvalidVersion);
        }
        if version > SAVEGAME_VERSION {
            return Err(StreamError::UnsupportedVersion(version));
        }
        let description = reader.read_str()?;
        let count = reader.read_u32()?;
        let mut sections = Vec::new();
        for _ in 0..count {
            let name = reader.read_str()?;
            let len = reader.read_u32()? as usize;
            if reader.remaining() < len {
                return Err(StreamError::Truncated {
                    offset: reader.position(),
                    needed: len - reader.remaining(),
                });
            }
            let start = reader.position() as usize;
            let end = start + len;
            sections.push((name, &bytes[start..end]));
            reader.read_bytes(len)?;
        }
        Ok(Self {
            version,
            description,
            sections,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }

    pub fn section(&self, name: &str) -> Result<SaveReader<'a>, StreamError> {
        self.sections
            .iter()
            .find(|(section, _)| section == name)
            .map(|(_, bytes)| SaveReader::new(bytes))
            .ok_or_else(|| StreamError::MissingSection(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_list_ends_at_terminator() {
        let mut out = SaveWriter::new();
        out.write_class_header("Gump").unwrap();
        out.write_u16(300);
        out.write_class_header("Item").unwrap();
        out.write_u16(301);
        out.write_terminator();

        let bytes = out.into_bytes();
        let mut reader = SaveReader::new(&bytes);
        assert_eq!(reader.read_class_name().unwrap().as_deref(), Some("Gump"));
        assert_eq!(reader.read_u16().unwrap(), 300);
        assert_eq!(reader.read_class_name().unwrap().as_deref(), Some("Item"));
        assert_eq!(reader.read_u16().unwrap(), 301);
        assert_eq!(reader.read_class_name().unwrap(), None);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn values_are_little_endian() {
        let mut out = SaveWriter::new();
        out.write_u16(0x1234);
        out.write_i32(-2);
        assert_eq!(out.as_bytes(), &[0x34, 0x12, 0xfe, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn writer_output_reads_back_through_the_reader() {
        let mut out = SaveWriter::new();
        out.write_u32(0xDEAD_BEEF);
        out.write_i32(i32::MIN);
        out.write_u16(7);
        assert_eq!(&out.as_bytes()[..4], &[0xef, 0xbe, 0xad, 0xde]);

        let bytes = out.into_bytes();
        let mut reader = SaveReader::new(&bytes);
        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_i32().unwrap(), i32::MIN);
        assert_eq!(reader.read_u16().unwrap(), 7);
    }

    #[test]
    fn oversized_section_length_is_an_error() {
        assert_eq!(section_len("KERNEL", 12).unwrap(), 12);
        if let Ok(len) = usize::try_from(u64::from(u32::MAX) + 1) {
            assert_eq!(
                section_len("OBJECTS", len).unwrap_err(),
                StreamError::SectionTooLarge {
                    name: "OBJECTS".to_string(),
                    len
                }
            );
        }
    }

    #[test]
    fn short_reads_report_truncation() {
        let bytes = [0x01u8];
        let mut reader = SaveReader::new(&bytes);
        let err = reader.read_u32().unwrap_err();
        assert_eq!(
            err,
            StreamError::Truncated {
                offset: 0,
                needed: 3
            }
        );
    }

    #[test]
    fn container_exposes_sections_by_name() {
        let mut writer = SavegameWriter::new("before the dungeon");
        writer.write_section("KERNEL", vec![1, 2, 3]);
        writer.write_section("OBJECTS", vec![4]);
        let bytes = writer.finish().unwrap();

        let save = Savegame::parse(&bytes).unwrap();
        assert_eq!(save.version(), SAVEGAME_VERSION);
        assert_eq!(save.description(), "before the dungeon");
        let names: Vec<&str> = save.section_names().collect();
        assert_eq!(names, vec!["KERNEL", "OBJECTS"]);
        let mut kernel = save.section("KERNEL").unwrap();
        assert_eq!(kernel.read_bytes(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(
            save.section("WORLD").unwrap_err(),
            StreamError::MissingSection("WORLD".to_string())
        );
    }

    #[test]
    fn container_rejects_bad_versions() {
        let mut bytes = SavegameWriter::new("x").finish().unwrap();
        bytes[8..12].copy_from_slice(&0u32.to_le_bytes());
        assert_eq!(
            Savegame::parse(&bytes).unwrap_err(),
            StreamError::InvalidVersion
        );
        bytes[8..12].copy_from_slice(&(SAVEGAME_VERSION + 1).to_le_bytes());
        assert_eq!(
            Savegame::parse(&bytes).unwrap_err(),
            StreamError::UnsupportedVersion(SAVEGAME_VERSION + 1)
        );
        bytes[0] = b'X';
        assert_eq!(Savegame::parse(&bytes).unwrap_err(), StreamError::BadMagic);
    }
}
