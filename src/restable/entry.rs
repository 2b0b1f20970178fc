//! Type chunks, type specs, and resource entries.

use hashbrown::HashMap;

use crate::chunk::{
    ChunkHeader, RES_TABLE_LIBRARY_TYPE, RES_TABLE_TYPE_SPEC_TYPE, RES_TABLE_TYPE_TYPE,
};
use crate::err::{Error, Result};
use crate::string_pool::{StringPool, decode_utf16le_lossy};
use crate::utils::ByteCursor;

use super::config::ResTableConfig;

/// Entry-offset sentinel for "no entry at this index".
pub const NO_ENTRY: u32 = 0xFFFF_FFFF;

/// Value-word type for a reference to another resource id.
pub const TYPE_REFERENCE: u8 = 0x01;
/// Value-word type for an index into the global string pool.
pub const TYPE_STRING: u8 = 0x03;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EntryFlags: u16 {
        /// The entry is a bag of key/value pairs rather than a single value.
        const COMPLEX = 0x0001;
        const PUBLIC = 0x0002;
    }
}

/// One typed-value word as stored in the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResValue {
    pub size: u16,
    pub data_type: u8,
    pub data: u32,
}

impl ResValue {
    fn decode(cursor: &mut ByteCursor<'_>) -> Result<ResValue> {
        let size = cursor.u16_named("value size")?;
        let _res0 = cursor.u8_named("value reserved byte")?;
        let data_type = cursor.u8_named("value type")?;
        let data = cursor.u32_named("value data")?;
        Ok(ResValue { size, data_type, data })
    }
}

/// The bag header of a complex entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapEntryHeader {
    pub parent: u32,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResTableEntry {
    pub size: u16,
    pub flags: EntryFlags,
    /// Index into the package's key string pool.
    pub key: u32,
    pub value: ResValue,
    pub map: Option<MapEntryHeader>,
}

impl ResTableEntry {
    pub(crate) fn decode(buf: &[u8], offset: usize) -> Result<ResTableEntry> {
        let mut cursor = ByteCursor::with_pos(buf, offset)?;
        let size = cursor.u16_named("entry size")?;
        let flags = EntryFlags::from_bits_retain(cursor.u16_named("entry flags")?);
        let key = cursor.u32_named("entry key")?;
        // The value word always sits right after the key. A complex entry
        // reads the same eight bytes again as its bag header.
        let mut value_cursor = cursor;
        let value = ResValue::decode(&mut value_cursor)?;
        let map = if flags.contains(EntryFlags::COMPLEX) {
            Some(MapEntryHeader {
                parent: cursor.u32_named("bag parent")?,
                count: cursor.u32_named("bag count")?,
            })
        } else {
            None
        };
        Ok(ResTableEntry { size, flags, key, value, map })
    }
}

/// One type chunk: all entries of one resource type under one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResTableType {
    pub header: ChunkHeader,
    pub id: u8,
    pub entry_count: u32,
    pub entry_start: u32,
    pub config: ResTableConfig,
    pub entries: Vec<Option<ResTableEntry>>,
    /// Key-pool string to entry index, for symbolic lookups.
    pub keys: HashMap<String, u32>,
}

impl ResTableType {
    pub(crate) fn decode(
        buf: &[u8],
        offset: usize,
        key_strings: &StringPool,
    ) -> Result<ResTableType> {
        let header = ChunkHeader::parse(buf, offset)?;
        if header.tag != RES_TABLE_TYPE_TYPE {
            return Err(Error::UnknownChunkType { tag: header.tag, offset: offset as u64 });
        }
        let mut cursor = ByteCursor::with_pos(buf, offset + 8)?;
        let id = cursor.u8_named("type id")?;
        let _res0 = cursor.u8_named("type reserved byte")?;
        let _res1 = cursor.u16_named("type reserved word")?;
        let entry_count = cursor.u32_named("type entry count")?;
        let entry_start = cursor.u32_named("type entry start")?;
        let config = ResTableConfig::decode(buf, cursor.pos())?;
        cursor.advance(config.size as usize, "type configuration")?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        let mut keys = HashMap::new();
        let mut entry_offsets = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entry_offsets.push(cursor.u32_named("entry offset")?);
        }
        for (index, entry_offset) in entry_offsets.into_iter().enumerate() {
            if entry_offset == NO_ENTRY {
                entries.push(None);
                continue;
            }
            let entry = ResTableEntry::decode(
                buf,
                offset + entry_start as usize + entry_offset as usize,
            )?;
            keys.insert(key_strings.get(entry.key)?.to_string(), index as u32);
            entries.push(Some(entry));
        }

        Ok(ResTableType { header, id, entry_count, entry_start, config, entries, keys })
    }
}

/// A type-spec chunk: one configuration-dimension mask word per entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResTableTypeSpec {
    pub header: ChunkHeader,
    pub id: u8,
    pub entry_count: u32,
    pub config_flags: Vec<u32>,
}

impl ResTableTypeSpec {
    pub(crate) fn decode(buf: &[u8], offset: usize) -> Result<ResTableTypeSpec> {
        let header = ChunkHeader::parse(buf, offset)?;
        if header.tag != RES_TABLE_TYPE_SPEC_TYPE {
            return Err(Error::UnknownChunkType { tag: header.tag, offset: offset as u64 });
        }
        let mut cursor = ByteCursor::with_pos(buf, offset + 8)?;
        let id = cursor.u8_named("spec type id")?;
        let _res0 = cursor.u8_named("spec reserved byte")?;
        let _res1 = cursor.u16_named("spec reserved word")?;
        let entry_count = cursor.u32_named("spec entry count")?;
        let mut config_flags = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            config_flags.push(cursor.u32_named("spec config mask")?);
        }
        Ok(ResTableTypeSpec { header, id, entry_count, config_flags })
    }
}

/// A library chunk mapping shared-library package ids to package names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResTableLibrary {
    pub header: ChunkHeader,
    pub libraries: Vec<(u32, String)>,
}

impl ResTableLibrary {
    pub(crate) fn decode(buf: &[u8], offset: usize) -> Result<ResTableLibrary> {
        let header = ChunkHeader::parse(buf, offset)?;
        if header.tag != RES_TABLE_LIBRARY_TYPE {
            return Err(Error::UnknownChunkType { tag: header.tag, offset: offset as u64 });
        }
        let mut cursor = ByteCursor::with_pos(buf, offset + 8)?;
        let count = cursor.u32_named("library count")?;
        let mut libraries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = cursor.u32_named("library package id")?;
            let raw = cursor.take_bytes(128, "library package name")?;
            let name = decode_utf16le_lossy(raw);
            let trimmed = name.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            libraries.push((id, trimmed.to_string()));
        }
        Ok(ResTableLibrary { header, libraries })
    }
}
