//! The shared string-pool chunk codec.
//!
//! A string pool maps small integer indices to strings; both the binary-XML
//! body and the resource table reference every piece of text through one.
//! Strings are stored behind a per-string offset table, with a variable-width
//! length prefix whose encoding depends on the pool's `UTF8` flag:
//!
//! - UTF-8 pools prefix each string with two 1/2-byte lengths (the UTF-16
//!   length, then the UTF-8 byte length);
//! - UTF-16 pools prefix each string with one 2/4-byte length counting UTF-16
//!   code units, and terminate it with a NUL code unit.
//!
//! [`StringPool::add_string`] grows a UTF-16 pool in place, splicing the new
//! string and its offset-table entry into the backing buffer and rewriting the
//! affected header fields.

use byteorder::{LittleEndian, WriteBytesExt};
use log::trace;

use crate::chunk::{ChunkHeader, RES_STRING_POOL_TYPE};
use crate::err::{Error, Result};
use crate::utils::ByteCursor;
use crate::utils::bytes;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StringPoolFlags: u32 {
        /// The pool is sorted by string value (informational only).
        const SORTED = 1 << 0;
        /// String data is UTF-8 encoded rather than UTF-16LE.
        const UTF8 = 1 << 8;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringPool {
    pub header: ChunkHeader,
    pub string_count: u32,
    pub style_count: u32,
    pub flags: StringPoolFlags,
    pub strings_start: u32,
    pub styles_start: u32,
    pub strings: Vec<String>,
}

impl StringPool {
    pub fn decode(buf: &[u8], offset: usize) -> Result<StringPool> {
        let header = ChunkHeader::parse(buf, offset)?;
        if header.tag != RES_STRING_POOL_TYPE {
            return Err(Error::UnknownChunkType {
                tag: header.tag,
                offset: offset as u64,
            });
        }

        let mut cursor = ByteCursor::with_pos(buf, offset + 8)?;
        let string_count = cursor.u32_named("string count")?;
        let style_count = cursor.u32_named("style count")?;
        let flags = StringPoolFlags::from_bits_retain(cursor.u32_named("string pool flags")?);
        let strings_start = cursor.u32_named("strings start")?;
        let styles_start = cursor.u32_named("styles start")?;

        let is_utf8 = flags.contains(StringPoolFlags::UTF8);
        let mut strings = Vec::with_capacity(string_count as usize);
        for _ in 0..string_count {
            let entry = cursor.u32_named("string offset entry")? as usize;
            let str_off = offset
                .checked_add(strings_start as usize)
                .and_then(|o| o.checked_add(entry))
                .ok_or_else(|| bytes::truncated("string offset", offset, entry, buf.len()))?;

            if is_utf8 {
                // Two length prefixes: the UTF-16 length (consumed but unused
                // for UTF-8 content), then the UTF-8 byte length.
                let (_u16_len, consumed16) = utf8_len(buf, str_off)?;
                let (u8_len, consumed8) = utf8_len(buf, str_off + consumed16)?;
                let data = bytes::slice_r(buf, str_off + consumed16 + consumed8, u8_len, "utf-8 string data")?;
                strings.push(String::from_utf8_lossy(data).into_owned());
            } else {
                let (len, consumed) = utf16_len(buf, str_off)?;
                let byte_len = len
                    .checked_mul(2)
                    .ok_or_else(|| bytes::truncated("utf-16 string data", str_off, len, buf.len()))?;
                let data = bytes::slice_r(buf, str_off + consumed, byte_len, "utf-16 string data")?;
                strings.push(decode_utf16le_lossy(data));
            }
        }

        Ok(StringPool {
            header,
            string_count,
            style_count,
            flags,
            strings_start,
            styles_start,
            strings,
        })
    }

    pub fn is_utf8(&self) -> bool {
        self.flags.contains(StringPoolFlags::UTF8)
    }

    /// Look up a string by pool index, failing on out-of-range references.
    pub fn get(&self, index: u32) -> Result<&str> {
        self.strings
            .get(index as usize)
            .map(String::as_str)
            .ok_or(Error::StringIndexOutOfRange {
                index,
                count: self.strings.len(),
            })
    }

    /// Append one string to the UTF-16 pool located at `pool_offset` in
    /// `data`, rewriting the pool's count, strings-start and size fields in
    /// place.
    ///
    /// Returns the new string's pool index and the total number of bytes
    /// spliced into the buffer (always a multiple of 4). Every byte offset the
    /// caller tracks at or after the insertion point must be shifted forward
    /// by that count.
    pub fn add_string(data: &mut Vec<u8>, pool_offset: usize, text: &str) -> Result<(u32, usize)> {
        let flags = StringPoolFlags::from_bits_retain(bytes::read_u32_le_r(
            data,
            pool_offset + 16,
            "string pool flags",
        )?);
        if flags.contains(StringPoolFlags::UTF8) {
            return Err(Error::UnsupportedConstruct {
                construct: "appending to a UTF-8 encoded string pool",
            });
        }

        let string_count = bytes::read_u32_le_r(data, pool_offset + 8, "string count")?;
        if string_count == 0 {
            return Err(Error::UnsupportedConstruct {
                construct: "appending to an empty string pool",
            });
        }

        let units: Vec<u16> = text.encode_utf16().collect();
        if units.len() > 0x7FFF {
            return Err(Error::UnsupportedConstruct {
                construct: "appending a string longer than 32767 UTF-16 units",
            });
        }

        // The insertion point is right after the last stored string: decode
        // that string's own length prefix to find where its bytes end.
        let strings_start = bytes::read_u32_le_r(data, pool_offset + 20, "strings start")? as usize;
        let last_entry_off = pool_offset
            .checked_add(strings_start)
            .and_then(|o| o.checked_sub(4))
            .ok_or_else(|| bytes::truncated("offset table", pool_offset, 4, data.len()))?;
        let last_rel = bytes::read_u32_le_r(data, last_entry_off, "last string offset")? as usize;
        let last_abs = pool_offset + strings_start + last_rel;
        let (last_len, consumed) = utf16_len(data, last_abs)?;
        let insert_at = last_abs + consumed + last_len * 2 + 2;
        if insert_at > data.len() {
            return Err(bytes::truncated("string insertion point", insert_at, 0, data.len()));
        }

        // [u16 length][utf16le code units][u16 NUL], padded with zero bytes so
        // the inserted byte count (string bytes + one offset entry) stays
        // 4-aligned.
        let mut string_bytes = Vec::with_capacity(units.len() * 2 + 4);
        string_bytes.write_u16::<LittleEndian>(units.len() as u16)?;
        for unit in &units {
            string_bytes.write_u16::<LittleEndian>(*unit)?;
        }
        string_bytes.write_u16::<LittleEndian>(0)?;
        let padding = (4 - (string_bytes.len() + 4) % 4) % 4;
        string_bytes.extend(std::iter::repeat_n(0u8, padding));
        let bytes_added = string_bytes.len() + 4;

        trace!(
            "appending {} bytes to the string pool at {:#x} (insert at {:#x})",
            bytes_added, pool_offset, insert_at
        );

        bytes::write_u32_le(data, pool_offset + 8, string_count + 1)?;
        data.splice(insert_at..insert_at, string_bytes);

        // New offset-table entry, spliced in just before the old strings-start
        // boundary. Growing the table shifts all string data by 4, which the
        // strings-start bump below compensates for, so the entry is computed
        // against the pre-bump value.
        let entry = (insert_at - (pool_offset + strings_start)) as u32;
        data.splice(last_entry_off + 4..last_entry_off + 4, entry.to_le_bytes());

        bytes::write_u32_le(data, pool_offset + 20, (strings_start + 4) as u32)?;
        let size = bytes::read_u32_le_r(data, pool_offset + 4, "chunk size")?;
        bytes::write_u32_le(data, pool_offset + 4, size + bytes_added as u32)?;

        Ok((string_count, bytes_added))
    }
}

/// Decode a UTF-8 pool length prefix: one byte, or two bytes when the first
/// byte's high bit is set (15-bit length). Returns `(length, bytes consumed)`.
pub(crate) fn utf8_len(buf: &[u8], offset: usize) -> Result<(usize, usize)> {
    let first =
        bytes::read_u8(buf, offset).ok_or_else(|| bytes::truncated("utf-8 length", offset, 1, buf.len()))?;
    if first & 0x80 != 0 {
        let second = bytes::read_u8(buf, offset + 1)
            .ok_or_else(|| bytes::truncated("utf-8 length", offset, 2, buf.len()))?;
        Ok((((usize::from(first) & 0x7F) << 8) + usize::from(second), 2))
    } else {
        Ok((usize::from(first), 1))
    }
}

/// Decode a UTF-16 pool length prefix: one 16-bit word, or two words when the
/// first word's high bit is set (31-bit length). Returns `(length in code
/// units, bytes consumed)`.
pub(crate) fn utf16_len(buf: &[u8], offset: usize) -> Result<(usize, usize)> {
    let first = bytes::read_u16_le_r(buf, offset, "utf-16 length")?;
    if first & 0x8000 != 0 {
        let second = bytes::read_u16_le_r(buf, offset + 2, "utf-16 length")?;
        Ok((((usize::from(first) & 0x7FFF) << 16) + usize::from(second), 4))
    } else {
        Ok((usize::from(first), 2))
    }
}

/// Decode UTF-16LE bytes, mapping unpaired surrogates to U+FFFD.
pub(crate) fn decode_utf16le_lossy(data: &[u8]) -> String {
    let units = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
