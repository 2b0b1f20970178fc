//! Chunk framing shared by both binary formats.
//!
//! Every record in AXML and ARSC is a self-describing chunk: a 2-byte type
//! tag, a 2-byte header size and a 4-byte total size, followed by the chunk
//! body. Decoders peek the tag and dispatch explicitly to the matching parser.
//!
//! Tag values follow `ResourceTypes.h` in the Android platform sources.

use crate::err::{Error, Result};
use crate::utils::ByteCursor;
use crate::utils::bytes;

pub const RES_STRING_POOL_TYPE: u16 = 0x0001;
pub const RES_TABLE_TYPE: u16 = 0x0002;
pub const RES_XML_TYPE: u16 = 0x0003;
pub const RES_TABLE_PACKAGE_TYPE: u16 = 0x0200;
pub const RES_TABLE_TYPE_TYPE: u16 = 0x0201;
pub const RES_TABLE_TYPE_SPEC_TYPE: u16 = 0x0202;
pub const RES_TABLE_LIBRARY_TYPE: u16 = 0x0203;

/// Common header of every chunk, plus the absolute offset it was read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: u16,
    pub header_size: u16,
    pub size: u32,
    pub offset: usize,
}

impl ChunkHeader {
    pub fn parse(buf: &[u8], offset: usize) -> Result<Self> {
        let mut cursor = ByteCursor::with_pos(buf, offset)?;
        let tag = cursor.u16_named("chunk type")?;
        let header_size = cursor.u16_named("chunk header size")?;
        let size = cursor.u32_named("chunk size")?;

        // A zero or sub-header size would stall every chunk walker.
        if size < 8 || u32::from(header_size) > size || header_size < 8 {
            return Err(Error::MalformedChunk {
                tag: u32::from(tag),
                offset: offset as u64,
            });
        }
        let end = offset
            .checked_add(size as usize)
            .ok_or_else(|| bytes::truncated("chunk body", offset, size as usize, buf.len()))?;
        if end > buf.len() {
            return Err(bytes::truncated("chunk body", offset, size as usize, buf.len()));
        }

        Ok(ChunkHeader {
            tag,
            header_size,
            size,
            offset,
        })
    }

    /// Absolute offset one past the last byte of this chunk.
    pub fn end(&self) -> usize {
        self.offset + self.size as usize
    }
}

/// Read the 2-byte type tag at a chunk boundary without consuming the chunk.
pub fn peek_tag(buf: &[u8], offset: usize) -> Result<u16> {
    bytes::read_u16_le_r(buf, offset, "chunk type")
}
