//! Byte-slice helpers for bounds-oriented parsing.
//!
//! Two layers:
//! - `read_*`: zero-cost helpers returning `Option<T>`, for callers that map
//!   failures to their own diagnostics (the forward scan in the AXML parser).
//! - `*_r`: wrappers mapping `None` to [`Error::Truncated`], the canonical
//!   failure for an offset or length exceeding the buffer.
//!
//! All numeric reads and writes are little-endian; offsets are relative to the
//! slice passed in.

use crate::err::{Error, Result};

pub(crate) fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    buf.get(offset..end)?.try_into().ok()
}

pub(crate) fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    Some(u16::from_le_bytes(read_array::<2>(buf, offset)?))
}

pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    Some(u32::from_le_bytes(read_array::<4>(buf, offset)?))
}

#[inline]
pub(crate) fn truncated(what: &'static str, offset: usize, need: usize, len: usize) -> Error {
    Error::Truncated {
        what,
        offset: offset as u64,
        need,
        have: len.saturating_sub(offset),
    }
}

pub(crate) fn slice_r<'a>(
    buf: &'a [u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| truncated(what, offset, len, buf.len()))?;
    buf.get(offset..end)
        .ok_or_else(|| truncated(what, offset, len, buf.len()))
}

pub(crate) fn read_u16_le_r(buf: &[u8], offset: usize, what: &'static str) -> Result<u16> {
    read_u16_le(buf, offset).ok_or_else(|| truncated(what, offset, 2, buf.len()))
}

pub(crate) fn read_u32_le_r(buf: &[u8], offset: usize, what: &'static str) -> Result<u32> {
    read_u32_le(buf, offset).ok_or_else(|| truncated(what, offset, 4, buf.len()))
}

pub(crate) fn write_u32_le(buf: &mut [u8], offset: usize, value: u32) -> Result<()> {
    let len = buf.len();
    let end = offset
        .checked_add(4)
        .ok_or_else(|| truncated("u32 write", offset, 4, len))?;
    let dst = buf
        .get_mut(offset..end)
        .ok_or_else(|| truncated("u32 write", offset, 4, len))?;
    dst.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_little_endian_primitives() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05];
        assert_eq!(read_u8(&buf, 4), Some(0x05));
        assert_eq!(read_u16_le(&buf, 0), Some(0x0201));
        assert_eq!(read_u32_le(&buf, 1), Some(0x05040302));
        assert_eq!(read_u32_le(&buf, 2), None);
    }

    #[test]
    fn result_layer_reports_offsets() {
        let buf = [0u8; 3];
        let err = read_u32_le_r(&buf, 2, "field").unwrap_err();
        match err {
            Error::Truncated { what, offset, need, have } => {
                assert_eq!(what, "field");
                assert_eq!(offset, 2);
                assert_eq!(need, 4);
                assert_eq!(have, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn writes_in_place() {
        let mut buf = vec![0u8; 8];
        write_u32_le(&mut buf, 2, 0xAABBCCDD).unwrap();
        assert_eq!(read_u32_le(&buf, 2), Some(0xAABBCCDD));
        assert!(write_u32_le(&mut buf, 6, 1).is_err());
    }
}
