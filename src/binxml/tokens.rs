//! Event tags and attribute records of the binary-XML body.

use crate::err::Result;
use crate::string_pool::StringPool;
use crate::utils::ByteCursor;

use super::model::TypedValue;

pub(crate) const TAG_START_NAMESPACE: u32 = 0x0010_0100;
pub(crate) const TAG_END_NAMESPACE: u32 = 0x0010_0101;
pub(crate) const TAG_START: u32 = 0x0010_0102;
pub(crate) const TAG_END: u32 = 0x0010_0103;
pub(crate) const TAG_TEXT: u32 = 0x0010_0104;
pub(crate) const TAG_CDSECT: u32 = 0x0010_0105;
pub(crate) const TAG_ENTITY_REF: u32 = 0x0010_0106;

/// Sentinel for "no namespace" in event headers and "no string value" in
/// attribute records.
pub(crate) const NO_NAMESPACE: u32 = 0xFFFF_FFFF;
pub(crate) const NO_VALUE: u32 = 0xFFFF_FFFF;

const VAL_NULL: u32 = 0;
const VAL_REFERENCE: u32 = 1;
const VAL_INT_DEC: u32 = 16;
const VAL_INT_HEX: u32 = 17;
const VAL_INT_BOOLEAN: u32 = 18;

/// One raw attribute record: five u32 words as they sit in the file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AttributeRecord {
    pub ns_id: u32,
    pub name_id: u32,
    pub value_string_id: u32,
    pub flags_and_type: u32,
    pub raw_value: u32,
}

impl AttributeRecord {
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> Result<AttributeRecord> {
        Ok(AttributeRecord {
            ns_id: cursor.u32_named("attribute namespace")?,
            name_id: cursor.u32_named("attribute name")?,
            value_string_id: cursor.u32_named("attribute string value")?,
            flags_and_type: cursor.u32_named("attribute type flags")?,
            raw_value: cursor.u32_named("attribute raw value")?,
        })
    }
}

/// Decode an attribute record into a typed value.
///
/// A live string index takes precedence over the typed-value word. Note the
/// boolean decoding: only the raw values 1 and 0xFFFFFFFF read as `true`,
/// every other word reads as `false`.
pub(crate) fn convert_value(pool: &StringPool, rec: &AttributeRecord) -> Result<TypedValue> {
    if rec.value_string_id != NO_VALUE {
        let s = pool.get(rec.value_string_id)?;
        return Ok(TypedValue::String(sanitize_xml_chars(s)));
    }
    let value = match rec.flags_and_type >> 24 {
        VAL_NULL => TypedValue::Null,
        VAL_REFERENCE => TypedValue::Reference(rec.raw_value),
        VAL_INT_DEC => TypedValue::IntDec(rec.raw_value),
        VAL_INT_HEX => TypedValue::IntHex(rec.raw_value),
        VAL_INT_BOOLEAN => {
            TypedValue::Boolean(rec.raw_value == 1 || rec.raw_value == 0xFFFF_FFFF)
        }
        _ => TypedValue::Raw {
            data: rec.raw_value,
            flags: rec.flags_and_type,
        },
    };
    Ok(value)
}

/// Drop characters that are not valid in an XML 1.0 document.
pub(crate) fn sanitize_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|c| {
            matches!(
                c,
                '\u{9}' | '\u{A}' | '\u{D}'
                    | '\u{20}'..='\u{D7FF}'
                    | '\u{E000}'..='\u{FFFD}'
                    | '\u{10000}'..='\u{10FFFF}'
            )
        })
        .collect()
}
