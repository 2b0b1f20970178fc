//! Resource configuration blocks.

use crate::err::Result;
use crate::utils::ByteCursor;

/// The configuration a type chunk's entries apply to. Only the locale fields
/// are interpreted; the remaining dimension words are kept raw so variants
/// can still be told apart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResTableConfig {
    pub size: u32,
    pub imei: u32,
    pub locale_lang: Option<String>,
    pub locale_country: Option<String>,
    pub screen_type: u32,
    pub input: u32,
    pub screen_input: u32,
    pub version: u32,
    pub screen_config: u32,
}

impl ResTableConfig {
    pub(crate) fn decode(buf: &[u8], offset: usize) -> Result<ResTableConfig> {
        let mut cursor = ByteCursor::with_pos(buf, offset)?;
        let size = cursor.u32_named("config size")?;
        let imei = cursor.u32_named("config imei")?;
        let locale_lang = decode_locale_field(cursor.take_bytes(2, "config language")?);
        let locale_country = decode_locale_field(cursor.take_bytes(2, "config country")?);
        Ok(ResTableConfig {
            size,
            imei,
            locale_lang,
            locale_country,
            screen_type: cursor.u32_named("config screen type")?,
            input: cursor.u32_named("config input")?,
            screen_input: cursor.u32_named("config screen input")?,
            version: cursor.u32_named("config version")?,
            screen_config: cursor.u32_named("config screen config")?,
        })
    }
}

fn decode_locale_field(raw: &[u8]) -> Option<String> {
    if raw.iter().all(|b| *b == 0) {
        None
    } else {
        Some(String::from_utf8_lossy(raw).into_owned())
    }
}
