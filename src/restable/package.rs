//! Package chunks and resource lookup.

use std::sync::Arc;

use hashbrown::HashMap;
use log::trace;

use crate::chunk::{
    self, ChunkHeader, RES_TABLE_LIBRARY_TYPE, RES_TABLE_TYPE_SPEC_TYPE, RES_TABLE_TYPE_TYPE,
};
use crate::err::{Error, Result};
use crate::string_pool::{StringPool, decode_utf16le_lossy};
use crate::utils::ByteCursor;

use super::entry::{ResTableLibrary, ResTableType, ResTableTypeSpec, TYPE_REFERENCE, TYPE_STRING};

/// Locale selection for a string-resource lookup.
///
/// A language selects that language's string table; a country selects the
/// country's table instead, even when a language is also given. A locale
/// with no table of its own falls back to the default (no-locale) table; a
/// table that exists but lacks the entry does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions<'a> {
    pub lang: Option<&'a str>,
    pub country: Option<&'a str>,
}

/// A resolved resource value.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceValue {
    /// A string resource, after following references.
    String(String),
    /// The asset paths a drawable resolves to, one per configuration.
    AssetPaths(Vec<String>),
}

#[derive(Debug, PartialEq)]
pub struct ResTablePackage {
    pub header: ChunkHeader,
    pub id: u32,
    pub name: String,
    pub type_strings: StringPool,
    pub key_strings: StringPool,
    /// Type chunks by type id, one per configuration.
    pub types: HashMap<u8, Vec<ResTableType>>,
    pub specs: HashMap<u8, Vec<ResTableTypeSpec>>,
    pub libraries: Vec<(u32, String)>,
    global: Arc<StringPool>,
    res_strings_default: HashMap<u32, String>,
    res_strings_lang: HashMap<String, HashMap<u32, String>>,
    res_strings_country: HashMap<String, HashMap<u32, String>>,
}

impl ResTablePackage {
    pub(crate) fn decode(
        buf: &[u8],
        offset: usize,
        global: Arc<StringPool>,
    ) -> Result<ResTablePackage> {
        let header = ChunkHeader::parse(buf, offset)?;
        if header.tag != chunk::RES_TABLE_PACKAGE_TYPE {
            return Err(Error::UnknownChunkType { tag: header.tag, offset: offset as u64 });
        }

        let mut cursor = ByteCursor::with_pos(buf, offset + 8)?;
        let id = cursor.u32_named("package id")?;
        let raw_name = cursor.take_bytes(256, "package name")?;
        let name = decode_utf16le_lossy(raw_name)
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string();
        let type_strings_offset = cursor.u32_named("type strings offset")?;
        let _last_public_type = cursor.u32_named("last public type")?;
        let key_strings_offset = cursor.u32_named("key strings offset")?;
        let _last_public_key = cursor.u32_named("last public key")?;

        let type_strings = StringPool::decode(buf, offset + type_strings_offset as usize)?;
        let key_strings = StringPool::decode(buf, offset + key_strings_offset as usize)?;
        trace!(
            "package {id:#04x} `{name}`: {} types, {} keys",
            type_strings.string_count, key_strings.string_count
        );

        let mut types: HashMap<u8, Vec<ResTableType>> = HashMap::new();
        let mut specs: HashMap<u8, Vec<ResTableTypeSpec>> = HashMap::new();
        let mut libraries = Vec::new();
        let mut sub = offset + key_strings_offset as usize + key_strings.header.size as usize;
        while sub < header.end() {
            match chunk::peek_tag(buf, sub)? {
                RES_TABLE_TYPE_TYPE => {
                    let t = ResTableType::decode(buf, sub, &key_strings)?;
                    sub = t.header.end();
                    types.entry(t.id).or_default().push(t);
                }
                RES_TABLE_TYPE_SPEC_TYPE => {
                    let spec = ResTableTypeSpec::decode(buf, sub)?;
                    sub = spec.header.end();
                    specs.entry(spec.id).or_default().push(spec);
                }
                RES_TABLE_LIBRARY_TYPE => {
                    let lib = ResTableLibrary::decode(buf, sub)?;
                    sub = lib.header.end();
                    libraries.extend(lib.libraries);
                }
                tag => {
                    return Err(Error::UnknownChunkType { tag, offset: sub as u64 });
                }
            }
        }

        let (res_strings_default, res_strings_lang, res_strings_country) =
            extract_res_strings(&type_strings, &types, &global);

        Ok(ResTablePackage {
            header,
            id,
            name,
            type_strings,
            key_strings,
            types,
            specs,
            libraries,
            global,
            res_strings_default,
            res_strings_lang,
            res_strings_country,
        })
    }

    /// Resolve a resource id (hex `@0x7f030001` or symbolic `@string/name`)
    /// to its value. String resources honor the locale in `opts`; drawables
    /// collect the asset paths of every configuration holding the entry,
    /// which may be none.
    pub fn find(&self, res_id: &str, opts: FindOptions<'_>) -> Result<ResourceValue> {
        let int_id = self.strid2int(res_id)?;
        let tid = ((int_id & 0x00FF_0000) >> 16) as u8;
        let key = int_id & 0xFFFF;

        match self.type_name(tid) {
            Some("string") => self.find_res_string(res_id, key, opts).map(ResourceValue::String),
            Some("drawable") | Some("mipmap") => {
                let mut paths = Vec::new();
                for t in self.types.get(&tid).into_iter().flatten() {
                    if let Some(Some(entry)) = t.entries.get(key as usize) {
                        if let Some(path) = self.global.strings.get(entry.value.data as usize) {
                            paths.push(path.clone());
                        }
                    }
                }
                Ok(ResourceValue::AssetPaths(paths))
            }
            _ => Err(Error::UnresolvedResource { id: res_id.to_string() }),
        }
    }

    fn find_res_string(&self, res_id: &str, key: u32, opts: FindOptions<'_>) -> Result<String> {
        let not_found = || Error::UnresolvedResource { id: res_id.to_string() };
        let mut map = &self.res_strings_default;
        if let Some(lang) = opts.lang {
            map = self.res_strings_lang.get(lang).unwrap_or(&self.res_strings_default);
        }
        if let Some(country) = opts.country {
            map = self.res_strings_country.get(country).unwrap_or(&self.res_strings_default);
        }
        map.get(&key).cloned().ok_or_else(not_found)
    }

    /// Parse a resource id string into its numeric form. Accepts `@0x`-style
    /// 8-digit hex ids and `@type/key` symbolic ids.
    pub fn strid2int(&self, res_id: &str) -> Result<u32> {
        let invalid = || Error::InvalidIdFormat { id: res_id.to_string() };
        let stripped = res_id.strip_prefix('@').unwrap_or(res_id);
        if let Some(hex) = stripped.strip_prefix("0x") {
            if hex.len() != 8 {
                return Err(invalid());
            }
            return u32::from_str_radix(hex, 16).map_err(|_| invalid());
        }
        if stripped.contains('/') {
            return self.symbolic_to_int(stripped, res_id);
        }
        Err(invalid())
    }

    fn symbolic_to_int(&self, symbolic: &str, original: &str) -> Result<u32> {
        let (type_name, key) = symbolic
            .split_once('/')
            .ok_or_else(|| Error::InvalidIdFormat { id: original.to_string() })?;
        let word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !word(type_name) || !word(key) {
            return Err(Error::InvalidIdFormat { id: original.to_string() });
        }

        let tid = self
            .type_strings
            .strings
            .iter()
            .position(|s| s == type_name)
            .map(|pos| pos as u32 + 1)
            .ok_or_else(|| Error::UnresolvedResource { id: original.to_string() })?;

        // The key may only exist in some configurations, so every variant's
        // key table is consulted.
        let key_index = self
            .types
            .get(&(tid as u8))
            .into_iter()
            .flatten()
            .find_map(|t| t.keys.get(key).copied())
            .ok_or_else(|| Error::UnresolvedResource { id: original.to_string() })?;

        Ok(((self.id & 0xFF) << 24) | (tid << 16) | key_index)
    }

    /// Format a symbolic id as its `@0x` hex form.
    pub fn res_hex_id(&self, res_id: &str) -> Result<String> {
        Ok(format!("@0x{:08x}", self.strid2int(res_id)?))
    }

    /// Format a hex id as its `@type/key` symbolic form.
    pub fn res_readable_id(&self, res_id: &str) -> Result<String> {
        let not_found = || Error::UnresolvedResource { id: res_id.to_string() };
        let int_id = self.strid2int(res_id)?;
        let tid = ((int_id & 0x00FF_0000) >> 16) as u8;
        let key = int_id & 0xFFFF;

        let type_name = self.type_name(tid).ok_or_else(not_found)?;
        let entry = self
            .types
            .get(&tid)
            .and_then(|variants| variants.first())
            .and_then(|t| t.entries.get(key as usize))
            .and_then(Option::as_ref)
            .ok_or_else(not_found)?;
        Ok(format!("@{}/{}", type_name, self.key_strings.get(entry.key)?))
    }

    /// The type-pool name for a one-based type id.
    pub fn type_name(&self, tid: u8) -> Option<&str> {
        if tid == 0 {
            return None;
        }
        self.type_strings.strings.get(tid as usize - 1).map(String::as_str)
    }
}

/// Build the per-locale string tables up front: entry index to resolved
/// string, for the default configuration and for each declared language and
/// country.
#[allow(clippy::type_complexity)]
fn extract_res_strings(
    type_strings: &StringPool,
    types: &HashMap<u8, Vec<ResTableType>>,
    global: &StringPool,
) -> (
    HashMap<u32, String>,
    HashMap<String, HashMap<u32, String>>,
    HashMap<String, HashMap<u32, String>>,
) {
    let mut default = HashMap::new();
    let mut by_lang: HashMap<String, HashMap<u32, String>> = HashMap::new();
    let mut by_country: HashMap<String, HashMap<u32, String>> = HashMap::new();

    let string_tid = match type_strings.strings.iter().position(|s| s == "string") {
        Some(pos) => (pos + 1) as u8,
        None => return (default, by_lang, by_country),
    };
    let Some(variants) = types.get(&string_tid) else {
        return (default, by_lang, by_country);
    };

    for t in variants {
        let lang = t.config.locale_lang.as_deref();
        let country = t.config.locale_country.as_deref();
        let mut map = HashMap::new();
        for index in 0..t.entries.len() as u32 {
            if let Some(value) = lookup_string_value(t, index, global) {
                map.insert(index, value);
            }
        }
        match (lang, country) {
            (None, None) => {
                // Later no-locale variants never shadow an earlier one.
                for (index, value) in map {
                    default.entry(index).or_insert(value);
                }
            }
            _ => {
                if let Some(lang) = lang {
                    by_lang.insert(lang.to_string(), map.clone());
                }
                if let Some(country) = country {
                    by_country.insert(country.to_string(), map);
                }
            }
        }
    }
    (default, by_lang, by_country)
}

/// Resolve one string entry, following same-type references. The hop budget
/// keeps reference cycles from looping forever.
fn lookup_string_value(t: &ResTableType, index: u32, global: &StringPool) -> Option<String> {
    let mut current = index;
    for _ in 0..=t.entries.len() {
        let entry = t.entries.get(current as usize)?.as_ref()?;
        match entry.value.data_type {
            TYPE_REFERENCE => current = entry.value.data & 0xFFFF,
            TYPE_STRING => return global.strings.get(entry.value.data as usize).cloned(),
            _ => return None,
        }
    }
    None
}
