//! In-place patching of binary XML attribute values.
//!
//! The writer decodes the document once to record where each attribute's
//! value words live, then patches values directly in the owned buffer.
//! Integer-typed values are overwritten in place; string values are appended
//! to the document's string pool and both value words are repointed at the
//! new index.

use log::debug;

use crate::err::{Error, Result};
use crate::string_pool::StringPool;
use crate::utils::bytes;

use super::parser::{AttributeSite, AxmlParser};

/// A replacement attribute value.
#[derive(Debug, Clone, Copy)]
pub enum PatchValue<'a> {
    String(&'a str),
    Integer(u32),
}

pub struct AxmlWriter {
    data: Vec<u8>,
    sites: Vec<AttributeSite>,
}

impl AxmlWriter {
    pub fn new(data: Vec<u8>) -> Result<AxmlWriter> {
        let (_, sites) = AxmlParser::new(&data)?.parse_with_sites()?;
        Ok(AxmlWriter { data, sites })
    }

    /// Replace the value of `attribute` on the first element named `element`
    /// carrying it. The replacement must match the attribute's stored shape:
    /// strings replace string values, integers replace typed words.
    pub fn modify_named_value(
        &mut self,
        element: &str,
        attribute: &str,
        value: PatchValue<'_>,
    ) -> Result<()> {
        let site_index = self
            .sites
            .iter()
            .position(|site| site.element == element && site.name == attribute)
            .ok_or_else(|| Error::AttributeNotFound {
                element: element.to_string(),
                attribute: attribute.to_string(),
            })?;

        match value {
            PatchValue::Integer(raw) => {
                let site = &self.sites[site_index];
                if site.is_string {
                    return Err(Error::UnsupportedConstruct {
                        construct: "replacing a string-typed attribute with an integer",
                    });
                }
                debug!(
                    "patching {element}[{attribute}] with integer {raw:#x} at {:#x}",
                    site.raw_value_offset
                );
                bytes::write_u32_le(&mut self.data, site.raw_value_offset, raw)?;
            }
            PatchValue::String(text) => {
                if !self.sites[site_index].is_string {
                    return Err(Error::UnsupportedConstruct {
                        construct: "replacing a non-string attribute with a string",
                    });
                }
                let (new_index, bytes_added) = StringPool::add_string(&mut self.data, 8, text)?;
                let total = bytes::read_u32_le_r(&self.data, 4, "document size")?;
                bytes::write_u32_le(&mut self.data, 4, total + bytes_added as u32)?;

                // Every attribute record sits after the pool, so all recorded
                // offsets shift by the spliced byte count.
                for site in &mut self.sites {
                    site.value_str_offset += bytes_added;
                    site.raw_value_offset += bytes_added;
                }
                let site = &self.sites[site_index];
                debug!(
                    "patching {element}[{attribute}] with pool string {new_index} at {:#x}",
                    site.value_str_offset
                );
                bytes::write_u32_le(&mut self.data, site.value_str_offset, new_index)?;
                bytes::write_u32_le(&mut self.data, site.raw_value_offset, new_index)?;
            }
        }
        Ok(())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
