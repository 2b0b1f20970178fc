//! Compiled resource table decoding and lookup.
//!
//! A table file is a sequence of top-level chunks: the table header, one
//! global string pool holding every string value, then one package chunk per
//! contained package. Lookup goes through [`ResourceTable::find`] with either
//! a hex id (`@0x7f030001`) or a symbolic id (`@string/app_name`).

mod config;
mod entry;
mod package;

use std::sync::Arc;

use log::debug;

use crate::chunk::{self, ChunkHeader};
use crate::err::{Error, Result};
use crate::string_pool::StringPool;
use crate::utils::bytes;

pub use self::config::ResTableConfig;
pub use self::entry::{
    EntryFlags, MapEntryHeader, NO_ENTRY, ResTableEntry, ResTableType, ResTableTypeSpec, ResValue,
};
pub use self::package::{FindOptions, ResTablePackage, ResourceValue};

#[derive(Debug, PartialEq)]
pub struct ResourceTable {
    pub package_count: u32,
    global: Arc<StringPool>,
    pub packages: Vec<ResTablePackage>,
}

impl ResourceTable {
    pub fn decode(data: &[u8]) -> Result<ResourceTable> {
        let mut package_count = 0;
        let mut global: Option<Arc<StringPool>> = None;
        let mut packages = Vec::new();

        let mut offset = 0;
        while offset < data.len() {
            let tag = chunk::peek_tag(data, offset)?;
            match tag {
                chunk::RES_TABLE_TYPE => {
                    let header = ChunkHeader::parse(data, offset)?;
                    package_count = bytes::read_u32_le_r(data, offset + 8, "package count")?;
                    debug!("table header at {offset:#x}: {package_count} packages");
                    offset += header.header_size as usize;
                }
                chunk::RES_STRING_POOL_TYPE => {
                    let pool = StringPool::decode(data, offset)?;
                    debug!("global string pool at {offset:#x}: {} strings", pool.string_count);
                    offset += pool.header.size as usize;
                    global = Some(Arc::new(pool));
                }
                chunk::RES_TABLE_PACKAGE_TYPE => {
                    let pool = global.clone().ok_or(Error::MissingStringPool)?;
                    let package = ResTablePackage::decode(data, offset, pool)?;
                    debug!("package `{}` at {offset:#x}", package.name);
                    offset = package.header.end();
                    packages.push(package);
                }
                tag => {
                    return Err(Error::UnknownChunkType { tag, offset: offset as u64 });
                }
            }
        }

        let global = global.ok_or(Error::MissingStringPool)?;
        Ok(ResourceTable { package_count, global, packages })
    }

    /// The global value-string pool contents.
    pub fn strings(&self) -> &[String] {
        &self.global.strings
    }

    pub fn package_count(&self) -> u32 {
        self.package_count
    }

    pub fn package(&self, name: &str) -> Option<&ResTablePackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn first_package(&self) -> Option<&ResTablePackage> {
        self.packages.first()
    }

    /// Resolve a resource id against the first package.
    pub fn find(&self, res_id: &str, opts: FindOptions<'_>) -> Result<ResourceValue> {
        self.require_package(res_id)?.find(res_id, opts)
    }

    pub fn res_readable_id(&self, res_id: &str) -> Result<String> {
        self.require_package(res_id)?.res_readable_id(res_id)
    }

    pub fn res_hex_id(&self, res_id: &str) -> Result<String> {
        self.require_package(res_id)?.res_hex_id(res_id)
    }

    fn require_package(&self, res_id: &str) -> Result<&ResTablePackage> {
        self.packages
            .first()
            .ok_or_else(|| Error::UnresolvedResource { id: res_id.to_string() })
    }
}
