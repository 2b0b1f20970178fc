//! Decoders for Android's compiled resource formats.
//!
//! Two binary formats are covered:
//!
//! - binary XML (compiled `AndroidManifest.xml` and layout files), decoded to
//!   an [`XmlDocument`] tree by [`AxmlParser`] and patched in place by
//!   [`AxmlWriter`];
//! - the compiled resource table (`resources.arsc`), decoded by
//!   [`ResourceTable`] and queried by hex or symbolic resource id.
//!
//! ```no_run
//! use binres::{AxmlParser, render_document};
//!
//! # fn main() -> binres::Result<()> {
//! let data = std::fs::read("AndroidManifest.xml")?;
//! let document = AxmlParser::new(&data)?.parse()?;
//! print!("{}", render_document(&document));
//! # Ok(())
//! # }
//! ```

pub mod binxml;
pub mod chunk;
pub mod err;
pub mod restable;
pub mod string_pool;
pub mod xml_output;
mod utils;

pub use crate::binxml::{
    AxmlParser, AxmlWriter, Element, PatchValue, TypedValue, XmlDocument, XmlNode, is_axml,
};
pub use crate::err::{Error, Result};
pub use crate::restable::{FindOptions, ResTablePackage, ResourceTable, ResourceValue};
pub use crate::string_pool::{StringPool, StringPoolFlags};
pub use crate::xml_output::render_document;
