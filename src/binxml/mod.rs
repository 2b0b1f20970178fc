//! Binary XML decoding and in-place patching.

mod model;
mod parser;
mod tokens;
mod writer;

pub use self::model::{Element, TypedValue, XmlDocument, XmlNode};
pub use self::parser::{AxmlParser, is_axml};
pub use self::writer::{AxmlWriter, PatchValue};
