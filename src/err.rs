use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("offset {offset}: not enough data to read {what} (need {need} bytes, have {have})")]
    Truncated {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("offset {offset:#x}: unknown chunk type {tag:#06x}")]
    UnknownChunkType { tag: u16, offset: u64 },

    #[error("offset {offset:#x}: malformed or unexpected chunk (tag {tag:#010x})")]
    MalformedChunk { tag: u32, offset: u64 },

    #[error("string pool index {index} is out of range (pool holds {count} strings)")]
    StringIndexOutOfRange { index: u32, count: usize },

    #[error("{construct} is not supported")]
    UnsupportedConstruct { construct: &'static str },

    #[error("could not resolve namespace `{uri}` to a declared prefix")]
    UnresolvedNamespace { uri: String },

    #[error("resource `{id}` was not found in the table")]
    UnresolvedResource { id: String },

    #[error("`{id}` is not a valid resource id")]
    InvalidIdFormat { id: String },

    #[error("attribute `{attribute}` on element `{element}` was not found")]
    AttributeNotFound { element: String, attribute: String },

    #[error("package chunk appeared before the global string pool")]
    MissingStringPool,

    #[error("an I/O error has occurred: {0}")]
    Io(#[from] io::Error),
}
