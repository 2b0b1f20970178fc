//! Event-stream decoder for binary XML documents.
//!
//! The body is a flat stream of fixed-layout events following the string
//! pool. The decoder replays namespace and element events against a stack and
//! produces an [`XmlDocument`], resolving every name and attribute through
//! the pool.

use log::trace;

use crate::err::{Error, Result};
use crate::string_pool::StringPool;
use crate::utils::ByteCursor;
use crate::utils::bytes;

use super::model::{Element, TypedValue, XmlDocument, XmlNode};
use super::tokens::{
    self, AttributeRecord, NO_NAMESPACE, NO_VALUE, TAG_CDSECT, TAG_END, TAG_END_NAMESPACE,
    TAG_ENTITY_REF, TAG_START, TAG_START_NAMESPACE, TAG_TEXT,
};

const AXML_MAGIC: [u8; 4] = [0x03, 0x00, 0x08, 0x00];

/// Whether `data` starts with the binary-XML file signature.
pub fn is_axml(data: &[u8]) -> bool {
    data.get(..4) == Some(&AXML_MAGIC[..])
}

/// The byte positions of one attribute's patchable value words, recorded
/// while decoding so a writer can splice replacements in place.
#[derive(Debug, Clone)]
pub(crate) struct AttributeSite {
    pub element: String,
    pub name: String,
    pub value_str_offset: usize,
    pub raw_value_offset: usize,
    pub is_string: bool,
}

/// A declared namespace binding and the element depth it was pushed at.
#[derive(Debug)]
struct Namespace {
    prefix: String,
    uri: String,
    nesting_level: u32,
}

pub struct AxmlParser<'a> {
    data: &'a [u8],
    pool: StringPool,
}

impl<'a> AxmlParser<'a> {
    pub fn new(data: &'a [u8]) -> Result<AxmlParser<'a>> {
        if !is_axml(data) {
            return Err(Error::MalformedChunk {
                tag: bytes::read_u32_le(data, 0).unwrap_or(0),
                offset: 0,
            });
        }
        let pool = StringPool::decode(data, 8)?;
        Ok(AxmlParser { data, pool })
    }

    /// The document's string pool contents, in pool order.
    pub fn strings(&self) -> &[String] {
        &self.pool.strings
    }

    pub fn parse(&self) -> Result<XmlDocument> {
        Ok(self.parse_with_sites()?.0)
    }

    pub(crate) fn parse_with_sites(&self) -> Result<(XmlDocument, Vec<AttributeSite>)> {
        let mut cursor = ByteCursor::with_pos(self.data, self.find_body_start()?)?;
        let mut namespaces: Vec<Namespace> = Vec::new();
        // Index 0 is a sentinel that collects the top-level nodes.
        let mut stack: Vec<Element> = vec![Element::default()];
        let mut sites = Vec::new();

        while cursor.remaining() >= 24 {
            let event_offset = cursor.pos();
            let tag = cursor.u32_named("event tag")?;
            let _size = cursor.u32_named("event size")?;
            let _line = cursor.u32_named("event line")?;
            let _comment = cursor.u32_named("event comment")?;
            let ns_id = cursor.u32_named("event namespace")?;
            let name_id = cursor.u32_named("event name")?;
            trace!("event {tag:#010x} at offset {event_offset:#x}");

            match tag {
                TAG_START_NAMESPACE => {
                    namespaces.push(Namespace {
                        prefix: self.pool.get(ns_id)?.to_string(),
                        uri: self.pool.get(name_id)?.to_string(),
                        nesting_level: stack.len() as u32,
                    });
                }
                TAG_END_NAMESPACE => {
                    namespaces.pop();
                    if namespaces.is_empty() {
                        break;
                    }
                }
                TAG_START => {
                    let _flags = cursor.u32_named("element flags")?;
                    let attr_count = cursor.u32_named("attribute count")?;
                    let _class_attr = cursor.u32_named("class attribute")?;

                    let name = if ns_id == NO_NAMESPACE {
                        self.pool.get(name_id)?.to_string()
                    } else {
                        let uri = self.pool.get(ns_id)?;
                        format!("{}:{}", resolve_prefix(&namespaces, uri)?, self.pool.get(name_id)?)
                    };
                    let mut element = Element { name, ..Element::default() };

                    // A namespace declared directly on this element surfaces
                    // as an xmlns attribute. Only the most recent binding is
                    // considered.
                    if let Some(ns) = namespaces.last() {
                        if ns.nesting_level == stack.len() as u32 {
                            element.attributes.push((
                                format!("xmlns:{}", ns.prefix),
                                TypedValue::String(ns.uri.clone()),
                            ));
                        }
                    }

                    for _ in 0..attr_count {
                        let attr_offset = cursor.pos();
                        let rec = AttributeRecord::read(&mut cursor)?;
                        let key = if rec.ns_id == NO_NAMESPACE {
                            self.pool.get(rec.name_id)?.to_string()
                        } else {
                            let uri = self.pool.get(rec.ns_id)?;
                            format!(
                                "{}:{}",
                                resolve_prefix(&namespaces, uri)?,
                                self.pool.get(rec.name_id)?
                            )
                        };
                        let value = tokens::convert_value(&self.pool, &rec)?;
                        sites.push(AttributeSite {
                            element: element.name.clone(),
                            name: key.clone(),
                            value_str_offset: attr_offset + 8,
                            raw_value_offset: attr_offset + 16,
                            is_string: rec.value_string_id != NO_VALUE,
                        });
                        element.attributes.push((key, value));
                    }
                    stack.push(element);
                }
                TAG_END => {
                    if stack.len() > 1 {
                        if let Some(closed) = stack.pop() {
                            if let Some(parent) = stack.last_mut() {
                                parent.children.push(XmlNode::Element(closed));
                            }
                        }
                    }
                }
                TAG_TEXT => {
                    // Text events reuse the namespace slot for the string
                    // index and carry one extra word.
                    let text = self.pool.get(ns_id)?.to_string();
                    cursor.advance(4, "text event payload")?;
                    if let Some(current) = stack.last_mut() {
                        set_text(current, text);
                    }
                }
                TAG_CDSECT => {
                    return Err(Error::UnsupportedConstruct { construct: "CDATA sections" });
                }
                TAG_ENTITY_REF => {
                    return Err(Error::UnsupportedConstruct { construct: "entity references" });
                }
                other => {
                    return Err(Error::MalformedChunk {
                        tag: other,
                        offset: event_offset as u64,
                    });
                }
            }
        }

        // Fold any unclosed elements so a truncated stream still yields the
        // nodes seen so far.
        while stack.len() > 1 {
            if let Some(closed) = stack.pop() {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Element(closed));
                }
            }
        }
        let root = stack.pop().unwrap_or_default();
        Ok((XmlDocument { nodes: root.children }, sites))
    }

    /// Scan forward from the end of the string pool to the first namespace
    /// event. Unknown chunks between the pool and the body (resource-id maps
    /// for instance) are skipped 4 bytes at a time.
    fn find_body_start(&self) -> Result<usize> {
        let mut offset = 8 + self.pool.header.size as usize;
        loop {
            match bytes::read_u32_le(self.data, offset) {
                Some(TAG_START_NAMESPACE) => return Ok(offset),
                Some(_) => offset += 4,
                None => {
                    return Err(bytes::truncated(
                        "xml content start",
                        offset,
                        4,
                        self.data.len(),
                    ));
                }
            }
        }
    }
}

/// Resolve a namespace uri to its declared prefix.
///
/// Bindings may chain (a prefix bound to another binding's prefix), so the
/// candidate is first substituted to a fixpoint through the binding list,
/// innermost declaration first. The iteration count is capped by the number
/// of bindings to survive cyclic declarations.
fn resolve_prefix(namespaces: &[Namespace], uri: &str) -> Result<String> {
    let mut current = uri;
    for _ in 0..=namespaces.len() {
        let next = namespaces
            .iter()
            .rev()
            .find(|ns| ns.prefix == current && ns.uri != current)
            .map(|ns| ns.uri.as_str());
        match next {
            Some(next) => current = next,
            None => break,
        }
    }
    namespaces
        .iter()
        .rev()
        .find(|ns| ns.uri == current)
        .map(|ns| ns.prefix.clone())
        .ok_or_else(|| Error::UnresolvedNamespace { uri: uri.to_string() })
}

fn set_text(element: &mut Element, text: String) {
    for node in &mut element.children {
        if let XmlNode::Text(existing) = node {
            *existing = text;
            return;
        }
    }
    element.children.push(XmlNode::Text(text));
}
