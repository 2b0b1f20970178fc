//! The decoded XML document model.

use std::fmt;

/// One node of the decoded tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

/// A decoded element with its qualified name, attributes in document order,
/// and child nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, TypedValue)>,
    pub children: Vec<XmlNode>,
}

impl Element {
    /// The value of the attribute with the given qualified name, if present.
    pub fn attribute(&self, name: &str) -> Option<&TypedValue> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Child elements, skipping text nodes.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// The element's first text child, if any.
    pub fn text(&self) -> Option<&str> {
        self.children.iter().find_map(|node| match node {
            XmlNode::Text(t) => Some(t.as_str()),
            XmlNode::Element(_) => None,
        })
    }
}

/// A fully decoded document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlDocument {
    pub nodes: Vec<XmlNode>,
}

impl XmlDocument {
    /// The first top-level element.
    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }
}

/// A decoded attribute value.
///
/// String-valued attributes carry their resolved pool string; everything else
/// is decoded from the typed-value word. Types without a dedicated variant are
/// preserved as [`TypedValue::Raw`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    String(String),
    Reference(u32),
    IntDec(u32),
    IntHex(u32),
    Boolean(bool),
    Raw { data: u32, flags: u32 },
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Null => Ok(()),
            TypedValue::String(s) => f.write_str(s),
            TypedValue::Reference(id) => write!(f, "@0x{id:x}"),
            TypedValue::IntDec(v) => write!(f, "{v}"),
            TypedValue::IntHex(v) => write!(f, "0x{v:x}"),
            TypedValue::Boolean(b) => write!(f, "{b}"),
            TypedValue::Raw { data, flags } => write!(f, "[0x{data:x}, flag=0x{flags:x}]"),
        }
    }
}
