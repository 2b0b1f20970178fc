//! Plain-text rendering of decoded documents.

use std::fmt::Write;

use crate::binxml::{Element, XmlDocument, XmlNode};

const INDENT: usize = 2;

/// Render a decoded document as indented XML text with a UTF-8 declaration.
pub fn render_document(doc: &XmlDocument) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    for node in &doc.nodes {
        render_node(&mut out, node, 0);
    }
    out
}

fn render_node(out: &mut String, node: &XmlNode, indent: usize) {
    match node {
        XmlNode::Element(el) => render_element(out, el, indent),
        XmlNode::Text(text) => {
            let _ = writeln!(out, "{:indent$}{}", "", escape_xml(text));
        }
    }
}

fn render_element(out: &mut String, el: &Element, indent: usize) {
    let _ = write!(out, "{:indent$}<{}", "", el.name);
    for (key, value) in &el.attributes {
        let _ = write!(out, " {}=\"{}\"", key, escape_xml(&value.to_string()));
    }

    match el.children.as_slice() {
        [] => {
            out.push_str("/>\n");
        }
        [XmlNode::Text(text)] => {
            let _ = writeln!(out, ">{}</{}>", escape_xml(text), el.name);
        }
        children => {
            out.push_str(">\n");
            for child in children {
                render_node(out, child, indent + INDENT);
            }
            let _ = writeln!(out, "{:indent$}</{}>", "", el.name);
        }
    }
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}
