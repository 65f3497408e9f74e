//! Mutable XML tree with arena storage.
//!
//! The document owns every node in a flat arena; the rest of the crate refers
//! to nodes through copyable [`NodeId`] handles. All mutation goes through the
//! document, so a handle held by a domain object can never alias a second
//! owner. Whitespace text nodes are kept verbatim, which makes re-serialization
//! reproduce the source formatting apart from the declaration.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
}

/// Handle into a [`Document`]'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<NodeId>,
}

enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

pub struct Document {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Document {
    /// Parse a document from UTF-8 text. Fatal on malformed markup.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        let mut doc = Document {
            nodes: Vec::new(),
            roots: Vec::new(),
        };
        let mut reader = Reader::from_str(xml);
        // Keep whitespace text nodes so the output reproduces the input layout
        reader.config_mut().trim_text(false);

        let mut stack: Vec<NodeId> = Vec::new();
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let id = doc.push_element(&e, stack.last().copied())?;
                    stack.push(id);
                }
                Event::Empty(e) => {
                    doc.push_element(&e, stack.last().copied())?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(e) => {
                    let text = e.unescape()?.into_owned();
                    doc.push_node(Node::Text(text), stack.last().copied());
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    doc.push_node(Node::Text(text), stack.last().copied());
                }
                Event::Comment(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    doc.push_node(Node::Comment(text), stack.last().copied());
                }
                // Declaration is normalized on output; PIs and doctypes don't
                // occur in the preset files this tool targets
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }
        Ok(doc)
    }

    /// Read and parse a document from a file.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let xml = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    fn push_element(
        &mut self,
        start: &BytesStart,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ParseError> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attrs.push((key, value));
        }
        Ok(self.push_node(
            Node::Element(Element {
                tag,
                attrs,
                children: Vec::new(),
            }),
            parent,
        ))
    }

    fn push_node(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        match parent {
            Some(p) => match &mut self.nodes[p.0] {
                Node::Element(el) => el.children.push(id),
                _ => unreachable!("parent is always an element"),
            },
            None => self.roots.push(id),
        }
        id
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0] {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// The document's root element.
    pub fn root(&self) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replace an attribute's value, or append the attribute if absent.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Node::Element(el) = &mut self.nodes[id.0] {
            match el.attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => el.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Element children of a node, in document order. Text nodes are skipped.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.element(id)
            .map(|el| el.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    pub fn child_by_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children(id).find(|&c| self.tag(c) == Some(tag))
    }

    /// Element descendants of a node in document (preorder) order,
    /// excluding the node itself.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            let start = stack.len();
            stack.extend(self.children(next));
            stack[start..].reverse();
            Some(next)
        })
    }

    pub fn find_descendant(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(id).find(|&d| self.tag(d) == Some(tag))
    }

    /// Serialize with a normalized UTF-8 declaration. Only attributes changed
    /// through [`Document::set_attr`] differ from the parsed input.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        for &root in &self.roots {
            self.write_node(&mut writer, root)?;
        }
        Ok(writer.into_inner())
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> anyhow::Result<()> {
        match &self.nodes[id.0] {
            Node::Element(el) => {
                let mut start = BytesStart::new(el.tag.as_str());
                for (k, v) in &el.attrs {
                    start.push_attribute((k.as_str(), v.as_str()));
                }
                if el.children.is_empty() {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    for &child in &el.children {
                        self.write_node(writer, child)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(el.tag.as_str())))?;
                }
            }
            Node::Text(text) => {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            Node::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
            }
        }
        Ok(())
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

/// Output path for the edited copy: `<stem>Edit.<ext>`, falling back to
/// `.adg` when the source has no extension. Never the source path itself.
pub fn edit_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let ext = source.extension().and_then(|s| s.to_str()).unwrap_or("adg");
    source.with_file_name(format!("{stem}Edit.{ext}"))
}
