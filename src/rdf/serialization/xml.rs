//! Minimal namespace-aware XML element tree
//!
//! Reading resolves every element and attribute name to a [`QName`];
//! comments, processing instructions and the prolog are dropped. Writing
//! declares exactly the namespaces the tree uses on the root element.

use crate::rdf::namespace::{NamespaceManager, QName};
use crate::rdf::vocab::XML_NS;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};
use std::collections::BTreeMap;
use std::io;
use thiserror::Error;

/// XML reading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// Malformed XML
    #[error("XML syntax error: {0}")]
    Syntax(String),

    /// Malformed attribute
    #[error("XML attribute error: {0}")]
    Attribute(String),

    /// Document without an element
    #[error("No root element")]
    NoRootElement,

    /// Input ended inside an element
    #[error("Unclosed element: {0}")]
    UnclosedElement(String),
}

pub type XmlResult<T> = Result<T, XmlError>;

impl From<quick_xml::Error> for XmlError {
    fn from(e: quick_xml::Error) -> Self {
        XmlError::Syntax(e.to_string())
    }
}

/// Attribute with a resolved name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: QName,
    pub value: String,
}

/// Element content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// XML element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Resolved element name
    pub name: QName,
    /// Attributes in document order, namespace declarations excluded
    pub attributes: Vec<XmlAttribute>,
    /// Child elements and text, in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create a new empty element
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing an existing one with the same name
    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(XmlAttribute { name, value }),
        }
    }

    /// Builder-style variant of [`set_attribute`](Self::set_attribute)
    pub fn with_attribute(mut self, name: QName, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Get an attribute value by namespace and local name
    pub fn attribute(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.local == local && a.name.in_namespace(namespace))
            .map(|a| a.value.as_str())
    }

    /// Check whether an attribute is present
    pub fn has_attribute(&self, namespace: &str, local: &str) -> bool {
        self.attribute(namespace, local).is_some()
    }

    /// Append a child element
    pub fn push_element(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Append text, merging with preceding text
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.children.last_mut() {
            Some(XmlNode::Text(existing)) => existing.push_str(text),
            _ => self.children.push(XmlNode::Text(text.to_string())),
        }
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// All text directly inside this element, or None when there is none
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }

    /// Read a document into its root element
    pub fn parse_str(input: &str) -> XmlResult<XmlElement> {
        let mut reader = NsReader::from_str(input);
        reader.config_mut().expand_empty_elements = true;

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            let (ns, event) = reader.read_resolved_event()?;
            let ns = resolved_namespace(ns)?;
            match event {
                Event::Start(start) => {
                    let local = decode(start.local_name().as_ref())?;
                    let name = match ns {
                        Some(ns) => QName::new(ns, local),
                        None if has_xml_prefix(start.name().as_ref()) => QName::new(XML_NS, local),
                        None => QName::local(local),
                    };
                    let mut element = XmlElement::new(name);
                    read_attributes(&reader, &start, &mut element)?;
                    stack.push(element);
                }
                Event::End(_) => {
                    let Some(element) = stack.pop() else {
                        return Err(XmlError::Syntax("unexpected end tag".to_string()));
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.push_element(element),
                        None if root.is_none() => root = Some(element),
                        None => {
                            return Err(XmlError::Syntax("multiple root elements".to_string()))
                        }
                    }
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text.unescape()?;
                        parent.push_text(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::UnclosedElement(open.name.to_string()));
        }
        root.ok_or(XmlError::NoRootElement)
    }

    /// Render as an indented document fragment.
    ///
    /// Prefixes come from `namespaces`; namespaces it does not know get
    /// generated `ns<N>` prefixes.
    pub fn to_xml_string(&self, namespaces: &NamespaceManager) -> io::Result<String> {
        let prefixes = assign_prefixes(self, namespaces);

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        write_element(&mut writer, self, &prefixes, true)?;
        String::from_utf8(writer.into_inner()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn decode(bytes: &[u8]) -> XmlResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| XmlError::Syntax(e.to_string()))
}

fn has_xml_prefix(qname: &[u8]) -> bool {
    qname.starts_with(b"xml:")
}

fn resolved_namespace(ns: ResolveResult<'_>) -> XmlResult<Option<String>> {
    match ns {
        ResolveResult::Bound(ns) => decode(ns.as_ref()).map(Some),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) if prefix.as_slice() == b"xml" => Ok(Some(XML_NS.to_string())),
        ResolveResult::Unknown(prefix) => Err(XmlError::Syntax(format!(
            "unknown namespace prefix: {}",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn read_attributes(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    element: &mut XmlElement,
) -> XmlResult<()> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Attribute(e.to_string()))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let local = decode(local.as_ref())?;
        let name = match resolved_namespace(ns)? {
            Some(ns) => QName::new(ns, local),
            None => QName::local(local),
        };
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Attribute(e.to_string()))?;
        element.attributes.push(XmlAttribute {
            name,
            value: value.into_owned(),
        });
    }
    Ok(())
}

/// Namespace → prefix for every namespace used in the tree
fn assign_prefixes(root: &XmlElement, namespaces: &NamespaceManager) -> BTreeMap<String, String> {
    let mut used = Vec::new();
    collect_namespaces(root, &mut used);

    let mut prefixes = BTreeMap::new();
    let mut generated = 0;
    for ns in used {
        if prefixes.contains_key(&ns) {
            continue;
        }
        let prefix = if ns == XML_NS {
            "xml".to_string()
        } else if let Some(prefix) = namespaces.prefix_for(&ns).filter(|p| !p.is_empty()) {
            prefix.to_string()
        } else {
            loop {
                let candidate = format!("ns{}", generated);
                generated += 1;
                if namespaces.get_iri(&candidate).is_err() {
                    break candidate;
                }
            }
        };
        prefixes.insert(ns, prefix);
    }
    prefixes
}

fn collect_namespaces(element: &XmlElement, used: &mut Vec<String>) {
    let names = std::iter::once(&element.name).chain(element.attributes.iter().map(|a| &a.name));
    for name in names {
        if let Some(ns) = &name.namespace {
            used.push(ns.clone());
        }
    }
    for child in element.elements() {
        collect_namespaces(child, used);
    }
}

fn prefixed(name: &QName, prefixes: &BTreeMap<String, String>) -> String {
    match name.namespace.as_ref().and_then(|ns| prefixes.get(ns)) {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.clone(),
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &XmlElement,
    prefixes: &BTreeMap<String, String>,
    is_root: bool,
) -> io::Result<()> {
    let tag = prefixed(&element.name, prefixes);
    let mut start = BytesStart::new(tag.as_str());

    if is_root {
        let mut declarations: Vec<(&String, &String)> = prefixes
            .iter()
            .filter(|(ns, _)| ns.as_str() != XML_NS)
            .map(|(ns, prefix)| (prefix, ns))
            .collect();
        declarations.sort();
        for (prefix, ns) in declarations {
            start.push_attribute((format!("xmlns:{}", prefix).as_str(), ns.as_str()));
        }
    }
    for attr in &element.attributes {
        start.push_attribute((prefixed(&attr.name, prefixes).as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        return write(writer, Event::Empty(start));
    }

    write(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e, prefixes, false)?,
            XmlNode::Text(t) => write(writer, Event::Text(BytesText::new(t)))?,
        }
    }
    write(writer, Event::End(BytesEnd::new(tag.as_str())))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> io::Result<()> {
    writer
        .write_event(event)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}
