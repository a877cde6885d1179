//! Namespace-aware XML element tree
//!
//! `dataset.xml` and `files.xml` are small enough to hold in memory, and the
//! mapping rules address them by namespace-qualified paths, so they are read
//! once into an [`XmlDocument`] with every element and attribute resolved to
//! its namespace URI.

use crate::error::{IngestError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::path::Path;

pub const NS_DDM: &str = "http://schemas.dans.knaw.nl/dataset/ddm-v2/";
pub const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
pub const NS_DCTERMS: &str = "http://purl.org/dc/terms/";
pub const NS_DCX_DAI: &str = "http://easy.dans.knaw.nl/schemas/dcx/dai/";
pub const NS_FILES: &str = "http://easy.dans.knaw.nl/schemas/bag/metadata/files/";
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Prefixes usable in element paths passed to [`XmlElement::select`]
const PATH_PREFIXES: &[(&str, &str)] = &[
    ("ddm", NS_DDM),
    ("dc", NS_DC),
    ("dcterms", NS_DCTERMS),
    ("dcx-dai", NS_DCX_DAI),
    ("files", NS_FILES),
    ("xsi", NS_XSI),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
    /// Concatenated character data directly inside this element
    pub text: String,
}

impl XmlElement {
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// Attribute value by namespace and local name; `None` namespace matches unqualified attributes
    pub fn attribute(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    /// The `xsi:type` attribute, if any
    pub fn xsi_type(&self) -> Option<&str> {
        self.attribute(Some(NS_XSI), "type")
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    pub fn child(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// Children matched on local name only, whatever their namespace
    pub fn children_local<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first matching child, when non-blank
    pub fn child_text(&self, namespace: &str, name: &str) -> Option<&str> {
        self.child(namespace, name)
            .map(XmlElement::trimmed_text)
            .filter(|t| !t.is_empty())
    }

    /// Elements reached by a slash-separated path of prefixed names, relative to this element
    ///
    /// Unknown prefixes match nothing.
    pub fn select<'a>(&'a self, path: &str) -> Vec<&'a XmlElement> {
        let mut current = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            let Some((namespace, name)) = resolve_step(step) else {
                return Vec::new();
            };
            current = current
                .into_iter()
                .flat_map(move |e| e.children.iter().filter(move |c| c.is(namespace, name)))
                .collect();
        }
        current
    }
}

fn resolve_step(step: &str) -> Option<(&'static str, &str)> {
    let (prefix, name) = step.split_once(':')?;
    PATH_PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, ns)| (*ns, name))
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            IngestError::Xml { message, .. } => IngestError::xml(path.display().to_string(), message),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(content);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let (ns, event) = reader
                .read_resolved_event()
                .map_err(|e| IngestError::xml("<input>", e))?;
            let namespace = bound_namespace(&ns);

            match event {
                Event::Start(start) => {
                    let element = start_element(&reader, namespace, &start)?;
                    stack.push(element);
                },
                Event::Empty(start) => {
                    let element = start_element(&reader, namespace, &start)?;
                    attach(&mut stack, &mut root, element);
                },
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| IngestError::xml("<input>", "unbalanced end tag"))?;
                    attach(&mut stack, &mut root, element);
                },
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        let value = text.unescape().map_err(|e| IngestError::xml("<input>", e))?;
                        current.text.push_str(&value);
                    }
                },
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if !stack.is_empty() {
            return Err(IngestError::xml("<input>", "unexpected end of document"));
        }
        root.map(|root| XmlDocument { root })
            .ok_or_else(|| IngestError::xml("<input>", "document has no root element"))
    }
}

fn bound_namespace(ns: &ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(namespace) => Some(String::from_utf8_lossy(namespace.as_ref()).into_owned()),
        _ => None,
    }
}

fn start_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<XmlElement> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| IngestError::xml("<input>", e))?;
        let key = attr.key;
        if key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let (attr_ns, local) = reader.resolve_attribute(key);
        let value = attr
            .unescape_value()
            .map_err(|e| IngestError::xml("<input>", e))?
            .into_owned();
        attributes.push(XmlAttribute {
            namespace: bound_namespace(&attr_ns),
            name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value,
        });
    }

    Ok(XmlElement {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}
