//! Atom + OData response envelope extraction.
//!
//! Every service response is an Atom document whose `entry` elements wrap
//! OData `properties` records:
//!
//! ```text
//! <feed xmlns="http://www.w3.org/2005/Atom" xmlns:m=".../metadata" xmlns:d=".../dataservices">
//!   <entry>
//!     <content type="application/xml">
//!       <m:properties>
//!         <d:Id>1</d:Id>
//!         <d:Name>Halogen Headlights</d:Name>
//!       </m:properties>
//!     </content>
//!   </entry>
//! </feed>
//! ```
//!
//! The body is decoded into an owned element tree whose names are resolved
//! against the three fixed namespaces below, so queries do not depend on
//! the prefixes the server happened to choose. Nothing is cached: every
//! call parses its own body.

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::{RecoError, Result};

/// Atom syndication namespace (`entry`, `content`)
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// OData metadata namespace (`properties`)
pub const METADATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";

/// OData data namespace (record fields such as `Id`, `Status`)
pub const DATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    Text(String),
}

/// One element of a decoded response document
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    namespace: Option<String>,
    local_name: String,
    children: Vec<Node>,
}

impl Element {
    fn new(namespace: Option<String>, local_name: String) -> Self {
        Self {
            namespace,
            local_name,
            children: Vec::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// True when this element has the given namespace URI and local name
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace() == Some(namespace) && self.local_name == local_name
    }

    /// Child elements in document order (text nodes are skipped)
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given qualified name
    pub fn child(&self, namespace: &str, local_name: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(namespace, local_name))
    }

    /// Text of the first child element with the given qualified name
    pub fn child_text(&self, namespace: &str, local_name: &str) -> Option<String> {
        self.child(namespace, local_name).map(Element::text)
    }

    /// Concatenated text of this element and all of its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Pre-order walk collecting every element (self included) with the
    /// given qualified name
    fn descendants_named<'a>(
        &'a self,
        namespace: &str,
        local_name: &str,
        out: &mut Vec<&'a Element>,
    ) {
        if self.is(namespace, local_name) {
            out.push(self);
        }
        for child in self.elements() {
            child.descendants_named(namespace, local_name, out);
        }
    }
}

/// Typed value built from one `m:properties` record
pub trait FromRecord: Sized {
    fn from_record(record: &Element) -> Result<Self>;
}

/// A decoded Atom + OData response body
#[derive(Debug, Clone)]
pub struct Envelope {
    root: Element,
}

impl Envelope {
    /// Decode a response body into an element tree.
    ///
    /// Fails with [`RecoError::Parse`] when the body is not well-formed XML
    /// or holds no root element.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let mut reader = NsReader::from_reader(body);
        reader.config_mut().expand_empty_elements = true;

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let (resolved, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(malformed)?;

            match event {
                Event::Start(start) => {
                    let namespace = match resolved {
                        ResolveResult::Bound(ns) => {
                            Some(String::from_utf8_lossy(ns.as_ref()).into_owned())
                        }
                        _ => None,
                    };
                    let local_name =
                        String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    stack.push(Element::new(namespace, local_name));
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed("unexpected closing tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(element)),
                        None if root.is_none() => root = Some(element),
                        None => return Err(malformed("more than one root element")),
                    }
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text.unescape().map_err(malformed)?;
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.children.push(Node::Text(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(malformed("unclosed element at end of document"));
        }

        root.map(|root| Envelope { root })
            .ok_or_else(|| malformed("document has no root element"))
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Every `a:entry/a:content/m:properties` record, in document order
    pub fn records(&self) -> Vec<&Element> {
        let mut entries = Vec::new();
        self.root.descendants_named(ATOM_NS, "entry", &mut entries);

        entries
            .into_iter()
            .flat_map(|entry| entry.elements().filter(|e| e.is(ATOM_NS, "content")))
            .flat_map(|content| content.elements().filter(|e| e.is(METADATA_NS, "properties")))
            .collect()
    }

    pub fn first_record(&self) -> Option<&Element> {
        self.records().into_iter().next()
    }

    /// First record satisfying `predicate`
    pub fn find_record<P>(&self, predicate: P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        self.records().into_iter().find(|record| predicate(record))
    }

    /// Convert every record into `T`, preserving document order
    pub fn parse_records<T: FromRecord>(&self) -> Result<Vec<T>> {
        self.records().into_iter().map(T::from_record).collect()
    }
}

fn malformed(reason: impl ToString) -> RecoError {
    RecoError::parse("response envelope", reason.to_string())
}
