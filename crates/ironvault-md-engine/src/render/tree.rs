//! # Output tree
//!
//! An arena of HTML elements. Parsers never hold references into the tree,
//! only [`ElementId`] handles, so the context stack can keep insertion points
//! while the tree is mutated underneath it.
//!
//! Rendered template fragments enter the tree through
//! [`OutputTree::parse_fragment`], which reads them as XML with `quick-xml`
//! and requires exactly one root element. [`OutputTree::to_html`] writes a
//! subtree back out, escaping with `html-escape`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;

/// Handle to an element in an [`OutputTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Child of an element: another element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Element(ElementId),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Child>,
    pub parent: Option<ElementId>,
}

impl Element {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

/// A rendered fragment that could not be turned into a single element.
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("fragment contains no element")]
    Empty,
    #[error("fragment has more than one root element")]
    MultipleRoots,
    #[error("fragment has text outside its root element")]
    StrayText,
    #[error("fragment ends with unclosed elements")]
    Unclosed,
    #[error("invalid markup: {0}")]
    Syntax(String),
}

impl From<quick_xml::Error> for FragmentError {
    fn from(err: quick_xml::Error) -> Self {
        FragmentError::Syntax(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for FragmentError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        FragmentError::Syntax(err.to_string())
    }
}

impl From<std::str::Utf8Error> for FragmentError {
    fn from(err: std::str::Utf8Error) -> Self {
        FragmentError::Syntax(err.to_string())
    }
}

/// Elements written without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone)]
pub struct OutputTree {
    elements: Vec<Element>,
    root: ElementId,
}

impl Default for OutputTree {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputTree {
    /// Creates a tree with a bare `<div>` root.
    pub fn new() -> Self {
        Self {
            elements: vec![Element::new("div")],
            root: ElementId(0),
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    fn get_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }

    /// Creates a detached element.
    pub fn create(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(Element::new(tag));
        id
    }

    pub fn tag(&self, id: ElementId) -> &str {
        &self.get(id).tag
    }

    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        self.get(id)
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, id: ElementId, name: &str, value: &str) {
        let attrs = &mut self.get_mut(id).attrs;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }

    /// Whether the element's `class` attribute lists `class`.
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).parent
    }

    /// Element children in document order.
    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.get(id)
            .children
            .iter()
            .filter_map(|c| match c {
                Child::Element(e) => Some(*e),
                Child::Text(_) => None,
            })
            .collect()
    }

    /// Direct element children with the given tag.
    pub fn find_all(&self, id: ElementId, tag: &str) -> Vec<ElementId> {
        self.children(id)
            .into_iter()
            .filter(|c| self.tag(*c) == tag)
            .collect()
    }

    /// Concatenated text of the element and all its descendants.
    pub fn text_content(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: ElementId, out: &mut String) {
        for child in &self.get(id).children {
            match child {
                Child::Text(t) => out.push_str(t),
                Child::Element(e) => self.collect_text(*e, out),
            }
        }
    }

    fn detach(&mut self, id: ElementId) {
        if let Some(parent) = self.get_mut(id).parent.take() {
            self.get_mut(parent)
                .children
                .retain(|c| *c != Child::Element(id));
        }
    }

    /// Appends `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: ElementId, child: ElementId) {
        self.detach(child);
        self.get_mut(child).parent = Some(parent);
        self.get_mut(parent).children.push(Child::Element(child));
    }

    /// Appends a text run, merging with a trailing text run.
    pub fn append_text(&mut self, parent: ElementId, text: &str) {
        let children = &mut self.get_mut(parent).children;
        if let Some(Child::Text(last)) = children.last_mut() {
            last.push_str(text);
        } else {
            children.push(Child::Text(text.to_string()));
        }
    }

    /// Moves every child of `from` to the end of `to`'s children.
    pub fn move_children(&mut self, from: ElementId, to: ElementId) {
        let moved = std::mem::take(&mut self.get_mut(from).children);
        for child in &moved {
            if let Child::Element(e) = child {
                self.get_mut(*e).parent = Some(to);
            }
        }
        self.get_mut(to).children.extend(moved);
    }

    /// Puts `new` where `old` sits in its parent's children.
    ///
    /// Returns `false` and leaves the tree untouched when `old` is detached.
    pub fn replace(&mut self, old: ElementId, new: ElementId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        self.detach(new);
        let Some(pos) = self
            .get(parent)
            .children
            .iter()
            .position(|c| *c == Child::Element(old))
        else {
            return false;
        };
        self.get_mut(parent).children[pos] = Child::Element(new);
        self.get_mut(new).parent = Some(parent);
        self.get_mut(old).parent = None;
        true
    }

    fn start_element(&mut self, start: &BytesStart<'_>) -> Result<ElementId, FragmentError> {
        let name = start.name();
        let tag = std::str::from_utf8(name.as_ref())?;
        let id = self.create(tag);
        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            self.get_mut(id).attrs.push((key, value));
        }
        Ok(id)
    }

    /// Parses a rendered fragment into a detached element.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<ElementId, FragmentError> {
        let mut reader = Reader::from_str(markup);
        let mut stack: Vec<ElementId> = Vec::new();
        let mut root: Option<ElementId> = None;

        loop {
            let (id, open) = match reader.read_event()? {
                Event::Start(start) => (self.start_element(&start)?, true),
                Event::Empty(start) => (self.start_element(&start)?, false),
                Event::End(_) => {
                    stack.pop();
                    continue;
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    push_text(self, &stack, &text)?;
                    continue;
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    let text = std::str::from_utf8(&bytes)?;
                    push_text(self, &stack, text)?;
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            match stack.last() {
                Some(&parent) => self.append(parent, id),
                None if root.is_none() => root = Some(id),
                None => return Err(FragmentError::MultipleRoots),
            }
            if open {
                stack.push(id);
            }
        }

        if !stack.is_empty() {
            return Err(FragmentError::Unclosed);
        }
        root.ok_or(FragmentError::Empty)
    }

    /// Serializes the element and its subtree as HTML.
    pub fn to_html(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.write_element(id, &mut out);
        out
    }

    /// Serializes only the children of the element.
    pub fn inner_html(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.write_children(id, &mut out);
        out
    }

    fn write_element(&self, id: ElementId, out: &mut String) {
        let element = self.get(id);
        out.push('<');
        out.push_str(&element.tag);
        for (key, value) in &element.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&element.tag.as_str()) {
            return;
        }
        self.write_children(id, out);
        out.push_str("</");
        out.push_str(&element.tag);
        out.push('>');
    }

    fn write_children(&self, id: ElementId, out: &mut String) {
        for child in &self.get(id).children {
            match child {
                Child::Text(t) => out.push_str(&html_escape::encode_text(t)),
                Child::Element(e) => self.write_element(*e, out),
            }
        }
    }
}

fn push_text(tree: &mut OutputTree, stack: &[ElementId], text: &str) -> Result<(), FragmentError> {
    match stack.last() {
        Some(&parent) => {
            tree.append_text(parent, text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(FragmentError::StrayText),
    }
}
