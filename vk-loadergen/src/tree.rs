//! Generic element tree read from the registry document.
//!
//! The tree keeps every attribute and every run of text between child
//! elements, so C declarations spread over `<type>`/`<name>` tags can be
//! reconstructed from it after normalization.

use std::io::Read;
use xml::reader::XmlEvent;

use crate::types::FatalError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element {
            name: String::from(name),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(a) => a.value = String::from(value),
            None => self.attributes.push(Attribute {
                name: String::from(name),
                value: String::from(value),
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attributes.retain(|a| a.name != name);
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(String::from(text)));
        self
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given tag.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// Every element below this one with the given tag, depth first.
    pub fn descendants<'a>(&'a self, name: &'a str) -> Vec<&'a Element> {
        let mut result = Vec::new();
        collect_descendants(self, name, &mut result);
        result
    }

    /// Concatenated text of this element and all of its descendants.
    pub fn text(&self) -> String {
        let mut result = String::new();
        collect_text(self, &mut result, &[]);
        result
    }

    /// Like `text`, but skips the content of descendants with the given tags.
    pub fn text_without(&self, skipped: &[&str]) -> String {
        let mut result = String::new();
        collect_text(self, &mut result, skipped);
        result
    }

    /// Text of the first child element with the given tag.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.find(name).map(|e| e.text())
    }
}

fn collect_descendants<'a>(element: &'a Element, name: &str, result: &mut Vec<&'a Element>) {
    for child in element.elements() {
        if child.name == name {
            result.push(child);
        }
        collect_descendants(child, name, result);
    }
}

fn collect_text(element: &Element, result: &mut String, skipped: &[&str]) {
    for child in element.children.iter() {
        match child {
            Node::Text(text) => result.push_str(text),
            Node::Element(e) => {
                if !skipped.contains(&e.name.as_str()) {
                    collect_text(e, result, skipped);
                }
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
/// Reads the registry document from a file into an element tree.
pub fn read_file(path: &std::path::Path) -> Result<Element, FatalError> {
    let file = std::io::BufReader::new(std::fs::File::open(path)?);
    read_stream(file)
}

/// Reads the registry document from a stream into an element tree. The
/// returned element is the `<registry>` root.
pub fn read_stream<R: Read>(stream: R) -> Result<Element, FatalError> {
    let parser = xml::reader::ParserConfig::new()
        .cdata_to_characters(true)
        .create_reader(stream);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    for event in parser.into_iter() {
        match event? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                let mut element = Element::new(&name.local_name);
                element.attributes = attributes
                    .into_iter()
                    .map(|a| Attribute {
                        name: a.name.local_name,
                        value: a.value,
                    })
                    .collect();
                stack.push(element);
            }
            XmlEvent::EndElement { .. } => {
                let element = match stack.pop() {
                    Some(e) => e,
                    None => {
                        return Err(FatalError::SchemaViolation {
                            xpath: String::new(),
                            desc: String::from("unbalanced end element"),
                        })
                    }
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => root = Some(element),
                }
            }
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text));
                }
            }
            _ => {}
        }
    }

    match root {
        Some(root) if root.name == "registry" => Ok(root),
        _ => Err(FatalError::MissingRegistryElement),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_read_preserves_text() {
        let xml = r#"<registry><commands><command><param>const <type>VkFoo</type>* <name>pFoo</name></param></command></commands></registry>"#;
        let root = read_stream(xml.as_bytes()).unwrap();
        let params = root.descendants("param");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].text(), "const VkFoo* pFoo");
        assert_eq!(params[0].child_text("type").as_deref(), Some("VkFoo"));
    }

    #[test]
    fn test_missing_registry() {
        match read_stream("<types/>".as_bytes()) {
            Err(FatalError::MissingRegistryElement) => (),
            other => panic!("{:?}", other),
        }
    }
}
