/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod builder;
mod error;
mod parser;

use std::str::FromStr;

use crate::entities::escape;
use crate::entities::escape_fmt;
use crate::entities::escaped_size;
use crate::namespace::split_name;

pub use builder::ElementBuilder;
pub use error::ElementError;
pub use parser::ElementParser;

/// A child of an [Element].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Element(_) => None,
            Node::Text(text) => Some(text),
        }
    }
}

/// An owned XML element.
///
/// Name is kept qualified as it was written, and the namespace is the URI the
/// prefix (or the default namespace) resolved to. Attributes are kept in the
/// document order, including the namespace declarations.
///
/// ```
/// use iksstream::Element;
///
/// let mut msg = Element::with_namespace("message", "jabber:client");
/// msg.set_attribute("to", "juliet@example.com");
/// let mut body = Element::new("body");
/// body.push_text("Art thou not Romeo?");
/// msg.push_child(body);
///
/// assert_eq!(
///     msg.to_string(),
///     "<message xmlns=\"jabber:client\" to=\"juliet@example.com\">\
///      <body>Art thou not Romeo?</body></message>"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Element {
        Element {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates an element in the given namespace and declares it on the element.
    pub fn with_namespace(name: impl Into<String>, namespace: impl Into<String>) -> Element {
        let mut element = Element::new(name);
        let namespace = namespace.into();
        let declaration = match element.prefix() {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        element.attributes.push((declaration, namespace.clone()));
        element.namespace = Some(namespace);
        element
    }

    pub(crate) fn from_parts(
        name: String,
        namespace: Option<String>,
        attributes: Vec<(String, String)>,
    ) -> Element {
        Element {
            name,
            namespace,
            attributes,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn prefix(&self) -> Option<&str> {
        split_name(&self.name).0
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Checks the local name and the namespace together.
    pub fn is(&self, local_name: &str, namespace: &str) -> bool {
        self.local_name() == local_name && self.namespace() == Some(namespace)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Sets an attribute, replacing the value if the name is already used.
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Element {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(attr, _)| *attr == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn find_child(&self, local_name: &str, namespace: &str) -> Option<&Element> {
        self.child_elements()
            .find(|child| child.is(local_name, namespace))
    }

    pub fn push_child(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        self
    }

    /// Appends character data, merging it with a directly preceding text node.
    pub fn push_text(&mut self, text: &str) -> &mut Element {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
        self
    }

    /// Concatenated character data of the direct children.
    pub fn text(&self) -> String {
        self.children.iter().filter_map(Node::as_text).collect()
    }

    /// Exact length of the serialized form.
    pub fn str_size(&self) -> usize {
        let mut size = 1 + self.name.len();
        for (name, value) in &self.attributes {
            // space, =" and " characters
            size += name.len() + escaped_size(value) + 4;
        }
        if self.children.is_empty() {
            return size + 2;
        }
        size += 1;
        for child in &self.children {
            size += match child {
                Node::Element(element) => element.str_size(),
                Node::Text(text) => escaped_size(text),
            };
        }
        size + 3 + self.name.len()
    }

    fn serialize_into(&self, buf: &mut String) {
        buf.push('<');
        buf.push_str(&self.name);
        for (name, value) in &self.attributes {
            buf.push(' ');
            buf.push_str(name);
            buf.push_str("=\"");
            escape(value, buf);
            buf.push('"');
        }
        if self.children.is_empty() {
            buf.push_str("/>");
            return;
        }
        buf.push('>');
        for child in &self.children {
            match child {
                Node::Element(element) => element.serialize_into(buf),
                Node::Text(text) => escape(text, buf),
            }
        }
        buf.push_str("</");
        buf.push_str(&self.name);
        buf.push('>');
    }

    #[allow(
        clippy::inherent_to_string_shadow_display,
        reason = "prereserving exact capacity makes this function significantly faster"
    )]
    pub fn to_string(&self) -> String {
        let mut buf = String::with_capacity(self.str_size());
        self.serialize_into(&mut buf);
        buf
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<")?;
        f.write_str(&self.name)?;
        for (name, value) in &self.attributes {
            f.write_str(" ")?;
            f.write_str(name)?;
            f.write_str("=\"")?;
            escape_fmt(value, f)?;
            f.write_str("\"")?;
        }
        if self.children.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        for child in &self.children {
            match child {
                Node::Element(element) => std::fmt::Display::fmt(element, f)?,
                Node::Text(text) => escape_fmt(text, f)?,
            }
        }
        f.write_str("</")?;
        f.write_str(&self.name)?;
        f.write_str(">")
    }
}

impl FromStr for Element {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = ElementParser::new();
        parser.parse_bytes(s.as_bytes())?;
        parser.into_element()
    }
}

#[cfg(test)]
mod tests;
