/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::Location;
use crate::SaxElement;
use crate::SaxError;
use crate::SaxHandler;
use crate::namespace::NamespaceScopes;
use crate::namespace::declared_prefix;
use crate::namespace::split_name;

use super::Element;
use super::error::ElementError;
use super::error::description;

#[derive(Debug, Default)]
struct PendingTag {
    name: String,
    attributes: Vec<(String, String)>,
}

/// Builds an [Element] tree from the tokenizer events.
///
/// A builder created with [stream_child()](ElementBuilder::stream_child)
/// treats the first start tag as a context only root. Its namespace
/// declarations stay in scope, but it is not built, and the result is the
/// first child element of it.
#[derive(Debug, Default)]
pub struct ElementBuilder {
    stream_child: bool,
    context_open: bool,
    scopes: NamespaceScopes,
    pending: Option<PendingTag>,
    stack: Vec<Element>,
    result: Option<Element>,
}

impl ElementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stream_child() -> Self {
        ElementBuilder {
            stream_child: true,
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    pub fn take(&mut self) -> Option<Element> {
        self.result.take()
    }

    fn start_tag(&mut self, name: &str) -> Result<(), ElementError> {
        if self.result.is_some() {
            return Err(ElementError::BadXml(description::CONTENT_AFTER_ELEMENT));
        }
        self.pending = Some(PendingTag {
            name: name.to_string(),
            attributes: Vec::new(),
        });
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<(), ElementError> {
        if let Some(tag) = self.pending.as_mut() {
            if tag.attributes.iter().any(|(attr, _)| attr == name) {
                return Err(ElementError::BadXml(description::DUPLICATE_ATTRIBUTE));
            }
            tag.attributes.push((name.to_string(), value.to_string()));
        }
        Ok(())
    }

    fn start_complete(&mut self, empty: bool) -> Result<(), ElementError> {
        let Some(tag) = self.pending.take() else {
            return Ok(());
        };
        self.scopes.push(
            tag.attributes
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );

        if self.stream_child && !self.context_open && self.stack.is_empty() {
            self.context_open = true;
            if empty {
                self.scopes.pop();
                self.context_open = false;
            }
            return Ok(());
        }

        let (prefix, _) = split_name(&tag.name);
        let namespace = self.scopes.resolve(prefix).map(str::to_string);
        if prefix.is_some() && namespace.is_none() {
            return Err(ElementError::BadXml(description::UNBOUND_PREFIX));
        }
        for (name, _) in &tag.attributes {
            if declared_prefix(name).is_some() {
                continue;
            }
            if let (Some(prefix), _) = split_name(name)
                && self.scopes.resolve(Some(prefix)).is_none()
            {
                return Err(ElementError::BadXml(description::UNBOUND_PREFIX));
            }
        }

        self.stack
            .push(Element::from_parts(tag.name, namespace, tag.attributes));
        if empty {
            self.close_element();
        }
        Ok(())
    }

    fn end_tag(&mut self, name: &str) -> Result<(), ElementError> {
        match self.stack.last() {
            Some(element) => {
                if element.name() != name {
                    return Err(ElementError::BadXml(description::TAG_MISMATCH));
                }
                self.close_element();
            }
            None => {
                // Closing the context root of a stream child
                self.scopes.pop();
                self.context_open = false;
            }
        }
        Ok(())
    }

    fn close_element(&mut self) {
        self.scopes.pop();
        if let Some(element) = self.stack.pop() {
            match self.stack.last_mut() {
                Some(parent) => {
                    parent.push_child(element);
                }
                None => self.result = Some(element),
            }
        }
    }

    fn cdata(&mut self, text: &str) {
        if let Some(parent) = self.stack.last_mut() {
            parent.push_text(text);
        }
    }

    pub fn append_element(&mut self, element: &SaxElement) -> Result<(), ElementError> {
        match element {
            SaxElement::StartTag(name) => self.start_tag(name)?,
            SaxElement::Attribute(name, value) => self.attribute(name, value)?,
            SaxElement::StartTagContent => self.start_complete(false)?,
            SaxElement::StartTagEmpty => self.start_complete(true)?,
            SaxElement::EndTag(name) => self.end_tag(name)?,
            SaxElement::CData(text) => self.cdata(text),
            SaxElement::Comment
            | SaxElement::ProcessingInstruction(_)
            | SaxElement::Doctype
            | SaxElement::EntityReference(_) => {}
        }
        Ok(())
    }
}

impl SaxHandler for ElementBuilder {
    fn handle_element(&mut self, element: &SaxElement, _location: Location) -> Result<(), SaxError> {
        Ok(self.append_element(element)?)
    }
}
