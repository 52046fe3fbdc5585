/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use tracing::debug;

use crate::Location;
use crate::SaxElement;
use crate::SaxError;
use crate::SaxHandler;
use crate::namespace::declared_prefix;
use crate::namespace::split_name;

use super::StreamConfig;
use super::StreamHeader;
use super::error::StreamCondition;
use super::error::StreamError;
use super::error::description;

/// A point in the stream where something completed.
///
/// Offsets are absolute tokenizer offsets just past the completing byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    Header { header: StreamHeader, end: usize },
    Unit { end: usize },
    Close { end: usize },
}

/// Follows the element depth and records stream boundaries.
pub struct BoundaryTracker {
    config: StreamConfig,
    depth: usize,
    header_name: String,
    header_attributes: Vec<(String, String)>,
    boundaries: Vec<Boundary>,
    error: Option<StreamError>,
}

impl BoundaryTracker {
    pub fn new(config: StreamConfig) -> Self {
        BoundaryTracker {
            config,
            depth: 0,
            header_name: String::new(),
            header_attributes: Vec::new(),
            boundaries: Vec::new(),
            error: None,
        }
    }

    pub fn reset(&mut self) {
        self.depth = 0;
        self.header_name.clear();
        self.header_attributes.clear();
        self.boundaries.clear();
        self.error = None;
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Boundaries found since the last call, in stream order.
    pub fn take_boundaries(&mut self) -> Vec<Boundary> {
        std::mem::take(&mut self.boundaries)
    }

    /// The error which made the tracker abort the tokenizer.
    pub fn take_error(&mut self) -> Option<StreamError> {
        self.error.take()
    }

    fn abort(&mut self, error: StreamError) -> Result<(), SaxError> {
        self.error = Some(error);
        Err(SaxError::HandlerAbort)
    }

    fn restricted(&mut self, detail: &'static str) -> Result<(), SaxError> {
        self.abort(StreamError::new(StreamCondition::RestrictedXml, detail))
    }

    fn header_attribute(&self, name: &str) -> Option<String> {
        self.header_attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.clone())
    }

    fn build_header(&self) -> Result<StreamHeader, StreamError> {
        let (prefix, local_name) = split_name(&self.header_name);

        let mut namespace = None;
        let mut content_namespace = None;
        let mut additional_namespaces = Vec::new();
        for (name, value) in &self.header_attributes {
            match declared_prefix(name) {
                Some(None) => {
                    if prefix.is_none() {
                        namespace = Some(value.as_str());
                    } else {
                        content_namespace = Some(value.clone());
                    }
                }
                Some(Some(declared)) => {
                    if Some(declared) == prefix {
                        namespace = Some(value.as_str());
                    } else {
                        additional_namespaces.push((declared.to_string(), value.clone()));
                    }
                }
                None => (),
            }
        }

        if namespace != Some(self.config.get_stream_namespace()) {
            return Err(StreamError::new(
                StreamCondition::InvalidNamespace,
                description::STREAM_NAMESPACE,
            ));
        }
        if local_name != self.config.get_stream_name() {
            return Err(StreamError::new(
                StreamCondition::InvalidRootElement,
                description::STREAM_NAME,
            ));
        }
        if let Some(expected) = self.config.get_content_namespace()
            && content_namespace.as_deref() != Some(expected)
        {
            return Err(StreamError::new(
                StreamCondition::InvalidNamespace,
                description::CONTENT_NAMESPACE,
            ));
        }
        let version = self.header_attribute("version");
        if version.as_deref() != Some(self.config.get_version()) {
            return Err(StreamError::new(
                StreamCondition::UnsupportedVersion,
                description::STREAM_VERSION,
            ));
        }

        Ok(StreamHeader {
            from: self.header_attribute("from"),
            to: self.header_attribute("to"),
            id: self.header_attribute("id"),
            lang: self.header_attribute("xml:lang"),
            version,
            content_namespace,
            additional_namespaces,
        })
    }

    fn header_complete(&mut self, end: usize) -> Result<(), SaxError> {
        match self.build_header() {
            Ok(header) => {
                debug!(
                    from = ?header.from,
                    to = ?header.to,
                    id = ?header.id,
                    end,
                    "stream header received"
                );
                self.boundaries.push(Boundary::Header { header, end });
                Ok(())
            }
            Err(err) => self.abort(err),
        }
    }

    fn element_end(&mut self, end: usize) {
        match self.depth {
            1 => self.boundaries.push(Boundary::Close { end }),
            2 => self.boundaries.push(Boundary::Unit { end }),
            _ => (),
        }
        self.depth = self.depth.saturating_sub(1);
    }
}

impl SaxHandler for BoundaryTracker {
    fn handle_element(&mut self, element: &SaxElement, location: Location) -> Result<(), SaxError> {
        match element {
            SaxElement::StartTag(name) => {
                self.depth += 1;
                if self.depth == 1 {
                    self.header_name.clear();
                    self.header_name.push_str(name);
                    self.header_attributes.clear();
                }
            }
            SaxElement::Attribute(name, value) => {
                if self.depth == 1 {
                    if self.header_attributes.iter().any(|(attr, _)| attr == name) {
                        return self.abort(StreamError::new(
                            StreamCondition::NotWellFormed,
                            description::DUPLICATE_ATTRIBUTE,
                        ));
                    }
                    self.header_attributes
                        .push((name.to_string(), value.to_string()));
                }
            }
            SaxElement::StartTagContent => {
                if self.depth == 1 {
                    self.header_complete(location.bytes)?;
                }
            }
            SaxElement::StartTagEmpty => {
                if self.depth == 1 {
                    self.header_complete(location.bytes)?;
                }
                self.element_end(location.bytes);
            }
            SaxElement::EndTag(name) => {
                if self.depth == 1 && *name != self.header_name {
                    return self.abort(StreamError::new(
                        StreamCondition::NotWellFormed,
                        description::STREAM_END_MISMATCH,
                    ));
                }
                self.element_end(location.bytes);
            }
            SaxElement::CData(_) => (),
            SaxElement::Comment => self.restricted(description::COMMENT)?,
            SaxElement::ProcessingInstruction(_) => {
                self.restricted(description::PROCESSING_INSTRUCTION)?
            }
            SaxElement::Doctype => self.restricted(description::DOCTYPE)?,
            SaxElement::EntityReference(_) => self.restricted(description::ENTITY_REFERENCE)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SaxParser;

    const HEADER: &str = "<stream:stream xmlns:stream='http://etherx.jabber.org/streams' \
                          xmlns='jabber:client' version='1.0'>";

    fn track(xml: &str) -> (Result<(), SaxError>, BoundaryTracker) {
        let mut tracker = BoundaryTracker::new(StreamConfig::default());
        let mut parser = SaxParser::new();
        let result = parser.parse_bytes(&mut tracker, xml.as_bytes());
        (result, tracker)
    }

    #[test]
    fn offsets() {
        let xml = format!("{HEADER}<a><b/></a> <c/></stream:stream>");
        let (result, mut tracker) = track(&xml);
        assert!(result.is_ok());
        let h = HEADER.len();
        let boundaries = tracker.take_boundaries();
        assert_eq!(boundaries.len(), 4);
        assert!(matches!(boundaries[0], Boundary::Header { end, .. } if end == h));
        assert_eq!(boundaries[1], Boundary::Unit { end: h + 11 });
        assert_eq!(boundaries[2], Boundary::Unit { end: h + 16 });
        assert_eq!(boundaries[3], Boundary::Close { end: xml.len() });
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn empty_root() {
        let xml = "<stream:stream xmlns:stream='http://etherx.jabber.org/streams' version='1.0'/>";
        let (result, mut tracker) = track(xml);
        assert!(result.is_ok());
        let boundaries = tracker.take_boundaries();
        assert!(matches!(boundaries[0], Boundary::Header { .. }));
        assert_eq!(boundaries[1], Boundary::Close { end: xml.len() });
    }

    #[test]
    fn header_fields() {
        let xml = "<?xml version='1.0'?><stream:stream from='im.example.com' to='juliet@im.example.com' \
                   id='++TR84Sm6A3hnt3Q065SnAbbk3Y=' xml:lang='en' version='1.0' \
                   xmlns='jabber:client' xmlns:stream='http://etherx.jabber.org/streams' \
                   xmlns:db='jabber:server:dialback'>";
        let (result, mut tracker) = track(xml);
        assert!(result.is_ok());
        let Some(Boundary::Header { header, end }) = tracker.take_boundaries().pop() else {
            panic!("no header");
        };
        assert_eq!(end, xml.len());
        assert_eq!(header.from.as_deref(), Some("im.example.com"));
        assert_eq!(header.to.as_deref(), Some("juliet@im.example.com"));
        assert_eq!(header.id.as_deref(), Some("++TR84Sm6A3hnt3Q065SnAbbk3Y="));
        assert_eq!(header.lang.as_deref(), Some("en"));
        assert_eq!(header.version.as_deref(), Some("1.0"));
        assert_eq!(header.content_namespace.as_deref(), Some("jabber:client"));
        assert_eq!(
            header.additional_namespaces,
            vec![("db".to_string(), "jabber:server:dialback".to_string())]
        );
    }

    #[test]
    fn restricted() {
        for xml in [
            format!("{HEADER}<!-- hi -->"),
            format!("{HEADER}<a><?php x?></a>"),
            format!("<!DOCTYPE stream>{HEADER}"),
        ] {
            let (result, mut tracker) = track(&xml);
            assert_eq!(result, Err(SaxError::HandlerAbort));
            let err = tracker.take_error().unwrap();
            assert_eq!(err.condition(), StreamCondition::RestrictedXml);
        }
    }
}
