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
use crate::SaxParser;

use super::Element;
use super::ElementBuilder;
use super::error::ElementError;
use super::error::description;

/// Parses a complete XML document into an [Element].
pub struct ElementParser {
    builder: ElementBuilder,
    parser: SaxParser,
}

impl ElementParser {
    pub fn new() -> ElementParser {
        ElementParser {
            builder: ElementBuilder::new(),
            parser: SaxParser::new(),
        }
    }

    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<(), ElementError> {
        Ok(self.parser.parse_bytes(&mut self.builder, bytes)?)
    }

    pub fn into_element(mut self) -> Result<Element, ElementError> {
        self.parser.parse_finish()?;
        self.builder
            .take()
            .ok_or(ElementError::BadXml(description::NO_ELEMENT))
    }

    pub fn location(&self) -> Location {
        self.parser.location()
    }
}

impl Default for ElementParser {
    fn default() -> Self {
        Self::new()
    }
}
