/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use tracing::trace;

use crate::ElementBuilder;
use crate::SaxParser;

use super::Unmarshaller;
use super::error::StreamCondition;
use super::error::StreamError;
use super::error::description;

/// Builds the object for one complete stream child.
///
/// The unit bytes alone might use prefixes declared only on the stream
/// header, so they are parsed after the captured header bytes.
pub fn materialize<U: Unmarshaller>(
    header: &[u8],
    unit: &[u8],
    unmarshaller: &U,
) -> Result<U::Output, StreamError> {
    let mut parser = SaxParser::new();
    let mut builder = ElementBuilder::stream_child();
    parser.parse_bytes(&mut builder, header)?;
    parser.parse_bytes(&mut builder, unit)?;
    let element = builder
        .take()
        .ok_or_else(|| StreamError::new(StreamCondition::Internal, description::NO_UNIT_ELEMENT))?;
    trace!(name = element.name(), bytes = unit.len(), "unit materialized");
    Ok(unmarshaller.unmarshal(element)?)
}
