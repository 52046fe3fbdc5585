/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::Element;

use super::error::UnmarshalError;

/// Converts a decoded stream child into an application object.
///
/// Any `Fn(Element) -> Result<T, UnmarshalError>` closure is an
/// unmarshaller too:
///
/// ```
/// use iksstream::xmpp::{StreamDecoder, UnmarshalError};
/// use iksstream::Element;
///
/// let decoder = StreamDecoder::new(|element: Element| {
///     element
///         .attribute("id")
///         .map(str::to_string)
///         .ok_or_else(|| UnmarshalError("no id".into()))
/// });
/// # let _ = decoder;
/// ```
pub trait Unmarshaller {
    type Output;

    fn unmarshal(&self, element: Element) -> Result<Self::Output, UnmarshalError>;
}

/// Passes the elements through as they are.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElementUnmarshaller;

impl Unmarshaller for ElementUnmarshaller {
    type Output = Element;

    fn unmarshal(&self, element: Element) -> Result<Element, UnmarshalError> {
        Ok(element)
    }
}

impl<T, F> Unmarshaller for F
where
    F: Fn(Element) -> Result<T, UnmarshalError>,
{
    type Output = T;

    fn unmarshal(&self, element: Element) -> Result<T, UnmarshalError> {
        self(element)
    }
}
