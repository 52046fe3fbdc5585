/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use thiserror::Error;

use crate::SaxError;

#[derive(Debug, Eq, PartialEq, Copy, Clone, Error)]
pub enum ElementError {
    #[error("not enough memory")]
    NoMemory,

    #[error("invalid XML syntax: {0}")]
    BadXml(&'static str),
}

impl From<SaxError> for ElementError {
    fn from(err: SaxError) -> Self {
        match err {
            SaxError::NoMemory => ElementError::NoMemory,
            SaxError::BadXml(msg) => ElementError::BadXml(msg),
            SaxError::HandlerAbort => ElementError::BadXml(description::UNEXPECTED_HANDLER_ABORT),
        }
    }
}

impl From<ElementError> for SaxError {
    fn from(err: ElementError) -> Self {
        match err {
            ElementError::NoMemory => SaxError::NoMemory,
            ElementError::BadXml(msg) => SaxError::BadXml(msg),
        }
    }
}

pub(crate) mod description {
    pub(super) const UNEXPECTED_HANDLER_ABORT: &str = "unexpected handler abort";
    pub(crate) const NO_ELEMENT: &str = "no element parsed yet";
    pub(crate) const TAG_MISMATCH: &str = "start and end tags have different names";
    pub(crate) const DUPLICATE_ATTRIBUTE: &str = "attribute name already used in this tag";
    pub(crate) const UNBOUND_PREFIX: &str = "namespace prefix is not declared";
    pub(crate) const CONTENT_AFTER_ELEMENT: &str = "content after the completed element";
}
