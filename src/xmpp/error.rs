/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::borrow::Cow;
use std::fmt::Display;

use thiserror::Error;

use crate::ElementError;
use crate::SaxError;

/// Why a stream cannot continue.
///
/// Each condition maps to the stream error that should be sent to the
/// peer before closing the stream.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub enum StreamCondition {
    InvalidNamespace,
    InvalidRootElement,
    UnsupportedVersion,
    RestrictedXml,
    NotWellFormed,
    Internal,
}

impl StreamCondition {
    /// Stream error condition element name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamCondition::InvalidNamespace => "invalid-namespace",
            StreamCondition::InvalidRootElement => "bad-format",
            StreamCondition::UnsupportedVersion => "unsupported-version",
            StreamCondition::RestrictedXml => "restricted-xml",
            StreamCondition::NotWellFormed => "not-well-formed",
            StreamCondition::Internal => "internal-server-error",
        }
    }
}

impl Display for StreamCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal stream decoding error.
#[derive(Debug, Eq, PartialEq, Clone, Error)]
#[error("{condition}: {detail}")]
pub struct StreamError {
    condition: StreamCondition,
    detail: Cow<'static, str>,
}

impl StreamError {
    pub fn new(condition: StreamCondition, detail: impl Into<Cow<'static, str>>) -> Self {
        StreamError {
            condition,
            detail: detail.into(),
        }
    }

    pub fn condition(&self) -> StreamCondition {
        self.condition
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<SaxError> for StreamError {
    fn from(err: SaxError) -> Self {
        match err {
            SaxError::NoMemory => StreamError::new(StreamCondition::Internal, "not enough memory"),
            SaxError::BadXml(msg) => StreamError::new(StreamCondition::NotWellFormed, msg),
            SaxError::HandlerAbort => {
                StreamError::new(StreamCondition::Internal, description::UNEXPECTED_ABORT)
            }
        }
    }
}

impl From<ElementError> for StreamError {
    fn from(err: ElementError) -> Self {
        match err {
            ElementError::NoMemory => {
                StreamError::new(StreamCondition::Internal, "not enough memory")
            }
            ElementError::BadXml(msg) => StreamError::new(StreamCondition::NotWellFormed, msg),
        }
    }
}

/// Failure of an [Unmarshaller](super::Unmarshaller) to convert an element.
#[derive(Debug, Eq, PartialEq, Clone, Error)]
#[error("cannot unmarshal element: {0}")]
pub struct UnmarshalError(pub String);

impl From<UnmarshalError> for StreamError {
    fn from(err: UnmarshalError) -> Self {
        StreamError::new(StreamCondition::Internal, err.to_string())
    }
}

pub(super) mod description {
    pub(in super::super) const UNEXPECTED_ABORT: &str = "unexpected handler abort";
    pub(in super::super) const NO_UNIT_ELEMENT: &str = "unit has no element";
    pub(in super::super) const STREAM_NAMESPACE: &str =
        "stream header is not in the stream namespace";
    pub(in super::super) const CONTENT_NAMESPACE: &str =
        "stream header has an unexpected default namespace";
    pub(in super::super) const STREAM_NAME: &str = "stream header has an unexpected name";
    pub(in super::super) const STREAM_VERSION: &str = "stream version is not supported";
    pub(in super::super) const DUPLICATE_ATTRIBUTE: &str =
        "stream header has a duplicate attribute";
    pub(in super::super) const STREAM_END_MISMATCH: &str =
        "stream is closed with a different tag name";
    pub(in super::super) const COMMENT: &str = "comments are not allowed in streams";
    pub(in super::super) const PROCESSING_INSTRUCTION: &str =
        "processing instructions are not allowed in streams";
    pub(in super::super) const DOCTYPE: &str = "document type declarations are not allowed in streams";
    pub(in super::super) const ENTITY_REFERENCE: &str =
        "entity references are not allowed in streams";
}
