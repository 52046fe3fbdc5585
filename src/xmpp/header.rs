/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fmt::Display;

use crate::entities::escape_fmt;

use super::constants::CLIENT_NS;
use super::constants::STREAM_NS;
use super::constants::STREAM_VERSION;

const XML_DECLARATION: &str = "<?xml version='1.0'?>";

const CLOSING_TAG: &str = "</stream:stream>";

/// Attributes of a stream opening tag.
///
/// Decoded headers carry what the peer sent. The same type can be
/// serialized to open an outgoing stream.
///
/// ```
/// use iksstream::xmpp::StreamHeader;
///
/// let header = StreamHeader::client("example.com");
/// assert_eq!(
///     header.to_string(),
///     "<stream:stream to=\"example.com\" version=\"1.0\" xmlns=\"jabber:client\" \
///      xmlns:stream=\"http://etherx.jabber.org/streams\">"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamHeader {
    pub from: Option<String>,
    pub to: Option<String>,
    pub id: Option<String>,
    pub lang: Option<String>,
    pub version: Option<String>,
    /// The default namespace declared on the header.
    pub content_namespace: Option<String>,
    /// Prefixed namespace declarations other than the stream namespace, in
    /// document order.
    pub additional_namespaces: Vec<(String, String)>,
}

impl StreamHeader {
    /// Header for a client to server stream.
    pub fn client(to: impl Into<String>) -> Self {
        StreamHeader {
            to: Some(to.into()),
            version: Some(STREAM_VERSION.to_string()),
            content_namespace: Some(CLIENT_NS.to_string()),
            ..Self::default()
        }
    }

    /// Serialized opening tag, prefixed with the XML declaration.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{XML_DECLARATION}{self}").into_bytes()
    }

    pub fn closing_tag() -> &'static str {
        CLOSING_TAG
    }
}

fn write_attribute(
    f: &mut std::fmt::Formatter<'_>,
    name: &str,
    value: Option<&str>,
) -> std::fmt::Result {
    if let Some(value) = value {
        f.write_str(" ")?;
        f.write_str(name)?;
        f.write_str("=\"")?;
        escape_fmt(value, f)?;
        f.write_str("\"")?;
    }
    Ok(())
}

impl Display for StreamHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<stream:stream")?;
        write_attribute(f, "from", self.from.as_deref())?;
        write_attribute(f, "to", self.to.as_deref())?;
        write_attribute(f, "id", self.id.as_deref())?;
        write_attribute(f, "xml:lang", self.lang.as_deref())?;
        write_attribute(f, "version", self.version.as_deref())?;
        write_attribute(f, "xmlns", self.content_namespace.as_deref())?;
        write_attribute(f, "xmlns:stream", Some(STREAM_NS))?;
        for (prefix, uri) in &self.additional_namespaces {
            write_attribute(f, &format!("xmlns:{prefix}"), Some(uri.as_str()))?;
        }
        f.write_str(">")
    }
}
