/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use super::constants::STREAM_NAME;
use super::constants::STREAM_NS;
use super::constants::STREAM_VERSION;

/// What the stream decoder expects from the stream header.
///
/// ```
/// use iksstream::xmpp::StreamConfig;
///
/// let config = StreamConfig::default().content_namespace("jabber:client");
/// assert_eq!(config.get_stream_name(), "stream");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    stream_namespace: String,
    stream_name: String,
    version: String,
    content_namespace: Option<String>,
}

impl StreamConfig {
    pub fn stream_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.stream_namespace = namespace.into();
        self
    }

    pub fn stream_name(mut self, name: impl Into<String>) -> Self {
        self.stream_name = name.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Requires the default namespace of the header to be this one.
    pub fn content_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.content_namespace = Some(namespace.into());
        self
    }

    pub fn get_stream_namespace(&self) -> &str {
        &self.stream_namespace
    }

    pub fn get_stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn get_version(&self) -> &str {
        &self.version
    }

    pub fn get_content_namespace(&self) -> Option<&str> {
        self.content_namespace.as_deref()
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            stream_namespace: STREAM_NS.to_string(),
            stream_name: STREAM_NAME.to_string(),
            version: STREAM_VERSION.to_string(),
            content_namespace: None,
        }
    }
}

/// Stream Management options sent when enabling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmConfig {
    pub resume: bool,
    pub max_resumption_time: Option<u32>,
}

impl Default for SmConfig {
    fn default() -> Self {
        SmConfig {
            resume: true,
            max_resumption_time: None,
        }
    }
}
