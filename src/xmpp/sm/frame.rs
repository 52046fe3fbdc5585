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
use crate::xmpp::UnmarshalError;
use crate::xmpp::Unmarshaller;
use crate::xmpp::constants::SM_NS;
use crate::xmpp::constants::STANZAS_NS;

/// Stream Management wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmFrame {
    Enable {
        resume: bool,
        max: Option<u32>,
    },
    Enabled {
        id: Option<String>,
        resume: bool,
        location: Option<String>,
        max: Option<u32>,
    },
    Resume {
        previd: String,
        h: u32,
    },
    Resumed {
        previd: String,
        h: u32,
    },
    Failed {
        h: Option<u32>,
        condition: Option<String>,
    },
    Request,
    Answer {
        h: u32,
    },
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1"))
}

fn parse_u32(value: Option<&str>) -> Option<u32> {
    value.and_then(|value| value.parse().ok())
}

impl SmFrame {
    /// Element name of the frame.
    pub fn name(&self) -> &'static str {
        match self {
            SmFrame::Enable { .. } => "enable",
            SmFrame::Enabled { .. } => "enabled",
            SmFrame::Resume { .. } => "resume",
            SmFrame::Resumed { .. } => "resumed",
            SmFrame::Failed { .. } => "failed",
            SmFrame::Request => "r",
            SmFrame::Answer { .. } => "a",
        }
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::with_namespace(self.name(), SM_NS);
        match self {
            SmFrame::Enable { resume, max } => {
                if *resume {
                    element.set_attribute("resume", "true");
                }
                if let Some(max) = max {
                    element.set_attribute("max", max.to_string());
                }
            }
            SmFrame::Enabled {
                id,
                resume,
                location,
                max,
            } => {
                if let Some(id) = id {
                    element.set_attribute("id", id.as_str());
                }
                if *resume {
                    element.set_attribute("resume", "true");
                }
                if let Some(location) = location {
                    element.set_attribute("location", location.as_str());
                }
                if let Some(max) = max {
                    element.set_attribute("max", max.to_string());
                }
            }
            SmFrame::Resume { previd, h } | SmFrame::Resumed { previd, h } => {
                element
                    .set_attribute("h", h.to_string())
                    .set_attribute("previd", previd.as_str());
            }
            SmFrame::Failed { h, condition } => {
                if let Some(h) = h {
                    element.set_attribute("h", h.to_string());
                }
                if let Some(condition) = condition {
                    element.push_child(Element::with_namespace(condition.as_str(), STANZAS_NS));
                }
            }
            SmFrame::Request => (),
            SmFrame::Answer { h } => {
                element.set_attribute("h", h.to_string());
            }
        }
        element
    }

    /// Recognizes a Stream Management frame.
    ///
    /// Returns `None` for elements of other namespaces, unknown frame
    /// names, and frames missing a mandatory attribute.
    pub fn from_element(element: &Element) -> Option<SmFrame> {
        if element.namespace() != Some(SM_NS) {
            return None;
        }
        let h = parse_u32(element.attribute("h"));
        let frame = match element.local_name() {
            "enable" => SmFrame::Enable {
                resume: parse_bool(element.attribute("resume")),
                max: parse_u32(element.attribute("max")),
            },
            "enabled" => SmFrame::Enabled {
                id: element.attribute("id").map(str::to_string),
                resume: parse_bool(element.attribute("resume")),
                location: element.attribute("location").map(str::to_string),
                max: parse_u32(element.attribute("max")),
            },
            "resume" => SmFrame::Resume {
                previd: element.attribute("previd")?.to_string(),
                h: h?,
            },
            "resumed" => SmFrame::Resumed {
                previd: element.attribute("previd")?.to_string(),
                h: h?,
            },
            "failed" => SmFrame::Failed {
                h,
                condition: element
                    .child_elements()
                    .find(|child| child.namespace() == Some(STANZAS_NS))
                    .map(|child| child.local_name().to_string()),
            },
            "r" => SmFrame::Request,
            "a" => SmFrame::Answer { h: h? },
            _ => return None,
        };
        Some(frame)
    }
}

/// What the [FrameUnmarshaller] makes of a stream child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Frame(SmFrame),
    /// An element of the Stream Management namespace which is not a
    /// recognizable frame.
    Ignored(Element),
    Stanza(Element),
}

/// Separates Stream Management frames from the other stanzas.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameUnmarshaller;

impl Unmarshaller for FrameUnmarshaller {
    type Output = Incoming;

    fn unmarshal(&self, element: Element) -> Result<Incoming, UnmarshalError> {
        if let Some(frame) = SmFrame::from_element(&element) {
            return Ok(Incoming::Frame(frame));
        }
        if element.namespace() == Some(SM_NS) {
            Ok(Incoming::Ignored(element))
        } else {
            Ok(Incoming::Stanza(element))
        }
    }
}
