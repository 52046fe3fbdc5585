/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Incremental XML processing for XMPP streams.
//!
//! The [SaxParser] tokenizes XML pushed to it in arbitrary chunks, the
//! [ElementParser] builds owned [Element] trees on top of it, and the
//! [xmpp] module turns a never ending XMPP stream into a sequence of
//! stream headers, stanzas and stream closes, together with the Stream
//! Management (XEP-0198) engine.

mod element;
mod entities;
mod namespace;
mod parser;

#[cfg(feature = "xmpp")]
pub mod xmpp;

pub use parser::Location;
pub use parser::SaxElement;
pub use parser::SaxError;
pub use parser::SaxHandler;
pub use parser::SaxParser;

pub use namespace::NamespaceScopes;
pub use namespace::XML_NS;
pub use namespace::split_name;

pub use element::Element;
pub use element::ElementBuilder;
pub use element::ElementError;
pub use element::ElementParser;
pub use element::Node;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
