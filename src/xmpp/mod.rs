/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! XMPP stream decoding and Stream Management.

mod boundary;
mod config;
pub mod constants;
mod decoder;
mod error;
mod header;
mod materializer;
pub mod sm;
mod unmarshal;
mod window;

pub use boundary::Boundary;
pub use boundary::BoundaryTracker;
pub use config::SmConfig;
pub use config::StreamConfig;
pub use decoder::DecodedElement;
pub use decoder::StreamDecoder;
pub use error::StreamCondition;
pub use error::StreamError;
pub use error::UnmarshalError;
pub use header::StreamHeader;
pub use materializer::materialize;
pub use unmarshal::ElementUnmarshaller;
pub use unmarshal::Unmarshaller;
pub use window::ByteWindow;
