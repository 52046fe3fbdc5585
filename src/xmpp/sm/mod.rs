/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Stream Management (XEP-0198).

mod counter;
mod frame;
mod ledger;
mod manager;

pub use counter::SequenceCounter;
pub use frame::FrameUnmarshaller;
pub use frame::Incoming;
pub use frame::SmFrame;
pub use ledger::AckLedger;
pub use manager::ResumeHandle;
pub use manager::SmConnection;
pub use manager::SmState;
pub use manager::StreamManager;

#[cfg(test)]
mod tests;
