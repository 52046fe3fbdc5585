/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use parking_lot::Mutex;
use tracing::debug;
use tracing::trace;

use crate::SaxError;
use crate::SaxParser;

use super::StreamConfig;
use super::StreamHeader;
use super::Unmarshaller;
use super::boundary::Boundary;
use super::boundary::BoundaryTracker;
use super::error::StreamError;
use super::materializer::materialize;
use super::window::ByteWindow;

/// One unit decoded from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedElement<T> {
    StreamOpen(StreamHeader),
    StreamClose,
    Element(T),
}

struct DecoderState {
    parser: SaxParser,
    tracker: BoundaryTracker,
    window: ByteWindow,
    failure: Option<StreamError>,
}

/// Incremental XMPP stream decoder.
///
/// Bytes can be passed in any fragmentation, the decoder produces a unit
/// whenever the stream header or a top level child element completes.
///
/// ```
/// use iksstream::xmpp::{DecodedElement, ElementUnmarshaller, StreamDecoder};
///
/// let decoder = StreamDecoder::new(ElementUnmarshaller);
/// let mut units = Vec::new();
/// decoder.decode(b"<stream:stream xmlns:stream='http://etherx.jabber.org/streams' \
///                  xmlns='jabber:client' version='1.0'><message id='1'", &mut units)?;
/// decoder.decode(b"/>", &mut units)?;
///
/// assert!(matches!(units[0], DecodedElement::StreamOpen(_)));
/// match &units[1] {
///     DecodedElement::Element(message) => assert_eq!(message.attribute("id"), Some("1")),
///     _ => unreachable!(),
/// }
/// # Ok::<(), iksstream::xmpp::StreamError>(())
/// ```
pub struct StreamDecoder<U: Unmarshaller> {
    unmarshaller: U,
    state: Mutex<DecoderState>,
}

impl<U: Unmarshaller> StreamDecoder<U> {
    pub fn new(unmarshaller: U) -> Self {
        Self::with_config(StreamConfig::default(), unmarshaller)
    }

    pub fn with_config(config: StreamConfig, unmarshaller: U) -> Self {
        StreamDecoder {
            unmarshaller,
            state: Mutex::new(DecoderState {
                parser: SaxParser::new(),
                tracker: BoundaryTracker::new(config),
                window: ByteWindow::new(),
                failure: None,
            }),
        }
    }

    /// Decodes the next chunk of the stream.
    ///
    /// Units completed by this chunk are appended to `out` in stream order.
    /// On error nothing is appended and the stream cannot continue, later
    /// calls fail with the same error until [restart](Self::restart).
    pub fn decode(
        &self,
        bytes: &[u8],
        out: &mut Vec<DecodedElement<U::Output>>,
    ) -> Result<(), StreamError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(err) = &state.failure {
            return Err(err.clone());
        }
        match Self::decode_units(state, &self.unmarshaller, bytes) {
            Ok(mut decoded) => {
                out.append(&mut decoded);
                Ok(())
            }
            Err(err) => {
                debug!(
                    condition = %err.condition(),
                    detail = err.detail(),
                    "stream decoding failed"
                );
                state.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    fn decode_units(
        state: &mut DecoderState,
        unmarshaller: &U,
        bytes: &[u8],
    ) -> Result<Vec<DecodedElement<U::Output>>, StreamError> {
        state.window.append(bytes);
        let result = state
            .parser
            .parse_bytes(&mut state.tracker, state.window.unfed());
        state.window.mark_fed();
        if let Err(err) = result {
            state.tracker.take_boundaries();
            let err = match err {
                SaxError::HandlerAbort => state
                    .tracker
                    .take_error()
                    .unwrap_or_else(|| StreamError::from(err)),
                err => StreamError::from(err),
            };
            return Err(err);
        }

        let mut decoded = Vec::new();
        for boundary in state.tracker.take_boundaries() {
            match boundary {
                Boundary::Header { header, end } => {
                    let len = state.window.len_until(end);
                    state.window.capture_header(len);
                    debug!(bytes = len, "stream opened");
                    decoded.push(DecodedElement::StreamOpen(header));
                }
                Boundary::Unit { end } => {
                    let len = state.window.len_until(end);
                    let unit = state.window.take_front(len);
                    trace!(bytes = len, "stream unit completed");
                    let header = state.window.header().unwrap_or_default();
                    let object = materialize(header, &unit, unmarshaller)?;
                    decoded.push(DecodedElement::Element(object));
                }
                Boundary::Close { end } => {
                    let len = state.window.len_until(end);
                    state.window.discard_front(len);
                    debug!("stream closed");
                    decoded.push(DecodedElement::StreamClose);
                }
            }
        }
        Ok(decoded)
    }

    /// Starts over with a new stream on the same transport.
    ///
    /// Bytes received but not consumed by a unit are kept and parsed again
    /// as the beginning of the new stream.
    pub fn restart(&self) {
        let mut state = self.state.lock();
        state.parser.reset();
        state.tracker.reset();
        state.window.restart();
        state.failure = None;
        debug!(held = state.window.len(), "stream decoder restarted");
    }

    pub fn unmarshaller(&self) -> &U {
        &self.unmarshaller
    }
}
