/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;
use tracing::trace;

use crate::Element;
use crate::xmpp::SmConfig;

use super::AckLedger;
use super::SequenceCounter;
use super::SmFrame;

/// Negotiation state of Stream Management.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmState {
    Inactive,
    Negotiating,
    Active,
}

/// The connection the Stream Management engine works for.
///
/// Calls are made after the engine released its lock, so an implementation
/// may call back into the engine.
pub trait SmConnection<S> {
    fn send_frame(&self, frame: SmFrame);

    /// The peer confirmed handling this stanza.
    fn stanza_acknowledged(&self, stanza: S);
}

impl<S, T: SmConnection<S>> SmConnection<S> for Arc<T> {
    fn send_frame(&self, frame: SmFrame) {
        (**self).send_frame(frame)
    }

    fn stanza_acknowledged(&self, stanza: S) {
        (**self).stanza_acknowledged(stanza)
    }
}

/// Completes with the outcome of a resumption attempt.
///
/// A resumption which is replaced by a newer attempt, reset, or dropped
/// together with the engine completes with `false`.
/// Stanzas acknowledged by the `resumed` or `failed` answer are reported
/// to the connection before the handle completes.
#[derive(Debug)]
pub struct ResumeHandle {
    receiver: oneshot::Receiver<bool>,
}

impl ResumeHandle {
    fn completed(outcome: bool) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(outcome);
        ResumeHandle { receiver }
    }

    /// Outcome if it is already known.
    pub fn try_outcome(&mut self) -> Option<bool> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(false),
        }
    }
}

impl Future for ResumeHandle {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(false))
    }
}

#[derive(Debug, Clone)]
struct Session {
    id: Option<String>,
    resume: bool,
}

enum Effect<S> {
    Send(SmFrame),
    Acknowledged(S),
    Resumed(oneshot::Sender<bool>, bool),
}

struct SmInner<S> {
    state: SmState,
    client_enabled: bool,
    session: Option<Session>,
    inbound: SequenceCounter,
    outbound: SequenceCounter,
    ledger: AckLedger<S>,
    pending_resume: Option<oneshot::Sender<bool>>,
}

impl<S> SmInner<S> {
    fn new() -> Self {
        SmInner {
            state: SmState::Inactive,
            client_enabled: false,
            session: None,
            inbound: SequenceCounter::default(),
            outbound: SequenceCounter::default(),
            ledger: AckLedger::new(),
            pending_resume: None,
        }
    }

    fn is_resumable(&self) -> bool {
        matches!(&self.session, Some(Session { id: Some(_), resume: true }))
    }

    fn complete_resume(&mut self, outcome: bool, effects: &mut Vec<Effect<S>>) {
        if let Some(sender) = self.pending_resume.take() {
            effects.push(Effect::Resumed(sender, outcome));
        }
    }

    fn reconcile(&mut self, h: u32, effects: &mut Vec<Effect<S>>) {
        let count = SequenceCounter::distance(self.outbound.value(), h);
        self.outbound.set(h);
        let released = self.ledger.release(count);
        debug!(
            h,
            released = released.len(),
            pending = self.ledger.len(),
            "acknowledgements reconciled"
        );
        effects.extend(released.into_iter().map(Effect::Acknowledged));
    }
}

/// XEP-0198 Stream Management engine.
///
/// Tracks the handled inbound stanzas and the unacknowledged outbound ones,
/// answers acknowledgement requests and drives session resumption.
pub struct StreamManager<S, C: SmConnection<S>> {
    connection: C,
    inner: Mutex<SmInner<S>>,
}

impl<S, C: SmConnection<S>> StreamManager<S, C> {
    pub fn new(connection: C) -> Self {
        StreamManager {
            connection,
            inner: Mutex::new(SmInner::new()),
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    fn run(&self, effects: Vec<Effect<S>>) {
        for effect in effects {
            match effect {
                Effect::Send(frame) => {
                    trace!(frame = frame.name(), "sending stream management frame");
                    self.connection.send_frame(frame);
                }
                Effect::Acknowledged(stanza) => self.connection.stanza_acknowledged(stanza),
                Effect::Resumed(sender, outcome) => {
                    let _ = sender.send(outcome);
                    debug!(outcome, "resumption completed");
                }
            }
        }
    }

    /// Asks the peer to enable Stream Management for this stream.
    pub fn enable(&self, config: &SmConfig) {
        let mut effects = Vec::new();
        {
            let mut inner = self.inner.lock();
            inner.client_enabled = true;
            inner.ledger.clear();
            inner.outbound.set(0);
            inner.state = SmState::Negotiating;
            effects.push(Effect::Send(SmFrame::Enable {
                resume: config.resume,
                max: config.max_resumption_time,
            }));
        }
        self.run(effects);
    }

    /// Handles a decoded element, returns false if it is not a frame.
    ///
    /// Elements which are not recognizable frames are ignored.
    pub fn process_element(&self, element: &Element) -> bool {
        match SmFrame::from_element(element) {
            Some(frame) => {
                self.process_frame(frame);
                true
            }
            None => false,
        }
    }

    pub fn process_frame(&self, frame: SmFrame) {
        debug!(frame = frame.name(), "stream management frame received");
        let mut effects = Vec::new();
        {
            let mut inner = self.inner.lock();
            match frame {
                SmFrame::Enable { .. } => {
                    inner.outbound.set(0);
                    inner.client_enabled = true;
                    inner.ledger.clear();
                    inner.state = SmState::Active;
                    effects.push(Effect::Send(SmFrame::Enabled {
                        id: None,
                        resume: false,
                        location: None,
                        max: None,
                    }));
                }
                SmFrame::Enabled { id, resume, .. } => {
                    inner.inbound.set(0);
                    inner.session = Some(Session { id, resume });
                    inner.state = SmState::Active;
                }
                SmFrame::Failed { h, condition } => {
                    debug!(?h, ?condition, "stream management failed");
                    if let Some(h) = h {
                        inner.reconcile(h, &mut effects);
                    }
                    inner.complete_resume(false, &mut effects);
                    inner.client_enabled = false;
                    inner.session = None;
                    inner.state = SmState::Inactive;
                }
                SmFrame::Request => {
                    let h = inner.inbound.value();
                    effects.push(Effect::Send(SmFrame::Answer { h }));
                }
                SmFrame::Answer { h } => inner.reconcile(h, &mut effects),
                SmFrame::Resumed { h, .. } => {
                    inner.reconcile(h, &mut effects);
                    inner.complete_resume(true, &mut effects);
                    inner.client_enabled = true;
                    inner.state = SmState::Active;
                }
                SmFrame::Resume { .. } => {
                    debug!("resumption requests are not served, ignoring");
                }
            }
        }
        self.run(effects);
    }

    /// Records an outbound stanza while Stream Management is enabled.
    pub fn mark_outbound_sent(&self, stanza: S) {
        let mut inner = self.inner.lock();
        if inner.client_enabled {
            inner.ledger.push(stanza);
        }
    }

    /// Counts one more handled inbound stanza and returns the new count.
    pub fn increment_inbound_handled(&self) -> u32 {
        self.inner.lock().inbound.increment()
    }

    /// Sends an acknowledgement request if Stream Management is enabled.
    pub fn request_ack(&self) {
        let enabled = self.inner.lock().client_enabled;
        if enabled {
            self.run(vec![Effect::Send(SmFrame::Request)]);
        }
    }

    /// Attempts to resume the previous session on a new stream.
    pub fn resume(&self) -> ResumeHandle {
        let mut effects = Vec::new();
        let handle = {
            let mut inner = self.inner.lock();
            let previd = match &inner.session {
                Some(Session {
                    id: Some(id),
                    resume: true,
                }) => id.clone(),
                _ => {
                    debug!("session is not resumable");
                    return ResumeHandle::completed(false);
                }
            };
            let (sender, receiver) = oneshot::channel();
            if let Some(previous) = inner.pending_resume.replace(sender) {
                let _ = previous.send(false);
            }
            inner.state = SmState::Negotiating;
            effects.push(Effect::Send(SmFrame::Resume {
                previd,
                h: inner.inbound.value(),
            }));
            ResumeHandle { receiver }
        };
        self.run(effects);
        handle
    }

    /// Forgets the session, e.g. when the stream is closed.
    pub fn reset(&self) {
        let mut effects = Vec::new();
        {
            let mut inner = self.inner.lock();
            inner.complete_resume(false, &mut effects);
            *inner = SmInner::new();
        }
        debug!("stream management reset");
        self.run(effects);
    }

    pub fn state(&self) -> SmState {
        self.inner.lock().state
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock().client_enabled
    }

    pub fn is_resumable(&self) -> bool {
        self.inner.lock().is_resumable()
    }

    pub fn session_id(&self) -> Option<String> {
        self.inner
            .lock()
            .session
            .as_ref()
            .and_then(|session| session.id.clone())
    }

    pub fn inbound_handled(&self) -> u32 {
        self.inner.lock().inbound.value()
    }

    pub fn outbound_acknowledged(&self) -> u32 {
        self.inner.lock().outbound.value()
    }

    pub fn unacknowledged_count(&self) -> usize {
        self.inner.lock().ledger.len()
    }

    /// Removes the unacknowledged stanzas, oldest first, for sending them
    /// again on a new session.
    pub fn take_unacknowledged(&self) -> Vec<S> {
        self.inner.lock().ledger.drain_all()
    }

    #[cfg(test)]
    pub(super) fn set_inbound_handled(&self, h: u32) {
        self.inner.lock().inbound.set(h);
    }
}

impl<S: Clone, C: SmConnection<S>> StreamManager<S, C> {
    /// Stanzas sent but not acknowledged yet, oldest first.
    pub fn unacknowledged(&self) -> Vec<S> {
        self.inner.lock().ledger.iter().cloned().collect()
    }
}
