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

use crate::Element;
use crate::xmpp::SmConfig;
use crate::xmpp::Unmarshaller;
use crate::xmpp::constants::SM_NS;

use super::*;

#[derive(Default)]
struct Recorder {
    frames: Mutex<Vec<SmFrame>>,
    acknowledged: Mutex<Vec<&'static str>>,
}

impl SmConnection<&'static str> for Recorder {
    fn send_frame(&self, frame: SmFrame) {
        self.frames.lock().push(frame);
    }

    fn stanza_acknowledged(&self, stanza: &'static str) {
        self.acknowledged.lock().push(stanza);
    }
}

type Manager = StreamManager<&'static str, Recorder>;

fn manager() -> Manager {
    StreamManager::new(Recorder::default())
}

fn sent(manager: &Manager) -> Vec<SmFrame> {
    manager.connection().frames.lock().clone()
}

fn acknowledged(manager: &Manager) -> Vec<&'static str> {
    manager.connection().acknowledged.lock().clone()
}

fn enabled(manager: &Manager, id: &str) {
    manager.enable(&SmConfig::default());
    manager.process_frame(SmFrame::Enabled {
        id: Some(id.to_string()),
        resume: true,
        location: None,
        max: None,
    });
}

#[test]
fn negotiation() {
    let manager = manager();
    assert_eq!(manager.state(), SmState::Inactive);

    manager.enable(&SmConfig {
        resume: true,
        max_resumption_time: Some(300),
    });
    assert_eq!(manager.state(), SmState::Negotiating);
    assert_eq!(
        sent(&manager),
        vec![SmFrame::Enable {
            resume: true,
            max: Some(300)
        }]
    );

    manager.increment_inbound_handled();
    manager.process_frame(SmFrame::Enabled {
        id: Some("some-long-sm-id".to_string()),
        resume: true,
        location: None,
        max: None,
    });
    assert_eq!(manager.state(), SmState::Active);
    assert!(manager.is_resumable());
    assert_eq!(manager.session_id().as_deref(), Some("some-long-sm-id"));
    assert_eq!(manager.inbound_handled(), 0);
}

#[test]
fn ledger_fifo() {
    let manager = manager();
    enabled(&manager, "id");
    manager.mark_outbound_sent("s1");
    manager.mark_outbound_sent("s2");
    manager.mark_outbound_sent("s3");

    manager.process_frame(SmFrame::Answer { h: 2 });
    assert_eq!(acknowledged(&manager), vec!["s1", "s2"]);
    assert_eq!(manager.unacknowledged(), vec!["s3"]);
    assert_eq!(manager.outbound_acknowledged(), 2);

    // Repeating the same count releases nothing
    manager.process_frame(SmFrame::Answer { h: 2 });
    assert_eq!(acknowledged(&manager).len(), 2);

    manager.process_frame(SmFrame::Answer { h: 3 });
    assert_eq!(acknowledged(&manager), vec!["s1", "s2", "s3"]);
    assert_eq!(manager.unacknowledged_count(), 0);
}

#[test]
fn wraparound_reconcile() {
    let manager = manager();
    enabled(&manager, "id");

    // Moves the acknowledged count close to the wrap point
    manager.process_frame(SmFrame::Answer { h: 4294967294 });
    assert_eq!(manager.outbound_acknowledged(), 4294967294);

    manager.mark_outbound_sent("a");
    manager.mark_outbound_sent("b");
    manager.mark_outbound_sent("c");
    manager.mark_outbound_sent("d");
    manager.process_frame(SmFrame::Answer { h: 1 });
    assert_eq!(acknowledged(&manager), vec!["a", "b", "c"]);
    assert_eq!(manager.unacknowledged(), vec!["d"]);
    assert_eq!(manager.outbound_acknowledged(), 1);
}

#[test]
fn not_enabled_keeps_nothing() {
    let manager = manager();
    manager.mark_outbound_sent("s1");
    assert_eq!(manager.unacknowledged_count(), 0);

    manager.request_ack();
    assert!(sent(&manager).is_empty());
}

#[test]
fn requests_are_answered() {
    let manager = manager();
    enabled(&manager, "id");
    assert_eq!(manager.increment_inbound_handled(), 1);
    assert_eq!(manager.increment_inbound_handled(), 2);
    assert_eq!(manager.increment_inbound_handled(), 3);

    manager.process_frame(SmFrame::Request);
    assert_eq!(sent(&manager).last(), Some(&SmFrame::Answer { h: 3 }));

    manager.request_ack();
    assert_eq!(sent(&manager).last(), Some(&SmFrame::Request));
}

#[test]
fn inbound_enable_is_confirmed() {
    let manager = manager();
    manager.process_frame(SmFrame::Enable {
        resume: false,
        max: None,
    });
    assert!(manager.is_enabled());
    assert_eq!(manager.state(), SmState::Active);
    assert_eq!(
        sent(&manager),
        vec![SmFrame::Enabled {
            id: None,
            resume: false,
            location: None,
            max: None,
        }]
    );

    manager.mark_outbound_sent("s1");
    assert_eq!(manager.unacknowledged(), vec!["s1"]);
}

#[test]
fn resume_without_session() {
    let manager = manager();
    let mut handle = manager.resume();
    assert_eq!(handle.try_outcome(), Some(false));
    assert!(sent(&manager).is_empty());

    // An enabled but not resumable session cannot be resumed either
    manager.enable(&SmConfig::default());
    manager.process_frame(SmFrame::Enabled {
        id: Some("x".to_string()),
        resume: false,
        location: None,
        max: None,
    });
    let mut handle = manager.resume();
    assert_eq!(handle.try_outcome(), Some(false));
    assert_eq!(sent(&manager).len(), 1);
}

#[tokio::test]
async fn resume_succeeds() {
    let manager = manager();
    enabled(&manager, "sid");
    manager.mark_outbound_sent("s1");
    manager.mark_outbound_sent("s2");
    manager.increment_inbound_handled();
    manager.increment_inbound_handled();

    let mut handle = manager.resume();
    assert_eq!(handle.try_outcome(), None);
    assert_eq!(manager.state(), SmState::Negotiating);
    assert_eq!(
        sent(&manager).last(),
        Some(&SmFrame::Resume {
            previd: "sid".to_string(),
            h: 2
        })
    );

    manager.process_frame(SmFrame::Resumed {
        previd: "sid".to_string(),
        h: 1,
    });
    assert!(handle.await);
    assert_eq!(manager.state(), SmState::Active);
    assert_eq!(acknowledged(&manager), vec!["s1"]);
    assert_eq!(manager.unacknowledged(), vec!["s2"]);
}

#[tokio::test]
async fn resume_fails() {
    let manager = manager();
    enabled(&manager, "sid");
    manager.mark_outbound_sent("s1");
    manager.mark_outbound_sent("s2");

    let handle = manager.resume();
    manager.process_frame(SmFrame::Failed {
        h: Some(1),
        condition: Some("item-not-found".to_string()),
    });
    assert!(!handle.await);
    assert_eq!(manager.state(), SmState::Inactive);
    assert!(!manager.is_resumable());
    assert!(!manager.is_enabled());
    assert_eq!(acknowledged(&manager), vec!["s1"]);
    // Left for sending again on a fresh session
    assert_eq!(manager.unacknowledged(), vec!["s2"]);

    // A second failure has nothing left to complete
    manager.process_frame(SmFrame::Failed {
        h: None,
        condition: None,
    });
    assert_eq!(manager.state(), SmState::Inactive);
}

#[tokio::test]
async fn replaced_resume_completes_once() {
    let manager = manager();
    enabled(&manager, "sid");

    let first = manager.resume();
    let second = manager.resume();
    assert!(!first.await);

    manager.process_frame(SmFrame::Resumed {
        previd: "sid".to_string(),
        h: 0,
    });
    assert!(second.await);
}

#[tokio::test]
async fn reset_clears_everything() {
    let manager = manager();
    enabled(&manager, "sid");
    manager.mark_outbound_sent("s1");
    manager.increment_inbound_handled();
    let handle = manager.resume();

    manager.reset();
    assert!(!handle.await);
    assert_eq!(manager.state(), SmState::Inactive);
    assert_eq!(manager.inbound_handled(), 0);
    assert_eq!(manager.outbound_acknowledged(), 0);
    assert_eq!(manager.unacknowledged_count(), 0);
    assert!(!manager.is_resumable());
}

#[test]
fn inbound_count_wraps() {
    let manager = manager();
    enabled(&manager, "id");
    manager.set_inbound_handled(u32::MAX - 1);

    assert_eq!(manager.increment_inbound_handled(), u32::MAX);
    manager.process_frame(SmFrame::Request);
    assert_eq!(sent(&manager).last(), Some(&SmFrame::Answer { h: u32::MAX }));

    assert_eq!(manager.increment_inbound_handled(), 0);
    manager.process_frame(SmFrame::Request);
    assert_eq!(sent(&manager).last(), Some(&SmFrame::Answer { h: 0 }));

    // The resume request carries the wrapped count too
    let _handle = manager.resume();
    assert_eq!(
        sent(&manager).last(),
        Some(&SmFrame::Resume {
            previd: "id".to_string(),
            h: 0
        })
    );
}

/// Looks at the resumption outcome whenever a stanza is acknowledged.
#[derive(Default)]
struct OutcomeWatcher {
    handle: Mutex<Option<ResumeHandle>>,
    outcomes: Mutex<Vec<Option<bool>>>,
}

impl SmConnection<&'static str> for OutcomeWatcher {
    fn send_frame(&self, _frame: SmFrame) {}

    fn stanza_acknowledged(&self, _stanza: &'static str) {
        let outcome = self.handle.lock().as_mut().and_then(|h| h.try_outcome());
        self.outcomes.lock().push(outcome);
    }
}

#[test]
fn acknowledgements_precede_resume_outcome() {
    for resumed in [true, false] {
        let manager: StreamManager<&'static str, OutcomeWatcher> =
            StreamManager::new(OutcomeWatcher::default());
        manager.enable(&SmConfig::default());
        manager.process_frame(SmFrame::Enabled {
            id: Some("sid".to_string()),
            resume: true,
            location: None,
            max: None,
        });
        manager.mark_outbound_sent("s1");
        manager.mark_outbound_sent("s2");

        let handle = manager.resume();
        *manager.connection().handle.lock() = Some(handle);
        if resumed {
            manager.process_frame(SmFrame::Resumed {
                previd: "sid".to_string(),
                h: 2,
            });
        } else {
            manager.process_frame(SmFrame::Failed {
                h: Some(2),
                condition: None,
            });
        }

        assert_eq!(*manager.connection().outcomes.lock(), vec![None, None]);
        let mut handle = manager.connection().handle.lock().take().unwrap();
        assert_eq!(handle.try_outcome(), Some(resumed));
    }
}

#[test]
fn unacknowledged_can_be_taken() {
    let manager = manager();
    enabled(&manager, "id");
    manager.mark_outbound_sent("s1");
    manager.mark_outbound_sent("s2");
    manager.process_frame(SmFrame::Failed {
        h: None,
        condition: None,
    });

    assert_eq!(manager.take_unacknowledged(), vec!["s1", "s2"]);
    assert_eq!(manager.unacknowledged_count(), 0);
    assert!(acknowledged(&manager).is_empty());
}

#[test]
fn dropped_engine_resolves_false() {
    let manager = manager();
    enabled(&manager, "sid");
    let mut handle = manager.resume();
    drop(manager);
    assert_eq!(handle.try_outcome(), Some(false));
}

#[test]
fn elements_are_dispatched() {
    let manager = manager();
    enabled(&manager, "sid");

    let request: Element = "<r xmlns='urn:xmpp:sm:3'/>".parse().unwrap();
    assert!(manager.process_element(&request));
    assert_eq!(sent(&manager).last(), Some(&SmFrame::Answer { h: 0 }));

    let unknown: Element = "<unknown xmlns='urn:xmpp:sm:3'/>".parse().unwrap();
    assert!(!manager.process_element(&unknown));

    let message: Element = "<message xmlns='jabber:client'/>".parse().unwrap();
    assert!(!manager.process_element(&message));
    assert_eq!(sent(&manager).len(), 2);
}

#[test]
fn frame_elements() {
    let enable = SmFrame::Enable {
        resume: true,
        max: Some(60),
    };
    assert_eq!(
        enable.to_element().to_string(),
        "<enable xmlns=\"urn:xmpp:sm:3\" resume=\"true\" max=\"60\"/>"
    );
    assert_eq!(SmFrame::from_element(&enable.to_element()), Some(enable));

    let failed = SmFrame::Failed {
        h: Some(5),
        condition: Some("unexpected-request".to_string()),
    };
    assert_eq!(
        failed.to_element().to_string(),
        "<failed xmlns=\"urn:xmpp:sm:3\" h=\"5\">\
         <unexpected-request xmlns=\"urn:ietf:params:xml:ns:xmpp-stanzas\"/></failed>"
    );
    assert_eq!(SmFrame::from_element(&failed.to_element()), Some(failed));

    let enabled: Element = "<enabled xmlns='urn:xmpp:sm:3' id='abc' resume='1' max='600'/>"
        .parse()
        .unwrap();
    assert_eq!(
        SmFrame::from_element(&enabled),
        Some(SmFrame::Enabled {
            id: Some("abc".to_string()),
            resume: true,
            location: None,
            max: Some(600),
        })
    );

    let answer = Element::with_namespace("a", SM_NS);
    assert_eq!(SmFrame::from_element(&answer), None);

    let bad_h: Element = "<a xmlns='urn:xmpp:sm:3' h='-1'/>".parse().unwrap();
    assert_eq!(SmFrame::from_element(&bad_h), None);

    let other: Element = "<a xmlns='urn:other' h='1'/>".parse().unwrap();
    assert_eq!(SmFrame::from_element(&other), None);

    let resumed: Element = "<resumed xmlns='urn:xmpp:sm:3' h='4294967295' previd='p'/>"
        .parse()
        .unwrap();
    assert_eq!(
        SmFrame::from_element(&resumed),
        Some(SmFrame::Resumed {
            previd: "p".to_string(),
            h: u32::MAX,
        })
    );
}

#[test]
fn frame_unmarshaller() {
    let frame = FrameUnmarshaller
        .unmarshal("<a xmlns='urn:xmpp:sm:3' h='7'/>".parse().unwrap())
        .unwrap();
    assert_eq!(frame, Incoming::Frame(SmFrame::Answer { h: 7 }));

    let ignored = FrameUnmarshaller
        .unmarshal("<x xmlns='urn:xmpp:sm:3'/>".parse().unwrap())
        .unwrap();
    assert!(matches!(ignored, Incoming::Ignored(_)));

    let stanza = FrameUnmarshaller
        .unmarshal("<iq xmlns='jabber:client' type='get'/>".parse().unwrap())
        .unwrap();
    assert!(matches!(stanza, Incoming::Stanza(ref iq) if iq.attribute("type") == Some("get")));
}
