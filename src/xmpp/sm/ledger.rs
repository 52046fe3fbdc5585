/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::VecDeque;

use tracing::warn;

/// Sent stanzas waiting for an acknowledgement, oldest first.
#[derive(Debug, Clone)]
pub struct AckLedger<S> {
    entries: VecDeque<S>,
}

impl<S> AckLedger<S> {
    pub fn new() -> Self {
        AckLedger {
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, stanza: S) {
        self.entries.push_back(stanza);
    }

    /// Removes the `count` oldest stanzas and returns them in send order.
    pub fn release(&mut self, count: u32) -> Vec<S> {
        let held = self.entries.len();
        let count = usize::try_from(count).unwrap_or(usize::MAX);
        if count > held {
            warn!(acknowledged = count, held, "peer acknowledged more stanzas than sent");
        }
        self.entries.drain(..count.min(held)).collect()
    }

    pub fn drain_all(&mut self) -> Vec<S> {
        self.entries.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.entries.iter()
    }
}

impl<S> Default for AckLedger<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_release() {
        let mut ledger = AckLedger::new();
        ledger.push("s1");
        ledger.push("s2");
        ledger.push("s3");
        assert_eq!(ledger.release(2), vec!["s1", "s2"]);
        assert_eq!(ledger.iter().copied().collect::<Vec<_>>(), vec!["s3"]);
        assert!(ledger.release(0).is_empty());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn drain_keeps_order() {
        let mut ledger = AckLedger::new();
        ledger.push("s1");
        ledger.push("s2");
        assert_eq!(ledger.drain_all(), vec!["s1", "s2"]);
        assert!(ledger.is_empty());
        assert!(ledger.drain_all().is_empty());
    }

    #[test]
    fn over_acknowledgement_is_clamped() {
        let mut ledger = AckLedger::new();
        ledger.push(1);
        assert_eq!(ledger.release(5), vec![1]);
        assert!(ledger.is_empty());
        assert!(ledger.release(u32::MAX).is_empty());
    }
}
