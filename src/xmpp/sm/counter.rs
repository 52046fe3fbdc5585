/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

/// Stanza sequence number.
///
/// Values live in the 32 bit range, the value after 2^32-1 is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SequenceCounter(u32);

impl SequenceCounter {
    pub fn new(value: u32) -> Self {
        SequenceCounter(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn set(&mut self, value: u32) {
        self.0 = value;
    }

    pub fn increment(&mut self) -> u32 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }

    /// Number of steps from `from` to `to` modulo 2^32.
    pub fn distance(from: u32, to: u32) -> u32 {
        to.wrapping_sub(from)
    }
}

impl From<u32> for SequenceCounter {
    fn from(value: u32) -> Self {
        SequenceCounter(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_to_zero() {
        let mut counter = SequenceCounter::new(u32::MAX - 1);
        assert_eq!(counter.increment(), u32::MAX);
        assert_eq!(counter.increment(), 0);
        assert_eq!(counter.increment(), 1);
    }

    #[test]
    fn distances() {
        assert_eq!(SequenceCounter::distance(0, 0), 0);
        assert_eq!(SequenceCounter::distance(5, 8), 3);
        assert_eq!(SequenceCounter::distance(4294967294, 1), 3);
        assert_eq!(SequenceCounter::distance(u32::MAX, 0), 1);
    }
}
