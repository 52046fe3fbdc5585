/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

/// Received bytes which are not yet consumed by a decoded unit.
///
/// The tokenizer reports absolute offsets from the start of the stream,
/// the window keeps the absolute offset of its first byte so that a unit
/// length is the difference between two offsets.
#[derive(Debug, Default)]
pub struct ByteWindow {
    bytes: Vec<u8>,
    fed: usize,
    base: usize,
    header: Option<Vec<u8>>,
}

impl ByteWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Bytes not yet given to the tokenizer.
    pub fn unfed(&self) -> &[u8] {
        &self.bytes[self.fed..]
    }

    pub fn mark_fed(&mut self) {
        self.fed = self.bytes.len();
    }

    /// Absolute offset of the first held byte.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Number of held bytes up to the absolute offset.
    pub fn len_until(&self, end: usize) -> usize {
        end.saturating_sub(self.base).min(self.bytes.len())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn header(&self) -> Option<&[u8]> {
        self.header.as_deref()
    }

    /// Moves the front bytes into the captured stream header.
    pub fn capture_header(&mut self, len: usize) {
        let header = self.take_front(len);
        self.header = Some(header);
    }

    pub fn take_front(&mut self, len: usize) -> Vec<u8> {
        let len = len.min(self.bytes.len());
        let front: Vec<u8> = self.bytes.drain(..len).collect();
        self.advance(len);
        front
    }

    pub fn discard_front(&mut self, len: usize) {
        let len = len.min(self.bytes.len());
        self.bytes.drain(..len);
        self.advance(len);
    }

    fn advance(&mut self, len: usize) {
        self.base += len;
        self.fed = self.fed.saturating_sub(len);
    }

    /// Prepares the held bytes for a fresh tokenizer.
    ///
    /// Whitespace left over from the previous stream is dropped, so that an
    /// XML declaration of the new stream is still the first byte.
    pub fn restart(&mut self) {
        let blank = self
            .bytes
            .iter()
            .take_while(|&&c| matches!(c, b' ' | b'\t' | b'\r' | b'\n'))
            .count();
        self.bytes.drain(..blank);
        self.fed = 0;
        self.base = 0;
        self.header = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_trimming() {
        let mut window = ByteWindow::new();
        window.append(b"<s><a/>");
        assert_eq!(window.unfed(), b"<s><a/>");
        window.mark_fed();
        assert!(window.unfed().is_empty());

        window.capture_header(window.len_until(3));
        assert_eq!(window.header(), Some(&b"<s>"[..]));
        assert_eq!(window.base(), 3);

        window.append(b"<b>");
        assert_eq!(window.unfed(), b"<b>");
        assert_eq!(window.take_front(window.len_until(7)), b"<a/>");
        assert_eq!(window.unfed(), b"<b>");
        assert_eq!(window.base(), 7);
        window.mark_fed();

        window.discard_front(window.len_until(100));
        assert!(window.is_empty());
        assert_eq!(window.base(), 10);
    }

    #[test]
    fn restart_refeeds() {
        let mut window = ByteWindow::new();
        window.append(b"<s>  <x");
        window.mark_fed();
        window.capture_header(3);
        window.restart();
        assert_eq!(window.header(), None);
        assert_eq!(window.base(), 0);
        assert_eq!(window.unfed(), b"<x");

        window.append(b" \n");
        window.restart();
        assert_eq!(window.unfed(), b"<x \n");
    }
}
