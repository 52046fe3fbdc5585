/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

/// The namespace permanently bound to the `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Splits a qualified name into its optional prefix and the local part.
///
/// ```
/// use iksstream::split_name;
///
/// assert_eq!(split_name("stream:stream"), (Some("stream"), "stream"));
/// assert_eq!(split_name("message"), (None, "message"));
/// ```
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Returns the prefix declared by a namespace declaration attribute.
///
/// `Some(None)` is the default namespace declaration `xmlns`, `Some(Some(p))`
/// is `xmlns:p`, and `None` means the attribute is not a declaration.
pub fn declared_prefix(attribute: &str) -> Option<Option<&str>> {
    if attribute == "xmlns" {
        Some(None)
    } else {
        attribute.strip_prefix("xmlns:").map(Some)
    }
}

#[derive(Debug, Clone)]
struct Binding {
    prefix: Option<String>,
    uri: String,
}

/// Stack of in-scope namespace declarations.
///
/// Each start tag opens a frame with the declarations found in its
/// attributes and the matching end tag closes it again. Lookups walk the
/// frames from the innermost outward.
#[derive(Debug, Clone, Default)]
pub struct NamespaceScopes {
    bindings: Vec<Binding>,
    frames: Vec<usize>,
}

impl NamespaceScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<'a, I>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.frames.push(self.bindings.len());
        for (name, value) in attributes {
            if let Some(prefix) = declared_prefix(name) {
                self.bindings.push(Binding {
                    prefix: prefix.map(str::to_string),
                    uri: value.to_string(),
                });
            }
        }
    }

    pub fn pop(&mut self) {
        if let Some(start) = self.frames.pop() {
            self.bindings.truncate(start);
        }
    }

    /// Finds the namespace bound to a prefix, `None` being the default namespace.
    ///
    /// An empty default namespace declaration undeclares it, so the lookup
    /// returns `None` for it as it does for unbound prefixes.
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NS);
        }
        self.bindings
            .iter()
            .rev()
            .find(|binding| binding.prefix.as_deref() == prefix)
            .map(|binding| binding.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
