/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use crate::SaxParser;

use super::error::description;
use super::*;

fn check_xml(element: &Element, expected: &str) {
    let xml = element.to_string();
    assert_eq!(xml, expected);
    // Verify that the capacity is measured correctly
    assert_eq!(xml.len(), xml.capacity());
    // Verify that the Display and to_string are same
    let xml2 = format!("{}", element);
    assert_eq!(xml2, expected);
}

fn parse(xml: &str) -> Result<Element, ElementError> {
    xml.parse::<Element>()
}

#[test]
fn it_works() {
    let mut html = Element::new("html");
    let mut p = Element::new("p");
    let mut b = Element::new("b");
    let mut blink = Element::new("blink");
    blink.push_text("lala");
    b.push_child(blink);
    p.push_child(b);
    html.push_child(p);
    html.push_text("foo&").push_child(Element::new("p3"));
    html.push_text("bar");

    check_xml(
        &html,
        "<html><p><b><blink>lala</blink></b></p>foo&amp;<p3/>bar</html>",
    );
}

#[test]
fn attributes() {
    let mut a = Element::new("a");
    a.set_attribute("i", "1").set_attribute("j", "'2'");
    a.set_attribute("i", "3");
    assert_eq!(a.attribute("i"), Some("3"));
    assert_eq!(a.attribute("k"), None);
    check_xml(&a, "<a i=\"3\" j=\"&apos;2&apos;\"/>");

    let attrs: Vec<(&str, &str)> = a.attributes().collect();
    assert_eq!(attrs, vec![("i", "3"), ("j", "'2'")]);
}

#[test]
fn text_merging() {
    let mut a = Element::new("a");
    a.push_text("x").push_text("y");
    assert_eq!(a.children().len(), 1);
    a.push_child(Element::new("b"));
    a.push_text("z");
    assert_eq!(a.children().len(), 3);
    assert_eq!(a.text(), "xyz");
}

#[test]
fn namespaces() {
    let sm = Element::with_namespace("enable", "urn:xmpp:sm:3");
    assert_eq!(sm.namespace(), Some("urn:xmpp:sm:3"));
    assert!(sm.is("enable", "urn:xmpp:sm:3"));
    check_xml(&sm, "<enable xmlns=\"urn:xmpp:sm:3\"/>");

    let prefixed = Element::with_namespace("db:result", "jabber:server:dialback");
    assert_eq!(prefixed.prefix(), Some("db"));
    assert_eq!(prefixed.local_name(), "result");
    check_xml(
        &prefixed,
        "<db:result xmlns:db=\"jabber:server:dialback\"/>",
    );
}

#[test]
fn parsing() {
    let xml = "<message xmlns='jabber:client' to='romeo@example.net' type='chat'>\
               <body>Art thou &lt;not&gt; Romeo?</body>\
               <x:thread xmlns:x='urn:x'>a&amp;b</x:thread>\
               </message>";
    let message = parse(xml).unwrap();
    assert_eq!(message.name(), "message");
    assert_eq!(message.namespace(), Some("jabber:client"));
    assert_eq!(message.attribute("type"), Some("chat"));
    assert_eq!(message.child_elements().count(), 2);

    let body = message.find_child("body", "jabber:client").unwrap();
    assert_eq!(body.text(), "Art thou <not> Romeo?");

    let thread = message.find_child("thread", "urn:x").unwrap();
    assert_eq!(thread.name(), "x:thread");
    assert_eq!(thread.text(), "a&b");
    assert!(message.find_child("thread", "jabber:client").is_none());

    check_xml(
        &message,
        "<message xmlns=\"jabber:client\" to=\"romeo@example.net\" type=\"chat\">\
         <body>Art thou &lt;not&gt; Romeo?</body>\
         <x:thread xmlns:x=\"urn:x\">a&amp;b</x:thread></message>",
    );
}

#[test]
fn undeclared_default_namespace() {
    let root = parse("<a xmlns='urn:a'><b xmlns=''><c/></b></a>").unwrap();
    let b = root.child_elements().next().unwrap();
    assert_eq!(b.namespace(), None);
    assert_eq!(b.child_elements().next().unwrap().namespace(), None);
}

#[test]
fn bad_documents() {
    assert_eq!(
        parse("<a><b></c></a>").unwrap_err(),
        ElementError::BadXml(description::TAG_MISMATCH)
    );
    assert_eq!(
        parse("<a x='1' x='2'/>").unwrap_err(),
        ElementError::BadXml(description::DUPLICATE_ATTRIBUTE)
    );
    assert_eq!(
        parse("<p:a/>").unwrap_err(),
        ElementError::BadXml(description::UNBOUND_PREFIX)
    );
    assert_eq!(
        parse("<a p:x='1'/>").unwrap_err(),
        ElementError::BadXml(description::UNBOUND_PREFIX)
    );
    assert!(matches!(parse("<a>"), Err(ElementError::BadXml(_))));
    assert!(matches!(parse(""), Err(ElementError::BadXml(_))));
}

#[test]
fn xml_prefix_is_bound() {
    let a = parse("<a xml:lang='en'/>").unwrap();
    assert_eq!(a.attribute("xml:lang"), Some("en"));
}

#[test]
fn stream_child() {
    let mut parser = SaxParser::new();
    let mut builder = ElementBuilder::stream_child();
    let bytes = b"<stream:stream xmlns:stream='http://etherx.jabber.org/streams' \
                  xmlns='jabber:client' xmlns:ext='urn:ext' version='1.0'>\
                  \n  <ext:item id='1'><ext:sub/>hi</ext:item>";
    parser.parse_bytes(&mut builder, bytes).unwrap();
    assert!(builder.is_complete());

    let item = builder.take().unwrap();
    assert_eq!(item.name(), "ext:item");
    assert_eq!(item.namespace(), Some("urn:ext"));
    assert_eq!(item.attribute("id"), Some("1"));
    assert_eq!(item.text(), "hi");
    assert!(item.find_child("sub", "urn:ext").is_some());
    check_xml(&item, "<ext:item id=\"1\"><ext:sub/>hi</ext:item>");
}

#[test]
fn stream_child_single_result() {
    let mut parser = SaxParser::new();
    let mut builder = ElementBuilder::stream_child();
    let result = parser.parse_bytes(&mut builder, b"<s xmlns='jabber:client'><a/><b/>");
    assert_eq!(
        result.unwrap_err(),
        crate::SaxError::BadXml(description::CONTENT_AFTER_ELEMENT)
    );
}
