// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::from_utf8;

use quick_xml::events::{BytesStart, Event};

use super::model::{Feature, RawEdge, RawNode};

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<Event<'b>> {
        self.0.read_event()
    }
}

/// Reader reads network [Features](Feature) from an XML file.
///
/// Malformed nodes and edges are skipped with a warning.
pub(super) struct Reader<P: Parser> {
    parser: P,
    eof: bool,
    nested: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self {
            parser,
            eof: false,
            nested: false,
        }
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<Feature, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut f: Option<Feature> = None;

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => return Some(Err(e)),
            };

            match event {
                Event::Empty(start) => match start.local_name().as_ref() {
                    b"node" => {
                        if let Some(n) = parse_node(&start) {
                            return Some(Ok(Feature::Node(n)));
                        }
                    }
                    b"edge" => {
                        if let Some(e) = parse_edge(&start) {
                            return Some(Ok(Feature::Edge(e)));
                        }
                    }
                    b"attr" => {
                        if let Some(attributes) = edge_attributes(&mut f, self.nested) {
                            if let Some((k, v)) = parse_attr(&start) {
                                attributes.insert(k, v);
                            }
                        }
                    }
                    b"attr_dict" => {
                        if let Some(Feature::Edge(ref mut e)) = f {
                            e.attr_dict.get_or_insert_with(HashMap::default);
                        }
                    }
                    _ => {}
                },

                Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => f = parse_node(&start).map(Feature::Node),
                    b"edge" => f = parse_edge(&start).map(Feature::Edge),
                    b"attr_dict" => {
                        if let Some(Feature::Edge(ref mut e)) = f {
                            e.attr_dict.get_or_insert_with(HashMap::default);
                            self.nested = true;
                        }
                    }
                    _ => {}
                },

                Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"edge" => {
                        self.nested = false;
                        if let Some(f) = f.take() {
                            return Some(Ok(f));
                        }
                    }
                    b"attr_dict" => self.nested = false,
                    _ => {}
                },

                Event::Eof => {
                    self.eof = true;
                }

                _ => {}
            }
        }

        f.map(Ok)
    }
}

impl<'a> Reader<BufParser<'a>> {
    #[inline]
    pub(super) fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    #[inline]
    pub(super) fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

fn parse_number<T: std::str::FromStr>(value: &[u8]) -> Option<T> {
    from_utf8(value).ok()?.trim().parse().ok()
}

fn parse_node(start: &BytesStart<'_>) -> Option<RawNode> {
    let mut id: Option<i64> = None;
    let mut x = f64::NAN;
    let mut y = f64::NAN;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"id" => id = parse_number(&attr.value),
            b"x" => x = parse_number(&attr.value).unwrap_or(f64::NAN),
            b"y" => y = parse_number(&attr.value).unwrap_or(f64::NAN),
            _ => {}
        }
    }

    match id {
        Some(id) if x.is_finite() && y.is_finite() => Some(RawNode { id, x, y }),
        _ => {
            log::warn!("skipping malformed node: id={:?} x={} y={}", id, x, y);
            None
        }
    }
}

fn parse_edge(start: &BytesStart<'_>) -> Option<RawEdge> {
    let mut from: Option<i64> = None;
    let mut to: Option<i64> = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"from" => from = parse_number(&attr.value),
            b"to" => to = parse_number(&attr.value),
            _ => {}
        }
    }

    match (from, to) {
        (Some(from), Some(to)) => Some(RawEdge {
            from,
            to,
            ..Default::default()
        }),
        _ => {
            log::warn!("skipping malformed edge: from={:?} to={:?}", from, to);
            None
        }
    }
}

fn parse_attr(start: &BytesStart<'_>) -> Option<(String, String)> {
    let mut k = None;
    let mut v = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"k" => k = Some(attr.unescape_value().ok()?.into_owned()),
            b"v" => v = Some(attr.unescape_value().ok()?.into_owned()),
            _ => {}
        }
    }

    k.map(|k| (k, v.unwrap_or_default()))
}

fn edge_attributes(f: &mut Option<Feature>, nested: bool) -> Option<&mut HashMap<String, String>> {
    match f {
        Some(Feature::Edge(e)) => {
            if nested {
                e.attr_dict.as_mut()
            } else {
                Some(&mut e.attributes)
            }
        }
        _ => None,
    }
}
