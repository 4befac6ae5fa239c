//! Builds the [`Node`] tree of a single YAML document from the parser event stream.
//!
//! Anchors are recorded when their node completes; an alias becomes another `Rc`
//! to the same node, so aliased subtrees are shared rather than copied.

use std::io::Read;
use std::rc::Rc;

use ahash::AHashMap;
use encoding_rs_io::DecodeReaderBytesBuilder;
use saphyr_parser::{Event, Parser, Tag};

use crate::error::Error;
use crate::location::{Location, location_from_span};
use crate::node::{Node, NodeValue};

/// An open container waiting for its end event.
struct Open {
    tag: String,
    anchor_id: usize,
    location: Location,
    content: Content,
}

enum Content {
    Sequence(Vec<Rc<Node>>),
    Mapping {
        pairs: Vec<(Rc<Node>, Rc<Node>)>,
        key: Option<Rc<Node>>,
    },
}

struct Composer {
    anchors: AHashMap<usize, Rc<Node>>,
    open: Vec<Open>,
    root: Option<Rc<Node>>,
    last_location: Location,
}

/// Compose `input` into a node tree.
///
/// The input must hold exactly one document: an empty stream is [`Error::Eof`] and a
/// second non-empty document is [`Error::MultipleDocuments`].
pub fn compose(input: &str) -> Result<Rc<Node>, Error> {
    let mut composer = Composer {
        anchors: AHashMap::new(),
        open: Vec::new(),
        root: None,
        last_location: Location::UNKNOWN,
    };

    for item in Parser::new_from_str(input) {
        let (event, span) = item.map_err(Error::from_scan_error)?;
        let location = location_from_span(&span);
        composer.last_location = location;

        match event {
            Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart(_)
            | Event::DocumentEnd
            | Event::Nothing => {}
            Event::Scalar(value, _style, anchor_id, tag) => {
                let node = Rc::new(Node::new(
                    tag_text(tag.as_deref()),
                    NodeValue::Scalar(value.into_owned()),
                    location,
                ));
                composer.complete(node, anchor_id, location)?;
            }
            Event::SequenceStart(anchor_id, tag) => composer.open.push(Open {
                tag: tag_text(tag.as_deref()),
                anchor_id,
                location,
                content: Content::Sequence(Vec::new()),
            }),
            Event::MappingStart(anchor_id, tag) => composer.open.push(Open {
                tag: tag_text(tag.as_deref()),
                anchor_id,
                location,
                content: Content::Mapping {
                    pairs: Vec::new(),
                    key: None,
                },
            }),
            Event::SequenceEnd | Event::MappingEnd => {
                let Some(open) = composer.open.pop() else {
                    return Err(Error::msg("unbalanced end of collection").with_location(location));
                };
                let value = match open.content {
                    Content::Sequence(items) => NodeValue::Sequence(items),
                    Content::Mapping { pairs, .. } => NodeValue::Mapping(pairs),
                };
                let node = Rc::new(Node::new(open.tag, value, open.location));
                composer.complete(node, open.anchor_id, location)?;
            }
            Event::Alias(anchor_id) => {
                let node = composer
                    .anchors
                    .get(&anchor_id)
                    .cloned()
                    .ok_or_else(|| Error::unknown_anchor(anchor_id).with_location(location))?;
                composer.attach(node, location)?;
            }
        }
    }

    composer
        .root
        .ok_or_else(|| Error::eof().with_location(composer.last_location))
}

impl Composer {
    fn complete(&mut self, node: Rc<Node>, anchor_id: usize, at: Location) -> Result<(), Error> {
        if anchor_id != 0 {
            self.anchors.insert(anchor_id, Rc::clone(&node));
        }
        self.attach(node, at)
    }

    fn attach(&mut self, node: Rc<Node>, at: Location) -> Result<(), Error> {
        match self.open.last_mut() {
            Some(Open {
                content: Content::Sequence(items),
                ..
            }) => items.push(node),
            Some(Open {
                content: Content::Mapping { pairs, key },
                ..
            }) => match key.take() {
                Some(key) => pairs.push((key, node)),
                None => *key = Some(node),
            },
            None if self.root.is_some() => {
                return Err(Error::MultipleDocuments { location: at });
            }
            None => self.root = Some(node),
        }
        Ok(())
    }
}

fn tag_text(tag: Option<&Tag>) -> String {
    tag.map(ToString::to_string).unwrap_or_default()
}

/// Read a whole document from `reader`, honouring a UTF-8/UTF-16 byte order mark.
pub(crate) fn read_to_string<R: Read>(reader: R) -> Result<String, Error> {
    let mut decoder = DecodeReaderBytesBuilder::new()
        .encoding(None) // sniff BOM
        .build(reader);
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}
