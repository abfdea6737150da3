//! A DOM backend that materialises parsed values into a tree.

use std::mem;

use indexmap::IndexMap;

use crate::{Backend, Error, Extensions, Parser};

/// An insertion-ordered JSON object.
pub type Object = IndexMap<String, Element>;

/// One node of a materialised JSON document.
///
/// Equality is structural, so `0` (integer) and `0.0` (float) are distinct
/// values. Dropping an `Element` walks the tree iteratively; even a
/// degenerate many-thousand-level array drops without exhausting the call
/// stack.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    I64(i64),
    U64(u64),
    Double(f64),
    Bool(bool),
    Null,
    String(String),
    Array(Vec<Element>),
    Object(Object),
}

impl Element {
    /// The contained string, if this element is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Element::String(s) => Some(s),
            _ => None,
        }
    }

    /// The contained array, if this element is one.
    pub fn as_array(&self) -> Option<&[Element]> {
        match self {
            Element::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The contained object, if this element is one.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Element::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Move the contained string out, leaving an empty one behind.
    fn take_string(&mut self) -> Option<String> {
        match self {
            Element::String(s) => Some(mem::take(s)),
            _ => None,
        }
    }

    /// Move the direct children of a container into `out`, leaving the
    /// container empty.
    fn drain_children_into(&mut self, out: &mut Vec<Element>) {
        match self {
            Element::Array(a) => out.extend(a.drain(..)),
            Element::Object(o) => out.extend(o.drain(..).map(|(_, v)| v)),
            _ => {}
        }
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        // Flatten the tree onto a worklist so that each node is empty by
        // the time it is actually dropped.
        let mut pending = Vec::new();
        self.drain_children_into(&mut pending);
        while let Some(mut el) = pending.pop() {
            el.drain_children_into(&mut pending);
        }
    }
}

/// A work-stack slot: either a completed element or the sentinel pushed
/// when a container opens.
#[derive(Debug)]
enum Slot {
    Mark,
    Value(Element),
}

/// A [`Backend`] that builds an [`Element`] tree.
///
/// The backend keeps a single work stack. `begin_array`/`begin_object`
/// push a mark; the matching `end_*` pops values back to the mark and
/// assembles the container, so arbitrarily wide documents need no
/// recursion at all. Duplicate object keys overwrite earlier values while
/// keeping the original position.
///
/// ```
/// use pushjson::dom::{parse_into_dom, Element};
/// use pushjson::Extensions;
///
/// let dom = parse_into_dom(br#"{"a": [1, 2]}"#, Extensions::empty()).unwrap();
/// let obj = dom.as_object().unwrap();
/// assert_eq!(obj["a"], Element::Array(vec![Element::I64(1), Element::I64(2)]));
/// ```
#[derive(Debug)]
pub struct DomBackend {
    stack: Vec<Slot>,
    /// Number of open containers
    depth: usize,
    max_depth: usize,
}

impl Default for DomBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DomBackend {
    pub fn new() -> Self {
        Self::with_max_depth(200)
    }

    /// Create a backend with a container nesting budget. Exceeding it
    /// fails the parse with [`Error::DomNestingTooDeep`].
    pub fn with_max_depth(max_depth: usize) -> Self {
        DomBackend {
            stack: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    fn push(&mut self, el: Element) -> Result<(), Error> {
        self.stack.push(Slot::Value(el));
        Ok(())
    }

    fn open(&mut self) -> Result<(), Error> {
        if self.depth >= self.max_depth {
            return Err(Error::DomNestingTooDeep);
        }
        self.depth += 1;
        self.stack.push(Slot::Mark);
        Ok(())
    }
}

impl Backend for DomBackend {
    type Result = Option<Element>;

    fn null_value(&mut self) -> Result<(), Error> {
        self.push(Element::Null)
    }

    fn boolean_value(&mut self, v: bool) -> Result<(), Error> {
        self.push(Element::Bool(v))
    }

    fn integer_value(&mut self, v: i64) -> Result<(), Error> {
        self.push(Element::I64(v))
    }

    fn uint64_value(&mut self, v: u64) -> Result<(), Error> {
        self.push(Element::U64(v))
    }

    fn double_value(&mut self, v: f64) -> Result<(), Error> {
        self.push(Element::Double(v))
    }

    fn string_value(&mut self, s: &str) -> Result<(), Error> {
        self.push(Element::String(s.to_owned()))
    }

    fn begin_array(&mut self) -> Result<(), Error> {
        self.open()
    }

    fn end_array(&mut self) -> Result<(), Error> {
        let mut elements = Vec::new();
        while let Some(slot) = self.stack.pop() {
            match slot {
                Slot::Value(v) => elements.push(v),
                Slot::Mark => break,
            }
        }
        // popping reversed the accumulation order
        elements.reverse();
        self.depth = self.depth.saturating_sub(1);
        self.push(Element::Array(elements))
    }

    fn begin_object(&mut self) -> Result<(), Error> {
        self.open()
    }

    fn key(&mut self, s: &str) -> Result<(), Error> {
        self.push(Element::String(s.to_owned()))
    }

    fn end_object(&mut self) -> Result<(), Error> {
        let mut pairs = Vec::new();
        loop {
            match self.stack.pop() {
                Some(Slot::Value(v)) => match self.stack.pop() {
                    Some(Slot::Value(mut k)) => {
                        if let Some(key) = k.take_string() {
                            pairs.push((key, v));
                        }
                    }
                    _ => break,
                },
                Some(Slot::Mark) | None => break,
            }
        }
        let mut object = Object::with_capacity(pairs.len());
        for (k, v) in pairs.into_iter().rev() {
            object.insert(k, v);
        }
        self.depth = self.depth.saturating_sub(1);
        self.push(Element::Object(object))
    }

    fn result(&mut self) -> Self::Result {
        match self.stack.pop() {
            Some(Slot::Value(v)) => Some(v),
            _ => None,
        }
    }
}

/// Parse a complete byte slice into an [`Element`] tree.
pub fn parse_into_dom(
    bytes: impl AsRef<[u8]>,
    extensions: Extensions,
) -> Result<Element, Error> {
    let mut parser = Parser::with_extensions(DomBackend::new(), extensions);
    parser.input(bytes);
    parser.eof()?.ok_or(Error::ExpectedToken)
}
