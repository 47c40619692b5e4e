use crate::error::{ErrorKind, Result};
use std::fmt;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Element {
    Literal(String),
    Token(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Element(Element),
    /// Dropped entirely when any token inside it is absent.
    Optional(Vec<Element>),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Literal(text) => f.write_str(text),
            Element::Token(name) => write!(f, "[{name}]"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(element) => element.fmt(f),
            Node::Optional(elements) => {
                f.write_str("(")?;
                for element in elements {
                    element.fmt(f)?;
                }
                f.write_str(")")
            },
        }
    }
}

/// Accumulates nodes while scanning, routing elements into the open optional
/// group when there is one.
#[derive(Default)]
struct Builder {
    nodes: Vec<Node>,
    group: Option<(usize, Vec<Element>)>,
    literal: String,
}
impl Builder {
    fn push(&mut self, element: Element) {
        match &mut self.group {
            Some((_, elements)) => elements.push(element),
            None => self.nodes.push(Node::Element(element)),
        }
    }

    fn flush(&mut self) {
        if !self.literal.is_empty() {
            let text = std::mem::take(&mut self.literal);
            self.push(Element::Literal(text));
        }
    }

    fn open_group(&mut self, offset: usize) -> Result<()> {
        if self.group.is_some() {
            exn::bail!(ErrorKind::NestedGroup(offset));
        }
        self.flush();
        self.group = Some((offset, Vec::new()));
        Ok(())
    }

    fn close_group(&mut self, offset: usize) -> Result<()> {
        self.flush();
        match self.group.take() {
            Some((_, elements)) => {
                self.nodes.push(Node::Optional(elements));
                Ok(())
            },
            None => exn::bail!(ErrorKind::UnbalancedGroup(offset)),
        }
    }

    fn finish(mut self) -> Result<Vec<Node>> {
        if let Some((offset, _)) = self.group {
            exn::bail!(ErrorKind::UnterminatedGroup(offset));
        }
        self.flush();
        Ok(self.nodes)
    }
}

/// Parses pattern source into nodes.
///
/// A stray `]` outside a token is literal text.
pub(crate) fn parse(source: &str) -> Result<Vec<Node>> {
    let mut builder = Builder::default();
    let mut chars = source.char_indices();
    while let Some((offset, c)) = chars.next() {
        match c {
            '[' => {
                let name = read_token(&mut chars, offset)?;
                builder.flush();
                builder.push(Element::Token(name));
            },
            '(' => builder.open_group(offset)?,
            ')' => builder.close_group(offset)?,
            c => builder.literal.push(c),
        }
    }
    builder.finish()
}

/// Reads a token name up to the closing `]`. The opening `[` at `start` has
/// already been consumed.
fn read_token(chars: &mut CharIndices<'_>, start: usize) -> Result<String> {
    let mut name = String::new();
    for (offset, c) in chars.by_ref() {
        match c {
            ']' if name.is_empty() => exn::bail!(ErrorKind::EmptyToken(start)),
            ']' => return Ok(name),
            '(' | ')' => exn::bail!(ErrorKind::NestedGroup(offset)),
            '[' => exn::bail!(ErrorKind::UnterminatedToken(start)),
            c => name.push(c),
        }
    }
    exn::bail!(ErrorKind::UnterminatedToken(start))
}
