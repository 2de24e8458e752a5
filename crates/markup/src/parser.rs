//! Hand-rolled forgiving parser for character markup fragments.
//!
//! Accepts the subset the character pipeline produces: nested elements,
//! single/double-quoted or bare attribute values, valueless attributes,
//! self-closing tags, text, and comments. All delimiters are ASCII, so byte
//! positions used for slicing always fall on character boundaries.

use thiserror::Error;

use crate::document::{Child, Node};

/// Errors from parsing a markup fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("malformed tag at byte {at}")]
    MalformedTag { at: usize },
    #[error("closing tag </{found}> does not match <{expected}>")]
    MismatchedClosingTag { expected: String, found: String },
    #[error("closing tag </{0}> without a matching opening tag")]
    UnexpectedClosingTag(String),
}

pub(crate) fn parse(input: &str) -> Result<Vec<Child>, MarkupError> {
    Parser { input, pos: 0 }.parse_children(None)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Parse sibling nodes until end of input or the closing tag of
    /// `enclosing`.
    fn parse_children(&mut self, enclosing: Option<&str>) -> Result<Vec<Child>, MarkupError> {
        let mut children = Vec::new();
        loop {
            if self.pos >= self.input.len() {
                if enclosing.is_some() {
                    // Unclosed element.
                    return Err(MarkupError::UnexpectedEof);
                }
                return Ok(children);
            }
            if self.rest().starts_with("</") {
                let found = self.parse_closing_tag()?;
                return match enclosing {
                    Some(tag) if tag == found => Ok(children),
                    Some(tag) => Err(MarkupError::MismatchedClosingTag {
                        expected: tag.to_string(),
                        found,
                    }),
                    None => Err(MarkupError::UnexpectedClosingTag(found)),
                };
            }
            if self.rest().starts_with("<!--") {
                self.skip_comment()?;
            } else if self.peek() == Some(b'<') {
                children.push(Child::Element(self.parse_element()?));
            } else {
                let text = self.parse_text();
                if !text.is_empty() {
                    children.push(Child::Text(text));
                }
            }
        }
    }

    fn parse_element(&mut self) -> Result<Node, MarkupError> {
        let start = self.pos;
        self.bump(); // '<'
        let tag = self.parse_name();
        if tag.is_empty() {
            return Err(MarkupError::MalformedTag { at: start });
        }
        let mut attributes: Vec<(String, String)> = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(MarkupError::UnexpectedEof),
                Some(b'/') => {
                    self.bump();
                    if self.bump() != Some(b'>') {
                        return Err(MarkupError::MalformedTag { at: start });
                    }
                    return Ok(Node {
                        tag,
                        attributes,
                        children: Vec::new(),
                    });
                }
                Some(b'>') => {
                    self.bump();
                    let children = self.parse_children(Some(tag.as_str()))?;
                    return Ok(Node {
                        tag,
                        attributes,
                        children,
                    });
                }
                Some(_) => {
                    let (name, value) = self.parse_attribute(start)?;
                    // First occurrence of a name wins.
                    if !attributes.iter().any(|(existing, _)| *existing == name) {
                        attributes.push((name, value));
                    }
                }
            }
        }
    }

    fn parse_closing_tag(&mut self) -> Result<String, MarkupError> {
        let start = self.pos;
        self.pos += 2; // "</"
        let name = self.parse_name();
        if name.is_empty() {
            return Err(MarkupError::MalformedTag { at: start });
        }
        self.skip_whitespace();
        match self.bump() {
            Some(b'>') => Ok(name),
            Some(_) => Err(MarkupError::MalformedTag { at: start }),
            None => Err(MarkupError::UnexpectedEof),
        }
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':')
        {
            self.pos += 1;
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self, tag_start: usize) -> Result<(String, String), MarkupError> {
        let name = self.parse_name();
        if name.is_empty() {
            return Err(MarkupError::MalformedTag { at: tag_start });
        }
        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            // Valueless attribute, e.g. `collide`.
            return Ok((name, String::new()));
        }
        self.bump();
        self.skip_whitespace();
        let value = self.parse_attribute_value()?;
        Ok((name, value))
    }

    fn parse_attribute_value(&mut self) -> Result<String, MarkupError> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.bump();
                let start = self.pos;
                while let Some(byte) = self.peek() {
                    if byte == quote {
                        let raw = &self.input[start..self.pos];
                        self.bump();
                        return Ok(unescape(raw));
                    }
                    self.pos += 1;
                }
                Err(MarkupError::UnexpectedEof)
            }
            _ => {
                // Bare value: runs to whitespace or the end of the tag. A
                // `/` only terminates when it closes the tag (`/>`), so
                // path-like values survive unquoted.
                let start = self.pos;
                while let Some(byte) = self.peek() {
                    if byte.is_ascii_whitespace() || byte == b'>' {
                        break;
                    }
                    if byte == b'/' && self.input.as_bytes().get(self.pos + 1) == Some(&b'>') {
                        break;
                    }
                    self.pos += 1;
                }
                Ok(unescape(&self.input[start..self.pos]))
            }
        }
    }

    fn parse_text(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|b| b != b'<') {
            self.pos += 1;
        }
        unescape(&self.input[start..self.pos])
    }

    fn skip_comment(&mut self) -> Result<(), MarkupError> {
        let body_start = self.pos + 4; // past "<!--"
        match self.input[body_start..].find("-->") {
            Some(idx) => {
                self.pos = body_start + idx + 3;
                Ok(())
            }
            None => Err(MarkupError::UnexpectedEof),
        }
    }
}

const ENTITIES: &[(&str, char)] = &[
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&apos;", '\''),
];

fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                // Bare ampersand; keep it.
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
