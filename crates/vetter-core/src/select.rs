//! # Path Selection
//!
//! Evaluates the `select` expression of a rule against a document and
//! returns the matching nodes as JSON Pointers, in document order.
//!
//! Returning pointers instead of references keeps the document borrowed
//! only for the duration of the selection. The engine later resolves each
//! pointer with `Value::pointer` for reading and `Value::pointer_mut`
//! for the narrow write-back step.
//!
//! ## Supported syntax
//!
//! | Form | Meaning |
//! |------|---------|
//! | `$` | the root node |
//! | `.name`, `['name']`, `["name"]` | object member |
//! | `[n]` | array element; negative `n` counts from the end |
//! | `.*`, `[*]` | every member or element |
//! | `['a', 'b']`, `[0, 2]` | union, in the listed order |
//! | `[start:end]` | array slice, either bound optional |
//! | `..name`, `..*`, `..[...]` | recursive descent, pre-order |
//!
//! Object members are visited in the map's key order.

use std::str::FromStr;

use serde_json::Value;

use crate::error::SelectError;
use crate::tree::{pointer_with_index, pointer_with_key};

/// One selector inside a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Name(String),
    Index(i64),
    Wildcard,
    Slice { start: Option<i64>, end: Option<i64> },
}

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Apply the selectors to the current nodes.
    Child(Vec<Selector>),
    /// Apply the selectors to the current nodes and all their descendants.
    Descendant(Vec<Selector>),
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    source: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    /// Parse a path expression.
    ///
    /// # Errors
    ///
    /// Returns `SelectError` with the offset of the first unexpected byte.
    pub fn parse(path: &str) -> Result<Self, SelectError> {
        let segments = Parser::new(path).parse()?;
        Ok(Self {
            source: path.to_string(),
            segments,
        })
    }

    /// The expression text this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true when the expression selects only the root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Evaluate against `root`, returning a JSON Pointer per match.
    ///
    /// The root itself is addressed by the empty pointer `""`.
    pub fn select(&self, root: &Value) -> Vec<String> {
        let mut current: Vec<(String, &Value)> = vec![(String::new(), root)];
        for segment in &self.segments {
            let mut next = Vec::new();
            match segment {
                Segment::Child(selectors) => {
                    for (ptr, node) in &current {
                        apply_selectors(selectors, ptr, *node, &mut next);
                    }
                }
                Segment::Descendant(selectors) => {
                    for (ptr, node) in &current {
                        descend(selectors, ptr.clone(), *node, &mut next);
                    }
                }
            }
            current = next;
        }
        current.into_iter().map(|(ptr, _)| ptr).collect()
    }
}

impl FromStr for PathExpr {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for PathExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse `path` and evaluate it against `root` in one step.
pub fn pick(path: &str, root: &Value) -> Result<Vec<String>, SelectError> {
    Ok(PathExpr::parse(path)?.select(root))
}

fn descend<'v>(
    selectors: &[Selector],
    ptr: String,
    node: &'v Value,
    out: &mut Vec<(String, &'v Value)>,
) {
    apply_selectors(selectors, &ptr, node, out);
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                descend(selectors, pointer_with_key(&ptr, key), child, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                descend(selectors, pointer_with_index(&ptr, i), child, out);
            }
        }
        _ => {}
    }
}

fn apply_selectors<'v>(
    selectors: &[Selector],
    ptr: &str,
    node: &'v Value,
    out: &mut Vec<(String, &'v Value)>,
) {
    for selector in selectors {
        match (selector, node) {
            (Selector::Name(name), Value::Object(map)) => {
                if let Some(child) = map.get(name) {
                    out.push((pointer_with_key(ptr, name), child));
                }
            }
            (Selector::Index(index), Value::Array(items)) => {
                if let Some(i) = normalize_index(*index, items.len()) {
                    out.push((pointer_with_index(ptr, i), &items[i]));
                }
            }
            (Selector::Wildcard, Value::Object(map)) => {
                for (key, child) in map {
                    out.push((pointer_with_key(ptr, key), child));
                }
            }
            (Selector::Wildcard, Value::Array(items)) => {
                for (i, child) in items.iter().enumerate() {
                    out.push((pointer_with_index(ptr, i), child));
                }
            }
            (Selector::Slice { start, end }, Value::Array(items)) => {
                let len = items.len() as i64;
                let from = clamp_bound(start.unwrap_or(0), len);
                let to = clamp_bound(end.unwrap_or(len), len);
                for i in from..to {
                    out.push((pointer_with_index(ptr, i), &items[i]));
                }
            }
            _ => {}
        }
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { index + len } else { index };
    if (0..len).contains(&resolved) {
        Some(resolved as usize)
    } else {
        None
    }
}

fn clamp_bound(bound: i64, len: i64) -> usize {
    let resolved = if bound < 0 { bound + len } else { bound };
    resolved.clamp(0, len) as usize
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, reason: &str) -> SelectError {
        SelectError {
            path: self.src.to_string(),
            offset: self.pos,
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn parse(mut self) -> Result<Vec<Segment>, SelectError> {
        self.skip_ws();
        if !self.eat(b'$') {
            return Err(self.error("expected '$'"));
        }
        let mut segments = Vec::new();
        loop {
            let mark = self.pos;
            self.skip_ws();
            if self.peek().is_none() {
                break;
            }
            self.pos = mark;
            match self.peek() {
                None => break,
                Some(b'.') => {
                    self.pos += 1;
                    if self.eat(b'.') {
                        let selectors = if self.peek() == Some(b'[') {
                            self.bracket()?
                        } else {
                            vec![self.dot_member()?]
                        };
                        segments.push(Segment::Descendant(selectors));
                    } else {
                        segments.push(Segment::Child(vec![self.dot_member()?]));
                    }
                }
                Some(b'[') => {
                    let selectors = self.bracket()?;
                    segments.push(Segment::Child(selectors));
                }
                Some(_) => return Err(self.error("expected '.' or '['")),
            }
        }
        Ok(segments)
    }

    fn dot_member(&mut self) -> Result<Selector, SelectError> {
        if self.eat(b'*') {
            return Ok(Selector::Wildcard);
        }
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b >= 0x80 {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected member name or '*'"));
        }
        Ok(Selector::Name(self.src[start..self.pos].to_string()))
    }

    fn bracket(&mut self) -> Result<Vec<Selector>, SelectError> {
        // Caller guarantees the current byte is '['.
        self.pos += 1;
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            selectors.push(self.bracket_item()?);
            self.skip_ws();
            if self.eat(b',') {
                continue;
            }
            if self.eat(b']') {
                break;
            }
            return Err(self.error("expected ',' or ']'"));
        }
        Ok(selectors)
    }

    fn bracket_item(&mut self) -> Result<Selector, SelectError> {
        match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                Ok(Selector::Wildcard)
            }
            Some(quote @ (b'\'' | b'"')) => Ok(Selector::Name(self.quoted(quote)?)),
            Some(b'-' | b'0'..=b'9' | b':') => self.index_or_slice(),
            _ => Err(self.error("expected selector")),
        }
    }

    fn quoted(&mut self, quote: u8) -> Result<String, SelectError> {
        let src = self.src;
        let open = self.pos;
        self.pos += 1;
        let mut out = String::new();
        let mut chars = src[self.pos..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                c if c == quote as char => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                c => out.push(c),
            }
        }
        self.pos = open;
        Err(self.error("unterminated string"))
    }

    fn index_or_slice(&mut self) -> Result<Selector, SelectError> {
        let start = self.integer()?;
        self.skip_ws();
        if self.eat(b':') {
            self.skip_ws();
            let end = self.integer()?;
            return Ok(Selector::Slice { start, end });
        }
        start
            .map(Selector::Index)
            .ok_or_else(|| self.error("expected integer"))
    }

    fn integer(&mut self) -> Result<Option<i64>, SelectError> {
        let src = self.src;
        let start = self.pos;
        self.eat(b'-');
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let text = &src[start..self.pos];
        match text {
            "" => Ok(None),
            "-" => Err(self.error("expected digits after '-'")),
            digits => digits
                .parse()
                .map(Some)
                .map_err(|_| self.error("integer out of range")),
        }
    }
}
