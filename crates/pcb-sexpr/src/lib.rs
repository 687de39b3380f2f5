//! A small S-expression reader for KiCad file formats.
//!
//! Only reading is supported: the replication engine never writes schematic
//! files, it walks them to recover sheet metadata.
//!
//! - [`parse`] - read a single S-expression (the whole file for KiCad formats)
//! - [`Sexpr::find_list`] / [`Sexpr::find_all_lists`] - query direct children
//! - [`kicad`] - KiCad-specific helpers built on top of the tree

pub mod kicad;

use std::fmt;

/// Find a direct child list `(name ...)` within a list of [`Sexpr`] nodes.
pub fn find_child_list<'a>(items: &'a [Sexpr], name: &str) -> Option<&'a [Sexpr]> {
    items
        .iter()
        .filter_map(Sexpr::as_list)
        .find(|list| list.first().and_then(Sexpr::as_sym) == Some(name))
}

/// Find all direct child lists `(name ...)` within a list of [`Sexpr`] nodes.
pub fn find_all_child_lists<'a>(items: &'a [Sexpr], name: &str) -> Vec<&'a [Sexpr]> {
    items
        .iter()
        .filter_map(Sexpr::as_list)
        .filter(|list| list.first().and_then(Sexpr::as_sym) == Some(name))
        .collect()
}

/// An S-expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexpr {
    /// Unquoted identifier
    Symbol(String),
    /// Quoted text, escapes resolved
    String(String),
    Int(i64),
    Float(f64),
    List(Vec<Sexpr>),
}

impl Sexpr {
    /// Symbol or string content.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(s) | Sexpr::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Sexpr::String(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce a number atom into f64.
    ///
    /// KiCad writes whole numbers as ints and everything else as floats.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Sexpr::Int(n) => Some(*n as f64),
            Sexpr::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match self {
            Sexpr::List(items) => Some(items),
            _ => None,
        }
    }

    /// The leading symbol of a list, e.g. `sheet` for `(sheet ...)`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()?.first()?.as_sym()
    }

    /// Find a child list with the given name (first element)
    pub fn find_list(&self, name: &str) -> Option<&[Sexpr]> {
        find_child_list(self.as_list()?, name)
    }

    /// Find all child lists with the given name
    pub fn find_all_lists(&self, name: &str) -> Vec<&[Sexpr]> {
        self.as_list()
            .map(|items| find_all_child_lists(items, name))
            .unwrap_or_default()
    }
}

/// Errors that can occur during parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnexpectedEof,
    UnexpectedClose(usize),
    UnclosedList(usize),
    UnterminatedString(usize),
    TrailingInput(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedEof => write!(f, "Unexpected end of input"),
            ParseError::UnexpectedClose(at) => write!(f, "Unexpected ')' at byte {at}"),
            ParseError::UnclosedList(at) => write!(f, "List opened at byte {at} is never closed"),
            ParseError::UnterminatedString(at) => {
                write!(f, "String starting at byte {at} is never terminated")
            }
            ParseError::TrailingInput(at) => write!(f, "Unexpected input after byte {at}"),
        }
    }
}

impl std::error::Error for ParseError {}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == ';' {
                while let Some(ch) = self.bump() {
                    if ch == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn node(&mut self) -> Result<Sexpr, ParseError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(ParseError::UnexpectedEof),
            Some('(') => self.list(),
            Some(')') => Err(ParseError::UnexpectedClose(self.pos)),
            Some('"') => self.string(),
            Some(_) => Ok(self.atom()),
        }
    }

    fn list(&mut self) -> Result<Sexpr, ParseError> {
        let start = self.pos;
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(ParseError::UnclosedList(start)),
                Some(')') => {
                    self.bump();
                    break;
                }
                Some(_) => items.push(self.node()?),
            }
        }
        Ok(Sexpr::List(items))
    }

    fn string(&mut self) -> Result<Sexpr, ParseError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString(start)),
                Some('"') => return Ok(Sexpr::String(out)),
                Some('\\') => match self.bump() {
                    None => return Err(ParseError::UnterminatedString(start)),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                },
                Some(ch) => out.push(ch),
            }
        }
    }

    fn atom(&mut self) -> Sexpr {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }
            self.bump();
        }
        let text = &self.input[start..self.pos];
        if let Ok(n) = text.parse::<i64>() {
            Sexpr::Int(n)
        } else if let Ok(f) = text.parse::<f64>() {
            Sexpr::Float(f)
        } else {
            Sexpr::Symbol(text.to_string())
        }
    }
}

/// Parse a string holding exactly one S-expression.
pub fn parse(input: &str) -> Result<Sexpr, ParseError> {
    log::trace!("Parsing S-expression from {} bytes of input", input.len());
    let mut reader = Reader { input, pos: 0 };
    let node = reader.node()?;
    reader.skip_trivia();
    if reader.pos < input.len() {
        return Err(ParseError::TrailingInput(reader.pos));
    }
    Ok(node)
}
