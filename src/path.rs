// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! Dotted namespace paths.
//!
//! A path is a sequence of segments separated by `.`. A segment may be quoted
//! with backticks, in which case it may contain dots; a literal backtick inside
//! a quoted segment is written twice:
//!
//! ```text
//! dfs.tmp.orders          => ["dfs", "tmp", "orders"]
//! `dfs.tmp`.orders        => ["dfs.tmp", "orders"]
//! `a``b`                  => ["a`b"]
//! ```

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;

/// A parsed namespace path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaPath {
    segments: Vec<String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsePathError {
    #[error("empty path")]
    Empty,
    #[error("empty segment at position {0}")]
    EmptySegment(usize),
    #[error("unterminated quoted segment starting at position {0}")]
    Unterminated(usize),
    #[error("unexpected character {1:?} at position {0}")]
    UnexpectedChar(usize, char),
}

impl SchemaPath {
    /// Creates a single-segment path. The name is taken verbatim, dots included.
    pub fn simple(name: impl Into<String>) -> Self {
        SchemaPath {
            segments: vec![name.into()],
        }
    }

    /// Parses a dotted path, honoring backtick quoting.
    pub fn parse(s: &str) -> Result<Self, ParsePathError> {
        if s.trim().is_empty() {
            return Err(ParsePathError::Empty);
        }
        let mut segments = vec![];
        let mut chars = s.char_indices().peekable();
        loop {
            let start = chars.peek().map_or(s.len(), |(i, _)| *i);
            let segment = match chars.peek() {
                Some((_, '`')) => {
                    chars.next();
                    let mut quoted = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '`')) => {
                                if let Some((_, '`')) = chars.peek() {
                                    chars.next();
                                    quoted.push('`');
                                } else {
                                    break;
                                }
                            }
                            Some((_, c)) => quoted.push(c),
                            None => return Err(ParsePathError::Unterminated(start)),
                        }
                    }
                    quoted
                }
                _ => {
                    let mut plain = String::new();
                    while let Some((i, c)) = chars.peek().copied() {
                        match c {
                            '.' => break,
                            '`' => return Err(ParsePathError::UnexpectedChar(i, c)),
                            _ => {
                                plain.push(c);
                                chars.next();
                            }
                        }
                    }
                    let plain = plain.trim().to_string();
                    if plain.is_empty() {
                        return Err(ParsePathError::EmptySegment(start));
                    }
                    plain
                }
            };
            segments.push(segment);
            match chars.next() {
                None => break,
                Some((_, '.')) => {
                    if chars.peek().is_none() {
                        return Err(ParsePathError::EmptySegment(s.len()));
                    }
                }
                Some((i, c)) => return Err(ParsePathError::UnexpectedChar(i, c)),
            }
        }
        Ok(SchemaPath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The first segment of the path.
    pub fn root_segment(&self) -> &str {
        &self.segments[0]
    }

    /// The last segment of the path.
    pub fn last_segment(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// All segments but the last one.
    pub fn parent_segments(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }

    /// Renders the path with every segment quoted, so that it parses back to itself.
    pub fn to_expr(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("`{}`", s.replace('`', "``")))
            .join(".")
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_expr())
    }
}

impl FromStr for SchemaPath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Splits an unquoted schema name such as `dfs.tmp` on dots.
pub fn schema_path_as_list(name: &str) -> Vec<&str> {
    name.split('.').collect()
}
