// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shell-style variable file editing.
//!
//! Files like `/etc/default/grub` and `/etc/os-release` are lists of
//! `KEY=value` assignments mixed with comments. Patching them with pattern
//! substitution is fragile, so [`ShellVars`] parses the file into lines,
//! lets callers update named keys, and writes everything else back exactly
//! as it was read.
//!
//! # Supported Syntax
//!
//! An assignment is a line of the form `KEY=value`, `KEY="value"`, or
//! `KEY='value'`, optionally prefixed with `export`. Everything else,
//! including commented-out assignments, is carried through verbatim. When a
//! key is assigned more than once, the last assignment wins, matching how a
//! shell would source the file.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Quote style of an assigned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Assignment {
        key: String,
        value: String,
        quote: Quote,
        raw: Option<String>,
    },
    Other(String),
}

/// Editor for `KEY=value` files.
///
/// # Invariant
///
/// - Lines that were never touched serialize byte-for-byte as read.
/// - Setting a key to its current value is not a change.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShellVars {
    lines: Vec<Line>,
    trailing_newline: bool,
    changed: bool,
}

impl ShellVars {
    /// Construct new empty editor.
    pub fn new() -> Self {
        Self {
            trailing_newline: true,
            ..Self::default()
        }
    }

    /// Value of last assignment to key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Assignment {
                key: name, value, ..
            } if name == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Assign value to key.
    ///
    /// Rewrites the last assignment of the key in place, keeping its quote
    /// style, or appends a new assignment at the end of the file.
    pub fn set(&mut self, key: &str, new_value: impl Into<String>) {
        let new_value = new_value.into();
        match self.position(key) {
            Some(index) => {
                if let Line::Assignment {
                    value, quote, raw, ..
                } = &mut self.lines[index]
                {
                    if *value == new_value {
                        return;
                    }

                    if *quote == Quote::None && needs_quotes(&new_value) {
                        *quote = Quote::Double;
                    }
                    *value = new_value;
                    *raw = None;
                    self.changed = true;
                }
            }
            None => {
                let quote = if needs_quotes(&new_value) {
                    Quote::Double
                } else {
                    Quote::None
                };
                self.lines.push(Line::Assignment {
                    key: key.to_string(),
                    value: new_value,
                    quote,
                    raw: None,
                });
                self.changed = true;
            }
        }
    }

    /// Add a token to a space-delimited value unless already present.
    ///
    /// Creates the key when missing.
    pub fn insert_token(&mut self, key: &str, token: &str) {
        let current = self.get(key).unwrap_or_default();
        if current.split_whitespace().any(|existing| existing == token) {
            return;
        }

        let updated = if current.trim().is_empty() {
            token.to_string()
        } else {
            format!("{} {token}", current.trim_end())
        };
        self.set(key, updated);
    }

    /// Check if any edit modified the file.
    pub fn changed(&self) -> bool {
        self.changed
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.lines
            .iter()
            .rposition(|line| matches!(line, Line::Assignment { key: name, .. } if name == key))
    }
}

impl From<&str> for ShellVars {
    fn from(content: &str) -> Self {
        let lines = content.lines().map(parse_line).collect();

        Self {
            lines,
            trailing_newline: content.is_empty() || content.ends_with('\n'),
            changed: false,
        }
    }
}

impl Display for ShellVars {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let mut out = String::new();
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }

            match line {
                Line::Other(text) => out.push_str(text),
                Line::Assignment { raw: Some(raw), .. } => out.push_str(raw),
                Line::Assignment {
                    key, value, quote, ..
                } => {
                    out.push_str(key);
                    out.push('=');
                    match quote {
                        Quote::None => out.push_str(value),
                        Quote::Single => {
                            out.push('\'');
                            out.push_str(value);
                            out.push('\'');
                        }
                        Quote::Double => {
                            out.push('"');
                            out.push_str(&value.replace('\\', "\\\\").replace('"', "\\\""));
                            out.push('"');
                        }
                    }
                }
            }
        }

        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }

        write!(fmt, "{out}")
    }
}

fn parse_line(line: &str) -> Line {
    let other = || Line::Other(line.to_string());
    let body = line.trim_start();
    let body = body.strip_prefix("export ").unwrap_or(body).trim_start();

    let Some((key, rest)) = body.split_once('=') else {
        return other();
    };

    if key.is_empty() || !key.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return other();
    }

    let rest = rest.trim_end();
    let (value, quote) = if let Some(inner) = strip_quotes(rest, '"') {
        (inner.replace("\\\"", "\"").replace("\\\\", "\\"), Quote::Double)
    } else if let Some(inner) = strip_quotes(rest, '\'') {
        (inner.to_string(), Quote::Single)
    } else {
        (rest.to_string(), Quote::None)
    };

    Line::Assignment {
        key: key.to_string(),
        value,
        quote,
        raw: Some(line.to_string()),
    }
}

fn strip_quotes(text: &str, quote: char) -> Option<&str> {
    text.strip_prefix(quote)?.strip_suffix(quote)
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '"' | '\'' | '$' | '`' | '\\' | '#' | ';'))
}
