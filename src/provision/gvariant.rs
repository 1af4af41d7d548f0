// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! GVariant text for strings and string arrays.
//!
//! Desktop configuration keys are read and written as GVariant text, the
//! format `gsettings get` prints and `gsettings set` accepts. Only the two
//! shapes the provisioning steps touch are handled here: a single string
//! (`'value'`) and an array of strings (`['a', 'b']`, or `@as []` when
//! empty).

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    iter::Peekable,
    str::{Chars, FromStr},
};

/// Quote a string as GVariant text.
pub fn quote(value: impl AsRef<str>) -> String {
    let mut out = String::with_capacity(value.as_ref().len() + 2);
    out.push('\'');
    for ch in value.as_ref().chars() {
        if matches!(ch, '\'' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Parse a single GVariant string.
///
/// # Errors
///
/// - Return [`ParseError`] if text is not exactly one quoted string.
pub fn unquote(text: impl AsRef<str>) -> Result<String> {
    let text = text.as_ref().trim();
    let mut chars = text.chars().peekable();
    let value = parse_string(&mut chars, text)?;
    if chars.next().is_some() {
        return Err(ParseError::new(text, "trailing characters after string"));
    }

    Ok(value)
}

/// Ordered list of strings, e.g., dock favorites.
///
/// # Invariant
///
/// - Insertion never reorders or duplicates existing entries.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StrList {
    items: Vec<String>,
    changed: bool,
}

impl StrList {
    /// Construct new empty string list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append item unless already present.
    pub fn insert(&mut self, item: impl Into<String>) {
        let item = item.into();
        if !self.items.contains(&item) {
            self.items.push(item);
            self.changed = true;
        }
    }

    /// Append each item that is not present yet.
    pub fn insert_all(&mut self, items: impl IntoIterator<Item = impl Into<String>>) {
        for item in items {
            self.insert(item);
        }
    }

    /// Check if any insertion modified the list.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Current items in order.
    pub fn items(&self) -> &[String] {
        &self.items
    }
}

impl FromStr for StrList {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let body = trimmed.strip_prefix("@as").unwrap_or(trimmed).trim_start();
        let mut chars = body.chars().peekable();

        if chars.next() != Some('[') {
            return Err(ParseError::new(text, "expected '['"));
        }

        let mut items = Vec::new();
        loop {
            skip_whitespace(&mut chars);
            match chars.peek() {
                Some(']') if items.is_empty() => {
                    chars.next();
                    break;
                }
                Some(_) => items.push(parse_string(&mut chars, text)?),
                None => return Err(ParseError::new(text, "unterminated array")),
            }

            skip_whitespace(&mut chars);
            match chars.next() {
                Some(',') => continue,
                Some(']') => break,
                _ => return Err(ParseError::new(text, "expected ',' or ']'")),
            }
        }

        skip_whitespace(&mut chars);
        if chars.next().is_some() {
            return Err(ParseError::new(text, "trailing characters after array"));
        }

        Ok(Self {
            items,
            changed: false,
        })
    }
}

impl Display for StrList {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        if self.items.is_empty() {
            return fmt.write_str("@as []");
        }

        let items = self.items.iter().map(quote).collect::<Vec<_>>();
        write!(fmt, "[{}]", items.join(", "))
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|ch| ch.is_whitespace()).is_some() {}
}

fn parse_string(chars: &mut Peekable<Chars<'_>>, text: &str) -> Result<String> {
    let delimiter = match chars.next() {
        Some(ch @ ('\'' | '"')) => ch,
        _ => return Err(ParseError::new(text, "expected quoted string")),
    };

    let mut value = String::new();
    loop {
        match chars.next() {
            Some('\\') => match chars.next() {
                Some(ch) => value.push(ch),
                None => return Err(ParseError::new(text, "dangling escape")),
            },
            Some(ch) if ch == delimiter => return Ok(value),
            Some(ch) => value.push(ch),
            None => return Err(ParseError::new(text, "unterminated string")),
        }
    }
}

/// Malformed GVariant text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse GVariant {text:?}: {reason}")]
pub struct ParseError {
    text: String,
    reason: &'static str,
}

impl ParseError {
    fn new(text: &str, reason: &'static str) -> Self {
        Self {
            text: text.to_string(),
            reason,
        }
    }
}

/// Friendly result alias :3
type Result<T, E = ParseError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("@as []", &[]; "typed empty")]
    #[test_case("[]", &[]; "untyped empty")]
    #[test_case("['a.desktop']", &["a.desktop"]; "single")]
    #[test_case("['a.desktop', \"b.desktop\"]\n", &["a.desktop", "b.desktop"]; "mixed quotes")]
    #[test_case("['it\\'s']", &["it's"]; "escaped quote")]
    #[test]
    fn parse_string_list(text: &str, expect: &[&str]) {
        let result: StrList = text.parse().unwrap();
        pretty_assertions::assert_eq!(result.items(), expect);
    }

    #[test_case("'a'"; "no brackets")]
    #[test_case("['a'"; "unterminated")]
    #[test_case("['a' 'b']"; "missing comma")]
    #[test_case("['a',]"; "trailing comma")]
    #[test_case("['a'] x"; "trailing garbage")]
    #[test]
    fn reject_malformed_list(text: &str) {
        assert!(text.parse::<StrList>().is_err());
    }

    #[test]
    fn insertion_preserves_order() -> anyhow::Result<()> {
        let mut list: StrList = "['firefox-esr.desktop', 'org.gnome.Nautilus.desktop']".parse()?;
        list.insert_all(["org.gnome.Terminal.desktop", "firefox-esr.desktop"]);
        assert!(list.changed());
        assert_eq!(
            list.to_string(),
            "['firefox-esr.desktop', 'org.gnome.Nautilus.desktop', 'org.gnome.Terminal.desktop']"
        );

        Ok(())
    }

    #[test]
    fn insertion_of_present_items_is_no_op() -> anyhow::Result<()> {
        let mut list: StrList = "['a', 'b']".parse()?;
        list.insert_all(["b", "a"]);
        assert!(!list.changed());

        Ok(())
    }

    #[test]
    fn empty_list_is_typed() {
        assert_eq!(StrList::new().to_string(), "@as []");
    }

    #[test]
    fn quote_and_unquote() -> anyhow::Result<()> {
        assert_eq!(quote("file:///it's"), r"'file:///it\'s'");
        assert_eq!(unquote(r"'file:///it\'s'")?, "file:///it's");
        assert_eq!(unquote("\"Adwaita\"\n")?, "Adwaita");
        assert!(unquote("'a' 'b'").is_err());

        Ok(())
    }
}
