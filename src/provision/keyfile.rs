// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Sectioned key file editing.
//!
//! AccountsService keeps one record per user under
//! `/var/lib/AccountsService/users/<name>`, written as an INI-style key file
//! with a `[User]` section. [`KeyFile`] edits named keys while carrying every
//! other line through untouched.

use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Section(String),
    Entry { key: String, value: String },
    Other(String),
}

/// Editor for INI-style key files.
///
/// # Invariant
///
/// - Setting a key to its current value is not a change.
/// - New keys land at the end of their section.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyFile {
    lines: Vec<Line>,
    changed: bool,
}

impl KeyFile {
    /// Construct new empty key file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of key in section.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let (start, end) = self.section_bounds(section)?;
        self.lines[start..end].iter().find_map(|line| match line {
            Line::Entry { key: name, value } if name == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Assign value to key in section.
    ///
    /// Creates the section at the end of the file when missing.
    pub fn set(&mut self, section: &str, key: &str, new_value: impl Into<String>) {
        let new_value = new_value.into();
        let entry = Line::Entry {
            key: key.to_string(),
            value: new_value.clone(),
        };

        let Some((start, end)) = self.section_bounds(section) else {
            if !self.lines.is_empty() && !matches!(self.lines.last(), Some(Line::Other(text)) if text.is_empty()) {
                self.lines.push(Line::Other(String::new()));
            }
            self.lines.push(Line::Section(section.to_string()));
            self.lines.push(entry);
            self.changed = true;
            return;
        };

        for line in &mut self.lines[start..end] {
            if let Line::Entry { key: name, value } = line {
                if name == key {
                    if *value != new_value {
                        *value = new_value;
                        self.changed = true;
                    }
                    return;
                }
            }
        }

        // INVARIANT: Insert after last entry, before any trailing blank lines.
        let insert_at = self.lines[start..end]
            .iter()
            .rposition(|line| !matches!(line, Line::Other(text) if text.trim().is_empty()))
            .map_or(end, |offset| start + offset + 1);
        self.lines.insert(insert_at, entry);
        self.changed = true;
    }

    /// Check if any edit modified the file.
    pub fn changed(&self) -> bool {
        self.changed
    }

    // Range of lines after the section header up to the next header.
    fn section_bounds(&self, section: &str) -> Option<(usize, usize)> {
        let header = self
            .lines
            .iter()
            .position(|line| matches!(line, Line::Section(name) if name == section))?;
        let start = header + 1;
        let end = self.lines[start..]
            .iter()
            .position(|line| matches!(line, Line::Section(_)))
            .map_or(self.lines.len(), |offset| start + offset);

        Some((start, end))
    }
}

impl From<&str> for KeyFile {
    fn from(content: &str) -> Self {
        let lines = content
            .lines()
            .map(|line| {
                let trimmed = line.trim();
                if let Some(name) = trimmed.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                    return Line::Section(name.to_string());
                }

                if trimmed.starts_with(['#', ';']) {
                    return Line::Other(line.to_string());
                }

                match line.split_once('=') {
                    Some((key, value)) if !key.trim().is_empty() => Line::Entry {
                        key: key.trim().to_string(),
                        value: value.trim().to_string(),
                    },
                    _ => Line::Other(line.to_string()),
                }
            })
            .collect();

        Self {
            lines,
            changed: false,
        }
    }
}

impl Display for KeyFile {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        for line in &self.lines {
            match line {
                Line::Section(name) => writeln!(fmt, "[{name}]")?,
                Line::Entry { key, value } => writeln!(fmt, "{key}={value}")?,
                Line::Other(text) => writeln!(fmt, "{text}")?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const RECORD: &str = indoc! {r#"
        [User]
        Session=
        Icon=/home/blah/.face
        SystemAccount=false

        [InputSource0]
        xkb=us
    "#};

    #[test]
    fn untouched_record_round_trips() {
        let record = KeyFile::from(RECORD);
        assert_eq!(record.to_string(), RECORD);
        assert_eq!(record.get("User", "Icon"), Some("/home/blah/.face"));
        assert_eq!(record.get("User", "xkb"), None);
        assert_eq!(record.get("InputSource0", "xkb"), Some("us"));
    }

    #[test]
    fn set_existing_and_new_keys() {
        let mut record = KeyFile::from(RECORD);
        record.set("User", "Icon", "/var/lib/AccountsService/icons/blah");
        record.set("User", "Languages", "en_US.UTF-8;");

        let expect = indoc! {r#"
            [User]
            Session=
            Icon=/var/lib/AccountsService/icons/blah
            SystemAccount=false
            Languages=en_US.UTF-8;

            [InputSource0]
            xkb=us
        "#};
        assert_eq!(record.to_string(), expect);
        assert!(record.changed());
    }

    #[test]
    fn setting_current_value_is_no_op() {
        let mut record = KeyFile::from(RECORD);
        record.set("User", "SystemAccount", "false");
        assert!(!record.changed());
        assert_eq!(record.to_string(), RECORD);
    }

    #[test]
    fn missing_section_is_created() {
        let mut record = KeyFile::new();
        record.set("User", "Icon", "/var/lib/AccountsService/icons/blah");
        assert_eq!(
            record.to_string(),
            "[User]\nIcon=/var/lib/AccountsService/icons/blah\n"
        );

        let mut record = KeyFile::from("[InputSource0]\nxkb=us\n");
        record.set("User", "Session", "gnome");
        assert_eq!(
            record.to_string(),
            "[InputSource0]\nxkb=us\n\n[User]\nSession=gnome\n"
        );
    }
}
