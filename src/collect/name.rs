// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Collision-safe file naming.
//!
//! Every staged asset lands in a flat directory under a name derived from
//! something the operator did not control: font metadata, a vendor cache
//! identifier, a stock wallpaper name. This module turns such strings into
//! names that are valid on both Windows and Unix file systems, and picks a
//! destination path that never clobbers a file already sitting in the
//! destination directory.
//!
//! # Sanitization
//!
//! [`sanitize`] strips control and bidirectional-format characters, strips
//! characters Windows forbids in file names, collapses whitespace, drops
//! trailing dots and spaces, and caps the result at [`MAX_BASE_NAME_LEN`]
//! characters. Applying it to its own output changes nothing.
//!
//! # Resolution
//!
//! [`resolve`] probes `base.ext`, then `base-1.ext`, `base-2.ext`, and so on,
//! returning the first path that does not exist. It only looks; the caller
//! does the copy.

use std::path::{Path, PathBuf};

/// Upper bound on sanitized base name length, in characters.
pub const MAX_BASE_NAME_LEN: usize = 240;

/// Name used when sanitization leaves nothing behind.
pub const PLACEHOLDER_NAME: &str = "Unnamed";

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Make arbitrary text safe to use as a file base name.
///
/// Never returns an empty string, a string ending in `.` or space, a string
/// longer than [`MAX_BASE_NAME_LEN`] characters, or a string containing a
/// path separator or control character.
pub fn sanitize(name: impl AsRef<str>) -> String {
    let mut out = String::with_capacity(name.as_ref().len());
    let mut pending_space = false;

    for ch in name.as_ref().chars() {
        if is_stripped(ch) {
            continue;
        }

        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }

        // INVARIANT: Leading whitespace never makes it into the output.
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }

    let mut out = trim_trailing(&out).to_string();
    if out.chars().count() > MAX_BASE_NAME_LEN {
        out = out.chars().take(MAX_BASE_NAME_LEN).collect();

        // INVARIANT: Truncation can expose a trailing dot or space.
        out = trim_trailing(&out).to_string();
    }

    // INVARIANT: Checked after truncation, which can trim everything away.
    if out.is_empty() {
        return PLACEHOLDER_NAME.to_string();
    }

    out
}

/// Pick a destination path inside `directory` that does not exist yet.
///
/// The base name goes through [`sanitize`] first. The extension is used
/// verbatim and should carry its leading dot, or be empty.
///
/// Existence is checked without following symlinks, so a dangling link still
/// counts as taken.
pub fn resolve(directory: impl AsRef<Path>, base: impl AsRef<str>, extension: &str) -> PathBuf {
    let directory = directory.as_ref();
    let base = sanitize(base);

    let candidate = directory.join(format!("{base}{extension}"));
    if !is_taken(&candidate) {
        return candidate;
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = directory.join(format!("{base}-{counter}{extension}"));
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Extension of `path` with its leading dot, case preserved.
///
/// Empty when the path has no extension.
pub fn dotted_extension(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// File name of `path` with its extension removed.
pub fn file_stem(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_stripped(ch: char) -> bool {
    ch.is_control() || is_bidi_format(ch) || FORBIDDEN.contains(&ch)
}

fn is_bidi_format(ch: char) -> bool {
    matches!(
        ch,
        '\u{061C}'
            | '\u{200E}'
            | '\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
    )
}

fn trim_trailing(name: &str) -> &str {
    name.trim_end_matches(['.', ' '])
}

fn is_taken(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
