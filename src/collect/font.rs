// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Font metadata and display name derivation.
//!
//! Cloud font caches store files under opaque identifiers, so the collector
//! reads each font's naming table to recover a `Family-Face` name that sorts
//! sensibly in a flat directory. Metadata is a best effort: when a font cannot
//! be read, the file's own name is used instead.
//!
//! # Family Selection
//!
//! The legacy family name (name ID 1) is what operating systems show in font
//! pickers, so it wins over the typographic family (name ID 16). English
//! records are preferred; any decodable record is the last resort. The style
//! string always comes from the record set that supplied the family, which
//! keeps `Segoe UI Semibold` from turning into `Segoe UI Semibold-Semibold`.
//!
//! # Face Labels
//!
//! Generic style strings (`Regular`, `Bold`, `Italic`, `Bold Italic`,
//! `Normal`) are unreliable in the wild, so they are recomputed from the
//! numeric weight and italic flag into one of four [`FaceLabel`] tokens.
//! Anything more specific is kept as written.

use crate::collect::name::{file_stem, sanitize};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read,
    path::Path,
};
use tracing::{debug, instrument};
use ttf_parser::{name_id, Face, PlatformId};

/// Weight at and above which a face counts as bold.
pub const BOLD_WEIGHT: u16 = 700;

const GENERIC_STYLES: &[&str] = &["Regular", "Italic", "Bold", "Bold Italic", "Normal"];
const WINDOWS_US_ENGLISH: u16 = 0x0409;
const MACINTOSH_ENGLISH: u16 = 0;

/// Naming metadata read from a font file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FontDescriptor {
    /// Family name.
    pub family: String,

    /// Normalized style designator within the family.
    pub face_label: Option<String>,
}

impl FontDescriptor {
    /// Construct new font descriptor.
    pub fn new(family: impl Into<String>, face_label: Option<String>) -> Self {
        Self {
            family: family.into(),
            face_label,
        }
    }
}

/// Canonical face label derived from weight and slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceLabel {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FaceLabel {
    /// Classify numeric weight and italic flag.
    pub fn from_metrics(weight: u16, italic: bool) -> Self {
        match (weight >= BOLD_WEIGHT, italic) {
            (false, false) => Self::Regular,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (true, true) => Self::BoldItalic,
        }
    }
}

impl Display for FaceLabel {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Self::Regular => "Regular",
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::BoldItalic => "BoldItalic",
        };
        fmt.write_str(label)
    }
}

/// Normalize a raw style string.
///
/// Empty or generic styles are recomputed from `weight` and `italic`.
/// Anything else has its whitespace collapsed and `Bold Italic` joined into
/// `BoldItalic`.
pub fn normalize_face_label(raw: &str, weight: u16, italic: bool) -> String {
    let raw = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let generic = GENERIC_STYLES
        .iter()
        .any(|style| style.eq_ignore_ascii_case(&raw));

    if raw.is_empty() || generic {
        return FaceLabel::from_metrics(weight, italic).to_string();
    }

    raw.replace("Bold Italic", "BoldItalic")
}

/// Derive the staged base name for a font file.
///
/// Produces `Family-Face` when a descriptor is available, `Family-Regular`
/// when its face is missing or regular, and the source file stem otherwise.
/// The result is always sanitized.
pub fn derive_base_name(descriptor: Option<&FontDescriptor>, source: impl AsRef<Path>) -> String {
    let raw = match descriptor {
        Some(FontDescriptor {
            family,
            face_label: Some(face),
        }) if face != "Regular" => format!("{family}-{face}"),
        Some(FontDescriptor { family, .. }) => format!("{family}-Regular"),
        None => file_stem(source),
    };

    sanitize(raw)
}

/// Source of font naming metadata.
pub trait FontProbe {
    /// Whether metadata extraction works on this system at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Read naming metadata from a font file.
    ///
    /// Return `None` for anything that cannot be described. Failing here is
    /// expected, and callers fall back to the file name.
    fn describe(&self, path: &Path) -> Option<FontDescriptor>;
}

/// Font probe that reads sfnt naming tables through `ttf-parser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TtfProbe;

impl TtfProbe {
    /// Construct new naming table probe.
    pub fn new() -> Self {
        Self
    }
}

impl FontProbe for TtfProbe {
    #[instrument(skip(self), level = "debug")]
    fn describe(&self, path: &Path) -> Option<FontDescriptor> {
        let data = match read(path) {
            Ok(data) => data,
            Err(err) => {
                debug!("cannot read {:?}: {err}", path.display());
                return None;
            }
        };

        let face = match Face::parse(&data, 0) {
            Ok(face) => face,
            Err(err) => {
                debug!("cannot parse {:?}: {err}", path.display());
                return None;
            }
        };

        let (family, style) = family_and_style(&face)?;
        let face_label = normalize_face_label(
            style.as_deref().unwrap_or_default(),
            face.weight().to_number(),
            face.is_italic(),
        );

        Some(FontDescriptor::new(family, Some(face_label)))
    }
}

/// Font probe for systems where metadata extraction is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMetadata;

impl FontProbe for NoMetadata {
    fn is_available(&self) -> bool {
        false
    }

    fn describe(&self, _path: &Path) -> Option<FontDescriptor> {
        None
    }
}

fn family_and_style(face: &Face<'_>) -> Option<(String, Option<String>)> {
    if let Some(family) = find_name(face, name_id::FAMILY, |name| {
        name.platform_id == PlatformId::Windows && name.language_id == WINDOWS_US_ENGLISH
    }) {
        return Some((family, find_name(face, name_id::SUBFAMILY, is_english)));
    }

    if let Some(family) = find_name(face, name_id::TYPOGRAPHIC_FAMILY, is_english) {
        let style = find_name(face, name_id::TYPOGRAPHIC_SUBFAMILY, is_english)
            .or_else(|| find_name(face, name_id::SUBFAMILY, is_english));
        return Some((family, style));
    }

    for id in [name_id::FAMILY, name_id::TYPOGRAPHIC_FAMILY] {
        if let Some(family) = find_name(face, id, |_| true) {
            return Some((family, find_name(face, name_id::SUBFAMILY, |_| true)));
        }
    }

    None
}

fn find_name<F>(face: &Face<'_>, id: u16, accept: F) -> Option<String>
where
    F: Fn(&ttf_parser::name::Name<'_>) -> bool,
{
    face.names()
        .into_iter()
        .filter(|name| name.name_id == id && accept(name))
        .filter_map(|name| name.to_string())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn is_english(name: &ttf_parser::name::Name<'_>) -> bool {
    match name.platform_id {
        PlatformId::Windows => name.language_id == WINDOWS_US_ENGLISH,
        PlatformId::Macintosh => name.language_id == MACINTOSH_ENGLISH,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case(700, false, "Bold"; "bold")]
    #[test_case(400, true, "Italic"; "italic")]
    #[test_case(400, false, "Regular"; "regular")]
    #[test_case(700, true, "BoldItalic"; "bold italic")]
    #[test_case(900, false, "Bold"; "black counts as bold")]
    #[test_case(600, false, "Regular"; "semibold is not bold")]
    #[test]
    fn face_label_from_metrics(weight: u16, italic: bool, expect: &str) {
        pretty_assertions::assert_eq!(FaceLabel::from_metrics(weight, italic).to_string(), expect);
    }

    #[test_case("Regular", 700, false, "Bold"; "generic regular recomputed")]
    #[test_case("Bold Italic", 400, false, "Regular"; "generic bold italic recomputed")]
    #[test_case("Normal", 400, true, "Italic"; "normal recomputed")]
    #[test_case("", 700, true, "BoldItalic"; "empty recomputed")]
    #[test_case("Semibold", 600, false, "Semibold"; "specific kept")]
    #[test_case("  Light   Condensed ", 300, false, "Light Condensed"; "whitespace normalized")]
    #[test_case("Condensed Bold Italic", 700, true, "Condensed BoldItalic"; "bold italic joined")]
    #[test]
    fn face_label_normalization(raw: &str, weight: u16, italic: bool, expect: &str) {
        pretty_assertions::assert_eq!(normalize_face_label(raw, weight, italic), expect);
    }

    #[test]
    fn base_name_with_face() {
        let descriptor = FontDescriptor::new("Arial", Some("Bold".into()));
        let result = derive_base_name(Some(&descriptor), "C:/cache/x1.ttf");
        assert_eq!(result, "Arial-Bold");
    }

    #[test]
    fn base_name_with_regular_face() {
        let descriptor = FontDescriptor::new("Arial", Some("Regular".into()));
        let result = derive_base_name(Some(&descriptor), "C:/cache/x1.ttf");
        assert_eq!(result, "Arial-Regular");
    }

    #[test]
    fn base_name_without_face() {
        let descriptor = FontDescriptor::new("Arial", None);
        let result = derive_base_name(Some(&descriptor), "C:/cache/x1.ttf");
        assert_eq!(result, "Arial-Regular");
    }

    #[test]
    fn base_name_without_descriptor() {
        let result = derive_base_name(None, "cache/mystery.ttf");
        assert_eq!(result, "mystery");
    }

    #[test]
    fn base_name_is_sanitized() {
        let descriptor = FontDescriptor::new("Weird/Font ", Some("Bold".into()));
        let result = derive_base_name(Some(&descriptor), "x.ttf");
        assert_eq!(result, "WeirdFont -Bold");
    }

    #[test]
    fn ttf_probe_rejects_garbage() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"definitely not a font")?;
        assert_eq!(TtfProbe::new().describe(&path), None);
        assert_eq!(TtfProbe::new().describe(&dir.path().join("missing.ttf")), None);

        Ok(())
    }
}
