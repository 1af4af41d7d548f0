// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Asset collection.
//!
//! The __asset collector__ exports fonts and wallpapers from a Windows
//! installation into a flat directory tree that the provisioning side can
//! consume later on a fresh Debian system.
//!
//! # Staged Asset Layout
//!
//! Every source __category__ owns one flat leaf directory under the
//! destination root:
//!
//! - `Fonts/Cloud Fonts`: fonts pulled from the cloud font cache. The cache
//!   nests files under opaque identifiers, so the whole tree is walked and
//!   each font is renamed to `Family-Face` from its naming table.
//! - `Fonts/Windows Fonts`: fonts from the system font directory. Only the
//!   top level is read, and original file names are kept since the system
//!   already names them sensibly.
//! - `Wallpaper`: stock wallpapers, walked recursively, original names kept.
//!
//! Names inside a leaf directory are always unique. Collisions get a numeric
//! suffix through [`name::resolve`], so running the collector twice yields a
//! second set of `-1` files rather than overwriting the first set.
//!
//! # Failure Handling
//!
//! Missing source roots, unreadable files, and unparsable fonts never stop a
//! run. Each problem is logged and recorded in the [`CollectReport`], and the
//! collector moves on to the next file.
//!
//! # See Also
//!
//! 1. [`font`]
//! 2. [`name`]

pub mod font;
pub mod name;

use crate::collect::font::{derive_base_name, FontProbe, TtfProbe};

use ignore::WalkBuilder;
use indicatif::ProgressBar;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{remove_file, File, OpenOptions},
    io::copy,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Kind of asset source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Vendor cache of downloaded fonts.
    CloudFonts,

    /// Operating system font directory.
    SystemFonts,

    /// Stock desktop wallpapers.
    Wallpapers,
}

impl Category {
    /// Every category, in collection order.
    pub const ALL: [Category; 3] = [Self::CloudFonts, Self::SystemFonts, Self::Wallpapers];

    /// Leaf directory relative to the destination root.
    pub fn destination(&self) -> PathBuf {
        match self {
            Self::CloudFonts => Path::new("Fonts").join("Cloud Fonts"),
            Self::SystemFonts => Path::new("Fonts").join("Windows Fonts"),
            Self::Wallpapers => PathBuf::from("Wallpaper"),
        }
    }

    /// Eligible file extensions, lowercase and without dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::CloudFonts => &["ttf", "otf"],
            Self::SystemFonts => &["ttf", "otf", "ttc", "otc", "fon", "fnt"],
            Self::Wallpapers => &["jpg", "jpeg", "png", "bmp", "jfif", "webp"],
        }
    }

    /// Whether subdirectories of the source root are walked.
    pub fn is_recursive(&self) -> bool {
        !matches!(self, Self::SystemFonts)
    }

    /// Whether staged names come from font metadata.
    pub fn uses_metadata(&self) -> bool {
        matches!(self, Self::CloudFonts)
    }

    /// Check if path has an eligible extension, ignoring case.
    pub fn accepts(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions().contains(&ext.as_str()))
    }
}

impl Display for Category {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Self::CloudFonts => "cloud fonts",
            Self::SystemFonts => "system fonts",
            Self::Wallpapers => "wallpapers",
        };
        fmt.write_str(label)
    }
}

/// One file queued for staging.
///
/// The source is only ever read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
    /// Original file location.
    pub source: PathBuf,

    /// Sanitized display name without extension.
    pub base_name: String,

    /// Extension with leading dot, case as found.
    pub extension: String,
}

/// Successful copy of a staged asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Copied {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Outcome of a collection run.
#[derive(Debug, Default)]
pub struct CollectReport {
    /// Files copied, in processing order.
    pub copied: Vec<Copied>,

    /// Per-file problems that were skipped over.
    pub failures: Vec<CollectError>,

    /// Source roots that did not exist.
    pub skipped: Vec<PathBuf>,
}

impl CollectReport {
    /// Check if the run finished without any per-file failure.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn absorb(&mut self, other: CollectReport) {
        self.copied.extend(other.copied);
        self.failures.extend(other.failures);
        self.skipped.extend(other.skipped);
    }
}

/// Stage fonts and wallpapers into a flat destination tree.
///
/// Whether font metadata can be read is decided once, when the collector is
/// built, by asking its [`FontProbe`].
#[derive(Debug)]
pub struct AssetCollector<P = TtfProbe>
where
    P: FontProbe,
{
    destination_root: PathBuf,
    probe: P,
    metadata: bool,
}

impl<P> AssetCollector<P>
where
    P: FontProbe,
{
    /// Construct new asset collector.
    pub fn new(destination_root: impl Into<PathBuf>, probe: P) -> Self {
        let metadata = probe.is_available();
        if !metadata {
            warn!("font metadata unavailable, falling back to file names");
        }

        Self {
            destination_root: destination_root.into(),
            probe,
            metadata,
        }
    }

    /// Root of the staged asset tree.
    pub fn destination_root(&self) -> &Path {
        self.destination_root.as_path()
    }

    /// Whether font names are derived from metadata.
    pub fn has_metadata(&self) -> bool {
        self.metadata
    }

    /// List eligible files of a category under a source root.
    ///
    /// Walk errors for individual entries are returned alongside the assets
    /// so one unreadable directory does not hide the rest.
    ///
    /// # Errors
    ///
    /// - Return [`CollectError::MissingSource`] if `root` is not a directory.
    #[instrument(skip(self, root), level = "debug")]
    pub fn scan(
        &self,
        category: Category,
        root: impl AsRef<Path>,
    ) -> Result<(Vec<StagedAsset>, Vec<CollectError>)> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CollectError::MissingSource {
                category,
                root: root.to_path_buf(),
            });
        }

        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|lhs, rhs| lhs.cmp(rhs));
        if !category.is_recursive() {
            builder.max_depth(Some(1));
        }

        let mut assets = Vec::new();
        let mut failures = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("cannot read entry under {:?}: {err}", root.display());
                    failures.push(CollectError::Walk(err));
                    continue;
                }
            };

            let is_file = entry.file_type().is_some_and(|kind| kind.is_file());
            if !is_file || !category.accepts(entry.path()) {
                continue;
            }

            assets.push(self.describe(category, entry.path()));
        }

        debug!("found {} {category} under {:?}", assets.len(), root.display());
        Ok((assets, failures))
    }

    /// Build staged asset entry for one source file.
    pub fn describe(&self, category: Category, source: impl AsRef<Path>) -> StagedAsset {
        let source = source.as_ref();
        let descriptor = if category.uses_metadata() && self.metadata {
            self.probe.describe(source)
        } else {
            None
        };

        if category.uses_metadata() && self.metadata && descriptor.is_none() {
            debug!("no metadata for {:?}, using file name", source.display());
        }

        StagedAsset {
            source: source.to_path_buf(),
            base_name: derive_base_name(descriptor.as_ref(), source),
            extension: name::dotted_extension(source),
        }
    }

    /// Copy one staged asset into a destination directory.
    ///
    /// Picks a collision-free name, then copies file content only. The
    /// destination is opened with create-new semantics, so an existing file
    /// is never overwritten even if it appears between the probe and the
    /// copy.
    ///
    /// # Errors
    ///
    /// - Return [`CollectError::Copy`] if the copy fails.
    pub fn stage(&self, asset: &StagedAsset, directory: impl AsRef<Path>) -> Result<PathBuf> {
        let destination = name::resolve(directory, &asset.base_name, &asset.extension);
        copy_content(&asset.source, &destination).map_err(|err| CollectError::Copy {
            source: err,
            from: asset.source.clone(),
            to: destination.clone(),
        })?;

        Ok(destination)
    }

    /// Collect one category from a source root.
    ///
    /// Never fails as a whole. Everything that went wrong is in the report.
    #[instrument(skip(self, root, bar), level = "debug")]
    pub fn collect(
        &self,
        category: Category,
        root: impl AsRef<Path>,
        bar: &ProgressBar,
    ) -> CollectReport {
        let root = root.as_ref();
        let mut report = CollectReport::default();

        let (assets, failures) = match self.scan(category, root) {
            Ok(found) => found,
            Err(CollectError::MissingSource { .. }) => {
                warn!("{category} source {:?} not found, skipping", root.display());
                report.skipped.push(root.to_path_buf());
                return report;
            }
            Err(err) => {
                warn!("{err}");
                report.failures.push(err);
                return report;
            }
        };
        report.failures.extend(failures);

        if assets.is_empty() {
            info!("no {category} found under {:?}", root.display());
            return report;
        }

        let directory = self.destination_root.join(category.destination());
        if let Err(err) = mkdirp::mkdirp(&directory) {
            let err = CollectError::CreateDestination {
                source: err,
                path: directory,
            };
            warn!("{err}");
            report.failures.push(err);
            return report;
        }

        bar.inc_length(assets.len() as u64);
        bar.set_message(category.to_string());
        for asset in assets {
            match self.stage(&asset, &directory) {
                Ok(destination) => {
                    debug!(
                        "staged {:?} as {:?}",
                        asset.source.display(),
                        destination.display()
                    );
                    report.copied.push(Copied {
                        source: asset.source,
                        destination,
                    });
                }
                Err(err) => {
                    bar.suspend(|| warn!("{err}"));
                    report.failures.push(err);
                }
            }
            bar.inc(1);
        }

        info!(
            "staged {} {category} into {:?}",
            report.copied.len(),
            directory.display()
        );

        report
    }

    /// Collect every listed category in order.
    pub fn collect_all(
        &self,
        sources: impl IntoIterator<Item = (Category, PathBuf)>,
        bar: &ProgressBar,
    ) -> CollectReport {
        let mut report = CollectReport::default();
        for (category, root) in sources {
            report.absorb(self.collect(category, root, bar));
        }

        report
    }
}

fn copy_content(from: &Path, to: &Path) -> std::io::Result<u64> {
    let mut reader = File::open(from)?;
    let mut writer = OpenOptions::new().write(true).create_new(true).open(to)?;
    let copied = copy(&mut reader, &mut writer);

    // INVARIANT: Do not leave half-written files behind.
    if copied.is_err() {
        if let Err(err) = remove_file(to) {
            warn!("failed to remove partial copy {:?}: {err}", to.display());
        }
    }

    copied
}

/// Asset collection error types.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// Source root is absent.
    #[error("{category} source {:?} does not exist", root.display())]
    MissingSource { category: Category, root: PathBuf },

    /// Destination directory cannot be created.
    #[error("failed to create destination directory {:?}", path.display())]
    CreateDestination {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File content cannot be copied.
    #[error("failed to copy {:?} to {:?}", from.display(), to.display())]
    Copy {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },

    /// Directory entry cannot be read during traversal.
    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

/// Friendly result alias :3
pub type Result<T, E = CollectError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::font::{FontDescriptor, NoMetadata};
    use pretty_assertions::assert_eq;
    use std::{
        collections::HashMap,
        fs::{create_dir_all, read, read_dir, write},
    };

    #[derive(Debug, Default)]
    struct FixedProbe(HashMap<String, FontDescriptor>);

    impl FixedProbe {
        fn with(mut self, file_name: &str, family: &str, face: &str) -> Self {
            self.0.insert(
                file_name.into(),
                FontDescriptor::new(family, Some(face.into())),
            );
            self
        }
    }

    impl FontProbe for FixedProbe {
        fn describe(&self, path: &Path) -> Option<FontDescriptor> {
            let file_name = path.file_name()?.to_string_lossy().into_owned();
            self.0.get(&file_name).cloned()
        }
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names = read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn category_accepts_extensions_case_insensitively() {
        assert!(Category::CloudFonts.accepts("a/B.TTF"));
        assert!(Category::CloudFonts.accepts("a/b.otf"));
        assert!(!Category::CloudFonts.accepts("a/b.ttc"));
        assert!(Category::SystemFonts.accepts("C:/Windows/Fonts/SERIFE.FON"));
        assert!(Category::Wallpapers.accepts("img0.JFIF"));
        assert!(!Category::Wallpapers.accepts("notes.txt"));
        assert!(!Category::Wallpapers.accepts("jpg"));
    }

    #[test]
    fn only_eligible_files_are_copied() -> anyhow::Result<()> {
        let source = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;
        write(source.path().join("a1b2.ttf"), b"font bytes")?;
        write(source.path().join("readme.txt"), b"text")?;

        let probe = FixedProbe::default().with("a1b2.ttf", "Arial", "Bold");
        let collector = AssetCollector::new(dest.path(), probe);
        let report = collector.collect(Category::CloudFonts, source.path(), &ProgressBar::hidden());

        let leaf = dest.path().join("Fonts").join("Cloud Fonts");
        assert_eq!(listing(&leaf), vec!["Arial-Bold.ttf"]);
        assert_eq!(read(leaf.join("Arial-Bold.ttf"))?, b"font bytes");
        assert_eq!(report.copied.len(), 1);
        assert!(report.is_clean());

        Ok(())
    }

    #[test]
    fn cloud_fonts_are_walked_recursively() -> anyhow::Result<()> {
        let source = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;
        create_dir_all(source.path().join("1f").join("2e"))?;
        write(source.path().join("1f").join("2e").join("deadbeef.otf"), b"x")?;
        write(source.path().join("cafe.TTF"), b"y")?;

        let collector = AssetCollector::new(dest.path(), NoMetadata);
        let report = collector.collect(Category::CloudFonts, source.path(), &ProgressBar::hidden());

        let leaf = dest.path().join("Fonts").join("Cloud Fonts");
        assert_eq!(listing(&leaf), vec!["cafe.TTF", "deadbeef.otf"]);
        assert_eq!(report.copied.len(), 2);

        Ok(())
    }

    #[test]
    fn system_fonts_are_not_walked_recursively() -> anyhow::Result<()> {
        let source = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;
        create_dir_all(source.path().join("Deleted"))?;
        write(source.path().join("Deleted").join("old.ttf"), b"x")?;
        write(source.path().join("arialbd.ttf"), b"y")?;
        write(source.path().join("SERIFE.FON"), b"z")?;

        let probe = FixedProbe::default().with("arialbd.ttf", "Arial", "Bold");
        let collector = AssetCollector::new(dest.path(), probe);
        collector.collect(Category::SystemFonts, source.path(), &ProgressBar::hidden());

        let leaf = dest.path().join("Fonts").join("Windows Fonts");
        assert_eq!(listing(&leaf), vec!["SERIFE.FON", "arialbd.ttf"]);

        Ok(())
    }

    #[test]
    fn wallpapers_keep_original_names() -> anyhow::Result<()> {
        let source = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;
        create_dir_all(source.path().join("4K").join("Wallpapers"))?;
        write(source.path().join("4K").join("Wallpapers").join("img0.jpg"), b"a")?;
        create_dir_all(source.path().join("Wallpaper").join("Windows"))?;
        write(source.path().join("Wallpaper").join("Windows").join("img0.jpg"), b"b")?;
        write(source.path().join("thumbs.db"), b"c")?;

        let collector = AssetCollector::new(dest.path(), TtfProbe::new());
        let report = collector.collect(Category::Wallpapers, source.path(), &ProgressBar::hidden());

        let leaf = dest.path().join("Wallpaper");
        assert_eq!(listing(&leaf), vec!["img0-1.jpg", "img0.jpg"]);
        assert_eq!(read(leaf.join("img0.jpg"))?, b"a");
        assert_eq!(read(leaf.join("img0-1.jpg"))?, b"b");
        assert_eq!(report.copied.len(), 2);

        Ok(())
    }

    #[test]
    fn missing_source_is_skipped() -> anyhow::Result<()> {
        let dest = tempfile::tempdir()?;
        let missing = dest.path().join("nope");

        let collector = AssetCollector::new(dest.path(), NoMetadata);
        let report = collector.collect(Category::Wallpapers, &missing, &ProgressBar::hidden());

        assert_eq!(report.skipped, vec![missing]);
        assert!(report.copied.is_empty());
        assert!(report.is_clean());
        assert!(!dest.path().join("Wallpaper").exists());

        Ok(())
    }

    #[test]
    fn metadata_flag_comes_from_probe() {
        let with = AssetCollector::new("out", TtfProbe::new());
        let without = AssetCollector::new("out", NoMetadata);
        assert!(with.has_metadata());
        assert!(!without.has_metadata());
    }

    #[test]
    fn rerun_never_overwrites() -> anyhow::Result<()> {
        let source = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;
        write(source.path().join("img1.png"), b"1")?;
        write(source.path().join("img2.png"), b"2")?;

        let collector = AssetCollector::new(dest.path(), NoMetadata);
        let sources = [(Category::Wallpapers, source.path().to_path_buf())];
        collector.collect_all(sources.clone(), &ProgressBar::hidden());
        let report = collector.collect_all(sources, &ProgressBar::hidden());

        let leaf = dest.path().join("Wallpaper");
        assert_eq!(
            listing(&leaf),
            vec!["img1-1.png", "img1.png", "img2-1.png", "img2.png"]
        );
        assert_eq!(report.copied.len(), 2);

        Ok(())
    }

    #[test]
    fn failed_copy_leaves_no_partial_file() -> anyhow::Result<()> {
        let source = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;
        let to = dest.path().join("half.ttf");

        let result = copy_content(source.path(), &to);
        assert!(result.is_err());
        assert!(!to.exists());

        Ok(())
    }

    /// Deletes the named file while describing it, so the copy that follows
    /// finds it gone.
    #[derive(Debug)]
    struct VanishingProbe(&'static str);

    impl FontProbe for VanishingProbe {
        fn describe(&self, path: &Path) -> Option<FontDescriptor> {
            if path.file_name()? == self.0 {
                remove_file(path).ok()?;
            }
            None
        }
    }

    #[test]
    fn per_file_failure_does_not_abort_collect() -> anyhow::Result<()> {
        let source = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;
        write(source.path().join("a.ttf"), b"a")?;
        write(source.path().join("b.ttf"), b"b")?;
        write(source.path().join("c.ttf"), b"c")?;

        let collector = AssetCollector::new(dest.path(), VanishingProbe("b.ttf"));
        let report = collector.collect(Category::CloudFonts, source.path(), &ProgressBar::hidden());

        let leaf = dest.path().join("Fonts").join("Cloud Fonts");
        assert_eq!(listing(&leaf), vec!["a.ttf", "c.ttf"]);
        assert_eq!(report.copied.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            CollectError::Copy { from, .. } if from == &source.path().join("b.ttf")
        ));
        assert!(!report.is_clean());

        Ok(())
    }
}
