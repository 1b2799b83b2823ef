//! Render-and-write pipeline.
//!
//! Each bookmark is rendered into `<output_dir>/<slug>.md`. Rendering
//! happens before any file is touched, documents are linked into place
//! only once fully written, and an existing document is never replaced.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::app::{PindownError, Result};
use crate::domain::Bookmark;
use crate::slug::{slugify, StopwordSet};
use crate::template::BookmarkTemplate;

pub const OUTPUT_EXTENSION: &str = "md";

/// Variables available to templates.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext<'a> {
    pub description: &'a str,
    pub url: &'a str,
    pub tags: &'a [String],
    pub extended: &'a str,
    pub hash: &'a str,
    pub meta: &'a str,
    pub shared: bool,
    pub toread: bool,
    /// Creation time in UTC.
    pub time: String,
    /// Creation time in the configured zone.
    pub local_date: String,
    /// Same as `local_date`.
    pub date: String,
    pub slug: String,
}

impl<'a> RenderContext<'a> {
    pub fn new(bookmark: &'a Bookmark, timezone: Tz, slug: String) -> Self {
        let local_date = bookmark.created_at.with_timezone(&timezone).to_rfc3339();
        Self {
            description: &bookmark.description,
            url: &bookmark.url,
            tags: &bookmark.tags,
            extended: &bookmark.extended,
            hash: &bookmark.hash,
            meta: &bookmark.meta,
            shared: bookmark.shared,
            toread: bookmark.toread,
            time: bookmark.created_at.to_rfc3339(),
            date: local_date.clone(),
            local_date,
            slug,
        }
    }
}

/// What happened to one bookmark.
#[derive(Debug)]
pub enum ItemOutcome {
    Written(PathBuf),
    /// A document with this name was already there; left untouched.
    AlreadyExists(PathBuf),
    /// Debug mode: rendered but not written.
    DryRun(PathBuf),
    RenderFailed { path: PathBuf, error: PindownError },
    WriteFailed { path: PathBuf, error: io::Error },
}

impl ItemOutcome {
    pub fn path(&self) -> &Path {
        match self {
            ItemOutcome::Written(path)
            | ItemOutcome::AlreadyExists(path)
            | ItemOutcome::DryRun(path)
            | ItemOutcome::RenderFailed { path, .. }
            | ItemOutcome::WriteFailed { path, .. } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ItemOutcome::RenderFailed { .. } | ItemOutcome::WriteFailed { .. }
        )
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path().display();
        match self {
            ItemOutcome::Written(_) => write!(f, "Wrote '{}'", path),
            ItemOutcome::AlreadyExists(_) => write!(f, "Skipped '{}' (already exists)", path),
            ItemOutcome::DryRun(_) => write!(f, "Skipped '{}' (debug mode)", path),
            ItemOutcome::RenderFailed { error, .. } => {
                write!(f, "Could not render '{}': {}", path, error)
            }
            ItemOutcome::WriteFailed { error, .. } => {
                write!(f, "Could not write '{}': {}", path, error)
            }
        }
    }
}

/// Renders bookmarks and writes them to the output directory.
pub struct Pipeline {
    output_dir: PathBuf,
    template: BookmarkTemplate,
    stopwords: StopwordSet,
    timezone: Tz,
    slug_max_length: usize,
    debug: bool,
}

impl Pipeline {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        template: BookmarkTemplate,
        stopwords: StopwordSet,
        timezone: Tz,
        slug_max_length: usize,
        debug: bool,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            template,
            stopwords,
            timezone,
            slug_max_length,
            debug,
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn target_path(&self, slug: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", slug, OUTPUT_EXTENSION))
    }

    /// Render one bookmark and, unless in debug mode, write it.
    pub fn process(&self, bookmark: &Bookmark) -> ItemOutcome {
        let slug = slugify(&bookmark.description, &self.stopwords, self.slug_max_length);
        let path = self.target_path(&slug);
        let ctx = RenderContext::new(bookmark, self.timezone, slug);

        let content = match self.template.render(&ctx) {
            Ok(content) => content,
            Err(error) => return ItemOutcome::RenderFailed { path, error },
        };

        if self.debug {
            return ItemOutcome::DryRun(path);
        }

        match self.write_new(&path, &content) {
            Ok(true) => ItemOutcome::Written(path),
            Ok(false) => ItemOutcome::AlreadyExists(path),
            Err(error) => ItemOutcome::WriteFailed { path, error },
        }
    }

    /// Write `content` to `path` unless something is already there.
    /// Returns whether the file was written.
    fn write_new(&self, path: &Path, content: &str) -> io::Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        let mut tmp = NamedTempFile::new_in(&self.output_dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;

        match tmp.persist_noclobber(path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.error),
        }
    }
}

/// Fail unless files can be created in `dir`.
pub fn ensure_writable(dir: &Path) -> Result<()> {
    tempfile::tempfile_in(dir)
        .map(|_| ())
        .map_err(|source| PindownError::OutputNotWritable {
            path: dir.to_path_buf(),
            source,
        })
}
