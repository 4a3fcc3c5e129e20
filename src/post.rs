//! Writing the day's post into the content directory.
//!
//! A post is `<content_dir>/<slug>.md`. Re-running the job for the same day
//! rewrites the same file, so existing metadata is respected:
//!
//! | Key | New file | Existing file |
//! |---|---|---|
//! | `title` | generated | kept if present |
//! | `date` | generated | kept if present |
//! | `draft` | `false` | forced to `false` |
//! | `image` | new URL | new URL, or kept when there is none |
//! | anything else | absent | kept untouched |
//!
//! Keys keep their position and their spelling (`tags: advent` stays a
//! scalar, `author:` stays null). The body is always replaced. An existing
//! file without front matter is treated as having none; one with broken or
//! TOML (`+++`) front matter is left alone and reported, so a hand-edited
//! post is never silently clobbered.

use crate::entry::{ContentEntry, FrontMatterError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Existing post {path} has invalid front matter: {source}")]
    Existing {
        path: PathBuf,
        source: FrontMatterError,
    },
    #[error("Front matter error: {0}")]
    FrontMatter(#[from] FrontMatterError),
}

/// Generated content for one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftPost {
    pub title: String,
    /// ISO-8601 date
    pub date: String,
    pub body: String,
    /// Cover URL; `None` keeps whatever the existing file has.
    pub image: Option<String>,
}

/// Path a post with `slug` is written to.
pub fn post_path(content_dir: &Path, slug: &str) -> PathBuf {
    content_dir.join(format!("{slug}.md"))
}

/// Merge `draft` into whatever front matter `existing` carries.
pub fn merge_entry(existing: Option<ContentEntry>, draft: &DraftPost) -> ContentEntry {
    let mut entry = existing.unwrap_or_default();
    let fm = &mut entry.front_matter;
    if fm.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        fm.title = Some(draft.title.clone());
    }
    if fm.date.as_deref().is_none_or(|d| d.trim().is_empty()) {
        fm.date = Some(draft.date.clone());
    }
    fm.draft = false;
    if let Some(image) = &draft.image {
        fm.image = Some(image.clone());
    }
    entry.body = draft.body.clone();
    entry
}

/// Read an existing post, if there is one with YAML front matter.
fn existing_entry(path: &Path) -> Result<Option<ContentEntry>, PostError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    match ContentEntry::parse(&content) {
        Ok(entry) => Ok(Some(entry)),
        Err(FrontMatterError::Missing) => Ok(None),
        Err(source) => Err(PostError::Existing {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Compose the post without touching disk (beyond reading an existing file).
pub fn prepare_post(
    content_dir: &Path,
    slug: &str,
    draft: &DraftPost,
) -> Result<(PathBuf, ContentEntry), PostError> {
    let path = post_path(content_dir, slug);
    let existing = existing_entry(&path)?;
    Ok((path, merge_entry(existing, draft)))
}

/// Write (or rewrite) the post for `slug`, creating `content_dir` if needed.
pub fn write_post(
    content_dir: &Path,
    slug: &str,
    draft: &DraftPost,
) -> Result<PathBuf, PostError> {
    let (path, entry) = prepare_post(content_dir, slug, draft)?;
    fs::create_dir_all(content_dir)?;
    fs::write(&path, entry.to_markdown()?)?;
    tracing::info!(path = %path.display(), "wrote post");
    Ok(path)
}
