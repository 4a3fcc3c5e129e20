//! Shared test utilities for the lectionary test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let config = load_config(tmp.path()).unwrap();
//!
//! let sunday = day("2025-10-19", "Twenty-ninth Sunday", "Ex 17:8-13", "Lk 18:1-8");
//! write_post_file(tmp.path(), "content/post/extra.md", "---\ntitle: T\n---\n");
//! ```

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::readings::DayReadings;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy the `fixtures/` project (config, readings table, posts) to a temp
/// directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_post_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

// =========================================================================
// Readings builders
// =========================================================================

/// A readings row with only the fields selection cares about set.
pub fn day(date: &str, title: &str, first: &str, gospel: &str) -> DayReadings {
    DayReadings {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        dow: String::new(),
        title: title.to_string(),
        first: first.to_string(),
        psalm: String::new(),
        second: String::new(),
        alleluia: String::new(),
        gospel: gospel.to_string(),
        extra: BTreeMap::new(),
    }
}
