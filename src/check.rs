//! Content validation.
//!
//! Walks the content directory and reports every post that Hugo would render
//! badly or not at all:
//!
//! | Issue | Meaning |
//! |---|---|
//! | unreadable | file could not be read as UTF-8 text |
//! | missing front matter | file does not open with a `---` block |
//! | unsupported front matter | file opens with a TOML `+++` block |
//! | malformed front matter | unclosed block or invalid YAML |
//! | missing title | no `title`, or only whitespace |
//! | missing date | no `date` |
//! | invalid date | `date` is not an ISO-8601 date or timestamp |
//! | invalid image URL | cover or embed is not an absolute `http(s)` URL |
//! | broken link | (online only) image URL answered ≥ 400 or not at all |
//!
//! Online checking sends one `HEAD` per distinct URL on a dedicated rayon pool,
//! so a URL shared by many posts is only requested once.

use crate::entry::{ContentEntry, FrontMatterError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Content directory not found: {0}")]
    NotFound(PathBuf),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Thread pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A single problem found in a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    Unreadable(String),
    MissingFrontMatter,
    UnsupportedFrontMatter,
    MalformedFrontMatter(String),
    MissingTitle,
    MissingDate,
    InvalidDate(String),
    InvalidImageUrl(String),
    BrokenLink { url: String, reason: String },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Unreadable(e) => write!(f, "unreadable: {e}"),
            IssueKind::MissingFrontMatter => write!(f, "missing front matter"),
            IssueKind::UnsupportedFrontMatter => {
                write!(f, "unsupported front matter format (TOML `+++`)")
            }
            IssueKind::MalformedFrontMatter(e) => write!(f, "malformed front matter: {e}"),
            IssueKind::MissingTitle => write!(f, "missing title"),
            IssueKind::MissingDate => write!(f, "missing date"),
            IssueKind::InvalidDate(d) => write!(f, "date is not ISO-8601: {d:?}"),
            IssueKind::InvalidImageUrl(u) => {
                write!(f, "image is not an absolute http(s) URL: {u:?}")
            }
            IssueKind::BrokenLink { url, reason } => {
                write!(f, "broken image link {url} ({reason})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Path relative to the content directory.
    pub path: PathBuf,
    pub kind: IssueKind,
}

/// Outcome of a check run.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Number of Markdown files examined.
    pub checked: usize,
    /// Number of distinct URLs requested (online mode).
    pub links_checked: usize,
    /// Issues sorted by path, in detection order within a file.
    pub issues: Vec<Issue>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of files with at least one issue.
    pub fn failing_files(&self) -> usize {
        let mut paths: Vec<&Path> = self.issues.iter().map(|i| i.path.as_path()).collect();
        paths.dedup();
        paths.len()
    }
}

/// Reachability test for a single URL.
pub trait LinkChecker: Sync {
    /// `Err` carries a short reason such as `"404"` or a transport error.
    fn check_link(&self, url: &str) -> Result<(), String>;
}

/// `HEAD` requests over a shared blocking agent.
pub struct HttpLinkChecker {
    agent: ureq::Agent,
}

impl HttpLinkChecker {
    pub fn new(timeout_secs: u64) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::config::Config::builder()
                .timeout_global(Some(Duration::from_secs(timeout_secs)))
                .http_status_as_error(false)
                .build(),
        );
        Self { agent }
    }
}

impl LinkChecker for HttpLinkChecker {
    fn check_link(&self, url: &str) -> Result<(), String> {
        let response = self.agent.head(url).call().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(status.to_string());
        }
        Ok(())
    }
}

/// Whether `value` parses as an ISO-8601 date, local timestamp, or RFC 3339
/// timestamp.
pub fn is_iso_date(value: &str) -> bool {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}

fn is_http_url(url: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| url.strip_prefix(scheme).is_some_and(|rest| !rest.trim().is_empty()))
}

/// Offline issues for one document.
pub fn check_document(content: &str) -> Vec<IssueKind> {
    let entry = match ContentEntry::parse(content) {
        Ok(entry) => entry,
        Err(FrontMatterError::Missing) => return vec![IssueKind::MissingFrontMatter],
        Err(FrontMatterError::UnsupportedFormat) => {
            return vec![IssueKind::UnsupportedFrontMatter];
        }
        Err(e) => return vec![IssueKind::MalformedFrontMatter(e.to_string())],
    };

    let mut issues = Vec::new();
    let fm = &entry.front_matter;
    if fm.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        issues.push(IssueKind::MissingTitle);
    }
    match fm.date.as_deref() {
        None => issues.push(IssueKind::MissingDate),
        Some(d) if d.trim().is_empty() => issues.push(IssueKind::MissingDate),
        Some(d) if !is_iso_date(d) => issues.push(IssueKind::InvalidDate(d.to_string())),
        Some(_) => {}
    }
    for url in entry.image_refs() {
        if !is_http_url(&url) {
            issues.push(IssueKind::InvalidImageUrl(url));
        }
    }
    issues
}

/// Markdown files under `dir`, sorted.
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, CheckError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Check every post under `dir`.
///
/// With a `checker`, each distinct valid image URL is also requested using at
/// most `workers` threads. A file that cannot be read is reported as an issue
/// and the walk carries on.
pub fn check_content(
    dir: &Path,
    checker: Option<&dyn LinkChecker>,
    workers: usize,
) -> Result<CheckReport, CheckError> {
    if !dir.is_dir() {
        return Err(CheckError::NotFound(dir.to_path_buf()));
    }

    let files = markdown_files(dir)?;
    let mut report = CheckReport {
        checked: files.len(),
        ..CheckReport::default()
    };
    // url -> files referencing it
    let mut links: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut per_file: BTreeMap<PathBuf, Vec<IssueKind>> = BTreeMap::new();

    for path in &files {
        let rel = path.strip_prefix(dir).unwrap_or(path).to_path_buf();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %rel.display(), error = %e, "could not read post");
                per_file.insert(rel, vec![IssueKind::Unreadable(e.to_string())]);
                continue;
            }
        };
        let issues = check_document(&content);

        if checker.is_some() {
            let urls = ContentEntry::parse(&content)
                .map(|entry| entry.image_refs())
                .unwrap_or_default();
            for url in urls.into_iter().filter(|u| is_http_url(u)) {
                let users = links.entry(url).or_default();
                if !users.contains(&rel) {
                    users.push(rel.clone());
                }
            }
        }
        tracing::debug!(path = %rel.display(), issues = issues.len(), "checked");
        per_file.insert(rel, issues);
    }

    if let Some(checker) = checker {
        let urls: Vec<&String> = links.keys().collect();
        report.links_checked = urls.len();
        tracing::info!(urls = urls.len(), workers, "checking image links");

        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers.max(1)).build()?;
        let failures: Vec<(String, String)> = pool.install(|| {
            urls.par_iter()
                .filter_map(|url| {
                    let reason = checker.check_link(url).err()?;
                    Some(((*url).clone(), reason))
                })
                .collect()
        });

        for (url, reason) in failures {
            for rel in &links[&url] {
                per_file.entry(rel.clone()).or_default().push(IssueKind::BrokenLink {
                    url: url.clone(),
                    reason: reason.clone(),
                });
            }
        }
    }

    report.issues = per_file
        .into_iter()
        .flat_map(|(path, kinds)| {
            kinds.into_iter().map(move |kind| Issue {
                path: path.clone(),
                kind,
            })
        })
        .collect();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{setup_fixtures, write_post_file};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Fails every URL containing "missing" and records requests.
    #[derive(Default)]
    struct FakeLinkChecker {
        requests: Mutex<Vec<String>>,
    }

    impl LinkChecker for FakeLinkChecker {
        fn check_link(&self, url: &str) -> Result<(), String> {
            self.requests.lock().unwrap().push(url.to_string());
            if url.contains("missing") {
                Err("404".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn kinds(report: &CheckReport, file: &str) -> Vec<IssueKind> {
        report
            .issues
            .iter()
            .filter(|i| i.path == Path::new(file))
            .map(|i| i.kind.clone())
            .collect()
    }

    #[test]
    fn iso_dates() {
        assert!(is_iso_date("2025-10-19"));
        assert!(is_iso_date("2025-10-19T06:00:00"));
        assert!(is_iso_date("2025-10-19T06:00:00-04:00"));
        assert!(is_iso_date("2025-10-19T06:00:00.5Z"));
        assert!(!is_iso_date("October 19, 2025"));
        assert!(!is_iso_date("2025-13-01"));
        assert!(!is_iso_date("19/10/2025"));
    }

    #[test]
    fn http_urls() {
        assert!(is_http_url("https://res.cloudinary.com/x.webp"));
        assert!(is_http_url("http://example.com/a.png"));
        assert!(!is_http_url("/images/a.png"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("ftp://example.com/a.png"));
    }

    #[test]
    fn clean_document_has_no_issues() {
        let doc = "---\ntitle: T\ndate: 2025-10-19\nimage: https://cdn/a.webp\n---\n\nBody\n";
        assert!(check_document(doc).is_empty());
    }

    #[test]
    fn each_failure_mode_is_reported() {
        assert_eq!(check_document("no block\n"), vec![IssueKind::MissingFrontMatter]);
        assert!(matches!(
            check_document("---\ntitle: T\n").as_slice(),
            [IssueKind::MalformedFrontMatter(_)]
        ));
        assert!(matches!(
            check_document("---\ntitle: [x\n---\n").as_slice(),
            [IssueKind::MalformedFrontMatter(_)]
        ));
        assert_eq!(
            check_document("---\ntitle: ' '\n---\n"),
            vec![IssueKind::MissingTitle, IssueKind::MissingDate]
        );
        assert_eq!(
            check_document("---\ntitle: T\ndate: last sunday\n---\n"),
            vec![IssueKind::InvalidDate("last sunday".to_string())]
        );
        assert_eq!(
            check_document(concat!(
                "---\ntitle: T\ndate: 2025-10-19\nimage: cover.png\n---\n",
                "![x](/a.png)\n",
            )),
            vec![
                IssueKind::InvalidImageUrl("cover.png".to_string()),
                IssueKind::InvalidImageUrl("/a.png".to_string()),
            ]
        );
    }

    #[test]
    fn fixture_content_reports_only_the_broken_post() {
        let tmp = setup_fixtures();
        let report = check_content(&tmp.path().join("content/post"), None, 1).unwrap();

        assert_eq!(report.checked, 3);
        assert_eq!(report.links_checked, 0);
        assert_eq!(report.failing_files(), 1);
        assert_eq!(
            kinds(&report, "broken.md"),
            vec![
                IssueKind::MissingDate,
                IssueKind::InvalidImageUrl("images/cover.png".to_string()),
            ]
        );
    }

    #[test]
    fn walks_subdirectories_and_ignores_other_files() {
        let tmp = TempDir::new().unwrap();
        write_post_file(tmp.path(), "2025/a.md", "no front matter");
        write_post_file(tmp.path(), "notes.txt", "ignored");

        let report = check_content(tmp.path(), None, 1).unwrap();
        assert_eq!(report.checked, 1);
        assert_eq!(kinds(&report, "2025/a.md"), vec![IssueKind::MissingFrontMatter]);
    }

    #[test]
    fn online_requests_each_url_once() {
        let tmp = TempDir::new().unwrap();
        let post = |image: &str| format!("---\ntitle: T\ndate: 2025-10-19\nimage: {image}\n---\n");
        write_post_file(tmp.path(), "a.md", &post("https://cdn/ok.webp"));
        write_post_file(tmp.path(), "b.md", &post("https://cdn/ok.webp"));
        write_post_file(tmp.path(), "c.md", &post("https://cdn/missing.webp"));
        write_post_file(tmp.path(), "d.md", &post("relative.webp"));

        let checker = FakeLinkChecker::default();
        let report = check_content(tmp.path(), Some(&checker), 2).unwrap();

        let mut requested = checker.requests.lock().unwrap().clone();
        requested.sort();
        assert_eq!(requested, vec!["https://cdn/missing.webp", "https://cdn/ok.webp"]);
        assert_eq!(report.links_checked, 2);
        assert_eq!(
            kinds(&report, "c.md"),
            vec![IssueKind::BrokenLink {
                url: "https://cdn/missing.webp".to_string(),
                reason: "404".to_string(),
            }]
        );
        assert!(kinds(&report, "a.md").is_empty());
        assert_eq!(
            kinds(&report, "d.md"),
            vec![IssueKind::InvalidImageUrl("relative.webp".to_string())]
        );
    }

    #[test]
    fn unreadable_file_does_not_stop_the_walk() {
        let tmp = TempDir::new().unwrap();
        write_post_file(tmp.path(), "a.md", "---\ntitle: T\ndate: 2025-10-19\n---\n");
        std::fs::write(tmp.path().join("b.md"), b"---\ntitle: \xff\xfe\n---\n").unwrap();

        let report = check_content(tmp.path(), None, 1).unwrap();
        assert_eq!(report.checked, 2);
        assert!(kinds(&report, "a.md").is_empty());
        assert!(matches!(
            kinds(&report, "b.md").as_slice(),
            [IssueKind::Unreadable(_)]
        ));
        assert_eq!(report.failing_files(), 1);
    }

    #[test]
    fn toml_front_matter_is_unsupported() {
        let doc = "+++\ntitle = \"T\"\ndate = 2025-10-19\n+++\nBody\n";
        assert_eq!(check_document(doc), vec![IssueKind::UnsupportedFrontMatter]);

        let tmp = TempDir::new().unwrap();
        write_post_file(tmp.path(), "t.md", doc);
        let report = check_content(tmp.path(), None, 1).unwrap();
        assert_eq!(kinds(&report, "t.md"), vec![IssueKind::UnsupportedFrontMatter]);
    }

    #[test]
    fn missing_directory_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = check_content(&tmp.path().join("nope"), None, 1).unwrap_err();
        assert!(matches!(err, CheckError::NotFound(_)));
    }

    #[test]
    fn issue_display() {
        let kind = IssueKind::BrokenLink {
            url: "https://x/y".to_string(),
            reason: "404".to_string(),
        };
        assert_eq!(kind.to_string(), "broken image link https://x/y (404)");
    }
}
