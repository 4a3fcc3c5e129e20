//! The daily job: readings row in, published post out.
//!
//! ```text
//! date ─► readings row ─► selection ─► texts ─► body ──┐
//!                              │                       ├─► post ─► site build
//!                              └─► cover ─► upload ────┘
//! ```
//!
//! External effects (passage lookup, image generation, upload) come in as
//! trait objects so the whole pipeline runs in tests against in-memory
//! doubles. [`preview`] runs the same composition without any of the side
//! effects and backs the `show` command.

use crate::cache::{self, UploadCache, UploadOutcome};
use crate::cloudinary::{ImageHost, UploadError};
use crate::config::{ConfigError, LectionaryConfig};
use crate::entry::ContentEntry;
use crate::imaging::{ImageGenerator, ImagingError};
use crate::metadata::Selection;
use crate::post::{self, DraftPost, PostError};
use crate::readings::{self, DayReadings, ReadingsError};
use crate::render::render_body;
use crate::scripture::{ReadingTexts, ScriptureError, ScriptureSource};
use crate::site::{self, SiteError};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DailyError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Readings error: {0}")]
    Readings(#[from] ReadingsError),
    #[error("No readings for {date} in {table}")]
    NoEntry { date: NaiveDate, table: PathBuf },
    #[error("Scripture error: {0}")]
    Scripture(#[from] ScriptureError),
    #[error("Image generation error: {0}")]
    Imaging(#[from] ImagingError),
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
    #[error("Post error: {0}")]
    Post(#[from] PostError),
    #[error("Site build error: {0}")]
    Site(#[from] SiteError),
}

/// What to do on this run.
#[derive(Debug, Clone, Copy)]
pub struct DailyOptions {
    /// Explicit date; `None` means today in the configured timezone.
    pub date: Option<NaiveDate>,
    pub upload: bool,
    pub use_cache: bool,
    pub build_site: bool,
}

impl Default for DailyOptions {
    fn default() -> Self {
        Self {
            date: None,
            upload: true,
            use_cache: true,
            build_site: true,
        }
    }
}

/// The effectful collaborators of a run.
pub struct Services<'a> {
    pub scripture: &'a dyn ScriptureSource,
    pub images: &'a dyn ImageGenerator,
    /// `None` when uploading is disabled.
    pub host: Option<&'a dyn ImageHost>,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub path: PathBuf,
    pub title: String,
    pub slug: String,
    pub public_id: String,
    /// Cover URL written in this run, if any.
    pub image_url: Option<String>,
    pub upload: UploadOutcome,
    pub site_built: bool,
}

/// The post `daily` would write, composed without side effects.
#[derive(Debug, Clone)]
pub struct Preview {
    pub date: NaiveDate,
    pub path: PathBuf,
    pub selection: Selection,
    pub entry: ContentEntry,
}

/// Today's date in `tz`.
pub fn today(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// The date to run for: `explicit` if given, otherwise today in the
/// effective timezone (`TZ` wins over config).
pub fn target_date(
    config: &LectionaryConfig,
    explicit: Option<NaiveDate>,
) -> Result<NaiveDate, DailyError> {
    match explicit {
        Some(date) => Ok(date),
        None => {
            let tz_env = std::env::var("TZ").ok();
            let tz = config.effective_timezone(tz_env.as_deref())?;
            Ok(today(tz))
        }
    }
}

/// Load the readings row for `date`.
pub fn lookup_day(
    root: &Path,
    config: &LectionaryConfig,
    date: NaiveDate,
) -> Result<DayReadings, DailyError> {
    let table_path = root.join(&config.readings);
    let table = readings::load_readings(&table_path)?;
    tracing::debug!(rows = table.len(), table = %table_path.display(), "loaded readings");
    table.get(date).cloned().ok_or(DailyError::NoEntry {
        date,
        table: table_path,
    })
}

fn compose_draft(
    day: &DayReadings,
    selection: &Selection,
    config: &LectionaryConfig,
    scripture: &dyn ScriptureSource,
    image: Option<String>,
) -> Result<DraftPost, DailyError> {
    let texts = ReadingTexts::fetch(scripture, day)?;
    Ok(DraftPost {
        title: selection.title.clone(),
        date: day.date.format("%Y-%m-%d").to_string(),
        body: render_body(day, &texts, &config.reflection),
        image,
    })
}

/// Upload the cover unless the cache already has this exact image.
fn publish_cover(
    root: &Path,
    host: &dyn ImageHost,
    png: &[u8],
    public_id: &str,
    use_cache: bool,
) -> Result<(String, UploadOutcome), DailyError> {
    let mut upload_cache = UploadCache::load(root);
    let image_hash = cache::hash_bytes(png);
    let host_hash = cache::hash_host(&host.fingerprint());

    if use_cache {
        if let Some(url) = upload_cache.find(public_id, &image_hash, &host_hash) {
            tracing::info!(public_id, "cover unchanged, reusing upload");
            return Ok((url.to_string(), UploadOutcome::Cached));
        }
    }

    let url = host.upload(png, public_id)?;
    tracing::info!(public_id, url = %url, "uploaded cover");
    upload_cache.insert(public_id.to_string(), image_hash, host_hash, url.clone());
    if let Err(e) = upload_cache.save(root) {
        tracing::warn!(error = %e, "could not save upload cache");
    }
    Ok((url, UploadOutcome::Uploaded))
}

/// Run the full daily pipeline in project `root`.
pub fn run_daily(
    root: &Path,
    config: &LectionaryConfig,
    options: DailyOptions,
    services: &Services<'_>,
) -> Result<DailyReport, DailyError> {
    let date = target_date(config, options.date)?;
    let day = lookup_day(root, config, date)?;
    let selection = Selection::for_day(&day, config);
    tracing::info!(%date, slug = %selection.slug, "composing post");

    let (image_url, upload) = match services.host {
        Some(host) if options.upload => {
            let png = services.images.generate(&selection.image_ref)?;
            let (url, outcome) =
                publish_cover(root, host, &png, &selection.public_id, options.use_cache)?;
            (Some(url), outcome)
        }
        _ => (None, UploadOutcome::Skipped),
    };

    let draft = compose_draft(&day, &selection, config, services.scripture, image_url.clone())?;
    let path = post::write_post(&root.join(&config.content_dir), &selection.slug, &draft)?;

    if options.build_site {
        site::build_site(root, &config.site)?;
    }

    Ok(DailyReport {
        date,
        path,
        title: selection.title,
        slug: selection.slug,
        public_id: selection.public_id,
        image_url,
        upload,
        site_built: options.build_site,
    })
}

/// Compose the post for `date` (default today) without writing anything.
///
/// An existing post's metadata and cover are merged exactly as `daily`
/// would with uploading disabled.
pub fn preview(
    root: &Path,
    config: &LectionaryConfig,
    date: Option<NaiveDate>,
    scripture: &dyn ScriptureSource,
) -> Result<Preview, DailyError> {
    let date = target_date(config, date)?;
    let day = lookup_day(root, config, date)?;
    let selection = Selection::for_day(&day, config);
    let draft = compose_draft(&day, &selection, config, scripture, None)?;
    let content_dir = root.join(&config.content_dir);
    let (path, entry) = post::prepare_post(&content_dir, &selection.slug, &draft)?;
    Ok(Preview {
        date,
        path,
        selection,
        entry,
    })
}
