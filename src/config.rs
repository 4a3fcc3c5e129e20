//! Project configuration module.
//!
//! Handles loading, validating, and merging `lectionary.toml`. Stock defaults
//! are overridden by the user's file in the project root; every key is
//! optional and the file itself may be absent.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── lectionary.toml          # Overrides stock defaults
//! ├── scripts/readings.tsv     # Readings table
//! ├── content/post/            # Generated posts
//! └── hugo.toml                # Hugo's own config (not read here)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! timezone = "America/New_York"   # Which "today" the daily post is for
//! content_dir = "content/post"    # Where posts are written and checked
//! readings = "scripts/readings.tsv"
//! title_fallback = "Daily Readings"
//!
//! [reflection]
//! heading = "ChatGPT Response"
//! text = "(Add your reflection here. ...)"
//!
//! [image]
//! width = 1                      # Placeholder cover size in pixels (1-8192)
//! height = 1
//!
//! [cloudinary]
//! folder = "matthew419"          # Public id prefix
//! format = "webp"
//! transform = "f_webp,q_auto"    # Delivery transformation
//! signature_algorithm = "sha1"   # or "sha256"
//! timeout_secs = 60
//!
//! [site]
//! command = "hugo"
//! args = ["--minify"]
//!
//! [check]
//! # max_workers = 8             # Parallel link checks (default: CPU cores)
//!                                # Used as given, not capped by cores
//! timeout_secs = 15
//! ```
//!
//! The `TZ` environment variable, when set, takes precedence over
//! `timezone`. Unknown keys are rejected to catch typos early.

use crate::imaging::{Dimensions, MAX_SIDE};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file in the project root.
pub const CONFIG_FILENAME: &str = "lectionary.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `lectionary.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LectionaryConfig {
    /// IANA timezone that decides which date is "today".
    pub timezone: String,
    /// Post directory, relative to the project root.
    pub content_dir: PathBuf,
    /// Readings table, relative to the project root.
    pub readings: PathBuf,
    /// Post title when a day has no citation and no calendar title.
    pub title_fallback: String,
    pub reflection: ReflectionConfig,
    pub image: ImageConfig,
    pub cloudinary: CloudinaryConfig,
    pub site: SiteConfig,
    pub check: CheckConfig,
}

impl Default for LectionaryConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            content_dir: PathBuf::from("content/post"),
            readings: PathBuf::from("scripts/readings.tsv"),
            title_fallback: "Daily Readings".to_string(),
            reflection: ReflectionConfig::default(),
            image: ImageConfig::default(),
            cloudinary: CloudinaryConfig::default(),
            site: SiteConfig::default(),
            check: CheckConfig::default(),
        }
    }
}

impl LectionaryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_timezone(&self.timezone)?;
        let size = Dimensions {
            width: self.image.width,
            height: self.image.height,
        };
        if !size.is_valid() {
            return Err(ConfigError::Validation(format!(
                "image.width and image.height must be between 1 and {MAX_SIDE}"
            )));
        }
        if self.cloudinary.folder.trim_matches('/').is_empty() {
            return Err(ConfigError::Validation(
                "cloudinary.folder must not be empty".into(),
            ));
        }
        if self.cloudinary.format.is_empty() {
            return Err(ConfigError::Validation(
                "cloudinary.format must not be empty".into(),
            ));
        }
        if self.site.command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.command must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The timezone "today" is computed in.
    ///
    /// A non-empty `tz_env` (the `TZ` environment variable) wins over the
    /// configured value.
    pub fn effective_timezone(&self, tz_env: Option<&str>) -> Result<Tz, ConfigError> {
        match tz_env.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => parse_timezone(name),
            None => parse_timezone(&self.timezone),
        }
    }
}

fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>()
        .map_err(|_| ConfigError::Validation(format!("unknown timezone: {name}")))
}

/// The section appended after the readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReflectionConfig {
    /// Level-3 heading text.
    pub heading: String,
    /// Body text placed under the heading.
    pub text: String,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            heading: "ChatGPT Response".to_string(),
            text: concat!(
                "(Add your reflection here. ",
                "You can replace this block with an actual generated response.)",
            )
            .to_string(),
        }
    }
}

/// Cover image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }
}

/// Digest used to sign upload requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

/// Media host settings. Credentials come from the environment, never from
/// this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloudinaryConfig {
    /// Public id prefix; ids are `<folder>/<YYYY>/<MM>/<slug>`.
    pub folder: String,
    /// Stored format requested at upload.
    pub format: String,
    /// Delivery transformation inserted into the image URL.
    pub transform: String,
    pub signature_algorithm: SignatureAlgorithm,
    pub timeout_secs: u64,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            folder: "matthew419".to_string(),
            format: "webp".to_string(),
            transform: "f_webp,q_auto".to_string(),
            signature_algorithm: SignatureAlgorithm::Sha1,
            timeout_secs: 60,
        }
    }
}

/// Static-site build command, run in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            command: "hugo".to_string(),
            args: vec!["--minify".to_string()],
        }
    }
}

/// Link checking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    /// Maximum number of parallel link checks.
    /// When absent, defaults to the number of CPU cores.
    /// Larger values are used as given.
    pub max_workers: Option<usize>,
    pub timeout_secs: u64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            timeout_secs: 15,
        }
    }
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `n`, at least 1
pub fn effective_workers(config: &CheckConfig) -> usize {
    match config.max_workers {
        Some(n) => n.max(1),
        None => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LectionaryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `lectionary.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LectionaryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LectionaryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config for a project root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<LectionaryConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `lectionary.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Lectionary Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# IANA timezone deciding which date is "today". The TZ environment
# variable, when set, overrides this.
timezone = "America/New_York"

# Where posts are written and checked (relative to the project root).
content_dir = "content/post"

# Tab-separated readings table (relative to the project root).
# Required columns: date dow title first psalm second alleluia gospel
readings = "scripts/readings.tsv"

# Post title for a day with no citations and no calendar title.
title_fallback = "Daily Readings"

# ---------------------------------------------------------------------------
# Reflection section appended after the readings
# ---------------------------------------------------------------------------
[reflection]
heading = "ChatGPT Response"
text = "(Add your reflection here. You can replace this block with an actual generated response.)"

# ---------------------------------------------------------------------------
# Cover image
# ---------------------------------------------------------------------------
[image]
# Placeholder cover size in pixels (1-8192 per side).
width = 1
height = 1

# ---------------------------------------------------------------------------
# Cloudinary upload
# ---------------------------------------------------------------------------
# Credentials are read from CLOUDINARY_URL
# (cloudinary://<api_key>:<api_secret>@<cloud_name>) or from
# CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET and CLOUDINARY_CLOUD_NAME.
[cloudinary]
# Public ids are <folder>/<YYYY>/<MM>/<slug>.
folder = "matthew419"

# Stored format requested at upload.
format = "webp"

# Delivery transformation inserted into the image URL.
transform = "f_webp,q_auto"

# "sha1" or "sha256"; must match the account's signature setting.
signature_algorithm = "sha1"

timeout_secs = 60

# ---------------------------------------------------------------------------
# Site build, run in the project root after a post is written
# ---------------------------------------------------------------------------
[site]
command = "hugo"
args = ["--minify"]

# ---------------------------------------------------------------------------
# Link checking (check --online)
# ---------------------------------------------------------------------------
[check]
# Maximum parallel link checks.
# Omit or comment out to auto-detect (= number of CPU cores).
# Larger values are used as given.
# max_workers = 8
timeout_secs = 15
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = LectionaryConfig::default();
        assert_eq!(config.timezone, "America/New_York");
        assert_eq!(config.content_dir, PathBuf::from("content/post"));
        assert_eq!(config.readings, PathBuf::from("scripts/readings.tsv"));
        assert_eq!(config.cloudinary.folder, "matthew419");
        assert_eq!(config.cloudinary.signature_algorithm, SignatureAlgorithm::Sha1);
        assert_eq!(config.site.command, "hugo");
        assert_eq!(config.site.args, vec!["--minify"]);
    }

    #[test]
    fn default_config_is_valid() {
        LectionaryConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
timezone = "Europe/Rome"

[cloudinary]
folder = "daily"
"#;
        let config: LectionaryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.timezone, "Europe/Rome");
        assert_eq!(config.cloudinary.folder, "daily");
        // Defaults preserved
        assert_eq!(config.cloudinary.format, "webp");
        assert_eq!(config.title_fallback, "Daily Readings");
    }

    #[test]
    fn parse_signature_algorithm() {
        let toml = r#"
[cloudinary]
signature_algorithm = "sha256"
"#;
        let config: LectionaryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.cloudinary.signature_algorithm, SignatureAlgorithm::Sha256);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[site]
comand = "hugo"
"#;
        assert!(toml::from_str::<LectionaryConfig>(toml).is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn invalid_timezone_rejected() {
        let config = LectionaryConfig {
            timezone: "Mars/Olympus".to_string(),
            ..LectionaryConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn zero_image_size_rejected() {
        let mut config = LectionaryConfig::default();
        config.image.height = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn oversized_image_rejected() {
        let mut config = LectionaryConfig::default();
        config.image.width = 100_000;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.image.width = MAX_SIDE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_folder_rejected() {
        let mut config = LectionaryConfig::default();
        config.cloudinary.folder = "//".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn tz_env_overrides_config() {
        let config = LectionaryConfig::default();
        assert_eq!(
            config.effective_timezone(Some("Asia/Tokyo")).unwrap(),
            chrono_tz::Asia::Tokyo
        );
        assert_eq!(
            config.effective_timezone(None).unwrap(),
            chrono_tz::America::New_York
        );
        assert_eq!(
            config.effective_timezone(Some("  ")).unwrap(),
            chrono_tz::America::New_York
        );
        assert!(config.effective_timezone(Some("Nowhere")).is_err());
    }

    // =========================================================================
    // merge / load
    // =========================================================================

    #[test]
    fn merge_toml_overlays_nested_tables() {
        let base: toml::Value = toml::from_str(
            r#"
a = 1
[t]
x = "base"
y = "kept"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[t]
x = "over"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["t"]["x"].as_str(), Some("over"));
        assert_eq!(merged["t"]["y"].as_str(), Some("kept"));
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.timezone, "America/New_York");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
content_dir = "content/daily"

[site]
args = []
"#,
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.content_dir, PathBuf::from("content/daily"));
        assert!(config.site.args.is_empty());
        assert_eq!(config.site.command, "hugo");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_merged_result() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "timezone = \"Not/AZone\"\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: LectionaryConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = LectionaryConfig::default();
        assert_eq!(config.timezone, defaults.timezone);
        assert_eq!(config.reflection.text, defaults.reflection.text);
        assert_eq!(config.cloudinary.transform, defaults.cloudinary.transform);
        assert_eq!(config.check.max_workers, None);
    }

    // =========================================================================
    // Worker count
    // =========================================================================

    #[test]
    fn effective_workers_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_workers(&CheckConfig::default()), cores);
    }

    #[test]
    fn effective_workers_not_capped_by_cores() {
        let config = CheckConfig {
            max_workers: Some(256),
            ..CheckConfig::default()
        };
        assert_eq!(effective_workers(&config), 256);
        let config = CheckConfig {
            max_workers: Some(0),
            ..CheckConfig::default()
        };
        assert_eq!(effective_workers(&config), 1);
    }
}
