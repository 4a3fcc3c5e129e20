//! Content entries: YAML front matter plus a Markdown body.
//!
//! Every post in the content directory has this shape:
//!
//! ```text
//! ---
//! title: Lk 18:1-8
//! date: '2025-10-19'
//! draft: false
//! image: https://res.cloudinary.com/demo/image/upload/v17/matthew419/2025/10/lk-18_1-8.webp
//! ---
//!
//! **Twenty-ninth Sunday in Ordinary Time**
//! ...
//! ```
//!
//! The opening `---` must be the first line (a UTF-8 BOM is ignored). The
//! block closes at the next line that is exactly `---` or `...`. Hugo's TOML
//! (`+++`) blocks are recognised but not read.
//!
//! A parsed entry keeps the mapping exactly as written next to the typed
//! [`FrontMatter`] view. Rendering starts from that mapping and only replaces
//! keys whose typed value actually changed, so a rewrite never drops a field
//! Hugo or a theme relies on, even one set to null or an empty list.

use pulldown_cmark::{Event, Parser, Tag};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("No front matter block")]
    Missing,
    #[error("Front matter block is not closed")]
    Unterminated,
    #[error("Unsupported front matter format (only YAML `---` blocks are read)")]
    UnsupportedFormat,
    #[error("Front matter is not a mapping")]
    NotAMapping,
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Metadata block of a content entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// ISO-8601 date or timestamp, kept as written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// A single string is read as a one-element list, as Hugo does.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
    /// Cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Permalink override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(tag)) => vec![tag],
        Some(OneOrMany::Many(tags)) => tags,
    })
}

/// A single content file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentEntry {
    pub front_matter: FrontMatter,
    pub body: String,
    /// Front matter as written; empty for entries built in memory.
    raw: Mapping,
}

/// Split a document into its raw front matter block and body.
///
/// Returns `Ok(None)` when the document does not open with `---`, and
/// [`FrontMatterError::UnsupportedFormat`] when it opens with `+++`.
pub fn split_front_matter(content: &str) -> Result<Option<(&str, &str)>, FrontMatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let first_end = content.find('\n').unwrap_or(content.len());
    match content[..first_end].trim_end() {
        "---" => {}
        "+++" => return Err(FrontMatterError::UnsupportedFormat),
        _ => return Ok(None),
    }

    let yaml_start = (first_end + 1).min(content.len());
    let mut offset = yaml_start;
    for line in content[yaml_start..].split_inclusive('\n') {
        let bare = line.trim_end();
        if bare == "---" || bare == "..." {
            let yaml = &content[yaml_start..offset];
            let rest = &content[offset + line.len()..];
            let body = rest
                .strip_prefix("\r\n")
                .or_else(|| rest.strip_prefix('\n'))
                .unwrap_or(rest);
            return Ok(Some((yaml, body)));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

impl ContentEntry {
    pub fn new(front_matter: FrontMatter, body: impl Into<String>) -> Self {
        Self {
            front_matter,
            body: body.into(),
            raw: Mapping::new(),
        }
    }

    /// Parse a document that must carry a front matter block.
    pub fn parse(content: &str) -> Result<Self, FrontMatterError> {
        let (yaml, body) = split_front_matter(content)?.ok_or(FrontMatterError::Missing)?;
        let raw = if yaml.trim().is_empty() {
            Mapping::new()
        } else {
            match serde_yaml::from_str::<Value>(yaml)? {
                Value::Mapping(mapping) => mapping,
                Value::Null => Mapping::new(),
                _ => return Err(FrontMatterError::NotAMapping),
            }
        };
        let front_matter = serde_yaml::from_value(Value::Mapping(raw.clone()))?;
        Ok(Self {
            front_matter,
            body: body.to_string(),
            raw,
        })
    }

    /// Front matter mapping to write: the keys as written, with every key
    /// whose typed value differs replaced in place and new keys appended.
    pub fn front_matter_mapping(&self) -> Result<Mapping, FrontMatterError> {
        let Value::Mapping(typed) = serde_yaml::to_value(&self.front_matter)? else {
            return Err(FrontMatterError::NotAMapping);
        };
        let mut merged = self.raw.clone();
        for (key, value) in typed {
            let unchanged = merged
                .get(&key)
                .is_some_and(|old| normalized(&key, old).as_ref() == Some(&value));
            if !unchanged {
                merged.insert(key, value);
            }
        }
        Ok(merged)
    }

    /// Render back to `---`-delimited front matter followed by the body.
    pub fn to_markdown(&self) -> Result<String, FrontMatterError> {
        let yaml = serde_yaml::to_string(&self.front_matter_mapping()?)?;
        Ok(format!("---\n{yaml}---\n\n{}", self.body))
    }

    /// Every image URL the entry references: the cover image first, then
    /// body embeds in document order. Duplicates are kept.
    pub fn image_refs(&self) -> Vec<String> {
        let mut refs: Vec<String> = self.front_matter.image.iter().cloned().collect();
        refs.extend(body_image_urls(&self.body));
        refs
    }
}

/// How `value` under `key` reads back after a trip through [`FrontMatter`].
///
/// `tags: advent` and `tags: [advent]` normalise to the same value, so a
/// scalar tag written by hand is left alone.
fn normalized(key: &Value, value: &Value) -> Option<Value> {
    let mut single = Mapping::new();
    single.insert(key.clone(), value.clone());
    let front_matter: FrontMatter = serde_yaml::from_value(Value::Mapping(single)).ok()?;
    match serde_yaml::to_value(&front_matter).ok()? {
        Value::Mapping(mapping) => mapping.get(key).cloned(),
        _ => None,
    }
}

/// Destination URLs of Markdown image embeds (`![alt](url)`).
pub fn body_image_urls(markdown: &str) -> Vec<String> {
    Parser::new(markdown)
        .filter_map(|event| match event {
            Event::Start(Tag::Image { dest_url, .. }) => Some(dest_url.to_string()),
            _ => None,
        })
        .collect()
}
