//! Cloudinary upload with cache-busting delivery URLs.
//!
//! Covers are uploaded with a signed request so the API secret never leaves
//! this process. Every upload asks Cloudinary to overwrite the asset and
//! invalidate CDN copies, and the URL written to front matter carries the
//! asset version (`/v<version>/`), so a re-generated cover shows up on the
//! site immediately instead of after the CDN TTL expires.
//!
//! ## Credentials
//!
//! Read from the environment, first match wins:
//!
//! ```text
//! CLOUDINARY_URL=cloudinary://<api_key>:<api_secret>@<cloud_name>
//!
//! CLOUDINARY_API_KEY=...
//! CLOUDINARY_API_SECRET=...
//! CLOUDINARY_CLOUD_NAME=...
//! ```
//!
//! ## Signing
//!
//! Cloudinary signs every parameter it receives except `file`, `api_key`,
//! and the signature itself: sort by name, join as `k=v` with `&`, append
//! the secret, and take the hex digest. For this uploader that is always
//!
//! ```text
//! format=webp&invalidate=true&overwrite=true&public_id=<id>&timestamp=<unix><secret>
//! ```

use crate::config::{CloudinaryConfig, SignatureAlgorithm};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Missing environment variable: {0}")]
    MissingCredential(&'static str),
    #[error("CLOUDINARY_URL is malformed")]
    MalformedUrl,
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Upload rejected ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Unexpected upload response: {0}")]
    Parse(String),
}

/// Account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub cloud_name: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("cloud_name", &self.cloud_name)
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, UploadError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup` (an environment accessor).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, UploadError> {
        if let Some(url) = lookup("CLOUDINARY_URL").filter(|u| !u.trim().is_empty()) {
            return parse_cloudinary_url(&url);
        }
        let get = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(UploadError::MissingCredential(name))
        };
        Ok(Self {
            api_key: get("CLOUDINARY_API_KEY")?,
            api_secret: get("CLOUDINARY_API_SECRET")?,
            cloud_name: get("CLOUDINARY_CLOUD_NAME")?,
        })
    }
}

/// Parse `cloudinary://<api_key>:<api_secret>@<cloud_name>`.
///
/// The key may not contain `:`, the secret may not contain `@`, and the
/// cloud name ends at the first `/` (anything after it is ignored).
pub fn parse_cloudinary_url(url: &str) -> Result<Credentials, UploadError> {
    let rest = url
        .trim()
        .strip_prefix("cloudinary://")
        .ok_or(UploadError::MalformedUrl)?;
    let (api_key, rest) = rest.split_once(':').ok_or(UploadError::MalformedUrl)?;
    let (api_secret, host) = rest.split_once('@').ok_or(UploadError::MalformedUrl)?;
    let cloud_name = host.split('/').next().unwrap_or_default();

    if api_key.is_empty() || api_secret.is_empty() || cloud_name.is_empty() {
        return Err(UploadError::MalformedUrl);
    }
    Ok(Credentials {
        api_key: api_key.to_string(),
        api_secret: api_secret.to_string(),
        cloud_name: cloud_name.to_string(),
    })
}

/// Hex signature over `params` (sorted by name) followed by `secret`.
pub fn sign(params: &[(&str, &str)], secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let payload = format!("{joined}{secret}");

    match algorithm {
        SignatureAlgorithm::Sha1 => format!("{:x}", Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => format!("{:x}", Sha256::digest(payload.as_bytes())),
    }
}

/// Public delivery URL for an uploaded asset.
///
/// ```text
/// https://res.cloudinary.com/<cloud>/image/upload/<transform>/v<version>/<public_id>.<format>
/// ```
///
/// The version segment is omitted when unknown; an empty transform is
/// omitted too.
pub fn delivery_url(
    cloud_name: &str,
    transform: &str,
    public_id: &str,
    format: &str,
    version: Option<u64>,
) -> String {
    let mut url = format!("https://res.cloudinary.com/{cloud_name}/image/upload");
    if !transform.is_empty() {
        url.push('/');
        url.push_str(transform);
    }
    if let Some(v) = version {
        url.push_str(&format!("/v{v}"));
    }
    url.push_str(&format!("/{public_id}.{format}"));
    url
}

/// Destination for cover images.
pub trait ImageHost {
    /// Upload PNG bytes under `public_id` and return the delivery URL.
    fn upload(&self, png: &[u8], public_id: &str) -> Result<String, UploadError>;

    /// Identifies the settings that shape the delivery URL (account, format,
    /// transformation). A cached URL is only reused under the same value.
    fn fingerprint(&self) -> String;
}

/// Signed uploads to the Cloudinary upload API.
pub struct CloudinaryHost {
    credentials: Credentials,
    config: CloudinaryConfig,
    agent: ureq::Agent,
}

impl CloudinaryHost {
    pub fn new(credentials: Credentials, config: CloudinaryConfig) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::config::Config::builder()
                .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
                .http_status_as_error(false)
                .build(),
        );
        Self {
            credentials,
            config,
            agent,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.credentials.cloud_name
        )
    }

    /// Form fields for an upload at `timestamp` (unix seconds).
    pub fn upload_form(
        &self,
        png: &[u8],
        public_id: &str,
        timestamp: i64,
    ) -> Vec<(String, String)> {
        let timestamp = timestamp.to_string();
        let signed: [(&str, &str); 5] = [
            ("format", self.config.format.as_str()),
            ("invalidate", "true"),
            ("overwrite", "true"),
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = sign(
            &signed,
            &self.credentials.api_secret,
            self.config.signature_algorithm,
        );

        let mut form: Vec<(String, String)> = signed
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        form.push(("api_key".to_string(), self.credentials.api_key.clone()));
        form.push(("signature".to_string(), signature));
        form.push((
            "file".to_string(),
            format!("data:image/png;base64,{}", STANDARD.encode(png)),
        ));
        form
    }
}

impl ImageHost for CloudinaryHost {
    fn upload(&self, png: &[u8], public_id: &str) -> Result<String, UploadError> {
        let form = self.upload_form(png, public_id, chrono::Utc::now().timestamp());
        tracing::debug!(public_id, bytes = png.len(), "uploading cover");

        let mut response = self
            .agent
            .post(self.endpoint())
            .send_form(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .map_err(|e| UploadError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| UploadError::Http(e.to_string()))?;

        let version = parse_upload_response(status, &text)?;
        Ok(delivery_url(
            &self.credentials.cloud_name,
            &self.config.transform,
            public_id,
            &self.config.format,
            version,
        ))
    }

    fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}",
            self.credentials.cloud_name, self.config.format, self.config.transform
        )
    }
}

/// Extract the asset version from an upload response.
///
/// Non-2xx statuses become [`UploadError::Api`] carrying Cloudinary's
/// `error.message` when present, the raw body otherwise.
pub fn parse_upload_response(status: u16, body: &str) -> Result<Option<u64>, UploadError> {
    let json: Option<Value> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        let message = json
            .as_ref()
            .and_then(|j| j.pointer("/error/message"))
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| body.trim().to_string());
        return Err(UploadError::Api { status, message });
    }

    let json = json.ok_or_else(|| UploadError::Parse(body.trim().to_string()))?;
    let version = match json.get("version") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };
    Ok(version)
}
