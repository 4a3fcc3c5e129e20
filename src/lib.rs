//! # Lectionary
//!
//! A daily post generator for a Hugo devotional site. Each morning it looks
//! up the day's readings, composes a Markdown post with YAML front matter,
//! gives it a cover image on Cloudinary, and rebuilds the site.
//!
//! # Architecture: One Pipeline, Swappable Effects
//!
//! ```text
//! readings.tsv ─► DayReadings ─► Selection (title, slug, public id)
//!                                   │
//!                 ScriptureSource ──┼─► body ──────────────┐
//!                 ImageGenerator ───┴─► PNG ─► ImageHost ──┴─► content/post/<slug>.md ─► hugo
//! ```
//!
//! Passage lookup, image generation and upload are traits. The CLI wires in
//! the real implementations; tests wire in recording doubles and run the
//! whole pipeline against a temporary copy of `fixtures/`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`daily`] | The pipeline: date → readings row → post → site build |
//! | [`readings`] | Tab-separated readings table loader |
//! | [`metadata`] | Title / slug / public id selection with fallbacks |
//! | [`naming`] | Slug and whitespace normalisation |
//! | [`scripture`] | Citation → passage text |
//! | [`render`] | Markdown body composition |
//! | [`imaging`] | Cover image generation |
//! | [`cloudinary`] | Signed uploads and versioned delivery URLs |
//! | [`cache`] | Skip re-uploading an unchanged cover |
//! | [`entry`] | Front matter + body parsing and rendering |
//! | [`post`] | Writing a post while keeping hand-edited metadata |
//! | [`site`] | Running the static-site build |
//! | [`check`] | Front matter and image link validation |
//! | [`config`] | `lectionary.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Re-runs Are Safe
//!
//! The job is re-run whenever something goes wrong, so every step is
//! idempotent: the post path is derived from the readings alone, existing
//! titles and dates are kept, unknown front matter keys survive, and an
//! unchanged cover is not uploaded again.
//!
//! ## Versioned Cover URLs
//!
//! A cover is re-uploaded over the same public id. The URL written into front
//! matter carries the asset version so the CDN can never serve the old image
//! under the new post.

pub mod cache;
pub mod check;
pub mod cloudinary;
pub mod config;
pub mod daily;
pub mod entry;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod post;
pub mod readings;
pub mod render;
pub mod scripture;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;
