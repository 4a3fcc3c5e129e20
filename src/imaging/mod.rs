//! Cover image generation.
//!
//! | Piece | Role |
//! |---|---|
//! | [`ImageGenerator`] | Trait: citation in, PNG bytes out |
//! | [`PlaceholderGenerator`] | Solid-colour PNG via the `image` crate |
//!
//! The generator is a seam: the daily pipeline only needs PNG bytes to hand
//! to the media host, and tests swap in a recording generator.

pub mod backend;
pub mod placeholder;

pub use backend::{Dimensions, ImageGenerator, ImagingError, MAX_SIDE};
pub use placeholder::PlaceholderGenerator;
