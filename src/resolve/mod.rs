//! Content resolution layer.
//!
//! Pure shape-handling for the loosely-typed content store (field
//! extraction, record normalization, media URL resolution) plus the
//! collection prober that drives lookups against the content API.

pub mod fields;
pub mod media;
pub mod probe;
pub mod record;

pub use fields::{extract_text, extract_text_field, find_field};
pub use media::resolve_media_url;
pub use probe::{ProbeReport, Prober};
pub use record::{normalize, NormalizedRecord};
