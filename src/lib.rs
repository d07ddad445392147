//! contentgw - Headless-CMS content gateway
//!
//! Sits between a Strapi-style content store with an unstable schema and
//! the code that displays its records. The content store's collections
//! and field names have been renamed repeatedly, so lookups probe an
//! ordered list of candidate collections and read fields by intent
//! keywords instead of exact names.
//!
//! # Modules
//!
//! - `adapters`: External system integrations (content API, Beehiiv)
//! - `resolve`: Content resolution (field extraction, normalization,
//!   media URLs, collection probing)
//! - `newsletter`: Subscription validation and provider flow
//! - `server`: HTTP service (subscribe, resolve, env-check)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Resolve a record by slug or id
//! contentgw resolve my-first-guide
//!
//! # Check content API connectivity
//! contentgw probe
//!
//! # Run the HTTP service
//! contentgw serve --address 0.0.0.0:8080
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod newsletter;
pub mod resolve;
pub mod server;

// Re-export main types at crate root for convenience
pub use adapters::{BeehiivClient, ContentApi, StrapiClient, UpstreamError};
pub use newsletter::{Attribution, NewsletterProvider, SubscribeError, Subscriber};
pub use resolve::{
    extract_text, extract_text_field, find_field, normalize, resolve_media_url, NormalizedRecord,
    ProbeReport, Prober,
};
