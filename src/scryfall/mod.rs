//! Rate-limited Scryfall API client.
//!
//! Scryfall asks clients to space requests 50-100ms apart and stay under
//! 10 requests per second. This module enforces that politeness contract
//! with a single process-wide [`RateLimiter`] owned by the client, and
//! normalises every failure (non-2xx status or transport error) into one
//! [`ApiFailure`] value so callers have a single error channel.
//!
//! Only the first page of search results is ever fetched; `has_more` is
//! decoded and reported but pagination is never followed.

pub mod client;
pub mod limiter;
pub mod types;

pub use client::ScryfallClient;
pub use limiter::RateLimiter;
pub use types::{ApiFailure, Card, CardFace, SearchResponse};
