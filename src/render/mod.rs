//! Presentation rendering for card records.
//!
//! Pure, deterministic mappings from a [`Card`](crate::scryfall::Card) to
//! either a plain-text summary (for hosts without a visual surface) or
//! escaped HTML (for the card viewer). Both the fetch tool and the viewer
//! document follow the markup rules defined here, so the two rendering
//! paths cannot drift apart.

pub mod html;
pub mod text;

pub use html::render_card_html;
pub use text::format_card_text;
