//! Cardline Scryfall - card artwork lookup and download
//!
//! Resolves (name, set) pairs through Scryfall's fuzzy named-card endpoint
//! and saves the artwork under a deterministic local filename.

pub mod api;
pub mod images;

// Re-exports
pub use api::{CardPayload, DEFAULT_BASE_URL, ScryfallClient, image_location_from_body};
pub use images::{DEFAULT_IMAGE_DIR, ImageDownloader};
