//! Cardline Imgur - re-host card images on Imgur

pub mod upload;

pub use upload::{DEFAULT_API_URL, ImgurClient, link_from_body};
