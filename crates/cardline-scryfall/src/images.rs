//! Card image download

use std::path::PathBuf;

use cardline_core::{CardKey, Fetcher, ImageLocation, RowError, block_on, http_client};

/// Default local directory for downloaded artwork
pub const DEFAULT_IMAGE_DIR: &str = "card_images";

/// Saves artwork as `<image_dir>/<name>_<set>.jpg`
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: reqwest::Client,
    image_dir: PathBuf,
}

impl ImageDownloader {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self::with_client(http_client().clone(), image_dir)
    }

    pub fn with_client(client: reqwest::Client, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            image_dir: image_dir.into(),
        }
    }

    /// Where the artwork for `card` is stored
    pub fn image_path(&self, card: &CardKey) -> PathBuf {
        self.image_dir.join(card.image_file_name())
    }
}

impl Fetcher for ImageDownloader {
    fn prepare(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.image_dir)
    }

    fn fetch(&self, card: &CardKey, location: &ImageLocation) -> Result<PathBuf, RowError> {
        let (status, bytes) = block_on(async {
            let resp = self.client.get(location.as_str()).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Ok((status, None));
            }
            let bytes = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, Some(bytes)))
        })?;

        let Some(bytes) = bytes else {
            return Err(RowError::Fetch {
                status: status.as_u16(),
                url: location.to_string(),
            });
        };

        let path = self.image_path(card);
        std::fs::write(&path, &bytes)?;
        log::info!("Downloaded {card} ({} bytes)", bytes.len());
        Ok(path)
    }
}
