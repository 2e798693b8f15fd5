//! Imgur anonymous image upload

use std::path::Path;

use cardline_core::{Publisher, RowError, block_on, http_client};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Image upload endpoint
pub const DEFAULT_API_URL: &str = "https://api.imgur.com/3/image";

/// Longest response payload kept in an error message
const MAX_PAYLOAD_CHARS: usize = 512;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default)]
    link: Option<String>,
}

/// Pull `data.link` out of a successful upload response.
pub fn link_from_body(body: &str) -> Result<String, RowError> {
    let parsed: UploadResponse = serde_json::from_str(body)
        .map_err(|e| RowError::Decode(format!("upload response: {e}")))?;
    parsed
        .data
        .link
        .filter(|link| !link.is_empty())
        .ok_or_else(|| RowError::Decode("upload response has no data.link".to_string()))
}

fn truncate_payload(body: &str) -> String {
    match body.char_indices().nth(MAX_PAYLOAD_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Publisher that re-hosts images on Imgur using an application client id
#[derive(Clone)]
pub struct ImgurClient {
    client: reqwest::Client,
    api_url: String,
    client_id: String,
}

impl std::fmt::Debug for ImgurClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImgurClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl ImgurClient {
    pub fn new(api_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self::with_client(http_client().clone(), api_url, client_id)
    }

    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            client_id: client_id.into(),
        }
    }

    fn authorization(&self) -> String {
        format!("Client-ID {}", self.client_id)
    }
}

impl Publisher for ImgurClient {
    fn publish(&self, image: &Path) -> Result<String, RowError> {
        let bytes = std::fs::read(image)?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());

        let form = Form::new().part("image", Part::bytes(bytes).file_name(file_name));
        let (status, body) = block_on(async move {
            let resp = self
                .client
                .post(&self.api_url)
                .header(reqwest::header::AUTHORIZATION, self.authorization())
                .multipart(form)
                .send()
                .await?;
            let status = resp.status();
            let body = resp.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })?;

        if !status.is_success() {
            log::debug!("upload of {} rejected: {status}", image.display());
            return Err(RowError::Upload {
                status: status.as_u16(),
                payload: truncate_payload(&body),
            });
        }
        let link = link_from_body(&body)?;
        log::info!("Uploaded {} -> {link}", image.display());
        Ok(link)
    }
}
