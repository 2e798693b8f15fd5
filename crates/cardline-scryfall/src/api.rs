//! Scryfall card lookup

use cardline_core::{CardKey, ImageLocation, Resolver, RowError, block_on, http_client};
use serde::Deserialize;

/// Fuzzy named-card endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.scryfall.com/cards/named";

/// Subset of a Scryfall card object needed to locate artwork
#[derive(Debug, Default, Deserialize)]
pub struct CardPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    /// Present on multi-faced cards; images may live here instead
    #[serde(default)]
    pub card_faces: Option<Vec<CardFace>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageUris {
    #[serde(default)]
    pub normal: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CardFace {
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

impl CardPayload {
    /// `image_uris.normal`, else `card_faces[0].image_uris.normal`.
    ///
    /// Only the first face is consulted.
    pub fn image_location(&self) -> Option<ImageLocation> {
        let normal = |uris: &Option<ImageUris>| uris.as_ref().and_then(|u| u.normal.clone());
        normal(&self.image_uris)
            .or_else(|| {
                self.card_faces
                    .as_ref()
                    .and_then(|faces| faces.first())
                    .and_then(|face| normal(&face.image_uris))
            })
            .map(ImageLocation)
    }
}

/// Parse a lookup response body and pick the artwork location.
pub fn image_location_from_body(card: &CardKey, body: &str) -> Result<ImageLocation, RowError> {
    let payload: CardPayload = serde_json::from_str(body)
        .map_err(|e| RowError::Decode(format!("card lookup for {card}: {e}")))?;
    payload.image_location().ok_or_else(|| RowError::NotFound {
        name: card.name.clone(),
        set_code: card.set_code.clone(),
    })
}

/// Resolver backed by the Scryfall REST API
#[derive(Debug, Clone)]
pub struct ScryfallClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScryfallClient {
    /// Client on the shared connection pool
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(http_client().clone(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for ScryfallClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Resolver for ScryfallClient {
    fn resolve(&self, card: &CardKey) -> Result<ImageLocation, RowError> {
        let (status, body) = block_on(async {
            let resp = self
                .client
                .get(&self.base_url)
                .query(&[
                    ("fuzzy", card.name.as_str()),
                    ("set", card.set_code.as_str()),
                ])
                .send()
                .await?;
            let status = resp.status();
            if !status.is_success() {
                return Ok((status, String::new()));
            }
            let body = resp.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        })?;

        if !status.is_success() {
            return Err(RowError::Lookup {
                name: card.name.clone(),
                set_code: card.set_code.clone(),
                status: status.as_u16(),
            });
        }
        image_location_from_body(card, &body)
    }
}
