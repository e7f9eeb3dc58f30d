use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::ResolutionFailure;
use crate::constants::paths;
use crate::models::AgentCard;

/// Fetches the capability card a peer publishes about itself
#[async_trait]
pub trait CardResolver: Send + Sync {
    async fn fetch_card(&self, address: &str) -> Result<AgentCard, ResolutionFailure>;
}

/// Resolves cards over HTTP from the well-known path, falling back to the legacy path
/// when the current one answers 404.
///
/// Carries no timeout of its own; the directory bounds every call.
#[derive(Debug, Clone)]
pub struct HttpCardResolver {
    client: Client,
}

impl HttpCardResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ResolutionFailure> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, &e))
    }
}

#[async_trait]
impl CardResolver for HttpCardResolver {
    async fn fetch_card(&self, address: &str) -> Result<AgentCard, ResolutionFailure> {
        let base = address.trim_end_matches('/');
        let card_url = format!("{base}{}", paths::AGENT_CARD);

        let mut url = card_url;
        let mut response = self.get(&url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            url = format!("{base}{}", paths::LEGACY_AGENT_CARD);
            debug!(address = %address, url = %url, "Card not found, trying legacy path");
            response = self.get(&url).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionFailure::unreachable(format!(
                "HTTP {} from {url}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_request_error(&url, &e))?;

        parse_card(&body)
    }
}

/// Parse and sanity-check a card body
pub fn parse_card(body: &[u8]) -> Result<AgentCard, ResolutionFailure> {
    let card: AgentCard = serde_json::from_slice(body)
        .map_err(|e| ResolutionFailure::malformed(format!("invalid agent card: {e}")))?;

    if card.name.trim().is_empty() {
        return Err(ResolutionFailure::malformed("agent card has an empty name"));
    }

    Ok(card)
}

fn classify_request_error(url: &str, error: &reqwest::Error) -> ResolutionFailure {
    if error.is_timeout() {
        ResolutionFailure::timeout(format!("request to {url} timed out"))
    } else if error.is_decode() {
        ResolutionFailure::malformed(format!("undecodable body from {url}: {error}"))
    } else {
        ResolutionFailure::unreachable(format!("{url}: {error}"))
    }
}
