pub mod link;
pub mod trello;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

pub use link::Link;

/// Failure of a single Trello REST call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Trello returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Trello request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected Trello response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// A webhook registered by this service (callback URL already matched).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchWebhook {
    pub id: String,
    pub card_id: String,
    pub active: bool,
}

/// Every network operation the twinning workflows perform.
///
/// Implementations make exactly one request per call and never retry.
#[async_trait]
pub trait TrelloGateway: Send + Sync {
    /// Copies `source_card_id` to the top of `target_list_id`, returning the new card ID.
    async fn copy_card(
        &self,
        source_card_id: &str,
        target_list_id: &str,
        keep_from_source: &str,
    ) -> GatewayResult<String>;

    /// Attaches a permalink to `to_card_id` on `from_card_id`, returning the attachment ID.
    async fn create_link(&self, from_card_id: &str, to_card_id: &str) -> GatewayResult<String>;

    async fn remove_link(&self, card_id: &str, attachment_id: &str) -> GatewayResult<()>;

    /// Card-permalink attachments on `card_id`. Other attachments are skipped.
    async fn list_links(&self, card_id: &str) -> GatewayResult<Vec<Link>>;

    /// Full 24-character ID of a card known by its short link or full ID.
    async fn resolve_card_id(&self, card_ref: &str) -> GatewayResult<String>;

    async fn create_watch_webhook(&self, card_id: &str) -> GatewayResult<String>;

    /// All webhooks of the token whose callback URL is the configured one.
    async fn list_watch_webhooks(&self) -> GatewayResult<Vec<WatchWebhook>>;

    async fn list_watch_webhooks_for_card(&self, card_id: &str) -> GatewayResult<Vec<WatchWebhook>> {
        Ok(self
            .list_watch_webhooks()
            .await?
            .into_iter()
            .filter(|w| w.card_id == card_id)
            .collect())
    }

    async fn delete_webhook(&self, webhook_id: &str) -> GatewayResult<()>;

    async fn set_webhook_active(&self, webhook_id: &str, active: bool) -> GatewayResult<()>;

    async fn set_card_closed(&self, card_id: &str, closed: bool) -> GatewayResult<()>;
}
