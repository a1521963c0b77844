use futures::future::join_all;
use tracing::{debug, warn};

use crate::gateway::{GatewayResult, TrelloGateway};

/// Leaves exactly one active watch-webhook on the card when none or one existed.
pub async fn ensure_watch_webhook(gateway: &dyn TrelloGateway, card_id: &str) -> GatewayResult<()> {
    let existing = gateway.list_watch_webhooks_for_card(card_id).await?;
    if existing.is_empty() {
        let id = gateway.create_watch_webhook(card_id).await?;
        debug!(card_id, webhook_id = %id, "Watch-webhook created");
        return Ok(());
    }

    if existing.len() > 1 {
        warn!(card_id, count = existing.len(), "Card carries several watch-webhooks");
    }
    for webhook in existing.iter().filter(|w| !w.active) {
        gateway.set_webhook_active(&webhook.id, true).await?;
    }
    Ok(())
}

/// Deletes every watch-webhook bound to the card, returning how many went away.
///
/// All deletions are attempted; the first failure is returned afterwards.
pub async fn delete_watch_webhooks(gateway: &dyn TrelloGateway, card_id: &str) -> GatewayResult<usize> {
    let webhooks = gateway.list_watch_webhooks_for_card(card_id).await?;
    let results = join_all(webhooks.iter().map(|w| gateway.delete_webhook(&w.id))).await;

    let mut deleted = 0;
    let mut first_error = None;
    for (webhook, result) in webhooks.iter().zip(results) {
        match result {
            Ok(()) => deleted += 1,
            Err(e) => {
                warn!(card_id, webhook_id = %webhook.id, error = %e, "Failed to delete watch-webhook");
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(deleted),
    }
}
