use futures::future::join_all;
use tracing::{debug, warn};

use super::outcome::Outcome;
use crate::gateway::{GatewayResult, TrelloGateway};

pub const WORKFLOW: &str = "sync_status";

/// Mirrors the archive status of `card_id` onto each twin it links to.
///
/// Twins are handled concurrently; each twin's own sequence is strict.
pub async fn sync_status(
    gateway: &dyn TrelloGateway,
    card_id: &str,
    closed: bool,
) -> GatewayResult<Outcome> {
    let links = gateway.list_links(card_id).await?;
    if links.is_empty() {
        debug!(card_id, "No twin linked; nothing to mirror");
        return Ok(Outcome::default());
    }
    if links.len() > 1 {
        warn!(card_id, count = links.len(), "Card links to several twins; mirroring to all");
    }

    let results = join_all(
        links
            .iter()
            .map(|link| mirror_closed(gateway, &link.linked_card_id, closed)),
    )
    .await;

    let mut outcome = Outcome::default();
    for (link, result) in links.iter().zip(&results) {
        outcome.record(
            WORKFLOW,
            card_id,
            &format!("mirror closed={closed} onto {}", link.linked_card_id),
            result,
        );
    }
    Ok(outcome)
}

/// Writes `closed` on the twin with its watch-webhooks switched off.
///
/// `twin_ref` may be a short link; webhooks are bound to the full ID, so it is
/// resolved first. The write is skipped if the webhooks cannot be disabled,
/// since it would otherwise echo back into this workflow. Re-enabling is
/// attempted even when the write fails.
pub async fn mirror_closed(gateway: &dyn TrelloGateway, twin_ref: &str, closed: bool) -> GatewayResult<()> {
    let twin = gateway.resolve_card_id(twin_ref).await?;
    let twin_id = twin.as_str();
    let webhooks = gateway.list_watch_webhooks_for_card(twin_id).await?;
    if webhooks.is_empty() {
        warn!(twin_id, "Twin has no watch-webhook; writing status without suppression");
    } else if webhooks.len() > 1 {
        warn!(twin_id, count = webhooks.len(), "Twin carries several watch-webhooks");
    }

    let mut disabled: Vec<&str> = Vec::with_capacity(webhooks.len());
    for webhook in &webhooks {
        if !webhook.active {
            disabled.push(&webhook.id);
            continue;
        }
        if let Err(e) = gateway.set_webhook_active(&webhook.id, false).await {
            let _ = restore(gateway, twin_id, &disabled).await;
            return Err(e);
        }
        disabled.push(&webhook.id);
    }

    let write = gateway.set_card_closed(twin_id, closed).await;
    let restored = restore(gateway, twin_id, &disabled).await;
    write?;
    restored
}

async fn restore(gateway: &dyn TrelloGateway, twin_id: &str, webhook_ids: &[&str]) -> GatewayResult<()> {
    let mut first_error = None;
    for id in webhook_ids {
        if let Err(e) = gateway.set_webhook_active(id, true).await {
            warn!(twin_id, webhook_id = %id, error = %e, "Watch-webhook left disabled");
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
