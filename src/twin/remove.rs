use futures::FutureExt;
use tracing::{debug, warn};

use super::outcome::{settle, Outcome, Step};
use super::watch::delete_watch_webhooks;
use crate::gateway::{GatewayResult, TrelloGateway};

pub const WORKFLOW: &str = "remove_twin";

/// Tears down every twin linked from `card_id`.
///
/// Only the outgoing link on `card_id` is removed; the twin keeps its link back,
/// since the twin itself is archived.
pub async fn remove_twin(gateway: &dyn TrelloGateway, card_id: &str) -> GatewayResult<Outcome> {
    let links = gateway.list_links(card_id).await?;
    if links.is_empty() {
        debug!(card_id, "No twin linked; nothing to remove");
        return Ok(Outcome::default());
    }
    if links.len() > 1 {
        warn!(card_id, count = links.len(), "Card links to several twins; removing all");
    }

    let mut steps = vec![Step::new(
        format!("unwatch {card_id}"),
        delete_watch_webhooks(gateway, card_id).map(|r| r.map(drop)).boxed(),
    )];
    for link in &links {
        let twin = link.linked_card_id.as_str();
        steps.push(Step::new(
            format!("unwatch and archive {twin}"),
            archive_unwatched(gateway, twin).boxed(),
        ));
        steps.push(Step::new(
            format!("unlink {}", link.attachment_id),
            gateway.remove_link(card_id, &link.attachment_id),
        ));
    }
    Ok(settle(WORKFLOW, card_id, steps).await)
}

/// Archives the twin once none of its watch-webhooks is left to echo the write.
///
/// If the webhooks cannot be deleted the twin is left open.
async fn archive_unwatched(gateway: &dyn TrelloGateway, twin_ref: &str) -> GatewayResult<()> {
    let twin_id = gateway.resolve_card_id(twin_ref).await?;
    delete_watch_webhooks(gateway, &twin_id).await?;
    gateway.set_card_closed(&twin_id, true).await
}
