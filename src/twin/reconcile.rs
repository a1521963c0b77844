use std::collections::HashMap;

use futures::future::join_all;
use tracing::{info, warn};

use crate::gateway::{GatewayResult, TrelloGateway};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inspected: usize,
    pub reactivated: usize,
    pub failed: usize,
    /// Cards carrying more than one watch-webhook.
    pub duplicated_cards: Vec<String>,
}

/// Re-activates watch-webhooks left disabled by an interrupted status mirror.
pub async fn reconcile(gateway: &dyn TrelloGateway) -> GatewayResult<ReconcileReport> {
    let webhooks = gateway.list_watch_webhooks().await?;

    let mut per_card: HashMap<&str, usize> = HashMap::new();
    for webhook in &webhooks {
        *per_card.entry(webhook.card_id.as_str()).or_default() += 1;
    }
    let mut duplicated_cards: Vec<String> = per_card
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(card, _)| card.to_string())
        .collect();
    duplicated_cards.sort();
    for card_id in &duplicated_cards {
        warn!(card_id = %card_id, "Card carries several watch-webhooks");
    }

    let stuck: Vec<_> = webhooks.iter().filter(|w| !w.active).collect();
    let results = join_all(stuck.iter().map(|w| gateway.set_webhook_active(&w.id, true))).await;

    let mut report = ReconcileReport {
        inspected: webhooks.len(),
        duplicated_cards,
        ..Default::default()
    };
    for (webhook, result) in stuck.iter().zip(results) {
        match result {
            Ok(()) => {
                report.reactivated += 1;
                info!(webhook_id = %webhook.id, card_id = %webhook.card_id, "Watch-webhook re-activated");
            }
            Err(e) => {
                report.failed += 1;
                warn!(webhook_id = %webhook.id, card_id = %webhook.card_id, error = %e, "Failed to re-activate watch-webhook");
            }
        }
    }
    Ok(report)
}
