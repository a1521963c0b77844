use futures::FutureExt;
use tracing::info;

use super::outcome::{settle, Outcome, Step};
use super::watch::ensure_watch_webhook;
use super::TwinSettings;
use crate::gateway::{GatewayResult, TrelloGateway};

pub const WORKFLOW: &str = "create_twin";

#[derive(Debug)]
pub struct TwinCreated {
    pub twin_id: String,
    pub outcome: Outcome,
}

/// Copies the card into the target list, cross-links both cards and watches both.
///
/// A failed copy aborts with nothing created. Once the copy exists, link and
/// webhook failures leave a partially twinned pair that is only logged.
pub async fn create_twin(
    gateway: &dyn TrelloGateway,
    settings: &TwinSettings,
    card_id: &str,
) -> GatewayResult<TwinCreated> {
    let twin_id = gateway
        .copy_card(card_id, &settings.target_list_id, &settings.keep_from_source)
        .await?;
    info!(card_id, twin_id = %twin_id, "Twin card created");

    let twin = twin_id.as_str();
    let steps = vec![
        Step::new(
            format!("link {card_id} -> {twin}"),
            gateway.create_link(card_id, twin).map(|r| r.map(drop)).boxed(),
        ),
        Step::new(
            format!("link {twin} -> {card_id}"),
            gateway.create_link(twin, card_id).map(|r| r.map(drop)).boxed(),
        ),
        Step::new(
            format!("watch {card_id}"),
            ensure_watch_webhook(gateway, card_id).boxed(),
        ),
        Step::new(format!("watch {twin}"), ensure_watch_webhook(gateway, twin).boxed()),
    ];
    let outcome = settle(WORKFLOW, card_id, steps).await;

    Ok(TwinCreated { twin_id, outcome })
}
