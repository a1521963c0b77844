use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{GatewayError, GatewayResult, Link, TrelloGateway, WatchWebhook};

/// A gateway call as seen by the in-memory board.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    CopyCard { source: String, list: String },
    CreateLink { from: String, to: String },
    RemoveLink { card: String, attachment: String },
    ListLinks(String),
    ResolveCard(String),
    CreateWebhook(String),
    ListWebhooks,
    DeleteWebhook(String),
    SetWebhookActive { webhook: String, active: bool },
    SetCardClosed { card: String, closed: bool },
}

/// Which operation to fail, for injecting partial failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CopyCard,
    CreateLink,
    RemoveLink,
    ListLinks,
    ResolveCard,
    CreateWebhook,
    ListWebhooks,
    DeleteWebhook,
    /// Both directions of `set_webhook_active`.
    SetWebhookActive,
    DisableWebhook,
    EnableWebhook,
    SetCardClosed,
}

#[derive(Default)]
struct Board {
    links: HashMap<String, Vec<Link>>,
    webhooks: Vec<WatchWebhook>,
    closed: HashMap<String, bool>,
    short_links: HashMap<String, String>,
    copy_ids: VecDeque<String>,
    next_id: u32,
    /// Active flag of the card's webhooks at the moment each `set_card_closed` ran.
    writes_seen_by_webhooks: Vec<(String, Vec<bool>)>,
}

impl Board {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

/// In-memory stand-in for Trello that records every call.
#[derive(Default)]
pub struct MockGateway {
    pub calls: Arc<Mutex<Vec<Call>>>,
    board: Mutex<Board>,
    failing: Mutex<HashSet<Op>>,
    /// Yield once inside webhook lookups, as a network round trip would.
    slow_lookups: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_copy_id(self, id: &str) -> Self {
        self.board.lock().unwrap().copy_ids.push_back(id.to_string());
        self
    }

    pub fn with_link(self, from: &str, attachment_id: &str, to: &str) -> Self {
        self.board
            .lock()
            .unwrap()
            .links
            .entry(from.to_string())
            .or_default()
            .push(Link {
                attachment_id: attachment_id.to_string(),
                linked_card_id: to.to_string(),
            });
        self
    }

    pub fn with_webhook(self, id: &str, card_id: &str, active: bool) -> Self {
        self.board.lock().unwrap().webhooks.push(WatchWebhook {
            id: id.to_string(),
            card_id: card_id.to_string(),
            active,
        });
        self
    }

    pub fn with_short_link(self, short_link: &str, full_id: &str) -> Self {
        self.board
            .lock()
            .unwrap()
            .short_links
            .insert(short_link.to_string(), full_id.to_string());
        self
    }

    pub fn with_slow_lookups(mut self) -> Self {
        self.slow_lookups = true;
        self
    }

    pub fn failing(self, op: Op) -> Self {
        self.failing.lock().unwrap().insert(op);
        self
    }

    /// Stops injecting failures for `op`.
    pub fn recover(&self, op: Op) {
        self.failing.lock().unwrap().remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change state on the board, in order.
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::ListLinks(_) | Call::ListWebhooks | Call::ResolveCard(_)))
            .collect()
    }

    pub fn links_on(&self, card_id: &str) -> Vec<Link> {
        self.board
            .lock()
            .unwrap()
            .links
            .get(card_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn webhooks_on(&self, card_id: &str) -> Vec<WatchWebhook> {
        self.board
            .lock()
            .unwrap()
            .webhooks
            .iter()
            .filter(|w| w.card_id == card_id)
            .cloned()
            .collect()
    }

    pub fn is_closed(&self, card_id: &str) -> Option<bool> {
        self.board.lock().unwrap().closed.get(card_id).copied()
    }

    pub fn writes_seen_by_webhooks(&self) -> Vec<(String, Vec<bool>)> {
        self.board.lock().unwrap().writes_seen_by_webhooks.clone()
    }

    fn record(&self, call: Call, op: Op) -> GatewayResult<()> {
        self.record_any(call, &[op])
    }

    fn record_any(&self, call: Call, ops: &[Op]) -> GatewayResult<()> {
        self.calls.lock().unwrap().push(call);
        let failing = self.failing.lock().unwrap();
        if let Some(op) = ops.iter().find(|op| failing.contains(*op)) {
            return Err(GatewayError::Remote {
                status: 500,
                body: format!("injected {op:?} failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TrelloGateway for MockGateway {
    async fn copy_card(
        &self,
        source_card_id: &str,
        target_list_id: &str,
        _keep_from_source: &str,
    ) -> GatewayResult<String> {
        self.record(
            Call::CopyCard {
                source: source_card_id.into(),
                list: target_list_id.into(),
            },
            Op::CopyCard,
        )?;
        let mut board = self.board.lock().unwrap();
        if let Some(id) = board.copy_ids.pop_front() {
            return Ok(id);
        }
        Ok(board.fresh_id("card-"))
    }

    async fn create_link(&self, from_card_id: &str, to_card_id: &str) -> GatewayResult<String> {
        self.record(
            Call::CreateLink {
                from: from_card_id.into(),
                to: to_card_id.into(),
            },
            Op::CreateLink,
        )?;
        let mut board = self.board.lock().unwrap();
        let attachment_id = board.fresh_id("att-");
        board
            .links
            .entry(from_card_id.to_string())
            .or_default()
            .push(Link {
                attachment_id: attachment_id.clone(),
                linked_card_id: to_card_id.to_string(),
            });
        Ok(attachment_id)
    }

    async fn remove_link(&self, card_id: &str, attachment_id: &str) -> GatewayResult<()> {
        self.record(
            Call::RemoveLink {
                card: card_id.into(),
                attachment: attachment_id.into(),
            },
            Op::RemoveLink,
        )?;
        if let Some(links) = self.board.lock().unwrap().links.get_mut(card_id) {
            links.retain(|l| l.attachment_id != attachment_id);
        }
        Ok(())
    }

    async fn list_links(&self, card_id: &str) -> GatewayResult<Vec<Link>> {
        self.record(Call::ListLinks(card_id.into()), Op::ListLinks)?;
        Ok(self.links_on(card_id))
    }

    async fn resolve_card_id(&self, card_ref: &str) -> GatewayResult<String> {
        self.record(Call::ResolveCard(card_ref.into()), Op::ResolveCard)?;
        let board = self.board.lock().unwrap();
        Ok(board
            .short_links
            .get(card_ref)
            .cloned()
            .unwrap_or_else(|| card_ref.to_string()))
    }

    async fn create_watch_webhook(&self, card_id: &str) -> GatewayResult<String> {
        self.record(Call::CreateWebhook(card_id.into()), Op::CreateWebhook)?;
        let mut board = self.board.lock().unwrap();
        let id = board.fresh_id("hook-");
        board.webhooks.push(WatchWebhook {
            id: id.clone(),
            card_id: card_id.to_string(),
            active: true,
        });
        Ok(id)
    }

    async fn list_watch_webhooks(&self) -> GatewayResult<Vec<WatchWebhook>> {
        self.record(Call::ListWebhooks, Op::ListWebhooks)?;
        if self.slow_lookups {
            tokio::task::yield_now().await;
        }
        Ok(self.board.lock().unwrap().webhooks.clone())
    }

    async fn delete_webhook(&self, webhook_id: &str) -> GatewayResult<()> {
        self.record(Call::DeleteWebhook(webhook_id.into()), Op::DeleteWebhook)?;
        let mut board = self.board.lock().unwrap();
        let before = board.webhooks.len();
        board.webhooks.retain(|w| w.id != webhook_id);
        if board.webhooks.len() == before {
            return Err(GatewayError::Remote {
                status: 404,
                body: "The requested resource was not found.".into(),
            });
        }
        Ok(())
    }

    async fn set_webhook_active(&self, webhook_id: &str, active: bool) -> GatewayResult<()> {
        let direction = if active {
            Op::EnableWebhook
        } else {
            Op::DisableWebhook
        };
        self.record_any(
            Call::SetWebhookActive {
                webhook: webhook_id.into(),
                active,
            },
            &[Op::SetWebhookActive, direction],
        )?;
        let mut board = self.board.lock().unwrap();
        for webhook in board.webhooks.iter_mut().filter(|w| w.id == webhook_id) {
            webhook.active = active;
        }
        Ok(())
    }

    async fn set_card_closed(&self, card_id: &str, closed: bool) -> GatewayResult<()> {
        self.record(
            Call::SetCardClosed {
                card: card_id.into(),
                closed,
            },
            Op::SetCardClosed,
        )?;
        let mut board = self.board.lock().unwrap();
        let seen = board
            .webhooks
            .iter()
            .filter(|w| w.card_id == card_id)
            .map(|w| w.active)
            .collect();
        board
            .writes_seen_by_webhooks
            .push((card_id.to_string(), seen));
        board.closed.insert(card_id.to_string(), closed);
        Ok(())
    }
}
