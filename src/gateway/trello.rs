use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use urlencoding::encode;

use super::{GatewayError, GatewayResult, Link, TrelloGateway, WatchWebhook};
use crate::config::TrelloConfig;
use crate::gateway::link::{is_full_id, permalink};

pub const DEFAULT_API_BASE: &str = "https://api.trello.com/1";

pub struct TrelloClient {
    api_key: String,
    token: String,
    base: String,
    callback_url: String,
    client: reqwest::Client,
}

impl TrelloClient {
    pub fn new(config: &TrelloConfig, callback_url: String) -> Self {
        Self {
            api_key: config.api_key.clone(),
            token: config.api_token.clone(),
            base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            callback_url,
            client: reqwest::Client::new(),
        }
    }

    fn auth_params(&self) -> [(&str, &str); 2] {
        [("key", &self.api_key), ("token", &self.token)]
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(method = %method, path, "Trello request");
        self.client
            .request(method, format!("{}{path}", self.base))
            .query(&self.auth_params())
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send(&self, request: RequestBuilder) -> GatewayResult<String> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct Attachment {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Webhook {
    id: String,
    id_model: String,
    #[serde(rename = "callbackURL")]
    callback_url: String,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

fn links_from_attachments(attachments: Vec<Attachment>) -> Vec<Link> {
    attachments
        .into_iter()
        .filter_map(|a| {
            let url = a.url?;
            Link::from_attachment(&a.id, &url)
        })
        .collect()
}

fn watch_webhooks(webhooks: Vec<Webhook>, callback_url: &str) -> Vec<WatchWebhook> {
    webhooks
        .into_iter()
        .filter(|w| w.callback_url == callback_url)
        .map(|w| WatchWebhook {
            id: w.id,
            card_id: w.id_model,
            active: w.active,
        })
        .collect()
}

#[async_trait]
impl TrelloGateway for TrelloClient {
    async fn copy_card(
        &self,
        source_card_id: &str,
        target_list_id: &str,
        keep_from_source: &str,
    ) -> GatewayResult<String> {
        let created: Created = self
            .send_json(self.request(Method::POST, "/cards").query(&[
                ("idList", target_list_id),
                ("idCardSource", source_card_id),
                ("pos", "top"),
                ("keepFromSource", keep_from_source),
            ]))
            .await?;
        Ok(created.id)
    }

    async fn create_link(&self, from_card_id: &str, to_card_id: &str) -> GatewayResult<String> {
        let url = permalink(to_card_id);
        let created: Created = self
            .send_json(
                self.request(
                    Method::POST,
                    &format!("/cards/{}/attachments", encode(from_card_id)),
                )
                .query(&[("url", url.as_str())]),
            )
            .await?;
        Ok(created.id)
    }

    async fn remove_link(&self, card_id: &str, attachment_id: &str) -> GatewayResult<()> {
        self.send(self.request(
            Method::DELETE,
            &format!(
                "/cards/{}/attachments/{}",
                encode(card_id),
                encode(attachment_id)
            ),
        ))
        .await?;
        Ok(())
    }

    async fn list_links(&self, card_id: &str) -> GatewayResult<Vec<Link>> {
        let attachments: Vec<Attachment> = self
            .send_json(
                self.request(
                    Method::GET,
                    &format!("/cards/{}/attachments", encode(card_id)),
                )
                .query(&[("fields", "id,url")]),
            )
            .await?;
        Ok(links_from_attachments(attachments))
    }

    async fn resolve_card_id(&self, card_ref: &str) -> GatewayResult<String> {
        if is_full_id(card_ref) {
            return Ok(card_ref.to_string());
        }
        let card: Created = self
            .send_json(
                self.request(Method::GET, &format!("/cards/{}", encode(card_ref)))
                    .query(&[("fields", "id")]),
            )
            .await?;
        Ok(card.id)
    }

    async fn create_watch_webhook(&self, card_id: &str) -> GatewayResult<String> {
        let created: Created = self
            .send_json(self.request(Method::POST, "/webhooks").query(&[
                ("callbackURL", self.callback_url.as_str()),
                ("idModel", card_id),
            ]))
            .await?;
        Ok(created.id)
    }

    async fn list_watch_webhooks(&self) -> GatewayResult<Vec<WatchWebhook>> {
        let webhooks: Vec<Webhook> = self
            .send_json(self.request(
                Method::GET,
                &format!("/tokens/{}/webhooks", encode(&self.token)),
            ))
            .await?;
        Ok(watch_webhooks(webhooks, &self.callback_url))
    }

    async fn delete_webhook(&self, webhook_id: &str) -> GatewayResult<()> {
        self.send(self.request(
            Method::DELETE,
            &format!("/webhooks/{}", encode(webhook_id)),
        ))
        .await?;
        Ok(())
    }

    async fn set_webhook_active(&self, webhook_id: &str, active: bool) -> GatewayResult<()> {
        let active = active.to_string();
        self.send(
            self.request(Method::PUT, &format!("/webhooks/{}", encode(webhook_id)))
                .query(&[("active", active.as_str())]),
        )
        .await?;
        Ok(())
    }

    async fn set_card_closed(&self, card_id: &str, closed: bool) -> GatewayResult<()> {
        let closed = closed.to_string();
        self.send(
            self.request(Method::PUT, &format!("/cards/{}", encode(card_id)))
                .query(&[("closed", closed.as_str())]),
        )
        .await?;
        Ok(())
    }
}
