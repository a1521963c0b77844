use std::sync::OnceLock;

use regex::Regex;

const PERMALINK_PREFIX: &str = "https://trello.com/c/";

/// An attachment on one card pointing at its twin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub attachment_id: String,
    pub linked_card_id: String,
}

fn permalink_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https://trello\.com/c/(\w+)(?:/.*)?$").expect("permalink pattern is valid")
    })
}

pub fn permalink(card_id: &str) -> String {
    format!("{PERMALINK_PREFIX}{card_id}")
}

/// Extracts the card ID from a card permalink, or `None` for any other URL.
pub fn linked_card_id(url: &str) -> Option<&str> {
    permalink_pattern()
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether `id` is a full Trello object ID rather than a card short link.
pub fn is_full_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Link {
    pub fn from_attachment(attachment_id: &str, url: &str) -> Option<Self> {
        linked_card_id(url).map(|card_id| Link {
            attachment_id: attachment_id.to_string(),
            linked_card_id: card_id.to_string(),
        })
    }
}
