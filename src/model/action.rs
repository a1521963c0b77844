use serde::Deserialize;

/// Body Trello POSTs to a webhook callback.
#[derive(Debug, Deserialize)]
pub struct WebhookDelivery {
    pub action: Action,
    #[serde(default)]
    pub model: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub data: ActionData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionData {
    #[serde(default)]
    pub id_member: Option<String>,
    #[serde(default)]
    pub card: Option<ActionCard>,
    /// Previous values of the fields an `updateCard` changed.
    #[serde(default)]
    pub old: Option<OldValues>,
}

#[derive(Debug, Deserialize)]
pub struct ActionCard {
    pub id: String,
    #[serde(default)]
    pub closed: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OldValues {
    #[serde(default)]
    pub closed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    AddMemberToCard,
    RemoveMemberFromCard,
    UpdateCard,
    Other,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self.action_type.as_str() {
            "addMemberToCard" => ActionKind::AddMemberToCard,
            "removeMemberFromCard" => ActionKind::RemoveMemberFromCard,
            "updateCard" => ActionKind::UpdateCard,
            _ => ActionKind::Other,
        }
    }

    pub fn card_id(&self) -> Option<&str> {
        self.data.card.as_ref().map(|c| c.id.as_str())
    }

    pub fn member_id(&self) -> Option<&str> {
        self.data.id_member.as_deref()
    }

    /// New archive status, when this update changed `closed`.
    ///
    /// A missing `old.closed` still counts as a change, since Trello only puts
    /// `closed` on the card snapshot of an update that touched it.
    pub fn closed_change(&self) -> Option<bool> {
        let closed = self.data.card.as_ref()?.closed?;
        let old = self.data.old.as_ref().and_then(|o| o.closed);
        match old {
            Some(previous) if previous == closed => None,
            _ => Some(closed),
        }
    }
}
