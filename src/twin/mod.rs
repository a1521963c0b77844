//! Card twinning: keeping a card and its copy on another list mirrored.
//!
//! A twin pair is two cards that each carry a permalink attachment to the
//! other and a watch-webhook pointing at the status-sync endpoint. Adding the
//! trigger member to a card creates the pair, removing the member tears it
//! down, and archiving or restoring either card is mirrored onto the other.

pub mod create;
pub mod outcome;
pub mod reconcile;
pub mod remove;
pub mod status;
pub mod watch;


use tracing::{debug, error};

use crate::config::TwinConfig;
use crate::gateway::TrelloGateway;
use crate::model::action::{Action, ActionKind};

#[derive(Debug, Clone)]
pub struct TwinSettings {
    pub ref_member_id: String,
    pub target_list_id: String,
    pub keep_from_source: String,
}

impl From<&TwinConfig> for TwinSettings {
    fn from(config: &TwinConfig) -> Self {
        Self {
            ref_member_id: config.ref_member_id.clone(),
            target_list_id: config.target_list_id.clone(),
            keep_from_source: config.keep_from_source.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workflow {
    CreateTwin { card_id: String },
    RemoveTwin { card_id: String },
    SyncStatus { card_id: String, closed: bool },
}

/// Which workflows an inbound endpoint hands deliveries to.
///
/// Status sync only runs from the watch-webhook endpoint: a board-level
/// webhook also sees the mirrored write on the twin, and must not send it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Membership,
    Status,
}

impl Endpoint {
    pub fn accepts(self, workflow: &Workflow) -> bool {
        match self {
            Endpoint::Membership => matches!(
                workflow,
                Workflow::CreateTwin { .. } | Workflow::RemoveTwin { .. }
            ),
            Endpoint::Status => matches!(workflow, Workflow::SyncStatus { .. }),
        }
    }
}

/// Maps a Trello action to the workflow it triggers, if any.
pub fn classify(settings: &TwinSettings, action: &Action) -> Option<Workflow> {
    let card_id = action.card_id()?.to_string();
    match action.kind() {
        ActionKind::AddMemberToCard if action.member_id() == Some(settings.ref_member_id.as_str()) => {
            Some(Workflow::CreateTwin { card_id })
        }
        ActionKind::RemoveMemberFromCard
            if action.member_id() == Some(settings.ref_member_id.as_str()) =>
        {
            Some(Workflow::RemoveTwin { card_id })
        }
        ActionKind::UpdateCard => action
            .closed_change()
            .map(|closed| Workflow::SyncStatus { card_id, closed }),
        _ => None,
    }
}

impl Workflow {
    pub fn name(&self) -> &'static str {
        match self {
            Workflow::CreateTwin { .. } => create::WORKFLOW,
            Workflow::RemoveTwin { .. } => remove::WORKFLOW,
            Workflow::SyncStatus { .. } => status::WORKFLOW,
        }
    }

    pub fn card_id(&self) -> &str {
        match self {
            Workflow::CreateTwin { card_id }
            | Workflow::RemoveTwin { card_id }
            | Workflow::SyncStatus { card_id, .. } => card_id,
        }
    }

    /// Runs to completion, logging instead of returning failures.
    pub async fn run(self, gateway: &dyn TrelloGateway, settings: &TwinSettings) {
        let name = self.name();
        let card_id = self.card_id().to_string();
        debug!(workflow = name, card_id = %card_id, "Workflow started");

        let result = match &self {
            Workflow::CreateTwin { card_id } => create::create_twin(gateway, settings, card_id)
                .await
                .map(|created| created.outcome),
            Workflow::RemoveTwin { card_id } => remove::remove_twin(gateway, card_id).await,
            Workflow::SyncStatus { card_id, closed } => {
                status::sync_status(gateway, card_id, *closed).await
            }
        };

        match result {
            Ok(outcome) => outcome.log_summary(name, &card_id),
            Err(e) => error!(workflow = name, card_id = %card_id, error = %e, "Workflow aborted"),
        }
    }
}
