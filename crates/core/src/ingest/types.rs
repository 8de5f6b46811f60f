use crate::domain::RawProposal;
use serde::{Deserialize, Serialize};

/// Accepted response bodies: a bare array, or an object wrapping it in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProposalsPayload {
    List(Vec<RawProposal>),
    Envelope { data: Vec<RawProposal> },
}

impl ProposalsPayload {
    pub fn into_items(self) -> Vec<RawProposal> {
        match self {
            ProposalsPayload::List(items) => items,
            ProposalsPayload::Envelope { data } => data,
        }
    }
}
