pub mod error;
pub mod provider;
pub mod types;

pub use provider::{FileProposalSource, HttpProposalSource, ProposalSource};
