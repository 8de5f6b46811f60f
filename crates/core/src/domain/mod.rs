pub mod parse;
pub mod period;
pub mod proposal;

pub use period::{DateRange, MonthPeriod};
pub use proposal::{normalize, DateBasis, ProposalRecord, RawProposal, SaleKind};
