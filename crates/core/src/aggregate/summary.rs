use crate::aggregate::group::{filter_by_range, normalize_key};
use crate::aggregate::vendor::{average_ticket, kind_breakdown, total_value, KindShare};
use crate::domain::{DateRange, ProposalRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Headline numbers of the dashboard cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(rename = "totalPropostas")]
    pub total_proposals: usize,
    #[serde(rename = "valorTotal")]
    pub total_value: f64,
    #[serde(rename = "ticketMedio")]
    pub average_ticket: f64,
    pub vendedores: usize,
    #[serde(rename = "tipoBreakdown")]
    pub kind_breakdown: [KindShare; 2],
}

pub fn dashboard_summary(records: &[ProposalRecord], range: Option<&DateRange>) -> DashboardSummary {
    let filtered = filter_by_range(records, range);
    let total_value = total_value(&filtered);
    let vendors: HashSet<Option<String>> = filtered
        .iter()
        .map(|r| normalize_key(r.vendor_name.as_deref()))
        .collect();

    DashboardSummary {
        total_proposals: filtered.len(),
        total_value,
        average_ticket: average_ticket(total_value, filtered.len()),
        vendedores: vendors.len(),
        kind_breakdown: kind_breakdown(&filtered),
    }
}
