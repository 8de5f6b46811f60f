use crate::aggregate::group::{filter_by_range, group_refs, normalize_key, percent_of};
use crate::domain::{DateRange, ProposalRecord, SaleKind};
use crate::format::round_to;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::group::GroupRow;

/// Count and integer percent of one sale kind within a subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindShare {
    pub tipo: SaleKind,
    pub value: usize,
    pub perc: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSummary {
    pub key: Option<String>,
    pub count: usize,
    pub percent: f64,
    #[serde(rename = "valorTotal")]
    pub total_value: f64,
    #[serde(rename = "ticketMedio")]
    pub average_ticket: f64,
    #[serde(rename = "planBreakdown")]
    pub plan_breakdown: Vec<GroupRow>,
    #[serde(rename = "tipoBreakdown")]
    pub kind_breakdown: [KindShare; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub posicao: usize,
    #[serde(flatten)]
    pub summary: VendorSummary,
}

/// Per-vendor totals, ordered like the vendor grouping (count descending, stable).
pub fn vendor_summaries(
    records: &[ProposalRecord],
    range: Option<&DateRange>,
) -> Vec<VendorSummary> {
    let filtered = filter_by_range(records, range);
    let total = filtered.len();

    let mut summaries: Vec<VendorSummary> = partition_by_vendor(&filtered)
        .into_iter()
        .map(|(key, subset)| summarize(key, &subset, total))
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

/// The first `limit` vendors with their 1-based position.
pub fn vendor_ranking(
    records: &[ProposalRecord],
    range: Option<&DateRange>,
    limit: usize,
) -> Vec<RankingRow> {
    vendor_summaries(records, range)
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, summary)| RankingRow {
            posicao: i + 1,
            summary,
        })
        .collect()
}

/// New vs. replacement counts, always both categories, percents rounded to integers.
pub fn kind_breakdown(records: &[&ProposalRecord]) -> [KindShare; 2] {
    let total = records.len();
    SaleKind::ALL.map(|tipo| {
        let value = records.iter().filter(|r| r.kind == tipo).count();
        KindShare {
            tipo,
            value,
            perc: round_to(percent_of(value, total), 0) as i64,
        }
    })
}

pub fn total_value(records: &[&ProposalRecord]) -> f64 {
    records.iter().map(|r| r.credit_value).sum()
}

pub fn average_ticket(total_value: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total_value / count as f64
    }
}

fn summarize(key: Option<String>, subset: &[&ProposalRecord], total: usize) -> VendorSummary {
    let count = subset.len();
    let total_value = total_value(subset);

    VendorSummary {
        key,
        count,
        percent: percent_of(count, total),
        total_value,
        average_ticket: average_ticket(total_value, count),
        plan_breakdown: group_refs(subset, |r| r.plan_name.as_deref()),
        kind_breakdown: kind_breakdown(subset),
    }
}

fn partition_by_vendor<'a>(
    records: &[&'a ProposalRecord],
) -> Vec<(Option<String>, Vec<&'a ProposalRecord>)> {
    let mut index: HashMap<Option<String>, usize> = HashMap::new();
    let mut out: Vec<(Option<String>, Vec<&'a ProposalRecord>)> = Vec::new();

    for &record in records {
        let key = normalize_key(record.vendor_name.as_deref());
        match index.get(&key) {
            Some(&i) => out[i].1.push(record),
            None => {
                index.insert(key.clone(), out.len());
                out.push((key, vec![record]));
            }
        }
    }

    out
}
