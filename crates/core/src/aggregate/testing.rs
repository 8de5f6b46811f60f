use crate::domain::{ProposalRecord, SaleKind};
use chrono::NaiveDate;

pub(crate) fn record(vendor: &str) -> ProposalRecord {
    ProposalRecord {
        id: None,
        plan_code: None,
        plan_name: None,
        proposal_number: None,
        check_digit: None,
        group: None,
        quota: None,
        vendor_tax_id: None,
        vendor_name: Some(vendor.to_string()).filter(|v| !v.is_empty()),
        client_tax_id: None,
        client_name: None,
        kind: SaleKind::Replacement,
        credit_value: 0.0,
        sale_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        bordero_date: None,
        city: None,
        model: None,
    }
}

pub(crate) fn record_on(vendor: &str, sale_date: &str) -> ProposalRecord {
    let mut r = record(vendor);
    r.sale_date = NaiveDate::parse_from_str(sale_date, "%Y-%m-%d").ok();
    r
}
