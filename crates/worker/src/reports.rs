use std::fmt::Write as _;

use serde::Serialize;

use apollo_core::aggregate::{
    self, DailyReport, DashboardSummary, Dimension, GroupRow, MonthlyReport, PivotTable,
    RankingRow, VendorSummary,
};
use apollo_core::domain::{DateBasis, MonthPeriod, ProposalRecord};
use apollo_core::format::{format_currency, format_percent};

use crate::ReportKind;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReportOutput {
    Summary(DashboardSummary),
    Groups(Vec<GroupRow>),
    Vendors(Vec<VendorSummary>),
    Ranking(Vec<RankingRow>),
    Daily(DailyReport),
    Monthly(MonthlyReport),
    Pivot(PivotTable),
}

/// Runs one report over records that were already fetched for the right range.
pub fn build(
    kind: &ReportKind,
    records: &[ProposalRecord],
    period: MonthPeriod,
    year: i32,
    basis: DateBasis,
) -> anyhow::Result<ReportOutput> {
    Ok(match kind {
        ReportKind::Summary => ReportOutput::Summary(aggregate::dashboard_summary(records, None)),
        ReportKind::Groups { dimension } => {
            let dimension: Dimension = dimension.parse()?;
            ReportOutput::Groups(aggregate::group_by_dimension(records, dimension, None))
        }
        ReportKind::Vendors => ReportOutput::Vendors(aggregate::vendor_summaries(records, None)),
        ReportKind::Ranking { limit } => {
            ReportOutput::Ranking(aggregate::vendor_ranking(records, None, *limit))
        }
        ReportKind::Daily => ReportOutput::Daily(aggregate::daily_report(records, period, basis)),
        ReportKind::Monthly => {
            ReportOutput::Monthly(aggregate::monthly_report(records, year, basis))
        }
        ReportKind::DailyByVendor => {
            ReportOutput::Pivot(aggregate::daily_by_vendor(records, period, basis))
        }
        ReportKind::MonthlyByVendor => {
            ReportOutput::Pivot(aggregate::monthly_by_vendor(records, year, basis))
        }
    })
}

impl ReportOutput {
    /// Plain-text table, one line per row, tab separated.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        match self {
            ReportOutput::Summary(s) => {
                let _ = writeln!(out, "Propostas\t{}", s.total_proposals);
                let _ = writeln!(out, "Valor total\t{}", format_currency(s.total_value));
                let _ = writeln!(out, "Ticket médio\t{}", format_currency(s.average_ticket));
                let _ = writeln!(out, "Vendedores\t{}", s.vendedores);
                for share in &s.kind_breakdown {
                    let _ = writeln!(out, "{}\t{}\t{}%", share.tipo.as_str(), share.value, share.perc);
                }
            }
            ReportOutput::Groups(rows) => {
                for row in rows {
                    let _ = writeln!(out, "{}\t{}\t{}", row.label(), row.count, format_percent(row.percent));
                }
            }
            ReportOutput::Vendors(rows) => {
                for v in rows {
                    write_vendor(&mut out, None, v);
                }
            }
            ReportOutput::Ranking(rows) => {
                for r in rows {
                    write_vendor(&mut out, Some(r.posicao), &r.summary);
                }
            }
            ReportOutput::Daily(report) => {
                for row in &report.rows {
                    let _ = writeln!(
                        out,
                        "{}\t{}\t{}\t{:.2}",
                        row.dia.format("%d/%m/%Y"),
                        row.quantidade,
                        row.acumulado,
                        row.media_acumulada
                    );
                }
            }
            ReportOutput::Monthly(report) => {
                for row in &report.rows {
                    let _ = writeln!(out, "{:02}/{}\t{}\t{}", row.mes, report.year, row.quantidade, row.acumulado);
                }
            }
            ReportOutput::Pivot(table) => {
                let _ = writeln!(out, "Vendedor\t{}", table.columns.join("\t"));
                for row in &table.rows {
                    let values: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
                    let name = row.vendedor.as_deref().unwrap_or(aggregate::UNSPECIFIED_LABEL);
                    let _ = writeln!(out, "{name}\t{}", values.join("\t"));
                }
            }
        }
        out
    }
}

fn write_vendor(out: &mut String, position: Option<usize>, v: &VendorSummary) {
    let name = v.key.as_deref().unwrap_or(aggregate::UNSPECIFIED_LABEL);
    let prefix = position.map(|p| format!("{p}\t")).unwrap_or_default();
    let _ = writeln!(
        out,
        "{prefix}{name}\t{}\t{}\t{}\t{}",
        v.count,
        format_percent(v.percent),
        format_currency(v.total_value),
        format_currency(v.average_ticket),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use apollo_core::domain::RawProposal;
    use serde_json::json;

    fn records() -> Vec<ProposalRecord> {
        let raws: Vec<RawProposal> = serde_json::from_value(json!([
            { "vendedor_nome": "Ana", "valor_bem": "100.50", "nova_reposicao": "N", "data_venda": "2024-03-01" },
            { "vendedor_nome": "Ana", "valor_bem": "100.50", "nova_reposicao": "N", "data_venda": "2024-03-01" },
            { "vendedor_nome": "Ana", "valor_bem": "100.50", "nova_reposicao": "R", "data_venda": "2024-03-03" },
            { "vendedor_nome": null, "valor_bem": "x", "data_venda": "2024-03-03" }
        ]))
        .unwrap();
        apollo_core::domain::normalize(raws)
    }

    fn march() -> MonthPeriod {
        MonthPeriod::new(2024, 3).unwrap()
    }

    #[test]
    fn vendors_text_uses_brazilian_formats() {
        let out = build(&ReportKind::Vendors, &records(), march(), 2024, DateBasis::Sale).unwrap();
        let text = out.to_text();
        let first = text.lines().next().unwrap();
        assert_eq!(first, "Ana\t3\t75.0%\tR$ 301,50\tR$ 100,50");
        assert!(text.lines().nth(1).unwrap().starts_with("unspecified\t1\t25.0%\tR$ 0,00"));
    }

    #[test]
    fn daily_json_is_dense() {
        let out = build(&ReportKind::Daily, &records(), march(), 2024, DateBasis::Sale).unwrap();
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["rows"].as_array().unwrap().len(), 31);
        assert_eq!(v["rows"][1]["mediaAcumulada"], 2.0);
        assert_eq!(v["rows"][2]["mediaAcumulada"], 2.0);
    }

    #[test]
    fn unknown_dimension_is_an_error() {
        let kind = ReportKind::Groups {
            dimension: "team".into(),
        };
        assert!(build(&kind, &records(), march(), 2024, DateBasis::Sale).is_err());
    }

    #[test]
    fn pivot_text_has_header_and_total() {
        let out = build(&ReportKind::MonthlyByVendor, &records(), march(), 2024, DateBasis::Sale).unwrap();
        let text = out.to_text();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().ends_with("Dez\tTotal"));
        assert!(lines.next().unwrap().starts_with("Ana\t0\t0\t3\t"));
        assert!(lines.next().unwrap().ends_with("\t1"));
    }
}
