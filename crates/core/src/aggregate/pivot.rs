use crate::aggregate::group::normalize_key;
use crate::aggregate::timeline::log_skipped;
use crate::domain::{DateBasis, MonthPeriod, ProposalRecord};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const TOTAL_COLUMN: &str = "Total";

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Wide table: one row per vendor, one column per period bucket, `Total` last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotTable {
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotRow {
    pub vendedor: Option<String>,
    /// One value per column; the last one is the row total.
    pub values: Vec<usize>,
}

impl PivotRow {
    pub fn total(&self) -> usize {
        self.values.last().copied().unwrap_or(0)
    }
}

pub fn daily_by_vendor(
    records: &[ProposalRecord],
    period: MonthPeriod,
    basis: DateBasis,
) -> PivotTable {
    let days = period.days() as usize;
    let columns = (1..=days).map(|d| format!("{d:02}")).collect();
    pivot(records, basis, columns, "daily_by_vendor", |d| {
        period.contains(d).then(|| d.day0() as usize)
    })
}

pub fn monthly_by_vendor(records: &[ProposalRecord], year: i32, basis: DateBasis) -> PivotTable {
    let columns = MONTH_LABELS.iter().map(|m| m.to_string()).collect();
    pivot(records, basis, columns, "monthly_by_vendor", |d| {
        (d.year() == year).then(|| d.month0() as usize)
    })
}

fn pivot<F>(
    records: &[ProposalRecord],
    basis: DateBasis,
    mut columns: Vec<String>,
    report: &'static str,
    bucket_of: F,
) -> PivotTable
where
    F: Fn(NaiveDate) -> Option<usize>,
{
    let width = columns.len();
    let mut index: HashMap<Option<String>, usize> = HashMap::new();
    let mut rows: Vec<PivotRow> = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(date) = record.date(basis) else {
            skipped += 1;
            continue;
        };
        let Some(bucket) = bucket_of(date).filter(|&b| b < width) else {
            continue;
        };

        let key = normalize_key(record.vendor_name.as_deref());
        let i = match index.get(&key) {
            Some(&i) => i,
            None => {
                index.insert(key.clone(), rows.len());
                rows.push(PivotRow {
                    vendedor: key,
                    values: vec![0; width + 1],
                });
                rows.len() - 1
            }
        };
        rows[i].values[bucket] += 1;
        rows[i].values[width] += 1;
    }
    log_skipped(skipped, basis, report);

    rows.sort_by(|a, b| compare_vendors(a.vendedor.as_deref(), b.vendedor.as_deref()));
    columns.push(TOTAL_COLUMN.to_string());

    PivotTable { columns, rows }
}

/// Alphabetical, case- and accent-insensitive; the unspecified vendor sorts last.
fn compare_vendors(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => collation_key(a)
            .cmp(&collation_key(b))
            .then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn collation_key(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::testing::{record, record_on};

    #[test]
    fn daily_pivot_sorts_vendors_alphabetically() {
        let records = vec![
            record_on("Caio", "2024-03-01"),
            record_on("Caio", "2024-03-01"),
            record_on("Caio", "2024-03-02"),
            record_on("ana", "2024-03-02"),
            record_on("Ágata", "2024-03-31"),
            record_on("", "2024-03-05"),
            record_on("Bia", "2024-04-01"),
        ];
        let table = daily_by_vendor(&records, MonthPeriod::new(2024, 3).unwrap(), DateBasis::Sale);

        assert_eq!(table.columns.len(), 32);
        assert_eq!(table.columns[0], "01");
        assert_eq!(table.columns.last().unwrap(), TOTAL_COLUMN);

        let names: Vec<_> = table.rows.iter().map(|r| r.vendedor.as_deref()).collect();
        assert_eq!(names, vec![Some("Ágata"), Some("ana"), Some("Caio"), None]);

        let caio = &table.rows[2];
        assert_eq!(caio.values[0], 2);
        assert_eq!(caio.values[1], 1);
        assert_eq!(caio.total(), 3);
    }

    #[test]
    fn row_total_matches_bucket_sum() {
        let records = vec![
            record_on("Ana", "2024-01-02"),
            record_on("Ana", "2024-06-02"),
            record_on("Ana", "2024-06-03"),
            record_on("Bia", "2024-12-31"),
        ];
        let table = monthly_by_vendor(&records, 2024, DateBasis::Sale);
        assert_eq!(table.columns.len(), 13);
        assert_eq!(table.columns[0], "Jan");
        for row in &table.rows {
            let (buckets, total) = row.values.split_at(12);
            assert_eq!(buckets.iter().sum::<usize>(), total[0]);
        }
        assert_eq!(table.rows[0].values[5], 2);
        assert_eq!(table.rows[1].values[11], 1);
    }

    #[test]
    fn vendors_without_sales_in_period_are_omitted() {
        let mut undated = record("Dani");
        undated.sale_date = None;
        let records = vec![undated, record_on("Bia", "2023-05-01")];
        let table = monthly_by_vendor(&records, 2024, DateBasis::Sale);
        assert!(table.rows.is_empty());
        assert_eq!(table.columns.last().unwrap(), TOTAL_COLUMN);
    }
}
