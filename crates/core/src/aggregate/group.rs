use crate::domain::{DateRange, ProposalRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display label for the bucket holding records with no key.
pub const UNSPECIFIED_LABEL: &str = "unspecified";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    pub key: Option<String>,
    pub count: usize,
    pub percent: f64,
}

impl GroupRow {
    pub fn label(&self) -> &str {
        self.key.as_deref().unwrap_or(UNSPECIFIED_LABEL)
    }
}

/// Standard grouping keys exposed by the reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Vendor,
    City,
    Model,
    Plan,
}

impl Dimension {
    pub fn key(self, record: &ProposalRecord) -> Option<&str> {
        match self {
            Dimension::Vendor => record.vendor_name.as_deref(),
            Dimension::City => record.city.as_deref(),
            Dimension::Model => record.model.as_deref(),
            Dimension::Plan => record.plan_name.as_deref(),
        }
    }
}

impl std::str::FromStr for Dimension {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vendor" | "vendedor" => Ok(Dimension::Vendor),
            "city" | "cidade" => Ok(Dimension::City),
            "model" | "modelo" => Ok(Dimension::Model),
            "plan" | "plano" => Ok(Dimension::Plan),
            other => anyhow::bail!("unknown dimension: {other}"),
        }
    }
}

/// Records whose sale date falls in `range`; every record when `range` is `None`.
pub fn filter_by_range<'a>(
    records: &'a [ProposalRecord],
    range: Option<&DateRange>,
) -> Vec<&'a ProposalRecord> {
    match range {
        None => records.iter().collect(),
        Some(range) => records
            .iter()
            .filter(|r| r.sale_date.is_some_and(|d| range.contains(d)))
            .collect(),
    }
}

/// One row per distinct key, sorted by count descending.
///
/// Missing and empty keys share a single unspecified row. Ties keep first-encounter order.
pub fn group_by<F>(records: &[ProposalRecord], key_fn: F, range: Option<&DateRange>) -> Vec<GroupRow>
where
    F: Fn(&ProposalRecord) -> Option<&str>,
{
    let filtered = filter_by_range(records, range);
    group_refs(&filtered, key_fn)
}

pub fn group_by_dimension(
    records: &[ProposalRecord],
    dimension: Dimension,
    range: Option<&DateRange>,
) -> Vec<GroupRow> {
    group_by(records, |r| dimension.key(r), range)
}

/// Same as [`group_by`] over an already filtered subset.
pub fn group_refs<F>(records: &[&ProposalRecord], key_fn: F) -> Vec<GroupRow>
where
    F: Fn(&ProposalRecord) -> Option<&str>,
{
    let total = records.len();
    let mut rows: Vec<GroupRow> = count_keys(records.iter().copied(), key_fn)
        .into_iter()
        .map(|(key, count)| GroupRow {
            key,
            count,
            percent: percent_of(count, total),
        })
        .collect();

    // Vec::sort_by is stable.
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Counts per normalized key, in first-encounter order.
pub(crate) fn count_keys<'a, I, F>(records: I, key_fn: F) -> Vec<(Option<String>, usize)>
where
    I: IntoIterator<Item = &'a ProposalRecord>,
    F: Fn(&ProposalRecord) -> Option<&str>,
{
    let mut index: HashMap<Option<String>, usize> = HashMap::new();
    let mut out: Vec<(Option<String>, usize)> = Vec::new();

    for record in records {
        let key = normalize_key(key_fn(record));
        match index.get(&key) {
            Some(&i) => out[i].1 += 1,
            None => {
                index.insert(key.clone(), out.len());
                out.push((key, 1));
            }
        }
    }

    out
}

pub(crate) fn normalize_key(key: Option<&str>) -> Option<String> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

pub(crate) fn percent_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::testing::{record, record_on};

    #[test]
    fn empty_input_yields_no_rows() {
        let rows = group_by(&[], |r| r.city.as_deref(), None);
        assert!(rows.is_empty());
    }

    #[test]
    fn folds_missing_and_empty_keys() {
        let mut blank = record("Ana");
        blank.city = Some(String::new());
        let mut whitespace = record("Ana");
        whitespace.city = Some("  ".into());
        let mut missing = record("Ana");
        missing.city = None;
        let mut recife = record("Ana");
        recife.city = Some("Recife".into());

        let rows = group_by(&[blank, whitespace, missing, recife], |r| r.city.as_deref(), None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, None);
        assert_eq!(rows[0].count, 3);
        assert_eq!(rows[0].label(), UNSPECIFIED_LABEL);
        assert_eq!(rows[1].key.as_deref(), Some("Recife"));
    }

    #[test]
    fn sorts_by_count_and_keeps_first_encounter_on_ties() {
        let records = vec![
            record("Bia"),
            record("Ana"),
            record("Caio"),
            record("Ana"),
            record("Caio"),
        ];
        let rows = group_by_dimension(&records, Dimension::Vendor, None);
        let keys: Vec<_> = rows.iter().map(|r| r.label().to_string()).collect();
        assert_eq!(keys, vec!["Ana", "Caio", "Bia"]);
    }

    #[test]
    fn counts_and_percents_cover_the_filtered_total() {
        let records = vec![
            record_on("Ana", "2024-03-01"),
            record_on("Bia", "2024-03-02"),
            record_on("Ana", "2024-03-03"),
            record_on("Caio", "2024-04-01"),
        ];
        let range = DateRange::parse("2024-03-01", "2024-03-31").unwrap();
        let rows = group_by_dimension(&records, Dimension::Vendor, Some(&range));

        let count: usize = rows.iter().map(|r| r.count).sum();
        let percent: f64 = rows.iter().map(|r| r.percent).sum();
        assert_eq!(count, 3);
        assert!((percent - 100.0).abs() < 1e-9);
        assert!(rows.iter().all(|r| r.key.as_deref() != Some("Caio")));
    }

    #[test]
    fn range_excludes_records_without_sale_date() {
        let mut undated = record("Ana");
        undated.sale_date = None;
        let records = vec![undated, record_on("Ana", "2024-03-01")];

        let range = DateRange::parse("2024-01-01", "2024-12-31").unwrap();
        assert_eq!(group_by_dimension(&records, Dimension::Vendor, Some(&range))[0].count, 1);
        assert_eq!(group_by_dimension(&records, Dimension::Vendor, None)[0].count, 2);
    }

    #[test]
    fn is_idempotent() {
        let records = vec![record("Ana"), record("Bia"), record("Ana")];
        let a = group_by_dimension(&records, Dimension::Vendor, None);
        let b = group_by_dimension(&records, Dimension::Vendor, None);
        assert_eq!(a, b);
    }

    #[test]
    fn parses_dimension_names() {
        assert_eq!("cidade".parse::<Dimension>().unwrap(), Dimension::City);
        assert_eq!("Model".parse::<Dimension>().unwrap(), Dimension::Model);
        assert!("team".parse::<Dimension>().is_err());
    }
}
