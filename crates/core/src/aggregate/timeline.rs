//! Dense day-by-day and month-by-month sales series.
//!
//! Every bucket of the period is present, zero or not; charts rely on that.

use crate::domain::{DateBasis, MonthPeriod, ProposalRecord};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    pub dia: NaiveDate,
    pub quantidade: usize,
    pub acumulado: usize,
    #[serde(rename = "mediaAcumulada")]
    pub media_acumulada: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub period: MonthPeriod,
    pub basis: DateBasis,
    /// Records with no usable date for `basis`.
    pub skipped: usize,
    pub rows: Vec<DailyRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRow {
    pub mes: u32,
    pub quantidade: usize,
    pub acumulado: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub basis: DateBasis,
    pub skipped: usize,
    pub rows: Vec<MonthlyRow>,
}

/// Per-day counts for `period` with running total and moving average.
///
/// The average divides the running total by the number of days that had at least one
/// sale so far, so empty days carry the previous average forward.
pub fn daily_report(
    records: &[ProposalRecord],
    period: MonthPeriod,
    basis: DateBasis,
) -> DailyReport {
    let (counts, skipped) = bucket_counts(records, basis, period.days() as usize, |d| {
        period.contains(d).then(|| d.day0() as usize)
    });
    log_skipped(skipped, basis, "daily");

    let mut acumulado = 0usize;
    let mut days_with_sales = 0usize;
    let mut media_acumulada = 0.0;
    let first = period.first_day();

    let rows = counts
        .into_iter()
        .zip(first.iter_days())
        .map(|(quantidade, dia)| {
            acumulado += quantidade;
            if quantidade > 0 {
                days_with_sales += 1;
                media_acumulada = acumulado as f64 / days_with_sales as f64;
            }
            DailyRow {
                dia,
                quantidade,
                acumulado,
                media_acumulada,
            }
        })
        .collect();

    DailyReport {
        period,
        basis,
        skipped,
        rows,
    }
}

/// Twelve monthly counts for `year` with a running total.
pub fn monthly_report(records: &[ProposalRecord], year: i32, basis: DateBasis) -> MonthlyReport {
    let (counts, skipped) = bucket_counts(records, basis, 12, |d| {
        (d.year() == year).then(|| d.month0() as usize)
    });
    log_skipped(skipped, basis, "monthly");

    let mut acumulado = 0usize;
    let rows = counts
        .into_iter()
        .enumerate()
        .map(|(i, quantidade)| {
            acumulado += quantidade;
            MonthlyRow {
                mes: i as u32 + 1,
                quantidade,
                acumulado,
            }
        })
        .collect();

    MonthlyReport {
        year,
        basis,
        skipped,
        rows,
    }
}

/// Zero-initialized buckets incremented once per record. Returns the buckets and the
/// number of records without a date for `basis`.
pub(crate) fn bucket_counts<F>(
    records: &[ProposalRecord],
    basis: DateBasis,
    len: usize,
    bucket_of: F,
) -> (Vec<usize>, usize)
where
    F: Fn(NaiveDate) -> Option<usize>,
{
    let mut buckets = vec![0usize; len];
    let mut skipped = 0usize;

    for record in records {
        let Some(date) = record.date(basis) else {
            skipped += 1;
            continue;
        };
        if let Some(slot) = bucket_of(date).and_then(|i| buckets.get_mut(i)) {
            *slot += 1;
        }
    }

    (buckets, skipped)
}

pub(crate) fn log_skipped(skipped: usize, basis: DateBasis, report: &'static str) {
    if skipped > 0 {
        tracing::warn!(skipped, ?basis, report, "records without a usable date left out of report");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::testing::{record, record_on};

    fn march() -> MonthPeriod {
        MonthPeriod::new(2024, 3).unwrap()
    }

    #[test]
    fn empty_days_keep_the_previous_average() {
        let records = vec![
            record_on("Ana", "2024-03-01"),
            record_on("Bia", "2024-03-01"),
            record_on("Ana", "2024-03-03"),
        ];
        let report = daily_report(&records, march(), DateBasis::Sale);

        let d1 = &report.rows[0];
        let d2 = &report.rows[1];
        let d3 = &report.rows[2];
        assert_eq!((d1.quantidade, d1.acumulado), (2, 2));
        assert_eq!(d1.media_acumulada, 2.0);
        assert_eq!((d2.quantidade, d2.acumulado), (0, 2));
        assert_eq!(d2.media_acumulada, d1.media_acumulada);
        assert_eq!((d3.quantidade, d3.acumulado), (1, 3));
        assert_eq!(d3.media_acumulada, 1.5);
        assert_eq!(report.rows.last().unwrap().acumulado, 3);
    }

    #[test]
    fn average_is_zero_before_first_sale() {
        let records = vec![record_on("Ana", "2024-03-10")];
        let report = daily_report(&records, march(), DateBasis::Sale);
        assert_eq!(report.rows[8].media_acumulada, 0.0);
        assert_eq!(report.rows[9].media_acumulada, 1.0);
        assert_eq!(report.rows[30].media_acumulada, 1.0);
    }

    #[test]
    fn daily_report_is_dense() {
        let april = MonthPeriod::new(2024, 4).unwrap();
        let report = daily_report(&[], april, DateBasis::Sale);
        assert_eq!(report.rows.len(), 30);
        assert!(report.rows.iter().all(|r| r.quantidade == 0 && r.media_acumulada == 0.0));
        assert_eq!(report.rows[0].dia, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(report.rows[29].dia, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());

        let feb = MonthPeriod::new(2024, 2).unwrap();
        assert_eq!(daily_report(&[], feb, DateBasis::Sale).rows.len(), 29);
    }

    #[test]
    fn undated_records_are_skipped_and_counted() {
        let mut undated = record("Ana");
        undated.sale_date = None;
        let records = vec![undated, record_on("Ana", "2024-03-05"), record_on("Ana", "2024-04-05")];

        let report = daily_report(&records, march(), DateBasis::Sale);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.rows.iter().map(|r| r.quantidade).sum::<usize>(), 1);
    }

    #[test]
    fn bordero_basis_buckets_by_settlement_date() {
        let mut r = record_on("Ana", "2024-02-28");
        r.bordero_date = NaiveDate::from_ymd_opt(2024, 3, 2);
        let report = daily_report(&[r.clone()], march(), DateBasis::Bordero);
        assert_eq!(report.rows[1].quantidade, 1);
        assert_eq!(daily_report(&[r], march(), DateBasis::Sale).rows[1].quantidade, 0);
    }

    #[test]
    fn monthly_report_has_twelve_cumulative_rows() {
        let records = vec![
            record_on("Ana", "2024-01-15"),
            record_on("Ana", "2024-03-01"),
            record_on("Bia", "2024-03-20"),
            record_on("Bia", "2023-03-20"),
        ];
        let report = monthly_report(&records, 2024, DateBasis::Sale);
        assert_eq!(report.rows.len(), 12);
        assert_eq!(report.rows[0], MonthlyRow { mes: 1, quantidade: 1, acumulado: 1 });
        assert_eq!(report.rows[1], MonthlyRow { mes: 2, quantidade: 0, acumulado: 1 });
        assert_eq!(report.rows[2], MonthlyRow { mes: 3, quantidade: 2, acumulado: 3 });
        assert_eq!(report.rows[11].acumulado, 3);
    }

    #[test]
    fn serializes_moving_average_name() {
        let report = daily_report(&[record_on("Ana", "2024-03-01")], march(), DateBasis::Sale);
        let v = serde_json::to_value(&report.rows[0]).unwrap();
        assert_eq!(v["dia"], "2024-03-01");
        assert_eq!(v["mediaAcumulada"], 1.0);
    }
}
