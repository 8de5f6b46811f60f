//! Pure aggregations over normalized proposals.
//!
//! Every function takes the records explicitly and never fails: missing keys fold into an
//! unspecified bucket, missing dates drop a record from time-bucketed reports only.

pub mod group;
pub mod pivot;
pub mod summary;
pub mod timeline;
pub mod vendor;

#[cfg(test)]
pub(crate) mod testing;

pub use group::{group_by, group_by_dimension, Dimension, GroupRow, UNSPECIFIED_LABEL};
pub use pivot::{daily_by_vendor, monthly_by_vendor, PivotRow, PivotTable};
pub use summary::{dashboard_summary, DashboardSummary};
pub use timeline::{daily_report, monthly_report, DailyReport, DailyRow, MonthlyReport, MonthlyRow};
pub use vendor::{vendor_ranking, vendor_summaries, KindShare, RankingRow, VendorSummary};
