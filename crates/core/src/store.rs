use crate::domain::{DateRange, ProposalRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The last fetched batch of proposals and where it came from.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub records: Vec<ProposalRecord>,
    pub range: Option<DateRange>,
    pub source: Option<&'static str>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub loaded: usize,
    pub range: Option<DateRange>,
    pub source: Option<&'static str>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn info(&self) -> SnapshotInfo {
        SnapshotInfo {
            loaded: self.records.len(),
            range: self.range,
            source: self.source,
            refreshed_at: self.refreshed_at,
        }
    }
}

/// Holds one snapshot at a time. Refreshes swap the whole snapshot; readers keep whatever
/// `Arc` they already took.
#[derive(Debug, Clone, Default)]
pub struct ProposalStore {
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.read().await.clone()
    }

    pub async fn replace(
        &self,
        records: Vec<ProposalRecord>,
        range: DateRange,
        source: &'static str,
    ) -> SnapshotInfo {
        let next = Arc::new(Snapshot {
            records,
            range: Some(range),
            source: Some(source),
            refreshed_at: Some(Utc::now()),
        });
        let info = next.info();
        *self.inner.write().await = next;
        info
    }
}
