//! SQLite-backed snapshot store.
//!
//! One row per date, whole snapshot as a JSON document. Rebuilds replace the
//! row inside a transaction, so readers see either the old snapshot or the
//! new one, never a partial write. The forward-leakage guard is applied
//! twice: records observed after the snapshot date are dropped at build, and
//! `get_snapshot` filters against the requested date again at read.

use crate::domain::entities::snapshot::{
    CategoryPayload, RawSourceOutput, SourceHealth, SourceSnapshot,
};
use crate::domain::error::DomainError;
use crate::domain::ports::snapshot_store::SnapshotStore;
use crate::domain::values::data_health::DataHealth;
use crate::infrastructure::config::SourceConfig;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
    sources: Vec<SourceConfig>,
}

/// Records observed up to the end of the snapshot's day are in scope.
fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let time = date.and_hms_opt(23, 59, 59).expect("valid wall time");
    DateTime::from_naive_utc_and_offset(time, Utc)
}

impl SqliteSnapshotStore {
    pub fn new(conn: Connection, sources: Vec<SourceConfig>) -> Self {
        Self {
            conn: Mutex::new(conn),
            sources,
        }
    }

    /// Merge raw outputs into a snapshot, judging each configured source's
    /// health and dropping any record observed after the snapshot date.
    fn assemble(&self, date: NaiveDate, raw_outputs: &[RawSourceOutput]) -> SourceSnapshot {
        let cutoff = end_of_day(date);
        let mut categories: BTreeMap<_, CategoryPayload> = BTreeMap::new();
        let mut health = BTreeMap::new();

        for source in &self.sources {
            let output = raw_outputs.iter().find(|o| o.source == source.name);
            let status = match output {
                None => DataHealth::Missing,
                Some(o) if o.records.is_empty() => DataHealth::NoData,
                Some(o) => {
                    let stale_before = cutoff - Duration::hours(source.freshness_hours);
                    if o.fetched_at < stale_before {
                        DataHealth::Stale
                    } else {
                        DataHealth::Available
                    }
                }
            };
            health.insert(
                source.name.clone(),
                SourceHealth {
                    category: source.category,
                    status,
                },
            );

            if let Some(output) = output {
                if output.records.is_empty() {
                    continue;
                }
                let payload = categories.entry(source.category).or_default();
                payload.schema_version = payload.schema_version.max(output.schema_version);
                for record in &output.records {
                    if record.observed_at > cutoff {
                        continue;
                    }
                    payload.records.push(record.clone());
                }
            }
        }

        // Drop categories whose every record was observed out of scope.
        categories.retain(|_, payload| !payload.records.is_empty());

        // Stable record order: identifier, then observation time.
        for payload in categories.values_mut() {
            payload
                .records
                .sort_by(|a, b| {
                    a.identifier
                        .cmp(&b.identifier)
                        .then_with(|| a.observed_at.cmp(&b.observed_at))
                });
        }

        SourceSnapshot {
            date,
            built_at: Utc::now(),
            categories,
            health,
        }
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn build_snapshot(
        &self,
        date: NaiveDate,
        raw_outputs: &[RawSourceOutput],
    ) -> Result<SourceSnapshot, DomainError> {
        let snapshot = self.assemble(date, raw_outputs);
        let doc = serde_json::to_string(&snapshot)
            .map_err(|e| DomainError::Parse(format!("snapshot encode: {e}")))?;

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        tx.execute(
            "INSERT INTO snapshots (date, built_at, doc) VALUES (?1, ?2, ?3)
             ON CONFLICT(date) DO UPDATE SET built_at = ?2, doc = ?3",
            params![
                date.format("%Y-%m-%d").to_string(),
                snapshot.built_at.to_rfc3339(),
                doc
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to store snapshot: {e}")))?;
        tx.commit()
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(snapshot)
    }

    fn get_snapshot(&self, date: NaiveDate) -> Result<SourceSnapshot, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let row: Option<String> = conn
            .query_row(
                "SELECT doc FROM snapshots WHERE date <= ?1 ORDER BY date DESC LIMIT 1",
                params![date.format("%Y-%m-%d").to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let doc = row.ok_or_else(|| DomainError::NoSnapshot(date.format("%Y-%m-%d").to_string()))?;
        let mut snapshot: SourceSnapshot = serde_json::from_str(&doc)
            .map_err(|e| DomainError::Parse(format!("snapshot decode: {e}")))?;

        // Second leakage filter at read, against the requested date. The
        // build-time filter already bounded records to the snapshot's own
        // date; this guards the store even if a stored doc predates that.
        let cutoff = end_of_day(date);
        for payload in snapshot.categories.values_mut() {
            payload.records.retain(|r| r.observed_at <= cutoff);
        }
        snapshot.categories.retain(|_, p| !p.records.is_empty());

        Ok(snapshot)
    }

    fn list_dates(&self) -> Result<Vec<NaiveDate>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare("SELECT date FROM snapshots ORDER BY date ASC")
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let dates = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .filter_map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
            .collect();
        Ok(dates)
    }
}
