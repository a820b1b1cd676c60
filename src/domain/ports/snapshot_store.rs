use crate::domain::entities::snapshot::{RawSourceOutput, SourceSnapshot};
use crate::domain::error::DomainError;
use chrono::NaiveDate;

/// Store of immutable, date-keyed consolidated snapshots.
///
/// `get_snapshot(d)` must never surface a record whose own timestamp is
/// after `d` — the single most important correctness property for
/// backtesting. Writers replace a date atomically; readers never observe a
/// partially-written snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Build (or idempotently rebuild) the snapshot for `date` from raw
    /// source outputs and persist it.
    fn build_snapshot(
        &self,
        date: NaiveDate,
        raw_outputs: &[RawSourceOutput],
    ) -> Result<SourceSnapshot, DomainError>;

    /// Latest snapshot at or before `date`, with the leakage guard applied
    /// a second time at read. `DomainError::NoSnapshot` when none exists.
    fn get_snapshot(&self, date: NaiveDate) -> Result<SourceSnapshot, DomainError>;

    /// Dates with a stored snapshot, ascending.
    fn list_dates(&self) -> Result<Vec<NaiveDate>, DomainError>;
}
