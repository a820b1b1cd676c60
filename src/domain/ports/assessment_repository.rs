use crate::domain::entities::conviction::ConvictionAssessment;
use crate::domain::error::DomainError;
use chrono::NaiveDate;

/// Append-only store of conviction assessments keyed by
/// (entity_id, analysis_date).
///
/// Inserting an existing key returns the stored assessment untouched, so a
/// scheduler can safely re-run a day without rewriting history.
pub trait AssessmentRepository: Send + Sync {
    /// Persist a new assessment, or return the already-stored one for the
    /// same (entity_id, analysis_date).
    fn insert(&self, assessment: &ConvictionAssessment)
        -> Result<ConvictionAssessment, DomainError>;

    fn get(
        &self,
        entity_id: &str,
        analysis_date: NaiveDate,
    ) -> Result<Option<ConvictionAssessment>, DomainError>;

    /// All assessments for one analysis date, entity id ascending.
    fn list_for_date(&self, analysis_date: NaiveDate)
        -> Result<Vec<ConvictionAssessment>, DomainError>;
}
