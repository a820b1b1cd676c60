use crate::domain::entities::conviction::ConvictionAssessment;
use crate::domain::error::DomainError;
use crate::domain::ports::assessment_repository::AssessmentRepository;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

/// Append-only assessment store. The (entity_id, analysis_date) primary key
/// plus `ON CONFLICT DO NOTHING` makes re-inserts a no-op: history is never
/// rewritten in place.
pub struct SqliteAssessmentRepo {
    conn: Mutex<Connection>,
}

impl SqliteAssessmentRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn decode(doc: &str) -> Result<ConvictionAssessment, DomainError> {
        serde_json::from_str(doc).map_err(|e| DomainError::Parse(format!("assessment decode: {e}")))
    }
}

impl AssessmentRepository for SqliteAssessmentRepo {
    fn insert(
        &self,
        assessment: &ConvictionAssessment,
    ) -> Result<ConvictionAssessment, DomainError> {
        let doc = serde_json::to_string(assessment)
            .map_err(|e| DomainError::Parse(format!("assessment encode: {e}")))?;
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO assessments
               (entity_id, analysis_date, classification, conviction_score, recommendation, doc, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(entity_id, analysis_date) DO NOTHING",
            params![
                assessment.entity_id,
                assessment.analysis_date.format("%Y-%m-%d").to_string(),
                assessment.classification.to_string(),
                assessment.conviction_score,
                assessment.recommendation.to_string(),
                doc,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to store assessment: {e}")))?;
        drop(conn);

        // Whatever is stored under the key wins, whether this call wrote it
        // or an earlier one did.
        self.get(&assessment.entity_id, assessment.analysis_date)?
            .ok_or_else(|| DomainError::Database("assessment vanished after insert".into()))
    }

    fn get(
        &self,
        entity_id: &str,
        analysis_date: NaiveDate,
    ) -> Result<Option<ConvictionAssessment>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM assessments WHERE entity_id = ?1 AND analysis_date = ?2",
                params![entity_id, analysis_date.format("%Y-%m-%d").to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        doc.map(|d| Self::decode(&d)).transpose()
    }

    fn list_for_date(
        &self,
        analysis_date: NaiveDate,
    ) -> Result<Vec<ConvictionAssessment>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT doc FROM assessments WHERE analysis_date = ?1 ORDER BY entity_id ASC",
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let docs: Vec<String> = stmt
            .query_map(
                params![analysis_date.format("%Y-%m-%d").to_string()],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        docs.iter().map(|d| Self::decode(d)).collect()
    }
}
