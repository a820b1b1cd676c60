use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS snapshots (
            date TEXT PRIMARY KEY,
            built_at TEXT NOT NULL,
            doc TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS assessments (
            entity_id TEXT NOT NULL,
            analysis_date TEXT NOT NULL,
            classification TEXT NOT NULL,
            conviction_score REAL NOT NULL,
            recommendation TEXT NOT NULL,
            doc TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (entity_id, analysis_date)
        );

        CREATE INDEX IF NOT EXISTS idx_assessments_date ON assessments(analysis_date);
        ",
    )
    .map_err(|e| format!("Migration failed: {e}"))
}
