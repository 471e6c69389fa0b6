use super::RecordStore;
use crate::error::{PulmolensError, Result};
use crate::types::{Diagnosis, DiagnosisRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY,
    patient_id TEXT NOT NULL,
    age INTEGER NOT NULL,
    gender TEXT NOT NULL,
    image_name TEXT NOT NULL,
    diagnosis TEXT NOT NULL CHECK (diagnosis IN ('NORMAL', 'PNEUMONIA')),
    confidence REAL NOT NULL,
    report_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);";

/// Store backed by a SQLite database
///
/// The `id` column is the internal identifier and never leaves the store.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Opens (or creates) a database file and ensures the schema exists
    ///
    /// # Errors
    ///
    /// Returns [`PulmolensError::Persistence`] if the database cannot be
    /// opened or initialised.
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening record store {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PulmolensError::Persistence("database lock poisoned".to_string()))
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert(&self, record: &DiagnosisRecord) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO reports
                (patient_id, age, gender, image_name, diagnosis, confidence, report_text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.patient_id,
                record.age,
                record.gender,
                record.image_name,
                record.diagnosis.as_str(),
                record.confidence,
                record.report_text,
                record
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<DiagnosisRecord>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT patient_id, age, gender, image_name, diagnosis, confidence, report_text, created_at
             FROM reports",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(RawRow {
                patient_id: row.get(0)?,
                age: row.get(1)?,
                gender: row.get(2)?,
                image_name: row.get(3)?,
                diagnosis: row.get(4)?,
                confidence: row.get(5)?,
                report_text: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }
}

/// Row as stored, before the text columns are parsed
struct RawRow {
    patient_id: String,
    age: i32,
    gender: String,
    image_name: String,
    diagnosis: String,
    confidence: f64,
    report_text: String,
    created_at: String,
}

impl RawRow {
    fn into_record(self) -> Result<DiagnosisRecord> {
        let diagnosis = Diagnosis::from_str(&self.diagnosis).ok_or_else(|| {
            PulmolensError::Persistence(format!("unknown stored diagnosis '{}'", self.diagnosis))
        })?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| {
                PulmolensError::Persistence(format!(
                    "invalid stored timestamp '{}': {}",
                    self.created_at, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(DiagnosisRecord {
            patient_id: self.patient_id,
            age: self.age,
            gender: self.gender,
            image_name: self.image_name,
            diagnosis,
            confidence: self.confidence,
            report_text: self.report_text,
            created_at,
        })
    }
}
