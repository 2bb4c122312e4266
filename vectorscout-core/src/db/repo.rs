//! Database repository layer
//!
//! Provides query and insert operations for match and pit scouting records.
//! Each record is an aggregate: its action records or auto paths are written
//! in the same transaction as the parent row.

use crate::actions::{ActionRecord, ActionType, QualitativeData};
use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Mutex;

/// Persistence collaborator of the scouting sessions.
///
/// Inserts assign the record ID; updates and deletes of a missing ID fail
/// with [`Error::NotFound`]. Lists are ordered most recent first.
pub trait RecordStore {
    fn insert_match_scout(&self, data: &MatchScoutData) -> Result<i64>;
    fn get_match_scout(&self, id: i64) -> Result<Option<MatchScoutData>>;
    fn update_match_scout(&self, data: &MatchScoutData) -> Result<()>;
    fn delete_match_scout(&self, id: i64) -> Result<()>;
    fn list_match_scouts(&self, limit: usize) -> Result<Vec<MatchScoutData>>;
    /// Flag a match record as rendered into a transfer code.
    fn mark_transfer_generated(&self, id: i64) -> Result<()>;

    fn insert_pit_scout(&self, data: &PitScoutData) -> Result<i64>;
    fn get_pit_scout(&self, id: i64) -> Result<Option<PitScoutData>>;
    fn update_pit_scout(&self, data: &PitScoutData) -> Result<()>;
    fn delete_pit_scout(&self, id: i64) -> Result<()>;
    fn list_pit_scouts(&self, limit: usize) -> Result<Vec<PitScoutData>>;
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Match scout operations
    // ============================================

    /// Action records of a match record, in recording order.
    pub fn get_action_records(&self, match_scout_id: i64) -> Result<Vec<ActionRecord>> {
        let conn = self.conn.lock().unwrap();
        load_action_records(&conn, match_scout_id)
    }

    /// Match records not yet rendered into a transfer code, oldest first.
    pub fn pending_transfer(&self) -> Result<Vec<MatchScoutData>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM match_scouts WHERE transfer_generated = 0 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_match_scout)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        attach_action_records(&conn, rows)
    }

    fn row_to_match_scout(row: &Row) -> rusqlite::Result<MatchScoutData> {
        let id: i64 = row.get("id")?;
        let created_at_str: String = row.get("created_at")?;

        Ok(MatchScoutData {
            id: Some(id),
            event: row.get("event")?,
            match_number: row.get("match_number")?,
            robot_designation: row.get("robot_designation")?,
            scout_name: row.get("scout_name")?,
            team_number: row.get("team_number")?,
            start_position: row.get("start_position")?,
            loaded: row.get("loaded")?,
            no_show: row.get("no_show")?,
            action_records: Vec::new(),
            created_at: parse_timestamp("match_scouts", id, &created_at_str),
            transfer_generated: row.get("transfer_generated")?,
        })
    }

    // ============================================
    // Pit scout operations
    // ============================================

    /// Auto paths of a pit record, in entry order.
    pub fn get_auto_paths(&self, pit_scout_id: i64) -> Result<Vec<AutoPath>> {
        let conn = self.conn.lock().unwrap();
        load_auto_paths(&conn, pit_scout_id)
    }

    fn row_to_pit_scout(row: &Row) -> rusqlite::Result<PitScoutData> {
        let id: i64 = row.get("id")?;
        let created_at_str: String = row.get("created_at")?;

        Ok(PitScoutData {
            id: Some(id),
            event: row.get("event")?,
            team_number: row.get("team_number")?,
            drivetrain_type: row.get("drivetrain_type")?,
            preferred_role: row.get("preferred_role")?,
            preferred_path: row.get("preferred_path")?,
            photo_path: row.get("photo_path")?,
            auto_paths: Vec::new(),
            created_at: parse_timestamp("pit_scouts", id, &created_at_str),
        })
    }
}

impl RecordStore for Database {
    fn insert_match_scout(&self, data: &MatchScoutData) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO match_scouts (event, match_number, robot_designation, scout_name,
                                      team_number, start_position, loaded, no_show,
                                      created_at, transfer_generated)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                data.event,
                data.match_number,
                data.robot_designation,
                data.scout_name,
                data.team_number,
                data.start_position,
                data.loaded,
                data.no_show,
                data.created_at.to_rfc3339(),
                data.transfer_generated,
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_action_records(&tx, id, &data.action_records)?;

        tx.commit()?;
        tracing::debug!(
            id,
            actions = data.action_records.len(),
            "Inserted match record"
        );
        Ok(id)
    }

    fn get_match_scout(&self, id: i64) -> Result<Option<MatchScoutData>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT * FROM match_scouts WHERE id = ?",
                [id],
                Self::row_to_match_scout,
            )
            .optional()?;

        match row {
            Some(mut data) => {
                data.action_records = load_action_records(&conn, id)?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    fn update_match_scout(&self, data: &MatchScoutData) -> Result<()> {
        let id = data
            .id
            .ok_or_else(|| Error::NotFound("match record has no id".to_string()))?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let changed = tx.execute(
            r#"
            UPDATE match_scouts SET
                event = ?2,
                match_number = ?3,
                robot_designation = ?4,
                scout_name = ?5,
                team_number = ?6,
                start_position = ?7,
                loaded = ?8,
                no_show = ?9,
                transfer_generated = ?10
            WHERE id = ?1
            "#,
            params![
                id,
                data.event,
                data.match_number,
                data.robot_designation,
                data.scout_name,
                data.team_number,
                data.start_position,
                data.loaded,
                data.no_show,
                data.transfer_generated,
            ],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("match record {}", id)));
        }

        tx.execute("DELETE FROM action_records WHERE match_scout_id = ?", [id])?;
        insert_action_records(&tx, id, &data.action_records)?;

        tx.commit()?;
        Ok(())
    }

    fn delete_match_scout(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        // action_records rows go with it (ON DELETE CASCADE)
        let changed = conn.execute("DELETE FROM match_scouts WHERE id = ?", [id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("match record {}", id)));
        }
        Ok(())
    }

    fn list_match_scouts(&self, limit: usize) -> Result<Vec<MatchScoutData>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM match_scouts ORDER BY created_at DESC, id DESC LIMIT ?",
        )?;
        let rows = stmt
            .query_map([limit as i64], Self::row_to_match_scout)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        attach_action_records(&conn, rows)
    }

    fn mark_transfer_generated(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE match_scouts SET transfer_generated = 1 WHERE id = ?",
            [id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("match record {}", id)));
        }
        Ok(())
    }

    fn insert_pit_scout(&self, data: &PitScoutData) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO pit_scouts (event, team_number, drivetrain_type, preferred_role,
                                    preferred_path, photo_path, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                data.event,
                data.team_number,
                data.drivetrain_type,
                data.preferred_role,
                data.preferred_path,
                data.photo_path,
                data.created_at.to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_auto_paths(&tx, id, &data.auto_paths)?;

        tx.commit()?;
        tracing::debug!(id, paths = data.auto_paths.len(), "Inserted pit record");
        Ok(id)
    }

    fn get_pit_scout(&self, id: i64) -> Result<Option<PitScoutData>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT * FROM pit_scouts WHERE id = ?",
                [id],
                Self::row_to_pit_scout,
            )
            .optional()?;

        match row {
            Some(mut data) => {
                data.auto_paths = load_auto_paths(&conn, id)?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    fn update_pit_scout(&self, data: &PitScoutData) -> Result<()> {
        let id = data
            .id
            .ok_or_else(|| Error::NotFound("pit record has no id".to_string()))?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let changed = tx.execute(
            r#"
            UPDATE pit_scouts SET
                event = ?2,
                team_number = ?3,
                drivetrain_type = ?4,
                preferred_role = ?5,
                preferred_path = ?6,
                photo_path = ?7
            WHERE id = ?1
            "#,
            params![
                id,
                data.event,
                data.team_number,
                data.drivetrain_type,
                data.preferred_role,
                data.preferred_path,
                data.photo_path,
            ],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("pit record {}", id)));
        }

        tx.execute("DELETE FROM auto_paths WHERE pit_scout_id = ?", [id])?;
        insert_auto_paths(&tx, id, &data.auto_paths)?;

        tx.commit()?;
        Ok(())
    }

    fn delete_pit_scout(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM pit_scouts WHERE id = ?", [id])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("pit record {}", id)));
        }
        Ok(())
    }

    fn list_pit_scouts(&self, limit: usize) -> Result<Vec<PitScoutData>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM pit_scouts ORDER BY created_at DESC, id DESC LIMIT ?",
        )?;
        let mut rows = stmt
            .query_map([limit as i64], Self::row_to_pit_scout)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for data in &mut rows {
            if let Some(id) = data.id {
                data.auto_paths = load_auto_paths(&conn, id)?;
            }
        }
        Ok(rows)
    }
}

// ============================================
// Child rows
// ============================================

/// Stored `created_at`. An unreadable value is logged and read as the Unix
/// epoch, never as the time of reading.
fn parse_timestamp(table: &str, id: i64, s: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!(table, id, value = s, error = %e, "unreadable created_at, using epoch");
            DateTime::<Utc>::default()
        }
    }
}

fn insert_action_records(
    conn: &Connection,
    match_scout_id: i64,
    records: &[ActionRecord],
) -> Result<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO action_records (match_scout_id, seq, phase, action_type,
                                    start_time_ms, end_time_ms, qualitative_data)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )?;

    for (seq, record) in records.iter().enumerate() {
        let qualitative_json = record
            .qualitative_data()
            .map(QualitativeData::to_json)
            .transpose()?;
        stmt.execute(params![
            match_scout_id,
            seq as i64,
            record.phase().as_str(),
            record.action_type().as_str(),
            record.start_time_ms(),
            record.end_time_ms(),
            qualitative_json,
        ])?;
    }
    Ok(())
}

/// Action row as stored, before validation.
struct StoredAction {
    id: i64,
    phase: String,
    action_type: String,
    start_time_ms: i64,
    end_time_ms: Option<i64>,
    qualitative_data: Option<String>,
}

impl StoredAction {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            phase: row.get("phase")?,
            action_type: row.get("action_type")?,
            start_time_ms: row.get("start_time_ms")?,
            end_time_ms: row.get("end_time_ms")?,
            qualitative_data: row.get("qualitative_data")?,
        })
    }

    /// Rebuild the record. Unreadable detail is dropped; a row whose type or
    /// phase cannot be rebuilt is skipped.
    fn into_record(self) -> Option<ActionRecord> {
        let phase: MatchPhase = match self.phase.parse() {
            Ok(phase) => phase,
            Err(e) => {
                tracing::warn!(row = self.id, error = %e, "Skipping stored action");
                return None;
            }
        };
        let action_type: ActionType = match self.action_type.parse() {
            Ok(action_type) => action_type,
            Err(e) => {
                tracing::warn!(row = self.id, error = %e, "Skipping stored action");
                return None;
            }
        };

        let qualitative_data = self.qualitative_data.and_then(|json| {
            QualitativeData::from_json(action_type.qualitative_kind(), &json)
                .map_err(|e| {
                    tracing::warn!(row = self.id, error = %e, "Dropping unreadable qualitative data");
                })
                .ok()
        });

        ActionRecord::new(
            phase,
            action_type,
            self.start_time_ms,
            self.end_time_ms,
            qualitative_data,
        )
        .map_err(|e| {
            tracing::warn!(row = self.id, error = %e, "Skipping stored action");
        })
        .ok()
    }
}

fn load_action_records(conn: &Connection, match_scout_id: i64) -> Result<Vec<ActionRecord>> {
    let mut stmt =
        conn.prepare("SELECT * FROM action_records WHERE match_scout_id = ? ORDER BY seq")?;
    let rows = stmt
        .query_map([match_scout_id], StoredAction::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().filter_map(StoredAction::into_record).collect())
}

fn attach_action_records(
    conn: &Connection,
    mut rows: Vec<MatchScoutData>,
) -> Result<Vec<MatchScoutData>> {
    for data in &mut rows {
        if let Some(id) = data.id {
            data.action_records = load_action_records(conn, id)?;
        }
    }
    Ok(rows)
}

fn insert_auto_paths(conn: &Connection, pit_scout_id: i64, paths: &[AutoPath]) -> Result<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO auto_paths (pit_scout_id, seq, name, steps, drawing_path)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )?;

    for (seq, path) in paths.iter().enumerate() {
        stmt.execute(params![
            pit_scout_id,
            seq as i64,
            path.name,
            serde_json::to_string(&path.steps)?,
            path.drawing_path,
        ])?;
    }
    Ok(())
}

fn load_auto_paths(conn: &Connection, pit_scout_id: i64) -> Result<Vec<AutoPath>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, steps, drawing_path FROM auto_paths WHERE pit_scout_id = ? ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([pit_scout_id], |row| {
            Ok((
                row.get::<_, i64>("id")?,
                row.get::<_, String>("name")?,
                row.get::<_, String>("steps")?,
                row.get::<_, Option<String>>("drawing_path")?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .map(|(row_id, name, steps_json, drawing_path)| {
            let steps = serde_json::from_str(&steps_json).unwrap_or_else(|e| {
                tracing::warn!(row = row_id, error = %e, "Dropping unreadable auto path steps");
                Vec::new()
            });
            AutoPath {
                name,
                steps,
                drawing_path,
            }
        })
        .collect())
}
