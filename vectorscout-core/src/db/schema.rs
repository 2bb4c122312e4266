//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Match scouting
    r#"
    CREATE TABLE IF NOT EXISTS match_scouts (
        id                 INTEGER PRIMARY KEY AUTOINCREMENT,
        event              TEXT NOT NULL,
        match_number       TEXT NOT NULL,
        robot_designation  TEXT NOT NULL,
        scout_name         TEXT NOT NULL,
        team_number        TEXT NOT NULL,
        start_position     TEXT NOT NULL DEFAULT '',
        loaded             INTEGER NOT NULL DEFAULT 0,
        no_show            INTEGER NOT NULL DEFAULT 0,
        created_at         DATETIME NOT NULL,
        transfer_generated INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_match_scouts_created ON match_scouts(created_at);
    CREATE INDEX IF NOT EXISTS idx_match_scouts_event ON match_scouts(event, match_number);

    -- One row per observed action, in recording order
    CREATE TABLE IF NOT EXISTS action_records (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        match_scout_id   INTEGER NOT NULL REFERENCES match_scouts(id) ON DELETE CASCADE,
        seq              INTEGER NOT NULL,
        phase            TEXT NOT NULL,
        action_type      TEXT NOT NULL,
        start_time_ms    INTEGER NOT NULL,
        end_time_ms      INTEGER,
        qualitative_data JSON
    );

    CREATE INDEX IF NOT EXISTS idx_action_records_match ON action_records(match_scout_id, seq);
    "#,
    // Version 2: Pit scouting
    r#"
    CREATE TABLE IF NOT EXISTS pit_scouts (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        event            TEXT NOT NULL,
        team_number      INTEGER NOT NULL,
        drivetrain_type  TEXT NOT NULL,
        preferred_role   TEXT NOT NULL,
        preferred_path   TEXT NOT NULL,
        photo_path       TEXT,
        created_at       DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_pit_scouts_created ON pit_scouts(created_at);

    CREATE TABLE IF NOT EXISTS auto_paths (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        pit_scout_id     INTEGER NOT NULL REFERENCES pit_scouts(id) ON DELETE CASCADE,
        seq              INTEGER NOT NULL,
        name             TEXT NOT NULL,
        steps            JSON NOT NULL,
        drawing_path     TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_auto_paths_pit ON auto_paths(pit_scout_id, seq);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
