use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DB = SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS plans (
    id                TEXT PRIMARY KEY,
    name              TEXT NOT NULL UNIQUE,
    microcycle_count  INTEGER NOT NULL,
    microcycle_length INTEGER NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS plan_slots (
    id       TEXT PRIMARY KEY,
    plan_id  TEXT NOT NULL REFERENCES plans(id) ON DELETE CASCADE,
    position INTEGER NOT NULL, -- 1-based within the microcycle; rest slots have no row
    label    TEXT NOT NULL,
    UNIQUE (plan_id, position)
);

CREATE TABLE IF NOT EXISTS plan_exercises (
    id          TEXT PRIMARY KEY,
    slot_id     TEXT NOT NULL REFERENCES plan_slots(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    sets        INTEGER NOT NULL,
    rep_lower   INTEGER NOT NULL,
    rep_upper   INTEGER NOT NULL,
    rir         INTEGER NOT NULL,
    order_index INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS runs (
    id           TEXT PRIMARY KEY,
    plan_id      TEXT NOT NULL REFERENCES plans(id),
    start_date   TEXT NOT NULL,
    end_date     TEXT NOT NULL,
    active       INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL,
    completed_at TEXT
);

CREATE TABLE IF NOT EXISTS run_days (
    id            TEXT PRIMARY KEY,
    run_id        TEXT NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    microcycle    INTEGER NOT NULL,
    slot_position INTEGER NOT NULL,
    date          TEXT NOT NULL,
    completed     INTEGER NOT NULL DEFAULT 0,
    UNIQUE (run_id, microcycle, slot_position)
);

CREATE TABLE IF NOT EXISTS day_exercises (
    id          TEXT PRIMARY KEY,
    run_day_id  TEXT NOT NULL REFERENCES run_days(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    order_index INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS exercise_sets (
    id              TEXT PRIMARY KEY,
    day_exercise_id TEXT NOT NULL REFERENCES day_exercises(id) ON DELETE CASCADE,
    number          INTEGER NOT NULL,
    weight          REAL NOT NULL DEFAULT 0,
    rep_lower       INTEGER NOT NULL,
    rep_upper       INTEGER NOT NULL,
    rir             INTEGER NOT NULL,
    reps_completed  INTEGER,
    completed       INTEGER NOT NULL DEFAULT 0,
    UNIQUE (day_exercise_id, number)
);
"#;

/// Database file under the platform data directory.
pub fn default_path() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .map(|d| d.join("mesolog"))
        .context("could not determine data directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating `{}`", dir.display()))?;
    Ok(dir.join("mesolog.db"))
}

pub async fn open(path: &Path) -> Result<DB> {
    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    sqlx::raw_sql(SCHEMA).execute(&pool).await?;
    Ok(pool)
}

/// In-memory database for tests. Pinned to a single connection: every
/// in-memory SQLite connection is its own database.
#[cfg(test)]
pub async fn open_memory() -> Result<DB> {
    let opts = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await?;

    sqlx::raw_sql(SCHEMA).execute(&pool).await?;
    Ok(pool)
}
