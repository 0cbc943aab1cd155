//! SQLite-backed offline cache of the video playlist.

mod dao;
mod entities;

pub use dao::VideoDao;
pub use entities::{as_domain_model, DatabaseVideo};

use color_eyre::{eyre::eyre, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{info, warn};

/// Version stored in `PRAGMA user_version`. A database carrying any other
/// version is wiped and rebuilt rather than migrated.
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS video_database_table (
    url TEXT PRIMARY KEY NOT NULL,
    updated TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    thumbnail TEXT NOT NULL,
    closed_captions TEXT
);
"#;

static INSTANCE: OnceLock<Arc<VideosDatabase>> = OnceLock::new();
static INSTANCE_LOCK: Mutex<()> = Mutex::new(());

/// The video cache database
pub struct VideosDatabase {
  video_dao: VideoDao,
}

impl VideosDatabase {
  /// Get the process-wide database, opening it on first use.
  ///
  /// Only the first successful call opens `path`; every caller, on any
  /// thread, gets the same instance afterwards and later paths are ignored.
  pub fn instance(path: &Path) -> Result<Arc<Self>> {
    get_or_open(&INSTANCE, &INSTANCE_LOCK, path)
  }

  /// Open or create a database file, outside the shared instance.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))?;

    conn
      .execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
      )
      .map_err(|e| eyre!("Failed to set pragmas: {}", e))?;

    info!("Database opened at {}", path.display());
    Self::from_connection(conn)
  }

  /// Open a private in-memory database.
  #[cfg(test)]
  pub fn in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;
    Self::from_connection(conn)
  }

  /// Default database location, `$XDG_DATA_HOME/devbytes/videos_database.db`
  pub fn default_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("videos_database.db"))
  }

  pub fn video_dao(&self) -> &VideoDao {
    &self.video_dao
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    run_migrations(&conn)?;
    let video_dao = VideoDao::new(conn)?;
    Ok(Self { video_dao })
  }
}

/// Double-checked creation of the database held in `cell`.
fn get_or_open(
  cell: &OnceLock<Arc<VideosDatabase>>,
  lock: &Mutex<()>,
  path: &Path,
) -> Result<Arc<VideosDatabase>> {
  if let Some(db) = cell.get() {
    return Ok(Arc::clone(db));
  }

  // The guard only serializes the creation decision; it protects no data,
  // so a poisoned lock is still usable.
  let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

  if let Some(db) = cell.get() {
    return Ok(Arc::clone(db));
  }

  let db = Arc::new(VideosDatabase::open(path)?);
  Ok(Arc::clone(cell.get_or_init(|| db)))
}

/// Application data directory, shared with the log files.
pub fn data_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("devbytes"))
}

/// Bring the schema to `SCHEMA_VERSION`, dropping cached rows on mismatch.
fn run_migrations(conn: &Connection) -> Result<()> {
  let version: i32 = conn
    .query_row("PRAGMA user_version", [], |row| row.get(0))
    .map_err(|e| eyre!("Failed to read schema version: {}", e))?;

  if version == SCHEMA_VERSION {
    return conn
      .execute_batch(SCHEMA)
      .map_err(|e| eyre!("Failed to run migrations: {}", e));
  }

  if version != 0 {
    warn!(
      found = version,
      expected = SCHEMA_VERSION,
      "Schema version mismatch, rebuilding video cache"
    );
  }

  conn
    .execute_batch(&format!(
      "BEGIN;
       DROP TABLE IF EXISTS video_database_table;
       {SCHEMA}
       PRAGMA user_version = {SCHEMA_VERSION};
       COMMIT;"
    ))
    .map_err(|e| eyre!("Failed to rebuild schema: {}", e))?;

  Ok(())
}

/// Path used by every test that touches the shared instance, so that they
/// all agree on one file no matter which test initializes it first.
#[cfg(test)]
pub(crate) fn shared_test_path() -> PathBuf {
  std::env::temp_dir()
    .join(format!("devbytes-tests-{}", std::process::id()))
    .join("videos_database.db")
}
