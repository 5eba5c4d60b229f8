// Database schema types and query helpers

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params, OptionalExtension};

use crate::constants::{DEFAULT_FONT_SIZE, DEFAULT_SCALE_PERCENT};
use crate::error::{BotError, Result};
use crate::settings::{Anchor, Placement, SettingsStore, TextSettings, UserId};

// ----- Placement -----

pub fn get_placement(conn: &Connection, user_id: UserId) -> Result<Option<Placement>> {
    let result = conn.query_row(
        "SELECT position, scale_percent FROM user_settings WHERE user_id = ?1",
        params![user_id],
        |row| {
            let position: String = row.get(0)?;
            let scale: i64 = row.get(1)?;
            Ok(Placement {
                anchor: Anchor::from_key(&position),
                scale_percent: u32::try_from(scale).unwrap_or(DEFAULT_SCALE_PERCENT),
            })
        },
    ).optional()?;
    Ok(result)
}

pub fn upsert_placement(conn: &Connection, user_id: UserId, placement: &Placement) -> Result<()> {
    conn.execute(
        "INSERT INTO user_settings (user_id, position, scale_percent, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(user_id) DO UPDATE SET
             position = excluded.position,
             scale_percent = excluded.scale_percent,
             updated_at = excluded.updated_at",
        params![user_id, placement.anchor.key(), placement.scale_percent],
    )?;
    Ok(())
}

// ----- Text settings -----

pub fn get_text_settings(conn: &Connection, user_id: UserId) -> Result<Option<TextSettings>> {
    let result = conn.query_row(
        "SELECT text, color, font_size, enabled FROM text_settings WHERE user_id = ?1",
        params![user_id],
        |row| {
            let font_size: i64 = row.get(2)?;
            Ok(TextSettings {
                text: row.get(0)?,
                color: row.get(1)?,
                font_size: u32::try_from(font_size).unwrap_or(DEFAULT_FONT_SIZE),
                enabled: row.get::<_, i32>(3)? != 0,
            })
        },
    ).optional()?;
    Ok(result)
}

pub fn upsert_text_settings(conn: &Connection, user_id: UserId, settings: &TextSettings) -> Result<()> {
    conn.execute(
        "INSERT INTO text_settings (user_id, text, color, font_size, enabled, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
         ON CONFLICT(user_id) DO UPDATE SET
             text = excluded.text,
             color = excluded.color,
             font_size = excluded.font_size,
             enabled = excluded.enabled,
             updated_at = excluded.updated_at",
        params![
            user_id,
            settings.text,
            settings.color,
            settings.font_size,
            settings.enabled as i32,
        ],
    )?;
    Ok(())
}

// ----- Store -----

/// SQLite-backed settings store. The connection is shared behind a mutex;
/// every call is a single short statement.
pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    /// Open (and migrate) the database file at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::new(super::open_db(db_path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(super::open_in_memory()?))
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock()
            .map_err(|e| BotError::Other(format!("Settings store lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn get_placement(&self, user: UserId) -> Result<Placement> {
        self.with_conn(|conn| Ok(get_placement(conn, user)?.unwrap_or_default()))
    }

    fn set_placement(&self, user: UserId, placement: &Placement) -> Result<()> {
        self.with_conn(|conn| upsert_placement(conn, user, placement))
    }

    fn get_text_settings(&self, user: UserId) -> Result<TextSettings> {
        self.with_conn(|conn| Ok(get_text_settings(conn, user)?.unwrap_or_default()))
    }

    fn set_text_settings(&self, user: UserId, settings: &TextSettings) -> Result<()> {
        self.with_conn(|conn| upsert_text_settings(conn, user, settings))
    }

    // Read and write happen under one lock
    fn update_text_settings(&self, user: UserId, f: &dyn Fn(&mut TextSettings)) -> Result<TextSettings> {
        self.with_conn(|conn| {
            let mut settings = get_text_settings(conn, user)?.unwrap_or_default();
            f(&mut settings);
            upsert_text_settings(conn, user, &settings)?;
            Ok(settings)
        })
    }

    fn update_placement(&self, user: UserId, f: &dyn Fn(&mut Placement)) -> Result<Placement> {
        self.with_conn(|conn| {
            let mut placement = get_placement(conn, user)?.unwrap_or_default();
            f(&mut placement);
            upsert_placement(conn, user, &placement)?;
            Ok(placement)
        })
    }
}
