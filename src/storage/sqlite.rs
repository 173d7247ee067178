/// SQLite implementation of the habit storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habit data. It handles all SQL queries and data conversion.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::domain::{Habit, HabitId, Upload};
use crate::storage::{migrations, HabitStorage, StorageError};

const HABIT_COLUMNS: &str = "id, name, description, streak, is_completed, created_at";

/// SQLite-based storage implementation
///
/// The connection sits behind a mutex: each storage call, and each
/// `modify_habit` cycle as a whole, runs with exclusive access to it.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

/// Raw habit row before its text columns are parsed
struct HabitRow {
    id: String,
    name: String,
    description: Option<String>,
    streak: u32,
    is_completed: bool,
    created_at: String,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// Create a storage instance backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        // Uploads are removed together with their habit
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Connection("Database connection lock poisoned".to_string()))
    }

    fn read_habit_row(row: &Row<'_>) -> rusqlite::Result<HabitRow> {
        Ok(HabitRow {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            streak: row.get(3)?,
            is_completed: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_habit(row: HabitRow, uploads: Vec<Upload>) -> Result<Habit, StorageError> {
        let id = HabitId::from_string(&row.id).map_err(|e| StorageError::CorruptRow {
            column: "habits.id",
            message: e.to_string(),
        })?;
        let created_at = parse_timestamp("habits.created_at", &row.created_at)?;

        Ok(Habit::from_existing(
            id,
            row.name,
            row.description,
            row.streak,
            row.is_completed,
            created_at,
            uploads,
        ))
    }

    /// Load a single habit and its uploads using the given connection
    fn load_habit(conn: &Connection, habit_id: &HabitId) -> Result<Habit, StorageError> {
        let id_str = habit_id.to_string();

        let row = conn
            .query_row(
                &format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS),
                params![id_str],
                Self::read_habit_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::HabitNotFound {
                habit_id: id_str.clone(),
            })?;

        let uploads = Self::load_uploads(conn, &id_str)?;
        Self::into_habit(row, uploads)
    }

    fn load_uploads(conn: &Connection, habit_id: &str) -> Result<Vec<Upload>, StorageError> {
        let mut stmt = conn.prepare(
            "SELECT uploaded_at, image_url FROM habit_uploads
             WHERE habit_id = ?1 ORDER BY position ASC",
        )?;

        let rows = stmt.query_map(params![habit_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut uploads = Vec::new();
        for row in rows {
            let (uploaded_at, image_url) = row?;
            uploads.push(Upload {
                date: parse_timestamp("habit_uploads.uploaded_at", &uploaded_at)?,
                image_url,
            });
        }

        Ok(uploads)
    }

    /// Write the habit's scalar fields and replace its upload list
    fn write_habit(conn: &Connection, habit: &Habit) -> Result<(), StorageError> {
        let id_str = habit.id.to_string();

        let rows_affected = conn.execute(
            "UPDATE habits SET
                name = ?2,
                description = ?3,
                streak = ?4,
                is_completed = ?5
             WHERE id = ?1",
            params![
                id_str,
                habit.name,
                habit.description,
                habit.streak,
                habit.is_completed
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id: id_str });
        }

        conn.execute("DELETE FROM habit_uploads WHERE habit_id = ?1", params![id_str])?;
        Self::insert_uploads(conn, &id_str, &habit.uploads)?;

        Ok(())
    }

    fn insert_uploads(conn: &Connection, habit_id: &str, uploads: &[Upload]) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(
            "INSERT INTO habit_uploads (habit_id, position, uploaded_at, upload_day, image_url)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for (position, upload) in uploads.iter().enumerate() {
            stmt.execute(params![
                habit_id,
                position as i64,
                upload.date.to_rfc3339(),
                upload.calendar_day().to_string(),
                upload.image_url
            ])?;
        }

        Ok(())
    }
}

impl HabitStorage for SqliteStorage {
    /// Create a new habit in the database
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id_str = habit.id.to_string();

        tx.execute(
            &format!("INSERT INTO habits ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)", HABIT_COLUMNS),
            params![
                id_str,
                habit.name,
                habit.description,
                habit.streak,
                habit.is_completed,
                habit.created_at.to_rfc3339()
            ],
        )?;
        Self::insert_uploads(&tx, &id_str, &habit.uploads)?;
        tx.commit()?;

        tracing::debug!("Created habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    /// Get a habit by its ID
    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        let conn = self.lock()?;
        Self::load_habit(&conn, habit_id)
    }

    /// List all habits, oldest first
    fn list_habits(&self) -> Result<Vec<Habit>, StorageError> {
        let conn = self.lock()?;

        let mut uploads_by_habit: HashMap<String, Vec<Upload>> = HashMap::new();
        {
            let mut stmt = conn.prepare(
                "SELECT habit_id, uploaded_at, image_url FROM habit_uploads
                 ORDER BY habit_id, position ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            for row in rows {
                let (habit_id, uploaded_at, image_url) = row?;
                uploads_by_habit.entry(habit_id).or_default().push(Upload {
                    date: parse_timestamp("habit_uploads.uploaded_at", &uploaded_at)?,
                    image_url,
                });
            }
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM habits ORDER BY created_at ASC, rowid ASC",
            HABIT_COLUMNS
        ))?;
        let habit_iter = stmt.query_map([], Self::read_habit_row)?;

        let mut habits = Vec::new();
        for row in habit_iter {
            let row = row?;
            let uploads = uploads_by_habit.remove(&row.id).unwrap_or_default();
            habits.push(Self::into_habit(row, uploads)?);
        }

        Ok(habits)
    }

    /// Load, mutate and store a habit inside one immediate transaction
    fn modify_habit<T, E, F>(&self, habit_id: &HabitId, apply: F) -> Result<(Habit, T), E>
    where
        F: FnOnce(&mut Habit) -> Result<T, E>,
        E: From<StorageError>,
    {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StorageError::from)?;

        let mut habit = Self::load_habit(&tx, habit_id)?;

        // Dropping the transaction on error rolls it back
        let output = apply(&mut habit)?;

        Self::write_habit(&tx, &habit)?;
        tx.commit().map_err(StorageError::from)?;

        tracing::debug!("Updated habit: {} ({})", habit.name, habit.id);
        Ok((habit, output))
    }

    /// Delete a habit; its uploads go with it via the foreign key
    fn delete_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let habit = Self::load_habit(&tx, habit_id)?;
        tx.execute("DELETE FROM habits WHERE id = ?1", params![habit_id.to_string()])?;
        tx.commit()?;

        tracing::debug!("Deleted habit: {}", habit_id);
        Ok(habit)
    }
}

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::CorruptRow {
            column,
            message: e.to_string(),
        })
}
