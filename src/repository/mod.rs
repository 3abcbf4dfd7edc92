mod embedded;

use embedded::migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::Note;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(db_path)?;

        Ok(Self { conn })
    }

    pub fn migrate(&mut self) -> Result<(), refinery::Error> {
        let migrations_report = migrations::runner().run(&mut self.conn)?;

        for migration in migrations_report.applied_migrations() {
            tracing::info!(
                "Migration Applied -  Name: {}, Version: {}",
                migration.name(),
                migration.version()
            );
        }

        tracing::info!("DB migrations finished!");

        Ok(())
    }

    pub fn create_note(&mut self, note: &Note) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO notes (id, title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                note.id,
                note.title,
                note.content,
                note.created_at.to_rfc3339(),
                note.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    pub fn get_one_note(&self, id: &str) -> Result<Option<Note>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?1",
                params![id],
                note_from_row,
            )
            .optional()
    }

    pub fn get_all_notes(&self) -> Result<Vec<Note>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, created_at, updated_at FROM notes
             ORDER BY updated_at DESC",
        )?;

        let rows = stmt.query_map([], note_from_row)?;

        rows.collect()
    }

    /// Read-merge-write. Fields left as `None` keep their stored values,
    /// `updated_at` is always refreshed. Returns `Ok(None)` when no row
    /// matches. Not atomic across concurrent updates of the same id; the
    /// last writer wins.
    pub fn update_note(
        &mut self,
        id: &str,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<Option<Note>, rusqlite::Error> {
        let Some(mut note) = self.get_one_note(id)? else {
            return Ok(None);
        };

        if let Some(title) = title {
            note.title = title;
        }
        if let Some(content) = content {
            note.content = content;
        }
        note.updated_at = Utc::now();

        self.conn.execute(
            "UPDATE notes SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                note.title,
                note.content,
                note.updated_at.to_rfc3339(),
                note.id,
            ],
        )?;

        Ok(Some(note))
    }

    /// Returns whether a row was actually removed; `false` means the id was
    /// absent.
    pub fn delete_note(&mut self, id: &str) -> Result<bool, rusqlite::Error> {
        let rows = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1", params![id])?;

        Ok(rows == 1)
    }
}

fn note_from_row(row: &Row<'_>) -> Result<Note, rusqlite::Error> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: timestamp_from_column(row, 3)?,
        updated_at: timestamp_from_column(row, 4)?,
    })
}

fn timestamp_from_column(row: &Row<'_>, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;

    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
