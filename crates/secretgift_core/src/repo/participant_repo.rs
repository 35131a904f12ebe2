//! Roster repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Load and overwrite the full participant collection.
//! - Preserve insertion order through the `position` column.
//!
//! # Invariants
//! - `save_all` runs in a single transaction.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::participant::{Participant, ParticipantId};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage failure raised by any roster repository.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "roster file error: {err}"),
            Self::Json(err) => write!(f, "roster file is not valid JSON: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted participant data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Whole-collection persistence contract for the participant store.
pub trait ParticipantRepository {
    /// Loads every persisted participant in insertion order.
    fn load_all(&self) -> RepoResult<Vec<Participant>>;
    /// Replaces the persisted roster with `participants`.
    fn save_all(&self, participants: &[Participant]) -> RepoResult<()>;
}

impl<R: ParticipantRepository + ?Sized> ParticipantRepository for Box<R> {
    fn load_all(&self) -> RepoResult<Vec<Participant>> {
        (**self).load_all()
    }

    fn save_all(&self, participants: &[Participant]) -> RepoResult<()> {
        (**self).save_all(participants)
    }
}

/// SQLite-backed roster repository owning its connection.
pub struct SqliteParticipantRepository {
    conn: Connection,
}

impl SqliteParticipantRepository {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens the roster database at `path`, creating and migrating it as needed.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a throwaway in-memory roster.
    pub fn in_memory() -> RepoResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Borrows the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ParticipantRepository for SqliteParticipantRepository {
    fn load_all(&self) -> RepoResult<Vec<Participant>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name, email, assigned_recipient_id
             FROM participants
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut participants = Vec::new();

        while let Some(row) = rows.next()? {
            participants.push(parse_participant_row(row)?);
        }

        Ok(participants)
    }

    fn save_all(&self, participants: &[Participant]) -> RepoResult<()> {
        // The store holds exclusive access to the repository while saving,
        // so no other transaction can be open on this connection.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM participants;", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO participants (uuid, name, email, assigned_recipient_id, position)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            for (position, participant) in participants.iter().enumerate() {
                insert.execute(params![
                    participant.id.to_string(),
                    participant.name.as_str(),
                    participant.email.as_str(),
                    participant.assigned_recipient_id.map(|id| id.to_string()),
                    position as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_participant_row(row: &Row<'_>) -> RepoResult<Participant> {
    let id = parse_uuid(row.get("uuid")?, "participants.uuid")?;
    let assigned_recipient_id = match row.get::<_, Option<String>>("assigned_recipient_id")? {
        Some(text) => Some(parse_uuid(text, "participants.assigned_recipient_id")?),
        None => None,
    };

    Ok(Participant {
        id,
        name: row.get("name")?,
        email: row.get("email")?,
        assigned_recipient_id,
    })
}

fn parse_uuid(text: String, column: &str) -> RepoResult<ParticipantId> {
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}
