use crate::model::{Candidate, ChannelKind, Species, StorageError};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};

const COLUMNS: &str = "url, id, species, photo_url, name, breed, gender, birthday, location,
                       microchip_no, is_notified_all, is_notified_cat";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS candidates (
                url TEXT PRIMARY KEY,
                id TEXT NOT NULL,
                species TEXT NOT NULL,
                photo_url TEXT NOT NULL DEFAULT '',
                name TEXT NOT NULL DEFAULT '',
                breed TEXT NOT NULL DEFAULT '',
                gender TEXT NOT NULL DEFAULT '',
                birthday TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT '',
                microchip_no TEXT NOT NULL DEFAULT '',
                is_notified_all INTEGER NOT NULL DEFAULT 0,
                is_notified_cat INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_candidates_created_at ON candidates (created_at);
            ",
        )?;

        Ok(Self { conn })
    }

    /// Records created after `cutoff`: the snapshot the novelty filter diffs against.
    pub fn known_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Candidate>, StorageError> {
        let sql = format!(
            "SELECT {} FROM candidates WHERE created_at > ?1 ORDER BY created_at ASC, rowid ASC",
            COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![timestamp(cutoff)], Self::map_candidate)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Inserts freshly scraped records. A URL that is already stored is left as it is.
    /// Returns how many rows were actually added.
    pub fn insert_new(&self, candidates: &[Candidate], now: DateTime<Utc>) -> Result<usize, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO candidates (
                    url, id, species, photo_url, name, breed, gender, birthday, location,
                    microchip_no, is_notified_all, is_notified_cat, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(url) DO NOTHING",
            )?;
            let created_at = timestamp(now);
            for c in candidates {
                inserted += stmt.execute(params![
                    &c.url,
                    &c.id,
                    c.species.as_str(),
                    &c.photo_url,
                    &c.name,
                    &c.breed,
                    &c.gender,
                    &c.birthday,
                    &c.location,
                    &c.microchip_no,
                    c.is_notified_all,
                    c.is_notified_cat,
                    &created_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Up to `limit` records the channel has not been notified about, oldest first.
    pub fn pending(&self, kind: ChannelKind, limit: usize) -> Result<Vec<Candidate>, StorageError> {
        let filter = match kind {
            ChannelKind::All => "is_notified_all = 0",
            ChannelKind::Cat => "species = 'Cat' AND is_notified_cat = 0",
        };
        let sql = format!(
            "SELECT {} FROM candidates WHERE {} ORDER BY created_at ASC, rowid ASC LIMIT ?1",
            COLUMNS, filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], Self::map_candidate)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Writes back the notification flags. Scraped fields are never rewritten.
    pub fn update_flags(&self, candidates: &[Candidate]) -> Result<usize, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE candidates SET is_notified_all = ?2, is_notified_cat = ?3 WHERE url = ?1",
            )?;
            for c in candidates {
                updated += stmt.execute(params![&c.url, c.is_notified_all, c.is_notified_cat])?;
            }
        }
        tx.commit()?;
        Ok(updated)
    }

    /// Most recently stored record.
    pub fn last_candidate(&self) -> Result<Option<Candidate>, StorageError> {
        let sql = format!(
            "SELECT {} FROM candidates ORDER BY created_at DESC, rowid DESC LIMIT 1",
            COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::map_candidate(row)?)),
            None => Ok(None),
        }
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM candidates", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn map_candidate(row: &Row) -> Result<Candidate, rusqlite::Error> {
        let species_str: String = row.get(2)?;
        let species = Species::from_db(&species_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown species '{}'", species_str).into(),
            )
        })?;

        Ok(Candidate {
            url: row.get(0)?,
            id: row.get(1)?,
            species,
            photo_url: row.get(3)?,
            name: row.get(4)?,
            breed: row.get(5)?,
            gender: row.get(6)?,
            birthday: row.get(7)?,
            location: row.get(8)?,
            microchip_no: row.get(9)?,
            is_notified_all: row.get(10)?,
            is_notified_cat: row.get(11)?,
        })
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
