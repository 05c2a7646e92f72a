//! Storage for memory nodes and the user profile
//!
//! Single SQLite database:
//! ```text
//! profile(id = 1, xp, level)
//! nodes(id, question, answer, easiness, interval_days, next_review, created_at)
//! ```

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use thiserror::Error;
use uuid::Uuid;

use super::models::{MemoryNode, UserProfile};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Card not found: {0}")]
    NodeNotFound(Uuid),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Persistence for cards and the profile, kept small so both the synthesis
/// and review paths can run against an in-memory fake.
pub trait StudyRepository {
    fn get_profile(&self) -> Result<UserProfile>;

    fn save_profile(&mut self, profile: &UserProfile) -> Result<()>;

    fn insert_node(&mut self, node: &MemoryNode) -> Result<()>;

    fn insert_nodes(&mut self, nodes: &[MemoryNode]) -> Result<()> {
        for node in nodes {
            self.insert_node(node)?;
        }
        Ok(())
    }

    fn get_node(&self, id: Uuid) -> Result<MemoryNode>;

    /// Nodes whose next review is on or before `today`, oldest due first
    fn query_due_nodes(&self, today: NaiveDate) -> Result<Vec<MemoryNode>>;

    fn update_node(&mut self, node: &MemoryNode) -> Result<()>;

    fn list_nodes(&self) -> Result<Vec<MemoryNode>>;

    /// Delete every node, returning how many were removed
    fn clear_nodes(&mut self) -> Result<usize>;

    /// Store freshly synthesized nodes together with the rewarded profile.
    /// `SqliteRepository` writes both in one transaction.
    fn store_synthesis(&mut self, nodes: &[MemoryNode], profile: &UserProfile) -> Result<()> {
        self.insert_nodes(nodes)?;
        self.save_profile(profile)
    }

    /// Store a reviewed node together with the rewarded profile, atomically
    /// where the backend supports it.
    fn store_review(&mut self, node: &MemoryNode, profile: &UserProfile) -> Result<()> {
        self.update_node(node)?;
        self.save_profile(profile)
    }
}

/// SQLite-backed repository
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1
            );

            INSERT OR IGNORE INTO profile (id, xp, level) VALUES (1, 0, 1);

            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                easiness REAL NOT NULL DEFAULT 2.5,
                interval_days INTEGER NOT NULL DEFAULT 0,
                next_review TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_nodes_next_review ON nodes(next_review);
            "#,
        )?;

        Ok(Self { conn })
    }
}

const NODE_COLUMNS: &str =
    "id, question, answer, easiness, interval_days, next_review, created_at";

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<MemoryNode> {
    let id: String = row.get(0)?;
    let next_review: String = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok(MemoryNode {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e))?,
        question: row.get(1)?,
        answer: row.get(2)?,
        easiness: row.get(3)?,
        interval: row.get(4)?,
        next_review: NaiveDate::parse_from_str(&next_review, DATE_FORMAT)
            .map_err(|e| conversion_error(5, e))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(6, e))?,
    })
}

fn insert_node_with(conn: &Connection, node: &MemoryNode) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "INSERT INTO nodes ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            NODE_COLUMNS
        ),
        params![
            node.id.to_string(),
            node.question,
            node.answer,
            node.easiness,
            node.interval,
            node.next_review.format(DATE_FORMAT).to_string(),
            node.created_at.to_rfc3339(),
        ],
    )
}

fn save_profile_with(conn: &Connection, profile: &UserProfile) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT OR REPLACE INTO profile (id, xp, level) VALUES (1, ?1, ?2)",
        params![profile.xp, profile.level],
    )
}

fn update_node_with(conn: &Connection, node: &MemoryNode) -> Result<()> {
    let updated = conn.execute(
        "UPDATE nodes SET question = ?2, answer = ?3, easiness = ?4, interval_days = ?5, next_review = ?6 WHERE id = ?1",
        params![
            node.id.to_string(),
            node.question,
            node.answer,
            node.easiness,
            node.interval,
            node.next_review.format(DATE_FORMAT).to_string(),
        ],
    )?;
    if updated == 0 {
        return Err(StorageError::NodeNotFound(node.id));
    }
    Ok(())
}

impl StudyRepository for SqliteRepository {
    fn get_profile(&self) -> Result<UserProfile> {
        let profile = self.conn.query_row(
            "SELECT xp, level FROM profile WHERE id = 1",
            [],
            |row| {
                Ok(UserProfile {
                    xp: row.get(0)?,
                    level: row.get(1)?,
                })
            },
        )?;
        Ok(profile)
    }

    fn save_profile(&mut self, profile: &UserProfile) -> Result<()> {
        save_profile_with(&self.conn, profile)?;
        Ok(())
    }

    fn insert_node(&mut self, node: &MemoryNode) -> Result<()> {
        insert_node_with(&self.conn, node)?;
        Ok(())
    }

    fn insert_nodes(&mut self, nodes: &[MemoryNode]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for node in nodes {
            insert_node_with(&tx, node)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn get_node(&self, id: Uuid) -> Result<MemoryNode> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM nodes WHERE id = ?1", NODE_COLUMNS))?;
        let mut rows = stmt.query_map(params![id.to_string()], node_from_row)?;
        match rows.next() {
            Some(node) => Ok(node?),
            None => Err(StorageError::NodeNotFound(id)),
        }
    }

    fn query_due_nodes(&self, today: NaiveDate) -> Result<Vec<MemoryNode>> {
        // ISO dates compare correctly as text
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM nodes WHERE next_review <= ?1 ORDER BY next_review, created_at",
            NODE_COLUMNS
        ))?;
        let nodes = stmt
            .query_map(params![today.format(DATE_FORMAT).to_string()], node_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    fn update_node(&mut self, node: &MemoryNode) -> Result<()> {
        update_node_with(&self.conn, node)
    }

    fn list_nodes(&self) -> Result<Vec<MemoryNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM nodes ORDER BY created_at",
            NODE_COLUMNS
        ))?;
        let nodes = stmt
            .query_map([], node_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    fn clear_nodes(&mut self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM nodes", [])?;
        Ok(removed)
    }

    fn store_synthesis(&mut self, nodes: &[MemoryNode], profile: &UserProfile) -> Result<()> {
        let tx = self.conn.transaction()?;
        for node in nodes {
            insert_node_with(&tx, node)?;
        }
        save_profile_with(&tx, profile)?;
        tx.commit()?;
        Ok(())
    }

    fn store_review(&mut self, node: &MemoryNode, profile: &UserProfile) -> Result<()> {
        let tx = self.conn.transaction()?;
        update_node_with(&tx, node)?;
        save_profile_with(&tx, profile)?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn test_profile_row_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study").join("cogni.db");

        {
            let mut repo = SqliteRepository::open(&path).unwrap();
            assert_eq!(repo.get_profile().unwrap(), UserProfile::default());
            repo.save_profile(&UserProfile { xp: 42, level: 3 }).unwrap();
        }

        // Reopening must not reset the profile
        let repo = SqliteRepository::open(&path).unwrap();
        assert_eq!(repo.get_profile().unwrap(), UserProfile { xp: 42, level: 3 });
    }

    #[test]
    fn test_insert_and_get_node() {
        let mut repo = SqliteRepository::open_in_memory().unwrap();
        let node = MemoryNode::new("What is ATP?".into(), "Energy currency".into(), day(1));
        repo.insert_node(&node).unwrap();

        let loaded = repo.get_node(node.id).unwrap();
        assert_eq!(loaded.question, "What is ATP?");
        assert_eq!(loaded.easiness, 2.5);
        assert_eq!(loaded.interval, 0);
        assert_eq!(loaded.next_review, day(1));
        assert_eq!(loaded.created_at.timestamp(), node.created_at.timestamp());
    }

    #[test]
    fn test_missing_node() {
        let mut repo = SqliteRepository::open_in_memory().unwrap();
        let node = MemoryNode::new("Q".into(), "A".into(), day(1));
        assert!(matches!(repo.get_node(node.id), Err(StorageError::NodeNotFound(_))));
        assert!(matches!(repo.update_node(&node), Err(StorageError::NodeNotFound(_))));
    }

    #[test]
    fn test_due_query_includes_today_and_past() {
        let mut repo = SqliteRepository::open_in_memory().unwrap();
        let past = MemoryNode::new("past".into(), "a".into(), day(3));
        let today = MemoryNode::new("today".into(), "a".into(), day(10));
        let future = MemoryNode::new("future".into(), "a".into(), day(11));
        repo.insert_nodes(&[future, today, past]).unwrap();

        let due = repo.query_due_nodes(day(10)).unwrap();
        let questions: Vec<_> = due.iter().map(|n| n.question.as_str()).collect();
        assert_eq!(questions, vec!["past", "today"]);
    }

    #[test]
    fn test_update_node_persists_schedule() {
        let mut repo = SqliteRepository::open_in_memory().unwrap();
        let mut node = MemoryNode::new("Q".into(), "A".into(), day(1));
        repo.insert_node(&node).unwrap();

        node.easiness = 2.6;
        node.interval = 6;
        node.next_review = day(1) + Duration::days(6);
        repo.update_node(&node).unwrap();

        let loaded = repo.get_node(node.id).unwrap();
        assert_eq!(loaded.easiness, 2.6);
        assert_eq!(loaded.interval, 6);
        assert_eq!(loaded.next_review, day(7));
        assert!(repo.query_due_nodes(day(6)).unwrap().is_empty());
    }

    #[test]
    fn test_clear_nodes() {
        let mut repo = SqliteRepository::open_in_memory().unwrap();
        for i in 0..3 {
            repo.insert_node(&MemoryNode::new(format!("Q{}", i), "A".into(), day(1)))
                .unwrap();
        }
        repo.save_profile(&UserProfile { xp: 10, level: 2 }).unwrap();

        assert_eq!(repo.clear_nodes().unwrap(), 3);
        assert!(repo.list_nodes().unwrap().is_empty());
        // Profile survives a bulk clear
        assert_eq!(repo.get_profile().unwrap().level, 2);
    }

    #[test]
    fn test_store_synthesis_writes_nodes_and_profile() {
        let mut repo = SqliteRepository::open_in_memory().unwrap();
        let nodes = [
            MemoryNode::new("Q1".into(), "A".into(), day(1)),
            MemoryNode::new("Q2".into(), "A".into(), day(1)),
        ];
        repo.store_synthesis(&nodes, &UserProfile { xp: 20, level: 2 }).unwrap();

        assert_eq!(repo.list_nodes().unwrap().len(), 2);
        assert_eq!(repo.get_profile().unwrap(), UserProfile { xp: 20, level: 2 });
    }

    #[test]
    fn test_store_synthesis_rolls_back_when_profile_write_fails() {
        let mut repo = SqliteRepository::open_in_memory().unwrap();
        repo.conn.execute_batch("DROP TABLE profile").unwrap();

        let nodes = [MemoryNode::new("Q".into(), "A".into(), day(1))];
        assert!(repo
            .store_synthesis(&nodes, &UserProfile { xp: 30, level: 1 })
            .is_err());
        assert!(repo.list_nodes().unwrap().is_empty());
    }

    #[test]
    fn test_store_review_rolls_back_when_profile_write_fails() {
        let mut repo = SqliteRepository::open_in_memory().unwrap();
        let original = MemoryNode::new("Q".into(), "A".into(), day(1));
        repo.insert_node(&original).unwrap();
        repo.conn.execute_batch("DROP TABLE profile").unwrap();

        let mut reviewed = original.clone();
        reviewed.interval = 6;
        reviewed.next_review = day(7);
        assert!(repo
            .store_review(&reviewed, &UserProfile { xp: 5, level: 1 })
            .is_err());

        let loaded = repo.get_node(original.id).unwrap();
        assert_eq!(loaded.interval, 0);
        assert_eq!(loaded.next_review, day(1));
    }
}
