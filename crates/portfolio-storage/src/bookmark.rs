//! Bookmarks synced from GitHub, with their topics.

use std::collections::HashMap;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};

use portfolio_core::error::PortfolioError;
use portfolio_core::pagination::{PageRequest, Paginated};
use portfolio_core::types::{Bookmark, BookmarkInput};

use crate::db::Database;
use crate::rows::{like_pattern, now_secs, storage_err, to_ts};

const COLUMNS: &str = "b.id, b.url, b.title, b.description, b.created_at, b.updated_at";

/// Outcome of an upsert keyed by url.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upserted {
    Created(i64),
    Updated(i64),
}

#[derive(Clone)]
pub struct BookmarkRepository {
    db: Arc<Database>,
}

impl BookmarkRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Most recently updated first. `topic` matches exactly, `search` matches
    /// title, description or url.
    pub fn list(
        &self,
        topic: Option<&str>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Paginated<Bookmark>, PortfolioError> {
        let topic = topic.filter(|t| !t.is_empty());
        let pattern = search.filter(|s| !s.is_empty()).map(like_pattern);
        let filter = "WHERE (?1 IS NULL OR EXISTS (
                 SELECT 1 FROM bookmark_topics t WHERE t.bookmark_id = b.id AND t.name = ?1))
               AND (?2 IS NULL OR b.title LIKE ?2 ESCAPE '\\'
                    OR b.description LIKE ?2 ESCAPE '\\' OR b.url LIKE ?2 ESCAPE '\\')";

        self.db.with_conn(|conn| {
            let total: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM bookmarks b {}", filter),
                    rusqlite::params![topic, pattern],
                    |row| row.get(0),
                )
                .map_err(storage_err)?;

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM bookmarks b {}
                     ORDER BY b.updated_at DESC, b.id DESC
                     LIMIT ?3 OFFSET ?4",
                    COLUMNS, filter
                ))
                .map_err(storage_err)?;
            let mut items = stmt
                .query_map(
                    rusqlite::params![topic, pattern, page.limit as i64, page.offset() as i64],
                    row_to_bookmark,
                )
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;
            attach_topics(conn, &mut items)?;

            Ok(Paginated {
                items,
                meta: page.meta(total as u64),
            })
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Bookmark>, PortfolioError> {
        self.db.with_conn(|conn| {
            let found = conn
                .query_row(
                    &format!("SELECT {} FROM bookmarks b WHERE b.id = ?1", COLUMNS),
                    [id],
                    row_to_bookmark,
                )
                .optional()
                .map_err(storage_err)?;
            let Some(bookmark) = found else {
                return Ok(None);
            };
            let mut items = vec![bookmark];
            attach_topics(conn, &mut items)?;
            Ok(items.pop())
        })
    }

    /// Insert or update by url, then replace the topic list.
    pub fn upsert_by_url(&self, input: &BookmarkInput) -> Result<Upserted, PortfolioError> {
        self.db.with_tx(|tx| {
            let now = now_secs();
            let existing: Option<i64> = tx
                .query_row("SELECT id FROM bookmarks WHERE url = ?1", [&input.url], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(storage_err)?;

            let outcome = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE bookmarks SET title = ?1, description = ?2, updated_at = ?3
                         WHERE id = ?4",
                        rusqlite::params![input.title, input.description, now, id],
                    )
                    .map_err(storage_err)?;
                    Upserted::Updated(id)
                }
                None => {
                    tx.execute(
                        "INSERT INTO bookmarks (url, title, description, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?4)",
                        rusqlite::params![input.url, input.title, input.description, now],
                    )
                    .map_err(storage_err)?;
                    Upserted::Created(tx.last_insert_rowid())
                }
            };

            let id = match outcome {
                Upserted::Created(id) | Upserted::Updated(id) => id,
            };
            tx.execute("DELETE FROM bookmark_topics WHERE bookmark_id = ?1", [id])
                .map_err(storage_err)?;
            for topic in input.topics.iter().filter(|t| !t.trim().is_empty()) {
                tx.execute(
                    "INSERT INTO bookmark_topics (bookmark_id, name) VALUES (?1, ?2)",
                    rusqlite::params![id, topic.trim()],
                )
                .map_err(storage_err)?;
            }
            Ok(outcome)
        })
    }

    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM bookmarks WHERE id = ?1", [id])
                .map_err(|e| PortfolioError::Storage(format!("Failed to delete bookmark: {}", e)))?;
            Ok(n > 0)
        })
    }
}

fn attach_topics(conn: &Connection, items: &mut [Bookmark]) -> Result<(), PortfolioError> {
    if items.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = items.iter().map(|b| b.id).collect();
    let mut stmt = conn
        .prepare(&format!(
            "SELECT bookmark_id, name FROM bookmark_topics
             WHERE bookmark_id IN ({}) ORDER BY id",
            vec!["?"; ids.len()].join(",")
        ))
        .map_err(storage_err)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(storage_err)?;

    let mut by_id: HashMap<i64, Vec<String>> = HashMap::new();
    for row in rows {
        let (id, name) = row.map_err(storage_err)?;
        by_id.entry(id).or_default().push(name);
    }
    for item in items.iter_mut() {
        item.topics = by_id.remove(&item.id).unwrap_or_default();
    }
    Ok(())
}

fn row_to_bookmark(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bookmark> {
    Ok(Bookmark {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        topics: Vec::new(),
        created_at: to_ts(row.get(4)?),
        updated_at: to_ts(row.get(5)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_repo() -> BookmarkRepository {
        BookmarkRepository::new(Arc::new(Database::in_memory().unwrap()))
    }

    fn repo_input(name: &str, topics: &[&str]) -> BookmarkInput {
        BookmarkInput {
            url: format!("https://github.com/someone/{}", name),
            title: name.to_string(),
            description: format!("{} description", name),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_upsert_creates_then_updates() {
        let repo = make_repo();
        let first = repo.upsert_by_url(&repo_input("engine", &["rust", "db"])).unwrap();
        let Upserted::Created(id) = first else {
            panic!("expected create, got {:?}", first);
        };

        let mut changed = repo_input("engine", &["rust"]);
        changed.description = "rewritten".into();
        assert_eq!(repo.upsert_by_url(&changed).unwrap(), Upserted::Updated(id));

        let stored = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(stored.description, "rewritten");
        assert_eq!(stored.topics, vec!["rust".to_string()]);
    }

    #[test]
    fn test_list_filters_by_topic_and_search() {
        let repo = make_repo();
        repo.upsert_by_url(&repo_input("engine", &["rust"])).unwrap();
        repo.upsert_by_url(&repo_input("webapp", &["typescript"])).unwrap();
        repo.upsert_by_url(&repo_input("cli", &["rust", "cli"])).unwrap();

        let rust = repo.list(Some("rust"), None, PageRequest::default()).unwrap();
        assert_eq!(rust.meta.total, 2);
        assert!(rust.items.iter().all(|b| b.topics.contains(&"rust".to_string())));

        let web = repo.list(None, Some("webapp"), PageRequest::default()).unwrap();
        assert_eq!(web.items.len(), 1);
        assert_eq!(web.items[0].title, "webapp");

        let all = repo.list(None, Some(""), PageRequest::default()).unwrap();
        assert_eq!(all.meta.total, 3);
    }

    #[test]
    fn test_delete_cascades_topics() {
        let repo = make_repo();
        let Upserted::Created(id) = repo.upsert_by_url(&repo_input("gone", &["x"])).unwrap() else {
            panic!("expected create");
        };
        assert!(repo.delete(id).unwrap());
        assert!(!repo.delete(id).unwrap());
        assert!(repo.find_by_id(id).unwrap().is_none());
    }
}
