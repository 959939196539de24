//! Tool rows and their usage log.

use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};

use portfolio_core::error::PortfolioError;
use portfolio_core::types::{DailyUsage, Tool, ToolInput, ToolStats, ToolUsageCount};

use crate::db::Database;
use crate::rows::{now_secs, storage_err, to_ts, write_err};

const COLUMNS: &str =
    "id, name, slug, description, category, icon, is_active, sort_order, created_at, updated_at";
const CONFLICT: &str = "Tool already exists";
const SECS_PER_DAY: i64 = 86_400;

#[derive(Clone)]
pub struct ToolRepository {
    db: Arc<Database>,
}

impl ToolRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Active tools, optionally in one category.
    pub fn list_active(&self, category: Option<&str>) -> Result<Vec<Tool>, PortfolioError> {
        let category = category.filter(|c| !c.is_empty());
        self.query_list(
            "WHERE is_active = 1 AND (?1 IS NULL OR category = ?1)",
            rusqlite::params![category],
        )
    }

    /// Every tool, including inactive ones.
    pub fn list_all(&self) -> Result<Vec<Tool>, PortfolioError> {
        self.query_list("", [])
    }

    fn query_list(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Tool>, PortfolioError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM tools {} ORDER BY sort_order ASC, created_at DESC, id DESC",
                    COLUMNS, filter
                ))
                .map_err(storage_err)?;
            let rows = stmt
                .query_map(params, row_to_tool)
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;
            Ok(rows)
        })
    }

    /// An active tool by slug.
    pub fn find_active_by_slug(&self, slug: &str) -> Result<Option<Tool>, PortfolioError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM tools WHERE slug = ?1 AND is_active = 1", COLUMNS),
                [slug],
                row_to_tool,
            )
            .optional()
            .map_err(storage_err)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Tool>, PortfolioError> {
        self.db.with_conn(|conn| find(conn, id))
    }

    pub fn create(&self, input: &ToolInput) -> Result<Tool, PortfolioError> {
        self.db.with_conn(|conn| {
            let now = now_secs();
            conn.execute(
                "INSERT INTO tools (name, slug, description, category, icon, is_active,
                 sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                rusqlite::params![
                    input.name,
                    input.slug,
                    input.description,
                    input.category,
                    input.icon,
                    input.is_active,
                    input.order,
                    now,
                ],
            )
            .map_err(|e| write_err(e, CONFLICT))?;
            find(conn, conn.last_insert_rowid())?
                .ok_or_else(|| PortfolioError::NotFound("Tool".into()))
        })
    }

    /// Update everything but the slug, which stays bound to its handler.
    pub fn update(&self, id: i64, input: &ToolInput) -> Result<Option<Tool>, PortfolioError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE tools SET name = ?1, description = ?2, category = ?3, icon = ?4,
                     is_active = ?5, sort_order = ?6, updated_at = ?7
                     WHERE id = ?8",
                    rusqlite::params![
                        input.name,
                        input.description,
                        input.category,
                        input.icon,
                        input.is_active,
                        input.order,
                        now_secs(),
                        id,
                    ],
                )
                .map_err(|e| write_err(e, CONFLICT))?;
            if changed == 0 {
                return Ok(None);
            }
            find(conn, id)
        })
    }

    /// Flip `is_active`, returning the updated row.
    pub fn toggle(&self, id: i64) -> Result<Option<Tool>, PortfolioError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE tools SET is_active = 1 - is_active, updated_at = ?1 WHERE id = ?2",
                    rusqlite::params![now_secs(), id],
                )
                .map_err(storage_err)?;
            if changed == 0 {
                return Ok(None);
            }
            find(conn, id)
        })
    }

    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM tools WHERE id = ?1", [id])
                .map_err(|e| PortfolioError::Storage(format!("Failed to delete tool: {}", e)))?;
            Ok(n > 0)
        })
    }

    /// Append one run to the usage log.
    pub fn record_usage(&self, tool_id: i64, slug: &str, ip: &str) -> Result<(), PortfolioError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tool_usages (tool_id, tool_slug, ip, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![tool_id, slug, ip, now_secs()],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to record tool usage: {}", e)))?;
            Ok(())
        })
    }

    /// Usage per tool, per UTC day over the last 7 days, overall and today.
    pub fn stats(&self) -> Result<ToolStats, PortfolioError> {
        let now = now_secs();
        self.stats_at(now)
    }

    fn stats_at(&self, now: i64) -> Result<ToolStats, PortfolioError> {
        let today_start = now - now.rem_euclid(SECS_PER_DAY);
        let week_start = now - 7 * SECS_PER_DAY;

        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT tool_slug, COUNT(*) AS runs FROM tool_usages
                     GROUP BY tool_slug ORDER BY runs DESC, tool_slug ASC",
                )
                .map_err(storage_err)?;
            let per_tool = stmt
                .query_map([], |row| {
                    Ok(ToolUsageCount {
                        tool_slug: row.get(0)?,
                        count: row.get(1)?,
                    })
                })
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;

            let mut stmt = conn
                .prepare(
                    "SELECT date(created_at, 'unixepoch') AS day, COUNT(*) FROM tool_usages
                     WHERE created_at >= ?1
                     GROUP BY day ORDER BY day ASC",
                )
                .map_err(storage_err)?;
            let daily = stmt
                .query_map([week_start], |row| {
                    Ok(DailyUsage {
                        date: row.get(0)?,
                        count: row.get(1)?,
                    })
                })
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;

            let total_all: i64 = conn
                .query_row("SELECT COUNT(*) FROM tool_usages", [], |row| row.get(0))
                .map_err(storage_err)?;
            let today_count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM tool_usages WHERE created_at >= ?1",
                    [today_start],
                    |row| row.get(0),
                )
                .map_err(storage_err)?;

            Ok(ToolStats {
                per_tool,
                daily,
                total_all,
                today_count,
            })
        })
    }
}

fn find(conn: &Connection, id: i64) -> Result<Option<Tool>, PortfolioError> {
    conn.query_row(
        &format!("SELECT {} FROM tools WHERE id = ?1", COLUMNS),
        [id],
        row_to_tool,
    )
    .optional()
    .map_err(storage_err)
}

fn row_to_tool(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tool> {
    Ok(Tool {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        icon: row.get(5)?,
        is_active: row.get(6)?,
        order: row.get(7)?,
        created_at: to_ts(row.get(8)?),
        updated_at: to_ts(row.get(9)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_repo() -> ToolRepository {
        ToolRepository::new(Arc::new(Database::in_memory().unwrap()))
    }

    fn tool(slug: &str, category: &str, order: i64, active: bool) -> ToolInput {
        ToolInput {
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            description: String::new(),
            category: category.to_string(),
            icon: String::new(),
            is_active: active,
            order,
        }
    }

    #[test]
    fn test_active_listing_order_and_category() {
        let repo = make_repo();
        repo.create(&tool("sha256", "hash", 2, true)).unwrap();
        repo.create(&tool("md5", "hash", 1, true)).unwrap();
        repo.create(&tool("uuid-generator", "generator", 0, true)).unwrap();
        repo.create(&tool("sha1", "hash", 0, false)).unwrap();

        let active = repo.list_active(None).unwrap();
        let slugs: Vec<&str> = active.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["uuid-generator", "md5", "sha256"]);

        let hashes = repo.list_active(Some("hash")).unwrap();
        assert_eq!(hashes.len(), 2);

        assert_eq!(repo.list_all().unwrap().len(), 4);
        assert!(repo.find_active_by_slug("sha1").unwrap().is_none());
        assert!(repo.find_active_by_slug("md5").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_slug_conflicts() {
        let repo = make_repo();
        repo.create(&tool("md5", "hash", 0, true)).unwrap();
        let err = repo.create(&tool("md5", "hash", 0, true)).unwrap_err();
        assert!(matches!(err, PortfolioError::Conflict(_)));
    }

    #[test]
    fn test_update_keeps_slug_and_toggle_flips() {
        let repo = make_repo();
        let created = repo.create(&tool("md5", "hash", 0, true)).unwrap();

        let mut changed = tool("ignored", "crypto", 5, true);
        changed.name = "MD5 Hash".into();
        let updated = repo.update(created.id, &changed).unwrap().unwrap();
        assert_eq!(updated.slug, "md5");
        assert_eq!(updated.name, "MD5 Hash");
        assert_eq!(updated.order, 5);

        let off = repo.toggle(created.id).unwrap().unwrap();
        assert!(!off.is_active);
        let on = repo.toggle(created.id).unwrap().unwrap();
        assert!(on.is_active);
        assert!(repo.toggle(404).unwrap().is_none());
    }

    #[test]
    fn test_usage_stats() {
        let repo = make_repo();
        let md5 = repo.create(&tool("md5", "hash", 0, true)).unwrap();
        let sha = repo.create(&tool("sha1", "hash", 0, true)).unwrap();
        repo.record_usage(md5.id, "md5", "1.1.1.1").unwrap();
        repo.record_usage(md5.id, "md5", "1.1.1.2").unwrap();
        repo.record_usage(sha.id, "sha1", "1.1.1.1").unwrap();

        let stats = repo.stats().unwrap();
        assert_eq!(stats.total_all, 3);
        assert_eq!(stats.today_count, 3);
        assert_eq!(stats.per_tool[0], ToolUsageCount { tool_slug: "md5".into(), count: 2 });
        assert_eq!(stats.daily.len(), 1);
        assert_eq!(stats.daily[0].count, 3);
    }

    #[test]
    fn test_stats_window_excludes_old_usage() {
        let repo = make_repo();
        let md5 = repo.create(&tool("md5", "hash", 0, true)).unwrap();
        repo.record_usage(md5.id, "md5", "ip").unwrap();

        let later = now_secs() + 10 * SECS_PER_DAY;
        let stats = repo.stats_at(later).unwrap();
        assert_eq!(stats.total_all, 1);
        assert_eq!(stats.today_count, 0);
        assert!(stats.daily.is_empty());
    }

    #[test]
    fn test_delete_cascades_usage() {
        let repo = make_repo();
        let md5 = repo.create(&tool("md5", "hash", 0, true)).unwrap();
        repo.record_usage(md5.id, "md5", "ip").unwrap();
        assert!(repo.delete(md5.id).unwrap());
        assert_eq!(repo.stats().unwrap().total_all, 0);
    }
}
