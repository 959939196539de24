//! Admin user accounts.

use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};

use portfolio_core::error::PortfolioError;
use portfolio_core::types::{NewUser, User};

use crate::db::Database;
use crate::rows::{now_secs, storage_err, to_ts, write_err};

const COLUMNS: &str = "id, name, username, email, password_hash, created_at, updated_at";
const CONFLICT: &str = "Username or email already exists";

#[derive(Clone)]
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create(&self, input: &NewUser) -> Result<User, PortfolioError> {
        self.db.with_conn(|conn| {
            let now = now_secs();
            conn.execute(
                "INSERT INTO users (name, username, email, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![input.name, input.username, input.email, input.password_hash, now],
            )
            .map_err(|e| write_err(e, CONFLICT))?;
            find(conn, "id", &conn.last_insert_rowid())?
                .ok_or_else(|| PortfolioError::NotFound("User".into()))
        })
    }

    pub fn list(&self) -> Result<Vec<User>, PortfolioError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT {} FROM users ORDER BY id", COLUMNS))
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], row_to_user)
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;
            Ok(rows)
        })
    }

    pub fn count(&self) -> Result<i64, PortfolioError> {
        self.db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(storage_err)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<User>, PortfolioError> {
        self.db.with_conn(|conn| find(conn, "id", &id))
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, PortfolioError> {
        self.db.with_conn(|conn| find(conn, "username", &username))
    }

    /// Update profile fields. A `password_hash` of `None` keeps the current one.
    pub fn update(
        &self,
        id: i64,
        name: &str,
        username: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<Option<User>, PortfolioError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET name = ?1, username = ?2, email = ?3,
                     password_hash = COALESCE(?4, password_hash), updated_at = ?5
                     WHERE id = ?6",
                    rusqlite::params![name, username, email, password_hash, now_secs(), id],
                )
                .map_err(|e| write_err(e, CONFLICT))?;
            if changed == 0 {
                return Ok(None);
            }
            find(conn, "id", &id)
        })
    }

    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM users WHERE id = ?1", [id])
                .map_err(|e| PortfolioError::Storage(format!("Failed to delete user: {}", e)))?;
            Ok(n > 0)
        })
    }
}

fn find(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<User>, PortfolioError> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE {} = ?1", COLUMNS, column),
        [value],
        row_to_user,
    )
    .optional()
    .map_err(storage_err)
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: to_ts(row.get(5)?),
        updated_at: to_ts(row.get(6)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_repo() -> UserRepository {
        UserRepository::new(Arc::new(Database::in_memory().unwrap()))
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            name: "Admin".into(),
            username: username.into(),
            email: format!("{}@example.com", username),
            password_hash: "$argon2id$v=19$fake".into(),
        }
    }

    #[test]
    fn test_create_and_find() {
        let repo = make_repo();
        let user = repo.create(&new_user("admin")).unwrap();
        assert_eq!(repo.count().unwrap(), 1);

        let found = repo.find_by_username("admin").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, "$argon2id$v=19$fake");
        assert!(repo.find_by_username("ghost").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let repo = make_repo();
        repo.create(&new_user("admin")).unwrap();
        let err = repo.create(&new_user("admin")).unwrap_err();
        assert!(matches!(err, PortfolioError::Conflict(_)));
    }

    #[test]
    fn test_update_keeps_hash_when_absent() {
        let repo = make_repo();
        let user = repo.create(&new_user("admin")).unwrap();

        let updated = repo
            .update(user.id, "Root", "root", "root@example.com", None)
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "root");
        assert_eq!(updated.password_hash, user.password_hash);

        let rehashed = repo
            .update(user.id, "Root", "root", "root@example.com", Some("$argon2id$new"))
            .unwrap()
            .unwrap();
        assert_eq!(rehashed.password_hash, "$argon2id$new");
    }

    #[test]
    fn test_delete_user() {
        let repo = make_repo();
        let user = repo.create(&new_user("admin")).unwrap();
        assert!(repo.delete(user.id).unwrap());
        assert!(repo.list().unwrap().is_empty());
    }
}
