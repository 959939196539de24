//! Database schema migrations.
//!
//! Applies the initial portfolio schema: content tables, blogs with tags,
//! bookmarks, contacts, settings, tools and usage, and users.

use rusqlite::Connection;
use tracing::info;

use portfolio_core::error::PortfolioError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), PortfolioError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| PortfolioError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| PortfolioError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), PortfolioError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            username        TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            tagline         TEXT NOT NULL DEFAULT '',
            bio             TEXT NOT NULL DEFAULT '',
            avatar          TEXT NOT NULL DEFAULT '',
            resume_url      TEXT NOT NULL DEFAULT '',
            github          TEXT NOT NULL DEFAULT '',
            linkedin        TEXT NOT NULL DEFAULT '',
            twitter         TEXT NOT NULL DEFAULT '',
            instagram       TEXT NOT NULL DEFAULT '',
            email           TEXT NOT NULL DEFAULT '',
            phone           TEXT NOT NULL DEFAULT '',
            location        TEXT NOT NULL DEFAULT '',
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS skills (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            category        TEXT NOT NULL
                            CHECK (category IN ('language', 'framework', 'database', 'tool', 'other')),
            name            TEXT NOT NULL,
            level           TEXT NOT NULL
                            CHECK (level IN ('beginner', 'intermediate', 'advanced', 'expert')),
            icon_url        TEXT NOT NULL DEFAULT '',
            sort_order      INTEGER NOT NULL DEFAULT 0,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_skills_category
            ON skills (category, sort_order);

        CREATE TABLE IF NOT EXISTS educations (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            school          TEXT NOT NULL,
            degree          TEXT NOT NULL DEFAULT '',
            field           TEXT NOT NULL DEFAULT '',
            start_year      INTEGER,
            end_year        INTEGER,
            description     TEXT NOT NULL DEFAULT '',
            logo_url        TEXT NOT NULL DEFAULT '',
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS courses (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            title               TEXT NOT NULL,
            issuer              TEXT NOT NULL DEFAULT '',
            issued_at           TEXT,
            expired_at          TEXT,
            credential_url      TEXT NOT NULL DEFAULT '',
            certificate_image   TEXT NOT NULL DEFAULT '',
            description         TEXT NOT NULL DEFAULT '',
            created_at          INTEGER NOT NULL,
            updated_at          INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS experiences (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            company         TEXT NOT NULL,
            role            TEXT NOT NULL,
            location        TEXT NOT NULL DEFAULT '',
            start_date      TEXT,
            end_date        TEXT,
            is_current      INTEGER NOT NULL DEFAULT 0,
            description     TEXT NOT NULL DEFAULT '',
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS experience_images (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            experience_id   INTEGER NOT NULL REFERENCES experiences(id) ON DELETE CASCADE,
            image_url       TEXT NOT NULL,
            sort_order      INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_experience_images_parent
            ON experience_images (experience_id, sort_order);

        CREATE TABLE IF NOT EXISTS projects (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            slug            TEXT NOT NULL UNIQUE,
            description     TEXT NOT NULL DEFAULT '',
            platform        TEXT NOT NULL DEFAULT '',
            url             TEXT NOT NULL DEFAULT '',
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project_tech_stacks (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id      INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            name            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project_images (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id      INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            image_url       TEXT NOT NULL,
            sort_order      INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_project_images_parent
            ON project_images (project_id, sort_order);

        CREATE TABLE IF NOT EXISTS tags (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL UNIQUE,
            slug            TEXT NOT NULL UNIQUE,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS blogs (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            slug            TEXT NOT NULL UNIQUE,
            description     TEXT NOT NULL DEFAULT '',
            content         TEXT NOT NULL DEFAULT '',
            cover_image     TEXT NOT NULL DEFAULT '',
            author          TEXT NOT NULL DEFAULT 'user'
                            CHECK (author IN ('user', 'aibys')),
            status          TEXT NOT NULL DEFAULT 'published'
                            CHECK (status IN ('pending', 'published', 'rejected', 'archived')),
            reject_comment  TEXT NOT NULL DEFAULT '',
            user_id         INTEGER REFERENCES users(id) ON DELETE SET NULL,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_blogs_status
            ON blogs (status, created_at DESC);

        CREATE TABLE IF NOT EXISTS blog_tags (
            blog_id         INTEGER NOT NULL REFERENCES blogs(id) ON DELETE CASCADE,
            tag_id          INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (blog_id, tag_id)
        );

        CREATE INDEX IF NOT EXISTS idx_blog_tags_tag
            ON blog_tags (tag_id);

        CREATE TABLE IF NOT EXISTS bookmarks (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            url             TEXT NOT NULL UNIQUE,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL DEFAULT '',
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bookmark_topics (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            bookmark_id     INTEGER NOT NULL REFERENCES bookmarks(id) ON DELETE CASCADE,
            name            TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_bookmark_topics_name
            ON bookmark_topics (name);

        CREATE TABLE IF NOT EXISTS contacts (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL,
            subject         TEXT NOT NULL,
            message         TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (status IN ('pending', 'read', 'done')),
            read_at         INTEGER,
            done_at         INTEGER,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS settings (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            key             TEXT NOT NULL UNIQUE,
            value           TEXT NOT NULL DEFAULT '',
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tools (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            slug            TEXT NOT NULL UNIQUE,
            description     TEXT NOT NULL DEFAULT '',
            category        TEXT NOT NULL DEFAULT '',
            icon            TEXT NOT NULL DEFAULT '',
            is_active       INTEGER NOT NULL DEFAULT 1,
            sort_order      INTEGER NOT NULL DEFAULT 0,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tool_usages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            tool_id         INTEGER NOT NULL REFERENCES tools(id) ON DELETE CASCADE,
            tool_slug       TEXT NOT NULL,
            ip              TEXT NOT NULL DEFAULT '',
            created_at      INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tool_usages_created
            ON tool_usages (created_at);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| PortfolioError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_migrations_create_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = table_names(&conn);
        for expected in [
            "blog_tags",
            "blogs",
            "bookmark_topics",
            "bookmarks",
            "contacts",
            "courses",
            "educations",
            "experience_images",
            "experiences",
            "profiles",
            "project_images",
            "project_tech_stacks",
            "projects",
            "schema_migrations",
            "settings",
            "skills",
            "tags",
            "tool_usages",
            "tools",
            "users",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
        }
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_status_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO blogs (title, slug, status, created_at, updated_at)
             VALUES ('t', 't', 'deleted', 0, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
