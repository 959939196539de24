//! Repositories for blog posts and their tags.

use std::collections::HashMap;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};

use portfolio_core::error::PortfolioError;
use portfolio_core::pagination::{PageRequest, Paginated};
use portfolio_core::slugify;
use portfolio_core::types::{Blog, BlogInput, BlogStats, BlogStatus, Tag};

use crate::db::Database;
use crate::rows::{enum_col, like_pattern, now_secs, storage_err, to_ts, write_err};

const BLOG_COLUMNS: &str = "b.id, b.title, b.slug, b.description, b.content, b.cover_image,
     b.author, b.status, b.reject_comment, b.user_id, b.created_at, b.updated_at";

const BLOG_CONFLICT: &str = "Blog already exists";
const TAG_CONFLICT: &str = "Tag already exists";

/// Filters for blog listings. `None` means "any".
#[derive(Clone, Debug, Default)]
pub struct BlogFilter {
    pub status: Option<BlogStatus>,
    pub tag_slug: Option<String>,
    pub search: Option<String>,
}

/// `?,?,?` for an `IN (...)` clause.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

// =============================================================================
// Blogs
// =============================================================================

/// Repository for blog posts.
#[derive(Clone)]
pub struct BlogRepository {
    db: Arc<Database>,
}

impl BlogRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Newest first, paginated, with tags.
    pub fn list(
        &self,
        filter: &BlogFilter,
        page: PageRequest,
    ) -> Result<Paginated<Blog>, PortfolioError> {
        let status = filter.status.map(|s| s.as_str());
        let tag = filter.tag_slug.as_deref().filter(|t| !t.is_empty());
        let search = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let where_clause = "WHERE (?1 IS NULL OR b.status = ?1)
               AND (?2 IS NULL OR EXISTS (
                    SELECT 1 FROM blog_tags bt JOIN tags t ON t.id = bt.tag_id
                    WHERE bt.blog_id = b.id AND t.slug = ?2))
               AND (?3 IS NULL OR b.title LIKE ?3 ESCAPE '\\' OR b.description LIKE ?3 ESCAPE '\\')";

        self.db.with_conn(|conn| {
            let total: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM blogs b {}", where_clause),
                    rusqlite::params![status, tag, search],
                    |row| row.get(0),
                )
                .map_err(storage_err)?;

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM blogs b {}
                     ORDER BY b.created_at DESC, b.id DESC
                     LIMIT ?4 OFFSET ?5",
                    BLOG_COLUMNS, where_clause
                ))
                .map_err(storage_err)?;
            let mut items = stmt
                .query_map(
                    rusqlite::params![
                        status,
                        tag,
                        search,
                        page.limit as i64,
                        page.offset() as i64
                    ],
                    row_to_blog,
                )
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;
            attach_tags(conn, &mut items)?;

            Ok(Paginated {
                items,
                meta: page.meta(total as u64),
            })
        })
    }

    /// Counts per status. Statuses with no posts report 0.
    pub fn stats(&self) -> Result<BlogStats, PortfolioError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT status, COUNT(*) FROM blogs GROUP BY status")
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| Ok((enum_col::<BlogStatus>(row, 0)?, row.get::<_, i64>(1)?)))
                .map_err(storage_err)?;

            let mut stats = BlogStats::default();
            for row in rows {
                let (status, count) = row.map_err(storage_err)?;
                match status {
                    BlogStatus::Published => stats.published = count,
                    BlogStatus::Pending => stats.pending = count,
                    BlogStatus::Rejected => stats.rejected = count,
                    BlogStatus::Archived => stats.archived = count,
                }
                stats.total += count;
            }
            Ok(stats)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Blog>, PortfolioError> {
        self.db.with_conn(|conn| find_blog(conn, "id", &id))
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Option<Blog>, PortfolioError> {
        self.db.with_conn(|conn| find_blog(conn, "slug", &slug))
    }

    /// Load several posts by id (missing ids are skipped).
    pub fn find_many(&self, ids: &[i64]) -> Result<Vec<Blog>, PortfolioError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM blogs b WHERE b.id IN ({}) ORDER BY b.id",
                    BLOG_COLUMNS,
                    placeholders(ids.len())
                ))
                .map_err(storage_err)?;
            let mut blogs = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), row_to_blog)
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;
            attach_tags(conn, &mut blogs)?;
            Ok(blogs)
        })
    }

    /// Insert a post. A taken slug is a conflict.
    pub fn create(&self, input: &BlogInput) -> Result<Blog, PortfolioError> {
        self.db.with_conn(|conn| {
            let id = insert_blog(conn, input, &input.slug)?;
            find_blog(conn, "id", &id)?.ok_or_else(|| PortfolioError::NotFound("Blog".into()))
        })
    }

    /// Insert a post, suffixing `-2`, `-3`, ... onto the slug until it is free.
    pub fn create_with_unique_slug(&self, input: &BlogInput) -> Result<Blog, PortfolioError> {
        self.db.with_conn(|conn| {
            let base = if input.slug.is_empty() {
                "post".to_string()
            } else {
                input.slug.clone()
            };
            let mut candidate = base.clone();
            let mut n = 1;
            loop {
                let taken: bool = conn
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM blogs WHERE slug = ?1)",
                        [&candidate],
                        |row| row.get(0),
                    )
                    .map_err(storage_err)?;
                if !taken {
                    break;
                }
                n += 1;
                candidate = format!("{}-{}", base, n);
            }
            let id = insert_blog(conn, input, &candidate)?;
            find_blog(conn, "id", &id)?.ok_or_else(|| PortfolioError::NotFound("Blog".into()))
        })
    }

    /// Overwrite the editable fields of a post.
    pub fn update_content(
        &self,
        id: i64,
        title: &str,
        slug: &str,
        description: &str,
        content: &str,
        cover_image: &str,
    ) -> Result<Option<Blog>, PortfolioError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE blogs SET title = ?1, slug = ?2, description = ?3, content = ?4,
                     cover_image = ?5, updated_at = ?6
                     WHERE id = ?7",
                    rusqlite::params![title, slug, description, content, cover_image, now_secs(), id],
                )
                .map_err(|e| write_err(e, BLOG_CONFLICT))?;
            if changed == 0 {
                return Ok(None);
            }
            find_blog(conn, "id", &id)
        })
    }

    /// Change status. `reject_comment` of `None` leaves the comment untouched.
    pub fn set_status(
        &self,
        id: i64,
        status: BlogStatus,
        reject_comment: Option<&str>,
    ) -> Result<Option<Blog>, PortfolioError> {
        let affected = self.set_status_many(&[id], status, reject_comment)?;
        if affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id)
    }

    /// Change status for several posts. Returns the number updated.
    pub fn set_status_many(
        &self,
        ids: &[i64],
        status: BlogStatus,
        reject_comment: Option<&str>,
    ) -> Result<usize, PortfolioError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.db.with_conn(|conn| {
            let sql = format!(
                "UPDATE blogs SET status = ?, reject_comment = COALESCE(?, reject_comment),
                 updated_at = ? WHERE id IN ({})",
                placeholders(ids.len())
            );
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![
                Box::new(status.as_str()),
                Box::new(reject_comment.map(str::to_string)),
                Box::new(now_secs()),
            ];
            params.extend(ids.iter().map(|id| Box::new(*id) as Box<dyn rusqlite::ToSql>));
            conn.execute(&sql, rusqlite::params_from_iter(params.iter()))
                .map_err(|e| PortfolioError::Storage(format!("Failed to update blog status: {}", e)))
        })
    }

    /// Store a rewritten post and send it back to review.
    pub fn apply_revision(
        &self,
        id: i64,
        description: &str,
        content: &str,
    ) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute(
                    "UPDATE blogs SET description = ?1, content = ?2, status = 'pending',
                     reject_comment = '', updated_at = ?3
                     WHERE id = ?4",
                    rusqlite::params![description, content, now_secs(), id],
                )
                .map_err(|e| PortfolioError::Storage(format!("Failed to save revision: {}", e)))?;
            Ok(n > 0)
        })
    }

    /// Replace a post's tags with the given tag ids. Unknown ids are ignored.
    pub fn replace_tags(&self, blog_id: i64, tag_ids: &[i64]) -> Result<(), PortfolioError> {
        self.db.with_tx(|tx| {
            tx.execute("DELETE FROM blog_tags WHERE blog_id = ?1", [blog_id])
                .map_err(storage_err)?;
            for tag_id in tag_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO blog_tags (blog_id, tag_id)
                     SELECT ?1, id FROM tags WHERE id = ?2",
                    [blog_id, *tag_id],
                )
                .map_err(|e| PortfolioError::Storage(format!("Failed to tag blog: {}", e)))?;
            }
            Ok(())
        })
    }

    /// Delete a post. Tag associations cascade.
    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        Ok(self.delete_many(&[id])? > 0)
    }

    pub fn delete_many(&self, ids: &[i64]) -> Result<usize, PortfolioError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.db.with_conn(|conn| {
            conn.execute(
                &format!("DELETE FROM blogs WHERE id IN ({})", placeholders(ids.len())),
                rusqlite::params_from_iter(ids.iter()),
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to delete blog: {}", e)))
        })
    }
}

fn insert_blog(conn: &Connection, input: &BlogInput, slug: &str) -> Result<i64, PortfolioError> {
    let now = now_secs();
    conn.execute(
        "INSERT INTO blogs (title, slug, description, content, cover_image, author, status,
         user_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        rusqlite::params![
            input.title,
            slug,
            input.description,
            input.content,
            input.cover_image,
            input.author.as_str(),
            input.status.as_str(),
            input.user_id,
            now,
        ],
    )
    .map_err(|e| write_err(e, BLOG_CONFLICT))?;
    Ok(conn.last_insert_rowid())
}

fn find_blog(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<Blog>, PortfolioError> {
    let found = conn
        .query_row(
            &format!("SELECT {} FROM blogs b WHERE b.{} = ?1", BLOG_COLUMNS, column),
            [value],
            row_to_blog,
        )
        .optional()
        .map_err(storage_err)?;
    match found {
        Some(blog) => {
            let mut blogs = vec![blog];
            attach_tags(conn, &mut blogs)?;
            Ok(blogs.pop())
        }
        None => Ok(None),
    }
}

/// Load tags for every post in one query.
fn attach_tags(conn: &Connection, blogs: &mut [Blog]) -> Result<(), PortfolioError> {
    if blogs.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = blogs.iter().map(|b| b.id).collect();
    let mut stmt = conn
        .prepare(&format!(
            "SELECT bt.blog_id, t.id, t.name, t.slug, t.created_at, t.updated_at
             FROM blog_tags bt JOIN tags t ON t.id = bt.tag_id
             WHERE bt.blog_id IN ({})
             ORDER BY t.name",
            placeholders(ids.len())
        ))
        .map_err(storage_err)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Tag {
                    id: row.get(1)?,
                    name: row.get(2)?,
                    slug: row.get(3)?,
                    created_at: to_ts(row.get(4)?),
                    updated_at: to_ts(row.get(5)?),
                },
            ))
        })
        .map_err(storage_err)?;

    let mut by_blog: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        let (blog_id, tag) = row.map_err(storage_err)?;
        by_blog.entry(blog_id).or_default().push(tag);
    }
    for blog in blogs.iter_mut() {
        blog.tags = by_blog.remove(&blog.id).unwrap_or_default();
    }
    Ok(())
}

fn row_to_blog(row: &rusqlite::Row<'_>) -> rusqlite::Result<Blog> {
    Ok(Blog {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        content: row.get(4)?,
        cover_image: row.get(5)?,
        author: enum_col(row, 6)?,
        status: enum_col(row, 7)?,
        reject_comment: row.get(8)?,
        user_id: row.get(9)?,
        tags: Vec::new(),
        created_at: to_ts(row.get(10)?),
        updated_at: to_ts(row.get(11)?),
    })
}

// =============================================================================
// Tags
// =============================================================================

/// Repository for blog tags.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<Database>,
}

const TAG_COLUMNS: &str = "id, name, slug, created_at, updated_at";

impl TagRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Alphabetical, paginated, optionally filtered by name or slug.
    pub fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Paginated<Tag>, PortfolioError> {
        let pattern = search.filter(|s| !s.is_empty()).map(like_pattern);
        self.db.with_conn(|conn| {
            let filter = "WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\\' OR slug LIKE ?1 ESCAPE '\\')";
            let total: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM tags {}", filter),
                    [&pattern],
                    |row| row.get(0),
                )
                .map_err(storage_err)?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM tags {} ORDER BY name ASC LIMIT ?2 OFFSET ?3",
                    TAG_COLUMNS, filter
                ))
                .map_err(storage_err)?;
            let items = stmt
                .query_map(
                    rusqlite::params![pattern, page.limit as i64, page.offset() as i64],
                    row_to_tag,
                )
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;
            Ok(Paginated {
                items,
                meta: page.meta(total as u64),
            })
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Tag>, PortfolioError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM tags WHERE id = ?1", TAG_COLUMNS),
                [id],
                row_to_tag,
            )
            .optional()
            .map_err(storage_err)
        })
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, PortfolioError> {
        self.db.with_conn(|conn| find_tag_by_slug(conn, slug))
    }

    /// Whether another tag already uses `slug`.
    pub fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM tags WHERE slug = ?1 AND (?2 IS NULL OR id != ?2))",
                rusqlite::params![slug, exclude_id],
                |row| row.get(0),
            )
            .map_err(storage_err)
        })
    }

    pub fn create(&self, name: &str, slug: &str) -> Result<Tag, PortfolioError> {
        self.db.with_conn(|conn| {
            let now = now_secs();
            conn.execute(
                "INSERT INTO tags (name, slug, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                rusqlite::params![name, slug, now],
            )
            .map_err(|e| write_err(e, TAG_CONFLICT))?;
            let id = conn.last_insert_rowid();
            Ok(Tag {
                id,
                name: name.to_string(),
                slug: slug.to_string(),
                created_at: to_ts(now),
                updated_at: to_ts(now),
            })
        })
    }

    pub fn update(&self, id: i64, name: &str, slug: &str) -> Result<Option<Tag>, PortfolioError> {
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE tags SET name = ?1, slug = ?2, updated_at = ?3 WHERE id = ?4",
                rusqlite::params![name, slug, now_secs(), id],
            )
            .map_err(|e| write_err(e, TAG_CONFLICT))
        })?;
        if changed == 0 {
            return Ok(None);
        }
        self.find_by_id(id)
    }

    /// Delete a tag. Blog associations cascade.
    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM tags WHERE id = ?1", [id])
                .map_err(|e| PortfolioError::Storage(format!("Failed to delete tag: {}", e)))?;
            Ok(n > 0)
        })
    }

    /// Look a tag up by the slug of `name`, creating it if absent.
    pub fn find_or_create(&self, name: &str) -> Result<Tag, PortfolioError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(PortfolioError::Validation(format!(
                "tag '{}' has no usable characters",
                name
            )));
        }
        self.db.with_conn(|conn| {
            if let Some(tag) = find_tag_by_slug(conn, &slug)? {
                return Ok(tag);
            }
            let now = now_secs();
            conn.execute(
                "INSERT INTO tags (name, slug, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
                rusqlite::params![name, slug, now],
            )
            .map_err(|e| write_err(e, TAG_CONFLICT))?;
            Ok(Tag {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                slug,
                created_at: to_ts(now),
                updated_at: to_ts(now),
            })
        })
    }
}

fn find_tag_by_slug(conn: &Connection, slug: &str) -> Result<Option<Tag>, PortfolioError> {
    conn.query_row(
        &format!("SELECT {} FROM tags WHERE slug = ?1", TAG_COLUMNS),
        [slug],
        row_to_tag,
    )
    .optional()
    .map_err(storage_err)
}

fn row_to_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        created_at: to_ts(row.get(3)?),
        updated_at: to_ts(row.get(4)?),
    })
}
