//! Repositories for experiences and projects, both of which carry an
//! ordered image gallery.

use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};

use portfolio_core::error::PortfolioError;
use portfolio_core::types::{
    Experience, ExperienceInput, GalleryImage, Project, ProjectInput, TechStack,
};

use crate::db::Database;
use crate::rows::{date_from_sql, date_to_sql, now_secs, storage_err, to_ts, write_err};

/// Which gallery table an image lives in.
#[derive(Clone, Copy)]
enum Gallery {
    Experience,
    Project,
}

impl Gallery {
    fn table(self) -> &'static str {
        match self {
            Gallery::Experience => "experience_images",
            Gallery::Project => "project_images",
        }
    }

    fn parent_column(self) -> &'static str {
        match self {
            Gallery::Experience => "experience_id",
            Gallery::Project => "project_id",
        }
    }

    fn load(self, conn: &Connection, parent_id: i64) -> Result<Vec<GalleryImage>, PortfolioError> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, image_url, sort_order FROM {} WHERE {} = ?1
                 ORDER BY sort_order ASC, id ASC",
                self.table(),
                self.parent_column()
            ))
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([parent_id], |row| {
                Ok(GalleryImage {
                    id: row.get(0)?,
                    image_url: row.get(1)?,
                    order: row.get(2)?,
                })
            })
            .map_err(storage_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_err)
    }

    fn insert(
        self,
        conn: &Connection,
        parent_id: i64,
        image_url: &str,
        order: i64,
    ) -> Result<GalleryImage, PortfolioError> {
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, image_url, sort_order) VALUES (?1, ?2, ?3)",
                self.table(),
                self.parent_column()
            ),
            rusqlite::params![parent_id, image_url, order],
        )
        .map_err(|e| PortfolioError::Storage(format!("Failed to save image: {}", e)))?;
        Ok(GalleryImage {
            id: conn.last_insert_rowid(),
            image_url: image_url.to_string(),
            order,
        })
    }

    /// Append an image after the existing ones.
    fn append(
        self,
        conn: &Connection,
        parent_id: i64,
        image_url: &str,
    ) -> Result<GalleryImage, PortfolioError> {
        let count: i64 = conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE {} = ?1",
                    self.table(),
                    self.parent_column()
                ),
                [parent_id],
                |row| row.get(0),
            )
            .map_err(storage_err)?;
        self.insert(conn, parent_id, image_url, count)
    }

    fn find(
        self,
        conn: &Connection,
        parent_id: i64,
        image_id: i64,
    ) -> Result<Option<GalleryImage>, PortfolioError> {
        conn.query_row(
            &format!(
                "SELECT id, image_url, sort_order FROM {} WHERE id = ?1 AND {} = ?2",
                self.table(),
                self.parent_column()
            ),
            [image_id, parent_id],
            |row| {
                Ok(GalleryImage {
                    id: row.get(0)?,
                    image_url: row.get(1)?,
                    order: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(storage_err)
    }

    fn delete(self, conn: &Connection, image_id: i64) -> Result<bool, PortfolioError> {
        let n = conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?1", self.table()),
                [image_id],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to delete image: {}", e)))?;
        Ok(n > 0)
    }
}

// =============================================================================
// Experiences
// =============================================================================

/// Repository for work experience entries.
#[derive(Clone)]
pub struct ExperienceRepository {
    db: Arc<Database>,
}

const EXPERIENCE_COLUMNS: &str = "id, company, role, location, start_date, end_date, is_current,
     description, created_at, updated_at";

impl ExperienceRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Most recent first, each with its images.
    pub fn list(&self) -> Result<Vec<Experience>, PortfolioError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM experiences ORDER BY start_date DESC, id DESC",
                    EXPERIENCE_COLUMNS
                ))
                .map_err(storage_err)?;
            let mut experiences = stmt
                .query_map([], row_to_experience)
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;
            for exp in &mut experiences {
                exp.images = Gallery::Experience.load(conn, exp.id)?;
            }
            Ok(experiences)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Experience>, PortfolioError> {
        self.db.with_conn(|conn| find_experience(conn, id))
    }

    /// Insert an experience and its initial images (ordered by position).
    pub fn create(
        &self,
        input: &ExperienceInput,
        image_urls: &[String],
    ) -> Result<Experience, PortfolioError> {
        let now = now_secs();
        let end_date = if input.is_current { None } else { input.end_date };
        self.db.with_tx(|tx| {
            tx.execute(
                "INSERT INTO experiences (company, role, location, start_date, end_date,
                 is_current, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                rusqlite::params![
                    input.company,
                    input.role,
                    input.location,
                    date_to_sql(input.start_date),
                    date_to_sql(end_date),
                    input.is_current,
                    input.description,
                    now,
                ],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to save experience: {}", e)))?;
            let id = tx.last_insert_rowid();
            for (i, url) in image_urls.iter().enumerate() {
                Gallery::Experience.insert(tx, id, url, i as i64)?;
            }
            find_experience(tx, id)?.ok_or_else(|| PortfolioError::NotFound("Experience".into()))
        })
    }

    /// Update the scalar fields. Images are managed separately.
    pub fn update(
        &self,
        id: i64,
        input: &ExperienceInput,
    ) -> Result<Option<Experience>, PortfolioError> {
        let end_date = if input.is_current { None } else { input.end_date };
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE experiences SET company = ?1, role = ?2, location = ?3,
                     start_date = ?4, end_date = ?5, is_current = ?6, description = ?7,
                     updated_at = ?8
                     WHERE id = ?9",
                    rusqlite::params![
                        input.company,
                        input.role,
                        input.location,
                        date_to_sql(input.start_date),
                        date_to_sql(end_date),
                        input.is_current,
                        input.description,
                        now_secs(),
                        id,
                    ],
                )
                .map_err(|e| {
                    PortfolioError::Storage(format!("Failed to update experience: {}", e))
                })?;
            if changed == 0 {
                return Ok(None);
            }
            find_experience(conn, id)
        })
    }

    /// Delete an experience. Images cascade.
    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM experiences WHERE id = ?1", [id])
                .map_err(|e| {
                    PortfolioError::Storage(format!("Failed to delete experience: {}", e))
                })?;
            Ok(n > 0)
        })
    }

    pub fn add_image(&self, id: i64, image_url: &str) -> Result<GalleryImage, PortfolioError> {
        self.db
            .with_conn(|conn| Gallery::Experience.append(conn, id, image_url))
    }

    pub fn find_image(
        &self,
        id: i64,
        image_id: i64,
    ) -> Result<Option<GalleryImage>, PortfolioError> {
        self.db
            .with_conn(|conn| Gallery::Experience.find(conn, id, image_id))
    }

    pub fn delete_image(&self, image_id: i64) -> Result<bool, PortfolioError> {
        self.db
            .with_conn(|conn| Gallery::Experience.delete(conn, image_id))
    }
}

fn find_experience(conn: &Connection, id: i64) -> Result<Option<Experience>, PortfolioError> {
    let found = conn
        .query_row(
            &format!("SELECT {} FROM experiences WHERE id = ?1", EXPERIENCE_COLUMNS),
            [id],
            row_to_experience,
        )
        .optional()
        .map_err(storage_err)?;
    match found {
        Some(mut exp) => {
            exp.images = Gallery::Experience.load(conn, exp.id)?;
            Ok(Some(exp))
        }
        None => Ok(None),
    }
}

fn row_to_experience(row: &rusqlite::Row<'_>) -> rusqlite::Result<Experience> {
    Ok(Experience {
        id: row.get(0)?,
        company: row.get(1)?,
        role: row.get(2)?,
        location: row.get(3)?,
        start_date: date_from_sql(row.get(4)?),
        end_date: date_from_sql(row.get(5)?),
        is_current: row.get(6)?,
        description: row.get(7)?,
        images: Vec::new(),
        created_at: to_ts(row.get(8)?),
        updated_at: to_ts(row.get(9)?),
    })
}

// =============================================================================
// Projects
// =============================================================================

/// Repository for portfolio projects.
#[derive(Clone)]
pub struct ProjectRepository {
    db: Arc<Database>,
}

const PROJECT_COLUMNS: &str =
    "id, title, slug, description, platform, url, created_at, updated_at";

const PROJECT_CONFLICT: &str = "Project already exists";

impl ProjectRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Newest first, each with tech stacks and images.
    pub fn list(&self) -> Result<Vec<Project>, PortfolioError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM projects ORDER BY created_at DESC, id DESC",
                    PROJECT_COLUMNS
                ))
                .map_err(storage_err)?;
            let mut projects = stmt
                .query_map([], row_to_project)
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;
            for project in &mut projects {
                hydrate_project(conn, project)?;
            }
            Ok(projects)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Project>, PortfolioError> {
        self.db.with_conn(|conn| find_project(conn, "id", &id))
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Option<Project>, PortfolioError> {
        self.db.with_conn(|conn| find_project(conn, "slug", &slug))
    }

    /// Insert a project with its tech stacks and initial images.
    ///
    /// Returns a conflict if the slug is already taken.
    pub fn create(
        &self,
        input: &ProjectInput,
        image_urls: &[String],
    ) -> Result<Project, PortfolioError> {
        let now = now_secs();
        self.db.with_tx(|tx| {
            tx.execute(
                "INSERT INTO projects (title, slug, description, platform, url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![
                    input.title,
                    input.slug,
                    input.description,
                    input.platform,
                    input.url,
                    now,
                ],
            )
            .map_err(|e| write_err(e, PROJECT_CONFLICT))?;
            let id = tx.last_insert_rowid();
            replace_tech_stacks(tx, id, &input.tech_stacks)?;
            for (i, url) in image_urls.iter().enumerate() {
                Gallery::Project.insert(tx, id, url, i as i64)?;
            }
            find_project(tx, "id", &id)?.ok_or_else(|| PortfolioError::NotFound("Project".into()))
        })
    }

    /// Update scalar fields and replace the tech stack list.
    pub fn update(
        &self,
        id: i64,
        input: &ProjectInput,
    ) -> Result<Option<Project>, PortfolioError> {
        self.db.with_tx(|tx| {
            let changed = tx
                .execute(
                    "UPDATE projects SET title = ?1, slug = ?2, description = ?3, platform = ?4,
                     url = ?5, updated_at = ?6
                     WHERE id = ?7",
                    rusqlite::params![
                        input.title,
                        input.slug,
                        input.description,
                        input.platform,
                        input.url,
                        now_secs(),
                        id,
                    ],
                )
                .map_err(|e| write_err(e, PROJECT_CONFLICT))?;
            if changed == 0 {
                return Ok(None);
            }
            replace_tech_stacks(tx, id, &input.tech_stacks)?;
            find_project(tx, "id", &id)
        })
    }

    /// Delete a project. Tech stacks and images cascade.
    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM projects WHERE id = ?1", [id])
                .map_err(|e| PortfolioError::Storage(format!("Failed to delete project: {}", e)))?;
            Ok(n > 0)
        })
    }

    pub fn add_image(&self, id: i64, image_url: &str) -> Result<GalleryImage, PortfolioError> {
        self.db
            .with_conn(|conn| Gallery::Project.append(conn, id, image_url))
    }

    pub fn find_image(
        &self,
        id: i64,
        image_id: i64,
    ) -> Result<Option<GalleryImage>, PortfolioError> {
        self.db
            .with_conn(|conn| Gallery::Project.find(conn, id, image_id))
    }

    pub fn delete_image(&self, image_id: i64) -> Result<bool, PortfolioError> {
        self.db
            .with_conn(|conn| Gallery::Project.delete(conn, image_id))
    }
}

fn find_project(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<Project>, PortfolioError> {
    let found = conn
        .query_row(
            &format!("SELECT {} FROM projects WHERE {} = ?1", PROJECT_COLUMNS, column),
            [value],
            row_to_project,
        )
        .optional()
        .map_err(storage_err)?;
    match found {
        Some(mut project) => {
            hydrate_project(conn, &mut project)?;
            Ok(Some(project))
        }
        None => Ok(None),
    }
}

fn hydrate_project(conn: &Connection, project: &mut Project) -> Result<(), PortfolioError> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM project_tech_stacks WHERE project_id = ?1 ORDER BY id")
        .map_err(storage_err)?;
    project.tech_stacks = stmt
        .query_map([project.id], |row| {
            Ok(TechStack {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .map_err(storage_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(storage_err)?;
    project.images = Gallery::Project.load(conn, project.id)?;
    Ok(())
}

fn replace_tech_stacks(
    conn: &Connection,
    project_id: i64,
    names: &[String],
) -> Result<(), PortfolioError> {
    conn.execute(
        "DELETE FROM project_tech_stacks WHERE project_id = ?1",
        [project_id],
    )
    .map_err(storage_err)?;
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        conn.execute(
            "INSERT INTO project_tech_stacks (project_id, name) VALUES (?1, ?2)",
            rusqlite::params![project_id, name],
        )
        .map_err(|e| PortfolioError::Storage(format!("Failed to save tech stack: {}", e)))?;
    }
    Ok(())
}

fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        platform: row.get(4)?,
        url: row.get(5)?,
        tech_stacks: Vec::new(),
        images: Vec::new(),
        created_at: to_ts(row.get(6)?),
        updated_at: to_ts(row.get(7)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    fn project(title: &str, slug: &str, stacks: &[&str]) -> ProjectInput {
        ProjectInput {
            title: title.into(),
            slug: slug.into(),
            tech_stacks: stacks.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_experience_current_drops_end_date() {
        let repo = ExperienceRepository::new(make_db());
        let exp = repo
            .create(
                &ExperienceInput {
                    company: "Acme".into(),
                    role: "Engineer".into(),
                    start_date: NaiveDate::from_ymd_opt(2022, 1, 1),
                    end_date: NaiveDate::from_ymd_opt(2023, 1, 1),
                    is_current: true,
                    ..Default::default()
                },
                &["uploads/experiences/a.jpg".to_string(), "uploads/experiences/b.jpg".to_string()],
            )
            .unwrap();
        assert!(exp.is_current);
        assert_eq!(exp.end_date, None);
        assert_eq!(exp.images.len(), 2);
        assert_eq!(exp.images[1].order, 1);
    }

    #[test]
    fn test_experience_images_append_and_delete() {
        let repo = ExperienceRepository::new(make_db());
        let exp = repo
            .create(
                &ExperienceInput {
                    company: "Acme".into(),
                    role: "Engineer".into(),
                    ..Default::default()
                },
                &[],
            )
            .unwrap();

        let first = repo.add_image(exp.id, "uploads/experiences/1.jpg").unwrap();
        let second = repo.add_image(exp.id, "uploads/experiences/2.jpg").unwrap();
        assert_eq!(first.order, 0);
        assert_eq!(second.order, 1);

        assert!(repo.find_image(exp.id, first.id).unwrap().is_some());
        assert!(repo.find_image(exp.id + 1, first.id).unwrap().is_none());
        assert!(repo.delete_image(first.id).unwrap());
        assert_eq!(repo.find_by_id(exp.id).unwrap().unwrap().images.len(), 1);
    }

    #[test]
    fn test_project_slug_conflict() {
        let repo = ProjectRepository::new(make_db());
        repo.create(&project("Tracker", "tracker", &["Rust"]), &[]).unwrap();
        let err = repo
            .create(&project("Tracker", "tracker", &[]), &[])
            .unwrap_err();
        assert!(matches!(err, PortfolioError::Conflict(ref m) if m == "Project already exists"));
    }

    #[test]
    fn test_project_update_replaces_tech_stacks() {
        let repo = ProjectRepository::new(make_db());
        let created = repo
            .create(&project("Site", "site", &["Go", "MySQL"]), &["uploads/projects/x.png".into()])
            .unwrap();
        assert_eq!(created.tech_stacks.len(), 2);

        let updated = repo
            .update(created.id, &project("Site v2", "site-v2", &["Rust", " ", "SQLite", "Axum"]))
            .unwrap()
            .unwrap();
        let names: Vec<&str> = updated.tech_stacks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Rust", "SQLite", "Axum"]);
        assert_eq!(updated.images.len(), 1);
        assert!(repo.find_by_slug("site-v2").unwrap().is_some());
        assert!(repo.find_by_slug("site").unwrap().is_none());
    }

    #[test]
    fn test_project_delete_cascades() {
        let db = make_db();
        let repo = ProjectRepository::new(Arc::clone(&db));
        let created = repo
            .create(&project("P", "p", &["Rust"]), &["uploads/projects/1.png".into()])
            .unwrap();
        assert!(repo.delete(created.id).unwrap());

        let images: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM project_images", [], |r| r.get(0))
                    .map_err(storage_err)
            })
            .unwrap();
        assert_eq!(images, 0);
    }
}
