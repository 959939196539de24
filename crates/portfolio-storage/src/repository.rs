//! Repositories for the "about me" content: profile, skills, education,
//! courses, and site settings.

use std::collections::BTreeMap;
use std::sync::Arc;

use rusqlite::OptionalExtension;

use portfolio_core::error::PortfolioError;
use portfolio_core::types::{
    Course, CourseInput, Education, EducationInput, Profile, ProfileInput, Setting, Skill,
    SkillCategory, SkillInput,
};

use crate::db::Database;
use crate::rows::{date_from_sql, date_to_sql, enum_col, now_secs, storage_err, to_ts};

// =============================================================================
// Profile
// =============================================================================

/// Repository for the single site profile row.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<Database>,
}

const PROFILE_COLUMNS: &str = "id, name, tagline, bio, avatar, resume_url, github, linkedin,
     twitter, instagram, email, phone, location, created_at, updated_at";

impl ProfileRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The first profile row, if one has been saved.
    pub fn get(&self) -> Result<Option<Profile>, PortfolioError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM profiles ORDER BY id LIMIT 1", PROFILE_COLUMNS),
                [],
                row_to_profile,
            )
            .optional()
            .map_err(storage_err)
        })
    }

    /// Update the existing profile or create it.
    pub fn upsert(&self, input: &ProfileInput) -> Result<Profile, PortfolioError> {
        let now = now_secs();
        let existing = self.get()?;
        self.db.with_conn(|conn| {
            let id = match existing {
                Some(profile) => {
                    conn.execute(
                        "UPDATE profiles SET name = ?1, tagline = ?2, bio = ?3, avatar = ?4,
                         resume_url = ?5, github = ?6, linkedin = ?7, twitter = ?8,
                         instagram = ?9, email = ?10, phone = ?11, location = ?12,
                         updated_at = ?13
                         WHERE id = ?14",
                        rusqlite::params![
                            input.name,
                            input.tagline,
                            input.bio,
                            input.avatar,
                            input.resume_url,
                            input.github,
                            input.linkedin,
                            input.twitter,
                            input.instagram,
                            input.email,
                            input.phone,
                            input.location,
                            now,
                            profile.id,
                        ],
                    )
                    .map_err(|e| {
                        PortfolioError::Storage(format!("Failed to update profile: {}", e))
                    })?;
                    profile.id
                }
                None => {
                    conn.execute(
                        "INSERT INTO profiles (name, tagline, bio, avatar, resume_url, github,
                         linkedin, twitter, instagram, email, phone, location, created_at,
                         updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
                        rusqlite::params![
                            input.name,
                            input.tagline,
                            input.bio,
                            input.avatar,
                            input.resume_url,
                            input.github,
                            input.linkedin,
                            input.twitter,
                            input.instagram,
                            input.email,
                            input.phone,
                            input.location,
                            now,
                        ],
                    )
                    .map_err(|e| {
                        PortfolioError::Storage(format!("Failed to create profile: {}", e))
                    })?;
                    conn.last_insert_rowid()
                }
            };

            conn.query_row(
                &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS),
                [id],
                row_to_profile,
            )
            .map_err(storage_err)
        })
    }
}

fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        name: row.get(1)?,
        tagline: row.get(2)?,
        bio: row.get(3)?,
        avatar: row.get(4)?,
        resume_url: row.get(5)?,
        github: row.get(6)?,
        linkedin: row.get(7)?,
        twitter: row.get(8)?,
        instagram: row.get(9)?,
        email: row.get(10)?,
        phone: row.get(11)?,
        location: row.get(12)?,
        created_at: Some(to_ts(row.get(13)?)),
        updated_at: Some(to_ts(row.get(14)?)),
    })
}

// =============================================================================
// Skills
// =============================================================================

/// Repository for skills.
#[derive(Clone)]
pub struct SkillRepository {
    db: Arc<Database>,
}

const SKILL_COLUMNS: &str =
    "id, category, name, level, icon_url, sort_order, created_at, updated_at";

impl SkillRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// List skills ordered by category then display order.
    pub fn list(&self, category: Option<SkillCategory>) -> Result<Vec<Skill>, PortfolioError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM skills
                     WHERE (?1 IS NULL OR category = ?1)
                     ORDER BY category ASC, sort_order ASC, id ASC",
                    SKILL_COLUMNS
                ))
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([category.map(|c| c.as_str())], row_to_skill)
                .map_err(storage_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Skill>, PortfolioError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM skills WHERE id = ?1", SKILL_COLUMNS),
                [id],
                row_to_skill,
            )
            .optional()
            .map_err(storage_err)
        })
    }

    pub fn create(&self, input: &SkillInput) -> Result<Skill, PortfolioError> {
        let now = now_secs();
        let id = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO skills (category, name, level, icon_url, sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![
                    input.category.as_str(),
                    input.name,
                    input.level.as_str(),
                    input.icon_url,
                    input.order,
                    now,
                ],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to save skill: {}", e)))?;
            Ok(conn.last_insert_rowid())
        })?;
        self.find_by_id(id)?
            .ok_or_else(|| PortfolioError::NotFound("Skill".into()))
    }

    /// Replace every column of a skill. Returns `None` if it does not exist.
    pub fn update(&self, id: i64, input: &SkillInput) -> Result<Option<Skill>, PortfolioError> {
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE skills SET category = ?1, name = ?2, level = ?3, icon_url = ?4,
                 sort_order = ?5, updated_at = ?6
                 WHERE id = ?7",
                rusqlite::params![
                    input.category.as_str(),
                    input.name,
                    input.level.as_str(),
                    input.icon_url,
                    input.order,
                    now_secs(),
                    id,
                ],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to update skill: {}", e)))
        })?;
        if changed == 0 {
            return Ok(None);
        }
        self.find_by_id(id)
    }

    /// Delete a skill. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM skills WHERE id = ?1", [id])
                .map_err(|e| PortfolioError::Storage(format!("Failed to delete skill: {}", e)))?;
            Ok(n > 0)
        })
    }
}

fn row_to_skill(row: &rusqlite::Row<'_>) -> rusqlite::Result<Skill> {
    Ok(Skill {
        id: row.get(0)?,
        category: enum_col(row, 1)?,
        name: row.get(2)?,
        level: enum_col(row, 3)?,
        icon_url: row.get(4)?,
        order: row.get(5)?,
        created_at: to_ts(row.get(6)?),
        updated_at: to_ts(row.get(7)?),
    })
}

// =============================================================================
// Education
// =============================================================================

/// Repository for education history.
#[derive(Clone)]
pub struct EducationRepository {
    db: Arc<Database>,
}

const EDUCATION_COLUMNS: &str = "id, school, degree, field, start_year, end_year, description,
     logo_url, created_at, updated_at";

impl EducationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Most recent first.
    pub fn list(&self) -> Result<Vec<Education>, PortfolioError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM educations ORDER BY start_year DESC, id DESC",
                    EDUCATION_COLUMNS
                ))
                .map_err(storage_err)?;
            let rows = stmt.query_map([], row_to_education).map_err(storage_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Education>, PortfolioError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM educations WHERE id = ?1", EDUCATION_COLUMNS),
                [id],
                row_to_education,
            )
            .optional()
            .map_err(storage_err)
        })
    }

    pub fn create(&self, input: &EducationInput) -> Result<Education, PortfolioError> {
        let now = now_secs();
        let id = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO educations (school, degree, field, start_year, end_year,
                 description, logo_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                rusqlite::params![
                    input.school,
                    input.degree,
                    input.field,
                    input.start_year,
                    input.end_year,
                    input.description,
                    input.logo_url,
                    now,
                ],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to save education: {}", e)))?;
            Ok(conn.last_insert_rowid())
        })?;
        self.find_by_id(id)?
            .ok_or_else(|| PortfolioError::NotFound("Education".into()))
    }

    pub fn update(
        &self,
        id: i64,
        input: &EducationInput,
    ) -> Result<Option<Education>, PortfolioError> {
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE educations SET school = ?1, degree = ?2, field = ?3, start_year = ?4,
                 end_year = ?5, description = ?6, logo_url = ?7, updated_at = ?8
                 WHERE id = ?9",
                rusqlite::params![
                    input.school,
                    input.degree,
                    input.field,
                    input.start_year,
                    input.end_year,
                    input.description,
                    input.logo_url,
                    now_secs(),
                    id,
                ],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to update education: {}", e)))
        })?;
        if changed == 0 {
            return Ok(None);
        }
        self.find_by_id(id)
    }

    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM educations WHERE id = ?1", [id])
                .map_err(|e| {
                    PortfolioError::Storage(format!("Failed to delete education: {}", e))
                })?;
            Ok(n > 0)
        })
    }
}

fn row_to_education(row: &rusqlite::Row<'_>) -> rusqlite::Result<Education> {
    Ok(Education {
        id: row.get(0)?,
        school: row.get(1)?,
        degree: row.get(2)?,
        field: row.get(3)?,
        start_year: row.get(4)?,
        end_year: row.get(5)?,
        description: row.get(6)?,
        logo_url: row.get(7)?,
        created_at: to_ts(row.get(8)?),
        updated_at: to_ts(row.get(9)?),
    })
}

// =============================================================================
// Courses
// =============================================================================

/// Repository for courses and certificates.
#[derive(Clone)]
pub struct CourseRepository {
    db: Arc<Database>,
}

const COURSE_COLUMNS: &str = "id, title, issuer, issued_at, expired_at, credential_url,
     certificate_image, description, created_at, updated_at";

impl CourseRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Most recently issued first.
    pub fn list(&self) -> Result<Vec<Course>, PortfolioError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM courses ORDER BY issued_at DESC, id DESC",
                    COURSE_COLUMNS
                ))
                .map_err(storage_err)?;
            let rows = stmt.query_map([], row_to_course).map_err(storage_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Course>, PortfolioError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM courses WHERE id = ?1", COURSE_COLUMNS),
                [id],
                row_to_course,
            )
            .optional()
            .map_err(storage_err)
        })
    }

    pub fn create(&self, input: &CourseInput) -> Result<Course, PortfolioError> {
        let now = now_secs();
        let id = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO courses (title, issuer, issued_at, expired_at, credential_url,
                 certificate_image, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                rusqlite::params![
                    input.title,
                    input.issuer,
                    date_to_sql(input.issued_at),
                    date_to_sql(input.expired_at),
                    input.credential_url,
                    input.certificate_image,
                    input.description,
                    now,
                ],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to save course: {}", e)))?;
            Ok(conn.last_insert_rowid())
        })?;
        self.find_by_id(id)?
            .ok_or_else(|| PortfolioError::NotFound("Course".into()))
    }

    pub fn update(&self, id: i64, input: &CourseInput) -> Result<Option<Course>, PortfolioError> {
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE courses SET title = ?1, issuer = ?2, issued_at = ?3, expired_at = ?4,
                 credential_url = ?5, certificate_image = ?6, description = ?7, updated_at = ?8
                 WHERE id = ?9",
                rusqlite::params![
                    input.title,
                    input.issuer,
                    date_to_sql(input.issued_at),
                    date_to_sql(input.expired_at),
                    input.credential_url,
                    input.certificate_image,
                    input.description,
                    now_secs(),
                    id,
                ],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to update course: {}", e)))
        })?;
        if changed == 0 {
            return Ok(None);
        }
        self.find_by_id(id)
    }

    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM courses WHERE id = ?1", [id])
                .map_err(|e| PortfolioError::Storage(format!("Failed to delete course: {}", e)))?;
            Ok(n > 0)
        })
    }
}

fn row_to_course(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        issuer: row.get(2)?,
        issued_at: date_from_sql(row.get(3)?),
        expired_at: date_from_sql(row.get(4)?),
        credential_url: row.get(5)?,
        certificate_image: row.get(6)?,
        description: row.get(7)?,
        created_at: to_ts(row.get(8)?),
        updated_at: to_ts(row.get(9)?),
    })
}

// =============================================================================
// Settings
// =============================================================================

/// Repository for key/value site settings.
#[derive(Clone)]
pub struct SettingRepository {
    db: Arc<Database>,
}

impl SettingRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// All settings as a sorted key/value map.
    pub fn as_map(&self) -> Result<BTreeMap<String, String>, PortfolioError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT key, value FROM settings ORDER BY key")
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
                .map_err(storage_err)?;
            rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()
                .map_err(storage_err)
        })
    }

    pub fn find_by_key(&self, key: &str) -> Result<Option<Setting>, PortfolioError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, key, value, created_at, updated_at FROM settings WHERE key = ?1",
                [key],
                |row| {
                    Ok(Setting {
                        id: row.get(0)?,
                        key: row.get(1)?,
                        value: row.get(2)?,
                        created_at: to_ts(row.get(3)?),
                        updated_at: to_ts(row.get(4)?),
                    })
                },
            )
            .optional()
            .map_err(storage_err)
        })
    }

    /// Insert or overwrite every pair in one transaction.
    pub fn upsert_many(&self, values: &BTreeMap<String, String>) -> Result<(), PortfolioError> {
        let now = now_secs();
        self.db.with_tx(|tx| {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO settings (key, value, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                    updated_at = excluded.updated_at",
                )
                .map_err(storage_err)?;
            for (key, value) in values {
                stmt.execute(rusqlite::params![key, value, now])
                    .map_err(|e| PortfolioError::Storage(format!("Failed to save setting: {}", e)))?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use portfolio_core::types::SkillLevel;

    fn make_db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    fn skill(name: &str, category: SkillCategory, order: i64) -> SkillInput {
        SkillInput {
            category,
            name: name.to_string(),
            level: SkillLevel::Advanced,
            icon_url: String::new(),
            order,
        }
    }

    #[test]
    fn test_profile_upsert_creates_then_updates() {
        let repo = ProfileRepository::new(make_db());
        assert!(repo.get().unwrap().is_none());

        let mut input = ProfileInput {
            name: "Arl".into(),
            tagline: "Backend dev".into(),
            ..Default::default()
        };
        let created = repo.upsert(&input).unwrap();
        assert_eq!(created.name, "Arl");

        input.bio = "Writes Rust".into();
        let updated = repo.upsert(&input).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.bio, "Writes Rust");
    }

    #[test]
    fn test_skills_ordered_and_filtered() {
        let repo = SkillRepository::new(make_db());
        repo.create(&skill("Tokio", SkillCategory::Framework, 2)).unwrap();
        repo.create(&skill("Rust", SkillCategory::Language, 1)).unwrap();
        repo.create(&skill("Axum", SkillCategory::Framework, 1)).unwrap();

        let all = repo.list(None).unwrap();
        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Axum", "Tokio", "Rust"]);

        let frameworks = repo.list(Some(SkillCategory::Framework)).unwrap();
        assert_eq!(frameworks.len(), 2);
    }

    #[test]
    fn test_skill_update_and_delete() {
        let repo = SkillRepository::new(make_db());
        let created = repo.create(&skill("Go", SkillCategory::Language, 0)).unwrap();

        let mut input = skill("Go", SkillCategory::Language, 5);
        input.level = SkillLevel::Expert;
        let updated = repo.update(created.id, &input).unwrap().unwrap();
        assert_eq!(updated.level, SkillLevel::Expert);
        assert_eq!(updated.order, 5);

        assert!(repo.update(999, &input).unwrap().is_none());
        assert!(repo.delete(created.id).unwrap());
        assert!(!repo.delete(created.id).unwrap());
    }

    #[test]
    fn test_education_ordered_by_start_year_desc() {
        let repo = EducationRepository::new(make_db());
        for (school, year) in [("SMA", 2015), ("Uni", 2018), ("SMP", 2012)] {
            repo.create(&EducationInput {
                school: school.into(),
                start_year: Some(year),
                ..Default::default()
            })
            .unwrap();
        }
        let schools: Vec<String> = repo.list().unwrap().into_iter().map(|e| e.school).collect();
        assert_eq!(schools, vec!["Uni", "SMA", "SMP"]);
    }

    #[test]
    fn test_course_dates_persist() {
        let repo = CourseRepository::new(make_db());
        let issued = NaiveDate::from_ymd_opt(2023, 5, 1);
        let course = repo
            .create(&CourseInput {
                title: "Rust Fundamentals".into(),
                issued_at: issued,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(course.issued_at, issued);
        assert_eq!(course.expired_at, None);
    }

    #[test]
    fn test_settings_upsert_many() {
        let repo = SettingRepository::new(make_db());
        let mut values = BTreeMap::new();
        values.insert("site_title".to_string(), "My Site".to_string());
        values.insert("theme".to_string(), "dark".to_string());
        repo.upsert_many(&values).unwrap();

        values.insert("theme".to_string(), "light".to_string());
        repo.upsert_many(&values).unwrap();

        let map = repo.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["theme"], "light");
        assert_eq!(repo.find_by_key("site_title").unwrap().unwrap().value, "My Site");
        assert!(repo.find_by_key("missing").unwrap().is_none());
    }
}
