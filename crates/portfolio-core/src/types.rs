use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// UTC timestamp used throughout the domain.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// Enums
// =============================================================================

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored and serialized form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "must be one of {}, got '{}'",
                        [$($text),+].join("|"),
                        other
                    )),
                }
            }
        }
    };
}

string_enum! {
    /// Skill grouping shown on the portfolio.
    SkillCategory {
        Language => "language",
        Framework => "framework",
        Database => "database",
        Tool => "tool",
        Other => "other",
    }
}

string_enum! {
    /// Self-assessed skill proficiency.
    SkillLevel {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
        Expert => "expert",
    }
}

string_enum! {
    /// Who wrote a blog post: a logged-in user or the AI writer.
    BlogAuthor {
        User => "user",
        Aibys => "aibys",
    }
}

string_enum! {
    /// Blog moderation status. Only `Published` is publicly listed.
    BlogStatus {
        Pending => "pending",
        Published => "published",
        Rejected => "rejected",
        Archived => "archived",
    }
}

string_enum! {
    /// Contact message triage status.
    ContactStatus {
        Pending => "pending",
        Read => "read",
        Done => "done",
    }
}

// =============================================================================
// Entities
// =============================================================================

/// An admin account. The password hash is never serialized.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub tagline: String,
    pub bio: String,
    pub avatar: String,
    pub resume_url: String,
    pub github: String,
    pub linkedin: String,
    pub twitter: String,
    pub instagram: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub category: SkillCategory,
    pub name: String,
    pub level: SkillLevel,
    pub icon_url: String,
    pub order: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Education {
    pub id: i64,
    pub school: String,
    pub degree: String,
    pub field: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub description: String,
    pub logo_url: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A course or certificate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub issuer: String,
    pub issued_at: Option<NaiveDate>,
    pub expired_at: Option<NaiveDate>,
    pub credential_url: String,
    pub certificate_image: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An ordered image attached to an experience or project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: i64,
    pub image_url: String,
    pub order: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Experience {
    pub id: i64,
    pub company: String,
    pub role: String,
    pub location: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: String,
    pub images: Vec<GalleryImage>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStack {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub platform: String,
    pub url: String,
    pub tech_stacks: Vec<TechStack>,
    pub images: Vec<GalleryImage>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub cover_image: String,
    pub author: BlogAuthor,
    pub status: BlogStatus,
    pub reject_comment: String,
    pub user_id: Option<i64>,
    pub tags: Vec<Tag>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Blog counts per status, as shown on the admin dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogStats {
    pub total: i64,
    pub published: i64,
    pub pending: i64,
    pub rejected: i64,
    pub archived: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub topics: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub read_at: Option<Timestamp>,
    pub done_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Setting {
    pub id: i64,
    pub key: String,
    pub value: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A published utility tool. `slug` names a handler in the tool registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tool {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub icon: String,
    pub is_active: bool,
    pub order: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUsageCount {
    pub tool_slug: String,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: String,
    pub count: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolStats {
    pub per_tool: Vec<ToolUsageCount>,
    pub daily: Vec<DailyUsage>,
    pub total_all: i64,
    pub today_count: i64,
}

// =============================================================================
// Write models
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, Default)]
pub struct ProfileInput {
    pub name: String,
    pub tagline: String,
    pub bio: String,
    pub avatar: String,
    pub resume_url: String,
    pub github: String,
    pub linkedin: String,
    pub twitter: String,
    pub instagram: String,
    pub email: String,
    pub phone: String,
    pub location: String,
}

#[derive(Clone, Debug)]
pub struct SkillInput {
    pub category: SkillCategory,
    pub name: String,
    pub level: SkillLevel,
    pub icon_url: String,
    pub order: i64,
}

#[derive(Clone, Debug, Default)]
pub struct EducationInput {
    pub school: String,
    pub degree: String,
    pub field: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub description: String,
    pub logo_url: String,
}

#[derive(Clone, Debug, Default)]
pub struct CourseInput {
    pub title: String,
    pub issuer: String,
    pub issued_at: Option<NaiveDate>,
    pub expired_at: Option<NaiveDate>,
    pub credential_url: String,
    pub certificate_image: String,
    pub description: String,
}

#[derive(Clone, Debug, Default)]
pub struct ExperienceInput {
    pub company: String,
    pub role: String,
    pub location: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: String,
}

#[derive(Clone, Debug, Default)]
pub struct ProjectInput {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub platform: String,
    pub url: String,
    pub tech_stacks: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct BlogInput {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub cover_image: String,
    pub author: BlogAuthor,
    pub status: BlogStatus,
    pub user_id: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct BookmarkInput {
    pub url: String,
    pub title: String,
    pub description: String,
    pub topics: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct ToolInput {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub icon: String,
    pub is_active: bool,
    pub order: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_through_str() {
        for status in BlogStatus::ALL {
            assert_eq!(status.as_str().parse::<BlogStatus>().unwrap(), *status);
        }
        for level in SkillLevel::ALL {
            assert_eq!(level.to_string().parse::<SkillLevel>().unwrap(), *level);
        }
    }

    #[test]
    fn test_enum_parse_error_lists_choices() {
        let err = "urgent".parse::<ContactStatus>().unwrap_err();
        assert_eq!(err, "must be one of pending|read|done, got 'urgent'");
    }

    #[test]
    fn test_enum_serde_lowercase() {
        let json = serde_json::to_string(&BlogAuthor::Aibys).unwrap();
        assert_eq!(json, "\"aibys\"");
        let parsed: SkillCategory = serde_json::from_str("\"framework\"").unwrap();
        assert_eq!(parsed, SkillCategory::Framework);
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: 1,
            name: "Admin".into(),
            username: "admin".into(),
            email: "admin@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_blog_stats_default_is_zero() {
        let stats = BlogStats::default();
        let value = serde_json::to_value(&stats).unwrap();
        for key in ["total", "published", "pending", "rejected", "archived"] {
            assert_eq!(value[key], 0);
        }
    }
}
