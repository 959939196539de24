//! Portfolio storage crate - SQLite persistence for the portfolio backend.
//!
//! Provides a WAL-mode SQLite database with migrations and one repository
//! per aggregate: profile and resume sections, showcase galleries, blogs
//! and tags, bookmarks, contact messages, settings, tools and users.

pub mod blog;
pub mod bookmark;
pub mod contact;
pub mod db;
pub mod migrations;
pub mod repository;
mod rows;
pub mod showcase;
pub mod tool;
pub mod user;

pub use blog::{BlogFilter, BlogRepository, TagRepository};
pub use bookmark::{BookmarkRepository, Upserted};
pub use contact::ContactRepository;
pub use db::Database;
pub use repository::{
    CourseRepository, EducationRepository, ProfileRepository, SettingRepository, SkillRepository,
};
pub use showcase::{ExperienceRepository, ProjectRepository};
pub use tool::ToolRepository;
pub use user::UserRepository;
