//! Portfolio core crate - configuration, errors, domain types, and the
//! small text helpers shared by every other crate.

pub mod config;
pub mod error;
pub mod events;
pub mod pagination;
pub mod slug;
pub mod types;

pub use config::PortfolioConfig;
pub use error::{PortfolioError, Result};
pub use events::{BlogEvent, GenerateStatus};
pub use pagination::{PageMeta, PageRequest, Paginated};
pub use slug::slugify;
pub use types::*;
