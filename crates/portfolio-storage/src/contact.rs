//! Contact form messages.

use std::sync::Arc;

use rusqlite::OptionalExtension;

use portfolio_core::error::PortfolioError;
use portfolio_core::types::{Contact, ContactInput, ContactStatus};

use crate::db::Database;
use crate::rows::{enum_col, now_secs, opt_ts, storage_err, to_ts};

const COLUMNS: &str =
    "id, name, email, subject, message, status, read_at, done_at, created_at, updated_at";

#[derive(Clone)]
pub struct ContactRepository {
    db: Arc<Database>,
}

impl ContactRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a new message as `pending`.
    pub fn create(&self, input: &ContactInput) -> Result<Contact, PortfolioError> {
        self.db.with_conn(|conn| {
            let now = now_secs();
            conn.execute(
                "INSERT INTO contacts (name, email, subject, message, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?5)",
                rusqlite::params![input.name, input.email, input.subject, input.message, now],
            )
            .map_err(|e| PortfolioError::Storage(format!("Failed to save contact: {}", e)))?;

            Ok(Contact {
                id: conn.last_insert_rowid(),
                name: input.name.clone(),
                email: input.email.clone(),
                subject: input.subject.clone(),
                message: input.message.clone(),
                status: ContactStatus::Pending,
                read_at: None,
                done_at: None,
                created_at: to_ts(now),
                updated_at: to_ts(now),
            })
        })
    }

    /// Newest first.
    pub fn list(&self, status: Option<ContactStatus>) -> Result<Vec<Contact>, PortfolioError> {
        let status = status.map(|s| s.as_str());
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM contacts
                     WHERE (?1 IS NULL OR status = ?1)
                     ORDER BY created_at DESC, id DESC",
                    COLUMNS
                ))
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([status], row_to_contact)
                .map_err(storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_err)?;
            Ok(rows)
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Contact>, PortfolioError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM contacts WHERE id = ?1", COLUMNS),
                [id],
                row_to_contact,
            )
            .optional()
            .map_err(storage_err)
        })
    }

    /// Move a message through triage. `read` stamps `read_at` once; `done`
    /// also stamps `read_at` once and always resets `done_at`.
    pub fn update_status(
        &self,
        id: i64,
        status: ContactStatus,
    ) -> Result<Option<Contact>, PortfolioError> {
        let changed = self.db.with_conn(|conn| {
            let now = now_secs();
            let sql = match status {
                ContactStatus::Pending => {
                    "UPDATE contacts SET status = ?1, updated_at = ?2 WHERE id = ?3"
                }
                ContactStatus::Read => {
                    "UPDATE contacts SET status = ?1, read_at = COALESCE(read_at, ?2),
                     updated_at = ?2 WHERE id = ?3"
                }
                ContactStatus::Done => {
                    "UPDATE contacts SET status = ?1, read_at = COALESCE(read_at, ?2),
                     done_at = ?2, updated_at = ?2 WHERE id = ?3"
                }
            };
            conn.execute(sql, rusqlite::params![status.as_str(), now, id])
                .map_err(|e| PortfolioError::Storage(format!("Failed to update contact: {}", e)))
        })?;
        if changed == 0 {
            return Ok(None);
        }
        self.find_by_id(id)
    }

    pub fn delete(&self, id: i64) -> Result<bool, PortfolioError> {
        self.db.with_conn(|conn| {
            let n = conn
                .execute("DELETE FROM contacts WHERE id = ?1", [id])
                .map_err(|e| PortfolioError::Storage(format!("Failed to delete contact: {}", e)))?;
            Ok(n > 0)
        })
    }
}

fn row_to_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        subject: row.get(3)?,
        message: row.get(4)?,
        status: enum_col(row, 5)?,
        read_at: opt_ts(row.get(6)?),
        done_at: opt_ts(row.get(7)?),
        created_at: to_ts(row.get(8)?),
        updated_at: to_ts(row.get(9)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_repo() -> ContactRepository {
        ContactRepository::new(Arc::new(Database::in_memory().unwrap()))
    }

    fn message(name: &str) -> ContactInput {
        ContactInput {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            subject: "Hello there".to_string(),
            message: "I would like to talk about a project.".to_string(),
        }
    }

    #[test]
    fn test_create_starts_pending() {
        let repo = make_repo();
        let contact = repo.create(&message("Alice")).unwrap();
        assert_eq!(contact.status, ContactStatus::Pending);
        assert!(contact.read_at.is_none());
        assert_eq!(repo.find_by_id(contact.id).unwrap().unwrap().email, "alice@example.com");
    }

    #[test]
    fn test_status_transitions_stamp_times() {
        let repo = make_repo();
        let id = repo.create(&message("Bob")).unwrap().id;

        let read = repo.update_status(id, ContactStatus::Read).unwrap().unwrap();
        assert_eq!(read.status, ContactStatus::Read);
        let first_read = read.read_at.unwrap();
        assert!(read.done_at.is_none());

        let done = repo.update_status(id, ContactStatus::Done).unwrap().unwrap();
        assert_eq!(done.read_at, Some(first_read));
        assert!(done.done_at.is_some());

        let back = repo.update_status(id, ContactStatus::Pending).unwrap().unwrap();
        assert_eq!(back.status, ContactStatus::Pending);

        assert!(repo.update_status(999, ContactStatus::Read).unwrap().is_none());
    }

    #[test]
    fn test_done_without_read_sets_both() {
        let repo = make_repo();
        let id = repo.create(&message("Carol")).unwrap().id;
        let done = repo.update_status(id, ContactStatus::Done).unwrap().unwrap();
        assert!(done.read_at.is_some());
        assert!(done.done_at.is_some());
    }

    #[test]
    fn test_list_filter_and_delete() {
        let repo = make_repo();
        let a = repo.create(&message("Dan")).unwrap();
        repo.create(&message("Eve")).unwrap();
        repo.update_status(a.id, ContactStatus::Read).unwrap();

        assert_eq!(repo.list(None).unwrap().len(), 2);
        let read = repo.list(Some(ContactStatus::Read)).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].id, a.id);

        assert!(repo.delete(a.id).unwrap());
        assert_eq!(repo.list(None).unwrap().len(), 1);
    }
}
