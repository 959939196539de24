//! Contact form submissions and their triage.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use portfolio_core::types::{Contact, ContactInput, ContactStatus};
use portfolio_storage::ContactRepository;

use crate::error::ApiError;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validate::Validator;

use super::{non_empty, not_found, ListParams};

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .length("name", &self.name, 2, 100)
            .email("email", &self.email)
            .check(
                "email",
                self.email.trim().chars().count() <= 100,
                "email must be at most 100 characters",
            )
            .length("subject", &self.subject, 3, 150)
            .length("message", &self.message, 10, 5000)
            .finish()
    }

    fn into_input(self) -> ContactInput {
        ContactInput {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

/// POST /contacts
pub async fn create_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> ApiResult<Contact> {
    let Json(req) = payload?;
    req.validate()?;

    let contact = ContactRepository::new(state.database.clone()).create(&req.into_input())?;
    tracing::info!(contact_id = contact.id, "Contact message received");
    Ok(ApiResponse::created("Message sent successfully", contact))
}

/// GET /contacts?status=
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Contact>> {
    let status = match non_empty(params.status.as_deref()) {
        Some(raw) => {
            let mut v = Validator::new();
            let parsed = v.one_of::<ContactStatus>("status", raw);
            v.finish()?;
            parsed
        }
        None => None,
    };
    let contacts = ContactRepository::new(state.database.clone()).list(status)?;
    Ok(ApiResponse::ok("List Data Contacts", contacts))
}

/// GET /contacts/{id}
pub async fn get_contact(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Contact> {
    let contact = ContactRepository::new(state.database.clone())
        .find_by_id(id)?
        .ok_or_else(|| not_found("Contact"))?;
    Ok(ApiResponse::ok("Contact Found", contact))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

/// PUT /contacts/{id}/status
pub async fn update_contact_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Contact> {
    let Json(req) = payload?;
    let mut v = Validator::new();
    let status = v.one_of::<ContactStatus>("status", req.status.trim());
    v.finish()?;
    let status = status.ok_or_else(|| ApiError::field("status", "status is required"))?;

    let contact = ContactRepository::new(state.database.clone())
        .update_status(id, status)?
        .ok_or_else(|| not_found("Contact"))?;
    Ok(ApiResponse::ok("Contact status updated successfully", contact))
}

/// DELETE /contacts/{id}
pub async fn delete_contact(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    if !ContactRepository::new(state.database.clone()).delete(id)? {
        return Err(not_found("Contact"));
    }
    Ok(ApiResponse::ok("Contact deleted successfully", ()))
}
