//! The single site profile.

use axum::extract::State;

use portfolio_core::types::{Profile, ProfileInput};
use portfolio_storage::ProfileRepository;

use crate::form::FormData;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validate::Validator;

use super::{not_found, replace_upload};

/// GET /profile
pub async fn get_profile(State(state): State<AppState>) -> ApiResult<Profile> {
    let profile = ProfileRepository::new(state.database.clone())
        .get()?
        .ok_or_else(|| not_found("Profile"))?;
    Ok(ApiResponse::ok("Profile Found", profile))
}

/// PUT /profile - create or update from a multipart form.
pub async fn upsert_profile(
    State(state): State<AppState>,
    mut form: FormData,
) -> ApiResult<Profile> {
    Validator::new().required("name", &form.text("name")).finish()?;

    let repo = ProfileRepository::new(state.database.clone());
    let current = repo.get()?.unwrap_or_default();

    let avatar = replace_upload(
        &state,
        form.take_file("avatar"),
        &current.avatar,
        "profile",
        "avatar",
    )
    .await?;
    let resume = replace_upload(
        &state,
        form.take_file("resume"),
        &current.resume_url,
        "resume",
        "resume",
    )
    .await?;

    let profile = repo.upsert(&ProfileInput {
        name: form.text("name"),
        tagline: form.text("tagline"),
        bio: form.text("bio"),
        avatar: avatar.path.clone(),
        resume_url: resume.path.clone(),
        github: form.text("github"),
        linkedin: form.text("linkedin"),
        twitter: form.text("twitter"),
        instagram: form.text("instagram"),
        email: form.text("email"),
        phone: form.text("phone"),
        location: form.text("location"),
    })?;
    avatar.cleanup(&state).await;
    resume.cleanup(&state).await;

    state.revalidator.trigger("profile", None);
    Ok(ApiResponse::ok("Profile saved successfully", profile))
}
