//! Skills, educations and courses.
//!
//! All three take multipart forms with one optional image and follow the
//! same shape: validate, store the file, write the row, clean up the file it
//! replaced.

use axum::extract::{Path, Query, State};

use portfolio_core::types::{
    Course, CourseInput, Education, EducationInput, Skill, SkillCategory, SkillInput, SkillLevel,
};
use portfolio_storage::{CourseRepository, EducationRepository, SkillRepository};

use crate::error::ApiError;
use crate::form::FormData;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validate::{parse_date, Validator};

use super::{non_empty, not_found, replace_upload, ListParams};

// =============================================================================
// Skills
// =============================================================================

/// Validated skill fields. `icon_url` is filled in by the caller.
fn skill_input(form: &FormData) -> Result<SkillInput, ApiError> {
    let mut v = Validator::new();
    v.required("name", &form.text("name"));
    let category = v.one_of::<SkillCategory>("category", &form.text("category"));
    let level = v.one_of::<SkillLevel>("level", &form.text("level"));
    v.finish()?;

    match (category, level) {
        (Some(category), Some(level)) => Ok(SkillInput {
            category,
            name: form.text("name"),
            level,
            icon_url: String::new(),
            order: form.int("order").unwrap_or(0),
        }),
        _ => Err(ApiError::field("category", "category is required")),
    }
}

/// GET /skills?category=
pub async fn list_skills(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Skill>> {
    let category = match non_empty(params.category.as_deref()) {
        Some(raw) => {
            let mut v = Validator::new();
            let parsed = v.one_of::<SkillCategory>("category", raw);
            v.finish()?;
            parsed
        }
        None => None,
    };
    let skills = SkillRepository::new(state.database.clone()).list(category)?;
    Ok(ApiResponse::ok("List Data Skills", skills))
}

/// GET /skills/{id}
pub async fn get_skill(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Skill> {
    let skill = SkillRepository::new(state.database.clone())
        .find_by_id(id)?
        .ok_or_else(|| not_found("Skill"))?;
    Ok(ApiResponse::ok("Skill Found", skill))
}

/// POST /skills
pub async fn create_skill(State(state): State<AppState>, mut form: FormData) -> ApiResult<Skill> {
    let mut input = skill_input(&form)?;
    input.icon_url = replace_upload(&state, form.take_file("icon"), "", "skills", "icon")
        .await?
        .path;
    let skill = SkillRepository::new(state.database.clone()).create(&input)?;

    state.revalidator.trigger("skill", None);
    Ok(ApiResponse::created("Skill created successfully", skill))
}

/// PUT /skills/{id}
pub async fn update_skill(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut form: FormData,
) -> ApiResult<Skill> {
    let repo = SkillRepository::new(state.database.clone());
    let current = repo.find_by_id(id)?.ok_or_else(|| not_found("Skill"))?;
    let mut input = skill_input(&form)?;

    let icon = replace_upload(&state, form.take_file("icon"), &current.icon_url, "skills", "icon")
        .await?;
    input.icon_url = icon.path.clone();
    let skill = repo
        .update(id, &input)?
        .ok_or_else(|| not_found("Skill"))?;
    icon.cleanup(&state).await;

    state.revalidator.trigger("skill", None);
    Ok(ApiResponse::ok("Skill updated successfully", skill))
}

/// DELETE /skills/{id}
pub async fn delete_skill(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let repo = SkillRepository::new(state.database.clone());
    let skill = repo.find_by_id(id)?.ok_or_else(|| not_found("Skill"))?;
    repo.delete(id)?;
    state.uploads.remove_quietly(&skill.icon_url).await;

    state.revalidator.trigger("skill", None);
    Ok(ApiResponse::ok("Skill deleted successfully", ()))
}

// =============================================================================
// Educations
// =============================================================================

fn education_input(form: &FormData, logo_url: String) -> EducationInput {
    EducationInput {
        school: form.text("school"),
        degree: form.text("degree"),
        field: form.text("field"),
        start_year: form.int("start_year").map(|y| y as i32),
        end_year: form.int("end_year").map(|y| y as i32),
        description: form.text("description"),
        logo_url,
    }
}

/// GET /educations
pub async fn list_educations(State(state): State<AppState>) -> ApiResult<Vec<Education>> {
    let educations = EducationRepository::new(state.database.clone()).list()?;
    Ok(ApiResponse::ok("List Data Educations", educations))
}

/// GET /educations/{id}
pub async fn get_education(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Education> {
    let education = EducationRepository::new(state.database.clone())
        .find_by_id(id)?
        .ok_or_else(|| not_found("Education"))?;
    Ok(ApiResponse::ok("Education Found", education))
}

/// POST /educations
pub async fn create_education(
    State(state): State<AppState>,
    mut form: FormData,
) -> ApiResult<Education> {
    Validator::new().required("school", &form.text("school")).finish()?;

    let logo = replace_upload(&state, form.take_file("logo"), "", "educations", "logo").await?;
    let education =
        EducationRepository::new(state.database.clone()).create(&education_input(&form, logo.path))?;

    state.revalidator.trigger("education", None);
    Ok(ApiResponse::created("Education created successfully", education))
}

/// PUT /educations/{id}
pub async fn update_education(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut form: FormData,
) -> ApiResult<Education> {
    let repo = EducationRepository::new(state.database.clone());
    let current = repo.find_by_id(id)?.ok_or_else(|| not_found("Education"))?;
    Validator::new().required("school", &form.text("school")).finish()?;

    let logo = replace_upload(
        &state,
        form.take_file("logo"),
        &current.logo_url,
        "educations",
        "logo",
    )
    .await?;
    let education = repo
        .update(id, &education_input(&form, logo.path.clone()))?
        .ok_or_else(|| not_found("Education"))?;
    logo.cleanup(&state).await;

    state.revalidator.trigger("education", None);
    Ok(ApiResponse::ok("Education updated successfully", education))
}

/// DELETE /educations/{id}
pub async fn delete_education(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let repo = EducationRepository::new(state.database.clone());
    let education = repo.find_by_id(id)?.ok_or_else(|| not_found("Education"))?;
    repo.delete(id)?;
    state.uploads.remove_quietly(&education.logo_url).await;

    state.revalidator.trigger("education", None);
    Ok(ApiResponse::ok("Education deleted successfully", ()))
}

// =============================================================================
// Courses
// =============================================================================

fn course_input(form: &FormData, certificate_image: String) -> CourseInput {
    CourseInput {
        title: form.text("title"),
        issuer: form.text("issuer"),
        issued_at: parse_date(&form.text("issued_at")),
        expired_at: parse_date(&form.text("expired_at")),
        credential_url: form.text("credential_url"),
        certificate_image,
        description: form.text("description"),
    }
}

/// GET /courses
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Vec<Course>> {
    let courses = CourseRepository::new(state.database.clone()).list()?;
    Ok(ApiResponse::ok("List Data Courses", courses))
}

/// GET /courses/{id}
pub async fn get_course(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Course> {
    let course = CourseRepository::new(state.database.clone())
        .find_by_id(id)?
        .ok_or_else(|| not_found("Course"))?;
    Ok(ApiResponse::ok("Course Found", course))
}

/// POST /courses
pub async fn create_course(State(state): State<AppState>, mut form: FormData) -> ApiResult<Course> {
    Validator::new().required("title", &form.text("title")).finish()?;

    let image = replace_upload(
        &state,
        form.take_file("certificate_image"),
        "",
        "certificates",
        "certificate_image",
    )
    .await?;
    let course = CourseRepository::new(state.database.clone()).create(&course_input(&form, image.path))?;
    Ok(ApiResponse::created("Course created successfully", course))
}

/// PUT /courses/{id}
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut form: FormData,
) -> ApiResult<Course> {
    let repo = CourseRepository::new(state.database.clone());
    let current = repo.find_by_id(id)?.ok_or_else(|| not_found("Course"))?;
    Validator::new().required("title", &form.text("title")).finish()?;

    let image = replace_upload(
        &state,
        form.take_file("certificate_image"),
        &current.certificate_image,
        "certificates",
        "certificate_image",
    )
    .await?;
    let course = repo
        .update(id, &course_input(&form, image.path.clone()))?
        .ok_or_else(|| not_found("Course"))?;
    image.cleanup(&state).await;

    Ok(ApiResponse::ok("Course updated successfully", course))
}

/// DELETE /courses/{id}
pub async fn delete_course(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let repo = CourseRepository::new(state.database.clone());
    let course = repo.find_by_id(id)?.ok_or_else(|| not_found("Course"))?;
    repo.delete(id)?;
    state.uploads.remove_quietly(&course.certificate_image).await;
    Ok(ApiResponse::ok("Course deleted successfully", ()))
}
