//! Experiences and projects, each with an ordered image gallery.

use axum::extract::{Path, State};

use portfolio_core::slug::slugify;
use portfolio_core::types::{Experience, ExperienceInput, GalleryImage, Project, ProjectInput};
use portfolio_storage::{ExperienceRepository, ProjectRepository};

use crate::error::ApiError;
use crate::form::{FilePart, FormData};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validate::{parse_date, Validator};

use super::{not_found, store_upload};

/// Store gallery files in order. On failure, files already written are removed.
async fn store_gallery(
    state: &AppState,
    files: Vec<FilePart>,
    folder: &str,
) -> Result<Vec<String>, ApiError> {
    let mut paths = Vec::with_capacity(files.len());
    for file in files {
        match store_upload(state, file, folder, "images").await {
            Ok(path) => paths.push(path),
            Err(e) => {
                remove_all(state, &paths).await;
                return Err(e);
            }
        }
    }
    Ok(paths)
}

async fn remove_all(state: &AppState, paths: &[String]) {
    for path in paths {
        state.uploads.remove_quietly(path).await;
    }
}

// =============================================================================
// Experiences
// =============================================================================

fn experience_input(form: &FormData) -> Result<ExperienceInput, ApiError> {
    Validator::new()
        .required("company", &form.text("company"))
        .required("role", &form.text("role"))
        .finish()?;
    let is_current = form.flag("is_current");
    Ok(ExperienceInput {
        company: form.text("company"),
        role: form.text("role"),
        location: form.text("location"),
        start_date: parse_date(&form.text("start_date")),
        end_date: if is_current {
            None
        } else {
            parse_date(&form.text("end_date"))
        },
        is_current,
        description: form.text("description"),
    })
}

/// GET /experiences
pub async fn list_experiences(State(state): State<AppState>) -> ApiResult<Vec<Experience>> {
    let experiences = ExperienceRepository::new(state.database.clone()).list()?;
    Ok(ApiResponse::ok("List Data Experiences", experiences))
}

/// GET /experiences/{id}
pub async fn get_experience(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Experience> {
    let experience = ExperienceRepository::new(state.database.clone())
        .find_by_id(id)?
        .ok_or_else(|| not_found("Experience"))?;
    Ok(ApiResponse::ok("Experience Found", experience))
}

/// POST /experiences
pub async fn create_experience(
    State(state): State<AppState>,
    mut form: FormData,
) -> ApiResult<Experience> {
    let input = experience_input(&form)?;
    let images = store_gallery(&state, form.take_files("images"), "experiences").await?;

    let experience = match ExperienceRepository::new(state.database.clone()).create(&input, &images)
    {
        Ok(experience) => experience,
        Err(e) => {
            remove_all(&state, &images).await;
            return Err(e.into());
        }
    };
    Ok(ApiResponse::created("Experience created successfully", experience))
}

/// PUT /experiences/{id}
pub async fn update_experience(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    form: FormData,
) -> ApiResult<Experience> {
    let input = experience_input(&form)?;
    let experience = ExperienceRepository::new(state.database.clone())
        .update(id, &input)?
        .ok_or_else(|| not_found("Experience"))?;
    Ok(ApiResponse::ok("Experience updated successfully", experience))
}

/// DELETE /experiences/{id}
pub async fn delete_experience(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let repo = ExperienceRepository::new(state.database.clone());
    let experience = repo.find_by_id(id)?.ok_or_else(|| not_found("Experience"))?;
    repo.delete(id)?;
    for image in &experience.images {
        state.uploads.remove_quietly(&image.image_url).await;
    }
    Ok(ApiResponse::ok("Experience deleted successfully", ()))
}

/// POST /experiences/{id}/images
pub async fn add_experience_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut form: FormData,
) -> ApiResult<GalleryImage> {
    let repo = ExperienceRepository::new(state.database.clone());
    repo.find_by_id(id)?.ok_or_else(|| not_found("Experience"))?;
    let file = form
        .take_file("image")
        .ok_or_else(|| ApiError::field("image", "image is required"))?;

    let path = store_upload(&state, file, "experiences", "image").await?;
    let image = match repo.add_image(id, &path) {
        Ok(image) => image,
        Err(e) => {
            state.uploads.remove_quietly(&path).await;
            return Err(e.into());
        }
    };
    Ok(ApiResponse::created("Image added successfully", image))
}

/// DELETE /experiences/{id}/images/{image_id}
pub async fn delete_experience_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(i64, i64)>,
) -> ApiResult<()> {
    let repo = ExperienceRepository::new(state.database.clone());
    let image = repo
        .find_image(id, image_id)?
        .ok_or_else(|| not_found("Image"))?;
    repo.delete_image(image.id)?;
    state.uploads.remove_quietly(&image.image_url).await;
    Ok(ApiResponse::ok("Image deleted successfully", ()))
}

// =============================================================================
// Projects
// =============================================================================

fn project_input(form: &FormData) -> Result<ProjectInput, ApiError> {
    let title = form.text("title");
    let slug = slugify(&title);
    Validator::new()
        .required("title", &title)
        .check(
            "title",
            !slug.is_empty(),
            "title must contain letters or digits",
        )
        .finish()?;
    Ok(ProjectInput {
        title,
        slug,
        description: form.text("description"),
        platform: form.text("platform"),
        url: form.text("url"),
        tech_stacks: form.list("tech_stacks"),
    })
}

/// GET /projects
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Vec<Project>> {
    let projects = ProjectRepository::new(state.database.clone()).list()?;
    Ok(ApiResponse::ok("List Data Projects", projects))
}

/// GET /projects/{slug}
pub async fn get_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Project> {
    let project = ProjectRepository::new(state.database.clone())
        .find_by_slug(&slug)?
        .ok_or_else(|| not_found("Project"))?;
    Ok(ApiResponse::ok("Project Found", project))
}

/// POST /projects
pub async fn create_project(
    State(state): State<AppState>,
    mut form: FormData,
) -> ApiResult<Project> {
    let input = project_input(&form)?;
    let images = store_gallery(&state, form.take_files("images"), "projects").await?;

    let project = match ProjectRepository::new(state.database.clone()).create(&input, &images) {
        Ok(project) => project,
        Err(e) => {
            remove_all(&state, &images).await;
            return Err(e.into());
        }
    };

    state.revalidator.trigger("project", Some(&project.slug));
    Ok(ApiResponse::created("Project created successfully", project))
}

/// PUT /projects/{id}
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    form: FormData,
) -> ApiResult<Project> {
    let input = project_input(&form)?;
    let project = ProjectRepository::new(state.database.clone())
        .update(id, &input)?
        .ok_or_else(|| not_found("Project"))?;

    state.revalidator.trigger("project", Some(&project.slug));
    Ok(ApiResponse::ok("Project updated successfully", project))
}

/// DELETE /projects/{id}
pub async fn delete_project(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let repo = ProjectRepository::new(state.database.clone());
    let project = repo.find_by_id(id)?.ok_or_else(|| not_found("Project"))?;
    repo.delete(id)?;
    for image in &project.images {
        state.uploads.remove_quietly(&image.image_url).await;
    }

    state.revalidator.trigger("project", None);
    Ok(ApiResponse::ok("Project deleted successfully", ()))
}

/// POST /projects/{id}/images
pub async fn add_project_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut form: FormData,
) -> ApiResult<GalleryImage> {
    let repo = ProjectRepository::new(state.database.clone());
    repo.find_by_id(id)?.ok_or_else(|| not_found("Project"))?;
    let file = form
        .take_file("image")
        .ok_or_else(|| ApiError::field("image", "image is required"))?;

    let path = store_upload(&state, file, "projects", "image").await?;
    let image = match repo.add_image(id, &path) {
        Ok(image) => image,
        Err(e) => {
            state.uploads.remove_quietly(&path).await;
            return Err(e.into());
        }
    };
    Ok(ApiResponse::created("Image added successfully", image))
}

/// DELETE /projects/{id}/images/{image_id}
pub async fn delete_project_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(i64, i64)>,
) -> ApiResult<()> {
    let repo = ProjectRepository::new(state.database.clone());
    let image = repo
        .find_image(id, image_id)?
        .ok_or_else(|| not_found("Image"))?;
    repo.delete_image(image.id)?;
    state.uploads.remove_quietly(&image.image_url).await;
    Ok(ApiResponse::ok("Image deleted successfully", ()))
}
