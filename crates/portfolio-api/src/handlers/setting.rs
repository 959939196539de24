//! Key/value site settings.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use portfolio_core::types::Setting;
use portfolio_storage::SettingRepository;

use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::not_found;

/// GET /settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<BTreeMap<String, String>> {
    let settings = SettingRepository::new(state.database.clone()).as_map()?;
    Ok(ApiResponse::ok("Settings Found", settings))
}

/// GET /settings/{key}
pub async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Setting> {
    let setting = SettingRepository::new(state.database.clone())
        .find_by_key(&key)?
        .ok_or_else(|| not_found("Setting"))?;
    Ok(ApiResponse::ok("Setting Found", setting))
}

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

/// PUT /settings - upsert every pair and return the full map.
pub async fn update_settings(
    State(state): State<AppState>,
    payload: Result<Json<SettingsRequest>, JsonRejection>,
) -> ApiResult<BTreeMap<String, String>> {
    let Json(req) = payload?;
    let repo = SettingRepository::new(state.database.clone());
    repo.upsert_many(&req.settings)?;
    let settings = repo.as_map()?;

    state.revalidator.trigger("settings", None);
    Ok(ApiResponse::ok("Settings saved successfully", settings))
}
