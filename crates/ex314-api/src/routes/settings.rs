use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use ex314_persist::UserSettings;

use crate::{auth::CurrentUser, error::ApiResult, state::AppState};

/// Missing fields take their defaults on write
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingsBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_font_size")]
    pub font_size: String,
    #[serde(default = "default_ai_tone")]
    pub ai_tone: String,
}

fn default_theme() -> String {
    UserSettings::default().theme
}

fn default_font_size() -> String {
    UserSettings::default().font_size
}

fn default_ai_tone() -> String {
    UserSettings::default().ai_tone
}

impl From<UserSettings> for SettingsBody {
    fn from(s: UserSettings) -> Self {
        Self {
            name: s.name,
            email: s.email,
            theme: s.theme,
            font_size: s.font_size,
            ai_tone: s.ai_tone,
        }
    }
}

impl From<SettingsBody> for UserSettings {
    fn from(s: SettingsBody) -> Self {
        Self {
            name: s.name,
            email: s.email,
            theme: s.theme,
            font_size: s.font_size,
            ai_tone: s.ai_tone,
        }
    }
}

/// The caller's settings (defaults if never saved)
#[utoipa::path(
    get,
    path = "/settings",
    responses(
        (status = 200, description = "User settings", body = SettingsBody)
    ),
    security(("bearer" = [])),
    tag = "settings"
)]
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<SettingsBody>> {
    let settings = state.persist.get_settings(&user.user_id).await?;
    Ok(Json(settings.into()))
}

/// Replace the caller's settings
#[utoipa::path(
    put,
    path = "/settings",
    request_body = SettingsBody,
    responses(
        (status = 200, description = "Saved settings", body = SettingsBody)
    ),
    security(("bearer" = [])),
    tag = "settings"
)]
pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<SettingsBody>,
) -> ApiResult<Json<SettingsBody>> {
    state
        .persist
        .save_settings(&user.user_id, body.clone().into())
        .await?;
    tracing::info!(user_id = %user.user_id, "Settings saved");

    Ok(Json(body))
}
