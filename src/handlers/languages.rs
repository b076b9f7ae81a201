//! Language table handler

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::{
    models::{LANGUAGES, LanguageInfo},
    state::AppState,
};

/// Languages response
#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: &'static [LanguageInfo],
}

/// Supported languages, in editor order
async fn list_languages() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: LANGUAGES,
    })
}

/// Language routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/languages", get(list_languages))
}
