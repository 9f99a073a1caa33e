use std::path::Path;

use axum::extract::State;
use axum::response::Html;

use crate::AppState;
use crate::error::{AppError, AppResult};

pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let path = Path::new(&state.config.static_dir).join("index.html");
    let page = tokio::fs::read_to_string(&path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Landing page unavailable");
        AppError::NotFound("landing page".to_string())
    })?;

    Ok(Html(page))
}
