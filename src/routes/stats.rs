use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::db::words;
use crate::routes::storage_error;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    total_words: i64,
}

pub async fn get_stats(State(state): State<AppState>) -> Response {
    match words::count_words(state.db().pool()).await {
        Ok(total_words) => Json(StatsResponse { total_words }).into_response(),
        Err(err) => {
            warn!(error = %err, "failed to count words");
            storage_error(err).into_response()
        }
    }
}
