mod ai;
mod health;
mod stats;
mod words;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route(
            "/api/words",
            get(words::list_words)
                .post(words::create_word)
                .fallback(fallback_handler),
        )
        .route("/api/stats", get(stats::get_stats).fallback(fallback_handler))
        .route(
            "/api/ai/analyze-image",
            post(ai::analyze_image).fallback(fallback_handler),
        )
        .route(
            "/api/ai/speech",
            post(ai::synthesize_speech).fallback(fallback_handler),
        )
        .route(
            "/api/ai/generate-image",
            post(ai::generate_image).fallback(fallback_handler),
        )
        .route(
            "/api/ai/analyze-video",
            post(ai::analyze_video).fallback(fallback_handler),
        );

    app = app.nest("/health", health::router());
    app = app.nest("/api/health", health::router());

    app.fallback(fallback_handler).with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "接口不存在").into_response()
}

/// Maps a store failure to its HTTP error. Pool shutdown means the process
/// is draining, everything else is an internal fault.
pub(crate) fn storage_error(err: sqlx::Error) -> crate::response::AppError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            crate::response::AppError::unavailable("数据库暂不可用")
        }
        _ => crate::response::AppError::internal(err.to_string()),
    }
}
