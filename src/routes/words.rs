//! Word collection endpoints.
//!
//! The wire contract is fixed by the UI: `GET` returns a bare array of word
//! objects (no envelope) newest first, `POST` answers `201 {"id": n}`. The
//! request body is parsed by hand so malformed JSON maps to 400 instead of
//! axum's default 422.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::db::words::{self, NewWord, WordRow};
use crate::response::AppError;
use crate::routes::storage_error;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WordResponse {
    pub id: i64,
    pub word: String,
    pub context_sentence: Option<String>,
    pub meaning: Option<String>,
    pub phonetic_us: Option<String>,
    pub phonetic_uk: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
}

impl From<WordRow> for WordResponse {
    fn from(row: WordRow) -> Self {
        Self {
            id: row.id,
            word: row.word,
            context_sentence: row.context_sentence,
            meaning: row.meaning,
            phonetic_us: row.phonetic_us,
            phonetic_uk: row.phonetic_uk,
            image_url: row.image_url,
            created_at: format_naive_iso(row.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateWordRequest {
    word: Option<String>,
    #[serde(default)]
    context_sentence: Option<String>,
    #[serde(default)]
    meaning: Option<String>,
    #[serde(default)]
    phonetic_us: Option<String>,
    #[serde(default)]
    phonetic_uk: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

pub async fn list_words(State(state): State<AppState>) -> Response {
    match words::list_words(state.db().pool()).await {
        Ok(rows) => {
            let body: Vec<WordResponse> = rows.into_iter().map(WordResponse::from).collect();
            Json(body).into_response()
        }
        Err(err) => {
            warn!(error = %err, "failed to list words");
            storage_error(err).into_response()
        }
    }
}

pub async fn create_word(State(state): State<AppState>, body: Bytes) -> Response {
    let request: CreateWordRequest = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            return AppError::bad_request(format!("请求体不是有效的 JSON: {err}")).into_response();
        }
    };

    let word = request
        .word
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if word.is_empty() {
        return AppError::validation("word 不能为空").into_response();
    }

    let new_word = NewWord {
        word,
        context_sentence: normalize_optional(request.context_sentence),
        meaning: normalize_optional(request.meaning),
        phonetic_us: normalize_optional(request.phonetic_us),
        phonetic_uk: normalize_optional(request.phonetic_uk),
        image_url: normalize_optional(request.image_url),
    };

    match words::create_word(state.db().pool(), &new_word).await {
        Ok((id, _created_at)) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(err) => {
            warn!(error = %err, "failed to create word");
            storage_error(err).into_response()
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Stored timestamps are naive UTC; render them as RFC 3339 with millisecond
/// precision and a `Z` suffix.
pub(crate) fn format_naive_iso(value: chrono::NaiveDateTime) -> String {
    chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(value, chrono::Utc)
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_naive_timestamp_with_millis_and_zulu() {
        let value = chrono::NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_milli_opt(9, 26, 53, 589)
            .unwrap();
        assert_eq!(format_naive_iso(value), "2026-03-14T09:26:53.589Z");
    }

    #[test]
    fn normalize_optional_drops_blank_strings() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(normalize_optional(None), None);
        assert_eq!(
            normalize_optional(Some("hello".to_string())),
            Some("hello".to_string())
        );
    }
}
