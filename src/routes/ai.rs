//! Passthrough endpoints for the generative-AI provider. These map request
//! and response payloads; all provider logic lives in `services::ai_provider`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::response::{json_error, AppError};
use crate::services::ai_provider::{Accent, AiError, IdentifiedWord, SubtitleSegment};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeImageRequest {
    image_data: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzeImageResponse {
    words: Vec<IdentifiedWord>,
}

#[derive(Debug, Deserialize)]
struct SpeechRequest {
    text: Option<String>,
    accent: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechResponse {
    audio_data: String,
    mime_type: String,
    sample_rate: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateImageRequest {
    prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateImageResponse {
    image_data: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeVideoRequest {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzeVideoResponse {
    segments: Vec<SubtitleSegment>,
    simulated: bool,
}

pub async fn analyze_image(State(state): State<AppState>, body: Bytes) -> Response {
    let ai = state.ai();
    if !ai.is_available() {
        return ai_unavailable().into_response();
    }

    let request: AnalyzeImageRequest = match parse_body(&body) {
        Ok(value) => value,
        Err(resp) => return resp,
    };

    let image_data = match request.image_data.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return AppError::validation("imageData 不能为空").into_response(),
    };
    if base64::engine::general_purpose::STANDARD
        .decode(image_data)
        .is_err()
    {
        return AppError::validation("imageData 不是有效的 base64").into_response();
    }

    let mime_type = request.mime_type.as_deref().unwrap_or("image/png");

    match ai.analyze_image(mime_type, image_data).await {
        Ok(words) => Json(AnalyzeImageResponse { words }).into_response(),
        Err(err) => {
            warn!(error = %err, "image analysis failed");
            upstream_error(err).into_response()
        }
    }
}

pub async fn synthesize_speech(State(state): State<AppState>, body: Bytes) -> Response {
    let ai = state.ai();
    if !ai.is_available() {
        return ai_unavailable().into_response();
    }

    let request: SpeechRequest = match parse_body(&body) {
        Ok(value) => value,
        Err(resp) => return resp,
    };

    let text = match request.text.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return AppError::validation("text 不能为空").into_response(),
    };
    let accent = match Accent::parse(request.accent.as_deref().unwrap_or("us")) {
        Some(value) => value,
        None => return AppError::validation("accent 仅支持 us 或 uk").into_response(),
    };

    match ai.synthesize_speech(text, accent).await {
        Ok(audio) => Json(SpeechResponse {
            audio_data: audio.data,
            mime_type: audio.mime_type,
            sample_rate: audio.sample_rate,
        })
        .into_response(),
        Err(err) => {
            warn!(error = %err, "speech synthesis failed");
            upstream_error(err).into_response()
        }
    }
}

pub async fn generate_image(State(state): State<AppState>, body: Bytes) -> Response {
    let ai = state.ai();
    if !ai.is_available() {
        return ai_unavailable().into_response();
    }

    let request: GenerateImageRequest = match parse_body(&body) {
        Ok(value) => value,
        Err(resp) => return resp,
    };

    let prompt = match request.prompt.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return AppError::validation("prompt 不能为空").into_response(),
    };

    match ai.generate_image(prompt).await {
        Ok(image) => Json(GenerateImageResponse {
            image_data: image.data,
            mime_type: image.mime_type,
        })
        .into_response(),
        Err(err) => {
            warn!(error = %err, "image generation failed");
            upstream_error(err).into_response()
        }
    }
}

/// Video analysis never surfaces provider failures: the provider frequently
/// cannot reach the URL, so it falls back to simulated segments marked with
/// `simulated: true`.
pub async fn analyze_video(State(state): State<AppState>, body: Bytes) -> Response {
    let ai = state.ai();
    if !ai.is_available() {
        return ai_unavailable().into_response();
    }

    let request: AnalyzeVideoRequest = match parse_body(&body) {
        Ok(value) => value,
        Err(resp) => return resp,
    };

    let url = match request.url.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return AppError::validation("url 不能为空").into_response(),
    };

    let (segments, simulated) = ai.analyze_video(url).await;
    Json(AnalyzeVideoResponse {
        segments,
        simulated,
    })
    .into_response()
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|err| {
        AppError::bad_request(format!("请求体不是有效的 JSON: {err}")).into_response()
    })
}

fn ai_unavailable() -> AppError {
    json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "AI_UNAVAILABLE",
        "AI 服务未配置",
    )
}

fn upstream_error(err: AiError) -> AppError {
    match err {
        AiError::NotConfigured(_) => ai_unavailable(),
        _ => AppError::upstream("AI 服务请求失败"),
    }
}
