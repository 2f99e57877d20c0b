//! Client for the external generative-AI provider.
//!
//! Four operations are consumed as opaque request/response contracts:
//! screenshot vocabulary analysis, speech synthesis, anchor-image generation
//! and video-link subtitle analysis. The provider cannot always reach a
//! video URL, so `analyze_video` degrades to simulated segments instead of
//! failing — a product decision, the UI labels them as such.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

const DEFAULT_API_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const MAX_RETRIES: usize = 3;
const BASE_BACKOFF_MS: u64 = 200;
const DEFAULT_SAMPLE_RATE: u32 = 24_000;

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub api_endpoint: String,
    pub text_model: String,
    pub image_model: String,
    pub tts_model: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Us,
    Uk,
}

impl Accent {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "us" => Some(Accent::Us),
            "uk" => Some(Accent::Uk),
            _ => None,
        }
    }

    fn voice_name(&self) -> &'static str {
        match self {
            Accent::Us => "Kore",
            Accent::Uk => "Puck",
        }
    }
}

/// One vocabulary item identified in a screenshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifiedWord {
    pub word: String,
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default)]
    pub context_explanation: Option<String>,
    #[serde(default)]
    pub phonetic_us: Option<String>,
    #[serde(default)]
    pub phonetic_uk: Option<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
}

/// Raw synthesized audio samples; the caller wraps them in a WAV container.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub data: String,
    pub mime_type: String,
    pub sample_rate: u32,
}

#[derive(Debug, Clone)]
pub struct InlineImage {
    pub data: String,
    pub mime_type: String,
}

/// One translated subtitle segment from a video link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleSegment {
    pub time: String,
    pub text: String,
    pub translation: String,
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI provider not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyResponse,
}

#[derive(Clone)]
pub struct AiProvider {
    config: AiConfig,
    client: reqwest::Client,
}

impl AiProvider {
    pub fn new(config: AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    pub fn from_env() -> Self {
        let api_key = env_string("GEMINI_API_KEY").or_else(|| env_string("AI_API_KEY"));
        let api_endpoint = env_string("GEMINI_API_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();
        let text_model =
            env_string("AI_TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string());
        let image_model =
            env_string("AI_IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());
        let tts_model =
            env_string("AI_TTS_MODEL").unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string());
        let timeout = Duration::from_millis(env_u64("AI_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS));

        Self::new(AiConfig {
            api_key,
            api_endpoint,
            text_model,
            image_model,
            tts_model,
            timeout,
        })
    }

    pub fn is_available(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }

    /// Extracts vocabulary items from a screenshot. `image_data` is base64;
    /// the caller has already validated that it decodes.
    pub async fn analyze_image(
        &self,
        mime_type: &str,
        image_data: &str,
    ) -> Result<Vec<IdentifiedWord>, AiError> {
        let prompt = "\
You are a vocabulary tutor. Identify up to 8 English words in this screenshot \
that an intermediate learner would want to study. Respond with a JSON array \
only; each element has the keys word, meaning (Chinese translation), \
context_explanation (why the word carries this meaning in its sentence), \
phonetic_us, phonetic_uk, image_prompt (a short scene description for an \
illustrative image).";

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::text(prompt),
                    Part::inline(mime_type, image_data),
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_modalities: None,
                speech_config: None,
            }),
        };

        let response = self
            .post_with_retry(&self.config.text_model, &request)
            .await?;
        let text = response.first_text().ok_or(AiError::EmptyResponse)?;
        let words: Vec<IdentifiedWord> = serde_json::from_str(extract_json(text))?;
        Ok(words)
    }

    /// Synthesizes `text` with an accent-specific prebuilt voice. Returns
    /// raw base64 PCM samples; the caller builds the audio container.
    pub async fn synthesize_speech(
        &self,
        text: &str,
        accent: Accent,
    ) -> Result<SpeechAudio, AiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(text)],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: None,
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: accent.voice_name().to_string(),
                        },
                    },
                }),
            }),
        };

        let response = self
            .post_with_retry(&self.config.tts_model, &request)
            .await?;
        let inline = response.first_inline_data().ok_or(AiError::EmptyResponse)?;
        let sample_rate = parse_sample_rate(&inline.mime_type).unwrap_or(DEFAULT_SAMPLE_RATE);

        Ok(SpeechAudio {
            data: inline.data.clone(),
            mime_type: inline.mime_type.clone(),
            sample_rate,
        })
    }

    /// Generates an anchor image for a word from a scene prompt.
    pub async fn generate_image(&self, prompt: &str) -> Result<InlineImage, AiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            generation_config: None,
        };

        let response = self
            .post_with_retry(&self.config.image_model, &request)
            .await?;
        let inline = response.first_inline_data().ok_or(AiError::EmptyResponse)?;

        Ok(InlineImage {
            data: inline.data.clone(),
            mime_type: inline.mime_type.clone(),
        })
    }

    /// Analyzes a video link into translated subtitle segments. The provider
    /// often cannot reach the URL; any failure falls back to simulated
    /// segments flagged with `true`.
    pub async fn analyze_video(&self, url: &str) -> (Vec<SubtitleSegment>, bool) {
        match self.try_analyze_video(url).await {
            Ok(segments) if !segments.is_empty() => (segments, false),
            Ok(_) => {
                warn!(url, "video analysis returned no segments, using simulated content");
                (simulated_segments(url), true)
            }
            Err(err) => {
                warn!(url, error = %err, "video analysis failed, using simulated content");
                (simulated_segments(url), true)
            }
        }
    }

    async fn try_analyze_video(&self, url: &str) -> Result<Vec<SubtitleSegment>, AiError> {
        let prompt = format!(
            "Watch the video at {url} and transcribe the first two minutes of \
speech as subtitle segments. Respond with a JSON array only; each element \
has the keys time (mm:ss), text (original English), translation (Chinese)."
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(&prompt)],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_modalities: None,
                speech_config: None,
            }),
        };

        let response = self
            .post_with_retry(&self.config.text_model, &request)
            .await?;
        let text = response.first_text().ok_or(AiError::EmptyResponse)?;
        let segments: Vec<SubtitleSegment> = serde_json::from_str(extract_json(text))?;
        Ok(segments)
    }

    async fn post_with_retry(
        &self,
        model: &str,
        payload: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(AiError::NotConfigured("GEMINI_API_KEY"))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_endpoint, model
        );

        let mut last_error: Option<AiError> = None;

        for retry in 0..=MAX_RETRIES {
            match self
                .client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(payload)
                .send()
                .await
            {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let bytes = resp.bytes().await?;
                        match serde_json::from_slice(&bytes) {
                            Ok(v) => return Ok(v),
                            Err(e) => {
                                let body_str = String::from_utf8_lossy(&bytes);
                                tracing::error!(
                                    "failed to parse provider response JSON: {}. Body: {}",
                                    e,
                                    body_str
                                );
                                return Err(AiError::Json(e));
                            }
                        }
                    }
                    let body = resp.text().await.unwrap_or_default();
                    let err = AiError::HttpStatus { status, body };
                    if retry < MAX_RETRIES && is_retryable(status) {
                        let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
                        warn!(retry, ?status, "AI request failed, retrying");
                        sleep(backoff).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = AiError::Request(e);
                    if retry < MAX_RETRIES {
                        let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1 << retry));
                        warn!(retry, "AI request error, retrying");
                        sleep(backoff).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            }
        }
        Err(last_error.unwrap_or(AiError::NotConfigured("unknown")))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(value: &str) -> Self {
        Self {
            text: Some(value.to_string()),
            inline_data: None,
        }
    }

    fn inline(mime_type: &str, data: &str) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .parts
            .iter()
            .find_map(|part| part.text.as_deref())
    }

    fn first_inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .parts
            .iter()
            .find_map(|part| part.inline_data.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

/// Strips a Markdown code fence the model sometimes wraps JSON output in.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

fn parse_sample_rate(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .find_map(|param| param.trim().strip_prefix("rate="))
        .and_then(|rate| rate.parse().ok())
}

const SIMULATED_LINES: &[(&str, &str)] = &[
    ("Welcome back to the channel.", "欢迎回到频道。"),
    ("Today we are looking at something remarkable.", "今天我们来看一些非凡的东西。"),
    ("Let's start with a quick overview.", "我们先快速概览一下。"),
    ("This detail is easy to overlook.", "这个细节很容易被忽略。"),
    ("Notice how the pattern repeats here.", "注意这个模式在这里是如何重复的。"),
    ("That wraps up the first part.", "第一部分到此结束。"),
    ("Thanks for watching, see you next time.", "感谢观看，下次再见。"),
];

/// Plausible stand-in subtitles, deterministic for a given URL so repeated
/// requests stay stable.
fn simulated_segments(url: &str) -> Vec<SubtitleSegment> {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    let seed = hasher.finish();

    let offset = (seed % SIMULATED_LINES.len() as u64) as usize;
    let count = 5 + (seed % 3) as usize;

    (0..count)
        .map(|i| {
            let (text, translation) = SIMULATED_LINES[(offset + i) % SIMULATED_LINES.len()];
            let seconds = i as u64 * 8;
            SubtitleSegment {
                time: format!("{:02}:{:02}", seconds / 60, seconds % 60),
                text: text.to_string(),
                translation: translation.to_string(),
            }
        })
        .collect()
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn extract_json_strips_fences() {
        assert_eq!(extract_json("```json\n[1,2]\n```"), "[1,2]");
        assert_eq!(extract_json("```\n{}\n```"), "{}");
        assert_eq!(extract_json("  [1] "), "[1]");
    }

    #[test]
    fn parse_sample_rate_from_mime() {
        assert_eq!(parse_sample_rate("audio/L16;codec=pcm;rate=24000"), Some(24000));
        assert_eq!(parse_sample_rate("audio/L16; rate=16000"), Some(16000));
        assert_eq!(parse_sample_rate("audio/L16"), None);
    }

    #[test]
    fn simulated_segments_are_deterministic() {
        let a = simulated_segments("https://example.com/v/1");
        let b = simulated_segments("https://example.com/v/1");
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.time, y.time);
            assert_eq!(x.text, y.text);
        }
    }

    #[test]
    fn accent_parsing() {
        assert_eq!(Accent::parse("us"), Some(Accent::Us));
        assert_eq!(Accent::parse("uk"), Some(Accent::Uk));
        assert_eq!(Accent::parse("au"), None);
    }

    proptest! {
        #[test]
        fn simulated_segments_are_nonempty_and_ordered(url in ".{0,64}") {
            let segments = simulated_segments(&url);
            prop_assert!(!segments.is_empty());
            let times: Vec<&String> = segments.iter().map(|s| &s.time).collect();
            let mut sorted = times.clone();
            sorted.sort();
            prop_assert_eq!(times, sorted);
            for segment in &segments {
                prop_assert!(!segment.text.is_empty());
                prop_assert!(!segment.translation.is_empty());
            }
        }
    }
}
