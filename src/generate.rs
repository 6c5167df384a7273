//! The image-generation collaborator.
//!
//! Everything the application knows about the hosted image model lives
//! here: the validated request, the wire format, and the mapping from
//! transport outcomes onto the application error taxonomy.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose;
use clap::ValueEnum;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::constants::{MIN_AGE, OPENAI_IMAGES_URL};
use crate::error::MandalaError;
use crate::history::ImageRef;

/// A validated submit action: the only thing that crosses from the form
/// into the generation pipeline. Never persisted, never logged.
pub struct GenerationRequest {
    /// Validated age.
    pub age: u8,
    /// Trimmed mood, casing preserved.
    pub mood: String,
    /// The credential, passed through to the image service verbatim.
    pub api_key: String,
}

impl GenerationRequest {
    /// Validates user input. Every rejection here happens before any
    /// network traffic.
    pub fn new(age: u8, mood: &str, api_key: &str, max_age: u8) -> Result<Self, MandalaError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(MandalaError::Validation(
                "an API key is required".to_string(),
            ));
        }
        let mood = mood.trim();
        if mood.is_empty() {
            return Err(MandalaError::Validation("a mood is required".to_string()));
        }
        if age < MIN_AGE || age > max_age {
            return Err(MandalaError::Validation(format!(
                "age must be between {MIN_AGE} and {max_age}"
            )));
        }
        Ok(Self {
            age,
            mood: mood.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl std::fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("age", &self.age)
            .field("mood", &self.mood)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Image sizes the images endpoint accepts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum ImageSize {
    /// 512x512 pixels.
    #[value(name = "512x512")]
    Square512,
    /// 1024x1024 pixels.
    #[default]
    #[value(name = "1024x1024")]
    Square1024,
}

impl ImageSize {
    /// The size parameter as the API spells it.
    pub fn as_wire(self) -> &'static str {
        match self {
            ImageSize::Square512 => "512x512",
            ImageSize::Square1024 => "1024x1024",
        }
    }
}

/// A successful generation result.
#[derive(Clone, Debug)]
pub struct GeneratedImage {
    /// The image, inline or hosted.
    pub image: ImageRef,
    /// The service's rewritten prompt, when it reports one.
    pub revised_prompt: Option<String>,
}

/// The remote image model, seen as an opaque function from prompt to
/// image. Implementations must not retry on failure.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Renders one image for the prompt.
    async fn generate(
        &self,
        prompt: &str,
        size: ImageSize,
        api_key: &str,
    ) -> Result<GeneratedImage, MandalaError>;
}

/// Request body for POST /v1/images/generations
/// Docs: https://platform.openai.com/docs/api-reference/images
#[derive(Serialize, Debug)]
struct ImagesGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,

    // For GPT image models.
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    output_format: Option<&'a str>,

    // For dall-e models.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct ImagesGenerateResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize, Debug)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
    revised_prompt: Option<String>,
}

/// Production [`ImageGenerator`] backed by the OpenAI Images API.
#[derive(Clone, Debug)]
pub struct OpenAiImageGenerator {
    client: reqwest::Client,
    model: String,
}

impl OpenAiImageGenerator {
    /// Creates a generator for the given image model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
        }
    }

    /// Downloads a hosted image and checks that it decodes.
    pub async fn fetch(&self, url: &Url) -> Result<Vec<u8>, MandalaError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| MandalaError::Transport(format!("image download failed: {err}")))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| MandalaError::Transport(format!("image download failed: {err}")))?;
        if !status.is_success() {
            return Err(MandalaError::Transport(format!(
                "image download returned {status}"
            )));
        }
        validate_image(&bytes)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(
        &self,
        prompt: &str,
        size: ImageSize,
        api_key: &str,
    ) -> Result<GeneratedImage, MandalaError> {
        let req_body = request_body(&self.model, prompt, size.as_wire());

        let resp = self
            .client
            .post(OPENAI_IMAGES_URL)
            .bearer_auth(api_key)
            .json(&req_body)
            .send()
            .await
            .map_err(|err| {
                MandalaError::Transport(format!("request to the image API failed: {err}"))
            })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|err| {
            MandalaError::Transport(format!("failed reading the image API response: {err}"))
        })?;
        if !status.is_success() {
            return Err(error_for_status(status, &bytes));
        }

        let parsed: ImagesGenerateResponse = serde_json::from_slice(&bytes).map_err(|err| {
            MandalaError::Transport(format!("unexpected image API response shape: {err}"))
        })?;
        let first = parsed.data.into_iter().next().ok_or_else(|| {
            MandalaError::Transport("the image API returned no image data".to_string())
        })?;
        if let Some(revised) = first.revised_prompt.as_deref() {
            debug!("Revised prompt from the image API: {revised}");
        }

        let image = if let Some(b64_json) = first.b64_json {
            let png = general_purpose::STANDARD.decode(b64_json).map_err(|err| {
                MandalaError::Transport(format!("failed to base64-decode the image: {err}"))
            })?;
            validate_image(&png)?;
            ImageRef::Png(png)
        } else if let Some(url) = first.url {
            let url = Url::parse(&url).map_err(|err| {
                MandalaError::Transport(format!("the image API returned an invalid URL: {err}"))
            })?;
            ImageRef::Url(url)
        } else {
            return Err(MandalaError::Transport(
                "image response missing b64_json and url fields".to_string(),
            ));
        };

        Ok(GeneratedImage {
            image,
            revised_prompt: first.revised_prompt,
        })
    }
}

// GPT image models always return base64, and support output_format.
// DALL-E models can return url or b64_json.
// Docs: https://platform.openai.com/docs/api-reference/images
fn request_body<'a>(model: &'a str, prompt: &'a str, size: &'a str) -> ImagesGenerateRequest<'a> {
    if model.starts_with("gpt-image") {
        ImagesGenerateRequest {
            model,
            prompt,
            n: 1,
            size,
            quality: Some("high"),
            output_format: Some("png"),
            response_format: None,
            style: None,
        }
    } else if model == "dall-e-3" {
        ImagesGenerateRequest {
            model,
            prompt,
            n: 1,
            size,
            quality: Some("hd"),
            output_format: None,
            response_format: Some("b64_json"),
            style: Some("natural"),
        }
    } else {
        // dall-e-2 etc
        ImagesGenerateRequest {
            model,
            prompt,
            n: 1,
            size,
            quality: None,
            output_format: None,
            response_format: Some("b64_json"),
            style: None,
        }
    }
}

fn error_for_status(status: StatusCode, body: &[u8]) -> MandalaError {
    let detail = body_snippet(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MandalaError::Auth(format!(
            "the image API rejected the credential ({status}): {detail}"
        )),
        StatusCode::TOO_MANY_REQUESTS => MandalaError::Quota(format!(
            "the image API reported a rate or quota limit ({status}): {detail}"
        )),
        _ => MandalaError::Transport(format!("the image API returned {status}: {detail}")),
    }
}

fn body_snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.len() > 200 {
        let mut end = 200;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    } else {
        trimmed.to_string()
    }
}

fn validate_image(bytes: &[u8]) -> Result<(), MandalaError> {
    image::load_from_memory(bytes).map(|_| ()).map_err(|err| {
        MandalaError::Transport(format!("the image payload failed to decode: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_input_is_trimmed_and_accepted() {
        let request = GenerationRequest::new(30, "  peaceful ", " sk-test ", 120)
            .expect("valid request");
        assert_eq!(request.age, 30);
        assert_eq!(request.mood, "peaceful");
        assert_eq!(request.api_key, "sk-test");
    }

    #[test]
    fn empty_mood_is_rejected_before_any_call() {
        let err = GenerationRequest::new(30, "   ", "sk-test", 120).unwrap_err();
        assert!(matches!(err, MandalaError::Validation(_)));
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let err = GenerationRequest::new(30, "peaceful", "", 120).unwrap_err();
        assert!(matches!(err, MandalaError::Validation(_)));
    }

    #[test]
    fn out_of_range_ages_are_rejected() {
        assert!(GenerationRequest::new(0, "peaceful", "sk-test", 120).is_err());
        assert!(GenerationRequest::new(121, "peaceful", "sk-test", 120).is_err());
        assert!(GenerationRequest::new(101, "peaceful", "sk-test", 100).is_err());
        assert!(GenerationRequest::new(100, "peaceful", "sk-test", 100).is_ok());
    }

    #[test]
    fn debug_output_redacts_the_credential() {
        let request = GenerationRequest::new(30, "peaceful", "sk-secret", 120)
            .expect("valid request");
        let debug = format!("{request:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn auth_statuses_map_to_auth_errors() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, b"no key"),
            MandalaError::Auth(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, b"bad key"),
            MandalaError::Auth(_)
        ));
    }

    #[test]
    fn rate_limits_map_to_quota_errors() {
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, b"slow down"),
            MandalaError::Quota(_)
        ));
    }

    #[test]
    fn other_failures_map_to_transport_errors() {
        assert!(matches!(
            error_for_status(StatusCode::INTERNAL_SERVER_ERROR, b"boom"),
            MandalaError::Transport(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, b"bad prompt"),
            MandalaError::Transport(_)
        ));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(500);
        let MandalaError::Transport(message) =
            error_for_status(StatusCode::BAD_GATEWAY, body.as_bytes())
        else {
            panic!("expected a transport error");
        };
        assert!(message.len() < 300);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn dall_e_requests_ask_for_base64() {
        let body = serde_json::to_value(request_body("dall-e-3", "a mandala", "1024x1024"))
            .expect("serializable body");
        assert_eq!(body["model"], "dall-e-3");
        assert_eq!(body["n"], 1);
        assert_eq!(body["size"], "1024x1024");
        assert_eq!(body["response_format"], "b64_json");
        assert_eq!(body["style"], "natural");
        assert!(body.get("output_format").is_none());
    }

    #[test]
    fn gpt_image_requests_use_output_format() {
        let body = serde_json::to_value(request_body("gpt-image-1.5", "a mandala", "512x512"))
            .expect("serializable body");
        assert_eq!(body["output_format"], "png");
        assert_eq!(body["quality"], "high");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn undecodable_payloads_are_transport_errors() {
        assert!(matches!(
            validate_image(b"not a png"),
            Err(MandalaError::Transport(_))
        ));
    }

    #[test]
    fn wire_sizes_match_the_api_spelling() {
        assert_eq!(ImageSize::Square512.as_wire(), "512x512");
        assert_eq!(ImageSize::Square1024.as_wire(), "1024x1024");
    }
}
