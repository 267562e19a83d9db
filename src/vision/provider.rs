use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::{VisionConfig, VisionProviderType};

/// Downloads larger than this are refused.
const MAX_DOWNLOAD_BYTES: u64 = 50 * 1024 * 1024;
const MAX_OUTPUT_TOKENS: u32 = 800;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("{provider} request failed: {message}")]
    Http { provider: &'static str, message: String },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed {provider} response: {message}")]
    Malformed { provider: &'static str, message: String },

    #[error("failed to load image {location}: {message}")]
    Image { location: String, message: String },

    #[error("no API key for {provider}; set {env_var} or vision.api_key")]
    MissingApiKey { provider: &'static str, env_var: String },
}

impl VisionError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, VisionError::Status { status: 429, .. })
    }

    fn malformed(provider: &'static str, message: impl ToString) -> Self {
        VisionError::Malformed {
            provider,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub text: String,
    pub usage: TokenUsage,
}

/// Where the pixels for one photo come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
}

impl ImageSource {
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Url(url) => url.clone(),
        }
    }
}

/// A downscaled, JPEG-encoded image ready to embed in a request.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub base64: String,
    pub media_type: &'static str,
}

impl ImagePayload {
    /// Read a local file or fetch a URL, resize so neither side exceeds
    /// `max_dimension`, and re-encode as JPEG q85.
    pub fn load(source: &ImageSource, max_dimension: u32, timeout: Duration) -> Result<Self, VisionError> {
        let image_error = |message: String| VisionError::Image {
            location: source.describe(),
            message,
        };

        let img = match source {
            ImageSource::Path(path) => image::open(path).map_err(|e| image_error(e.to_string()))?,
            ImageSource::Url(url) => {
                let agent = ureq::AgentBuilder::new().timeout(timeout).build();
                let response = agent.get(url).call().map_err(|e| image_error(e.to_string()))?;
                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .take(MAX_DOWNLOAD_BYTES)
                    .read_to_end(&mut bytes)
                    .map_err(|e| image_error(e.to_string()))?;
                image::load_from_memory(&bytes).map_err(|e| image_error(e.to_string()))?
            }
        };

        Self::from_image(img, max_dimension).map_err(|e| match e {
            VisionError::Image { message, .. } => image_error(message),
            other => other,
        })
    }

    pub fn from_image(img: DynamicImage, max_dimension: u32) -> Result<Self, VisionError> {
        let (width, height) = img.dimensions();
        let img = if width > max_dimension || height > max_dimension {
            img.resize(max_dimension, max_dimension, image::imageops::FilterType::Triangle)
        } else {
            img
        };
        // JPEG has no alpha channel
        let img = DynamicImage::ImageRgb8(img.to_rgb8());

        let mut buf = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buf, 85);
        img.write_with_encoder(encoder).map_err(|e| VisionError::Image {
            location: "<memory>".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            base64: BASE64.encode(buf.into_inner()),
            media_type: "image/jpeg",
        })
    }
}

/// A vision model that answers a prompt about one image.
pub trait VisionProvider: Send + Sync {
    fn analyze(&self, image: &ImagePayload, prompt: &str) -> Result<VisionResponse, VisionError>;

    /// Stored in `ai_provider`.
    fn provider_name(&self) -> &'static str;

    fn model(&self) -> &str;
}

fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

fn send_json<T: Serialize>(
    provider: &'static str,
    request: ureq::Request,
    body: &T,
) -> Result<ureq::Response, VisionError> {
    match request.send_json(body) {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(VisionError::Status {
                provider,
                status,
                body: body.chars().take(500).collect(),
            })
        }
        Err(ureq::Error::Transport(transport)) => Err(VisionError::Http {
            provider,
            message: transport.to_string(),
        }),
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(
    provider: &'static str,
    response: ureq::Response,
) -> Result<T, VisionError> {
    response
        .into_json()
        .map_err(|e| VisionError::malformed(provider, e))
}

fn trim_endpoint(endpoint: &str) -> &str {
    endpoint.trim_end_matches('/')
}

// ============================================================================
// Anthropic Claude provider
// ============================================================================

pub struct AnthropicProvider {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum AnthropicContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image { source: AnthropicImageSource },
}

#[derive(Debug, Serialize)]
struct AnthropicImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicResponseContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponseContent {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: &str, endpoint: Option<&str>, timeout: Duration) -> Self {
        Self {
            endpoint: trim_endpoint(endpoint.unwrap_or("https://api.anthropic.com")).to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        }
    }
}

impl VisionProvider for AnthropicProvider {
    fn analyze(&self, image: &ImagePayload, prompt: &str) -> Result<VisionResponse, VisionError> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_OUTPUT_TOKENS,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: vec![
                    AnthropicContent::Image {
                        source: AnthropicImageSource {
                            source_type: "base64".to_string(),
                            media_type: image.media_type.to_string(),
                            data: image.base64.clone(),
                        },
                    },
                    AnthropicContent::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };

        let url = format!("{}/v1/messages", self.endpoint);
        let req = agent(self.timeout)
            .post(&url)
            .set("Content-Type", "application/json")
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", "2023-06-01");

        let response: AnthropicResponse = read_json(self.provider_name(), send_json(self.provider_name(), req, &request)?)?;

        let text = response
            .content
            .iter()
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            return Err(VisionError::malformed(self.provider_name(), "no text content"));
        }

        let usage = response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            })
            .unwrap_or_default();

        Ok(VisionResponse { text, usage })
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Google Gemini provider
// ============================================================================

pub struct GeminiProvider {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str, endpoint: Option<&str>, timeout: Duration) -> Self {
        Self {
            endpoint: trim_endpoint(endpoint.unwrap_or("https://generativelanguage.googleapis.com"))
                .to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        }
    }
}

impl VisionProvider for GeminiProvider {
    fn analyze(&self, image: &ImagePayload, prompt: &str) -> Result<VisionResponse, VisionError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::Text {
                        text: prompt.to_string(),
                    },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: image.media_type.to_string(),
                            data: image.base64.clone(),
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.2,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: "application/json".to_string(),
            },
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);
        let req = agent(self.timeout)
            .post(&url)
            .set("Content-Type", "application/json")
            .set("x-goog-api-key", &self.api_key);

        let response: GeminiResponse = read_json(self.provider_name(), send_json(self.provider_name(), req, &request)?)?;

        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| VisionError::malformed(self.provider_name(), "no candidates"))?;

        let usage = response
            .usage_metadata
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        Ok(VisionResponse { text, usage })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// OpenAI-compatible provider (works with OpenAI, LM Studio, and compatible APIs)
// ============================================================================

pub struct OpenAICompatibleProvider {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: Vec<OpenAIContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum OpenAIContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl OpenAICompatibleProvider {
    pub fn new(endpoint: &str, model: &str, api_key: Option<&str>, timeout: Duration) -> Self {
        Self {
            endpoint: trim_endpoint(endpoint).to_string(),
            model: model.to_string(),
            api_key: api_key.map(|s| s.to_string()),
            timeout,
        }
    }
}

impl VisionProvider for OpenAICompatibleProvider {
    fn analyze(&self, image: &ImagePayload, prompt: &str) -> Result<VisionResponse, VisionError> {
        let data_url = format!("data:{};base64,{}", image.media_type, image.base64);

        let request = OpenAIChatRequest {
            model: self.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: vec![
                    OpenAIContentPart::Text {
                        text: prompt.to_string(),
                    },
                    OpenAIContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_url },
                    },
                ],
            }],
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: 0.2,
        };

        let url = format!("{}/chat/completions", self.endpoint);
        let mut req = agent(self.timeout)
            .post(&url)
            .set("Content-Type", "application/json");
        if let Some(ref api_key) = self.api_key {
            req = req.set("Authorization", &format!("Bearer {}", api_key));
        }

        let response: OpenAIChatResponse = read_json(self.provider_name(), send_json(self.provider_name(), req, &request)?)?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| VisionError::malformed(self.provider_name(), "no choices"))?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(VisionResponse { text, usage })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Ollama provider
// ============================================================================

pub struct OllamaProvider {
    endpoint: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    images: Vec<String>,
    stream: bool,
    format: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

impl OllamaProvider {
    pub fn new(endpoint: Option<&str>, model: &str, timeout: Duration) -> Self {
        Self {
            endpoint: trim_endpoint(endpoint.unwrap_or("http://localhost:11434")).to_string(),
            model: model.to_string(),
            timeout,
        }
    }
}

impl VisionProvider for OllamaProvider {
    fn analyze(&self, image: &ImagePayload, prompt: &str) -> Result<VisionResponse, VisionError> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            images: vec![image.base64.clone()],
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.endpoint);
        let req = agent(self.timeout)
            .post(&url)
            .set("Content-Type", "application/json");

        let response: OllamaResponse = read_json(self.provider_name(), send_json(self.provider_name(), req, &request)?)?;

        Ok(VisionResponse {
            text: response.response,
            usage: TokenUsage {
                input_tokens: response.prompt_eval_count,
                output_tokens: response.eval_count,
            },
        })
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create a vision provider based on configuration
pub fn create_provider(config: &VisionConfig) -> Result<Box<dyn VisionProvider>, VisionError> {
    let model = config.effective_model();
    let timeout = Duration::from_secs(config.timeout_secs);
    let endpoint = config.endpoint.as_deref();
    let api_key = config.resolve_api_key();

    let require_key = |provider: &'static str| {
        api_key.clone().ok_or_else(|| VisionError::MissingApiKey {
            provider,
            env_var: config.api_key_env_name().unwrap_or("an API key variable").to_string(),
        })
    };

    let provider: Box<dyn VisionProvider> = match config.provider {
        VisionProviderType::Anthropic => Box::new(AnthropicProvider::new(
            &require_key("anthropic")?,
            &model,
            endpoint,
            timeout,
        )),
        VisionProviderType::Gemini => Box::new(GeminiProvider::new(
            &require_key("gemini")?,
            &model,
            endpoint,
            timeout,
        )),
        VisionProviderType::OpenAI => match endpoint {
            // Local OpenAI-compatible servers usually run without a key
            Some(custom) => Box::new(OpenAICompatibleProvider::new(custom, &model, api_key.as_deref(), timeout)),
            None => Box::new(OpenAICompatibleProvider::new(
                "https://api.openai.com/v1",
                &model,
                Some(&require_key("openai")?),
                timeout,
            )),
        },
        VisionProviderType::Ollama => Box::new(OllamaProvider::new(endpoint, &model, timeout)),
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        let limited = VisionError::Status {
            provider: "anthropic",
            status: 429,
            body: String::new(),
        };
        let server = VisionError::Status {
            provider: "anthropic",
            status: 500,
            body: String::new(),
        };
        assert!(limited.is_rate_limited());
        assert!(!server.is_rate_limited());
        assert!(!VisionError::malformed("gemini", "x").is_rate_limited());
    }

    #[test]
    fn test_payload_downscales_and_encodes_jpeg() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::new(300, 150));
        let payload = ImagePayload::from_image(img, 100).unwrap();
        assert_eq!(payload.media_type, "image/jpeg");

        let bytes = BASE64.decode(&payload.base64).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (100, 50));
    }

    #[test]
    fn test_payload_keeps_small_images() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(40, 30));
        let payload = ImagePayload::from_image(img, 1024).unwrap();
        let bytes = BASE64.decode(&payload.base64).unwrap();
        assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), (40, 30));
    }

    #[test]
    fn test_payload_missing_file() {
        let source = ImageSource::Path(PathBuf::from("/definitely/not/here.jpg"));
        let err = ImagePayload::load(&source, 512, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, VisionError::Image { .. }));
        assert!(err.to_string().contains("/definitely/not/here.jpg"));
    }

    #[test]
    fn test_factory_requires_key_for_hosted_providers() {
        let config = VisionConfig {
            provider: VisionProviderType::Gemini,
            api_key_env: Some("FOLIO_TEST_UNSET_GEMINI_KEY".to_string()),
            ..Default::default()
        };
        match create_provider(&config) {
            Err(VisionError::MissingApiKey { provider, env_var }) => {
                assert_eq!(provider, "gemini");
                assert_eq!(env_var, "FOLIO_TEST_UNSET_GEMINI_KEY");
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected a missing-key error"),
        }
    }

    #[test]
    fn test_factory_builds_keyless_providers() {
        let ollama = VisionConfig {
            provider: VisionProviderType::Ollama,
            ..Default::default()
        };
        let provider = create_provider(&ollama).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model(), "llava");

        let local = VisionConfig {
            provider: VisionProviderType::OpenAI,
            endpoint: Some("http://localhost:1234/v1/".to_string()),
            api_key_env: Some("FOLIO_TEST_UNSET_OPENAI_KEY".to_string()),
            model: "qwen2-vl".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&local).unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model(), "qwen2-vl");
    }

    #[test]
    fn test_explicit_key_wins() {
        let config = VisionConfig {
            provider: VisionProviderType::Anthropic,
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.provider_name(), "anthropic");
        assert_eq!(provider.model(), "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_gemini_request_shape() {
        let part = GeminiPart::InlineData {
            inline_data: GeminiInlineData {
                mime_type: "image/jpeg".to_string(),
                data: "AAAA".to_string(),
            },
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["inline_data"]["mime_type"], "image/jpeg");

        let config = GeminiGenerationConfig {
            temperature: 0.2,
            max_output_tokens: 10,
            response_mime_type: "application/json".to_string(),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["responseMimeType"], "application/json");
        assert_eq!(json["maxOutputTokens"], 10);
    }

    #[test]
    fn test_usage_parsing() {
        let anthropic: AnthropicResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"{}"}],"usage":{"input_tokens":1200,"output_tokens":150}}"#,
        )
        .unwrap();
        assert_eq!(anthropic.usage.unwrap().input_tokens, 1200);

        let gemini: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{}"}]}}],"usageMetadata":{"promptTokenCount":300,"candidatesTokenCount":40}}"#,
        )
        .unwrap();
        let usage = gemini.usage_metadata.unwrap();
        assert_eq!((usage.prompt_token_count, usage.candidates_token_count), (300, 40));

        let ollama: OllamaResponse = serde_json::from_str(r#"{"response":"{}","eval_count":7}"#).unwrap();
        assert_eq!(ollama.prompt_eval_count, 0);
        assert_eq!(ollama.eval_count, 7);
    }
}
