use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::analysis::{build_prompt, cost_usd, parse_enrichment};
use super::provider::{create_provider, ImagePayload, ImageSource, TokenUsage, VisionError, VisionProvider};
use crate::config::VisionConfig;
use crate::db::{Enrichment, EnrichmentCandidate};

/// The result of analyzing one photo.
#[derive(Debug, Clone)]
pub struct PhotoAnalysis {
    pub enrichment: Enrichment,
    pub usage: TokenUsage,
    pub cost: f64,
}

/// Vision client that wraps a provider implementation with image loading,
/// prompting and pricing.
#[derive(Clone)]
pub struct VisionClient {
    provider: Arc<dyn VisionProvider>,
    max_dimension: u32,
    timeout: Duration,
    prompt_context: Option<String>,
    input_cost_per_mtok: f64,
    output_cost_per_mtok: f64,
}

impl VisionClient {
    /// Create a new VisionClient from configuration
    pub fn from_config(config: &VisionConfig, prompt_context: Option<String>) -> Result<Self, VisionError> {
        let provider = create_provider(config)?;
        Ok(Self::with_provider(Arc::from(provider), config, prompt_context))
    }

    pub fn with_provider(
        provider: Arc<dyn VisionProvider>,
        config: &VisionConfig,
        prompt_context: Option<String>,
    ) -> Self {
        Self {
            provider,
            max_dimension: config.max_image_dimension,
            timeout: Duration::from_secs(config.timeout_secs),
            prompt_context,
            input_cost_per_mtok: config.input_cost_per_mtok,
            output_cost_per_mtok: config.output_cost_per_mtok,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Load, prompt, parse and price one photo. Makes exactly one provider call.
    pub fn analyze_photo(&self, candidate: &EnrichmentCandidate) -> Result<PhotoAnalysis, VisionError> {
        let source = image_source(candidate)?;
        let payload = ImagePayload::load(&source, self.max_dimension, self.timeout)?;
        let prompt = build_prompt(self.prompt_context.as_deref(), &candidate.album_name);

        let response = self.provider.analyze(&payload, &prompt)?;
        let enrichment = parse_enrichment(self.provider.provider_name(), &response.text)?;
        let cost = cost_usd(&response.usage, self.input_cost_per_mtok, self.output_cost_per_mtok);

        Ok(PhotoAnalysis {
            enrichment,
            usage: response.usage,
            cost,
        })
    }
}

/// Prefer the local file; fall back to the hosted URL.
pub fn image_source(candidate: &EnrichmentCandidate) -> Result<ImageSource, VisionError> {
    if let Some(path) = candidate.local_path.as_deref().filter(|p| Path::new(p).is_file()) {
        return Ok(ImageSource::Path(path.into()));
    }
    if let Some(url) = candidate.image_url.as_deref().filter(|u| !u.is_empty()) {
        return Ok(ImageSource::Url(url.to_string()));
    }
    Err(VisionError::Image {
        location: candidate
            .local_path
            .clone()
            .unwrap_or_else(|| candidate.image_key.clone()),
        message: "no readable local file or image URL".to_string(),
    })
}
