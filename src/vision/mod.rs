pub mod analysis;
pub mod client;
pub mod provider;

pub use client::{PhotoAnalysis, VisionClient};
pub use provider::{create_provider, ImagePayload, ImageSource, TokenUsage, VisionError, VisionProvider, VisionResponse};
