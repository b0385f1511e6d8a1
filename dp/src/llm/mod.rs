//! LLM client module
//!
//! Provides the model-call collaborator: a provider-agnostic trait, an
//! OpenAI-compatible HTTP implementation and the request/response types.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{
    CompletionRequest, CompletionResponse, GenerationParams, Message, Role, StopReason, StreamChunk, TokenUsage,
};

use crate::config::LlmConfig;
use crate::credentials::CredentialProvider;

/// Create an LLM client based on the provider specified in config
///
/// Only OpenAI-compatible endpoints are supported; point `base-url` at any
/// server that speaks the Chat Completions protocol.
pub fn create_client(
    config: &LlmConfig,
    credentials: Arc<dyn CredentialProvider>,
) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIClient::from_config(config, credentials)?)),
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: openai",
                other
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredential;

    #[test]
    fn test_create_client_rejects_unknown_provider() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let result = create_client(&config, Arc::new(StaticCredential::new(None)));
        match result {
            Err(LlmError::InvalidResponse(msg)) => assert!(msg.contains("carrier-pigeon")),
            _ => panic!("expected unknown provider error"),
        }
    }

    #[test]
    fn test_create_client_openai() {
        let config = LlmConfig::default();
        assert!(create_client(&config, Arc::new(StaticCredential::new(None))).is_ok());
    }
}
