//! The single entry point callers use to get a model response

use std::sync::Arc;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::completeness::ensure_complete;
use crate::completion::CompletionClient;
use crate::config::EngineConfig;
use crate::error::Error;
use crate::logging::correlation_id;
use crate::providers::{CompletionBackend, OpenAiClient};
use crate::request::GenerationRequest;
use crate::sanitizer::Sanitizer;
use crate::validator::ParameterValidator;

/// Validate, sanitize, generate, then enforce completeness
pub struct ResponseAssembler
{   validator: ParameterValidator
  , sanitizer: Sanitizer
  , client: CompletionClient
}

impl ResponseAssembler
{   pub fn new(
      config: &EngineConfig
    , backend: Arc<dyn CompletionBackend>
    ) -> Self
    {   ResponseAssembler
        {   validator: ParameterValidator::new(config.generation.clone())
          , sanitizer: Sanitizer::new(&config.sanitizer)
          , client: CompletionClient::from_config(backend, &config.retry)
        }
    }

    /// Assemble against the configured OpenAI-compatible endpoint
    pub fn from_config(config: &EngineConfig) -> Result<Self, Error>
    {   let backend = OpenAiClient::new(config.api_key(), &config.provider)?;
        Ok(ResponseAssembler::new(config, Arc::new(backend)))
    }

    /// Generated, sanitized, completeness-enforced text.
    ///
    /// An empty string means the model produced nothing; failures are
    /// always reported as `Err`.
    pub async fn get_model_response(
      &self
    , model_id: &str
    , prompt: &str
    , temperature: Option<f32>
    , top_p: Option<f32>
    , max_tokens: Option<i64>
    ) -> Result<String, Error>
    {   let request = GenerationRequest::new(model_id, prompt)
          .with_sampling(temperature, top_p)
          .with_max_tokens(max_tokens);
        self.respond(&request, &CancellationToken::new()).await
    }

    /// Same as `get_model_response`, cancellable between steps
    pub async fn respond(
      &self
    , request: &GenerationRequest
    , cancel: &CancellationToken
    ) -> Result<String, Error>
    {   let id = correlation_id();
        debug!("[{}] request for model {}", id, request.model);

        let params = self.validator
          .validate(
            Some(&request.model),
            request.temperature,
            request.top_p,
            request.max_tokens
          )
          .map_err(|e| {
            warn!("[{}] {}", id, e);
            e
          })?;
        let prompt = self.sanitizer
          .sanitize(Some(&request.prompt))
          .map_err(|e| {
            warn!("[{}] {}", id, e);
            e
          })?;
        debug!(
          "[{}] temperature={} top_p={} budget={:?}",
          id, params.temperature, params.top_p, params.token_budget
        );

        let result = self.client.complete(&params, &prompt, cancel, &id).await?;
        info!(
          "[{}] {} answered after {} attempt(s), {} retry(ies)",
          id, params.model.api_identifier, result.attempts, result.retries
        );

        Ok(ensure_complete(&result.text).trim().to_string())
    }
}
