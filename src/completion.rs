//! Completion client: continuation loop with a rate-limit retry sub-loop

use std::sync::Arc;

use log::{debug, trace, warn};
use tokio_util::sync::CancellationToken;

use crate::completeness::is_complete_sentence;
use crate::config::RetryConfig;
use crate::error::Error;
use crate::providers::{
  ChatCompletionRequest, ChatMessage, CompletionBackend, SYSTEM_INSTRUCTION,
};
use crate::request::GenerationResult;
use crate::retry::{RetryPolicy, RetryState};
use crate::sanitizer::SanitizedPrompt;
use crate::validator::{TokenBudget, ValidatedParams};

/// Issues completion calls against an injected backend
pub struct CompletionClient
{   backend: Arc<dyn CompletionBackend>
  , policy: RetryPolicy
  , max_continuations: usize
}

impl CompletionClient
{   pub fn new(
      backend: Arc<dyn CompletionBackend>
    , policy: RetryPolicy
    ) -> Self
    {   CompletionClient
        {   backend
          , policy
          , max_continuations: RetryConfig::default().max_continuations
        }
    }

    pub fn from_config(
      backend: Arc<dyn CompletionBackend>
    , config: &RetryConfig
    ) -> Self
    {   CompletionClient
        {   backend
          , policy: RetryPolicy::from_config(config)
          , max_continuations: config.max_continuations
        }
    }

    pub fn with_max_continuations(mut self, max_continuations: usize) -> Self
    {   self.max_continuations = max_continuations;
        self
    }

    pub fn policy(&self) -> &RetryPolicy
    {   &self.policy
    }

    /// Generate text for `prompt`, continuing while the output looks cut
    /// off and retrying rate limits from a budget shared by every step.
    ///
    /// `request_id` prefixes every log line of this request.
    pub async fn complete(
      &self
    , params: &ValidatedParams
    , prompt: &SanitizedPrompt
    , cancel: &CancellationToken
    , request_id: &str
    ) -> Result<GenerationResult, Error>
    {   let label = log_label(request_id, &params.model.api_identifier);
        let model = label.as_str();
        let budget = params.token_budget.value() as usize;
        let mut state = RetryState::new(&self.policy);
        let mut continuation_prompt = prompt.as_str().to_string();
        let mut continuations = 0;

        loop
        {   let request = build_request(params, &continuation_prompt);
            trace!("{}: sending {:?}", model, request);

            let chunk = state.call(
              &self.policy, cancel, model,
              || self.backend.create_chat_completion(&request)
            ).await?;
            let chunk = chunk.trim();

            let appended = state.absorb_chunk(chunk);
            debug!(
              "{}: received {} chars (appended: {})",
              model, chunk.chars().count(), appended
            );

            let words = state.accumulated_text.split_whitespace().count();
            if is_complete_sentence(&state.accumulated_text) || words >= budget
            {   break;
            }

            // a repeated chunk would resend the identical request
            if !appended
            {   debug!("{}: chunk added nothing; stopping", model);
                break;
            }

            continuation_prompt = state.accumulated_text.clone();

            // short chunk: the model stopped on its own
            let chunk_words = chunk.split_whitespace().count();
            if (chunk_words as f64) < budget as f64 / 2.0
            {   break;
            }

            continuations += 1;
            if continuations > self.max_continuations
            {   warn!(
                  "{}: stopping after {} continuation(s)",
                  model, self.max_continuations
                );
                break;
            }
            debug!("{}: continuing ({})", model, continuations);
        }

        Ok(GenerationResult
        {   is_complete: is_complete_sentence(&state.accumulated_text)
          , attempts: state.attempts_made
          , retries: state.retries
          , text: state.accumulated_text
        })
    }
}

/// Prefix for the log lines of one request
pub fn log_label(request_id: &str, model: &str) -> String
{   format!("[{}] {}", request_id, model)
}

/// Two-message exchange with family-specific parameter fields
pub fn build_request(
  params: &ValidatedParams
, content: &str
) -> ChatCompletionRequest
{   let (max_tokens, max_completion_tokens) = match params.token_budget
    {   TokenBudget::MaxTokens(n) => (Some(n), None)
      , TokenBudget::MaxCompletionTokens(n) => (None, Some(n))
    };
    ChatCompletionRequest
    {   model: params.model.api_identifier.clone()
      , messages: vec![
          ChatMessage::system(SYSTEM_INSTRUCTION)
        , ChatMessage::user(content)
        ]
      , n: 1
      , temperature: params.temperature
      , top_p: params.top_p
      , max_tokens
      , max_completion_tokens
    }
}
