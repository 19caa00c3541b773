use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, trace, error};
use regex::Regex;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::providers::{
  AudioPayload, ChatCompletionRequest, ChatCompletionResponse,
  CompletionBackend, ProviderError, TranscriptionBackend,
};

// ===== Error Body Types =====

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorBody
{   error: ApiErrorDetail
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorDetail
{   #[serde(default)]
    message: String
  , #[serde(default, rename = "type")]
    kind: Option<String>
  , #[serde(default)]
    code: Option<String>
}

// ===== OpenAI-compatible client =====

/// HTTP client for an OpenAI-compatible API.
///
/// Constructed explicitly with its credential; nothing is read from
/// process-wide state after construction.
pub struct OpenAiClient
{   api_key: Option<String>
  , api_key_env: String
  , api_base: String
  , transcription_model: String
  , http_client: reqwest::Client
}

impl OpenAiClient
{   /// Create a client with its own transport timeout
    pub fn new(
      api_key: Option<String>
    , config: &ProviderConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating OpenAiClient for {}", config.api_base);
        let http_client = reqwest::Client::builder()
          .timeout(Duration::from_secs(config.timeout_secs))
          .build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            crate::error::Error::Configuration(e.to_string())
          })?;

        Ok(OpenAiClient
        {   api_key
          , api_key_env: config.api_key_env.clone()
          , api_base: config.api_base.trim_end_matches('/').to_string()
          , transcription_model: config.transcription_model.clone()
          , http_client
        })
    }

    /// Create a client whose credential comes from the configured
    /// environment variable
    pub fn from_config(
      config: &ProviderConfig
    ) -> Result<Self, crate::error::Error>
    {   let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none()
        {   debug!("{} not set; calls will fail", config.api_key_env);
        }
        OpenAiClient::new(api_key, config)
    }

    fn get_api_key(&self) -> Result<&str, ProviderError>
    {   self.api_key.as_deref()
          .filter(|k| !k.is_empty())
          .ok_or_else(|| {
            error!("No API key available");
            ProviderError::MissingApiKey(self.api_key_env.clone())
          })
    }

    async fn failure_from(
      response: reqwest::Response
    ) -> ProviderError
    {   let status = response.status().as_u16();
        let retry_after = retry_after_header(response.headers());
        let body = response.text().await
          .unwrap_or_else(|_|
            "Unknown error".to_string()
          );
        error!("API returned status {}", status);
        trace!("Error body: {}", body);
        classify_failure(status, retry_after, &body)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient
{   async fn create_chat_completion(
      &self
    , request: &ChatCompletionRequest
    ) -> Result<String, ProviderError>
    {   debug!("Sending chat completion for: {}", request.model);
        let api_key = self.get_api_key()?;
        trace!("Chat request: {:?}", request);

        let response = self.http_client
          .post(format!("{}/chat/completions", self.api_base))
          .bearer_auth(api_key)
          .json(request)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            ProviderError::Http(e.to_string())
          })?;

        let status = response.status();
        trace!("Chat response status: {}", status);

        if !status.is_success()
        {   return Err(OpenAiClient::failure_from(response).await);
        }

        let chat_response: ChatCompletionResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            ProviderError::Parse(e.to_string())
          })?;

        chat_response.into_content()
    }
}

#[async_trait]
impl TranscriptionBackend for OpenAiClient
{   async fn transcribe(
      &self
    , audio: &AudioPayload
    ) -> Result<String, ProviderError>
    {   debug!(
          "Sending {} bytes for transcription",
          audio.bytes.len()
        );
        let api_key = self.get_api_key()?;

        let file = reqwest::multipart::Part::bytes(audio.bytes.clone())
          .file_name(audio.file_name.clone());
        let form = reqwest::multipart::Form::new()
          .text("model", self.transcription_model.clone())
          .text("response_format", "text")
          .part("file", file);

        let response = self.http_client
          .post(format!("{}/audio/transcriptions", self.api_base))
          .bearer_auth(api_key)
          .multipart(form)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            ProviderError::Http(e.to_string())
          })?;

        if !response.status().is_success()
        {   return Err(OpenAiClient::failure_from(response).await);
        }

        response.text().await.map_err(|e| {
          error!("Failed to read transcription: {}", e);
          ProviderError::Parse(e.to_string())
        })
    }
}

/// Read `retry-after-ms` or `retry-after` (seconds) from a response
fn retry_after_header(
  headers: &reqwest::header::HeaderMap
) -> Option<Duration>
{   let read = |name: &str| {
      headers.get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
    };
    read("retry-after-ms")
      .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
      .or_else(|| {
        read(reqwest::header::RETRY_AFTER.as_str())
          .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
      })
}

/// Decide whether a failed call is a rate limit.
///
/// Structured signals win: the provider error code, then the 429
/// status. Message sniffing is only consulted when neither applies.
pub(crate) fn classify_failure(
  status: u16
, retry_after: Option<Duration>
, body: &str
) -> ProviderError
{   let detail = serde_json::from_str::<ApiErrorBody>(body)
      .ok()
      .map(|b| b.error);
    let message = detail.as_ref()
      .map(|d| d.message.clone())
      .filter(|m| !m.is_empty())
      .unwrap_or_else(|| body.trim().to_string());
    let code = detail.as_ref()
      .and_then(|d| d.code.clone().or_else(|| d.kind.clone()));

    let rate_limited = match code.as_deref()
    {   Some("rate_limit_exceeded") => true
      , Some("insufficient_quota") => false
      , _ if status == 429 => true
      , _ => mentions_rate_limit(&message)
    };

    if rate_limited
    {   ProviderError::RateLimited
        {   retry_after: retry_after
              .or_else(|| parse_wait_hint(&message))
          , message
        }
    } else
    {   ProviderError::Status
        {   code: status
          , message
        }
    }
}

// ===== Last-resort message sniffing =====

lazy_static!
{   static ref RATE_LIMIT_TEXT: Regex
      = Regex::new(r"(?i)rate[\s_]limit").expect("valid regex");
    static ref WAIT_HINT: Regex
      = Regex::new(r"(?i)try again in (\d+(?:\.\d+)?)(ms|s|m)\b")
        .expect("valid regex");
}

fn mentions_rate_limit(message: &str) -> bool
{   RATE_LIMIT_TEXT.is_match(message)
}

/// Pull "try again in 1.5s" style hints out of an error message
pub(crate) fn parse_wait_hint(message: &str) -> Option<Duration>
{   let captures = WAIT_HINT.captures(message)?;
    let amount: f64 = captures.get(1)?.as_str().parse().ok()?;
    let secs = match captures.get(2)?.as_str().to_ascii_lowercase().as_str()
    {   "ms" => amount / 1000.0
      , "m" => amount * 60.0
      , _ => amount
    };
    Duration::try_from_secs_f64(secs).ok()
}
