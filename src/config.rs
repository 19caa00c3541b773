//! Configuration for the completion provider, retry policy and limits

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig
{   /// API base URL
    pub api_base: String
  , /// Transport timeout in seconds, independent of retry waits
    pub timeout_secs: u64
  , /// Environment variable holding the API key
    pub api_key_env: String
  , /// Model used by the transcription endpoint
    pub transcription_model: String
}

impl Default for ProviderConfig
{   fn default() -> Self
    {   ProviderConfig
        {   api_base: "https://api.openai.com/v1".to_string()
          , timeout_secs: 60
          , api_key_env: "OPENAI_API_KEY".to_string()
          , transcription_model: "whisper-1".to_string()
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig
{   /// Attempts allowed per request before giving up on rate limits
    pub max_attempts: usize
  , /// Wait used when the provider gives no usable hint
    pub default_wait_secs: f64
  , /// Ceiling applied to any wait
    pub max_wait_secs: f64
  , /// Upper bound on continuation steps per request
    pub max_continuations: usize
}

impl Default for RetryConfig
{   fn default() -> Self
    {   RetryConfig
        {   max_attempts: 3
          , default_wait_secs: 5.0
          , max_wait_secs: 60.0
          , max_continuations: 8
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig
{   /// Maximum prompt length in characters
    pub max_length: usize
}

impl Default for SanitizerConfig
{   fn default() -> Self
    {   SanitizerConfig
        {   max_length: 2000
        }
    }
}

/// Values used when the caller leaves a parameter out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults
{   pub default_temperature: f32
  , pub default_top_p: f32
  , pub standard_max_tokens: u32
  , pub reasoning_max_tokens: u32
}

impl Default for GenerationDefaults
{   fn default() -> Self
    {   GenerationDefaults
        {   default_temperature: 0.7
          , default_top_p: 1.0
          , standard_max_tokens: 500
          , reasoning_max_tokens: 10_000
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig
{   /// Largest payload sent to the transcription endpoint in one piece
    pub max_payload_bytes: usize
}

impl Default for AudioConfig
{   fn default() -> Self
    {   AudioConfig
        {   max_payload_bytes: 25 * 1024 * 1024
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig
{   /// Default filter when RUST_LOG is unset
    pub level: String
}

impl Default for LoggingConfig
{   fn default() -> Self
    {   LoggingConfig
        {   level: "info".to_string()
        }
    }
}

/// promptlab configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig
{   pub provider: ProviderConfig
  , pub retry: RetryConfig
  , pub sanitizer: SanitizerConfig
  , pub generation: GenerationDefaults
  , pub audio: AudioConfig
  , pub logging: LoggingConfig
}

impl EngineConfig
{   /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error>
    {   let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)
          .map_err(|e| Error::Configuration(
            format!("{}: {}", path.display(), e)
          ))?;
        let config: EngineConfig = serde_json::from_str(&raw)
          .map_err(|e| Error::Configuration(
            format!("{}: {}", path.display(), e)
          ))?;
        config.check()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults; then
    /// apply environment overrides
    pub fn load_or_default(
      path: Option<&Path>
    ) -> Result<Self, Error>
    {   let mut config = match path
        {   Some(p) => EngineConfig::load(p)?
          , None => EngineConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// `PROMPTLAB_API_BASE` and `PROMPTLAB_LOG` override file values
    pub fn apply_env_overrides(&mut self)
    {   if let Ok(base) = std::env::var("PROMPTLAB_API_BASE")
        {   debug!("API base overridden from environment");
            self.provider.api_base = base;
        }
        if let Ok(level) = std::env::var("PROMPTLAB_LOG")
        {   self.logging.level = level;
        }
    }

    /// Credential from the configured environment variable
    pub fn api_key(&self) -> Option<String>
    {   std::env::var(&self.provider.api_key_env).ok()
    }

    /// Reject values the engine cannot run with
    pub fn check(&self) -> Result<(), Error>
    {   if self.retry.max_attempts == 0
        {   return Err(Error::Configuration(
              "retry.max_attempts must be at least 1".to_string()
            ));
        }
        let waits = [self.retry.default_wait_secs, self.retry.max_wait_secs];
        if waits.iter().any(|w| !w.is_finite() || *w < 0.0)
        {   return Err(Error::Configuration(
              "retry waits must be non-negative seconds".to_string()
            ));
        }
        if self.sanitizer.max_length == 0
        {   return Err(Error::Configuration(
              "sanitizer.max_length must be positive".to_string()
            ));
        }
        Ok(())
    }
}
