use std::fmt;

use crate::providers::ProviderError;

/// Custom error type for promptlab operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Caller-supplied data violates a declared constraint
    Validation
    {   field: String
      , message: String
    }
  , /// The completion dependency failed
    Api
    {   attempts: usize
      , status: Option<u16>
      , cause: ApiCause
    }
  , /// Configuration or static content could not be loaded
    Configuration(String)
  , /// Audio payload rejected before transcription
    Audio(String)
  , /// Request cancelled by the caller
    Cancelled
  , /// Generic error
    Other(String)
}

/// Why an `Error::Api` was raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCause
{   /// Every attempt in the retry budget was rate limited
    RateLimitExhausted
  , /// Non-retryable failure reported by the provider or transport
    Provider(ProviderError)
}

impl Error
{   /// Build a validation error for `field`
    pub fn validation(
      field: impl Into<String>
    , message: impl Into<String>
    ) -> Self
    {   Error::Validation
        {   field: field.into()
          , message: message.into()
        }
    }

    /// True when the retry budget ran out on rate limits
    pub fn is_exhausted(&self) -> bool
    {   matches!(
          self,
          Error::Api { cause: ApiCause::RateLimitExhausted, .. }
        )
    }

    /// Message suitable for showing to an end user.
    ///
    /// Never includes raw input or provider payloads.
    pub fn user_message(&self) -> String
    {   match self
        {   Error::Validation { field, message } => {
              format!(
                "Please check the '{}' field and try again: {}",
                field, message
              )
            }
          , Error::Api { cause: ApiCause::RateLimitExhausted, .. } => {
              "Rate limit reached. Please try again later \
               or select another model.".to_string()
            }
          , Error::Api { status: Some(401), .. } => {
              "API key issue. Please check your API key \
               configuration.".to_string()
            }
          , Error::Api { cause: ApiCause::Provider(
                ProviderError::Http(_)
              ), .. } => {
              "A network error occurred. Please check your \
               connection and try again.".to_string()
            }
          , Error::Api { .. } => {
              "An API error occurred. Please try again later.".to_string()
            }
          , Error::Configuration(_) => {
              "Please check the configuration file and ensure it is \
               properly formatted.".to_string()
            }
          , Error::Audio(msg) => {
              format!("Audio validation failed: {}", msg)
            }
          , Error::Cancelled => {
              "The request was cancelled.".to_string()
            }
          , Error::Other(_) => {
              "An unexpected error occurred. Please try again \
               later.".to_string()
            }
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::Validation { field, message } => {
              write!(f, "Validation error in '{}': {}", field, message)
            }
          , Error::Api { attempts, status: Some(code), cause } => {
              write!(f,
                "API error (status {}) after {} attempt(s): {}",
                code, attempts, cause
              )
            }
          , Error::Api { attempts, status: None, cause } => {
              write!(f,
                "API error after {} attempt(s): {}",
                attempts, cause
              )
            }
          , Error::Configuration(msg) => {
              write!(f, "Configuration error: {}", msg)
            }
          , Error::Audio(msg) => {
              write!(f, "Audio processing error: {}", msg)
            }
          , Error::Cancelled => {
              write!(f, "Request cancelled")
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl fmt::Display for ApiCause
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   ApiCause::RateLimitExhausted => {
              write!(f, "rate limit retries exhausted")
            }
          , ApiCause::Provider(err) => write!(f, "{}", err)
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
