//! Rate-limit retry policy and per-request retry state

use std::future::Future;
use std::time::Duration;

use log::{debug, error, warn};
use tokio_util::sync::CancellationToken;

use crate::config::RetryConfig;
use crate::error::{ApiCause, Error};
use crate::providers::ProviderError;

/// Retry policy for rate-limited requests
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy
{   pub max_attempts: usize
  , pub default_wait: Duration
  , pub max_wait: Duration
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_attempts: usize
    , default_wait: Duration
    , max_wait: Duration
    ) -> Self
    {   RetryPolicy
        {   max_attempts: max_attempts.max(1)
          , default_wait
          , max_wait
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self
    {   let secs = |s: f64| {
          Duration::try_from_secs_f64(s).unwrap_or(Duration::ZERO)
        };
        RetryPolicy::new(
          config.max_attempts,
          secs(config.default_wait_secs),
          secs(config.max_wait_secs)
        )
    }

    /// Wait before retrying: the provider's hint when present, the
    /// default otherwise, never more than `max_wait`
    pub fn wait_for(&self, hint: Option<Duration>) -> Duration
    {   hint.unwrap_or(self.default_wait).min(self.max_wait)
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::from_config(&RetryConfig::default())
    }
}

/// Transient state for one request: retry budget plus the text
/// accumulated across continuation steps
#[derive(Debug, Clone, PartialEq)]
pub struct RetryState
{   pub attempts_remaining: usize
  , pub attempts_made: usize
  , /// Rate limits that were followed by a wait and another attempt
    pub retries: usize
  , pub accumulated_text: String
  , pub last_wait: Option<Duration>
}

impl RetryState
{   pub fn new(policy: &RetryPolicy) -> Self
    {   RetryState
        {   attempts_remaining: policy.max_attempts
          , attempts_made: 0
          , retries: 0
          , accumulated_text: String::new()
          , last_wait: None
        }
    }

    /// Append `chunk` unless it is empty or already contained in the
    /// accumulated text. Returns whether anything was appended.
    pub fn absorb_chunk(&mut self, chunk: &str) -> bool
    {   if chunk.is_empty() || self.accumulated_text.contains(chunk)
        {   return false;
        }
        if !self.accumulated_text.is_empty()
        {   self.accumulated_text.push(' ');
        }
        self.accumulated_text.push_str(chunk);
        true
    }

    /// Spend one unit of budget on a rate limit. Returns the wait before
    /// the next attempt, or `None` once the budget is gone.
    pub fn on_rate_limited(
      &mut self
    , policy: &RetryPolicy
    , hint: Option<Duration>
    ) -> Option<Duration>
    {   self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.attempts_remaining == 0
        {   return None;
        }
        let wait = policy.wait_for(hint);
        self.retries += 1;
        self.last_wait = Some(wait);
        Some(wait)
    }

    fn exhausted(&self) -> Error
    {   Error::Api
        {   attempts: self.attempts_made
          , status: Some(429)
          , cause: ApiCause::RateLimitExhausted
        }
    }

    /// Run `call` until it succeeds, fails with a non-rate-limit error,
    /// or the shared budget runs out.
    pub async fn call<T, F, Fut>(
      &mut self
    , policy: &RetryPolicy
    , cancel: &CancellationToken
    , label: &str
    , mut call: F
    ) -> Result<T, Error>
    where
      F: FnMut() -> Fut
    , Fut: Future<Output = Result<T, ProviderError>>
    {   loop
        {   if cancel.is_cancelled()
            {   debug!("{}: cancelled before attempt", label);
                return Err(Error::Cancelled);
            }

            self.attempts_made += 1;
            match call().await
            {   Ok(value) => return Ok(value)
              , Err(err) if err.is_rate_limit() => {
                  match self.on_rate_limited(policy, err.retry_after())
                  {   Some(wait) => {
                        warn!(
                          "{}: rate limited, retrying in {:.1}s \
                           ({} attempt(s) left)",
                          label, wait.as_secs_f64(), self.attempts_remaining
                        );
                        sleep_or_cancel(wait, cancel).await?;
                      }
                    , None => {
                        error!(
                          "{}: rate limit persisted after {} attempt(s)",
                          label, self.attempts_made
                        );
                        return Err(self.exhausted());
                      }
                  }
                }
              , Err(err) => {
                  error!("{}: {}", label, err);
                  return Err(Error::Api
                  {   attempts: self.attempts_made
                    , status: err.status()
                    , cause: ApiCause::Provider(err)
                  });
                }
            }
        }
    }
}

/// One retried call with its own budget
pub async fn run_with_retry<T, F, Fut>(
  policy: &RetryPolicy
, cancel: &CancellationToken
, label: &str
, call: F
) -> Result<T, Error>
where
  F: FnMut() -> Fut
, Fut: Future<Output = Result<T, ProviderError>>
{   RetryState::new(policy).call(policy, cancel, label, call).await
}

/// Sleep for `wait` unless `cancel` fires first
pub async fn sleep_or_cancel(
  wait: Duration
, cancel: &CancellationToken
) -> Result<(), Error>
{   tokio::select!
    {   _ = cancel.cancelled() => Err(Error::Cancelled)
      , _ = tokio::time::sleep(wait) => Ok(())
    }
}
