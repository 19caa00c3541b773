//! Request and result types for a single generation

use serde::{Deserialize, Serialize};

/// What a caller asks for. Parameters left as `None` take the
/// model family's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest
{   /// API identifier from the model catalog
    pub model: String
  , /// Raw, unsanitized prompt text
    pub prompt: String
  , pub temperature: Option<f32>
  , pub top_p: Option<f32>
  , pub max_tokens: Option<i64>
}

impl GenerationRequest
{   pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self
    {   GenerationRequest
        {   model: model.into()
          , prompt: prompt.into()
          , temperature: None
          , top_p: None
          , max_tokens: None
        }
    }

    pub fn with_sampling(
      mut self
    , temperature: Option<f32>
    , top_p: Option<f32>
    ) -> Self
    {   self.temperature = temperature;
        self.top_p = top_p;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<i64>) -> Self
    {   self.max_tokens = max_tokens;
        self
    }
}

/// Text produced by the completion loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult
{   /// Accumulated generated text
    pub text: String
  , /// Whether the text already ends in terminal punctuation
    pub is_complete: bool
  , /// Completion calls issued, including rate-limited ones
    pub attempts: usize
  , /// Rate-limit retries consumed
    pub retries: usize
}
