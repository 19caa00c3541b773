//! Fixed catalog of supported models

use lazy_static::lazy_static;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How a model accepts sampling and token-budget parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFamily
{   /// Tunable temperature/top_p, budget sent as `max_tokens`
    Standard
  , /// Fixed sampling, budget sent as `max_completion_tokens`
    Reasoning
}

/// One entry in the catalog. Identity is `api_identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor
{   /// Human-readable name (e.g., "GPT-4o")
    pub display_name: String
  , /// Identifier sent to the API (e.g., "gpt-4o")
    pub api_identifier: String
  , pub family: ModelFamily
}

impl ModelDescriptor
{   pub fn is_reasoning(&self) -> bool
    {   self.family == ModelFamily::Reasoning
    }
}

const MODELS: &[(&str, &str, ModelFamily)] = &[
  ("GPT-4o", "gpt-4o", ModelFamily::Standard),
  ("GPT-4o mini", "gpt-4o-mini", ModelFamily::Standard),
  ("GPT-4 Turbo", "gpt-4-turbo", ModelFamily::Standard),
  ("GPT-4", "gpt-4", ModelFamily::Standard),
  ("GPT-3.5", "gpt-3.5-turbo", ModelFamily::Standard),
  ("o1", "o1", ModelFamily::Reasoning),
  ("o1-mini", "o1-mini", ModelFamily::Reasoning),
  ("o1-preview", "o1-preview", ModelFamily::Reasoning),
  ("o3-mini", "o3-mini", ModelFamily::Reasoning),
];

/// Read-only mapping of display names to model descriptors
#[derive(Debug, Clone)]
pub struct ModelCatalog
{   models: Vec<ModelDescriptor>
}

lazy_static!
{   static ref CATALOG: ModelCatalog = ModelCatalog::builtin();
}

/// The process-wide catalog
pub fn catalog() -> &'static ModelCatalog
{   &CATALOG
}

impl ModelCatalog
{   fn builtin() -> Self
    {   debug!("Building model catalog with {} entries", MODELS.len());
        ModelCatalog
        {   models: MODELS.iter()
              .map(|(display, id, family)| ModelDescriptor
              {   display_name: display.to_string()
                , api_identifier: id.to_string()
                , family: *family
              })
              .collect()
        }
    }

    /// All models in catalog order
    pub fn models(&self) -> &[ModelDescriptor]
    {   &self.models
    }

    /// Find a model by its API identifier
    pub fn get(&self, api_identifier: &str) -> Option<&ModelDescriptor>
    {   self.models.iter().find(|m| m.api_identifier == api_identifier)
    }

    /// Find a model by the name shown to users
    pub fn resolve_display_name(
      &self
    , display_name: &str
    ) -> Option<&ModelDescriptor>
    {   self.models.iter().find(|m| m.display_name == display_name)
    }

    /// Accept only identifiers present in the catalog, byte for byte
    pub fn validate_model_selection(
      &self
    , model_id: Option<&str>
    ) -> Result<&ModelDescriptor, Error>
    {   let model_id = model_id
          .filter(|id| !id.trim().is_empty())
          .ok_or_else(|| Error::validation("model", "no model selected"))?;

        self.get(model_id).ok_or_else(|| {
          warn!("Rejected unknown model: {}", model_id);
          Error::validation(
            "model",
            format!("invalid model selection: {}", model_id)
          )
        })
    }
}

/// Validate against the process-wide catalog
pub fn validate_model_selection(
  model_id: Option<&str>
) -> Result<&'static ModelDescriptor, Error>
{   catalog().validate_model_selection(model_id)
}
