//! Parameter validation and model-family adaptation

use std::ops::RangeInclusive;

use log::debug;

use crate::catalog::{self, ModelDescriptor, ModelFamily};
use crate::config::GenerationDefaults;
use crate::error::Error;

/// API-level bounds
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=2.0;
pub const TOP_P_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// Sampling value reasoning models are pinned to
pub const REASONING_SAMPLING: f32 = 1.0;

/// Token budget, tagged with the field it travels in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenBudget
{   /// Sent as `max_tokens`
    MaxTokens(u32)
  , /// Sent as `max_completion_tokens`
    MaxCompletionTokens(u32)
}

impl TokenBudget
{   pub fn value(&self) -> u32
    {   match self
        {   TokenBudget::MaxTokens(n) => *n
          , TokenBudget::MaxCompletionTokens(n) => *n
        }
    }
}

/// Parameters ready to be put on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedParams
{   pub model: ModelDescriptor
  , pub temperature: f32
  , pub top_p: f32
  , pub token_budget: TokenBudget
}

/// Checks caller parameters against declared bounds
#[derive(Debug, Clone, Default)]
pub struct ParameterValidator
{   defaults: GenerationDefaults
}

impl ParameterValidator
{   pub fn new(defaults: GenerationDefaults) -> Self
    {   ParameterValidator { defaults }
    }

    /// Validate and resolve parameters for one request.
    ///
    /// Reasoning models silently ignore `temperature` and `top_p`: both
    /// are pinned to 1.0 and the budget moves to `max_completion_tokens`.
    pub fn validate(
      &self
    , model_id: Option<&str>
    , temperature: Option<f32>
    , top_p: Option<f32>
    , max_tokens: Option<i64>
    ) -> Result<ValidatedParams, Error>
    {   let model = catalog::validate_model_selection(model_id)?.clone();

        let budget = match max_tokens
        {   Some(n) if n <= 0 => {
              return Err(Error::validation(
                "max_tokens",
                format!("must be greater than 0 (got {})", n)
              ));
            }
          , Some(n) => u32::try_from(n).map_err(|_| Error::validation(
              "max_tokens",
              format!("must not exceed {} (got {})", u32::MAX, n)
            ))?
          , None => match model.family
            {   ModelFamily::Standard => self.defaults.standard_max_tokens
              , ModelFamily::Reasoning => self.defaults.reasoning_max_tokens
            }
        };

        match model.family
        {   ModelFamily::Reasoning => {
              if temperature.is_some() || top_p.is_some()
              {   debug!(
                    "{} uses fixed sampling; ignoring caller values",
                    model.api_identifier
                  );
              }
              Ok(ValidatedParams
              {   model
                , temperature: REASONING_SAMPLING
                , top_p: REASONING_SAMPLING
                , token_budget: TokenBudget::MaxCompletionTokens(budget)
              })
            }
          , ModelFamily::Standard => {
              let temperature = check_range(
                "temperature",
                temperature.unwrap_or(self.defaults.default_temperature),
                &TEMPERATURE_RANGE
              )?;
              let top_p = check_range(
                "top_p",
                top_p.unwrap_or(self.defaults.default_top_p),
                &TOP_P_RANGE
              )?;
              Ok(ValidatedParams
              {   model
                , temperature
                , top_p
                , token_budget: TokenBudget::MaxTokens(budget)
              })
            }
        }
    }
}

fn check_range(
  field: &str
, value: f32
, range: &RangeInclusive<f32>
) -> Result<f32, Error>
{   if range.contains(&value)
    {   Ok(value)
    } else
    {   Err(Error::validation(
          field,
          format!(
            "must be between {} and {} (got {})",
            range.start(), range.end(), value
          )
        ))
    }
}

/// Tighter rule applied by interactive front ends before calling the
/// core: temperature and top_p in [0, 1], max_tokens in [1, 1000].
pub fn check_interface_bounds(
  temperature: f32
, top_p: f32
, max_tokens: i64
) -> Result<(), Error>
{   check_range("temperature", temperature, &(0.0..=1.0))?;
    check_range("top_p", top_p, &TOP_P_RANGE)?;
    if !(1..=1000).contains(&max_tokens)
    {   return Err(Error::validation(
          "max_tokens",
          format!("must be between 1 and 1000 (got {})", max_tokens)
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests
{   use super::*;

    fn field_of(result: Result<ValidatedParams, Error>) -> String
    {   match result
        {   Err(Error::Validation { field, .. }) => field
          , other => panic!("expected validation error, got {:?}", other)
        }
    }

    #[test]
    fn standard_model_keeps_caller_values()
    {   let params = ParameterValidator::default()
          .validate(Some("gpt-4o"), Some(0.5), Some(0.9), Some(100))
          .unwrap();
        assert_eq!(params.temperature, 0.5);
        assert_eq!(params.top_p, 0.9);
        assert_eq!(params.token_budget, TokenBudget::MaxTokens(100));
    }

    #[test]
    fn standard_defaults_fill_gaps()
    {   let params = ParameterValidator::default()
          .validate(Some("gpt-3.5-turbo"), None, None, None)
          .unwrap();
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.top_p, 1.0);
        assert_eq!(params.token_budget, TokenBudget::MaxTokens(500));
    }

    #[test]
    fn core_accepts_wide_temperature_range()
    {   let validator = ParameterValidator::default();
        assert!(validator.validate(Some("gpt-4o"), Some(2.0), None, None).is_ok());
        assert!(validator.validate(Some("gpt-4o"), Some(0.0), None, None).is_ok());
    }

    #[test]
    fn reasoning_model_pins_sampling_and_moves_budget()
    {   let validator = ParameterValidator::default();
        for (temperature, top_p) in [(Some(0.2), Some(0.3)), (None, None),
                                     (Some(1.9), Some(0.0))]
        {   let params = validator
              .validate(Some("o1-mini"), temperature, top_p, Some(100))
              .unwrap();
            assert_eq!(params.temperature, 1.0);
            assert_eq!(params.top_p, 1.0);
            assert_eq!(
              params.token_budget,
              TokenBudget::MaxCompletionTokens(100)
            );
        }

        let params = validator
          .validate(Some("o3-mini"), None, None, None)
          .unwrap();
        assert_eq!(
          params.token_budget,
          TokenBudget::MaxCompletionTokens(10_000)
        );
    }

    #[test]
    fn offending_field_is_named()
    {   let validator = ParameterValidator::default();
        assert_eq!(
          field_of(validator.validate(Some("nope"), None, None, None)),
          "model"
        );
        assert_eq!(
          field_of(validator.validate(Some("gpt-4o"), Some(2.5), None, None)),
          "temperature"
        );
        assert_eq!(
          field_of(validator.validate(Some("gpt-4o"), Some(-0.1), None, None)),
          "temperature"
        );
        assert_eq!(
          field_of(validator.validate(Some("gpt-4o"), Some(f32::NAN), None, None)),
          "temperature"
        );
        assert_eq!(
          field_of(validator.validate(Some("gpt-4o"), None, Some(1.5), None)),
          "top_p"
        );
        assert_eq!(
          field_of(validator.validate(Some("gpt-4o"), None, None, Some(0))),
          "max_tokens"
        );
        assert_eq!(
          field_of(validator.validate(Some("o1"), None, None, Some(-5))),
          "max_tokens"
        );
    }

    #[test]
    fn interface_bounds_are_tighter()
    {   assert!(check_interface_bounds(0.7, 1.0, 150).is_ok());
        assert!(check_interface_bounds(1.5, 1.0, 150).is_err());
        assert!(check_interface_bounds(0.7, 1.0, 1001).is_err());
        assert!(check_interface_bounds(0.7, 1.0, 0).is_err());
    }
}
