//! Prompt-injection filtering for free-text user input.
//!
//! Matches are replaced with [`FILTERED_MARKER`] and processing continues;
//! input is never rejected for containing an attack phrase. Over-long
//! input is truncated with [`TRUNCATION_MARKER`] so the result never
//! exceeds the configured maximum. Only empty results are rejected.

use std::fmt;

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::config::SanitizerConfig;
use crate::error::Error;
use crate::logging::preview;

pub const FILTERED_MARKER: &str = "[FILTERED]";
pub const CODE_BLOCK_MARKER: &str = "[CODE_BLOCK_FILTERED]";
pub const INLINE_CODE_MARKER: &str = "[CODE_FILTERED]";
pub const TRUNCATION_MARKER: &str = "...";

lazy_static!
{   /// Applied in order
    static ref INJECTION_PATTERNS: Vec<Regex> = [
      r"(?i)ignore\s+(?:all\s+)?(?:previous\s+)?(?:instructions?|prompts?|rules?)",
      r"(?i)system\s*:",
      r"(?i)assistant\s*:",
      r"(?i)user\s*:",
      r"(?i)act\s+as\s+(?:a\s+)?(?:different|new|another)",
      r"(?i)pretend\s+(?:to\s+be|you\s+are)",
      r"(?i)roleplay\s+as",
      r"(?i)forget\s+(?:everything|all|your)",
      r"(?i)new\s+instructions?",
      r"(?i)override\s+(?:instructions?|settings?)",
      r"(?i)jailbreak",
      r"(?i)developer\s+mode",
      r"(?i)admin\s+mode",
      r"(?i)sudo\s+mode",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid injection pattern"))
    .collect();

    static ref WHITESPACE_RUN: Regex
      = Regex::new(r"\s+").expect("valid regex");
    static ref CONTROL_CHARS: Regex
      = Regex::new(r"[\x00-\x1F\x7F-\x{9F}]").expect("valid regex");
    static ref CODE_BLOCK: Regex
      = Regex::new(r"```[\s\S]*?```").expect("valid regex");
    static ref INLINE_CODE: Regex
      = Regex::new(r"`[^`]*`").expect("valid regex");
}

/// User input after filtering. Only `Sanitizer` creates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedPrompt(String);

impl SanitizedPrompt
{   pub fn as_str(&self) -> &str
    {   &self.0
    }

    pub fn into_inner(self) -> String
    {   self.0
    }
}

impl fmt::Display for SanitizedPrompt
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(&self.0)
    }
}

/// Filters injection phrasing, control characters and code spans
#[derive(Debug, Clone)]
pub struct Sanitizer
{   max_length: usize
}

impl Default for Sanitizer
{   fn default() -> Self
    {   Sanitizer::new(&SanitizerConfig::default())
    }
}

impl Sanitizer
{   pub fn new(config: &SanitizerConfig) -> Self
    {   Sanitizer { max_length: config.max_length }
    }

    pub fn with_max_length(max_length: usize) -> Self
    {   Sanitizer { max_length }
    }

    pub fn max_length(&self) -> usize
    {   self.max_length
    }

    /// Produce a filtered copy of `raw`.
    ///
    /// Whitespace is collapsed and control characters dropped before the
    /// injection patterns run, so a phrase split by control characters
    /// cannot reassemble after filtering.
    pub fn sanitize(
      &self
    , raw: Option<&str>
    ) -> Result<SanitizedPrompt, Error>
    {   let raw = raw.ok_or_else(|| {
          Error::validation("prompt", "no prompt provided")
        })?;
        if raw.trim().is_empty()
        {   return Err(Error::validation("prompt", "prompt is empty"));
        }

        let collapsed = WHITESPACE_RUN.replace_all(raw.trim(), " ");
        let mut text = CONTROL_CHARS.replace_all(&collapsed, "").into_owned();

        let mut matches = 0;
        for pattern in INJECTION_PATTERNS.iter()
        {   let found = pattern.find_iter(&text).count();
            if found > 0
            {   matches += found;
                text = pattern.replace_all(&text, FILTERED_MARKER).into_owned();
            }
        }

        let code_blocks = CODE_BLOCK.find_iter(&text).count();
        text = CODE_BLOCK.replace_all(&text, CODE_BLOCK_MARKER).into_owned();
        let inline_code = INLINE_CODE.find_iter(&text).count();
        text = INLINE_CODE.replace_all(&text, INLINE_CODE_MARKER).into_owned();

        let mut text = text.trim().to_string();
        let truncated = text.chars().count() > self.max_length;
        if truncated
        {   text = truncate_with_marker(&text, self.max_length);
        }

        if text.is_empty()
        {   return Err(Error::validation(
              "prompt",
              "prompt is empty after sanitization"
            ));
        }

        if matches > 0
        {   warn!(
              "Filtered {} injection pattern match(es); sanitized preview: {}",
              matches, preview(&text, 50)
            );
        }
        if code_blocks + inline_code > 0 || truncated
        {   debug!(
              "Neutralized {} code span(s); truncated: {}",
              code_blocks + inline_code, truncated
            );
        }

        Ok(SanitizedPrompt(text))
    }
}

/// Cut `text` so that, marker included, it fits in `max_chars`
fn truncate_with_marker(text: &str, max_chars: usize) -> String
{   let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len
    {   return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - marker_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
