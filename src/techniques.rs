//! Prompt engineering techniques as text transformations

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported prompt engineering techniques
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technique
{   ZeroShot
  , FewShot
  , ChainOfThought
  , MetaPrompting
  , SelfConsistency
  , TreeOfThought
}

impl Technique
{   pub const ALL: [Technique; 6] = [
      Technique::ZeroShot,
      Technique::FewShot,
      Technique::ChainOfThought,
      Technique::MetaPrompting,
      Technique::SelfConsistency,
      Technique::TreeOfThought,
    ];

    /// Name as shown to users
    pub fn display_name(&self) -> &'static str
    {   match self
        {   Technique::ZeroShot => "Zero-Shot"
          , Technique::FewShot => "Few-Shot"
          , Technique::ChainOfThought => "Chain-of-Thought"
          , Technique::MetaPrompting => "Meta-Prompting"
          , Technique::SelfConsistency => "Self-Consistency"
          , Technique::TreeOfThought => "Tree-of-Thought"
        }
    }

    /// Rewrite `prompt` for this technique
    pub fn transform(&self, prompt: &str) -> String
    {   match self
        {   Technique::ZeroShot => prompt.to_string()
          , Technique::FewShot => format!(
              "Example: How to make a sandwich.\n\
               Response: Start with bread, add ingredients, then close \
               the sandwich.\n\n{}",
              prompt
            )
          , Technique::ChainOfThought => {
              format!("Let's think step-by-step.\n{}", prompt)
            }
          , Technique::MetaPrompting => format!(
              "Create a new prompt based on the task requirements: {}",
              prompt
            )
          , Technique::SelfConsistency => format!(
              "Ensure the response is consistent and coherent: {}",
              prompt
            )
          , Technique::TreeOfThought => format!(
              "Consider multiple approaches:\n1. ...\n2. ...\n\n{}",
              prompt
            )
        }
    }

    pub fn explanation(&self) -> &'static str
    {   match self
        {   Technique::ZeroShot => {
              "Zero-Shot Prompting: The prompt is given to the model \
               without any examples or further instructions. The model \
               uses its general knowledge to respond directly."
            }
          , Technique::FewShot => {
              "Few-Shot Prompting: Examples are provided before the \
               prompt to guide the model's understanding and improve \
               response relevance."
            }
          , Technique::ChainOfThought => {
              "Chain-of-Thought Prompting: The prompt instructs the model \
               to articulate its reasoning process step-by-step, working \
               through each step of the problem before the final answer."
            }
          , Technique::MetaPrompting => {
              "Meta-Prompting: The prompt asks the model to generate \
               another prompt that better aligns with the task, improving \
               the specificity of the response."
            }
          , Technique::SelfConsistency => {
              "Self-Consistency Prompting: The model is instructed to give \
               outputs that are logically coherent and stable across \
               similar tasks, reducing variability in responses."
            }
          , Technique::TreeOfThought => {
              "Tree-of-Thought Prompting: The model is encouraged to \
               explore multiple paths or solutions for a problem, \
               promoting diverse outputs."
            }
        }
    }
}

impl fmt::Display for Technique
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.display_name())
    }
}

impl FromStr for Technique
{   type Err = crate::error::Error;

    /// Accepts display names ("Chain-of-Thought") and kebab/snake case
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   let wanted = normalise(s);
        Technique::ALL.iter()
          .copied()
          .find(|t| normalise(t.display_name()) == wanted)
          .ok_or_else(|| crate::error::Error::validation(
            "technique",
            format!("unknown technique: {}", s)
          ))
    }
}

fn normalise(name: &str) -> String
{   name.chars()
      .filter(|c| c.is_ascii_alphanumeric())
      .map(|c| c.to_ascii_lowercase())
      .collect()
}

/// Explanation returned when the technique name is not recognised
pub const NO_TECHNIQUE_EXPLANATION: &str = "No specific technique applied.";

/// Apply the technique named `technique` to `prompt`.
///
/// Returns `(transformed_prompt, explanation)`. Unknown names leave the
/// prompt untouched.
pub fn apply_technique(prompt: &str, technique: &str) -> (String, String)
{   match technique.parse::<Technique>()
    {   Ok(t) => (t.transform(prompt), t.explanation().to_string())
      , Err(_) => (prompt.to_string(), NO_TECHNIQUE_EXPLANATION.to_string())
    }
}

// ===== Prompt composition =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat
{   #[default]
    Text
  , Json
  , BulletPoints
}

impl fmt::Display for OutputFormat
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(match self
        {   OutputFormat::Text => "Text"
          , OutputFormat::Json => "JSON"
          , OutputFormat::BulletPoints => "Bullet Points"
        })
    }
}

impl FromStr for OutputFormat
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match normalise(s).as_str()
        {   "text" => Ok(OutputFormat::Text)
          , "json" => Ok(OutputFormat::Json)
          , "bulletpoints" | "bullets" => Ok(OutputFormat::BulletPoints)
          , _ => Err(crate::error::Error::validation(
              "output_format",
              format!("unknown output format: {}", s)
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tone
{   #[default]
    Formal
  , Casual
  , Technical
}

impl fmt::Display for Tone
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(match self
        {   Tone::Formal => "Formal"
          , Tone::Casual => "Casual"
          , Tone::Technical => "Technical"
        })
    }
}

impl FromStr for Tone
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match normalise(s).as_str()
        {   "formal" => Ok(Tone::Formal)
          , "casual" => Ok(Tone::Casual)
          , "technical" => Ok(Tone::Technical)
          , _ => Err(crate::error::Error::validation(
              "tone",
              format!("unknown tone: {}", s)
            ))
        }
    }
}

/// Presentation settings layered on top of a technique
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptOptions
{   pub output_format: OutputFormat
  , pub tone: Tone
  , /// Perspective to simulate, e.g. "Editor"
    pub role: Option<String>
  , pub thinking_step: bool
  , pub avoid_hallucinations: bool
}

/// Technique-transformed prompt with format, tone, role and guard lines
pub fn compose_prompt(
  transformed: &str
, options: &PromptOptions
) -> String
{   let mut prompt = format!(
      "{}\n\nFormat the output in {} format with a {} tone.",
      transformed, options.output_format, options.tone
    );
    if let Some(role) = options.role.as_deref().filter(|r| !r.is_empty())
    {   prompt.push_str(&format!("\n\nRole: {}.", role));
    }
    if options.thinking_step
    {   prompt.push_str(
          "\n\n### Thinking Step\n<thinking>Explain step-by-step the \
           reasoning behind the output.</thinking>"
        );
    }
    if options.avoid_hallucinations
    {   prompt.push_str(
          "\n\nIf you don't know, state 'I don't know.' Use \
           <Reference></Reference> to pull the reference you used to \
           produce an output."
        );
    }
    prompt
}

/// Human-readable summary of the settings applied to a request
pub fn describe_transformation(
  technique: Technique
, options: &PromptOptions
, temperature: f32
, top_p: f32
, max_tokens: i64
) -> String
{   let enabled = |on: bool| if on { "Enabled" } else { "Disabled" };
    format!(
      "Technique: {}\n\
       - Output Format: {}\n\
       - Tone: {}\n\
       - Temperature: {}\n\
       - Top-P: {}\n\
       - Max Length: {} tokens\n\
       - Role: {}\n\
       - Thinking Step: {}\n\
       - Avoid Hallucinations: {}",
      technique,
      options.output_format,
      options.tone,
      temperature,
      top_p,
      max_tokens,
      options.role.as_deref().unwrap_or("No Role"),
      enabled(options.thinking_step),
      enabled(options.avoid_hallucinations)
    )
}
