//! Static content loaded from JSON files

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Description and process steps for one technique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueInfo
{   pub description: String
  , #[serde(default)]
    pub process: Vec<String>
}

impl TechniqueInfo
{   /// Process steps joined by newlines, with `[PROMPT]` and
    /// `[TECHNIQUE]` placeholders filled in
    pub fn render_process(&self, prompt: &str, technique: &str) -> String
    {   self.process.join("\n")
          .replace("[PROMPT]", prompt)
          .replace("[TECHNIQUE]", technique)
    }

    /// Description followed by the rendered process
    pub fn render(&self, prompt: &str, technique: &str) -> String
    {   format!(
          "{}\n\n{}",
          self.description,
          self.render_process(prompt, technique)
        )
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error>
{   debug!("Loading {}", path.display());
    let raw = std::fs::read_to_string(path).map_err(|e| {
      error!("Failed to read {}: {}", path.display(), e);
      Error::Configuration(format!(
        "file not found or unreadable: {} ({})",
        path.display(), e
      ))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
      error!("Failed to parse {}: {}", path.display(), e);
      Error::Configuration(format!("{}: {}", path.display(), e))
    })
}

/// Technique name -> description and process
pub fn load_techniques(
  path: impl AsRef<Path>
) -> Result<BTreeMap<String, TechniqueInfo>, Error>
{   load_json(path.as_ref())
}

/// Department -> example prompts
pub fn load_prompts(
  path: impl AsRef<Path>
) -> Result<BTreeMap<String, Vec<String>>, Error>
{   load_json(path.as_ref())
}

/// Guideline name -> audio file, resolved against the JSON file's
/// directory when relative
pub fn load_guideline_audio(
  path: impl AsRef<Path>
) -> Result<BTreeMap<String, PathBuf>, Error>
{   let path = path.as_ref();
    let entries: BTreeMap<String, PathBuf> = load_json(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(entries.into_iter()
      .map(|(name, audio)| {
        let resolved = if audio.is_relative() { base.join(audio) } else { audio };
        (name, resolved)
      })
      .collect())
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::io::Write;

    fn json_file(contents: &str) -> tempfile::NamedTempFile
    {   let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn techniques_load_and_render()
    {   let file = json_file(r#"{
          "Chain-of-Thought": {
            "description": "Reason step by step.",
            "process": ["Take [PROMPT]", "Apply [TECHNIQUE]"]
          }
        }"#);
        let techniques = load_techniques(file.path()).unwrap();
        let info = &techniques["Chain-of-Thought"];
        assert_eq!(
          info.render_process("my prompt", "Chain-of-Thought"),
          "Take my prompt\nApply Chain-of-Thought"
        );
        assert!(info.render("p", "t").starts_with("Reason step by step.\n\n"));
    }

    #[test]
    fn prompts_load()
    {   let file = json_file(r#"{"HR": ["Draft a policy", "Write a job ad"]}"#);
        let prompts = load_prompts(file.path()).unwrap();
        assert_eq!(prompts["HR"].len(), 2);
    }

    #[test]
    fn guideline_audio_paths_resolve_relative_to_file()
    {   let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.json");
        std::fs::write(
          &path,
          r#"{"Fairness": "audio/fairness.mp3", "Privacy": "/abs/privacy.mp3"}"#
        ).unwrap();

        let audio = load_guideline_audio(&path).unwrap();
        assert_eq!(audio["Fairness"], dir.path().join("audio/fairness.mp3"));
        assert_eq!(audio["Privacy"], PathBuf::from("/abs/privacy.mp3"));
    }

    #[test]
    fn missing_and_malformed_files_fail()
    {   assert!(matches!(
          load_prompts("/definitely/not/here.json"),
          Err(Error::Configuration(_))
        ));
        let file = json_file("{ not json");
        assert!(matches!(
          load_techniques(file.path()),
          Err(Error::Configuration(_))
        ));
    }
}
