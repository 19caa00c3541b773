//! Speech-to-text for spoken prompts

use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::Error;
use crate::providers::{AudioPayload, TranscriptionBackend};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::sanitizer::{SanitizedPrompt, Sanitizer};

/// Transcribes audio and sanitizes the resulting text
pub struct Transcriber
{   backend: Arc<dyn TranscriptionBackend>
  , policy: RetryPolicy
  , sanitizer: Sanitizer
  , max_payload_bytes: usize
}

impl Transcriber
{   pub fn new(
      config: &EngineConfig
    , backend: Arc<dyn TranscriptionBackend>
    ) -> Self
    {   Transcriber
        {   backend
          , policy: RetryPolicy::from_config(&config.retry)
          , sanitizer: Sanitizer::new(&config.sanitizer)
          , max_payload_bytes: config.audio.max_payload_bytes
        }
    }

    /// Read an audio file from disk into a payload
    pub async fn read_file(path: impl AsRef<Path>) -> Result<AudioPayload, Error>
    {   let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
          Error::Audio(format!("cannot read {}: {}", path.display(), e))
        })?;
        let file_name = path.file_name()
          .map(|n| n.to_string_lossy().into_owned())
          .unwrap_or_else(|| "audio.mp3".to_string());
        Ok(AudioPayload { file_name, bytes })
    }

    /// Transcribe `audio`, splitting it in two when it exceeds the
    /// payload limit or the endpoint rejects it as too large
    pub async fn transcribe(
      &self
    , audio: AudioPayload
    , cancel: &CancellationToken
    ) -> Result<SanitizedPrompt, Error>
    {   if audio.bytes.is_empty()
        {   return Err(Error::Audio("empty audio file".to_string()));
        }

        let text = if audio.bytes.len() > self.max_payload_bytes
        {   warn!(
              "Audio is {} bytes (limit {}); splitting in two",
              audio.bytes.len(), self.max_payload_bytes
            );
            self.transcribe_halves(&audio, cancel).await?
        } else
        {   match self.transcribe_piece(&audio, cancel).await
            {   Err(Error::Api { status: Some(413), .. }) => {
                  warn!("Endpoint rejected payload size; splitting in two");
                  self.transcribe_halves(&audio, cancel).await?
                }
              , other => other?
            }
        };

        info!("Transcribed {} bytes of audio", audio.bytes.len());
        self.sanitizer.sanitize(Some(&text))
    }

    async fn transcribe_piece(
      &self
    , audio: &AudioPayload
    , cancel: &CancellationToken
    ) -> Result<String, Error>
    {   debug!("Transcribing {}", audio.file_name);
        run_with_retry(
          &self.policy, cancel, "transcription",
          || self.backend.transcribe(audio)
        ).await
    }

    async fn transcribe_halves(
      &self
    , audio: &AudioPayload
    , cancel: &CancellationToken
    ) -> Result<String, Error>
    {   let (first, second) = split_in_half(audio);
        let first = self.transcribe_piece(&first, cancel).await?;
        let second = self.transcribe_piece(&second, cancel).await?;
        Ok(format!("{} {}", first.trim(), second.trim()))
    }
}

/// Split at the byte midpoint. Relies on frame-resynchronising formats
/// such as MP3.
pub fn split_in_half(audio: &AudioPayload) -> (AudioPayload, AudioPayload)
{   let mid = audio.bytes.len() / 2;
    let part = |n: usize, bytes: &[u8]| AudioPayload
    {   file_name: format!("part{}-{}", n, audio.file_name)
      , bytes: bytes.to_vec()
    };
    (part(1, &audio.bytes[..mid]), part(2, &audio.bytes[mid..]))
}
