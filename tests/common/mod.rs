#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use promptlab::providers::{
  AudioPayload, ChatCompletionRequest, CompletionBackend, ProviderError,
  TranscriptionBackend,
};

/// Backend that replays scripted outcomes and records what it was sent
#[derive(Default)]
pub struct ScriptedBackend
{   replies: Mutex<VecDeque<Result<String, ProviderError>>>
  , requests: Mutex<Vec<ChatCompletionRequest>>
  , audio: Mutex<Vec<AudioPayload>>
}

impl ScriptedBackend
{   pub fn new(
      replies: impl IntoIterator<Item = Result<String, ProviderError>>
    ) -> Self
    {   ScriptedBackend
        {   replies: Mutex::new(replies.into_iter().collect())
          , ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest>
    {   self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize
    {   self.requests.lock().unwrap().len() + self.audio.lock().unwrap().len()
    }

    pub fn audio(&self) -> Vec<AudioPayload>
    {   self.audio.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<String, ProviderError>
    {   self.replies.lock().unwrap()
          .pop_front()
          .unwrap_or_else(|| Err(ProviderError::Http("script exhausted".into())))
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend
{   async fn create_chat_completion(
      &self
    , request: &ChatCompletionRequest
    ) -> Result<String, ProviderError>
    {   self.requests.lock().unwrap().push(request.clone());
        self.next_reply()
    }
}

#[async_trait]
impl TranscriptionBackend for ScriptedBackend
{   async fn transcribe(
      &self
    , audio: &AudioPayload
    ) -> Result<String, ProviderError>
    {   self.audio.lock().unwrap().push(audio.clone());
        self.next_reply()
    }
}

pub fn ok(text: &str) -> Result<String, ProviderError>
{   Ok(text.to_string())
}

pub fn rate_limited() -> Result<String, ProviderError>
{   Err(ProviderError::RateLimited
    {   retry_after: None
      , message: "Rate limit reached for requests".to_string()
    })
}

pub fn rate_limited_for(secs: u64) -> Result<String, ProviderError>
{   Err(ProviderError::RateLimited
    {   retry_after: Some(Duration::from_secs(secs))
      , message: "Rate limit reached for requests".to_string()
    })
}

pub fn user_message(request: &ChatCompletionRequest) -> &str
{   &request.messages[1].content
}
