use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::assembler::ResponseAssembler;
use crate::config::EngineConfig;
use crate::error::Error;
use crate::providers::{AudioPayload, OpenAiClient};
use crate::request::GenerationRequest;
use crate::transcription::Transcriber;
use crate::PromptFoot;

/// Reply to an in-flight generation, with a handle to cancel it
pub struct PendingResponse<T>
{   pub reply: oneshot::Receiver<Result<T, Error>>
  , pub cancel: CancellationToken
}

impl<T> PendingResponse<T>
{   /// Wait for the backend's answer
    pub async fn wait(self) -> Result<T, Error>
    {   self.reply.await.map_err(|_| {
          error!("Backend dropped the reply channel");
          Error::Other("Backend disconnected".to_string())
        })?
    }

    pub fn cancel(&self)
    {   self.cancel.cancel();
    }
}

/// Public API for the prompt backend - owns the task
pub struct PromptBackend
{   hand: crate::PromptHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl PromptBackend
{   /// Spawn the backend task around an assembled pipeline.
    /// Returns immediately.
    pub fn new(
      assembler: ResponseAssembler
    , transcriber: Option<Transcriber>
    ) -> Self
    {   debug!("Creating PromptBackend with task ownership");

        let (generate_tx, generate_rx) = mpsc::unbounded_channel();
        let (transcribe_tx, transcribe_rx) = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx) = mpsc::unbounded_channel();

        let hand = crate::PromptHand
        {   generate_tx
          , transcribe_tx
          , kill_process_tx
        };
        let foot = crate::PromptFoot
        {   generate_rx
          , transcribe_rx
          , kill_process_rx
        };

        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, assembler, transcriber).await
        });

        PromptBackend
        {   hand
          , _task_handle
        }
    }

    /// Backend talking to the configured OpenAI-compatible endpoint
    pub fn from_config(config: &EngineConfig) -> Result<Self, Error>
    {   let client = Arc::new(
          OpenAiClient::new(config.api_key(), &config.provider)?
        );
        let assembler = ResponseAssembler::new(config, client.clone());
        let transcriber = Transcriber::new(config, client);
        Ok(PromptBackend::new(assembler, Some(transcriber)))
    }

    /// Queue a generation - returns almost immediately
    pub fn generate(
      &self
    , request: GenerationRequest
    ) -> Result<PendingResponse<String>, Error>
    {   debug!("generate queuing command for model: {}", request.model);
        let (reply, reply_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let cmd = crate::GenerateArgs
        {   request
          , cancel: cancel.clone()
          , reply
        };

        self.hand.generate_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            Error::Other("Backend disconnected".to_string())
          })?;

        Ok(PendingResponse { reply: reply_rx, cancel })
    }

    /// Queue a transcription - returns almost immediately
    pub fn transcribe(
      &self
    , audio: AudioPayload
    ) -> Result<PendingResponse<crate::sanitizer::SanitizedPrompt>, Error>
    {   debug!("transcribe queuing {} bytes", audio.bytes.len());
        let (reply, reply_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let cmd = crate::TranscribeArgs
        {   audio
          , cancel: cancel.clone()
          , reply
        };

        self.hand.transcribe_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            Error::Other("Backend disconnected".to_string())
          })?;

        Ok(PendingResponse { reply: reply_rx, cancel })
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), Error>
    {   debug!("Shutting down PromptBackend");
        let (reply, reply_rx) = oneshot::channel();

        self.hand.kill_process_tx
          .send(crate::KillProcessArgs { reply })
          .map_err(|_| {
            error!("Backend channel already closed");
            Error::Other("Backend already shutdown".to_string())
          })?;

        match reply_rx.await
        {   Ok(result) => {
              debug!("Backend shutdown confirmed");
              result
            }
          , Err(_) => {
              error!("Backend exited without confirming shutdown");
              Err(Error::Other("Backend disconnected".to_string()))
            }
        }
    }
}

/// Main backend event loop
///
/// Commands are handled one at a time; a generation holds the loop
/// until its reply is sent.
async fn run_backend_loop(
  foot: PromptFoot
, assembler: ResponseAssembler
, transcriber: Option<Transcriber>
)
{   debug!("Starting PromptBackend event loop");
    let PromptFoot
    {   mut generate_rx
      , mut transcribe_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { biased;
        Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("PromptBackend shutting down");
          break;
        }
      , Some(cmd) = generate_rx.recv() => {
          debug!("Received Generate for model: {}", cmd.request.model);
          let result = assembler.respond(&cmd.request, &cmd.cancel).await;
          let _ = cmd.reply.send(result);
        }
      , Some(cmd) = transcribe_rx.recv() => {
          debug!("Received Transcribe");
          let result = match &transcriber
          {   Some(t) => t.transcribe(cmd.audio, &cmd.cancel).await
            , None => Err(Error::Configuration(
                "no transcription backend configured".to_string()
              ))
          };
          let _ = cmd.reply.send(result);
        }
      , else => {
          info!("All PromptBackend handles dropped");
          break;
        }
      }
    }
}
