pub mod error;
pub mod config;
pub mod logging;
pub mod catalog;
pub mod validator;
pub mod sanitizer;
pub mod completeness;
pub mod retry;
pub mod providers;
pub mod request;
pub mod completion;
pub mod assembler;
pub mod techniques;
pub mod content;
pub mod transcription;
pub mod client;

pub use assembler::ResponseAssembler;
pub use catalog::{catalog, ModelDescriptor, ModelFamily};
pub use client::{PendingResponse, PromptBackend};
pub use config::EngineConfig;
pub use error::{ApiCause, Error};
pub use request::{GenerationRequest, GenerationResult};
pub use sanitizer::{SanitizedPrompt, Sanitizer};
pub use transcription::Transcriber;

/*

promptlab/
├── Cargo.toml
├── src/
│   ├── lib.rs            # Re-exports and the backend command API
│   ├── main.rs           # Command line front end
│   ├── error.rs          # Error taxonomy
│   ├── config.rs         # File + environment configuration
│   ├── logging.rs        # env_logger setup, correlation ids
│   ├── catalog.rs        # Static model catalog
│   ├── validator.rs      # Parameter ranges and family defaults
│   ├── sanitizer.rs      # Prompt injection filtering
│   ├── completeness.rs   # Terminal punctuation enforcement
│   ├── retry.rs          # Rate-limit retry budget
│   ├── completion.rs     # Continuation loop
│   ├── assembler.rs      # get_model_response
│   ├── techniques.rs     # Prompt engineering transforms
│   ├── content.rs        # techniques/prompts/audio JSON loaders
│   ├── transcription.rs  # Spoken prompts
│   ├── client.rs         # Backend task owning the pipeline
│   └── providers/
│       ├── mod.rs        # Wire types and backend traits
│       └── openai.rs     # OpenAI-compatible HTTP client
└── tests/

*/

/// PROMPTLAB BACKEND INTERFACE:

// ===== Generate =====

pub type GenerateReply = Result<String, crate::error::Error>;
pub type GenerateReplySender
  = tokio::sync::oneshot::Sender<GenerateReply>;

pub struct GenerateArgs
{   pub request: crate::request::GenerationRequest
  , pub cancel: tokio_util::sync::CancellationToken
  , pub reply: GenerateReplySender
}

// ===== Transcribe =====

pub type TranscribeReply
  = Result<crate::sanitizer::SanitizedPrompt, crate::error::Error>;
pub type TranscribeReplySender
  = tokio::sync::oneshot::Sender<TranscribeReply>;

pub struct TranscribeArgs
{   pub audio: crate::providers::AudioPayload
  , pub cancel: tokio_util::sync::CancellationToken
  , pub reply: TranscribeReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::oneshot::Sender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== PromptHand (sender side) =====

pub struct PromptHand
{   pub generate_tx
      : tokio::sync::mpsc::UnboundedSender<GenerateArgs>
  , pub transcribe_tx
      : tokio::sync::mpsc::UnboundedSender<TranscribeArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== PromptFoot (receiver side) =====

pub struct PromptFoot
{   pub generate_rx
      : tokio::sync::mpsc::UnboundedReceiver<GenerateArgs>
  , pub transcribe_rx
      : tokio::sync::mpsc::UnboundedReceiver<TranscribeArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}
