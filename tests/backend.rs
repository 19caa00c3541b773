mod common;

use std::sync::Arc;

use common::{ok, rate_limited, ScriptedBackend};
use promptlab::config::EngineConfig;
use promptlab::error::Error;
use promptlab::providers::AudioPayload;
use promptlab::{GenerationRequest, PromptBackend, ResponseAssembler, Transcriber};

fn backend_with(
  scripted: &Arc<ScriptedBackend>
, transcriber: bool
) -> PromptBackend
{   let config = EngineConfig::default();
    let assembler = ResponseAssembler::new(&config, scripted.clone());
    let transcriber = transcriber
      .then(|| Transcriber::new(&config, scripted.clone()));
    PromptBackend::new(assembler, transcriber)
}

#[tokio::test(start_paused = true)]
async fn test_generate_round_trip()
{   let scripted = Arc::new(ScriptedBackend::new([ok("Hello from the model.")]));
    let backend = backend_with(&scripted, false);

    let pending = backend
      .generate(GenerationRequest::new("gpt-4o", "Say hello"))
      .unwrap();

    assert_eq!(pending.wait().await.unwrap(), "Hello from the model.");
    backend.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_requests_are_served_in_order()
{   let scripted = Arc::new(ScriptedBackend::new([
      rate_limited(),
      ok("First."),
      ok("Second."),
    ]));
    let backend = backend_with(&scripted, false);

    let first = backend
      .generate(GenerationRequest::new("gpt-4o", "one"))
      .unwrap();
    let second = backend
      .generate(GenerationRequest::new("gpt-4o", "two"))
      .unwrap();

    assert_eq!(second.wait().await.unwrap(), "Second.");
    assert_eq!(first.wait().await.unwrap(), "First.");
    let prompts: Vec<_> = scripted.requests().iter()
      .map(|r| r.messages[1].content.clone())
      .collect();
    assert_eq!(prompts, ["one", "one", "two"]);
    backend.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_pending_request_can_be_cancelled()
{   let scripted = Arc::new(ScriptedBackend::new(
      (0..3).map(|_| rate_limited())
    ));
    let backend = backend_with(&scripted, false);

    let pending = backend
      .generate(GenerationRequest::new("gpt-4o", "slow"))
      .unwrap();
    tokio::task::yield_now().await;
    pending.cancel();

    assert_eq!(pending.wait().await, Err(Error::Cancelled));
    assert!(scripted.calls() <= 1);
    backend.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_transcription_requires_a_transcriber()
{   let scripted = Arc::new(ScriptedBackend::new([ok("spoken prompt")]));
    let audio = AudioPayload
    {   file_name: "memo.mp3".to_string()
      , bytes: vec![1, 2, 3]
    };

    let without = backend_with(&scripted, false);
    let result = without.transcribe(audio.clone()).unwrap().wait().await;
    assert!(matches!(result, Err(Error::Configuration(_))));
    without.shutdown().await.unwrap();

    let with = backend_with(&scripted, true);
    let text = with.transcribe(audio).unwrap().wait().await.unwrap();
    assert_eq!(text.as_str(), "spoken prompt");
    with.shutdown().await.unwrap();
}
