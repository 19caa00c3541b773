use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error};

use promptlab::config::EngineConfig;
use promptlab::error::Error;
use promptlab::techniques::{
  apply_technique, compose_prompt, describe_transformation, OutputFormat,
  PromptOptions, Technique, Tone,
};
use promptlab::transcription::Transcriber;
use promptlab::validator::check_interface_bounds;
use promptlab::{catalog, content, logging, GenerationRequest, PromptBackend};

#[derive(Parser, Debug)]
#[command(name = "promptlab")]
#[command(about = "Apply a prompt engineering technique and query a model")]
struct Cli
{   /// Prompt text (omit when using --audio)
    prompt: Option<String>

  , /// API identifier from the model catalog
    #[arg(long, default_value = "gpt-4o")]
    model: String

  , #[arg(long, default_value = "Zero-Shot")]
    technique: String

  , #[arg(long, default_value_t = 0.7)]
    temperature: f32

  , #[arg(long, default_value_t = 1.0)]
    top_p: f32

  , #[arg(long, default_value_t = 150)]
    max_tokens: i64

  , /// Text, JSON or "Bullet Points"
    #[arg(long, default_value = "Text")]
    format: OutputFormat

  , /// Formal, Casual or Technical
    #[arg(long, default_value = "Formal")]
    tone: Tone

  , /// Perspective the model should simulate
    #[arg(long)]
    role: Option<String>

  , #[arg(long)]
    thinking_step: bool

  , #[arg(long)]
    avoid_hallucinations: bool

  , /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>

  , /// Transcribe this audio file and use the text as the prompt
    #[arg(long)]
    audio: Option<PathBuf>

  , /// Print the technique's description and process from this JSON file
    #[arg(long)]
    techniques_file: Option<PathBuf>

  , /// Print example prompts per department from this JSON file and exit
    #[arg(long)]
    prompts_file: Option<PathBuf>

  , /// Print the model catalog and exit
    #[arg(long)]
    list_models: bool
}

#[tokio::main]
async fn main() -> ExitCode
{   let cli = Cli::parse();

    let config = match EngineConfig::load_or_default(cli.config.as_deref())
    {   Ok(config) => config
      , Err(e) => {
          eprintln!("{}", e.user_message());
          eprintln!("{}", e);
          return ExitCode::FAILURE;
        }
    };
    logging::init(&config.logging.level);

    match run(cli, config).await
    {   Ok(()) => ExitCode::SUCCESS
      , Err(e) => {
          error!("{}", e);
          eprintln!("{}", e.user_message());
          ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: EngineConfig) -> Result<(), Error>
{   if cli.list_models
    {   for model in catalog().models()
        {   println!(
              "{:<14} {:<16} {:?}",
              model.display_name, model.api_identifier, model.family
            );
        }
        return Ok(());
    }

    if let Some(path) = &cli.prompts_file
    {   for (department, prompts) in content::load_prompts(path)?
        {   println!("{}", department);
            for prompt in prompts
            {   println!("  - {}", prompt);
            }
        }
        return Ok(());
    }

    check_interface_bounds(cli.temperature, cli.top_p, cli.max_tokens)?;
    let technique: Technique = cli.technique.parse()?;
    let backend = PromptBackend::from_config(&config)?;

    let raw_prompt = match (&cli.audio, &cli.prompt)
    {   (Some(path), _) => {
          let audio = Transcriber::read_file(path).await?;
          let text = backend.transcribe(audio)?.wait().await?;
          println!("Transcribed prompt: {}\n", text);
          text.into_inner()
        }
      , (None, Some(prompt)) => prompt.clone()
      , (None, None) => {
          return Err(Error::validation("prompt", "no prompt given"));
        }
    };

    let options = PromptOptions
    {   output_format: cli.format
      , tone: cli.tone
      , role: cli.role.clone()
      , thinking_step: cli.thinking_step
      , avoid_hallucinations: cli.avoid_hallucinations
    };
    let (transformed, explanation) =
      apply_technique(&raw_prompt, technique.display_name());
    let prompt = compose_prompt(&transformed, &options);
    debug!("Composed prompt:\n{}", prompt);

    if let Some(path) = &cli.techniques_file
    {   let techniques = content::load_techniques(path)?;
        match techniques.get(technique.display_name())
        {   Some(info) => {
              println!("{}\n", info.render(&raw_prompt, technique.display_name()));
            }
          , None => debug!("{} not described in {}", technique, path.display())
        }
    }

    let request = GenerationRequest::new(cli.model.as_str(), prompt)
      .with_sampling(Some(cli.temperature), Some(cli.top_p))
      .with_max_tokens(Some(cli.max_tokens));
    let response = backend.generate(request)?.wait().await;
    backend.shutdown().await?;
    let response = response?;

    println!("{}\n", response);
    println!("{}\n", explanation);
    println!(
      "{}",
      describe_transformation(
        technique, &options, cli.temperature, cli.top_p, cli.max_tokens
      )
    );
    Ok(())
}
