//! Logger setup

use env_logger::Env;

/// Initialise `env_logger`.
///
/// `RUST_LOG` wins over `level`. Calling this more than once is harmless.
pub fn init(level: &str)
{   let _ = env_logger::Builder::from_env(
        Env::default().default_filter_or(level)
      )
      .format_timestamp_millis()
      .try_init();
}

/// Short correlation id for tying the log lines of one request together
pub fn correlation_id() -> String
{   let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// First `max_chars` characters of `text`, for log previews
pub fn preview(text: &str, max_chars: usize) -> String
{   if text.chars().count() <= max_chars
    {   return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
