//! Sentence-completeness checks on generated text

/// Appended when generated text stops mid-sentence
pub const CLOSING_STATEMENT: &str
  = "Thank you for your understanding and support.";

const TERMINAL_PUNCTUATION: [char; 3] = ['.', '!', '?'];

/// True when `text`, ignoring surrounding whitespace, ends in `.`, `!` or `?`
pub fn is_complete_sentence(text: &str) -> bool
{   text.trim().ends_with(TERMINAL_PUNCTUATION)
}

/// Append [`CLOSING_STATEMENT`] to text that stops mid-sentence.
///
/// Empty and whitespace-only text is returned unchanged.
pub fn ensure_complete(text: &str) -> String
{   if text.trim().is_empty() || is_complete_sentence(text)
    {   return text.to_string();
    }
    format!("{} {}", text.trim_end(), CLOSING_STATEMENT)
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn terminal_punctuation_detected()
    {   assert!(is_complete_sentence("Hello world."));
        assert!(is_complete_sentence("Really?!"));
        assert!(is_complete_sentence("\t\nThis has tabs and newlines!\n\t"));
        assert!(!is_complete_sentence("This is incomplete"));
        assert!(!is_complete_sentence(""));
        assert!(!is_complete_sentence("   "));
    }

    #[test]
    fn complete_text_is_identity()
    {   for text in ["Done.", "Wow!", "Why?", "   padded.   ", "What...?"]
        {   assert_eq!(ensure_complete(text), text);
        }
    }

    #[test]
    fn incomplete_text_is_extended()
    {   let text = "Entropy is a measure of disorder";
        let out = ensure_complete(text);
        assert!(out.starts_with(text));
        assert!(out.len() > text.len());
        assert!(is_complete_sentence(&out));
        assert_eq!(
          out,
          "Entropy is a measure of disorder Thank you for your \
           understanding and support."
        );
    }

    #[test]
    fn trailing_whitespace_is_trimmed_before_closing()
    {   assert_eq!(
          ensure_complete("no ending   "),
          format!("no ending {}", CLOSING_STATEMENT)
        );
    }

    #[test]
    fn empty_and_blank_are_identity()
    {   assert_eq!(ensure_complete(""), "");
        assert_eq!(ensure_complete("   "), "   ");
        assert_eq!(ensure_complete("\t\n"), "\t\n");
    }
}
