//! Prompt templates for chunk summaries and summary combination

pub const SUMMARIZE_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarizes text accurately.";

pub const COMBINE_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that combines text summaries.";

/// User prompt asking for a summary of `text` of about `target_tokens`
pub fn summary_prompt(target_tokens: usize, text: &str) -> String {
    format!(
        "Create a detailed summary of approximately {target_tokens} tokens of the text below.\n\
         \n\
         Instructions:\n\
         1. Keep the title and author if available\n\
         2. Include all key points, main arguments, and important details\n\
         3. Do not include references, citations, release notes, trademarks, source code, \
         logos, disclaimers, legal notices, appendices, or page numbers\n\
         \n\
         Text:\n\
         {text}"
    )
}

/// User prompt combining numbered parts into one summary
pub fn combine_prompt<S: AsRef<str>>(target_tokens: usize, parts: &[S]) -> String {
    let numbered = parts
        .iter()
        .enumerate()
        .map(|(i, part)| format!("Part {}:\n{}", i + 1, part.as_ref()))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Combine these summaries into a single coherent summary of approximately \
         {target_tokens} tokens. Maintain all important information, avoid redundancy, \
         and ensure smooth transitions between topics.\n\
         \n\
         {numbered}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prompt_names_target_and_text() {
        let prompt = summary_prompt(800, "The body.");
        assert!(prompt.contains("approximately 800 tokens"));
        assert!(prompt.contains("page numbers"));
        assert!(prompt.ends_with("Text:\nThe body."));
    }

    #[test]
    fn test_combine_prompt_numbers_parts() {
        let prompt = combine_prompt(500, &["first", "second"]);
        assert!(prompt.contains("approximately 500 tokens"));
        assert!(prompt.ends_with("Part 1:\nfirst\n\nPart 2:\nsecond"));
    }
}
