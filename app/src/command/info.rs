use docqa_config::Config;

/// Strategy for displaying configuration information.
///
/// Prints the masked API key and the effective provider, conversation and
/// indexing settings after defaults and the environment override apply.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== docqa Configuration ===\n");
        println!("Config file: {}\n", Config::config_path()?.display());

        println!("Provider:");
        println!("  API Key: {}", config.provider.masked_api_key());
        println!("  Base URL: {}", config.provider.base_url);
        println!("  Chat Model: {}", config.provider.chat_model);
        println!("  Embedding Model: {}", config.provider.embedding_model);
        println!("  Max Tokens: {}", config.provider.max_tokens);
        println!("  Temperature: {}", config.provider.temperature);
        println!();

        let conversation = &config.conversation;
        println!("Conversation:");
        println!("  History Window: {}", conversation.history_window_size);
        println!("  Snippet Window: {}", conversation.snippet_window_size);
        println!(
            "  Retrieval Query Window: {}",
            conversation.retrieval_query_window_size
        );
        println!("  Top K: {}", conversation.top_k);
        println!(
            "  Query Includes Current Input: {}",
            conversation.query_includes_current_input
        );
        match &conversation.prompt_template {
            Some(template) => println!("  Prompt Template: {}", truncate(template, 60)),
            None => println!("  Prompt Template: (built-in)"),
        }
        println!(
            "  Retrieval Timeout: {}",
            format_timeout(conversation.retrieval_timeout_secs)
        );
        println!(
            "  Generation Timeout: {}",
            format_timeout(conversation.generation_timeout_secs)
        );
        println!();

        println!("Indexing:");
        println!("  Chunk Size: {}", config.indexing.chunk_size);
        println!("  Chunk Overlap: {}", config.indexing.chunk_overlap);
        println!(
            "  Download Timeout: {}s",
            config.indexing.download_timeout_secs
        );
        println!("  Max Download: {} bytes", config.indexing.max_download_bytes);

        Ok(())
    }
}

fn format_timeout(secs: Option<u64>) -> String {
    secs.map_or_else(|| "(none)".to_string(), |s| format!("{s}s"))
}

fn truncate(s: &str, max_chars: usize) -> String {
    let single_line = s.replace('\n', "\\n");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let head: String = single_line.chars().take(max_chars - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text_and_escapes_newlines() {
        assert_eq!(truncate("a\nb", 60), "a\\nb");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }

    #[test]
    fn timeouts_format_with_unit() {
        assert_eq!(format_timeout(None), "(none)");
        assert_eq!(format_timeout(Some(30)), "30s");
    }
}
