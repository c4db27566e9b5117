//! Index the given PDF URLs, then answer questions about them.

use std::sync::Arc;

use docqa_config::Config;
use docqa_conversation::{ConversationManager, print_snippets};
use docqa_core::{DocumentIndexer, Embedder, SnippetRetriever, TextGenerator};
use docqa_index::PdfIndexer;
use docqa_providers::OpenAIProvider;
use tracing::{info, warn};

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// PDF URLs to index before the conversation starts
    pub urls: Vec<String>,
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Optional chat model override
    pub model: Option<String>,
}

/// Strategy for executing the Chat command.
///
/// Indexing is best-effort: URLs that fail are reported and skipped, and
/// the command only fails when none of them could be indexed.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        info!("Loaded config from {}", Config::config_path()?.display());

        // Fail on a bad template or window setting before any download.
        let conversation_config = config.conversation_config()?;

        let mut settings = config.provider_settings()?;
        if let Some(model) = input.model {
            settings.chat_model = model;
        }
        let provider = Arc::new(OpenAIProvider::new(settings)?);

        let embedder: Arc<dyn Embedder> = provider.clone();
        let indexer = PdfIndexer::new(embedder, config.indexing_config(), config.fetch_config())?;

        info!("Indexing {} document(s)", input.urls.len());
        let (index, report) = indexer.index(&input.urls).await?;
        for (url, error) in report.failed() {
            warn!("Could not index {url}: {error}");
            eprintln!("Skipped {url}: {error}");
        }
        info!(
            "Indexed {} chunk(s) from {} document(s)",
            report.total_chunks(),
            report.succeeded().len()
        );

        let generator: Arc<dyn TextGenerator> = provider;
        let retriever: Arc<dyn SnippetRetriever> = Arc::new(index);
        let mut manager =
            ConversationManager::new(generator, retriever, conversation_config)?;

        if let Some(msg) = input.message {
            let result = manager.run_turn(&msg).await?;

            println!("{}\n", result.reply);
            print_snippets(&result.snippets);
            info!("Turn {} completed.", result.turn_number);
        } else {
            manager.run_interactive().await?;

            info!(
                "Conversation ended: {} exchanges",
                manager.session().exchange_count()
            );
        }

        Ok(())
    }
}
