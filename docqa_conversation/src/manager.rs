//! Conversation manager: drives one grounded question-answer turn at a
//! time.
//!
//! A turn retrieves snippets for the recent user questions, merges them into
//! the snippet window, renders the prompt, calls the text generator and
//! appends the exchange to the session. Each manager owns its own state;
//! concurrent sessions need separate managers.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use docqa_core::{
    ConfigurationError, DisplaySnippet, Generation, GenerationError, RetrievalError, Snippet,
    SnippetRetriever, TemplateError, TextGenerator, Turn, TurnError,
};
use docqa_memory::{
    DEFAULT_SNIPPET_WINDOW_SIZE, HistoryMemory, MessageWindow, MessageWindowConfig,
    SnippetMemory, SnippetWindow,
};
use tracing::{debug, error, info, warn};

use crate::prompt::{DEFAULT_PROMPT_TEMPLATE, PromptTemplate};
use crate::session::ConversationSession;

/// Reply recorded and shown when text generation fails.
pub const FALLBACK_REPLY: &str = "Sorry, an error occurred while processing your request.";

/// Configuration for conversation management.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Optional session name
    pub session_name: Option<String>,
    /// Turns rendered into `{history}`
    pub history_window_size: usize,
    /// Unique snippets kept in `{snippets}`
    pub snippet_window_size: usize,
    /// Recent user turns joined into the retrieval query
    pub retrieval_query_window_size: usize,
    /// Snippets requested from the retriever per turn
    pub top_k: usize,
    /// Prompt template with `{snippets}`, `{history}` and `{input}`
    pub prompt_template: String,
    /// Also put the input being answered into the retrieval query
    pub query_includes_current_input: bool,
    pub retrieval_timeout: Option<Duration>,
    pub generation_timeout: Option<Duration>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        let windows = MessageWindowConfig::default();
        Self {
            session_name: None,
            history_window_size: windows.history_window_size,
            snippet_window_size: DEFAULT_SNIPPET_WINDOW_SIZE,
            retrieval_query_window_size: windows.retrieval_query_window_size,
            top_k: 4,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            query_includes_current_input: false,
            retrieval_timeout: None,
            generation_timeout: None,
        }
    }
}

impl ConversationConfig {
    #[must_use]
    pub const fn with_history_window_size(mut self, size: usize) -> Self {
        self.history_window_size = size;
        self
    }

    #[must_use]
    pub const fn with_snippet_window_size(mut self, size: usize) -> Self {
        self.snippet_window_size = size;
        self
    }

    #[must_use]
    pub const fn with_retrieval_query_window_size(mut self, size: usize) -> Self {
        self.retrieval_query_window_size = size;
        self
    }

    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_prompt_template(mut self, template: String) -> Self {
        self.prompt_template = template;
        self
    }

    #[must_use]
    pub const fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = Some(timeout);
        self
    }

    /// Check the window settings and parse the prompt template.
    ///
    /// Hosts call this before indexing so a bad configuration fails before
    /// any download or model call.
    pub fn validate(&self) -> Result<PromptTemplate, TurnError> {
        self.check_windows()?;
        Ok(PromptTemplate::parse(&self.prompt_template)?)
    }

    fn check_windows(&self) -> Result<(), ConfigurationError> {
        if self.top_k == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "top_k",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.retrieval_query_window_size == 0 && !self.query_includes_current_input {
            return Err(ConfigurationError::InvalidValue {
                field: "retrieval_query_window_size",
                reason: "must be at least 1 unless the current input is included".to_string(),
            });
        }
        Ok(())
    }
}

/// Outcome of one conversation turn.
#[derive(Debug, Clone)]
pub struct TurnReply {
    /// Assistant reply, or [`FALLBACK_REPLY`] when generation failed
    pub reply: String,
    /// Snippet window contents after this turn's merge, most recent first
    pub snippets: Vec<DisplaySnippet>,
    pub turn_number: usize,
    pub usage: Option<TurnUsage>,
    /// Whether `reply` is the fallback
    pub fallback: bool,
}

/// Token usage information for a turn.
#[derive(Debug, Clone)]
pub struct TurnUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

/// Multi-turn grounded conversation.
pub struct ConversationManager<G = Arc<dyn TextGenerator>, R = Arc<dyn SnippetRetriever>>
where
    G: Send + Sync,
    R: Send + Sync,
{
    generator: G,
    retriever: R,
    config: ConversationConfig,
    template: PromptTemplate,
    message_window: MessageWindow,
    snippet_window: SnippetWindow,
    session: ConversationSession,
}

impl<G, R> ConversationManager<G, R>
where
    G: TextGenerator + Send + Sync,
    R: SnippetRetriever + Send + Sync,
{
    /// Create a new conversation.
    ///
    /// The prompt template and window settings are checked here, before any
    /// external call can happen.
    pub fn new(generator: G, retriever: R, config: ConversationConfig) -> Result<Self, TurnError> {
        let template = config.validate()?;

        let message_window = MessageWindow::with_config(
            MessageWindowConfig::default()
                .with_history_window_size(config.history_window_size)
                .with_retrieval_query_window_size(config.retrieval_query_window_size),
        );
        let snippet_window = SnippetWindow::new(config.snippet_window_size);

        let mut session = ConversationSession::new();
        if let Some(name) = config.session_name.clone() {
            session = session.with_name(name);
        }

        info!("Creating conversation manager for session: {}", session.id);

        Ok(Self {
            generator,
            retriever,
            config,
            template,
            message_window,
            snippet_window,
            session,
        })
    }

    /// Process a single conversation turn.
    ///
    /// Empty input and retrieval failures return an error and leave the
    /// conversation untouched. Generation failures do not: the fallback reply
    /// is recorded and returned instead, and the snippets merged for this
    /// turn stay in the window.
    pub async fn run_turn(&mut self, user_input: &str) -> Result<TurnReply, TurnError> {
        if user_input.trim().is_empty() {
            return Err(ConfigurationError::EmptyInput.into());
        }

        let turn_number = self.session.exchange_count() + 1;
        info!(
            "Processing turn {turn_number} for session: {}",
            self.session.id
        );

        let query = self.retrieval_query(user_input);
        debug!("Retrieval query: {query:?}");

        let candidates = self.retrieve(&query).await?;
        let added = self.snippet_window.merge(&candidates);
        debug!(
            "Retrieved {} snippets, {added} new, window holds {}",
            candidates.len(),
            self.snippet_window.len()
        );

        let prompt = self.build_prompt(user_input);

        let (reply, usage, fallback) = match self.generate(&prompt).await {
            Ok(generation) => (
                generation.content,
                generation.usage.map(|u| TurnUsage {
                    prompt: u.prompt_tokens,
                    completion: u.completion_tokens,
                    total: u.total_tokens,
                }),
                false,
            ),
            Err(e) => {
                error!("Text generation failed on turn {turn_number}: {e}");
                (FALLBACK_REPLY.to_string(), None, true)
            }
        };

        self.session.add_turn(Turn::user(user_input));
        self.session.add_turn(Turn::assistant(reply.clone()));

        debug!("Turn {turn_number} completed");

        Ok(TurnReply {
            reply,
            snippets: self.snippet_window.display(),
            turn_number,
            usage,
            fallback,
        })
    }

    /// Run an interactive conversation loop.
    ///
    /// This reads from stdin and writes to stdout, maintaining
    /// conversation context across turns.
    pub async fn run_interactive(&mut self) -> std::io::Result<()> {
        println!("=== Conversation Session: {} ===", self.session.id);
        println!("Type 'exit', 'quit', or Ctrl+C to end the session.\n");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut input = String::new();
            if std::io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            if matches!(input, "exit" | "quit" | "q") {
                println!(
                    "\nSession ended. Total turns: {}",
                    self.session.exchange_count()
                );
                break;
            }

            if input.is_empty() {
                continue;
            }

            match self.run_turn(input).await {
                Ok(result) => {
                    println!("\n{}\n", result.reply);
                    print_snippets(&result.snippets);

                    if let Some(usage) = result.usage {
                        debug!(
                            "Tokens: {} prompt + {} completion = {} total",
                            usage.prompt, usage.completion, usage.total
                        );
                    }
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                }
            }
        }

        Ok(())
    }

    /// Replace the prompt template. The current template is kept on error.
    pub fn set_prompt_template(&mut self, template: &str) -> Result<(), TemplateError> {
        self.template = PromptTemplate::parse(template)?;
        self.config.prompt_template = template.to_string();
        Ok(())
    }

    /// Forget all turns and snippets.
    pub fn reset(&mut self) {
        info!("Resetting conversation session: {}", self.session.id);
        self.session.clear();
        self.snippet_window.clear();
    }

    #[must_use]
    pub const fn session(&self) -> &ConversationSession {
        &self.session
    }

    #[must_use]
    pub const fn snippet_window(&self) -> &SnippetWindow {
        &self.snippet_window
    }

    #[must_use]
    pub const fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Recent user inputs, excluding the one being answered unless
    /// configured otherwise. With no earlier user turn to draw from, the
    /// current input is used.
    fn retrieval_query(&self, user_input: &str) -> String {
        let mut inputs = self.message_window.recent_user_inputs(self.session.turns());

        if self.config.query_includes_current_input {
            inputs.push(user_input);
            let excess = inputs
                .len()
                .saturating_sub(self.config.retrieval_query_window_size.max(1));
            inputs.drain(..excess);
        } else if inputs.is_empty() {
            inputs.push(user_input);
        }

        inputs.join("\n")
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<Snippet>, RetrievalError> {
        let call = self.retriever.retrieve(query, self.config.top_k);
        let result = match self.config.retrieval_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(RetrievalError::Timeout(limit))),
            None => call.await,
        };

        result.inspect_err(|e| warn!("Snippet retrieval failed for query {query:?}: {e}"))
    }

    async fn generate(&self, prompt: &str) -> Result<Generation, GenerationError> {
        let call = self.generator.generate(prompt);
        let generation = match self.config.generation_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(GenerationError::Timeout(limit)))?,
            None => call.await?,
        };

        if generation.content.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        Ok(generation)
    }

    fn build_prompt(&self, user_input: &str) -> String {
        let snippets = SnippetMemory::new(&self.snippet_window);
        let history = HistoryMemory::new(&self.message_window, self.session.turns());
        self.template.assemble(&[&snippets, &history], user_input)
    }
}

/// Print snippets the way the interactive loop shows them.
pub fn print_snippets(snippets: &[DisplaySnippet]) {
    for snippet in snippets {
        println!("--- Snippet from page {} ---", snippet.display_page());
        println!("{}", snippet.content.trim());
        println!();
    }
}
